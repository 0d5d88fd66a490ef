use crate::scheduler::{KernelCategory, KernelKey, KernelRegistry};
use crate::Error;
use itertools::Itertools;
use log::debug;
use std::fmt;

use KernelCategory::{Bcint, Eles, Iint, Mpiint};

/// The two queues of a residual evaluation.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum QueueId {
    /// Local computation.
    Compute,
    /// Exchange of partition boundary data.
    Exchange,
}

impl QueueId {
    pub const ALL: [QueueId; 2] = [QueueId::Compute, QueueId::Exchange];

    pub fn index(&self) -> usize {
        *self as usize
    }
}

/// A single instruction of a residual evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Instantiates a kernel and appends it to a queue. Timed kernels receive the current
    /// time as parameter `t`.
    Enqueue { queue: QueueId, key: KernelKey, timed: bool },
    /// Drains the given queues, acting as a full barrier.
    RunAll(Vec<QueueId>),
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Enqueue { queue, key, timed } => {
                write!(f, "{:?} << {}", queue, key)?;
                if *timed {
                    write!(f, "(t)")?;
                }
                Ok(())
            }
            Self::RunAll(queues) => write!(f, "runall([{}])", queues.iter().map(|q| format!("{:?}", q)).join(", ")),
        }
    }
}

/// The branch-free sequence of steps evaluating a residual with a given set of kernels.
#[derive(Debug, Clone, PartialEq)]
pub struct ResidualPlan {
    steps: Vec<Step>,
}

struct PlanBuilder<'a> {
    registry: &'a KernelRegistry,
    steps: Vec<Step>,
}

impl<'a> PlanBuilder<'a> {
    fn has(&self, category: KernelCategory, name: &str) -> bool {
        self.registry.contains(category, name)
    }

    fn push(&mut self, queue: QueueId, category: KernelCategory, name: &str, timed: bool) {
        self.steps.push(Step::Enqueue {
            queue,
            key: KernelKey::new(category, name),
            timed,
        });
    }

    fn required(&mut self, queue: QueueId, category: KernelCategory, name: &str) -> Result<(), Error> {
        self.required_timed(queue, category, name, false)
    }

    fn required_timed(
        &mut self,
        queue: QueueId,
        category: KernelCategory,
        name: &str,
        timed: bool,
    ) -> Result<(), Error> {
        if !self.has(category, name) {
            return Err(Error::config(format!("required kernel {}/{} is not registered", category, name)));
        }
        self.push(queue, category, name, timed);
        Ok(())
    }

    fn optional(&mut self, queue: QueueId, category: KernelCategory, name: &str) {
        if self.has(category, name) {
            self.push(queue, category, name, false);
        }
    }

    /// Prefers the low-order variant of a kernel when it is registered.
    fn low_order_or(&mut self, queue: QueueId, low_order: &str, fallback: &str) -> Result<(), Error> {
        if self.has(Eles, low_order) {
            self.required(queue, Eles, low_order)
        } else {
            self.required(queue, Eles, fallback)
        }
    }

    fn runall(&mut self, queues: &[QueueId]) {
        self.steps.push(Step::RunAll(queues.to_vec()));
    }
}

impl ResidualPlan {
    /// Inspects the registry once and emits the steps of a residual evaluation.
    ///
    /// Fails if a kernel required by the selected scheme is missing, and with
    /// [`Error::UnsupportedScheme`] if flux divergence at quadrature points is requested.
    pub fn build(registry: &KernelRegistry) -> Result<Self, Error> {
        use QueueId::{Compute as Q1, Exchange as Q2};

        let mut b = PlanBuilder {
            registry,
            steps: Vec::new(),
        };
        let exchange = b.has(Mpiint, "scal_fpts_pack");

        b.low_order_or(Q1, "disu_LO_ext", "disu_ext")?;
        if exchange {
            b.required(Q1, Mpiint, "scal_fpts_pack")?;
        }
        b.runall(&[Q1]);

        b.low_order_or(Q1, "disu_LO_int", "disu_int")?;
        b.optional(Q1, Eles, "copy_soln");
        b.optional(Q1, Eles, "copy_soln_at_fpts");
        b.required(Q1, Eles, "tdisf")?;
        b.required(Q1, Iint, "comm_flux")?;
        b.required_timed(Q1, Bcint, "comm_flux", true)?;

        if exchange {
            b.required(Q2, Mpiint, "scal_fpts_send")?;
            b.required(Q2, Mpiint, "scal_fpts_recv")?;
            b.required(Q2, Mpiint, "scal_fpts_unpack")?;
        }
        b.runall(&[Q1, Q2]);

        if exchange {
            b.required(Q1, Mpiint, "comm_flux")?;
        }

        if b.has(Eles, "tdivtpcorf_LO") {
            b.optional(Q1, Eles, "divf_LO");
            b.required(Q1, Eles, "tdivtpcorf_LO")?;
            b.required(Q1, Eles, "tdivtconf_LO")?;
            b.optional(Q1, Eles, "residual");
        } else {
            b.required(Q1, Eles, "tdivtpcorf")?;
            b.required(Q1, Eles, "tdivtconf")?;
        }

        if b.has(Eles, "riemanndifference") {
            b.required(Q1, Eles, "riemanndifference")?;
            b.required(Q1, Eles, "tdivtpcorf_RD")?;
            b.required(Q1, Eles, "tdivtconf_RD")?;
            b.required(Q1, Eles, "rdshocksensor")?;
        }

        if b.has(Eles, "tdivf_qpts") {
            return Err(Error::UnsupportedScheme(
                "flux divergence at quadrature points is not supported".to_string(),
            ));
        }
        b.required_timed(Q1, Eles, "negdivconf", true)?;
        b.runall(&[Q1]);

        let plan = Self { steps: b.steps };
        debug!("Residual plan:\n{}", plan);
        Ok(plan)
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Keys of all enqueued kernels in program order.
    pub fn kernels(&self) -> impl Iterator<Item = &KernelKey> {
        self.steps.iter().filter_map(|step| match step {
            Step::Enqueue { key, .. } => Some(key),
            Step::RunAll(_) => None,
        })
    }
}

impl fmt::Display for ResidualPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.steps.iter().join("\n"))
    }
}
