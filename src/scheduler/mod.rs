//! Scheduling of the kernels evaluating a residual.
//!
//! A residual evaluation is a fixed pipeline of kernels spread over two queues: one for
//! local computation and one for the exchange of data with neighbouring partitions. The
//! pipeline is derived once from the kernels present in a [`KernelRegistry`] as a
//! [`ResidualPlan`]. Every call to [`ResidualScheduler::rhs`] then instantiates the kernels
//! into fresh queues and hands them to a [`Backend`] at the barriers of the plan.
use crate::Error;
use log::debug;

mod backend;
mod bank;
mod kernel;
mod plan;

pub use backend::*;
pub use bank::*;
pub use kernel::*;
pub use plan::*;

/// Boundary interfaces whose kernels depend on the current time.
pub trait BoundaryInterfaces: Send {
    fn prepare(&mut self, t: f64) -> eyre::Result<()>;
}

pub struct ResidualScheduler<B> {
    backend: B,
    registry: KernelRegistry,
    plan: ResidualPlan,
    inbank: Bank,
    outbank: Bank,
    bcints: Vec<Box<dyn BoundaryInterfaces>>,
}

impl<B: Backend> ResidualScheduler<B> {
    /// Builds the residual plan for the registered kernels.
    ///
    /// `inbank` and `outbank` are the handles through which the solution and residual
    /// registers are selected, and are typically views of the same bank.
    pub fn new(
        backend: B,
        registry: KernelRegistry,
        inbank: Bank,
        outbank: Bank,
        bcints: Vec<Box<dyn BoundaryInterfaces>>,
    ) -> Result<Self, Error> {
        let plan = ResidualPlan::build(&registry)?;
        Ok(Self {
            backend,
            registry,
            plan,
            inbank,
            outbank,
            bcints,
        })
    }

    pub fn plan(&self) -> &ResidualPlan {
        &self.plan
    }

    pub fn registry(&self) -> &KernelRegistry {
        &self.registry
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Evaluates the residual at time `t` of the solution in register `uinbank`, storing it
    /// in register `foutbank`.
    pub fn rhs(&mut self, t: f64, uinbank: usize, foutbank: usize) -> eyre::Result<()> {
        debug!("Evaluating residual at t = {} (registers {} -> {})", t, uinbank, foutbank);

        for bcint in &mut self.bcints {
            bcint.prepare(t)?;
        }

        self.inbank.set_active(uinbank)?;
        self.outbank.set_active(foutbank)?;

        let untimed = KernelArgs::new();
        let timed = KernelArgs::new().with("t", t);
        let mut queues = [Queue::new(), Queue::new()];

        for step in self.plan.steps() {
            match step {
                Step::Enqueue { queue, key, timed: is_timed } => {
                    let args = if *is_timed { &timed } else { &untimed };
                    let kernel = self.registry.instantiate(key, args)?;
                    queues[queue.index()].push(key.clone(), kernel);
                }
                Step::RunAll(ids) => {
                    let mut selected: Vec<&mut Queue> = queues
                        .iter_mut()
                        .zip(QueueId::ALL)
                        .filter(|(_, id)| ids.contains(id))
                        .map(|(queue, _)| queue)
                        .collect();
                    self.backend.runall(&mut selected)?;
                }
            }
        }
        Ok(())
    }
}
