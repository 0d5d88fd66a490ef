use crate::scheduler::Bank;
use eyre::{bail, eyre};
use nalgebra::{DMatrix, DVectorView};
use parking_lot::RwLock;
use rayon::iter::{IndexedParallelIterator, ParallelIterator};
use rayon::slice::{ParallelSlice, ParallelSliceMut};
use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::Arc;

/// Group of mesh entities a kernel operates on.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum KernelCategory {
    /// Element interiors.
    Eles,
    /// Interfaces between two local elements.
    Iint,
    /// Boundary interfaces.
    Bcint,
    /// Interfaces shared with another partition.
    Mpiint,
}

impl fmt::Display for KernelCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Eles => "eles",
            Self::Iint => "iint",
            Self::Bcint => "bcint",
            Self::Mpiint => "mpiint",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KernelKey {
    pub category: KernelCategory,
    pub name: String,
}

impl KernelKey {
    pub fn new(category: KernelCategory, name: impl Into<String>) -> Self {
        Self {
            category,
            name: name.into(),
        }
    }
}

impl fmt::Display for KernelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.category, self.name)
    }
}

/// Named scalar parameters passed to a kernel factory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KernelArgs {
    values: FxHashMap<String, f64>,
}

impl KernelArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: f64) -> Self {
        self.values.insert(name.into(), value);
        self
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    /// The current time, if the kernel was instantiated with one.
    pub fn t(&self) -> Option<f64> {
        self.get("t")
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A unit of work scheduled on a [`Queue`](crate::scheduler::Queue).
pub trait Kernel: Send {
    fn run(&mut self) -> eyre::Result<()>;
}

/// A kernel backed by a closure.
pub struct FnKernel<F> {
    f: F,
}

impl<F> FnKernel<F>
where
    F: FnMut() -> eyre::Result<()> + Send,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }

    pub fn boxed(f: F) -> Box<dyn Kernel>
    where
        F: 'static,
    {
        Box::new(Self::new(f))
    }
}

impl<F> Kernel for FnKernel<F>
where
    F: FnMut() -> eyre::Result<()> + Send,
{
    fn run(&mut self) -> eyre::Result<()> {
        (self.f)()
    }
}

/// Applies an operator matrix to every column (element) of the active register of one bank,
/// storing `beta * out + op * in` in the active register of another.
///
/// The two registers are always locked in the same global order, so kernels moving data in
/// opposite directions between the same pair of registers may run in different queues.
pub struct OperatorKernel {
    op: Arc<DMatrix<f64>>,
    input: Bank,
    output: Bank,
    beta: f64,
}

impl OperatorKernel {
    /// A kernel overwriting the output with `op * in`.
    pub fn new(op: Arc<DMatrix<f64>>, input: Bank, output: Bank) -> Self {
        Self {
            op,
            input,
            output,
            beta: 0.0,
        }
    }

    /// A kernel adding `op * in` to the output.
    pub fn accumulate(op: Arc<DMatrix<f64>>, input: Bank, output: Bank) -> Self {
        Self {
            beta: 1.0,
            ..Self::new(op, input, output)
        }
    }

    pub fn with_beta(self, beta: f64) -> Self {
        Self { beta, ..self }
    }
}

impl Kernel for OperatorKernel {
    fn run(&mut self) -> eyre::Result<()> {
        let (inreg, outreg) = (self.input.active_register(), self.output.active_register());
        if std::ptr::eq(inreg, outreg) {
            bail!("operator kernel input and output refer to the same register");
        }

        // Lock in address order
        let (input, mut output) = if (inreg as *const RwLock<_>) < (outreg as *const RwLock<_>) {
            let input = inreg.read();
            (input, outreg.write())
        } else {
            let output = outreg.write();
            (inreg.read(), output)
        };
        let op = &*self.op;

        if op.ncols() != input.nrows() || op.nrows() != output.nrows() || input.ncols() != output.ncols() {
            return Err(eyre!(
                "cannot apply a {}x{} operator to a {}x{} register, storing into a {}x{} register",
                op.nrows(),
                op.ncols(),
                input.nrows(),
                input.ncols(),
                output.nrows(),
                output.ncols()
            ));
        }
        if output.is_empty() {
            return Ok(());
        }

        let (nin, nout, beta) = (input.nrows(), output.nrows(), self.beta);
        if nin == 0 {
            output.scale_mut(beta);
            return Ok(());
        }

        output
            .as_mut_slice()
            .par_chunks_mut(nout)
            .zip(input.as_slice().par_chunks(nin))
            .for_each(|(out, inp)| {
                let x = DVectorView::from_slice(inp, nin);
                let y = op * x;
                for (o, yi) in out.iter_mut().zip(y.iter()) {
                    *o = beta * *o + *yi;
                }
            });
        Ok(())
    }
}

/// Creates a kernel from named parameters.
pub type KernelFactory = Box<dyn Fn(&KernelArgs) -> eyre::Result<Box<dyn Kernel>> + Send + Sync>;

/// Kernel factories by category and name.
#[derive(Default)]
pub struct KernelRegistry {
    factories: FxHashMap<KernelKey, KernelFactory>,
}

impl fmt::Debug for KernelRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<_> = self.factories.keys().collect();
        keys.sort();
        f.debug_struct("KernelRegistry").field("kernels", &keys).finish()
    }
}

impl KernelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a factory, replacing any factory previously registered under the same key.
    pub fn register<F>(&mut self, category: KernelCategory, name: &str, factory: F)
    where
        F: Fn(&KernelArgs) -> eyre::Result<Box<dyn Kernel>> + Send + Sync + 'static,
    {
        self.factories
            .insert(KernelKey::new(category, name), Box::new(factory));
    }

    pub fn contains(&self, category: KernelCategory, name: &str) -> bool {
        self.contains_key(&KernelKey::new(category, name))
    }

    pub fn contains_key(&self, key: &KernelKey) -> bool {
        self.factories.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    pub fn instantiate(&self, key: &KernelKey, args: &KernelArgs) -> eyre::Result<Box<dyn Kernel>> {
        let factory = self
            .factories
            .get(key)
            .ok_or_else(|| eyre!("no kernel registered for {}", key))?;
        factory(args)
    }
}
