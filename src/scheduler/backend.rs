use crate::scheduler::{Kernel, KernelKey};
use eyre::{eyre, WrapErr};
use log::{trace, warn};
use parking_lot::Mutex;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::fmt;

/// An ordered sequence of kernels.
///
/// Appending a kernel never runs it. Kernels run in append order once the queue is handed to
/// [`Backend::runall`].
#[derive(Default)]
pub struct Queue {
    kernels: Vec<(KernelKey, Box<dyn Kernel>)>,
}

impl fmt::Debug for Queue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys: Vec<_> = self.kernels.iter().map(|(key, _)| key).collect();
        f.debug_struct("Queue").field("kernels", &keys).finish()
    }
}

impl Queue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: KernelKey, kernel: Box<dyn Kernel>) {
        self.kernels.push((key, kernel));
    }

    pub fn len(&self) -> usize {
        self.kernels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kernels.is_empty()
    }

    /// Runs and removes all kernels in append order, stopping at the first failure.
    ///
    /// Kernels after a failed kernel are discarded.
    pub fn run_to_completion(&mut self) -> eyre::Result<()> {
        for (key, mut kernel) in self.kernels.drain(..) {
            trace!("Running kernel {}", key);
            kernel
                .run()
                .wrap_err_with(|| format!("kernel {} failed", key))?;
        }
        Ok(())
    }
}

/// Executes queues of kernels.
pub trait Backend {
    /// Runs all queues to completion, returning only once every queue is drained.
    ///
    /// Kernels of different queues may run in any relative order.
    fn runall(&self, queues: &mut [&mut Queue]) -> eyre::Result<()>;
}

/// Drains queues one after another on the calling thread.
#[derive(Debug, Default, Copy, Clone)]
pub struct SerialBackend;

impl Backend for SerialBackend {
    fn runall(&self, queues: &mut [&mut Queue]) -> eyre::Result<()> {
        for queue in queues.iter_mut() {
            queue.run_to_completion()?;
        }
        Ok(())
    }
}

/// Drains every queue on its own worker thread.
///
/// Queues progress independently, so a queue may block on data produced by another queue
/// in the same call to [`Backend::runall`].
pub struct ThreadedBackend {
    pool: ThreadPool,
}

impl fmt::Debug for ThreadedBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThreadedBackend")
            .field("max_queues", &self.max_queues())
            .finish()
    }
}

impl ThreadedBackend {
    /// Creates a backend able to progress up to `max_queues` queues concurrently.
    pub fn new(max_queues: usize) -> eyre::Result<Self> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(max_queues.max(1))
            .thread_name(|i| format!("fluxrec-queue-{}", i))
            .build()
            .wrap_err("failed to build queue thread pool")?;
        Ok(Self { pool })
    }

    pub fn max_queues(&self) -> usize {
        self.pool.current_num_threads()
    }
}

impl Backend for ThreadedBackend {
    fn runall(&self, queues: &mut [&mut Queue]) -> eyre::Result<()> {
        if queues.len() > self.max_queues() {
            return Err(eyre!(
                "cannot run {} queues concurrently on a backend with {} threads",
                queues.len(),
                self.max_queues()
            ));
        }

        let errors = Mutex::new(Vec::new());
        self.pool.scope(|scope| {
            for queue in queues.iter_mut() {
                let errors = &errors;
                scope.spawn(move |_| {
                    if let Err(err) = queue.run_to_completion() {
                        errors.lock().push(err);
                    }
                });
            }
        });

        let mut errors = errors.into_inner().into_iter();
        match errors.next() {
            Some(first) => {
                for other in errors {
                    warn!("Additional queue failure: {:?}", other);
                }
                Err(first)
            }
            None => Ok(()),
        }
    }
}
