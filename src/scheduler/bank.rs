use crate::Error;
use nalgebra::DMatrix;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// A set of equally shaped registers of which one is active at a time.
///
/// Cloning a bank yields a handle to the same registers and the same active index, which is
/// how kernels stay bound to whichever register the scheduler selects. [`Bank::view`] instead
/// creates a handle with an independent active index over the same registers, as used for the
/// input and output banks of a residual evaluation.
#[derive(Clone)]
pub struct Bank {
    registers: Arc<[RwLock<DMatrix<f64>>]>,
    active: Arc<AtomicUsize>,
}

impl fmt::Debug for Bank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bank")
            .field("registers", &self.len())
            .field("active", &self.active())
            .finish()
    }
}

impl Bank {
    pub fn new(registers: Vec<DMatrix<f64>>) -> Self {
        Self {
            registers: registers.into_iter().map(RwLock::new).collect(),
            active: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A bank of `nregs` zero-initialized `nrows x ncols` registers.
    pub fn zeros(nregs: usize, nrows: usize, ncols: usize) -> Self {
        Self::new(vec![DMatrix::zeros(nrows, ncols); nregs])
    }

    /// A handle over the same registers with its own active index.
    pub fn view(&self) -> Self {
        Self {
            registers: Arc::clone(&self.registers),
            active: Arc::new(AtomicUsize::new(self.active())),
        }
    }

    pub fn len(&self) -> usize {
        self.registers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registers.is_empty()
    }

    pub fn active(&self) -> usize {
        self.active.load(Ordering::Acquire)
    }

    pub fn set_active(&self, index: usize) -> Result<(), Error> {
        if index >= self.len() {
            return Err(Error::config(format!(
                "register {} is out of bounds for a bank of {} registers",
                index,
                self.len()
            )));
        }
        self.active.store(index, Ordering::Release);
        Ok(())
    }

    /// Whether both banks share their registers.
    pub fn shares_storage(&self, other: &Bank) -> bool {
        Arc::ptr_eq(&self.registers, &other.registers)
    }

    /// Whether both banks currently refer to the same register.
    pub fn aliases(&self, other: &Bank) -> bool {
        self.shares_storage(other) && self.active() == other.active()
    }

    /// Locks the active register for reading.
    ///
    /// # Panics
    ///
    /// Panics if the bank is empty.
    pub fn read(&self) -> RwLockReadGuard<'_, DMatrix<f64>> {
        self.registers[self.active()].read()
    }

    /// Locks the active register for writing.
    ///
    /// # Panics
    ///
    /// Panics if the bank is empty.
    pub fn write(&self) -> RwLockWriteGuard<'_, DMatrix<f64>> {
        self.registers[self.active()].write()
    }

    /// The active register itself, for callers which must order their locks.
    pub(crate) fn active_register(&self) -> &RwLock<DMatrix<f64>> {
        &self.registers[self.active()]
    }

    pub fn register(&self, index: usize) -> Option<RwLockReadGuard<'_, DMatrix<f64>>> {
        self.registers.get(index).map(RwLock::read)
    }

    pub fn register_mut(&self, index: usize) -> Option<RwLockWriteGuard<'_, DMatrix<f64>>> {
        self.registers.get(index).map(RwLock::write)
    }
}
