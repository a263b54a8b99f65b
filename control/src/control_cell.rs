//! Single-word mailbox for the control output
//!
//! The sampling tick is the only writer. Hall edge handlers and status
//! reporting read it at any time. An `f32` fits in one `AtomicU32`, so a
//! reader sees either the previous or the new value, never a torn mix.

use core::sync::atomic::{AtomicU32, Ordering};

/// Lock-free `f32` cell (single writer, many readers)
pub struct ControlCell {
    bits: AtomicU32,
}

impl ControlCell {
    /// Cell holding `0.0`
    pub const fn zero() -> Self {
        Self {
            bits: AtomicU32::new(0),
        }
    }

    pub const fn new(value: f32) -> Self {
        Self {
            bits: AtomicU32::new(value.to_bits()),
        }
    }

    /// Publish a new value. Only the owning writer may call this.
    #[inline(always)]
    pub fn store(&self, value: f32) {
        self.bits.store(value.to_bits(), Ordering::Release);
    }

    /// Latest published value
    #[inline(always)]
    pub fn load(&self) -> f32 {
        f32::from_bits(self.bits.load(Ordering::Acquire))
    }
}

impl Default for ControlCell {
    fn default() -> Self {
        Self::zero()
    }
}
