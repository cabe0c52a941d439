//! Validation lifecycle state.

use std::sync::atomic::{AtomicU64, Ordering};

/// Process-wide state of the transaction validation subsystem.
///
/// Validation refuses to run until [`ValidationContext::init`] has been
/// called. `init` and [`ValidationContext::reset`] take `&mut self`, so they
/// cannot overlap in-flight validation, which only needs `&self` and can
/// therefore run from many threads over a shared context.
#[derive(Debug, Default)]
pub struct ValidationContext {
    initialized: bool,
    validated: AtomicU64,
    rejected: AtomicU64,
    signature_failures: AtomicU64,
}

/// Point-in-time copy of the counters accumulated since the last reset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ValidationStats {
    pub validated: u64,
    pub rejected: u64,
    /// Tolerated and fatal signature failures combined.
    pub signature_failures: u64,
}

impl ValidationContext {
    /// Creates an uninitialized context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a context that is ready for validation.
    pub fn initialized() -> Self {
        let mut ctx = Self::new();
        ctx.init();
        ctx
    }

    /// Marks the subsystem as initialized.
    pub fn init(&mut self) {
        self.initialized = true;
    }

    /// Clears the counters accumulated over a processing batch.
    ///
    /// The context stays initialized.
    pub fn reset(&mut self) {
        *self.validated.get_mut() = 0;
        *self.rejected.get_mut() = 0;
        *self.signature_failures.get_mut() = 0;
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn stats(&self) -> ValidationStats {
        ValidationStats {
            validated: self.validated.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            signature_failures: self.signature_failures.load(Ordering::Relaxed),
        }
    }

    pub(crate) fn record(&self, accepted: bool, signature_failures: usize) {
        if accepted {
            self.validated.fetch_add(1, Ordering::Relaxed);
        } else {
            self.rejected.fetch_add(1, Ordering::Relaxed);
        }
        self.signature_failures
            .fetch_add(signature_failures as u64, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_context_is_not_initialized() {
        let ctx = ValidationContext::new();
        assert!(!ctx.is_initialized());
        assert!(ValidationContext::initialized().is_initialized());
    }

    #[test]
    fn reset_clears_counters_but_keeps_init() {
        let mut ctx = ValidationContext::initialized();
        ctx.record(true, 0);
        ctx.record(false, 11);
        ctx.record(true, 2);

        assert_eq!(
            ctx.stats(),
            ValidationStats {
                validated: 2,
                rejected: 1,
                signature_failures: 13,
            }
        );

        ctx.reset();
        assert_eq!(ctx.stats(), ValidationStats::default());
        assert!(ctx.is_initialized());
    }
}
