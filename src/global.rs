//! A process-wide default [`Registry`], for callers porting poke-style code
//! that expects a single implicit global IO space list rather than threading
//! a `Registry` value through every call.

use std::sync::{Mutex, MutexGuard, OnceLock};

use crate::registry::Registry;

static DEFAULT: OnceLock<Mutex<Registry>> = OnceLock::new();

fn default_registry() -> &'static Mutex<Registry> {
    DEFAULT.get_or_init(|| Mutex::new(Registry::new()))
}

/// Lock and hand back the process-wide default registry.
///
/// Poisoning (a prior holder of the lock panicked mid-call) is treated as
/// recoverable: the registry's invariants don't depend on any single call
/// completing, so the guard is unwrapped through the poison rather than
/// propagated.
pub fn lock() -> MutexGuard<'static, Registry> {
    match default_registry().lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Run `f` against the process-wide default registry.
pub fn with_default<R>(f: impl FnOnce(&mut Registry) -> R) -> R {
    f(&mut lock())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::IosFlags;

    #[test]
    fn default_registry_persists_across_calls() {
        let id = with_default(|reg| reg.open("*global-test*", IosFlags::default(), false).unwrap());
        with_default(|reg| {
            assert_eq!(reg.search("*global-test*"), Some(id));
            reg.close(id).unwrap();
        });
    }
}
