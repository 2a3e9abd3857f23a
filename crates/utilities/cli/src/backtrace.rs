//! Helper to enable backtraces for the relay binaries.

use std::sync::Once;

static INIT: Once = Once::new();

/// Sets `RUST_BACKTRACE=1` unless the variable is already set.
///
/// Must be called before the runtime spawns any threads.
pub fn enable() {
    INIT.call_once(|| {
        if std::env::var_os("RUST_BACKTRACE").is_none() {
            // SAFETY: called once at startup, before any other thread reads the environment.
            unsafe { std::env::set_var("RUST_BACKTRACE", "1") };
        }
    });
}
