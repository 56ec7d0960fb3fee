//! Persistence: the program state saved at shutdown and restored at startup.
//!
//! # Invariants
//! - A load replaces every field or none.
//! - A missing file is not an error; defaults apply.
//! - State is written once at clean shutdown, never mid-run.

mod state;

pub use state::{FIELD_COUNT, PersistError, PersistedState};

pub fn crate_info() -> &'static str {
    concat!("skyisle-persist v", env!("CARGO_PKG_VERSION"))
}
