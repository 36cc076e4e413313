//! Types and third-party crates that are shared between the satchel crates.
//!
//! The crates are re-exported so that every crate in the workspace uses the
//! same versions without listing them again.

mod resources;

pub use resources::*;

pub use ahash;
pub use chrono;
pub use crossbeam_channel;
pub use derive_more;
pub use indoc;
pub use log;
pub use parking_lot;
pub use serde_yaml;
pub use thiserror;

/// Name of the function this macro is called in
#[macro_export]
macro_rules! function_name {
    () => {{
        fn f() {}
        fn type_name_of<T>(_: T) -> &'static str {
            std::any::type_name::<T>()
        }
        let name = type_name_of(f);
        &name[..name.len() - 3]
    }};
}
