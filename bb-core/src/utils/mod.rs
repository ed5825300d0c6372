//! Utility re-exports and helper macros for the Brainybot.
//!
//! - `controllers`: peripheral, motion, line, sonar and head controllers plus
//!   the command dispatcher
//! - `math`: speed/duration kinematics for open-loop motion
//!
//! The `mk_static!` macro simplifies static initialization in no-std contexts.

pub mod controllers;
pub mod math;

pub use controllers::{SystemCommand, SystemController, COMMAND_CHANNEL};
pub use math::kinematics::SpeedProfile;

#[macro_export]
/// Initialize a no-std static cell and write the given value into it.
///
/// Creates a `static_cell::StaticCell` for type `$t`, initializes it with
/// `$val` and returns a `&'static mut` to the stored value. Panics if the
/// same invocation site runs twice.
macro_rules! mk_static {
    ($t:ty, $val:expr) => {{
        static STATIC_CELL: $crate::static_cell::StaticCell<$t> =
            $crate::static_cell::StaticCell::new();
        STATIC_CELL.uninit().write($val)
    }};
}
