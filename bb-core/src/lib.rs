//! Motion and sensing core for the I2C-driven Brainybot on no-std embedded platforms.
//!
//! For a runnable host simulation, see the `bb-app/mock-mcu` crate.
#![no_std]

pub mod utils;

#[doc(hidden)]
pub use static_cell;
