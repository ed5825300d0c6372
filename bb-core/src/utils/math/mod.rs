//! Math utilities for the Brainybot.
//!
//! This module provides the speed/duration model used for open-loop motion.

pub mod kinematics;
