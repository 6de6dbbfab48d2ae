//! `hexos-kernel` – safety enforcement.
//!
//! The kernel does not decide anything; it bounds what the deciders may do.
//!
//! # Modules
//!
//! - [`safety`] – [`MotionSafetyGovernor`][safety::MotionSafetyGovernor]:
//!   the single interception point every motion command passes through.
//!   Unknown commands degrade to `Stop`, numeric fields are clamped into
//!   hardware-safe bounds, and nearby obstacles further restrict movement.
//! - [`watchdog`] – [`TickWatchdog`][watchdog::TickWatchdog]: judges each
//!   control-loop tick against a wall-clock budget so the loop can recover
//!   to a safe pose after an overrun.

pub mod safety;
pub mod watchdog;

pub use safety::MotionSafetyGovernor;
pub use watchdog::{TickVerdict, TickWatchdog};
