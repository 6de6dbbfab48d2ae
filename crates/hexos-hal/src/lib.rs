//! `hexos-hal` – servo hardware abstraction.
//!
//! The gait layer emits per-leg `(leg_id, coxa, femur, tibia)` writes; this
//! crate defines the trait boundary those writes cross and ships a simulated
//! implementation for tests and headless runs.
//!
//! # Modules
//!
//! - [`servo`] – the [`ServoBank`][servo::ServoBank] trait plus the final
//!   [0°, 180°] clamp every implementation applies before touching the bus.
//! - [`sim`] – [`SimServoBank`][sim::SimServoBank]: an in-memory bank that
//!   records commanded poses so the full stack can run without hardware.
//!
//! Real bus drivers (e.g. a PCA9685 PWM controller) implement
//! [`ServoBank`][servo::ServoBank] out of tree and are selected at
//! construction time; nothing above this crate branches on a simulation flag.

pub mod servo;
pub mod sim;

pub use servo::{clamp_leg, clamp_servo_deg, ServoBank, SERVO_MAX_DEG, SERVO_MIN_DEG};
pub use sim::SimServoBank;
