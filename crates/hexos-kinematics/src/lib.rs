//! `hexos-kinematics` – leg geometry, IK, and gait sequencing.
//!
//! Everything between "the governor approved this command" and "these servo
//! angles go on the bus" lives here.
//!
//! # Modules
//!
//! - [`solver`] – analytic per-leg inverse kinematics: foot target in, three
//!   servo angles out, always finite.
//! - [`leg`] – per-leg state, body anchor offsets, and the fixed tripod
//!   partition.
//! - [`gait`] – [`GaitSequencer`][gait::GaitSequencer]: composes solver calls
//!   into tripod walking, turning, crab walking, and the choreography moves.

pub mod gait;
pub mod leg;
pub mod solver;

pub use gait::{GaitParams, GaitSequencer};
pub use leg::{LegState, LEG_ANCHORS_MM, TRIPOD_A, TRIPOD_B};
pub use solver::{solve, IkSolution, LegGeometry};
