//! Simulated servo bank for CI and headless development.
//!
//! [`SimServoBank`] records every commanded pose and returns plausible state,
//! so the full stack runs in tests without any physical hardware on the bus.

use hexos_types::{HexError, JointAngles, LEG_COUNT};
use tracing::trace;

use crate::servo::{check_leg_id, clamp_leg, ServoBank};

/// An in-memory servo bank that records the last commanded angles per leg
/// and counts total writes. Always succeeds for valid leg ids.
#[derive(Default)]
pub struct SimServoBank {
    legs: [Option<JointAngles>; LEG_COUNT],
    writes: u64,
}

impl SimServoBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of per-leg writes since construction.
    pub fn write_count(&self) -> u64 {
        self.writes
    }
}

impl ServoBank for SimServoBank {
    fn set_leg_angles(&mut self, leg_id: usize, angles: JointAngles) -> Result<(), HexError> {
        check_leg_id(leg_id)?;
        let clamped = clamp_leg(angles);
        trace!(
            leg_id,
            coxa = clamped.coxa,
            femur = clamped.femur,
            tibia = clamped.tibia,
            "sim servo write"
        );
        self.legs[leg_id] = Some(clamped);
        self.writes += 1;
        Ok(())
    }

    fn leg_angles(&self, leg_id: usize) -> Option<JointAngles> {
        self.legs.get(leg_id).copied().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_last_commanded_angles() {
        let mut bank = SimServoBank::new();
        bank.set_leg_angles(
            2,
            JointAngles {
                coxa: 100.0,
                femur: 80.0,
                tibia: 95.0,
            },
        )
        .unwrap();
        let angles = bank.leg_angles(2).unwrap();
        assert!((angles.coxa - 100.0).abs() < f32::EPSILON);
        assert_eq!(bank.write_count(), 1);
    }

    #[test]
    fn clamps_before_recording() {
        let mut bank = SimServoBank::new();
        bank.set_leg_angles(
            0,
            JointAngles {
                coxa: 250.0,
                femur: -15.0,
                tibia: f32::NAN,
            },
        )
        .unwrap();
        let angles = bank.leg_angles(0).unwrap();
        assert!((angles.coxa - 180.0).abs() < f32::EPSILON);
        assert!((angles.femur - 0.0).abs() < f32::EPSILON);
        assert!(angles.tibia.is_finite());
    }

    #[test]
    fn rejects_invalid_leg_id() {
        let mut bank = SimServoBank::new();
        let result = bank.set_leg_angles(9, JointAngles::NEUTRAL);
        assert!(matches!(result, Err(HexError::HardwareFault { .. })));
    }

    #[test]
    fn uncommanded_leg_reports_none() {
        let bank = SimServoBank::new();
        assert!(bank.leg_angles(4).is_none());
        assert!(bank.leg_angles(99).is_none());
    }
}
