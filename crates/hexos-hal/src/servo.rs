//! Generic [`ServoBank`] trait for the 18-servo leg array.
//!
//! Drivers implement this trait; the gait layer only ever talks to the
//! trait, so the physical bus driver can be swapped for the simulated one
//! without touching kinematics or decision logic.

use hexos_types::{HexError, JointAngles, LEG_COUNT};

/// Lowest angle a leg servo accepts, in degrees.
pub const SERVO_MIN_DEG: f32 = 0.0;
/// Highest angle a leg servo accepts, in degrees.
pub const SERVO_MAX_DEG: f32 = 180.0;

/// Clamp a single servo command into the hardware's [0°, 180°] range.
///
/// Non-finite inputs collapse to the range minimum so a NaN can never reach
/// the bus.
pub fn clamp_servo_deg(angle: f32) -> f32 {
    if !angle.is_finite() {
        return SERVO_MIN_DEG;
    }
    angle.clamp(SERVO_MIN_DEG, SERVO_MAX_DEG)
}

/// Clamp all three joints of a leg command.
pub fn clamp_leg(angles: JointAngles) -> JointAngles {
    JointAngles {
        coxa: clamp_servo_deg(angles.coxa),
        femur: clamp_servo_deg(angles.femur),
        tibia: clamp_servo_deg(angles.tibia),
    }
}

/// A bank of position-controlled leg servos, three per leg.
///
/// Implementations are the final defense layer: they must clamp every angle
/// to [0°, 180°] before it reaches the wire, regardless of what the upper
/// layers already validated.
pub trait ServoBank: Send {
    /// Command all three joints of leg `leg_id` (0..6).
    ///
    /// # Errors
    ///
    /// Returns [`HexError::HardwareFault`] when `leg_id` is out of range or
    /// the underlying bus write fails.
    fn set_leg_angles(&mut self, leg_id: usize, angles: JointAngles) -> Result<(), HexError>;

    /// The most recently commanded angles for `leg_id`, if any command has
    /// been issued since startup.
    fn leg_angles(&self, leg_id: usize) -> Option<JointAngles>;
}

/// Shared guard for implementations: reject leg ids outside 0..6.
pub(crate) fn check_leg_id(leg_id: usize) -> Result<(), HexError> {
    if leg_id >= LEG_COUNT {
        return Err(HexError::HardwareFault {
            component: format!("leg_{leg_id}"),
            details: format!("leg id {leg_id} out of range 0..{LEG_COUNT}"),
        });
    }
    Ok(())
}
