//! Analytic per-leg inverse kinematics.
//!
//! [`solve`] maps a foot target in the leg's body-relative frame to the three
//! servo angles, pure and stateless. Targets beyond the leg's physical reach
//! are pulled back onto the reach sphere rather than rejected, so the solver
//! always returns three finite angles for any finite input.

use hexos_types::JointAngles;

/// Immutable segment lengths of one leg, in millimeters. All six legs share
/// the same geometry on this symmetric frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LegGeometry {
    pub coxa_mm: f32,
    pub femur_mm: f32,
    pub tibia_mm: f32,
}

impl LegGeometry {
    /// Maximum planar reach of the femur+tibia pair beyond the coxa tip.
    pub fn max_reach_mm(&self) -> f32 {
        self.femur_mm + self.tibia_mm
    }
}

impl Default for LegGeometry {
    fn default() -> Self {
        Self {
            coxa_mm: 30.0,
            femur_mm: 60.0,
            tibia_mm: 80.0,
        }
    }
}

/// Result of one IK solve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IkSolution {
    /// Servo-space angles: (90°, 90°, 90°) is the neutral pose. Not yet
    /// clamped to the servo's absolute range; that is the governor's and the
    /// actuator driver's job.
    pub angles: JointAngles,
    /// `true` when the target was beyond reach and the solve used the
    /// clamped maximum distance instead.
    pub clamped: bool,
}

/// Clamp a law-of-cosines argument into acos's domain. Degenerate inputs
/// (0/0 from a target on the coxa axis) collapse to 1.0 (zero angle).
fn clamp_cos(v: f32) -> f32 {
    if v.is_nan() {
        1.0
    } else {
        v.clamp(-1.0, 1.0)
    }
}

/// Solve the leg IK for a foot target `(x, y, z)` relative to the coxa
/// joint: x forward, y lateral, z up (negative = below the body).
pub fn solve(geometry: &LegGeometry, x: f32, y: f32, z: f32) -> IkSolution {
    // Coxa rotates about the vertical axis; 90° servo = longitudinal center.
    let coxa_deg = y.atan2(x).to_degrees();

    // Planar reach past the coxa segment, then 3D distance to the target.
    let r = (x * x + y * y).sqrt() - geometry.coxa_mm;
    let mut d = (r * r + z * z).sqrt();

    let max_reach = geometry.max_reach_mm();
    let clamped = d > max_reach;
    if clamped {
        d = max_reach;
    }
    // Keep the law-of-cosines denominators away from zero.
    d = d.max(1e-6);

    let femur = geometry.femur_mm;
    let tibia = geometry.tibia_mm;

    // Angle between the femur and the line to the target.
    let cos_femur = (femur * femur + d * d - tibia * tibia) / (2.0 * femur * d);
    let femur_deg = clamp_cos(cos_femur).acos().to_degrees() + z.atan2(r).to_degrees();

    // Interior knee angle between femur and tibia.
    let cos_tibia = (femur * femur + tibia * tibia - d * d) / (2.0 * femur * tibia);
    let tibia_deg = 180.0 - clamp_cos(cos_tibia).acos().to_degrees();

    // Map the geometric angles into servo space: 90° coxa is centered, 90°
    // femur is horizontal, 90° tibia is perpendicular to the femur.
    IkSolution {
        angles: JointAngles {
            coxa: 90.0 + coxa_deg,
            femur: 90.0 - femur_deg,
            tibia: 180.0 - tibia_deg,
        },
        clamped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geom() -> LegGeometry {
        LegGeometry::default()
    }

    #[test]
    fn returns_finite_angles_for_ordinary_targets() {
        let targets = [
            (40.0, 30.0, -50.0),
            (0.0, 30.0, -50.0),
            (-40.0, -30.0, -50.0),
            (60.0, 0.0, -80.0),
            (40.0, 30.0, 20.0),
        ];
        for (x, y, z) in targets {
            let sol = solve(&geom(), x, y, z);
            assert!(sol.angles.is_finite(), "non-finite solution for ({x},{y},{z})");
        }
    }

    #[test]
    fn returns_finite_angles_for_degenerate_targets() {
        for (x, y, z) in [(0.0, 0.0, 0.0), (30.0, 0.0, 0.0), (0.0, 0.0, -1.0)] {
            let sol = solve(&geom(), x, y, z);
            assert!(sol.angles.is_finite(), "non-finite solution for ({x},{y},{z})");
        }
    }

    #[test]
    fn out_of_reach_target_is_clamped_to_full_extension() {
        // 1000 mm straight ahead is far beyond the 140 mm reach: the leg
        // fully extends along the reach direction.
        let sol = solve(&geom(), 1000.0, 0.0, 0.0);
        assert!(sol.clamped);
        assert!(sol.angles.is_finite());
        // Fully extended: femur angle 0 (servo 90), knee straight (servo 180).
        assert!((sol.angles.coxa - 90.0).abs() < 1e-3);
        assert!((sol.angles.femur - 90.0).abs() < 1e-3);
        assert!((sol.angles.tibia - 180.0).abs() < 1e-3);
    }

    #[test]
    fn reachable_target_is_not_flagged() {
        let sol = solve(&geom(), 60.0, 0.0, -50.0);
        assert!(!sol.clamped);
    }

    #[test]
    fn coxa_angle_is_symmetric_about_centerline() {
        let left = solve(&geom(), 40.0, 30.0, -50.0);
        let right = solve(&geom(), 40.0, -30.0, -50.0);
        let left_offset = left.angles.coxa - 90.0;
        let right_offset = right.angles.coxa - 90.0;
        assert!((left_offset + right_offset).abs() < 1e-3);
    }

    #[test]
    fn lateral_target_turns_coxa_a_quarter_turn() {
        // Target straight to the side: atan2(30, 0) = 90°, servo = 180°.
        let sol = solve(&geom(), 0.0, 30.0, -50.0);
        assert!((sol.angles.coxa - 180.0).abs() < 1e-3);
    }

    #[test]
    fn solver_is_deterministic() {
        let a = solve(&geom(), 40.0, 30.0, -50.0);
        let b = solve(&geom(), 40.0, 30.0, -50.0);
        assert_eq!(a, b);
    }
}
