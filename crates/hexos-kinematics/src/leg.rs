//! Per-leg state and the fixed tripod partition.

use hexos_types::{JointAngles, LEG_COUNT};

/// First tripod group: front-left, mid-right, rear-left.
pub const TRIPOD_A: [usize; 3] = [0, 3, 4];
/// Second tripod group: front-right, mid-left, rear-right.
pub const TRIPOD_B: [usize; 3] = [1, 2, 5];

/// Static body-relative anchor offset `(x, y)` of each coxa joint, in
/// millimeters. Order matches leg ids: FL, FR, ML, MR, RL, RR.
pub const LEG_ANCHORS_MM: [(f32, f32); LEG_COUNT] = [
    (40.0, 30.0),
    (40.0, -30.0),
    (0.0, 30.0),
    (0.0, -30.0),
    (-40.0, 30.0),
    (-40.0, -30.0),
];

/// Mutable state of one leg: identity, anchor offset, and the last commanded
/// joint angles. Owned exclusively by the gait sequencer; only gait phase
/// execution mutates the angles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LegState {
    pub leg_id: usize,
    /// Body-relative `(x, y)` anchor offset in millimeters.
    pub anchor: (f32, f32),
    /// Last commanded servo angles, held in [0°, 180°].
    pub angles: JointAngles,
}

impl LegState {
    /// A leg at its anchor with all joints at the neutral pose.
    pub fn new(leg_id: usize) -> Self {
        Self {
            leg_id,
            anchor: LEG_ANCHORS_MM[leg_id],
            angles: JointAngles::NEUTRAL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tripods_partition_all_legs_exactly_once() {
        let mut seen = [0u8; LEG_COUNT];
        for id in TRIPOD_A.iter().chain(TRIPOD_B.iter()) {
            seen[*id] += 1;
        }
        assert!(seen.iter().all(|&count| count == 1));
    }

    #[test]
    fn tripods_are_disjoint() {
        for a in TRIPOD_A {
            assert!(!TRIPOD_B.contains(&a));
        }
    }

    #[test]
    fn anchors_are_left_right_symmetric() {
        for pair in [(0usize, 1usize), (2, 3), (4, 5)] {
            let (lx, ly) = LEG_ANCHORS_MM[pair.0];
            let (rx, ry) = LEG_ANCHORS_MM[pair.1];
            assert!((lx - rx).abs() < f32::EPSILON);
            assert!((ly + ry).abs() < f32::EPSILON);
        }
    }

    #[test]
    fn new_leg_starts_neutral_at_its_anchor() {
        let leg = LegState::new(3);
        assert_eq!(leg.leg_id, 3);
        assert_eq!(leg.anchor, LEG_ANCHORS_MM[3]);
        assert_eq!(leg.angles, JointAngles::NEUTRAL);
    }
}
