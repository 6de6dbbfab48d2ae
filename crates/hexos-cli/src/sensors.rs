//! Simulated sensor rig for headless operation.
//!
//! The real perception stack (camera, ultrasonic rangers, GPS) lives out of
//! tree and implements [`SensorRig`] against actual hardware. This rig
//! replays scripted snapshots and then settles on a clear field, which is
//! enough to exercise the whole decision and gait stack from a desk.

use std::collections::VecDeque;

use hexos_runtime::SensorRig;
use hexos_types::DecisionContext;

pub struct SimSensorRig {
    scripted: VecDeque<DecisionContext>,
    idle: DecisionContext,
}

impl SimSensorRig {
    /// A rig that always reports a clear 640x480 field.
    pub fn new() -> Self {
        Self {
            scripted: VecDeque::new(),
            idle: DecisionContext {
                frame_width: 640,
                frame_height: 480,
                ..Default::default()
            },
        }
    }

    /// Queue a snapshot to be returned before the idle field.
    pub fn push(&mut self, snapshot: DecisionContext) {
        self.scripted.push_back(snapshot);
    }
}

impl Default for SimSensorRig {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorRig for SimSensorRig {
    fn snapshot(&mut self) -> DecisionContext {
        self.scripted
            .pop_front()
            .unwrap_or_else(|| self.idle.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hexos_types::Obstacle;

    #[test]
    fn scripted_snapshots_replay_in_order_then_idle() {
        let mut rig = SimSensorRig::new();
        rig.push(DecisionContext {
            obstacles: vec![Obstacle {
                position: [100.0, 240.0],
                distance_estimate: 300.0,
            }],
            ..Default::default()
        });

        assert_eq!(rig.snapshot().obstacles.len(), 1);
        let idle = rig.snapshot();
        assert!(idle.obstacles.is_empty());
        assert_eq!(idle.frame_width, 640);
    }
}
