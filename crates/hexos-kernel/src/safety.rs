//! [`MotionSafetyGovernor`] – single interception point between decision
//! sources and the gait sequencer.
//!
//! Every command that could move a servo passes through
//! [`MotionSafetyGovernor::sanitize`] (raw JSON from the remote reasoner) or
//! [`MotionSafetyGovernor::sanitize_command`] (typed output from the local
//! arbiter) before it reaches motion code. The governor never rejects a tick:
//! unknown or malformed input degrades to `Stop`, and every numeric field is
//! clamped into its hardware-safe range.
//!
//! Sanitization is pure. The only inputs are the command and the current
//! sensor snapshot; the bounds are static constants in this module.

use hexos_types::{
    Action, ActionCommand, CrabDirection, DecisionContext, OBSTACLE_PROXIMITY_MM,
};
use serde_json::Value;
use tracing::{debug, warn};

// ────────────────────────────────────────────────────────────────────────────
// Bounds tables
// ────────────────────────────────────────────────────────────────────────────

const MIN_STEPS: u32 = 1;
const MAX_STEPS: u32 = 10;
const MIN_SPEED: f32 = 0.05;
const MAX_SPEED: f32 = 1.0;
const MAX_TURN_DEG: f32 = 180.0;
const MAX_WAVE_LEG: i64 = 5;
/// Free-text `reason` / `speech` fields are truncated to this many characters.
const MAX_TEXT_CHARS: usize = 200;
/// Maximum turn magnitude while an obstacle is inside the proximity radius.
const OBSTACLE_MAX_TURN_DEG: f32 = 30.0;

const DEFAULT_SPEED: f32 = 0.1;

// ────────────────────────────────────────────────────────────────────────────
// Governor
// ────────────────────────────────────────────────────────────────────────────

/// Stateless command sanitizer. See the module docs for the contract.
#[derive(Debug, Default, Clone, Copy)]
pub struct MotionSafetyGovernor;

impl MotionSafetyGovernor {
    pub fn new() -> Self {
        Self
    }

    /// Sanitize a raw JSON command, typically the parsed output of a remote
    /// reasoning call. A missing or unrecognized `action` tag yields
    /// `{action: "stop", reason: "unknown_action"}`; every other field is
    /// read defensively with a safe default.
    pub fn sanitize(&self, raw: &Value, ctx: &DecisionContext) -> ActionCommand {
        let Some(tag) = raw.get("action").and_then(Value::as_str) else {
            warn!(?raw, "command without an action tag; degrading to stop");
            return ActionCommand::stop_with_reason("unknown_action");
        };

        let action = match tag {
            "walk_forward" => Action::WalkForward {
                steps: read_steps(raw),
                speed: read_f32(raw, "speed", DEFAULT_SPEED).clamp(MIN_SPEED, MAX_SPEED),
            },
            "turn" => Action::Turn {
                angle: read_f32(raw, "angle", 0.0).clamp(-MAX_TURN_DEG, MAX_TURN_DEG),
                steps: read_steps(raw),
            },
            "crab_walk" => Action::CrabWalk {
                direction: read_direction(raw),
                steps: read_steps(raw),
            },
            "stand" => Action::Stand,
            "sit" => Action::Sit,
            "wave" => Action::Wave {
                leg_id: read_leg_id(raw),
            },
            "fist_bump" => Action::FistBump,
            "dance" => Action::Dance,
            "follow_person" => Action::FollowPerson,
            "stop" => Action::Stop,
            "idle" => Action::Idle,
            "continue" => Action::Continue,
            other => {
                warn!(action = other, "unrecognized action tag; degrading to stop");
                return ActionCommand::stop_with_reason("unknown_action");
            }
        };

        let cmd = ActionCommand {
            action,
            reason: read_text(raw, "reason"),
            speech: read_text(raw, "speech"),
        };
        self.restrict_for_obstacles(cmd, ctx)
    }

    /// Sanitize an already-typed command, the local arbiter path. The tag is
    /// known good here, so only the numeric clamps and the obstacle
    /// restriction apply.
    pub fn sanitize_command(&self, mut cmd: ActionCommand, ctx: &DecisionContext) -> ActionCommand {
        match &mut cmd.action {
            Action::WalkForward { steps, speed } => {
                *steps = (*steps).clamp(MIN_STEPS, MAX_STEPS);
                *speed = if speed.is_finite() {
                    speed.clamp(MIN_SPEED, MAX_SPEED)
                } else {
                    DEFAULT_SPEED
                };
            }
            Action::Turn { angle, steps } => {
                *angle = if angle.is_finite() {
                    angle.clamp(-MAX_TURN_DEG, MAX_TURN_DEG)
                } else {
                    0.0
                };
                *steps = (*steps).clamp(MIN_STEPS, MAX_STEPS);
            }
            Action::CrabWalk { steps, .. } => {
                *steps = (*steps).clamp(MIN_STEPS, MAX_STEPS);
            }
            Action::Wave { leg_id } => {
                *leg_id = (*leg_id).min(MAX_WAVE_LEG as u8);
            }
            _ => {}
        }
        cmd.reason = cmd.reason.map(truncate_text);
        cmd.speech = cmd.speech.map(truncate_text);
        self.restrict_for_obstacles(cmd, ctx)
    }

    /// With an obstacle inside the proximity radius, cap forward motion at a
    /// single step and turns at ±30° regardless of what was requested.
    fn restrict_for_obstacles(
        &self,
        mut cmd: ActionCommand,
        ctx: &DecisionContext,
    ) -> ActionCommand {
        if !ctx.has_obstacle_within(OBSTACLE_PROXIMITY_MM) {
            return cmd;
        }
        match &mut cmd.action {
            Action::WalkForward { steps, .. } if *steps > 1 => {
                debug!(requested = *steps, "obstacle nearby; restricting walk to one step");
                *steps = 1;
            }
            Action::Turn { angle, .. } if angle.abs() > OBSTACLE_MAX_TURN_DEG => {
                debug!(requested = *angle, "obstacle nearby; restricting turn angle");
                *angle = angle.clamp(-OBSTACLE_MAX_TURN_DEG, OBSTACLE_MAX_TURN_DEG);
            }
            _ => {}
        }
        cmd
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Field readers
// ────────────────────────────────────────────────────────────────────────────

fn read_steps(raw: &Value) -> u32 {
    let steps = raw
        .get("steps")
        .and_then(read_i64)
        .unwrap_or(MIN_STEPS as i64);
    steps.clamp(MIN_STEPS as i64, MAX_STEPS as i64) as u32
}

// Language models routinely emit integral floats ("steps": 5.0) for integer
// fields; accept those too. A float-to-int cast saturates, so NaN and
// infinities land on the clamp bounds.
fn read_i64(v: &Value) -> Option<i64> {
    v.as_i64().or_else(|| v.as_f64().map(|f| f as i64))
}

fn read_f32(raw: &Value, field: &str, default: f32) -> f32 {
    raw.get(field)
        .and_then(Value::as_f64)
        .map(|v| v as f32)
        .filter(|v| v.is_finite())
        .unwrap_or(default)
}

fn read_leg_id(raw: &Value) -> u8 {
    raw.get("leg_id")
        .and_then(read_i64)
        .unwrap_or(0)
        .clamp(0, MAX_WAVE_LEG) as u8
}

fn read_direction(raw: &Value) -> CrabDirection {
    match raw.get("direction").and_then(Value::as_str) {
        Some("right") => CrabDirection::Right,
        // "left", anything else, or missing all normalize to left.
        _ => CrabDirection::Left,
    }
}

fn read_text(raw: &Value, field: &str) -> Option<String> {
    raw.get(field)
        .and_then(Value::as_str)
        .map(|s| truncate_text(s.to_string()))
}

fn truncate_text(s: String) -> String {
    if s.chars().count() <= MAX_TEXT_CHARS {
        s
    } else {
        s.chars().take(MAX_TEXT_CHARS).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hexos_types::Obstacle;
    use serde_json::json;

    fn clear() -> DecisionContext {
        DecisionContext::default()
    }

    fn blocked() -> DecisionContext {
        DecisionContext {
            obstacles: vec![Obstacle {
                position: [320.0, 240.0],
                distance_estimate: 200.0,
            }],
            ..Default::default()
        }
    }

    #[test]
    fn bogus_tag_degrades_to_stop() {
        let gov = MotionSafetyGovernor::new();
        let cmd = gov.sanitize(&json!({"action": "bogus"}), &clear());
        assert_eq!(cmd.action, Action::Stop);
        assert_eq!(cmd.reason.as_deref(), Some("unknown_action"));
    }

    #[test]
    fn missing_tag_degrades_to_stop() {
        let gov = MotionSafetyGovernor::new();
        let cmd = gov.sanitize(&json!({"steps": 3}), &clear());
        assert_eq!(cmd.action, Action::Stop);
        assert_eq!(cmd.reason.as_deref(), Some("unknown_action"));
    }

    #[test]
    fn turn_angle_clamped_to_half_turn() {
        let gov = MotionSafetyGovernor::new();
        let cmd = gov.sanitize(&json!({"action": "turn", "angle": 999}), &clear());
        assert_eq!(
            cmd.action,
            Action::Turn {
                angle: 180.0,
                steps: 1
            }
        );
    }

    #[test]
    fn negative_wave_leg_clamped_to_zero() {
        let gov = MotionSafetyGovernor::new();
        let cmd = gov.sanitize(&json!({"action": "wave", "leg_id": -3}), &clear());
        assert_eq!(cmd.action, Action::Wave { leg_id: 0 });
    }

    #[test]
    fn oversized_wave_leg_clamped_to_five() {
        let gov = MotionSafetyGovernor::new();
        let cmd = gov.sanitize(&json!({"action": "wave", "leg_id": 42}), &clear());
        assert_eq!(cmd.action, Action::Wave { leg_id: 5 });
    }

    #[test]
    fn integral_float_fields_are_coerced() {
        let gov = MotionSafetyGovernor::new();
        let cmd = gov.sanitize(&json!({"action": "walk_forward", "steps": 5.0}), &clear());
        assert_eq!(
            cmd.action,
            Action::WalkForward {
                steps: 5,
                speed: 0.1
            }
        );

        let cmd = gov.sanitize(&json!({"action": "wave", "leg_id": 3.0}), &clear());
        assert_eq!(cmd.action, Action::Wave { leg_id: 3 });
    }

    #[test]
    fn walk_steps_and_speed_clamped() {
        let gov = MotionSafetyGovernor::new();
        let cmd = gov.sanitize(
            &json!({"action": "walk_forward", "steps": 50, "speed": 9.0}),
            &clear(),
        );
        assert_eq!(
            cmd.action,
            Action::WalkForward {
                steps: 10,
                speed: 1.0
            }
        );

        let cmd = gov.sanitize(
            &json!({"action": "walk_forward", "steps": 0, "speed": 0.0}),
            &clear(),
        );
        assert_eq!(
            cmd.action,
            Action::WalkForward {
                steps: 1,
                speed: 0.05
            }
        );
    }

    #[test]
    fn malformed_fields_fall_back_to_defaults() {
        let gov = MotionSafetyGovernor::new();
        let cmd = gov.sanitize(
            &json!({"action": "walk_forward", "steps": "lots", "speed": "fast"}),
            &clear(),
        );
        assert_eq!(
            cmd.action,
            Action::WalkForward {
                steps: 1,
                speed: 0.1
            }
        );
    }

    #[test]
    fn crab_direction_normalizes_to_left() {
        let gov = MotionSafetyGovernor::new();
        for dir in [json!("sideways"), json!(7), Value::Null] {
            let cmd = gov.sanitize(&json!({"action": "crab_walk", "direction": dir}), &clear());
            assert_eq!(
                cmd.action,
                Action::CrabWalk {
                    direction: CrabDirection::Left,
                    steps: 1
                }
            );
        }

        let cmd = gov.sanitize(
            &json!({"action": "crab_walk", "direction": "right", "steps": 2}),
            &clear(),
        );
        assert_eq!(
            cmd.action,
            Action::CrabWalk {
                direction: CrabDirection::Right,
                steps: 2
            }
        );
    }

    #[test]
    fn nearby_obstacle_forces_single_step() {
        let gov = MotionSafetyGovernor::new();
        let cmd = gov.sanitize(&json!({"action": "walk_forward", "steps": 8}), &blocked());
        assert_eq!(
            cmd.action,
            Action::WalkForward {
                steps: 1,
                speed: 0.1
            }
        );
    }

    #[test]
    fn nearby_obstacle_restricts_turn_angle() {
        let gov = MotionSafetyGovernor::new();
        let cmd = gov.sanitize(&json!({"action": "turn", "angle": -120}), &blocked());
        assert_eq!(
            cmd.action,
            Action::Turn {
                angle: -30.0,
                steps: 1
            }
        );
    }

    #[test]
    fn reason_and_speech_truncated_to_200_chars() {
        let gov = MotionSafetyGovernor::new();
        let long = "x".repeat(500);
        let cmd = gov.sanitize(
            &json!({"action": "stand", "reason": long, "speech": "hello"}),
            &clear(),
        );
        assert_eq!(cmd.reason.map(|r| r.chars().count()), Some(200));
        assert_eq!(cmd.speech.as_deref(), Some("hello"));
    }

    #[test]
    fn typed_path_applies_the_same_clamps() {
        let gov = MotionSafetyGovernor::new();
        let cmd = gov.sanitize_command(
            ActionCommand::from(Action::Turn {
                angle: 400.0,
                steps: 99,
            }),
            &clear(),
        );
        assert_eq!(
            cmd.action,
            Action::Turn {
                angle: 180.0,
                steps: 10
            }
        );
    }

    #[test]
    fn typed_path_restricts_for_obstacles() {
        let gov = MotionSafetyGovernor::new();
        let cmd = gov.sanitize_command(
            ActionCommand::from(Action::WalkForward {
                steps: 5,
                speed: 0.2,
            }),
            &blocked(),
        );
        assert_eq!(
            cmd.action,
            Action::WalkForward {
                steps: 1,
                speed: 0.2
            }
        );
    }

    #[test]
    fn sanitize_is_pure() {
        let gov = MotionSafetyGovernor::new();
        let raw = json!({"action": "turn", "angle": 45, "steps": 2});
        let a = gov.sanitize(&raw, &clear());
        let b = gov.sanitize(&raw, &clear());
        assert_eq!(a, b);
    }
}
