//! [`DecisionPipeline`] – the per-tick decision orchestrator.
//!
//! Each tick resolves to exactly one sanitized [`ActionCommand`], in this
//! order:
//!
//! 1. **Rate limit** – inside the decision interval the tick short-circuits
//!    to `Continue` without touching any other component.
//! 2. **Remote attempt** – with a configured remote reasoner, a bounded
//!    context (recent snapshot fields only, never the history) is sent out;
//!    a successful reply is sanitized by the governor and tagged `remote`.
//! 3. **Required-mode fail-safe** – when remote reasoning is mandatory and
//!    the attempt failed, the tick is a `Stop`. The arbiter is never
//!    consulted behind the operator's back.
//! 4. **Local fallback** – otherwise the [`BehaviorArbiter`] decides and the
//!    result is sanitized and tagged `local`.
//!
//! Every non-rate-limited tick is book-kept: a decision counter, a bounded
//! snapshot ring buffer, and per-provenance tallies.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use hexos_kernel::MotionSafetyGovernor;
use hexos_types::{Action, ActionCommand, DecisionContext, Provenance};
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::arbiter::BehaviorArbiter;
use crate::reasoning::{ChatMessage, RemoteReasoningClient, Role};

/// Snapshot ring-buffer capacity.
const HISTORY_CAPACITY: usize = 1000;
/// Obstacles included in the remote context message.
const CONTEXT_OBSTACLE_LIMIT: usize = 3;

const SYSTEM_PROMPT: &str = "\
You are the controller of an autonomous hexapod robot. \
You must output ONLY a single JSON object describing the next action.
Allowed actions and fields:
- {\"action\":\"walk_forward\",\"steps\":int,\"speed\":float}
- {\"action\":\"turn\",\"angle\":float,\"steps\":int}
- {\"action\":\"crab_walk\",\"direction\":\"left\"|\"right\",\"steps\":int}
- {\"action\":\"stand\"}
- {\"action\":\"sit\"}
- {\"action\":\"wave\",\"leg_id\":int}
- {\"action\":\"fist_bump\"}
- {\"action\":\"dance\"}
- {\"action\":\"follow_person\"}
- {\"action\":\"stop\"}
- {\"action\":\"idle\"}
Rules:
- Always choose a safe action. If uncertain, choose {\"action\":\"stop\"}.
- Optional keys: reason (short string), speech (short string to say aloud).
- Do not include any other keys. Never output code or markdown.";

// ────────────────────────────────────────────────────────────────────────────
// Public types
// ────────────────────────────────────────────────────────────────────────────

/// The outcome of one decision tick.
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub command: ActionCommand,
    pub provenance: Provenance,
}

/// One entry of the snapshot ring buffer.
#[derive(Debug, Clone)]
pub struct SnapshotRecord {
    pub timestamp: DateTime<Utc>,
    pub snapshot: DecisionContext,
}

/// Per-provenance decision tallies, for status display only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProvenanceCounts {
    pub remote: u64,
    pub local: u64,
    pub rate_limited: u64,
    pub fail_safe: u64,
}

/// Pipeline tuning knobs.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Identity the robot uses when talking to the remote reasoner.
    pub robot_name: String,
    /// Minimum wall-clock time between full decisions.
    pub decision_interval: Duration,
    /// When `true`, a failed remote attempt is a `Stop`, never a local
    /// fallback.
    pub remote_required: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            robot_name: "hexapod".to_string(),
            decision_interval: Duration::from_millis(500),
            remote_required: false,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Pipeline
// ────────────────────────────────────────────────────────────────────────────

pub struct DecisionPipeline {
    governor: MotionSafetyGovernor,
    arbiter: BehaviorArbiter,
    remote: Option<RemoteReasoningClient>,
    config: PipelineConfig,
    last_decision: Option<Instant>,
    decision_count: u64,
    history: VecDeque<SnapshotRecord>,
    counts: ProvenanceCounts,
}

impl DecisionPipeline {
    pub fn new(
        governor: MotionSafetyGovernor,
        arbiter: BehaviorArbiter,
        remote: Option<RemoteReasoningClient>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            governor,
            arbiter,
            remote,
            config,
            last_decision: None,
            decision_count: 0,
            history: VecDeque::with_capacity(HISTORY_CAPACITY),
            counts: ProvenanceCounts::default(),
        }
    }

    /// Resolve one tick to a sanitized command. Never fails; the worst
    /// outcome is a fail-safe `Stop`.
    pub async fn decide(&mut self, ctx: &DecisionContext) -> Decision {
        if let Some(last) = self.last_decision {
            if last.elapsed() < self.config.decision_interval {
                self.counts.rate_limited += 1;
                return Decision {
                    command: ActionCommand::from(Action::Continue),
                    provenance: Provenance::RateLimited,
                };
            }
        }
        self.last_decision = Some(Instant::now());
        self.decision_count += 1;
        self.record_snapshot(ctx);

        if let Some(raw) = self.try_remote(ctx).await {
            let command = self.governor.sanitize(&raw, ctx);
            self.counts.remote += 1;
            return Decision {
                command,
                provenance: Provenance::Remote,
            };
        }

        if self.config.remote_required {
            warn!("remote reasoning required but unavailable; failing safe");
            self.counts.fail_safe += 1;
            return Decision {
                command: ActionCommand::stop_with_reason("remote_unavailable"),
                provenance: Provenance::FailSafe,
            };
        }

        let command = self.governor.sanitize_command(self.arbiter.decide(ctx), ctx);
        self.counts.local += 1;
        Decision {
            command,
            provenance: Provenance::Local,
        }
    }

    /// Ask the remote reasoner for a raw command, or `None` when it is not
    /// configured or the attempt failed.
    async fn try_remote(&mut self, ctx: &DecisionContext) -> Option<Value> {
        let client = self.remote.as_mut()?;
        if !client.is_configured() {
            return None;
        }

        let messages = [
            ChatMessage {
                role: Role::System,
                content: SYSTEM_PROMPT.to_string(),
            },
            ChatMessage {
                role: Role::User,
                content: build_context_message(&self.config.robot_name, ctx),
            },
        ];

        match client.chat(&messages).await {
            Ok(content) => match serde_json::from_str::<Value>(&content) {
                Ok(raw) => {
                    debug!(%raw, "remote decision received");
                    Some(raw)
                }
                Err(err) => {
                    warn!(%err, content, "remote reply was not valid JSON");
                    None
                }
            },
            Err(err) => {
                warn!(%err, "remote reasoning attempt failed");
                None
            }
        }
    }

    fn record_snapshot(&mut self, ctx: &DecisionContext) {
        if self.history.len() == HISTORY_CAPACITY {
            self.history.pop_front();
        }
        self.history.push_back(SnapshotRecord {
            timestamp: Utc::now(),
            snapshot: ctx.clone(),
        });
    }

    pub fn decision_count(&self) -> u64 {
        self.decision_count
    }

    pub fn provenance_counts(&self) -> ProvenanceCounts {
        self.counts
    }

    pub fn history(&self) -> &VecDeque<SnapshotRecord> {
        &self.history
    }

    pub fn arbiter(&self) -> &BehaviorArbiter {
        &self.arbiter
    }
}

/// The bounded context sent to the remote reasoner: current snapshot fields
/// only, truncated obstacle list, no history.
fn build_context_message(name: &str, ctx: &DecisionContext) -> String {
    let obstacles: Vec<_> = ctx
        .obstacles
        .iter()
        .take(CONTEXT_OBSTACLE_LIMIT)
        .collect();
    json!({
        "name": name,
        "obstacles": obstacles,
        "navigation_info": ctx.navigation_info,
        "navigation_target": ctx.navigation_target,
        "heading": ctx.heading,
        "voice_command": ctx.voice_command,
        "current_task": ctx.current_task,
        "detections": ctx.detections.len(),
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reasoning::RemoteReasoningConfig;
    use hexos_types::Obstacle;

    fn pipeline(config: PipelineConfig) -> DecisionPipeline {
        DecisionPipeline::new(
            MotionSafetyGovernor::new(),
            BehaviorArbiter::with_default_behaviors(),
            None,
            config,
        )
    }

    fn blocked_ctx() -> DecisionContext {
        DecisionContext {
            obstacles: vec![Obstacle {
                position: [100.0, 240.0],
                distance_estimate: 300.0,
            }],
            frame_width: 640,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn second_call_inside_interval_is_rate_limited() {
        let mut p = pipeline(PipelineConfig {
            decision_interval: Duration::from_secs(60),
            ..Default::default()
        });
        let ctx = DecisionContext::default();

        let first = p.decide(&ctx).await;
        assert_ne!(first.provenance, Provenance::RateLimited);

        let second = p.decide(&ctx).await;
        assert_eq!(second.command.action, Action::Continue);
        assert_eq!(second.provenance, Provenance::RateLimited);
        // Rate-limited ticks do no bookkeeping beyond the tally.
        assert_eq!(p.decision_count(), 1);
        assert_eq!(p.history().len(), 1);
        assert_eq!(p.provenance_counts().rate_limited, 1);
    }

    #[tokio::test]
    async fn local_fallback_goes_through_the_arbiter_and_governor() {
        let mut p = pipeline(PipelineConfig {
            decision_interval: Duration::ZERO,
            ..Default::default()
        });
        let decision = p.decide(&blocked_ctx()).await;

        assert_eq!(decision.provenance, Provenance::Local);
        // Obstacle left of center: avoid_obstacle turns right, and the
        // governor leaves the in-bounds angle alone.
        assert_eq!(
            decision.command.action,
            Action::Turn {
                angle: -30.0,
                steps: 2
            }
        );
        assert_eq!(p.arbiter().active_behavior(), Some("avoid_obstacle"));
        assert_eq!(p.provenance_counts().local, 1);
    }

    #[tokio::test]
    async fn required_mode_fails_safe_without_consulting_the_arbiter() {
        let mut p = pipeline(PipelineConfig {
            decision_interval: Duration::ZERO,
            remote_required: true,
            ..Default::default()
        });
        // The snapshot would make avoid_obstacle fire if the arbiter ran.
        let decision = p.decide(&blocked_ctx()).await;

        assert_eq!(decision.command.action, Action::Stop);
        assert_eq!(decision.command.reason.as_deref(), Some("remote_unavailable"));
        assert_eq!(decision.provenance, Provenance::FailSafe);
        assert_eq!(p.arbiter().active_behavior(), None);
    }

    #[tokio::test]
    async fn unconfigured_remote_client_falls_back_locally() {
        let mut p = DecisionPipeline::new(
            MotionSafetyGovernor::new(),
            BehaviorArbiter::with_default_behaviors(),
            // No API key: the client refuses without any network traffic.
            Some(RemoteReasoningClient::new(RemoteReasoningConfig::default())),
            PipelineConfig {
                decision_interval: Duration::ZERO,
                ..Default::default()
            },
        );
        let decision = p.decide(&DecisionContext::default()).await;
        assert_eq!(decision.provenance, Provenance::Local);
    }

    #[tokio::test]
    async fn history_is_bounded() {
        let mut p = pipeline(PipelineConfig {
            decision_interval: Duration::ZERO,
            ..Default::default()
        });
        let ctx = DecisionContext::default();
        for _ in 0..(HISTORY_CAPACITY + 10) {
            p.decide(&ctx).await;
        }
        assert_eq!(p.history().len(), HISTORY_CAPACITY);
        assert_eq!(p.decision_count(), (HISTORY_CAPACITY + 10) as u64);
    }

    #[test]
    fn context_message_truncates_obstacles() {
        let ctx = DecisionContext {
            obstacles: (0..10)
                .map(|i| Obstacle {
                    position: [i as f32, 0.0],
                    distance_estimate: 1000.0,
                })
                .collect(),
            ..Default::default()
        };
        let msg = build_context_message("hexapod", &ctx);
        let parsed: Value = serde_json::from_str(&msg).unwrap();
        assert_eq!(parsed["obstacles"].as_array().unwrap().len(), 3);
    }
}
