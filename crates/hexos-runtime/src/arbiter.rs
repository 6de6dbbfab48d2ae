//! [`BehaviorArbiter`] – priority-based local decision fallback.
//!
//! When no remote reasoner is available the arbiter picks the next action
//! from a fixed registry of [`Behavior`]s. Selection is sticky: the active
//! behavior keeps control as long as its activation predicate holds, so two
//! equally eligible behaviors cannot oscillate tick to tick. When the active
//! behavior stops wanting control the highest-priority eligible behavior is
//! selected, ties broken by registration order (first registered wins). With
//! no eligible behavior the arbiter emits `Idle`.
//!
//! A behavior that fails during execution has its failure counted, loses its
//! active slot (forcing re-selection next tick), and the tick degrades to
//! `Stop`.
//!
//! Turn convention throughout: positive angle = left, negative = right.

use hexos_types::{Action, ActionCommand, DecisionContext, HexError, OBSTACLE_PROXIMITY_MM};
use tracing::{debug, info, warn};

use crate::nav::signed_delta_deg;

// ────────────────────────────────────────────────────────────────────────────
// Behavior trait
// ────────────────────────────────────────────────────────────────────────────

/// One locally computed reactive policy. Adding a behavior is a compile-time
/// registration into [`BehaviorArbiter::with_default_behaviors`] (or an
/// explicit [`BehaviorArbiter::register`] call), never a runtime plugin.
pub trait Behavior: Send {
    fn name(&self) -> &'static str;

    /// Higher wins. Ties go to the earlier registration.
    fn priority(&self) -> u8;

    /// Whether this behavior wants control given the current snapshot.
    fn wants_activation(&self, ctx: &DecisionContext) -> bool;

    /// Produce this tick's command.
    fn decide(&mut self, ctx: &DecisionContext) -> Result<ActionCommand, HexError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Built-in behaviors
// ────────────────────────────────────────────────────────────────────────────

/// Avoidance turn magnitude, degrees.
const AVOID_TURN_DEG: f32 = 45.0;
/// Camera frame width assumed when the snapshot carries none.
const DEFAULT_FRAME_WIDTH_PX: f32 = 640.0;
/// Navigation counts as arrived below this distance.
const ARRIVAL_TOLERANCE_M: f32 = 5.0;
/// Heading error below which navigation walks instead of turning.
const HEADING_TOLERANCE_DEG: f32 = 10.0;

/// Priority 9: turn away from any obstacle inside the proximity radius.
#[derive(Debug, Default)]
pub struct AvoidObstacle;

impl Behavior for AvoidObstacle {
    fn name(&self) -> &'static str {
        "avoid_obstacle"
    }

    fn priority(&self) -> u8 {
        9
    }

    fn wants_activation(&self, ctx: &DecisionContext) -> bool {
        ctx.has_obstacle_within(OBSTACLE_PROXIMITY_MM)
    }

    fn decide(&mut self, ctx: &DecisionContext) -> Result<ActionCommand, HexError> {
        let Some(obstacle) = ctx.obstacles.first() else {
            return Ok(ActionCommand::from(Action::Stop));
        };
        let center_x = obstacle.position[0];
        let frame_width = if ctx.frame_width == 0 {
            DEFAULT_FRAME_WIDTH_PX
        } else {
            ctx.frame_width as f32
        };
        // Turn away from the side of the frame the obstacle sits on.
        let angle = if center_x < frame_width / 2.0 {
            -AVOID_TURN_DEG
        } else {
            AVOID_TURN_DEG
        };
        info!(center_x, angle, "avoiding obstacle");
        Ok(ActionCommand::from(Action::Turn { angle, steps: 2 }))
    }
}

/// Priority 7: steer toward the navigation target, then walk it down.
#[derive(Debug, Default)]
pub struct NavigateToTarget;

impl Behavior for NavigateToTarget {
    fn name(&self) -> &'static str {
        "navigate_to_target"
    }

    fn priority(&self) -> u8 {
        7
    }

    fn wants_activation(&self, ctx: &DecisionContext) -> bool {
        ctx.navigation_target.is_some()
    }

    fn decide(&mut self, ctx: &DecisionContext) -> Result<ActionCommand, HexError> {
        let Some(nav) = &ctx.navigation_info else {
            // Target set but no fix yet; hold position.
            return Ok(ActionCommand::from(Action::Stop));
        };
        if nav.distance < ARRIVAL_TOLERANCE_M {
            info!(distance = nav.distance, "reached navigation target");
            return Ok(ActionCommand::stop_with_reason("reached_target"));
        }

        let delta = signed_delta_deg(nav.bearing, ctx.heading);
        if delta.abs() > HEADING_TOLERANCE_DEG {
            debug!(bearing = nav.bearing, heading = ctx.heading, delta, "turning toward target");
            Ok(ActionCommand::from(Action::Turn {
                angle: delta,
                steps: 1,
            }))
        } else {
            Ok(ActionCommand::from(Action::WalkForward {
                steps: 1,
                speed: 0.1,
            }))
        }
    }
}

/// Priority 3: wander when nothing else wants control and no task is set.
#[derive(Debug, Default)]
pub struct Explore;

impl Behavior for Explore {
    fn name(&self) -> &'static str {
        "explore"
    }

    fn priority(&self) -> u8 {
        3
    }

    fn wants_activation(&self, ctx: &DecisionContext) -> bool {
        ctx.current_task.is_none()
    }

    fn decide(&mut self, ctx: &DecisionContext) -> Result<ActionCommand, HexError> {
        if ctx.obstacles.is_empty() {
            Ok(ActionCommand::from(Action::WalkForward {
                steps: 1,
                speed: 0.1,
            }))
        } else {
            // Something is visible but not yet close; veer off early.
            Ok(ActionCommand::from(Action::Turn {
                angle: AVOID_TURN_DEG,
                steps: 2,
            }))
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Arbiter
// ────────────────────────────────────────────────────────────────────────────

struct Registered {
    behavior: Box<dyn Behavior>,
    successes: u64,
    failures: u64,
}

/// Per-behavior diagnostics, offline inspection only. Selection never reads
/// these counters.
#[derive(Debug, Clone, PartialEq)]
pub struct BehaviorStats {
    pub name: &'static str,
    pub priority: u8,
    pub successes: u64,
    pub failures: u64,
    pub success_rate: f32,
    pub active: bool,
}

/// Sticky priority arbiter over the registered behavior list.
pub struct BehaviorArbiter {
    behaviors: Vec<Registered>,
    active: Option<usize>,
}

impl BehaviorArbiter {
    /// An arbiter with no behaviors; it will only ever emit `Idle`.
    pub fn new() -> Self {
        Self {
            behaviors: Vec::new(),
            active: None,
        }
    }

    /// The standard registry: obstacle avoidance, navigation, exploration.
    pub fn with_default_behaviors() -> Self {
        let mut arbiter = Self::new();
        arbiter.register(Box::new(AvoidObstacle));
        arbiter.register(Box::new(NavigateToTarget));
        arbiter.register(Box::new(Explore));
        arbiter
    }

    pub fn register(&mut self, behavior: Box<dyn Behavior>) {
        debug!(
            name = behavior.name(),
            priority = behavior.priority(),
            "registered behavior"
        );
        self.behaviors.push(Registered {
            behavior,
            successes: 0,
            failures: 0,
        });
    }

    /// Name of the currently active behavior, if any.
    pub fn active_behavior(&self) -> Option<&'static str> {
        self.active.map(|i| self.behaviors[i].behavior.name())
    }

    /// Run one selection + execution round for this tick.
    pub fn decide(&mut self, ctx: &DecisionContext) -> ActionCommand {
        let keep = self
            .active
            .is_some_and(|i| self.behaviors[i].behavior.wants_activation(ctx));
        if !keep {
            self.active = self.select(ctx);
        }

        let Some(index) = self.active else {
            return ActionCommand::from(Action::Idle);
        };

        let entry = &mut self.behaviors[index];
        match entry.behavior.decide(ctx) {
            Ok(cmd) => {
                entry.successes += 1;
                cmd
            }
            Err(err) => {
                warn!(
                    behavior = entry.behavior.name(),
                    %err,
                    "behavior failed; clearing active slot"
                );
                entry.failures += 1;
                self.active = None;
                ActionCommand::stop_with_reason("behavior_fault")
            }
        }
    }

    /// Highest-priority eligible behavior; earlier registration wins ties.
    fn select(&self, ctx: &DecisionContext) -> Option<usize> {
        let mut best: Option<usize> = None;
        for (i, entry) in self.behaviors.iter().enumerate() {
            if !entry.behavior.wants_activation(ctx) {
                continue;
            }
            let better = match best {
                Some(b) => entry.behavior.priority() > self.behaviors[b].behavior.priority(),
                None => true,
            };
            if better {
                best = Some(i);
            }
        }
        best
    }

    pub fn stats(&self) -> Vec<BehaviorStats> {
        self.behaviors
            .iter()
            .enumerate()
            .map(|(i, entry)| {
                let total = entry.successes + entry.failures;
                BehaviorStats {
                    name: entry.behavior.name(),
                    priority: entry.behavior.priority(),
                    successes: entry.successes,
                    failures: entry.failures,
                    success_rate: if total == 0 {
                        0.5
                    } else {
                        entry.successes as f32 / total as f32
                    },
                    active: self.active == Some(i),
                }
            })
            .collect()
    }
}

impl Default for BehaviorArbiter {
    fn default() -> Self {
        Self::with_default_behaviors()
    }
}
