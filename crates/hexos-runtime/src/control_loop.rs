//! [`ControlLoop`] – the single-threaded tick orchestrator.
//!
//! One tick = read sensors → decide → execute the gait → judge the tick
//! against the watchdog budget → sleep until the next tick boundary. Gait
//! execution is synchronous and blocks the loop for its full duration, so
//! at most one motion sequence is ever in flight; a new command cannot be
//! issued while a previous sequence is still running.
//!
//! All mutable state (heading, behavior slots, history) is owned by the loop.
//! The only cross-thread input is the voice-command slot: a single-writer,
//! single-reader cell an operator console fills and the loop drains at the
//! top of the next tick. External observers read a [`StatusSnapshot`] taken
//! between ticks; they never mutate loop state directly.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use hexos_kernel::{TickVerdict, TickWatchdog};
use hexos_kinematics::GaitSequencer;
use hexos_types::{Action, ActionCommand, DecisionContext};
use tracing::{debug, error, info};

use crate::nav::normalize_heading;
use crate::pipeline::{Decision, DecisionPipeline, ProvenanceCounts};

// ────────────────────────────────────────────────────────────────────────────
// Public types
// ────────────────────────────────────────────────────────────────────────────

/// Source of per-tick sensor snapshots. The camera/ultrasonic/GPS stack
/// implements this out of tree; tests and headless runs use a canned rig.
pub trait SensorRig: Send {
    fn snapshot(&mut self) -> DecisionContext;
}

/// Single-writer, single-reader cell for operator voice commands. Filled by
/// a console thread, drained by the loop at the top of the next tick.
pub type VoiceSlot = Arc<Mutex<Option<String>>>;

/// What one tick did.
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub decision: Decision,
    /// The tick blew its watchdog budget and the loop recovered by sitting.
    pub overrun: bool,
}

/// Consistent read-only view for status displays, taken between ticks.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusSnapshot {
    pub heading: f32,
    pub tick_count: u64,
    pub decision_count: u64,
    pub provenance_counts: ProvenanceCounts,
    pub active_behavior: Option<&'static str>,
    pub last_command: Option<ActionCommand>,
    pub watchdog_overruns: u64,
}

#[derive(Debug, Clone)]
pub struct ControlLoopConfig {
    /// Sleep between ticks.
    pub tick_interval: Duration,
    /// Watchdog budget for one whole tick, gait execution included.
    pub tick_budget: Duration,
}

impl Default for ControlLoopConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(100),
            tick_budget: Duration::from_secs(10),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// ControlLoop
// ────────────────────────────────────────────────────────────────────────────

pub struct ControlLoop {
    pipeline: DecisionPipeline,
    sequencer: GaitSequencer,
    watchdog: TickWatchdog,
    rig: Box<dyn SensorRig>,
    config: ControlLoopConfig,
    heading: f32,
    voice_slot: VoiceSlot,
    running: Arc<AtomicBool>,
    tick_count: u64,
    last_decision: Option<Decision>,
}

impl ControlLoop {
    pub fn new(
        pipeline: DecisionPipeline,
        sequencer: GaitSequencer,
        rig: Box<dyn SensorRig>,
        config: ControlLoopConfig,
    ) -> Self {
        let watchdog = TickWatchdog::new(config.tick_budget);
        Self {
            pipeline,
            sequencer,
            watchdog,
            rig,
            config,
            heading: 0.0,
            voice_slot: Arc::new(Mutex::new(None)),
            running: Arc::new(AtomicBool::new(true)),
            tick_count: 0,
            last_decision: None,
        }
    }

    /// Handle the console uses to inject voice commands between ticks.
    pub fn voice_slot(&self) -> VoiceSlot {
        Arc::clone(&self.voice_slot)
    }

    /// Shared flag a signal handler clears to stop [`run`][Self::run].
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    pub fn status(&self) -> StatusSnapshot {
        StatusSnapshot {
            heading: self.heading,
            tick_count: self.tick_count,
            decision_count: self.pipeline.decision_count(),
            provenance_counts: self.pipeline.provenance_counts(),
            active_behavior: self.pipeline.arbiter().active_behavior(),
            last_command: self.last_decision.as_ref().map(|d| d.command.clone()),
            watchdog_overruns: self.watchdog.overrun_count(),
        }
    }

    /// Run one full tick. Errors inside the tick are recovered in place; the
    /// loop always makes forward progress.
    pub async fn tick(&mut self) -> TickReport {
        self.watchdog.tick_started();

        let mut ctx = self.rig.snapshot();
        ctx.heading = self.heading;
        if let Ok(mut slot) = self.voice_slot.lock() {
            if let Some(command) = slot.take() {
                debug!(command, "consumed voice command");
                ctx.voice_command = Some(command);
            }
        }

        let decision = self.pipeline.decide(&ctx).await;

        match self.sequencer.execute(&decision.command) {
            Ok(()) => {
                // Dead-reckon the heading from executed turns only; the
                // sanitized angle is what the legs actually did.
                if let Action::Turn { angle, .. } = decision.command.action {
                    self.heading = normalize_heading(self.heading + angle);
                }
            }
            Err(err) => {
                error!(%err, action = decision.command.action.label(), "gait execution failed");
            }
        }

        self.tick_count += 1;
        let overrun = matches!(self.watchdog.tick_finished(), TickVerdict::Overrun(_));
        if overrun {
            // Liveness recovery: park in the known-safe seated pose.
            if let Err(err) = self.sequencer.sit() {
                error!(%err, "failed to reach safe pose after tick overrun");
            }
        }

        self.last_decision = Some(decision.clone());
        TickReport { decision, overrun }
    }

    /// Stand up, tick until the shutdown flag clears, then sit down.
    pub async fn run(&mut self) {
        info!("control loop started");
        if let Err(err) = self.sequencer.stand() {
            error!(%err, "failed to reach standing pose at startup");
        }
        while self.running.load(Ordering::SeqCst) {
            self.tick().await;
            tokio::time::sleep(self.config.tick_interval).await;
        }
        info!("control loop stopping; parking in seated pose");
        if let Err(err) = self.sequencer.sit() {
            error!(%err, "failed to sit during shutdown");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arbiter::BehaviorArbiter;
    use crate::pipeline::PipelineConfig;
    use hexos_kernel::MotionSafetyGovernor;
    use hexos_kinematics::{GaitParams, LegGeometry};
    use hexos_hal::SimServoBank;
    use hexos_types::{Obstacle, Provenance};

    struct CannedRig(DecisionContext);

    impl SensorRig for CannedRig {
        fn snapshot(&mut self) -> DecisionContext {
            self.0.clone()
        }
    }

    fn control_loop(ctx: DecisionContext, budget: Duration) -> ControlLoop {
        let pipeline = DecisionPipeline::new(
            MotionSafetyGovernor::new(),
            BehaviorArbiter::with_default_behaviors(),
            None,
            PipelineConfig {
                decision_interval: Duration::ZERO,
                ..Default::default()
            },
        );
        let sequencer = GaitSequencer::new(
            LegGeometry::default(),
            GaitParams {
                time_scale: 0.0,
                ..Default::default()
            },
            Box::new(SimServoBank::new()),
        );
        ControlLoop::new(
            pipeline,
            sequencer,
            Box::new(CannedRig(ctx)),
            ControlLoopConfig {
                tick_interval: Duration::ZERO,
                tick_budget: budget,
            },
        )
    }

    #[tokio::test]
    async fn clear_field_tick_walks_forward() {
        let mut cl = control_loop(DecisionContext::default(), Duration::from_secs(60));
        let report = cl.tick().await;
        assert_eq!(report.decision.provenance, Provenance::Local);
        assert_eq!(
            report.decision.command.action,
            Action::WalkForward {
                steps: 1,
                speed: 0.1
            }
        );
        assert!(!report.overrun);
        assert_eq!(cl.status().tick_count, 1);
    }

    #[tokio::test]
    async fn executed_turn_updates_heading() {
        let ctx = DecisionContext {
            obstacles: vec![Obstacle {
                position: [100.0, 240.0],
                distance_estimate: 300.0,
            }],
            frame_width: 640,
            ..Default::default()
        };
        let mut cl = control_loop(ctx, Duration::from_secs(60));
        let report = cl.tick().await;

        // Obstacle on the left, proximity-restricted turn of -30°.
        assert_eq!(
            report.decision.command.action,
            Action::Turn {
                angle: -30.0,
                steps: 2
            }
        );
        assert_eq!(cl.status().heading, 330.0);
    }

    #[tokio::test]
    async fn voice_command_slot_is_drained_once() {
        let mut cl = control_loop(DecisionContext::default(), Duration::from_secs(60));
        let slot = cl.voice_slot();
        if let Ok(mut guard) = slot.lock() {
            *guard = Some("come here".to_string());
        }
        cl.tick().await;
        assert!(slot.lock().map(|g| g.is_none()).unwrap_or(false));
    }

    #[tokio::test]
    async fn overrun_tick_recovers_to_seated_pose() {
        let mut cl = control_loop(DecisionContext::default(), Duration::ZERO);
        let report = cl.tick().await;
        assert!(report.overrun);
        assert_eq!(cl.status().watchdog_overruns, 1);
    }

    #[tokio::test]
    async fn status_reports_last_command_and_behavior() {
        let mut cl = control_loop(DecisionContext::default(), Duration::from_secs(60));
        assert_eq!(cl.status().last_command, None);
        let report = cl.tick().await;
        let status = cl.status();
        assert_eq!(status.last_command, Some(report.decision.command));
        assert_eq!(status.active_behavior, Some("explore"));
        assert_eq!(status.provenance_counts.local, 1);
    }
}
