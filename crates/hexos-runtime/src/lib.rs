//! `hexos-runtime` – decision making and the control loop.
//!
//! Everything above the kernel: how the robot picks its next action and how
//! that choice is driven, tick by tick, into the gait layer.
//!
//! # Modules
//!
//! - [`reasoning`] – [`RemoteReasoningClient`][reasoning::RemoteReasoningClient]:
//!   OpenAI-compatible chat client with a prioritized model list, per-model
//!   retry with backoff, and session-permanent skipping of dead models.
//! - [`arbiter`] – [`BehaviorArbiter`][arbiter::BehaviorArbiter]: sticky
//!   priority selection over the registered local behaviors (obstacle
//!   avoidance, target navigation, exploration).
//! - [`pipeline`] – [`DecisionPipeline`][pipeline::DecisionPipeline]: the
//!   per-tick orchestrator. Rate limit → remote attempt → required-mode
//!   fail-safe → local fallback; every outcome is governor-sanitized.
//! - [`control_loop`] – [`ControlLoop`][control_loop::ControlLoop]: the
//!   single-threaded tick driver that owns all mutable robot state.
//! - [`nav`] – bearing, distance, and heading math.
//! - [`telemetry`] – tracing + OpenTelemetry initialisation.

pub mod arbiter;
pub mod control_loop;
pub mod nav;
pub mod pipeline;
pub mod reasoning;
pub mod telemetry;

pub use arbiter::{Behavior, BehaviorArbiter, BehaviorStats};
pub use control_loop::{ControlLoop, ControlLoopConfig, SensorRig, StatusSnapshot, TickReport};
pub use pipeline::{Decision, DecisionPipeline, PipelineConfig, ProvenanceCounts};
pub use reasoning::{
    ChatMessage, RemoteReasoningClient, RemoteReasoningConfig, RemoteReasoningError, Role,
};
