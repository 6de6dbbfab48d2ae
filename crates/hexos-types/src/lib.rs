use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Any detected obstacle closer than this (millimeters) is treated as
/// "nearby" by both the safety governor and the obstacle-avoidance behavior.
pub const OBSTACLE_PROXIMITY_MM: f32 = 500.0;

/// Number of legs on the machine. Leg ids run 0..6.
pub const LEG_COUNT: usize = 6;

/// Sideways walking direction for the crab gait.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum CrabDirection {
    #[default]
    Left,
    Right,
}

/// Strict definition of the actions the decision layer is allowed to request.
/// The gait sequencer translates these into per-leg joint angles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// Walk forward with the tripod gait.
    WalkForward {
        #[serde(default = "default_steps")]
        steps: u32,
        /// Seconds per gait phase.
        #[serde(default = "default_speed")]
        speed: f32,
    },
    /// Rotate in place. Positive angle turns left, negative turns right.
    Turn {
        #[serde(default)]
        angle: f32,
        #[serde(default = "default_steps")]
        steps: u32,
    },
    /// Walk sideways.
    CrabWalk {
        #[serde(default)]
        direction: CrabDirection,
        #[serde(default = "default_steps")]
        steps: u32,
    },
    /// Move all legs to the standing pose.
    Stand,
    /// Lower the body to the seated pose.
    Sit,
    /// Lift and wave a single leg while the other five stay planted.
    Wave {
        #[serde(default)]
        leg_id: u8,
    },
    /// Fist-bump choreography with the front-right leg.
    FistBump,
    /// Body-tilt dance choreography.
    Dance,
    /// Track and follow a detected person (handled outside the gait layer).
    FollowPerson,
    /// Halt; legs hold their current position.
    Stop,
    /// Do nothing this tick.
    Idle,
    /// Keep executing whatever was last commanded (rate-limit short circuit).
    Continue,
}

fn default_steps() -> u32 {
    1
}

fn default_speed() -> f32 {
    0.1
}

impl Action {
    /// Stable snake_case label, used for metrics and log fields.
    pub fn label(&self) -> &'static str {
        match self {
            Action::WalkForward { .. } => "walk_forward",
            Action::Turn { .. } => "turn",
            Action::CrabWalk { .. } => "crab_walk",
            Action::Stand => "stand",
            Action::Sit => "sit",
            Action::Wave { .. } => "wave",
            Action::FistBump => "fist_bump",
            Action::Dance => "dance",
            Action::FollowPerson => "follow_person",
            Action::Stop => "stop",
            Action::Idle => "idle",
            Action::Continue => "continue",
        }
    }
}

/// One fully-formed command for a single decision tick.
///
/// Serializes to the wire shape `{"action": <tag>, ...fields, "reason"?,
/// "speech"?}`. The free-text fields carry no control semantics; the safety
/// governor truncates them to 200 characters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ActionCommand {
    #[serde(flatten)]
    pub action: Action,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speech: Option<String>,
}

impl ActionCommand {
    /// A `Stop` command tagged with a machine-readable reason.
    pub fn stop_with_reason(reason: impl Into<String>) -> Self {
        Self {
            action: Action::Stop,
            reason: Some(reason.into()),
            speech: None,
        }
    }
}

impl From<Action> for ActionCommand {
    fn from(action: Action) -> Self {
        Self {
            action,
            reason: None,
            speech: None,
        }
    }
}

/// Where a tick's command came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// The remote reasoning service produced it.
    Remote,
    /// The local behavior arbiter produced it.
    Local,
    /// The decision interval had not elapsed; `Continue` was short-circuited.
    RateLimited,
    /// Remote reasoning is mandatory and was unavailable; forced `Stop`.
    FailSafe,
}

/// Commanded angles for one leg's three servos, in degrees.
/// 90° on every joint is the neutral pose (leg straight down, centered).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JointAngles {
    pub coxa: f32,
    pub femur: f32,
    pub tibia: f32,
}

impl JointAngles {
    pub const NEUTRAL: JointAngles = JointAngles {
        coxa: 90.0,
        femur: 90.0,
        tibia: 90.0,
    };

    /// `true` when all three angles are finite.
    pub fn is_finite(&self) -> bool {
        self.coxa.is_finite() && self.femur.is_finite() && self.tibia.is_finite()
    }
}

/// A vision-detected obstacle: pixel position in the camera frame plus a
/// rough range estimate in millimeters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    /// `[x, y]` centroid in frame pixels.
    pub position: [f32; 2],
    /// Estimated range in millimeters.
    pub distance_estimate: f32,
}

/// A labelled vision detection (face, person, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub label: String,
    pub position: [f32; 2],
    pub confidence: f32,
}

/// Bearing and range from the current position to the navigation target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NavigationInfo {
    /// Compass bearing in degrees, 0–360, 0 = north.
    pub bearing: f32,
    /// Great-circle distance in meters.
    pub distance: f32,
}

/// A GPS coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// Immutable sensor snapshot taken once at the start of a decision tick.
///
/// The decision layer is read-only on this structure; a fresh snapshot is
/// built every tick and discarded afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DecisionContext {
    pub obstacles: Vec<Obstacle>,
    #[serde(default)]
    pub detections: Vec<Detection>,
    pub navigation_info: Option<NavigationInfo>,
    pub navigation_target: Option<GeoPoint>,
    /// Current compass heading in degrees, [0, 360).
    pub heading: f32,
    pub voice_command: Option<String>,
    pub current_task: Option<String>,
    pub frame_width: u32,
    pub frame_height: u32,
}

impl DecisionContext {
    /// Range of the closest detected obstacle, if any.
    pub fn nearest_obstacle_mm(&self) -> Option<f32> {
        self.obstacles
            .iter()
            .map(|o| o.distance_estimate)
            .min_by(|a, b| a.total_cmp(b))
    }

    /// `true` when any obstacle is closer than `range_mm`.
    pub fn has_obstacle_within(&self, range_mm: f32) -> bool {
        self.nearest_obstacle_mm()
            .is_some_and(|d| d < range_mm)
    }
}

/// Global error type spanning hardware faults, behavior faults, and remote
/// reasoning failures. All variants are recoverable within a tick; the
/// control loop never lets them propagate past the tick boundary.
#[derive(Error, Debug)]
pub enum HexError {
    #[error("hardware fault on {component}: {details}")]
    HardwareFault { component: String, details: String },

    #[error("behavior '{behavior}' failed: {details}")]
    BehaviorFault { behavior: String, details: String },

    #[error("remote reasoning failed: {0}")]
    RemoteReasoning(String),

    #[error("invalid command: {0}")]
    InvalidCommand(String),
}
