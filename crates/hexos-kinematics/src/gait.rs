//! [`GaitSequencer`] – coordinated multi-leg phase sequencing.
//!
//! Owns the six [`LegState`]s and composes solver calls into the tripod
//! gait (walk / turn / crab) plus the single-leg and choreography motions.
//! Every operation is a finite ordered sequence of leg-group moves that runs
//! to completion; a new command always starts a fresh phase sequence. At
//! every instant during the tripod gait at least one three-leg group stays
//! grounded, which is what keeps the machine statically stable.

use std::thread;
use std::time::Duration;

use hexos_hal::{clamp_leg, ServoBank};
use hexos_types::{Action, ActionCommand, CrabDirection, HexError, LEG_COUNT};
use tracing::{debug, info, warn};

use crate::leg::{LegState, TRIPOD_A, TRIPOD_B};
use crate::solver::{solve, LegGeometry};

/// Seated body height, used by `sit` and the watchdog's safe-pose recovery.
const SIT_HEIGHT_MM: f32 = -80.0;
/// Lower body height of the dance tilt.
const DANCE_LOW_MM: f32 = -70.0;
/// Foot height during the fist-bump reach.
const FIST_BUMP_HEIGHT_MM: f32 = 20.0;
/// Phase pause for choreography moves that take no speed parameter.
const CHOREO_PAUSE_SECS: f32 = 0.3;
/// Settle pause after whole-body pose changes (stand / sit).
const SETTLE_SECS: f32 = 0.5;

/// Fixed gait parameters for a given hardware configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaitParams {
    /// Foot height when a leg is planted (negative = below the body).
    pub stance_height_mm: f32,
    /// Foot height when a leg is lifted for repositioning.
    pub lift_height_mm: f32,
    /// Forward / lateral travel per step.
    pub step_length_mm: f32,
    /// Multiplier on all phase pauses. 1.0 commands real-time motion;
    /// 0.0 makes sequences instantaneous for tests and dry runs.
    pub time_scale: f32,
}

impl Default for GaitParams {
    fn default() -> Self {
        Self {
            stance_height_mm: -50.0,
            lift_height_mm: -30.0,
            step_length_mm: 30.0,
            time_scale: 1.0,
        }
    }
}

/// The six-legged gait engine. Owns all leg state and the servo bank; every
/// motion command in the system ultimately lands here.
pub struct GaitSequencer {
    geometry: LegGeometry,
    params: GaitParams,
    legs: [LegState; LEG_COUNT],
    bank: Box<dyn ServoBank>,
}

impl GaitSequencer {
    pub fn new(geometry: LegGeometry, params: GaitParams, bank: Box<dyn ServoBank>) -> Self {
        let legs = std::array::from_fn(LegState::new);
        Self {
            geometry,
            params,
            legs,
            bank,
        }
    }

    /// Read-only view of the per-leg state.
    pub fn legs(&self) -> &[LegState; LEG_COUNT] {
        &self.legs
    }

    /// The servo bank behind this sequencer (test and status inspection).
    pub fn bank(&self) -> &dyn ServoBank {
        self.bank.as_ref()
    }

    /// Dispatch one sanitized [`ActionCommand`] to the matching gait
    /// operation. Non-motion tags (`stop`, `idle`, `continue`,
    /// `follow_person`) are no-ops at this layer.
    pub fn execute(&mut self, cmd: &ActionCommand) -> Result<(), HexError> {
        match cmd.action {
            Action::WalkForward { steps, speed } => self.walk_forward(steps, speed),
            Action::Turn { angle, steps } => self.turn(angle, steps, 0.1),
            Action::CrabWalk { direction, steps } => self.crab_walk(direction, steps, 0.1),
            Action::Stand => self.stand(),
            Action::Sit => self.sit(),
            Action::Wave { leg_id } => self.wave(leg_id as usize),
            Action::FistBump => self.fist_bump(),
            Action::Dance => self.dance(),
            Action::FollowPerson | Action::Stop | Action::Idle | Action::Continue => {
                debug!(action = cmd.action.label(), "no gait motion for action");
                Ok(())
            }
        }
    }

    /// Move all legs to the standing pose at their anchors.
    pub fn stand(&mut self) -> Result<(), HexError> {
        info!("standing up");
        for id in 0..LEG_COUNT {
            let (x, y) = self.legs[id].anchor;
            self.move_leg(id, x, y, self.params.stance_height_mm)?;
        }
        self.pause(SETTLE_SECS);
        Ok(())
    }

    /// Lower the body to the seated pose. Also the watchdog's known-safe
    /// recovery target.
    pub fn sit(&mut self) -> Result<(), HexError> {
        info!("sitting down");
        for id in 0..LEG_COUNT {
            let (x, y) = self.legs[id].anchor;
            self.move_leg(id, x, y, SIT_HEIGHT_MM)?;
        }
        self.pause(SETTLE_SECS);
        Ok(())
    }

    /// Walk forward with the tripod gait: three phases per step, each with
    /// one tripod lifted while the other stays planted.
    pub fn walk_forward(&mut self, steps: u32, speed: f32) -> Result<(), HexError> {
        info!(steps, speed, "walking forward");
        let stride = self.params.step_length_mm;
        for _ in 0..steps {
            // Phase 1: lift tripod A, plant tripod B one stride forward.
            for id in TRIPOD_A {
                let (x, y) = self.legs[id].anchor;
                self.move_leg(id, x, y, self.params.lift_height_mm)?;
            }
            for id in TRIPOD_B {
                let (x, y) = self.legs[id].anchor;
                self.move_leg(id, x + stride, y, self.params.stance_height_mm)?;
            }
            self.pause(speed);

            // Phase 2: lower tripod A at its advanced position, lift tripod B.
            for id in TRIPOD_A {
                let (x, y) = self.legs[id].anchor;
                self.move_leg(id, x + stride, y, self.params.stance_height_mm)?;
            }
            for id in TRIPOD_B {
                let (x, y) = self.legs[id].anchor;
                self.move_leg(id, x, y, self.params.lift_height_mm)?;
            }
            self.pause(speed);

            // Phase 3: lower tripod B back at its anchors.
            for id in TRIPOD_B {
                let (x, y) = self.legs[id].anchor;
                self.move_leg(id, x, y, self.params.stance_height_mm)?;
            }
            self.pause(speed);
        }
        Ok(())
    }

    /// Rotate in place by `angle` degrees over `steps` steps. Each step
    /// rotates the tripod-A targets by `angle/steps` about the body center
    /// while the tripod support invariant holds.
    pub fn turn(&mut self, angle: f32, steps: u32, speed: f32) -> Result<(), HexError> {
        info!(angle, steps, "turning in place");
        let steps = steps.max(1);
        let rotation = (angle / steps as f32).to_radians();
        let (sin, cos) = rotation.sin_cos();
        for _ in 0..steps {
            // Phase 1: lift tripod A at its rotated targets.
            for id in TRIPOD_A {
                let (x, y) = self.legs[id].anchor;
                let rx = x * cos - y * sin;
                let ry = x * sin + y * cos;
                self.move_leg(id, rx, ry, self.params.lift_height_mm)?;
            }
            self.pause(speed);

            // Phase 2: plant tripod A rotated, lift tripod B at its anchors.
            for id in TRIPOD_A {
                let (x, y) = self.legs[id].anchor;
                let rx = x * cos - y * sin;
                let ry = x * sin + y * cos;
                self.move_leg(id, rx, ry, self.params.stance_height_mm)?;
            }
            for id in TRIPOD_B {
                let (x, y) = self.legs[id].anchor;
                self.move_leg(id, x, y, self.params.lift_height_mm)?;
            }
            self.pause(speed);

            // Phase 3: lower tripod B.
            for id in TRIPOD_B {
                let (x, y) = self.legs[id].anchor;
                self.move_leg(id, x, y, self.params.stance_height_mm)?;
            }
            self.pause(speed);
        }
        Ok(())
    }

    /// Walk sideways: the same three-phase structure as `walk_forward` with
    /// a lateral offset instead of a forward one.
    pub fn crab_walk(
        &mut self,
        direction: CrabDirection,
        steps: u32,
        speed: f32,
    ) -> Result<(), HexError> {
        info!(?direction, steps, "crab walking");
        let y_step = match direction {
            CrabDirection::Left => self.params.step_length_mm,
            CrabDirection::Right => -self.params.step_length_mm,
        };
        for _ in 0..steps {
            // Phase 1: lift tripod A, shift tripod B sideways.
            for id in TRIPOD_A {
                let (x, y) = self.legs[id].anchor;
                self.move_leg(id, x, y, self.params.lift_height_mm)?;
            }
            for id in TRIPOD_B {
                let (x, y) = self.legs[id].anchor;
                self.move_leg(id, x, y + y_step, self.params.stance_height_mm)?;
            }
            self.pause(speed);

            // Phase 2: lower tripod A shifted, lift tripod B.
            for id in TRIPOD_A {
                let (x, y) = self.legs[id].anchor;
                self.move_leg(id, x, y + y_step, self.params.stance_height_mm)?;
            }
            for id in TRIPOD_B {
                let (x, y) = self.legs[id].anchor;
                self.move_leg(id, x, y, self.params.lift_height_mm)?;
            }
            self.pause(speed);

            // Phase 3: lower tripod B.
            for id in TRIPOD_B {
                let (x, y) = self.legs[id].anchor;
                self.move_leg(id, x, y, self.params.stance_height_mm)?;
            }
            self.pause(speed);
        }
        Ok(())
    }

    /// Two-cycle lift/lower of a single leg while the other five stay
    /// planted. Out-of-range leg ids are a logged no-op, not an error.
    pub fn wave(&mut self, leg_id: usize) -> Result<(), HexError> {
        if leg_id >= LEG_COUNT {
            warn!(leg_id, "ignoring wave for invalid leg id");
            return Ok(());
        }
        info!(leg_id, "waving leg");
        let (x, y) = self.legs[leg_id].anchor;
        for _ in 0..2 {
            self.move_leg(leg_id, x + 20.0, y, self.params.lift_height_mm)?;
            self.pause(CHOREO_PAUSE_SECS);
            self.move_leg(leg_id, x, y, self.params.stance_height_mm)?;
            self.pause(CHOREO_PAUSE_SECS);
        }
        Ok(())
    }

    /// Fist bump with the front-right leg: reach out, bump, retract, plant.
    pub fn fist_bump(&mut self) -> Result<(), HexError> {
        info!("fist bump");
        let leg_id = 1;
        let (x, y) = self.legs[leg_id].anchor;
        self.move_leg(leg_id, x + 40.0, y, FIST_BUMP_HEIGHT_MM)?;
        self.pause(SETTLE_SECS);
        self.move_leg(leg_id, x + 60.0, y, FIST_BUMP_HEIGHT_MM)?;
        self.pause(CHOREO_PAUSE_SECS);
        self.move_leg(leg_id, x + 40.0, y, FIST_BUMP_HEIGHT_MM)?;
        self.pause(SETTLE_SECS);
        self.move_leg(leg_id, x, y, self.params.stance_height_mm)
    }

    /// Alternate body tilts left/right three times, then return to standing.
    pub fn dance(&mut self) -> Result<(), HexError> {
        info!("dancing");
        for _ in 0..3 {
            for id in [0, 2, 4] {
                let (x, y) = self.legs[id].anchor;
                self.move_leg(id, x, y, self.params.lift_height_mm)?;
            }
            for id in [1, 3, 5] {
                let (x, y) = self.legs[id].anchor;
                self.move_leg(id, x, y, DANCE_LOW_MM)?;
            }
            self.pause(CHOREO_PAUSE_SECS);

            for id in [0, 2, 4] {
                let (x, y) = self.legs[id].anchor;
                self.move_leg(id, x, y, DANCE_LOW_MM)?;
            }
            for id in [1, 3, 5] {
                let (x, y) = self.legs[id].anchor;
                self.move_leg(id, x, y, self.params.lift_height_mm)?;
            }
            self.pause(CHOREO_PAUSE_SECS);
        }
        self.stand()
    }

    /// Solve the IK for one foot target and command the leg's servos.
    /// Out-of-reach targets are absorbed by the solver's distance clamp and
    /// only logged; they never abort the phase sequence.
    fn move_leg(&mut self, leg_id: usize, x: f32, y: f32, z: f32) -> Result<(), HexError> {
        let solution = solve(&self.geometry, x, y, z);
        if solution.clamped {
            warn!(leg_id, x, y, z, "target out of reach; clamped to max extension");
        }
        self.bank.set_leg_angles(leg_id, solution.angles)?;
        self.legs[leg_id].angles = clamp_leg(solution.angles);
        Ok(())
    }

    fn pause(&self, secs: f32) {
        let scaled = secs * self.params.time_scale;
        if scaled > 0.0 {
            thread::sleep(Duration::from_secs_f32(scaled));
        }
    }
}
