//! [`FlightState`] – last-commanded vehicle state.
//!
//! Adapters do not read telemetry back from the aircraft; they track what
//! they last told it to do.  [`FlightState::apply`] is the single place that
//! turns an intent plus slots into a state change and an operator-facing
//! [`ExecutionResult`], so the mock simulator and the protocol adapters
//! report identical messages for identical commands.

use serde::Serialize;
use skyvox_types::{
    DistanceUnit, ExecutionDetail, ExecutionResult, Intent, Slots, SpeedLevel, format_number,
};

pub const DEFAULT_TAKEOFF_ALTITUDE_M: f64 = 10.0;
pub const DEFAULT_MOVE_DISTANCE: f64 = 1.0;
pub const DEFAULT_YAW_DEGREES: f64 = 90.0;

pub const MIN_ZOOM: f64 = 1.0;
pub const MAX_ZOOM: f64 = 10.0;

pub const MIN_SPEED_MPS: f64 = 0.5;
pub const MAX_SPEED_MPS: f64 = 15.0;
pub const SPEED_STEP_MPS: f64 = 2.0;

/// Metres per second for a spoken speed level.
pub fn preset_speed(level: SpeedLevel) -> f64 {
    match level {
        SpeedLevel::Slow => 2.0,
        SpeedLevel::Medium => 5.0,
        SpeedLevel::Fast => 10.0,
        SpeedLevel::Numeric(v) => v.clamp(MIN_SPEED_MPS, MAX_SPEED_MPS),
    }
}

/// What the vehicle was last told to do.
///
/// Position is in metres relative to the takeoff point, `x` north and `y`
/// east.  Heading is degrees clockwise from north.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlightState {
    pub is_flying: bool,
    pub altitude_m: f64,
    pub zoom_level: f64,
    pub recording: bool,
    pub speed_mps: f64,
    pub heading_deg: f64,
    pub x_m: f64,
    pub y_m: f64,
    pub battery_percent: u8,
    pub signal_percent: u8,
    pub photo_count: u32,
}

impl Default for FlightState {
    fn default() -> Self {
        Self {
            is_flying: false,
            altitude_m: 0.0,
            zoom_level: MIN_ZOOM,
            recording: false,
            speed_mps: preset_speed(SpeedLevel::Medium),
            heading_deg: 0.0,
            x_m: 0.0,
            y_m: 0.0,
            battery_percent: 100,
            signal_percent: 100,
            photo_count: 0,
        }
    }
}

impl FlightState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply `intent` and describe the outcome.
    ///
    /// The only failures are missing required slots (`ZOOM_SET` without a
    /// level, `SPEED_SET` without a speed) and [`Intent::Unknown`]; in those
    /// cases the state is left untouched.
    pub fn apply(&mut self, intent: Intent, slots: &Slots) -> ExecutionResult {
        match intent {
            Intent::Stop => {
                ExecutionResult::ok(intent, "Stopping: holding position").with_detail(self.flight())
            }
            Intent::Takeoff => {
                self.is_flying = true;
                self.altitude_m = slots
                    .distance_meters()
                    .filter(|m| *m > 0.0)
                    .unwrap_or(DEFAULT_TAKEOFF_ALTITUDE_M);
                ExecutionResult::ok(
                    intent,
                    format!("Taking off to {} meters", format_number(self.altitude_m)),
                )
                .with_detail(self.flight())
            }
            Intent::Land => {
                self.is_flying = false;
                self.altitude_m = 0.0;
                ExecutionResult::ok(intent, "Landing").with_detail(self.flight())
            }
            Intent::Hover => ExecutionResult::ok(
                intent,
                format!("Hovering at {} meters", format_number(self.altitude_m)),
            )
            .with_detail(self.flight()),
            Intent::ReturnHome => {
                self.x_m = 0.0;
                self.y_m = 0.0;
                ExecutionResult::ok(intent, "Returning home").with_detail(self.position())
            }
            Intent::MoveLeft
            | Intent::MoveRight
            | Intent::MoveForward
            | Intent::MoveBack
            | Intent::MoveUp
            | Intent::MoveDown => self.translate(intent, slots),
            Intent::YawLeft | Intent::YawRight => {
                let degrees = slots.degrees.unwrap_or(DEFAULT_YAW_DEGREES);
                let (signed, word) = if intent == Intent::YawLeft {
                    (-degrees, "left")
                } else {
                    (degrees, "right")
                };
                self.heading_deg = (self.heading_deg + signed).rem_euclid(360.0);
                ExecutionResult::ok(
                    intent,
                    format!("Rotating {word} {} degrees", format_number(degrees)),
                )
                .with_detail(ExecutionDetail::Heading {
                    degrees: self.heading_deg,
                })
            }
            Intent::RecordStart => {
                let message = if self.recording {
                    "Already recording"
                } else {
                    "Recording started"
                };
                self.recording = true;
                ExecutionResult::ok(intent, message)
                    .with_detail(ExecutionDetail::Recording { active: true })
            }
            Intent::RecordStop => {
                let message = if self.recording {
                    "Recording stopped"
                } else {
                    "Not recording"
                };
                self.recording = false;
                ExecutionResult::ok(intent, message)
                    .with_detail(ExecutionDetail::Recording { active: false })
            }
            Intent::PhotoCapture => {
                self.photo_count = self.photo_count.saturating_add(1);
                ExecutionResult::ok(intent, "Photo captured").with_detail(ExecutionDetail::Photo {
                    count: self.photo_count,
                })
            }
            Intent::ZoomIn => self.set_zoom(intent, self.zoom_level * 2.0),
            Intent::ZoomOut => self.set_zoom(intent, self.zoom_level / 2.0),
            Intent::ZoomReset => self.set_zoom(intent, MIN_ZOOM),
            Intent::ZoomSet => match slots.zoom_level {
                Some(level) => self.set_zoom(intent, level),
                None => ExecutionResult::failed(intent, "Zoom level not specified"),
            },
            Intent::SpeedUp => self.set_speed(intent, self.speed_mps + SPEED_STEP_MPS),
            Intent::SlowDown => self.set_speed(intent, self.speed_mps - SPEED_STEP_MPS),
            Intent::SpeedSet => match slots.speed_level {
                Some(level) => self.set_speed(intent, preset_speed(level)),
                None => ExecutionResult::failed(intent, "Speed not specified"),
            },
            Intent::Battery => ExecutionResult::ok(
                intent,
                format!("Battery at {}%", self.battery_percent),
            )
            .with_detail(ExecutionDetail::Battery {
                percent: self.battery_percent,
            }),
            Intent::Altitude => ExecutionResult::ok(
                intent,
                format!("Altitude {} meters", format_number(self.altitude_m)),
            )
            .with_detail(ExecutionDetail::Altitude {
                meters: self.altitude_m,
            }),
            Intent::Signal => ExecutionResult::ok(
                intent,
                format!("Signal strength {}%", self.signal_percent),
            )
            .with_detail(ExecutionDetail::Signal {
                percent: self.signal_percent,
            }),
            Intent::Position => ExecutionResult::ok(
                intent,
                format!(
                    "Position {:.1} m north, {:.1} m east, {} meters up",
                    self.x_m,
                    self.y_m,
                    format_number(self.altitude_m)
                ),
            )
            .with_detail(self.position()),
            Intent::Unknown => ExecutionResult::failed(intent, "Unknown command"),
        }
    }

    fn translate(&mut self, intent: Intent, slots: &Slots) -> ExecutionResult {
        let distance = slots.distance.unwrap_or(DEFAULT_MOVE_DISTANCE);
        let unit = slots.unit.unwrap_or(DistanceUnit::Meters);
        let meters = unit.to_meters(distance);

        // Body frame: forward, right, up.
        let (word, forward, right, up) = match intent {
            Intent::MoveLeft => ("left", 0.0, -meters, 0.0),
            Intent::MoveRight => ("right", 0.0, meters, 0.0),
            Intent::MoveForward => ("forward", meters, 0.0, 0.0),
            Intent::MoveBack => ("back", -meters, 0.0, 0.0),
            Intent::MoveUp => ("up", 0.0, 0.0, meters),
            _ => ("down", 0.0, 0.0, -meters),
        };
        let heading = self.heading_deg.to_radians();
        self.x_m += forward * heading.cos() - right * heading.sin();
        self.y_m += forward * heading.sin() + right * heading.cos();
        self.altitude_m = (self.altitude_m + up).max(0.0);

        ExecutionResult::ok(
            intent,
            format!("Moving {word} {} {}", format_number(distance), unit.label()),
        )
        .with_detail(ExecutionDetail::Moved { distance, unit })
    }

    fn set_zoom(&mut self, intent: Intent, level: f64) -> ExecutionResult {
        self.zoom_level = level.clamp(MIN_ZOOM, MAX_ZOOM);
        ExecutionResult::ok(
            intent,
            format!("Zoom set to {}x", format_number(self.zoom_level)),
        )
        .with_detail(ExecutionDetail::Zoom {
            level: self.zoom_level,
        })
    }

    fn set_speed(&mut self, intent: Intent, mps: f64) -> ExecutionResult {
        self.speed_mps = mps.clamp(MIN_SPEED_MPS, MAX_SPEED_MPS);
        ExecutionResult::ok(
            intent,
            format!("Speed set to {} m/s", format_number(self.speed_mps)),
        )
        .with_detail(ExecutionDetail::Speed {
            meters_per_second: self.speed_mps,
        })
    }

    fn flight(&self) -> ExecutionDetail {
        ExecutionDetail::Flight {
            is_flying: self.is_flying,
            altitude_m: self.altitude_m,
        }
    }

    fn position(&self) -> ExecutionDetail {
        ExecutionDetail::Position {
            x_m: self.x_m,
            y_m: self.y_m,
            altitude_m: self.altitude_m,
        }
    }
}
