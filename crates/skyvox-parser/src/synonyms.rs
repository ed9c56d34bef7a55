//! Declarative phrase → intent tables.
//!
//! Adding a synonym is a data change: append a row.  Phrases are written in
//! normalised form (lower-case, single spaces, no punctuation).
//!
//! STOP phrases live in their own table because they are matched first and
//! override everything else.  Because of that override, "stop recording"
//! resolves to STOP; the record-stop phrases deliberately avoid STOP words.

use skyvox_types::Intent;

/// Emergency-stop phrases.  Any occurrence anywhere in an utterance wins.
pub const STOP_SYNONYMS: &[&str] = &[
    "stop",
    "abort",
    "halt",
    "emergency stop",
    "emergency",
    "kill",
    "freeze",
    "cancel",
];

/// Every other phrase.  When several match, the longest phrase wins; ties go
/// to the earlier row.
pub const SYNONYMS: &[(&str, Intent)] = &[
    // Flight
    ("take off", Intent::Takeoff),
    ("takeoff", Intent::Takeoff),
    ("lift off", Intent::Takeoff),
    ("liftoff", Intent::Takeoff),
    ("launch", Intent::Takeoff),
    ("start flying", Intent::Takeoff),
    ("take flight", Intent::Takeoff),
    ("land", Intent::Land),
    ("land now", Intent::Land),
    ("touch down", Intent::Land),
    ("touchdown", Intent::Land),
    ("set down", Intent::Land),
    ("hover", Intent::Hover),
    ("hold", Intent::Hover),
    ("hold position", Intent::Hover),
    ("stay", Intent::Hover),
    ("stay there", Intent::Hover),
    ("stay put", Intent::Hover),
    ("wait here", Intent::Hover),
    ("return home", Intent::ReturnHome),
    ("return to home", Intent::ReturnHome),
    ("go home", Intent::ReturnHome),
    ("come home", Intent::ReturnHome),
    ("head home", Intent::ReturnHome),
    ("fly home", Intent::ReturnHome),
    ("come back", Intent::ReturnHome),
    ("return to base", Intent::ReturnHome),
    ("return to launch", Intent::ReturnHome),
    ("rth", Intent::ReturnHome),
    // Translation
    ("left", Intent::MoveLeft),
    ("go left", Intent::MoveLeft),
    ("move left", Intent::MoveLeft),
    ("fly left", Intent::MoveLeft),
    ("strafe left", Intent::MoveLeft),
    ("slide left", Intent::MoveLeft),
    ("right", Intent::MoveRight),
    ("go right", Intent::MoveRight),
    ("move right", Intent::MoveRight),
    ("fly right", Intent::MoveRight),
    ("strafe right", Intent::MoveRight),
    ("slide right", Intent::MoveRight),
    ("forward", Intent::MoveForward),
    ("forwards", Intent::MoveForward),
    ("go forward", Intent::MoveForward),
    ("move forward", Intent::MoveForward),
    ("fly forward", Intent::MoveForward),
    ("ahead", Intent::MoveForward),
    ("go ahead", Intent::MoveForward),
    ("advance", Intent::MoveForward),
    ("back", Intent::MoveBack),
    ("backward", Intent::MoveBack),
    ("backwards", Intent::MoveBack),
    ("go back", Intent::MoveBack),
    ("move back", Intent::MoveBack),
    ("fly back", Intent::MoveBack),
    ("back up", Intent::MoveBack),
    ("reverse", Intent::MoveBack),
    ("up", Intent::MoveUp),
    ("go up", Intent::MoveUp),
    ("move up", Intent::MoveUp),
    ("fly up", Intent::MoveUp),
    ("ascend", Intent::MoveUp),
    ("climb", Intent::MoveUp),
    ("rise", Intent::MoveUp),
    ("higher", Intent::MoveUp),
    ("gain altitude", Intent::MoveUp),
    ("down", Intent::MoveDown),
    ("go down", Intent::MoveDown),
    ("move down", Intent::MoveDown),
    ("fly down", Intent::MoveDown),
    ("descend", Intent::MoveDown),
    ("lower", Intent::MoveDown),
    ("drop", Intent::MoveDown),
    ("lose altitude", Intent::MoveDown),
    // Rotation
    ("turn left", Intent::YawLeft),
    ("rotate left", Intent::YawLeft),
    ("yaw left", Intent::YawLeft),
    ("spin left", Intent::YawLeft),
    ("pivot left", Intent::YawLeft),
    ("turn right", Intent::YawRight),
    ("rotate right", Intent::YawRight),
    ("yaw right", Intent::YawRight),
    ("spin right", Intent::YawRight),
    ("pivot right", Intent::YawRight),
    // Camera
    ("record", Intent::RecordStart),
    ("start recording", Intent::RecordStart),
    ("begin recording", Intent::RecordStart),
    ("record video", Intent::RecordStart),
    ("start video", Intent::RecordStart),
    ("start filming", Intent::RecordStart),
    ("end recording", Intent::RecordStop),
    ("finish recording", Intent::RecordStop),
    ("recording off", Intent::RecordStop),
    ("end video", Intent::RecordStop),
    ("cut recording", Intent::RecordStop),
    ("photo", Intent::PhotoCapture),
    ("take photo", Intent::PhotoCapture),
    ("take a photo", Intent::PhotoCapture),
    ("picture", Intent::PhotoCapture),
    ("take picture", Intent::PhotoCapture),
    ("take a picture", Intent::PhotoCapture),
    ("snapshot", Intent::PhotoCapture),
    ("capture", Intent::PhotoCapture),
    ("say cheese", Intent::PhotoCapture),
    // Zoom
    ("zoom", Intent::ZoomSet),
    ("zoom to", Intent::ZoomSet),
    ("set zoom", Intent::ZoomSet),
    ("zoom level", Intent::ZoomSet),
    ("zoom in", Intent::ZoomIn),
    ("magnify", Intent::ZoomIn),
    ("enhance", Intent::ZoomIn),
    ("zoom out", Intent::ZoomOut),
    ("widen", Intent::ZoomOut),
    ("reset zoom", Intent::ZoomReset),
    ("zoom reset", Intent::ZoomReset),
    ("default zoom", Intent::ZoomReset),
    ("no zoom", Intent::ZoomReset),
    // Speed
    ("speed up", Intent::SpeedUp),
    ("faster", Intent::SpeedUp),
    ("go faster", Intent::SpeedUp),
    ("accelerate", Intent::SpeedUp),
    ("increase speed", Intent::SpeedUp),
    ("slow down", Intent::SlowDown),
    ("slower", Intent::SlowDown),
    ("go slower", Intent::SlowDown),
    ("decelerate", Intent::SlowDown),
    ("decrease speed", Intent::SlowDown),
    ("reduce speed", Intent::SlowDown),
    ("speed", Intent::SpeedSet),
    ("set speed", Intent::SpeedSet),
    ("speed to", Intent::SpeedSet),
    ("change speed", Intent::SpeedSet),
    ("full speed", Intent::SpeedSet),
    // Status
    ("battery", Intent::Battery),
    ("battery level", Intent::Battery),
    ("battery status", Intent::Battery),
    ("power level", Intent::Battery),
    ("charge level", Intent::Battery),
    ("altitude", Intent::Altitude),
    ("height", Intent::Altitude),
    ("how high", Intent::Altitude),
    ("signal", Intent::Signal),
    ("signal strength", Intent::Signal),
    ("connection", Intent::Signal),
    ("reception", Intent::Signal),
    ("position", Intent::Position),
    ("location", Intent::Position),
    ("coordinates", Intent::Position),
    ("gps", Intent::Position),
    ("where are you", Intent::Position),
];
