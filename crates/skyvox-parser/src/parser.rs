//! [`CommandParser`] – transcript → [`ParsedCommand`].
//!
//! Parsing runs in four steps:
//!
//! 1. [`normalize`] the transcript.
//! 2. Detect the intent.  STOP phrases are checked first and win whenever
//!    they occur anywhere in the utterance.  Otherwise every phrase in the
//!    synonym table is tried and the longest match wins.
//! 3. [`extract`] slots, independently of the intent.
//! 4. Build the canonical `normalized_command` string.
//!
//! The parser never fails: anything it cannot match comes back as
//! [`Intent::Unknown`] with zero confidence and no slots.

use skyvox_types::{Intent, ParsedCommand, Slots, format_number};
use tracing::debug;

use crate::normalize::{contains_phrase, normalize};
use crate::slots::extract;
use crate::synonyms::{STOP_SYNONYMS, SYNONYMS};

/// Confidence when the whole utterance is exactly one synonym.
pub const EXACT_MATCH_CONFIDENCE: f32 = 1.0;
/// Confidence when a synonym is embedded in a longer utterance.
pub const EMBEDDED_MATCH_CONFIDENCE: f32 = 0.9;

/// Stateless-by-default command parser.
///
/// The built-in tables are always active.  Extra phrases can be layered on
/// with [`CommandParser::add_synonym`]; they follow the same STOP-first and
/// longest-match rules as the built-ins.
///
/// # Example
///
/// ```
/// use skyvox_parser::CommandParser;
/// use skyvox_types::{DistanceUnit, Intent};
///
/// let parser = CommandParser::new();
/// let cmd = parser.parse("Go left 5 meters!");
/// assert_eq!(cmd.intent, Intent::MoveLeft);
/// assert_eq!(cmd.slots.distance, Some(5.0));
/// assert_eq!(cmd.slots.unit, Some(DistanceUnit::Meters));
/// assert_eq!(cmd.normalized_command, "MOVE_LEFT distance=5 unit=meters");
/// ```
#[derive(Debug, Clone, Default)]
pub struct CommandParser {
    extra_stop: Vec<String>,
    extra: Vec<(String, Intent)>,
}

impl CommandParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an additional `phrase` for `intent`.  The phrase is
    /// normalised before it is stored; empty phrases and
    /// [`Intent::Unknown`] are ignored.
    pub fn add_synonym(&mut self, phrase: &str, intent: Intent) {
        let phrase = normalize(phrase);
        if phrase.is_empty() || intent == Intent::Unknown {
            return;
        }
        if intent == Intent::Stop {
            self.extra_stop.push(phrase);
        } else {
            self.extra.push((phrase, intent));
        }
    }

    /// Parse a raw transcript.
    pub fn parse(&self, transcript: &str) -> ParsedCommand {
        let text = normalize(transcript);
        if text.is_empty() {
            return ParsedCommand::unknown();
        }

        let Some((intent, confidence)) = self.detect_intent(&text) else {
            debug!(transcript = %text, "no intent matched");
            return ParsedCommand::unknown();
        };

        let slots = extract(&text);
        let normalized_command = canonical_command(intent, &slots);
        debug!(
            transcript = %text,
            intent = %intent,
            confidence,
            command = %normalized_command,
            "parsed voice command"
        );

        ParsedCommand {
            intent,
            confidence,
            slots,
            normalized_command,
            requires_confirmation: intent.requires_confirmation(),
        }
    }

    fn detect_intent(&self, text: &str) -> Option<(Intent, f32)> {
        let stop_phrases = STOP_SYNONYMS
            .iter()
            .copied()
            .chain(self.extra_stop.iter().map(String::as_str));
        let mut stop_hit: Option<&str> = None;
        for phrase in stop_phrases {
            if contains_phrase(text, phrase) {
                stop_hit = Some(phrase);
                if phrase == text {
                    break;
                }
            }
        }
        if let Some(phrase) = stop_hit {
            return Some((Intent::Stop, confidence_for(text, phrase)));
        }

        let phrases = SYNONYMS
            .iter()
            .map(|(p, i)| (*p, *i))
            .chain(self.extra.iter().map(|(p, i)| (p.as_str(), *i)));
        let mut best: Option<(&str, Intent)> = None;
        for (phrase, intent) in phrases {
            if !contains_phrase(text, phrase) {
                continue;
            }
            let longer = best.is_none_or(|(current, _)| phrase.len() > current.len());
            if longer {
                best = Some((phrase, intent));
            }
        }
        best.map(|(phrase, intent)| (intent, confidence_for(text, phrase)))
    }
}

fn confidence_for(text: &str, phrase: &str) -> f32 {
    if text == phrase {
        EXACT_MATCH_CONFIDENCE
    } else {
        EMBEDDED_MATCH_CONFIDENCE
    }
}

/// Build the canonical `INTENT key=value …` string.  Keys always appear in
/// the same order so equal commands produce equal strings.
pub fn canonical_command(intent: Intent, slots: &Slots) -> String {
    let mut parts = vec![intent.as_str().to_string()];
    if let Some(d) = slots.distance {
        parts.push(format!("distance={}", format_number(d)));
    }
    if let Some(unit) = slots.unit {
        parts.push(format!("unit={}", unit.label()));
    }
    if let Some(deg) = slots.degrees {
        parts.push(format!("degrees={}", format_number(deg)));
    }
    if let Some(zoom) = slots.zoom_level {
        parts.push(format!("zoom={}", format_number(zoom)));
    }
    if let Some(speed) = slots.speed_level {
        parts.push(format!("speed={speed}"));
    }
    parts.join(" ")
}
