//! Slot extraction.
//!
//! Slots are pulled out of the normalised transcript with regular
//! expressions, independently of which intent matched.  Spoken number words
//! ("five", "twenty five", "two point five") are rewritten to digits first so
//! the same patterns cover both forms.

use std::sync::LazyLock;

use regex::Regex;
use skyvox_types::{DistanceUnit, Slots, SpeedLevel, format_number};

static DISTANCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<value>\d+(?:\.\d+)?)\s*(?P<unit>meters|meter|metres|metre|m|feet|foot|ft)\b")
        .expect("distance pattern is valid")
});

static DEGREES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<value>\d+(?:\.\d+)?)\s*(?:degrees\b|degree\b|deg\b|°)")
        .expect("degrees pattern is valid")
});

static ZOOM_AFTER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bzoom\b(?:\s+(?:in|out|level|to|at|of|set))*\s+(?P<value>\d+(?:\.\d+)?)")
        .expect("zoom pattern is valid")
});

static ZOOM_BEFORE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<value>\d+(?:\.\d+)?)\s*(?:x|times)\s+zoom\b")
        .expect("zoom pattern is valid")
});

static SPEED_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bspeed\b(?:\s+(?:to|of|at|level))*\s+(?P<value>\d+(?:\.\d+)?)")
        .expect("speed pattern is valid")
});

static SPEED_WORD_AFTER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bspeed\b(?:\s+(?:to|of|at|level))*\s+(?P<level>slow|low|medium|normal|fast|high)\b")
        .expect("speed pattern is valid")
});

static SPEED_WORD_BEFORE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?P<level>slow|low|medium|normal|fast|high|full|top|max)\s+speed\b")
        .expect("speed pattern is valid")
});

/// Extract every recognised slot from a normalised transcript.
pub fn extract(normalized: &str) -> Slots {
    let text = words_to_digits(normalized);
    let mut slots = Slots::default();

    if let Some(caps) = DISTANCE.captures(&text)
        && let Ok(value) = caps["value"].parse::<f64>()
    {
        slots.distance = Some(value);
        slots.unit = Some(match &caps["unit"] {
            "feet" | "foot" | "ft" => DistanceUnit::Feet,
            _ => DistanceUnit::Meters,
        });
    }

    if let Some(caps) = DEGREES.captures(&text) {
        slots.degrees = caps["value"].parse().ok();
    }

    if let Some(caps) = ZOOM_AFTER
        .captures(&text)
        .or_else(|| ZOOM_BEFORE.captures(&text))
    {
        slots.zoom_level = caps["value"].parse().ok();
    }

    slots.speed_level = extract_speed(&text);
    slots
}

fn extract_speed(text: &str) -> Option<SpeedLevel> {
    if let Some(caps) = SPEED_NUMBER.captures(text)
        && let Ok(value) = caps["value"].parse::<f64>()
    {
        return Some(SpeedLevel::Numeric(value));
    }
    let caps = SPEED_WORD_AFTER
        .captures(text)
        .or_else(|| SPEED_WORD_BEFORE.captures(text))?;
    match &caps["level"] {
        "slow" | "low" => Some(SpeedLevel::Slow),
        "medium" | "normal" => Some(SpeedLevel::Medium),
        _ => Some(SpeedLevel::Fast),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Number words
// ─────────────────────────────────────────────────────────────────────────────

fn unit_word(word: &str) -> Option<u32> {
    let n = match word {
        "zero" => 0,
        "one" => 1,
        "two" => 2,
        "three" => 3,
        "four" => 4,
        "five" => 5,
        "six" => 6,
        "seven" => 7,
        "eight" => 8,
        "nine" => 9,
        "ten" => 10,
        "eleven" => 11,
        "twelve" => 12,
        "thirteen" => 13,
        "fourteen" => 14,
        "fifteen" => 15,
        "sixteen" => 16,
        "seventeen" => 17,
        "eighteen" => 18,
        "nineteen" => 19,
        _ => return None,
    };
    Some(n)
}

fn tens_word(word: &str) -> Option<u32> {
    let n = match word {
        "twenty" => 20,
        "thirty" => 30,
        "forty" => 40,
        "fifty" => 50,
        "sixty" => 60,
        "seventy" => 70,
        "eighty" => 80,
        "ninety" => 90,
        _ => return None,
    };
    Some(n)
}

/// Read `[tens] [unit]` starting at `tokens[0]`.  Returns the value and the
/// number of tokens consumed.
fn read_below_hundred(tokens: &[&str]) -> Option<(u32, usize)> {
    let first = tokens.first()?;
    if let Some(tens) = tens_word(first) {
        match tokens.get(1).and_then(|w| unit_word(w)) {
            Some(unit) if (1..=9).contains(&unit) => Some((tens + unit, 2)),
            _ => Some((tens, 1)),
        }
    } else {
        unit_word(first).map(|unit| (unit, 1))
    }
}

fn read_integer(tokens: &[&str]) -> Option<(u32, usize)> {
    let (mut value, mut used) = read_below_hundred(tokens)?;
    if tokens.get(used) == Some(&"hundred") {
        value *= 100;
        used += 1;
        let rest_start = if tokens.get(used) == Some(&"and") {
            used + 1
        } else {
            used
        };
        if let Some((rest, n)) = read_below_hundred(&tokens[rest_start.min(tokens.len())..]) {
            value += rest;
            used = rest_start + n;
        }
    }
    Some((value, used))
}

fn read_number(tokens: &[&str]) -> Option<(f64, usize)> {
    let (integer, mut used) = read_integer(tokens)?;
    let mut value = f64::from(integer);
    if tokens.get(used) == Some(&"point") {
        let digits: Vec<u32> = tokens[used + 1..]
            .iter()
            .map_while(|w| unit_word(w).filter(|d| *d <= 9))
            .collect();
        if !digits.is_empty() {
            let mut scale = 0.1;
            for d in &digits {
                value += f64::from(*d) * scale;
                scale /= 10.0;
            }
            used += 1 + digits.len();
        }
    }
    Some((value, used))
}

/// Rewrite spoken numbers as digits: `"go up twenty five feet"` →
/// `"go up 25 feet"`.  Everything else passes through unchanged.
pub fn words_to_digits(text: &str) -> String {
    let tokens: Vec<&str> = text.split(' ').filter(|t| !t.is_empty()).collect();
    let mut out: Vec<String> = Vec::with_capacity(tokens.len());
    let mut i = 0;
    while i < tokens.len() {
        match read_number(&tokens[i..]) {
            Some((value, used)) => {
                // Round away float noise from the fractional accumulation.
                let rounded = (value * 1e6).round() / 1e6;
                out.push(format_number(rounded));
                i += used;
            }
            None => {
                out.push(tokens[i].to_string());
                i += 1;
            }
        }
    }
    out.join(" ")
}
