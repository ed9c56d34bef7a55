//! Transcript normalisation.
//!
//! Speech engines hand us text with arbitrary casing, punctuation, and
//! spacing.  [`normalize`] folds all of that into a single canonical form so
//! the synonym table and slot patterns only ever see one spelling:
//!
//! * lower-case;
//! * punctuation replaced by a single space (hyphens included, so
//!   `"lift-off"` reads as `"lift off"`);
//! * apostrophes dropped (`"where's"` → `"wheres"`);
//! * a `.` between two digits kept so decimals survive (`"2.5"`);
//! * the degree sign `°` kept as its own token;
//! * whitespace collapsed and trimmed.
//!
//! The function is idempotent: `normalize(&normalize(s)) == normalize(s)`.

const DEGREE_SIGN: char = '°';

/// Normalise a raw transcript.  See the module docs for the exact rules.
pub fn normalize(text: &str) -> String {
    let lower = text.to_lowercase();
    let chars: Vec<char> = lower.chars().collect();
    let mut cleaned = String::with_capacity(lower.len());

    for (i, &c) in chars.iter().enumerate() {
        if c.is_alphanumeric() {
            cleaned.push(c);
        } else if c == '.' && is_decimal_point(&chars, i) {
            cleaned.push('.');
        } else if c == DEGREE_SIGN {
            cleaned.push(' ');
            cleaned.push(DEGREE_SIGN);
            cleaned.push(' ');
        } else if c == '\'' || c == '\u{2019}' {
            // Contractions fold into one word.
        } else {
            cleaned.push(' ');
        }
    }

    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_decimal_point(chars: &[char], i: usize) -> bool {
    let before = i
        .checked_sub(1)
        .and_then(|j| chars.get(j))
        .is_some_and(|c| c.is_ascii_digit());
    let after = chars.get(i + 1).is_some_and(|c| c.is_ascii_digit());
    before && after
}

/// Return `true` when `phrase` occurs in `text` on whole-word boundaries.
///
/// Both arguments must already be normalised.
pub fn contains_phrase(text: &str, phrase: &str) -> bool {
    if phrase.is_empty() {
        return false;
    }
    format!(" {text} ").contains(&format!(" {phrase} "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_and_strips_punctuation() {
        assert_eq!(normalize("Take Off!"), "take off");
        assert_eq!(normalize("TAKE OFF"), "take off");
        assert_eq!(normalize("  take    off.  "), "take off");
    }

    #[test]
    fn hyphens_become_separators() {
        assert_eq!(normalize("Lift-off, now"), "lift off now");
    }

    #[test]
    fn apostrophes_are_dropped() {
        assert_eq!(normalize("Where's the drone?"), "wheres the drone");
        assert_eq!(normalize("what\u{2019}s up"), "whats up");
    }

    #[test]
    fn decimals_survive() {
        assert_eq!(normalize("Go up 2.5 meters."), "go up 2.5 meters");
    }

    #[test]
    fn sentence_final_period_after_digit_is_stripped() {
        assert_eq!(normalize("Go left 5."), "go left 5");
    }

    #[test]
    fn degree_sign_is_its_own_token() {
        assert_eq!(normalize("turn right 90°"), "turn right 90 °");
    }

    #[test]
    fn normalization_is_idempotent() {
        for raw in [
            "Take Off!",
            "turn right 90°",
            "Go up 2.5 meters.",
            "STOP -- STOP!!",
            "Where's the drone?",
            "",
        ] {
            let once = normalize(raw);
            assert_eq!(normalize(&once), once, "not idempotent for {raw:?}");
        }
    }

    #[test]
    fn contains_phrase_respects_word_boundaries() {
        assert!(contains_phrase("stop the takeoff", "stop"));
        assert!(contains_phrase("please go left now", "go left"));
        assert!(!contains_phrase("recording", "record"));
        assert!(!contains_phrase("backstop", "stop"));
        assert!(!contains_phrase("anything", ""));
    }
}
