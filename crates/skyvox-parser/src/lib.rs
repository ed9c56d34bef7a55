//! `skyvox-parser` – The Ears
//!
//! Turns a finalised speech transcript into a typed [`ParsedCommand`].  The
//! parser is pure and holds no per-call state, so one instance can be shared
//! across every operator session.
//!
//! # Modules
//!
//! - [`normalize`] – case/punctuation/whitespace folding.
//! - [`synonyms`] – the declarative phrase → intent tables.
//! - [`slots`] – distance, rotation, zoom, and speed extraction.
//! - [`parser`] – [`CommandParser`][parser::CommandParser]: ties the three
//!   together and builds the canonical `normalized_command`.

pub mod normalize;
pub mod parser;
pub mod slots;
pub mod synonyms;

pub use parser::{CommandParser, canonical_command};

use skyvox_types::ParsedCommand;

/// Parse `transcript` with the built-in tables.
pub fn parse(transcript: &str) -> ParsedCommand {
    CommandParser::new().parse(transcript)
}
