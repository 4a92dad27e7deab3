// SPDX-FileCopyrightText: 2026 Chime Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Transcript interpretation for Chime.
//!
//! [`normalize`] rewrites spoken number words to digits; [`parse`] runs the
//! ordered rule table over the normalized text and yields a
//! [`chime_core::Command`].

pub mod clock;
pub mod normalizer;
pub mod parser;

pub use clock::{Meridiem, format_time, format_time_with_minutes, to_12_hour, to_24_hour};
pub use normalizer::normalize;
pub use parser::{Rule, clean_phrase, parse, parse_normalized, rule, rules};
