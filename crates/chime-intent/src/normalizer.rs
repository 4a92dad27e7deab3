// SPDX-FileCopyrightText: 2026 Chime Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Spoken number words to digits.
//!
//! Speech-to-text output spells numbers out ("seven oh five pm", "forty nine
//! minutes"). Normalization rewrites the words to digits and then collapses
//! the two compound shapes that matter for clock times:
//!
//! 1. `0 N` becomes `0N` ("oh five" is the minute `05`);
//! 2. a tens value followed by a single digit is summed ("40 9" is `49`).
//!
//! A bare digit after an hour ("six five pm") is left alone and read as the
//! minute value 5.

use std::sync::LazyLock;

use regex::{Captures, Regex};

/// Number words and their values. `forty-five` precedes `forty` so the
/// hyphenated compound wins at the same position.
const NUMBER_WORDS: &[(&str, u32)] = &[
    ("forty-five", 45),
    ("oh", 0),
    ("zero", 0),
    ("one", 1),
    ("two", 2),
    ("three", 3),
    ("four", 4),
    ("five", 5),
    ("six", 6),
    ("seven", 7),
    ("eight", 8),
    ("nine", 9),
    ("ten", 10),
    ("eleven", 11),
    ("twelve", 12),
    ("thirteen", 13),
    ("fourteen", 14),
    ("fifteen", 15),
    ("sixteen", 16),
    ("seventeen", 17),
    ("eighteen", 18),
    ("nineteen", 19),
    ("twenty", 20),
    ("thirty", 30),
    ("forty", 40),
    ("fifty", 50),
    ("sixty", 60),
];

static NUMBER_WORD: LazyLock<Regex> = LazyLock::new(|| {
    let alternation = NUMBER_WORDS
        .iter()
        .map(|(word, _)| *word)
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)\b(?:{alternation})\b")).unwrap()
});

static OH_DIGIT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b0 ([1-9])\b").unwrap());

static TENS_DIGIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([1-5]0) ([1-9])\b").unwrap());

/// Rewrites number words to digits and collapses compound minutes.
pub fn normalize(text: &str) -> String {
    let digits = NUMBER_WORD.replace_all(text, |caps: &Captures<'_>| {
        let word = caps[0].to_ascii_lowercase();
        NUMBER_WORDS
            .iter()
            .find(|(w, _)| *w == word)
            .map(|(_, n)| n.to_string())
            .unwrap_or_else(|| caps[0].to_string())
    });
    let oh_collapsed = OH_DIGIT.replace_all(&digits, "0$1");
    TENS_DIGIT
        .replace_all(&oh_collapsed, |caps: &Captures<'_>| {
            let tens: u32 = caps[1].parse().unwrap_or(0);
            let ones: u32 = caps[2].parse().unwrap_or(0);
            (tens + ones).to_string()
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn oh_prefix_becomes_padded_minute() {
        assert_eq!(normalize("seven oh five pm"), "7 05 pm");
        assert_eq!(normalize("take oh nine pills"), "take 09 pills");
        assert_eq!(normalize("twelve zero five am"), "12 05 am");
    }

    #[test]
    fn tens_and_digit_are_summed() {
        assert_eq!(normalize("four forty two pm"), "4 42 pm");
        assert_eq!(normalize("twenty five minutes"), "25 minutes");
        assert_eq!(normalize("thirty six pushups"), "36 pushups");
    }

    #[test]
    fn bare_digit_after_hour_stays_literal() {
        assert_eq!(normalize("six five pm"), "6 5 pm");
    }

    #[test]
    fn forty_five_compound_and_spaced_forms_agree() {
        assert_eq!(normalize("forty-five minutes"), "45 minutes");
        assert_eq!(normalize("forty five minutes"), "45 minutes");
        assert_eq!(normalize("Forty-Five"), "45");
    }

    #[test]
    fn matching_is_whole_word_and_case_insensitive() {
        assert_eq!(normalize("Someone ONE often"), "Someone 1 often");
        assert_eq!(normalize("seventeen"), "17");
        assert_eq!(normalize("fourteen"), "14");
    }

    #[test]
    fn digits_and_plain_words_pass_through() {
        assert_eq!(normalize("timer for 5 minutes"), "timer for 5 minutes");
        assert_eq!(normalize(""), "");
    }

    fn token() -> impl Strategy<Value = String> {
        prop_oneof![
            (0u32..100).prop_map(|n| n.to_string()),
            Just("0".to_string()),
            prop::sample::select(vec!["oh", "five", "forty", "twenty", "pm", "reminder"])
                .prop_map(str::to_string),
        ]
    }

    proptest! {
        #[test]
        fn normalization_is_idempotent(tokens in prop::collection::vec(token(), 0..8)) {
            let once = normalize(&tokens.join(" "));
            prop_assert_eq!(normalize(&once), once.clone());
        }

        #[test]
        fn all_digit_strings_are_fixed_points_after_one_pass(
            digits in prop::collection::vec(0u32..60, 1..6)
        ) {
            let text = digits.iter().map(u32::to_string).collect::<Vec<_>>().join(" ");
            let once = normalize(&text);
            prop_assert_eq!(normalize(&once), once.clone());
        }
    }
}
