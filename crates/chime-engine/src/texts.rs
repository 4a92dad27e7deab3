// SPDX-FileCopyrightText: 2026 Chime Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Spoken reply texts.

use chime_core::types::InteractionKind;
use chime_intent::{format_time, format_time_with_minutes};

pub const BLANK_TRANSCRIPT: &str = "Sorry, I didn't catch that, please try again";
pub const NOT_UNDERSTOOD: &str = "Sorry, I didn't understand that";
pub const GIVE_UP: &str = "Okay, never mind";
pub const NO_LOCATION: &str = "I don't know where you are yet, so I can't look up the sunset";
pub const SUNSET_UNAVAILABLE: &str = "I can't look up the sunset right now";
pub const LOOP_INTERVAL_OUT_OF_RANGE: &str =
    "Looping reminders can repeat every 1 to 1440 minutes";
pub const STOP_PHRASE_TOO_LONG: &str = "That stop phrase is too long";
pub const ALIAS_TOO_LONG: &str = "That alias is too long";
pub const LOOP_GONE: &str = "That looping reminder no longer exists";

/// `1 minute`, `5 minutes`.
pub fn minutes(n: u32) -> String {
    if n == 1 {
        "1 minute".to_string()
    } else {
        format!("{n} minutes")
    }
}

pub fn time_check(hour: u32, minute: u32) -> String {
    format!("The time is {}", format_time_with_minutes(hour, minute))
}

pub fn sunset(hour: u32, minute: u32) -> String {
    format!("Sunset today is at {}", format_time_with_minutes(hour, minute))
}

pub fn timer_set(n: u32) -> String {
    format!("Timer set for {}", minutes(n))
}

/// Stored as the timer entry's message and spoken on delivery.
pub fn timer_finished(n: u32) -> String {
    format!("Timer finished after {}", minutes(n))
}

pub fn reminder_set(hour: u32, minute: u32, tomorrow: bool, message: &str) -> String {
    let when = format_time(hour, minute);
    if tomorrow {
        format!("Reminder set for {when} tomorrow to {message}")
    } else {
        format!("Reminder set for {when} to {message}")
    }
}

pub fn daily_reminder_set(hour: u32, minute: u32, tomorrow: bool, message: &str) -> String {
    let mut text = format!("Daily reminder: {} - {message}", format_time(hour, minute));
    if tomorrow {
        text.push_str(", starting tomorrow");
    }
    text
}

/// Spoken when a one-shot or daily reminder fires, with the current local time.
pub fn reminder_due(hour: u32, minute: u32, message: &str) -> String {
    format!("It's {}. Reminder: {message}", format_time(hour, minute))
}

pub fn loop_created(number: i64, interval_minutes: u32, message: &str, stop_phrase: &str) -> String {
    format!(
        "Looping reminder {number} set: every {} I'll say '{message}' until you say '{stop_phrase}'",
        minutes(interval_minutes)
    )
}

pub fn loop_not_found(number: i64) -> String {
    format!("I couldn't find looping reminder {number}")
}

pub fn loop_already_running(number: i64) -> String {
    format!("Looping reminder {number} is already running")
}

pub fn loop_running(number: i64) -> String {
    format!("Running looping reminder {number}")
}

pub fn loop_stopped(number: i64) -> String {
    format!("Stopped looping reminder {number}")
}

pub fn alias_created(phrase: &str, number: i64) -> String {
    format!("Alias '{phrase}' now runs looping reminder {number}")
}

/// First prompt after a phrase collides with an existing one.
pub fn phrase_collision(kind: InteractionKind, phrase: &str) -> String {
    match kind {
        InteractionKind::StopPhraseReplacement => format!(
            "'{phrase}' is already in use. Please say a different stop phrase, or say give up"
        ),
        InteractionKind::AliasPhraseReplacement => format!(
            "'{phrase}' is already in use. Please say a different alias, or say give up"
        ),
    }
}

/// Prompt when the replacement phrase collides too.
pub fn replacement_taken(kind: InteractionKind) -> &'static str {
    match kind {
        InteractionKind::StopPhraseReplacement => {
            "That phrase is also already in use. Please say a different stop phrase, or say give up."
        }
        InteractionKind::AliasPhraseReplacement => {
            "That phrase is also already in use. Please say a different alias, or say give up."
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minutes_are_pluralized() {
        assert_eq!(timer_set(1), "Timer set for 1 minute");
        assert_eq!(timer_finished(25), "Timer finished after 25 minutes");
    }

    #[test]
    fn reminder_confirmations() {
        assert_eq!(
            reminder_set(21, 0, false, "take medication"),
            "Reminder set for 9 PM to take medication"
        );
        assert_eq!(
            reminder_set(7, 30, true, "walk the dog"),
            "Reminder set for 7:30 AM tomorrow to walk the dog"
        );
        assert_eq!(
            daily_reminder_set(7, 0, true, "write morning pages"),
            "Daily reminder: 7 AM - write morning pages, starting tomorrow"
        );
    }

    #[test]
    fn clock_texts_always_show_minutes() {
        assert_eq!(time_check(14, 11), "The time is 2:11 PM");
        assert_eq!(time_check(14, 0), "The time is 2:00 PM");
        assert_eq!(sunset(17, 35), "Sunset today is at 5:35 PM");
    }

    #[test]
    fn reminder_due_drops_zero_minutes() {
        assert_eq!(reminder_due(16, 0, "call mom"), "It's 4 PM. Reminder: call mom");
        assert_eq!(reminder_due(7, 5, "stretch"), "It's 7:05 AM. Reminder: stretch");
    }
}
