// SPDX-FileCopyrightText: 2026 Chime Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rule-based intent parser.
//!
//! Rules are tried in a fixed priority order against the normalized
//! transcript. The first rule whose pattern matches and whose extractor
//! accepts the captures decides the command; an extractor that rejects
//! (an hour of 13, a zero-minute timer) lets the following rules try.
//!
//! Stop phrases and alias phrases are matched on the normalized text but
//! handed back in the wording the user spoke ("oh no" stays "oh no").

use std::sync::LazyLock;

use chime_core::{Command, ReminderSpec};
use regex::{Captures, Regex};
use tracing::debug;

use crate::clock::{Meridiem, to_24_hour};
use crate::normalizer::normalize;

/// Characters stripped from the ends of quoted messages and phrases.
const QUOTE_CHARS: &[char] = &['\'', '"', '\u{2018}', '\u{2019}', '\u{201C}', '\u{201D}'];

/// `H`, `H:MM` or `H MM` followed by an am/pm marker. Captures hour,
/// minute and marker.
const TIME: &str = r"(\d{1,2})(?:[: ](\d{1,2}))?\s*([ap]\.?\s?m\.?)";

type Extractor = fn(&Captures<'_>) -> Option<Command>;

/// One entry of the parser table.
pub struct Rule {
    pub name: &'static str,
    pattern: Regex,
    extract: Extractor,
}

impl Rule {
    fn new(name: &'static str, pattern: &str, extract: Extractor) -> Self {
        Self {
            name,
            pattern: Regex::new(&format!("(?i){pattern}")).unwrap(),
            extract,
        }
    }

    /// Applies this rule alone to already-normalized text.
    pub fn apply(&self, text: &str) -> Option<Command> {
        self.pattern
            .captures(text)
            .and_then(|caps| (self.extract)(&caps))
    }
}

static RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    vec![
        Rule::new("time_check", r"\btime\b", |_| Some(Command::TimeCheck)),
        Rule::new("sunset", r"\bsunset\b", |_| Some(Command::Sunset)),
        Rule::new(
            "timer",
            r"\btimer\s+(?:for\s+)?(\d+)\s+minutes?\b",
            extract_timer,
        ),
        Rule::new(
            "create_loop",
            r"\blooping\s+reminder\s+(?:for|every)\s+(\d+)\s+minutes?\s+(?:saying|that\s+says|to)\s+(.+?)\s+until\s+i\s+say\s+(.+)$",
            extract_create_loop,
        ),
        Rule::new("alias_loop", r"\balias\s+(.+?)\s+(?:as|to)\s+(.+)$", extract_alias),
        Rule::new(
            "run_loop",
            r"\b(?:run|start)\s+(?:the\s+)?(?:loop|looping\s+reminder)\s+(?:number\s+)?(\d+)\b",
            extract_run_loop,
        ),
        Rule::new(
            "daily_reminder",
            &format!(r"\bdaily\s+{TIME}\s+reminder\s+(?:to\s+)?(.+)$"),
            extract_daily,
        ),
        Rule::new(
            "daily_reminder_at",
            &format!(r"\bdaily\s+reminder\s+at\s+{TIME}\s+(?:to\s+)?(.+)$"),
            extract_daily,
        ),
        Rule::new(
            "daily_reminder_for",
            &format!(r"\bdaily\s+reminder\s+for\s+{TIME}\s+(?:to\s+)?(.+)$"),
            extract_daily,
        ),
        Rule::new(
            "reminder",
            &format!(r"\b{TIME}\s+reminder\s+(?:to\s+)?(.+)$"),
            extract_reminder,
        ),
        Rule::new(
            "reminder_at",
            &format!(r"\breminder\s+at\s+{TIME}\s+(?:to\s+)?(.+)$"),
            extract_reminder,
        ),
        Rule::new(
            "reminder_for",
            &format!(r"\breminder\s+for\s+{TIME}\s+(?:to\s+)?(.+)$"),
            extract_reminder,
        ),
    ]
});

static LOOP_TARGET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:run\s+)?(?:(?:the\s+)?(?:loop|looping\s+reminder)\s+)?(?:number\s+)?(\d+)$")
        .unwrap()
});

static STOP_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\buntil\s+i\s+say\s+").unwrap());

static ALIAS_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s(?:as|to)\s+").unwrap());

/// The parser table in priority order.
pub fn rules() -> &'static [Rule] {
    &RULES
}

/// Looks up a rule by name.
pub fn rule(name: &str) -> Option<&'static Rule> {
    RULES.iter().find(|r| r.name == name)
}

/// Normalizes `transcript` and parses it. Stop and alias phrases keep the
/// transcript's wording.
pub fn parse(transcript: &str) -> Command {
    match parse_normalized(&normalize(transcript)) {
        Command::CreateLoop {
            interval_minutes,
            message,
            stop_phrase,
        } => Command::CreateLoop {
            interval_minutes,
            message,
            stop_phrase: spoken_phrase(transcript, &STOP_MARKER, stop_phrase),
        },
        Command::AliasLoop { number, phrase } => Command::AliasLoop {
            number,
            phrase: spoken_phrase(transcript, &ALIAS_MARKER, phrase),
        },
        other => other,
    }
}

/// The first tail of `transcript` after `marker` that normalizes to the
/// parsed phrase, falling back to the parsed phrase itself.
fn spoken_phrase(transcript: &str, marker: &Regex, parsed: String) -> String {
    marker
        .find_iter(transcript)
        .map(|m| clean_phrase(&transcript[m.end()..]))
        .find(|candidate| normalize(candidate) == parsed)
        .unwrap_or(parsed)
}

/// Parses text that has already been through [`normalize`].
pub fn parse_normalized(text: &str) -> Command {
    for rule in RULES.iter() {
        if let Some(command) = rule.apply(text) {
            debug!(rule = rule.name, "intent rule matched");
            return command;
        }
    }
    Command::unknown()
}

fn extract_timer(caps: &Captures<'_>) -> Option<Command> {
    let minutes: u32 = caps[1].parse().ok()?;
    (minutes > 0).then_some(Command::Timer { minutes })
}

fn extract_create_loop(caps: &Captures<'_>) -> Option<Command> {
    let interval_minutes: u32 = caps[1].parse().ok()?;
    let message = unquote(&caps[2]);
    let stop_phrase = clean_phrase(&caps[3]);
    if message.is_empty() || stop_phrase.is_empty() {
        return None;
    }
    Some(Command::CreateLoop {
        interval_minutes,
        message,
        stop_phrase,
    })
}

fn extract_alias(caps: &Captures<'_>) -> Option<Command> {
    let target = unquote(&caps[1]);
    let number: i64 = LOOP_TARGET.captures(&target)?[1].parse().ok()?;
    let phrase = clean_phrase(&caps[2]);
    if phrase.is_empty() {
        return None;
    }
    Some(Command::AliasLoop { number, phrase })
}

fn extract_run_loop(caps: &Captures<'_>) -> Option<Command> {
    let number: i64 = caps[1].parse().ok()?;
    Some(Command::RunLoop { number })
}

fn extract_reminder(caps: &Captures<'_>) -> Option<Command> {
    reminder_spec(caps).map(Command::Reminder)
}

fn extract_daily(caps: &Captures<'_>) -> Option<Command> {
    reminder_spec(caps).map(Command::DailyReminder)
}

fn reminder_spec(caps: &Captures<'_>) -> Option<ReminderSpec> {
    let hour: u32 = caps[1].parse().ok()?;
    let minute: u32 = match caps.get(2) {
        Some(m) => m.as_str().parse().ok()?,
        None => 0,
    };
    if !(1..=12).contains(&hour) || minute > 59 {
        return None;
    }
    let meridiem = Meridiem::from_marker(&caps[3])?;
    let message = caps[4].trim().to_string();
    if message.is_empty() {
        return None;
    }
    Some(ReminderSpec {
        hour: to_24_hour(hour, meridiem),
        minute,
        message,
    })
}

/// Trims whitespace and surrounding quote marks, along with sentence
/// punctuation trailing a closing quote.
fn unquote(raw: &str) -> String {
    let mut s = raw.trim();
    if let Some(stripped) = s.strip_suffix(['.', '!', '?', ','])
        && stripped.ends_with(QUOTE_CHARS)
    {
        s = stripped;
    }
    s.trim_matches(|c: char| QUOTE_CHARS.contains(&c) || c.is_whitespace())
        .to_string()
}

/// A spoken phrase used for matching: unquoted and without trailing
/// sentence punctuation.
pub fn clean_phrase(raw: &str) -> String {
    unquote(raw)
        .trim_end_matches(['.', '!', '?', ','])
        .trim()
        .to_string()
}
