// SPDX-FileCopyrightText: 2026 Chime Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Snapshot of a user's stop phrases and alias phrases.
//!
//! Both phrase kinds share one namespace per user. The registry is loaded
//! under the user's lock, so the snapshot stays accurate for the whole
//! dispatch.

use chime_core::types::{CommandAlias, LoopId, LoopingReminder};
use chime_core::{ChimeError, ReminderStore, UserId};
use chime_intent::{clean_phrase, normalize};

#[derive(Debug, Clone)]
struct StopPhrase {
    loop_id: LoopId,
    number: i64,
    active: bool,
    phrase: String,
}

#[derive(Debug, Clone)]
struct AliasPhrase {
    number: i64,
    phrase: String,
}

/// Stop and alias phrases for one user, held in comparison form: cleaned,
/// number words as digits, lowercased.
#[derive(Debug, Clone, Default)]
pub struct PhraseRegistry {
    stop_phrases: Vec<StopPhrase>,
    aliases: Vec<AliasPhrase>,
}

impl PhraseRegistry {
    pub fn new(loops: &[LoopingReminder], aliases: &[CommandAlias]) -> Self {
        let mut stop_phrases: Vec<StopPhrase> = loops
            .iter()
            .map(|lr| StopPhrase {
                loop_id: lr.id,
                number: lr.number,
                active: lr.active,
                phrase: phrase_key(&lr.stop_phrase),
            })
            .collect();
        stop_phrases.sort_by_key(|s| s.number);

        let aliases = aliases
            .iter()
            .filter_map(|alias| {
                let number = loops
                    .iter()
                    .find(|lr| lr.id == alias.looping_reminder_id)?
                    .number;
                Some(AliasPhrase {
                    number,
                    phrase: phrase_key(&alias.phrase),
                })
            })
            .collect();

        Self {
            stop_phrases,
            aliases,
        }
    }

    pub async fn load(store: &dyn ReminderStore, user_id: UserId) -> Result<Self, ChimeError> {
        let loops = store.list_loops(user_id).await?;
        let aliases = store.list_aliases(user_id).await?;
        Ok(Self::new(&loops, &aliases))
    }

    /// Whether `phrase` equals (case-insensitively, after normalizing) any
    /// stop phrase, active or not, or any alias.
    pub fn is_taken(&self, phrase: &str) -> bool {
        let phrase = phrase_key(phrase);
        if phrase.is_empty() {
            return false;
        }
        self.stop_phrases.iter().any(|s| s.phrase == phrase)
            || self.aliases.iter().any(|a| a.phrase == phrase)
    }

    /// The first active loop, by number, whose stop phrase occurs in the
    /// normalized utterance.
    pub fn match_stop_phrase(&self, utterance: &str) -> Option<LoopId> {
        let utterance = utterance.to_lowercase();
        self.stop_phrases
            .iter()
            .filter(|s| s.active && !s.phrase.is_empty())
            .find(|s| utterance.contains(&s.phrase))
            .map(|s| s.loop_id)
    }

    /// The loop number of the alias equal to the whole normalized utterance.
    pub fn match_alias(&self, utterance: &str) -> Option<i64> {
        let utterance = clean_phrase(utterance).to_lowercase();
        self.aliases
            .iter()
            .find(|a| a.phrase == utterance)
            .map(|a| a.number)
    }
}

fn phrase_key(phrase: &str) -> String {
    normalize(&clean_phrase(phrase)).to_lowercase()
}

#[cfg(test)]
pub(crate) mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use chime_core::types::AliasId;

    pub(crate) fn looping(id: i64, number: i64, stop_phrase: &str, active: bool) -> LoopingReminder {
        LoopingReminder {
            id: LoopId(id),
            user_id: UserId(1),
            number,
            interval_minutes: 5,
            message: "have you done the dishes?".into(),
            stop_phrase: stop_phrase.into(),
            active,
            generation: 0,
            created_at: Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
        }
    }

    pub(crate) fn alias(id: i64, loop_id: i64, phrase: &str) -> CommandAlias {
        CommandAlias {
            id: AliasId(id),
            user_id: UserId(1),
            looping_reminder_id: LoopId(loop_id),
            phrase: phrase.into(),
            created_at: Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn stop_phrase_matches_substring_of_active_loops_only() {
        let registry = PhraseRegistry::new(
            &[
                looping(10, 1, "Dishes Done", false),
                looping(11, 2, "teeth brushed", true),
            ],
            &[],
        );
        assert_eq!(registry.match_stop_phrase("okay, teeth BRUSHED now"), Some(LoopId(11)));
        assert_eq!(registry.match_stop_phrase("dishes done"), None);
    }

    #[test]
    fn stop_phrase_tie_breaks_by_lowest_number() {
        let registry = PhraseRegistry::new(
            &[
                looping(20, 3, "done", true),
                looping(21, 2, "all done", true),
            ],
            &[],
        );
        assert_eq!(registry.match_stop_phrase("all done"), Some(LoopId(21)));
    }

    #[test]
    fn alias_requires_whole_utterance() {
        let registry = PhraseRegistry::new(
            &[looping(10, 4, "dishes done", false)],
            &[alias(1, 10, "Dishes Time")],
        );
        assert_eq!(registry.match_alias("  dishes time. "), Some(4));
        assert_eq!(registry.match_alias("is it dishes time"), None);
    }

    #[test]
    fn taken_covers_inactive_stop_phrases_and_aliases() {
        let registry = PhraseRegistry::new(
            &[looping(10, 1, "dishes done", false)],
            &[alias(1, 10, "chores")],
        );
        assert!(registry.is_taken("Dishes done"));
        assert!(registry.is_taken("'chores'"));
        assert!(!registry.is_taken("laundry"));
        assert!(!registry.is_taken("   "));
    }

    #[test]
    fn spoken_and_digit_forms_collide() {
        let registry = PhraseRegistry::new(
            &[looping(10, 1, "Oh no", true)],
            &[alias(1, 10, "forty winks")],
        );
        assert!(registry.is_taken("0 no"));
        assert!(registry.is_taken("40 Winks"));
        assert_eq!(registry.match_stop_phrase("well 0 no"), Some(LoopId(10)));
        assert_eq!(registry.match_alias("40 winks"), Some(1));
    }
}
