// SPDX-FileCopyrightText: 2026 Chime Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Interaction dispatcher state machine.
//!
//! [`resolve`] is pure: given the user's conversation state, the utterance
//! and the phrase registry it returns the command to execute and the
//! [`Transition`] the engine must apply to the pending interaction. The
//! engine does the purging, loading and applying under the user's lock.
//!
//! ```text
//!                  collision while creating
//!   Idle ─────────────────────────────────────▶ Awaiting*Replacement
//!    ▲                                              │   │
//!    │  give up / free phrase (Complete)            │   │ phrase taken
//!    └──────────────────────────────────────────────┘   └──▶ (Refresh, stay)
//! ```

use chime_core::types::{
    AliasContext, InteractionId, PendingContext, PendingInteraction, StopPhraseContext,
};
use chime_core::{Command, PendingCompletion, UnknownReason};
use chime_intent::{clean_phrase, normalize, parse};

use crate::registry::PhraseRegistry;

/// What the user is in the middle of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversationState {
    Idle,
    AwaitingStopPhraseReplacement {
        interaction: InteractionId,
        context: StopPhraseContext,
    },
    AwaitingAliasPhraseReplacement {
        interaction: InteractionId,
        context: AliasContext,
    },
}

impl ConversationState {
    /// State derived from the user's active (unexpired) interaction.
    pub fn from_pending(pending: Option<&PendingInteraction>) -> Self {
        match pending {
            None => Self::Idle,
            Some(p) => match &p.context {
                PendingContext::StopPhraseReplacement(context) => {
                    Self::AwaitingStopPhraseReplacement {
                        interaction: p.id,
                        context: context.clone(),
                    }
                }
                PendingContext::AliasPhraseReplacement(context) => {
                    Self::AwaitingAliasPhraseReplacement {
                        interaction: p.id,
                        context: context.clone(),
                    }
                }
            },
        }
    }
}

/// Effect on the stored pending interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Leave storage as is.
    Stay,
    /// Destroy the interaction.
    Complete(InteractionId),
    /// Push the interaction's expiry out by a full TTL.
    Refresh(InteractionId),
}

/// Routes one utterance.
pub fn resolve(
    state: &ConversationState,
    utterance: &str,
    registry: &PhraseRegistry,
) -> (Transition, Command) {
    let utterance = utterance.trim();

    match state {
        ConversationState::Idle => (Transition::Stay, route_idle(utterance, registry)),
        ConversationState::AwaitingStopPhraseReplacement {
            interaction,
            context,
        } => resolve_pending(*interaction, utterance, registry, |replacement_phrase| {
            PendingCompletion::StopPhrase {
                context: context.clone(),
                replacement_phrase,
            }
        }),
        ConversationState::AwaitingAliasPhraseReplacement {
            interaction,
            context,
        } => resolve_pending(*interaction, utterance, registry, |replacement_phrase| {
            PendingCompletion::Alias {
                context: context.clone(),
                replacement_phrase,
            }
        }),
    }
}

fn resolve_pending(
    interaction: InteractionId,
    utterance: &str,
    registry: &PhraseRegistry,
    complete: impl FnOnce(String) -> PendingCompletion,
) -> (Transition, Command) {
    let phrase = clean_phrase(utterance);
    if phrase.eq_ignore_ascii_case("give up") {
        return (Transition::Complete(interaction), Command::GiveUp);
    }
    if phrase.is_empty() {
        return (Transition::Stay, Command::unknown());
    }
    let completion = complete(phrase);
    if registry.is_taken(replacement_phrase(&completion)) {
        return (
            Transition::Refresh(interaction),
            Command::Unknown(UnknownReason::ReplacementPhraseTaken(completion.kind())),
        );
    }
    (
        Transition::Complete(interaction),
        Command::CompletePending(completion),
    )
}

fn replacement_phrase(completion: &PendingCompletion) -> &str {
    match completion {
        PendingCompletion::StopPhrase {
            replacement_phrase, ..
        }
        | PendingCompletion::Alias {
            replacement_phrase, ..
        } => replacement_phrase,
    }
}

fn route_idle(utterance: &str, registry: &PhraseRegistry) -> Command {
    let text = normalize(utterance);
    if let Some(loop_id) = registry.match_stop_phrase(&text) {
        return Command::StopLoop { loop_id };
    }
    if let Some(number) = registry.match_alias(&text) {
        return Command::RunLoop { number };
    }
    parse(utterance)
}

#[cfg(test)]
mod tests {
    use chime_core::types::{InteractionKind, LoopId};

    use super::*;
    use crate::registry::tests::{alias, looping};

    fn stop_context() -> StopPhraseContext {
        StopPhraseContext {
            interval_minutes: 5,
            message: "have you done the dishes?".into(),
            original_stop_phrase: "dishes done".into(),
        }
    }

    fn awaiting_stop() -> ConversationState {
        ConversationState::AwaitingStopPhraseReplacement {
            interaction: InteractionId(7),
            context: stop_context(),
        }
    }

    fn registry() -> PhraseRegistry {
        PhraseRegistry::new(
            &[
                looping(10, 1, "dishes done", true),
                looping(11, 2, "laundry folded", false),
            ],
            &[alias(1, 11, "laundry time please")],
        )
    }

    #[test]
    fn idle_falls_through_to_parser() {
        let (transition, command) = resolve(
            &ConversationState::Idle,
            "set a timer for five minutes",
            &registry(),
        );
        assert_eq!(transition, Transition::Stay);
        assert_eq!(command, Command::Timer { minutes: 5 });
    }

    #[test]
    fn stop_phrase_beats_alias_and_parser() {
        let registry = PhraseRegistry::new(
            &[looping(10, 1, "dishes done", true)],
            &[alias(1, 10, "dishes done at 9 pm reminder")],
        );
        let (_, command) = resolve(
            &ConversationState::Idle,
            "dishes done at nine pm reminder",
            &registry,
        );
        assert_eq!(command, Command::StopLoop { loop_id: LoopId(10) });
    }

    #[test]
    fn alias_beats_parser() {
        let registry = PhraseRegistry::new(
            &[looping(11, 2, "laundry folded", false)],
            &[alias(1, 11, "timer for 5 minutes")],
        );
        let (_, command) = resolve(&ConversationState::Idle, "Timer for five minutes", &registry);
        assert_eq!(command, Command::RunLoop { number: 2 });
    }

    #[test]
    fn give_up_completes_interaction() {
        let (transition, command) = resolve(&awaiting_stop(), "  Give Up. ", &registry());
        assert_eq!(transition, Transition::Complete(InteractionId(7)));
        assert_eq!(command, Command::GiveUp);
    }

    #[test]
    fn taken_replacement_refreshes_interaction() {
        let (transition, command) = resolve(&awaiting_stop(), "Laundry Folded", &registry());
        assert_eq!(transition, Transition::Refresh(InteractionId(7)));
        assert_eq!(
            command,
            Command::Unknown(UnknownReason::ReplacementPhraseTaken(
                InteractionKind::StopPhraseReplacement
            ))
        );
    }

    #[test]
    fn pending_interaction_shadows_stop_phrases() {
        // "dishes done" is an active stop phrase, but while a replacement is
        // pending it is checked for collision rather than stopping the loop.
        let (transition, command) = resolve(&awaiting_stop(), "dishes done", &registry());
        assert_eq!(transition, Transition::Refresh(InteractionId(7)));
        assert!(matches!(command, Command::Unknown(_)));
    }

    #[test]
    fn free_replacement_completes_with_context() {
        let (transition, command) = resolve(&awaiting_stop(), "'all clean'", &registry());
        assert_eq!(transition, Transition::Complete(InteractionId(7)));
        assert_eq!(
            command,
            Command::CompletePending(PendingCompletion::StopPhrase {
                context: stop_context(),
                replacement_phrase: "all clean".into(),
            })
        );
    }

    #[test]
    fn alias_replacement_keeps_spoken_wording() {
        let state = ConversationState::AwaitingAliasPhraseReplacement {
            interaction: InteractionId(9),
            context: AliasContext {
                looping_reminder_id: LoopId(10),
                original_phrase: "laundry time please".into(),
            },
        };
        let (transition, command) = resolve(&state, "chores at four", &registry());
        assert_eq!(transition, Transition::Complete(InteractionId(9)));
        let Command::CompletePending(PendingCompletion::Alias {
            replacement_phrase, ..
        }) = command
        else {
            panic!("expected alias completion, got {command:?}");
        };
        assert_eq!(replacement_phrase, "chores at four");
    }

    #[test]
    fn spoken_stop_phrase_matches_its_digit_form() {
        let registry = PhraseRegistry::new(&[looping(12, 3, "oh no", true)], &[]);
        let (_, command) = resolve(&ConversationState::Idle, "Oh no!", &registry);
        assert_eq!(command, Command::StopLoop { loop_id: LoopId(12) });
    }

    #[test]
    fn replacement_colliding_only_after_normalizing_is_taken() {
        let registry = PhraseRegistry::new(&[looping(12, 3, "0 no", false)], &[]);
        let (transition, _) = resolve(&awaiting_stop(), "oh no", &registry);
        assert_eq!(transition, Transition::Refresh(InteractionId(7)));
    }

    #[test]
    fn punctuation_only_reply_keeps_waiting() {
        let (transition, command) = resolve(&awaiting_stop(), "...", &registry());
        assert_eq!(transition, Transition::Stay);
        assert_eq!(command, Command::unknown());
    }

    #[test]
    fn state_from_pending_interaction() {
        assert_eq!(ConversationState::from_pending(None), ConversationState::Idle);
    }
}
