// SPDX-FileCopyrightText: 2026 Chime Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Interpretation and scheduling engine for Chime.
//!
//! The [`Engine`] turns transcripts into commands through the interaction
//! dispatcher, executes them against the store and task scheduler, and
//! runs the recurrence lifecycle for due tasks. The [`Worker`] drives that
//! lifecycle from the durable task queue.

pub mod audio;
pub mod dispatcher;
pub mod engine;
mod lifecycle;
pub mod locks;
pub mod ordering;
pub mod registry;
mod respond;
pub mod schedule;
pub mod texts;
pub mod worker;

pub use dispatcher::{ConversationState, Transition, resolve};
pub use engine::{Collaborators, Engine, EngineSettings, Reply};
pub use locks::UserLocks;
pub use registry::PhraseRegistry;
pub use worker::{TickReport, Worker};
