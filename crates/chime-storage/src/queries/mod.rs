// SPDX-FileCopyrightText: 2026 Chime Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query modules for CRUD operations on storage entities.

pub mod aliases;
pub mod entries;
pub mod interactions;
pub mod loops;
pub mod queue;
pub mod users;
pub mod voice_commands;
