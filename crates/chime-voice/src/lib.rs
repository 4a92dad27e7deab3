// SPDX-FileCopyrightText: 2026 Chime Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP adapters for Chime's external collaborators.
//!
//! [`ElevenLabsSpeech`] implements [`chime_core::SpeechAdapter`] against the
//! ElevenLabs text-to-speech API; [`SunriseSunset`] implements
//! [`chime_core::SunsetAdapter`] against sunrise-sunset.org. Both retry once
//! on transient HTTP statuses.

mod http;
pub mod speech;
pub mod sunset;

pub use speech::ElevenLabsSpeech;
pub use sunset::SunriseSunset;
