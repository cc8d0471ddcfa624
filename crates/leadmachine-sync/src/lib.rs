//! Sync layer: pulls processed phone calls from the voice-AI provider.

#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "http")]
pub use http::{VoiceAiClient, VoiceAiError};
