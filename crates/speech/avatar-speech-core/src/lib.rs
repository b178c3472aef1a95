//! Avatar Speech Core
//!
//! Speech-side plumbing for talking avatars: provider adapters produce audio
//! and raw timing events, [`TimelineBuilder`] normalizes them into per-type
//! speechmark timelines, [`SpeechSynthesisCache`] deduplicates requests, and
//! [`SpeechmarkScheduler`] reports which marks are active as audio plays.

pub mod audio;
pub mod cache;
pub mod crosswalk;
pub mod error;
pub mod provider;
pub mod providers;
pub mod scheduler;
pub mod speechmark;
pub mod timeline;
pub mod viseme;

pub use audio::{AudioPlayback, ManualPlayback};
pub use cache::{SpeechSynthesisCache, SynthesisFuture, SynthesisOutcome, SynthesisResult};
pub use crosswalk::{CrosswalkEntry, VisemeCrosswalk, AZURE_TABLE};
pub use error::{AudioError, SpeechError, SynthesisError, TimelineInconsistency};
pub use provider::{AudioHandle, ProviderOutput, SpeechProvider, VoiceConfig};
pub use scheduler::{ActiveMarks, SpeechmarkScheduler};
pub use speechmark::{MarkPayload, MarkType, RawMark, RawPayload, RawViseme, Speechmark};
pub use timeline::{SchedulerConfig, Timeline, TimelineBuilder, DEFAULT_MIN_END_MARK_DURATION_MS};
pub use viseme::Viseme;
