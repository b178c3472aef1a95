//! Adapters for concrete provider styles. Network access lives behind the
//! transport traits so adapters stay testable offline.

pub mod azure;
pub mod polly;

pub use azure::{build_ssml, AzureEvent, AzureSpeechProvider, AzureSynthesis, AzureTransport};
pub use polly::{parse_speechmarks, PollySpeechProvider, PollyTransport, TextType};
