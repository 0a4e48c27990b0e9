// External podcast generator: the producer interface and its Gemini-backed client.

pub mod gemini;
pub mod traits;

pub use gemini::GeminiGenerator;
pub use traits::{decode_audio_payload, GenerationError, PodcastGenerator};
