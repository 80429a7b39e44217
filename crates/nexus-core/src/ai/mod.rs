pub mod gemini;
pub mod pollinations;

pub use gemini::{GeminiClient, GeminiClientBuilder};
pub use pollinations::PollinationsImages;
