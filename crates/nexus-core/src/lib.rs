pub mod ai;
pub mod avatar;
pub mod client;
pub mod config;
pub mod conversation;
pub mod error;
pub mod state;

#[cfg(test)]
mod test_support;

// Re-export main types for convenience
pub use ai::{GeminiClient, PollinationsImages};
pub use avatar::{resolve_image, AvatarRequestController, PendingImage};
pub use client::{HostedClient, ImageOptions, RemoteGenerationClient};
pub use config::Config;
pub use conversation::{ConversationStore, PendingReply, FALLBACK_REPLY, GREETING};
pub use error::{ConfigError, RemoteError};
pub use state::{Message, MessageId, Sender};
