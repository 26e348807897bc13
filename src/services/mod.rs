pub mod conversation;
pub mod markdown;
pub mod provider;
pub mod relay;
pub mod session;
pub mod streaming;
pub mod suggestions;
pub mod template;

pub use conversation::Conversation;
pub use relay::Relay;
pub use session::SessionManager;
pub use streaming::StreamingBuffer;
