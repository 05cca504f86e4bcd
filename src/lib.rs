pub mod completion;
pub mod config;
pub mod conversation;
pub mod fallback;
pub mod relay;
pub mod web_server;

pub use completion::{CompletionClient, CompletionError};
pub use config::Config;
pub use conversation::{ConversationStore, Message, Role};
pub use relay::{RelayOutcome, RelayPolicy};
