use serde::Serialize;
use tokio::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Process-lifetime ordered log of exchanged messages, shared by every
/// request handler. The mutex serializes appends so concurrent requests
/// never lose an entry; there is intentionally one history for the whole
/// process, matching the single-tenant deployment this serves.
#[derive(Debug, Default)]
pub struct ConversationStore {
    messages: Mutex<Vec<Message>>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn append(&self, message: Message) {
        self.messages.lock().await.push(message);
    }

    /// Cloned snapshot in insertion order.
    pub async fn all(&self) -> Vec<Message> {
        self.messages.lock().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.messages.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.messages.lock().await.is_empty()
    }

    /// Empties the log in place; the store itself lives on.
    pub async fn reset(&self) {
        self.messages.lock().await.clear();
    }
}
