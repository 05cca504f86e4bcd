use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use crate::completion::{CompletionClient, CompletionError};
use crate::config::Config;
use crate::conversation::{ConversationStore, Message};
use crate::fallback;

const EMPTY_MESSAGE_WARNING: &str = "⚠️ Pesan kosong terdeteksi. Silakan ketik sesuatu!";

/// Terminal result of one relay invocation. The conversation store already
/// holds the appended messages by the time this is returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayOutcome {
    /// Empty input; one warning appended, no remote call attempted.
    Rejected { warning: String },
    /// Live completion from the remote model.
    Fulfilled { reply: String },
    /// Fallback text or a classified error description stood in for the
    /// model.
    Degraded { reply: String },
}

impl RelayOutcome {
    /// The assistant-visible text, whatever path produced it.
    pub fn reply(&self) -> &str {
        match self {
            RelayOutcome::Rejected { warning } => warning,
            RelayOutcome::Fulfilled { reply } | RelayOutcome::Degraded { reply } => reply,
        }
    }
}

/// Per-message orchestration: validates input, records the user message,
/// then answers from the completion API, the fallback responder, or a
/// classified error description. Nothing here is fatal to the process;
/// every path resolves to a message in the conversation.
pub struct RelayPolicy {
    store: Arc<ConversationStore>,
    client: Option<CompletionClient>,
    mask_remote_failures: bool,
}

impl RelayPolicy {
    pub fn new(config: &Config, store: Arc<ConversationStore>) -> Result<Self> {
        let client = match &config.api_key {
            Some(key) => Some(CompletionClient::new(
                key.clone(),
                config.api_base.clone(),
                config.model.clone(),
            )?),
            None => {
                info!("No API key configured; all replies come from the fallback responder");
                None
            }
        };

        Ok(Self {
            store,
            client,
            mask_remote_failures: config.mask_remote_failures,
        })
    }

    pub async fn handle_message(&self, text: &str) -> RelayOutcome {
        if text.trim().is_empty() {
            self.store
                .append(Message::assistant(EMPTY_MESSAGE_WARNING))
                .await;
            return RelayOutcome::Rejected {
                warning: EMPTY_MESSAGE_WARNING.to_string(),
            };
        }

        // Recorded before any remote work, so a failed call still leaves
        // the user's side of the exchange in the history.
        self.store.append(Message::user(text)).await;

        let outcome = match &self.client {
            None => RelayOutcome::Degraded {
                reply: fallback::respond(text),
            },
            Some(client) => match client.complete(text).await {
                Ok(reply) => RelayOutcome::Fulfilled { reply },
                Err(e @ (CompletionError::Unauthorized | CompletionError::RateLimited))
                    if self.mask_remote_failures =>
                {
                    // Deliberate masking: the user sees a normal-looking
                    // canned reply, not the auth/quota failure.
                    warn!("Completion degraded to fallback: {}", e);
                    RelayOutcome::Degraded {
                        reply: fallback::respond(text),
                    }
                }
                Err(e) => {
                    tracing::error!("Completion failed: {}", e);
                    RelayOutcome::Degraded {
                        reply: describe_failure(&e),
                    }
                }
            },
        };

        self.store
            .append(Message::assistant(outcome.reply()))
            .await;
        outcome
    }

    pub async fn history(&self) -> Vec<Message> {
        self.store.all().await
    }

    pub async fn reset(&self) {
        self.store.reset().await;
        info!("Conversation history cleared");
    }
}

/// User-facing description of a classified failure, appended as an
/// assistant message on the paths that surface errors instead of masking
/// them.
fn describe_failure(error: &CompletionError) -> String {
    match error {
        CompletionError::Unauthorized => {
            "🔑 API key tidak valid. Silakan periksa API key Anda di file .env".to_string()
        }
        CompletionError::RateLimited => {
            "⚠️ Terlalu banyak permintaan atau quota API habis. Silakan tunggu beberapa menit \
             lalu coba lagi."
                .to_string()
        }
        CompletionError::ServerFault(_) => {
            "🔧 Server AI sedang bermasalah. Silakan coba lagi nanti.".to_string()
        }
        CompletionError::NetworkUnreachable(_) => {
            "🌐 Tidak dapat terhubung ke server AI. Periksa koneksi internet Anda.".to_string()
        }
        CompletionError::Unknown(detail) => format!("❌ Terjadi kesalahan: {detail}"),
    }
}
