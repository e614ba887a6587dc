//! Assistant trial chat controller.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::messages;
use crate::gateway::{BackendGateway, QueryRequest};
use crate::onboarding::OnboardingStore;

pub use crate::gateway::mock::SUGGESTED_QUERIES;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    User,
    Assistant,
}

/// One message in the trial chat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatEntry {
    pub id: Uuid,
    pub role: ChatRole,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<String>,
}

impl ChatEntry {
    fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content: content.into(),
            sources: Vec::new(),
        }
    }
}

pub struct AssistantScreen {
    store: Arc<OnboardingStore>,
    gateway: Arc<dyn BackendGateway>,
    busy: bool,
    messages: Vec<ChatEntry>,
}

impl AssistantScreen {
    pub fn new(store: Arc<OnboardingStore>, gateway: Arc<dyn BackendGateway>) -> Self {
        Self {
            store,
            gateway,
            busy: false,
            messages: Vec::new(),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn messages(&self) -> &[ChatEntry] {
        &self.messages
    }

    /// Prompts to offer while the conversation is empty.
    pub fn suggestions(&self) -> &'static [&'static str] {
        if self.messages.is_empty() {
            &SUGGESTED_QUERIES
        } else {
            &[]
        }
    }

    /// Ask the assistant something.
    ///
    /// Blank input is ignored. The user's message is always logged; the
    /// reply is either the assistant's answer or an apology on failure.
    /// Returns the assistant entry that was appended.
    pub async fn send(&mut self, query: &str) -> Option<&ChatEntry> {
        if query.trim().is_empty() || self.busy {
            return None;
        }
        self.messages.push(ChatEntry::new(ChatRole::User, query));
        self.busy = true;

        let request = QueryRequest {
            business_id: self.store.business_id().await,
            query: query.to_string(),
        };
        let result = self.gateway.query(request).await;
        self.busy = false;

        let reply = match result {
            Ok(response) => {
                let mut entry = ChatEntry::new(ChatRole::Assistant, response.response);
                entry.sources = response.sources.unwrap_or_default();
                entry
            }
            Err(e) => {
                tracing::warn!("Assistant query failed: {}", e);
                ChatEntry::new(ChatRole::Assistant, messages::QUERY_FAILED)
            }
        };
        self.messages.push(reply);
        self.messages.last()
    }
}
