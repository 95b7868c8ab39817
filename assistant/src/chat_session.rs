use crate::gemini_service::{ApiError, GenerativeModel};
use crate::models::*;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatState {
    Empty,
    Active,
}

/// Append-only conversation with the model.
#[derive(Debug, Clone, Default)]
pub struct ChatSession {
    history: Vec<ChatTurn>,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self) -> &[ChatTurn] {
        &self.history
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn state(&self) -> ChatState {
        if self.history.is_empty() {
            ChatState::Empty
        } else {
            ChatState::Active
        }
    }

    /// Sends `message` with the whole history and records the exchange.
    ///
    /// Both turns are appended only once the model has answered, so a failed
    /// call leaves the history as it was.
    pub async fn send(
        &mut self,
        model: &dyn GenerativeModel,
        message: &str,
    ) -> Result<String, ApiError> {
        let user_turn = ChatTurn::user(message);

        let mut contents = Vec::with_capacity(self.history.len() + 1);
        contents.extend_from_slice(&self.history);
        contents.push(user_turn.clone());

        let response = model.generate(&contents).await?;

        self.history.push(user_turn);
        self.history.push(ChatTurn::assistant(response.clone()));

        Ok(response)
    }
}
