use chrono::{DateTime, Utc};
use serde::Serialize;
use travel_assistant::{ChatState, ChatTurn, ExtractedDocument, Reply, Session};
use uuid::Uuid;

/// `created_at` is `None` for an id the server holds nothing for.
#[derive(Serialize)]
pub struct SessionResponse {
    pub session_id: Uuid,
    pub created_at: Option<DateTime<Utc>>,
    pub state: ChatState,
    pub history: Vec<ChatTurn>,
    pub document: Option<DocumentView>,
}

impl SessionResponse {
    pub fn unknown(session_id: Uuid) -> Self {
        Self {
            session_id,
            created_at: None,
            state: ChatState::Empty,
            history: Vec::new(),
            document: None,
        }
    }
}

impl From<&Session> for SessionResponse {
    fn from(session: &Session) -> Self {
        Self {
            session_id: session.id,
            created_at: Some(session.created_at),
            state: session.chat.state(),
            history: session.chat.history().to_vec(),
            document: session.document.as_ref().map(DocumentView::from),
        }
    }
}

#[derive(Serialize)]
pub struct ChatResponse {
    pub reply: Reply,
    pub history: Vec<ChatTurn>,
}

/// An uploaded document as the page shows it; the full text stays server-side.
#[derive(Serialize)]
pub struct DocumentView {
    pub filename: String,
    pub preview_text: String,
    pub page_count: usize,
    pub characters: usize,
}

impl From<&ExtractedDocument> for DocumentView {
    fn from(document: &ExtractedDocument) -> Self {
        Self {
            filename: document.filename.clone(),
            preview_text: document.preview_text.clone(),
            page_count: document.page_count,
            characters: document.full_text.chars().count(),
        }
    }
}
