pub mod models;
pub mod document_processor;
pub mod gemini_service;
pub mod chat_session;
pub mod query_service;
pub mod interaction_log;
pub mod session;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use models::*;
pub use document_processor::{extract_pages_with_lopdf, DocumentProcessor, ExtractionError};
pub use gemini_service::{ApiError, GeminiService, GeminiSettings, GenerativeModel};
pub use chat_session::{ChatSession, ChatState};
pub use query_service::{QaError, QueryService};
pub use interaction_log::InteractionLog;
pub use session::{Session, SessionStore};
