use std::sync::Arc;
use travel_assistant::{DocumentProcessor, GenerativeModel, InteractionLog, QueryService, SessionStore};

#[derive(Clone)]
pub struct AppState {
    pub sessions: SessionStore,
    pub model: Arc<dyn GenerativeModel>,
    pub model_name: String,
    pub query_service: Arc<QueryService>,
    pub document_processor: Arc<DocumentProcessor>,
    pub interactions: Arc<InteractionLog>,
}

impl AppState {
    pub fn new(
        model: Arc<dyn GenerativeModel>,
        model_name: impl Into<String>,
        qa_domain: Option<String>,
        interactions: InteractionLog,
    ) -> Self {
        Self {
            sessions: SessionStore::new(),
            query_service: Arc::new(QueryService::new(model.clone(), qa_domain)),
            model,
            model_name: model_name.into(),
            document_processor: Arc::new(DocumentProcessor::new()),
            interactions: Arc::new(interactions),
        }
    }
}
