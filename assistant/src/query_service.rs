use crate::gemini_service::{ApiError, GenerativeModel};
use crate::models::*;
use std::sync::Arc;

pub const EMPTY_QUESTION_WARNING: &str = "Please enter a question, we can't read your mind (yet).";

#[derive(Debug, thiserror::Error)]
pub enum QaError {
    #[error("{}", EMPTY_QUESTION_WARNING)]
    EmptyQuestion,
    #[error(transparent)]
    Model(#[from] ApiError),
}

impl From<Result<String, QaError>> for Reply {
    fn from(result: Result<String, QaError>) -> Self {
        match result {
            Ok(text) => Reply::Success(text),
            Err(QaError::EmptyQuestion) => Reply::Warning(EMPTY_QUESTION_WARNING.to_string()),
            Err(QaError::Model(e)) => Reply::error(e),
        }
    }
}

impl From<Result<String, ApiError>> for Reply {
    fn from(result: Result<String, ApiError>) -> Self {
        match result {
            Ok(text) => Reply::Success(text),
            Err(e) => Reply::error(e),
        }
    }
}

/// Summaries of, and answers about, an uploaded document.
pub struct QueryService {
    model: Arc<dyn GenerativeModel>,
    domain: Option<String>,
}

impl QueryService {
    /// `domain` restricts answers to one topic (e.g. "travel"); `None` answers anything the text covers.
    pub fn new(model: Arc<dyn GenerativeModel>, domain: Option<String>) -> Self {
        Self { model, domain }
    }

    pub fn domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }

    pub async fn summarize(&self, full_text: &str) -> Result<String, ApiError> {
        log::info!("Summarizing {} characters", full_text.chars().count());
        let prompt = self.build_summary_prompt(full_text);
        self.model.generate(&[ChatTurn::user(prompt)]).await
    }

    pub async fn answer(&self, full_text: &str, question: &str) -> Result<String, QaError> {
        // Whitespace-only counts as empty on purpose: it gets the warning, not a model call.
        if question.trim().is_empty() {
            return Err(QaError::EmptyQuestion);
        }

        log::info!("Answering question against {} characters", full_text.chars().count());
        let prompt = self.build_question_prompt(full_text, question);
        Ok(self.model.generate(&[ChatTurn::user(prompt)]).await?)
    }

    fn build_summary_prompt(&self, text: &str) -> String {
        format!("Please summarize the following text:\n\n{text}")
    }

    fn build_question_prompt(&self, text: &str, question: &str) -> String {
        match &self.domain {
            None => format!(
                "Please answer the following question based on the provided text:\n\nText: {text}\n\nQuestion: {question}"
            ),
            Some(domain) => format!(
                r#"You are an assistant that only answers questions about {domain}.

INSTRUCTIONS:
1. Answer the question using ONLY the information in the provided text
2. Only answer questions related to {domain}; otherwise reply that you can only help with {domain} questions about this document
3. If the text does not contain the answer, say so clearly

Text: {text}

Question: {question}"#
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockModel;

    const BROCHURE: &str = "The Amalfi tour departs daily at 9am from Naples.";

    fn service(model: Arc<MockModel>, domain: Option<&str>) -> QueryService {
        QueryService::new(model, domain.map(str::to_string))
    }

    #[tokio::test]
    async fn empty_question_warns_without_calling_the_model() {
        let model = Arc::new(MockModel::new());
        let qa = service(model.clone(), Some("travel"));

        for question in ["", "   \n"] {
            let reply = Reply::from(qa.answer(BROCHURE, question).await);
            assert_eq!(reply, Reply::Warning(EMPTY_QUESTION_WARNING.to_string()));
        }
        assert_eq!(model.calls(), 0);
    }

    #[tokio::test]
    async fn summary_wraps_text_in_template() {
        let model = Arc::new(MockModel::new());
        let qa = service(model.clone(), None);

        qa.summarize(BROCHURE).await.unwrap();

        assert_eq!(
            model.last_prompt().unwrap(),
            format!("Please summarize the following text:\n\n{BROCHURE}")
        );
    }

    #[tokio::test]
    async fn domain_agnostic_question_template() {
        let model = Arc::new(MockModel::new());
        let qa = service(model.clone(), None);

        qa.answer(BROCHURE, "When does it leave?").await.unwrap();

        assert_eq!(
            model.last_prompt().unwrap(),
            format!(
                "Please answer the following question based on the provided text:\n\nText: {BROCHURE}\n\nQuestion: When does it leave?"
            )
        );
    }

    #[tokio::test]
    async fn travel_template_constrains_the_domain() {
        let model = Arc::new(MockModel::new());
        let qa = service(model.clone(), Some("travel"));

        qa.answer(BROCHURE, "When does it leave?").await.unwrap();

        let prompt = model.last_prompt().unwrap();
        assert!(prompt.contains("only answers questions about travel"));
        assert!(prompt.contains(&format!("Text: {BROCHURE}")));
        assert!(prompt.ends_with("Question: When does it leave?"));
        assert_eq!(model.requests()[0].len(), 1);
    }

    #[tokio::test]
    async fn model_failure_renders_as_error_text() {
        let model = Arc::new(MockModel::failing("connection reset"));
        let qa = service(model.clone(), Some("travel"));

        let summary = Reply::from(qa.summarize(BROCHURE).await);
        let answer = Reply::from(qa.answer(BROCHURE, "Price?").await);

        assert_eq!(summary.text(), "An error occurred: request failed: connection reset");
        assert!(answer.text().starts_with("An error occurred:"));
        assert!(matches!(answer, Reply::Error(_)));
        assert_eq!(model.calls(), 2);
    }
}
