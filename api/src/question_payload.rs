use serde::Deserialize;

#[derive(Deserialize)]
pub struct QuestionPayload {
    #[serde(default)]
    pub question: String,
}
