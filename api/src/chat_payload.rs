use serde::Deserialize;

#[derive(Deserialize)]
pub struct ChatPayload {
    pub message: String,
}
