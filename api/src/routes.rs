use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    response::Html,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};
use travel_assistant::Reply;
use uuid::Uuid;

use crate::chat_payload::ChatPayload;
use crate::error_response::{failure, Failure};
use crate::question_payload::QuestionPayload;
use crate::session_response::{ChatResponse, DocumentView, SessionResponse};
use crate::state::AppState;

pub const NO_DOCUMENT_WARNING: &str = "Please upload a PDF file first.";
pub const EMPTY_MESSAGE_WARNING: &str = "Please type a message first.";

const INDEX_HTML: &str = include_str!("../static/index.html");

pub fn create_router(state: AppState, max_upload_bytes: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/sessions/:id", get(get_session).delete(end_session))
        .route("/sessions/:id/chat", post(chat))
        .route("/sessions/:id/document", post(upload_document))
        .route("/sessions/:id/summary", post(summarize))
        .route("/sessions/:id/ask", post(ask))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(cors)
        .with_state(state)
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "model": state.model_name,
        "qa_domain": state.query_service.domain(),
        "sessions": state.sessions.len().await,
    }))
}

async fn get_session(State(state): State<AppState>, Path(id): Path<Uuid>) -> Json<SessionResponse> {
    match state.sessions.peek(id).await {
        Some(session) => Json(SessionResponse::from(&*session)),
        None => Json(SessionResponse::unknown(id)),
    }
}

async fn end_session(State(state): State<AppState>, Path(id): Path<Uuid>) -> StatusCode {
    if state.sessions.remove(id).await {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

async fn chat(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ChatPayload>,
) -> Json<ChatResponse> {
    let mut session = state.sessions.open(id).await;

    let message = payload.message.trim();
    if message.is_empty() {
        return Json(ChatResponse {
            reply: Reply::Warning(EMPTY_MESSAGE_WARNING.to_string()),
            history: session.chat.history().to_vec(),
        });
    }

    state
        .interactions
        .record(&format!("[{}] user: {}", id, message))
        .await;

    let result = session.chat.send(state.model.as_ref(), message).await;
    if let Err(e) = &result {
        log::error!("Chat request failed for session {}: {}", id, e);
    }
    let reply = Reply::from(result);

    state
        .interactions
        .record(&format!("[{}] assistant: {}", id, reply.text()))
        .await;

    Json(ChatResponse {
        reply,
        history: session.chat.history().to_vec(),
    })
}

async fn upload_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Json<DocumentView>, Failure> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| failure(e.status(), format!("Failed to read multipart: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or("upload.pdf").to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| failure(e.status(), format!("Failed to read upload: {}", e)))?;
        upload = Some((filename, content_type, bytes));
        break;
    }

    let (filename, content_type, bytes) = upload
        .ok_or_else(|| failure(StatusCode::BAD_REQUEST, "Upload must include a `file` field"))?;

    if !is_pdf(&filename, content_type.as_deref()) {
        return Err(failure(
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            format!("{} is not a PDF file", filename),
        ));
    }

    let mut session = state.sessions.open(id).await;

    let document = state
        .document_processor
        .process_pdf(&filename, bytes.to_vec())
        .await
        .map_err(|e| {
            log::error!("Extraction failed for {} in session {}: {}", filename, id, e);
            failure(StatusCode::UNPROCESSABLE_ENTITY, e.to_string())
        })?;

    let view = DocumentView::from(&document);
    session.document = Some(document);

    state
        .interactions
        .record(&format!(
            "[{}] uploaded {} ({} pages, {} characters)",
            id, view.filename, view.page_count, view.characters
        ))
        .await;

    Ok(Json(view))
}

async fn summarize(State(state): State<AppState>, Path(id): Path<Uuid>) -> Json<Reply> {
    let session = state.sessions.open(id).await;

    let Some(document) = &session.document else {
        return Json(Reply::Warning(NO_DOCUMENT_WARNING.to_string()));
    };

    let result = state.query_service.summarize(&document.full_text).await;
    if let Err(e) = &result {
        log::error!("Summary failed for session {}: {}", id, e);
    }
    let reply = Reply::from(result);

    state
        .interactions
        .record(&format!("[{}] summary of {}: {}", id, document.filename, reply.text()))
        .await;

    Json(reply)
}

async fn ask(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<QuestionPayload>,
) -> Json<Reply> {
    let session = state.sessions.open(id).await;

    let Some(document) = &session.document else {
        return Json(Reply::Warning(NO_DOCUMENT_WARNING.to_string()));
    };

    let result = state
        .query_service
        .answer(&document.full_text, &payload.question)
        .await;
    let reply = Reply::from(result);
    if let Reply::Error(text) = &reply {
        log::error!("Question failed for session {}: {}", id, text);
    }

    if !matches!(reply, Reply::Warning(_)) {
        state
            .interactions
            .record(&format!(
                "[{}] question about {}: {} -> {}",
                id,
                document.filename,
                payload.question.trim(),
                reply.text()
            ))
            .await;
    }

    Json(reply)
}

fn is_pdf(filename: &str, content_type: Option<&str>) -> bool {
    content_type == Some("application/pdf") || filename.to_lowercase().ends_with(".pdf")
}
