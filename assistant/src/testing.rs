//! Test doubles shared by this crate's tests and the API crate's router tests.

use crate::gemini_service::{ApiError, GenerativeModel};
use crate::models::ChatTurn;
use async_trait::async_trait;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// A model that answers from a script and remembers what it was asked.
#[derive(Default)]
pub struct MockModel {
    fail_with: Option<String>,
    calls: AtomicUsize,
    requests: Mutex<Vec<Vec<ChatTurn>>>,
}

impl MockModel {
    /// Replies `reply #N to: <last user text>`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call fails with a transport error carrying `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            fail_with: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<Vec<ChatTurn>> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.requests()
            .last()
            .and_then(|turns| turns.last())
            .map(|turn| turn.text.clone())
    }
}

#[async_trait]
impl GenerativeModel for MockModel {
    async fn generate(&self, contents: &[ChatTurn]) -> Result<String, ApiError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(contents.to_vec());
        }

        if let Some(message) = &self.fail_with {
            return Err(ApiError::Transport(message.clone()));
        }

        let last = contents.last().map(|t| t.text.as_str()).unwrap_or("");
        Ok(format!("reply #{} to: {}", n, last))
    }
}

/// Builds a PDF with one page per entry; an empty entry gives a page without text.
pub fn pdf_with_pages(pages: &[&str]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids: Vec<Object> = Vec::new();
    for text in pages {
        let operations = if text.is_empty() {
            Vec::new()
        } else {
            vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ]
        };
        let content = Content { operations };
        let encoded = content.encode().unwrap_or_default();
        let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    if let Err(e) = doc.save_to(&mut bytes) {
        log::error!("Failed to serialize test PDF: {}", e);
    }
    bytes
}
