use crate::models::*;
use std::panic;

/// Number of characters shown in the extracted-text preview.
pub const PREVIEW_CHARS: usize = 500;

#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("failed to load PDF: {0}")]
    Load(String),
    #[error("extraction task failed: {0}")]
    Task(String),
}

#[derive(Default)]
pub struct DocumentProcessor;

impl DocumentProcessor {
    pub fn new() -> Self {
        Self
    }

    pub async fn process_pdf(
        &self,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<ExtractedDocument, ExtractionError> {
        log::info!("Processing PDF: {} ({} bytes)", filename, bytes.len());

        let pages = tokio::task::spawn_blocking(move || Self::extract_pages(&bytes))
            .await
            .map_err(|e| ExtractionError::Task(e.to_string()))??;

        let full_text = join_pages(pages.iter().map(|page| Some(page.as_str())));
        log::info!(
            "Extracted {} characters from {} page(s) of {}",
            full_text.chars().count(),
            pages.len(),
            filename
        );

        Ok(ExtractedDocument {
            filename: filename.to_string(),
            preview_text: preview_text(&full_text),
            full_text,
            page_count: pages.len(),
        })
    }

    /// Text of every page, in page order.
    ///
    /// pdf-extract handles most documents; when it rejects one (or panics on
    /// it) the document is reopened with lopdf and read page by page, with
    /// unreadable pages left empty.
    pub fn extract_pages(bytes: &[u8]) -> Result<Vec<String>, ExtractionError> {
        match panic::catch_unwind(|| pdf_extract::extract_text_from_mem_by_pages(bytes)) {
            Ok(Ok(pages)) => return Ok(pages),
            Ok(Err(e)) => log::warn!("pdf-extract failed, reading pages with lopdf: {}", e),
            Err(_) => log::warn!("pdf-extract panicked, reading pages with lopdf"),
        }

        extract_pages_with_lopdf(bytes)
    }
}

/// Reads the document page by page with lopdf; a page whose text cannot be
/// extracted comes back as `""` so page numbering is preserved.
pub fn extract_pages_with_lopdf(bytes: &[u8]) -> Result<Vec<String>, ExtractionError> {
    let document =
        lopdf::Document::load_mem(bytes).map_err(|e| ExtractionError::Load(e.to_string()))?;

    let pages = document
        .get_pages()
        .into_keys()
        .map(|page_number| match document.extract_text(&[page_number]) {
            Ok(text) => text,
            Err(e) => {
                log::warn!("No text on page {}: {}", page_number, e);
                String::new()
            }
        })
        .collect();

    Ok(pages)
}

/// Concatenates page texts in order; a page without text contributes nothing.
pub fn join_pages<'a, I>(pages: I) -> String
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    pages.into_iter().map(|page| page.unwrap_or("")).collect()
}

pub fn preview_text(text: &str) -> String {
    match text.char_indices().nth(PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::pdf_with_pages;
    use lopdf::Object;

    /// Three pages whose second page points its contents at a missing object.
    fn pdf_with_dangling_second_page() -> Vec<u8> {
        let pdf = pdf_with_pages(&["Alpha itinerary", "Beta", "Gamma hotels"]);
        let mut doc = lopdf::Document::load_mem(&pdf).unwrap();
        let page_id = doc.get_pages()[&2];
        doc.get_object_mut(page_id)
            .unwrap()
            .as_dict_mut()
            .unwrap()
            .set("Contents", Object::Reference((9999, 0)));

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn missing_pages_contribute_empty_text() {
        let text = join_pages([Some("Day 1: Rome. "), None, Some("Day 3: Florence.")]);
        assert_eq!(text, "Day 1: Rome. Day 3: Florence.");
    }

    #[test]
    fn short_text_is_previewed_unchanged() {
        let text = "a".repeat(PREVIEW_CHARS);
        assert_eq!(preview_text(&text), text);
        assert_eq!(preview_text(""), "");
    }

    #[test]
    fn long_text_is_truncated_with_ellipsis() {
        let text = "b".repeat(PREVIEW_CHARS + 1);
        let preview = preview_text(&text);

        assert_eq!(preview.len(), PREVIEW_CHARS + 3);
        assert!(preview.ends_with("..."));
        assert_eq!(&preview[..PREVIEW_CHARS], &text[..PREVIEW_CHARS]);
    }

    #[test]
    fn preview_counts_characters_not_bytes() {
        let text = "é".repeat(PREVIEW_CHARS + 10);
        let preview = preview_text(&text);

        assert_eq!(preview.chars().count(), PREVIEW_CHARS + 3);
        assert!(preview.starts_with(&"é".repeat(PREVIEW_CHARS)));
    }

    #[test]
    fn extracts_every_page_in_order() {
        let pdf = pdf_with_pages(&["Alpha itinerary", "", "Gamma hotels"]);
        let pages = DocumentProcessor::extract_pages(&pdf).unwrap();

        assert_eq!(pages.len(), 3);
        assert!(pages[0].contains("Alpha"));
        assert!(pages[1].trim().is_empty());
        assert!(pages[2].contains("Gamma"));
    }

    #[test]
    fn garbage_is_a_load_error() {
        let err = DocumentProcessor::extract_pages(b"definitely not a pdf").unwrap_err();
        assert!(matches!(err, ExtractionError::Load(_)));

        let err = extract_pages_with_lopdf(b"definitely not a pdf").unwrap_err();
        assert!(matches!(err, ExtractionError::Load(_)));
    }

    #[test]
    fn lopdf_reads_every_page_in_order() {
        let pdf = pdf_with_pages(&["Alpha itinerary", "", "Gamma hotels"]);
        let pages = extract_pages_with_lopdf(&pdf).unwrap();

        assert_eq!(pages.len(), 3);
        assert!(pages[0].contains("Alpha itinerary"));
        assert!(pages[1].trim().is_empty());
        assert!(pages[2].contains("Gamma hotels"));
    }

    #[test]
    fn unreadable_page_is_empty_and_keeps_its_place() {
        let pdf = pdf_with_dangling_second_page();

        let pages = extract_pages_with_lopdf(&pdf).unwrap();
        assert_eq!(pages.len(), 3);
        assert!(pages[0].contains("Alpha itinerary"));
        assert_eq!(pages[1], "");
        assert!(pages[2].contains("Gamma hotels"));

        let pages = DocumentProcessor::extract_pages(&pdf).unwrap();
        assert_eq!(pages.len(), 3);
        assert!(pages[0].contains("Alpha itinerary"));
        assert_eq!(pages[1], "");
        assert!(pages[2].contains("Gamma hotels"));
    }

    #[tokio::test]
    async fn full_text_is_exactly_the_pages_joined() {
        let pdf = pdf_with_dangling_second_page();
        let pages = DocumentProcessor::extract_pages(&pdf).unwrap();

        let document = DocumentProcessor::new()
            .process_pdf("broken.pdf", pdf)
            .await
            .unwrap();

        assert_eq!(document.page_count, 3);
        assert_eq!(document.full_text, pages.concat());
        assert!(!document.full_text.contains("Beta"));
    }

    #[tokio::test]
    async fn processed_document_concatenates_pages() {
        let pdf = pdf_with_pages(&["Alpha itinerary", "", "Gamma hotels"]);
        let document = DocumentProcessor::new()
            .process_pdf("trip.pdf", pdf)
            .await
            .unwrap();

        assert_eq!(document.filename, "trip.pdf");
        assert_eq!(document.page_count, 3);
        let alpha = document.full_text.find("Alpha").unwrap();
        let gamma = document.full_text.find("Gamma").unwrap();
        assert!(alpha < gamma);
        assert_eq!(document.preview_text, document.full_text);
    }
}
