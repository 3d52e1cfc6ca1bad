//! Page-by-page PDF text extraction
//!
//! A page that fails to decode, or decodes to nothing, contributes a
//! placeholder line instead of aborting the whole document.

use super::ExtractError;

pub const NO_TEXT_MESSAGE: &str = "No text content could be extracted from this PDF. \
    The document might be scanned images or have no selectable text.";

/// Anything that can hand out text one page at a time
pub trait PageSource {
    fn page_count(&self) -> usize;

    /// Text of a 1-indexed page
    fn page_text(&self, page: usize) -> Result<String, String>;
}

/// [`PageSource`] backed by lopdf
pub struct LopdfPages {
    document: lopdf::Document,
    pages: Vec<u32>,
}

impl LopdfPages {
    /// Parse a document
    ///
    /// # Errors
    /// Returns [`ExtractError::Pdf`] if the bytes are not a readable PDF.
    pub fn load(bytes: &[u8]) -> Result<Self, ExtractError> {
        let document =
            lopdf::Document::load_mem(bytes).map_err(|e| ExtractError::Pdf(e.to_string()))?;
        let pages = document.get_pages().keys().copied().collect();
        Ok(Self { document, pages })
    }
}

impl PageSource for LopdfPages {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_text(&self, page: usize) -> Result<String, String> {
        let number = page
            .checked_sub(1)
            .and_then(|index| self.pages.get(index))
            .ok_or_else(|| format!("page {} out of range", page))?;
        self.document
            .extract_text(&[*number])
            .map_err(|e| e.to_string())
    }
}

/// Render every page of `source` into one text block
pub fn render_pages(source: &dyn PageSource) -> String {
    let mut text = String::new();
    let mut pages_with_text = 0;

    for page in 1..=source.page_count() {
        match source.page_text(page) {
            Ok(page_text) if !page_text.trim().is_empty() => {
                text.push_str(page_text.trim());
                text.push('\n');
                pages_with_text += 1;
            }
            Ok(_) => {
                tracing::debug!(page = page, "PDF page has no text content");
                text.push_str(&format!("[Page {} - No text content (scanned image)]\n", page));
            }
            Err(e) => {
                tracing::warn!(page = page, error = %e, "Failed to read PDF page");
                text.push_str(&format!("[Page {} - Error reading content]\n", page));
            }
        }
    }

    tracing::debug!(
        page_count = source.page_count(),
        pages_with_text = pages_with_text,
        "Processed PDF"
    );

    if pages_with_text == 0 {
        NO_TEXT_MESSAGE.to_string()
    } else {
        text.trim().to_string()
    }
}

/// Extract the text of a PDF
pub fn extract(bytes: &[u8]) -> Result<String, ExtractError> {
    let pages = LopdfPages::load(bytes)?;
    Ok(render_pages(&pages))
}
