// PDF text extraction via lopdf, one line block per page.

use super::ExtractError;

#[cfg(feature = "pdf")]
pub fn extract_pdf(bytes: &[u8]) -> Result<String, ExtractError> {
    let doc = lopdf::Document::load_mem(bytes)
        .map_err(|e| ExtractError::Decode(format!("Error reading PDF: {e}")))?;

    let mut text = String::new();
    for page in doc.get_pages().keys() {
        let page_text = doc
            .extract_text(&[*page])
            .map_err(|e| ExtractError::Decode(format!("Error reading PDF page {page}: {e}")))?;
        text.push_str(&page_text);
        text.push('\n');
    }

    Ok(text)
}

#[cfg(not(feature = "pdf"))]
pub fn extract_pdf(_bytes: &[u8]) -> Result<String, ExtractError> {
    Err(ExtractError::MissingDecoder("PDF", "pdf"))
}
