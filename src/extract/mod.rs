// File extraction: uploaded files to plain document strings.
//
// One bad file never sinks the batch: `process_files` returns the text it
// could extract alongside a human-readable error per rejected file.
// PDF and Office decoders are optional cargo features; when one is compiled
// out, its files are reported as a missing dependency rather than rejected
// as unsupported.

pub mod office;
pub mod pdf;
pub mod text;

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use thiserror::Error;
use tracing::{debug, warn};

/// Extensions accepted for upload (case-insensitive).
pub const ALLOWED_EXTENSIONS: [&str; 5] = ["txt", "pdf", "docx", "doc", "pptx"];

/// Largest accepted file, in bytes.
pub const MAX_FILE_SIZE: usize = 10 * 1024 * 1024;

/// An uploaded file: its client-supplied name and raw bytes.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    /// Read a file from disk, keeping only its file name.
    pub fn read(path: &Path) -> Result<Self> {
        let bytes =
            std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self { name, bytes })
    }

    /// Lowercased extension, if the name has one.
    pub fn extension(&self) -> Option<String> {
        self.name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_lowercase())
            .filter(|ext| !ext.is_empty())
    }
}

/// Supported document formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Txt,
    /// Legacy Word files, read as plain text
    Doc,
    Pdf,
    Docx,
    Pptx,
}

impl FileKind {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "txt" => Some(Self::Txt),
            "doc" => Some(Self::Doc),
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            "pptx" => Some(Self::Pptx),
            _ => None,
        }
    }
}

/// Why a single file produced no text.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Unsupported file type: {0}")]
    Unsupported(String),

    #[error("{0} support is not compiled in (enable the `{1}` feature)")]
    MissingDecoder(&'static str, &'static str),

    #[error("{0}")]
    Decode(String),
}

/// Extract the trimmed text of a file of the given kind.
pub fn extract_text(bytes: &[u8], kind: FileKind) -> Result<String, ExtractError> {
    let text = match kind {
        FileKind::Txt | FileKind::Doc => text::decode_text(bytes),
        FileKind::Pdf => pdf::extract_pdf(bytes)?,
        FileKind::Docx => office::extract_docx(bytes)?,
        FileKind::Pptx => office::extract_pptx(bytes)?,
    };
    Ok(text.trim().to_string())
}

/// Extract every file, collecting documents and per-file error messages.
pub fn process_files(files: &[UploadedFile]) -> (Vec<String>, Vec<String>) {
    let mut documents = Vec::new();
    let mut errors = Vec::new();

    for file in files {
        match process_file(file) {
            Ok(text) => {
                debug!(file = %file.name, chars = text.len(), "Extracted text");
                documents.push(text);
            }
            Err(message) => {
                warn!(file = %file.name, error = %message, "File skipped");
                errors.push(message);
            }
        }
    }

    (documents, errors)
}

fn process_file(file: &UploadedFile) -> Result<String, String> {
    if file.name.is_empty() {
        return Err("Empty filename".to_string());
    }

    let kind = file
        .extension()
        .as_deref()
        .and_then(FileKind::from_extension)
        .ok_or_else(|| format!("File type not allowed: {}", file.name))?;

    if file.bytes.len() > MAX_FILE_SIZE {
        return Err(format!("File too large: {} (max 10MB)", file.name));
    }

    match extract_text(&file.bytes, kind) {
        Ok(text) if text.is_empty() => Err(format!("No text extracted from: {}", file.name)),
        Ok(text) => Ok(text),
        Err(e @ ExtractError::MissingDecoder(..)) => {
            Err(format!("Missing dependency for {}: {}", file.name, e))
        }
        Err(e) => Err(format!("Error processing {}: {}", file.name, e)),
    }
}

/// Which formats this build can decode.
pub fn supported_formats() -> BTreeMap<&'static str, bool> {
    BTreeMap::from([
        ("txt", true),
        ("pdf", cfg!(feature = "pdf")),
        ("docx", cfg!(feature = "office")),
        ("pptx", cfg!(feature = "office")),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_txt_and_exe_mixed_batch() {
        let files = vec![
            UploadedFile::new("notes.txt", b"Quarterly revenue grew".to_vec()),
            UploadedFile::new("setup.exe", vec![0x4d, 0x5a, 0x90]),
        ];
        let (docs, errors) = process_files(&files);
        assert_eq!(docs, vec!["Quarterly revenue grew".to_string()]);
        assert_eq!(errors, vec!["File type not allowed: setup.exe".to_string()]);
    }

    #[test]
    fn test_empty_filename() {
        let (docs, errors) = process_files(&[UploadedFile::new("", b"text".to_vec())]);
        assert!(docs.is_empty());
        assert_eq!(errors, vec!["Empty filename".to_string()]);
    }

    #[test]
    fn test_no_extension_not_allowed() {
        let (_, errors) = process_files(&[UploadedFile::new("README", b"text".to_vec())]);
        assert_eq!(errors, vec!["File type not allowed: README".to_string()]);
    }

    #[test]
    fn test_oversize_rejected() {
        let big = vec![b'a'; MAX_FILE_SIZE + 1];
        let (docs, errors) = process_files(&[UploadedFile::new("big.txt", big)]);
        assert!(docs.is_empty());
        assert_eq!(errors, vec!["File too large: big.txt (max 10MB)".to_string()]);
    }

    #[test]
    fn test_whitespace_only_file_reports_no_text() {
        let (docs, errors) = process_files(&[UploadedFile::new("blank.TXT", b"  \n ".to_vec())]);
        assert!(docs.is_empty());
        assert_eq!(errors, vec!["No text extracted from: blank.TXT".to_string()]);
    }

    #[test]
    fn test_doc_read_as_text() {
        let (docs, errors) = process_files(&[UploadedFile::new("legacy.doc", b" plain ".to_vec())]);
        assert!(errors.is_empty());
        assert_eq!(docs, vec!["plain".to_string()]);
    }

    #[test]
    fn test_extension_is_case_insensitive() {
        let file = UploadedFile::new("Report.PDF", Vec::new());
        assert_eq!(file.extension().as_deref(), Some("pdf"));
        assert_eq!(FileKind::from_extension("PPTX"), Some(FileKind::Pptx));
    }

    #[test]
    fn test_supported_formats_lists_txt() {
        let formats = supported_formats();
        assert_eq!(formats.get("txt"), Some(&true));
        assert_eq!(formats.get("pdf"), Some(&cfg!(feature = "pdf")));
        assert_eq!(formats.len(), 4);
    }

    #[test]
    fn test_corrupt_pdf_reported_not_fatal() {
        let files = vec![
            UploadedFile::new("broken.pdf", b"not a pdf".to_vec()),
            UploadedFile::new("ok.txt", b"still here".to_vec()),
        ];
        let (docs, errors) = process_files(&files);
        assert_eq!(docs, vec!["still here".to_string()]);
        assert_eq!(errors.len(), 1);
        if cfg!(feature = "pdf") {
            assert!(errors[0].starts_with("Error processing broken.pdf"));
        } else {
            assert!(errors[0].starts_with("Missing dependency for broken.pdf"));
        }
    }
}
