// Unit tests for file extraction.
//
// Uploaded files are built in memory; nothing touches the filesystem.

use doclust::extract::{extract_text, process_files, FileKind, UploadedFile, MAX_FILE_SIZE};

#[test]
fn txt_and_exe_yield_one_document_and_one_error() {
    let files = vec![
        UploadedFile::new("minutes.txt", b"Board approved the new budget".to_vec()),
        UploadedFile::new("installer.exe", vec![0x4d, 0x5a, 0x00, 0x01]),
    ];
    let (documents, errors) = process_files(&files);
    assert_eq!(documents, vec!["Board approved the new budget".to_string()]);
    assert_eq!(errors, vec!["File type not allowed: installer.exe".to_string()]);
}

#[test]
fn documents_keep_upload_order() {
    let files = vec![
        UploadedFile::new("b.txt", b"second upload".to_vec()),
        UploadedFile::new("bad.zip", b"PK".to_vec()),
        UploadedFile::new("a.txt", b"third upload".to_vec()),
    ];
    let (documents, errors) = process_files(&files);
    assert_eq!(documents, vec!["second upload", "third upload"]);
    assert_eq!(errors.len(), 1);
}

#[test]
fn latin1_text_file_is_decoded() {
    let (documents, errors) = process_files(&[UploadedFile::new("menu.txt", b"Caf\xe9 cr\xe8me".to_vec())]);
    assert!(errors.is_empty());
    assert_eq!(documents, vec!["Café crème".to_string()]);
}

#[test]
fn file_at_size_limit_is_accepted() {
    let bytes = vec![b'x'; MAX_FILE_SIZE];
    let (documents, errors) = process_files(&[UploadedFile::new("edge.txt", bytes)]);
    assert!(errors.is_empty());
    assert_eq!(documents[0].len(), MAX_FILE_SIZE);
}

#[test]
fn oversize_file_is_rejected() {
    let bytes = vec![b'x'; MAX_FILE_SIZE + 1];
    let (documents, errors) = process_files(&[UploadedFile::new("huge.txt", bytes)]);
    assert!(documents.is_empty());
    assert_eq!(errors, vec!["File too large: huge.txt (max 10MB)".to_string()]);
}

#[test]
fn extracted_text_is_trimmed() {
    let text = extract_text(b"\n\n  padded body \t\n", FileKind::Txt).unwrap();
    assert_eq!(text, "padded body");
}

#[cfg(feature = "office")]
mod office {
    use std::io::{Cursor, Write};

    use zip::write::SimpleFileOptions;

    use super::*;

    fn archive(name: &str, xml: &str) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer.start_file(name, SimpleFileOptions::default()).unwrap();
        writer.write_all(xml.as_bytes()).unwrap();
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn docx_upload_becomes_a_document() {
        let xml = "<w:document><w:body>\
            <w:p><w:r><w:t>Hiking</w:t></w:r><w:r><w:t xml:space=\"preserve\"> trails</w:t></w:r></w:p>\
            <w:p><w:r><w:t>Alpine lakes</w:t></w:r></w:p>\
            </w:body></w:document>";
        let files = vec![UploadedFile::new("trip.DOCX", archive("word/document.xml", xml))];
        let (documents, errors) = process_files(&files);
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(documents, vec!["Hiking trails\nAlpine lakes".to_string()]);
    }

    #[test]
    fn pptx_upload_has_slide_markers() {
        let xml = "<p:sld><a:p><a:r><a:t>Quarterly roadmap</a:t></a:r></a:p></p:sld>";
        let files = vec![UploadedFile::new("deck.pptx", archive("ppt/slides/slide1.xml", xml))];
        let (documents, _) = process_files(&files);
        assert_eq!(documents, vec!["--- Slide 1 ---\nQuarterly roadmap".to_string()]);
    }

    #[test]
    fn docx_without_text_reports_no_text() {
        let xml = "<w:document><w:body><w:p/></w:body></w:document>";
        let files = vec![UploadedFile::new("empty.docx", archive("word/document.xml", xml))];
        let (documents, errors) = process_files(&files);
        assert!(documents.is_empty());
        assert_eq!(errors, vec!["No text extracted from: empty.docx".to_string()]);
    }

    #[test]
    fn corrupt_docx_is_a_processing_error() {
        let files = vec![UploadedFile::new("broken.docx", b"not a zip".to_vec())];
        let (_, errors) = process_files(&files);
        assert!(errors[0].starts_with("Error processing broken.docx:"), "{errors:?}");
    }
}
