// DOCX and PPTX extraction.
//
// Both formats are zip archives of XML parts. DOCX text lives in
// `word/document.xml` as `<w:t>` runs inside `<w:p>` paragraphs (table
// cells included); PPTX text lives in `ppt/slides/slideN.xml` as `<a:t>`
// runs inside `<a:p>` paragraphs.

use std::sync::LazyLock;

use regex_lite::{Captures, Regex};

use super::ExtractError;

static ENTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(#x[0-9a-fA-F]+|#[0-9]+|amp|lt|gt|quot|apos);").expect("valid regex")
});

/// Decode the XML entities that can appear in text runs.
pub fn unescape_xml(text: &str) -> String {
    ENTITY
        .replace_all(text, |caps: &Captures<'_>| {
            let entity = &caps[1];
            let decoded = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                _ => {
                    let code = match entity.strip_prefix("#x") {
                        Some(hex) => u32::from_str_radix(hex, 16).ok(),
                        None => entity[1..].parse::<u32>().ok(),
                    };
                    code.and_then(char::from_u32)
                }
            };
            decoded.map_or_else(|| caps[0].to_string(), String::from)
        })
        .into_owned()
}

/// Text of each non-empty paragraph in an XML part, given the paragraph
/// and text-run patterns of its dialect.
#[cfg_attr(not(feature = "office"), allow(dead_code))]
fn paragraphs(xml: &str, paragraph: &Regex, run: &Regex) -> Vec<String> {
    paragraph
        .find_iter(xml)
        .map(|p| {
            run.captures_iter(p.as_str())
                .map(|c| unescape_xml(&c[1]))
                .collect::<String>()
        })
        .filter(|text| !text.trim().is_empty())
        .collect()
}

#[cfg(feature = "office")]
mod archive {
    use std::io::{Cursor, Read};
    use std::sync::LazyLock;

    use regex_lite::Regex;

    use super::{paragraphs, ExtractError};

    static W_PARAGRAPH: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?s)<w:p[\s>].*?</w:p>").expect("valid regex"));
    static W_RUN: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?s)<w:t(?:\s[^>]*)?>(.*?)</w:t>").expect("valid regex"));
    static A_PARAGRAPH: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?s)<a:p[\s>].*?</a:p>").expect("valid regex"));
    static A_RUN: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?s)<a:t(?:\s[^>]*)?>(.*?)</a:t>").expect("valid regex"));
    static SLIDE_NAME: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"^ppt/slides/slide([0-9]+)\.xml$").expect("valid regex"));

    type Archive<'a> = zip::ZipArchive<Cursor<&'a [u8]>>;

    fn open<'a>(bytes: &'a [u8], format: &str) -> Result<Archive<'a>, ExtractError> {
        zip::ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| ExtractError::Decode(format!("Error reading {format}: {e}")))
    }

    fn read_part(archive: &mut Archive<'_>, name: &str, format: &str) -> Result<String, ExtractError> {
        let mut part = archive
            .by_name(name)
            .map_err(|e| ExtractError::Decode(format!("Error reading {format}: {name}: {e}")))?;
        let mut xml = String::new();
        part.read_to_string(&mut xml)
            .map_err(|e| ExtractError::Decode(format!("Error reading {format}: {name}: {e}")))?;
        Ok(xml)
    }

    pub fn extract_docx(bytes: &[u8]) -> Result<String, ExtractError> {
        let mut archive = open(bytes, "DOCX")?;
        let xml = read_part(&mut archive, "word/document.xml", "DOCX")?;
        Ok(paragraphs(&xml, &W_PARAGRAPH, &W_RUN).join("\n"))
    }

    pub fn extract_pptx(bytes: &[u8]) -> Result<String, ExtractError> {
        let mut archive = open(bytes, "PPTX")?;

        let mut slides: Vec<(u32, String)> = archive
            .file_names()
            .filter_map(|name| {
                let number = SLIDE_NAME.captures(name)?.get(1)?.as_str().parse().ok()?;
                Some((number, name.to_string()))
            })
            .collect();
        slides.sort_by_key(|(number, _)| *number);

        let mut text = String::new();
        for (position, (_, name)) in slides.iter().enumerate() {
            let xml = read_part(&mut archive, name, "PPTX")?;
            text.push_str(&format!("--- Slide {} ---\n", position + 1));
            for line in paragraphs(&xml, &A_PARAGRAPH, &A_RUN) {
                text.push_str(&line);
                text.push('\n');
            }
        }

        Ok(text)
    }
}

#[cfg(feature = "office")]
pub use archive::{extract_docx, extract_pptx};

#[cfg(not(feature = "office"))]
pub fn extract_docx(_bytes: &[u8]) -> Result<String, ExtractError> {
    Err(ExtractError::MissingDecoder("DOCX", "office"))
}

#[cfg(not(feature = "office"))]
pub fn extract_pptx(_bytes: &[u8]) -> Result<String, ExtractError> {
    Err(ExtractError::MissingDecoder("PPTX", "office"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unescape_named_and_numeric() {
        assert_eq!(unescape_xml("R&amp;D &lt;3 &#65;&#x42;"), "R&D <3 AB");
    }

    #[test]
    fn test_unescape_leaves_unknown_entities() {
        assert_eq!(unescape_xml("&nbsp; &#xZZ;"), "&nbsp; &#xZZ;");
    }

    #[test]
    fn test_paragraphs_skip_empty_and_join_runs() {
        let paragraph = Regex::new(r"(?s)<w:p[\s>].*?</w:p>").unwrap();
        let run = Regex::new(r"(?s)<w:t(?:\s[^>]*)?>(.*?)</w:t>").unwrap();
        let xml = r#"<w:body><w:p><w:pPr/><w:r><w:t>Hello </w:t></w:r><w:r><w:t xml:space="preserve">world</w:t></w:r></w:p><w:p><w:r><w:tab/></w:r></w:p><w:p w:rsidR="1"><w:r><w:t>Second</w:t></w:r></w:p></w:body>"#;
        assert_eq!(paragraphs(xml, &paragraph, &run), vec!["Hello world", "Second"]);
    }

    #[cfg(feature = "office")]
    mod archives {
        use std::io::{Cursor, Write};

        use zip::write::SimpleFileOptions;

        use super::super::*;

        fn zip_of(parts: &[(&str, &str)]) -> Vec<u8> {
            let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
            for (name, body) in parts {
                writer.start_file(*name, SimpleFileOptions::default()).unwrap();
                writer.write_all(body.as_bytes()).unwrap();
            }
            writer.finish().unwrap().into_inner()
        }

        #[test]
        fn test_docx_paragraphs_and_tables() {
            let xml = "<w:document><w:body>\
                <w:p><w:r><w:t>Budget review</w:t></w:r></w:p>\
                <w:tbl><w:tr><w:tc><w:p><w:r><w:t>Q1 &amp; Q2</w:t></w:r></w:p></w:tc></w:tr></w:tbl>\
                </w:body></w:document>";
            let bytes = zip_of(&[("word/document.xml", xml)]);
            assert_eq!(extract_docx(&bytes).unwrap(), "Budget review\nQ1 & Q2");
        }

        #[test]
        fn test_docx_without_document_part_fails() {
            let bytes = zip_of(&[("word/styles.xml", "<w:styles/>")]);
            assert!(matches!(extract_docx(&bytes), Err(ExtractError::Decode(_))));
        }

        #[test]
        fn test_pptx_slides_in_numeric_order() {
            let slide = |text: &str| format!("<p:sld><a:p><a:r><a:t>{text}</a:t></a:r></a:p></p:sld>");
            let s1 = slide("Intro");
            let s2 = slide("Roadmap");
            let s10 = slide("Questions");
            let bytes = zip_of(&[
                ("ppt/slides/slide10.xml", s10.as_str()),
                ("ppt/slides/slide2.xml", s2.as_str()),
                ("ppt/slides/slide1.xml", s1.as_str()),
                ("ppt/slides/_rels/slide1.xml.rels", "<Relationships/>"),
            ]);
            assert_eq!(
                extract_pptx(&bytes).unwrap(),
                "--- Slide 1 ---\nIntro\n--- Slide 2 ---\nRoadmap\n--- Slide 3 ---\nQuestions\n"
            );
        }

        #[test]
        fn test_not_a_zip() {
            assert!(matches!(extract_pptx(b"plain"), Err(ExtractError::Decode(_))));
        }
    }
}
