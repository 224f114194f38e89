// Plain text decoding: UTF-8, falling back to Latin-1.

/// Decode bytes as UTF-8 (BOM stripped), or as Latin-1 when they aren't
/// valid UTF-8. Latin-1 maps every byte to a char, so this never fails.
pub fn decode_text(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.strip_prefix('\u{feff}').unwrap_or(text).to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utf8() {
        assert_eq!(decode_text("naïve café".as_bytes()), "naïve café");
    }

    #[test]
    fn test_bom_stripped() {
        assert_eq!(decode_text(b"\xEF\xBB\xBFhello"), "hello");
    }

    #[test]
    fn test_latin1_fallback() {
        // "café" in Latin-1: é is a lone 0xE9, invalid as UTF-8
        assert_eq!(decode_text(b"caf\xE9"), "café");
    }
}
