//! Thin text-scraping wrapper over downloaded document bytes.

use super::{DocError, RemoteFile};

/// Minimum usable resume length; shorter extractions are treated as empty.
pub const MIN_TEXT_LEN: usize = 50;

/// Extracts plain text from a downloaded file based on its name/format.
/// PDF goes through `pdf-extract`; everything else (exported native docs,
/// plain text uploads) is decoded as UTF-8.
pub fn extract_text(file: &RemoteFile, content: &[u8]) -> Result<String, DocError> {
    let lower = file.name.to_lowercase();
    let raw = if lower.ends_with(".pdf") {
        pdf_extract::extract_text_from_mem(content).map_err(|e| DocError::Extraction {
            name: file.name.clone(),
            reason: e.to_string(),
        })?
    } else {
        String::from_utf8_lossy(content).into_owned()
    };
    Ok(collapse_whitespace(&raw))
}

/// Collapses runs of whitespace into single spaces and trims. Keeps the
/// combined LLM prompt compact and makes length checks meaningful.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(
            collapse_whitespace("  a\n\n b\t\tc  "),
            "a b c"
        );
        assert_eq!(collapse_whitespace(""), "");
    }

    #[test]
    fn test_plain_text_extraction() {
        let file = RemoteFile {
            name: "resume.txt".to_string(),
            ..Default::default()
        };
        let text = extract_text(&file, b"hello   world").unwrap();
        assert_eq!(text, "hello world");
    }
}
