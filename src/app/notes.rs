use std::sync::LazyLock;

use anyhow::{Result, bail};
use regex::Regex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Attachment {
    pub(crate) title: String,
    pub(crate) url: String,
}

pub(crate) fn validate_note_content(content: &str) -> Result<&str> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        bail!("note cannot be empty");
    }
    Ok(trimmed)
}

/// Appends a markdown link on its own paragraph, marked with a paperclip.
pub(crate) fn append_attachment(content: &str, title: &str, url: &str) -> Result<String> {
    let title = title.trim();
    let url = url.trim();
    if title.is_empty() || url.is_empty() {
        bail!("attachment needs both a title and a URL");
    }
    Ok(format!("{content}\n\n📎 [{title}]({url})"))
}

/// Markdown link: a bracketed title without nested brackets, then a URL
/// without whitespace or parentheses.
static LINK_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[([^\[\]]+)\]\(([^\s()]+)\)").expect("link pattern is valid")
});

/// Every `[title](url)` link in the note, in order of appearance.
pub(crate) fn extract_attachments(content: &str) -> Vec<Attachment> {
    LINK_PATTERN
        .captures_iter(content)
        .filter_map(|caps| {
            let title = caps.get(1)?.as_str().trim();
            let url = caps.get(2)?.as_str();
            (!title.is_empty()).then(|| Attachment {
                title: title.to_string(),
                url: url.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_note_is_rejected() {
        assert!(validate_note_content("  \n ").is_err());
        assert_eq!(validate_note_content(" recap ").expect("valid"), "recap");
    }

    #[test]
    fn attachment_is_appended_as_markdown_link() {
        let content = append_attachment("Lecture notes", "Slides", "https://drive.test/s")
            .expect("attachment should append");
        assert_eq!(content, "Lecture notes\n\n📎 [Slides](https://drive.test/s)");
        assert!(append_attachment("x", "", "https://drive.test").is_err());
    }

    #[test]
    fn extracts_links_in_order() {
        let content = "see [Slides](https://a.test/1) and\n📎 [PDF](https://b.test/2.pdf)";
        assert_eq!(
            extract_attachments(content),
            vec![
                Attachment {
                    title: "Slides".to_string(),
                    url: "https://a.test/1".to_string()
                },
                Attachment {
                    title: "PDF".to_string(),
                    url: "https://b.test/2.pdf".to_string()
                },
            ]
        );
    }

    #[test]
    fn ignores_brackets_without_links() {
        assert!(extract_attachments("array[0] and [todo] (later)").is_empty());
        assert_eq!(
            extract_attachments("[x [Doc](https://d.test)").len(),
            1,
            "nested opening bracket should resync on the inner link"
        );
    }

    #[test]
    fn unclosed_link_does_not_hide_later_attachment() {
        let content = "see [draft](not closed and later 📎 [Slides](https://a.test/s)";
        assert_eq!(
            extract_attachments(content),
            vec![Attachment {
                title: "Slides".to_string(),
                url: "https://a.test/s".to_string()
            }]
        );
    }

    #[test]
    fn blank_titles_are_skipped() {
        assert!(extract_attachments("[   ](https://a.test/blank)").is_empty());
    }
}
