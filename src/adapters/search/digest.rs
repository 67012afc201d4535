//! Source digest handed to the section writer: one block per unique URL.

use std::collections::HashSet;

/// One search result, provider independent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    /// Snippet or summary chosen by the provider.
    pub content: String,
    pub raw_content: Option<String>,
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}... [truncated]", &text[..idx]),
        None => text.to_string(),
    }
}

/// Deduplicate hits by URL (first wins) and format them as one text block.
pub fn format_sources(hits: &[SearchHit], max_chars_per_source: usize) -> String {
    let mut seen = HashSet::new();
    let mut out = String::from("Content from sources:\n");
    let mut count = 0;
    for hit in hits {
        if hit.url.is_empty() || !seen.insert(hit.url.as_str()) {
            continue;
        }
        count += 1;
        out.push_str(&format!("{}\n", "=".repeat(80)));
        out.push_str(&format!("Source: {}\n", hit.title));
        out.push_str(&format!("{}\n", "=".repeat(80)));
        out.push_str(&format!("URL: {}\n===\n", hit.url));
        out.push_str(&format!(
            "Most relevant content from source: {}\n===\n",
            hit.content.trim()
        ));
        if let Some(raw) = hit.raw_content.as_deref().filter(|r| !r.trim().is_empty()) {
            out.push_str(&format!(
                "Full source content limited to {} characters: {}\n",
                max_chars_per_source,
                truncate_chars(raw.trim(), max_chars_per_source)
            ));
        }
        out.push('\n');
    }
    if count == 0 {
        return "No results.".to_string();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(url: &str, raw: Option<&str>) -> SearchHit {
        SearchHit {
            title: format!("Title {url}"),
            url: url.to_string(),
            content: "snippet".to_string(),
            raw_content: raw.map(str::to_string),
        }
    }

    #[test]
    fn test_dedupes_by_url() {
        let text = format_sources(
            &[hit("https://a", None), hit("https://b", None), hit("https://a", None)],
            100,
        );
        assert_eq!(text.matches("URL: https://a").count(), 1);
        assert_eq!(text.matches("URL: https://b").count(), 1);
    }

    #[test]
    fn test_truncates_raw_content_on_char_boundary() {
        let text = format_sources(&[hit("https://a", Some("αβγδε"))], 3);
        assert!(text.contains("limited to 3 characters: αβγ... [truncated]"));
    }

    #[test]
    fn test_empty_results() {
        assert_eq!(format_sources(&[], 10), "No results.");
    }
}
