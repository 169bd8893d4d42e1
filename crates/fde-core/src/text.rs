use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::error::{AnalysisError, Result};

static URL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"https?://\S+").unwrap());
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static DOUBLE_QUOTES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("[\u{201C}\u{201D}\u{201E}\u{201F}\u{00AB}\u{00BB}]").unwrap());
static SINGLE_QUOTES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("[\u{2018}\u{2019}\u{201A}\u{201B}]").unwrap());
static ELLIPSIS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\.{3,}").unwrap());
static BANGS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"!{2,}").unwrap());
static QUESTIONS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\?{2,}").unwrap());
static PARAGRAPH_BREAK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n\s*\n").unwrap());
static SENTENCE_END: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[.!?]\s+").unwrap());

const PARAGRAPH_JOIN: &str = "\n\n";

/// A bounded slice of normalized input, the unit every analyzer works on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub index: usize,
    pub text: String,
}

/// Normalize raw text before segmentation.
///
/// URLs become `[URL]`, curly quotes become straight quotes, runs of `.`
/// shrink to `...` and runs of `!`/`?` to one mark. Whitespace runs collapse
/// to one space, except runs holding a blank line, which become `\n\n`.
pub fn preprocess(text: &str) -> String {
    let text = URL.replace_all(text, " [URL] ");
    let text = DOUBLE_QUOTES.replace_all(&text, "\"");
    let text = SINGLE_QUOTES.replace_all(&text, "'");
    let text = ELLIPSIS.replace_all(&text, "...");
    let text = BANGS.replace_all(&text, "!");
    let text = QUESTIONS.replace_all(&text, "?");
    let text = WHITESPACE.replace_all(&text, |caps: &Captures| {
        if caps[0].matches('\n').count() >= 2 {
            PARAGRAPH_JOIN
        } else {
            " "
        }
    });
    text.trim().to_string()
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Split text after sentence-ending punctuation followed by whitespace.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut last = 0;

    for m in SENTENCE_END.find_iter(text) {
        let sentence = text[last..m.start() + 1].trim(); // include the punctuation
        if !sentence.is_empty() {
            sentences.push(sentence);
        }
        last = m.end();
    }

    let remainder = text[last..].trim();
    if !remainder.is_empty() {
        sentences.push(remainder);
    }

    sentences
}

/// Hard-slice text into chunks of at most `max_len` characters.
fn hard_slice(text: &str, max_len: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars.chunks(max_len).map(|c| c.iter().collect()).collect()
}

/// Pack sentences of one over-long paragraph, pushing finished segments.
fn pack_sentences(paragraph: &str, max_len: usize, segments: &mut Vec<String>) -> String {
    let mut current = String::new();
    for sentence in split_sentences(paragraph) {
        let joined_len = if current.is_empty() {
            char_len(sentence)
        } else {
            char_len(&current) + 1 + char_len(sentence)
        };
        if joined_len > max_len {
            if !current.is_empty() {
                segments.push(std::mem::take(&mut current));
            }
            if char_len(sentence) > max_len {
                segments.extend(hard_slice(sentence, max_len));
            } else {
                current = sentence.to_string();
            }
        } else {
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(sentence);
        }
    }
    current
}

/// Segment normalized text into pieces of at most `max_len` characters.
///
/// Prefers the whole text, then paragraphs, then greedy packing with
/// sentence and finally hard character splits. Blank pieces are dropped and
/// indices are contiguous.
pub fn segment_text(text: &str, max_len: usize) -> Vec<Segment> {
    let max_len = max_len.max(1);

    let pieces: Vec<String> = if char_len(text) <= max_len {
        vec![text.to_string()]
    } else {
        let paragraphs: Vec<&str> = PARAGRAPH_BREAK.split(text).collect();
        if paragraphs.iter().all(|p| char_len(p) <= max_len) {
            paragraphs.iter().map(|p| p.to_string()).collect()
        } else {
            let mut segments = Vec::new();
            let mut current = String::new();
            for paragraph in paragraphs {
                // Joining adds the paragraph separator; count it so packed
                // segments never exceed the bound.
                let joined_len = if current.is_empty() {
                    char_len(paragraph)
                } else {
                    char_len(&current) + PARAGRAPH_JOIN.len() + char_len(paragraph)
                };
                if joined_len > max_len {
                    if !current.is_empty() {
                        segments.push(std::mem::take(&mut current));
                    }
                    if char_len(paragraph) > max_len {
                        current = pack_sentences(paragraph, max_len, &mut segments);
                    } else {
                        current = paragraph.to_string();
                    }
                } else {
                    if !current.is_empty() {
                        current.push_str(PARAGRAPH_JOIN);
                    }
                    current.push_str(paragraph);
                }
            }
            if !current.is_empty() {
                segments.push(current);
            }
            segments
        }
    };

    pieces
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .enumerate()
        .map(|(index, text)| Segment {
            index,
            text: text.to_string(),
        })
        .collect()
}

/// Normalize then segment, failing when nothing usable remains.
pub fn prepare_segments(raw: &str, max_len: usize) -> Result<Vec<Segment>> {
    let normalized = preprocess(raw);
    let segments = segment_text(&normalized, max_len);
    if segments.is_empty() {
        return Err(AnalysisError::EmptyInput);
    }
    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_preprocess_whitespace_and_urls() {
        let out = preprocess("  hello \t  world see https://example.com/x?y=1 now  ");
        assert_eq!(out, "hello world see [URL] now");
    }

    #[test]
    fn test_preprocess_quotes_and_punctuation() {
        let out = preprocess("\u{201C}No\u{201D} she said\u{2019}s... what?? wow!!!! ok.....");
        assert_eq!(out, "\"No\" she said's... what? wow! ok...");
    }

    #[test]
    fn test_preprocess_keeps_paragraph_breaks() {
        let out = preprocess("first line\nstill first\n\n  \n second para");
        assert_eq!(out, "first line still first\n\nsecond para");
    }

    #[test]
    fn test_preprocess_empty() {
        assert_eq!(preprocess("   \n\t "), "");
    }

    #[test]
    fn test_split_sentences() {
        let s = split_sentences("First. Second! Third? Fourth");
        assert_eq!(s, vec!["First.", "Second!", "Third?", "Fourth"]);
    }

    #[test]
    fn test_short_text_single_segment() {
        let segs = segment_text("A short text.", 100);
        assert_eq!(segs.len(), 1);
        assert_eq!(segs[0].index, 0);
        assert_eq!(segs[0].text, "A short text.");
    }

    #[test]
    fn test_paragraphs_become_segments() {
        let text = "Para one is here.\n\nPara two is here.\n\nPara three.";
        let segs = segment_text(text, 20);
        let texts: Vec<_> = segs.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["Para one is here.", "Para two is here.", "Para three."]);
    }

    #[test]
    fn test_long_paragraph_split_at_sentences() {
        let text = "Alpha beta gamma. Delta epsilon zeta. Eta theta iota.\n\nShort.";
        let segs = segment_text(text, 20);
        for s in &segs {
            assert!(s.text.chars().count() <= 20, "too long: {:?}", s.text);
        }
        assert_eq!(segs[0].text, "Alpha beta gamma.");
        assert_eq!(segs.last().unwrap().text, "Short.");
    }

    #[test]
    fn test_atomic_sentence_hard_sliced() {
        let text = "x".repeat(25);
        let segs = segment_text(&text, 10);
        let lens: Vec<_> = segs.iter().map(|s| s.text.len()).collect();
        assert_eq!(lens, vec![10, 10, 5]);
    }

    #[test]
    fn test_indices_contiguous() {
        let text = "One one one.\n\n   \n\nTwo two two.\n\nThree three.";
        let segs = segment_text(&preprocess(text), 14);
        for (i, s) in segs.iter().enumerate() {
            assert_eq!(s.index, i);
        }
    }

    #[test]
    fn test_prepare_segments_empty_input() {
        assert_eq!(prepare_segments("  \n ", 100), Err(AnalysisError::EmptyInput));
    }

    fn strip_ws(s: &str) -> String {
        s.chars().filter(|c| !c.is_whitespace()).collect()
    }

    proptest! {
        #[test]
        fn prop_segments_bounded_and_ordered(
            words in proptest::collection::vec("[a-z]{1,12}[.!?]?", 1..80),
            breaks in proptest::collection::vec(0usize..6, 1..80),
            max_len in 5usize..120,
        ) {
            let mut raw = String::new();
            for (i, w) in words.iter().enumerate() {
                raw.push_str(w);
                raw.push_str(if breaks[i % breaks.len()] == 0 { "\n\n" } else { " " });
            }
            let normalized = preprocess(&raw);
            let segs = segment_text(&normalized, max_len);
            for s in &segs {
                prop_assert!(s.text.chars().count() <= max_len);
            }
            let joined: String = segs.iter().map(|s| s.text.as_str()).collect();
            prop_assert_eq!(strip_ws(&joined), strip_ws(&normalized));
        }
    }
}
