//! Part-of-speech tagging boundary.
//!
//! The layout core only ever sees tokens of one grammatical class. `PosTagger`
//! hides the segmenter so tests can substitute a fixed tagger.

use jieba_rs::Jieba;
use serde::{Deserialize, Serialize};

/// Default grammatical class kept for the cloud: adjectives.
pub const ADJECTIVE: &str = "a";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggedToken {
    pub token: String,
    pub class: String,
}

pub trait PosTagger: Send + Sync {
    fn tag(&self, text: &str) -> Vec<TaggedToken>;
}

/// Chinese segmentation + tagging with the bundled jieba dictionary.
pub struct JiebaTagger {
    jieba: Jieba,
}

impl JiebaTagger {
    /// Loads the default dictionary. Expensive; build once at startup.
    pub fn new() -> Self {
        Self {
            jieba: Jieba::new(),
        }
    }
}

impl Default for JiebaTagger {
    fn default() -> Self {
        Self::new()
    }
}

impl PosTagger for JiebaTagger {
    fn tag(&self, text: &str) -> Vec<TaggedToken> {
        self.jieba
            .tag(text, true)
            .into_iter()
            .map(|t| TaggedToken {
                token: t.word.to_string(),
                class: t.tag.to_string(),
            })
            .collect()
    }
}

/// Keeps tokens tagged exactly `class`, trimmed, dropping blanks.
pub fn select_tokens(tagged: &[TaggedToken], class: &str) -> Vec<String> {
    tagged
        .iter()
        .filter(|t| t.class == class)
        .map(|t| t.token.trim())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tok(token: &str, class: &str) -> TaggedToken {
        TaggedToken {
            token: token.to_string(),
            class: class.to_string(),
        }
    }

    #[test]
    fn test_select_tokens_keeps_only_class() {
        let tagged = vec![
            tok("天气", "n"),
            tok("很", "d"),
            tok("好", "a"),
            tok("美丽", "a"),
            tok("好", "a"),
            tok("跑", "v"),
        ];
        assert_eq!(select_tokens(&tagged, ADJECTIVE), vec!["好", "美丽", "好"]);
    }

    #[test]
    fn test_select_tokens_exact_class_match() {
        // "ad" (adverbial adjective) is a different class from "a".
        let tagged = vec![tok("认真", "ad"), tok("新", "a")];
        assert_eq!(select_tokens(&tagged, "a"), vec!["新"]);
        assert_eq!(select_tokens(&tagged, "ad"), vec!["认真"]);
    }

    #[test]
    fn test_select_tokens_drops_blank() {
        let tagged = vec![tok(" ", "a"), tok(" 大 ", "a")];
        assert_eq!(select_tokens(&tagged, "a"), vec!["大"]);
    }

    #[test]
    fn test_jieba_tags_cover_whole_text() {
        let tagger = JiebaTagger::new();
        let tagged = tagger.tag("今天的天气非常美丽");
        assert!(tagged.len() > 1);
        let joined: String = tagged.iter().map(|t| t.token.as_str()).collect();
        assert_eq!(joined, "今天的天气非常美丽");
        assert!(tagged.iter().all(|t| !t.class.is_empty()));
    }
}
