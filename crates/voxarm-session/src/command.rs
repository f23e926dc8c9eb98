use regex::Regex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VocabularyError {
    #[error("command vocabulary is empty")]
    Empty,
    #[error("command token is empty or whitespace")]
    BlankToken,
    #[error("failed to compile matcher for '{token}': {source}")]
    Pattern {
        token: String,
        #[source]
        source: regex::Error,
    },
}

/// The fixed set of spoken commands, each matched as a whole word so that
/// "update" never triggers "up" and "back" still matches inside
/// "go back now".
pub struct CommandVocabulary {
    entries: Vec<(String, Regex)>,
}

/// The command set the arm understands out of the box.
pub const DEFAULT_COMMANDS: &[&str] = &[
    "up", "down", "left", "right", "forward", "back", "open", "close",
];

impl CommandVocabulary {
    pub fn new<I, S>(tokens: I) -> Result<Self, VocabularyError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut entries = Vec::new();
        for token in tokens {
            let token = token.as_ref().trim().to_lowercase();
            if token.is_empty() {
                return Err(VocabularyError::BlankToken);
            }
            let pattern = format!(r"\b{}\b", regex::escape(&token));
            let re = Regex::new(&pattern).map_err(|source| VocabularyError::Pattern {
                token: token.clone(),
                source,
            })?;
            entries.push((token, re));
        }
        if entries.is_empty() {
            return Err(VocabularyError::Empty);
        }
        Ok(Self { entries })
    }

    pub fn default_set() -> Self {
        Self::new(DEFAULT_COMMANDS).expect("built-in command tokens compile")
    }

    /// First vocabulary token found as a whole word in the transcript, in
    /// vocabulary order. Matching is case-insensitive.
    pub fn match_transcript(&self, transcript: &str) -> Option<&str> {
        let transcript = transcript.to_lowercase();
        if transcript.trim().is_empty() {
            return None;
        }
        self.entries
            .iter()
            .find(|(_, re)| re.is_match(&transcript))
            .map(|(token, _)| token.as_str())
    }

    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(token, _)| token.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_whole_words_only() {
        let vocab = CommandVocabulary::default_set();
        assert_eq!(vocab.match_transcript("move up please"), Some("up"));
        assert_eq!(vocab.match_transcript("update the firmware"), None);
        assert_eq!(vocab.match_transcript("cupboard"), None);
    }

    #[test]
    fn matching_is_case_insensitive() {
        let vocab = CommandVocabulary::default_set();
        assert_eq!(vocab.match_transcript("OPEN"), Some("open"));
        assert_eq!(vocab.match_transcript("Go Forward"), Some("forward"));
    }

    #[test]
    fn first_vocabulary_token_wins() {
        let vocab = CommandVocabulary::default_set();
        // transcript contains both; vocabulary order decides
        assert_eq!(vocab.match_transcript("down then up"), Some("up"));
    }

    #[test]
    fn empty_transcript_matches_nothing() {
        let vocab = CommandVocabulary::default_set();
        assert_eq!(vocab.match_transcript(""), None);
        assert_eq!(vocab.match_transcript("   "), None);
    }

    #[test]
    fn rejects_blank_tokens() {
        assert!(matches!(
            CommandVocabulary::new(["up", "  "]),
            Err(VocabularyError::BlankToken)
        ));
        assert!(matches!(
            CommandVocabulary::new(Vec::<&str>::new()),
            Err(VocabularyError::Empty)
        ));
    }

    #[test]
    fn tokens_are_normalized_on_construction() {
        let vocab = CommandVocabulary::new(["  Grip  ", "RELEASE"]).unwrap();
        let tokens: Vec<_> = vocab.tokens().collect();
        assert_eq!(tokens, ["grip", "release"]);
        assert_eq!(vocab.match_transcript("grip it"), Some("grip"));
    }
}
