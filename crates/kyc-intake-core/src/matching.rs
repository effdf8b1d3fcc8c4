//! Filename relevance and exclusion filtering.
//!
//! A file is relevant to a client when its name contains the client's
//! name or identifier as a case-insensitive substring. Matching is plain
//! substring containment, not tokenized: `"jane doe"` matches
//! `"JANE DOE passport.pdf"` but not `"jane_doe_passport.pdf"`, while the
//! identifier `"123"` matches anywhere those three digits appear.
//!
//! Exclusion always wins. A file whose name contains any exclusion word
//! (again as a raw substring, so `"of"` excludes `"proof.pdf"`) is
//! rejected even when it is relevant.

use serde::Serialize;

use crate::folder_name::ClientIdentity;

/// Default exclusion vocabulary.
pub const DEFAULT_EXCLUSION_WORDS: [&str; 5] = ["ack", "of", "debt", "aod", "pensions"];

/// Lowercased search patterns for one client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchPatterns {
    pub name: String,
    pub identifier: String,
}

impl SearchPatterns {
    pub fn new(name: &str, identifier: &str) -> Self {
        Self {
            name: name.to_lowercase(),
            identifier: identifier.to_lowercase(),
        }
    }

    fn found_in(&self, haystack: &str) -> bool {
        haystack.contains(&self.name) || haystack.contains(&self.identifier)
    }
}

impl From<&ClientIdentity> for SearchPatterns {
    fn from(identity: &ClientIdentity) -> Self {
        Self::new(&identity.name, &identity.identifier)
    }
}

/// Set of lowercased substrings that disqualify a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExclusionVocabulary {
    words: Vec<String>,
}

impl ExclusionVocabulary {
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut unique: Vec<String> = Vec::new();
        for word in words {
            let word = word.as_ref().trim().to_lowercase();
            if !word.is_empty() && !unique.contains(&word) {
                unique.push(word);
            }
        }
        Self { words: unique }
    }

    /// A vocabulary that excludes nothing.
    pub fn empty() -> Self {
        Self { words: Vec::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    /// First exclusion word found in the (already lowercased) name.
    pub fn find_in(&self, lowered: &str) -> Option<&str> {
        self.words
            .iter()
            .find(|w| lowered.contains(w.as_str()))
            .map(String::as_str)
    }
}

impl Default for ExclusionVocabulary {
    fn default() -> Self {
        Self::new(DEFAULT_EXCLUSION_WORDS)
    }
}

/// A source file name prepared for matching.
///
/// Lowercasing happens once here so the same candidate can be probed
/// against many clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateName {
    file: String,
    parent: Option<String>,
}

impl CandidateName {
    pub fn new(file_name: &str, parent_dir: Option<&str>) -> Self {
        Self {
            file: file_name.to_lowercase(),
            parent: parent_dir.map(str::to_lowercase),
        }
    }
}

/// Why a candidate was or was not accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome {
    Irrelevant,
    Excluded(String),
    Eligible,
}

/// Relevance + exclusion filter.
#[derive(Debug, Clone)]
pub struct MatchFilter {
    vocabulary: ExclusionVocabulary,
    match_parent_dir: bool,
}

impl MatchFilter {
    pub fn new(vocabulary: ExclusionVocabulary) -> Self {
        Self {
            vocabulary,
            match_parent_dir: false,
        }
    }

    /// Also treat a file as relevant when its containing directory's name
    /// contains one of the client's patterns. Exclusion still applies to
    /// the file name.
    pub fn with_parent_dir_matching(mut self, enabled: bool) -> Self {
        self.match_parent_dir = enabled;
        self
    }

    pub fn vocabulary(&self) -> &ExclusionVocabulary {
        &self.vocabulary
    }

    pub fn evaluate(&self, patterns: &SearchPatterns, candidate: &CandidateName) -> MatchOutcome {
        let relevant = patterns.found_in(&candidate.file)
            || (self.match_parent_dir
                && candidate
                    .parent
                    .as_deref()
                    .is_some_and(|p| patterns.found_in(p)));
        if !relevant {
            return MatchOutcome::Irrelevant;
        }
        match self.vocabulary.find_in(&candidate.file) {
            Some(word) => MatchOutcome::Excluded(word.to_string()),
            None => MatchOutcome::Eligible,
        }
    }

    /// Convenience wrapper over [`evaluate`](Self::evaluate) for a bare file name.
    pub fn is_eligible(&self, patterns: &SearchPatterns, file_name: &str) -> bool {
        self.evaluate(patterns, &CandidateName::new(file_name, None)) == MatchOutcome::Eligible
    }
}

impl Default for MatchFilter {
    fn default() -> Self {
        Self::new(ExclusionVocabulary::default())
    }
}
