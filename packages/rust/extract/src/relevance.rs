//! Keyword relevance filter shared by every extractor.

/// Lower-cased relevance vocabulary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordSet {
    terms: Vec<String>,
}

impl KeywordSet {
    pub fn new<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut lowered: Vec<String> = terms
            .into_iter()
            .map(|t| t.as_ref().trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();
        lowered.dedup();
        Self { terms: lowered }
    }

    /// Build the active filter for a configured term list.
    ///
    /// `None` and an empty list both mean filtering is disabled.
    pub fn from_terms(terms: Option<&[String]>) -> Option<Self> {
        let set = Self::new(terms?);
        if set.is_empty() { None } else { Some(set) }
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Case-insensitive substring match against any term.
    pub fn matches(&self, text: &str) -> bool {
        let haystack = text.to_lowercase();
        self.terms.iter().any(|t| haystack.contains(t.as_str()))
    }
}

/// Whether `text` is admitted: long enough, and relevant when a filter is active.
pub fn admits(text: &str, min_chars: usize, keywords: Option<&KeywordSet>) -> bool {
    text.chars().count() > min_chars && keywords.is_none_or(|k| k.matches(text))
}
