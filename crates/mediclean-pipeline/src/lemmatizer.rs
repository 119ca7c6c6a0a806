//! English lemmatization
//!
//! The default model is a dictionary of irregular forms backed by suffix
//! rules for regular plurals and verb inflections. Input tokens are expected
//! to be lowercase ASCII, which is what the note cleaner produces.

use std::borrow::Cow;
use std::collections::{HashMap, HashSet};

/// Maps a token to its dictionary base form
pub trait Lemmatizer: Send + Sync {
    /// Base form of a single token
    fn lemma<'a>(&self, token: &'a str) -> Cow<'a, str>;

    /// Lemmatize every whitespace-separated token, rejoined with single spaces
    fn lemmatize_text(&self, text: &str) -> String {
        text.split_whitespace()
            .map(|token| self.lemma(token))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Model name, for logging
    fn name(&self) -> &str;
}

/// Irregular inflections and forms the suffix rules get wrong
const EXCEPTIONS: &[(&str, &str)] = &[
    ("am", "be"),
    ("is", "be"),
    ("are", "be"),
    ("was", "be"),
    ("were", "be"),
    ("been", "be"),
    ("being", "be"),
    ("has", "have"),
    ("had", "have"),
    ("having", "have"),
    ("does", "do"),
    ("did", "do"),
    ("done", "do"),
    ("doing", "do"),
    ("goes", "go"),
    ("went", "go"),
    ("gone", "go"),
    ("going", "go"),
    ("got", "get"),
    ("gotten", "get"),
    ("took", "take"),
    ("taken", "take"),
    ("gave", "give"),
    ("given", "give"),
    ("saw", "see"),
    ("seen", "see"),
    ("came", "come"),
    ("felt", "feel"),
    ("said", "say"),
    ("told", "tell"),
    ("made", "make"),
    ("found", "find"),
    ("knew", "know"),
    ("known", "know"),
    ("thought", "think"),
    ("became", "become"),
    ("began", "begin"),
    ("begun", "begin"),
    ("broke", "break"),
    ("broken", "break"),
    ("brought", "bring"),
    ("bought", "buy"),
    ("ate", "eat"),
    ("eaten", "eat"),
    ("fell", "fall"),
    ("fallen", "fall"),
    ("forgot", "forget"),
    ("forgotten", "forget"),
    ("kept", "keep"),
    ("lost", "lose"),
    ("ran", "run"),
    ("slept", "sleep"),
    ("spoke", "speak"),
    ("spoken", "speak"),
    ("stood", "stand"),
    ("swollen", "swell"),
    ("wrote", "write"),
    ("written", "write"),
    ("bled", "bleed"),
    ("children", "child"),
    ("men", "man"),
    ("women", "woman"),
    ("feet", "foot"),
    ("teeth", "tooth"),
    ("mice", "mouse"),
    ("used", "use"),
    ("using", "use"),
    ("died", "die"),
    ("dying", "die"),
    ("lying", "lie"),
    ("focused", "focus"),
    ("focusing", "focus"),
    ("cured", "cure"),
    ("injured", "injure"),
];

/// Words whose endings look inflected but are base forms
const PROTECTED: &[&str] = &[
    "always", "perhaps", "diabetes", "series", "species", "news", "measles", "mumps", "herpes",
    "rabies", "scabies", "yes", "this", "his", "its", "was", "during", "thing", "something",
    "nothing", "anything", "everything", "morning", "evening", "ring", "king", "sing", "bring",
    "spring", "string", "ceiling", "bed", "red", "need", "feed", "speed", "seed", "shed",
    "bleed", "hundred", "sacred", "naked", "wicked",
];

/// Dictionary-plus-rules English lemmatizer
#[derive(Debug, Clone)]
pub struct RuleLemmatizer {
    exceptions: HashMap<&'static str, &'static str>,
    protected: HashSet<&'static str>,
}

impl RuleLemmatizer {
    /// Create a lemmatizer with the built-in English tables
    pub fn new() -> Self {
        Self {
            exceptions: EXCEPTIONS.iter().copied().collect(),
            protected: PROTECTED.iter().copied().collect(),
        }
    }

    fn plural(&self, token: &str) -> Option<String> {
        if let Some(stem) = token.strip_suffix("ies") {
            if token.len() > 4 {
                return Some(format!("{}y", stem));
            }
        }
        if token.ends_with("sses")
            || token.ends_with("xes")
            || token.ends_with("ches") && !token.ends_with("aches")
            || token.ends_with("shes")
        {
            return Some(token[..token.len() - 2].to_string());
        }
        if token.ends_with('s')
            && !["ss", "us", "is", "ous"].iter().any(|s| token.ends_with(s))
        {
            return Some(token[..token.len() - 1].to_string());
        }
        None
    }

    fn verb(&self, token: &str) -> Option<String> {
        if let Some(stem) = token.strip_suffix("ied") {
            if token.len() > 4 {
                return Some(format!("{}y", stem));
            }
        }

        let stem = token
            .strip_suffix("ing")
            .or_else(|| token.strip_suffix("ed"))?;
        if stem.len() < 3 || !stem.bytes().any(is_vowel) {
            return None;
        }

        let bytes = stem.as_bytes();
        let n = bytes.len();

        // stopped -> stop, but called, missed and buzzing keep their pair
        if bytes[n - 1] == bytes[n - 2]
            && !is_vowel(bytes[n - 1])
            && !matches!(bytes[n - 1], b'l' | b's' | b'z')
            && n > 3
        {
            return Some(stem[..n - 1].to_string());
        }

        if ["at", "bl", "iz", "iv", "us", "os", "uc", "ag", "ov", "uir", "ib", "rg"]
            .iter()
            .any(|s| stem.ends_with(s))
            || is_short_cvc(bytes)
        {
            return Some(format!("{}e", stem));
        }

        Some(stem.to_string())
    }
}

impl Default for RuleLemmatizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Lemmatizer for RuleLemmatizer {
    fn lemma<'a>(&self, token: &'a str) -> Cow<'a, str> {
        if let Some(base) = self.exceptions.get(token) {
            return Cow::Borrowed(*base);
        }
        if !token.is_ascii()
            || self.protected.contains(token)
            || token.len() <= 3
            || token.bytes().any(|b| b.is_ascii_digit())
        {
            return Cow::Borrowed(token);
        }

        if token.ends_with("ing") || token.ends_with("ed") {
            if let Some(base) = self.verb(token) {
                return Cow::Owned(base);
            }
            return Cow::Borrowed(token);
        }

        match self.plural(token) {
            Some(base) => Cow::Owned(base),
            None => Cow::Borrowed(token),
        }
    }

    fn name(&self) -> &str {
        "rule_lemmatizer_en"
    }
}

fn is_vowel(b: u8) -> bool {
    matches!(b, b'a' | b'e' | b'i' | b'o' | b'u' | b'y')
}

/// Three-letter consonant-vowel-consonant stems lost a final `e` (tak-ing)
fn is_short_cvc(stem: &[u8]) -> bool {
    stem.len() == 3
        && !is_vowel(stem[0])
        && is_vowel(stem[1])
        && !is_vowel(stem[2])
        && !matches!(stem[2], b'w' | b'x' | b'y')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lemma(word: &str) -> String {
        RuleLemmatizer::new().lemma(word).into_owned()
    }

    #[test]
    fn test_irregular_forms() {
        assert_eq!(lemma("was"), "be");
        assert_eq!(lemma("has"), "have");
        assert_eq!(lemma("children"), "child");
        assert_eq!(lemma("felt"), "feel");
    }

    #[test]
    fn test_plurals() {
        assert_eq!(lemma("allergies"), "allergy");
        assert_eq!(lemma("rashes"), "rash");
        assert_eq!(lemma("headaches"), "headache");
        assert_eq!(lemma("symptoms"), "symptom");
        assert_eq!(lemma("days"), "day");
        assert_eq!(lemma("diabetes"), "diabetes");
        assert_eq!(lemma("virus"), "virus");
        assert_eq!(lemma("illness"), "illness");
    }

    #[test]
    fn test_verb_inflections() {
        assert_eq!(lemma("reported"), "report");
        assert_eq!(lemma("stopped"), "stop");
        assert_eq!(lemma("taking"), "take");
        assert_eq!(lemma("diagnosed"), "diagnose");
        assert_eq!(lemma("hospitalized"), "hospitalize");
        assert_eq!(lemma("worried"), "worry");
        assert_eq!(lemma("called"), "call");
        assert_eq!(lemma("added"), "add");
        assert_eq!(lemma("noted"), "note");
    }

    #[test]
    fn test_protected_and_short_words() {
        assert_eq!(lemma("during"), "during");
        assert_eq!(lemma("need"), "need");
        assert_eq!(lemma("bed"), "bed");
        assert_eq!(lemma("yes"), "yes");
        assert_eq!(lemma("2mg"), "2mg");
    }

    #[test]
    fn test_lemmatize_text_collapses_whitespace() {
        let lemmatizer = RuleLemmatizer::new();
        assert_eq!(
            lemmatizer.lemmatize_text("  patient   was  coughing\tdaily "),
            "patient be cough daily"
        );
        assert_eq!(lemmatizer.lemmatize_text(""), "");
    }
}
