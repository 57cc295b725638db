//! Heuristic language classifier.
//!
//! Two passes, both deterministic:
//! 1. Non-Latin scripts decide on their own (kana → Japanese, Han →
//!    Chinese, Hangul → Korean, Cyrillic → Russian, Arabic → Arabic).
//! 2. Latin text is scored per language: one point per stop-word hit and one
//!    per distinctive letter (ñ, ã, ß…). The single best score wins; ties
//!    and zero scores are unclassified rather than a guess.
//!
//! The detected language is only returned when the registry has a matching
//! category, by name ("French") or code ("fr"), case-insensitively.

use async_trait::async_trait;

use super::{Classification, Classifier, ClassifierError, match_category};

// =============================================================================
// Languages
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    English,
    French,
    Portuguese,
    Spanish,
    Italian,
    German,
    Chinese,
    Japanese,
    Korean,
    Russian,
    Arabic,
}

impl Language {
    pub fn name(self) -> &'static str {
        match self {
            Language::English => "English",
            Language::French => "French",
            Language::Portuguese => "Portuguese",
            Language::Spanish => "Spanish",
            Language::Italian => "Italian",
            Language::German => "German",
            Language::Chinese => "Chinese",
            Language::Japanese => "Japanese",
            Language::Korean => "Korean",
            Language::Russian => "Russian",
            Language::Arabic => "Arabic",
        }
    }

    /// ISO 639-1 code.
    pub fn code(self) -> &'static str {
        match self {
            Language::English => "en",
            Language::French => "fr",
            Language::Portuguese => "pt",
            Language::Spanish => "es",
            Language::Italian => "it",
            Language::German => "de",
            Language::Chinese => "zh",
            Language::Japanese => "ja",
            Language::Korean => "ko",
            Language::Russian => "ru",
            Language::Arabic => "ar",
        }
    }
}

// =============================================================================
// Keyword Lists
// =============================================================================

const ENGLISH_WORDS: &[&str] = &[
    "the", "and", "is", "are", "you", "how", "what", "where", "why", "who", "when", "this",
    "that", "with", "have", "do", "does", "can", "i", "my", "your", "it", "of", "to", "in",
    "hello", "please", "thanks", "thank", "am", "was", "were", "will", "would",
];

const FRENCH_WORDS: &[&str] = &[
    "le", "la", "les", "des", "un", "une", "et", "est", "je", "tu", "vous", "nous", "ils",
    "comment", "allez", "pourquoi", "quoi", "où", "qui", "que", "pas", "suis", "êtes", "ça",
    "va", "bonjour", "merci", "avec", "pour", "mon", "votre", "c'est", "très",
];

const PORTUGUESE_WORDS: &[&str] = &[
    "o", "os", "as", "um", "uma", "é", "você", "como", "está", "estou", "não", "obrigado",
    "obrigada", "olá", "bom", "dia", "por", "que", "qual", "onde", "seu", "sua", "muito",
    "tudo", "bem", "eu", "são",
];

const SPANISH_WORDS: &[&str] = &[
    "el", "los", "las", "un", "una", "es", "usted", "cómo", "estás", "está", "qué", "dónde",
    "por", "gracias", "hola", "buenos", "días", "yo", "tú", "muy", "bien", "porque", "pero",
    "con", "soy",
];

const ITALIAN_WORDS: &[&str] = &[
    "il", "lo", "gli", "una", "è", "come", "stai", "sta", "sto", "ciao", "grazie", "sono",
    "che", "non", "perché", "dove", "questo", "bene", "buongiorno", "molto", "io", "tu",
    "voi", "della", "per",
];

const GERMAN_WORDS: &[&str] = &[
    "der", "die", "das", "und", "ist", "sind", "ich", "du", "sie", "wir", "wie", "geht",
    "es", "ihnen", "nicht", "danke", "hallo", "guten", "tag", "was", "wo", "warum", "mit",
    "ein", "eine", "bitte",
];

const FRENCH_LETTERS: &[char] = &['ê', 'è', 'ç', 'œ', 'ù', 'î', 'û', 'ë'];
const PORTUGUESE_LETTERS: &[char] = &['ã', 'õ'];
const SPANISH_LETTERS: &[char] = &['ñ', '¿', '¡'];
const ITALIAN_LETTERS: &[char] = &['ì', 'ò'];
const GERMAN_LETTERS: &[char] = &['ä', 'ö', 'ü', 'ß'];

const LATIN_PROFILES: &[(Language, &[&str], &[char])] = &[
    (Language::English, ENGLISH_WORDS, &[]),
    (Language::French, FRENCH_WORDS, FRENCH_LETTERS),
    (Language::Portuguese, PORTUGUESE_WORDS, PORTUGUESE_LETTERS),
    (Language::Spanish, SPANISH_WORDS, SPANISH_LETTERS),
    (Language::Italian, ITALIAN_WORDS, ITALIAN_LETTERS),
    (Language::German, GERMAN_WORDS, GERMAN_LETTERS),
];

// =============================================================================
// Detection
// =============================================================================

#[derive(Default)]
struct ScriptCounts {
    latin: usize,
    han: usize,
    kana: usize,
    hangul: usize,
    cyrillic: usize,
    arabic: usize,
}

fn count_scripts(text: &str) -> ScriptCounts {
    let mut counts = ScriptCounts::default();
    for ch in text.chars() {
        match ch as u32 {
            0x3040..=0x30FF => counts.kana += 1,
            0x3400..=0x4DBF | 0x4E00..=0x9FFF | 0xF900..=0xFAFF => counts.han += 1,
            0x1100..=0x11FF | 0xAC00..=0xD7AF => counts.hangul += 1,
            0x0400..=0x04FF => counts.cyrillic += 1,
            0x0600..=0x06FF => counts.arabic += 1,
            _ if ch.is_alphabetic() => counts.latin += 1,
            _ => {}
        }
    }
    counts
}

/// Detect the language of `text`, or `None` when the evidence is absent or
/// ambiguous.
pub fn detect(text: &str) -> Option<Language> {
    let counts = count_scripts(text);

    // Japanese mixes kana with Han, so kana is checked first.
    if counts.kana > 0 {
        return Some(Language::Japanese);
    }
    let non_latin = [
        (counts.han, Language::Chinese),
        (counts.hangul, Language::Korean),
        (counts.cyrillic, Language::Russian),
        (counts.arabic, Language::Arabic),
    ];
    if let Some((n, lang)) = non_latin.iter().copied().max_by_key(|(n, _)| *n)
        && n > 0
        && n >= counts.latin
    {
        return Some(lang);
    }

    detect_latin(text)
}

fn detect_latin(text: &str) -> Option<Language> {
    let lower = text.to_lowercase();
    let words: Vec<&str> = lower
        .split(|c: char| !(c.is_alphabetic() || c == '\''))
        .filter(|w| !w.is_empty())
        .collect();

    let mut best: Option<(Language, usize)> = None;
    let mut tied = false;

    for (lang, stop_words, letters) in LATIN_PROFILES {
        let word_hits = words.iter().filter(|w| stop_words.contains(w)).count();
        let letter_hits = lower.chars().filter(|c| letters.contains(c)).count();
        let score = word_hits + letter_hits;
        if score == 0 {
            continue;
        }
        match best {
            Some((_, top)) if score < top => {}
            Some((_, top)) if score == top => tied = true,
            _ => {
                best = Some((*lang, score));
                tied = false;
            }
        }
    }

    if tied { None } else { best.map(|(lang, _)| lang) }
}

// =============================================================================
// Classifier
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct ScriptClassifier;

impl ScriptClassifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Classifier for ScriptClassifier {
    fn name(&self) -> &str {
        "script"
    }

    async fn classify(&self, query: &str, categories: &[String]) -> Result<Classification, ClassifierError> {
        let Some(lang) = detect(query) else {
            return Ok(Classification::Unclassified);
        };
        let category = match_category(lang.name(), categories)
            .or_else(|| match_category(lang.code(), categories));
        Ok(match category {
            Some(c) => Classification::Category(c.to_string()),
            None => Classification::Unclassified,
        })
    }
}
