use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Lexicon shipped with the binary
const EMBEDDED_LEXICON: &str = include_str!("../../data/lexicon.json");

/// How many tokens back a negation still flips a scored word
const NEGATION_WINDOW: usize = 2;

/// Polarity multiplier for a negated word
const NEGATION_FACTOR: f64 = -0.5;

const EXCLAMATION_BOOST: f64 = 1.1;
const MAX_EXCLAMATIONS: usize = 3;

/// Errors raised by a sentiment extractor for a single text
#[derive(Debug, Error)]
pub enum SentimentError {
    #[error("Sentiment extractor unavailable: {0}")]
    Unavailable(String),

    #[error("Nothing to score")]
    EmptyText,

    #[error("Failed to load lexicon: {0}")]
    Lexicon(String),

    #[error("Failed to read lexicon file: {0}")]
    Io(#[from] std::io::Error),
}

/// Polarity/subjectivity pair for one piece of text
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sentiment {
    /// -1.0 (negative) to 1.0 (positive)
    pub polarity: f64,
    /// 0.0 (objective) to 1.0 (subjective)
    pub subjectivity: f64,
}

impl Sentiment {
    /// Substituted whenever a message cannot be scored
    pub const NEUTRAL: Sentiment = Sentiment {
        polarity: 0.0,
        subjectivity: 0.5,
    };

    pub fn new(polarity: f64, subjectivity: f64) -> Self {
        Self {
            polarity,
            subjectivity,
        }
    }

    /// Force both values into their documented ranges
    pub fn clamped(self) -> Self {
        Self {
            polarity: self.polarity.clamp(-1.0, 1.0),
            subjectivity: self.subjectivity.clamp(0.0, 1.0),
        }
    }

    pub fn is_finite(&self) -> bool {
        self.polarity.is_finite() && self.subjectivity.is_finite()
    }
}

/// Scores the sentiment of one message's content
///
/// Implementations must be cheap to call repeatedly. `initialize` performs any
/// one-time resource loading and must be idempotent; returning `false` means
/// the extractor is unusable and callers fall back to neutral output.
pub trait SentimentExtractor: Send + Sync {
    fn initialize(&self) -> bool {
        true
    }

    fn extract(&self, text: &str) -> Result<Sentiment, SentimentError>;
}

/// Word entry: `[polarity, subjectivity]`
#[derive(Debug, Clone, Copy, Deserialize)]
struct LexiconEntry(f64, f64);

/// Polarity lexicon with intensifiers and negations
#[derive(Debug, Clone, Deserialize)]
pub struct Lexicon {
    words: HashMap<String, LexiconEntry>,
    #[serde(default)]
    intensifiers: HashMap<String, f64>,
    #[serde(default)]
    negations: HashSet<String>,
}

impl Lexicon {
    pub fn from_json(raw: &str) -> Result<Self, SentimentError> {
        let lexicon: Lexicon =
            serde_json::from_str(raw).map_err(|e| SentimentError::Lexicon(e.to_string()))?;

        if lexicon.words.is_empty() {
            return Err(SentimentError::Lexicon("lexicon has no words".to_string()));
        }

        Ok(lexicon)
    }

    /// The lexicon bundled in `data/lexicon.json`
    pub fn embedded() -> Result<Self, SentimentError> {
        Self::from_json(EMBEDDED_LEXICON)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SentimentError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    fn is_negation(&self, token: &str) -> bool {
        self.negations.contains(token)
    }

    /// Score a text as the mean over every lexicon word it contains
    ///
    /// An intensifier directly before a word scales it, a negation up to two
    /// tokens back flips and halves its polarity. Text without any lexicon
    /// word scores `(0.0, 0.0)`.
    pub fn score(&self, text: &str) -> Sentiment {
        let tokens = tokenize(text);

        let mut polarity_sum = 0.0;
        let mut subjectivity_sum = 0.0;
        let mut scored = 0usize;

        for (i, token) in tokens.iter().enumerate() {
            let Some(&LexiconEntry(mut polarity, mut subjectivity)) = self.words.get(token) else {
                continue;
            };

            if i > 0 {
                if let Some(intensity) = self.intensifiers.get(&tokens[i - 1]) {
                    polarity *= intensity;
                    subjectivity *= intensity;
                }
            }

            let negated = (1..=NEGATION_WINDOW)
                .any(|back| i >= back && self.is_negation(&tokens[i - back]));
            if negated {
                polarity *= NEGATION_FACTOR;
            }

            polarity_sum += polarity.clamp(-1.0, 1.0);
            subjectivity_sum += subjectivity.clamp(0.0, 1.0);
            scored += 1;
        }

        if scored == 0 {
            return Sentiment::new(0.0, 0.0);
        }

        let mut polarity = polarity_sum / scored as f64;
        let exclamations = text.matches('!').count().min(MAX_EXCLAMATIONS);
        if polarity != 0.0 {
            polarity *= EXCLAMATION_BOOST.powi(exclamations as i32);
        }

        Sentiment::new(polarity, subjectivity_sum / scored as f64).clamped()
    }
}

/// Lowercase word tokens; apostrophes are dropped so "don't" becomes "dont"
fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();

    for c in text.chars() {
        if c.is_alphanumeric() {
            current.extend(c.to_lowercase());
        } else if c == '\'' || c == '\u{2019}' {
            continue;
        } else if !current.is_empty() {
            tokens.push(std::mem::take(&mut current));
        }
    }

    if !current.is_empty() {
        tokens.push(current);
    }

    tokens
}

/// Where a `LexiconExtractor` loads its lexicon from
#[derive(Debug, Clone)]
pub enum LexiconSource {
    Embedded,
    File(PathBuf),
}

impl LexiconSource {
    fn load(&self) -> Result<Lexicon, SentimentError> {
        match self {
            LexiconSource::Embedded => Lexicon::embedded(),
            LexiconSource::File(path) => Lexicon::load(path),
        }
    }
}

/// Lexicon-backed sentiment extractor
///
/// The lexicon is loaded lazily on the first `initialize` or `extract` call
/// and the outcome is kept for the extractor's lifetime, so a failed load is
/// never retried.
#[derive(Debug)]
pub struct LexiconExtractor {
    source: LexiconSource,
    lexicon: OnceCell<Option<Lexicon>>,
}

impl LexiconExtractor {
    pub fn new() -> Self {
        Self::with_source(LexiconSource::Embedded)
    }

    pub fn with_source(source: LexiconSource) -> Self {
        Self {
            source,
            lexicon: OnceCell::new(),
        }
    }

    pub fn from_path<P: Into<PathBuf>>(path: P) -> Self {
        Self::with_source(LexiconSource::File(path.into()))
    }

    /// Use an already-loaded lexicon
    pub fn from_lexicon(lexicon: Lexicon) -> Self {
        Self {
            source: LexiconSource::Embedded,
            lexicon: OnceCell::with_value(Some(lexicon)),
        }
    }

    fn lexicon(&self) -> Option<&Lexicon> {
        self.lexicon
            .get_or_init(|| match self.source.load() {
                Ok(lexicon) => {
                    tracing::info!("Sentiment lexicon loaded ({} words)", lexicon.len());
                    Some(lexicon)
                }
                Err(e) => {
                    tracing::error!(
                        "Failed to load sentiment lexicon from {:?}: {}; analyses will be neutral",
                        self.source,
                        e
                    );
                    None
                }
            })
            .as_ref()
    }
}

impl Default for LexiconExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl SentimentExtractor for LexiconExtractor {
    fn initialize(&self) -> bool {
        self.lexicon().is_some()
    }

    fn extract(&self, text: &str) -> Result<Sentiment, SentimentError> {
        let lexicon = self
            .lexicon()
            .ok_or_else(|| SentimentError::Unavailable("lexicon failed to load".to_string()))?;

        if text.trim().is_empty() {
            return Err(SentimentError::EmptyText);
        }

        Ok(lexicon.score(text))
    }
}
