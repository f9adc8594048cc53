use crate::core::sentiment::{LexiconExtractor, Sentiment, SentimentExtractor};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Errors that fail the analysis of a whole conversation
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Conversation has {count} messages, limit is {limit}")]
    TooManyMessages { count: usize, limit: usize },
}

/// Sentiment of a single retained message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageSentiment {
    pub text: String,
    pub polarity: f64,
    pub subjectivity: f64,
}

/// Running aggregate for one speaker within one conversation
#[derive(Debug, Clone, PartialEq)]
pub struct SpeakerSentiment {
    pub name: String,
    pub total_polarity: f64,
    pub total_subjectivity: f64,
    pub count: usize,
    pub messages: Vec<MessageSentiment>,
}

impl SpeakerSentiment {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            total_polarity: 0.0,
            total_subjectivity: 0.0,
            count: 0,
            messages: Vec::new(),
        }
    }

    pub fn average_polarity(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        self.total_polarity / self.count as f64
    }

    pub fn average_subjectivity(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        self.total_subjectivity / self.count as f64
    }

    pub fn summary(&self) -> SpeakerSummary {
        SpeakerSummary {
            name: self.name.clone(),
            average_polarity: self.average_polarity(),
            average_subjectivity: self.average_subjectivity(),
            message_count: self.count,
            message_sentiments: self.messages.clone(),
        }
    }
}

/// Per-speaker breakdown as reported to API clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeakerSummary {
    pub name: String,
    pub average_polarity: f64,
    pub average_subjectivity: f64,
    pub message_count: usize,
    pub message_sentiments: Vec<MessageSentiment>,
}

/// Aggregated sentiment of one conversation
///
/// Speakers are kept in order of their first retained message. A conversation
/// rarely has more than two speakers, so lookups are a linear scan.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversationSentiment {
    speakers: Vec<SpeakerSentiment>,
    total_polarity: f64,
    message_count: usize,
    degraded: bool,
}

impl ConversationSentiment {
    /// Result used when the extractor could not be set up
    pub fn neutral() -> Self {
        Self {
            degraded: true,
            ..Self::default()
        }
    }

    fn record(&mut self, speaker: &str, content: &str, sentiment: Sentiment) {
        self.total_polarity += sentiment.polarity;
        self.message_count += 1;

        let index = match self.speakers.iter().position(|s| s.name == speaker) {
            Some(index) => index,
            None => {
                self.speakers.push(SpeakerSentiment::new(speaker));
                self.speakers.len() - 1
            }
        };

        let bucket = &mut self.speakers[index];
        bucket.total_polarity += sentiment.polarity;
        bucket.total_subjectivity += sentiment.subjectivity;
        bucket.count += 1;
        bucket.messages.push(MessageSentiment {
            text: content.to_string(),
            polarity: sentiment.polarity,
            subjectivity: sentiment.subjectivity,
        });
    }

    pub fn speakers(&self) -> &[SpeakerSentiment] {
        &self.speakers
    }

    pub fn speaker(&self, name: &str) -> Option<&SpeakerSentiment> {
        self.speakers.iter().find(|s| s.name == name)
    }

    pub fn message_count(&self) -> usize {
        self.message_count
    }

    /// Mean polarity over all retained messages, 0.0 for none
    pub fn overall_sentiment(&self) -> f64 {
        if self.message_count == 0 {
            return 0.0;
        }
        self.total_polarity / self.message_count as f64
    }

    /// True when the extractor was unavailable and nothing was scored
    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    pub fn summaries(&self) -> Vec<SpeakerSummary> {
        self.speakers.iter().map(SpeakerSentiment::summary).collect()
    }
}

/// Split a `"Speaker: content"` line on its first colon
///
/// Returns `None` for lines without a colon, with the colon at index 0, or
/// with empty content after trimming.
pub fn parse_message(line: &str) -> Option<(&str, &str)> {
    let colon = line.find(':')?;
    if colon == 0 {
        return None;
    }

    let speaker = line[..colon].trim();
    let content = line[colon + 1..].trim();
    if content.is_empty() {
        return None;
    }

    Some((speaker, content))
}

/// Turns conversation lines into per-speaker sentiment aggregates
#[derive(Clone)]
pub struct ConversationAnalyzer {
    extractor: Arc<dyn SentimentExtractor>,
    max_messages: Option<usize>,
}

impl ConversationAnalyzer {
    /// Analyzer with no limit on conversation length
    pub fn new(extractor: Arc<dyn SentimentExtractor>) -> Self {
        Self {
            extractor,
            max_messages: None,
        }
    }

    pub fn with_default_extractor() -> Self {
        Self::new(Arc::new(LexiconExtractor::new()))
    }

    /// Reject conversations with more than `limit` parseable messages
    pub fn with_message_limit(mut self, limit: usize) -> Self {
        self.max_messages = Some(limit);
        self
    }

    /// Run the extractor's one-time setup; safe to call repeatedly
    pub fn initialize(&self) -> bool {
        self.extractor.initialize()
    }

    /// Analyze an ordered conversation
    ///
    /// Unparseable lines are skipped. A message the extractor cannot score
    /// counts as neutral `(0.0, 0.5)`. If the extractor is unavailable the
    /// result is `ConversationSentiment::neutral()`.
    pub fn analyze<S: AsRef<str>>(
        &self,
        conversation: &[S],
    ) -> Result<ConversationSentiment, AnalysisError> {
        if !self.extractor.initialize() {
            tracing::warn!("Sentiment extractor unavailable, returning neutral sentiment");
            return Ok(ConversationSentiment::neutral());
        }

        let messages: Vec<(&str, &str)> = conversation
            .iter()
            .filter_map(|line| parse_message(line.as_ref()))
            .collect();

        if let Some(limit) = self.max_messages {
            if messages.len() > limit {
                return Err(AnalysisError::TooManyMessages {
                    count: messages.len(),
                    limit,
                });
            }
        }

        let mut sentiment = ConversationSentiment::default();
        for (speaker, content) in messages {
            let scored = self.score_message(content);
            sentiment.record(speaker, content, scored);
        }

        tracing::debug!(
            "Analyzed {} messages from {} speakers, overall sentiment {:.2}",
            sentiment.message_count(),
            sentiment.speakers().len(),
            sentiment.overall_sentiment()
        );

        Ok(sentiment)
    }

    fn score_message(&self, content: &str) -> Sentiment {
        match self.extractor.extract(content) {
            Ok(sentiment) if sentiment.is_finite() => sentiment.clamped(),
            Ok(sentiment) => {
                tracing::warn!(
                    "Extractor returned non-finite sentiment {:?} for message, using neutral",
                    sentiment
                );
                Sentiment::NEUTRAL
            }
            Err(e) => {
                tracing::warn!("Unable to score message {:?}: {}", content, e);
                Sentiment::NEUTRAL
            }
        }
    }
}

impl std::fmt::Debug for ConversationAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationAnalyzer")
            .field("max_messages", &self.max_messages)
            .finish_non_exhaustive()
    }
}

impl Default for ConversationAnalyzer {
    fn default() -> Self {
        Self::with_default_extractor()
    }
}
