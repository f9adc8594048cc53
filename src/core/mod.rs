// Core algorithm exports
pub mod analyzer;
pub mod matcher;
pub mod scoring;
pub mod sentiment;

pub use analyzer::{
    parse_message, AnalysisError, ConversationAnalyzer, ConversationSentiment, MessageSentiment,
    SpeakerSentiment, SpeakerSummary,
};
pub use matcher::{select_top_matches, sort_by_score, Matcher, PairScore};
pub use scoring::{calculate_compatibility, compatibility_breakdown, CompatibilityBreakdown};
pub use sentiment::{Lexicon, LexiconExtractor, Sentiment, SentimentError, SentimentExtractor};
