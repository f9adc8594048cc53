//! Sentimatch - conversation sentiment scoring for simulated dating profiles
//!
//! Scores the tone of a simulated conversation between two users, turns it
//! into a compatibility score in `[0, 1]`, and greedily picks the top matches
//! for every user. The HTTP service in `routes` drives the full pipeline:
//! profile generation, conversation simulation, then analysis.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{
    calculate_compatibility, select_top_matches, ConversationAnalyzer, ConversationSentiment,
    LexiconExtractor, Matcher, Sentiment, SentimentExtractor,
};
pub use crate::models::{
    AnalysisResult, CompatibilityWeights, ConversationSet, MatchResults, Profile, ScoredPair,
};
