use crate::core::analyzer::{ConversationSentiment, MessageSentiment, SpeakerSentiment};
use crate::models::CompatibilityWeights;
use serde::Serialize;

/// Intermediate terms of a compatibility score
///
/// The blend terms are only present when two or more speakers took part.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CompatibilityBreakdown {
    pub speakers: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trend_bonus: Option<f64>,
    pub score: f64,
}

/// Calculate a compatibility score (0-1) for an analyzed conversation
///
/// Scoring formula for two or more speakers:
/// score = (
///     min_score * 0.4 +      # weakest speaker's shifted polarity
///     avg_score * 0.4 +      # mean shifted polarity
///     trend_bonus * 0.2      # share of speakers warming up
/// )
///
/// With fewer than two speakers the overall sentiment is rescaled to 0-1.
pub fn calculate_compatibility(
    sentiment: &ConversationSentiment,
    weights: &CompatibilityWeights,
) -> f64 {
    compatibility_breakdown(sentiment, weights).score
}

pub fn compatibility_breakdown(
    sentiment: &ConversationSentiment,
    weights: &CompatibilityWeights,
) -> CompatibilityBreakdown {
    let speakers = sentiment.speakers();

    if speakers.len() < 2 {
        return CompatibilityBreakdown {
            speakers: speakers.len(),
            min_score: None,
            avg_score: None,
            trend_bonus: None,
            score: clamp_score(shift(sentiment.overall_sentiment())),
        };
    }

    let shifted: Vec<f64> = speakers
        .iter()
        .map(|speaker| shift(speaker.average_polarity()))
        .collect();

    let min_score = shifted.iter().copied().fold(f64::INFINITY, f64::min);
    let avg_score = shifted.iter().sum::<f64>() / shifted.len() as f64;
    let trend_bonus = calculate_trend_bonus(speakers, weights.neutral_trend);

    let score = min_score * weights.minimum
        + avg_score * weights.average
        + trend_bonus * weights.trend;

    CompatibilityBreakdown {
        speakers: speakers.len(),
        min_score: Some(min_score),
        avg_score: Some(avg_score),
        trend_bonus: Some(trend_bonus),
        score: clamp_score(score),
    }
}

/// Mean of the per-speaker trend samples, `neutral` when there are none
pub fn calculate_trend_bonus(speakers: &[SpeakerSentiment], neutral: f64) -> f64 {
    let samples: Vec<f64> = speakers
        .iter()
        .filter_map(|speaker| trend_sample(&speaker.messages))
        .collect();

    if samples.is_empty() {
        return neutral;
    }

    samples.iter().sum::<f64>() / samples.len() as f64
}

/// 1.0 if the second half of the messages is more positive than the first,
/// 0.0 otherwise, `None` for fewer than two messages
///
/// The split point is `len / 2`, so an odd middle message lands in the
/// second half.
pub fn trend_sample(messages: &[MessageSentiment]) -> Option<f64> {
    if messages.len() < 2 {
        return None;
    }

    let (first, second) = messages.split_at(messages.len() / 2);
    if mean_polarity(second) > mean_polarity(first) {
        Some(1.0)
    } else {
        Some(0.0)
    }
}

#[inline]
fn mean_polarity(messages: &[MessageSentiment]) -> f64 {
    messages.iter().map(|m| m.polarity).sum::<f64>() / messages.len() as f64
}

/// Map a polarity from [-1, 1] onto [0, 1]
#[inline]
fn shift(polarity: f64) -> f64 {
    (polarity + 1.0) / 2.0
}

#[inline]
fn clamp_score(score: f64) -> f64 {
    if score.is_nan() {
        return 0.5;
    }
    score.clamp(0.0, 1.0)
}
