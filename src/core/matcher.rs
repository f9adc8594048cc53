use crate::core::{
    analyzer::{ConversationAnalyzer, SpeakerSummary},
    scoring::{compatibility_breakdown, CompatibilityBreakdown},
};
use crate::models::{
    AnalysisResult, CompatibilityWeights, ConversationSet, MatchEntry, MatchResults, Profile,
    ScoredPair,
};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Default number of partners kept per user
pub const DEFAULT_MAX_MATCHES: usize = 3;

/// Score assigned to a pair whose conversation could not be analyzed
pub const FALLBACK_SCORE: f64 = 0.5;

/// Result of scoring a single conversation
#[derive(Debug, Clone, Serialize)]
pub struct PairScore {
    pub sentiment_score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breakdown: Option<CompatibilityBreakdown>,
    pub speakers: Vec<SpeakerSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Main matching orchestrator
///
/// # Pipeline Stages
/// 1. Conversation analysis (per-message sentiment, per-speaker aggregates)
/// 2. Compatibility scoring per pair
/// 3. Global sort by score
/// 4. Greedy top-N selection per user
#[derive(Debug, Clone)]
pub struct Matcher {
    analyzer: ConversationAnalyzer,
    weights: CompatibilityWeights,
    max_matches: usize,
}

impl Matcher {
    pub fn new(
        analyzer: ConversationAnalyzer,
        weights: CompatibilityWeights,
        max_matches: usize,
    ) -> Self {
        Self {
            analyzer,
            weights,
            max_matches,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(
            ConversationAnalyzer::with_default_extractor(),
            CompatibilityWeights::default(),
            DEFAULT_MAX_MATCHES,
        )
    }

    pub fn analyzer(&self) -> &ConversationAnalyzer {
        &self.analyzer
    }

    pub fn weights(&self) -> &CompatibilityWeights {
        &self.weights
    }

    /// Score one conversation, falling back to a neutral score on failure
    pub fn score_conversation<S: AsRef<str>>(&self, conversation: &[S]) -> PairScore {
        match self.analyzer.analyze(conversation) {
            Ok(sentiment) => {
                let breakdown = compatibility_breakdown(&sentiment, &self.weights);
                PairScore {
                    sentiment_score: breakdown.score,
                    breakdown: Some(breakdown),
                    speakers: sentiment.summaries(),
                    error: None,
                }
            }
            Err(e) => PairScore {
                sentiment_score: FALLBACK_SCORE,
                breakdown: None,
                speakers: Vec::new(),
                error: Some(e.to_string()),
            },
        }
    }

    /// Score every stored conversation whose two profiles both exist
    ///
    /// Pairs referencing an unknown profile id are skipped. The returned list
    /// keeps the conversation set's order.
    pub fn score_pairs(
        &self,
        profiles: &[Profile],
        conversations: &ConversationSet,
    ) -> Vec<ScoredPair> {
        let by_id: HashMap<u32, &Profile> = profiles.iter().map(|p| (p.id, p)).collect();

        conversations
            .iter()
            .filter_map(|pair| {
                let (Some(user_a), Some(user_b)) =
                    (by_id.get(&pair.user_a_id), by_id.get(&pair.user_b_id))
                else {
                    tracing::debug!(
                        "Skipping conversation {} <-> {}: profile missing",
                        pair.user_a_id,
                        pair.user_b_id
                    );
                    return None;
                };

                let scored = self.score_conversation(&pair.messages);
                match &scored.error {
                    Some(e) => tracing::warn!(
                        "Error analyzing sentiment between {} and {}: {}",
                        user_a.name,
                        user_b.name,
                        e
                    ),
                    None => tracing::debug!(
                        "Compatibility {} <-> {}: {:.3}",
                        user_a.name,
                        user_b.name,
                        scored.sentiment_score
                    ),
                }

                Some(ScoredPair {
                    user_a_id: user_a.id,
                    user_b_id: user_b.id,
                    user_a_name: user_a.name.clone(),
                    user_b_name: user_b.name.clone(),
                    sentiment_score: scored.sentiment_score,
                    conversation: pair.messages.clone(),
                    error: scored.error,
                })
            })
            .collect()
    }

    pub fn select_matches(
        &self,
        profiles: &[Profile],
        scored_pairs: &[ScoredPair],
    ) -> MatchResults {
        select_top_matches(profiles, scored_pairs, self.max_matches)
    }

    /// Execute one complete analysis run
    pub fn run(&self, profiles: &[Profile], conversations: &ConversationSet) -> AnalysisResult {
        if !self.analyzer.initialize() {
            tracing::warn!("Sentiment extractor unavailable, every pair will score 0.5");
        }

        let mut all_pairs = self.score_pairs(profiles, conversations);
        sort_by_score(&mut all_pairs);

        let results = self.select_matches(profiles, &all_pairs);
        let failed = all_pairs.iter().filter(|p| p.error.is_some()).count();

        tracing::info!(
            "Analysis run complete: {} profiles, {} pairs scored ({} with fallback score)",
            profiles.len(),
            all_pairs.len(),
            failed
        );

        AnalysisResult {
            run_id: uuid::Uuid::new_v4(),
            completed_at: chrono::Utc::now(),
            results,
            all_pairs,
        }
    }
}

impl Default for Matcher {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Descending score order; incomparable scores count as equal
fn by_score_desc(a: &ScoredPair, b: &ScoredPair) -> Ordering {
    b.sentiment_score
        .partial_cmp(&a.sentiment_score)
        .unwrap_or(Ordering::Equal)
}

/// Stable sort, highest score first
pub fn sort_by_score(pairs: &mut [ScoredPair]) {
    pairs.sort_by(by_score_desc);
}

/// Fill every user's match list greedily in global score order
///
/// Each pair offers a slot on both sides independently; a side that already
/// holds `limit` entries is skipped. This is not a per-user re-sort, so a
/// user's list reflects the order in which pairs were visited globally.
/// Pairs naming a profile id outside `profiles` are ignored.
pub fn select_top_matches(
    profiles: &[Profile],
    scored_pairs: &[ScoredPair],
    limit: usize,
) -> MatchResults {
    let mut results = MatchResults::for_profiles(profiles);
    let names: HashMap<u32, &str> = profiles.iter().map(|p| (p.id, p.name.as_str())).collect();

    let mut sorted: Vec<&ScoredPair> = scored_pairs.iter().collect();
    sorted.sort_by(|a, b| by_score_desc(a, b));

    for pair in sorted {
        let (Some(name_a), Some(name_b)) = (names.get(&pair.user_a_id), names.get(&pair.user_b_id))
        else {
            continue;
        };

        offer(&mut results, pair.user_a_id, pair.user_b_id, name_b, pair, limit);
        offer(&mut results, pair.user_b_id, pair.user_a_id, name_a, pair, limit);
    }

    results
}

fn offer(
    results: &mut MatchResults,
    user_id: u32,
    partner_id: u32,
    partner_name: &str,
    pair: &ScoredPair,
    limit: usize,
) {
    let Some(record) = results.get_mut(user_id) else {
        return;
    };

    if record.matches.len() < limit {
        record.matches.push(MatchEntry {
            partner_id,
            partner_name: partner_name.to_string(),
            sentiment_score: pair.sentiment_score,
            conversation: pair.conversation.clone(),
        });
    }
}
