use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashMap;

/// Answer to one dating-app prompt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptAnswer {
    pub prompt: String,
    pub answer: String,
}

/// Synthetic user profile, immutable once generated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: u32,
    pub name: String,
    pub age: u8,
    pub bio: String,
    pub interests: Vec<String>,
    pub personality: String,
    #[serde(default)]
    pub prompt_answers: Vec<PromptAnswer>,
}

/// Unordered pair of profile ids, stored smaller id first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PairKey {
    low: u32,
    high: u32,
}

impl PairKey {
    pub fn new(a: u32, b: u32) -> Self {
        Self {
            low: a.min(b),
            high: a.max(b),
        }
    }

    pub fn ids(&self) -> (u32, u32) {
        (self.low, self.high)
    }
}

/// Conversation between two profiles, in the order it was produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairConversation {
    pub user_a_id: u32,
    pub user_b_id: u32,
    pub messages: Vec<String>,
}

/// All conversations of one run, one per unordered pair
///
/// Iteration follows insertion order; lookups accept either id order.
#[derive(Debug, Clone, Default)]
pub struct ConversationSet {
    entries: Vec<PairConversation>,
    index: HashMap<PairKey, usize>,
}

impl ConversationSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a conversation; replaces an existing one for the same pair
    pub fn insert(&mut self, user_a_id: u32, user_b_id: u32, messages: Vec<String>) {
        let key = PairKey::new(user_a_id, user_b_id);
        let conversation = PairConversation {
            user_a_id,
            user_b_id,
            messages,
        };

        match self.index.get(&key) {
            Some(&i) => self.entries[i] = conversation,
            None => {
                self.index.insert(key, self.entries.len());
                self.entries.push(conversation);
            }
        }
    }

    pub fn get(&self, a: u32, b: u32) -> Option<&PairConversation> {
        self.index
            .get(&PairKey::new(a, b))
            .map(|&i| &self.entries[i])
    }

    pub fn contains(&self, a: u32, b: u32) -> bool {
        self.index.contains_key(&PairKey::new(a, b))
    }

    pub fn iter(&self) -> impl Iterator<Item = &PairConversation> {
        self.entries.iter()
    }

    pub fn first(&self) -> Option<&PairConversation> {
        self.entries.first()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Compatibility score for one pair of profiles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredPair {
    #[serde(rename = "userA_id")]
    pub user_a_id: u32,
    #[serde(rename = "userB_id")]
    pub user_b_id: u32,
    #[serde(rename = "userA_name")]
    pub user_a_name: String,
    #[serde(rename = "userB_name")]
    pub user_b_name: String,
    pub sentiment_score: f64,
    pub conversation: Vec<String>,
    /// Set when scoring failed and the neutral fallback was used
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// One partner in a user's match list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchEntry {
    pub partner_id: u32,
    pub partner_name: String,
    pub sentiment_score: f64,
    pub conversation: Vec<String>,
}

/// A user together with their selected matches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserMatchRecord {
    pub user: Profile,
    pub matches: Vec<MatchEntry>,
}

/// Match records for every profile of a run, in profile order
///
/// Serializes as a JSON object keyed by profile id.
#[derive(Debug, Clone, Default)]
pub struct MatchResults {
    records: Vec<UserMatchRecord>,
    index: HashMap<u32, usize>,
}

impl MatchResults {
    /// One empty record per profile
    pub fn for_profiles(profiles: &[Profile]) -> Self {
        let mut results = Self::default();
        for profile in profiles {
            if results.index.contains_key(&profile.id) {
                tracing::warn!("Duplicate profile id {}, keeping the first", profile.id);
                continue;
            }
            results.index.insert(profile.id, results.records.len());
            results.records.push(UserMatchRecord {
                user: profile.clone(),
                matches: Vec::new(),
            });
        }
        results
    }

    pub fn get(&self, id: u32) -> Option<&UserMatchRecord> {
        self.index.get(&id).map(|&i| &self.records[i])
    }

    pub(crate) fn get_mut(&mut self, id: u32) -> Option<&mut UserMatchRecord> {
        self.index.get(&id).map(|&i| &mut self.records[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &UserMatchRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl Serialize for MatchResults {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.records.len()))?;
        for record in &self.records {
            map.serialize_entry(&record.user.id.to_string(), record)?;
        }
        map.end()
    }
}

/// Output of one complete analysis run
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    pub run_id: uuid::Uuid,
    pub completed_at: chrono::DateTime<chrono::Utc>,
    pub results: MatchResults,
    /// Every scored pair, highest score first
    pub all_pairs: Vec<ScoredPair>,
}

/// Long-running session operation, at most one at a time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationStep {
    GenerateProfiles,
    SimulateConversations,
    AnalyzeSentiment,
}

/// Weights of the compatibility blend
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompatibilityWeights {
    /// Weight of the lowest shifted speaker polarity
    pub minimum: f64,
    /// Weight of the mean shifted speaker polarity
    pub average: f64,
    /// Weight of the warming-up trend bonus
    pub trend: f64,
    /// Trend bonus used when no speaker has two or more messages
    pub neutral_trend: f64,
}

impl Default for CompatibilityWeights {
    fn default() -> Self {
        Self {
            minimum: 0.4,
            average: 0.4,
            trend: 0.2,
            neutral_trend: 0.5,
        }
    }
}
