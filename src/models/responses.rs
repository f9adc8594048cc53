use serde::{Deserialize, Serialize};
use crate::core::{CompatibilityBreakdown, SpeakerSummary};
use crate::models::domain::{AnalysisResult, OperationStep, Profile};

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

/// Plain success response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

/// Current session status
#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub in_progress: bool,
    pub step: Option<OperationStep>,
    pub message: Option<String>,
    pub has_profiles: bool,
    pub has_conversations: bool,
    pub has_sentiment: bool,
}

/// Response for profile generation
#[derive(Debug, Clone, Serialize)]
pub struct ProfilesResponse<'a> {
    pub success: bool,
    pub profiles: &'a [Profile],
    pub message: String,
}

/// One stored conversation, returned as an example
#[derive(Debug, Clone, Serialize)]
pub struct SampleConversation<'a> {
    pub pair: (u32, u32),
    pub messages: &'a [String],
}

/// Response for conversation simulation
#[derive(Debug, Clone, Serialize)]
pub struct ConversationsResponse<'a> {
    pub success: bool,
    pub num_conversations: usize,
    pub sample_conversation: Option<SampleConversation<'a>>,
    pub message: String,
}

/// Response for a completed analysis run
#[derive(Debug, Clone, Serialize)]
pub struct AnalyzeResponse<'a> {
    pub success: bool,
    #[serde(flatten)]
    pub analysis: &'a AnalysisResult,
}

/// Scored conversation for a single pair of users
#[derive(Debug, Clone, Serialize)]
pub struct ConversationResponse<'a> {
    pub user1: &'a Profile,
    pub user2: &'a Profile,
    pub conversation: &'a [String],
    pub sentiment_score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breakdown: Option<CompatibilityBreakdown>,
    pub speakers: Vec<SpeakerSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
