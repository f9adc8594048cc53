// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    AnalysisResult, CompatibilityWeights, ConversationSet, MatchEntry, MatchResults, OperationStep,
    PairConversation, PairKey, Profile, PromptAnswer, ScoredPair, UserMatchRecord,
};
pub use requests::GenerateProfilesRequest;
pub use responses::{
    AnalyzeResponse, ConversationResponse, ConversationsResponse, ErrorResponse, HealthResponse,
    MessageResponse, ProfilesResponse, SampleConversation, StatusResponse,
};
