use serde::{Deserialize, Serialize};
use validator::Validate;

/// Request to generate a fresh set of profiles
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct GenerateProfilesRequest {
    /// Falls back to the configured default when absent
    #[validate(range(min = 2, max = 50))]
    #[serde(default, alias = "numProfiles")]
    pub num_profiles: Option<u32>,
}
