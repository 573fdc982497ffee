use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Who hears about a message an applicant posts on their own application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageFanoutPolicy {
    /// Every Admin and Officer receives a notification.
    #[default]
    AllStaff,
    /// Only the first Officer in the directory (or the first Admin when no Officer exists).
    FirstOfficer,
}

impl MessageFanoutPolicy {
    pub const fn label(self) -> &'static str {
        match self {
            MessageFanoutPolicy::AllStaff => "all_staff",
            MessageFanoutPolicy::FirstOfficer => "first_officer",
        }
    }
}

impl fmt::Display for MessageFanoutPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for MessageFanoutPolicy {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "all_staff" | "all" | "broadcast" => Ok(Self::AllStaff),
            "first_officer" | "single" => Ok(Self::FirstOfficer),
            _ => Err(()),
        }
    }
}

/// Point weights feeding the trust score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustScoreWeights {
    pub base: i32,
    pub bvn_verified: i32,
    pub nin_present: i32,
    pub repaid_loan: i32,
}

impl Default for TrustScoreWeights {
    fn default() -> Self {
        Self {
            base: 30,
            bvn_verified: 35,
            nin_present: 20,
            repaid_loan: 15,
        }
    }
}

/// Business rules for the portal engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortalConfig {
    pub message_fanout: MessageFanoutPolicy,
    pub trust_weights: TrustScoreWeights,
    /// Currency units granted per trust-score point.
    pub loan_limit_per_point: u64,
    /// Reject submissions above the applicant's current loan limit.
    pub enforce_loan_limit: bool,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            message_fanout: MessageFanoutPolicy::AllStaff,
            trust_weights: TrustScoreWeights::default(),
            loan_limit_per_point: 15_000,
            enforce_loan_limit: false,
        }
    }
}
