use serde::Serialize;

use super::config::{PortalConfig, TrustScoreWeights};
use super::domain::{Application, LoanStatus, User};

pub const MAX_TRUST_SCORE: u8 = 100;

/// Trust score together with the advisory loan limit derived from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TrustAssessment {
    pub score: u8,
    pub loan_limit: u64,
}

/// Score `user` from their verification flags and repayment history, clamped to `0..=100`.
///
/// Only applications owned by `user` count towards the repayment bonus.
pub fn compute_trust_score<'a, I>(user: &User, applications: I, weights: &TrustScoreWeights) -> u8
where
    I: IntoIterator<Item = &'a Application>,
{
    let mut score = weights.base;
    if user.is_bvn_verified {
        score = score.saturating_add(weights.bvn_verified);
    }
    if user.has_nin() {
        score = score.saturating_add(weights.nin_present);
    }
    let has_repaid = applications.into_iter().any(|application| {
        application.is_owned_by(&user.id) && application.status == LoanStatus::Repaid
    });
    if has_repaid {
        score = score.saturating_add(weights.repaid_loan);
    }

    score.clamp(0, i32::from(MAX_TRUST_SCORE)) as u8
}

pub fn loan_limit(score: u8, per_point: u64) -> u64 {
    u64::from(score).saturating_mul(per_point)
}

pub fn assess<'a, I>(user: &User, applications: I, config: &PortalConfig) -> TrustAssessment
where
    I: IntoIterator<Item = &'a Application>,
{
    let score = compute_trust_score(user, applications, &config.trust_weights);
    TrustAssessment {
        score,
        loan_limit: loan_limit(score, config.loan_limit_per_point),
    }
}
