//! Advisory risk read-out shown next to an application for reviewing officers.
//!
//! The analysis is a deterministic heuristic over the application's own fields. It never touches
//! the store and has no bearing on the status lifecycle.

use serde::Serialize;

use super::domain::{Application, BusinessSector};

const LARGE_LOAN_THRESHOLD: u64 = 1_000_000;
const SMALL_LOAN_THRESHOLD: u64 = 300_000;
const DETAILED_DESCRIPTION_CHARS: usize = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub const fn label(self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RiskAnalysis {
    pub summary: String,
    pub strengths: Vec<String>,
    pub risks: Vec<String>,
    pub risk_level: RiskLevel,
}

pub fn analyze_application(application: &Application) -> RiskAnalysis {
    let mut strengths = Vec::new();
    let mut risks = Vec::new();
    let mut risk_points: i8 = 0;

    match application.loan_amount {
        amount if amount > LARGE_LOAN_THRESHOLD => {
            risks.push(format!(
                "requested amount of ₦{amount} is large for a small business"
            ));
            risk_points += 2;
        }
        amount if amount <= SMALL_LOAN_THRESHOLD => {
            strengths.push(format!("modest request of ₦{amount} limits exposure"));
            risk_points -= 1;
        }
        _ => {}
    }

    match application.documents.len() {
        0 => {
            risks.push("no supporting documents were submitted".to_string());
            risk_points += 2;
        }
        1 => {
            risks.push("only one supporting document on file".to_string());
            risk_points += 1;
        }
        count => strengths.push(format!("{count} supporting documents on file")),
    }

    if application.business_description.trim().chars().count() >= DETAILED_DESCRIPTION_CHARS {
        strengths.push("business description is reasonably detailed".to_string());
    } else {
        risks.push("business description lacks detail".to_string());
        risk_points += 1;
    }

    match application.sector {
        BusinessSector::Agriculture => {
            strengths.push("agriculture is a priority sector for the local economy".to_string());
            risks.push("agricultural yields are exposed to seasonal weather".to_string());
        }
        BusinessSector::Technology => {
            strengths.push("technology services have strong growth potential".to_string());
        }
        BusinessSector::Retail | BusinessSector::Services => {
            risks.push("operates in a highly competitive local market".to_string());
            risk_points += 1;
        }
        BusinessSector::Manufacturing | BusinessSector::Healthcare => {
            strengths.push("sector has steady local demand".to_string());
        }
    }

    if application.bank_details.is_some() {
        strengths.push("disbursement account details provided".to_string());
    }

    let risk_level = match risk_points {
        points if points >= 3 => RiskLevel::High,
        points if points >= 1 => RiskLevel::Medium,
        _ => RiskLevel::Low,
    };

    let summary = format!(
        "{} ({}) requests ₦{} in the {} sector. Stated purpose: {}. Overall risk: {}.",
        application.business_name,
        application.applicant_name,
        application.loan_amount,
        application.sector.label(),
        application.loan_purpose.trim().trim_end_matches('.'),
        risk_level.label(),
    );

    RiskAnalysis {
        summary,
        strengths,
        risks,
        risk_level,
    }
}
