//! Role-scoped read projections. Everything here is a pure filter over its inputs and is meant to
//! be re-evaluated against the latest snapshot on every request.

use serde::Serialize;

use super::domain::{Application, BusinessSector, LoanStatus, Notification, User, UserRole};

/// Applications `actor` may see: their own for applicants, everything for staff.
pub fn visible_applications<'a, I>(applications: I, actor: &User) -> Vec<&'a Application>
where
    I: IntoIterator<Item = &'a Application>,
{
    applications
        .into_iter()
        .filter(|application| actor.role.is_staff() || application.is_owned_by(&actor.id))
        .collect()
}

/// Keep applications whose applicant or business name contains `term`, ignoring case.
/// A blank term keeps everything.
pub fn search_applications<'a, I>(applications: I, term: &str) -> Vec<&'a Application>
where
    I: IntoIterator<Item = &'a Application>,
{
    let needle = term.trim().to_lowercase();
    applications
        .into_iter()
        .filter(|application| {
            needle.is_empty()
                || application.applicant_name.to_lowercase().contains(&needle)
                || application.business_name.to_lowercase().contains(&needle)
        })
        .collect()
}

/// Notifications addressed to `actor`, newest first.
pub fn visible_notifications<'a, I>(notifications: I, actor: &User) -> Vec<&'a Notification>
where
    I: IntoIterator<Item = &'a Notification>,
{
    let mut inbox: Vec<&Notification> = notifications
        .into_iter()
        .filter(|notification| notification.user_id == actor.id)
        .collect();
    inbox.sort_by(|left, right| right.created_at.cmp(&left.created_at));
    inbox
}

pub fn unread_count<'a, I>(notifications: I, actor: &User) -> usize
where
    I: IntoIterator<Item = &'a Notification>,
{
    notifications
        .into_iter()
        .filter(|notification| notification.user_id == actor.id && !notification.is_read)
        .count()
}

/// Directory entries `actor` may list.
pub fn visible_users<'a, I>(users: I, actor: &User) -> Vec<&'a User>
where
    I: IntoIterator<Item = &'a User>,
{
    users
        .into_iter()
        .filter(|user| match actor.role {
            UserRole::Admin => true,
            UserRole::Officer => user.role == UserRole::Applicant || user.id == actor.id,
            UserRole::Applicant => user.id == actor.id,
        })
        .collect()
}

/// Percentage of identity checks completed: NIN on file and BVN verified, half each.
pub fn profile_completion(user: &User) -> u8 {
    let mut completion = 0;
    if user.has_nin() {
        completion += 50;
    }
    if user.is_bvn_verified {
        completion += 50;
    }
    completion
}

/// The applicant's loan currently out for repayment, if any.
pub fn active_loan<'a, I>(applications: I, applicant: &User) -> Option<&'a Application>
where
    I: IntoIterator<Item = &'a Application>,
{
    applications.into_iter().find(|application| {
        application.is_owned_by(&applicant.id) && application.status == LoanStatus::Disbursed
    })
}

/// The `limit` most recently submitted applications.
pub fn recent_applications<'a>(
    applications: &[&'a Application],
    limit: usize,
) -> Vec<&'a Application> {
    let mut recent = applications.to_vec();
    recent.sort_by(|left, right| right.application_date.cmp(&left.application_date));
    recent.truncate(limit);
    recent
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusCountEntry {
    pub status: LoanStatus,
    pub status_label: &'static str,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SectorCountEntry {
    pub sector: BusinessSector,
    pub sector_label: &'static str,
    pub count: usize,
}

/// Dashboard roll-up of a set of applications.
#[derive(Debug, Clone, Serialize)]
pub struct PortfolioSummary {
    pub total_applications: usize,
    /// Sum requested across loans that have been paid out (Disbursed or Repaid).
    pub total_disbursed: u64,
    pub pending: usize,
    pub approved: usize,
    pub status_counts: Vec<StatusCountEntry>,
    pub sector_counts: Vec<SectorCountEntry>,
}

pub fn portfolio_summary(applications: &[&Application]) -> PortfolioSummary {
    let count_status = |status: LoanStatus| {
        applications
            .iter()
            .filter(|application| application.status == status)
            .count()
    };

    let total_disbursed = applications
        .iter()
        .filter(|application| {
            matches!(application.status, LoanStatus::Disbursed | LoanStatus::Repaid)
        })
        .map(|application| application.loan_amount)
        .fold(0u64, u64::saturating_add);

    let status_counts = LoanStatus::ALL
        .into_iter()
        .map(|status| StatusCountEntry {
            status,
            status_label: status.label(),
            count: count_status(status),
        })
        .filter(|entry| entry.count > 0)
        .collect();

    let sector_counts = BusinessSector::ALL
        .into_iter()
        .map(|sector| SectorCountEntry {
            sector,
            sector_label: sector.label(),
            count: applications
                .iter()
                .filter(|application| application.sector == sector)
                .count(),
        })
        .filter(|entry| entry.count > 0)
        .collect();

    PortfolioSummary {
        total_applications: applications.len(),
        total_disbursed,
        pending: count_status(LoanStatus::Pending),
        approved: count_status(LoanStatus::Approved),
        status_counts,
        sector_counts,
    }
}

const RECENT_APPLICATIONS: usize = 5;

/// Everything the landing page shows for one user.
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub summary: PortfolioSummary,
    pub recent_applications: Vec<Application>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_loan: Option<Application>,
    pub unread_notifications: usize,
    pub profile_completion: u8,
}

pub fn dashboard<'a, A, N>(applications: A, notifications: N, actor: &User) -> Dashboard
where
    A: IntoIterator<Item = &'a Application>,
    N: IntoIterator<Item = &'a Notification>,
{
    let visible = visible_applications(applications, actor);
    let current_loan = match actor.role {
        UserRole::Applicant => active_loan(visible.iter().copied(), actor).cloned(),
        UserRole::Admin | UserRole::Officer => None,
    };

    Dashboard {
        summary: portfolio_summary(&visible),
        recent_applications: recent_applications(&visible, RECENT_APPLICATIONS)
            .into_iter()
            .cloned()
            .collect(),
        active_loan: current_loan,
        unread_notifications: unread_count(notifications, actor),
        profile_completion: profile_completion(actor),
    }
}
