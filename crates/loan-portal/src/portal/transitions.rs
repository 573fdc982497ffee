//! Loan status graph and the single writer of `Application::status`.

use super::domain::{Application, LoanStatus, User};
use super::error::PortalError;

impl LoanStatus {
    /// Statuses reachable in one step.
    pub const fn successors(self) -> &'static [LoanStatus] {
        match self {
            LoanStatus::Pending => &[LoanStatus::Approved, LoanStatus::Rejected],
            LoanStatus::Approved => &[LoanStatus::Disbursed],
            LoanStatus::Disbursed => &[LoanStatus::Repaid],
            LoanStatus::Rejected | LoanStatus::Repaid => &[],
        }
    }

    pub fn can_transition_to(self, target: LoanStatus) -> bool {
        self.successors().contains(&target)
    }

    pub const fn is_terminal(self) -> bool {
        self.successors().is_empty()
    }
}

/// Move `application` to `target` on behalf of `actor`, returning the previous status.
///
/// Only staff may change a status, and only along the graph in [`LoanStatus::successors`].
/// Nothing but `status` is touched; on error the application is left as it was.
pub fn apply_transition(
    application: &mut Application,
    target: LoanStatus,
    actor: &User,
) -> Result<LoanStatus, PortalError> {
    if !actor.role.is_staff() {
        return Err(PortalError::unauthorized("change an application status", actor.role));
    }

    let current = application.status;
    if !current.can_transition_to(target) {
        return Err(PortalError::InvalidTransition {
            from: current,
            to: target,
        });
    }

    application.status = target;
    Ok(current)
}
