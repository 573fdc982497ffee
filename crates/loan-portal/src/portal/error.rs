use std::fmt;

use super::domain::{ApplicationId, LoanStatus, NotificationId, UserId, UserRole};

/// Failure raised by a portal operation. A failed call never leaves partial state behind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PortalError {
    #[error("cannot move application from {from} to {to}")]
    InvalidTransition { from: LoanStatus, to: LoanStatus },
    #[error("{role} is not permitted to {action}")]
    Unauthorized { action: &'static str, role: UserRole },
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{0} not found")]
    NotFound(EntityRef),
}

impl PortalError {
    pub(crate) fn unauthorized(action: &'static str, role: UserRole) -> Self {
        Self::Unauthorized { action, role }
    }
}

/// Malformed input rejected at the boundary before any mutation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("message content must not be empty")]
    EmptyMessage,
    #[error("account number must be exactly 10 digits")]
    InvalidAccountNumber,
    #[error("NIN must be exactly 11 digits")]
    InvalidNin,
    #[error("an account already exists for {0}")]
    DuplicateEmail(String),
    #[error("loan amount must be greater than zero")]
    NonPositiveAmount,
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("requested amount {requested} exceeds the pre-qualified limit of {limit}")]
    LoanLimitExceeded { requested: u64, limit: u64 },
}

/// Entity a lookup failed to resolve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityRef {
    User(UserId),
    Email(String),
    Application(ApplicationId),
    Notification(NotificationId),
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityRef::User(id) => write!(f, "user {id}"),
            EntityRef::Email(email) => write!(f, "user with email {email}"),
            EntityRef::Application(id) => write!(f, "application {id}"),
            EntityRef::Notification(id) => write!(f, "notification {id}"),
        }
    }
}
