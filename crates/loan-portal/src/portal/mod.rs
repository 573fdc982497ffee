//! Loan application lifecycle and the messaging/notification engine around it.
//!
//! Every mutation flows through [`LoanPortalService`], which applies it to the [`EntityStore`] as a
//! single all-or-nothing transaction together with the notifications the fan-out rules derive from
//! it. Trust scoring and the role-scoped views are pure reads over a store snapshot.

pub mod analysis;
pub mod clock;
pub mod config;
pub mod domain;
mod error;
pub mod messaging;
pub mod notifications;
pub mod router;
pub mod seed;
pub mod service;
pub mod store;
pub mod transitions;
pub mod trust;
pub mod views;

#[cfg(test)]
mod tests;

pub use analysis::{analyze_application, RiskAnalysis, RiskLevel};
pub use clock::{Clock, SystemClock};
pub use config::{MessageFanoutPolicy, PortalConfig, TrustScoreWeights};
pub use domain::{
    Application, ApplicationId, ApplicationSubmission, BankDetails, BusinessSector, DocumentRef,
    LoanStatus, Message, MessageId, Notification, NotificationId, NotificationKind,
    ProfileUpdate, RegistrationForm, User, UserId, UserRole,
};
pub use error::{EntityRef, PortalError, ValidationError};
pub use notifications::{NotificationDraft, NotificationFanout, PortalEvent};
pub use router::portal_router;
pub use service::LoanPortalService;
pub use store::{EntityStore, StoreSnapshot};
pub use trust::TrustAssessment;
pub use views::{Dashboard, PortfolioSummary};
