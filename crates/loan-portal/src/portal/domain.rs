use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

string_id!(
    /// Identifier wrapper for portal users.
    UserId
);
string_id!(
    /// Identifier wrapper for loan applications (`APP-001`).
    ApplicationId
);
string_id!(MessageId);
string_id!(NotificationId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UserRole {
    Admin,
    #[serde(rename = "Loan Officer", alias = "Officer")]
    Officer,
    Applicant,
}

impl UserRole {
    pub const fn label(self) -> &'static str {
        match self {
            UserRole::Admin => "Admin",
            UserRole::Officer => "Loan Officer",
            UserRole::Applicant => "Applicant",
        }
    }

    /// Admins and officers review applications and decide on them.
    pub const fn is_staff(self) -> bool {
        matches!(self, UserRole::Admin | UserRole::Officer)
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Identity record for everyone who signs in to the portal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ward: Option<String>,
    /// National identification number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nin: Option<String>,
    #[serde(default)]
    pub is_bvn_verified: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_picture_url: Option<String>,
}

impl User {
    pub fn has_nin(&self) -> bool {
        self.nin
            .as_deref()
            .map(|nin| !nin.trim().is_empty())
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LoanStatus {
    Pending,
    Approved,
    Rejected,
    Disbursed,
    Repaid,
}

impl LoanStatus {
    pub const ALL: [LoanStatus; 5] = [
        LoanStatus::Pending,
        LoanStatus::Approved,
        LoanStatus::Rejected,
        LoanStatus::Disbursed,
        LoanStatus::Repaid,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            LoanStatus::Pending => "Pending",
            LoanStatus::Approved => "Approved",
            LoanStatus::Rejected => "Rejected",
            LoanStatus::Disbursed => "Disbursed",
            LoanStatus::Repaid => "Repaid",
        }
    }
}

impl fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BusinessSector {
    Retail,
    Technology,
    Agriculture,
    Manufacturing,
    Services,
    Healthcare,
}

impl BusinessSector {
    pub const ALL: [BusinessSector; 6] = [
        BusinessSector::Retail,
        BusinessSector::Technology,
        BusinessSector::Agriculture,
        BusinessSector::Manufacturing,
        BusinessSector::Services,
        BusinessSector::Healthcare,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            BusinessSector::Retail => "Retail",
            BusinessSector::Technology => "Technology",
            BusinessSector::Agriculture => "Agriculture",
            BusinessSector::Manufacturing => "Manufacturing",
            BusinessSector::Services => "Services",
            BusinessSector::Healthcare => "Healthcare",
        }
    }
}

/// Opaque reference handed back by the document storage stub.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRef {
    pub name: String,
    pub url: String,
}

/// Disbursement account for an approved loan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankDetails {
    pub bank_name: String,
    pub account_name: String,
    /// Ten-digit NUBAN account number.
    pub account_number: String,
}

/// One entry in an application's conversation thread. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub sender_id: UserId,
    pub sender_name: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// A loan request together with its disbursement details and message thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub id: ApplicationId,
    pub user_id: UserId,
    pub applicant_name: String,
    pub business_name: String,
    pub sector: BusinessSector,
    pub loan_amount: u64,
    pub loan_purpose: String,
    pub business_description: String,
    pub application_date: NaiveDate,
    pub status: LoanStatus,
    #[serde(default)]
    pub documents: Vec<DocumentRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bank_details: Option<BankDetails>,
    #[serde(default)]
    pub messages: Vec<Message>,
}

impl Application {
    pub fn is_owned_by(&self, user_id: &UserId) -> bool {
        &self.user_id == user_id
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }
}

/// Applicant supplied fields for a new loan request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationSubmission {
    pub business_name: String,
    pub sector: BusinessSector,
    pub loan_amount: u64,
    pub loan_purpose: String,
    pub business_description: String,
    #[serde(default)]
    pub documents: Vec<DocumentRef>,
    #[serde(default)]
    pub bank_details: Option<BankDetails>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    NewApplication,
    StatusUpdate,
    Message,
}

impl NotificationKind {
    pub const fn label(self) -> &'static str {
        match self {
            NotificationKind::NewApplication => "new_application",
            NotificationKind::StatusUpdate => "status_update",
            NotificationKind::Message => "message",
        }
    }
}

/// Inbox entry addressed to exactly one user. Only `is_read` ever changes after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub user_id: UserId,
    pub title: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub is_read: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<ApplicationId>,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
}

/// Self-service sign-up payload. New accounts are always applicants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationForm {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub ward: Option<String>,
    #[serde(default)]
    pub nin: Option<String>,
}

/// Profile edit; `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub ward: Option<String>,
    #[serde(default)]
    pub nin: Option<String>,
    #[serde(default)]
    pub profile_picture_url: Option<String>,
}
