//! Bundled demo data so a fresh process has users, applications, and an inbox to work with.

use serde::Deserialize;

use super::domain::{Application, Notification, User, UserRole};
use super::store::{EntityStore, StoreSnapshot};

const DEMO_SEED: &str = include_str!("../../fixtures/seed.json");

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("seed data is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("application {application} references unknown applicant {user}")]
    UnknownOwner { application: String, user: String },
    #[error("application {application} is owned by {user}, who is not an applicant")]
    OwnerNotApplicant { application: String, user: String },
    #[error("message {message} on {application} was sent by {user}, who may not post there")]
    InvalidSender {
        application: String,
        message: String,
        user: String,
    },
    #[error("notification {notification} is addressed to unknown user {user}")]
    UnknownRecipient { notification: String, user: String },
}

#[derive(Debug, Deserialize)]
struct SeedData {
    #[serde(default)]
    users: Vec<User>,
    #[serde(default)]
    applications: Vec<Application>,
    #[serde(default)]
    notifications: Vec<Notification>,
}

/// Parse and validate a seed document into a snapshot.
pub fn snapshot_from_json(raw: &str) -> Result<StoreSnapshot, SeedError> {
    let seed: SeedData = serde_json::from_str(raw)?;
    let mut snapshot = StoreSnapshot::default();
    for user in seed.users {
        snapshot.upsert_user(user);
    }

    for application in seed.applications {
        let owner = snapshot
            .user(&application.user_id)
            .ok_or_else(|| SeedError::UnknownOwner {
                application: application.id.to_string(),
                user: application.user_id.to_string(),
            })?;
        if owner.role != UserRole::Applicant {
            return Err(SeedError::OwnerNotApplicant {
                application: application.id.to_string(),
                user: owner.id.to_string(),
            });
        }
        for message in &application.messages {
            let permitted = snapshot
                .user(&message.sender_id)
                .map(|sender| sender.role.is_staff() || sender.id == application.user_id)
                .unwrap_or(false);
            if !permitted {
                return Err(SeedError::InvalidSender {
                    application: application.id.to_string(),
                    message: message.id.to_string(),
                    user: message.sender_id.to_string(),
                });
            }
        }
        snapshot.upsert_application(application);
    }

    for notification in seed.notifications {
        if snapshot.user(&notification.user_id).is_none() {
            return Err(SeedError::UnknownRecipient {
                notification: notification.id.to_string(),
                user: notification.user_id.to_string(),
            });
        }
        snapshot.append_notification(notification);
    }

    Ok(snapshot)
}

pub fn demo_snapshot() -> Result<StoreSnapshot, SeedError> {
    snapshot_from_json(DEMO_SEED)
}

impl EntityStore {
    /// Store pre-populated with the bundled demo users, applications, and notifications.
    pub fn seeded() -> Result<Self, SeedError> {
        Ok(Self::new(demo_snapshot()?))
    }
}
