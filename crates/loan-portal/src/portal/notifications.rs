//! Notification fan-out and inbox read state.
//!
//! [`NotificationFanout::fan_out`] is a pure derivation from a [`PortalEvent`] and the current
//! snapshot to the set of notifications that event should create. The service materializes the
//! drafts inside the same transaction as the mutation that raised the event.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::config::MessageFanoutPolicy;
use super::domain::{
    Application, ApplicationId, LoanStatus, Notification, NotificationId, NotificationKind, User,
    UserId, UserRole,
};
use super::error::{EntityRef, PortalError};
use super::store::StoreSnapshot;

/// State changes that produce notifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortalEvent {
    ApplicationSubmitted {
        application_id: ApplicationId,
        actor_id: UserId,
    },
    StatusChanged {
        application_id: ApplicationId,
        actor_id: UserId,
        from: LoanStatus,
        to: LoanStatus,
    },
    MessageSent {
        application_id: ApplicationId,
        actor_id: UserId,
    },
}

impl PortalEvent {
    pub fn application_id(&self) -> &ApplicationId {
        match self {
            PortalEvent::ApplicationSubmitted { application_id, .. }
            | PortalEvent::StatusChanged { application_id, .. }
            | PortalEvent::MessageSent { application_id, .. } => application_id,
        }
    }

    pub fn actor_id(&self) -> &UserId {
        match self {
            PortalEvent::ApplicationSubmitted { actor_id, .. }
            | PortalEvent::StatusChanged { actor_id, .. }
            | PortalEvent::MessageSent { actor_id, .. } => actor_id,
        }
    }
}

/// A notification before it is assigned an id and timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationDraft {
    pub recipient: UserId,
    pub title: String,
    pub body: String,
    pub kind: NotificationKind,
    pub link: Option<ApplicationId>,
}

/// Recipient rules for each [`PortalEvent`].
#[derive(Debug, Clone, Copy, Default)]
pub struct NotificationFanout {
    policy: MessageFanoutPolicy,
}

impl NotificationFanout {
    pub fn new(policy: MessageFanoutPolicy) -> Self {
        Self { policy }
    }

    /// Derive the notifications `event` should create. The actor never receives one.
    pub fn fan_out(
        &self,
        event: &PortalEvent,
        snapshot: &StoreSnapshot,
    ) -> Result<Vec<NotificationDraft>, PortalError> {
        let application_id = event.application_id();
        let application = snapshot
            .application(application_id)
            .ok_or_else(|| PortalError::NotFound(EntityRef::Application(application_id.clone())))?;
        let actor = snapshot
            .user(event.actor_id())
            .ok_or_else(|| PortalError::NotFound(EntityRef::User(event.actor_id().clone())))?;

        let drafts: Vec<NotificationDraft> = match event {
            PortalEvent::ApplicationSubmitted { .. } => staff(snapshot)
                .map(|recipient| NotificationDraft {
                    recipient: recipient.id.clone(),
                    title: "New Application Submitted".to_string(),
                    body: format!(
                        "{} submitted an application for \"{}\".",
                        application.applicant_name, application.business_name
                    ),
                    kind: NotificationKind::NewApplication,
                    link: Some(application.id.clone()),
                })
                .collect(),
            PortalEvent::StatusChanged { to, .. } => vec![NotificationDraft {
                recipient: application.user_id.clone(),
                title: "Application Status Updated".to_string(),
                body: format!(
                    "Your application for \"{}\" is now {}.",
                    application.business_name, to
                ),
                kind: NotificationKind::StatusUpdate,
                link: Some(application.id.clone()),
            }],
            PortalEvent::MessageSent { .. } if application.is_owned_by(&actor.id) => self
                .message_recipients(snapshot)
                .into_iter()
                .map(|recipient| NotificationDraft {
                    recipient: recipient.id.clone(),
                    title: format!("New Message on {}", application.id),
                    body: format!(
                        "{} sent a message regarding \"{}\".",
                        actor.name, application.business_name
                    ),
                    kind: NotificationKind::Message,
                    link: Some(application.id.clone()),
                })
                .collect(),
            PortalEvent::MessageSent { .. } => vec![message_to_owner(application, actor)],
        };

        Ok(drafts
            .into_iter()
            .filter(|draft| &draft.recipient != event.actor_id())
            .collect())
    }

    fn message_recipients<'a>(&self, snapshot: &'a StoreSnapshot) -> Vec<&'a User> {
        match self.policy {
            MessageFanoutPolicy::AllStaff => staff(snapshot).collect(),
            MessageFanoutPolicy::FirstOfficer => snapshot
                .users()
                .find(|user| user.role == UserRole::Officer)
                .or_else(|| snapshot.users().find(|user| user.role == UserRole::Admin))
                .into_iter()
                .collect(),
        }
    }
}

fn staff(snapshot: &StoreSnapshot) -> impl Iterator<Item = &User> {
    snapshot.users().filter(|user| user.role.is_staff())
}

fn message_to_owner(application: &Application, sender: &User) -> NotificationDraft {
    NotificationDraft {
        recipient: application.user_id.clone(),
        title: format!("New Message from {}", sender.role),
        body: format!(
            "You have a new message regarding your application for \"{}\".",
            application.business_name
        ),
        kind: NotificationKind::Message,
        link: Some(application.id.clone()),
    }
}

/// Turn drafts into unread notifications inside `draft`, returning their ids.
pub(crate) fn materialize(
    draft: &mut StoreSnapshot,
    drafts: Vec<NotificationDraft>,
    now: DateTime<Utc>,
) -> Vec<NotificationId> {
    drafts
        .into_iter()
        .map(|pending| {
            let id = draft.next_notification_id();
            draft.append_notification(Notification {
                id: id.clone(),
                user_id: pending.recipient,
                title: pending.title,
                body: pending.body,
                created_at: now,
                is_read: false,
                link: pending.link,
                kind: pending.kind,
            });
            id
        })
        .collect()
}

/// Flag one notification as read. Returns whether the flag changed; re-marking is a no-op.
pub(crate) fn mark_read(
    draft: &mut StoreSnapshot,
    id: &NotificationId,
    reader: &User,
) -> Result<bool, PortalError> {
    let owner = draft
        .notification(id)
        .map(|notification| notification.user_id.clone())
        .ok_or_else(|| PortalError::NotFound(EntityRef::Notification(id.clone())))?;
    if owner != reader.id {
        return Err(PortalError::unauthorized(
            "read another user's notification",
            reader.role,
        ));
    }

    match draft.notification_mut(id) {
        Some(notification) if !notification.is_read => {
            notification.is_read = true;
            Ok(true)
        }
        _ => Ok(false),
    }
}

/// Flag every notification addressed to `user_id` as read, returning how many changed.
pub(crate) fn mark_all_read(draft: &mut StoreSnapshot, user_id: &UserId) -> usize {
    let mut changed = 0;
    draft.for_each_notification_mut(|notification| {
        if &notification.user_id == user_id && !notification.is_read {
            notification.is_read = true;
            changed += 1;
        }
    });
    changed
}
