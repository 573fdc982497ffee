use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use super::analysis::{analyze_application, RiskAnalysis};
use super::clock::{Clock, SystemClock};
use super::config::PortalConfig;
use super::domain::{
    Application, ApplicationId, ApplicationSubmission, BankDetails, LoanStatus, Message,
    Notification, NotificationId, ProfileUpdate, RegistrationForm, User, UserId, UserRole,
};
use super::error::{EntityRef, PortalError, ValidationError};
use super::messaging::append_message;
use super::notifications::{self, NotificationFanout, PortalEvent};
use super::store::{EntityStore, StoreSnapshot};
use super::transitions::apply_transition;
use super::trust::{self, TrustAssessment};
use super::views::{self, Dashboard};

const ACCOUNT_NUMBER_DIGITS: usize = 10;
const NIN_DIGITS: usize = 11;

/// Facade over the entity store that applies every portal operation atomically.
///
/// Each mutating call runs inside one [`EntityStore::transact`] so the entity change and the
/// notifications it fans out are published together, or not at all.
pub struct LoanPortalService {
    store: Arc<EntityStore>,
    fanout: NotificationFanout,
    config: PortalConfig,
    clock: Arc<dyn Clock>,
}

impl LoanPortalService {
    pub fn new(store: Arc<EntityStore>, config: PortalConfig) -> Self {
        Self::with_clock(store, config, Arc::new(SystemClock))
    }

    pub fn with_clock(
        store: Arc<EntityStore>,
        config: PortalConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let fanout = NotificationFanout::new(config.message_fanout);
        Self {
            store,
            fanout,
            config,
            clock,
        }
    }

    pub fn store(&self) -> &Arc<EntityStore> {
        &self.store
    }

    pub fn config(&self) -> &PortalConfig {
        &self.config
    }

    /// Identity stub: resolve a user by e-mail address. No credential is checked.
    pub fn login(&self, email: &str) -> Result<User, PortalError> {
        let snapshot = self.store.snapshot();
        let user = snapshot
            .user_by_email(email)
            .cloned()
            .ok_or_else(|| PortalError::NotFound(EntityRef::Email(email.trim().to_string())))?;
        debug!(user_id = %user.id, "user signed in");
        Ok(user)
    }

    pub fn user(&self, id: &UserId) -> Result<User, PortalError> {
        let snapshot = self.store.snapshot();
        resolve_user(&snapshot, id).cloned()
    }

    /// Create a new applicant account.
    pub fn register(&self, form: RegistrationForm) -> Result<User, PortalError> {
        let name = required(&form.name, "name")?;
        let email = required(&form.email, "email")?;
        let nin = normalize_nin(form.nin.as_deref())?;
        let ward = form
            .ward
            .map(|ward| ward.trim().to_string())
            .filter(|ward| !ward.is_empty());

        let user = self.store.transact(|draft| -> Result<User, PortalError> {
            if draft.user_by_email(&email).is_some() {
                return Err(PortalError::from(ValidationError::DuplicateEmail(email.clone())));
            }
            let user = User {
                id: draft.next_user_id(),
                name,
                email,
                role: UserRole::Applicant,
                ward,
                nin,
                is_bvn_verified: false,
                profile_picture_url: None,
            };
            draft.upsert_user(user.clone());
            Ok(user)
        })?;

        info!(user_id = %user.id, "applicant registered");
        Ok(user)
    }

    /// Edit a profile. Only the profile's owner or an admin may do so.
    pub fn update_profile(
        &self,
        actor: &User,
        user_id: &UserId,
        update: ProfileUpdate,
    ) -> Result<User, PortalError> {
        let user = self.store.transact(|draft| -> Result<User, PortalError> {
            let actor = resolve_user(draft, &actor.id)?.clone();
            let mut user = resolve_user(draft, user_id)?.clone();
            ensure_self_or_admin(&actor, &user, "edit another user's profile")?;

            if let Some(name) = update.name.as_deref() {
                user.name = required(name, "name")?;
            }
            if let Some(ward) = update.ward.as_deref() {
                let ward = ward.trim();
                user.ward = (!ward.is_empty()).then(|| ward.to_string());
            }
            if let Some(nin) = update.nin.as_deref() {
                user.nin = normalize_nin(Some(nin))?;
            }
            if let Some(url) = update.profile_picture_url.as_deref() {
                let url = url.trim();
                user.profile_picture_url = (!url.is_empty()).then(|| url.to_string());
            }

            draft.upsert_user(user.clone());
            Ok(user)
        })?;

        info!(user_id = %user.id, actor_id = %actor.id, "profile updated");
        Ok(user)
    }

    /// Mark the user's BVN as verified. Re-verifying is a no-op and nobody is notified.
    pub fn verify_bvn(&self, actor: &User, user_id: &UserId) -> Result<User, PortalError> {
        let user = self.store.transact(|draft| -> Result<User, PortalError> {
            let actor = resolve_user(draft, &actor.id)?.clone();
            let mut user = resolve_user(draft, user_id)?.clone();
            ensure_self_or_admin(&actor, &user, "verify another user's BVN")?;
            if !user.is_bvn_verified {
                user.is_bvn_verified = true;
                draft.upsert_user(user.clone());
            }
            Ok(user)
        })?;

        info!(user_id = %user.id, "bvn verified");
        Ok(user)
    }

    /// File a new loan request for `owner` and notify every officer and admin.
    pub fn submit_application(
        &self,
        owner: &User,
        submission: ApplicationSubmission,
    ) -> Result<Application, PortalError> {
        let business_name = required(&submission.business_name, "business_name")?;
        let loan_purpose = required(&submission.loan_purpose, "loan_purpose")?;
        if submission.loan_amount == 0 {
            return Err(ValidationError::NonPositiveAmount.into());
        }
        let bank_details = submission
            .bank_details
            .map(normalize_bank_details)
            .transpose()?;

        let now = self.clock.now();
        let (application, notified) = self.store.transact(|draft| -> Result<_, PortalError> {
            let owner = resolve_user(draft, &owner.id)?.clone();
            if owner.role != UserRole::Applicant {
                return Err(PortalError::unauthorized("submit a loan application", owner.role));
            }

            if self.config.enforce_loan_limit {
                let assessment = trust::assess(&owner, draft.applications(), &self.config);
                if submission.loan_amount > assessment.loan_limit {
                    return Err(ValidationError::LoanLimitExceeded {
                        requested: submission.loan_amount,
                        limit: assessment.loan_limit,
                    }
                    .into());
                }
            }

            let application = Application {
                id: draft.next_application_id(),
                user_id: owner.id.clone(),
                applicant_name: owner.name.clone(),
                business_name,
                sector: submission.sector,
                loan_amount: submission.loan_amount,
                loan_purpose,
                business_description: submission.business_description.trim().to_string(),
                application_date: now.date_naive(),
                status: LoanStatus::Pending,
                documents: submission.documents,
                bank_details,
                messages: Vec::new(),
            };
            draft.upsert_application(application.clone());

            let event = PortalEvent::ApplicationSubmitted {
                application_id: application.id.clone(),
                actor_id: owner.id,
            };
            let notified = self.emit(draft, &event, now)?;
            Ok((application, notified))
        })?;

        info!(
            application_id = %application.id,
            user_id = %application.user_id,
            amount = application.loan_amount,
            notified,
            "application submitted"
        );
        Ok(application)
    }

    /// Move an application along the status graph and notify its owner.
    pub fn transition_status(
        &self,
        application_id: &ApplicationId,
        target: LoanStatus,
        actor: &User,
    ) -> Result<Application, PortalError> {
        let now = self.clock.now();
        let outcome = self.store.transact(|draft| -> Result<_, PortalError> {
            let actor = resolve_user(draft, &actor.id)?.clone();
            let mut application = resolve_application(draft, application_id)?.clone();
            let previous = apply_transition(&mut application, target, &actor)?;
            draft.upsert_application(application.clone());

            let event = PortalEvent::StatusChanged {
                application_id: application.id.clone(),
                actor_id: actor.id,
                from: previous,
                to: target,
            };
            self.emit(draft, &event, now)?;
            Ok((application, previous))
        });

        match outcome {
            Ok((application, previous)) => {
                info!(
                    application_id = %application.id,
                    from = %previous,
                    to = %application.status,
                    actor_id = %actor.id,
                    "application status changed"
                );
                Ok(application)
            }
            Err(err) => {
                warn!(
                    application_id = %application_id,
                    to = %target,
                    error = %err,
                    "status change rejected"
                );
                Err(err)
            }
        }
    }

    /// Terminal step for a disbursed loan.
    pub fn mark_repaid(
        &self,
        application_id: &ApplicationId,
        actor: &User,
    ) -> Result<Application, PortalError> {
        self.transition_status(application_id, LoanStatus::Repaid, actor)
    }

    /// Append `content` to the application's thread and notify the other party.
    pub fn send_message(
        &self,
        application_id: &ApplicationId,
        sender: &User,
        content: &str,
    ) -> Result<Message, PortalError> {
        if content.trim().is_empty() {
            return Err(ValidationError::EmptyMessage.into());
        }

        let now = self.clock.now();
        let (message, notified) = self.store.transact(|draft| -> Result<_, PortalError> {
            let sender = resolve_user(draft, &sender.id)?.clone();
            let mut application = resolve_application(draft, application_id)?.clone();
            let id = draft.next_message_id();
            let message = append_message(&mut application, &sender, content, id, now)?;
            draft.upsert_application(application);

            let event = PortalEvent::MessageSent {
                application_id: application_id.clone(),
                actor_id: sender.id,
            };
            let notified = self.emit(draft, &event, now)?;
            Ok((message, notified))
        })?;

        info!(
            application_id = %application_id,
            message_id = %message.id,
            sender_id = %message.sender_id,
            notified,
            "message sent"
        );
        Ok(message)
    }

    /// Set disbursement details. Only the owning applicant may do so.
    pub fn update_bank_details(
        &self,
        actor: &User,
        application_id: &ApplicationId,
        details: BankDetails,
    ) -> Result<Application, PortalError> {
        let details = normalize_bank_details(details)?;

        let application = self.store.transact(|draft| -> Result<Application, PortalError> {
            let actor = resolve_user(draft, &actor.id)?.clone();
            let mut application = resolve_application(draft, application_id)?.clone();
            if !application.is_owned_by(&actor.id) {
                return Err(PortalError::unauthorized(
                    "change another applicant's bank details",
                    actor.role,
                ));
            }
            application.bank_details = Some(details);
            draft.upsert_application(application.clone());
            Ok(application)
        })?;

        info!(application_id = %application.id, "bank details updated");
        Ok(application)
    }

    /// Mark one of `reader`'s notifications as read. Idempotent.
    pub fn mark_read(
        &self,
        notification_id: &NotificationId,
        reader: &User,
    ) -> Result<(), PortalError> {
        let changed = self.store.transact(|draft| -> Result<bool, PortalError> {
            let reader = resolve_user(draft, &reader.id)?.clone();
            notifications::mark_read(draft, notification_id, &reader)
        })?;
        debug!(notification_id = %notification_id, changed, "notification marked read");
        Ok(())
    }

    /// Mark every notification addressed to `user_id` as read, returning how many changed.
    pub fn mark_all_read(&self, user_id: &UserId) -> Result<usize, PortalError> {
        let changed = self.store.transact(|draft| -> Result<usize, PortalError> {
            resolve_user(draft, user_id)?;
            Ok(notifications::mark_all_read(draft, user_id))
        })?;
        debug!(user_id = %user_id, changed, "notifications marked read");
        Ok(changed)
    }

    pub fn trust_score(&self, user_id: &UserId) -> Result<TrustAssessment, PortalError> {
        let snapshot = self.store.snapshot();
        let user = resolve_user(&snapshot, user_id)?;
        Ok(trust::assess(user, snapshot.applications_of(user_id), &self.config))
    }

    pub fn visible_applications(&self, actor: &User) -> Vec<Application> {
        let snapshot = self.store.snapshot();
        views::visible_applications(snapshot.applications(), actor)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Visible applications filtered by applicant or business name.
    pub fn search_applications(&self, actor: &User, term: &str) -> Vec<Application> {
        let snapshot = self.store.snapshot();
        let visible = views::visible_applications(snapshot.applications(), actor);
        views::search_applications(visible, term)
            .into_iter()
            .cloned()
            .collect()
    }

    /// One application, hidden from applicants who do not own it.
    pub fn application_for(
        &self,
        actor: &User,
        application_id: &ApplicationId,
    ) -> Result<Application, PortalError> {
        let snapshot = self.store.snapshot();
        views::visible_applications(snapshot.application(application_id), actor)
            .into_iter()
            .next()
            .cloned()
            .ok_or_else(|| PortalError::NotFound(EntityRef::Application(application_id.clone())))
    }

    pub fn visible_notifications(&self, actor: &User) -> Vec<Notification> {
        let snapshot = self.store.snapshot();
        views::visible_notifications(snapshot.notifications(), actor)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn unread_count(&self, actor: &User) -> usize {
        views::unread_count(self.store.snapshot().notifications(), actor)
    }

    pub fn visible_users(&self, actor: &User) -> Vec<User> {
        let snapshot = self.store.snapshot();
        views::visible_users(snapshot.users(), actor)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn dashboard(&self, actor: &User) -> Dashboard {
        let snapshot = self.store.snapshot();
        views::dashboard(snapshot.applications(), snapshot.notifications(), actor)
    }

    /// Advisory risk read-out for reviewers. Read-only.
    pub fn analyze(
        &self,
        actor: &User,
        application_id: &ApplicationId,
    ) -> Result<RiskAnalysis, PortalError> {
        if !actor.role.is_staff() {
            return Err(PortalError::unauthorized("view risk analysis", actor.role));
        }
        let application = self.application_for(actor, application_id)?;
        Ok(analyze_application(&application))
    }

    fn emit(
        &self,
        draft: &mut StoreSnapshot,
        event: &PortalEvent,
        now: DateTime<Utc>,
    ) -> Result<usize, PortalError> {
        let drafts = self.fanout.fan_out(event, draft)?;
        Ok(notifications::materialize(draft, drafts, now).len())
    }
}

fn resolve_user<'a>(snapshot: &'a StoreSnapshot, id: &UserId) -> Result<&'a User, PortalError> {
    snapshot
        .user(id)
        .ok_or_else(|| PortalError::NotFound(EntityRef::User(id.clone())))
}

fn resolve_application<'a>(
    snapshot: &'a StoreSnapshot,
    id: &ApplicationId,
) -> Result<&'a Application, PortalError> {
    snapshot
        .application(id)
        .ok_or_else(|| PortalError::NotFound(EntityRef::Application(id.clone())))
}

fn ensure_self_or_admin(
    actor: &User,
    subject: &User,
    action: &'static str,
) -> Result<(), PortalError> {
    if actor.id == subject.id || actor.role == UserRole::Admin {
        Ok(())
    } else {
        Err(PortalError::unauthorized(action, actor.role))
    }
}

fn required(value: &str, field: &'static str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(ValidationError::MissingField(field))
    } else {
        Ok(trimmed.to_string())
    }
}

fn is_digits(value: &str, len: usize) -> bool {
    value.len() == len && value.bytes().all(|byte| byte.is_ascii_digit())
}

/// Trimmed copy of `details` with both names present and a ten-digit account number.
fn normalize_bank_details(details: BankDetails) -> Result<BankDetails, ValidationError> {
    let bank_name = required(&details.bank_name, "bank_name")?;
    let account_name = required(&details.account_name, "account_name")?;
    let account_number = details.account_number.trim();
    if !is_digits(account_number, ACCOUNT_NUMBER_DIGITS) {
        return Err(ValidationError::InvalidAccountNumber);
    }
    Ok(BankDetails {
        bank_name,
        account_name,
        account_number: account_number.to_string(),
    })
}

/// Blank clears the NIN; anything else must be exactly eleven digits.
fn normalize_nin(raw: Option<&str>) -> Result<Option<String>, ValidationError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(nin) if is_digits(nin, NIN_DIGITS) => Ok(Some(nin.to_string())),
        Some(_) => Err(ValidationError::InvalidNin),
    }
}
