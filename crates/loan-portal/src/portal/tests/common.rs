use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use serde_json::Value;

use crate::portal::clock::Clock;
use crate::portal::config::PortalConfig;
use crate::portal::domain::{
    Application, ApplicationId, ApplicationSubmission, BankDetails, BusinessSector, DocumentRef,
    LoanStatus, Notification, User, UserId, UserRole,
};
use crate::portal::service::LoanPortalService;
use crate::portal::store::{EntityStore, StoreSnapshot};

/// Clock the tests move by hand.
pub(super) struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub(super) fn starting_at(now: DateTime<Utc>) -> Arc<Self> {
        Arc::new(Self {
            now: Mutex::new(now),
        })
    }

    pub(super) fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().expect("clock mutex poisoned") = now;
    }

    pub(super) fn advance(&self, by: Duration) {
        let mut guard = self.now.lock().expect("clock mutex poisoned");
        *guard += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().expect("clock mutex poisoned")
    }
}

pub(super) fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 8, 1, 9, 0, 0)
        .single()
        .expect("valid timestamp")
}

fn user(id: &str, name: &str, email: &str, role: UserRole) -> User {
    User {
        id: UserId::from(id),
        name: name.to_string(),
        email: email.to_string(),
        role,
        ward: Some("Isu".to_string()),
        nin: None,
        is_bvn_verified: false,
        profile_picture_url: None,
    }
}

pub(super) fn admin() -> User {
    user("user-1", "Admin User", "admin@nwangele.gov.ng", UserRole::Admin)
}

pub(super) fn officer() -> User {
    user(
        "user-2",
        "Loan Officer",
        "officer@officer.nwangele.gov.ng",
        UserRole::Officer,
    )
}

pub(super) fn applicant() -> User {
    user("user-3", "Adaobi Ekwueme", "user@email.com", UserRole::Applicant)
}

pub(super) fn other_applicant() -> User {
    user("user-4", "Buchi Chukwu", "buchi@email.com", UserRole::Applicant)
}

pub(super) fn snapshot_with(users: impl IntoIterator<Item = User>) -> StoreSnapshot {
    let mut snapshot = StoreSnapshot::default();
    for user in users {
        snapshot.upsert_user(user);
    }
    snapshot
}

/// Admin, officer, and two applicants; no applications yet.
pub(super) fn portal_snapshot() -> StoreSnapshot {
    snapshot_with([admin(), officer(), applicant(), other_applicant()])
}

pub(super) fn build_service() -> (Arc<LoanPortalService>, Arc<EntityStore>, Arc<ManualClock>) {
    build_service_with(PortalConfig::default())
}

pub(super) fn build_service_with(
    config: PortalConfig,
) -> (Arc<LoanPortalService>, Arc<EntityStore>, Arc<ManualClock>) {
    let store = Arc::new(EntityStore::new(portal_snapshot()));
    let clock = ManualClock::starting_at(start_time());
    let service = Arc::new(LoanPortalService::with_clock(
        store.clone(),
        config,
        clock.clone(),
    ));
    (service, store, clock)
}

pub(super) fn bank_details() -> BankDetails {
    BankDetails {
        bank_name: "Zenith Bank".to_string(),
        account_name: "Adaobi Ekwueme".to_string(),
        account_number: "1234567890".to_string(),
    }
}

pub(super) fn submission() -> ApplicationSubmission {
    ApplicationSubmission {
        business_name: "Adaobi Farms".to_string(),
        sector: BusinessSector::Agriculture,
        loan_amount: 500_000,
        loan_purpose: "Purchase of fertilizers and seeds for the next planting season.".to_string(),
        business_description: "A small-scale farm focused on organic cassava and yam cultivation."
            .to_string(),
        documents: vec![
            DocumentRef {
                name: "Business Plan.pdf".to_string(),
                url: "#".to_string(),
            },
            DocumentRef {
                name: "ID_Card.png".to_string(),
                url: "#".to_string(),
            },
        ],
        bank_details: Some(bank_details()),
    }
}

/// Submit [`submission`] as [`applicant`] and return the stored application.
pub(super) fn submitted(service: &LoanPortalService) -> Application {
    service
        .submit_application(&applicant(), submission())
        .expect("submission accepted")
}

/// Detached application value for pure-function tests.
pub(super) fn application(id: &str, owner: &User, status: LoanStatus) -> Application {
    Application {
        id: ApplicationId::from(id),
        user_id: owner.id.clone(),
        applicant_name: owner.name.clone(),
        business_name: "Adaobi Farms".to_string(),
        sector: BusinessSector::Agriculture,
        loan_amount: 500_000,
        loan_purpose: "Seeds".to_string(),
        business_description: "Cassava and yam farm.".to_string(),
        application_date: NaiveDate::from_ymd_opt(2024, 7, 15).expect("valid date"),
        status,
        documents: Vec::new(),
        bank_details: None,
        messages: Vec::new(),
    }
}

pub(super) fn inbox(store: &EntityStore, user_id: &UserId) -> Vec<Notification> {
    store
        .list_notifications()
        .into_iter()
        .filter(|notification| &notification.user_id == user_id)
        .collect()
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
