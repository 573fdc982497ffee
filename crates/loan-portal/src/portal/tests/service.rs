use std::sync::Arc;

use super::common::*;
use crate::portal::config::PortalConfig;
use crate::portal::domain::{
    ApplicationId, BankDetails, LoanStatus, NotificationId, NotificationKind, ProfileUpdate,
    RegistrationForm, UserId, UserRole,
};
use crate::portal::error::{EntityRef, PortalError, ValidationError};
use crate::portal::RiskLevel;

#[test]
fn submit_creates_pending_application_and_notifies_staff() {
    let (service, store, _) = build_service();

    let application = submitted(&service);

    assert_eq!(application.id, ApplicationId::from("APP-001"));
    assert_eq!(application.status, LoanStatus::Pending);
    assert_eq!(application.applicant_name, "Adaobi Ekwueme");
    assert_eq!(application.application_date, start_time().date_naive());
    assert!(application.messages.is_empty());

    for staff in [admin(), officer()] {
        let notifications = inbox(&store, &staff.id);
        assert_eq!(notifications.len(), 1, "{} notified once", staff.id);
        assert_eq!(notifications[0].kind, NotificationKind::NewApplication);
        assert!(!notifications[0].is_read);
    }
    assert!(inbox(&store, &applicant().id).is_empty());
}

#[test]
fn staff_cannot_submit_applications() {
    let (service, store, _) = build_service();

    let err = service
        .submit_application(&officer(), submission())
        .expect_err("officers do not apply");

    assert!(matches!(
        err,
        PortalError::Unauthorized {
            role: UserRole::Officer,
            ..
        }
    ));
    assert!(store.list_applications().is_empty());
}

#[test]
fn invalid_submissions_leave_the_store_untouched() {
    let (service, store, _) = build_service();
    let before = store.snapshot();

    let mut zero = submission();
    zero.loan_amount = 0;
    assert_eq!(
        service.submit_application(&applicant(), zero),
        Err(PortalError::Validation(ValidationError::NonPositiveAmount))
    );

    let mut bad_account = submission();
    bad_account.bank_details = Some(BankDetails {
        account_number: "12345".to_string(),
        ..bank_details()
    });
    assert_eq!(
        service.submit_application(&applicant(), bad_account),
        Err(PortalError::Validation(
            ValidationError::InvalidAccountNumber
        ))
    );

    let mut unnamed = submission();
    unnamed.business_name = "   ".to_string();
    assert_eq!(
        service.submit_application(&applicant(), unnamed),
        Err(PortalError::Validation(ValidationError::MissingField(
            "business_name"
        )))
    );

    assert!(Arc::ptr_eq(&before, &store.snapshot()));
}

#[test]
fn failed_submission_does_not_consume_an_id() {
    let (service, _, _) = build_service();
    let mut zero = submission();
    zero.loan_amount = 0;
    let _ = service.submit_application(&applicant(), zero);

    let _ = service.submit_application(&officer(), submission());

    assert_eq!(submitted(&service).id, ApplicationId::from("APP-001"));
}

#[test]
fn full_lifecycle_through_repayment() {
    let (service, store, _) = build_service();
    let application = submitted(&service);

    service
        .transition_status(&application.id, LoanStatus::Approved, &officer())
        .expect("approve");
    service
        .transition_status(&application.id, LoanStatus::Disbursed, &admin())
        .expect("disburse");
    let repaid = service
        .mark_repaid(&application.id, &officer())
        .expect("repay");

    assert_eq!(repaid.status, LoanStatus::Repaid);
    let updates: Vec<_> = inbox(&store, &applicant().id)
        .into_iter()
        .filter(|notification| notification.kind == NotificationKind::StatusUpdate)
        .map(|notification| notification.body)
        .collect();
    assert_eq!(
        updates,
        vec![
            "Your application for \"Adaobi Farms\" is now Approved.",
            "Your application for \"Adaobi Farms\" is now Disbursed.",
            "Your application for \"Adaobi Farms\" is now Repaid.",
        ]
    );
    assert_eq!(
        service
            .trust_score(&applicant().id)
            .expect("assessment")
            .score,
        45
    );
}

#[test]
fn rejected_transition_creates_no_notification() {
    let (service, store, _) = build_service();
    let application = submitted(&service);
    let before = store.snapshot();

    let err = service
        .transition_status(&application.id, LoanStatus::Repaid, &admin())
        .expect_err("pending cannot be repaid");

    assert_eq!(
        err,
        PortalError::InvalidTransition {
            from: LoanStatus::Pending,
            to: LoanStatus::Repaid,
        }
    );
    assert!(Arc::ptr_eq(&before, &store.snapshot()));
}

#[test]
fn applicant_cannot_approve_own_application() {
    let (service, store, _) = build_service();
    let application = submitted(&service);

    let err = service
        .transition_status(&application.id, LoanStatus::Approved, &applicant())
        .expect_err("applicants cannot decide");

    assert!(matches!(err, PortalError::Unauthorized { .. }));
    assert_eq!(
        store
            .get_application(&application.id)
            .expect("stored")
            .status,
        LoanStatus::Pending
    );
}

#[test]
fn mark_read_is_owner_only_and_idempotent() {
    let (service, store, _) = build_service();
    submitted(&service);
    let notification = inbox(&store, &officer().id).remove(0);

    let err = service
        .mark_read(&notification.id, &admin())
        .expect_err("admin does not own it");
    assert!(matches!(err, PortalError::Unauthorized { .. }));

    service
        .mark_read(&notification.id, &officer())
        .expect("first read");
    service
        .mark_read(&notification.id, &officer())
        .expect("second read is a no-op");

    assert!(inbox(&store, &officer().id)[0].is_read);
    assert_eq!(service.unread_count(&officer()), 0);
    assert_eq!(service.unread_count(&admin()), 1);
}

#[test]
fn mark_read_unknown_notification_is_not_found() {
    let (service, _, _) = build_service();

    let err = service
        .mark_read(&NotificationId::from("notif-404"), &officer())
        .expect_err("unknown id");

    assert_eq!(
        err,
        PortalError::NotFound(EntityRef::Notification(NotificationId::from("notif-404")))
    );
}

#[test]
fn mark_all_read_only_touches_the_callers_inbox() {
    let (service, _, _) = build_service();
    let application = submitted(&service);
    service
        .send_message(&application.id, &applicant(), "Any update?")
        .expect("message");

    assert_eq!(service.mark_all_read(&admin().id), Ok(2));
    assert_eq!(service.mark_all_read(&admin().id), Ok(0));
    assert_eq!(service.unread_count(&officer()), 2);
}

#[test]
fn register_assigns_next_id_and_rejects_duplicate_email() {
    let (service, _, _) = build_service();

    let user = service
        .register(RegistrationForm {
            name: " Chinedu Eze ".to_string(),
            email: "chinedu@email.com".to_string(),
            ward: Some("Dim-Na-Nume".to_string()),
            nin: None,
        })
        .expect("registered");
    assert_eq!(user.id, UserId::from("user-5"));
    assert_eq!(user.name, "Chinedu Eze");
    assert_eq!(user.role, UserRole::Applicant);

    let err = service
        .register(RegistrationForm {
            name: "Impostor".to_string(),
            email: "CHINEDU@email.com".to_string(),
            ward: None,
            nin: None,
        })
        .expect_err("duplicate");
    assert!(matches!(
        err,
        PortalError::Validation(ValidationError::DuplicateEmail(_))
    ));
}

#[test]
fn register_validates_nin() {
    let (service, _, _) = build_service();

    let err = service
        .register(RegistrationForm {
            name: "Ngozi Obi".to_string(),
            email: "ngozi@email.com".to_string(),
            ward: None,
            nin: Some("1234".to_string()),
        })
        .expect_err("short NIN");

    assert_eq!(err, PortalError::Validation(ValidationError::InvalidNin));
}

#[test]
fn login_is_case_insensitive() {
    let (service, _, _) = build_service();

    let user = service.login("  USER@email.com ").expect("known email");
    assert_eq!(user.id, applicant().id);

    assert!(matches!(
        service.login("nobody@email.com"),
        Err(PortalError::NotFound(EntityRef::Email(_)))
    ));
}

#[test]
fn profile_edits_are_limited_to_owner_and_admin() {
    let (service, _, _) = build_service();
    let update = ProfileUpdate {
        nin: Some("12345678901".to_string()),
        ..ProfileUpdate::default()
    };

    let err = service
        .update_profile(&other_applicant(), &applicant().id, update.clone())
        .expect_err("not their profile");
    assert!(matches!(err, PortalError::Unauthorized { .. }));

    let err = service
        .update_profile(&officer(), &applicant().id, update.clone())
        .expect_err("officers cannot edit profiles");
    assert!(matches!(err, PortalError::Unauthorized { .. }));

    let updated = service
        .update_profile(&applicant(), &applicant().id, update)
        .expect("own profile");
    assert_eq!(updated.nin.as_deref(), Some("12345678901"));

    let renamed = service
        .update_profile(
            &admin(),
            &applicant().id,
            ProfileUpdate {
                name: Some("Adaobi N. Ekwueme".to_string()),
                ..ProfileUpdate::default()
            },
        )
        .expect("admin may edit");
    assert_eq!(renamed.name, "Adaobi N. Ekwueme");
    assert_eq!(renamed.nin.as_deref(), Some("12345678901"));
}

#[test]
fn bvn_verification_raises_trust_without_notifying() {
    let (service, store, _) = build_service();
    let before = service.trust_score(&applicant().id).expect("assessment");

    service
        .verify_bvn(&applicant(), &applicant().id)
        .expect("verify");
    let again = service
        .verify_bvn(&admin(), &applicant().id)
        .expect("re-verify is a no-op");

    assert!(again.is_bvn_verified);
    let after = service.trust_score(&applicant().id).expect("assessment");
    assert_eq!(after.score, before.score + 35);
    assert_eq!(after.loan_limit, u64::from(after.score) * 15_000);
    assert!(store.list_notifications().is_empty());
}

#[test]
fn bank_details_are_owner_only() {
    let (service, _, _) = build_service();
    let application = submitted(&service);
    let details = BankDetails {
        bank_name: "GTBank".to_string(),
        account_name: "Adaobi Farms".to_string(),
        account_number: "0987654321".to_string(),
    };

    let err = service
        .update_bank_details(&officer(), &application.id, details.clone())
        .expect_err("officer cannot change payout account");
    assert!(matches!(err, PortalError::Unauthorized { .. }));

    let updated = service
        .update_bank_details(&applicant(), &application.id, details.clone())
        .expect("owner");
    assert_eq!(updated.bank_details, Some(details));
}

#[test]
fn bank_details_follow_the_same_rules_on_submit_and_update() {
    let (service, store, _) = build_service();
    let blank_names = BankDetails {
        bank_name: "  ".to_string(),
        account_name: String::new(),
        account_number: "1234567890".to_string(),
    };
    let before = store.snapshot();

    let mut unnamed_bank = submission();
    unnamed_bank.bank_details = Some(blank_names.clone());
    assert_eq!(
        service.submit_application(&applicant(), unnamed_bank),
        Err(PortalError::Validation(ValidationError::MissingField(
            "bank_name"
        )))
    );
    assert!(Arc::ptr_eq(&before, &store.snapshot()));

    let application = submitted(&service);
    assert_eq!(
        service.update_bank_details(&applicant(), &application.id, blank_names),
        Err(PortalError::Validation(ValidationError::MissingField(
            "bank_name"
        )))
    );

    let padded = BankDetails {
        bank_name: " Access Bank ".to_string(),
        account_name: "Adaobi Farms ".to_string(),
        account_number: " 1234567890".to_string(),
    };
    let expected = BankDetails {
        bank_name: "Access Bank".to_string(),
        account_name: "Adaobi Farms".to_string(),
        account_number: "1234567890".to_string(),
    };
    let mut padded_submission = submission();
    padded_submission.bank_details = Some(padded.clone());
    let second = service
        .submit_application(&applicant(), padded_submission)
        .expect("padded details are trimmed on submit");
    assert_eq!(second.bank_details, Some(expected.clone()));

    let updated = service
        .update_bank_details(&applicant(), &application.id, padded)
        .expect("padded details are trimmed on update");
    assert_eq!(updated.bank_details, Some(expected));
}

#[test]
fn loan_limit_is_advisory_unless_enforced() {
    let mut large = submission();
    large.loan_amount = 5_000_000;

    let (service, _, _) = build_service();
    assert!(service.submit_application(&applicant(), large.clone()).is_ok());

    let (strict, _, _) = build_service_with(PortalConfig {
        enforce_loan_limit: true,
        ..PortalConfig::default()
    });
    assert_eq!(
        strict.submit_application(&applicant(), large),
        Err(PortalError::Validation(ValidationError::LoanLimitExceeded {
            requested: 5_000_000,
            limit: 450_000,
        }))
    );
}

#[test]
fn applicants_cannot_see_each_others_applications() {
    let (service, _, _) = build_service();
    let application = submitted(&service);

    assert_eq!(
        service.application_for(&other_applicant(), &application.id),
        Err(PortalError::NotFound(EntityRef::Application(
            application.id.clone()
        )))
    );
    assert!(service.application_for(&officer(), &application.id).is_ok());
    assert!(service.visible_applications(&other_applicant()).is_empty());
    assert_eq!(service.visible_applications(&admin()).len(), 1);
}

#[test]
fn analysis_is_for_staff_only() {
    let (service, _, _) = build_service();
    let application = submitted(&service);

    assert!(matches!(
        service.analyze(&applicant(), &application.id),
        Err(PortalError::Unauthorized { .. })
    ));
    let analysis = service
        .analyze(&officer(), &application.id)
        .expect("officer analysis");
    assert_eq!(analysis.risk_level, RiskLevel::Low);
}
