use chrono::Duration;

use super::common::*;
use crate::portal::domain::{
    ApplicationId, BusinessSector, LoanStatus, Notification, NotificationId, NotificationKind,
    User, UserId,
};
use crate::portal::seed::demo_snapshot;
use crate::portal::views;

fn notification(id: &str, user_id: &UserId, minutes: i64, is_read: bool) -> Notification {
    Notification {
        id: NotificationId::from(id),
        user_id: user_id.clone(),
        title: "Application Status Updated".to_string(),
        body: "Your application is now Approved.".to_string(),
        created_at: start_time() + Duration::minutes(minutes),
        is_read,
        link: None,
        kind: NotificationKind::StatusUpdate,
    }
}

#[test]
fn applicants_see_only_their_own_applications() {
    let applications = [
        application("APP-001", &applicant(), LoanStatus::Pending),
        application("APP-002", &other_applicant(), LoanStatus::Approved),
    ];

    let mine = views::visible_applications(&applications, &applicant());
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].id, ApplicationId::from("APP-001"));

    assert_eq!(views::visible_applications(&applications, &officer()).len(), 2);
    assert_eq!(views::visible_applications(&applications, &admin()).len(), 2);
}

#[test]
fn search_matches_applicant_or_business_name_ignoring_case() {
    let snapshot = demo_snapshot().expect("demo seed");

    let ids = |term: &str| -> Vec<String> {
        views::search_applications(snapshot.applications(), term)
            .into_iter()
            .map(|application| application.id.to_string())
            .collect()
    };

    assert_eq!(ids("adaobi"), vec!["APP-001", "APP-003"]);
    assert_eq!(ids("  EATERY "), vec!["APP-004"]);
    assert_eq!(ids("eze"), vec!["APP-004", "APP-005"]);
    assert!(ids("nonexistent").is_empty());
    assert_eq!(ids("   ").len(), 5);
}

#[test]
fn inbox_is_newest_first_and_private() {
    let notifications = [
        notification("notif-1", &applicant().id, 0, false),
        notification("notif-2", &other_applicant().id, 5, false),
        notification("notif-3", &applicant().id, 10, true),
    ];

    let ids: Vec<_> = views::visible_notifications(&notifications, &applicant())
        .into_iter()
        .map(|notification| notification.id.as_str())
        .collect();
    assert_eq!(ids, vec!["notif-3", "notif-1"]);
    assert_eq!(views::unread_count(&notifications, &applicant()), 1);
    assert_eq!(views::unread_count(&notifications, &officer()), 0);
}

#[test]
fn user_directory_is_role_scoped() {
    let users = [admin(), officer(), applicant(), other_applicant()];
    let ids = |actor: &User| -> Vec<String> {
        views::visible_users(&users, actor)
            .into_iter()
            .map(|user| user.id.to_string())
            .collect()
    };

    assert_eq!(ids(&admin()), vec!["user-1", "user-2", "user-3", "user-4"]);
    assert_eq!(ids(&officer()), vec!["user-2", "user-3", "user-4"]);
    assert_eq!(ids(&applicant()), vec!["user-3"]);
}

#[test]
fn profile_completion_counts_identity_checks() {
    let mut user = applicant();
    assert_eq!(views::profile_completion(&user), 0);
    user.nin = Some("12345678901".to_string());
    assert_eq!(views::profile_completion(&user), 50);
    user.is_bvn_verified = true;
    assert_eq!(views::profile_completion(&user), 100);
}

#[test]
fn recent_applications_sort_by_submission_date() {
    let snapshot = demo_snapshot().expect("demo seed");
    let all: Vec<_> = snapshot.applications().collect();

    let ids: Vec<_> = views::recent_applications(&all, 3)
        .into_iter()
        .map(|application| application.id.as_str())
        .collect();

    assert_eq!(ids, vec!["APP-001", "APP-002", "APP-004"]);
}

#[test]
fn portfolio_summary_over_demo_data() {
    let snapshot = demo_snapshot().expect("demo seed");
    let all: Vec<_> = snapshot.applications().collect();

    let summary = views::portfolio_summary(&all);

    assert_eq!(summary.total_applications, 5);
    assert_eq!(summary.total_disbursed, 650_000);
    assert_eq!(summary.pending, 1);
    assert_eq!(summary.approved, 1);
    assert_eq!(summary.status_counts.len(), 5);
    let services = summary
        .sector_counts
        .iter()
        .find(|entry| entry.sector == BusinessSector::Services)
        .expect("services sector");
    assert_eq!(services.count, 2);
}

#[test]
fn applicant_dashboard_shows_active_loan() {
    let snapshot = demo_snapshot().expect("demo seed");
    let chinedu = snapshot
        .user(&UserId::from("user-5"))
        .expect("seeded applicant")
        .clone();

    let dashboard = views::dashboard(snapshot.applications(), snapshot.notifications(), &chinedu);

    assert_eq!(
        dashboard.active_loan.map(|loan| loan.id),
        Some(ApplicationId::from("APP-004"))
    );
    assert_eq!(dashboard.summary.total_applications, 2);
    assert_eq!(dashboard.unread_notifications, 0);
    assert_eq!(dashboard.profile_completion, 0);
}

#[test]
fn staff_dashboard_has_no_active_loan() {
    let snapshot = demo_snapshot().expect("demo seed");
    let admin = snapshot
        .user(&UserId::from("user-1"))
        .expect("seeded admin")
        .clone();

    let dashboard = views::dashboard(snapshot.applications(), snapshot.notifications(), &admin);

    assert!(dashboard.active_loan.is_none());
    assert_eq!(dashboard.summary.total_applications, 5);
    assert_eq!(dashboard.recent_applications.len(), 5);
    assert_eq!(dashboard.unread_notifications, 1);
}
