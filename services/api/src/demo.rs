use crate::infra::{initial_store, parse_fanout};
use clap::Args;
use loan_portal::error::AppError;
use loan_portal::portal::{
    ApplicationSubmission, BankDetails, BusinessSector, DocumentRef, LoanPortalService,
    LoanStatus, MessageFanoutPolicy, Notification, PortalConfig, RegistrationForm, User, UserId,
};
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Who hears about applicant messages: all_staff or first_officer
    #[arg(long, value_parser = parse_fanout)]
    pub(crate) fanout: Option<MessageFanoutPolicy>,
    /// Amount the demo applicant requests
    #[arg(long, default_value_t = 500_000)]
    pub(crate) amount: u64,
    /// Reject the request when it exceeds the applicant's loan limit
    #[arg(long)]
    pub(crate) enforce_loan_limit: bool,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        fanout,
        amount,
        enforce_loan_limit,
    } = args;

    let config = PortalConfig {
        message_fanout: fanout.unwrap_or_default(),
        enforce_loan_limit,
        ..PortalConfig::default()
    };
    let store = Arc::new(initial_store(true)?);
    let service = LoanPortalService::new(store, config);
    let officer = service.user(&UserId::from("user-2"))?;
    let admin = service.user(&UserId::from("user-1"))?;

    println!("Loan portal demo");
    println!(
        "- Message fan-out policy: {} | loan limit {}",
        service.config().message_fanout,
        if service.config().enforce_loan_limit {
            "enforced"
        } else {
            "advisory"
        }
    );

    let applicant = service.register(RegistrationForm {
        name: "Ngozi Obi".to_string(),
        email: "ngozi@email.com".to_string(),
        ward: Some("Umudim".to_string()),
        nin: None,
    })?;
    let assessment = service.trust_score(&applicant.id)?;
    println!(
        "\nRegistered {} ({}) -> trust score {} | loan limit ₦{}",
        applicant.name, applicant.id, assessment.score, assessment.loan_limit
    );

    let application = match service.submit_application(&applicant, demo_submission(amount)) {
        Ok(application) => application,
        Err(err) => {
            println!("  Submission rejected: {err}");
            return Ok(());
        }
    };
    println!(
        "- Submitted {} for ₦{} -> status {}",
        application.id, application.loan_amount, application.status
    );
    print_latest(&service, &[&admin, &officer]);

    let approved =
        service.transition_status(&application.id, LoanStatus::Approved, &officer)?;
    println!(
        "\n{} moved {} to {}",
        officer.name, approved.id, approved.status
    );
    print_latest(&service, &[&applicant]);

    service.send_message(&application.id, &officer, "please clarify")?;
    println!("\n{} asked for clarification", officer.name);
    print_latest(&service, &[&applicant]);

    service.send_message(
        &application.id,
        &applicant,
        "Half of the loan restocks the shop and half buys new shelving.",
    )?;
    println!("{} replied", applicant.name);
    print_latest(&service, &[&admin, &officer]);

    let analysis = service.analyze(&officer, &application.id)?;
    println!("\nRisk read-out ({:?})", analysis.risk_level);
    println!("  {}", analysis.summary);
    for strength in &analysis.strengths {
        println!("  + {strength}");
    }
    for risk in &analysis.risks {
        println!("  - {risk}");
    }

    service.verify_bvn(&applicant, &applicant.id)?;
    let verified = service.trust_score(&applicant.id)?;
    println!(
        "\nBVN verified -> trust score {} (+{}) | loan limit ₦{}",
        verified.score,
        i32::from(verified.score) - i32::from(assessment.score),
        verified.loan_limit
    );

    let thread = service.application_for(&applicant, &application.id)?.messages;
    println!("\nThread on {}", application.id);
    for message in &thread {
        println!(
            "  [{}] {}: {}",
            message.timestamp.format("%H:%M:%S"),
            message.sender_name,
            message.content
        );
    }

    println!("\nUnread notifications");
    for user in [&admin, &officer, &applicant] {
        println!(
            "  - {} ({}): {}",
            user.name,
            user.role,
            service.unread_count(user)
        );
    }

    let dashboard = service.dashboard(&admin);
    println!(
        "\nPortfolio: {} applications | {} pending | {} approved | ₦{} disbursed",
        dashboard.summary.total_applications,
        dashboard.summary.pending,
        dashboard.summary.approved,
        dashboard.summary.total_disbursed
    );

    Ok(())
}

fn demo_submission(amount: u64) -> ApplicationSubmission {
    ApplicationSubmission {
        business_name: "Ngozi Provisions".to_string(),
        sector: BusinessSector::Retail,
        loan_amount: amount,
        loan_purpose: "Restock shelves ahead of the festive season.".to_string(),
        business_description:
            "Neighbourhood provisions store selling groceries and toiletries in Umudim.".to_string(),
        documents: vec![
            DocumentRef {
                name: "Inventory.pdf".to_string(),
                url: "#".to_string(),
            },
            DocumentRef {
                name: "ID_Card.png".to_string(),
                url: "#".to_string(),
            },
        ],
        bank_details: Some(BankDetails {
            bank_name: "Access Bank".to_string(),
            account_name: "Ngozi Obi".to_string(),
            account_number: "0123456789".to_string(),
        }),
    }
}

fn print_latest(service: &LoanPortalService, users: &[&User]) {
    for user in users {
        let inbox: Vec<Notification> = service.visible_notifications(user);
        match inbox.first() {
            Some(latest) => println!(
                "  -> {} notified: {} ({})",
                user.name,
                latest.title,
                latest.kind.label()
            ),
            None => println!("  -> {} has no notifications", user.name),
        }
    }
}
