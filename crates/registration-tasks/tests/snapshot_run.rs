use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use registration_tasks::config::StoreConfig;
use registration_tasks::workflows::cancellation::{
    CandidateSource, CaseWorkflow, GateDecision, MissingInput, ReconciliationTask,
    RegistrationTaskEngine, RunOutcome, SkipReason,
};
use registration_tasks::workflows::snapshot::{
    Outbox, SnapshotConnection, SnapshotError, SnapshotSource,
};
use serde_json::Value;
use tempfile::TempDir;

const RULES: &str = "slug,value\n\
date_to_run_registration_scheduled_task,10-19-2026\n\
registration_scheduled_task_owners,\"owner1@example.com, owner2@example.com\"\n";

const ACCOUNTS: &str = "account_id,name,email,primary_contact_id\n\
acc-1,Northwind,billing@northwind.example,c-1\n\
acc-1,Northwind,billing@northwind.example,c-1\n\
acc-2,Contoso,,c-2\n\
acc-3,Fabrikam,,c-3\n";

const CONTACTS: &str = "contact_id,last_name,email\n\
c-1,Okafor,okafor@example.com\n\
c-2,Lindqvist,\n\
c-3,Haddad,haddad@example.com\n";

const CASES: &str = "case_id,ticket_number,title,customer_id,case_type_code\n\
case-1,CAS-0001,Cancel one registration,c-1,3\n\
case-2,CAS-0002,Cancel one registration,c-2,3\n\
case-3,CAS-0003,Cancel all registrations,c-1,3\n\
case-4,CAS-0004,Cancel one registration,c-1,1\n";

const REGISTRATIONS: &str =
    "registration_id,name,account_id,priority,created_on,status,sub_status\n\
reg-1,Spring League,acc-1,1,2026-01-01T09:00:00Z,Open,Registered\n\
reg-2,Summer Camp,acc-1,1,2026-03-01T09:00:00Z,Open,Registered\n\
reg-3,Autumn Clinic,acc-1,2,2026-02-01T09:00:00Z,Open,Registered\n\
reg-4,Winter Cup,acc-1,0,2026-04-01T09:00:00Z,Closed,Cancelled\n\
reg-5,Contoso Youth,acc-2,1,2026-01-15,Open,Registered\n";

const TEMPLATES: &str = r##"[
  {"id": "tpl-0", "title": "Welcome", "subject": "Hi", "body": "Hello"},
  {"id": "tpl-1", "title": "Case Resolve: Cancel Registration",
   "subject": "Registration cancelled",
   "body": "Dear #LastName#, case #caseNumber# cancelled #RegistrationName#."}
]"##;

fn write_snapshot(dir: &Path) {
    fs::write(dir.join("system_rules.csv"), RULES).expect("write rules");
    fs::write(dir.join("accounts.csv"), ACCOUNTS).expect("write accounts");
    fs::write(dir.join("contacts.csv"), CONTACTS).expect("write contacts");
    fs::write(dir.join("cases.csv"), CASES).expect("write cases");
    fs::write(dir.join("registrations.csv"), REGISTRATIONS).expect("write registrations");
    fs::write(dir.join("templates.json"), TEMPLATES).expect("write templates");
}

fn store_config(dir: &TempDir) -> StoreConfig {
    StoreConfig {
        data_dir: dir.path().to_path_buf(),
        outbox_dir: dir.path().join("outbox"),
        actor_id: "svc-registration-task".to_string(),
    }
}

fn journal(dir: &TempDir, file: &str) -> Vec<Value> {
    let path = dir.path().join("outbox").join(file);
    match fs::read_to_string(path) {
        Ok(contents) => contents
            .lines()
            .map(|line| serde_json::from_str(line).expect("valid json line"))
            .collect(),
        Err(_) => Vec::new(),
    }
}

fn run(dir: &TempDir) -> RunOutcome {
    let connection = SnapshotConnection::open(&store_config(dir)).expect("snapshot opens");
    let source = SnapshotSource::new(&connection);
    let outbox = Outbox::new(&connection);
    let workflow = CaseWorkflow::new(&outbox, &outbox, &outbox, connection.actor_id());
    let engine = RegistrationTaskEngine::new(&source, ReconciliationTask::new(workflow), &outbox);

    let today = NaiveDate::from_ymd_opt(2026, 10, 19).expect("valid date");
    let now = today.and_hms_opt(6, 0, 0).expect("valid time");
    engine.run(today, now)
}

#[test]
fn source_applies_eligibility_filters() {
    let dir = TempDir::new().expect("temp dir");
    write_snapshot(dir.path());
    let connection = SnapshotConnection::open(&store_config(&dir)).expect("snapshot opens");
    let source = SnapshotSource::new(&connection);

    assert_eq!(
        source.run_date().expect("rules readable").as_deref(),
        Some("10-19-2026")
    );

    let candidates = source.candidates();
    let contacts = candidates.contacts.expect("contacts present");
    let contact_ids: Vec<&str> = contacts.iter().map(|contact| contact.id.as_str()).collect();
    assert_eq!(contact_ids, vec!["c-1", "c-2"]);

    let cases = candidates.cases.expect("cases present");
    let case_ids: Vec<&str> = cases.iter().map(|case| case.id.as_str()).collect();
    assert_eq!(case_ids, vec!["case-1", "case-2"]);

    let registrations = candidates.registrations.expect("registrations present");
    assert_eq!(registrations.len(), 4);
    assert!(registrations
        .iter()
        .all(|registration| registration.status == "Open"));

    assert_eq!(
        candidates.template.expect("template present").title,
        "Case Resolve: Cancel Registration"
    );
    assert_eq!(
        candidates.recipients.expect("owners present"),
        vec!["owner1@example.com", "owner2@example.com"]
    );
}

#[test]
fn scheduled_run_journals_mutations_and_summaries() {
    let dir = TempDir::new().expect("temp dir");
    write_snapshot(dir.path());

    let report = match run(&dir) {
        RunOutcome::Completed(report) => report,
        other => panic!("expected completed run, got {other:?}"),
    };

    // Northwind cancels the priority 1 registration created last; Contoso's contact has no email
    // address so its notification fails.
    let successes = report.ledger.successes();
    assert_eq!(successes.len(), 1);
    assert_eq!(successes[0].account_name, "Northwind");
    assert_eq!(successes[0].registration_name, "Summer Camp");

    let issues = report.ledger.issues();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].account_name, "Contoso");
    assert_eq!(issues[0].description, "Email not created successfully");

    let updates = journal(&dir, "registration_updates.jsonl");
    let updated: Vec<&str> = updates
        .iter()
        .filter_map(|entry| entry["registration_id"].as_str())
        .collect();
    assert_eq!(updated, vec!["reg-2", "reg-5"]);
    assert_eq!(updates[0]["status"], "Cancelled");
    assert_eq!(updates[0]["sub_status"], "Cancelled by Task");
    assert_eq!(updates[0]["modified_by"], "svc-registration-task");

    let resolutions = journal(&dir, "case_resolutions.jsonl");
    assert_eq!(resolutions.len(), 2);
    assert_eq!(resolutions[0]["subject"], "Case Resolved");
    assert_eq!(resolutions[0]["status_code"], 5);

    let notifications = journal(&dir, "notifications.jsonl");
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0]["to"], "okafor@example.com");
    assert_eq!(notifications[0]["subject"], "Registration cancelled");
    assert_eq!(
        notifications[0]["body"],
        "Dear Okafor, case CAS-0001 cancelled Summer Camp."
    );
    assert_eq!(notifications[0]["created_on"], updates[0]["modified_on"]);

    let summaries = journal(&dir, "summaries.jsonl");
    let recipients: Vec<&str> = summaries
        .iter()
        .filter_map(|entry| entry["to"].as_str())
        .collect();
    assert_eq!(recipients, vec!["owner1@example.com", "owner2@example.com"]);
    assert_eq!(summaries[0]["subject"], "Registration Update Summary");
    assert_eq!(summaries[0]["created_on"], "2026-10-19T06:00:00");
    assert_eq!(summaries[1]["created_on"], resolutions[0]["actual_end"]);
    let body = summaries[0]["body"].as_str().expect("summary body");
    assert!(body.contains("Successfully updated registrations (1)"));
    assert!(body.contains("Issues (1)"));
    assert!(report.deliveries.iter().all(|delivery| delivery.delivered()));
}

#[test]
fn run_date_for_another_day_leaves_outbox_empty() {
    let dir = TempDir::new().expect("temp dir");
    write_snapshot(dir.path());
    fs::write(
        dir.path().join("system_rules.csv"),
        "slug,value\ndate_to_run_registration_scheduled_task,01.02.2027\n",
    )
    .expect("rewrite rules");

    match run(&dir) {
        RunOutcome::Skipped(SkipReason::NotScheduledToday { scheduled }) => {
            assert_eq!(scheduled, NaiveDate::from_ymd_opt(2027, 1, 2).expect("valid"))
        }
        other => panic!("expected not-today skip, got {other:?}"),
    }
    assert!(journal(&dir, "registration_updates.jsonl").is_empty());
    assert!(journal(&dir, "summaries.jsonl").is_empty());
}

#[test]
fn missing_template_skips_the_run() {
    let dir = TempDir::new().expect("temp dir");
    write_snapshot(dir.path());
    fs::remove_file(dir.path().join("templates.json")).expect("remove templates");

    assert!(matches!(
        run(&dir),
        RunOutcome::Skipped(SkipReason::InputMissing(MissingInput::Template))
    ));
    assert!(journal(&dir, "case_resolutions.jsonl").is_empty());
}

#[test]
fn no_eligible_cases_skips_the_run() {
    let dir = TempDir::new().expect("temp dir");
    write_snapshot(dir.path());
    fs::write(
        dir.path().join("cases.csv"),
        "case_id,ticket_number,title,customer_id,case_type_code\n\
case-3,CAS-0003,Cancel all registrations,c-1,3\n",
    )
    .expect("rewrite cases");

    assert!(matches!(
        run(&dir),
        RunOutcome::Skipped(SkipReason::InputMissing(MissingInput::Cases))
    ));
}

#[test]
fn gate_check_leaves_the_outbox_uncreated() {
    let dir = TempDir::new().expect("temp dir");
    write_snapshot(dir.path());
    let connection =
        SnapshotConnection::open_read_only(&store_config(&dir)).expect("snapshot opens");
    let source = SnapshotSource::new(&connection);
    let outbox = Outbox::new(&connection);
    let workflow = CaseWorkflow::new(&outbox, &outbox, &outbox, connection.actor_id());
    let engine = RegistrationTaskEngine::new(&source, ReconciliationTask::new(workflow), &outbox);

    let today = NaiveDate::from_ymd_opt(2026, 10, 19).expect("valid date");
    assert_eq!(engine.evaluate_gate(today), GateDecision::Proceed);
    assert!(!dir.path().join("outbox").exists());

    SnapshotConnection::open(&store_config(&dir)).expect("snapshot opens for a run");
    assert!(dir.path().join("outbox").is_dir());
}

#[test]
fn opening_a_missing_directory_fails() {
    let dir = TempDir::new().expect("temp dir");
    let config = StoreConfig {
        data_dir: dir.path().join("absent"),
        outbox_dir: dir.path().join("outbox"),
        actor_id: "svc".to_string(),
    };

    assert!(matches!(
        SnapshotConnection::open(&config),
        Err(SnapshotError::MissingDirectory { .. })
    ));
}
