use crate::cli::RunArgs;
use chrono::Local;
use registration_tasks::config::AppConfig;
use registration_tasks::error::AppError;
use registration_tasks::telemetry;
use registration_tasks::workflows::cancellation::{
    CaseWorkflow, GateDecision, ReconciliationTask, RegistrationTaskEngine, RunOutcome,
};
use registration_tasks::workflows::snapshot::{Outbox, SnapshotConnection, SnapshotSource};
use std::io::{self, Write};
use tracing::info;

fn load_config(args: &mut RunArgs) -> Result<AppConfig, AppError> {
    let mut config = AppConfig::load()?;

    if let Some(data_dir) = args.data_dir.take() {
        if args.outbox_dir.is_none() {
            config.store.outbox_dir = data_dir.join("outbox");
        }
        config.store.data_dir = data_dir;
    }
    if let Some(outbox_dir) = args.outbox_dir.take() {
        config.store.outbox_dir = outbox_dir;
    }

    telemetry::init(&config.telemetry)?;
    Ok(config)
}

fn engine<'a>(
    connection: &'a SnapshotConnection,
    source: &'a SnapshotSource<'a>,
    outbox: &'a Outbox<'a>,
) -> RegistrationTaskEngine<'a> {
    let workflow = CaseWorkflow::new(outbox, outbox, outbox, connection.actor_id());
    RegistrationTaskEngine::new(source, ReconciliationTask::new(workflow), outbox)
}

pub(crate) fn run_reconciliation(mut args: RunArgs) -> Result<(), AppError> {
    let config = load_config(&mut args)?;
    let connection = SnapshotConnection::open(&config.store)?;
    let source = SnapshotSource::new(&connection);
    let outbox = Outbox::new(&connection);
    let engine = engine(&connection, &source, &outbox);

    let now = Local::now().naive_local();
    let today = args.today.unwrap_or_else(|| now.date());
    info!(
        environment = ?config.environment,
        %today,
        "start executing registration scheduled tasks"
    );

    let mut stdout = io::stdout().lock();
    match engine.run(today, now) {
        RunOutcome::Skipped(reason) => writeln!(stdout, "skipped: {reason}")?,
        RunOutcome::Completed(report) => {
            let delivered = report
                .deliveries
                .iter()
                .filter(|delivery| delivery.delivered())
                .count();
            writeln!(
                stdout,
                "completed: {} registrations updated, {} issues, summary delivered to {}/{} owners",
                report.ledger.successes().len(),
                report.ledger.issues().len(),
                delivered,
                report.deliveries.len()
            )?;
        }
    }

    info!("finished executing registration scheduled tasks");
    Ok(())
}

pub(crate) fn run_gate(mut args: RunArgs) -> Result<(), AppError> {
    let config = load_config(&mut args)?;
    let connection = SnapshotConnection::open_read_only(&config.store)?;
    let source = SnapshotSource::new(&connection);
    let outbox = Outbox::new(&connection);
    let engine = engine(&connection, &source, &outbox);

    let today = args.today.unwrap_or_else(|| Local::now().date_naive());
    let mut stdout = io::stdout().lock();
    match engine.evaluate_gate(today) {
        GateDecision::Proceed => {
            writeln!(stdout, "run date matches {today}; a run would proceed")?
        }
        GateDecision::RunDateMissing => writeln!(stdout, "no usable run date is configured")?,
        GateDecision::NotScheduledToday { scheduled } => {
            writeln!(stdout, "run is scheduled for {scheduled}, not {today}")?
        }
    }
    Ok(())
}
