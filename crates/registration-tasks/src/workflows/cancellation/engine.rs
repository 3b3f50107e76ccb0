use chrono::{NaiveDate, NaiveDateTime};
use std::fmt;
use tracing::{error, info, warn};

use super::gate::{parse_run_date, GateDecision};
use super::ledger::OutcomeLedger;
use super::ports::{CandidateSet, CandidateSource, SummaryDispatcher};
use super::workflow::{ReconciliationInput, ReconciliationTask};

/// An input the run cannot start without.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingInput {
    Contacts,
    Cases,
    Registrations,
    Template,
    Recipients,
}

impl MissingInput {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Contacts => "contacts with related account",
            Self::Cases => "cancel one registration cases",
            Self::Registrations => "open registrations",
            Self::Template => "notification template",
            Self::Recipients => "scheduled task owners",
        }
    }
}

impl fmt::Display for MissingInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    RunDateMissing,
    NotScheduledToday { scheduled: NaiveDate },
    InputMissing(MissingInput),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RunDateMissing => f.write_str("no usable run date is configured"),
            Self::NotScheduledToday { scheduled } => write!(f, "run is scheduled for {scheduled}"),
            Self::InputMissing(missing) => write!(f, "no {missing} available"),
        }
    }
}

/// Whether one task owner received the summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryOutcome {
    pub recipient: String,
    pub error: Option<String>,
}

impl DeliveryOutcome {
    pub fn delivered(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub ledger: OutcomeLedger,
    pub deliveries: Vec<DeliveryOutcome>,
}

#[derive(Debug, Clone)]
pub enum RunOutcome {
    Skipped(SkipReason),
    Completed(RunReport),
}

/// Once-a-day entry point: gate on the configured date, load the snapshot, reconcile every case
/// and mail the summary to each task owner.
pub struct RegistrationTaskEngine<'a> {
    source: &'a dyn CandidateSource,
    task: ReconciliationTask<'a>,
    dispatcher: &'a dyn SummaryDispatcher,
}

impl<'a> RegistrationTaskEngine<'a> {
    pub fn new(
        source: &'a dyn CandidateSource,
        task: ReconciliationTask<'a>,
        dispatcher: &'a dyn SummaryDispatcher,
    ) -> Self {
        Self {
            source,
            task,
            dispatcher,
        }
    }

    /// Reads and parses the configured run date and compares it with `today`. Source failures
    /// count as an absent date.
    pub fn evaluate_gate(&self, today: NaiveDate) -> GateDecision {
        let configured = match self.source.run_date() {
            Ok(Some(raw)) => parse_run_date(&raw),
            Ok(None) => {
                error!("date to execute is empty");
                None
            }
            Err(err) => {
                error!(error = %err, "failed to retrieve date to execute");
                None
            }
        };
        GateDecision::evaluate(configured, today)
    }

    pub fn run(&self, today: NaiveDate, now: NaiveDateTime) -> RunOutcome {
        match self.evaluate_gate(today) {
            GateDecision::Proceed => {}
            GateDecision::RunDateMissing => {
                info!("no run date configured; exiting");
                return RunOutcome::Skipped(SkipReason::RunDateMissing);
            }
            GateDecision::NotScheduledToday { scheduled } => {
                error!(%scheduled, %today, "date to execute is different than today; exiting");
                return RunOutcome::Skipped(SkipReason::NotScheduledToday { scheduled });
            }
        }

        let candidates = self.source.candidates();
        let ready = match ReadyCandidates::from_set(&candidates) {
            Ok(ready) => ready,
            Err(missing) => {
                info!(missing = %missing, "required input unavailable; exiting");
                return RunOutcome::Skipped(SkipReason::InputMissing(missing));
            }
        };

        let ledger = self.task.execute(&ready.input, now);
        info!(
            successes = ledger.successes().len(),
            issues = ledger.issues().len(),
            "processed all contacts"
        );

        let deliveries = self.dispatch_summary(ready.recipients, &ledger, now);
        RunOutcome::Completed(RunReport { ledger, deliveries })
    }

    fn dispatch_summary(
        &self,
        recipients: &[String],
        ledger: &OutcomeLedger,
        now: NaiveDateTime,
    ) -> Vec<DeliveryOutcome> {
        if recipients.is_empty() {
            warn!("no scheduled task owners to send the summary to");
        }

        recipients
            .iter()
            .map(|recipient| {
                match self
                    .dispatcher
                    .send(recipient, ledger.successes(), ledger.issues(), now)
                {
                    Ok(()) => {
                        info!(%recipient, "registration update summary mail sent");
                        DeliveryOutcome {
                            recipient: recipient.clone(),
                            error: None,
                        }
                    }
                    Err(err) => {
                        error!(
                            %recipient,
                            error = %err,
                            "registration update summary mail was not sent"
                        );
                        DeliveryOutcome {
                            recipient: recipient.clone(),
                            error: Some(err.to_string()),
                        }
                    }
                }
            })
            .collect()
    }
}

struct ReadyCandidates<'c> {
    input: ReconciliationInput<'c>,
    recipients: &'c [String],
}

impl<'c> ReadyCandidates<'c> {
    fn from_set(set: &'c CandidateSet) -> Result<Self, MissingInput> {
        let contacts = non_empty(set.contacts.as_deref()).ok_or(MissingInput::Contacts)?;
        let cases = non_empty(set.cases.as_deref()).ok_or(MissingInput::Cases)?;
        let registrations =
            non_empty(set.registrations.as_deref()).ok_or(MissingInput::Registrations)?;
        let template = set.template.as_ref().ok_or(MissingInput::Template)?;
        let recipients = set.recipients.as_deref().ok_or(MissingInput::Recipients)?;

        Ok(Self {
            input: ReconciliationInput {
                contacts,
                cases,
                registrations,
                template,
            },
            recipients,
        })
    }
}

fn non_empty<T>(items: Option<&[T]>) -> Option<&[T]> {
    items.filter(|items| !items.is_empty())
}
