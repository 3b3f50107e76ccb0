use serde::Serialize;
use tracing::info;

/// One failed workflow step for an account/registration pairing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssueRecord {
    pub account_name: String,
    pub registration_name: String,
    pub description: String,
}

/// A pairing that finished without any issue recorded against its account at the time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuccessRecord {
    pub account_name: String,
    pub registration_name: String,
    pub case_name: String,
}

/// Append-only tally of a single run, read by the summary dispatch once processing ends.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct OutcomeLedger {
    successes: Vec<SuccessRecord>,
    issues: Vec<IssueRecord>,
}

impl OutcomeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_issue(&mut self, issue: IssueRecord) {
        info!(
            account = %issue.account_name,
            registration = %issue.registration_name,
            issue = %issue.description,
            "added issue"
        );
        self.issues.push(issue);
    }

    pub fn record_success(&mut self, success: SuccessRecord) {
        info!(
            account = %success.account_name,
            registration = %success.registration_name,
            case = %success.case_name,
            "added successfully updated registration"
        );
        self.successes.push(success);
    }

    /// Whether any issue recorded so far names this account.
    pub fn has_issue_for(&self, account_name: &str) -> bool {
        self.issues
            .iter()
            .any(|issue| issue.account_name == account_name)
    }

    pub fn successes(&self) -> &[SuccessRecord] {
        &self.successes
    }

    pub fn issues(&self) -> &[IssueRecord] {
        &self.issues
    }

    pub fn is_empty(&self) -> bool {
        self.successes.is_empty() && self.issues.is_empty()
    }
}
