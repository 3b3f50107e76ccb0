use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! record_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

record_id!(AccountId);
record_id!(ContactId);
record_id!(CaseId);
record_id!(RegistrationId);
record_id!(TemplateId);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub name: String,
    pub email: Option<String>,
}

/// A contact joined with the account it is primary contact for. The account is optional only so
/// malformed input can be represented; such contacts are never matched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub id: ContactId,
    pub last_name: String,
    pub email: Option<String>,
    pub account: Option<Account>,
}

/// Open support case asking for one registration to be cancelled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportCase {
    pub id: CaseId,
    pub ticket_number: String,
    pub title: String,
    pub customer_id: ContactId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    pub id: RegistrationId,
    pub name: String,
    pub account_id: AccountId,
    /// Lower value means higher priority.
    pub priority: i32,
    pub created_on: NaiveDateTime,
    pub status: String,
    pub sub_status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationTemplate {
    pub id: TemplateId,
    pub title: String,
    pub subject: String,
    pub body: String,
}

/// Status pair applied to a registration once its cancellation case is processed.
pub const CANCELLED_STATUS: &str = "Cancelled";
pub const CANCELLED_BY_TASK_SUB_STATUS: &str = "Cancelled by Task";

/// Resolution written against every processed case.
pub const RESOLUTION_SUBJECT: &str = "Case Resolved";
pub const CASE_CLOSED_STATUS_CODE: u32 = 5;

/// Requested registration transition, stamped with who made it and when.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationStatusChange {
    pub registration_id: RegistrationId,
    pub status: String,
    pub sub_status: String,
    pub modified_by: String,
    pub modified_on: NaiveDateTime,
}

impl RegistrationStatusChange {
    pub fn cancelled_by_task(
        registration: &Registration,
        actor: &str,
        now: NaiveDateTime,
    ) -> Self {
        Self {
            registration_id: registration.id.clone(),
            status: CANCELLED_STATUS.to_string(),
            sub_status: CANCELLED_BY_TASK_SUB_STATUS.to_string(),
            modified_by: actor.to_string(),
            modified_on: now,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseResolution {
    pub case_id: CaseId,
    pub ticket_number: String,
    pub subject: String,
    pub actual_end: NaiveDateTime,
    pub status_code: u32,
}

impl CaseResolution {
    pub fn resolved(case: &SupportCase, now: NaiveDateTime) -> Self {
        Self {
            case_id: case.id.clone(),
            ticket_number: case.ticket_number.clone(),
            subject: RESOLUTION_SUBJECT.to_string(),
            actual_end: now,
            status_code: CASE_CLOSED_STATUS_CODE,
        }
    }
}
