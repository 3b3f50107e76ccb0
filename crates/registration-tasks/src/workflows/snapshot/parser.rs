use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::warn;

use super::SnapshotError;

#[derive(Debug, Deserialize)]
pub(crate) struct SystemRuleRow {
    pub(crate) slug: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub(crate) value: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AccountRow {
    pub(crate) account_id: String,
    pub(crate) name: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub(crate) email: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub(crate) primary_contact_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ContactRow {
    pub(crate) contact_id: String,
    pub(crate) last_name: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub(crate) email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CaseRow {
    pub(crate) case_id: String,
    pub(crate) ticket_number: String,
    pub(crate) title: String,
    pub(crate) customer_id: String,
    #[serde(default)]
    pub(crate) case_type_code: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RegistrationRow {
    pub(crate) registration_id: String,
    pub(crate) name: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub(crate) account_id: Option<String>,
    pub(crate) priority: i32,
    pub(crate) created_on: String,
    pub(crate) status: String,
    pub(crate) sub_status: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TemplateRecord {
    pub(crate) id: String,
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) subject: String,
    #[serde(default)]
    pub(crate) body: String,
}

pub(crate) fn read_csv<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, SnapshotError> {
    let file = File::open(path).map_err(|source| SnapshotError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    parse_csv(file)
}

pub(crate) fn parse_csv<T: DeserializeOwned, R: Read>(reader: R) -> Result<Vec<T>, SnapshotError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    csv_reader.headers()?;

    let mut rows = Vec::new();
    for record in csv_reader.deserialize::<T>() {
        match record {
            Ok(row) => rows.push(row),
            Err(err) if matches!(err.kind(), csv::ErrorKind::Io(_)) => return Err(err.into()),
            Err(err) => {
                let line = err.position().map(|position| position.line());
                warn!(?line, error = %err, "skipping unreadable snapshot row");
            }
        }
    }
    Ok(rows)
}

pub(crate) fn read_templates(path: &Path) -> Result<Vec<TemplateRecord>, SnapshotError> {
    let file = File::open(path).map_err(|source| SnapshotError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_reader(file)?)
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

pub(crate) fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.naive_utc());
    }

    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(dt);
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }

    None
}
