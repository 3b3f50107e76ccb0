use std::fmt::Write as _;

use super::ledger::{IssueRecord, SuccessRecord};

pub const SUMMARY_SUBJECT: &str = "Registration Update Summary";

const TABLE_OPEN: &str = r#"<table style="font-family: arial, sans-serif; border-collapse: collapse; width: 100%;">"#;
const CELL_OPEN: &str = r#"<td style="border: 1px solid #dddddd; text-align: left; padding: 8px;">"#;
const HEADER_OPEN: &str = r#"<th style="border: 1px solid #dddddd; text-align: left; padding: 8px;">"#;

/// HTML body of the summary email: successfully updated registrations followed by issues.
pub fn render_summary_html(successes: &[SuccessRecord], issues: &[IssueRecord]) -> String {
    let mut html = String::new();

    let _ = write!(
        html,
        "<h3>Successfully updated registrations ({})</h3>",
        successes.len()
    );
    push_table(
        &mut html,
        ["Account", "Registration", "Case"],
        successes.iter().map(|success| {
            [
                success.account_name.as_str(),
                success.registration_name.as_str(),
                success.case_name.as_str(),
            ]
        }),
    );

    let _ = write!(html, "<h3>Issues ({})</h3>", issues.len());
    push_table(
        &mut html,
        ["Account", "Registration", "Issue"],
        issues.iter().map(|issue| {
            [
                issue.account_name.as_str(),
                issue.registration_name.as_str(),
                issue.description.as_str(),
            ]
        }),
    );

    html
}

fn push_table<'a>(
    html: &mut String,
    headers: [&str; 3],
    rows: impl Iterator<Item = [&'a str; 3]>,
) {
    html.push_str(TABLE_OPEN);
    html.push_str("<tr>");
    for header in headers {
        let _ = write!(html, "{HEADER_OPEN}{}</th>", escape_html(header));
    }
    html.push_str("</tr>");

    for row in rows {
        html.push_str("<tr>");
        for cell in row {
            let _ = write!(html, "{CELL_OPEN}{}</td>", escape_html(cell));
        }
        html.push_str("</tr>");
    }
    html.push_str("</table>");
}

fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}
