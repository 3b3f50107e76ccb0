use chrono::NaiveDateTime;

use super::domain::{Contact, NotificationTemplate, Registration, SupportCase};
use super::ports::ContactNotification;

const LAST_NAME_PLACEHOLDER: &str = "#LastName#";
const CASE_NUMBER_PLACEHOLDER: &str = "#caseNumber#";
const REGISTRATION_NAME_PLACEHOLDER: &str = "#RegistrationName#";

/// Fills the template for one contact. Placeholders are only substituted in the body; the
/// subject is used as written.
pub fn render_notification(
    template: &NotificationTemplate,
    contact: &Contact,
    case: &SupportCase,
    registration: &Registration,
    actor: &str,
    now: NaiveDateTime,
) -> ContactNotification {
    let body = template
        .body
        .replace(LAST_NAME_PLACEHOLDER, &contact.last_name)
        .replace(CASE_NUMBER_PLACEHOLDER, &case.ticket_number)
        .replace(REGISTRATION_NAME_PLACEHOLDER, &registration.name);

    ContactNotification {
        from: actor.to_string(),
        to_contact: contact.id.clone(),
        to_address: contact.email.clone(),
        template_title: template.title.clone(),
        subject: template.subject.clone(),
        body,
        created_on: now,
    }
}
