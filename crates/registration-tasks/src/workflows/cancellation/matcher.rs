use std::cmp::Ordering;

use super::domain::{AccountId, Registration};

/// Picks the registration a cancellation case acts on: the account's registration with the
/// lowest priority value, and among equal priorities the most recently created one.
///
/// Remaining ties (same priority and creation time) fall back to the registration id so the
/// choice never depends on input order.
pub fn select_registration<'a>(
    account_id: &AccountId,
    registrations: &'a [Registration],
) -> Option<&'a Registration> {
    registrations
        .iter()
        .filter(|registration| &registration.account_id == account_id)
        .min_by(|left, right| match_order(left, right))
}

fn match_order(left: &Registration, right: &Registration) -> Ordering {
    left.priority
        .cmp(&right.priority)
        .then_with(|| right.created_on.cmp(&left.created_on))
        .then_with(|| left.id.cmp(&right.id))
}
