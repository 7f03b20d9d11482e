//! Action routing: where "view" navigates for a notification.

use crate::model::notification::{Notification, NotificationType};

pub const NOTIFICATIONS_ROUTE: &str = "/dashboard/notifications";
pub const REPORTS_ROUTE: &str = "/dashboard/citizen/reports";
pub const APPEALS_ROUTE: &str = "/dashboard/citizen/appeals";
pub const REWARDS_ROUTE: &str = "/dashboard/citizen/rewards";
pub const TRANSACTIONS_ROUTE: &str = "/dashboard/citizen/transactions";
pub const DEBTS_ROUTE: &str = "/dashboard/citizen/debts";

/// Default destination for a notification type.
pub fn default_route(kind: &NotificationType) -> &'static str {
    match kind {
        NotificationType::ReportSubmitted
        | NotificationType::ReportApproved
        | NotificationType::ReportRejected => REPORTS_ROUTE,
        NotificationType::AppealSubmitted
        | NotificationType::AppealApproved
        | NotificationType::AppealRejected => APPEALS_ROUTE,
        NotificationType::RewardEarned => REWARDS_ROUTE,
        NotificationType::PaymentReceived => TRANSACTIONS_ROUTE,
        NotificationType::DebtCreated | NotificationType::PenaltyApplied => DEBTS_ROUTE,
        NotificationType::System | NotificationType::Error | NotificationType::Other(_) => {
            NOTIFICATIONS_ROUTE
        }
    }
}

/// The literal `action_url` when present, else the type's default route.
pub fn route_for(notification: &Notification) -> String {
    match notification.action_url.as_deref() {
        Some(url) if !url.trim().is_empty() => url.to_string(),
        _ => default_route(&notification.kind).to_string(),
    }
}
