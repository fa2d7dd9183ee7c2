//! Deliver-now versus reschedule decision.
//!
//! The stream's redelivery delay is the only timer: a message that arrives
//! early is negatively acknowledged with the remaining wait, so granularity
//! is bounded by how precisely the stream honours that delay and delivery is
//! at-least-once.

use std::time::Duration;

use hakase_models::chrono::{DateTime, TimeDelta, Utc};

/// Delay before retrying a reminder whose delivery failed.
pub const DELIVERY_RETRY_DELAY: Duration = Duration::from_secs(15 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryPlan {
    DeliverNow,
    RescheduleIn(Duration),
}

/// `due - lead_time`, saturating to the earliest instant on overflow.
pub fn notify_at(due: DateTime<Utc>, lead_time: Duration) -> DateTime<Utc> {
    TimeDelta::from_std(lead_time)
        .ok()
        .and_then(|lead_time| due.checked_sub_signed(lead_time))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

pub fn plan_delivery(notify_at: DateTime<Utc>, now: DateTime<Utc>) -> DeliveryPlan {
    if now >= notify_at {
        return DeliveryPlan::DeliverNow;
    }

    match (notify_at - now).to_std() {
        Ok(delay) if !delay.is_zero() => DeliveryPlan::RescheduleIn(delay),
        _ => DeliveryPlan::DeliverNow,
    }
}
