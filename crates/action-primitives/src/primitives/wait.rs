//! Settle primitive - fixed pause after an action

use std::time::Duration;
use tokio::time::sleep;
use tracing::trace;

pub async fn execute_settle(delay: Duration) {
    if delay.is_zero() {
        return;
    }
    trace!(delay_ms = delay.as_millis() as u64, "Settling");
    sleep(delay).await;
}
