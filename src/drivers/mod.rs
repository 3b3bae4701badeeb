//! Drivers shipped with the crate.
//!
//! - [`DebugDriver`] - logs every call via `tracing`
//! - [`GtmDriver`] - shapes events for Google Tag Manager and pushes them to a [`DataLayer`]
//! - [`ServerStubDriver`] - stands in for client-only backends on the server; never loads
//!
//! Register them through [`DriverRegistry::builtin`](crate::DriverRegistry::builtin)
//! or individually with [`constructor`](crate::constructor).

mod data_layer;
mod debug;
mod gtm;
mod server_stub;

use std::time::Duration;

use tokio::time::{Instant, sleep};

pub use data_layer::{DataLayer, DataLayers};
pub use debug::DebugDriver;
pub use gtm::GtmDriver;
pub use server_stub::ServerStubDriver;

/// Polls `probe` every `interval` until it answers `true` or `timeout` elapses.
///
/// Meant for [`Driver::load`](crate::Driver::load) implementations waiting
/// for an external backend to become available. Returns whether the probe
/// succeeded in time.
pub async fn poll_until<F>(interval: Duration, timeout: Duration, mut probe: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = Instant::now() + timeout;
    loop {
        if probe() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        sleep(interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_poll_until_succeeds_eventually() {
        let mut calls = 0;
        let ready = poll_until(Duration::from_millis(10), Duration::from_secs(1), || {
            calls += 1;
            calls == 3
        })
        .await;
        assert!(ready);
        assert_eq!(calls, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_until_times_out() {
        let ready = poll_until(Duration::from_millis(100), Duration::from_millis(250), || false).await;
        assert!(!ready);
    }
}
