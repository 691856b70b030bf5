use crate::state::messages::NetworkRequest;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::interval;

pub const STANDINGS_REFRESH_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Asks for fresh standings every five minutes.
pub struct PeriodicRefresher {
    network_requests: mpsc::Sender<NetworkRequest>,
    every: Duration,
}

impl PeriodicRefresher {
    pub fn new(network_requests: mpsc::Sender<NetworkRequest>) -> Self {
        Self {
            network_requests,
            every: STANDINGS_REFRESH_INTERVAL,
        }
    }

    pub async fn run(self) {
        let mut standings_interval = interval(self.every);
        // Skip the immediate first tick so startup loading isn't double-triggered.
        standings_interval.tick().await;

        loop {
            standings_interval.tick().await;
            if self
                .network_requests
                .send(NetworkRequest::RefreshStandings)
                .await
                .is_err()
            {
                break;
            }
        }
    }
}
