use std::{
    sync::mpsc::{self, Receiver},
    thread,
    time::{Duration, Instant},
};

use derive_more::Display;

use super::{client::ApiClient, transport::Transport};

#[derive(Debug, Clone, PartialEq, Display)]
pub enum HealthStatus {
    #[display(fmt = "checking")]
    Unknown,

    #[display(fmt = "online")]
    Online,

    #[display(fmt = "offline ({})", _0)]
    Offline(String),
}

/// Periodic backend connectivity check
#[derive(Debug)]
pub struct HealthMonitor {
    interval: Duration,
    last_checked: Option<Instant>,
    status: HealthStatus,
}

impl HealthMonitor {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_checked: None,
            status: HealthStatus::Unknown,
        }
    }

    pub fn status(&self) -> &HealthStatus {
        &self.status
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_due(&self, now: Instant) -> bool {
        match self.last_checked {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.interval,
        }
    }

    /// Runs a check when the interval has elapsed. Returns whether a
    /// request was made.
    pub fn poll<T: Transport>(&mut self, client: &ApiClient<T>, now: Instant) -> bool {
        if !self.is_due(now) {
            return false;
        }

        self.check(client, now);

        true
    }

    pub fn check<T: Transport>(&mut self, client: &ApiClient<T>, now: Instant) -> &HealthStatus {
        let status = match client.health() {
            Ok(_) => HealthStatus::Online,
            Err(e) => HealthStatus::Offline(e.to_string()),
        };

        if status != self.status {
            log::info!("Backend is {}", status);
        }

        self.status = status;
        self.last_checked = Some(now);

        &self.status
    }
}

/// Runs the health checks on a background thread so a backend that does
/// not answer never stalls the dashboard.
pub struct HealthWatcher {
    status: HealthStatus,
    updates: Receiver<HealthStatus>,
}

impl HealthWatcher {
    /// The thread stops once the watcher is dropped
    pub fn spawn<T>(client: ApiClient<T>, interval: Duration) -> Self
    where
        T: Transport + Send + 'static,
    {
        let (sender, updates) = mpsc::channel();

        thread::spawn(move || {
            let mut monitor = HealthMonitor::new(interval);

            loop {
                if monitor.poll(&client, Instant::now())
                    && sender.send(monitor.status().clone()).is_err()
                {
                    break;
                }

                thread::sleep(monitor.interval());
            }
        });

        Self {
            status: HealthStatus::Unknown,
            updates,
        }
    }

    pub fn status(&self) -> &HealthStatus {
        &self.status
    }

    /// Takes the newest status the background thread reported, if any
    pub fn refresh(&mut self) -> &HealthStatus {
        while let Ok(status) = self.updates.try_recv() {
            self.status = status;
        }

        &self.status
    }
}
