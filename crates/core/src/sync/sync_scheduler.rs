//! Periodic sweep across connections with start/stop/trigger controls.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use log::{debug, error, info};
use tokio::task::JoinHandle;

use super::sync_model::BatchSyncResult;
use super::sync_service::TransactionSyncServiceTrait;

/// What started a sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepTrigger {
    Periodic,
    Manual,
}

impl SweepTrigger {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Periodic => "periodic",
            Self::Manual => "manual",
        }
    }
}

struct SweepRunner {
    sync_service: Arc<dyn TransactionSyncServiceTrait>,
    in_flight: AtomicBool,
}

/// Clears the in-flight flag even if the sweep future is dropped mid-way.
struct SweepFlag<'a>(&'a AtomicBool);

impl Drop for SweepFlag<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl SweepRunner {
    async fn run(&self, trigger: SweepTrigger) -> Option<BatchSyncResult> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            info!(
                "[AutoSyncScheduler] Sweep already in progress, skipping {} trigger",
                trigger.as_str()
            );
            return None;
        }
        let _flag = SweepFlag(&self.in_flight);

        info!("[AutoSyncScheduler] Running {} sweep", trigger.as_str());
        let result = self.sync_service.sync_all_connections().await;
        if result.failed.is_empty() {
            info!(
                "[AutoSyncScheduler] Sweep complete: {} synced, {} inserted",
                result.synced.len(),
                result.total_inserted
            );
        } else {
            error!(
                "[AutoSyncScheduler] Sweep complete with failures: {} synced, {} failed",
                result.synced.len(),
                result.failed.len()
            );
        }
        Some(result)
    }
}

/// Drives `sync_all_connections` on an interval. The timer itself is a tokio
/// task; at most one sweep runs per process at a time.
pub struct AutoSyncScheduler {
    runner: Arc<SweepRunner>,
    interval: Duration,
    background_task: Mutex<Option<JoinHandle<()>>>,
}

impl AutoSyncScheduler {
    pub fn new(sync_service: Arc<dyn TransactionSyncServiceTrait>, interval: Duration) -> Self {
        Self {
            runner: Arc::new(SweepRunner {
                sync_service,
                in_flight: AtomicBool::new(false),
            }),
            interval,
            background_task: Mutex::new(None),
        }
    }

    /// Spawns the background loop: one sweep right away, then one per interval.
    /// Returns false when the loop is already running. Must be called from
    /// within a tokio runtime.
    pub fn start(&self) -> bool {
        let mut guard = self
            .background_task
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        if let Some(handle) = guard.as_ref() {
            if !handle.is_finished() {
                debug!("[AutoSyncScheduler] Already running");
                return false;
            }
            guard.take();
        }

        info!(
            "[AutoSyncScheduler] Starting with {}s interval",
            self.interval.as_secs()
        );
        let runner = Arc::clone(&self.runner);
        let interval = self.interval;
        let handle = tokio::spawn(async move {
            loop {
                runner.run(SweepTrigger::Periodic).await;
                tokio::time::sleep(interval).await;
            }
        });
        *guard = Some(handle);
        true
    }

    /// Aborts the background loop. Returns false when it was not running.
    pub fn stop(&self) -> bool {
        let mut guard = self
            .background_task
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        match guard.take() {
            Some(handle) => {
                handle.abort();
                info!("[AutoSyncScheduler] Stopped");
                true
            }
            None => {
                debug!("[AutoSyncScheduler] Not running");
                false
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.background_task
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    pub fn is_sweep_in_flight(&self) -> bool {
        self.runner.in_flight.load(Ordering::Acquire)
    }

    /// Runs a sweep now, started or not. Returns `None` when another sweep is
    /// already in progress.
    pub async fn trigger_manual_sync(&self) -> Option<BatchSyncResult> {
        self.runner.run(SweepTrigger::Manual).await
    }
}

impl Drop for AutoSyncScheduler {
    fn drop(&mut self) {
        if let Some(handle) = self
            .background_task
            .get_mut()
            .unwrap_or_else(|e| e.into_inner())
            .take()
        {
            handle.abort();
        }
    }
}
