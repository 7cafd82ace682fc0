use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError, Weak},
    time::Duration,
};

use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{Instant, MissedTickBehavior, interval_at},
};
use tracing::{debug, warn};

use crate::{
    backend::{DownloadRequest, JobBackend},
    error::{Error, Result},
    types::{JobState, JobStatus},
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum MonitorPhase {
    #[default]
    Idle,
    Submitting,
    Polling,
    Done,
    Cancelled,
    Failed(String),
    /// Polling was ended by `stop`, `dispose` or dropping the monitor before
    /// the backend reported a terminal state.
    Stopped,
}

impl MonitorPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            MonitorPhase::Done
                | MonitorPhase::Cancelled
                | MonitorPhase::Failed(_)
                | MonitorPhase::Stopped
        )
    }

    pub fn is_active(&self) -> bool {
        matches!(self, MonitorPhase::Submitting | MonitorPhase::Polling)
    }
}

/// What the monitor last observed. `status` is the latest backend snapshot,
/// replaced whole on every successful poll.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MonitorSnapshot {
    pub phase: MonitorPhase,
    pub status: Option<JobStatus>,
    pub polls: u64,
}

impl MonitorSnapshot {
    pub fn is_success(&self) -> bool {
        self.phase == MonitorPhase::Done && self.status.as_ref().is_some_and(JobStatus::is_success)
    }
}

/// Submits one job at a time and polls its status until the backend reports
/// it done or cancelled.
///
/// The poll task ends by itself at a terminal status. [`JobMonitor::stop`]
/// ends it early, and dropping the monitor does the same, so no poll outlives
/// its observer.
pub struct JobMonitor<B> {
    backend: Arc<B>,
    interval: Duration,
    state: Arc<watch::Sender<MonitorSnapshot>>,
    poller: Poller,
}

type Poller = Arc<Mutex<Option<JoinHandle<()>>>>;

fn lock_poller(poller: &Poller) -> MutexGuard<'_, Option<JoinHandle<()>>> {
    poller.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Aborts the poll task, if any, and moves a `Polling` phase to `Stopped` so
/// every subscriber sees the job end.
fn halt(poller: &Poller, state: &watch::Sender<MonitorSnapshot>) {
    let Some(task) = lock_poller(poller).take() else {
        return;
    };
    task.abort();

    let stopped = state.send_if_modified(|snapshot| {
        if snapshot.phase != MonitorPhase::Polling {
            return false;
        }
        snapshot.phase = MonitorPhase::Stopped;
        true
    });
    if stopped {
        debug!("polling stopped before a terminal status");
    }
}

impl<B: JobBackend + 'static> JobMonitor<B> {
    pub fn new(backend: Arc<B>, interval: Duration) -> Self {
        let (state, _) = watch::channel(MonitorSnapshot::default());
        Self {
            backend,
            interval,
            state: Arc::new(state),
            poller: Arc::new(Mutex::new(None)),
        }
    }

    pub fn snapshot(&self) -> MonitorSnapshot {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> JobSubscription {
        JobSubscription {
            receiver: self.state.subscribe(),
            state: Arc::downgrade(&self.state),
            poller: Arc::clone(&self.poller),
        }
    }

    /// Posts the job and starts polling.
    ///
    /// Once the request is delivered the monitor polls whatever the backend
    /// answered; only a delivery failure ends in [`MonitorPhase::Failed`].
    ///
    /// # Errors
    ///
    /// - [`Error::Submit`] if a job is already being monitored
    /// - the backend's submit error, after the phase became `Failed`
    pub async fn submit(&self, request: &DownloadRequest) -> Result<JobSubscription> {
        let accepted = self.state.send_if_modified(|snapshot| {
            if snapshot.phase.is_active() {
                return false;
            }
            *snapshot = MonitorSnapshot {
                phase: MonitorPhase::Submitting,
                ..MonitorSnapshot::default()
            };
            true
        });
        if !accepted {
            return Err(Error::Submit(
                "a download job is already being monitored".to_string(),
            ));
        }

        if let Err(e) = self.backend.submit(request).await {
            warn!(error = %e, "job submission failed");
            self.state
                .send_modify(|snapshot| snapshot.phase = MonitorPhase::Failed(e.to_string()));
            return Err(e);
        }

        let subscription = self.subscribe();
        self.state
            .send_modify(|snapshot| snapshot.phase = MonitorPhase::Polling);

        let task = tokio::spawn(poll_loop(
            Arc::clone(&self.backend),
            self.interval,
            Arc::clone(&self.state),
        ));
        if let Some(previous) = lock_poller(&self.poller).replace(task) {
            previous.abort();
        }

        Ok(subscription)
    }

    /// Asks the backend to cancel. Polling continues until the backend
    /// itself reports the job cancelled.
    pub async fn cancel(&self) -> Result<()> {
        debug!("requesting job cancellation");
        self.backend.cancel().await
    }

    pub fn is_polling(&self) -> bool {
        lock_poller(&self.poller)
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    /// Stops polling without waiting for a terminal status. A job still being
    /// polled ends in [`MonitorPhase::Stopped`].
    pub fn stop(&self) {
        halt(&self.poller, &self.state);
    }
}

impl<B> Drop for JobMonitor<B> {
    fn drop(&mut self) {
        halt(&self.poller, &self.state);
    }
}

async fn poll_loop<B: JobBackend>(
    backend: Arc<B>,
    period: Duration,
    state: Arc<watch::Sender<MonitorSnapshot>>,
) {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        let status = match backend.status().await {
            Ok(status) => status,
            Err(e) => {
                warn!(error = %e, "status poll failed, retrying on next tick");
                continue;
            }
        };

        let phase = match status.state {
            JobState::Done => MonitorPhase::Done,
            JobState::Cancelled => MonitorPhase::Cancelled,
            _ => MonitorPhase::Polling,
        };
        let terminal = phase.is_terminal();

        debug!(
            state = %status.state,
            completed = status.completed_count,
            total = status.total_count,
            "job status"
        );
        // A stopped job keeps its phase even if this poll lands late
        let current = state.send_if_modified(|snapshot| {
            if snapshot.phase != MonitorPhase::Polling {
                return false;
            }
            snapshot.phase = phase;
            snapshot.status = Some(status);
            snapshot.polls += 1;
            true
        });

        if !current {
            break;
        }
        if terminal {
            debug!("job reached a terminal state, polling stopped");
            break;
        }
    }
}

/// Read side of a [`JobMonitor`], and the handle to stop its polling.
pub struct JobSubscription {
    receiver: watch::Receiver<MonitorSnapshot>,
    state: Weak<watch::Sender<MonitorSnapshot>>,
    poller: Poller,
}

impl JobSubscription {
    /// Stops the monitor's polling, like [`JobMonitor::stop`].
    pub fn dispose(self) {
        match self.state.upgrade() {
            Some(state) => halt(&self.poller, &state),
            None => {
                if let Some(task) = lock_poller(&self.poller).take() {
                    task.abort();
                }
            }
        }
    }

    pub fn snapshot(&self) -> MonitorSnapshot {
        self.receiver.borrow().clone()
    }

    /// Next snapshot after the last one seen, or `None` once the monitor is
    /// gone.
    pub async fn changed(&mut self) -> Option<MonitorSnapshot> {
        self.receiver.changed().await.ok()?;
        Some(self.receiver.borrow_and_update().clone())
    }

    /// Resolves at the first terminal phase. Resolves with the last snapshot
    /// if the monitor is dropped first.
    pub async fn wait(&mut self) -> MonitorSnapshot {
        loop {
            {
                let snapshot = self.receiver.borrow_and_update();
                if snapshot.phase.is_terminal() {
                    return snapshot.clone();
                }
            }
            if self.receiver.changed().await.is_err() {
                return self.receiver.borrow().clone();
            }
        }
    }
}
