//! # Download Backend Module
//!
//! Client side of the download job: submitting a batch, following its progress,
//! cancelling it, and retrieving what it produced.
//!
//! ## Job API
//!
//! - `POST /download` - starts a job from `{playlists, quality, output_path}`
//! - `GET /status` - the job's complete current status
//! - `POST /cancel` - asks the job to stop
//! - `GET /file?path=` - one completed artifact
//! - `GET /zip` - an archive of all completed artifacts
//!
//! Each call takes an optional `user_id` query parameter so several sessions
//! can share one backend.
//!
//! ## Monitoring
//!
//! [`JobMonitor`] moves through
//! `Idle -> Submitting -> Polling -> {Done, Cancelled, Failed}` and publishes
//! every step to its [`JobSubscription`]s. Cancellation is a request to the
//! backend: the monitor keeps polling until the backend itself reports the job
//! cancelled, so the final completed count and artifact list are accurate.
//! There is no client-side timeout; a backend that never finishes is polled
//! until the monitor is stopped or dropped.

mod client;
mod monitor;

pub use client::{DownloadRequest, HttpBackend, JobBackend};
pub use monitor::{JobMonitor, JobSubscription, MonitorPhase, MonitorSnapshot};
