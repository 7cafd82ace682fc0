//! # CLI Module
//!
//! User-facing commands of sporldl. Each command wires the library components
//! together, renders progress with `indicatif` and tables with `tabled`, and
//! reports outcomes through the crate's console macros.
//!
//! ## Command Categories
//!
//! ### Authentication
//!
//! - [`auth`] - Runs the browser sign-in and prints a refresh token that can be
//!   stored as `SPOTIFY_REFRESH_TOKEN` to skip the browser next time
//!
//! ### Catalog
//!
//! - [`list_playlists`] - Lists the signed-in user's playlists
//! - [`list_tracks`] - Lists the tracks of one playlist
//!
//! ### Download
//!
//! - [`download`] - Applies the selection picks, builds the batch, submits it
//!   and follows the job until it is done or cancelled (Ctrl-C cancels)
//!
//! ### Job
//!
//! - [`status`] - Prints the backend's current job status
//! - [`cancel`] - Asks the backend to cancel the current job
//! - [`fetch`] - Saves one completed file or the archive of all of them
//!
//! ## Session Handling
//!
//! Commands that talk to the catalog start by establishing a session with
//! [`session`]: a configured refresh token seeds it directly, otherwise the
//! browser sign-in runs. Tokens are never written to disk.
//!
//! ## Error Handling
//!
//! Failures that leave nothing to do end the command through `error!` with a
//! hint: authentication failures point at `sporldl auth`, network failures
//! suggest trying again. Nothing is retried automatically.

mod auth;
mod download;
mod job;
mod playlists;
mod tracks;

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

pub use auth::{Session, auth, session};
pub use download::{DownloadOptions, download};
pub use job::{cancel, fetch, status};
pub use playlists::list_playlists;
pub use tracks::list_tracks;

use crate::{error, error::Error};

pub(crate) fn fail(context: &str, e: &Error) -> ! {
    if e.requires_sign_in() {
        error!(
            "{}: {}\nRun sporldl auth and set SPOTIFY_REFRESH_TOKEN, or sign in again.",
            context, e
        );
    }
    if e.is_network() {
        error!("{}: {}\nPlease try again.", context, e);
    }
    error!("{}: {}", context, e);
}

pub(crate) fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    if let Ok(style) = ProgressStyle::with_template("{spinner:.blue} {msg}") {
        pb.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
    }
    pb
}
