use std::path::{Path, PathBuf};

use tabled::Table;

use crate::{
    backend::{HttpBackend, JobBackend, MonitorPhase, MonitorSnapshot},
    cli::{fail, spinner},
    config, info,
    types::{ArtifactTableRow, JobStatus},
    success, utils, warning,
};

const ZIP_FILE_NAME: &str = "sporldl.zip";

pub async fn status(user_id: Option<String>) {
    let backend = HttpBackend::new(config::backend_url(), user_id);

    let status = match backend.status().await {
        Ok(status) => status,
        Err(e) => fail("Cannot read the job status", &e),
    };

    info!(
        "Job is {} ({}/{})",
        status.state, status.completed_count, status.total_count
    );
    if let Some(current) = status.currently_processing() {
        info!("Now processing: {}", utils::truncate(current, 64));
    }
    for line in &status.recent_logs {
        println!("    {}", line);
    }

    print_artifacts(&backend, &status);
}

pub async fn cancel(user_id: Option<String>) {
    let backend = HttpBackend::new(config::backend_url(), user_id);

    match backend.cancel().await {
        Ok(()) => success!("Cancellation requested. Check progress with sporldl status."),
        Err(e) => fail("Cannot cancel the job", &e),
    }
}

/// Saves one completed file into `dest`, or the archive of all of them when
/// no path is given. A directory `dest` receives the archive as
/// `sporldl.zip`.
pub async fn fetch(user_id: Option<String>, path: Option<String>, dest: PathBuf) {
    let backend = HttpBackend::new(config::backend_url(), user_id);

    let pb = spinner("Downloading...");
    let result = match &path {
        Some(storage_path) => backend.fetch_file(storage_path, &dest).await,
        None => backend.fetch_zip(&zip_destination(&dest)).await,
    };
    pb.finish_and_clear();

    match result {
        Ok(saved) => success!("Saved {}", saved.display()),
        Err(e) => fail("Cannot fetch from the backend", &e),
    }
}

pub(crate) fn report_outcome(backend: &HttpBackend, snapshot: &MonitorSnapshot) {
    let Some(status) = &snapshot.status else {
        warning!("The backend never reported a status for this job.");
        return;
    };

    match &snapshot.phase {
        MonitorPhase::Done if snapshot.is_success() => {
            success!("All {} tracks downloaded.", status.completed_count)
        }
        MonitorPhase::Done => warning!(
            "Job finished with {} of {} tracks.",
            status.completed_count,
            status.total_count
        ),
        MonitorPhase::Cancelled => warning!(
            "Job cancelled after {} of {} tracks.",
            status.completed_count,
            status.total_count
        ),
        MonitorPhase::Failed(reason) => warning!("Job failed: {}", reason),
        _ => warning!(
            "Stopped following the job while it was {} ({}/{}).",
            status.state,
            status.completed_count,
            status.total_count
        ),
    }

    print_artifacts(backend, status);
}

fn print_artifacts(backend: &HttpBackend, status: &JobStatus) {
    if status.completed_artifacts.is_empty() {
        return;
    }

    let rows: Vec<ArtifactTableRow> = status
        .completed_artifacts
        .iter()
        .map(|artifact| ArtifactTableRow {
            name: utils::truncate(&artifact.display_name, 48),
            path: artifact.storage_path.clone(),
        })
        .collect();
    println!("{}", Table::new(rows));

    if let Ok(url) = backend.zip_url() {
        info!("Download everything at {}", url);
    }
}

fn zip_destination(dest: &Path) -> PathBuf {
    if dest.is_dir() {
        dest.join(ZIP_FILE_NAME)
    } else {
        dest.to_path_buf()
    }
}
