//! `vdub` -- upload a video for dubbing and follow the job to completion.
//!
//! ```text
//! vdub <video-file> <target-language>   upload, poll, optionally download
//! vdub jobs                             list recent jobs on the server
//! ```
//!
//! # Environment variables
//!
//! | Variable                    | Default                 | Description                               |
//! |-----------------------------|-------------------------|-------------------------------------------|
//! | `VDUB_SERVER_URL`           | `http://localhost:5000` | Dubbing server root                       |
//! | `VDUB_POLL_INTERVAL_MS`     | `2000`                  | Milliseconds between status checks        |
//! | `VDUB_MAX_POLL_ATTEMPTS`    | `150`                   | Status checks before giving up            |
//! | `VDUB_REQUEST_TIMEOUT_SECS` | `30`                    | Timeout for status and listing requests   |
//! | `VDUB_DOWNLOAD_DIR`         | --                      | Save `dubbed_<file>` here when finished   |

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vdub_cli::ui::TerminalUi;
use vdub_core::upload::{UploadRequest, VideoFile};
use vdub_tracker::api::DubbingApi;
use vdub_tracker::config::TrackerConfig;
use vdub_tracker::events::TrackerEvent;
use vdub_tracker::tracker::JobTracker;

const USAGE: &str = "usage: vdub <video-file> <target-language>\n       vdub jobs";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vdub_cli=info,vdub_tracker=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = TrackerConfig::from_env()?;
    let api = DubbingApi::new(&config.server_url).with_request_timeout(config.request_timeout);

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.as_slice() {
        [command] if command == "jobs" => list_jobs(&api).await,
        [video, language] => dub(api, &config, Path::new(video), language).await,
        _ => {
            eprintln!("{USAGE}");
            std::process::exit(2);
        }
    }
}

async fn list_jobs(api: &DubbingApi) -> anyhow::Result<()> {
    let jobs = api.list_jobs().await.context("listing jobs")?;
    if jobs.is_empty() {
        println!("No jobs yet.");
        return Ok(());
    }
    for job in jobs {
        let created = job
            .created_at
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();
        println!(
            "{:<36}  {:<16} {:>3}%  {:<16}  {} -> {}",
            job.id, job.status, job.progress, created, job.filename, job.target_language,
        );
    }
    Ok(())
}

async fn dub(
    api: DubbingApi,
    config: &TrackerConfig,
    video: &Path,
    language: &str,
) -> anyhow::Result<()> {
    let metadata = tokio::fs::metadata(video)
        .await
        .with_context(|| format!("reading {}", video.display()))?;
    if !metadata.is_file() {
        anyhow::bail!("{} is not a file", video.display());
    }
    let file_name = video
        .file_name()
        .and_then(|n| n.to_str())
        .context("video path has no file name")?
        .to_string();

    tracing::info!(
        server_url = %config.server_url,
        interval_ms = config.poll.interval.as_millis() as u64,
        max_attempts = config.poll.max_attempts,
        "Starting vdub",
    );

    let tracker = JobTracker::new(api, config.poll.clone());
    let mut rx = tracker.subscribe();
    let mut ui = TerminalUi::new();

    // Validation sees the size on disk; the contents are streamed during
    // the upload.
    let file = VideoFile::from_path(file_name.clone(), video, metadata.len());
    let request = UploadRequest::new(file, language);
    let job_id = match tracker.submit(request).await {
        Ok(job_id) => job_id,
        Err(e) => {
            // Print whatever the tracker reported before giving up.
            loop {
                match rx.try_recv() {
                    Ok(event) => print_lines(&mut ui, &event),
                    Err(TryRecvError::Lagged(_)) => continue,
                    Err(_) => break,
                }
            }
            tracker.shutdown().await;
            anyhow::bail!(e);
        }
    };

    let outcome = tokio::select! {
        event = follow(&mut rx, &mut ui) => event,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!(job_id = %job_id, "Interrupted, stopping");
            None
        }
    };
    tracker.shutdown().await;

    match outcome {
        Some(TrackerEvent::Completed { job_id, .. }) => {
            if let Some(dir) = &config.download_dir {
                let dest = download(&tracker, &job_id, dir, &file_name).await?;
                println!("Saved {}", dest.display());
            }
            Ok(())
        }
        Some(TrackerEvent::Failed { error, .. }) => Err(error.into()),
        _ => anyhow::bail!("tracking stopped before job {job_id} finished"),
    }
}

/// Render events until the job reaches a terminal state. Returns `None`
/// if the tracker went away first.
async fn follow(
    rx: &mut tokio::sync::broadcast::Receiver<TrackerEvent>,
    ui: &mut TerminalUi,
) -> Option<TrackerEvent> {
    loop {
        match rx.recv().await {
            Ok(event) => {
                print_lines(ui, &event);
                if event.is_terminal() {
                    return Some(event);
                }
            }
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Terminal fell behind tracker events");
            }
            Err(RecvError::Closed) => return None,
        }
    }
}

fn print_lines(ui: &mut TerminalUi, event: &TrackerEvent) {
    for line in ui.apply(event, chrono::Utc::now()) {
        eprintln!("{line}");
    }
}

async fn download(
    tracker: &Arc<JobTracker<DubbingApi>>,
    job_id: &vdub_core::types::JobId,
    dir: &Path,
    file_name: &str,
) -> anyhow::Result<PathBuf> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("creating {}", dir.display()))?;
    let dest = dir.join(format!("dubbed_{file_name}"));
    let saved = tracker
        .service()
        .download_to(job_id, &dest)
        .await
        .with_context(|| format!("downloading job {job_id}"))?;
    Ok(saved)
}
