//! Eager (whole-pass) entry points.
//!
//! [`depict`] is pure: split, build URLs, render fragments. [`depict_checked`]
//! additionally probes every image over HTTP and folds the outcomes back into
//! the fragments before returning. Use [`crate::stream::probe_stream`] when
//! outcomes should be consumed as they arrive.

use crate::board::{Board, PassHandle, RenderPass};
use crate::config::{DepictConfig, RenderOptions};
use crate::error::DepictError;
use crate::output::{ProbeOutcome, RenderOutput};
use crate::pipeline::probe::{self, ProbeStatus};
use futures::stream::{self, StreamExt};
use std::path::Path;
use std::time::Instant;
use tracing::{info, warn};

/// Render pasted text without touching the network.
///
/// # Example
/// ```rust
/// use depict_board::{depict, DepictConfig, RenderOptions};
///
/// let out = depict("CCO ethanol\nCCO>>CCN", RenderOptions::default(), &DepictConfig::default());
/// assert_eq!(out.fragments.len(), 2);
/// assert_eq!(out.fragments[0].title, "ethanol");
/// assert!(out.fragments[0].urls.svg.starts_with("./depict/cow/svg?smi=CCO%20ethanol"));
/// ```
pub fn depict(text: &str, options: RenderOptions, config: &DepictConfig) -> RenderOutput {
    let start = Instant::now();
    let mut output = RenderPass::build(text, options, config, 1).into_output();
    output.stats.duration_ms = start.elapsed().as_millis() as u64;
    output
}

/// Render pasted text and probe every depiction.
///
/// Images that fail are replaced by the service's error message. A failing
/// image never aborts the pass.
///
/// # Errors
/// Returns `Err(DepictError)` only when probing cannot start at all: a
/// relative root URL or an HTTP client that cannot be built.
pub async fn depict_checked(
    text: &str,
    options: RenderOptions,
    config: &DepictConfig,
) -> Result<RenderOutput, DepictError> {
    let start = Instant::now();
    let mut board = Board::new(config.clone());
    board.render(text, options);
    let handle = board
        .handle()
        .ok_or_else(|| DepictError::Internal("render pass missing".into()))?;

    let outcomes = probe_pass(&handle, config).await?;
    let applied = outcomes.iter().filter(|o| board.apply(o)).count();
    info!("Applied {}/{} probe outcomes", applied, outcomes.len());

    let mut output = board
        .output()
        .ok_or_else(|| DepictError::Internal("render pass missing".into()))?;
    output.stats.duration_ms = start.elapsed().as_millis() as u64;
    Ok(output)
}

/// Synchronous wrapper around [`depict_checked`].
///
/// Creates a temporary tokio runtime internally.
pub fn depict_checked_sync(
    text: &str,
    options: RenderOptions,
    config: &DepictConfig,
) -> Result<RenderOutput, DepictError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| DepictError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(depict_checked(text, options, config))
}

/// Read structure text from a file.
pub async fn read_input(path: impl AsRef<Path>) -> Result<String, DepictError> {
    let path = path.as_ref();
    tokio::fs::read_to_string(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            DepictError::InputNotFound {
                path: path.to_path_buf(),
            }
        } else {
            DepictError::InputReadFailed {
                path: path.to_path_buf(),
                source: e,
            }
        }
    })
}

/// Write `contents` to `path` atomically (temp file + rename).
pub async fn write_output(path: impl AsRef<Path>, contents: &str) -> Result<(), DepictError> {
    let path = path.as_ref();
    let write_err = |source| DepictError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = std::path::PathBuf::from(tmp_name);
    tokio::fs::write(&tmp_path, contents).await.map_err(write_err)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(write_err)?;
    Ok(())
}

/// Probe every target of a pass concurrently.
///
/// Outcomes arrive in completion order; probes cancelled by the pass token
/// are left out.
pub async fn probe_pass(
    handle: &PassHandle,
    config: &DepictConfig,
) -> Result<Vec<ProbeOutcome>, DepictError> {
    if !config.is_absolute_root() {
        return Err(DepictError::RelativeRootUrl {
            root: config.root_url.clone(),
        });
    }
    let client = probe::client(config.timeout_secs).map_err(|e| DepictError::HttpClient(e.to_string()))?;
    let total = handle.targets.len();

    if let Some(ref cb) = config.progress_callback {
        cb.on_probe_start(total);
    }

    let outcomes: Vec<ProbeOutcome> = stream::iter(handle.targets.clone().into_iter().map(|target| {
        let client = client.clone();
        async move { probe_target(&client, handle, &target, total, config).await }
    }))
    .buffer_unordered(config.concurrency)
    .filter_map(|o| async move { o })
    .collect()
    .await;

    let loaded = outcomes.iter().filter(|o| o.error.is_none()).count();
    if loaded < outcomes.len() {
        warn!("{} of {} depictions failed", outcomes.len() - loaded, outcomes.len());
    }
    if let Some(ref cb) = config.progress_callback {
        cb.on_probe_complete(total, loaded);
    }
    Ok(outcomes)
}

/// Probe one target and report it; `None` when the pass was cancelled.
pub(crate) async fn probe_target(
    client: &reqwest::Client,
    handle: &PassHandle,
    target: &crate::board::ProbeTarget,
    total: usize,
    config: &DepictConfig,
) -> Option<ProbeOutcome> {
    let start = Instant::now();
    if let Some(ref cb) = config.progress_callback {
        cb.on_record_start(target.position, total);
    }

    let status = probe::probe(
        client,
        &target.url,
        target.position,
        config.timeout_secs,
        &handle.token,
    )
    .await;

    let (error, bytes) = match status {
        ProbeStatus::Cancelled => return None,
        ProbeStatus::Loaded { bytes } => (None, bytes),
        ProbeStatus::Failed(e) => (Some(e), 0),
    };

    if let Some(ref cb) = config.progress_callback {
        match &error {
            None => cb.on_record_loaded(target.position, total, bytes),
            Some(e) => cb.on_record_error(target.position, total, &e.display_message()),
        }
    }

    Some(ProbeOutcome {
        generation: handle.generation,
        index: target.index,
        position: target.position,
        error,
        bytes,
        duration_ms: start.elapsed().as_millis() as u64,
    })
}
