//! Streaming probe API: emit outcomes as depictions finish loading.
//!
//! Unlike [`crate::depict::depict_checked`], which returns only after every
//! image was probed, [`probe_stream`] yields each [`ProbeOutcome`] as soon as
//! its request completes, in completion order. Feed them to
//! [`crate::board::Board::apply`]; outcomes from a pass the board has since
//! replaced are rejected there.
//!
//! Cancelling the pass (re-rendering or clearing the board) ends the stream
//! early: in-flight probes resolve to nothing.

use crate::board::PassHandle;
use crate::config::DepictConfig;
use crate::depict::probe_target;
use crate::error::DepictError;
use crate::output::ProbeOutcome;
use crate::pipeline::probe;
use futures::stream::{self, StreamExt};
use std::pin::Pin;
use tokio_stream::Stream;
use tracing::info;

/// A boxed stream of probe outcomes.
pub type OutcomeStream = Pin<Box<dyn Stream<Item = ProbeOutcome> + Send>>;

/// Probe a pass, streaming outcomes as they complete.
///
/// # Example
/// ```rust,no_run
/// use depict_board::{probe_stream, Board, DepictConfig, RenderOptions};
/// use futures::StreamExt;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = DepictConfig::builder()
///     .root_url("http://localhost:8080/cdkdepict")
///     .build()?;
/// let mut board = Board::new(config.clone());
/// board.render("CCO ethanol\nC1CC broken", RenderOptions::default());
///
/// let handle = board.handle().expect("just rendered");
/// let mut outcomes = probe_stream(handle, &config)?;
/// while let Some(outcome) = outcomes.next().await {
///     board.apply(&outcome);
/// }
/// # Ok(())
/// # }
/// ```
pub fn probe_stream(handle: PassHandle, config: &DepictConfig) -> Result<OutcomeStream, DepictError> {
    if !config.is_absolute_root() {
        return Err(DepictError::RelativeRootUrl {
            root: config.root_url.clone(),
        });
    }
    let client = probe::client(config.timeout_secs).map_err(|e| DepictError::HttpClient(e.to_string()))?;
    let total = handle.targets.len();
    info!("Streaming probes for pass {} ({} records)", handle.generation, total);

    let concurrency = config.concurrency;
    let config = config.clone();
    let targets = handle.targets.clone();

    let s = stream::iter(targets.into_iter().map(move |target| {
        let client = client.clone();
        let handle = handle.clone();
        let config = config.clone();
        async move { probe_target(&client, &handle, &target, total, &config).await }
    }))
    .buffer_unordered(concurrency)
    .filter_map(|o| async move { o });

    Ok(Box::pin(s))
}
