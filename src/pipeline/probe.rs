//! Image probing: load each depiction and recover the service's error text.
//!
//! In the browser, a broken `<img>` triggers a follow-up request whose HTML
//! error body is pasted in place of the image. Here the load request and the
//! recovery request coincide: a non-2xx response *is* the error body, so one
//! GET per fragment is enough. There is no retry: a failed transport yields a
//! generic label.
//!
//! Every probe belongs to a render pass and carries that pass's
//! [`CancellationToken`]. The token is checked before the request and raced
//! against it while the request is in flight, so a superseded pass never
//! produces an outcome that could touch the new pass's fragments.

use crate::error::RecordError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// What happened to one probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeStatus {
    /// The service returned an image of `bytes` length.
    Loaded { bytes: usize },
    /// The image failed; the error explains why.
    Failed(RecordError),
    /// The pass was cancelled before the probe finished.
    Cancelled,
}

/// Build the HTTP client used for probing.
pub fn client(timeout_secs: u64) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
}

/// Probe one depiction URL.
pub async fn probe(
    client: &reqwest::Client,
    url: &str,
    position: usize,
    timeout_secs: u64,
    token: &CancellationToken,
) -> ProbeStatus {
    if token.is_cancelled() {
        return ProbeStatus::Cancelled;
    }
    tokio::select! {
        _ = token.cancelled() => {
            debug!("Record {}: probe cancelled", position);
            ProbeStatus::Cancelled
        }
        status = fetch(client, url, position, timeout_secs) => status,
    }
}

async fn fetch(client: &reqwest::Client, url: &str, position: usize, timeout_secs: u64) -> ProbeStatus {
    let response = match client.get(url).send().await {
        Ok(r) => r,
        Err(e) => return ProbeStatus::Failed(transport_error(e, position, timeout_secs)),
    };

    let status = response.status();
    if status.is_success() {
        return match response.bytes().await {
            Ok(body) => {
                debug!("Record {}: loaded {} bytes", position, body.len());
                ProbeStatus::Loaded { bytes: body.len() }
            }
            Err(e) => ProbeStatus::Failed(transport_error(e, position, timeout_secs)),
        };
    }

    // The body may still fail to arrive; fall back to a status-only label.
    let body = response.text().await.unwrap_or_default();
    let message = extract_error_message(&body)
        .unwrap_or_else(|| format!("Depiction failed (HTTP {})", status.as_u16()));
    warn!("Record {}: HTTP {}: {}", position, status.as_u16(), message);
    ProbeStatus::Failed(RecordError::Service {
        position,
        status: status.as_u16(),
        message,
    })
}

fn transport_error(e: reqwest::Error, position: usize, timeout_secs: u64) -> RecordError {
    warn!("Record {}: request failed: {}", position, e);
    if e.is_timeout() {
        RecordError::Timeout {
            position,
            secs: timeout_secs,
        }
    } else {
        RecordError::Unreachable {
            position,
            detail: e.to_string(),
        }
    }
}

// ── Error body extraction ────────────────────────────────────────────────────

static RE_FIRST_DIV: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<div\b[^>]*>(.*?)</div>").unwrap());
static RE_STRIP_NOISE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<(script|style|head)\b.*?</(script|style|head)>").unwrap());
static RE_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]*>").unwrap());
static RE_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Pull the human-readable message out of the service's HTML error page.
///
/// Prefers the content of the first `<div>`; otherwise uses the text of the
/// whole body. Tags are stripped, entities decoded and whitespace collapsed.
/// Returns `None` when nothing readable is left.
pub fn extract_error_message(body: &str) -> Option<String> {
    let source = match RE_FIRST_DIV.captures(body) {
        Some(caps) => caps[1].to_string(),
        None => RE_STRIP_NOISE.replace_all(body, "").into_owned(),
    };
    let text = RE_TAG.replace_all(&source, " ");
    let text = html_escape::decode_html_entities(&text);
    let text = RE_SPACE.replace_all(text.trim(), " ");
    if text.is_empty() {
        None
    } else {
        Some(text.into_owned())
    }
}
