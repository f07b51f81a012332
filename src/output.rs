//! Output types for a render pass.

use crate::error::RecordError;
use crate::pipeline::markup::{self, ImageStatus, RecordFragment};
use crate::pipeline::split::InputFormat;
use crate::config::RenderOptions;
use crate::record::Presentation;
use serde::{Deserialize, Serialize};

/// Non-fatal conditions the user should be told about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    /// More records were pasted than the configured limit.
    Truncated { limit: usize, available: usize },
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Warning::Truncated { limit, available } => write!(
                f,
                "Only the first {limit} of {available} entries will be displayed!"
            ),
        }
    }
}

/// Result of probing one fragment's image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeOutcome {
    /// Render pass the probe belongs to.
    pub generation: u64,
    /// Index of the fragment within its pass.
    pub index: usize,
    /// Record position in the input (1-based).
    pub position: usize,
    pub error: Option<RecordError>,
    /// Bytes received for a successful image.
    pub bytes: usize,
    pub duration_ms: u64,
}

impl ProbeOutcome {
    /// The fragment status this outcome implies.
    pub fn status(&self) -> ImageStatus {
        match &self.error {
            None => ImageStatus::Loaded,
            Some(e) => ImageStatus::Errored {
                message: e.display_message(),
            },
        }
    }
}

/// Counters for one render pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderStats {
    pub records: usize,
    pub molecules: usize,
    pub reactions: usize,
    pub schemes: usize,
    /// Blank lines, comments and empty blocks.
    pub skipped: usize,
    /// Records dropped by the limit.
    pub truncated: usize,
    /// Images confirmed by a probe.
    pub loaded: usize,
    /// Images replaced by an error message.
    pub errored: usize,
    pub duration_ms: u64,
}

impl RenderStats {
    pub(crate) fn count(fragments: &[RecordFragment]) -> Self {
        let mut stats = Self {
            records: fragments.len(),
            ..Self::default()
        };
        for f in fragments {
            match f.presentation {
                Presentation::Molecule => stats.molecules += 1,
                Presentation::Reaction => stats.reactions += 1,
                Presentation::Scheme => stats.schemes += 1,
            }
            match f.status {
                ImageStatus::Loaded => stats.loaded += 1,
                ImageStatus::Errored { .. } => stats.errored += 1,
                ImageStatus::Pending => {}
            }
        }
        stats
    }
}

/// Everything a render pass produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderOutput {
    pub format: InputFormat,
    pub options: RenderOptions,
    pub fragments: Vec<RecordFragment>,
    pub warnings: Vec<Warning>,
    pub stats: RenderStats,
}

impl RenderOutput {
    /// A standalone HTML page holding every fragment.
    pub fn to_html(&self) -> String {
        markup::document(&self.fragments, self.options.style)
    }

    /// One svg URL per line, in record order.
    pub fn url_list(&self) -> String {
        self.fragments
            .iter()
            .map(|f| format!("{}\n", f.urls.svg))
            .collect()
    }
}
