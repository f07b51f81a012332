//! The results board: owns the current render pass and guards it against
//! stale probe results.
//!
//! Every call to [`Board::render`] starts a new pass: the previous pass's
//! cancellation token is cancelled, the generation counter moves on and all
//! fragments are rebuilt from scratch (no diffing). Probes run outside the
//! board against a [`PassHandle`]; their outcomes come back through
//! [`Board::apply`], which drops anything that does not belong to the current
//! pass.

use crate::config::{DepictConfig, RenderOptions};
use crate::output::{ProbeOutcome, RenderOutput, RenderStats, Warning};
use crate::pipeline::markup::{self, RecordFragment};
use crate::pipeline::split::{self, InputFormat};
use crate::pipeline::url::UrlContext;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// One split + render of the input.
#[derive(Debug)]
pub struct RenderPass {
    pub generation: u64,
    pub options: RenderOptions,
    pub format: InputFormat,
    pub fragments: Vec<RecordFragment>,
    pub warnings: Vec<Warning>,
    pub skipped: usize,
    pub truncated: usize,
    token: CancellationToken,
}

impl RenderPass {
    /// Split `text` and render every record with `options`.
    pub fn build(text: &str, options: RenderOptions, config: &DepictConfig, generation: u64) -> Self {
        let split = split::split(text, config.max_records);
        let ctx = UrlContext {
            root_url: &config.root_url,
            default_zoom: config.default_zoom,
        };
        let fragments: Vec<RecordFragment> = split
            .records
            .iter()
            .map(|record| markup::render(&ctx, &options, record))
            .collect();

        let mut warnings = Vec::new();
        if split.truncated() {
            warnings.push(Warning::Truncated {
                limit: config.max_records,
                available: split.available,
            });
        }

        info!(
            "Render pass {}: {} records ({} skipped)",
            generation,
            fragments.len(),
            split.skipped
        );

        Self {
            generation,
            truncated: split.available - split.records.len(),
            format: split.format,
            skipped: split.skipped,
            options,
            fragments,
            warnings,
            token: CancellationToken::new(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Everything a prober needs, detached from the board.
    pub fn handle(&self) -> PassHandle {
        PassHandle {
            generation: self.generation,
            token: self.token.clone(),
            targets: self
                .fragments
                .iter()
                .enumerate()
                .map(|(index, f)| ProbeTarget {
                    index,
                    position: f.position,
                    url: f.urls.svg.clone(),
                })
                .collect(),
        }
    }

    pub fn stats(&self) -> RenderStats {
        RenderStats {
            skipped: self.skipped,
            truncated: self.truncated,
            ..RenderStats::count(&self.fragments)
        }
    }

    pub fn to_output(&self) -> RenderOutput {
        RenderOutput {
            format: self.format,
            options: self.options.clone(),
            fragments: self.fragments.clone(),
            warnings: self.warnings.clone(),
            stats: self.stats(),
        }
    }

    pub fn into_output(self) -> RenderOutput {
        let stats = self.stats();
        RenderOutput {
            format: self.format,
            options: self.options,
            fragments: self.fragments,
            warnings: self.warnings,
            stats,
        }
    }
}

/// A detached view of a pass for probing.
#[derive(Debug, Clone)]
pub struct PassHandle {
    pub generation: u64,
    pub token: CancellationToken,
    pub targets: Vec<ProbeTarget>,
}

/// One image to probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeTarget {
    pub index: usize,
    pub position: usize,
    pub url: String,
}

/// The results container.
#[derive(Debug)]
pub struct Board {
    config: DepictConfig,
    generation: u64,
    current: Option<RenderPass>,
}

impl Board {
    pub fn new(config: DepictConfig) -> Self {
        Self {
            config,
            generation: 0,
            current: None,
        }
    }

    pub fn config(&self) -> &DepictConfig {
        &self.config
    }

    /// Discard the current pass (cancelling its probes) and render a new one.
    pub fn render(&mut self, text: &str, options: RenderOptions) -> &RenderPass {
        self.clear();
        self.generation += 1;
        let pass = RenderPass::build(text, options, &self.config, self.generation);
        self.current.insert(pass)
    }

    /// Cancel and drop the current pass.
    pub fn clear(&mut self) {
        if let Some(old) = self.current.take() {
            debug!("Discarding render pass {}", old.generation);
            old.token.cancel();
        }
    }

    pub fn current(&self) -> Option<&RenderPass> {
        self.current.as_ref()
    }

    /// Probe handle for the current pass.
    pub fn handle(&self) -> Option<PassHandle> {
        self.current.as_ref().map(RenderPass::handle)
    }

    /// Apply a probe outcome if it still belongs to the current pass.
    ///
    /// Returns `false` for outcomes from a superseded or cancelled pass, or
    /// for an index the pass does not have.
    pub fn apply(&mut self, outcome: &ProbeOutcome) -> bool {
        let Some(pass) = self.current.as_mut() else {
            return false;
        };
        if pass.generation != outcome.generation || pass.token.is_cancelled() {
            debug!(
                "Dropping stale outcome for record {} (pass {}, current {})",
                outcome.position, outcome.generation, pass.generation
            );
            return false;
        }
        match pass.fragments.get_mut(outcome.index) {
            Some(fragment) if fragment.position == outcome.position => {
                fragment.status = outcome.status();
                true
            }
            _ => false,
        }
    }

    /// Snapshot of the current pass.
    pub fn output(&self) -> Option<RenderOutput> {
        self.current.as_ref().map(RenderPass::to_output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RecordError;
    use crate::pipeline::markup::ImageStatus;

    fn outcome(generation: u64, index: usize, position: usize, error: Option<RecordError>) -> ProbeOutcome {
        ProbeOutcome {
            generation,
            index,
            position,
            error,
            bytes: 10,
            duration_ms: 1,
        }
    }

    #[test]
    fn render_builds_fragments_in_order() {
        let mut board = Board::new(DepictConfig::default());
        let pass = board.render("CCO ethanol\n# skip\nCCO>>CCN", RenderOptions::default());
        assert_eq!(pass.generation, 1);
        assert_eq!(pass.fragments.len(), 2);
        assert_eq!(pass.fragments[0].title, "ethanol");
        assert_eq!(pass.fragments[1].title, "#3");
        assert_eq!(pass.skipped, 1);
        let stats = pass.stats();
        assert_eq!(stats.molecules, 1);
        assert_eq!(stats.reactions, 1);
    }

    #[test]
    fn rerender_cancels_previous_pass() {
        let mut board = Board::new(DepictConfig::default());
        board.render("C", RenderOptions::default());
        let old = board.handle().unwrap();
        assert!(!old.token.is_cancelled());

        board.render("CC\nCCC", RenderOptions::default());
        assert!(old.token.is_cancelled());
        assert_eq!(board.current().unwrap().generation, 2);
        assert_eq!(board.current().unwrap().fragments.len(), 2);
    }

    #[test]
    fn stale_outcomes_are_dropped() {
        let mut board = Board::new(DepictConfig::default());
        board.render("C\nCC", RenderOptions::default());
        let stale = outcome(
            1,
            0,
            1,
            Some(RecordError::Unreachable {
                position: 1,
                detail: "late".into(),
            }),
        );
        board.render("C\nCC", RenderOptions::default());

        assert!(!board.apply(&stale));
        let pass = board.current().unwrap();
        assert!(pass.fragments.iter().all(|f| f.status == ImageStatus::Pending));
    }

    #[test]
    fn current_outcomes_are_applied() {
        let mut board = Board::new(DepictConfig::default());
        board.render("C\nC1CC bad", RenderOptions::default());
        assert!(board.apply(&outcome(1, 0, 1, None)));
        assert!(board.apply(&outcome(
            1,
            1,
            2,
            Some(RecordError::Service {
                position: 2,
                status: 500,
                message: "Unclosed ring".into(),
            })
        )));

        let out = board.output().unwrap();
        assert_eq!(out.fragments[0].status, ImageStatus::Loaded);
        assert!(out.fragments[1].is_errored());
        assert_eq!(out.stats.loaded, 1);
        assert_eq!(out.stats.errored, 1);
    }

    #[test]
    fn mismatched_index_is_rejected() {
        let mut board = Board::new(DepictConfig::default());
        board.render("C", RenderOptions::default());
        assert!(!board.apply(&outcome(1, 5, 1, None)));
        assert!(!board.apply(&outcome(1, 0, 9, None)));
    }

    #[test]
    fn cleared_board_rejects_everything() {
        let mut board = Board::new(DepictConfig::default());
        board.render("C", RenderOptions::default());
        let handle = board.handle().unwrap();
        board.clear();
        assert!(handle.token.is_cancelled());
        assert!(board.current().is_none());
        assert!(!board.apply(&outcome(1, 0, 1, None)));
    }

    #[test]
    fn truncation_produces_warning() {
        let config = DepictConfig::builder().max_records(2).build().unwrap();
        let mut board = Board::new(config);
        let pass = board.render("C\nCC\nCCC\nCCCC", RenderOptions::default());
        assert_eq!(pass.fragments.len(), 2);
        assert_eq!(pass.truncated, 2);
        assert_eq!(
            pass.warnings,
            vec![Warning::Truncated {
                limit: 2,
                available: 4
            }]
        );
    }

    #[test]
    fn handle_targets_svg_urls() {
        let mut board = Board::new(DepictConfig::default());
        board.render("C\n\nCC", RenderOptions::default());
        let handle = board.handle().unwrap();
        assert_eq!(handle.targets.len(), 2);
        assert_eq!(handle.targets[1].index, 1);
        assert_eq!(handle.targets[1].position, 3);
        assert!(handle.targets[1].url.contains("/svg?smi=CC"));
    }
}
