//! # depict-board
//!
//! Turn pasted chemical structure text into depiction URLs and results-page
//! markup for a CDK-style depiction HTTP service.
//!
//! The crate never parses chemistry. It splits the input into records, builds
//! `GET {root}/depict/{style}/{format}?smi=…` URLs from the user's display
//! options, and lays each record out as image + download links + title.
//! Optionally it probes every image and swaps failures for the service's own
//! error message.
//!
//! ## Pipeline Overview
//!
//! ```text
//! pasted text
//!  │
//!  ├─ 1. Split    SMILES lines or $$$$-separated CTAB blocks → records (≤ 500)
//!  ├─ 2. URLs     options + payload → svg / png / pdf URLs
//!  ├─ 3. Markup   record → typed fragment (molecule | reaction | scheme)
//!  ├─ 4. Probe    optional: GET each svg, recover error text on failure
//!  └─ 5. Output   HTML page, JSON, or a URL list
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use depict_board::{depict, DepictConfig, RenderOptions};
//!
//! let options = RenderOptions::from_form([("style", "bow"), ("zoom", "200")]).unwrap();
//! let config = DepictConfig::builder()
//!     .root_url("https://example.org/cdkdepict")
//!     .build()
//!     .unwrap();
//!
//! let out = depict("CCO ethanol\nCC(=O)O.OCC>>CC(=O)OCC ester", options, &config);
//! assert_eq!(out.fragments[1].presentation.css_class(), "reaction");
//! assert!(out.fragments[0].urls.png.contains("zoom=2"));
//! let page = out.to_html();
//! assert!(page.contains("ethanol.svg"));
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `depict` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod board;
pub mod config;
pub mod depict;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod record;
pub mod stream;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use board::{Board, PassHandle, ProbeTarget, RenderPass};
pub use config::{
    Abbreviation, Annotation, ArrowStyle, DativeMode, DepictConfig, DepictConfigBuilder,
    HydrogenDisplay, OutputFormat, RenderOptions, Style, DEFAULT_ZOOM, MAX_RECORDS,
};
pub use depict::{depict, depict_checked, depict_checked_sync, probe_pass, read_input, write_output};
pub use error::{DepictError, RecordError};
pub use output::{ProbeOutcome, RenderOutput, RenderStats, Warning};
pub use pipeline::markup::{document, ImageStatus, Node, RecordFragment};
pub use pipeline::split::{split, InputFormat, SplitOutput};
pub use pipeline::url::{build_url, Size, UrlContext};
pub use progress::{DepictProgressCallback, NoopProgressCallback, ProgressCallback};
pub use record::{Presentation, StructureRecord};
pub use stream::{probe_stream, OutcomeStream};
