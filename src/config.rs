//! Configuration types for a render pass.
//!
//! Two structs carry every knob:
//!
//! * [`RenderOptions`]: the user's display choices (style, zoom, SMARTS
//!   highlight, …). Rebuilt from the form for every pass and passed by value;
//!   it is never shared or mutated while a pass is in flight.
//! * [`DepictConfig`]: where the depiction service lives and how the client
//!   behaves (record cap, zoom baseline, probe concurrency). Built via
//!   [`DepictConfigBuilder`].
//!
//! Every enumerated option is a closed set of URL-safe tokens, so the URL
//! builder can append them without percent-encoding.

use crate::error::DepictError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Maximum number of records rendered in one pass unless configured otherwise.
pub const MAX_RECORDS: usize = 500;

/// Zoom percentage the front end assumes when none is chosen; a zoom equal
/// to this is left out of the URL. Configurable through
/// [`DepictConfigBuilder::default_zoom`].
pub const DEFAULT_ZOOM: u32 = 100;

/// Declares a closed set of option tokens with parsing, display and serde.
///
/// The first literal of each variant is its canonical token; any further
/// literals are accepted aliases when parsing.
macro_rules! option_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $field:literal {
            $(
                $(#[$vmeta:meta])*
                $variant:ident => $token:literal $(| $alias:literal)*
            ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                $(#[$vmeta])*
                #[serde(rename = $token)]
                $variant,
            )+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// The token sent to the depiction service.
            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $token,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = DepictError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let lower = s.trim().to_ascii_lowercase();
                match lower.as_str() {
                    $($token $(| $alias)* => Ok($name::$variant),)+
                    _ => Err(DepictError::InvalidOption {
                        name: $field.to_string(),
                        value: s.to_string(),
                        expected: [$($token),+].join(", "),
                    }),
                }
            }
        }
    };
}

option_enum! {
    /// Colour scheme preset, the `{style}` path segment of a depiction URL.
    #[derive(Default)]
    Style, "style" {
        /// Colour on white.
        #[default]
        ColorOnWhite => "cow",
        /// Colour on transparent.
        ColorOnTransparent => "cot",
        BlackOnWhite => "bow",
        BlackOnTransparent => "bot",
        WhiteOnBlack => "wob",
        WhiteOnTransparent => "wot",
        ColorOnBlack => "cob",
        /// Neon on black.
        NeonOnBlack => "nob",
    }
}

option_enum! {
    /// Atom/bond annotation drawn by the service (`annotate`).
    Annotation, "annotate" {
        /// No annotation.
        Plain => "none",
        Number => "number",
        MapIdx => "mapidx",
        AtomValue => "atomvalue",
        ColMap => "colmap",
        Cip => "cip",
    }
}

option_enum! {
    /// How hydrogens are displayed (`hdisp`).
    #[derive(Default)]
    HydrogenDisplay, "hdisp" {
        Provided => "provided" | "p",
        Minimal => "suppressed" | "minimal" | "m",
        Stereo => "stereo" | "c",
        #[default]
        Smart => "bridgehead" | "smart" | "bridgeheadtetrahedral" | "default" | "s",
        Explicit => "explicit" | "x",
    }
}

option_enum! {
    /// Which abbreviations the service applies (`abbr`).
    #[derive(Default)]
    Abbreviation, "abbr" {
        Off => "off" | "false" | "no",
        Groups => "groups",
        #[default]
        Reagents => "reagents" | "agents",
        All => "on" | "true" | "yes" | "groups+agents",
    }
}

option_enum! {
    /// Reaction arrow style (`arw`). Absent means a plain forward arrow.
    ArrowStyle, "arw" {
        Equilibrium => "equ",
        NoGo => "ngo",
        Retrosynthetic => "ret",
        Resonance => "res",
    }
}

option_enum! {
    /// When dative bonds are perceived from the input coordinates (`dat`).
    #[derive(Default)]
    DativeMode, "dat" {
        Always => "y",
        #[default]
        Metals => "m",
        Never => "n",
    }
}

option_enum! {
    /// Output format, the `{format}` path segment of a depiction URL.
    OutputFormat, "format" {
        Svg => "svg",
        Png => "png",
        Pdf => "pdf",
    }
}

impl OutputFormat {
    /// File extension used for the suggested download filename.
    pub fn extension(self) -> &'static str {
        self.as_str()
    }
}

/// Display options for one render pass.
///
/// Built fresh from the host form for each pass ([`RenderOptions::from_form`])
/// or field-by-field; the pipeline only ever borrows it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RenderOptions {
    pub style: Style,
    /// `None` leaves the annotation up to the service.
    pub annotate: Option<Annotation>,
    /// Zoom in percent. `None` or the configured baseline is omitted.
    pub zoom: Option<u32>,
    /// Mirror the depiction horizontally.
    pub flip: bool,
    /// Rotation in degrees; 0 is omitted.
    pub rotate: i32,
    /// SMARTS pattern to highlight; empty is omitted.
    pub smarts: String,
    pub hdisp: HydrogenDisplay,
    /// Ask the service to draw the title inline.
    pub show_title: bool,
    pub abbr: Abbreviation,
    pub arrow: Option<ArrowStyle>,
    pub dative: DativeMode,
}

impl RenderOptions {
    /// Build options from plain key/value form input.
    ///
    /// Keys follow the host page's field names: `style`, `annotate`, `zoom`,
    /// `flip`, `rotate`, `smarts` (or `sma`), `hdisp`, `showtitle`, `abbr`,
    /// `arw`, `dat`. Missing fields keep their defaults, empty values clear
    /// optional fields, unknown keys are ignored.
    ///
    /// # Example
    /// ```rust
    /// use depict_board::{RenderOptions, Style};
    ///
    /// let opts = RenderOptions::from_form([("style", "bow"), ("zoom", "200")]).unwrap();
    /// assert_eq!(opts.style, Style::BlackOnWhite);
    /// assert_eq!(opts.zoom, Some(200));
    /// ```
    pub fn from_form<I, K, V>(pairs: I) -> Result<Self, DepictError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut opts = Self::default();
        for (key, value) in pairs {
            let key = key.as_ref();
            let value = value.as_ref().trim();
            match key {
                "style" => opts.style = non_empty(value).map_or(Ok(opts.style), str::parse)?,
                "annotate" => opts.annotate = non_empty(value).map(str::parse).transpose()?,
                "zoom" => opts.zoom = parse_number(key, value)?,
                "flip" => opts.flip = parse_flag(key, value)?,
                "rotate" => opts.rotate = parse_number(key, value)?.unwrap_or(0),
                "smarts" | "sma" => opts.smarts = value.to_string(),
                "hdisp" => opts.hdisp = non_empty(value).map_or(Ok(opts.hdisp), str::parse)?,
                "showtitle" => opts.show_title = parse_flag(key, value)?,
                "abbr" => opts.abbr = non_empty(value).map_or(Ok(opts.abbr), str::parse)?,
                "arw" => opts.arrow = non_empty(value).map(str::parse).transpose()?,
                "dat" => opts.dative = non_empty(value).map_or(Ok(opts.dative), str::parse)?,
                other => debug!("Ignoring unknown form field '{}'", other),
            }
        }
        Ok(opts)
    }
}

fn non_empty(value: &str) -> Option<&str> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

fn parse_number<T: FromStr>(name: &str, value: &str) -> Result<Option<T>, DepictError> {
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse()
        .map(Some)
        .map_err(|_| DepictError::InvalidOption {
            name: name.to_string(),
            value: value.to_string(),
            expected: "an integer".to_string(),
        })
}

/// Checkbox semantics: present-and-on is true, anything falsy is false.
fn parse_flag(name: &str, value: &str) -> Result<bool, DepictError> {
    match value.to_ascii_lowercase().as_str() {
        "on" | "true" | "t" | "1" | "yes" => Ok(true),
        "" | "off" | "false" | "f" | "0" | "no" => Ok(false),
        _ => Err(DepictError::InvalidOption {
            name: name.to_string(),
            value: value.to_string(),
            expected: "on, off, true, false".to_string(),
        }),
    }
}

/// Client-side configuration for a depiction board.
///
/// Built via [`DepictConfig::builder()`] or using [`DepictConfig::default()`].
///
/// # Example
/// ```rust
/// use depict_board::DepictConfig;
///
/// let config = DepictConfig::builder()
///     .root_url("http://localhost:8080/cdkdepict")
///     .max_records(100)
///     .build()
///     .unwrap();
/// assert_eq!(config.max_records, 100);
/// ```
#[derive(Clone)]
pub struct DepictConfig {
    /// Base URL of the depiction service. Default: `"."` (same origin as the
    /// generated page).
    pub root_url: String,

    /// Maximum number of records rendered per pass. Default: [`MAX_RECORDS`].
    ///
    /// Protects the page (and the service) from a pasted SD file with tens of
    /// thousands of entries. Records beyond the cap are dropped with a warning.
    pub max_records: usize,

    /// Zoom percentage treated as the service baseline. Default: [`DEFAULT_ZOOM`].
    pub default_zoom: u32,

    /// Number of concurrent image probes. Default: 8.
    pub concurrency: usize,

    /// Per-request timeout for image probes in seconds. Default: 30.
    pub timeout_secs: u64,

    /// Optional progress callback for image probing.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for DepictConfig {
    fn default() -> Self {
        Self {
            root_url: ".".to_string(),
            max_records: MAX_RECORDS,
            default_zoom: DEFAULT_ZOOM,
            concurrency: 8,
            timeout_secs: 30,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for DepictConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DepictConfig")
            .field("root_url", &self.root_url)
            .field("max_records", &self.max_records)
            .field("default_zoom", &self.default_zoom)
            .field("concurrency", &self.concurrency)
            .field("timeout_secs", &self.timeout_secs)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn DepictProgressCallback>"),
            )
            .finish()
    }
}

impl DepictConfig {
    /// Create a new builder for `DepictConfig`.
    pub fn builder() -> DepictConfigBuilder {
        DepictConfigBuilder {
            config: Self::default(),
        }
    }

    /// Whether `root_url` is an absolute http(s) URL that can be probed.
    pub fn is_absolute_root(&self) -> bool {
        self.root_url.starts_with("http://") || self.root_url.starts_with("https://")
    }
}

/// Builder for [`DepictConfig`].
#[derive(Debug)]
pub struct DepictConfigBuilder {
    config: DepictConfig,
}

impl DepictConfigBuilder {
    pub fn root_url(mut self, url: impl Into<String>) -> Self {
        self.config.root_url = url.into();
        self
    }

    pub fn max_records(mut self, n: usize) -> Self {
        self.config.max_records = n;
        self
    }

    pub fn default_zoom(mut self, zoom: u32) -> Self {
        self.config.default_zoom = zoom;
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.config.timeout_secs = secs;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<DepictConfig, DepictError> {
        let c = &self.config;
        if c.root_url.trim().is_empty() {
            return Err(DepictError::InvalidConfig("Root URL must not be empty".into()));
        }
        if c.max_records == 0 {
            return Err(DepictError::InvalidConfig(
                "Record limit must be ≥ 1".into(),
            ));
        }
        if c.default_zoom == 0 {
            return Err(DepictError::InvalidConfig(
                "Default zoom must be ≥ 1%".into(),
            ));
        }
        if c.timeout_secs == 0 {
            return Err(DepictError::InvalidConfig(
                "Probe timeout must be ≥ 1s".into(),
            ));
        }
        Ok(self.config)
    }
}
