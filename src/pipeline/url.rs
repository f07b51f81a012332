//! Depiction URL construction.
//!
//! A depiction URL is a pure function of the render options, the structure
//! payload, the output format and an optional size:
//!
//! ```text
//! {root}/depict/{style}/{format}?smi=…[&w=…&h=…]&abbr=…&hdisp=…[&showtitle=true]
//!     [&sma=…][&zoom=…][&annotate=…][&arw=…][&dat=…][&f=1][&r=…]
//! ```
//!
//! Optional parameters appear only when they differ from what the service
//! would assume anyway, and always in this order so identical options produce
//! identical URLs (friendly to HTTP caches).

use crate::config::{OutputFormat, RenderOptions, DEFAULT_ZOOM};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Characters left unescaped by `encodeURIComponent`.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Explicit image size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

/// Everything besides the options and payload that shapes a URL.
#[derive(Debug, Clone, Copy)]
pub struct UrlContext<'a> {
    /// Service root, e.g. `"."` or `"https://host/cdkdepict"`.
    pub root_url: &'a str,
    /// Zoom percentage the service uses when none is given.
    pub default_zoom: u32,
}

impl<'a> UrlContext<'a> {
    pub fn new(root_url: &'a str) -> Self {
        Self {
            root_url,
            default_zoom: DEFAULT_ZOOM,
        }
    }
}

/// Percent-encode a URL component the way `encodeURIComponent` does.
pub fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, COMPONENT).to_string()
}

/// Build the depiction URL for one payload in one format.
pub fn build_url(
    ctx: &UrlContext<'_>,
    options: &RenderOptions,
    payload: &str,
    format: OutputFormat,
    size: Option<Size>,
) -> String {
    let root = ctx.root_url.trim_end_matches('/');
    let mut params = vec![format!("smi={}", encode_component(payload))];

    if let Some(Size { width, height }) = size {
        if width > 0 && height > 0 {
            params.push(format!("w={width}"));
            params.push(format!("h={height}"));
        }
    }
    params.push(format!("abbr={}", options.abbr));
    params.push(format!("hdisp={}", options.hdisp));
    if options.show_title {
        params.push("showtitle=true".to_string());
    }
    if !options.smarts.is_empty() {
        params.push(format!("sma={}", encode_component(&options.smarts)));
    }
    if let Some(zoom) = options.zoom.filter(|&z| z != ctx.default_zoom) {
        params.push(format!("zoom={}", zoom_factor(zoom)));
    }
    if let Some(annotate) = options.annotate {
        params.push(format!("annotate={annotate}"));
    }
    if let Some(arrow) = options.arrow {
        params.push(format!("arw={arrow}"));
    }
    if options.dative != Default::default() {
        params.push(format!("dat={}", options.dative));
    }
    if options.flip {
        params.push("f=1".to_string());
    }
    if options.rotate != 0 {
        params.push(format!("r={}", encode_component(&options.rotate.to_string())));
    }

    format!(
        "{root}/depict/{}/{}?{}",
        options.style,
        format,
        params.join("&")
    )
}

/// Zoom percentage as the service's scale factor: `200` → `"2"`, `150` → `"1.5"`.
fn zoom_factor(percent: u32) -> String {
    (f64::from(percent) / 100.0).to_string()
}
