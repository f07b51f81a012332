//! Record rendering: typed markup fragments for the results page.
//!
//! Each record becomes a [`RecordFragment`], which holds the record's three
//! download URLs and its image status. [`RecordFragment::to_node`] lays the
//! fragment out as a [`Node`] tree:
//!
//! ```text
//! div.chemdiv.{molecule|reaction|scheme}
//! └─ div.grid
//!    ├─ div.img[.error]
//!    │  ├─ span.valign-helper
//!    │  ├─ a[href=svg] › img.chemimg[src=svg]      (or div.error-mesg when errored)
//!    │  └─ div.links › a[download=title.svg|png|pdf] ×3
//!    └─ div.title                                 (only when showtitle is off)
//! ```
//!
//! URL building and markup building stay separate pure functions; HTML text
//! only appears at the very end, in [`Node::to_html`], which escapes every text
//! node and attribute value.

use crate::config::{OutputFormat, RenderOptions, Style};
use crate::pipeline::url::{build_url, UrlContext};
use crate::record::{Presentation, StructureRecord};
use serde::{Deserialize, Serialize};
use std::fmt::Write;

// ── Node tree ────────────────────────────────────────────────────────────────

/// A minimal HTML node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element {
        tag: &'static str,
        attrs: Vec<(&'static str, String)>,
        children: Vec<Node>,
    },
    Text(String),
}

/// Elements that never have children or a closing tag.
const VOID_TAGS: &[&str] = &["img", "br", "meta"];

impl Node {
    pub fn element(tag: &'static str) -> Self {
        Node::Element {
            tag,
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Node::Text(text.into())
    }

    /// Add an attribute. No-op on text nodes.
    pub fn attr(mut self, name: &'static str, value: impl Into<String>) -> Self {
        if let Node::Element { attrs, .. } = &mut self {
            attrs.push((name, value.into()));
        }
        self
    }

    pub fn class(self, class: impl Into<String>) -> Self {
        self.attr("class", class)
    }

    /// Append a child. No-op on text nodes.
    pub fn child(mut self, node: Node) -> Self {
        if let Node::Element { children, .. } = &mut self {
            children.push(node);
        }
        self
    }

    /// Value of the first attribute called `name`.
    pub fn get_attr(&self, name: &str) -> Option<&str> {
        match self {
            Node::Element { attrs, .. } => attrs
                .iter()
                .find(|(n, _)| *n == name)
                .map(|(_, v)| v.as_str()),
            Node::Text(_) => None,
        }
    }

    /// Depth-first search for the first element whose class list contains `class`.
    pub fn find_class(&self, class: &str) -> Option<&Node> {
        if self
            .get_attr("class")
            .is_some_and(|c| c.split_whitespace().any(|c| c == class))
        {
            return Some(self);
        }
        match self {
            Node::Element { children, .. } => children.iter().find_map(|c| c.find_class(class)),
            Node::Text(_) => None,
        }
    }

    /// Concatenated text content.
    pub fn text_content(&self) -> String {
        match self {
            Node::Text(t) => t.clone(),
            Node::Element { children, .. } => children.iter().map(Node::text_content).collect(),
        }
    }

    /// Serialise to HTML.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    fn write_html(&self, out: &mut String) {
        match self {
            Node::Text(t) => {
                html_escape::encode_text_to_string(t, out);
            }
            Node::Element {
                tag,
                attrs,
                children,
            } => {
                out.push('<');
                out.push_str(tag);
                for (name, value) in attrs {
                    let _ = write!(out, " {name}=\"");
                    html_escape::encode_double_quoted_attribute_to_string(value, out);
                    out.push('"');
                }
                out.push('>');
                if VOID_TAGS.contains(tag) {
                    return;
                }
                for child in children {
                    child.write_html(out);
                }
                let _ = write!(out, "</{tag}>");
            }
        }
    }
}

// ── Fragments ────────────────────────────────────────────────────────────────

/// Load state of a fragment's image.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum ImageStatus {
    /// Not probed; the browser will load it.
    #[default]
    Pending,
    /// The service returned an image.
    Loaded,
    /// The image failed; `message` replaces it.
    Errored { message: String },
}

/// Download URLs for one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepictionUrls {
    pub svg: String,
    pub png: String,
    pub pdf: String,
}

impl DepictionUrls {
    pub fn get(&self, format: OutputFormat) -> &str {
        match format {
            OutputFormat::Svg => &self.svg,
            OutputFormat::Png => &self.png,
            OutputFormat::Pdf => &self.pdf,
        }
    }
}

/// The rendered form of one [`StructureRecord`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordFragment {
    pub position: usize,
    pub title: String,
    pub presentation: Presentation,
    pub urls: DepictionUrls,
    /// Whether a separate title label is shown under the image.
    pub title_label: bool,
    pub status: ImageStatus,
}

/// Render one record with the given options.
pub fn render(ctx: &UrlContext<'_>, options: &RenderOptions, record: &StructureRecord) -> RecordFragment {
    let url = |format| build_url(ctx, options, &record.payload, format, None);
    RecordFragment {
        position: record.position,
        title: record.title.clone(),
        presentation: record.presentation(),
        urls: DepictionUrls {
            svg: url(OutputFormat::Svg),
            png: url(OutputFormat::Png),
            pdf: url(OutputFormat::Pdf),
        },
        // With showtitle the service draws the title into the image itself.
        title_label: !options.show_title,
        status: ImageStatus::Pending,
    }
}

impl RecordFragment {
    pub fn is_errored(&self) -> bool {
        matches!(self.status, ImageStatus::Errored { .. })
    }

    /// Suggested download filename for `format`.
    pub fn filename(&self, format: OutputFormat) -> String {
        format!("{}.{}", self.title, format.extension())
    }

    pub fn to_node(&self) -> Node {
        let mut img_div = Node::element("div")
            .class(if self.is_errored() { "img error" } else { "img" })
            .child(Node::element("span").class("valign-helper"));

        img_div = match &self.status {
            ImageStatus::Errored { message } => img_div.child(
                Node::element("div")
                    .class("error-mesg")
                    .child(Node::text(message.as_str())),
            ),
            ImageStatus::Pending | ImageStatus::Loaded => img_div
                .child(
                    Node::element("a").attr("href", &self.urls.svg).child(
                        Node::element("img")
                            .class("chemimg")
                            .attr("src", &self.urls.svg)
                            .attr("alt", &self.title),
                    ),
                )
                .child(self.links_node()),
        };

        let mut grid = Node::element("div").class("grid").child(img_div);
        if self.title_label {
            grid = grid.child(
                Node::element("div")
                    .class("title")
                    .child(Node::text(self.title.as_str())),
            );
        }

        Node::element("div")
            .class(format!("chemdiv {}", self.presentation.css_class()))
            .attr("data-position", self.position.to_string())
            .child(grid)
    }

    fn links_node(&self) -> Node {
        OutputFormat::ALL
            .iter()
            .fold(Node::element("div").class("links"), |links, &format| {
                let label = format.as_str().to_ascii_uppercase();
                links.child(
                    Node::element("a")
                        .attr("title", format!("Download {label}"))
                        .attr("href", self.urls.get(format))
                        .attr("download", self.filename(format))
                        .child(Node::text(label)),
                )
            })
    }

    pub fn to_html(&self) -> String {
        self.to_node().to_html()
    }
}

/// Wrap fragments in a standalone HTML page with a `#result` container.
pub fn document(fragments: &[RecordFragment], style: Style) -> String {
    let result = fragments.iter().fold(
        Node::element("div").attr("id", "result").class(style.as_str()),
        |div, f| div.child(f.to_node()),
    );
    let head = Node::element("head")
        .child(Node::element("meta").attr("charset", "utf-8"))
        .child(Node::element("title").child(Node::text("Depictions")));
    let html = Node::element("html")
        .child(head)
        .child(Node::element("body").child(result));
    format!("<!DOCTYPE html>\n{}\n", html.to_html())
}
