//! Input splitting: turn pasted text into ordered structure records.
//!
//! Two input shapes are recognised:
//!
//! * **Line format**: one SMILES per line, optionally followed by a title
//!   after the first space or tab. Blank lines and `#` comments are skipped.
//! * **Block format**: molfile CTAB blocks (SD file style) separated by a
//!   `$$$$` line. Chosen when the text carries a `V2000`/`V3000` version
//!   token together with an `M  END` terminator.
//!
//! The splitter never looks inside a structure; validating it is the
//! depiction service's job.

use crate::record::StructureRecord;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Record separator between CTAB blocks.
pub const BLOCK_SEPARATOR: &str = "$$$$\n";

const MOLFILE_END: &str = "M  END";

/// Which shape the input was detected as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputFormat {
    Lines,
    Blocks,
}

/// Result of splitting one input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitOutput {
    pub format: InputFormat,
    /// Records in input order, at most the configured limit.
    pub records: Vec<StructureRecord>,
    /// Blank lines, comments and empty blocks that produced no record.
    pub skipped: usize,
    /// Records that would have been produced without the limit.
    pub available: usize,
}

impl SplitOutput {
    /// Whether records were dropped by the limit.
    pub fn truncated(&self) -> bool {
        self.available > self.records.len()
    }
}

/// Detect the input shape.
pub fn detect_format(text: &str) -> InputFormat {
    let versioned = text.contains("V2000") || text.contains("V3000");
    if versioned && text.contains(MOLFILE_END) {
        InputFormat::Blocks
    } else {
        InputFormat::Lines
    }
}

/// Split pasted text into at most `max_records` records.
///
/// Order is preserved exactly; nothing is deduplicated. When more records are
/// available than `max_records`, the first `max_records` are kept and the
/// overflow is reported through [`SplitOutput::available`].
pub fn split(raw: &str, max_records: usize) -> SplitOutput {
    let text = normalise_line_endings(raw);
    let format = detect_format(&text);
    debug!("Detected {:?} input ({} bytes)", format, text.len());

    let candidates = match format {
        InputFormat::Lines => split_lines(&text),
        InputFormat::Blocks => split_blocks(&text),
    };

    let mut records = Vec::new();
    let mut skipped = 0usize;
    let mut available = 0usize;
    for candidate in candidates {
        match candidate {
            Some(record) => {
                available += 1;
                if records.len() < max_records {
                    records.push(record);
                }
            }
            None => skipped += 1,
        }
    }

    if available > records.len() {
        warn!(
            "Only the first {} of {} entries will be displayed",
            records.len(),
            available
        );
    }

    SplitOutput {
        format,
        records,
        skipped,
        available,
    }
}

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Line format ──────────────────────────────────────────────────────────────

/// CXSMILES extension layer at the start of the title, e.g. `|$;;R1$| name`.
static RE_CX_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\|[^|]+\|\s+").unwrap());

fn split_lines(text: &str) -> Vec<Option<StructureRecord>> {
    text.split('\n')
        .enumerate()
        .map(|(i, line)| {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                return None;
            }
            let position = i + 1;
            let title = line_title(line).unwrap_or_else(|| default_title(position));
            Some(StructureRecord::new(line, title, position))
        })
        .collect()
}

/// The title carried on a SMILES line, without any CXSMILES layer.
fn line_title(line: &str) -> Option<String> {
    let at = line.find([' ', '\t'])?;
    let rest = &line[at + 1..];
    let title = RE_CX_PREFIX.replace(rest, "");
    if title.is_empty() {
        None
    } else {
        Some(title.into_owned())
    }
}

// ── Block format ─────────────────────────────────────────────────────────────

fn split_blocks(text: &str) -> Vec<Option<StructureRecord>> {
    text.split(BLOCK_SEPARATOR)
        .enumerate()
        .map(|(i, block)| {
            if block.trim().is_empty() {
                return None;
            }
            let position = i + 1;
            // The header line may legitimately be blank, so only the tail is trimmed.
            let payload = strip_trailing_separator(block.trim_end());
            if payload.trim().is_empty() {
                return None;
            }
            let title = payload
                .lines()
                .next()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| default_title(position));
            Some(StructureRecord::new(payload, title, position))
        })
        .collect()
}

/// Drop a final `$$$$` that was not followed by a newline.
fn strip_trailing_separator(block: &str) -> &str {
    match block.strip_suffix("$$$$") {
        Some(rest) if rest.is_empty() || rest.ends_with('\n') => rest.trim_end(),
        _ => block,
    }
}

fn default_title(position: usize) -> String {
    format!("#{position}")
}

#[cfg(test)]
mod tests {
    use super::*;

    const ETHANOL_MOL: &str = "ethanol
  CDK     0101000000

  3  2  0  0  0  0            999 V2000
    0.0000    0.0000    0.0000 C   0  0  0  0  0  0  0  0  0  0  0  0
    1.5000    0.0000    0.0000 C   0  0  0  0  0  0  0  0  0  0  0  0
    2.2500    1.2990    0.0000 O   0  0  0  0  0  0  0  0  0  0  0  0
  1  2  1  0  0  0  0
  2  3  1  0  0  0  0
M  END
";

    #[test]
    fn title_after_space() {
        let out = split("CCO ethanol", 500);
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.records[0].title, "ethanol");
        assert_eq!(out.records[0].payload, "CCO ethanol");
    }

    #[test]
    fn title_after_tab_when_tab_comes_first() {
        let out = split("c1ccccc1\tbenzene ring", 500);
        assert_eq!(out.records[0].title, "benzene ring");
    }

    #[test]
    fn untitled_line_gets_position_label() {
        let out = split("CCO", 500);
        assert_eq!(out.records[0].title, "#1");
    }

    #[test]
    fn position_counts_skipped_lines() {
        let out = split("# header\n\nCCO\nCCN amine", 500);
        assert_eq!(out.records.len(), 2);
        assert_eq!(out.records[0].title, "#3");
        assert_eq!(out.records[0].position, 3);
        assert_eq!(out.records[1].title, "amine");
        assert_eq!(out.skipped, 2);
    }

    #[test]
    fn comment_lines_are_excluded() {
        let out = split("#CCO not a structure\n  # indented comment\nC", 500);
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.records[0].payload, "C");
    }

    #[test]
    fn cxsmiles_layer_is_stripped_from_title() {
        let out = split("*c1ccccc1 |$R1;;;;;;$| phenyl", 500);
        assert_eq!(out.records[0].title, "phenyl");
    }

    #[test]
    fn cxsmiles_layer_alone_is_kept_as_title() {
        // No whitespace after the layer, so it is not an annotation prefix.
        let out = split("*c1ccccc1 |$R1;;;;;;$|", 500);
        assert_eq!(out.records[0].title, "|$R1;;;;;;$|");
    }

    #[test]
    fn crlf_input_is_normalised() {
        let out = split("CCO ethanol\r\nCCN\r\n", 500);
        assert_eq!(out.records.len(), 2);
        assert_eq!(out.records[0].title, "ethanol");
        assert_eq!(out.records[1].title, "#2");
    }

    #[test]
    fn order_and_duplicates_preserved() {
        let out = split("CCN\nCCO\nCCN", 500);
        let payloads: Vec<_> = out.records.iter().map(|r| r.payload.as_str()).collect();
        assert_eq!(payloads, ["CCN", "CCO", "CCN"]);
    }

    #[test]
    fn count_matches_non_empty_non_comment_lines() {
        let input = "C\n\n# c\nCC\n   \nCCC x\n#\nCCCC";
        let out = split(input, 500);
        let expected = input
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .count();
        assert_eq!(out.records.len(), expected);
        assert!(!out.truncated());
    }

    #[test]
    fn limit_truncates_in_input_order() {
        let input: String = (0..510).map(|i| format!("C{i}\n")).collect();
        let out = split(&input, 500);
        assert_eq!(out.records.len(), 500);
        assert_eq!(out.available, 510);
        assert!(out.truncated());
        assert_eq!(out.records[0].payload, "C0");
        assert_eq!(out.records[499].payload, "C499");
    }

    #[test]
    fn limit_is_configurable() {
        let out = split("C\nCC\nCCC", 2);
        assert_eq!(out.records.len(), 2);
        assert_eq!(out.available, 3);
    }

    #[test]
    fn detects_block_format() {
        assert_eq!(detect_format(ETHANOL_MOL), InputFormat::Blocks);
        assert_eq!(detect_format("CCO V2000"), InputFormat::Lines);
        assert_eq!(detect_format("M  END"), InputFormat::Lines);
    }

    #[test]
    fn splits_sd_blocks() {
        let input = format!("{ETHANOL_MOL}$$$$\n{}$$$$\n", ETHANOL_MOL.replacen("ethanol", "", 1));
        let out = split(&input, 500);
        assert_eq!(out.format, InputFormat::Blocks);
        assert_eq!(out.records.len(), 2);
        assert_eq!(out.records[0].title, "ethanol");
        assert!(out.records[0].payload.ends_with("M  END"));
        // Blank header line: title falls back to the block position, but the
        // header is kept so the molfile stays intact.
        assert_eq!(out.records[1].title, "#2");
        assert!(out.records[1].payload.starts_with('\n'));
        assert_eq!(out.skipped, 1);
    }

    #[test]
    fn trailing_separator_without_newline() {
        let input = format!("{ETHANOL_MOL}$$$$");
        let out = split(&input, 500);
        assert_eq!(out.records.len(), 1);
        assert!(out.records[0].payload.ends_with("M  END"));
    }

    #[test]
    fn empty_input_yields_nothing() {
        let out = split("", 500);
        assert!(out.records.is_empty());
        assert_eq!(out.available, 0);
    }
}
