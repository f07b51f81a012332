//! Structure records: one pasted structure plus the label shown for it.

use serde::{Deserialize, Serialize};

/// One structure taken from the pasted input.
///
/// Records are created by [`crate::pipeline::split`] and never mutated
/// afterwards; a new render pass builds new ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructureRecord {
    /// Raw structure text: one SMILES line or one CTAB block.
    pub payload: String,
    /// Display label, also used for download filenames.
    pub title: String,
    /// True when the payload contains a reaction arrow (`>`).
    pub is_reaction: bool,
    /// Number of reaction steps (`>` count / 2, rounded up); 1 for plain
    /// molecules.
    pub part_count: usize,
    /// 1-based line (or block) index in the input.
    pub position: usize,
}

impl StructureRecord {
    pub fn new(payload: impl Into<String>, title: impl Into<String>, position: usize) -> Self {
        let payload = payload.into();
        let arrows = payload.matches('>').count();
        let is_reaction = arrows > 0;
        Self {
            title: title.into(),
            is_reaction,
            part_count: if is_reaction { arrows.div_ceil(2) } else { 1 },
            payload,
            position,
        }
    }

    /// How the record is laid out on the results page.
    pub fn presentation(&self) -> Presentation {
        if !self.is_reaction {
            Presentation::Molecule
        } else if self.part_count > 1 {
            Presentation::Scheme
        } else {
            Presentation::Reaction
        }
    }
}

/// Layout variant of a rendered record, emitted as a CSS class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Presentation {
    Molecule,
    Reaction,
    /// Multi-step reaction.
    Scheme,
}

impl Presentation {
    pub fn css_class(self) -> &'static str {
        match self {
            Presentation::Molecule => "molecule",
            Presentation::Reaction => "reaction",
            Presentation::Scheme => "scheme",
        }
    }
}
