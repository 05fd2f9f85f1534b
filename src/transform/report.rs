//! Summary of a transform run.
//!
//! The report is produced alongside the rewritten document so callers can
//! show what moved without re-reading the output.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

use crate::geo::GeoPoint;

/// What a transform run changed.
#[derive(Clone, Debug, Default, Serialize)]
pub struct TransformReport {
    /// Input document, when the run was file-based.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<PathBuf>,
    /// Output document, when the run was file-based.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
    pub original_origin: GeoPoint,
    pub new_origin: GeoPoint,
    pub rotation_deg: f64,
    pub headings_normalized: bool,
    pub counts: TransformCounts,
    /// Elements carrying only half of a coordinate pair; left untouched.
    pub unpaired: Vec<UnpairedAttribute>,
}

impl TransformReport {
    /// Returns true if the run changed no geometry at all.
    pub fn is_noop(&self) -> bool {
        self.counts.rewritten() == 0
    }
}

impl fmt::Display for TransformReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let (Some(input), Some(output)) = (&self.input, &self.output) {
            writeln!(f, "{} -> {}", input.display(), output.display())?;
        }

        writeln!(
            f,
            "  origin: {} -> {}, rotation: {} deg",
            self.original_origin, self.new_origin, self.rotation_deg
        )?;
        writeln!(
            f,
            "  {} elements visited: {} absolute points, {} local points, {} headings",
            self.counts.elements, self.counts.geo_points, self.counts.local_points, self.counts.headings
        )?;

        if self.headings_normalized {
            writeln!(f, "  headings normalized to [0, 2pi)")?;
        }

        if !self.unpaired.is_empty() {
            writeln!(f)?;
            writeln!(f, "Unpaired attributes left unchanged ({}):", self.unpaired.len())?;
            for item in &self.unpaired {
                writeln!(
                    f,
                    "  - {}: '{}' without '{}'",
                    item.node, item.present, item.missing
                )?;
            }
        }

        Ok(())
    }
}

/// Counts of rewritten geometry.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TransformCounts {
    pub elements: usize,
    pub geo_points: usize,
    pub local_points: usize,
    pub headings: usize,
}

impl TransformCounts {
    pub fn rewritten(&self) -> usize {
        self.geo_points + self.local_points + self.headings
    }
}

/// An element with `lat` but no `lon` (or `x` but no `y`, and vice versa).
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct UnpairedAttribute {
    pub node: String,
    pub present: String,
    pub missing: String,
}
