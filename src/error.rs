use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::geo::GeoPoint;

/// The main error type for xodr-transform operations.
#[derive(Debug, Error)]
pub enum XodrError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse XML from {path}: {message}")]
    XmlParse { path: PathBuf, message: String },

    #[error("Missing origin: {reason}")]
    MissingOrigin { reason: String },

    #[error("Invalid geometry at {node}: attribute '{attribute}' has non-numeric value '{value}'")]
    InvalidGeometry {
        node: String,
        attribute: String,
        value: String,
    },

    #[error("Projection around {origin} failed: {message}")]
    Projection { origin: GeoPoint, message: String },

    #[error("Edit at byte {offset} overlaps an earlier edit")]
    OverlappingEdit { offset: usize },

    #[error("Invalid transform request: {0}")]
    InvalidRequest(String),

    #[error("Output file {path} already exists (use --force to overwrite)")]
    OutputExists { path: PathBuf },

    #[error("Failed to serialize report: {0}")]
    ReportSerialize(#[from] serde_json::Error),

    #[error("{stage} failed: {source}")]
    Stage {
        stage: Stage,
        #[source]
        source: Box<XodrError>,
    },
}

impl XodrError {
    /// Attach the pipeline stage this error occurred in.
    ///
    /// Errors that already carry a stage are returned unchanged.
    pub fn in_stage(self, stage: Stage) -> Self {
        match self {
            XodrError::Stage { .. } => self,
            other => XodrError::Stage {
                stage,
                source: Box::new(other),
            },
        }
    }

    /// The underlying error, skipping any stage wrapper.
    pub fn root(&self) -> &XodrError {
        match self {
            XodrError::Stage { source, .. } => source.root(),
            other => other,
        }
    }

    /// The stage this error was raised in, if recorded.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            XodrError::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

/// Stages of a single transform run, in execution order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    Initialized,
    ReadingInput,
    ParsingOrigin,
    BuildingProjections,
    RewritingNodes,
    WritingOrigin,
    WritingOutput,
    Done,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Initialized => "initialization",
            Stage::ReadingInput => "reading input",
            Stage::ParsingOrigin => "parsing origin",
            Stage::BuildingProjections => "building projections",
            Stage::RewritingNodes => "rewriting nodes",
            Stage::WritingOrigin => "writing origin",
            Stage::WritingOutput => "writing output",
            Stage::Done => "done",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
