//! Re-georeferencing of a whole road-network document.
//!
//! A run moves through fixed stages and stops at the first failure:
//!
//! 1. validate the [`TransformRequest`]
//! 2. read and parse the document
//! 3. parse the origin from `header/geoReference`
//! 4. build the source and target projections
//! 5. rewrite every element's geometry with [`transform_geometry`]
//! 6. rewrite the origin descriptor
//! 7. commit the output atomically
//!
//! Per-element work is a pure function from [`GeometryAttrs`] to
//! [`GeometryAttrs`], so it can be tested without a document.

pub mod report;

pub use report::{TransformCounts, TransformReport, UnpairedAttribute};

use std::path::Path;

use serde::Serialize;

use crate::error::{Stage, XodrError};
use crate::geo::{
    normalize_heading, GeoPoint, GeoReference, Heading, LocalPoint, ProjectionPair, Rotation,
};
use crate::xodr::{self, Edit, ScannedElement};

/// Configuration for one run. Immutable once built.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct TransformRequest {
    new_origin: Option<GeoPoint>,
    rotation_deg: f64,
    normalize_heading: bool,
}

impl TransformRequest {
    /// Keep the original origin, no rotation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a request from optional CLI-style parts.
    ///
    /// Latitude and longitude must be given together.
    pub fn from_parts(
        new_lat: Option<f64>,
        new_lon: Option<f64>,
        rotation_deg: f64,
        normalize_heading: bool,
    ) -> Result<Self, XodrError> {
        let new_origin = match (new_lat, new_lon) {
            (Some(lat), Some(lon)) => Some(GeoPoint::new(lat, lon)),
            (None, None) => None,
            (Some(_), None) => {
                return Err(XodrError::InvalidRequest(
                    "new origin latitude given without longitude".to_string(),
                ))
            }
            (None, Some(_)) => {
                return Err(XodrError::InvalidRequest(
                    "new origin longitude given without latitude".to_string(),
                ))
            }
        };

        let request = Self {
            new_origin,
            rotation_deg,
            normalize_heading,
        };
        request.validate()?;
        Ok(request)
    }

    pub fn with_new_origin(mut self, origin: GeoPoint) -> Self {
        self.new_origin = Some(origin);
        self
    }

    pub fn with_rotation_deg(mut self, degrees: f64) -> Self {
        self.rotation_deg = degrees;
        self
    }

    /// Wrap rotated headings into `[0, 2π)`. Off unless asked for.
    pub fn with_heading_normalization(mut self, enabled: bool) -> Self {
        self.normalize_heading = enabled;
        self
    }

    pub fn new_origin(&self) -> Option<GeoPoint> {
        self.new_origin
    }

    pub fn rotation_deg(&self) -> f64 {
        self.rotation_deg
    }

    pub fn normalize_heading(&self) -> bool {
        self.normalize_heading
    }

    /// The origin the output will be centred on.
    pub fn target_origin(&self, original: GeoPoint) -> GeoPoint {
        self.new_origin.unwrap_or(original)
    }

    pub fn validate(&self) -> Result<(), XodrError> {
        if !self.rotation_deg.is_finite() {
            return Err(XodrError::InvalidRequest(format!(
                "rotation angle must be finite, got {}",
                self.rotation_deg
            )));
        }

        if let Some(origin) = self.new_origin {
            if !origin.is_in_range() {
                return Err(XodrError::InvalidRequest(format!(
                    "new origin {origin} is outside [-90, 90] x [-180, 180]"
                )));
            }
        }

        Ok(())
    }
}

/// Geometry carried by a single element.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GeometryAttrs {
    /// `lat` / `lon`, when both are present.
    pub geo: Option<GeoPoint>,
    /// `x` / `y`, when both are present.
    pub local: Option<LocalPoint>,
    /// `hdg`.
    pub heading: Option<Heading>,
}

impl GeometryAttrs {
    pub fn is_empty(&self) -> bool {
        self.geo.is_none() && self.local.is_none() && self.heading.is_none()
    }
}

/// The projections and rotation of one run.
#[derive(Debug)]
pub struct Transformer {
    projections: ProjectionPair,
    rotation: Rotation,
    normalize_heading: bool,
}

impl Transformer {
    pub fn new(original_origin: GeoPoint, request: &TransformRequest) -> Result<Self, XodrError> {
        Ok(Self {
            projections: ProjectionPair::new(
                original_origin,
                request.target_origin(original_origin),
            )?,
            rotation: Rotation::from_degrees(request.rotation_deg()),
            normalize_heading: request.normalize_heading(),
        })
    }

    pub fn projections(&self) -> &ProjectionPair {
        &self.projections
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    /// Source projection, rotate, target inverse projection.
    pub fn transform_geo(&self, point: GeoPoint) -> Result<GeoPoint, XodrError> {
        let local = self.projections.source.project(point)?;
        let rotated = self.rotation.rotate_point(local);
        self.projections.target.unproject(rotated)
    }

    /// Local coordinates are not geodetic: rotation only.
    pub fn transform_local(&self, point: LocalPoint) -> LocalPoint {
        self.rotation.rotate_point(point)
    }

    pub fn transform_heading(&self, heading: Heading) -> Heading {
        let rotated = self.rotation.rotate_heading(heading);
        if self.normalize_heading {
            normalize_heading(rotated)
        } else {
            rotated
        }
    }
}

/// Transform one element's geometry.
///
/// Each attribute kind is computed from its own input value only.
pub fn transform_geometry(
    attrs: &GeometryAttrs,
    transformer: &Transformer,
) -> Result<GeometryAttrs, XodrError> {
    Ok(GeometryAttrs {
        geo: attrs
            .geo
            .map(|point| transformer.transform_geo(point))
            .transpose()?,
        local: attrs.local.map(|point| transformer.transform_local(point)),
        heading: attrs.heading.map(|heading| transformer.transform_heading(heading)),
    })
}

/// A transformed document and what changed.
#[derive(Clone, Debug)]
pub struct TransformOutput {
    pub document: String,
    pub report: TransformReport,
}

/// Options for [`transform_file`].
#[derive(Clone, Debug, Default)]
pub struct TransformOptions {
    /// Replace an existing output file.
    pub overwrite: bool,
}

/// Transform an in-memory document.
pub fn transform_document(
    source: &str,
    request: &TransformRequest,
) -> Result<TransformOutput, XodrError> {
    transform_source(source, Path::new("<memory>"), request)
}

/// Transform `input` into `output`.
///
/// Nothing is written unless every stage succeeds; `input` is never modified.
pub fn transform_file(
    input: &Path,
    output: &Path,
    request: &TransformRequest,
    options: &TransformOptions,
) -> Result<TransformReport, XodrError> {
    check_paths(input, output, options).map_err(|err| err.in_stage(Stage::Initialized))?;

    tracing::debug!(stage = %Stage::ReadingInput, path = %input.display());
    let source = xodr::read_document(input).map_err(|err| err.in_stage(Stage::ReadingInput))?;
    let permissions = std::fs::metadata(input).ok().map(|meta| meta.permissions());

    let TransformOutput {
        document,
        mut report,
    } = transform_source(&source, input, request)?;

    tracing::debug!(stage = %Stage::WritingOutput, path = %output.display(), bytes = document.len());
    xodr::write_document(output, &document, options.overwrite, permissions)
        .map_err(|err| err.in_stage(Stage::WritingOutput))?;

    report.input = Some(input.to_path_buf());
    report.output = Some(output.to_path_buf());

    tracing::info!(
        input = %input.display(),
        output = %output.display(),
        geo_points = report.counts.geo_points,
        local_points = report.counts.local_points,
        headings = report.counts.headings,
        "transform complete"
    );

    Ok(report)
}

fn transform_source(
    source: &str,
    path: &Path,
    request: &TransformRequest,
) -> Result<TransformOutput, XodrError> {
    tracing::debug!(stage = %Stage::Initialized, ?request);
    request
        .validate()
        .map_err(|err| err.in_stage(Stage::Initialized))?;

    let scanned =
        xodr::scan_document(source, path).map_err(|err| err.in_stage(Stage::ReadingInput))?;

    tracing::debug!(stage = %Stage::ParsingOrigin);
    let (geo_reference, content_range) = match scanned.geo_reference {
        Some(slot) => {
            if slot.has_child_elements {
                return Err(XodrError::MissingOrigin {
                    reason: "geoReference contains child elements".to_string(),
                }
                .in_stage(Stage::ParsingOrigin));
            }
            let georef = GeoReference::parse(&slot.text)
                .map_err(|err| err.in_stage(Stage::ParsingOrigin))?;
            let range = slot.content.ok_or_else(|| {
                XodrError::MissingOrigin {
                    reason: "geoReference element is empty".to_string(),
                }
                .in_stage(Stage::ParsingOrigin)
            })?;
            (georef, range)
        }
        None => {
            let reason = if scanned.geo_reference_count == 0 {
                "no header/geoReference element found".to_string()
            } else {
                format!(
                    "expected one header/geoReference element, found {}",
                    scanned.geo_reference_count
                )
            };
            return Err(XodrError::MissingOrigin { reason }.in_stage(Stage::ParsingOrigin));
        }
    };

    let original_origin = geo_reference.origin();
    if !original_origin.is_in_range() {
        return Err(XodrError::MissingOrigin {
            reason: format!("origin {original_origin} is outside [-90, 90] x [-180, 180]"),
        }
        .in_stage(Stage::ParsingOrigin));
    }

    tracing::debug!(
        stage = %Stage::BuildingProjections,
        proj = geo_reference.param("proj").unwrap_or("unspecified"),
        ellps = geo_reference.param("ellps").unwrap_or("unspecified"),
        %original_origin
    );
    let transformer = Transformer::new(original_origin, request)
        .map_err(|err| err.in_stage(Stage::BuildingProjections))?;
    if geo_reference.param("ellps").is_some_and(|ellps| ellps != "WGS84") {
        tracing::warn!(
            ellps = geo_reference.param("ellps"),
            "descriptor names a non-WGS84 ellipsoid; coordinates are projected on WGS84"
        );
    }

    tracing::debug!(stage = %Stage::RewritingNodes, elements = scanned.elements.len());
    let mut report = TransformReport {
        original_origin,
        new_origin: transformer.projections().target.origin(),
        rotation_deg: request.rotation_deg(),
        headings_normalized: request.normalize_heading(),
        ..Default::default()
    };
    report.counts.elements = scanned.element_count;

    let mut edits = Vec::new();
    for element in &scanned.elements {
        let attrs = read_geometry(element, &mut report.unpaired)
            .map_err(|err| err.in_stage(Stage::RewritingNodes))?;
        let transformed = transform_geometry(&attrs, &transformer)
            .map_err(|err| err.in_stage(Stage::RewritingNodes))?;
        push_edits(element, &transformed, &mut edits, &mut report.counts);
    }

    for item in &report.unpaired {
        tracing::warn!(
            node = %item.node,
            present = %item.present,
            missing = %item.missing,
            "unpaired coordinate attribute left unchanged"
        );
    }

    tracing::debug!(stage = %Stage::WritingOrigin, new_origin = %report.new_origin);
    let rewritten = geo_reference.rewrite(report.new_origin);
    edits.push(Edit::new(
        content_range,
        xodr::geo_reference_content(&rewritten),
    ));

    let document =
        xodr::apply_edits(source, edits).map_err(|err| err.in_stage(Stage::WritingOrigin))?;
    tracing::debug!(stage = %Stage::Done);

    Ok(TransformOutput { document, report })
}

/// Parse an element's geometry attributes.
///
/// Coordinates are only read as complete pairs; a lone `lat`, `lon`, `x`
/// or `y` is recorded in `unpaired` and not parsed.
pub fn read_geometry(
    element: &ScannedElement,
    unpaired: &mut Vec<UnpairedAttribute>,
) -> Result<GeometryAttrs, XodrError> {
    let mut attrs = GeometryAttrs::default();

    if let Some((lat, lon)) = pair(element, "lat", "lon", unpaired) {
        attrs.geo = Some(GeoPoint::new(lat?, lon?));
    }
    if let Some((x, y)) = pair(element, "x", "y", unpaired) {
        attrs.local = Some(LocalPoint::new(x?, y?));
    }
    if element.get("hdg").is_some() {
        attrs.heading = Some(Heading(parse_number(element, "hdg")?));
    }

    Ok(attrs)
}

type ParsedPair = (Result<f64, XodrError>, Result<f64, XodrError>);

fn pair(
    element: &ScannedElement,
    first: &str,
    second: &str,
    unpaired: &mut Vec<UnpairedAttribute>,
) -> Option<ParsedPair> {
    match (element.get(first), element.get(second)) {
        (Some(_), Some(_)) => Some((
            parse_number(element, first),
            parse_number(element, second),
        )),
        (Some(_), None) | (None, Some(_)) => {
            let (present, missing) = if element.get(first).is_some() {
                (first, second)
            } else {
                (second, first)
            };
            unpaired.push(UnpairedAttribute {
                node: element.path.clone(),
                present: present.to_string(),
                missing: missing.to_string(),
            });
            None
        }
        (None, None) => None,
    }
}

fn parse_number(element: &ScannedElement, name: &str) -> Result<f64, XodrError> {
    let raw = element.get(name).map(|attr| attr.value.as_str()).unwrap_or("");
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(XodrError::InvalidGeometry {
            node: element.path.clone(),
            attribute: name.to_string(),
            value: raw.to_string(),
        }),
    }
}

fn push_edits(
    element: &ScannedElement,
    transformed: &GeometryAttrs,
    edits: &mut Vec<Edit>,
    counts: &mut TransformCounts,
) {
    let mut set = |name: &str, value: f64| {
        if let Some(attr) = element.get(name) {
            edits.push(Edit::new(attr.range.clone(), xodr::format_number(value)));
        }
    };

    if let Some(point) = transformed.geo {
        set("lat", point.lat);
        set("lon", point.lon);
        counts.geo_points += 1;
    }
    if let Some(point) = transformed.local {
        set("x", point.x);
        set("y", point.y);
        counts.local_points += 1;
    }
    if let Some(heading) = transformed.heading {
        set("hdg", heading.radians());
        counts.headings += 1;
    }
}

fn check_paths(
    input: &Path,
    output: &Path,
    options: &TransformOptions,
) -> Result<(), XodrError> {
    if output.exists() {
        let same_file = match (input.canonicalize(), output.canonicalize()) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        };
        if same_file {
            return Err(XodrError::InvalidRequest(format!(
                "output {} is the input file; refusing to modify the input",
                output.display()
            )));
        }
        if !options.overwrite {
            return Err(XodrError::OutputExists {
                path: output.to_path_buf(),
            });
        }
    }
    Ok(())
}
