//! Structured reader and writer for the proj4 origin descriptor.
//!
//! OpenDRIVE stores its projection in `header/geoReference` as a proj4
//! parameter string such as
//! `+proj=tmerc +lat_0=39.0 +lon_0=-77.0 +ellps=WGS84 +units=m +no_defs`.
//! Only the `+lat_0` and `+lon_0` values matter for re-georeferencing; the
//! remaining parameters are kept as opaque tokens and written back untouched.

use std::ops::Range;

use super::GeoPoint;
use crate::error::XodrError;

const LAT_KEY: &str = "lat_0";
const LON_KEY: &str = "lon_0";

/// One whitespace-separated token of a proj4 string.
///
/// `+key=value` and `+flag` tokens are split into key and value; anything
/// else is kept whole in `key` with no value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProjParam {
    pub key: String,
    pub value: Option<String>,
    /// Byte range of `value` within the descriptor text.
    value_span: Option<Range<usize>>,
}

/// A parsed origin descriptor.
#[derive(Clone, Debug, PartialEq)]
pub struct GeoReference {
    text: String,
    params: Vec<ProjParam>,
    origin: GeoPoint,
    lat_span: Range<usize>,
    lon_span: Range<usize>,
}

impl GeoReference {
    /// Parse a proj4 descriptor, requiring both `+lat_0` and `+lon_0`.
    pub fn parse(text: &str) -> Result<Self, XodrError> {
        if text.trim().is_empty() {
            return Err(missing("geoReference descriptor is empty"));
        }

        let params = tokenize(text);
        let (lat, lat_span) = required_number(&params, LAT_KEY)?;
        let (lon, lon_span) = required_number(&params, LON_KEY)?;

        Ok(Self {
            text: text.to_string(),
            params,
            origin: GeoPoint::new(lat, lon),
            lat_span,
            lon_span,
        })
    }

    /// The origin encoded by `+lat_0` / `+lon_0`.
    pub fn origin(&self) -> GeoPoint {
        self.origin
    }

    /// The descriptor text exactly as parsed.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// All tokens in descriptor order.
    pub fn params(&self) -> &[ProjParam] {
        &self.params
    }

    /// Value of the first `+key=value` parameter named `key`.
    ///
    /// Flags such as `+no_defs` are present but have no value.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|param| param.key == key)
            .and_then(|param| param.value.as_deref())
    }

    /// Returns true if a parameter named `key` is present, with or without a value.
    pub fn has_param(&self, key: &str) -> bool {
        self.params.iter().any(|param| param.key == key)
    }

    /// Render the descriptor with a new origin.
    ///
    /// Only the two origin values change; every other byte is copied as-is.
    /// Values use the shortest representation that parses back to the same
    /// `f64`.
    pub fn rewrite(&self, origin: GeoPoint) -> String {
        let mut edits = [
            (self.lat_span.clone(), origin.lat.to_string()),
            (self.lon_span.clone(), origin.lon.to_string()),
        ];
        edits.sort_by_key(|(span, _)| span.start);

        let mut out = String::with_capacity(self.text.len() + 16);
        let mut cursor = 0;
        for (span, value) in &edits {
            out.push_str(&self.text[cursor..span.start]);
            out.push_str(value);
            cursor = span.end;
        }
        out.push_str(&self.text[cursor..]);
        out
    }
}

/// Extract the origin `(lat_0, lon_0)` from a proj4 descriptor.
pub fn parse_origin(text: &str) -> Result<GeoPoint, XodrError> {
    GeoReference::parse(text).map(|georef| georef.origin())
}

/// Replace the `+lat_0` / `+lon_0` values of a proj4 descriptor.
pub fn rewrite_origin(text: &str, origin: GeoPoint) -> Result<String, XodrError> {
    GeoReference::parse(text).map(|georef| georef.rewrite(origin))
}

fn tokenize(text: &str) -> Vec<ProjParam> {
    let mut params = Vec::new();
    let mut start = None;

    for (idx, ch) in text.char_indices().chain(std::iter::once((text.len(), ' '))) {
        match (ch.is_whitespace(), start) {
            (false, None) => start = Some(idx),
            (true, Some(token_start)) => {
                params.push(parse_token(&text[token_start..idx], token_start));
                start = None;
            }
            _ => {}
        }
    }

    params
}

fn parse_token(token: &str, offset: usize) -> ProjParam {
    let Some(body) = token.strip_prefix('+') else {
        return ProjParam {
            key: token.to_string(),
            value: None,
            value_span: None,
        };
    };

    match body.split_once('=') {
        Some((key, value)) => {
            let value_start = offset + 1 + key.len() + 1;
            ProjParam {
                key: key.to_string(),
                value: Some(value.to_string()),
                value_span: Some(value_start..value_start + value.len()),
            }
        }
        None => ProjParam {
            key: body.to_string(),
            value: None,
            value_span: None,
        },
    }
}

fn required_number(params: &[ProjParam], key: &str) -> Result<(f64, Range<usize>), XodrError> {
    let mut matches = params.iter().filter(|param| param.key == key);
    let param = matches
        .next()
        .ok_or_else(|| missing(format!("geoReference does not contain +{key}")))?;
    if matches.next().is_some() {
        return Err(missing(format!("geoReference contains +{key} more than once")));
    }

    let (Some(raw), Some(span)) = (param.value.as_deref(), param.value_span.clone()) else {
        return Err(missing(format!("+{key} has no value")));
    };

    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok((value, span)),
        _ => Err(missing(format!("+{key} value '{raw}' is not a finite number"))),
    }
}

fn missing(reason: impl Into<String>) -> XodrError {
    XodrError::MissingOrigin {
        reason: reason.into(),
    }
}
