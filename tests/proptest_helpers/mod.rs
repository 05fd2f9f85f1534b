#![allow(dead_code)]

use proptest::prelude::*;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};

use xodr_transform::geo::{wrap_longitude, GeoPoint, Heading, LocalPoint};

/// Tolerance for degrees and metres after a transform round trip.
pub const EPS: f64 = 1e-6;

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(64);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

/// Origins away from the poles, where road networks live. Longitudes
/// cover the antimeridian.
pub fn arb_origin() -> impl Strategy<Value = GeoPoint> {
    let lon = prop_oneof![
        -180.0..=180.0f64,
        179.9..=180.0f64,
        -180.0..=-179.9f64,
    ];
    (-80.0..80.0f64, lon).prop_map(|(lat, lon)| GeoPoint::new(lat, lon))
}

/// A point within roughly 10 km of `origin`, possibly across the
/// antimeridian.
pub fn arb_nearby(origin: GeoPoint) -> impl Strategy<Value = GeoPoint> {
    (-0.1..0.1f64, -0.1..0.1f64).prop_map(move |(dlat, dlon)| {
        GeoPoint::new(origin.lat + dlat, wrap_longitude(origin.lon + dlon))
    })
}

pub fn arb_local() -> impl Strategy<Value = LocalPoint> {
    (-5_000.0..5_000.0f64, -5_000.0..5_000.0f64).prop_map(|(x, y)| LocalPoint::new(x, y))
}

pub fn arb_heading() -> impl Strategy<Value = Heading> {
    (-10.0..10.0f64).prop_map(Heading)
}

pub fn arb_angle() -> impl Strategy<Value = f64> {
    -360.0..=360.0f64
}

pub fn close(a: f64, b: f64, eps: f64) -> Result<(), String> {
    if (a - b).abs() <= eps {
        Ok(())
    } else {
        Err(format!("{a} and {b} differ by more than {eps}"))
    }
}

/// Like [`close`], treating longitudes 360 degrees apart as equal.
pub fn close_lon(a: f64, b: f64, eps: f64) -> Result<(), String> {
    close(wrap_longitude(a - b), 0.0, eps).map_err(|_| format!("longitudes {a} and {b} differ"))
}

/// Render a minimal OpenDRIVE document with one geometry element.
pub fn document(origin: GeoPoint, geo: GeoPoint, local: LocalPoint, heading: Heading) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<OpenDRIVE>
  <header><geoReference><![CDATA[+proj=tmerc +lat_0={} +lon_0={} +ellps=WGS84 +units=m +no_defs]]></geoReference></header>
  <road id="1"><planView><geometry s="0" x="{}" y="{}" hdg="{}" length="1"><line/></geometry></planView>
    <userData><gps lat="{}" lon="{}"/></userData></road>
</OpenDRIVE>
"#,
        origin.lat, origin.lon, local.x, local.y, heading.0, geo.lat, geo.lon
    )
}

/// Read back `(lat, lon, x, y, hdg)` from a document made by [`document`].
pub fn read_values(xml: &str) -> (f64, f64, f64, f64, f64) {
    let doc = roxmltree::Document::parse(xml).expect("parse xml");
    let number = |tag: &str, attr: &str| -> f64 {
        doc.descendants()
            .find(|node| node.has_tag_name(tag))
            .and_then(|node| node.attribute(attr))
            .and_then(|value| value.parse().ok())
            .unwrap_or_else(|| panic!("missing {tag}@{attr}"))
    };
    (
        number("gps", "lat"),
        number("gps", "lon"),
        number("geometry", "x"),
        number("geometry", "y"),
        number("geometry", "hdg"),
    )
}
