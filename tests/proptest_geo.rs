//! Property tests for the projection, rotation and origin codec.

use proptest::prelude::*;

use xodr_transform::geo::{
    parse_origin, rewrite_origin, rotate_heading, rotate_point, GeoPoint, TransverseMercator,
};

mod proptest_helpers;

proptest! {
    #![proptest_config(proptest_helpers::proptest_config())]

    #[test]
    fn projection_roundtrip_is_bounded(
        (origin, point) in proptest_helpers::arb_origin()
            .prop_flat_map(|origin| (Just(origin), proptest_helpers::arb_nearby(origin)))
    ) {
        let tm = TransverseMercator::new(origin).expect("projection");
        let back = tm.unproject(tm.project(point).expect("project")).expect("unproject");
        prop_assert!((-180.0..=180.0).contains(&back.lon), "lon {}", back.lon);
        let res = proptest_helpers::close(back.lat, point.lat, 1e-9)
            .and_then(|_| proptest_helpers::close_lon(back.lon, point.lon, 1e-9));
        prop_assert!(res.is_ok(), "{}", res.unwrap_err());
    }

    #[test]
    fn rotation_inverse_restores_point(
        point in proptest_helpers::arb_local(),
        angle in proptest_helpers::arb_angle(),
    ) {
        let back = rotate_point(rotate_point(point, angle), -angle);
        prop_assert!((back.x - point.x).abs() < proptest_helpers::EPS);
        prop_assert!((back.y - point.y).abs() < proptest_helpers::EPS);
    }

    #[test]
    fn rotation_composes_additively(
        point in proptest_helpers::arb_local(),
        a in proptest_helpers::arb_angle(),
        b in proptest_helpers::arb_angle(),
    ) {
        let stepwise = rotate_point(rotate_point(point, a), b);
        let combined = rotate_point(point, a + b);
        prop_assert!((stepwise.x - combined.x).abs() < proptest_helpers::EPS);
        prop_assert!((stepwise.y - combined.y).abs() < proptest_helpers::EPS);
    }

    #[test]
    fn heading_rotation_is_additive(
        heading in proptest_helpers::arb_heading(),
        a in proptest_helpers::arb_angle(),
        b in proptest_helpers::arb_angle(),
    ) {
        let stepwise = rotate_heading(rotate_heading(heading, a), b);
        let combined = rotate_heading(heading, a + b);
        prop_assert!((stepwise.0 - combined.0).abs() < 1e-12);
    }

    #[test]
    fn rewrite_origin_touches_only_origin_values(
        origin in proptest_helpers::arb_origin(),
        replacement in proptest_helpers::arb_origin(),
        extra in proptest::collection::vec("\\+[a-z_]{1,8}(=[A-Za-z0-9._,]{1,10})?", 0..6),
    ) {
        let prefix = extra.join(" ");
        let text = format!("{prefix} +lat_0={} +proj=tmerc\n+lon_0={} +no_defs", origin.lat, origin.lon);

        let rewritten = rewrite_origin(&text, replacement).expect("rewrite");
        let expected = format!(
            "{prefix} +lat_0={} +proj=tmerc\n+lon_0={} +no_defs",
            replacement.lat, replacement.lon
        );
        prop_assert_eq!(&rewritten, &expected);
        prop_assert_eq!(parse_origin(&rewritten).expect("reparse"), replacement);
    }
}

#[test]
fn known_projection_roundtrip() {
    let tm = TransverseMercator::new(GeoPoint::new(39.0, -77.0)).expect("projection");
    let point = GeoPoint::new(39.001, -77.001);
    let back = tm.unproject(tm.project(point).unwrap()).unwrap();
    assert!((back.lat - point.lat).abs() < 1e-6);
    assert!((back.lon - point.lon).abs() < 1e-6);
}
