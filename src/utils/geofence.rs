//! Great-circle distance and geofence containment for punch validation.

use crate::model::branch::Branch;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

const EARTH_RADIUS_M: f64 = 6_371_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GeoPoint {
    #[schema(example = 23.8103)]
    pub lat: f64,
    #[schema(example = 90.4125)]
    pub lng: f64,
}

/// Haversine great-circle distance in metres. Symmetric, zero for identical
/// points.
pub fn distance_m(a: GeoPoint, b: GeoPoint) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_M * h.sqrt().asin()
}

/// Outcome of a containment check, carrying how far outside the fence the
/// point is for user messaging.
#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
pub struct GeofenceCheck {
    pub within: bool,
    #[schema(example = 250.0)]
    pub distance_m: f64,
    /// `max(0, distance - radius)`; zero when inside.
    #[schema(example = 50.0)]
    pub over_by_m: f64,
}

pub fn check(point: GeoPoint, branch: &Branch) -> GeofenceCheck {
    let center = GeoPoint {
        lat: branch.lat,
        lng: branch.lng,
    };
    let distance = distance_m(point, center);
    GeofenceCheck {
        within: distance <= branch.radius_m,
        distance_m: distance,
        over_by_m: (distance - branch.radius_m).max(0.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn branch(lat: f64, lng: f64, radius_m: f64) -> Branch {
        Branch {
            name: "Head Office".into(),
            lat,
            lng,
            radius_m,
        }
    }

    #[test]
    fn identical_points_are_zero() {
        let p = GeoPoint {
            lat: 23.8103,
            lng: 90.4125,
        };
        assert_eq!(distance_m(p, p), 0.0);
    }

    #[test]
    fn distance_is_symmetric() {
        let a = GeoPoint {
            lat: 23.8103,
            lng: 90.4125,
        };
        let b = GeoPoint {
            lat: 23.7806,
            lng: 90.2794,
        };
        let ab = distance_m(a, b);
        let ba = distance_m(b, a);
        assert!((ab - ba).abs() < 1e-9);
        assert!(ab > 0.0);
    }

    #[test]
    fn known_distance_is_close() {
        // One degree of latitude is ~111.2 km.
        let a = GeoPoint { lat: 0.0, lng: 0.0 };
        let b = GeoPoint { lat: 1.0, lng: 0.0 };
        let d = distance_m(a, b);
        assert!((d - 111_195.0).abs() < 200.0, "got {d}");
    }

    #[test]
    fn over_by_reports_excess_metres() {
        // ~250 m north of the branch, fence radius 200 m.
        let fence = branch(23.8103, 90.4125, 200.0);
        let point = GeoPoint {
            lat: 23.8103 + 250.0 / 111_195.0,
            lng: 90.4125,
        };
        let res = check(point, &fence);
        assert!(!res.within);
        assert!((res.over_by_m - 50.0).abs() < 5.0, "over_by {}", res.over_by_m);
    }

    #[test]
    fn inside_fence_has_zero_over_by() {
        let fence = branch(23.8103, 90.4125, 200.0);
        let point = GeoPoint {
            lat: 23.8103,
            lng: 90.4125,
        };
        let res = check(point, &fence);
        assert!(res.within);
        assert_eq!(res.over_by_m, 0.0);
    }
}
