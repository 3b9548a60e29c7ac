use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Branch office location with its attendance geofence.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Branch {
    #[schema(example = "Head Office")]
    pub name: String,

    #[schema(example = 23.8103)]
    pub lat: f64,

    #[schema(example = 90.4125)]
    pub lng: f64,

    /// Geofence radius in metres around the branch.
    #[schema(example = 200.0)]
    pub radius_m: f64,
}
