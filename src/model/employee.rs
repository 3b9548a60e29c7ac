use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1001,
        "employee_code": "EMP-1001",
        "first_name": "John",
        "last_name": "Doe",
        "branch": "Head Office",
        "gps_geofencing": true,
        "qr_scan": false,
        "live_tracking": false,
        "working_hours": "09:30 AM-06:30 PM"
    })
)]
pub struct EmployeeProfile {
    #[schema(example = 1001)]
    pub id: u64,

    #[schema(example = "EMP-1001")]
    pub employee_code: String,

    #[schema(example = "John")]
    pub first_name: String,

    #[schema(example = "Doe")]
    pub last_name: String,

    /// Branch name; resolved to a geofence through the branch directory.
    #[schema(example = "Head Office")]
    pub branch: String,

    /// Punches must come from inside the branch geofence.
    pub gps_geofencing: bool,
    /// Punches require the camera/QR availability check.
    pub qr_scan: bool,
    pub live_tracking: bool,

    /// Shift window "hh:mm AM/PM-hh:mm AM/PM"; falls back to the configured
    /// default when absent.
    #[schema(example = "09:30 AM-06:30 PM", nullable = true)]
    pub working_hours: Option<String>,
}

impl EmployeeProfile {
    /// Location must be acquired when geofencing or live tracking applies.
    pub fn needs_location(&self) -> bool {
        self.gps_geofencing || self.live_tracking
    }

    pub fn needs_camera(&self) -> bool {
        self.qr_scan
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}
