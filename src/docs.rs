use crate::api::attendance::{BulkMarkRequest, PunchRequest};
use crate::api::muster_roll::MusterQuery;
use crate::model::attendance::{AttendanceStatus, DailyRecord, MonthlySheet};
use crate::model::branch::Branch;
use crate::model::employee::EmployeeProfile;
use crate::model::stats::{AttendanceStats, MusterRow};
use crate::punch::capability::PermissionState;
use crate::store::records::RecordPatch;
use crate::utils::geofence::GeoPoint;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Punchclock API",
        version = "1.0.0",
        description = r#"
## Geofenced Attendance & Time Tracking

This API powers the attendance core of an HR system: a geofenced punch
clock, monthly attendance sheets, and multi-employee muster rolls.

### 🔹 Key Features
- **Punch Clock**
  - Capability-gated check-in/check-out with geofence validation
  - Lateness computed against each employee's shift window
- **Monthly Sheets**
  - Generated on first access, one record per calendar day
  - Bulk marking of unmarked days; admin-level record edits
- **Reporting**
  - Per-employee statistics and worked-hours totals
  - Day-by-day muster roll across any set of employees

### 📦 Response Format
- JSON-based RESTful responses
- Punch rejections come back categorized (`location_denied`,
  `camera_denied`, `geofence_violation`) with a human-readable detail

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::attendance::get_monthly_attendance,
        crate::api::attendance::punch,
        crate::api::attendance::bulk_mark,
        crate::api::attendance::monthly_stats,

        crate::api::muster_roll::get_muster_roll,

        crate::api::admin::edit_record
    ),
    components(
        schemas(
            AttendanceStatus,
            DailyRecord,
            MonthlySheet,
            EmployeeProfile,
            Branch,
            AttendanceStats,
            MusterRow,
            MusterQuery,
            PunchRequest,
            BulkMarkRequest,
            RecordPatch,
            PermissionState,
            GeoPoint
        )
    ),
    tags(
        (name = "Attendance", description = "Punch clock, monthly sheets and muster rolls"),
    )
)]
pub struct ApiDoc;
