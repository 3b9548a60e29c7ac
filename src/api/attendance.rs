use crate::aggregate::{aggregate_sheet, total_worked_minutes};
use crate::config::Config;
use crate::directory::{BranchDirectory, EmployeeDirectory};
use crate::model::attendance::{AttendanceStatus, MonthlySheet};
use crate::model::employee::EmployeeProfile;
use crate::notify::NotificationDispatcher;
use crate::punch::capability::{PermissionState, ReportedCapabilities};
use crate::punch::{PunchOutcome, PunchPipeline, PunchRejection};
use crate::store::records::RecordStore;
use crate::utils::clock::format_duration;
use crate::utils::employee_filter;
use crate::utils::geofence::GeoPoint;
use actix_web::{HttpResponse, Responder, web};
use chrono::{Local, Timelike};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, instrument};
use utoipa::ToSchema;

pub type SharedNotifier = Arc<dyn NotificationDispatcher>;

/// Capability results as probed by the punching client device.
#[derive(Debug, Deserialize, ToSchema)]
pub struct PunchRequest {
    #[serde(default)]
    pub location_permission: PermissionState,
    /// Fresh high-accuracy fix; omitted when location was not granted.
    pub position: Option<GeoPoint>,
    #[serde(default)]
    pub camera_permission: PermissionState,
    /// True while the client has its QR scanning view open.
    #[serde(default)]
    pub scan_mode: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct BulkMarkRequest {
    #[schema(example = "absent")]
    pub status: AttendanceStatus,
}

/// Resolves the employee; keeps the punch-time filter fresh by re-inserting
/// ids that turn out to exist.
async fn resolve_employee(
    employees: &EmployeeDirectory,
    employee_id: u64,
) -> actix_web::Result<Option<EmployeeProfile>> {
    let profile = employees.profile(employee_id).await.map_err(|e| {
        error!(error = %e, employee_id, "Failed to fetch employee");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    if profile.is_some() {
        employee_filter::insert(employee_id);
    }
    Ok(profile)
}

fn employee_not_found() -> HttpResponse {
    HttpResponse::NotFound().json(json!({
        "message": "Employee not found"
    }))
}

fn invalid_month_response(month: u32) -> Option<HttpResponse> {
    if (1..=12).contains(&month) {
        None
    } else {
        Some(HttpResponse::BadRequest().json(json!({
            "message": format!("Invalid month {month}; expected 1-12")
        })))
    }
}

/// Monthly attendance sheet
#[utoipa::path(
    get,
    path = "/api/v1/attendance/{employee_id}/{year}/{month}",
    params(
        ("employee_id" = u64, Path, description = "Employee ID"),
        ("year" = i32, Path, description = "Calendar year"),
        ("month" = u32, Path, description = "Calendar month 1-12")
    ),
    responses(
        (status = 200, description = "Monthly sheet, generated on first access", body = MonthlySheet),
        (status = 400, description = "Invalid month"),
        (status = 404, description = "Employee not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn get_monthly_attendance(
    path: web::Path<(u64, i32, u32)>,
    records: web::Data<RecordStore>,
    employees: web::Data<EmployeeDirectory>,
) -> actix_web::Result<impl Responder> {
    let (employee_id, year, month) = path.into_inner();

    if let Some(bad) = invalid_month_response(month) {
        return Ok(bad);
    }
    let Some(profile) = resolve_employee(&employees, employee_id).await? else {
        return Ok(employee_not_found());
    };

    let today = Local::now().date_naive();
    let sheet = records
        .monthly_sheet(profile.id, year, month, today)
        .await
        .map_err(|e| {
            error!(error = %e, employee_id, year, month, "Failed to load monthly sheet");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Ok().json(sheet))
}

/// Punch in/out
///
/// Direction is inferred from today's record: first punch of the day checks
/// in, the second checks out, anything after that is refused.
#[utoipa::path(
    post,
    path = "/api/v1/attendance/{employee_id}/punch",
    params(
        ("employee_id" = u64, Path, description = "Employee ID")
    ),
    request_body = PunchRequest,
    responses(
        (status = 200, description = "Punch accepted", body = Object, example = json!({
            "outcome": "success",
            "direction": "punch_in",
            "within_geofence": true,
            "save_confirmed": true
        })),
        (status = 400, description = "Punch rejected", body = Object, example = json!({
            "outcome": "rejected",
            "reason": "geofence_violation",
            "detail": "50 m outside the 200 m branch radius"
        })),
        (status = 404, description = "Employee not found"),
        (status = 409, description = "Another punch already in progress"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
#[instrument(skip_all, fields(employee_id = *path))]
pub async fn punch(
    path: web::Path<u64>,
    payload: web::Json<PunchRequest>,
    records: web::Data<RecordStore>,
    employees: web::Data<EmployeeDirectory>,
    branches: web::Data<BranchDirectory>,
    notifier: web::Data<SharedNotifier>,
    config: web::Data<Config>,
) -> actix_web::Result<impl Responder> {
    let employee_id = path.into_inner();

    // Fast-reject ids the warmed filter has never seen.
    if !employee_filter::might_exist(employee_id) {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Employee not found"
        })));
    }
    let Some(profile) = resolve_employee(&employees, employee_id).await? else {
        return Ok(employee_not_found());
    };

    let branch = if profile.gps_geofencing {
        branches.branch(&profile.branch).await.map_err(|e| {
            error!(error = %e, employee_id, branch = %profile.branch, "Failed to resolve branch");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?
    } else {
        None
    };

    let source = ReportedCapabilities {
        location: payload.location_permission,
        position: payload.position,
        camera: payload.camera_permission,
    };

    let pipeline = PunchPipeline::new(
        records.get_ref().clone(),
        notifier.get_ref().clone(),
        Duration::from_secs(config.location_timeout_secs),
        config.late_grace_min,
    );

    let now = Local::now();
    let today = now.date_naive();
    let now_minutes = i64::from(now.time().hour()) * 60 + i64::from(now.time().minute());

    let outcome = pipeline
        .punch(
            &profile,
            branch.as_ref(),
            &source,
            payload.scan_mode,
            today,
            now_minutes,
        )
        .await
        .map_err(|e| {
            error!(error = %e, employee_id, "Punch pipeline failed");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(match outcome {
        PunchOutcome::Completed(success) => HttpResponse::Ok().json(json!({
            "outcome": "success",
            "direction": success.direction.to_string(),
            "record": success.record,
            "within_geofence": success.within_geofence,
            "save_confirmed": success.persisted
        })),
        PunchOutcome::Rejected(rejection) => rejection_response(&rejection),
    })
}

fn rejection_response(rejection: &PunchRejection) -> HttpResponse {
    let mut body = json!({
        "outcome": "rejected",
        "reason": rejection.to_string(),
        "detail": rejection.detail()
    });

    if let PunchRejection::OutsideGeofence {
        distance_m,
        over_by_m,
        radius_m,
    } = rejection
    {
        body["distance_m"] = json!(distance_m.round());
        body["over_by_m"] = json!(over_by_m.round());
        body["radius_m"] = json!(radius_m);
    }

    match rejection {
        PunchRejection::Busy => HttpResponse::Conflict().json(body),
        _ => HttpResponse::BadRequest().json(body),
    }
}

/// Bulk-mark unmarked days
///
/// Applies the status to every still-unmarked day up to today. Days that
/// already carry an explicit decision are never overridden.
#[utoipa::path(
    post,
    path = "/api/v1/attendance/{employee_id}/{year}/{month}/bulk-mark",
    params(
        ("employee_id" = u64, Path, description = "Employee ID"),
        ("year" = i32, Path, description = "Calendar year"),
        ("month" = u32, Path, description = "Calendar month 1-12")
    ),
    request_body = BulkMarkRequest,
    responses(
        (status = 200, description = "Updated sheet", body = MonthlySheet),
        (status = 400, description = "Invalid month"),
        (status = 404, description = "Employee not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn bulk_mark(
    path: web::Path<(u64, i32, u32)>,
    payload: web::Json<BulkMarkRequest>,
    records: web::Data<RecordStore>,
    employees: web::Data<EmployeeDirectory>,
) -> actix_web::Result<impl Responder> {
    let (employee_id, year, month) = path.into_inner();

    if let Some(bad) = invalid_month_response(month) {
        return Ok(bad);
    }
    let Some(profile) = resolve_employee(&employees, employee_id).await? else {
        return Ok(employee_not_found());
    };

    let today = Local::now().date_naive();
    let sheet = records
        .bulk_mark(profile.id, year, month, payload.status, today)
        .await
        .map_err(|e| {
            error!(error = %e, employee_id, year, month, "Bulk mark failed");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Ok().json(sheet))
}

/// Monthly statistics
#[utoipa::path(
    get,
    path = "/api/v1/attendance/{employee_id}/{year}/{month}/stats",
    params(
        ("employee_id" = u64, Path, description = "Employee ID"),
        ("year" = i32, Path, description = "Calendar year"),
        ("month" = u32, Path, description = "Calendar month 1-12")
    ),
    responses(
        (status = 200, description = "Aggregated stats", body = Object, example = json!({
            "stats": {
                "present": 18, "absent": 2, "half_day": 1, "paid_leave": 1,
                "week_off": 4, "not_marked": 5, "late": 3
            },
            "total_worked_minutes": 9720,
            "total_worked": "162h 0m"
        })),
        (status = 400, description = "Invalid month"),
        (status = 404, description = "Employee not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn monthly_stats(
    path: web::Path<(u64, i32, u32)>,
    records: web::Data<RecordStore>,
    employees: web::Data<EmployeeDirectory>,
) -> actix_web::Result<impl Responder> {
    let (employee_id, year, month) = path.into_inner();

    if let Some(bad) = invalid_month_response(month) {
        return Ok(bad);
    }
    let Some(profile) = resolve_employee(&employees, employee_id).await? else {
        return Ok(employee_not_found());
    };

    let today = Local::now().date_naive();
    let sheet = records
        .monthly_sheet(profile.id, year, month, today)
        .await
        .map_err(|e| {
            error!(error = %e, employee_id, year, month, "Failed to load monthly sheet");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    let stats = aggregate_sheet(&sheet);
    let total_minutes = total_worked_minutes(&sheet);

    Ok(HttpResponse::Ok().json(json!({
        "stats": stats,
        "total_worked_minutes": total_minutes,
        "total_worked": format_duration(total_minutes)
    })))
}
