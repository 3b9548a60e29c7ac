use crate::directory::EmployeeDirectory;
use crate::model::attendance::DailyRecord;
use crate::store::records::{RecordPatch, RecordStore};
use actix_web::{HttpResponse, Responder, web};
use chrono::Local;
use serde_json::json;
use tracing::error;

/// Admin record edit
///
/// Merges the supplied fields into one day's record, bypassing every punch
/// validation (no geofence or camera checks apply on this path).
#[utoipa::path(
    patch,
    path = "/api/v1/attendance/{employee_id}/{year}/{month}/{day}",
    params(
        ("employee_id" = u64, Path, description = "Employee ID"),
        ("year" = i32, Path, description = "Calendar year"),
        ("month" = u32, Path, description = "Calendar month 1-12"),
        ("day" = u32, Path, description = "Day of month")
    ),
    request_body = RecordPatch,
    responses(
        (status = 200, description = "Updated record", body = DailyRecord),
        (status = 400, description = "Invalid month"),
        (status = 404, description = "Employee or day not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn edit_record(
    path: web::Path<(u64, i32, u32, u32)>,
    payload: web::Json<RecordPatch>,
    records: web::Data<RecordStore>,
    employees: web::Data<EmployeeDirectory>,
) -> actix_web::Result<impl Responder> {
    let (employee_id, year, month, day) = path.into_inner();

    if !(1..=12).contains(&month) {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": format!("Invalid month {month}; expected 1-12")
        })));
    }

    let exists = employees.profile(employee_id).await.map_err(|e| {
        error!(error = %e, employee_id, "Failed to fetch employee");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;
    if exists.is_none() {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Employee not found"
        })));
    }

    let today = Local::now().date_naive();
    let updated = records
        .edit_record(employee_id, year, month, day, payload.into_inner(), today)
        .await
        .map_err(|e| {
            error!(error = %e, employee_id, year, month, day, "Record edit failed");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    match updated {
        Some(record) => Ok(HttpResponse::Ok().json(record)),
        None => Ok(HttpResponse::NotFound().json(json!({
            "message": format!("No day {day} in {year}-{month:02}")
        }))),
    }
}
