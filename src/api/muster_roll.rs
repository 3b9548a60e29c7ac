use crate::aggregate::muster_roll;
use crate::directory::EmployeeDirectory;
use crate::store::records::RecordStore;
use actix_web::{HttpResponse, Responder, web};
use chrono::Local;
use serde::Deserialize;
use serde_json::json;
use tracing::error;
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct MusterQuery {
    /// Comma-separated employee ids, e.g. "1001,1002,1003"
    #[schema(example = "1001,1002,1003")]
    pub employee_ids: String,
}

fn parse_ids(raw: &str) -> Result<Vec<u64>, String> {
    let mut ids = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let id: u64 = part
            .parse()
            .map_err(|_| format!("invalid employee id {part:?}"))?;
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    Ok(ids)
}

/// Muster roll
///
/// Day-by-day status grid across employees for a month, with per-employee
/// present/absent/late counts. The current month is truncated at today.
#[utoipa::path(
    get,
    path = "/api/v1/attendance/muster-roll/{year}/{month}",
    params(
        ("year" = i32, Path, description = "Calendar year"),
        ("month" = u32, Path, description = "Calendar month 1-12"),
        MusterQuery
    ),
    responses(
        (status = 200, description = "Muster roll rows", body = Object, example = json!({
            "year": 2026,
            "month": 8,
            "rows": [{
                "employee_id": 1001,
                "employee_name": "John Doe",
                "present": 6,
                "absent": 1,
                "late": 2,
                "grid": ["P", "WO", "P", "P", "A", "P", "P", "P"]
            }]
        })),
        (status = 400, description = "Invalid month or id list"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn get_muster_roll(
    path: web::Path<(i32, u32)>,
    query: web::Query<MusterQuery>,
    records: web::Data<RecordStore>,
    employees: web::Data<EmployeeDirectory>,
) -> actix_web::Result<impl Responder> {
    let (year, month) = path.into_inner();

    if !(1..=12).contains(&month) {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": format!("Invalid month {month}; expected 1-12")
        })));
    }

    let ids = match parse_ids(&query.employee_ids) {
        Ok(ids) if !ids.is_empty() => ids,
        Ok(_) => {
            return Ok(HttpResponse::BadRequest().json(json!({
                "message": "employee_ids must name at least one employee"
            })));
        }
        Err(msg) => {
            return Ok(HttpResponse::BadRequest().json(json!({ "message": msg })));
        }
    };

    let profiles = employees.profiles(&ids).await.map_err(|e| {
        error!(error = %e, "Failed to resolve muster roll employees");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let today = Local::now().date_naive();
    let rows = muster_roll(&records, &profiles, year, month, today)
        .await
        .map_err(|e| {
            error!(error = %e, year, month, "Failed to build muster roll");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Ok().json(json!({
        "year": year,
        "month": month,
        "rows": rows
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_dedupes_id_list() {
        assert_eq!(parse_ids("1001, 1002,1001,").unwrap(), vec![1001, 1002]);
        assert!(parse_ids("1001,abc").is_err());
        assert!(parse_ids("").unwrap().is_empty());
    }
}
