//! Derived statistics over monthly sheets: individual calendars and the
//! cross-employee muster roll. The muster roll reads the same persisted
//! sheets the individual view reads, so the two never disagree.

use crate::model::attendance::{AttendanceStatus, MonthlySheet};
use crate::model::employee::EmployeeProfile;
use crate::model::stats::{AttendanceStats, MusterRow};
use crate::store::records::RecordStore;
use crate::utils::clock::compute_duration;
use anyhow::Result;
use chrono::{Datelike, NaiveDate};

/// Single pass over the sheet producing per-status counts and the late count.
pub fn aggregate_sheet(sheet: &MonthlySheet) -> AttendanceStats {
    let mut stats = AttendanceStats::default();
    for rec in &sheet.days {
        match rec.status {
            AttendanceStatus::Present => stats.present += 1,
            AttendanceStatus::Absent => stats.absent += 1,
            AttendanceStatus::HalfDay => stats.half_day += 1,
            AttendanceStatus::PaidLeave => stats.paid_leave += 1,
            AttendanceStatus::WeekOff => stats.week_off += 1,
            AttendanceStatus::NotMarked => stats.not_marked += 1,
        }
        if rec.is_late {
            stats.late += 1;
        }
    }
    stats
}

/// Total worked minutes: Present/HalfDay days with both punches. Days with
/// unparseable times contribute nothing rather than failing the total.
pub fn total_worked_minutes(sheet: &MonthlySheet) -> i64 {
    sheet
        .days
        .iter()
        .filter(|r| {
            matches!(
                r.status,
                AttendanceStatus::Present | AttendanceStatus::HalfDay
            )
        })
        .filter_map(|r| {
            let check_in = r.check_in.as_deref()?;
            let check_out = r.check_out.as_deref()?;
            compute_duration(check_in, check_out)
        })
        .sum()
}

/// Builds the muster roll for a set of employees: per-employee P/A/L counts
/// plus a day-by-day status-code grid, truncated to elapsed days for the
/// current month.
pub async fn muster_roll(
    records: &RecordStore,
    employees: &[EmployeeProfile],
    year: i32,
    month: u32,
    today: NaiveDate,
) -> Result<Vec<MusterRow>> {
    let visible_days = if year == today.year() && month == today.month() {
        today.day()
    } else {
        u32::MAX
    };

    let mut rows = Vec::with_capacity(employees.len());
    for profile in employees {
        let sheet = records.monthly_sheet(profile.id, year, month, today).await?;

        let mut row = MusterRow {
            employee_id: profile.id,
            employee_name: profile.full_name(),
            present: 0,
            absent: 0,
            late: 0,
            grid: Vec::new(),
        };
        for rec in sheet.days.iter().filter(|r| r.day <= visible_days) {
            match rec.status {
                AttendanceStatus::Present => row.present += 1,
                AttendanceStatus::Absent => row.absent += 1,
                _ => {}
            }
            if rec.is_late {
                row.late += 1;
            }
            row.grid.push(rec.status.code().to_string());
        }
        rows.push(row);
    }

    Ok(rows)
}
