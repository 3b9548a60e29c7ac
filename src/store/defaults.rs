//! Default monthly pattern, generated the first time a sheet is requested.
//! Pure so the pattern is testable without any persistence behind it.

use crate::model::attendance::{AttendanceStatus, DailyRecord, MonthlySheet};
use crate::utils::clock::{DEFAULT_SHIFT_END, DEFAULT_SHIFT_START, format_clock_time};
use chrono::{Datelike, NaiveDate, Weekday};

/// Synthesizes the month for an employee with no persisted data: Sundays are
/// week-off, elapsed weekdays default to a standard present day. Today and
/// everything after it stay unmarked so the punch pipeline owns today's
/// record.
pub fn default_sheet(employee_id: u64, year: i32, month: u32, today: NaiveDate) -> MonthlySheet {
    let mut sheet = MonthlySheet::blank(employee_id, year, month);

    for rec in sheet.days.iter_mut() {
        let Some(date) = NaiveDate::from_ymd_opt(year, month, rec.day) else {
            continue;
        };
        if date >= today {
            continue;
        }
        if date.weekday() == Weekday::Sun {
            rec.status = AttendanceStatus::WeekOff;
        } else {
            *rec = standard_present_day(rec.day);
        }
    }

    sheet
}

fn standard_present_day(day: u32) -> DailyRecord {
    DailyRecord {
        day,
        status: AttendanceStatus::Present,
        check_in: Some(format_clock_time(DEFAULT_SHIFT_START)),
        check_out: Some(format_clock_time(DEFAULT_SHIFT_END)),
        is_late: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sundays_are_week_off() {
        let today = NaiveDate::from_ymd_opt(2026, 8, 31).unwrap();
        let sheet = default_sheet(1, 2026, 8, today);
        // 2026-08-02 is a Sunday.
        assert_eq!(sheet.record(2).unwrap().status, AttendanceStatus::WeekOff);
        assert_eq!(sheet.record(9).unwrap().status, AttendanceStatus::WeekOff);
    }

    #[test]
    fn elapsed_weekdays_default_to_present_with_standard_times() {
        let today = NaiveDate::from_ymd_opt(2026, 8, 10).unwrap();
        let sheet = default_sheet(1, 2026, 8, today);
        let monday = sheet.record(3).unwrap();
        assert_eq!(monday.status, AttendanceStatus::Present);
        assert_eq!(monday.check_in.as_deref(), Some("09:30 AM"));
        assert_eq!(monday.check_out.as_deref(), Some("06:30 PM"));
        assert!(!monday.is_late);
    }

    #[test]
    fn today_and_future_days_stay_unmarked() {
        let today = NaiveDate::from_ymd_opt(2026, 8, 10).unwrap();
        let sheet = default_sheet(1, 2026, 8, today);
        for rec in sheet.days.iter().filter(|r| r.day >= 10) {
            assert_eq!(rec.status, AttendanceStatus::NotMarked, "day {}", rec.day);
            assert!(rec.check_in.is_none());
        }
    }

    #[test]
    fn past_month_fills_completely() {
        let today = NaiveDate::from_ymd_opt(2026, 8, 10).unwrap();
        let sheet = default_sheet(1, 2026, 7, today);
        assert!(
            sheet
                .days
                .iter()
                .all(|r| r.status != AttendanceStatus::NotMarked)
        );
    }
}
