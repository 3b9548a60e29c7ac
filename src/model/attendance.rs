use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::ToSchema;

/// Day-level attendance outcome as stored in the monthly sheet.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema, Default,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AttendanceStatus {
    #[default]
    NotMarked,
    Present,
    Absent,
    HalfDay,
    PaidLeave,
    WeekOff,
}

impl AttendanceStatus {
    /// Short code used in muster-roll grid columns.
    pub fn code(&self) -> &'static str {
        match self {
            AttendanceStatus::NotMarked => "-",
            AttendanceStatus::Present => "P",
            AttendanceStatus::Absent => "A",
            AttendanceStatus::HalfDay => "HD",
            AttendanceStatus::PaidLeave => "PL",
            AttendanceStatus::WeekOff => "WO",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DailyRecord {
    /// 1-based day of month; unique within a sheet.
    #[schema(example = 14)]
    pub day: u32,
    pub status: AttendanceStatus,
    /// Wall-clock punch-in, 12-hour "hh:mm AM/PM".
    #[schema(example = "09:31 AM", nullable = true)]
    pub check_in: Option<String>,
    #[schema(example = "06:28 PM", nullable = true)]
    pub check_out: Option<String>,
    /// Set once at punch-in, immutable afterwards.
    pub is_late: bool,
}

impl DailyRecord {
    pub fn blank(day: u32) -> Self {
        Self {
            day,
            status: AttendanceStatus::NotMarked,
            check_in: None,
            check_out: None,
            is_late: false,
        }
    }

    pub fn is_punched_in(&self) -> bool {
        self.check_in.is_some() && self.check_out.is_none()
    }

    pub fn is_punched_out(&self) -> bool {
        self.check_in.is_some() && self.check_out.is_some()
    }

    /// Drops the record back to its unmarked state.
    pub fn reset(&mut self) {
        self.status = AttendanceStatus::NotMarked;
        self.check_in = None;
        self.check_out = None;
        self.is_late = false;
    }
}

/// One employee's attendance for a single year/month: exactly one record per
/// calendar day, ordered by day.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MonthlySheet {
    #[schema(example = 1001)]
    pub employee_id: u64,
    #[schema(example = 2026)]
    pub year: i32,
    #[schema(example = 8)]
    pub month: u32,
    pub days: Vec<DailyRecord>,
}

impl MonthlySheet {
    pub fn blank(employee_id: u64, year: i32, month: u32) -> Self {
        let days = (1..=days_in_month(year, month))
            .map(DailyRecord::blank)
            .collect();
        Self {
            employee_id,
            year,
            month,
            days,
        }
    }

    pub fn record(&self, day: u32) -> Option<&DailyRecord> {
        self.days.iter().find(|r| r.day == day)
    }

    pub fn record_mut(&mut self, day: u32) -> Option<&mut DailyRecord> {
        self.days.iter_mut().find(|r| r.day == day)
    }

    pub fn is_month_of(&self, date: NaiveDate) -> bool {
        self.year == date.year() && self.month == date.month()
    }

    /// Forces every day past `today` back to unmarked so stale data never
    /// shows up for days not yet reached. Only applies when the sheet is the
    /// current month. Returns true when anything changed.
    pub fn reset_future_days(&mut self, today: NaiveDate) -> bool {
        if !self.is_month_of(today) {
            return false;
        }
        let mut changed = false;
        for rec in self.days.iter_mut().filter(|r| r.day > today.day()) {
            if rec.status != AttendanceStatus::NotMarked
                || rec.check_in.is_some()
                || rec.check_out.is_some()
                || rec.is_late
            {
                rec.reset();
                changed = true;
            }
        }
        changed
    }
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_y, next_m) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_y, next_m, 1)
        .and_then(|first| first.pred_opt())
        .map(|last| last.day())
        .unwrap_or(30)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serde_snake_case() {
        let s: AttendanceStatus = serde_json::from_str("\"week_off\"").unwrap();
        assert_eq!(s, AttendanceStatus::WeekOff);
        let v = serde_json::to_value(AttendanceStatus::HalfDay).unwrap();
        assert_eq!(v, serde_json::json!("half_day"));
    }

    #[test]
    fn blank_sheet_covers_every_day() {
        let sheet = MonthlySheet::blank(1, 2026, 2);
        assert_eq!(sheet.days.len(), 28);
        assert_eq!(sheet.days.first().unwrap().day, 1);
        assert_eq!(sheet.days.last().unwrap().day, 28);

        let leap = MonthlySheet::blank(1, 2024, 2);
        assert_eq!(leap.days.len(), 29);
    }

    #[test]
    fn future_day_reset_only_touches_current_month() {
        let today = NaiveDate::from_ymd_opt(2026, 8, 10).unwrap();

        let mut sheet = MonthlySheet::blank(1, 2026, 8);
        let rec = sheet.record_mut(20).unwrap();
        rec.status = AttendanceStatus::Present;
        rec.check_in = Some("09:30 AM".into());
        assert!(sheet.reset_future_days(today));
        let rec = sheet.record(20).unwrap();
        assert_eq!(rec.status, AttendanceStatus::NotMarked);
        assert!(rec.check_in.is_none());

        // past month left alone
        let mut past = MonthlySheet::blank(1, 2026, 7);
        past.record_mut(20).unwrap().status = AttendanceStatus::Present;
        assert!(!past.reset_future_days(today));
        assert_eq!(past.record(20).unwrap().status, AttendanceStatus::Present);
    }

    #[test]
    fn punch_state_helpers() {
        let mut rec = DailyRecord::blank(3);
        assert!(!rec.is_punched_in());
        rec.check_in = Some("09:30 AM".into());
        assert!(rec.is_punched_in());
        assert!(!rec.is_punched_out());
        rec.check_out = Some("06:30 PM".into());
        assert!(rec.is_punched_out());
    }
}
