use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Per-status counts derived from a monthly sheet in one pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AttendanceStats {
    #[schema(example = 18)]
    pub present: u32,
    #[schema(example = 2)]
    pub absent: u32,
    #[schema(example = 1)]
    pub half_day: u32,
    #[schema(example = 1)]
    pub paid_leave: u32,
    #[schema(example = 4)]
    pub week_off: u32,
    #[schema(example = 5)]
    pub not_marked: u32,
    /// Days flagged late at punch-in.
    #[schema(example = 3)]
    pub late: u32,
}

/// One employee's row in the muster roll: counts plus the day-by-day grid.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MusterRow {
    #[schema(example = 1001)]
    pub employee_id: u64,
    #[schema(example = "John Doe")]
    pub employee_name: String,
    #[schema(example = 18)]
    pub present: u32,
    #[schema(example = 2)]
    pub absent: u32,
    #[schema(example = 3)]
    pub late: u32,
    /// Status codes per day, index 0 = day 1; truncated to today for the
    /// current month.
    #[schema(example = json!(["P", "P", "WO", "A"]))]
    pub grid: Vec<String>,
}
