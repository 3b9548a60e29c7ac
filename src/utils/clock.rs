//! Wall-clock arithmetic over 12-hour "hh:mm AM/PM" strings.
//!
//! Attendance times are stored exactly as punched, so every computation here
//! parses defensively and degrades to `None` instead of failing.

const MINUTES_PER_DAY: i64 = 24 * 60;

/// Parses "hh:mm AM/PM" into minutes since midnight. Malformed input yields
/// `None`, never a panic. "12:xx AM" is hour zero, "12:xx PM" stays twelve.
pub fn parse_clock_time(s: &str) -> Option<i64> {
    let s = s.trim();
    let (hm, meridiem) = s.split_once(' ')?;
    let (hh, mm) = hm.split_once(':')?;

    let hour: i64 = hh.trim().parse().ok()?;
    let minute: i64 = mm.trim().parse().ok()?;
    if !(1..=12).contains(&hour) || !(0..60).contains(&minute) {
        return None;
    }

    let hour24 = match meridiem.trim().to_ascii_uppercase().as_str() {
        "AM" => {
            if hour == 12 {
                0
            } else {
                hour
            }
        }
        "PM" => {
            if hour == 12 {
                12
            } else {
                hour + 12
            }
        }
        _ => return None,
    };

    Some(hour24 * 60 + minute)
}

/// Renders minutes-since-midnight back to "hh:mm AM/PM". Round-trips with
/// [`parse_clock_time`] for any in-range value.
pub fn format_clock_time(minutes: i64) -> String {
    let minutes = minutes.rem_euclid(MINUTES_PER_DAY);
    let hour24 = minutes / 60;
    let minute = minutes % 60;
    let (hour12, meridiem) = match hour24 {
        0 => (12, "AM"),
        1..=11 => (hour24, "AM"),
        12 => (12, "PM"),
        _ => (hour24 - 12, "PM"),
    };
    format!("{:02}:{:02} {}", hour12, minute, meridiem)
}

/// Minutes between check-in and check-out. A negative raw difference means
/// the shift wrapped past midnight, so a day is added. `None` when either
/// side is unparseable.
pub fn compute_duration(check_in: &str, check_out: &str) -> Option<i64> {
    let start = parse_clock_time(check_in)?;
    let end = parse_clock_time(check_out)?;
    let mut diff = end - start;
    if diff < 0 {
        diff += MINUTES_PER_DAY;
    }
    Some(diff)
}

/// Renders a minute total as "Xh Ym". Negative input clamps to zero.
pub fn format_duration(total_minutes: i64) -> String {
    let total = total_minutes.max(0);
    format!("{}h {}m", total / 60, total % 60)
}

/// Default shift start/end when an employee has no configured window.
pub const DEFAULT_SHIFT_START: i64 = 9 * 60 + 30; // 09:30 AM
pub const DEFAULT_SHIFT_END: i64 = 18 * 60 + 30; // 06:30 PM

/// Splits a "start-end" working-hours string into shift bounds in minutes.
/// Either side falls back to the default when missing or malformed.
pub fn shift_bounds(working_hours: Option<&str>) -> (i64, i64) {
    let Some(window) = working_hours else {
        return (DEFAULT_SHIFT_START, DEFAULT_SHIFT_END);
    };
    let (start_s, end_s) = match window.split_once('-') {
        Some(parts) => parts,
        None => return (DEFAULT_SHIFT_START, DEFAULT_SHIFT_END),
    };
    let start = parse_clock_time(start_s).unwrap_or(DEFAULT_SHIFT_START);
    let end = parse_clock_time(end_s).unwrap_or(DEFAULT_SHIFT_END);
    (start, end)
}
