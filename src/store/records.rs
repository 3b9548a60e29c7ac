//! Read/write path for monthly sheets: lazy default generation, future-day
//! reset on load, bulk marking, and admin-level field merges. Everything is
//! read-modify-write; a single operator per employee is assumed.

use crate::model::attendance::{AttendanceStatus, DailyRecord, MonthlySheet};
use crate::store::{KeyedStore, sheet_key};
use crate::store::defaults::default_sheet;
use crate::utils::clock::{DEFAULT_SHIFT_END, DEFAULT_SHIFT_START, format_clock_time};
use anyhow::Result;
use chrono::NaiveDate;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;

/// Field-level admin override; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct RecordPatch {
    pub status: Option<AttendanceStatus>,
    #[schema(example = "10:15 AM")]
    pub check_in: Option<String>,
    #[schema(example = "07:05 PM")]
    pub check_out: Option<String>,
    pub is_late: Option<bool>,
}

#[derive(Clone)]
pub struct RecordStore {
    store: Arc<dyn KeyedStore>,
}

impl RecordStore {
    pub fn new(store: Arc<dyn KeyedStore>) -> Self {
        Self { store }
    }

    /// Loads the employee's sheet for the month, synthesizing and persisting
    /// the default pattern when nothing is stored yet. Current-month loads
    /// get their future days forced back to unmarked; when that reset changes
    /// anything the stored copy is refreshed too.
    pub async fn monthly_sheet(
        &self,
        employee_id: u64,
        year: i32,
        month: u32,
        today: NaiveDate,
    ) -> Result<MonthlySheet> {
        let key = sheet_key(employee_id, year, month);

        if let Some(value) = self.store.get_json(&key).await? {
            match serde_json::from_value::<MonthlySheet>(value) {
                Ok(mut sheet) => {
                    if sheet.reset_future_days(today) {
                        self.persist(&sheet).await?;
                    }
                    return Ok(sheet);
                }
                Err(e) => {
                    // Unreadable document: regenerate rather than fail the read.
                    tracing::warn!(error = %e, %key, "stored sheet unreadable, regenerating");
                }
            }
        }

        let sheet = default_sheet(employee_id, year, month, today);
        self.persist(&sheet).await?;
        Ok(sheet)
    }

    /// Overwrites the persisted sheet. Last writer wins.
    pub async fn save_sheet(&self, sheet: &MonthlySheet) -> Result<()> {
        self.persist(sheet).await
    }

    /// Applies `status` to every unmarked record up to today. Records that
    /// already carry an explicit status are never overridden. Marking Present
    /// also stamps the standard shift times.
    pub async fn bulk_mark(
        &self,
        employee_id: u64,
        year: i32,
        month: u32,
        status: AttendanceStatus,
        today: NaiveDate,
    ) -> Result<MonthlySheet> {
        let mut sheet = self.monthly_sheet(employee_id, year, month, today).await?;

        let mut changed = false;
        for rec in sheet.days.iter_mut() {
            if rec.status != AttendanceStatus::NotMarked {
                continue;
            }
            let in_reach = NaiveDate::from_ymd_opt(year, month, rec.day)
                .map(|d| d <= today)
                .unwrap_or(false);
            if !in_reach {
                continue;
            }

            rec.status = status;
            if status == AttendanceStatus::Present {
                rec.check_in = Some(format_clock_time(DEFAULT_SHIFT_START));
                rec.check_out = Some(format_clock_time(DEFAULT_SHIFT_END));
            }
            changed = true;
        }

        if changed {
            self.persist(&sheet).await?;
        }
        Ok(sheet)
    }

    /// Admin override: merges the patch into one day's record, bypassing all
    /// punch validation. Returns `None` for a day outside the month.
    pub async fn edit_record(
        &self,
        employee_id: u64,
        year: i32,
        month: u32,
        day: u32,
        patch: RecordPatch,
        today: NaiveDate,
    ) -> Result<Option<DailyRecord>> {
        let mut sheet = self.monthly_sheet(employee_id, year, month, today).await?;

        let Some(rec) = sheet.record_mut(day) else {
            return Ok(None);
        };

        if let Some(status) = patch.status {
            rec.status = status;
        }
        if let Some(check_in) = patch.check_in {
            rec.check_in = Some(check_in);
        }
        if let Some(check_out) = patch.check_out {
            rec.check_out = Some(check_out);
        }
        if let Some(is_late) = patch.is_late {
            rec.is_late = is_late;
        }

        let updated = rec.clone();
        self.persist(&sheet).await?;
        Ok(Some(updated))
    }

    async fn persist(&self, sheet: &MonthlySheet) -> Result<()> {
        let key = sheet_key(sheet.employee_id, sheet.year, sheet.month);
        self.store.put_json(&key, serde_json::to_value(sheet)?).await
    }
}
