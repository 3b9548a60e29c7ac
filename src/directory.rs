//! Identity collaborators: employee profiles and branch geofences resolved
//! from MySQL. Branch reads go through the in-memory cache since a geofence
//! is consulted on every geofenced punch.

use crate::model::branch::Branch;
use crate::model::employee::EmployeeProfile;
use crate::utils::branch_cache;
use anyhow::{Context, Result};
use sqlx::MySqlPool;

#[derive(Clone)]
pub struct EmployeeDirectory {
    pool: MySqlPool,
}

impl EmployeeDirectory {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    pub async fn profile(&self, employee_id: u64) -> Result<Option<EmployeeProfile>> {
        sqlx::query_as::<_, EmployeeProfile>(
            r#"
            SELECT id, employee_code, first_name, last_name, branch,
                   gps_geofencing, qr_scan, live_tracking, working_hours
            FROM employees
            WHERE id = ?
            "#,
        )
        .bind(employee_id)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("fetching employee {employee_id}"))
    }

    /// Resolves a batch of ids for the muster roll. Unknown ids are simply
    /// absent from the result.
    pub async fn profiles(&self, employee_ids: &[u64]) -> Result<Vec<EmployeeProfile>> {
        if employee_ids.is_empty() {
            return Ok(Vec::new());
        }

        // ---------- build IN clause dynamically ----------
        let placeholders = vec!["?"; employee_ids.len()].join(", ");
        let sql = format!(
            r#"
            SELECT id, employee_code, first_name, last_name, branch,
                   gps_geofencing, qr_scan, live_tracking, working_hours
            FROM employees
            WHERE id IN ({})
            ORDER BY id
            "#,
            placeholders
        );

        let mut query = sqlx::query_as::<_, EmployeeProfile>(&sql);
        for id in employee_ids {
            query = query.bind(id);
        }

        query
            .fetch_all(&self.pool)
            .await
            .context("fetching employee batch")
    }
}

#[derive(Clone)]
pub struct BranchDirectory {
    pool: MySqlPool,
}

impl BranchDirectory {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    pub async fn branch(&self, name: &str) -> Result<Option<Branch>> {
        if let Some(hit) = branch_cache::get(name).await {
            return Ok(Some(hit));
        }

        let branch = sqlx::query_as::<_, Branch>(
            r#"SELECT name, lat, lng, radius_m FROM branches WHERE name = ?"#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("fetching branch {name}"))?;

        if let Some(b) = &branch {
            branch_cache::put(b.clone()).await;
        }
        Ok(branch)
    }
}
