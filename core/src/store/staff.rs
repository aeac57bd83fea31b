use super::{parse_column, Store};
use crate::{
    department::Department,
    error::CoreResult,
    staff::{badge_for_points, Role, StaffRecord, GLOBAL_CITY},
    types::StaffId,
};
use rusqlite::{params, OptionalExtension};

fn staff_row_mapper(row: &rusqlite::Row<'_>) -> rusqlite::Result<StaffRecord> {
    let role: String = row.get(2)?;
    let department: Option<String> = row.get(4)?;
    Ok(StaffRecord {
        staff_id: row.get(0)?,
        name: row.get(1)?,
        role: parse_column(2, &role)?,
        city: row.get(3)?,
        department: department
            .map(|d| parse_column::<Department>(4, &d))
            .transpose()?,
        points: row.get(5)?,
        resolution_streak: row.get(6)?,
        badge: row.get(7)?,
    })
}

const STAFF_COLUMNS: &str =
    "staff_id, name, role, city, department, points, resolution_streak, badge";

impl Store {
    // ── Directory ──────────────────────────────────────────────

    pub fn insert_staff(&self, s: &StaffRecord) -> CoreResult<()> {
        self.conn.execute(
            "INSERT INTO staff (staff_id, name, role, city, department,
                                points, resolution_streak, badge)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                &s.staff_id,
                &s.name,
                s.role.as_str(),
                s.city.as_deref(),
                s.department.map(|d| d.as_str()),
                s.points,
                s.resolution_streak,
                &s.badge,
            ],
        )?;
        Ok(())
    }

    pub fn staff(&self, staff_id: &str) -> CoreResult<Option<StaffRecord>> {
        let record = self
            .conn
            .query_row(
                &format!("SELECT {STAFF_COLUMNS} FROM staff WHERE staff_id = ?1"),
                params![staff_id],
                staff_row_mapper,
            )
            .optional()?;
        Ok(record)
    }

    /// Directory lookup: all records matching role and the optional city
    /// and department scopes, ordered by staff id so selection by list
    /// position is deterministic.
    pub fn staff_by_role_city_department(
        &self,
        role: Role,
        city: Option<&str>,
        department: Option<Department>,
    ) -> CoreResult<Vec<StaffRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {STAFF_COLUMNS} FROM staff
             WHERE role = ?1
               AND (?2 IS NULL OR city = ?2)
               AND (?3 IS NULL OR department = ?3)
             ORDER BY staff_id ASC"
        ))?;
        let records = stmt
            .query_map(
                params![role.as_str(), city, department.map(|d| d.as_str())],
                staff_row_mapper,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    /// First admin scoped to `city` (any department), if one exists.
    pub fn city_admin(&self, city: &str) -> CoreResult<Option<StaffRecord>> {
        Ok(self
            .staff_by_role_city_department(Role::Admin, Some(city), None)?
            .into_iter()
            .next())
    }

    /// First admin scoped to both `city` and `department`.
    pub fn department_admin(
        &self,
        city: &str,
        department: Department,
    ) -> CoreResult<Option<StaffRecord>> {
        Ok(self
            .staff_by_role_city_department(Role::Admin, Some(city), Some(department))?
            .into_iter()
            .next())
    }

    /// The system-wide fallback admin (sentinel city `"Global"`).
    pub fn global_admin(&self) -> CoreResult<Option<StaffRecord>> {
        self.city_admin(GLOBAL_CITY)
    }

    // ── Scoring ledger mutations ───────────────────────────────

    /// Applies a point award atomically: points and streak move by a
    /// store-side increment (never read-modify-write in application
    /// memory) and the badge is recomputed from the post-increment
    /// total inside the same transaction.
    ///
    /// Returns the new point total, or `None` when no such staff row
    /// exists (soft failure; the caller logs and moves on).
    pub fn apply_award(
        &self,
        staff_id: &StaffId,
        points_delta: i64,
        streak_delta: i64,
    ) -> CoreResult<Option<i64>> {
        let tx = self.conn.unchecked_transaction()?;
        let changed = tx.execute(
            "UPDATE staff
             SET points = points + ?1, resolution_streak = resolution_streak + ?2
             WHERE staff_id = ?3",
            params![points_delta, streak_delta, staff_id],
        )?;
        if changed == 0 {
            return Ok(None);
        }
        let new_total: i64 = tx.query_row(
            "SELECT points FROM staff WHERE staff_id = ?1",
            params![staff_id],
            |row| row.get(0),
        )?;
        tx.execute(
            "UPDATE staff SET badge = ?1 WHERE staff_id = ?2",
            params![badge_for_points(new_total), staff_id],
        )?;
        tx.commit()?;
        Ok(Some(new_total))
    }

    /// Leaderboard query for the runner's summary output.
    pub fn top_staff_by_points(&self, limit: i64) -> CoreResult<Vec<StaffRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {STAFF_COLUMNS} FROM staff
             WHERE role IN ('staff', 'admin')
             ORDER BY points DESC, staff_id ASC
             LIMIT ?1"
        ))?;
        let records = stmt
            .query_map(params![limit], staff_row_mapper)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }
}
