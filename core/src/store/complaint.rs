use super::{from_unix, parse_column, to_unix, Store};
use crate::{
    complaint::{ComplaintRecord, EscalationState, SlaState},
    department::Department,
    error::CoreResult,
    types::{ComplaintId, StaffId},
};
use rusqlite::{params, OptionalExtension};

const COMPLAINT_COLUMNS: &str = "complaint_id, citizen_id, category, department, city, \
     description, status, created_at, resolved_at, feedback_rating, feedback_comment, \
     points_awarded, assigned_to, sla_deadline, sla_time_remaining_hours, sla_is_overdue, \
     sla_breached_at, esc_level, esc_escalated_at, esc_escalated_to, esc_auto, esc_reason";

fn complaint_row_mapper(row: &rusqlite::Row<'_>) -> rusqlite::Result<ComplaintRecord> {
    let department: Option<String> = row.get(3)?;
    let status: String = row.get(6)?;

    // SLA snapshot is present iff the deadline column is set.
    let sla = match row.get::<_, Option<i64>>(13)? {
        Some(deadline) => Some(SlaState {
            deadline: from_unix(deadline),
            time_remaining_hours: row.get::<_, Option<i64>>(14)?.unwrap_or(0),
            is_overdue: row.get::<_, Option<i32>>(15)?.unwrap_or(0) != 0,
            breached_at: row.get::<_, Option<i64>>(16)?.map(from_unix),
        }),
        None => None,
    };

    Ok(ComplaintRecord {
        complaint_id: row.get(0)?,
        citizen_id: row.get(1)?,
        category: row.get(2)?,
        department: department
            .map(|d| parse_column::<Department>(3, &d))
            .transpose()?,
        city: row.get(4)?,
        description: row.get(5)?,
        status: parse_column(6, &status)?,
        created_at: from_unix(row.get(7)?),
        resolved_at: row.get::<_, Option<i64>>(8)?.map(from_unix),
        feedback_rating: row.get(9)?,
        feedback_comment: row.get(10)?,
        points_awarded: row.get(11)?,
        assigned_to: row.get(12)?,
        assigned_users: Vec::new(), // filled in by the caller
        sla,
        escalation: EscalationState {
            level: row.get::<_, i64>(17)? as u8,
            escalated_at: row.get::<_, Option<i64>>(18)?.map(from_unix),
            escalated_to: row.get(19)?,
            auto_escalated: row.get::<_, i32>(20)? != 0,
            reason: row.get(21)?,
        },
    })
}

impl Store {
    // ── Complaint ──────────────────────────────────────────────

    /// Persists a new complaint together with its assignee set.
    pub fn insert_complaint(&self, c: &ComplaintRecord) -> CoreResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            &format!(
                "INSERT INTO complaint ({COMPLAINT_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11,
                         ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22)"
            ),
            params![
                &c.complaint_id,
                &c.citizen_id,
                &c.category,
                c.department.map(|d| d.as_str()),
                &c.city,
                &c.description,
                c.status.as_str(),
                to_unix(c.created_at),
                c.resolved_at.map(to_unix),
                c.feedback_rating,
                c.feedback_comment.as_deref(),
                c.points_awarded,
                c.assigned_to.as_deref(),
                c.sla.as_ref().map(|s| to_unix(s.deadline)),
                c.sla.as_ref().map(|s| s.time_remaining_hours),
                c.sla.as_ref().map(|s| i32::from(s.is_overdue)),
                c.sla.as_ref().and_then(|s| s.breached_at).map(to_unix),
                i64::from(c.escalation.level),
                c.escalation.escalated_at.map(to_unix),
                c.escalation.escalated_to.as_deref(),
                i32::from(c.escalation.auto_escalated),
                c.escalation.reason.as_deref(),
            ],
        )?;
        for staff_id in &c.assigned_users {
            tx.execute(
                "INSERT OR IGNORE INTO complaint_assignee (complaint_id, staff_id)
                 VALUES (?1, ?2)",
                params![&c.complaint_id, staff_id],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    pub fn complaint(&self, complaint_id: &str) -> CoreResult<Option<ComplaintRecord>> {
        let record = self
            .conn
            .query_row(
                &format!("SELECT {COMPLAINT_COLUMNS} FROM complaint WHERE complaint_id = ?1"),
                params![complaint_id],
                complaint_row_mapper,
            )
            .optional()?;
        match record {
            Some(mut c) => {
                c.assigned_users = self.assignees(complaint_id)?;
                Ok(Some(c))
            }
            None => Ok(None),
        }
    }

    /// All complaints the batch pass evaluates: non-terminal status,
    /// ordered by id for stable iteration.
    pub fn non_terminal_complaints(&self) -> CoreResult<Vec<ComplaintRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {COMPLAINT_COLUMNS} FROM complaint
             WHERE status IN ('open', 'in_progress')
             ORDER BY complaint_id ASC"
        ))?;
        let mut records = stmt
            .query_map([], complaint_row_mapper)?
            .collect::<Result<Vec<_>, _>>()?;
        for c in &mut records {
            c.assigned_users = self.assignees(&c.complaint_id)?;
        }
        Ok(records)
    }

    // ── Assignee set ───────────────────────────────────────────

    /// Idempotent set-add: re-adding an existing assignee is a no-op.
    pub fn add_assignee(&self, complaint_id: &ComplaintId, staff_id: &StaffId) -> CoreResult<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO complaint_assignee (complaint_id, staff_id)
             VALUES (?1, ?2)",
            params![complaint_id, staff_id],
        )?;
        Ok(())
    }

    pub fn assignees(&self, complaint_id: &str) -> CoreResult<Vec<StaffId>> {
        let mut stmt = self.conn.prepare(
            "SELECT staff_id FROM complaint_assignee
             WHERE complaint_id = ?1 ORDER BY staff_id ASC",
        )?;
        let ids = stmt
            .query_map(params![complaint_id], |row| row.get(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids)
    }

    // ── Lifecycle mutations ────────────────────────────────────

    pub fn update_sla(&self, complaint_id: &ComplaintId, sla: &SlaState) -> CoreResult<()> {
        self.conn.execute(
            "UPDATE complaint
             SET sla_deadline = ?1, sla_time_remaining_hours = ?2,
                 sla_is_overdue = ?3, sla_breached_at = ?4
             WHERE complaint_id = ?5",
            params![
                to_unix(sla.deadline),
                sla.time_remaining_hours,
                i32::from(sla.is_overdue),
                sla.breached_at.map(to_unix),
                complaint_id,
            ],
        )?;
        Ok(())
    }

    pub fn update_escalation(
        &self,
        complaint_id: &ComplaintId,
        esc: &EscalationState,
    ) -> CoreResult<()> {
        self.conn.execute(
            "UPDATE complaint
             SET esc_level = ?1, esc_escalated_at = ?2, esc_escalated_to = ?3,
                 esc_auto = ?4, esc_reason = ?5
             WHERE complaint_id = ?6",
            params![
                i64::from(esc.level),
                esc.escalated_at.map(to_unix),
                esc.escalated_to.as_deref(),
                i32::from(esc.auto_escalated),
                esc.reason.as_deref(),
                complaint_id,
            ],
        )?;
        Ok(())
    }

    pub fn update_status(
        &self,
        complaint_id: &ComplaintId,
        status: crate::complaint::ComplaintStatus,
        resolved_at: Option<chrono::DateTime<chrono::Utc>>,
    ) -> CoreResult<()> {
        self.conn.execute(
            "UPDATE complaint SET status = ?1, resolved_at = COALESCE(?2, resolved_at)
             WHERE complaint_id = ?3",
            params![status.as_str(), resolved_at.map(to_unix), complaint_id],
        )?;
        Ok(())
    }

    pub fn set_feedback(
        &self,
        complaint_id: &ComplaintId,
        rating: i32,
        comment: Option<&str>,
    ) -> CoreResult<()> {
        self.conn.execute(
            "UPDATE complaint SET feedback_rating = ?1, feedback_comment = ?2
             WHERE complaint_id = ?3",
            params![rating, comment, complaint_id],
        )?;
        Ok(())
    }

    /// Records the last point value computed for this complaint (audit).
    pub fn set_points_awarded(&self, complaint_id: &ComplaintId, points: i64) -> CoreResult<()> {
        self.conn.execute(
            "UPDATE complaint SET points_awarded = ?1 WHERE complaint_id = ?2",
            params![points, complaint_id],
        )?;
        Ok(())
    }

    // ── Summary counts (runner) ────────────────────────────────

    pub fn complaint_count(&self) -> CoreResult<i64> {
        let n = self
            .conn
            .query_row("SELECT COUNT(*) FROM complaint", [], |row| row.get(0))?;
        Ok(n)
    }

    pub fn breached_count(&self) -> CoreResult<i64> {
        let n = self.conn.query_row(
            "SELECT COUNT(*) FROM complaint WHERE sla_breached_at IS NOT NULL",
            [],
            |row| row.get(0),
        )?;
        Ok(n)
    }

    pub fn escalated_count(&self) -> CoreResult<i64> {
        let n = self.conn.query_row(
            "SELECT COUNT(*) FROM complaint WHERE esc_level > 0",
            [],
            |row| row.get(0),
        )?;
        Ok(n)
    }
}
