//! Assignment router: decides who owns a newly classified complaint.
//!
//! Deterministic, first-matching-case-wins:
//!   A. No staff in the city        → city admin, else global admin.
//!   B. Staff, but none in the
//!      required department         → same fallback as A.
//!   C. Department staff exist      → first by staff id, city admin assists.
//!
//! The router only decides; persisting the decision is the caller's
//! responsibility. The sentinel category "Normal" never reaches here;
//! intake auto-closes those complaints without assignment.

use crate::{
    department::Department,
    error::{CoreError, CoreResult},
    staff::{Role, StaffRecord},
    store::Store,
    types::StaffId,
};

/// The routing decision for one complaint.
#[derive(Debug, Clone, PartialEq)]
pub struct AssignmentDecision {
    pub primary: StaffRecord,
    /// Everyone with visibility; always contains the primary assignee.
    pub assigned_users: Vec<StaffId>,
    pub department: Option<Department>,
    pub message: String,
}

/// Routes a classified complaint to a primary assignee and assisting set.
///
/// # Errors
///
/// `CoreError::MissingCity` when `city` is empty, and
/// `CoreError::NoResponsibleParty` when neither a city admin nor the
/// global admin exists. This is the only hard failure; the caller still
/// persists the complaint unassigned.
pub fn route(store: &Store, category: &str, city: &str) -> CoreResult<AssignmentDecision> {
    if city.trim().is_empty() {
        return Err(CoreError::MissingCity);
    }

    let department = Department::from_category(category);
    let city_admin = store.city_admin(city)?;
    let city_staff = store.staff_by_role_city_department(Role::Staff, Some(city), None)?;
    let department_staff: Vec<&StaffRecord> = city_staff
        .iter()
        .filter(|s| department.is_some() && s.department == department)
        .collect();

    // Case C: department staff exist. First by list order is primary,
    // the city admin (when present) assists.
    if let Some(primary) = department_staff.first() {
        let primary = (*primary).clone();
        let mut assigned_users = vec![primary.staff_id.clone()];
        if let Some(admin) = &city_admin {
            if admin.staff_id != primary.staff_id {
                assigned_users.push(admin.staff_id.clone());
            }
        }
        let message = format!(
            "Assigned to {} department staff in {city}",
            primary
                .department
                .map_or("unscoped", |d| d.as_str())
        );
        return Ok(AssignmentDecision {
            primary,
            assigned_users,
            department,
            message,
        });
    }

    // Cases A and B: fall back to the city admin, then the global admin.
    let (primary, message) = match city_admin {
        Some(admin) => {
            let message = if city_staff.is_empty() {
                format!("No staff in {city}; assigned to city admin")
            } else {
                format!("No matching department staff in {city}; assigned to city admin")
            };
            (admin, message)
        }
        None => match store.global_admin()? {
            Some(admin) => (
                admin,
                format!("No admin in {city}; assigned to global admin"),
            ),
            None => {
                return Err(CoreError::NoResponsibleParty {
                    city: city.to_string(),
                })
            }
        },
    };

    Ok(AssignmentDecision {
        assigned_users: vec![primary.staff_id.clone()],
        department,
        message,
        primary,
    })
}
