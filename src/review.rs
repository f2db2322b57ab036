//! Proposed-change review lifecycle.
//!
//! Maintenance edits are never written back to the Trails table directly.
//! Diffing an edited row against its snapshot produces one pending
//! `TrailChanges` row per changed field, which an admin later approves
//! (applying the single-column update) or rejects.

use chrono::Utc;
use log::info;
use rusqlite::{OptionalExtension, params};

use crate::error::{RangerError, Result};
use crate::store::TrailStore;
use crate::types::{ChangeStatus, ProposedChange, Trail};

/// Columns an edit may touch. `trailID`, `parkID`, and `reviews` are locked.
pub const EDITABLE_FIELDS: [&str; 5] = [
    "trailName",
    "elevation_feet",
    "length",
    "difficulty",
    "routeType",
];

/// Field-by-field diff of an edited trail row against its snapshot.
/// Returns `(field, old, new)` for every editable field that differs.
fn diff_trail(original: &Trail, edited: &Trail) -> Vec<(&'static str, String, String)> {
    let mut changes = Vec::new();
    if original.name != edited.name {
        changes.push(("trailName", original.name.clone(), edited.name.clone()));
    }
    if original.elevation_feet != edited.elevation_feet {
        changes.push((
            "elevation_feet",
            original.elevation_feet.to_string(),
            edited.elevation_feet.to_string(),
        ));
    }
    if original.length != edited.length {
        changes.push((
            "length",
            original.length.to_string(),
            edited.length.to_string(),
        ));
    }
    if original.difficulty != edited.difficulty {
        changes.push((
            "difficulty",
            original.difficulty.to_string(),
            edited.difficulty.to_string(),
        ));
    }
    if original.route_type != edited.route_type {
        changes.push((
            "routeType",
            original.route_type.clone(),
            edited.route_type.clone(),
        ));
    }
    changes
}

impl TrailStore {
    /// Record an edited row as pending changes, one per changed field.
    ///
    /// Nothing in the Trails table is touched; the returned changes carry
    /// their assigned ids and `Pending` status. An edit with no differences
    /// records nothing.
    pub fn propose_changes(&self, original: &Trail, edited: &Trail) -> Result<Vec<ProposedChange>> {
        let submitted_at = Utc::now().to_rfc3339();
        let mut proposed = Vec::new();

        for (field, old_value, new_value) in diff_trail(original, edited) {
            self.conn().execute(
                "INSERT INTO TrailChanges (trailID, field, old_value, new_value, \
                 submitted_at, status) VALUES (?, ?, ?, ?, ?, 'pending')",
                params![original.trail_id, field, old_value, new_value, submitted_at],
            )?;
            proposed.push(ProposedChange {
                change_id: self.conn().last_insert_rowid(),
                trail_id: original.trail_id,
                field: field.to_string(),
                old_value,
                new_value,
                submitted_at: submitted_at.clone(),
                status: ChangeStatus::Pending,
            });
        }

        if !proposed.is_empty() {
            info!(
                "trail {}: {} field change(s) submitted for review",
                original.trail_id,
                proposed.len()
            );
        }
        Ok(proposed)
    }

    /// All changes still awaiting review, oldest first.
    pub fn pending_changes(&self) -> Result<Vec<ProposedChange>> {
        let mut stmt = self.conn().prepare(
            "SELECT changeID, trailID, field, old_value, new_value, submitted_at, status \
             FROM TrailChanges WHERE status = 'pending' ORDER BY changeID",
        )?;
        let rows = stmt.query_map([], |row| {
            let status: String = row.get(6)?;
            Ok(ProposedChange {
                change_id: row.get(0)?,
                trail_id: row.get(1)?,
                field: row.get(2)?,
                old_value: row.get(3)?,
                new_value: row.get(4)?,
                submitted_at: row.get(5)?,
                status: ChangeStatus::from_str(&status).unwrap_or(ChangeStatus::Pending),
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Apply one pending change to its trail and mark it approved.
    ///
    /// The target column is checked against the editable whitelist before
    /// any SQL names it; the update and the status flip commit together.
    pub fn approve_change(&mut self, change_id: i64) -> Result<ProposedChange> {
        let change = self
            .pending_change_by_id(change_id)?
            .ok_or(RangerError::ChangeNotFound { change_id })?;

        if !EDITABLE_FIELDS.contains(&change.field.as_str()) {
            return Err(RangerError::FieldNotEditable {
                field: change.field.clone(),
            });
        }

        let tx = self.conn_mut().transaction()?;
        // Column name is whitelisted above; the value is still bound.
        tx.execute(
            &format!("UPDATE Trails SET {} = ? WHERE trailID = ?", change.field),
            params![change.new_value, change.trail_id],
        )?;
        tx.execute(
            "UPDATE TrailChanges SET status = 'approved' WHERE changeID = ?",
            [change_id],
        )?;
        tx.commit()?;

        info!(
            "change {} approved: trail {} {} -> {:?}",
            change_id, change.trail_id, change.field, change.new_value
        );
        Ok(ProposedChange {
            status: ChangeStatus::Approved,
            ..change
        })
    }

    /// Mark one pending change rejected without touching the trail.
    pub fn reject_change(&self, change_id: i64) -> Result<ProposedChange> {
        let change = self
            .pending_change_by_id(change_id)?
            .ok_or(RangerError::ChangeNotFound { change_id })?;

        self.conn().execute(
            "UPDATE TrailChanges SET status = 'rejected' WHERE changeID = ?",
            [change_id],
        )?;
        info!("change {change_id} rejected");
        Ok(ProposedChange {
            status: ChangeStatus::Rejected,
            ..change
        })
    }

    fn pending_change_by_id(&self, change_id: i64) -> Result<Option<ProposedChange>> {
        Ok(self
            .conn()
            .query_row(
                "SELECT changeID, trailID, field, old_value, new_value, submitted_at, status \
                 FROM TrailChanges WHERE changeID = ? AND status = 'pending'",
                [change_id],
                |row| {
                    let status: String = row.get(6)?;
                    Ok(ProposedChange {
                        change_id: row.get(0)?,
                        trail_id: row.get(1)?,
                        field: row.get(2)?,
                        old_value: row.get(3)?,
                        new_value: row.get(4)?,
                        submitted_at: row.get(5)?,
                        status: ChangeStatus::from_str(&status).unwrap_or(ChangeStatus::Pending),
                    })
                },
            )
            .optional()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trail(name: &str, difficulty: i64) -> Trail {
        Trail {
            trail_id: 1,
            name: name.to_string(),
            elevation_feet: 100.0,
            length: 2.5,
            difficulty,
            route_type: "loop".to_string(),
            reviews: 10,
            park_id: 1,
        }
    }

    #[test]
    fn test_diff_reports_changed_fields_only() {
        let original = trail("Alpha", 2);
        let mut edited = trail("Alpha", 4);
        edited.route_type = "out and back".to_string();

        let changes = diff_trail(&original, &edited);
        let fields: Vec<_> = changes.iter().map(|(f, _, _)| *f).collect();
        assert_eq!(fields, vec!["difficulty", "routeType"]);
        assert_eq!(changes[0].1, "2");
        assert_eq!(changes[0].2, "4");
    }

    #[test]
    fn test_diff_identical_rows_is_empty() {
        let original = trail("Alpha", 2);
        assert!(diff_trail(&original, &original.clone()).is_empty());
    }

    #[test]
    fn test_locked_fields_never_diffed() {
        let original = trail("Alpha", 2);
        let mut edited = trail("Alpha", 2);
        edited.reviews = 999;
        edited.park_id = 7;
        assert!(diff_trail(&original, &edited).is_empty());
    }
}
