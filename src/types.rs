//! Domain types for the trail store.
//!
//! These are data containers shared between the ingestion pipeline, the
//! storage layer, and the CLI. Every table row has a matching struct here.

use serde::{Deserialize, Serialize};

// ============================================================================
// Dimension & Fact Rows
// ============================================================================

/// A national park dimension row.
///
/// `park_id` is a surrogate key assigned in first-occurrence order during
/// normalization, 1-based and contiguous. It is regenerated on every load
/// and has no meaning across runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Park {
    pub park_id: i64,
    pub park_name: String,
}

/// A trail fact row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trail {
    /// Natural key from the source data; unique post-merge.
    pub trail_id: i64,
    pub name: String,
    /// Elevation gain in feet.
    pub elevation_feet: f64,
    /// Trail length in miles (converted from source meters during ingest).
    pub length: f64,
    /// Difficulty code, 1 (easy) through 5 (very challenging).
    pub difficulty: i64,
    /// "out and back", "loop", "point to point", or free text from source.
    pub route_type: String,
    pub reviews: i64,
    /// Foreign key into the park dimension.
    pub park_id: i64,
}

/// Joined Trail ⋈ Park row for listing views.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrailOverview {
    pub name: String,
    pub park_name: String,
    pub elevation_feet: f64,
    pub length: f64,
    pub difficulty: i64,
    pub route_type: String,
    pub reviews: i64,
}

/// Joined Trail ⋈ Location row for state searches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrailInArea {
    pub name: String,
    pub area_name: String,
    pub state: String,
    pub elevation_feet: f64,
    pub length: f64,
    pub difficulty: i64,
    pub route_type: String,
}

// ============================================================================
// Attribute & Location Rows
// ============================================================================

/// One unpivoted (trail, token) attribute row. Used for both the Features
/// and Activities tables; the two differ only in semantic domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrailAttribute {
    pub trail_id: i64,
    pub value: String,
}

/// Location row, one per trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrailLocation {
    pub trail_id: i64,
    pub area_name: String,
    pub state: String,
    /// Raw coordinate pair from the source, stored as opaque text.
    pub geolocation: String,
}

// ============================================================================
// Writes
// ============================================================================

/// User-supplied fields for adding a trail. The trail id is assigned by the
/// store and the review count starts at zero.
#[derive(Debug, Clone)]
pub struct NewTrail {
    pub name: String,
    pub elevation_feet: f64,
    pub length: f64,
    pub difficulty: i64,
    pub route_type: String,
    pub park_id: i64,
}

// ============================================================================
// Proposed Changes
// ============================================================================

/// Lifecycle state of a proposed trail edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeStatus {
    Pending,
    Approved,
    Rejected,
}

impl ChangeStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ChangeStatus::Pending => "pending",
            ChangeStatus::Approved => "approved",
            ChangeStatus::Rejected => "rejected",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(ChangeStatus::Pending),
            "approved" => Some(ChangeStatus::Approved),
            "rejected" => Some(ChangeStatus::Rejected),
            _ => None,
        }
    }
}

/// A single-field trail edit awaiting admin review.
///
/// Maintenance edits are captured as one row per changed field rather than
/// written back directly; an admin approves or rejects each one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposedChange {
    pub change_id: i64,
    pub trail_id: i64,
    /// Target column, restricted to the editable set.
    pub field: String,
    pub old_value: String,
    pub new_value: String,
    /// ISO 8601 submission timestamp.
    pub submitted_at: String,
    pub status: ChangeStatus,
}
