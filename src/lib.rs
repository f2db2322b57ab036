//! RouteRanger - community trail database.
//!
//! This crate provides:
//! - CSV ingestion and normalization into a star schema (parks, trails,
//!   features, activities, locations)
//! - SQLite persistence with a destructive rebuild per load
//! - The search/browse/add/delete query surface the UI consumes
//! - A proposed-change review lifecycle for maintenance edits

pub mod error;
pub use error::{RangerError, Result};

pub mod types;
pub use types::{
    ChangeStatus, NewTrail, Park, ProposedChange, Trail, TrailAttribute, TrailInArea,
    TrailLocation, TrailOverview,
};

pub mod ingest;
pub use ingest::{METERS_TO_MILES, TrailDataset, load_file, load_reader};

pub mod store;
pub use store::TrailStore;

pub mod review;
pub use review::EDITABLE_FIELDS;
