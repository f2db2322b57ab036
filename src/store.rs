//! # Trail Store
//!
//! SQLite-backed storage for the normalized trail schema. The store owns the
//! connection for its whole lifetime; it is opened once at startup and passed
//! explicitly to whoever needs it.
//!
//! The loader side ([`TrailStore::rebuild`]) destroys and recreates all
//! tables from a [`TrailDataset`] on every load. The query side serves the
//! four read shapes the UI consumes (bounded listing, keyword substring,
//! state/park membership, difficulty equality plus count) and the add/delete
//! write paths. Every query binds its values; no filter is ever spliced into
//! SQL text.

use std::path::Path;

use log::{debug, info};
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter};

use crate::error::{RangerError, Result};
use crate::ingest::TrailDataset;
use crate::types::{NewTrail, Park, Trail, TrailInArea, TrailLocation, TrailOverview};

/// Tables in child-first order, used when tearing down a previous load.
const DROP_ORDER: [&str; 8] = [
    "TrailChanges",
    "TrailsUpdates",
    "Users",
    "Location",
    "Activities",
    "Features",
    "Trails",
    "NationalParks",
];

/// SQLite-backed trail store.
pub struct TrailStore {
    db: Connection,
}

impl TrailStore {
    // ========================================================================
    // Initialization
    // ========================================================================

    /// Open (or create) the store at the given database path.
    pub fn open(db_path: &Path) -> Result<Self> {
        let db = Connection::open(db_path)?;
        db.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(Self { db })
    }

    /// Create an in-memory store (for testing).
    pub fn in_memory() -> Result<Self> {
        let db = Connection::open_in_memory()?;
        db.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(Self { db })
    }

    pub(crate) fn conn(&self) -> &Connection {
        &self.db
    }

    pub(crate) fn conn_mut(&mut self) -> &mut Connection {
        &mut self.db
    }

    // ========================================================================
    // Schema Rebuild & Bulk Load
    // ========================================================================

    /// Drop, recreate, and reload every table from the dataset.
    ///
    /// Runs as one transaction: an interrupted load rolls back rather than
    /// leaving a half-built store. Any rows added by users since the last
    /// load are destroyed; id stability across loads is a non-goal.
    pub fn rebuild(&mut self, dataset: &TrailDataset) -> Result<()> {
        let tx = self.db.transaction()?;

        // Children before parents. A missing table is expected on first run.
        for table in DROP_ORDER {
            if let Err(e) = tx.execute_batch(&format!("DROP TABLE {table};")) {
                debug!("drop {table} skipped: {e}");
            }
        }

        // Parents before children so the foreign keys resolve.
        tx.execute_batch(
            r#"
            -- Park dimension: one row per distinct name, surrogate key
            CREATE TABLE NationalParks (
                parkName TEXT NOT NULL,
                parkID INTEGER PRIMARY KEY NOT NULL
            );

            -- Trail fact table; trailID comes from the source
            CREATE TABLE Trails (
                trailID INTEGER PRIMARY KEY NOT NULL,
                trailName TEXT NOT NULL,
                elevation_feet REAL,
                length REAL,
                difficulty INTEGER,
                routeType TEXT,
                reviews INTEGER,
                parkID INTEGER,
                FOREIGN KEY (parkID) REFERENCES NationalParks (parkID)
            );

            -- Unpivoted multi-valued attributes
            CREATE TABLE Features (
                trailID INTEGER,
                feature TEXT,
                FOREIGN KEY (trailID) REFERENCES Trails (trailID) ON DELETE CASCADE
            );

            CREATE TABLE Activities (
                trailID INTEGER,
                activity TEXT,
                FOREIGN KEY (trailID) REFERENCES Trails (trailID) ON DELETE CASCADE
            );

            CREATE TABLE Location (
                trailID INTEGER,
                area_name TEXT,
                state TEXT,
                geolocation TEXT,
                FOREIGN KEY (trailID) REFERENCES Trails (trailID) ON DELETE CASCADE
            );

            -- Declared for the community features; never populated here.
            -- Any future account path must hash before writing uPassword.
            CREATE TABLE Users (
                userID INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT,
                uPassword TEXT
            );

            CREATE TABLE TrailsUpdates (
                updateID INTEGER PRIMARY KEY AUTOINCREMENT,
                trailID INTEGER,
                userID INTEGER,
                content TEXT,
                FOREIGN KEY (trailID) REFERENCES Trails (trailID) ON DELETE CASCADE,
                FOREIGN KEY (userID) REFERENCES Users (userID) ON DELETE CASCADE
            );

            -- Maintenance edits awaiting admin review
            CREATE TABLE TrailChanges (
                changeID INTEGER PRIMARY KEY AUTOINCREMENT,
                trailID INTEGER NOT NULL,
                field TEXT NOT NULL,
                old_value TEXT NOT NULL,
                new_value TEXT NOT NULL,
                submitted_at TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'pending'
                    CHECK (status IN ('pending', 'approved', 'rejected')),
                FOREIGN KEY (trailID) REFERENCES Trails (trailID) ON DELETE CASCADE
            );

            CREATE INDEX idx_trails_name ON Trails(trailName);
            CREATE INDEX idx_trails_difficulty ON Trails(difficulty);
            CREATE INDEX idx_location_state ON Location(state);
            CREATE INDEX idx_changes_status ON TrailChanges(status);
            "#,
        )?;

        {
            let mut stmt =
                tx.prepare("INSERT INTO NationalParks (parkName, parkID) VALUES (?, ?)")?;
            for park in &dataset.parks {
                stmt.execute(params![park.park_name, park.park_id])?;
            }
        }

        {
            let mut stmt = tx.prepare(
                "INSERT INTO Trails (trailID, trailName, elevation_feet, length, difficulty, \
                 routeType, reviews, parkID) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            )?;
            for trail in &dataset.trails {
                stmt.execute(params![
                    trail.trail_id,
                    trail.name,
                    trail.elevation_feet,
                    trail.length,
                    trail.difficulty,
                    trail.route_type,
                    trail.reviews,
                    trail.park_id,
                ])?;
            }
        }

        {
            let mut stmt = tx.prepare("INSERT INTO Features (trailID, feature) VALUES (?, ?)")?;
            for row in &dataset.features {
                stmt.execute(params![row.trail_id, row.value])?;
            }
        }

        {
            let mut stmt =
                tx.prepare("INSERT INTO Activities (trailID, activity) VALUES (?, ?)")?;
            for row in &dataset.activities {
                stmt.execute(params![row.trail_id, row.value])?;
            }
        }

        {
            let mut stmt = tx.prepare(
                "INSERT INTO Location (trailID, area_name, state, geolocation) \
                 VALUES (?, ?, ?, ?)",
            )?;
            for loc in &dataset.locations {
                stmt.execute(params![
                    loc.trail_id,
                    loc.area_name,
                    loc.state,
                    loc.geolocation
                ])?;
            }
        }

        tx.commit()?;
        info!(
            "store rebuilt: {} parks, {} trails, {} features, {} activities",
            dataset.parks.len(),
            dataset.trails.len(),
            dataset.features.len(),
            dataset.activities.len()
        );
        Ok(())
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Bounded Trail ⋈ Park listing for the home view.
    pub fn overview(&self, limit: u32) -> Result<Vec<TrailOverview>> {
        let mut stmt = self.db.prepare(
            "SELECT trailName, parkName, elevation_feet, length, difficulty, routeType, reviews \
             FROM Trails t JOIN NationalParks p ON t.parkID = p.parkID LIMIT ?",
        )?;
        let rows = stmt.query_map([limit], overview_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Substring match on trail name.
    pub fn search_by_keyword(&self, term: &str) -> Result<Vec<TrailOverview>> {
        let mut stmt = self.db.prepare(
            "SELECT trailName, parkName, elevation_feet, length, difficulty, routeType, reviews \
             FROM Trails t JOIN NationalParks p ON t.parkID = p.parkID \
             WHERE trailName LIKE ?",
        )?;
        let pattern = format!("%{term}%");
        let rows = stmt.query_map([pattern], overview_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Membership filter on state names.
    pub fn trails_in_states(&self, states: &[String]) -> Result<Vec<TrailInArea>> {
        if states.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = vec!["?"; states.len()].join(", ");
        let mut stmt = self.db.prepare(&format!(
            "SELECT trailName, area_name, state, elevation_feet, length, difficulty, routeType \
             FROM Trails t JOIN Location l ON t.trailID = l.trailID \
             WHERE state IN ({placeholders})"
        ))?;
        let rows = stmt.query_map(params_from_iter(states), |row| {
            Ok(TrailInArea {
                name: row.get(0)?,
                area_name: row.get(1)?,
                state: row.get(2)?,
                elevation_feet: row.get(3)?,
                length: row.get(4)?,
                difficulty: row.get(5)?,
                route_type: row.get(6)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Membership filter on park names.
    pub fn trails_in_parks(&self, parks: &[String]) -> Result<Vec<TrailOverview>> {
        if parks.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = vec!["?"; parks.len()].join(", ");
        let mut stmt = self.db.prepare(&format!(
            "SELECT trailName, parkName, elevation_feet, length, difficulty, routeType, reviews \
             FROM Trails t JOIN NationalParks p ON t.parkID = p.parkID \
             WHERE parkName IN ({placeholders})"
        ))?;
        let rows = stmt.query_map(params_from_iter(parks), overview_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Equality filter on the difficulty code.
    pub fn trails_by_difficulty(&self, level: i64) -> Result<Vec<TrailOverview>> {
        let mut stmt = self.db.prepare(
            "SELECT trailName, parkName, elevation_feet, length, difficulty, routeType, reviews \
             FROM Trails t JOIN NationalParks p ON t.parkID = p.parkID \
             WHERE difficulty = ?",
        )?;
        let rows = stmt.query_map([level], overview_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Count aggregate companion to [`trails_by_difficulty`].
    ///
    /// [`trails_by_difficulty`]: TrailStore::trails_by_difficulty
    pub fn count_by_difficulty(&self, level: i64) -> Result<i64> {
        Ok(self.db.query_row(
            "SELECT COUNT(*) FROM Trails WHERE difficulty = ?",
            [level],
            |row| row.get(0),
        )?)
    }

    /// Distinct states present in the Location table, for menu population.
    pub fn distinct_states(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .db
            .prepare("SELECT DISTINCT state FROM Location ORDER BY state")?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// All parks in the dimension, surrogate-id order.
    pub fn parks(&self) -> Result<Vec<Park>> {
        let mut stmt = self
            .db
            .prepare("SELECT parkID, parkName FROM NationalParks ORDER BY parkID")?;
        let rows = stmt.query_map([], |row| {
            Ok(Park {
                park_id: row.get(0)?,
                park_name: row.get(1)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Case-sensitive exact-name lookup.
    pub fn find_by_name(&self, name: &str) -> Result<Option<Trail>> {
        Ok(self
            .db
            .query_row(
                "SELECT trailID, trailName, elevation_feet, length, difficulty, routeType, \
                 reviews, parkID FROM Trails WHERE trailName = ?",
                [name],
                trail_from_row,
            )
            .optional()?)
    }

    /// Single trail by id.
    pub fn get_trail(&self, trail_id: i64) -> Result<Option<Trail>> {
        Ok(self
            .db
            .query_row(
                "SELECT trailID, trailName, elevation_feet, length, difficulty, routeType, \
                 reviews, parkID FROM Trails WHERE trailID = ?",
                [trail_id],
                trail_from_row,
            )
            .optional()?)
    }

    /// Full Trail table snapshot for the maintenance editor.
    pub fn trail_snapshot(&self) -> Result<Vec<Trail>> {
        let mut stmt = self.db.prepare(
            "SELECT trailID, trailName, elevation_feet, length, difficulty, routeType, \
             reviews, parkID FROM Trails ORDER BY trailID",
        )?;
        let rows = stmt.query_map([], trail_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Feature tokens for one trail.
    pub fn features_for(&self, trail_id: i64) -> Result<Vec<String>> {
        let mut stmt = self
            .db
            .prepare("SELECT feature FROM Features WHERE trailID = ?")?;
        let rows = stmt.query_map([trail_id], |row| row.get(0))?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Activity tokens for one trail.
    pub fn activities_for(&self, trail_id: i64) -> Result<Vec<String>> {
        let mut stmt = self
            .db
            .prepare("SELECT activity FROM Activities WHERE trailID = ?")?;
        let rows = stmt.query_map([trail_id], |row| row.get(0))?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Location row for one trail.
    pub fn location_for(&self, trail_id: i64) -> Result<Option<TrailLocation>> {
        Ok(self
            .db
            .query_row(
                "SELECT trailID, area_name, state, geolocation FROM Location WHERE trailID = ?",
                [trail_id],
                |row| {
                    Ok(TrailLocation {
                        trail_id: row.get(0)?,
                        area_name: row.get(1)?,
                        state: row.get(2)?,
                        geolocation: row.get(3)?,
                    })
                },
            )
            .optional()?)
    }

    // ========================================================================
    // Writes
    // ========================================================================

    /// Insert a user-contributed trail.
    ///
    /// Rejected without writing if the difficulty is outside the 1-5 scale
    /// or a trail with exactly this name already exists. The new id is one
    /// past the current maximum; the review count starts at zero.
    pub fn add_trail(&self, new: NewTrail) -> Result<Trail> {
        if !(1..=5).contains(&new.difficulty) {
            return Err(RangerError::InvalidDifficulty {
                difficulty: new.difficulty,
            });
        }
        if self.find_by_name(&new.name)?.is_some() {
            return Err(RangerError::DuplicateTrailName { name: new.name });
        }

        let trail_id: i64 = self.db.query_row(
            "SELECT COALESCE(MAX(trailID), 0) + 1 FROM Trails",
            [],
            |row| row.get(0),
        )?;

        self.db.execute(
            "INSERT INTO Trails (trailID, trailName, elevation_feet, length, difficulty, \
             routeType, reviews, parkID) VALUES (?, ?, ?, ?, ?, ?, 0, ?)",
            params![
                trail_id,
                new.name,
                new.elevation_feet,
                new.length,
                new.difficulty,
                new.route_type,
                new.park_id,
            ],
        )?;
        info!("added trail {trail_id} '{}'", new.name);

        Ok(Trail {
            trail_id,
            name: new.name,
            elevation_feet: new.elevation_feet,
            length: new.length,
            difficulty: new.difficulty,
            route_type: new.route_type,
            reviews: 0,
            park_id: new.park_id,
        })
    }

    /// Delete a trail by id, returning the number of rows removed (0 or 1).
    ///
    /// Feature, activity, location, and pending-change rows for the trail
    /// are removed by cascade. A missing id leaves every table unchanged.
    pub fn delete_trail(&self, trail_id: i64) -> Result<usize> {
        let affected = self
            .db
            .execute("DELETE FROM Trails WHERE trailID = ?", [trail_id])?;
        if affected > 0 {
            info!("deleted trail {trail_id}");
        }
        Ok(affected)
    }
}

fn overview_from_row(row: &Row<'_>) -> rusqlite::Result<TrailOverview> {
    Ok(TrailOverview {
        name: row.get(0)?,
        park_name: row.get(1)?,
        elevation_feet: row.get(2)?,
        length: row.get(3)?,
        difficulty: row.get(4)?,
        route_type: row.get(5)?,
        reviews: row.get(6)?,
    })
}

fn trail_from_row(row: &Row<'_>) -> rusqlite::Result<Trail> {
    Ok(Trail {
        trail_id: row.get(0)?,
        name: row.get(1)?,
        elevation_feet: row.get(2)?,
        length: row.get(3)?,
        difficulty: row.get(4)?,
        route_type: row.get(5)?,
        reviews: row.get(6)?,
        park_id: row.get(7)?,
    })
}
