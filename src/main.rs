//! RouteRanger CLI - thin presentation glue over the trail store.
//!
//! Each subcommand maps onto one store operation: `load` rebuilds the
//! database from a CSV, the read commands render result tables, and the
//! write commands surface the store's rejection errors verbatim.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use routeranger::{NewTrail, RangerError, Trail, TrailStore, load_file};

#[derive(Parser)]
#[command(name = "routeranger", about = "RouteRanger - a trail finder app")]
struct Cli {
    /// Database file path.
    #[arg(long, global = true, default_value = "routeranger.db")]
    db: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Rebuild the database from a trail CSV (drops all existing data).
    Load {
        /// Source CSV with one row per trail.
        csv: PathBuf,
    },
    /// List trails joined with their park.
    Overview {
        #[arg(long, default_value_t = 10)]
        limit: u32,
    },
    /// Search trails by keyword, state, park, or difficulty.
    Search {
        /// Substring to match against trail names.
        keyword: Option<String>,
        /// Filter by state (repeatable).
        #[arg(long)]
        state: Vec<String>,
        /// Filter by national park (repeatable).
        #[arg(long)]
        park: Vec<String>,
        /// Filter by difficulty level (1-5).
        #[arg(long)]
        difficulty: Option<i64>,
    },
    /// Add a new trail.
    Add {
        #[arg(long)]
        name: String,
        /// Elevation gain in feet.
        #[arg(long)]
        elevation: f64,
        /// Length in miles.
        #[arg(long)]
        length: f64,
        /// Difficulty level, 1 (easy) to 5 (very challenging).
        #[arg(long, value_parser = clap::value_parser!(i64).range(1..=5))]
        difficulty: i64,
        /// Route type: "out and back", "loop", or "point to point".
        #[arg(long)]
        route_type: String,
        /// Exact national park name.
        #[arg(long)]
        park: String,
    },
    /// Delete a trail by id.
    Delete { trail_id: i64 },
    /// Submit edits to a trail for admin review (no direct write-back).
    Edit {
        trail_id: i64,
        /// New trail name.
        #[arg(long)]
        name: Option<String>,
        /// New elevation gain in feet.
        #[arg(long)]
        elevation: Option<f64>,
        /// New length in miles.
        #[arg(long)]
        length: Option<f64>,
        /// New difficulty level (1-5).
        #[arg(long, value_parser = clap::value_parser!(i64).range(1..=5))]
        difficulty: Option<i64>,
        /// New route type.
        #[arg(long)]
        route_type: Option<String>,
    },
    /// Review maintenance edits.
    Changes {
        #[command(subcommand)]
        action: ChangesAction,
    },
}

#[derive(Subcommand)]
enum ChangesAction {
    /// List changes awaiting review.
    List,
    /// Apply a pending change to its trail.
    Approve { change_id: i64 },
    /// Discard a pending change.
    Reject { change_id: i64 },
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> routeranger::Result<()> {
    let mut store = TrailStore::open(&cli.db)?;

    match cli.command {
        Command::Load { csv } => {
            let dataset = load_file(&csv)?;
            store.rebuild(&dataset)?;
            println!(
                "Loaded {} trails across {} parks",
                dataset.trails.len(),
                dataset.parks.len()
            );
        }
        Command::Overview { limit } => {
            for t in store.overview(limit)? {
                println!(
                    "{} ({}) - {:.1} mi, {:.0} ft, difficulty {}, {}, {} reviews",
                    t.name,
                    t.park_name,
                    t.length,
                    t.elevation_feet,
                    t.difficulty,
                    t.route_type,
                    t.reviews
                );
            }
        }
        Command::Search {
            keyword,
            state,
            park,
            difficulty,
        } => run_search(&store, keyword, state, park, difficulty)?,
        Command::Add {
            name,
            elevation,
            length,
            difficulty,
            route_type,
            park,
        } => {
            let park_id = store
                .parks()?
                .into_iter()
                .find(|p| p.park_name == park)
                .map(|p| p.park_id)
                .ok_or_else(|| RangerError::UnknownPark { name: park })?;
            let trail = store.add_trail(NewTrail {
                name,
                elevation_feet: elevation,
                length,
                difficulty,
                route_type,
                park_id,
            })?;
            println!("Added trail {} '{}'", trail.trail_id, trail.name);
        }
        Command::Delete { trail_id } => {
            let affected = store.delete_trail(trail_id)?;
            if affected > 0 {
                println!("Trail {trail_id} removed");
            } else {
                println!("No trail found with id {trail_id}");
            }
        }
        Command::Edit {
            trail_id,
            name,
            elevation,
            length,
            difficulty,
            route_type,
        } => {
            let original = store
                .get_trail(trail_id)?
                .ok_or(RangerError::TrailNotFound { trail_id })?;
            let edited = build_edited(&original, name, elevation, length, difficulty, route_type);
            let proposed = store.propose_changes(&original, &edited)?;
            if proposed.is_empty() {
                println!("No changes to submit for trail {trail_id}");
            } else {
                for c in &proposed {
                    println!(
                        "Submitted change #{}: {} {:?} -> {:?}",
                        c.change_id, c.field, c.old_value, c.new_value
                    );
                }
                println!("Changes will be applied after admin review");
            }
        }
        Command::Changes { action } => match action {
            ChangesAction::List => {
                for c in store.pending_changes()? {
                    println!(
                        "#{} trail {} {}: {:?} -> {:?} ({})",
                        c.change_id, c.trail_id, c.field, c.old_value, c.new_value, c.submitted_at
                    );
                }
            }
            ChangesAction::Approve { change_id } => {
                let c = store.approve_change(change_id)?;
                println!("Change #{} applied to trail {}", c.change_id, c.trail_id);
            }
            ChangesAction::Reject { change_id } => {
                let c = store.reject_change(change_id)?;
                println!("Change #{} rejected", c.change_id);
            }
        },
    }
    Ok(())
}

/// Apply the provided flag values over a trail snapshot. Unset flags keep
/// the original value; locked fields (id, park, reviews) are not exposed.
fn build_edited(
    original: &Trail,
    name: Option<String>,
    elevation: Option<f64>,
    length: Option<f64>,
    difficulty: Option<i64>,
    route_type: Option<String>,
) -> Trail {
    let mut edited = original.clone();
    if let Some(name) = name {
        edited.name = name;
    }
    if let Some(elevation) = elevation {
        edited.elevation_feet = elevation;
    }
    if let Some(length) = length {
        edited.length = length;
    }
    if let Some(difficulty) = difficulty {
        edited.difficulty = difficulty;
    }
    if let Some(route_type) = route_type {
        edited.route_type = route_type;
    }
    edited
}

fn run_search(
    store: &TrailStore,
    keyword: Option<String>,
    states: Vec<String>,
    parks: Vec<String>,
    difficulty: Option<i64>,
) -> routeranger::Result<()> {
    if let Some(term) = keyword {
        for t in store.search_by_keyword(&term)? {
            println!("{} ({}) - difficulty {}", t.name, t.park_name, t.difficulty);
        }
    } else if !states.is_empty() {
        for t in store.trails_in_states(&states)? {
            println!("{} - {}, {} - difficulty {}", t.name, t.area_name, t.state, t.difficulty);
        }
    } else if !parks.is_empty() {
        for t in store.trails_in_parks(&parks)? {
            println!("{} ({}) - difficulty {}", t.name, t.park_name, t.difficulty);
        }
    } else if let Some(level) = difficulty {
        let count = store.count_by_difficulty(level)?;
        println!("{count} total trails with difficulty level {level}");
        for t in store.trails_by_difficulty(level)? {
            println!("{} ({}) - {:.1} mi", t.name, t.park_name, t.length);
        }
    } else {
        println!("Provide a keyword or one of --state, --park, --difficulty");
    }
    Ok(())
}
