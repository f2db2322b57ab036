//! Source ingestion and normalization.
//!
//! Reads the flat one-row-per-trail CSV and decomposes it into the star
//! schema the store persists: a park dimension, the trail fact table, two
//! unpivoted attribute tables, and a location table. Everything here is pure
//! with respect to the source rows; the database is only touched by
//! [`crate::store::TrailStore::rebuild`].

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use log::info;
use serde::Deserialize;

use crate::error::{RangerError, Result};
use crate::types::{Park, Trail, TrailAttribute, TrailLocation};

/// Meters-to-miles conversion applied once to source lengths.
pub const METERS_TO_MILES: f64 = 0.000_621_371;

/// One raw source row. A missing column fails deserialization, which is
/// treated as a fatal startup error.
#[derive(Debug, Deserialize)]
struct SourceRecord {
    national_park: String,
    trail_id: i64,
    name: String,
    /// Trail length in meters.
    length: f64,
    /// Elevation gain in feet.
    elevation_gain: f64,
    difficulty_rating: i64,
    route_type: String,
    num_reviews: i64,
    /// Bracket-delimited list literal, e.g. `['views', 'forest']`.
    features: String,
    /// Same shape as `features`, separate semantic domain.
    activities: String,
    city_name: String,
    state_name: String,
    #[serde(rename = "_geoloc")]
    geoloc: String,
}

/// The normalized tables derived from one source file, ready for bulk load.
#[derive(Debug, Default)]
pub struct TrailDataset {
    pub parks: Vec<Park>,
    pub trails: Vec<Trail>,
    pub features: Vec<TrailAttribute>,
    pub activities: Vec<TrailAttribute>,
    pub locations: Vec<TrailLocation>,
}

/// Read and normalize a source CSV file.
pub fn load_file(path: &Path) -> Result<TrailDataset> {
    let file = File::open(path)?;
    let dataset = load_reader(file)?;
    info!(
        "loaded {}: {} trails across {} parks",
        path.display(),
        dataset.trails.len(),
        dataset.parks.len()
    );
    Ok(dataset)
}

/// Read and normalize source rows from any reader.
pub fn load_reader<R: Read>(reader: R) -> Result<TrailDataset> {
    let mut records = Vec::new();
    for rec in csv::Reader::from_reader(reader).deserialize() {
        let rec: SourceRecord = rec?;
        records.push(rec);
    }
    normalize(records)
}

/// Decompose source rows into the normalized dataset.
fn normalize(records: Vec<SourceRecord>) -> Result<TrailDataset> {
    let mut dataset = TrailDataset::default();

    // Dimension extraction: distinct park names in first-seen order, dense
    // 1-based surrogate ids.
    let mut park_ids: HashMap<String, i64> = HashMap::new();
    for rec in &records {
        if !park_ids.contains_key(&rec.national_park) {
            let park_id = park_ids.len() as i64 + 1;
            park_ids.insert(rec.national_park.clone(), park_id);
            dataset.parks.push(Park {
                park_id,
                park_name: rec.national_park.clone(),
            });
        }
    }

    // Fact derivation plus the unpivots and location projection, one pass.
    let mut seen_ids: HashSet<i64> = HashSet::new();
    for rec in records {
        if !seen_ids.insert(rec.trail_id) {
            return Err(RangerError::DuplicateTrailId {
                trail_id: rec.trail_id,
            });
        }

        dataset.trails.push(Trail {
            trail_id: rec.trail_id,
            name: rec.name,
            elevation_feet: rec.elevation_gain,
            length: rec.length * METERS_TO_MILES,
            difficulty: rec.difficulty_rating,
            route_type: rec.route_type,
            reviews: rec.num_reviews,
            park_id: park_ids[&rec.national_park],
        });

        for token in parse_token_list(rec.trail_id, "features", &rec.features)? {
            dataset.features.push(TrailAttribute {
                trail_id: rec.trail_id,
                value: token,
            });
        }
        for token in parse_token_list(rec.trail_id, "activities", &rec.activities)? {
            dataset.activities.push(TrailAttribute {
                trail_id: rec.trail_id,
                value: token,
            });
        }

        dataset.locations.push(TrailLocation {
            trail_id: rec.trail_id,
            area_name: rec.city_name,
            state: rec.state_name,
            geolocation: rec.geoloc,
        });
    }

    Ok(dataset)
}

/// Parse a bracket-delimited, quoted, comma-separated list literal into
/// plain tokens. `"['a', 'b']"` yields `a` and `b`; `"[]"` yields nothing.
/// Anything not wrapped in brackets is a shape error, not a silent mis-slice.
fn parse_token_list(trail_id: i64, column: &'static str, value: &str) -> Result<Vec<String>> {
    let trimmed = value.trim();
    let inner = trimmed
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .ok_or_else(|| RangerError::ListShape {
            trail_id,
            column,
            value: value.to_string(),
        })?;

    if inner.trim().is_empty() {
        return Ok(Vec::new());
    }

    Ok(inner
        .split(", ")
        .map(|token| token.trim().trim_matches(|c| c == '\'' || c == '"').to_string())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "trail_id,name,national_park,length,elevation_gain,difficulty_rating,route_type,num_reviews,features,activities,city_name,state_name,_geoloc\n";

    fn dataset_from(rows: &str) -> Result<TrailDataset> {
        load_reader(format!("{HEADER}{rows}").as_bytes())
    }

    #[test]
    fn test_parse_two_element_list() {
        let tokens = parse_token_list(1, "features", "['dogs-leash', 'views']").unwrap();
        assert_eq!(tokens, vec!["dogs-leash", "views"]);
    }

    #[test]
    fn test_parse_empty_list_yields_no_tokens() {
        assert!(parse_token_list(1, "features", "[]").unwrap().is_empty());
    }

    #[test]
    fn test_parse_single_element_strips_quotes() {
        let tokens = parse_token_list(1, "activities", "[\"hiking\"]").unwrap();
        assert_eq!(tokens, vec!["hiking"]);
    }

    #[test]
    fn test_parse_rejects_missing_brackets() {
        let err = parse_token_list(7, "features", "views, forest").unwrap_err();
        assert!(matches!(
            err,
            RangerError::ListShape { trail_id: 7, column: "features", .. }
        ));
    }

    #[test]
    fn test_park_ids_dense_first_seen_order() {
        let dataset = dataset_from(concat!(
            "10,Alpha,Yosemite,1609.34,100,1,loop,5,['views'],['hiking'],Fresno,California,\"{'lat': 1, 'lng': 2}\"\n",
            "11,Beta,Zion,3218.68,200,3,loop,8,[],['hiking'],Springdale,Utah,\"{'lat': 3, 'lng': 4}\"\n",
            "12,Gamma,Yosemite,1000.0,50,2,out and back,2,[],[],Fresno,California,\"{'lat': 5, 'lng': 6}\"\n",
        ))
        .unwrap();

        let names: Vec<_> = dataset.parks.iter().map(|p| p.park_name.as_str()).collect();
        assert_eq!(names, vec!["Yosemite", "Zion"]);
        let ids: Vec<_> = dataset.parks.iter().map(|p| p.park_id).collect();
        assert_eq!(ids, vec![1, 2]);

        // Every trail resolves to a park in the dimension.
        for trail in &dataset.trails {
            assert!(dataset.parks.iter().any(|p| p.park_id == trail.park_id));
        }
        assert_eq!(dataset.trails[2].park_id, 1);
    }

    #[test]
    fn test_length_converted_to_miles_once() {
        let dataset = dataset_from(
            "10,Alpha,Yosemite,1609.34,100,1,loop,5,[],[],Fresno,California,geo\n",
        )
        .unwrap();
        assert!((dataset.trails[0].length - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_unpivot_row_counts() {
        let dataset = dataset_from(concat!(
            "10,Alpha,Yosemite,1609.34,100,1,loop,5,\"['views', 'forest', 'river']\",\"['hiking', 'camping']\",Fresno,California,geo\n",
            "11,Beta,Yosemite,1000.0,50,2,loop,3,[],[],Fresno,California,geo\n",
        ))
        .unwrap();

        assert_eq!(dataset.features.len(), 3);
        assert_eq!(dataset.activities.len(), 2);
        assert!(dataset.features.iter().all(|f| f.trail_id == 10));
        assert_eq!(dataset.features[0].value, "views");
    }

    #[test]
    fn test_duplicate_trail_id_is_an_error() {
        let err = dataset_from(concat!(
            "10,Alpha,Yosemite,1609.34,100,1,loop,5,[],[],Fresno,California,geo\n",
            "10,Beta,Yosemite,1000.0,50,2,loop,3,[],[],Fresno,California,geo\n",
        ))
        .unwrap_err();
        assert!(matches!(err, RangerError::DuplicateTrailId { trail_id: 10 }));
    }

    #[test]
    fn test_missing_column_is_fatal() {
        let result = load_reader(
            "trail_id,name\n10,Alpha\n".as_bytes(),
        );
        assert!(matches!(result, Err(RangerError::Source(_))));
    }

    #[test]
    fn test_location_projection_carries_geolocation_opaquely() {
        let dataset = dataset_from(
            "10,Alpha,Yosemite,1609.34,100,1,loop,5,[],[],Fresno,California,\"{'lat': 37.7, 'lng': -119.6}\"\n",
        )
        .unwrap();
        let loc = &dataset.locations[0];
        assert_eq!(loc.trail_id, 10);
        assert_eq!(loc.area_name, "Fresno");
        assert_eq!(loc.state, "California");
        assert_eq!(loc.geolocation, "{'lat': 37.7, 'lng': -119.6}");
    }
}
