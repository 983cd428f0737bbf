use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CuratorError, Result};

/// Highest raw vote any category may assign.
pub const MAX_VOTE_EVER: f64 = 30.0;

/// Static configuration for one contribution category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryProfile {
    pub id: String,
    /// Relative budget weight per unit of demand. Always positive.
    pub difficulty: f64,
    pub min_vote: f64,
    pub max_vote: f64,
}

impl CategoryProfile {
    pub fn new(id: &str, difficulty: f64, min_vote: f64, max_vote: f64) -> Self {
        Self {
            id: id.to_string(),
            difficulty,
            min_vote,
            max_vote,
        }
    }
}

/// A synthetic category collecting every contribution type that starts with `prefix`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateBucket {
    pub category: String,
    pub prefix: String,
}

/// The full category configuration: exact-match profiles plus an optional aggregate bucket.
/// The aggregate bucket's category must also appear in `profiles`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTable {
    pub profiles: Vec<CategoryProfile>,
    #[serde(default)]
    pub aggregate: Option<AggregateBucket>,
}

impl CategoryTable {
    /// Load a table from a JSON file. Difficulties are taken as-is (no multiplier).
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            CuratorError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        let table: Self = serde_json::from_str(&raw).map_err(|e| {
            CuratorError::Config(format!("invalid category table {}: {e}", path.display()))
        })?;
        table.validate()?;
        Ok(table)
    }

    pub fn get(&self, id: &str) -> Option<&CategoryProfile> {
        self.profiles.iter().find(|p| p.id == id)
    }

    pub fn validate(&self) -> Result<()> {
        for p in &self.profiles {
            if p.difficulty.is_nan() || p.difficulty <= 0.0 {
                return Err(CuratorError::Config(format!(
                    "category {} has non-positive difficulty {}",
                    p.id, p.difficulty
                )));
            }
            if p.min_vote > p.max_vote {
                return Err(CuratorError::Config(format!(
                    "category {} has min_vote {} above max_vote {}",
                    p.id, p.min_vote, p.max_vote
                )));
            }
        }
        if let Some(agg) = &self.aggregate {
            if self.get(&agg.category).is_none() {
                return Err(CuratorError::Config(format!(
                    "aggregate bucket {} has no category profile",
                    agg.category
                )));
            }
        }
        Ok(())
    }
}

/// Built-in category table. `multiplier` scales every difficulty uniformly.
pub fn default_categories(multiplier: f64) -> CategoryTable {
    let m = multiplier;
    CategoryTable {
        profiles: vec![
            CategoryProfile::new("ideas", 0.8 * m, 1.5, 4.0),
            CategoryProfile::new("development", 2.5 * m, 30.0, MAX_VOTE_EVER),
            CategoryProfile::new("bug-hunting", m, 2.0, 5.0),
            CategoryProfile::new("translations", 1.4 * m, 7.0, 10.0),
            CategoryProfile::new("graphics", 1.7 * m, 7.5, MAX_VOTE_EVER),
            CategoryProfile::new("analysis", 1.6 * m, 8.0, 20.0),
            CategoryProfile::new("social", 1.5 * m, 5.0, 10.0),
            CategoryProfile::new("documentation", 1.5 * m, 5.0, 20.0),
            CategoryProfile::new("tutorials", 1.9 * m, 7.0, 15.0),
            CategoryProfile::new("video-tutorials", 1.7 * m, 8.0, 15.0),
            CategoryProfile::new("copywriting", 1.55 * m, 5.0, 15.0),
            CategoryProfile::new("blog", m, 2.0, 5.0),
            CategoryProfile::new("tasks-requests", 1.1 * m, 3.0, 6.0),
        ],
        aggregate: Some(AggregateBucket {
            category: "tasks-requests".to_string(),
            prefix: "task-".to_string(),
        }),
    }
}
