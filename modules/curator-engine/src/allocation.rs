//! Per-run category budget allocation.
//!
//! `AllocationContext` is created fresh for every run from the static
//! category table. It holds the assigned pool per category (computed once from
//! candidate demand) and the running sum of raw scores per category (filled
//! by the scorer, read by the normalizer).

use std::collections::HashMap;

use curator_common::{CategoryProfile, CategoryTable, CuratorError, Result};
use tracing::{debug, info};

use crate::classify::Classifier;
use crate::types::Candidate;

/// Run-scoped state for one category.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryPool {
    pub profile: CategoryProfile,
    /// Candidates classified into this category at allocation time.
    pub candidate_count: usize,
    pub assigned_pool: f64,
    /// Sum of raw scores recorded for this category during the run.
    pub total_vote_weight: f64,
}

impl CategoryPool {
    fn new(profile: CategoryProfile) -> Self {
        Self {
            profile,
            candidate_count: 0,
            assigned_pool: 0.0,
            total_vote_weight: 0.0,
        }
    }

    pub fn weighted_demand(&self) -> f64 {
        self.candidate_count as f64 * self.profile.difficulty
    }
}

#[derive(Debug, Clone)]
pub struct AllocationContext {
    total_budget: f64,
    classifier: Classifier,
    pools: Vec<CategoryPool>,
    index: HashMap<String, usize>,
}

impl AllocationContext {
    pub fn new(table: &CategoryTable, total_budget: f64) -> Self {
        let pools: Vec<CategoryPool> = table
            .profiles
            .iter()
            .cloned()
            .map(CategoryPool::new)
            .collect();
        let index = pools
            .iter()
            .enumerate()
            .map(|(i, p)| (p.profile.id.clone(), i))
            .collect();
        Self {
            total_budget,
            classifier: Classifier::from_table(table),
            pools,
            index,
        }
    }

    pub fn total_budget(&self) -> f64 {
        self.total_budget
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub fn pool(&self, category: &str) -> Option<&CategoryPool> {
        self.index.get(category).map(|&i| &self.pools[i])
    }

    pub fn pools(&self) -> &[CategoryPool] {
        &self.pools
    }

    /// Split the total budget across categories in proportion to demand and difficulty.
    ///
    /// Exact-match categories receive `count / total_weighted_demand * difficulty`
    /// of the budget. The aggregate bucket instead receives
    /// `count / total_candidates * difficulty`.
    pub fn allocate(&mut self, candidates: &[Candidate]) -> Result<()> {
        for pool in &mut self.pools {
            pool.candidate_count = 0;
            pool.assigned_pool = 0.0;
        }

        for candidate in candidates {
            let Some(c) = self.classifier.classify(candidate.contribution_type()) else {
                debug!(
                    contribution_type = candidate.contribution_type(),
                    "Unclassified contribution type, not counted toward any category"
                );
                continue;
            };
            if let Some(&i) = self.index.get(c.category) {
                self.pools[i].candidate_count += 1;
            }
        }

        let total_weighted_demand: f64 = self.pools.iter().map(CategoryPool::weighted_demand).sum();
        if total_weighted_demand <= 0.0 || !total_weighted_demand.is_finite() {
            return Err(CuratorError::AllocationDegenerate);
        }

        let total_candidates = candidates.len() as f64;
        for pool in &mut self.pools {
            let count = pool.candidate_count as f64;
            let share = if self.classifier.is_aggregate(&pool.profile.id) {
                count / total_candidates * 100.0
            } else {
                count / total_weighted_demand * 100.0
            };
            pool.assigned_pool = share * pool.profile.difficulty * self.total_budget / 100.0;
        }

        info!(
            total_weighted_demand,
            total_candidates = candidates.len(),
            allocated = self.pools.iter().map(|p| p.assigned_pool).sum::<f64>(),
            "Category pools assigned"
        );
        for pool in self.pools.iter().filter(|p| p.candidate_count > 0) {
            debug!(
                category = %pool.profile.id,
                count = pool.candidate_count,
                assigned_pool = pool.assigned_pool,
                "Category pool"
            );
        }
        Ok(())
    }

    /// Add a candidate's raw score to its category accumulator.
    pub fn record_score(&mut self, category: &str, score: f64) -> Result<()> {
        let &i = self
            .index
            .get(category)
            .ok_or_else(|| CuratorError::UnknownCategory(category.to_string()))?;
        self.pools[i].total_vote_weight += score;
        Ok(())
    }
}
