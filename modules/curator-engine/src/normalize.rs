//! Vote normalization: per-category clamp, then batch-wide rescale so the
//! dispatched votes add up to the total budget.

use curator_common::{CategoryProfile, CuratorError, Result};
use tracing::{debug, info, warn};

use crate::allocation::{AllocationContext, CategoryPool};
use crate::types::{Candidate, VoteBatch};

/// Unclamped vote for a score within its category.
///
/// Computed in two steps (share of the category pool, then back to a
/// percentage of the pool). Non-finite intermediate values collapse to 0.
pub fn raw_vote(final_score: f64, pool: &CategoryPool) -> f64 {
    let assigned_weight =
        (final_score / pool.total_vote_weight * 100.0) * pool.assigned_pool / 100.0;
    let vote = (assigned_weight / pool.assigned_pool * 100.0).round();
    if vote.is_finite() {
        vote
    } else {
        0.0
    }
}

/// Both bounds are inclusive: a vote at either bound is forced to it.
pub fn clamp_vote(vote: f64, profile: &CategoryProfile) -> f64 {
    let mut out = vote;
    if vote >= profile.max_vote {
        out = profile.max_vote;
    }
    if vote <= profile.min_vote {
        out = profile.min_vote;
    }
    out
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Clamp every candidate's vote within its category, then rescale the batch so
/// `sum(final_vote) == total_budget` (up to rounding).
pub fn normalize(candidates: Vec<Candidate>, ctx: &AllocationContext) -> Result<VoteBatch> {
    let mut candidates = candidates;

    for candidate in &mut candidates {
        let category = candidate
            .category
            .as_deref()
            .ok_or_else(|| CuratorError::UnknownCategory(candidate.contribution_type().to_string()))?;
        let pool = ctx
            .pool(category)
            .ok_or_else(|| CuratorError::UnknownCategory(category.to_string()))?;

        let vote = raw_vote(candidate.raw_score as f64, pool);
        candidate.clamped_vote = clamp_vote(vote, &pool.profile);
        debug!(
            author = candidate.author(),
            category,
            raw_vote = vote,
            clamped_vote = candidate.clamped_vote,
            "Clamped vote"
        );
    }

    let total_vote: f64 = candidates.iter().map(|c| c.clamped_vote).sum();
    if total_vote > 0.0 {
        for candidate in &mut candidates {
            candidate.final_vote = round2(candidate.clamped_vote * ctx.total_budget() / total_vote);
        }
    } else if !candidates.is_empty() {
        warn!("All clamped votes are zero, nothing to rescale");
    }

    let batch = VoteBatch {
        candidates,
        total_vote_before_rescale: total_vote,
    };
    info!(
        batch_size = batch.candidates.len(),
        total_vote_before_rescale = total_vote,
        total_after_rescale = batch.total_final_vote(),
        "Votes normalized"
    );
    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use curator_common::CategoryTable;

    use crate::testing::contribution;

    fn table() -> CategoryTable {
        CategoryTable {
            profiles: vec![
                CategoryProfile::new("a", 1.0, 2.0, 20.0),
                CategoryProfile::new("b", 2.0, 5.0, 10.0),
            ],
            aggregate: None,
        }
    }

    fn scored(id: i64, category: &str, score: u32) -> Candidate {
        let mut c = contribution(id, &format!("author{id}"));
        c.contribution_type = category.to_string();
        let mut candidate = Candidate::new(c);
        candidate.category = Some(category.to_string());
        candidate.raw_score = score;
        candidate
    }

    fn context(candidates: &[Candidate]) -> AllocationContext {
        let mut ctx = AllocationContext::new(&table(), 1000.0);
        ctx.allocate(candidates).unwrap();
        for c in candidates {
            ctx.record_score(c.category.as_deref().unwrap(), c.raw_score as f64)
                .unwrap();
        }
        ctx
    }

    #[test]
    fn clamp_bounds_are_inclusive() {
        let p = CategoryProfile::new("x", 1.0, 5.0, 10.0);
        assert_eq!(clamp_vote(5.0, &p), 5.0);
        assert_eq!(clamp_vote(3.0, &p), 5.0);
        assert_eq!(clamp_vote(7.0, &p), 7.0);
        assert_eq!(clamp_vote(10.0, &p), 10.0);
        assert_eq!(clamp_vote(50.0, &p), 10.0);
    }

    #[test]
    fn raw_vote_is_the_score_share_of_the_category() {
        let candidates = vec![scored(1, "a", 30), scored(2, "a", 10)];
        let ctx = context(&candidates);
        let pool = ctx.pool("a").unwrap();
        assert_eq!(raw_vote(30.0, pool), 75.0);
        assert_eq!(raw_vote(10.0, pool), 25.0);
    }

    #[test]
    fn raw_vote_with_empty_pool_is_zero() {
        let ctx = AllocationContext::new(&table(), 1000.0);
        assert_eq!(raw_vote(10.0, ctx.pool("a").unwrap()), 0.0);
    }

    #[test]
    fn clamped_votes_stay_within_category_bounds() {
        let candidates = vec![
            scored(1, "a", 90),
            scored(2, "a", 1),
            scored(3, "b", 40),
            scored(4, "b", 60),
        ];
        let ctx = context(&candidates);
        let batch = normalize(candidates, &ctx).unwrap();
        for c in &batch.candidates {
            let p = &ctx.pool(c.category.as_deref().unwrap()).unwrap().profile;
            assert!(c.clamped_vote >= p.min_vote && c.clamped_vote <= p.max_vote);
        }
    }

    #[test]
    fn rescaled_batch_sums_to_budget() {
        let candidates = vec![
            scored(1, "a", 45),
            scored(2, "a", 20),
            scored(3, "a", 7),
            scored(4, "b", 33),
            scored(5, "b", 80),
        ];
        let ctx = context(&candidates);
        let batch = normalize(candidates, &ctx).unwrap();
        let n = batch.candidates.len() as f64;
        assert!((batch.total_final_vote() - 1000.0).abs() <= 0.01 * n);
    }

    #[test]
    fn single_candidate_gets_the_whole_budget() {
        let candidates = vec![scored(1, "b", 13)];
        let ctx = context(&candidates);
        let batch = normalize(candidates, &ctx).unwrap();
        assert_eq!(batch.candidates[0].clamped_vote, 10.0);
        assert_eq!(batch.candidates[0].final_vote, 1000.0);
        assert_eq!(batch.total_vote_before_rescale, 10.0);
    }

    #[test]
    fn uncategorized_candidate_is_rejected() {
        let ctx = AllocationContext::new(&table(), 1000.0);
        let mut c = scored(1, "a", 10);
        c.category = None;
        assert!(normalize(vec![c], &ctx).is_err());
    }
}
