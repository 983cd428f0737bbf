use std::fmt;

use curator_common::Contribution;

/// A contribution travelling through one run. Mutated in place by the scorer
/// (category, score, achievements) and the normalizer (votes).
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub contribution: Contribution,
    pub category: Option<String>,
    /// Integral score in 0..=100.
    pub raw_score: u32,
    pub achievements: Vec<String>,
    /// Reward generated by non-automated upvotes.
    pub generated_reward: f64,
    /// Per-category vote after clamping, before batch rescale.
    pub clamped_vote: f64,
    pub final_vote: f64,
}

impl Candidate {
    pub fn new(contribution: Contribution) -> Self {
        Self {
            contribution,
            category: None,
            raw_score: 0,
            achievements: Vec::new(),
            generated_reward: 0.0,
            clamped_vote: 0.0,
            final_vote: 0.0,
        }
    }

    pub fn author(&self) -> &str {
        &self.contribution.author
    }

    pub fn permlink(&self) -> &str {
        &self.contribution.permlink
    }

    pub fn contribution_type(&self) -> &str {
        &self.contribution.contribution_type
    }
}

/// The candidates selected for dispatch in one run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VoteBatch {
    pub candidates: Vec<Candidate>,
    pub total_vote_before_rescale: f64,
}

impl VoteBatch {
    pub fn total_final_vote(&self) -> f64 {
        self.candidates.iter().map(|c| c.final_vote).sum()
    }
}

/// How the scored candidates are ranked before the batch is cut to size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BatchRanking {
    /// Keep selection order (net votes, descending).
    #[default]
    NetVotes,
    /// Highest raw score first; ties keep selection order.
    RawScore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStage {
    CheckingSingleFlight,
    CheckingVotingPower,
    Authorizing,
    Selecting,
    Allocating,
    Scoring,
    Normalizing,
    Dispatching,
    Done,
    Aborted,
}

impl fmt::Display for RunStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::CheckingSingleFlight => "checking_single_flight",
            Self::CheckingVotingPower => "checking_voting_power",
            Self::Authorizing => "authorizing",
            Self::Selecting => "selecting",
            Self::Allocating => "allocating",
            Self::Scoring => "scoring",
            Self::Normalizing => "normalizing",
            Self::Dispatching => "dispatching",
            Self::Done => "done",
            Self::Aborted => "aborted",
        };
        write!(f, "{s}")
    }
}

/// Why a run stopped before dispatching.
#[derive(Debug, Clone, PartialEq)]
pub enum AbortReason {
    AlreadyRunning,
    VotingPowerTooLow { voting_power: f64 },
    NoCandidates,
    AllocationDegenerate,
    /// Another run took over the lease mid-run; nothing further is dispatched.
    LeaseLost,
}

impl AbortReason {
    /// Whether the abort should surface as a failed process exit.
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::AllocationDegenerate | Self::LeaseLost)
    }
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyRunning => write!(f, "another run holds the lease"),
            Self::VotingPowerTooLow { voting_power } => {
                write!(f, "voting power too low ({:.2}%)", voting_power / 100.0)
            }
            Self::NoCandidates => write!(f, "no eligible contributions"),
            Self::AllocationDegenerate => write!(f, "total weighted demand is zero"),
            Self::LeaseLost => write!(f, "lease lost to another run"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Completed,
    Aborted(AbortReason),
}

/// Counters from one run.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RunStats {
    pub candidates_selected: u64,
    pub candidates_dropped: u64,
    pub candidates_scored: u64,
    pub votes_sent: u64,
    pub votes_failed: u64,
    pub comments_sent: u64,
    pub comments_failed: u64,
    pub budget_used: f64,
}

impl fmt::Display for RunStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "selected={} dropped={} scored={} votes_sent={} votes_failed={} comments_sent={} comments_failed={} budget_used={:.2}",
            self.candidates_selected,
            self.candidates_dropped,
            self.candidates_scored,
            self.votes_sent,
            self.votes_failed,
            self.comments_sent,
            self.comments_failed,
            self.budget_used,
        )
    }
}

/// Result of a coordinator run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: String,
    pub outcome: RunOutcome,
    pub stats: RunStats,
    pub batch: VoteBatch,
}

impl RunReport {
    pub fn aborted(run_id: &str, reason: AbortReason, stats: RunStats) -> Self {
        Self {
            run_id: run_id.to_string(),
            outcome: RunOutcome::Aborted(reason),
            stats,
            batch: VoteBatch::default(),
        }
    }
}
