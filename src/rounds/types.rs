//! Shared round data model (spec §3: RoundContext, RoundExecutionResult).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Carry-over block threaded between rounds by `RoundCompressor` (C8).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoundContext {
    pub round_number: u8,
    pub findings: Vec<String>,
    pub modules: Vec<String>,
    pub relationships: Vec<Relationship>,
    pub open_questions: Vec<String>,
    pub token_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relationship {
    pub from: String,
    pub to: String,
    pub kind: String,
}

impl Relationship {
    /// `from → to (kind)`, the canonical string form used by the compressor.
    pub fn to_line(&self) -> String {
        format!("{} → {} ({})", self.from, self.to, self.kind)
    }
}

/// Outcome of a round or module-fanned-out sub-call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoundStatus {
    Success,
    Degraded,
    Retried,
    Failed,
}

/// Token usage reported by a provider call.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input: usize,
    pub output: usize,
}

/// Quality signal attached on successful schema validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationInfo {
    pub schema_valid: bool,
    pub retries_used: u8,
}

/// Generic wrapper produced by the round runner (C13) for any round payload
/// `T` (module analysis, architecture summary, etc).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundExecutionResult<T> {
    pub data: T,
    pub status: RoundStatus,
    pub tokens: Option<TokenUsage>,
    pub cost: Option<f64>,
    pub elapsed_ms: u64,
    pub validation: Option<ValidationInfo>,
    pub degraded_reason: Option<String>,
}

impl<T> RoundExecutionResult<T> {
    pub fn success(data: T, tokens: TokenUsage, cost: Option<f64>, elapsed_ms: u64) -> Self {
        Self {
            data,
            status: RoundStatus::Success,
            tokens: Some(tokens),
            cost,
            elapsed_ms,
            validation: Some(ValidationInfo { schema_valid: true, retries_used: 0 }),
            degraded_reason: None,
        }
    }

    pub fn degraded(data: T, reason: impl Into<String>, tokens: Option<TokenUsage>, elapsed_ms: u64) -> Self {
        Self {
            data,
            status: RoundStatus::Degraded,
            tokens,
            cost: None,
            elapsed_ms,
            validation: None,
            degraded_reason: Some(reason.into()),
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self.status, RoundStatus::Degraded)
    }
}

/// Round 1 output: high-level module inventory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModuleInventory {
    pub modules: Vec<ModuleSummary>,
    pub summary: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleSummary {
    pub name: String,
    pub path: String,
    pub purpose: String,
    pub key_files: Vec<String>,
}

/// Round 2 output: architectural analysis.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArchitectureAnalysis {
    pub overview: String,
    pub layers: Vec<String>,
    pub relationships: Vec<Relationship>,
    pub entry_points: Vec<String>,
}

/// Round 3 output: feature inventory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeatureInventory {
    pub features: Vec<FeatureSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureSummary {
    pub name: String,
    pub description: String,
    pub entry_files: Vec<String>,
}

/// Round 4 output: conventions and coding-standard observations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConventionsAnalysis {
    pub conventions: Vec<String>,
    pub edge_cases: Vec<String>,
    pub open_questions: Vec<String>,
}

/// Round 5 output: per-module deep dive, fanned out one call per module.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModuleDeepDive {
    pub module: String,
    pub responsibilities: Vec<String>,
    pub dependencies: Vec<String>,
    pub risks: Vec<String>,
}

/// Round 6 output: operational/deployment analysis.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OperationsAnalysis {
    pub deployment_notes: Vec<String>,
    pub environment_requirements: Vec<String>,
    pub observability_notes: Vec<String>,
}

/// Results keyed by round number, as owned by the DAG orchestrator (spec §3
/// Ownership note). `HashMap` keys are `u8` round numbers 1..=6.
pub type RoundResultsByNumber = HashMap<u8, RoundOutcome>;

/// Type-erased enum wrapping each round's concrete payload so the
/// orchestrator can hold a single map across heterogeneous round types.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RoundOutcome {
    Modules(RoundExecutionResult<ModuleInventory>),
    Architecture(RoundExecutionResult<ArchitectureAnalysis>),
    Features(RoundExecutionResult<FeatureInventory>),
    Conventions(RoundExecutionResult<ConventionsAnalysis>),
    ModuleDeepDives(RoundExecutionResult<Vec<ModuleDeepDive>>),
    Operations(RoundExecutionResult<OperationsAnalysis>),
}

impl RoundOutcome {
    pub fn status(&self) -> RoundStatus {
        match self {
            Self::Modules(r) => r.status,
            Self::Architecture(r) => r.status,
            Self::Features(r) => r.status,
            Self::Conventions(r) => r.status,
            Self::ModuleDeepDives(r) => r.status,
            Self::Operations(r) => r.status,
        }
    }

    pub fn round_number(&self) -> u8 {
        match self {
            Self::Modules(_) => 1,
            Self::Architecture(_) => 2,
            Self::Features(_) => 3,
            Self::Conventions(_) => 4,
            Self::ModuleDeepDives(_) => 5,
            Self::Operations(_) => 6,
        }
    }
}

/// Direct (non-transitive) round dependencies, used by the DAG orchestrator
/// and the document registry to expand a requested document set into the
/// rounds it transitively requires (spec §4.13).
pub const ROUND_DEPS: &[(u8, &[u8])] = &[
    (1, &[]),
    (2, &[1]),
    (3, &[1, 2]),
    (4, &[1, 2, 3]),
    (5, &[1, 2]),
    (6, &[1, 2]),
];

/// Expands a set of requested round numbers to include every round they
/// transitively depend on (spec §8: selecting only round 4 must include
/// rounds 1, 2, 3, 4).
pub fn expand_round_deps(requested: &[u8]) -> Vec<u8> {
    let mut included: HashMap<u8, ()> = HashMap::new();
    let mut stack: Vec<u8> = requested.to_vec();

    while let Some(round) = stack.pop() {
        if included.contains_key(&round) {
            continue;
        }
        included.insert(round, ());
        if let Some((_, deps)) = ROUND_DEPS.iter().find(|(n, _)| *n == round) {
            stack.extend(deps.iter().copied());
        }
    }

    let mut result: Vec<u8> = included.into_keys().collect();
    result.sort_unstable();
    result
}

#[cfg(test)]
mod round_deps_tests {
    use super::*;

    #[test]
    fn round_four_expands_to_one_through_four() {
        assert_eq!(expand_round_deps(&[4]), vec![1, 2, 3, 4]);
    }

    #[test]
    fn round_one_expands_to_itself() {
        assert_eq!(expand_round_deps(&[1]), vec![1]);
    }

    #[test]
    fn round_five_and_six_both_depend_only_on_one_and_two() {
        assert_eq!(expand_round_deps(&[5]), vec![1, 2, 5]);
        assert_eq!(expand_round_deps(&[6]), vec![1, 2, 6]);
    }
}
