//! DAGOrchestrator (spec §4.13, C14). A single-process scheduler over named
//! steps with topological, ready-set parallelism. Grounded on the teacher's
//! staged pipeline executor (`core/pipeline/pipeline_executor.rs`, which
//! already threads a results bundle through sequential/parallel stage
//! execution with per-stage error capture), generalized to an arbitrary
//! step graph with explicit failure/skip/degrade semantics.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::core::errors::{HandoverError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Completed,
    Failed,
    Skipped,
}

/// A unit of orchestrated work. `execute` returns `Err` to mark the step
/// failed; a degraded-but-successful result (spec §4.13: "degradation is not
/// failure") must be returned as `Ok`.
#[async_trait]
pub trait DagStep: Send + Sync {
    async fn execute(&self, outputs: &StepOutputs) -> Result<serde_json::Value>;
}

/// Read-only view of completed steps' outputs, available to a step's
/// `execute` for consuming its dependencies' results.
#[derive(Default, Clone)]
pub struct StepOutputs {
    values: HashMap<String, serde_json::Value>,
}

impl StepOutputs {
    pub fn get(&self, step_id: &str) -> Option<&serde_json::Value> {
        self.values.get(step_id)
    }
}

struct RegisteredStep {
    id: String,
    deps: Vec<String>,
    step: Arc<dyn DagStep>,
}

/// Observer hooks forwarded during execution (spec §4.13 Events).
pub trait DagObserver: Send + Sync {
    fn on_step_start(&self, _id: &str) {}
    fn on_step_complete(&self, _id: &str) {}
    fn on_step_fail(&self, _id: &str, _error: &HandoverError) {}
    fn on_step_skip(&self, _id: &str) {}
    fn on_step_retry(&self, _id: &str, _attempt: u32, _delay_ms: u64, _reason: &str) {}
}

pub struct NoopObserver;
impl DagObserver for NoopObserver {}

pub struct DagOrchestrator {
    steps: Vec<RegisteredStep>,
}

pub struct DagRunResult {
    pub outputs: StepOutputs,
    pub outcomes: HashMap<String, StepOutcome>,
}

impl DagOrchestrator {
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    /// Registers a step. Construction-time errors: empty id, duplicate id,
    /// or a dep referencing an id not yet registered (forward references are
    /// rejected, matching a topologically-ordered registration discipline).
    pub fn register(&mut self, id: impl Into<String>, deps: Vec<String>, step: Arc<dyn DagStep>) -> Result<()> {
        let id = id.into();
        if id.is_empty() {
            return Err(HandoverError::dag("step id must not be empty"));
        }
        if self.steps.iter().any(|s| s.id == id) {
            return Err(HandoverError::dag(format!("duplicate step id '{id}'")));
        }
        for dep in &deps {
            if !self.steps.iter().any(|s| &s.id == dep) {
                return Err(HandoverError::dag(format!("step '{id}' depends on unregistered step '{dep}'")));
            }
        }

        self.steps.push(RegisteredStep { id, deps, step });
        Ok(())
    }

    /// Detects cycles. Since `register` only accepts deps on already
    /// registered ids, the step list is always a DAG by construction; this
    /// is kept as an explicit invariant check rather than relied on
    /// implicitly.
    fn assert_acyclic(&self) -> Result<()> {
        let ids: HashSet<&str> = self.steps.iter().map(|s| s.id.as_str()).collect();
        for step in &self.steps {
            for dep in &step.deps {
                if !ids.contains(dep.as_str()) {
                    return Err(HandoverError::dag(format!("step '{}' depends on unknown step '{}'", step.id, dep)));
                }
            }
        }
        Ok(())
    }

    /// Runs every registered step with ready-set parallelism: a step becomes
    /// runnable once all its deps have completed non-fail. A step whose
    /// transitive deps include a failed step is marked `skipped` and never
    /// executed.
    pub async fn run(&self, observer: Arc<dyn DagObserver>) -> Result<DagRunResult> {
        self.assert_acyclic()?;

        let outputs = Arc::new(Mutex::new(StepOutputs::default()));
        let outcomes: Arc<Mutex<HashMap<String, StepOutcome>>> = Arc::new(Mutex::new(HashMap::new()));

        let mut remaining: Vec<&RegisteredStep> = self.steps.iter().collect();

        while !remaining.is_empty() {
            let outcomes_snapshot = outcomes.lock().await.clone();

            let ready: Vec<&RegisteredStep> = remaining
                .iter()
                .filter(|s| s.deps.iter().all(|d| outcomes_snapshot.contains_key(d)))
                .copied()
                .collect();

            if ready.is_empty() {
                // No progress possible; this only happens if `assert_acyclic`
                // missed something, which should be unreachable given the
                // registration-time check.
                return Err(HandoverError::dag("no runnable steps remain; possible cycle"));
            }

            let futures = ready.iter().map(|step| {
                let outputs = Arc::clone(&outputs);
                let observer = Arc::clone(&observer);
                let outcomes_snapshot = outcomes_snapshot.clone();
                async move {
                    let failed_dep = step.deps.iter().find(|d| outcomes_snapshot.get(*d) == Some(&StepOutcome::Failed) || outcomes_snapshot.get(*d) == Some(&StepOutcome::Skipped));

                    if let Some(_dep) = failed_dep {
                        observer.on_step_skip(&step.id);
                        return (step.id.clone(), StepOutcome::Skipped, None);
                    }

                    observer.on_step_start(&step.id);
                    let snapshot = outputs.lock().await.clone();
                    let result = step.step.execute(&snapshot).await;

                    match result {
                        Ok(value) => {
                            observer.on_step_complete(&step.id);
                            (step.id.clone(), StepOutcome::Completed, Some(value))
                        }
                        Err(err) => {
                            warn!(step = %step.id, error = %err, "step failed");
                            observer.on_step_fail(&step.id, &err);
                            (step.id.clone(), StepOutcome::Failed, None)
                        }
                    }
                }
            });

            let results = join_all(futures).await;

            {
                let mut outcomes_guard = outcomes.lock().await;
                let mut outputs_guard = outputs.lock().await;
                for (id, outcome, value) in results {
                    outcomes_guard.insert(id.clone(), outcome);
                    if let Some(value) = value {
                        outputs_guard.values.insert(id, value);
                    }
                }
            }

            let ready_ids: HashSet<&str> = ready.iter().map(|s| s.id.as_str()).collect();
            remaining.retain(|s| !ready_ids.contains(s.id.as_str()));
        }

        info!(steps = self.steps.len(), "dag run complete");

        let outcomes = Arc::try_unwrap(outcomes).map(|m| m.into_inner()).unwrap_or_default();
        let outputs = Arc::try_unwrap(outputs).map(|m| m.into_inner()).unwrap_or_default();

        Ok(DagRunResult { outputs, outcomes })
    }
}

impl Default for DagOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct OkStep(serde_json::Value);
    #[async_trait]
    impl DagStep for OkStep {
        async fn execute(&self, _outputs: &StepOutputs) -> Result<serde_json::Value> {
            Ok(self.0.clone())
        }
    }

    struct FailStep;
    #[async_trait]
    impl DagStep for FailStep {
        async fn execute(&self, _outputs: &StepOutputs) -> Result<serde_json::Value> {
            Err(HandoverError::dag("intentional failure"))
        }
    }

    #[test]
    fn rejects_empty_id() {
        let mut dag = DagOrchestrator::new();
        let err = dag.register("", vec![], Arc::new(OkStep(serde_json::Value::Null))).unwrap_err();
        assert!(matches!(err, HandoverError::Dag { .. }));
    }

    #[test]
    fn rejects_dep_on_unregistered_step() {
        let mut dag = DagOrchestrator::new();
        let err = dag.register("b", vec!["a".to_string()], Arc::new(OkStep(serde_json::Value::Null))).unwrap_err();
        assert!(matches!(err, HandoverError::Dag { .. }));
    }

    #[tokio::test]
    async fn failure_propagates_to_dependents_as_skipped() {
        let mut dag = DagOrchestrator::new();
        dag.register("a", vec![], Arc::new(FailStep)).unwrap();
        dag.register("b", vec!["a".to_string()], Arc::new(OkStep(serde_json::json!({"x": 1})))).unwrap();

        let result = dag.run(Arc::new(NoopObserver)).await.unwrap();
        assert_eq!(result.outcomes.get("a"), Some(&StepOutcome::Failed));
        assert_eq!(result.outcomes.get("b"), Some(&StepOutcome::Skipped));
    }

    #[tokio::test]
    async fn independent_steps_both_complete() {
        let mut dag = DagOrchestrator::new();
        dag.register("a", vec![], Arc::new(OkStep(serde_json::json!(1)))).unwrap();
        dag.register("b", vec![], Arc::new(OkStep(serde_json::json!(2)))).unwrap();

        let result = dag.run(Arc::new(NoopObserver)).await.unwrap();
        assert_eq!(result.outcomes.get("a"), Some(&StepOutcome::Completed));
        assert_eq!(result.outcomes.get("b"), Some(&StepOutcome::Completed));
    }
}
