//! # Orchestrator Module
//!
//! ## Purpose
//! Drives concurrent validation of citation spans against the external
//! services: a bounded worker pool with staggered startup, per-job retry
//! budgets across two service tiers, a priority retry queue granting one
//! extra full pass, and a process-wide cooldown after any transient failure.
//!
//! ## Input/Output Specification
//! - **Input**: Ordered footnotes; configuration; the loaded rule corpus
//! - **Output**: One `ValidationResult` per citation span, keyed by
//!   `(footnote_number, index)`; spans that exhaust every attempt are flagged
//!   for manual review, never dropped
//!
//! ## Concurrency model
//! - N workers pull jobs from a shared backlog; the retry queue is consulted
//!   first on every dequeue
//! - Worker k sleeps k x stagger before its first pull so the services never
//!   see a thundering-herd burst
//! - Any transient failure extends a single atomic cooldown deadline; while
//!   it is in the future, every worker inserts a minimum delay before each
//!   external call. Extension is monotonic: a new failure can push the
//!   deadline later, never earlier
//! - Results are collected keyed by span, so report order is independent of
//!   completion order

use crate::checks::DeterministicChecker;
use crate::config::Config;
use crate::corpus::{RetrievedRuleSet, RuleCorpus};
use crate::errors::{PipelineError, Result};
use crate::report::{RunStats, ValidationReport};
use crate::splitter::CitationSplitter;
use crate::validation::{CheckOutcome, FallbackClient, PrimaryClient, RuleChecker};
use crate::{CitationSpan, Footnote, ValidationResult, Violation};
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};

/// Service tier a job is currently assigned to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceTier {
    Primary,
    Fallback,
}

/// Lifecycle state of a validation job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Queued,
    InFlight,
    Succeeded,
    FailedRetryable,
    FailedTerminal,
}

/// One unit of validation work. Mutated only by the orchestrator and the
/// worker executing it; discarded once a terminal result is recorded.
#[derive(Debug)]
pub struct ValidationJob {
    pub span: CitationSpan,
    /// Deterministic-check violations, attached before any external call
    pub local_violations: Vec<Violation>,
    pub state: JobState,
    pub tier: ServiceTier,
    /// Attempt counter within the current tier
    pub attempt: u32,
    /// Whether this job already consumed its one retry-from-scratch pass
    pub retried: bool,
}

impl ValidationJob {
    fn new(span: CitationSpan, local_violations: Vec<Violation>) -> Self {
        Self {
            span,
            local_violations,
            state: JobState::Queued,
            tier: ServiceTier::Primary,
            attempt: 0,
            retried: false,
        }
    }

    /// Reset for the single retry-from-scratch pass
    fn reset_for_retry(&mut self) {
        self.state = JobState::Queued;
        self.tier = ServiceTier::Primary;
        self.attempt = 0;
        self.retried = true;
    }
}

/// Process-wide cooldown gate. A single atomic deadline (milliseconds since
/// the gate's epoch) keeps the monotonic-extension invariant trivially
/// correct under concurrent writers.
pub struct CooldownGate {
    epoch: Instant,
    stagger_until_ms: AtomicU64,
    window: Duration,
    min_call_gap: Duration,
}

impl CooldownGate {
    pub fn new(window: Duration, min_call_gap: Duration) -> Self {
        Self {
            epoch: Instant::now(),
            stagger_until_ms: AtomicU64::new(0),
            window,
            min_call_gap,
        }
    }

    fn now_ms(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }

    /// Record a transient failure: extend the deadline to now + window.
    /// `fetch_max` means a concurrent later deadline always wins.
    pub fn trip(&self) {
        let deadline = self.now_ms() + self.window.as_millis() as u64;
        let previous = self.stagger_until_ms.fetch_max(deadline, Ordering::SeqCst);
        if previous < deadline {
            tracing::warn!(
                cooldown_secs = self.window.as_secs(),
                "Transient failure; stagger mode active for all workers"
            );
        }
    }

    /// Whether the cooldown window is currently active
    pub fn is_active(&self) -> bool {
        self.now_ms() < self.stagger_until_ms.load(Ordering::SeqCst)
    }

    /// Deadline in milliseconds since the gate's epoch, for tests
    pub fn deadline_ms(&self) -> u64 {
        self.stagger_until_ms.load(Ordering::SeqCst)
    }

    /// Insert the minimum inter-call delay if stagger mode is active
    pub async fn pause_if_active(&self) {
        if self.is_active() {
            sleep(self.min_call_gap).await;
        }
    }
}

/// Counters shared across workers
#[derive(Default)]
struct Counters {
    succeeded: AtomicUsize,
    fallback_verdicts: AtomicUsize,
    retry_passes: AtomicUsize,
    manual_review: AtomicUsize,
    evidence_strips: AtomicUsize,
    transient_failures: AtomicUsize,
}

/// State shared by all workers
struct Shared {
    backlog: Mutex<VecDeque<ValidationJob>>,
    /// Bounded priority queue consulted before the backlog on every dequeue
    retry_queue: Mutex<VecDeque<ValidationJob>>,
    in_flight: AtomicUsize,
    cooldown: CooldownGate,
    results: DashMap<(u32, u32), ValidationResult>,
    counters: Counters,
}

impl Shared {
    /// Pull the next job: retry queue first, then the backlog. Increments
    /// the in-flight count under the same lock, so an idle-looking queue
    /// with work still running is never mistaken for completion.
    fn dequeue(&self) -> Option<ValidationJob> {
        {
            let mut retries = self.retry_queue.lock();
            if let Some(mut job) = retries.pop_front() {
                job.state = JobState::InFlight;
                self.in_flight.fetch_add(1, Ordering::SeqCst);
                return Some(job);
            }
        }
        let mut backlog = self.backlog.lock();
        backlog.pop_front().map(|mut job| {
            job.state = JobState::InFlight;
            self.in_flight.fetch_add(1, Ordering::SeqCst);
            job
        })
    }

    fn requeue_for_retry(&self, mut job: ValidationJob) {
        job.reset_for_retry();
        self.retry_queue.lock().push_back(job);
    }

    fn record(&self, result: ValidationResult) {
        self.results.insert(result.span.key(), result);
    }

    fn drained(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) == 0
            && self.retry_queue.lock().is_empty()
            && self.backlog.lock().is_empty()
    }
}

/// The validation pipeline orchestrator
pub struct Orchestrator {
    config: Arc<Config>,
    corpus: Arc<RuleCorpus>,
    splitter: CitationSplitter,
    checker: DeterministicChecker,
    primary: Arc<dyn RuleChecker>,
    fallback: Arc<dyn RuleChecker>,
}

impl Orchestrator {
    /// Build the orchestrator with the real HTTP clients
    pub fn new(config: Arc<Config>, corpus: Arc<RuleCorpus>) -> Result<Self> {
        let primary: Arc<dyn RuleChecker> =
            Arc::new(PrimaryClient::new(config.validation.primary.clone())?);
        let fallback: Arc<dyn RuleChecker> =
            Arc::new(FallbackClient::new(config.validation.fallback.clone())?);
        Ok(Self::with_checkers(config, corpus, primary, fallback))
    }

    /// Build with explicit checkers; the seam the tests use
    pub fn with_checkers(
        config: Arc<Config>,
        corpus: Arc<RuleCorpus>,
        primary: Arc<dyn RuleChecker>,
        fallback: Arc<dyn RuleChecker>,
    ) -> Self {
        let splitter = CitationSplitter::new(config.splitter.clone());
        Self {
            config,
            corpus,
            splitter,
            checker: DeterministicChecker::new(),
            primary,
            fallback,
        }
    }

    /// Run the full pipeline: split every footnote, validate every span, and
    /// assemble the report. Per-job failures never surface as errors; they
    /// end up as manual-review flags in the report.
    pub async fn run(&self, footnotes: Vec<Footnote>) -> Result<ValidationReport> {
        let started_at = chrono::Utc::now();
        let run_start = Instant::now();
        let footnote_count = footnotes.len();

        let jobs = self.build_jobs(&footnotes);
        let span_count = jobs.len();
        tracing::info!(footnotes = footnote_count, spans = span_count, "Validation run starting");

        let shared = Arc::new(Shared {
            backlog: Mutex::new(jobs.into()),
            retry_queue: Mutex::new(VecDeque::new()),
            in_flight: AtomicUsize::new(0),
            cooldown: CooldownGate::new(
                Duration::from_secs(self.config.orchestrator.cooldown_window_seconds),
                Duration::from_millis(self.config.orchestrator.min_call_gap_ms),
            ),
            results: DashMap::new(),
            counters: Counters::default(),
        });

        let worker_count = self.config.orchestrator.worker_count.max(1);
        let stagger = Duration::from_millis(self.config.orchestrator.startup_stagger_ms);

        let mut handles = Vec::with_capacity(worker_count);
        for worker_id in 0..worker_count {
            let shared = shared.clone();
            let orchestrator = self.clone_for_worker();
            handles.push(tokio::spawn(async move {
                // Staggered launch keeps the first N calls from landing on
                // the services at the same instant
                sleep(stagger * worker_id as u32).await;
                orchestrator.worker_loop(worker_id, shared).await;
            }));
        }

        for joined in futures::future::join_all(handles).await {
            joined.map_err(|e| PipelineError::Internal {
                message: format!("worker task panicked: {}", e),
            })?;
        }

        let stats = RunStats {
            started_at,
            finished_at: chrono::Utc::now(),
            total_footnotes: footnote_count,
            total_spans: span_count,
            succeeded: shared.counters.succeeded.load(Ordering::SeqCst),
            fallback_verdicts: shared.counters.fallback_verdicts.load(Ordering::SeqCst),
            retry_passes: shared.counters.retry_passes.load(Ordering::SeqCst),
            manual_review: shared.counters.manual_review.load(Ordering::SeqCst),
            evidence_strips: shared.counters.evidence_strips.load(Ordering::SeqCst),
            transient_failures: shared.counters.transient_failures.load(Ordering::SeqCst),
            elapsed_seconds: run_start.elapsed().as_secs_f64(),
        };

        let report = ValidationReport::assemble(&shared.results, stats);
        tracing::info!(
            spans = report.stats.total_spans,
            succeeded = report.stats.succeeded,
            manual_review = report.stats.manual_review,
            elapsed_seconds = report.stats.elapsed_seconds,
            "Validation run completed"
        );

        Ok(report)
    }

    /// Split footnotes and run deterministic checks, producing the initial
    /// job list in source order.
    fn build_jobs(&self, footnotes: &[Footnote]) -> Vec<ValidationJob> {
        let mut jobs = Vec::new();
        for footnote in footnotes {
            for span in self.splitter.split(footnote) {
                let local_violations = self.checker.check(&span);
                tracing::debug!(
                    footnote = span.footnote_number,
                    index = span.index,
                    local_violations = local_violations.len(),
                    text = %crate::utils::TextUtils::truncate(&span.text, 60),
                    "Queued citation span"
                );
                jobs.push(ValidationJob::new(span, local_violations));
            }
        }
        jobs
    }

    fn clone_for_worker(&self) -> WorkerContext {
        WorkerContext {
            config: self.config.clone(),
            corpus: self.corpus.clone(),
            primary: self.primary.clone(),
            fallback: self.fallback.clone(),
        }
    }
}

/// Per-worker view of the orchestrator's shared components
struct WorkerContext {
    config: Arc<Config>,
    corpus: Arc<RuleCorpus>,
    primary: Arc<dyn RuleChecker>,
    fallback: Arc<dyn RuleChecker>,
}

/// What one tier-pass over a job concluded
enum PassOutcome {
    Done(ValidationResult),
    Exhausted,
}

impl WorkerContext {
    /// Pull-based worker loop: request the next job only after finishing the
    /// current one, bounding in-flight requests to the pool size.
    async fn worker_loop(&self, worker_id: usize, shared: Arc<Shared>) {
        loop {
            let Some(job) = shared.dequeue() else {
                if shared.drained() {
                    tracing::debug!(worker_id, "Worker exiting; queues drained");
                    break;
                }
                // Another worker may still push to the retry queue
                sleep(Duration::from_millis(50)).await;
                continue;
            };

            self.process(worker_id, &shared, job).await;
            shared.in_flight.fetch_sub(1, Ordering::SeqCst);
        }
    }

    /// Drive one job through primary, then fallback; requeue for the single
    /// retry pass or record a terminal failure when both tiers exhaust.
    async fn process(&self, worker_id: usize, shared: &Shared, mut job: ValidationJob) {
        if job.retried {
            shared.counters.retry_passes.fetch_add(1, Ordering::SeqCst);
        }

        job.tier = ServiceTier::Primary;
        match self.run_tier(shared, &mut job).await {
            PassOutcome::Done(result) => {
                shared.record(result);
                return;
            }
            PassOutcome::Exhausted => {}
        }

        job.tier = ServiceTier::Fallback;
        job.attempt = 0;
        match self.run_tier(shared, &mut job).await {
            PassOutcome::Done(result) => {
                shared.record(result);
                return;
            }
            PassOutcome::Exhausted => {}
        }

        if !job.retried {
            tracing::info!(
                worker_id,
                footnote = job.span.footnote_number,
                index = job.span.index,
                "Both tiers exhausted; queueing one retry pass"
            );
            job.state = JobState::FailedRetryable;
            shared.requeue_for_retry(job);
            return;
        }

        // Retry pass exhausted too: terminal failure, surfaced for a human
        job.state = JobState::FailedTerminal;
        tracing::warn!(
            footnote = job.span.footnote_number,
            index = job.span.index,
            "Citation could not be validated; flagged for manual review"
        );
        shared.counters.manual_review.fetch_add(1, Ordering::SeqCst);
        let mut result = ValidationResult::manual_review(job.span.clone(), true);
        result.violations = job.local_violations.clone();
        shared.record(result);
    }

    /// Run the attempts budgeted for the job's current tier
    async fn run_tier(&self, shared: &Shared, job: &mut ValidationJob) -> PassOutcome {
        let (checker, budget) = match job.tier {
            ServiceTier::Primary => (
                &self.primary,
                self.config.orchestrator.primary_retry_budget,
            ),
            ServiceTier::Fallback => (
                &self.fallback,
                self.config.orchestrator.fallback_retry_budget,
            ),
        };

        while job.attempt < budget {
            job.attempt += 1;
            shared.cooldown.pause_if_active().await;

            // A fresh retrieval per attempt; the evidence guard checks the
            // result against exactly this set
            let rules = self.corpus.retrieve(
                &job.span,
                self.config.corpus.max_primary_rules,
                self.config.corpus.max_general_rules,
            );

            match checker.validate(&job.span, &rules).await {
                Ok(outcome) => {
                    return PassOutcome::Done(self.accept(shared, job, &rules, outcome));
                }
                Err(e) if e.is_recoverable() => {
                    shared.counters.transient_failures.fetch_add(1, Ordering::SeqCst);
                    shared.cooldown.trip();
                    tracing::debug!(
                        service = checker.name(),
                        attempt = job.attempt,
                        footnote = job.span.footnote_number,
                        index = job.span.index,
                        error = %e,
                        "Transient validation failure"
                    );
                }
                Err(e) => {
                    // Terminal rejection: recorded immediately, never retried
                    tracing::warn!(
                        service = checker.name(),
                        footnote = job.span.footnote_number,
                        index = job.span.index,
                        error = %e,
                        "Service rejected citation as unusable"
                    );
                    job.state = JobState::FailedTerminal;
                    shared.counters.manual_review.fetch_add(1, Ordering::SeqCst);
                    let mut result = ValidationResult::manual_review(
                        job.span.clone(),
                        job.tier == ServiceTier::Fallback,
                    );
                    result.violations = job.local_violations.clone();
                    return PassOutcome::Done(result);
                }
            }
        }

        PassOutcome::Exhausted
    }

    /// Evidence guard plus result assembly. Any violation citing a rule id
    /// that was not part of the retrieval for this attempt is stripped and
    /// the result is flagged for review instead of trusted verbatim.
    fn accept(
        &self,
        shared: &Shared,
        job: &mut ValidationJob,
        rules: &RetrievedRuleSet,
        outcome: CheckOutcome,
    ) -> ValidationResult {
        let (kept, stripped): (Vec<Violation>, Vec<Violation>) = outcome
            .violations
            .into_iter()
            .partition(|v| rules.contains_rule(&v.rule_id));

        let evidence_stripped = !stripped.is_empty();
        if evidence_stripped {
            for violation in &stripped {
                tracing::warn!(
                    rule_id = %violation.rule_id,
                    footnote = job.span.footnote_number,
                    index = job.span.index,
                    "Violation cites a rule that was never supplied; stripping"
                );
            }
            shared.counters.evidence_strips.fetch_add(1, Ordering::SeqCst);
            shared.counters.manual_review.fetch_add(1, Ordering::SeqCst);
        }

        let used_fallback = job.tier == ServiceTier::Fallback;
        if used_fallback {
            shared.counters.fallback_verdicts.fetch_add(1, Ordering::SeqCst);
        }
        shared.counters.succeeded.fetch_add(1, Ordering::SeqCst);
        job.state = JobState::Succeeded;

        let mut violations = job.local_violations.clone();
        violations.extend(kept);

        ValidationResult {
            is_valid: outcome.is_valid && violations.is_empty(),
            span: job.span.clone(),
            violations,
            used_fallback,
            needs_manual_review: evidence_stripped,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::corpus::RuleCorpus;
    use crate::errors::PipelineError;
    use async_trait::async_trait;
    use std::io::Write;
    use std::sync::atomic::AtomicUsize;

    /// Scripted checker: fails with transient errors N times, then succeeds
    /// (or always fails when `fail_forever` is set).
    struct ScriptedChecker {
        name: &'static str,
        fail_first: usize,
        fail_forever: bool,
        calls: AtomicUsize,
        outcome: CheckOutcome,
    }

    impl ScriptedChecker {
        fn failing(name: &'static str, fail_first: usize, outcome: CheckOutcome) -> Self {
            Self {
                name,
                fail_first,
                fail_forever: false,
                calls: AtomicUsize::new(0),
                outcome,
            }
        }

        fn broken(name: &'static str) -> Self {
            Self {
                name,
                fail_first: 0,
                fail_forever: true,
                calls: AtomicUsize::new(0),
                outcome: valid_outcome(),
            }
        }
    }

    #[async_trait]
    impl RuleChecker for ScriptedChecker {
        fn name(&self) -> &str {
            self.name
        }

        async fn validate(
            &self,
            _span: &CitationSpan,
            _rules: &RetrievedRuleSet,
        ) -> crate::errors::Result<CheckOutcome> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_forever || call < self.fail_first {
                return Err(PipelineError::Transient {
                    service: self.name.to_string(),
                    details: "scripted failure".to_string(),
                });
            }
            Ok(self.outcome.clone())
        }
    }

    fn valid_outcome() -> CheckOutcome {
        CheckOutcome {
            is_valid: true,
            violations: Vec::new(),
        }
    }

    fn fast_config() -> Arc<Config> {
        let mut config = Config::default();
        config.orchestrator.worker_count = 2;
        config.orchestrator.startup_stagger_ms = 0;
        config.orchestrator.cooldown_window_seconds = 1;
        config.orchestrator.min_call_gap_ms = 1;
        Arc::new(config)
    }

    fn test_corpus() -> Arc<RuleCorpus> {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(
            br#"{
                "primary": [{"id": "P1", "keywords": ["see", "smith"], "body": "Signal rule."}],
                "general": [{"id": "G1", "keywords": ["jones"], "body": "Name rule."}]
            }"#,
        )
        .unwrap();
        let corpus = RuleCorpus::load(file.path()).unwrap();
        Arc::new(corpus)
    }

    fn footnotes() -> Vec<Footnote> {
        vec![Footnote {
            number: 1,
            raw_text: "See Smith v.\u{00A0}Jones, 1 F.3d 1 (1st Cir. 1990)".to_string(),
        }]
    }

    fn orchestrator_with(
        primary: ScriptedChecker,
        fallback: ScriptedChecker,
    ) -> Orchestrator {
        Orchestrator::with_checkers(
            fast_config(),
            test_corpus(),
            Arc::new(primary),
            Arc::new(fallback),
        )
    }

    #[tokio::test]
    async fn test_success_on_first_primary_attempt() {
        let orchestrator = orchestrator_with(
            ScriptedChecker::failing("primary", 0, valid_outcome()),
            ScriptedChecker::broken("fallback"),
        );
        let report = orchestrator.run(footnotes()).await.unwrap();

        assert_eq!(report.results.len(), 1);
        let result = &report.results[0];
        assert!(result.is_valid);
        assert!(!result.used_fallback);
        assert!(!result.needs_manual_review);
    }

    #[tokio::test]
    async fn test_retry_pass_succeeds_after_full_exhaustion() {
        // 2 primary + 3 fallback failures burn the first pass; the retry
        // pass reaches primary again, which now succeeds
        let orchestrator = orchestrator_with(
            ScriptedChecker::failing("primary", 2, valid_outcome()),
            ScriptedChecker::failing("fallback", 3, valid_outcome()),
        );
        let report = orchestrator.run(footnotes()).await.unwrap();

        assert_eq!(report.results.len(), 1);
        let result = &report.results[0];
        assert!(result.is_valid);
        assert!(!result.needs_manual_review);
        assert_eq!(report.stats.retry_passes, 1);
    }

    #[tokio::test]
    async fn test_total_exhaustion_flags_manual_review_without_error() {
        let orchestrator = orchestrator_with(
            ScriptedChecker::broken("primary"),
            ScriptedChecker::broken("fallback"),
        );
        let report = orchestrator.run(footnotes()).await.unwrap();

        assert_eq!(report.results.len(), 1);
        let result = &report.results[0];
        assert!(!result.is_valid);
        assert!(result.needs_manual_review);
        assert_eq!(report.stats.manual_review, 1);
    }

    #[tokio::test]
    async fn test_evidence_guard_strips_unretrieved_rule_id() {
        let hallucinated = CheckOutcome {
            is_valid: false,
            violations: vec![
                Violation {
                    rule_id: "P1".to_string(),
                    description: "real".to_string(),
                    evidence_quote: "See".to_string(),
                },
                Violation {
                    rule_id: "GHOST-99".to_string(),
                    description: "not a retrieved rule".to_string(),
                    evidence_quote: "Smith".to_string(),
                },
            ],
        };
        let orchestrator = orchestrator_with(
            ScriptedChecker::failing("primary", 0, hallucinated),
            ScriptedChecker::broken("fallback"),
        );
        let report = orchestrator.run(footnotes()).await.unwrap();

        let result = &report.results[0];
        assert!(result.needs_manual_review);
        assert!(result.violations.iter().any(|v| v.rule_id == "P1"));
        assert!(!result.violations.iter().any(|v| v.rule_id == "GHOST-99"));
        assert_eq!(report.stats.evidence_strips, 1);
    }

    #[tokio::test]
    async fn test_fallback_verdict_is_tagged() {
        let orchestrator = orchestrator_with(
            ScriptedChecker::broken("primary"),
            ScriptedChecker::failing("fallback", 0, valid_outcome()),
        );
        let report = orchestrator.run(footnotes()).await.unwrap();

        let result = &report.results[0];
        assert!(result.used_fallback);
        assert!(result.is_valid);
    }

    #[tokio::test]
    async fn test_results_keyed_and_ordered_by_span() {
        let orchestrator = orchestrator_with(
            ScriptedChecker::failing("primary", 0, valid_outcome()),
            ScriptedChecker::broken("fallback"),
        );
        let many = vec![
            Footnote {
                number: 2,
                raw_text: "See A v. B, 1 U.S. 1 (1990); cf. C v. D, 2 U.S. 2 (1991)".to_string(),
            },
            Footnote {
                number: 1,
                raw_text: "See E v. F, 3 U.S. 3 (1992)".to_string(),
            },
        ];
        let report = orchestrator.run(many).await.unwrap();

        let keys: Vec<(u32, u32)> = report.results.iter().map(|r| r.span.key()).collect();
        assert_eq!(keys, vec![(1, 1), (2, 1), (2, 2)]);
    }

    #[tokio::test]
    async fn test_cooldown_extension_is_monotonic() {
        let gate = Arc::new(CooldownGate::new(
            Duration::from_secs(60),
            Duration::from_millis(1),
        ));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let gate = gate.clone();
            handles.push(tokio::spawn(async move {
                let mut last = gate.deadline_ms();
                for _ in 0..50 {
                    gate.trip();
                    let now = gate.deadline_ms();
                    assert!(now >= last, "cooldown deadline moved backwards");
                    last = now;
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert!(gate.is_active());
    }

    #[tokio::test]
    async fn test_transient_failure_activates_stagger_mode() {
        let orchestrator = orchestrator_with(
            ScriptedChecker::failing("primary", 1, valid_outcome()),
            ScriptedChecker::broken("fallback"),
        );
        let report = orchestrator.run(footnotes()).await.unwrap();

        assert!(report.stats.transient_failures >= 1);
        assert!(report.results[0].is_valid);
    }
}
