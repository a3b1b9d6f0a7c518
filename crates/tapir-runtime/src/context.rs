//! Assertion context handed to every test body
//!
//! A [`Test`] is a cheap, clonable handle onto one test's record. Every
//! assertion appends one [`AssertionResult`]; nothing is ever thrown, so a
//! failing assertion never stops the ones after it.
//!
//! # Completion
//!
//! A test completes exactly once. Three producers feed one completion signal:
//! - `end()`, called explicitly by the body
//! - a plan (`plan(n)`) reaching its n-th assertion
//! - settlement of the future returned by an async body
//!
//! A second `end()` records [`TestFault::DoubleCompletion`]. Settlement after
//! an explicit `end()` is a no-op. Assertions recorded after completion are
//! kept, marked failed with [`TestFault::AfterEnd`].

use crate::assertion::{AssertionKind, AssertionResult};
use crate::compare;
use crate::error::TestFault;
use crate::registry::{Body, Mode, TestCase};
use crate::value::Value;
use regex::Regex;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::oneshot;
use tracing::warn;

/// What completed a test
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionSource {
    /// `end()` was called
    Explicit,
    /// The planned assertion count was reached
    Plan,
    /// The async body's future settled
    Settled,
    /// The runner gave up (timeout, panic, dropped handles)
    Runner,
}

/// Per-test state shared between the handle(s) and the runner
#[derive(Debug, Default)]
pub(crate) struct Record {
    pub(crate) results: Vec<AssertionResult>,
    pub(crate) plan: Option<usize>,
    pub(crate) completed_by: Option<CompletionSource>,
    pub(crate) subtests: Vec<TestCase>,
    /// Set once the runner has taken its snapshot; later writes are dropped
    pub(crate) closed: bool,
}

impl Record {
    /// Recorded assertions, excluding comments and standalone faults
    pub(crate) fn assertion_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| !matches!(r.kind, AssertionKind::Comment | AssertionKind::Fault))
            .count()
    }

    pub(crate) fn push_fault(&mut self, fault: TestFault) {
        self.results.push(AssertionResult::from_fault(fault));
    }
}

pub(crate) type SharedRecord = Arc<Mutex<Record>>;

pub(crate) fn lock(record: &SharedRecord) -> MutexGuard<'_, Record> {
    // A panicking body may poison the lock; the record itself stays consistent
    record.lock().unwrap_or_else(PoisonError::into_inner)
}

/// One-shot completion signal. Only the first `fire` reaches the runner.
struct Completion {
    tx: Mutex<Option<oneshot::Sender<CompletionSource>>>,
}

impl Completion {
    fn fire(&self, source: CompletionSource) {
        let sender = self
            .tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(tx) = sender {
            // The runner may have stopped waiting (timeout)
            let _ = tx.send(source);
        }
    }
}

struct TestInner {
    name: String,
    record: SharedRecord,
    completion: Completion,
}

/// Assertion context for one test.
///
/// Messages are optional: pass `""` to use the assertion's default message.
#[derive(Clone)]
pub struct Test {
    inner: Arc<TestInner>,
}

impl fmt::Debug for Test {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Test")
            .field("name", &self.inner.name)
            .finish_non_exhaustive()
    }
}

impl Test {
    /// Fresh context plus the runner's view of it: the shared record and the
    /// receiving end of the completion signal.
    pub(crate) fn new(
        name: impl Into<String>,
    ) -> (Self, SharedRecord, oneshot::Receiver<CompletionSource>) {
        let (tx, rx) = oneshot::channel();
        let record: SharedRecord = Arc::new(Mutex::new(Record::default()));
        let test = Test {
            inner: Arc::new(TestInner {
                name: name.into(),
                record: Arc::clone(&record),
                completion: Completion {
                    tx: Mutex::new(Some(tx)),
                },
            }),
        };
        (test, record, rx)
    }

    /// Name of the owning test
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// True once the test has completed
    pub fn is_ended(&self) -> bool {
        self.record().completed_by.is_some()
    }

    /// Assertions recorded so far (comments excluded)
    pub fn assertion_count(&self) -> usize {
        self.record().assertion_count()
    }

    fn record(&self) -> MutexGuard<'_, Record> {
        lock(&self.inner.record)
    }

    // ========================================================================
    // Equality
    // ========================================================================

    /// Strict equality: arrays and objects must be the same instance
    pub fn equal(&self, actual: impl Into<Value>, expected: impl Into<Value>, msg: &str) {
        self.compare(AssertionKind::Equal, actual, expected, msg, compare::strict_equal, false);
    }

    pub fn not_equal(&self, actual: impl Into<Value>, expected: impl Into<Value>, msg: &str) {
        self.compare(AssertionKind::NotEqual, actual, expected, msg, compare::strict_equal, true);
    }

    /// Coercive equality (`1` equals `"1"`)
    pub fn loose_equal(&self, actual: impl Into<Value>, expected: impl Into<Value>, msg: &str) {
        self.compare(AssertionKind::LooseEqual, actual, expected, msg, compare::loose_equal, false);
    }

    pub fn not_loose_equal(&self, actual: impl Into<Value>, expected: impl Into<Value>, msg: &str) {
        self.compare(AssertionKind::NotLooseEqual, actual, expected, msg, compare::loose_equal, true);
    }

    /// Structural equality with strict leaves
    pub fn deep_equal(&self, actual: impl Into<Value>, expected: impl Into<Value>, msg: &str) {
        self.compare(AssertionKind::DeepEqual, actual, expected, msg, compare::deep_equal, false);
    }

    pub fn not_deep_equal(&self, actual: impl Into<Value>, expected: impl Into<Value>, msg: &str) {
        self.compare(AssertionKind::NotDeepEqual, actual, expected, msg, compare::deep_equal, true);
    }

    /// Structural equality with loose leaves
    pub fn deep_loose_equal(&self, actual: impl Into<Value>, expected: impl Into<Value>, msg: &str) {
        self.compare(
            AssertionKind::DeepLooseEqual,
            actual,
            expected,
            msg,
            compare::deep_loose_equal,
            false,
        );
    }

    pub fn not_deep_loose_equal(
        &self,
        actual: impl Into<Value>,
        expected: impl Into<Value>,
        msg: &str,
    ) {
        self.compare(
            AssertionKind::NotDeepLooseEqual,
            actual,
            expected,
            msg,
            compare::deep_loose_equal,
            true,
        );
    }

    fn compare(
        &self,
        kind: AssertionKind,
        actual: impl Into<Value>,
        expected: impl Into<Value>,
        msg: &str,
        equal: fn(&Value, &Value) -> bool,
        negate: bool,
    ) {
        let actual = actual.into();
        let expected = expected.into();
        let passed = equal(&actual, &expected) != negate;
        self.record_assertion(kind, passed, msg, Some(actual), Some(expected));
    }

    // ========================================================================
    // Truthiness
    // ========================================================================

    /// Passes iff `value` is truthy
    pub fn ok(&self, value: impl Into<Value>, msg: &str) {
        let value = value.into();
        let passed = value.is_truthy();
        self.record_assertion(AssertionKind::Ok, passed, msg, Some(value), Some(Value::Bool(true)));
    }

    /// Passes iff `value` is falsy
    pub fn not_ok(&self, value: impl Into<Value>, msg: &str) {
        let value = value.into();
        let passed = !value.is_truthy();
        self.record_assertion(AssertionKind::NotOk, passed, msg, Some(value), Some(Value::Bool(false)));
    }

    // ========================================================================
    // Patterns
    // ========================================================================

    /// Passes iff the regular expression `pattern` matches `actual`.
    /// An invalid pattern fails the assertion.
    pub fn matches(&self, actual: &str, pattern: &str, msg: &str) {
        self.pattern(AssertionKind::Match, actual, pattern, msg, false);
    }

    /// Passes iff `pattern` does not match `actual`
    pub fn does_not_match(&self, actual: &str, pattern: &str, msg: &str) {
        self.pattern(AssertionKind::DoesNotMatch, actual, pattern, msg, true);
    }

    fn pattern(&self, kind: AssertionKind, actual: &str, pattern: &str, msg: &str, negate: bool) {
        let actual_value = Some(Value::from(actual));
        let pattern_value = Some(Value::from(pattern));
        match Regex::new(pattern) {
            Ok(re) => {
                let passed = re.is_match(actual) != negate;
                self.record_assertion(kind, passed, msg, actual_value, pattern_value);
            }
            Err(err) => {
                let message = if msg.is_empty() {
                    format!("invalid pattern: {}", err)
                } else {
                    format!("{} (invalid pattern: {})", msg, err)
                };
                self.record_assertion(kind, false, &message, actual_value, pattern_value);
            }
        }
    }

    // ========================================================================
    // Unconditional outcomes and comments
    // ========================================================================

    pub fn pass(&self, msg: &str) {
        self.record_assertion(AssertionKind::Pass, true, msg, None, None);
    }

    pub fn fail(&self, msg: &str) {
        self.record_assertion(AssertionKind::Fail, false, msg, None, None);
    }

    /// Informational message; never affects counts
    pub fn comment(&self, msg: &str) {
        let mut record = self.record();
        if record.closed {
            warn!(test = %self.inner.name, "comment after test was reported, dropped");
            return;
        }
        record.results.push(AssertionResult::comment(msg.to_string()));
    }

    // ========================================================================
    // Completion
    // ========================================================================

    /// Declare how many assertions the test will make. Reaching the count
    /// completes the test; any other final count is a failure.
    pub fn plan(&self, count: usize) {
        let reached = {
            let mut record = self.record();
            if record.closed {
                return;
            }
            if let Some(planned) = record.plan {
                record.push_fault(TestFault::PlanRedeclared { planned });
                return;
            }
            record.plan = Some(count);
            if record.completed_by.is_none() && record.assertion_count() >= count {
                record.completed_by = Some(CompletionSource::Plan);
                true
            } else {
                false
            }
        };
        if reached {
            self.inner.completion.fire(CompletionSource::Plan);
        }
    }

    /// Explicit completion signal
    pub fn end(&self) {
        if !self.complete(CompletionSource::Explicit) {
            self.record_fault(TestFault::DoubleCompletion);
        }
    }

    /// Implicit completion from a settled future; no-op if already complete
    pub(crate) fn settle(&self) {
        self.complete(CompletionSource::Settled);
    }

    /// Returns false if the test had already completed
    fn complete(&self, source: CompletionSource) -> bool {
        let first = {
            let mut record = self.record();
            if record.completed_by.is_some() {
                false
            } else {
                record.completed_by = Some(source);
                true
            }
        };
        if first {
            self.inner.completion.fire(source);
        }
        first
    }

    pub(crate) fn record_fault(&self, fault: TestFault) {
        let mut record = self.record();
        if record.closed {
            warn!(test = %self.inner.name, %fault, "fault after test was reported, dropped");
            return;
        }
        warn!(test = %self.inner.name, %fault, "test fault");
        record.push_fault(fault);
    }

    fn record_assertion(
        &self,
        kind: AssertionKind,
        passed: bool,
        msg: &str,
        actual: Option<Value>,
        expected: Option<Value>,
    ) {
        let message = (!msg.is_empty()).then(|| msg.to_string());
        let mut result = AssertionResult::new(kind, passed, message, actual, expected);

        let plan_reached = {
            let mut record = self.record();
            if record.closed {
                warn!(test = %self.inner.name, operator = kind.operator(), "assertion after test was reported, dropped");
                return;
            }
            if record.completed_by.is_some() {
                let fault = TestFault::AfterEnd {
                    operation: kind.operator().to_string(),
                };
                warn!(test = %self.inner.name, %fault, "test fault");
                result.passed = false;
                result.fault = Some(fault);
            }
            record.results.push(result);

            match record.plan {
                Some(planned)
                    if record.completed_by.is_none() && record.assertion_count() == planned =>
                {
                    record.completed_by = Some(CompletionSource::Plan);
                    true
                }
                _ => false,
            }
        };

        if plan_reached {
            self.inner.completion.fire(CompletionSource::Plan);
        }
    }

    // ========================================================================
    // Subtests
    // ========================================================================

    /// Queue a subtest. It runs with its own context right after this test completes.
    pub fn test<F>(&self, name: impl Into<String>, body: F)
    where
        F: FnOnce(Test) + Send + 'static,
    {
        self.queue_subtest(TestCase::new(name, Mode::Normal, Body::sync(body)));
    }

    /// Queue an async subtest
    pub fn test_async<F, Fut>(&self, name: impl Into<String>, body: F)
    where
        F: FnOnce(Test) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), String>> + Send + 'static,
    {
        self.queue_subtest(TestCase::new(name, Mode::Normal, Body::future(body)));
    }

    fn queue_subtest(&self, case: TestCase) {
        let mut record = self.record();
        if record.closed {
            warn!(test = %self.inner.name, subtest = %case.name, "subtest declared after test was reported, dropped");
            return;
        }
        record.subtests.push(case);
    }
}
