//! Test runner - execute registered tests one at a time
//!
//! Each test gets a fresh [`Test`] context. The runner waits for that test's
//! completion (or the timeout) before starting the next one, then runs any
//! subtests the body queued, depth-first.

use crate::assertion::AssertionResult;
use crate::context::{lock, CompletionSource, SharedRecord, Test};
use crate::error::{RunError, TestFault};
use crate::registry::{AsyncBody, Body, Mode, Registry, SyncBody, TestCase};
use crate::report::{Report, TestReport};
use futures_util::FutureExt;
use std::any::Any;
use std::collections::VecDeque;
use std::mem;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::{Duration, Instant};
use tapir_config::{Config, DEFAULT_TIMEOUT_MS};
use tokio::sync::oneshot;
use tracing::{debug, warn};

/// Sequential test runner
#[derive(Debug, Clone)]
pub struct TestRunner {
    /// Upper bound on how long a single test may take to complete
    timeout: Duration,
}

impl Default for TestRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl TestRunner {
    pub fn new() -> Self {
        Self {
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }

    /// Set the per-test timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Runner configured from loaded settings
    pub fn from_config(config: &Config) -> Self {
        Self::new().with_timeout(config.timeout())
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run every test in the registry on a fresh current-thread runtime
    pub fn run_blocking(&self, registry: Registry) -> Result<Report, RunError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        Ok(runtime.block_on(self.run(registry)))
    }

    /// Run every test in the registry, in declaration order.
    ///
    /// When any test is exclusive, non-exclusive top-level tests are reported
    /// as skipped. Subtests always run.
    pub async fn run(&self, registry: Registry) -> Report {
        let exclusive = registry.has_exclusive();
        let mut queue: VecDeque<(TestCase, usize)> = registry
            .into_cases()
            .into_iter()
            .map(|case| (case, 0))
            .collect();
        let mut tests = Vec::new();

        while let Some((case, depth)) = queue.pop_front() {
            let skip = case.mode == Mode::Skipped
                || (exclusive && depth == 0 && case.mode != Mode::Exclusive);
            if skip {
                debug!(test = %case.name, "skipping");
                tests.push(TestReport::skipped(case.name, depth));
                continue;
            }

            let (report, subtests) = self.run_case(case, depth).await;
            tests.push(report);
            for subtest in subtests.into_iter().rev() {
                queue.push_front((subtest, depth + 1));
            }
        }

        Report::new(tests)
    }

    async fn run_case(&self, case: TestCase, depth: usize) -> (TestReport, Vec<TestCase>) {
        let TestCase { name, body, .. } = case;
        debug!(test = %name, depth, "starting");
        let start = Instant::now();
        let (test, record, completion) = Test::new(name.clone());

        match body {
            Body::Sync(body) => self.run_sync(body, test, &record, completion).await,
            Body::Async(body) => self.run_async(body, test, &record).await,
        }

        let (assertions, subtests) = close(&record);
        let duration = start.elapsed();
        debug!(test = %name, ?duration, assertions = assertions.len(), "finished");
        (
            TestReport::completed(name, depth, assertions, duration),
            subtests,
        )
    }

    async fn run_sync(
        &self,
        body: SyncBody,
        test: Test,
        record: &SharedRecord,
        completion: oneshot::Receiver<CompletionSource>,
    ) {
        if let Err(payload) = catch_unwind(AssertUnwindSafe(move || body(test))) {
            record_fault(
                record,
                TestFault::Panicked {
                    message: panic_message(payload.as_ref()),
                },
            );
            return;
        }

        match tokio::time::timeout(self.timeout, completion).await {
            Ok(Ok(source)) => debug!(?source, "completed"),
            // Every handle was dropped without completing
            Ok(Err(_)) => record_fault(record, TestFault::ExitedWithoutEnd),
            Err(_) => record_fault(record, self.timeout_fault()),
        }
    }

    async fn run_async(&self, body: AsyncBody, test: Test, record: &SharedRecord) {
        let task_test = test.clone();
        let task = tokio::spawn(async move {
            let outcome = AssertUnwindSafe(async move { body(test).await })
                .catch_unwind()
                .await;
            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(reason)) => task_test.record_fault(TestFault::UnhandledRejection { reason }),
                Err(payload) => task_test.record_fault(TestFault::Panicked {
                    message: panic_message(payload.as_ref()),
                }),
            }
            task_test.settle();
        });

        match tokio::time::timeout(self.timeout, task).await {
            Ok(Ok(())) => {}
            Ok(Err(join_error)) => record_fault(
                record,
                TestFault::Panicked {
                    message: join_error.to_string(),
                },
            ),
            // The task stays detached on the runtime
            Err(_) => record_fault(record, self.timeout_fault()),
        }
    }

    fn timeout_fault(&self) -> TestFault {
        TestFault::Timeout {
            after_ms: self.timeout.as_millis() as u64,
        }
    }
}

/// Close the record and take its contents. Checks the plan first.
fn close(record: &SharedRecord) -> (Vec<AssertionResult>, Vec<TestCase>) {
    let mut record = lock(record);
    if let Some(planned) = record.plan {
        let actual = record.assertion_count();
        if actual != planned {
            let fault = TestFault::PlanMismatch { planned, actual };
            warn!(%fault, "test fault");
            record.push_fault(fault);
        }
    }
    if record.completed_by.is_none() {
        record.completed_by = Some(CompletionSource::Runner);
    }
    record.closed = true;
    (mem::take(&mut record.results), mem::take(&mut record.subtests))
}

fn record_fault(record: &SharedRecord, fault: TestFault) {
    warn!(%fault, "test fault");
    lock(record).push_fault(fault);
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::TestStatus;

    fn run(registry: Registry) -> Report {
        TestRunner::new()
            .with_timeout(Duration::from_millis(200))
            .run_blocking(registry)
            .unwrap()
    }

    #[test]
    fn test_runner_pass() {
        let mut registry = Registry::new();
        registry.test("simple", |t| {
            t.ok(true, "should pass");
            t.end();
        });

        let report = run(registry);
        assert_eq!(report.tests[0].status, TestStatus::Passed);
        assert_eq!(report.summary.total, 1);
    }

    #[test]
    fn test_runner_panic() {
        let mut registry = Registry::new();
        registry
            .test("boom", |_t| panic!("kaboom"))
            .test("after", |t| t.end());

        let report = run(registry);
        assert_eq!(
            report.tests[0].assertions[0].fault,
            Some(TestFault::Panicked {
                message: "kaboom".to_string()
            })
        );
        assert_eq!(report.tests[1].status, TestStatus::Passed);
    }

    #[test]
    fn test_dropped_handle_without_end() {
        let mut registry = Registry::new();
        registry.test("forgot", |t| t.pass("only assertion"));

        let report = run(registry);
        assert_eq!(
            report.tests[0].assertions[1].fault,
            Some(TestFault::ExitedWithoutEnd)
        );
    }

    #[test]
    fn test_pending_handle_times_out() {
        let mut registry = Registry::new();
        registry.test("held", |t| {
            // Keep a handle alive on the runtime without ever ending
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_secs(60)).await;
                drop(t);
            });
        });

        let report = run(registry);
        assert_eq!(
            report.tests[0].assertions[0].fault,
            Some(TestFault::Timeout { after_ms: 200 })
        );
    }

    #[test]
    fn test_panic_message_payloads() {
        assert_eq!(panic_message(&"static"), "static");
        assert_eq!(panic_message(&"owned".to_string()), "owned");
        assert_eq!(panic_message(&42), "non-string panic payload");
    }
}
