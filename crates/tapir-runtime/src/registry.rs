//! Test registry - declare now, run later
//!
//! Test cases are appended in declaration order, which is also execution order.
//! Names are display-only: duplicates are allowed and all of them run.

use crate::context::Test;
use futures_util::future::{BoxFuture, FutureExt};
use std::fmt;
use std::future::Future;

/// How the runner treats a test case
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Runs unless an exclusive test exists
    Normal,
    /// Never runs; always reported as skipped
    Skipped,
    /// When any exclusive test exists, only exclusive tests run
    Exclusive,
}

/// Synchronous body: completes through `end()` or a fulfilled plan
pub type SyncBody = Box<dyn FnOnce(Test) + Send + 'static>;

/// Asynchronous body: completes when the returned future settles
pub type AsyncBody = Box<dyn FnOnce(Test) -> BoxFuture<'static, Result<(), String>> + Send + 'static>;

/// A test body in either flavour
pub enum Body {
    Sync(SyncBody),
    Async(AsyncBody),
}

impl Body {
    pub(crate) fn sync<F>(body: F) -> Self
    where
        F: FnOnce(Test) + Send + 'static,
    {
        Body::Sync(Box::new(body))
    }

    pub(crate) fn future<F, Fut>(body: F) -> Self
    where
        F: FnOnce(Test) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), String>> + Send + 'static,
    {
        Body::Async(Box::new(move |t| body(t).boxed()))
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Body::Sync(_) => write!(f, "Body::Sync(<closure>)"),
            Body::Async(_) => write!(f, "Body::Async(<closure>)"),
        }
    }
}

/// A declared test. Immutable after creation.
#[derive(Debug)]
pub struct TestCase {
    pub(crate) name: String,
    pub(crate) mode: Mode,
    pub(crate) body: Body,
}

impl TestCase {
    pub fn new(name: impl Into<String>, mode: Mode, body: Body) -> Self {
        Self {
            name: name.into(),
            mode,
            body,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }
}

/// Ordered collection of declared tests
#[derive(Debug, Default)]
pub struct Registry {
    cases: Vec<TestCase>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a test whose body ends it with `t.end()` (or a plan)
    pub fn test<F>(&mut self, name: impl Into<String>, body: F) -> &mut Self
    where
        F: FnOnce(Test) + Send + 'static,
    {
        self.push(TestCase::new(name, Mode::Normal, Body::sync(body)))
    }

    /// Declare a test that ends when its future settles
    pub fn test_async<F, Fut>(&mut self, name: impl Into<String>, body: F) -> &mut Self
    where
        F: FnOnce(Test) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), String>> + Send + 'static,
    {
        self.push(TestCase::new(name, Mode::Normal, Body::future(body)))
    }

    /// Declare an exclusive test
    pub fn only<F>(&mut self, name: impl Into<String>, body: F) -> &mut Self
    where
        F: FnOnce(Test) + Send + 'static,
    {
        self.push(TestCase::new(name, Mode::Exclusive, Body::sync(body)))
    }

    /// Declare an exclusive async test
    pub fn only_async<F, Fut>(&mut self, name: impl Into<String>, body: F) -> &mut Self
    where
        F: FnOnce(Test) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), String>> + Send + 'static,
    {
        self.push(TestCase::new(name, Mode::Exclusive, Body::future(body)))
    }

    /// Declare a test that is reported as skipped and never run
    pub fn skip<F>(&mut self, name: impl Into<String>, body: F) -> &mut Self
    where
        F: FnOnce(Test) + Send + 'static,
    {
        self.push(TestCase::new(name, Mode::Skipped, Body::sync(body)))
    }

    /// Declare a skipped async test
    pub fn skip_async<F, Fut>(&mut self, name: impl Into<String>, body: F) -> &mut Self
    where
        F: FnOnce(Test) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), String>> + Send + 'static,
    {
        self.push(TestCase::new(name, Mode::Skipped, Body::future(body)))
    }

    /// Append a prepared test case
    pub fn push(&mut self, case: TestCase) -> &mut Self {
        self.cases.push(case);
        self
    }

    /// Keep only tests whose name contains `pattern`
    pub fn filter(mut self, pattern: &str) -> Self {
        self.cases.retain(|case| case.name.contains(pattern));
        self
    }

    /// True if any test was declared exclusive
    pub fn has_exclusive(&self) -> bool {
        self.cases.iter().any(|case| case.mode == Mode::Exclusive)
    }

    /// Declared names, in order
    pub fn names(&self) -> Vec<&str> {
        self.cases.iter().map(|case| case.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    pub(crate) fn into_cases(self) -> Vec<TestCase> {
        self.cases
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insertion_order_and_duplicates() {
        let mut registry = Registry::new();
        registry
            .test("first", |t| t.end())
            .test("second", |t| t.end())
            .test("first", |t| t.end());

        assert_eq!(registry.names(), vec!["first", "second", "first"]);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_modes() {
        let mut registry = Registry::new();
        registry
            .test("normal", |t| t.end())
            .skip("skipped", |t| t.end())
            .only_async("exclusive", |_t| async { Ok(()) });

        let modes: Vec<Mode> = registry.into_cases().iter().map(TestCase::mode).collect();
        assert_eq!(modes, vec![Mode::Normal, Mode::Skipped, Mode::Exclusive]);
    }

    #[test]
    fn test_has_exclusive() {
        let mut registry = Registry::new();
        registry.test("a", |t| t.end());
        assert!(!registry.has_exclusive());
        registry.only("b", |t| t.end());
        assert!(registry.has_exclusive());
    }

    #[test]
    fn test_filter() {
        let mut registry = Registry::new();
        registry
            .test("parse numbers", |t| t.end())
            .test("parse strings", |t| t.end())
            .test("render", |t| t.end());

        let filtered = registry.filter("parse");
        assert_eq!(filtered.names(), vec!["parse numbers", "parse strings"]);
    }
}
