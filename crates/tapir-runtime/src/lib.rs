//! Tapir Runtime - a tape-style test harness
//!
//! This library provides:
//! - A value model with identity for arrays and objects
//! - A registry of named tests (normal, skipped, exclusive)
//! - The `Test` assertion context handed to each body
//! - A sequential runner with per-test timeouts and fault isolation
//! - Reports rendered as TAP version 13 or JSON
//!
//! ```no_run
//! use tapir_runtime::{Registry, TestRunner};
//!
//! let mut registry = Registry::new();
//! registry.test("indexOf misses", |t| {
//!     t.equal(-1, -1, "not found");
//!     t.end();
//! });
//!
//! let report = TestRunner::new().run_blocking(registry).unwrap();
//! print!("{}", tapir_runtime::report::tap::render(&report));
//! ```

/// Tapir runtime version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod assertion;
pub mod compare;
pub mod context;
pub mod error;
pub mod registry;
pub mod report;
pub mod runner;
pub mod value;

// Re-export commonly used types
pub use assertion::{AssertionKind, AssertionResult};
pub use context::{CompletionSource, Test};
pub use error::{RunError, TestFault};
pub use registry::{Body, Mode, Registry, TestCase};
pub use report::{Report, Summary, TestReport, TestStatus};
pub use runner::TestRunner;
pub use value::{Value, ValueArray, ValueObject};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_smoke() {
        assert_eq!(VERSION, "0.1.0");
    }
}
