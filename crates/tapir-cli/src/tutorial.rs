//! Built-in tutorial suite
//!
//! A guided tour of the harness. Some assertions fail on purpose to show
//! what failures look like, so a full run exits with code 1.

use std::time::Duration;
use tapir_runtime::{Registry, Value};

/// Position of `needle` in `haystack`, or -1
fn index_of(haystack: &[i64], needle: i64) -> i64 {
    haystack
        .iter()
        .position(|&item| item == needle)
        .map_or(-1, |i| i as i64)
}

fn sample_object() -> Value {
    Value::object([
        ("id", Value::from(1)),
        ("name", Value::from("a")),
        ("value", Value::from(true)),
    ])
}

pub fn registry() -> Registry {
    let mut registry = Registry::new();

    registry.test(
        "should return -1 when the value is not present in Array",
        |t| {
            t.equal(index_of(&[1, 2, 3], 4), -1, "");
            t.end();
        },
    );

    registry.test("comparing values inside an object", |t| {
        let object_1 = sample_object();
        let object_2 = sample_object();

        t.equal(
            object_1.clone(),
            object_2.clone(),
            "Should fail because will consider two different instances of the objects",
        );
        t.deep_equal(
            object_1,
            object_2,
            "Should pass evaluating both objects as if they were equal",
        );
        t.end();
    });

    registry.test("just to show different assertions", |t| {
        let value = true;
        let actual = 1;
        let expected = 2;

        t.ok(value, "descriptive message of the test");
        t.not_ok(value, "should fail because value is truthy");
        t.not_equal(actual, expected, "should pass because the compared values are different");
        t.loose_equal(actual, expected, "descriptive message of the test");
        t.not_loose_equal(actual, expected, "descriptive message of the test");
        t.deep_equal(actual, expected, "descriptive message of the test");
        t.not_deep_equal(actual, expected, "descriptive message of the test");
        t.deep_loose_equal(actual, expected, "descriptive message of the test");
        t.not_deep_loose_equal(actual, expected, "descriptive message of the test");
        t.comment("this method prints a message in the output without breaking the test output");
        t.matches("string", "regexp", "descriptive message of the test");
        t.does_not_match("string", "regexp", "descriptive message of the test");
        t.end();
    });

    registry.test("loose equality coerces", |t| {
        t.loose_equal(1, "1", "a number equals its string form");
        t.not_equal(1, "1", "but not strictly");
        t.deep_loose_equal(
            Value::array([1, 2]),
            Value::array(["1", "2"]),
            "elements compare loosely",
        );
        t.end();
    });

    registry.test("a plan ends the test", |t| {
        t.plan(2);
        t.ok(!Value::Null.is_truthy(), "null is falsy");
        t.ok(Value::array(Vec::<Value>::new()), "an empty array is truthy");
    });

    registry.test_async("a settled future ends the test", |t| async move {
        tokio::time::sleep(Duration::from_millis(10)).await;
        t.pass("resolved after a delay");
        Ok(())
    });

    registry.test("subtests run after their parent", |t| {
        t.pass("parent assertion");
        t.test("a subtest", |t| {
            t.matches("subtest", "^sub", "has its own context");
            t.end();
        });
        t.end();
    });

    registry.skip("skipped for now", |t| {
        t.fail("never runs");
        t.end();
    });

    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use tapir_runtime::TestRunner;

    #[test]
    fn test_index_of() {
        assert_eq!(index_of(&[1, 2, 3], 2), 1);
        assert_eq!(index_of(&[1, 2, 3], 4), -1);
        assert_eq!(index_of(&[], 4), -1);
    }

    #[test]
    fn test_tutorial_outcome() {
        let report = TestRunner::new().run_blocking(registry()).unwrap();
        let failed: Vec<&str> = report
            .tests
            .iter()
            .filter(|t| t.is_failed())
            .map(|t| t.name.as_str())
            .collect();

        assert_eq!(
            failed,
            vec![
                "comparing values inside an object",
                "just to show different assertions"
            ]
        );
        assert_eq!(report.skipped(), vec!["skipped for now"]);
        assert_eq!(report.exit_code(), 1);
    }
}
