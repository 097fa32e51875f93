//! HTTP response assertions.

use axum_test::TestResponse;
use serde_json::Value;

/// Asserts that the response has the expected status code.
pub fn assert_status(response: &TestResponse, expected: u16) {
    let actual = response.status_code().as_u16();
    assert_eq!(
        actual,
        expected,
        "Expected status {}, got {}: {}",
        expected,
        actual,
        response.text()
    );
}

/// Asserts a problem response with the given status and error key.
pub fn assert_problem(response: &TestResponse, status: u16, error_key: &str) {
    assert_status(response, status);
    assert_eq!(
        response.header("content-type"),
        "application/problem+json",
        "Expected a problem+json body"
    );
    assert_eq!(
        response.header("x-tasks-error"),
        format!("error.{}", error_key).as_str()
    );

    let body = response.json::<Value>();
    assert_eq!(body["status"], status);
    assert_eq!(body["entityName"], "tasks");
    if error_key != "http" {
        assert_eq!(body["errorKey"], error_key);
    }
}

/// Asserts the alert headers of a successful write.
pub fn assert_alert(response: &TestResponse, alert: &str, id: i64) {
    assert_eq!(
        response.header("x-tasks-alert"),
        format!("tasksApp.tasks.{}", alert).as_str()
    );
    assert_eq!(response.header("x-tasks-params"), id.to_string().as_str());
}

/// Asserts the `X-Total-Count` header.
pub fn assert_total_count(response: &TestResponse, expected: u64) {
    assert_eq!(
        response.header("x-total-count"),
        expected.to_string().as_str()
    );
}

/// Asserts that the response carries no `X-Total-Count` header.
pub fn assert_no_total_count(response: &TestResponse) {
    assert!(
        !response.headers().contains_key("x-total-count"),
        "Unexpected X-Total-Count header"
    );
}
