//! Integration tests for as3.
//!
//! These tests require LocalStack to be running. They are marked as `#[ignore]`
//! by default to avoid running them in CI without proper setup.
//!
//! ## Running Integration Tests
//!
//! 1. Start LocalStack:
//!    ```bash
//!    docker run -d -p 4566:4566 localstack/localstack
//!    ```
//!
//! 2. Run the integration tests:
//!    ```bash
//!    LOCALSTACK_ENDPOINT=http://localhost:4566 cargo test -p integration-tests -- --ignored
//!    ```

mod common;
mod crawler_test;
