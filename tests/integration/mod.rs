//! Integration test suites

pub mod http_chat_test;
pub mod ingest_test;
pub mod session_test;
