//! Integration tests for the scanner
//!
//! These tests use wiremock to stand up mock sites and drive the real HTTP
//! fetcher, the input loaders and the full scan pipeline end-to-end.

mod fetch_tests;
mod scan_tests;
mod sources_tests;
