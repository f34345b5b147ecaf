//! Client and test harness for the scanning microservices.
//!
//! # Overview
//! `JsonClient` performs one authenticated JSON exchange against a base URL
//! and turns the outcome into a decoded value or a typed `ClientError`.
//! `ScanHarness` drives the malware-scan and static-analysis services with
//! it, asserting a 200 for each case and pacing successive calls.
//!
//! # Design
//! - Requests and responses are plain data (`HttpRequest`, `HttpResponse`);
//!   a `Transport` does the I/O, so tests can observe requests directly.
//! - Clients and harnesses hold immutable configuration only.
//! - Calls are blocking and strictly sequential.

pub mod client;
pub mod config;
pub mod error;
pub mod harness;
pub mod http;
pub mod probe;
pub mod types;

pub use client::{parse_json, ClientConfig, JsonClient};
pub use config::{Credentials, HarnessConfig, ServiceEndpoint, SuiteFile};
pub use error::{ClientError, ConfigError, HarnessError};
pub use harness::{assert_status, CaseReport, CaseState, ScanHarness, SuiteReport, EXPECTED_STATUS};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport, UreqTransport};
pub use types::{AnalysisPayload, CaseLabel, Component, ScanPayload};
