//! End-to-end test harness for the scan and static-analysis services.
//!
//! # Design
//! A harness owns a `HarnessConfig` and a single transport. For every call it
//! builds a short-lived `JsonClient` pointed at the target service's base URL,
//! so the only state shared between calls is immutable configuration.
//!
//! Suites run strictly one case at a time: build the request, send it, assert
//! the status code, then sleep for the inter-call delay before the next case.
//! A case moves `Pending -> Sent -> Passed | Failed` once a response arrives,
//! or straight to `Failed` when no response does, and never retries. A failed
//! case is recorded and the suite continues with the next one.

use std::fmt;
use std::thread;
use std::time::Duration;

use tracing::{info, warn};

use crate::client::JsonClient;
use crate::config::{HarnessConfig, CLAMAV, KLOCWORK};
use crate::error::HarnessError;
use crate::http::{HttpRequest, HttpResponse, Transport, UreqTransport};
use crate::types::{AnalysisPayload, CaseLabel, ScanPayload};

/// Status code every submission is expected to return.
pub const EXPECTED_STATUS: u16 = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseState {
    Pending,
    Sent,
    Passed,
    Failed,
}

impl fmt::Display for CaseState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CaseState::Pending => "pending",
            CaseState::Sent => "sent",
            CaseState::Passed => "ok",
            CaseState::Failed => "FAILED",
        };
        f.write_str(s)
    }
}

/// Result of a single test case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseReport {
    pub index: usize,
    pub label: String,
    pub state: CaseState,
    /// Status code, if a response was received.
    pub status: Option<u16>,
    pub error: Option<String>,
}

impl CaseReport {
    fn pending(index: usize, label: String) -> Self {
        Self {
            index,
            label,
            state: CaseState::Pending,
            status: None,
            error: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuiteReport {
    pub suite: String,
    pub cases: Vec<CaseReport>,
}

impl SuiteReport {
    pub fn passed(&self) -> usize {
        self.cases.iter().filter(|c| c.state == CaseState::Passed).count()
    }

    pub fn failed(&self) -> usize {
        self.cases.iter().filter(|c| c.state == CaseState::Failed).count()
    }

    pub fn is_success(&self) -> bool {
        self.cases.iter().all(|c| c.state == CaseState::Passed)
    }
}

/// Fail with `AssertionFailed` unless `outcome` carries `expected`.
pub fn assert_status(outcome: &HttpResponse, expected: u16) -> Result<(), HarnessError> {
    if outcome.status == expected {
        return Ok(());
    }
    Err(HarnessError::AssertionFailed {
        expected,
        actual: outcome.status,
        body: outcome.text().into_owned(),
    })
}

pub struct ScanHarness<T = UreqTransport> {
    config: HarnessConfig,
    transport: T,
    inter_call_delay: Duration,
}

impl ScanHarness<UreqTransport> {
    pub fn new(config: HarnessConfig) -> Self {
        let transport = UreqTransport::new(config.insecure_skip_verify);
        Self::with_transport(config, transport)
    }
}

impl<T: Transport> ScanHarness<T> {
    pub fn with_transport(config: HarnessConfig, transport: T) -> Self {
        let inter_call_delay = config.inter_call_delay();
        Self {
            config,
            transport,
            inter_call_delay,
        }
    }

    pub fn with_inter_call_delay(mut self, delay: Duration) -> Self {
        self.inter_call_delay = delay;
        self
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    pub fn inter_call_delay(&self) -> Duration {
        self.inter_call_delay
    }

    /// Submit a scan request and return the raw outcome.
    pub fn submit_scan(&self, payload: &ScanPayload) -> Result<HttpResponse, HarnessError> {
        self.send(&self.scan_request(payload)?)
    }

    /// Submit a static-analysis request and return the raw outcome.
    pub fn submit_analysis(&self, payload: &AnalysisPayload) -> Result<HttpResponse, HarnessError> {
        self.send(&self.analysis_request(payload)?)
    }

    pub fn scan_request(&self, payload: &ScanPayload) -> Result<HttpRequest, HarnessError> {
        let endpoint = format!("/rest/clamav/scan/{}/", self.config.username);
        self.build(CLAMAV, &endpoint, payload)
    }

    pub fn analysis_request(&self, payload: &AnalysisPayload) -> Result<HttpRequest, HarnessError> {
        let endpoint = format!("/rest/klocwork/submit/{}/", self.config.username);
        self.build(KLOCWORK, &endpoint, payload)
    }

    pub fn run_scan_suite(&self, cases: &[ScanPayload]) -> SuiteReport {
        self.run_suite(CLAMAV, cases, |case| self.scan_request(case))
    }

    pub fn run_analysis_suite(&self, cases: &[AnalysisPayload]) -> SuiteReport {
        self.run_suite(KLOCWORK, cases, |case| self.analysis_request(case))
    }

    /// Run `cases` one after another, building each request with `build`.
    /// The inter-call delay follows every case whose request went out; a
    /// case that fails before sending does not pause the suite.
    pub fn run_suite<P, F>(&self, suite: &str, cases: &[P], mut build: F) -> SuiteReport
    where
        P: CaseLabel,
        F: FnMut(&P) -> Result<HttpRequest, HarnessError>,
    {
        let mut reports: Vec<CaseReport> = cases
            .iter()
            .enumerate()
            .map(|(index, case)| CaseReport::pending(index, case.label()))
            .collect();

        for (case, report) in cases.iter().zip(reports.iter_mut()) {
            let mut issued = false;
            let result = build(case).and_then(|request| {
                issued = true;
                let outcome = self.send(&request)?;
                report.state = CaseState::Sent;
                report.status = Some(outcome.status);
                assert_status(&outcome, EXPECTED_STATUS)
            });

            match result {
                Ok(()) => {
                    report.state = CaseState::Passed;
                    info!(suite, case = %report.label, "case passed");
                }
                Err(error) => {
                    report.state = CaseState::Failed;
                    warn!(suite, case = %report.label, %error, "case failed");
                    report.error = Some(error.to_string());
                }
            }

            if issued && !self.inter_call_delay.is_zero() {
                thread::sleep(self.inter_call_delay);
            }
        }

        SuiteReport {
            suite: suite.to_string(),
            cases: reports,
        }
    }

    fn build<P: serde::Serialize>(&self, service: &str, endpoint: &str, payload: &P) -> Result<HttpRequest, HarnessError> {
        let client = JsonClient::with_transport(self.config.client_config(service)?, &self.transport);
        Ok(client.build_post(endpoint, payload)?)
    }

    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, HarnessError> {
        tracing::debug!(url = %request.url, "submitting case");
        Ok(self.transport.execute(request)?)
    }
}
