// Instrumentation Provider Port
// Abstraction over the host's management-instrumentation subsystem (WMI)

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::domain::WmiQueryRequest;
use crate::error::Result;

/// One result row: property name -> value
pub type WmiRow = BTreeMap<String, serde_json::Value>;

/// Instrumentation provider trait
///
/// The deadline/cancellation bound is composed by the application service;
/// implementations only run the query.
///
/// # Errors
/// - `ProbeError::Query` for a malformed query or an engine-reported fault
/// - `ProbeError::UnsupportedPlatform` where the subsystem is absent
#[async_trait]
pub trait InstrumentationProvider: Send + Sync {
    async fn query(&self, request: &WmiQueryRequest) -> Result<Vec<WmiRow>>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::time::Duration;

    use crate::error::ProbeError;

    /// Mock provider behavior
    pub enum MockBehavior {
        /// Return the given rows
        Rows(Vec<WmiRow>),
        /// Fail with a query error
        Fail(String),
        /// Sleep forever (for deadline tests)
        Hang,
    }

    pub struct MockInstrumentationProvider {
        behavior: MockBehavior,
    }

    impl MockInstrumentationProvider {
        pub fn new(behavior: MockBehavior) -> Self {
            Self { behavior }
        }
    }

    #[async_trait]
    impl InstrumentationProvider for MockInstrumentationProvider {
        async fn query(&self, _request: &WmiQueryRequest) -> Result<Vec<WmiRow>> {
            match &self.behavior {
                MockBehavior::Rows(rows) => Ok(rows.clone()),
                MockBehavior::Fail(msg) => Err(ProbeError::Query(msg.clone())),
                MockBehavior::Hang => {
                    loop {
                        tokio::time::sleep(Duration::from_secs(3600)).await;
                    }
                }
            }
        }
    }
}
