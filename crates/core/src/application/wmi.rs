// Instrumentation Query Service
// Composes the effective deadline and caller cancellation around the provider

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::domain::WmiQueryRequest;
use crate::error::{ProbeError, Result};
use crate::port::{InstrumentationProvider, WmiRow};

pub struct InstrumentationQueryService {
    provider: Arc<dyn InstrumentationProvider>,
}

impl InstrumentationQueryService {
    pub fn new(provider: Arc<dyn InstrumentationProvider>) -> Self {
        Self { provider }
    }

    /// Run the query under the request's effective timeout (5-minute
    /// default) and the caller's cancellation token, whichever fires first.
    pub async fn query(
        &self,
        request: &WmiQueryRequest,
        cancel: CancellationToken,
    ) -> Result<Vec<WmiRow>> {
        let deadline = request.effective_timeout();

        let rows = tokio::select! {
            _ = cancel.cancelled() => return Err(ProbeError::Cancelled),
            outcome = tokio::time::timeout(deadline, self.provider.query(request)) => {
                match outcome {
                    Ok(result) => result?,
                    Err(_) => return Err(ProbeError::Timeout(deadline.as_millis() as u64)),
                }
            }
        };

        info!(
            namespace = %request.effective_namespace(),
            rows = rows.len(),
            "instrumentation query completed"
        );
        Ok(rows)
    }
}
