// WMI Instrumentation Provider
// Windows-only; every other host reports UnsupportedPlatform

use async_trait::async_trait;

use hostprobe_core::domain::WmiQueryRequest;
use hostprobe_core::error::Result;
use hostprobe_core::port::{InstrumentationProvider, WmiRow};

/// Instrumentation provider for the local host.
///
/// On Windows the query runs against the WMI COM subsystem on a blocking
/// worker thread; the deadline/cancellation bound is composed by the
/// application service around this call.
#[derive(Default)]
pub struct HostWmiProvider;

impl HostWmiProvider {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(windows)]
mod windows_impl {
    use super::*;
    use std::collections::HashMap;

    use hostprobe_core::error::ProbeError;
    use wmi::{COMLibrary, Variant, WMIConnection};

    pub(super) fn run_query(namespace: &str, query: &str) -> Result<Vec<WmiRow>> {
        // COM must be initialized on the thread running the query
        let com = COMLibrary::new().map_err(|err| ProbeError::Query(err.to_string()))?;
        let connection = WMIConnection::with_namespace_path(namespace, com)
            .map_err(|err| ProbeError::Query(err.to_string()))?;

        let rows: Vec<HashMap<String, Variant>> = connection
            .raw_query(query)
            .map_err(|err| ProbeError::Query(err.to_string()))?;

        let mut converted = Vec::with_capacity(rows.len());
        for row in rows {
            let mut bag = WmiRow::new();
            for (name, value) in row {
                let json = serde_json::to_value(&value)
                    .unwrap_or_else(|_| serde_json::Value::String(format!("{:?}", value)));
                bag.insert(name, json);
            }
            converted.push(bag);
        }
        Ok(converted)
    }
}

#[async_trait]
impl InstrumentationProvider for HostWmiProvider {
    #[cfg(windows)]
    async fn query(&self, request: &WmiQueryRequest) -> Result<Vec<WmiRow>> {
        use hostprobe_core::error::ProbeError;

        let namespace = request.effective_namespace().to_string();
        let query = request.query.clone();
        tokio::task::spawn_blocking(move || windows_impl::run_query(&namespace, &query))
            .await
            .map_err(|err| ProbeError::Unknown(format!("query task failed: {}", err)))?
    }

    #[cfg(not(windows))]
    async fn query(&self, _request: &WmiQueryRequest) -> Result<Vec<WmiRow>> {
        Err(hostprobe_core::error::ProbeError::UnsupportedPlatform(
            "WMI instrumentation is only available on Windows".to_string(),
        ))
    }
}
