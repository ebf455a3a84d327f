use crate::errors::ServiceError;
use serde_json::Value;
use std::time::Duration;
use tracing::{instrument, warn};

/// Proxy for the third-party product-lookup-by-barcode endpoint.
#[derive(Clone)]
pub struct BarcodeLookupService {
    client: reqwest::Client,
    lookup_url: Option<String>,
}

impl BarcodeLookupService {
    pub fn new(lookup_url: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        Self { client, lookup_url }
    }

    /// Look a barcode up upstream and forward the JSON body. Upstream
    /// failures surface as bad-gateway errors.
    #[instrument(skip(self))]
    pub async fn lookup(&self, code: &str) -> Result<Value, ServiceError> {
        let code = code.trim();
        if code.is_empty() {
            return Err(ServiceError::ValidationError("Empty barcode".into()));
        }

        let base = self.lookup_url.as_deref().ok_or_else(|| {
            ServiceError::InvalidOperation("Barcode lookup is not configured".into())
        })?;

        let url = format!("{}/{}", base.trim_end_matches('/'), code);
        let response = self.client.get(&url).send().await.map_err(|e| {
            warn!(error = %e, "barcode lookup request failed");
            ServiceError::ExternalServiceError(format!("barcode lookup failed: {}", e))
        })?;

        if !response.status().is_success() {
            return Err(ServiceError::ExternalServiceError(format!(
                "barcode lookup returned {}",
                response.status()
            )));
        }

        response.json::<Value>().await.map_err(|e| {
            ServiceError::ExternalServiceError(format!("barcode lookup returned invalid JSON: {}", e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unconfigured_lookup_is_an_invalid_operation() {
        let service = BarcodeLookupService::new(None);
        assert!(matches!(
            service.lookup("4006381333931").await,
            Err(ServiceError::InvalidOperation(_))
        ));
    }

    #[tokio::test]
    async fn empty_barcode_is_rejected() {
        let service = BarcodeLookupService::new(Some("http://localhost:9".into()));
        assert!(matches!(
            service.lookup("  ").await,
            Err(ServiceError::ValidationError(_))
        ));
    }
}
