use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use shared::{
    domain::{Municipality, Region},
    error::{ServiceErrorBody, ServiceException},
    protocol::{TaxRequest, TaxResult},
};
use tracing::{debug, warn};

pub mod calculation;
mod collation;
pub mod config;
pub mod error;
pub mod format;
pub mod municipalities;
pub mod validation;

pub use calculation::{CalculationPhase, CalculationState, Settlement, TaxCalculation};
pub use config::{load_config, ApiConfig, ApiEndpoints};
pub use error::ApiClientError;
pub use municipalities::{MunicipalityState, MunicipalityStore};
pub use validation::{validate, CalculationRequests, FormFields, Validation, ValidationErrors};

/// The remote tax service. Calculation and reference data are treated as
/// opaque payloads; implementations only move them across the wire.
#[async_trait]
pub trait TaxApi: Send + Sync {
    async fn calculate(&self, request: &TaxRequest) -> Result<TaxResult, ApiClientError>;
    async fn list_municipalities(&self) -> Result<Vec<Municipality>, ApiClientError>;
    async fn list_regions(&self) -> Result<Vec<Region>, ApiClientError>;
}

pub struct HttpTaxApi {
    http: Client,
    endpoints: ApiEndpoints,
}

impl HttpTaxApi {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .context("failed to build http client")?;
        Ok(Self::with_client(http, config.endpoints()))
    }

    pub fn with_client(http: Client, endpoints: ApiEndpoints) -> Self {
        Self { http, endpoints }
    }

    pub fn endpoints(&self) -> &ApiEndpoints {
        &self.endpoints
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        url: &str,
    ) -> Result<T, ApiClientError> {
        let transport = |source| ApiClientError::Transport {
            url: url.to_string(),
            source,
        };

        let response = request.send().await.map_err(transport)?;
        let status = response.status();
        let body = response.bytes().await.map_err(transport)?;

        if !status.is_success() {
            let error_body = match serde_json::from_slice::<ServiceErrorBody>(&body) {
                Ok(error_body) => error_body,
                Err(err) => {
                    debug!(url, status = status.as_u16(), error = %err, "unstructured error body");
                    ServiceErrorBody::default()
                }
            };
            warn!(url, status = status.as_u16(), "tax service returned an error status");
            return Err(ServiceException::new(status.as_u16(), error_body).into());
        }

        serde_json::from_slice(&body).map_err(|source| ApiClientError::Decode {
            url: url.to_string(),
            source,
        })
    }
}

#[async_trait]
impl TaxApi for HttpTaxApi {
    async fn calculate(&self, request: &TaxRequest) -> Result<TaxResult, ApiClientError> {
        let url = &self.endpoints.tax_calculate;
        debug!(
            municipality_id = %request.municipality_id,
            church_member = request.church_member,
            is_pensioner = request.is_pensioner,
            "requesting tax calculation"
        );
        self.send_json(self.http.post(url).json(request), url).await
    }

    async fn list_municipalities(&self) -> Result<Vec<Municipality>, ApiClientError> {
        let url = &self.endpoints.municipalities;
        self.send_json(self.http.get(url), url).await
    }

    async fn list_regions(&self) -> Result<Vec<Region>, ApiClientError> {
        let url = &self.endpoints.regions;
        self.send_json(self.http.get(url), url).await
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
