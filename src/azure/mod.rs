//! Azure Resource Manager backend.
//!
//! Resources are addressed by their ARM resource ID, which doubles as the
//! request path. Creation is a `PUT` whose long-running operation is polled
//! to completion before the call returns.

mod auth;
mod error;
mod operation;
mod wire;

use std::sync::{Arc, LazyLock};
use std::time::Duration;

use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;
use uuid::Uuid;

use crate::backend::{Backend, BackendFuture, Lookup};
use crate::config::AzureConfig;
use crate::resources::{Resource, ResourceKind, ResourceRef, ResourceSpec};
use auth::TokenSource;
use operation::OperationState;
use wire::{ErrorDetail, ErrorEnvelope, RequestBody};

pub use error::AzureBackendError;

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);
const POLL_INTERVAL: Duration = Duration::from_secs(5);
const OPERATION_TIMEOUT: Duration = Duration::from_secs(600);

const RESOURCE_GROUP_API_VERSION: &str = "2021-04-01";
const NETWORK_API_VERSION: &str = "2023-09-01";
const COMPUTE_API_VERSION: &str = "2023-09-01";

const CLIENT_REQUEST_ID_HEADER: &str = "x-ms-client-request-id";
const ASYNC_OPERATION_HEADER: &str = "azure-asyncoperation";

static HTTP_CLIENT: LazyLock<reqwest::Client> = LazyLock::new(|| {
    reqwest::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
});

/// Backend that provisions resources through the Azure Resource Manager REST
/// API.
#[derive(Clone, Debug)]
pub struct AzureBackend {
    subscription_id: String,
    endpoint: String,
    tokens: Arc<TokenSource>,
    poll_interval: Duration,
    operation_timeout: Duration,
}

impl AzureBackend {
    /// Builds a backend from validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`AzureBackendError::Config`] when the configuration is
    /// incomplete.
    pub fn new(config: &AzureConfig) -> Result<Self, AzureBackendError> {
        config.validate()?;
        let source = config.credential_source()?;
        Ok(Self {
            subscription_id: config.subscription_id.trim().to_owned(),
            endpoint: config
                .resource_manager_endpoint
                .trim()
                .trim_end_matches('/')
                .to_owned(),
            tokens: Arc::new(TokenSource::new(
                source,
                config.authority_host.trim(),
                config.resource_manager_endpoint.trim(),
            )),
            poll_interval: POLL_INTERVAL,
            operation_timeout: OPERATION_TIMEOUT,
        })
    }

    /// Overrides the long-running operation polling interval.
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Overrides the long-running operation deadline.
    #[must_use]
    pub const fn with_operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = timeout;
        self
    }

    fn resource_url(&self, target: &ResourceRef) -> String {
        format!(
            "{}{}?api-version={}",
            self.endpoint,
            target.resource_id(&self.subscription_id),
            api_version(target.kind)
        )
    }

    /// Sends a request without interpreting the status code.
    async fn send_raw(
        &self,
        request: RequestBuilder,
        target: &ResourceRef,
    ) -> Result<Response, AzureBackendError> {
        let token = self.tokens.bearer().await?;
        let request_id = Uuid::new_v4();
        debug!(resource = %target, %request_id, "sending request");

        let response = request
            .bearer_auth(token)
            .header(CLIENT_REQUEST_ID_HEADER, request_id.to_string())
            .send()
            .await?;
        debug!(resource = %target, %request_id, status = %response.status(), "received response");
        Ok(response)
    }

    async fn send(
        &self,
        request: RequestBuilder,
        target: &ResourceRef,
    ) -> Result<Response, AzureBackendError> {
        let response = self.send_raw(request, target).await?;
        Self::check(response).await
    }

    async fn check(response: Response) -> Result<Response, AzureBackendError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<ErrorEnvelope>(&body).map_or_else(
            |_| ErrorDetail {
                code: String::new(),
                message: body.trim().to_owned(),
            },
            |envelope| envelope.error,
        );

        if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            let message = if detail.code.is_empty() {
                format!("{status}: {}", detail.message)
            } else {
                format!("{status} {}: {}", detail.code, detail.message)
            };
            return Err(AzureBackendError::Authentication { message });
        }

        Err(AzureBackendError::Api {
            status: status.as_u16(),
            code: detail.code,
            message: detail.message,
        })
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, AzureBackendError> {
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|err| AzureBackendError::Decode {
            message: err.to_string(),
        })
    }

    async fn fetch(&self, target: &ResourceRef) -> Result<Lookup, AzureBackendError> {
        let response = self
            .send_raw(HTTP_CLIENT.get(self.resource_url(target)), target)
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(Lookup::NotFound);
        }
        let checked = Self::check(response).await?;
        Self::decode(checked).await.map(Lookup::Found)
    }

    async fn put(
        &self,
        target: &ResourceRef,
        spec: &ResourceSpec,
    ) -> Result<Resource, AzureBackendError> {
        let body = RequestBody::from(spec);
        let response = self
            .send(HTTP_CLIENT.put(self.resource_url(target)).json(&body), target)
            .await?;

        let status_url = response
            .headers()
            .get(ASYNC_OPERATION_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        if let Some(url) = status_url {
            self.await_operation(&url, target).await?;
            return self.await_provisioned(target).await;
        }
        if response.status() == StatusCode::ACCEPTED {
            return self.await_provisioned(target).await;
        }

        let resource: Resource = Self::decode(response).await?;
        if OperationState::of(&resource) == OperationState::Succeeded {
            return Ok(resource);
        }
        self.await_provisioned(target).await
    }
}

const fn api_version(kind: ResourceKind) -> &'static str {
    match kind {
        ResourceKind::ResourceGroup => RESOURCE_GROUP_API_VERSION,
        ResourceKind::VirtualMachine => COMPUTE_API_VERSION,
        ResourceKind::NetworkSecurityGroup
        | ResourceKind::SecurityRule
        | ResourceKind::VirtualNetwork
        | ResourceKind::Subnet
        | ResourceKind::PublicIpAddress
        | ResourceKind::NetworkInterface => NETWORK_API_VERSION,
    }
}

impl Backend for AzureBackend {
    type Error = AzureBackendError;

    fn get<'a>(&'a self, target: &'a ResourceRef) -> BackendFuture<'a, Lookup, Self::Error> {
        Box::pin(self.fetch(target))
    }

    fn create_or_update<'a>(
        &'a self,
        target: &'a ResourceRef,
        spec: &'a ResourceSpec,
    ) -> BackendFuture<'a, Resource, Self::Error> {
        Box::pin(self.put(target, spec))
    }
}
