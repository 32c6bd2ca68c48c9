// file: src/gateway/client.rs
// description: reqwest implementation of the backend gateway
// reference: https://docs.rs/reqwest

use super::Gateway;
use crate::config::GatewayConfig;
use crate::error::{FALLBACK_SERVER_DETAIL, PipelineError, Result};
use crate::models::{
    ErrorEnvelope, ExecuteResponse, FileHandle, HealthResponse, ProcessResponse, ResultResponse,
    ResultSet, StatusSnapshot, UploadResponse,
};
use crate::utils::validation::Validator;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

const API_PREFIX: &str = "/api/v1";

#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: Client,
    base_url: String,
}

impl HttpGateway {
    pub fn new(config: &GatewayConfig) -> Result<Self> {
        Validator::validate_url(&config.base_url)?;

        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| PipelineError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request.send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let body = response.bytes().await.unwrap_or_default();
        let err = server_error(status.as_u16(), &body);
        warn!("Backend responded with {}: {}", status, err.user_message());
        Err(err)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.endpoint(path);
        debug!("GET {}", url);
        let response = self.send(self.client.get(&url)).await?;
        decode(response).await
    }

    async fn post_json<T: DeserializeOwned>(&self, path: &str, file_id: &str) -> Result<T> {
        let url = self.endpoint(path);
        debug!("POST {}?file_id={}", url, file_id);
        let request = self.client.post(&url).query(&[("file_id", file_id)]);
        let response = self.send(request).await?;
        decode(response).await
    }
}

/// Builds the error for a non-2xx response from its raw body.
pub fn server_error(status: u16, body: &[u8]) -> PipelineError {
    let detail = serde_json::from_slice::<ErrorEnvelope>(body)
        .ok()
        .map(|envelope| envelope.detail)
        .filter(|detail| !detail.trim().is_empty())
        .unwrap_or_else(|| FALLBACK_SERVER_DETAIL.to_string());

    PipelineError::Server { status, detail }
}

fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    serde_json::from_slice(body).map_err(|e| {
        PipelineError::MalformedResponse(format!("unexpected response body: {}", e))
    })
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let body = response.bytes().await?;
    parse_body(&body)
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn health(&self) -> Result<HealthResponse> {
        self.get_json("/").await
    }

    async fn upload(&self, file: &FileHandle) -> Result<UploadResponse> {
        let bytes = file.read_bytes().await?;
        debug!("Uploading {} ({} bytes)", file.name(), bytes.len());

        let part = Part::bytes(bytes)
            .file_name(file.name().to_string())
            .mime_str("text/csv")
            .map_err(|e| PipelineError::Validation(format!("invalid mime type: {}", e)))?;
        let form = Form::new().part("file", part);

        let url = self.endpoint(&format!("{}/upload", API_PREFIX));
        let response = self.send(self.client.post(&url).multipart(form)).await?;
        let upload: UploadResponse = decode(response).await?;

        if upload.file_id.trim().is_empty() {
            return Err(PipelineError::MalformedResponse(
                "upload response carried an empty file_id".to_string(),
            ));
        }

        Ok(upload)
    }

    async fn request_processing(&self, file_id: &str) -> Result<ProcessResponse> {
        Validator::validate_file_id(file_id)?;
        self.post_json(&format!("{}/process", API_PREFIX), file_id)
            .await
    }

    async fn request_execution(&self, file_id: &str) -> Result<ExecuteResponse> {
        Validator::validate_file_id(file_id)?;
        self.post_json(&format!("{}/execute", API_PREFIX), file_id)
            .await
    }

    async fn fetch_status(&self, file_id: &str) -> Result<StatusSnapshot> {
        Validator::validate_file_id(file_id)?;
        self.get_json(&format!("{}/status/{}", API_PREFIX, file_id))
            .await
    }

    async fn fetch_result(&self, file_id: &str) -> Result<ResultSet> {
        Validator::validate_file_id(file_id)?;
        let response: ResultResponse = self
            .get_json(&format!("{}/result/{}", API_PREFIX, file_id))
            .await?;
        ResultSet::try_from(response)
    }

    async fn fetch_script(&self, file_id: &str) -> Result<String> {
        Validator::validate_file_id(file_id)?;
        let url = self.endpoint(&format!("{}/script/{}", API_PREFIX, file_id));
        let response = self.send(self.client.get(&url)).await?;
        Ok(response.text().await?)
    }

    async fn download(&self, file_id: &str) -> Result<Vec<u8>> {
        Validator::validate_file_id(file_id)?;
        let url = self.endpoint(&format!("{}/download/{}", API_PREFIX, file_id));
        let response = self.send(self.client.get(&url)).await?;
        Ok(response.bytes().await?.to_vec())
    }
}
