//! OpenAI-compatible embedding API client.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{ClientError, build_http_client, ensure_success};
use crate::domain::providers::EmbeddingProvider;
use crate::error::AppError;

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

/// Client for `POST {base_url}/v1/embeddings`.
///
/// Works with any server speaking the OpenAI embeddings schema (text-embeddings-inference,
/// llama.cpp, vLLM and the hosted API).
pub struct EmbeddingApiClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl std::fmt::Debug for EmbeddingApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingApiClient")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .finish()
    }
}

impl EmbeddingApiClient {
    pub fn new(
        base_url: &str,
        model: &str,
        api_key: Option<&str>,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        Ok(Self {
            client: build_http_client(timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.map(String::from),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub async fn create_embedding(&self, text: &str) -> Result<Vec<f32>, ClientError> {
        let mut request = self
            .client
            .post(format!("{}/v1/embeddings", self.base_url))
            .json(&EmbeddingRequest {
                model: &self.model,
                input: text,
            });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let body: EmbeddingResponse = ensure_success(request.send().await?)
            .await?
            .json()
            .await
            .map_err(|e| ClientError::InvalidResponse(format!("embedding response: {e}")))?;

        let vector = body
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| ClientError::InvalidResponse("no embedding returned".into()))?;

        if vector.is_empty() {
            return Err(ClientError::InvalidResponse("empty embedding vector".into()));
        }
        Ok(vector)
    }
}

#[async_trait]
impl EmbeddingProvider for EmbeddingApiClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, AppError> {
        Ok(self.create_embedding(text).await?)
    }
}
