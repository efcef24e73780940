// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Text completion through the Gemini `generateContent` endpoint.
//!
//! Request building and response parsing are plain functions over serde types so
//! they can be tested without a network; [`GeminiClient`] only adds transport,
//! credentials and the per-call timeout.

use std::path::Path;
use std::time::Instant;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::config::consts::GEMINI_API_KEY_VAR;
use crate::config::ModelConfig;
use crate::engine::RunContext;
use crate::errors::ServiceError;
use crate::observability::messages::service::{
    CompletionReceived, CompletionRequested, ServiceCallFailed,
};
use crate::observability::messages::StructuredLog;
use crate::traits::{CompletionRequest, TextCompleter};

const SERVICE: &str = "gemini";

/// Appended to every prompt.
pub const MARKDOWN_INSTRUCTION: &str = "\n always answer using markdown format.";

#[derive(Debug, Serialize)]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    pub generation_config: GenerationConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<Tool>>,
}

#[derive(Debug, Serialize)]
pub struct Content {
    pub role: &'static str,
    pub parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Part {
    Text { text: String },
    InlineData { inline_data: InlineData },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InlineData {
    pub mime_type: &'static str,
    pub data: String,
}

#[derive(Debug, Serialize)]
pub struct GenerationConfig {
    pub temperature: f32,
    #[serde(rename = "maxOutputTokens", skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
}

#[derive(Debug, Default, Serialize)]
pub struct Tool {
    pub google_search: GoogleSearch,
}

#[derive(Debug, Default, Serialize)]
pub struct GoogleSearch {}

#[derive(Debug, Default, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<CandidateContent>,
    #[serde(rename = "groundingMetadata", default)]
    pub grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ResponsePart {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct GroundingMetadata {
    #[serde(rename = "groundingChunks", default)]
    pub grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Debug, Default, Deserialize)]
pub struct GroundingChunk {
    #[serde(default)]
    pub web: Option<WebSource>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WebSource {
    #[serde(default)]
    pub uri: String,
    #[serde(default)]
    pub title: String,
}

/// MIME type for an image attachment, by extension (case-insensitive).
pub fn mime_type_for(path: &Path) -> Result<&'static str, ServiceError> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "jpg" | "jpeg" => Ok("image/jpeg"),
        "png" => Ok("image/png"),
        "webp" => Ok("image/webp"),
        "heic" => Ok("image/heic"),
        "heif" => Ok("image/heif"),
        _ => Err(ServiceError::UnsupportedImage {
            path: path.display().to_string(),
            extension,
        }),
    }
}

/// Read and base64-encode one image attachment.
pub async fn load_inline_image(path: &Path) -> Result<InlineData, ServiceError> {
    let mime_type = mime_type_for(path)?;
    let bytes = tokio::fs::read(path).await.map_err(|source| ServiceError::Io {
        path: path.display().to_string(),
        source,
    })?;
    Ok(InlineData {
        mime_type,
        data: STANDARD.encode(bytes),
    })
}

pub fn build_request(
    prompt: &str,
    images: Vec<InlineData>,
    use_search_grounding: bool,
    model: &ModelConfig,
) -> GenerateContentRequest {
    let mut parts = vec![Part::Text {
        text: format!("{}{}", prompt, MARKDOWN_INSTRUCTION),
    }];
    parts.extend(
        images
            .into_iter()
            .map(|inline_data| Part::InlineData { inline_data }),
    );

    GenerateContentRequest {
        contents: vec![Content {
            role: "user",
            parts,
        }],
        generation_config: GenerationConfig {
            temperature: model.temperature,
            max_output_tokens: model.max_tokens,
        },
        tools: use_search_grounding.then(|| vec![Tool::default()]),
    }
}

/// The first candidate's first text part, with grounding sources appended as a
/// numbered list. Returns the text and the number of sources.
pub fn extract_answer(response: GenerateContentResponse) -> Result<(String, usize), ServiceError> {
    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or(ServiceError::EmptyResponse { service: SERVICE })?;

    let answer = candidate
        .content
        .and_then(|content| content.parts.into_iter().next())
        .and_then(|part| part.text)
        .ok_or(ServiceError::EmptyResponse { service: SERVICE })?;

    let sources: Vec<WebSource> = candidate
        .grounding_metadata
        .map(|metadata| metadata.grounding_chunks)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|chunk| chunk.web)
        .collect();

    if sources.is_empty() {
        return Ok((answer, 0));
    }

    let mut text = answer;
    text.push_str("\n\n---\n**Sources:**\n");
    for (i, source) in sources.iter().enumerate() {
        text.push_str(&format!("{}. {} ({})\n", i + 1, source.title, source.uri));
    }
    Ok((text, sources.len()))
}

pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
        }
    }

    pub fn from_env() -> Result<Self, ServiceError> {
        match std::env::var(GEMINI_API_KEY_VAR) {
            Ok(key) if !key.trim().is_empty() => Ok(Self::new(key)),
            _ => Err(ServiceError::MissingCredential {
                var: GEMINI_API_KEY_VAR,
            }),
        }
    }

    async fn send(
        &self,
        url: &str,
        body: &GenerateContentRequest,
    ) -> Result<(String, usize), ServiceError> {
        let response = self
            .http
            .post(url)
            .query(&[("key", self.api_key.as_str())])
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::Status {
                service: SERVICE,
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateContentResponse = response.json().await?;
        extract_answer(parsed)
    }
}

#[async_trait]
impl TextCompleter for GeminiClient {
    async fn complete(
        &self,
        ctx: &RunContext,
        request: &CompletionRequest,
        model: &ModelConfig,
    ) -> Result<String, ServiceError> {
        let mut images = Vec::with_capacity(request.images.len());
        for path in &request.images {
            images.push(load_inline_image(path).await?);
        }

        let body = build_request(
            &request.prompt,
            images,
            request.use_search_grounding,
            model,
        );
        let url = format!("{}/models/{}:generateContent", model.api_base, model.name);
        let timeout = ctx.bound_timeout(model.timeout(!request.images.is_empty()));

        CompletionRequested {
            model: &model.name,
            prompt_chars: request.prompt.chars().count(),
            image_count: request.images.len(),
            grounded: request.use_search_grounding,
        }
        .log();

        let started = Instant::now();
        let outcome = match tokio::time::timeout(timeout, self.send(&url, &body)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(ServiceError::Timeout {
                service: SERVICE,
                after: timeout,
            }),
        };

        match outcome {
            Ok((answer, source_count)) => {
                CompletionReceived {
                    model: &model.name,
                    response_chars: answer.chars().count(),
                    source_count,
                    duration: started.elapsed(),
                }
                .log();
                Ok(answer)
            }
            Err(error) => {
                ServiceCallFailed {
                    service: SERVICE,
                    error: &error,
                }
                .log();
                Err(error)
            }
        }
    }
}
