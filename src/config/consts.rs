// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

/// Configuration file picked up from the working directory when `--config` is absent
pub const DEFAULT_CONFIG_PATH: &str = "nodeflow.yaml";

/// Default completion model
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
/// Base URL of the generative language API
pub const DEFAULT_MODEL_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
/// Upper bound accepted for temperature
pub const MAX_TEMPERATURE: f32 = 2.0;
/// Text-only completion timeout
pub const DEFAULT_MODEL_TIMEOUT_SECS: u64 = 60;
/// Completion timeout when images are attached
pub const DEFAULT_IMAGE_TIMEOUT_SECS: u64 = 90;

pub const DEFAULT_SEARCH_API_URL: &str = "https://api.tavily.com/search";
pub const DEFAULT_SEARCH_MAX_RESULTS: usize = 3;
pub const DEFAULT_SEARCH_TIMEOUT_SECS: u64 = 30;

pub const DEFAULT_RETRY_MAX_RETRIES: u32 = 2;
pub const DEFAULT_RETRY_DELAY_MS: u64 = 500;
pub const DEFAULT_RETRY_MAX_DELAY_MS: u64 = 5_000;

pub const DEFAULT_CONVERSATION_DIR: &str = "Conversations";
pub const DEFAULT_SYSTEM_CONTEXT: &str =
    "You are a helpful assistant. Answer the user's questions clearly and accurately.";
/// Markdown pager used to render answers
pub const DEFAULT_RENDERER: &str = "bat";

/// Environment variables holding service credentials
pub const GEMINI_API_KEY_VAR: &str = "GEMINI_API_KEY";
pub const TAVILY_API_KEY_VAR: &str = "TAVILY_API_KEY";
