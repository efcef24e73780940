// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Range checks on a loaded [`AppConfig`].
//!
//! Every problem is collected so the whole file can be fixed in one pass.

use tokio::sync::Semaphore;

use crate::config::consts::MAX_TEMPERATURE;
use crate::config::loader::AppConfig;

pub fn validate_config(cfg: &AppConfig) -> Result<(), Vec<String>> {
    let mut problems = Vec::new();

    if cfg.model.name.trim().is_empty() {
        problems.push("model.name must not be empty".to_string());
    }
    if !(0.0..=MAX_TEMPERATURE).contains(&cfg.model.temperature) {
        problems.push(format!(
            "model.temperature must be between 0 and {}, got {}",
            MAX_TEMPERATURE, cfg.model.temperature
        ));
    }
    if cfg.model.max_tokens == Some(0) {
        problems.push("model.max_tokens must be at least 1 when set".to_string());
    }
    if cfg.model.timeout_secs == 0 {
        problems.push("model.timeout_secs must be greater than 0".to_string());
    }
    if cfg.model.image_timeout_secs == 0 {
        problems.push("model.image_timeout_secs must be greater than 0".to_string());
    }

    if cfg.search.max_results == 0 {
        problems.push("search.max_results must be at least 1".to_string());
    }
    if cfg.search.timeout_secs == 0 {
        problems.push("search.timeout_secs must be greater than 0".to_string());
    }

    if cfg.retry.backoff == crate::config::Backoff::Exponential
        && cfg.retry.max_delay_ms < cfg.retry.delay_ms
    {
        problems.push(format!(
            "retry.max_delay_ms ({}) must not be below retry.delay_ms ({})",
            cfg.retry.max_delay_ms, cfg.retry.delay_ms
        ));
    }

    match cfg.batch.max_concurrency {
        Some(0) => {
            problems.push("batch.max_concurrency must be at least 1 when set".to_string());
        }
        Some(limit) if limit > Semaphore::MAX_PERMITS => problems.push(format!(
            "batch.max_concurrency ({}) must not exceed {}",
            limit,
            Semaphore::MAX_PERMITS
        )),
        _ => {}
    }

    if cfg.session.conversation_dir.as_os_str().is_empty() {
        problems.push("session.conversation_dir must not be empty".to_string());
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(problems)
    }
}
