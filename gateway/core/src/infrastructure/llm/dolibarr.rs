// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Dolibarr Adapter
//
// Dolibarr is a self-hosted ERP/CRM, not a model provider. It is fronted so
// callers can probe an instance through the gateway, usually pointing at
// their own deployment with the base-URL override header.

use crate::domain::llm::{
    ChatCompletion, ChatMessage, GenerationOptions, LLMError, LLMProvider, ModelDescriptor,
};
use async_trait::async_trait;

use super::{endpoint, network_error};

const STATUS_PATH: &str = "api/index.php/status";

pub struct DolibarrAdapter {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl DolibarrAdapter {
    pub fn new(endpoint: String, api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
            api_key,
        }
    }
}

#[async_trait]
impl LLMProvider for DolibarrAdapter {
    async fn chat(
        &self,
        _messages: &[ChatMessage],
        _options: &GenerationOptions,
    ) -> Result<ChatCompletion, LLMError> {
        Err(LLMError::Unsupported("Dolibarr does not serve chat".into()))
    }

    async fn list_models(&self) -> Result<Vec<ModelDescriptor>, LLMError> {
        Err(LLMError::Unsupported("Dolibarr has no model catalogue".into()))
    }

    async fn health_check(&self) -> Result<(), LLMError> {
        let response = self
            .client
            .get(endpoint(&self.endpoint, STATUS_PATH))
            .header("DOLAPIKEY", &self.api_key)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(network_error)?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else if status == 401 || status == 403 {
            Err(LLMError::Authentication("Invalid DOLAPIKEY".into()))
        } else {
            Err(LLMError::Network(format!("HTTP {}", status)))
        }
    }

    fn is_usable(&self) -> bool {
        !self.endpoint.is_empty() && !self.api_key.is_empty()
    }
}
