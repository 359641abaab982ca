//! Contact form relay
//!
//! Forwards the contact form to an external form-relay endpoint as JSON.
//! Success is binary and there is no retry.

use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};

use crate::types::{FolioError, Result};

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct ContactMessage {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub message: String,
}

impl ContactMessage {
    pub fn validate(&self) -> Result<()> {
        let missing: Vec<&str> = [
            ("name", &self.name),
            ("email", &self.email),
            ("subject", &self.subject),
            ("message", &self.message),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field)
        .collect();

        if !missing.is_empty() {
            return Err(FolioError::Validation(format!(
                "Missing required fields: {}",
                missing.join(", ")
            )));
        }
        Ok(())
    }
}

#[derive(Clone)]
pub struct ContactRelay {
    client: Client,
    endpoint: String,
}

impl ContactRelay {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FolioError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub async fn send(&self, message: &ContactMessage) -> Result<()> {
        message.validate()?;

        let response = self
            .client
            .post(&self.endpoint)
            .header(header::ACCEPT, "application/json")
            .json(message)
            .send()
            .await
            .map_err(|e| FolioError::Relay(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Contact relay rejected message: {} {}", status, body);
            return Err(FolioError::Relay(format!(
                "Relay returned {}",
                status.as_u16()
            )));
        }

        info!("Contact message relayed from {}", message.email.trim());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_lists_missing_fields() {
        let msg = ContactMessage {
            name: "Ada".into(),
            email: "ada@example.com".into(),
            ..Default::default()
        };

        match msg.validate() {
            Err(FolioError::Validation(m)) => assert_eq!(m, "Missing required fields: subject, message"),
            other => panic!("unexpected {:?}", other),
        }
    }
}
