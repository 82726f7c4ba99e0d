use std::path::Path;

use anyhow::{anyhow, Context, Result};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;

/// Reply from POST /upload. The backend sets one of the two fields; neither
/// is guaranteed to be present.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadReply {
    pub message: Option<String>,
    pub error: Option<String>,
}

/// Reply from POST /ask.
#[derive(Debug, Clone, Deserialize)]
pub struct AskReply {
    pub answer: Option<String>,
    pub error: Option<String>,
}

#[derive(Clone)]
pub struct BackendClient {
    client: Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Upload a local PDF as a multipart form under the `file` field.
    pub async fn upload(&self, path: &Path) -> Result<UploadReply> {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("could not read {}", path.display()))?;

        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("document.pdf")
            .to_string();
        log::debug!("uploading {} ({} bytes)", file_name, bytes.len());

        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("application/pdf")?;
        let form = Form::new().part("file", part);

        let url = format!("{}/upload", self.base_url);
        let response = self.client.post(&url).multipart(form).send().await?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "upload request failed with status: {}",
                response.status()
            ));
        }

        Ok(response.json().await?)
    }

    /// Ask a question about the indexed document, sent as a multipart form
    /// under the `question` field.
    pub async fn ask(&self, question: &str) -> Result<AskReply> {
        let form = Form::new().text("question", question.to_string());

        let url = format!("{}/ask", self.base_url);
        log::debug!("asking backend at {}", url);
        let response = self.client.post(&url).multipart(form).send().await?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "ask request failed with status: {}",
                response.status()
            ));
        }

        Ok(response.json().await?)
    }
}
