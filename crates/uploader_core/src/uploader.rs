use std::path::{Path, PathBuf};

use async_trait::async_trait;
use reqwest::{
    multipart::{Form, Part},
    Client,
};
use shared::domain::XmlFileKind;
use tracing::{debug, warn};

use crate::{classify::compress_file, error::UploadError};

#[async_trait]
pub trait ResultsUploader: Send + Sync {
    async fn upload(&self, kind: XmlFileKind, path: &Path, api_key: &str)
        -> Result<(), UploadError>;
}

/// Posts zlib-compressed documents to the results service as multipart forms.
pub struct HttpResultsUploader {
    http: Client,
    api_base: String,
}

impl HttpResultsUploader {
    pub fn new(api_base: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn endpoint(&self, kind: XmlFileKind) -> String {
        format!("{}{}", self.api_base, kind.upload_path())
    }
}

#[async_trait]
impl ResultsUploader for HttpResultsUploader {
    async fn upload(
        &self,
        kind: XmlFileKind,
        path: &Path,
        api_key: &str,
    ) -> Result<(), UploadError> {
        let owned: PathBuf = path.to_path_buf();
        let compressed = tokio::task::spawn_blocking(move || compress_file(&owned)).await??;
        debug!(
            kind = %kind,
            compressed_len = compressed.len(),
            "posting document to results service"
        );

        let form = Form::new()
            .text("apiKey", api_key.to_owned())
            .part("file", Part::bytes(compressed));
        let response = self
            .http
            .post(self.endpoint(kind))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "cannot decode response body".to_string());
        warn!(%status, path = %path.display(), "results service rejected upload");
        Err(UploadError::Rejected { status, body })
    }
}
