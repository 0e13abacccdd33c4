//! Storage API.

use std::path::PathBuf;

use crate::client::MetisClient;
use crate::error::{Error, Result};
use crate::multipart::{FileRef, MultipartForm};
use crate::types::{StorageFile, StorageFiles};

/// Storage API client.
pub struct StorageApi {
    client: MetisClient,
}

impl StorageApi {
    pub(crate) fn new(client: MetisClient) -> Self {
        Self { client }
    }

    /// Upload files, sent as `files[0]`, `files[1]`, ... in the given order.
    pub async fn upload(&self, files: Vec<FileRef>) -> Result<Vec<StorageFile>> {
        let form = MultipartForm::new().indexed_files("files", files);
        let response: StorageFiles = self
            .client
            .post_multipart_json("api/v1/storage", form)
            .await?;
        Ok(response.files)
    }

    /// Upload files from disk.
    pub async fn upload_files<I, P>(&self, paths: I) -> Result<Vec<StorageFile>>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.upload(paths.into_iter().map(FileRef::from_path).collect())
            .await
    }

    /// Upload a single file from disk.
    pub async fn upload_file(&self, path: impl Into<PathBuf>) -> Result<StorageFile> {
        self.upload_files([path])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::Parse {
                message: "storage response contained no files".to_string(),
                body: String::new(),
            })
    }
}
