//! Multipart form encoding for uploads.
//!
//! Fields keep their insertion order in the encoded body. The server reads
//! list membership from index-suffixed names such as `files[0]`, `files[1]`,
//! so reordering would change the meaning of a request.

use std::path::{Path, PathBuf};

use reqwest::multipart::{Form, Part};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::media::media_type_for;

/// One value in a multipart form.
#[derive(Debug, Clone)]
pub enum MultipartField {
    /// Plain form field.
    Text(String),
    /// File part with a file name and content type.
    File(FileRef),
    /// Structured value, sent as a JSON-encoded plain form field.
    Json(serde_json::Value),
}

/// A file to upload, either on disk or already in memory.
#[derive(Debug, Clone)]
pub struct FileRef {
    file_name: String,
    source: FileSource,
    content_type: Option<String>,
}

#[derive(Debug, Clone)]
enum FileSource {
    Path(PathBuf),
    Bytes(Vec<u8>),
}

impl FileRef {
    /// Reference a file on disk. It is read when the form is encoded.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "file".to_string());

        Self {
            file_name,
            source: FileSource::Path(path),
            content_type: None,
        }
    }

    /// Upload in-memory content under the given file name.
    pub fn from_bytes(file_name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            source: FileSource::Bytes(content.into()),
            content_type: None,
        }
    }

    /// Override the content type that would be resolved from the file name.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// File name sent with the part.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Content type sent with the part.
    pub fn content_type(&self) -> &str {
        self.content_type
            .as_deref()
            .unwrap_or_else(|| media_type_for(&self.file_name))
    }

    /// Path on disk, if this file has not been loaded into memory.
    pub fn path(&self) -> Option<&Path> {
        match &self.source {
            FileSource::Path(path) => Some(path),
            FileSource::Bytes(_) => None,
        }
    }

    async fn into_part(self) -> Result<Part> {
        let content_type = self.content_type().to_string();
        let content = match self.source {
            FileSource::Bytes(bytes) => bytes,
            FileSource::Path(path) => tokio::fs::read(&path).await.map_err(|e| {
                Error::Encoding(format!("failed to read {}: {e}", path.display()))
            })?,
        };

        Part::bytes(content)
            .file_name(self.file_name)
            .mime_str(&content_type)
            .map_err(|e| Error::Encoding(format!("invalid content type {content_type:?}: {e}")))
    }
}

/// Ordered mapping of field name to [`MultipartField`].
#[derive(Debug, Clone, Default)]
pub struct MultipartForm {
    fields: Vec<(String, MultipartField)>,
}

impl MultipartForm {
    /// Create an empty form.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field.
    pub fn push(mut self, name: impl Into<String>, field: MultipartField) -> Self {
        self.fields.push((name.into(), field));
        self
    }

    /// Append a plain text field.
    pub fn text(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(name, MultipartField::Text(value.into()))
    }

    /// Append a file part.
    pub fn file(self, name: impl Into<String>, file: FileRef) -> Self {
        self.push(name, MultipartField::File(file))
    }

    /// Append a JSON value as a plain text field.
    pub fn json(self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.push(name, MultipartField::Json(value))
    }

    /// Serialize `value` and append it as a JSON field.
    pub fn structured<T: Serialize + ?Sized>(
        self,
        name: impl Into<String>,
        value: &T,
    ) -> Result<Self> {
        let value = serde_json::to_value(value).map_err(|e| Error::Encoding(e.to_string()))?;
        Ok(self.json(name, value))
    }

    /// Append files as `prefix[0]`, `prefix[1]`, and so on.
    pub fn indexed_files(mut self, prefix: &str, files: impl IntoIterator<Item = FileRef>) -> Self {
        for (index, file) in files.into_iter().enumerate() {
            self = self.file(format!("{prefix}[{index}]"), file);
        }
        self
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the form has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Field names in encoding order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    /// Build the multipart body.
    ///
    /// Files on disk are read here. Any failure aborts the whole form, so a
    /// partially encoded body is never sent.
    pub async fn encode(self) -> Result<Form> {
        let mut form = Form::new();

        for (name, field) in self.fields {
            form = match field {
                MultipartField::Text(value) => form.text(name, value),
                MultipartField::Json(value) => {
                    let encoded =
                        serde_json::to_string(&value).map_err(|e| Error::Encoding(e.to_string()))?;
                    form.text(name, encoded)
                }
                MultipartField::File(file) => form.part(name, file.into_part().await?),
            };
        }

        Ok(form)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use serde_json::json;

    use super::*;

    #[test]
    fn test_file_name_from_path() {
        let file = FileRef::from_path("/tmp/uploads/Report.PDF");
        assert_eq!(file.file_name(), "Report.PDF");
        assert_eq!(file.content_type(), "application/pdf");
        assert!(file.path().is_some());
    }

    #[test]
    fn test_explicit_content_type_wins() {
        let file = FileRef::from_bytes("blob.bin", vec![1, 2, 3]).with_content_type("image/webp");
        assert_eq!(file.content_type(), "image/webp");
        assert!(file.path().is_none());
    }

    #[test]
    fn test_field_order_is_preserved() {
        let form = MultipartForm::new()
            .text("name", "corpus")
            .indexed_files(
                "files",
                [
                    FileRef::from_bytes("a.txt", "a"),
                    FileRef::from_bytes("b.txt", "b"),
                ],
            )
            .json("config", json!({"ocr": true}));

        let names: Vec<&str> = form.names().collect();
        assert_eq!(names, vec!["name", "files[0]", "files[1]", "config"]);
        assert_eq!(form.len(), 4);
    }

    #[test]
    fn test_structured_value() {
        #[derive(Serialize)]
        struct Options {
            ocr: bool,
        }

        let form = MultipartForm::new()
            .structured("options", &Options { ocr: true })
            .unwrap();
        assert!(!form.is_empty());
    }

    #[tokio::test]
    async fn test_encode_reads_files_from_disk() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(b"hello").unwrap();

        let form = MultipartForm::new()
            .text("title", "greeting")
            .file("files[0]", FileRef::from_path(tmp.path()));

        assert!(form.encode().await.is_ok());
    }

    #[tokio::test]
    async fn test_unreadable_file_fails_whole_form() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.txt");

        let form = MultipartForm::new()
            .text("title", "greeting")
            .file("files[0]", FileRef::from_path(&missing));

        let err = form.encode().await.unwrap_err();
        assert!(matches!(err, Error::Encoding(ref msg) if msg.contains("missing.txt")));
    }

    #[tokio::test]
    async fn test_invalid_content_type_is_encoding_error() {
        let form = MultipartForm::new().file(
            "file",
            FileRef::from_bytes("a.bin", vec![0]).with_content_type("not a mime"),
        );

        let err = form.encode().await.unwrap_err();
        assert!(matches!(err, Error::Encoding(_)));
    }
}
