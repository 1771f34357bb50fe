//! `multipart/form-data` bodies for uploads.

use serde_json::{Map, Value};
use uuid::Uuid;

use crate::types::value_to_text;

/// One file to upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: "application/octet-stream".to_string(),
            bytes: bytes.into(),
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }
}

/// A single file or a batch. A single file is sent as part `file`; a batch as
/// `file_0`, `file_1`, ...
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Files {
    One(UploadFile),
    Many(Vec<UploadFile>),
}

impl From<UploadFile> for Files {
    fn from(file: UploadFile) -> Self {
        Files::One(file)
    }
}

impl From<Vec<UploadFile>> for Files {
    fn from(files: Vec<UploadFile>) -> Self {
        Files::Many(files)
    }
}

impl Files {
    /// `(part name, file)` pairs in send order.
    pub fn parts(&self) -> Vec<(String, &UploadFile)> {
        match self {
            Files::One(file) => vec![("file".to_string(), file)],
            Files::Many(files) => files
                .iter()
                .enumerate()
                .map(|(i, f)| (format!("file_{i}"), f))
                .collect(),
        }
    }
}

/// An encoded form body together with its `Content-Type` header value.
#[derive(Debug, Clone)]
pub struct MultipartBody {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

pub fn encode(files: &Files, fields: Option<&Map<String, Value>>) -> MultipartBody {
    let boundary = format!("----starter-{}", Uuid::new_v4().simple());
    let mut bytes = Vec::new();

    for (name, file) in files.parts() {
        push_line(&mut bytes, &format!("--{boundary}"));
        push_line(
            &mut bytes,
            &format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"",
                escape_quoted(&name),
                escape_quoted(&file.file_name)
            ),
        );
        push_line(&mut bytes, &format!("Content-Type: {}", strip_line_breaks(&file.content_type)));
        push_line(&mut bytes, "");
        bytes.extend_from_slice(&file.bytes);
        push_line(&mut bytes, "");
    }

    for (name, value) in fields.into_iter().flatten() {
        push_line(&mut bytes, &format!("--{boundary}"));
        push_line(
            &mut bytes,
            &format!("Content-Disposition: form-data; name=\"{}\"", escape_quoted(name)),
        );
        push_line(&mut bytes, "");
        push_line(&mut bytes, &value_to_text(value));
    }

    push_line(&mut bytes, &format!("--{boundary}--"));

    MultipartBody {
        content_type: format!("multipart/form-data; boundary={boundary}"),
        bytes,
    }
}

fn push_line(buf: &mut Vec<u8>, line: &str) {
    buf.extend_from_slice(line.as_bytes());
    buf.extend_from_slice(b"\r\n");
}

fn strip_line_breaks(s: &str) -> String {
    s.chars().filter(|c| !matches!(c, '\r' | '\n')).collect()
}

fn escape_quoted(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"").replace(['\r', '\n'], " ")
}
