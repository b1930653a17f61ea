//! Multipart form collection shared by the upload endpoints

use axum::body::Bytes;
use axum::extract::Multipart;

use crate::error::{AppError, Result};

/// One multipart field, fully buffered
#[derive(Debug, Clone)]
pub struct FormField {
    pub name: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Bytes,
}

impl FormField {
    /// Whether the upload looks like a PDF by content type or file name
    pub fn is_pdf(&self) -> bool {
        let by_type = self
            .content_type
            .as_deref()
            .is_some_and(|ct| ct.to_lowercase().contains("pdf"));
        let by_name = self
            .file_name
            .as_deref()
            .is_some_and(|name| name.to_lowercase().ends_with(".pdf"));
        by_type || by_name
    }

    fn label(&self) -> String {
        self.file_name.clone().unwrap_or_else(|| self.name.clone())
    }
}

/// All fields of a multipart request, in submission order
#[derive(Debug, Default)]
pub struct Form {
    fields: Vec<FormField>,
}

impl Form {
    pub async fn read(mut multipart: Multipart) -> Result<Self> {
        let mut fields = Vec::new();

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or("").to_string();
            let file_name = field.file_name().map(|s| s.to_string());
            let content_type = field.content_type().map(|s| s.to_string());
            let data = field.bytes().await?;

            tracing::debug!(
                name = %name,
                file_name = ?file_name,
                content_type = ?content_type,
                bytes = data.len(),
                "Received form field"
            );

            fields.push(FormField {
                name,
                file_name,
                content_type,
                data,
            });
        }

        Ok(Self { fields })
    }

    /// First field named `name`
    pub fn field(&self, name: &str) -> Option<&FormField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Every field named `name`, in order
    pub fn fields<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a FormField> + 'a {
        self.fields.iter().filter(move |f| f.name == name)
    }

    /// Text value of a field; blank values count as absent
    pub fn text(&self, name: &str) -> Option<String> {
        self.field(name)
            .map(|f| String::from_utf8_lossy(&f.data).trim().to_string())
            .filter(|s| !s.is_empty())
    }

    /// Parse a field with `FromStr`, rejecting malformed values
    pub fn parse<T: std::str::FromStr>(&self, name: &str) -> Result<Option<T>> {
        match self.text(name) {
            None => Ok(None),
            Some(raw) => raw.parse().map(Some).map_err(|_| {
                AppError::BadRequest(format!("Invalid value for '{}': {}", name, raw))
            }),
        }
    }

    /// Boolean flag: `true`/`1`/`yes`/`on` are true, anything else false
    pub fn flag(&self, name: &str) -> bool {
        self.text(name)
            .is_some_and(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes" | "on"))
    }

    /// Non-empty file upload named `name`
    pub fn file(&self, name: &str, what: &str) -> Result<&FormField> {
        self.field(name)
            .filter(|f| !f.data.is_empty())
            .ok_or_else(|| AppError::BadRequest(format!("{} is required", what)))
    }

    /// Required PDF upload named `name`
    pub fn pdf(&self, name: &str) -> Result<&FormField> {
        let field = self.file(name, "PDF file")?;
        require_pdf(field)?;
        Ok(field)
    }
}

pub fn require_pdf(field: &FormField) -> Result<()> {
    if field.is_pdf() {
        Ok(())
    } else {
        Err(AppError::UnsupportedMedia(format!(
            "{} is not a PDF file",
            field.label()
        )))
    }
}
