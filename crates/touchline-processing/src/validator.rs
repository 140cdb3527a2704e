use touchline_core::models::{mime_essence, CompressionSettings, RawFile};
use touchline_core::ValidationError;

/// One entry of an accept list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcceptRule {
    /// `application/pdf`
    Exact(String),
    /// `image/*`, stored as `image/`
    MimePrefix(String),
    /// `.docx`, stored without the dot
    Extension(String),
}

impl AcceptRule {
    pub fn parse(rule: &str) -> Self {
        let rule = rule.trim().to_lowercase();
        if let Some(ext) = rule.strip_prefix('.') {
            AcceptRule::Extension(ext.to_string())
        } else if let Some(prefix) = rule.strip_suffix('*') {
            AcceptRule::MimePrefix(prefix.to_string())
        } else {
            AcceptRule::Exact(rule)
        }
    }

    pub fn matches(&self, file: &RawFile) -> bool {
        match self {
            AcceptRule::Exact(mime) => mime_essence(&file.content_type) == *mime,
            AcceptRule::MimePrefix(prefix) => mime_essence(&file.content_type).starts_with(prefix),
            AcceptRule::Extension(ext) => file.extension().as_deref() == Some(ext.as_str()),
        }
    }
}

/// File validator
///
/// Classifies a candidate file against a size ceiling and an accept list. Pure and
/// synchronous; surfacing the rejection to the user is the caller's job.
#[derive(Debug, Clone)]
pub struct FileValidator {
    max_file_size: usize,
    accept: Vec<AcceptRule>,
}

impl FileValidator {
    pub fn new(max_file_size: usize, accept: Vec<AcceptRule>) -> Self {
        Self {
            max_file_size,
            accept,
        }
    }

    pub fn from_settings(settings: &CompressionSettings) -> Self {
        Self::new(
            settings.max_file_size_bytes(),
            settings
                .accepted_types
                .iter()
                .map(|rule| AcceptRule::parse(rule))
                .collect(),
        )
    }

    /// Validate file size. A file of exactly the limit is accepted.
    pub fn validate_file_size(&self, file: &RawFile) -> Result<(), ValidationError> {
        if file.size() > self.max_file_size {
            return Err(ValidationError::FileTooLarge {
                name: file.name.clone(),
                size: file.size(),
                max: self.max_file_size,
            });
        }
        Ok(())
    }

    /// Validate declared type against the accept list
    pub fn validate_format(&self, file: &RawFile) -> Result<(), ValidationError> {
        if !self.accept.iter().any(|rule| rule.matches(file)) {
            return Err(ValidationError::UnsupportedFormat {
                name: file.name.clone(),
                content_type: file.content_type.clone(),
            });
        }
        Ok(())
    }

    /// Size first, then format
    pub fn validate(&self, file: &RawFile) -> Result<(), ValidationError> {
        self.validate_file_size(file)?;
        self.validate_format(file)?;
        Ok(())
    }
}
