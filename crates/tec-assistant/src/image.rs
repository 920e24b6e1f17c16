//! Image attachments for vision-capable completions

use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::error::{Error, Result};

/// A validated base64 image, ready to embed in a user turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageInput {
    payload: String,
}

impl ImageInput {
    /// Parse a `data:image/...;base64,` URL or a bare base64 payload
    pub fn parse(data: &str) -> Result<Self> {
        let trimmed = data.trim();
        let payload = match trimmed.strip_prefix("data:") {
            Some(rest) => {
                let (_, encoded) = rest
                    .split_once(',')
                    .ok_or_else(|| Error::malformed("image data URL has no payload"))?;
                encoded
            }
            None => trimmed,
        };

        if payload.is_empty() {
            return Err(Error::malformed("image payload is empty"));
        }

        STANDARD
            .decode(payload)
            .map_err(|e| Error::malformed(format!("image is not valid base64: {}", e)))?;

        Ok(Self {
            payload: payload.to_string(),
        })
    }

    /// Base64 payload without any prefix
    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// Data URL sent to the completion API
    pub fn to_data_url(&self) -> String {
        format!("data:image/jpeg;base64,{}", self.payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_data_url_prefix() {
        let image = ImageInput::parse("data:image/png;base64,iVBORw0KGgo=").unwrap();
        assert_eq!(image.payload(), "iVBORw0KGgo=");
        assert_eq!(image.to_data_url(), "data:image/jpeg;base64,iVBORw0KGgo=");
    }

    #[test]
    fn test_accepts_bare_base64() {
        let image = ImageInput::parse("  /9j/4AAQSkZJRg==\n").unwrap();
        assert_eq!(image.to_data_url(), "data:image/jpeg;base64,/9j/4AAQSkZJRg==");
    }

    #[test]
    fn test_rejects_invalid_payloads() {
        assert!(matches!(ImageInput::parse("not base64!!"), Err(Error::MalformedInput(_))));
        assert!(matches!(ImageInput::parse(""), Err(Error::MalformedInput(_))));
        assert!(matches!(
            ImageInput::parse("data:image/png;base64"),
            Err(Error::MalformedInput(_))
        ));
        assert!(matches!(
            ImageInput::parse("data:image/png;base64,"),
            Err(Error::MalformedInput(_))
        ));
    }
}
