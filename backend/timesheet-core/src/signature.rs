// src/signature.rs

use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine as _};
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

// Captures the format tag of a browser-produced signature data URI.
static DATA_URI_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^data:image/(png|jpeg|jpg);base64,").expect("valid regex"));

#[derive(Error, Debug)]
pub enum SignatureError {
    #[error("Signature payload is empty")]
    Empty,

    #[error("Signature payload is not valid base64")]
    Base64(#[from] base64::DecodeError),
}

/// Raster format a signature payload declares itself as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureFormat {
    Png,
    Jpeg,
}

impl SignatureFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignatureFormat::Png => "PNG",
            SignatureFormat::Jpeg => "JPEG",
        }
    }
}

/// Decoded signature bytes plus the format tag recovered from the data URI.
#[derive(Debug, Clone)]
pub struct SignatureImage {
    pub format: SignatureFormat,
    pub bytes: Vec<u8>,
}

/// Strips the data-URI prefix from a captured or uploaded signature and
/// decodes the base64 payload. Inputs without a recognizable prefix are
/// treated as bare base64 and assumed to be PNG; whether the bytes really
/// decode as the tagged format is checked at embed time.
pub fn parse_signature_data(data: &str) -> Result<SignatureImage, SignatureError> {
    let data = data.trim();
    if data.is_empty() {
        return Err(SignatureError::Empty);
    }

    let (format, payload) = match DATA_URI_PREFIX.captures(data) {
        Some(captures) => {
            let tag = captures.get(1).expect("capture group").as_str();
            let format = if tag == "png" {
                SignatureFormat::Png
            } else {
                SignatureFormat::Jpeg
            };
            (format, &data[captures.get(0).expect("whole match").end()..])
        }
        // No recognizable tag: assume PNG, the capture pad's native output.
        None => (SignatureFormat::Png, data),
    };

    let bytes = BASE64_STANDARD.decode(payload)?;
    if bytes.is_empty() {
        return Err(SignatureError::Empty);
    }

    Ok(SignatureImage { format, bytes })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TINY_PNG_B64: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR4nGNgYGD4DwABBAEAX+XDSwAAAABJRU5ErkJggg==";

    #[test]
    fn parses_a_png_data_uri() {
        let data = format!("data:image/png;base64,{}", TINY_PNG_B64);
        let signature = parse_signature_data(&data).expect("should parse");
        assert_eq!(signature.format, SignatureFormat::Png);
        assert!(signature.bytes.starts_with(&[0x89, b'P', b'N', b'G']));
    }

    #[test]
    fn parses_a_jpeg_data_uri() {
        let data = format!("data:image/jpeg;base64,{}", BASE64_STANDARD.encode([0xFF, 0xD8, 0xFF]));
        let signature = parse_signature_data(&data).expect("should parse");
        assert_eq!(signature.format, SignatureFormat::Jpeg);
    }

    #[test]
    fn bare_base64_falls_back_to_png() {
        let signature = parse_signature_data(TINY_PNG_B64).expect("should parse");
        assert_eq!(signature.format, SignatureFormat::Png);
    }

    #[test]
    fn rejects_empty_payloads() {
        assert!(matches!(parse_signature_data("   "), Err(SignatureError::Empty)));
        assert!(matches!(
            parse_signature_data("data:image/png;base64,"),
            Err(SignatureError::Empty)
        ));
    }

    #[test]
    fn rejects_invalid_base64() {
        let result = parse_signature_data("data:image/png;base64,@@@not-base64@@@");
        assert!(matches!(result, Err(SignatureError::Base64(_))));
    }
}
