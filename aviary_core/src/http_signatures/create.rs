//! Create HTTP signatures
use chrono::Utc;
use http::Method;
use thiserror::Error;

use crate::{
    base64,
    crypto_rsa::{
        create_rsa_sha256_signature,
        RsaError,
        RsaSecretKey,
    },
    http_digest::create_digest_header,
    urls::{get_host_header_value, parse_http_url},
};

const HTTP_SIGNATURE_ALGORITHM: &str = "rsa-sha256";
// https://www.rfc-editor.org/rfc/rfc9110#http.date
const HTTP_SIGNATURE_DATE_FORMAT: &str = "%a, %d %b %Y %T GMT";

/// Entity that creates an HTTP signature
pub struct HttpSigner {
    pub key: RsaSecretKey,
    pub key_id: String,
}

impl HttpSigner {
    pub fn new(key: RsaSecretKey, key_id: String) -> Self {
        Self { key, key_id }
    }
}

/// HTTP headers for a signed request (Draft-Cavage)
pub struct HttpSignatureHeaders {
    pub host: String,
    pub date: String,
    pub digest: Option<String>,
    pub signature: String,
}

/// Errors that may occur during signature generation
#[derive(Debug, Error)]
pub enum HttpSignatureError {
    #[error("invalid request URL: {0}")]
    UrlError(&'static str),

    #[error("signing error")]
    SigningError(#[from] RsaError),
}

/// Creates HTTP signature according to the old HTTP Signatures Spec
/// <https://datatracker.ietf.org/doc/html/draft-cavage-http-signatures>
///
/// POST requests are signed over `(request-target) host date digest`,
/// GET requests over `(request-target) host date`.
pub fn create_http_signature(
    request_method: Method,
    request_url: &str,
    maybe_request_body: Option<&[u8]>,
    signer: &HttpSigner,
) -> Result<HttpSignatureHeaders, HttpSignatureError> {
    let request_uri = parse_http_url(request_url)
        .map_err(|error| HttpSignatureError::UrlError(error.0))?;
    let request_target = format!(
        "{} {}",
        request_method.as_str().to_lowercase(),
        request_uri.path(),
    );
    let host = get_host_header_value(request_url)
        .map_err(|error| HttpSignatureError::UrlError(error.0))?;
    let date = Utc::now().format(HTTP_SIGNATURE_DATE_FORMAT).to_string();
    let maybe_digest_header = maybe_request_body
        .map(create_digest_header);

    let mut headers = vec![
        ("(request-target)", &request_target),
        ("host", &host),
        ("date", &date),
    ];
    if let Some(digest_header) = maybe_digest_header.as_ref() {
        headers.push(("digest", digest_header));
    };

    let signature_base = headers.iter()
        .map(|(name, value)| format!("{}: {}", name, value))
        .collect::<Vec<String>>()
        .join("\n");
    let headers_parameter = headers.iter()
        .map(|(name, _)| name.to_string())
        .collect::<Vec<String>>()
        .join(" ");
    let signature = create_rsa_sha256_signature(
        &signer.key,
        signature_base.as_bytes(),
    )?;
    let signature_parameter = base64::encode(signature);
    let signature_header = format!(
        r#"keyId="{}",algorithm="{}",headers="{}",signature="{}""#,
        signer.key_id,
        HTTP_SIGNATURE_ALGORITHM,
        headers_parameter,
        signature_parameter,
    );
    let headers = HttpSignatureHeaders {
        host,
        date,
        digest: maybe_digest_header,
        signature: signature_header,
    };
    Ok(headers)
}

#[cfg(test)]
mod tests {
    use crate::crypto_rsa::generate_weak_rsa_key;
    use super::*;

    #[test]
    fn test_create_http_signature_get() {
        let request_url = "https://remote.example/objects/1";
        let signer_key = generate_weak_rsa_key().unwrap();
        let signer_key_id = "https://social.example/actor#main-key".to_string();
        let signer = HttpSigner::new(signer_key, signer_key_id);

        let headers = create_http_signature(
            Method::GET,
            request_url,
            None,
            &signer,
        ).unwrap();

        assert_eq!(headers.host, "remote.example");
        assert_eq!(headers.digest, None);
        let expected_signature_header = concat!(
            r#"keyId="https://social.example/actor#main-key","#,
            r#"algorithm="rsa-sha256","#,
            r#"headers="(request-target) host date","#,
            r#"signature=""#,
        );
        assert_eq!(
            headers.signature.starts_with(expected_signature_header),
            true,
        );
    }

    #[test]
    fn test_create_http_signature_get_with_port() {
        let request_url = "http://127.0.0.1:1234/objects/1";
        let signer_key = generate_weak_rsa_key().unwrap();
        let signer_key_id = "https://social.example/actor#main-key".to_string();
        let signer = HttpSigner::new(signer_key, signer_key_id);
        let headers = create_http_signature(
            Method::GET,
            request_url,
            None,
            &signer,
        ).unwrap();
        assert_eq!(headers.host, "127.0.0.1:1234");
    }

    #[test]
    fn test_create_http_signature_post() {
        let request_url = "https://remote.example/inbox";
        let request_body = "{}";
        let signer_key = generate_weak_rsa_key().unwrap();
        let signer_key_id = "https://social.example/actor#main-key".to_string();
        let signer = HttpSigner::new(signer_key, signer_key_id);

        let result = create_http_signature(
            Method::POST,
            request_url,
            Some(request_body.as_bytes()),
            &signer,
        );
        assert_eq!(result.is_ok(), true);

        let headers = result.unwrap();
        assert_eq!(headers.host, "remote.example");
        assert_eq!(
            headers.digest.unwrap(),
            "SHA-256=RBNvo1WzZ4oRRq0W9+hknpT7T8If536DEMBg9hyq/4o=",
        );
        let expected_signature_header = concat!(
            r#"keyId="https://social.example/actor#main-key","#,
            r#"algorithm="rsa-sha256","#,
            r#"headers="(request-target) host date digest","#,
            r#"signature=""#,
        );
        assert_eq!(
            headers.signature.starts_with(expected_signature_header),
            true,
        );
    }
}
