//! Delivering activities
use reqwest::{header, Method, StatusCode};
use thiserror::Error;

use aviary_core::http_signatures::create::{
    create_http_signature,
    HttpSignatureError,
    HttpSigner,
};

use super::{
    agent::FederationAgent,
    constants::AP_MEDIA_TYPE,
    http_client::{
        create_http_client,
        describe_request_error,
        limited_response,
        RedirectAction,
    },
};

#[derive(Debug)]
pub struct Response {
    pub status: StatusCode,
    pub body: String,
}

#[derive(Debug, Error)]
pub enum DelivererError {
    #[error(transparent)]
    HttpSignatureError(#[from] HttpSignatureError),

    #[error("activity serialization error")]
    SerializationError(#[from] serde_json::Error),

    #[error("{}", describe_request_error(.0))]
    RequestError(#[from] reqwest::Error),

    #[error("response size exceeds limit")]
    ResponseTooLarge,

    #[error("HTTP error {}", .0.status.as_u16())]
    HttpError(Response),
}

impl DelivererError {
    /// Client errors (other than rate limiting) will not go away on retry
    pub fn is_terminal(&self) -> bool {
        match self {
            Self::HttpError(response) => {
                response.status.is_client_error() &&
                    response.status != StatusCode::TOO_MANY_REQUESTS
            },
            _ => false,
        }
    }
}

/// Delivers an activity to an inbox with a signed POST request
pub async fn send_object(
    agent: &FederationAgent,
    object_json: &str,
    inbox_url: &str,
) -> Result<Response, DelivererError> {
    let http_client = create_http_client(
        agent,
        agent.deliverer_timeout,
        RedirectAction::None,
    )?;
    let mut request_builder = http_client.post(inbox_url)
        .header(header::CONTENT_TYPE, AP_MEDIA_TYPE);
    if let Some(ref user_agent) = agent.user_agent {
        request_builder = request_builder
            .header(header::USER_AGENT, user_agent);
    };
    let signer = agent.signer.as_ref()
        .expect("deliverer agent should have a signing key");
    let http_signer = HttpSigner::new(signer.key.clone(), signer.key_id.clone());
    let headers = create_http_signature(
        Method::POST.as_str().parse()
            .expect("reqwest and http methods should be compatible"),
        inbox_url,
        Some(object_json.as_bytes()),
        &http_signer,
    )?;
    let digest = headers.digest
        .expect("digest header should be present if method is POST");
    request_builder = request_builder
        .header(header::HOST, headers.host)
        .header(header::DATE, headers.date)
        .header("Digest", digest)
        .header("Signature", headers.signature);

    let response = request_builder
        .body(object_json.to_owned())
        .send()
        .await?;
    let response_status = response.status();
    let response_data = limited_response(response, agent.response_size_limit)
        .await?
        .ok_or(DelivererError::ResponseTooLarge)?;
    let response_text = String::from_utf8(response_data)
        // Replace non-UTF8 responses with empty string
        .unwrap_or_default();
    let response = Response { status: response_status, body: response_text };
    // https://www.w3.org/wiki/ActivityPub/Primer/HTTP_status_codes_for_delivery
    if response_status.is_success() {
        Ok(response)
    } else {
        Err(DelivererError::HttpError(response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_error_to_string() {
        let response = Response {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: "".to_string(),
        };
        let error = DelivererError::HttpError(response);
        assert_eq!(error.to_string(), "HTTP error 500");
        assert_eq!(error.is_terminal(), false);
    }

    #[test]
    fn test_http_client_error_is_terminal() {
        let response = Response {
            status: StatusCode::FORBIDDEN,
            body: "".to_string(),
        };
        let error = DelivererError::HttpError(response);
        assert_eq!(error.is_terminal(), true);

        let response = Response {
            status: StatusCode::TOO_MANY_REQUESTS,
            body: "".to_string(),
        };
        let error = DelivererError::HttpError(response);
        assert_eq!(error.is_terminal(), false);
    }
}
