use std::time::Duration;

use reqwest::{redirect::Policy as RedirectPolicy, Client, Method, RequestBuilder};

use aviary_core::http_signatures::create::{
    create_http_signature,
    HttpSignatureError,
    HttpSigner,
};

use super::agent::{FederationAgent, RequestSigner};

#[derive(Clone, Copy)]
pub enum RedirectAction {
    Follow,
    None,
}

pub fn create_http_client(
    agent: &FederationAgent,
    timeout: u64,
    redirect_action: RedirectAction,
) -> Result<Client, reqwest::Error> {
    let redirect_policy = match redirect_action {
        RedirectAction::Follow => RedirectPolicy::limited(10),
        RedirectAction::None => RedirectPolicy::none(),
    };
    let mut client_builder = Client::builder()
        .timeout(Duration::from_secs(timeout))
        .redirect(redirect_policy);
    if let Some(ref user_agent) = agent.user_agent {
        client_builder = client_builder.user_agent(user_agent);
    };
    client_builder.build()
}

pub fn sign_http_request(
    request_builder: RequestBuilder,
    method: Method,
    request_url: &str,
    request_body: Option<&[u8]>,
    signer: &RequestSigner,
) -> Result<RequestBuilder, HttpSignatureError> {
    let http_signer = HttpSigner::new(signer.key.clone(), signer.key_id.clone());
    let method = method.as_str().parse()
        .expect("reqwest and http methods should be compatible");
    let headers = create_http_signature(
        method,
        request_url,
        request_body,
        &http_signer,
    )?;
    let mut request_builder = request_builder
        .header(reqwest::header::HOST, headers.host)
        .header(reqwest::header::DATE, headers.date)
        .header("Signature", headers.signature);
    if let Some(digest) = headers.digest {
        request_builder = request_builder.header("Digest", digest);
    };
    Ok(request_builder)
}

/// Reads a response body, aborting if it exceeds the limit
pub async fn limited_response(
    mut response: reqwest::Response,
    limit: usize,
) -> Result<Option<Vec<u8>>, reqwest::Error> {
    let mut data = vec![];
    while let Some(chunk) = response.chunk().await? {
        data.extend_from_slice(&chunk);
        if data.len() > limit {
            return Ok(None);
        };
    };
    Ok(Some(data))
}

pub fn describe_request_error(error: &reqwest::Error) -> &'static str {
    if error.is_timeout() {
        "request timeout"
    } else if error.is_connect() {
        "connection error"
    } else {
        "request error"
    }
}
