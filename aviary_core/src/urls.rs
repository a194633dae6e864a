//! URL helpers
use url::Url;

#[derive(thiserror::Error, Debug)]
#[error("{0}")]
pub struct UrlError(pub &'static str);

/// Parses an absolute http(s) URL
pub fn parse_http_url(value: &str) -> Result<Url, UrlError> {
    let url = Url::parse(value)
        .map_err(|_| UrlError("invalid URL"))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError("invalid URL scheme"));
    };
    if url.host_str().is_none() {
        return Err(UrlError("URL without host"));
    };
    Ok(url)
}

pub fn is_http_url(value: &str) -> bool {
    parse_http_url(value).is_ok()
}

/// Returns the host name of an http(s) URL (without port number)
pub fn get_hostname(value: &str) -> Result<String, UrlError> {
    let url = parse_http_url(value)?;
    let hostname = url.host_str()
        .expect("host presence should be already verified")
        .to_string();
    Ok(hostname)
}

/// Returns host with port number, as it appears in the Host header
pub fn get_host_header_value(value: &str) -> Result<String, UrlError> {
    let url = parse_http_url(value)?;
    let hostname = url.host_str()
        .expect("host presence should be already verified");
    let host = if let Some(port) = url.port() {
        format!("{}:{}", hostname, port)
    } else {
        hostname.to_string()
    };
    Ok(host)
}

pub fn is_same_origin(url_1: &str, url_2: &str) -> Result<bool, UrlError> {
    let url_1 = parse_http_url(url_1)?;
    let url_2 = parse_http_url(url_2)?;
    Ok(url_1.origin() == url_2.origin())
}

/// Removes the fragment part of a URL (`{actor_id}#main-key` -> `{actor_id}`)
pub fn remove_fragment(value: &str) -> Result<String, UrlError> {
    let mut url = parse_http_url(value)?;
    url.set_fragment(None);
    Ok(url.to_string().trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_http_url() {
        let result = parse_http_url("https://social.example/users/alice");
        assert_eq!(result.is_ok(), true);
        let result = parse_http_url("ftp://social.example/file");
        assert_eq!(result.is_err(), true);
        let result = parse_http_url("/users/alice");
        assert_eq!(result.is_err(), true);
    }

    #[test]
    fn test_get_hostname() {
        let hostname = get_hostname("https://social.example:8443/inbox").unwrap();
        assert_eq!(hostname, "social.example");
    }

    #[test]
    fn test_get_host_header_value() {
        let host = get_host_header_value("https://social.example/inbox").unwrap();
        assert_eq!(host, "social.example");
        let host = get_host_header_value("http://127.0.0.1:1234/inbox").unwrap();
        assert_eq!(host, "127.0.0.1:1234");
    }

    #[test]
    fn test_is_same_origin() {
        let result = is_same_origin(
            "https://social.example/users/alice",
            "https://social.example/users/alice#main-key",
        ).unwrap();
        assert_eq!(result, true);
        let result = is_same_origin(
            "https://social.example/users/alice",
            "https://other.example/users/alice",
        ).unwrap();
        assert_eq!(result, false);
    }

    #[test]
    fn test_remove_fragment() {
        let key_id = "https://social.example/users/alice#main-key";
        let actor_id = remove_fragment(key_id).unwrap();
        assert_eq!(actor_id, "https://social.example/users/alice");
    }
}
