//! Adapters between http 0.2 types (actix-web) and http 1.x types
use http::{HeaderMap, HeaderName, HeaderValue, Method, Uri};

pub fn method_adapter(method: &http_0_2::Method) -> Method {
    method.as_str().parse()
        .expect("HTTP method should be convertible")
}

pub fn uri_adapter(uri: &http_0_2::Uri) -> Uri {
    uri.to_string().parse()
        .expect("URI should be convertible")
}

pub fn header_map_adapter(headers: &http_0_2::HeaderMap) -> HeaderMap {
    let mut converted = HeaderMap::new();
    for (name, value) in headers {
        let Ok(name) = HeaderName::from_bytes(name.as_str().as_bytes()) else {
            continue;
        };
        let Ok(value) = HeaderValue::from_bytes(value.as_bytes()) else {
            continue;
        };
        converted.append(name, value);
    };
    converted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_adapter() {
        let method = method_adapter(&http_0_2::Method::POST);
        assert_eq!(method, Method::POST);
    }

    #[test]
    fn test_header_map_adapter() {
        let mut headers = http_0_2::HeaderMap::new();
        headers.insert(
            http_0_2::header::HOST,
            http_0_2::HeaderValue::from_static("social.example"),
        );
        let converted = header_map_adapter(&headers);
        assert_eq!(converted.get("host").unwrap(), "social.example");
    }
}
