use base64_ext::{
    engine::general_purpose::STANDARD,
    Engine,
};

pub use base64_ext::DecodeError;

pub fn encode(data: impl AsRef<[u8]>) -> String {
    STANDARD.encode(data)
}

pub fn decode(data: impl AsRef<[u8]>) -> Result<Vec<u8>, DecodeError> {
    STANDARD.decode(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_decode() {
        let value = "test*123";
        let encoded = encode(value);
        assert_eq!(encoded, "dGVzdCoxMjM=");
        let decoded = decode(&encoded).unwrap();
        assert_eq!(decoded, value.as_bytes());
    }
}
