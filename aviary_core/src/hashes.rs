use sha2::{Digest, Sha256};

pub fn sha256(input: &[u8]) -> [u8; 32] {
    Sha256::digest(input).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256() {
        let digest = sha256(b"test");
        assert_eq!(
            digest[..4],
            [0x9f, 0x86, 0xd0, 0x81],
        );
    }
}
