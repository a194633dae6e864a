pub mod base64;
pub mod crypto_rsa;
pub mod hashes;
pub mod http_digest;
pub mod http_signatures;
pub mod http_types;
pub mod media_type;
pub mod urls;
