use aviary_core::crypto_rsa::RsaSecretKey;

pub struct RequestSigner {
    pub key: RsaSecretKey,
    pub key_id: String,
}

pub struct FederationAgent {
    /// User-Agent string
    pub user_agent: Option<String>,

    pub response_size_limit: usize,
    pub fetcher_timeout: u64,
    pub deliverer_timeout: u64,

    /// Sign GET requests proactively instead of retrying on 401
    pub sign_fetches: bool,

    /// Key for creating HTTP signatures
    pub signer: Option<RequestSigner>,
}

impl Default for FederationAgent {
    fn default() -> Self {
        Self {
            user_agent: None,
            response_size_limit: 2_000_000,
            fetcher_timeout: 10,
            deliverer_timeout: 10,
            sign_fetches: false,
            signer: None,
        }
    }
}
