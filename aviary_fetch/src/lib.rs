pub mod agent;
pub mod collections;
pub mod constants;
pub mod deliver;
pub mod fetch;
pub mod http_client;
pub mod webfinger;
