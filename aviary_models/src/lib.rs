pub mod activities;
pub mod actors;
pub mod background_jobs;
pub mod database;
pub mod deliveries;
pub mod follows;
pub mod instances;
pub mod interactions;
pub mod messages;
pub mod notifications;
pub mod relays;
pub mod reports;
pub mod signing_keys;
