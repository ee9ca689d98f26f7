pub mod api_client;
pub mod cloudstack_client;
pub mod config;
