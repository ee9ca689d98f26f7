pub mod cloudstack_url;
pub mod label_selector;
pub mod refresh_interval;

pub use cloudstack_url::CloudstackUrl;
pub use label_selector::LabelSelector;
pub use refresh_interval::RefreshInterval;
