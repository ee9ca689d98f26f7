pub mod group_registry;
pub mod group_scaler;
pub mod node_group;
pub mod project_cache;
pub mod provisioner;
