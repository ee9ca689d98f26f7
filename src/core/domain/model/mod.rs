pub mod autoscale_profile;
pub mod catalog;
pub mod node_template;
pub mod virtual_machine;
pub mod vm_profile;
