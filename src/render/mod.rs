//! Projection of a sanitized object collection into IaC artifacts

pub mod ansible;
pub mod field;
pub mod terraform;

pub use ansible::AnsibleTaskBuilder;
pub use terraform::TerraformResourceBuilder;
