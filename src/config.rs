use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::sanitize::SkipFieldSet;
use crate::traits::FileSystem;

/// Controller API version the generated artifacts target by default
pub const DEFAULT_API_VERSION: &str = "21.1.3";

pub const DEFAULT_MODULE_PREFIX: &str = "avi";
pub const DEFAULT_PROVIDER_SOURCE: &str = "vmware/avi";
pub const DEFAULT_TENANT: &str = "admin";
pub const DEFAULT_OUTPUT_DIR: &str = "output";

/// Export settings, loaded from an optional YAML file and overridden by CLI flags
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    /// Render the Ansible playbook
    pub ansible: bool,

    /// Render the Terraform provider, variable and resource files
    pub terraform: bool,

    /// Controller API version sent with the fetch and used as the version default
    pub api_version: String,

    /// Prefix of Ansible module names and Terraform resource types
    pub module_prefix: String,

    /// Fields removed from every mapping during sanitation
    pub skip_fields: SkipFieldSet,

    pub provider_source: String,

    /// Terraform provider release pin; defaults to `api_version`
    pub provider_version: Option<String>,

    pub tenant: String,

    pub output_dir: String,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            ansible: false,
            terraform: false,
            api_version: DEFAULT_API_VERSION.to_string(),
            module_prefix: DEFAULT_MODULE_PREFIX.to_string(),
            skip_fields: SkipFieldSet::default(),
            provider_source: DEFAULT_PROVIDER_SOURCE.to_string(),
            provider_version: None,
            tenant: DEFAULT_TENANT.to_string(),
            output_dir: DEFAULT_OUTPUT_DIR.to_string(),
        }
    }
}

impl ExportOptions {
    /// Load options from a YAML file
    pub fn load(fs: &dyn FileSystem, path: &Path) -> Result<Self> {
        let content = fs
            .read_to_string(path)
            .with_context(|| format!("Failed to read options file: {:?}", path))?;

        Self::from_yaml(&content)
            .with_context(|| format!("Failed to parse options file: {:?}", path))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let options: ExportOptions = serde_yaml::from_str(content)?;
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> Result<()> {
        semver::Version::parse(&self.api_version)
            .with_context(|| format!("Invalid API version '{}'", self.api_version))?;

        if self.module_prefix.is_empty()
            || !self
                .module_prefix
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            bail!("Invalid module prefix '{}'", self.module_prefix);
        }

        Ok(())
    }

    pub fn provider_version(&self) -> &str {
        self.provider_version.as_deref().unwrap_or(&self.api_version)
    }
}
