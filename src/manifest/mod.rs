//! Manifest documents: the on-disk JSON format and its loader.
//!
//! A manifest declares the desired state of a machine: packages to install,
//! repositories to clone, and scripts to run.  It may include manifests
//! published in other repositories; see [`crate::resolver`] for how includes
//! are followed and merged.
pub mod loader;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

pub use loader::ManifestLoader;

/// Directory under the install root holding snix's own files.
pub const CODE_DIRNAME: &str = "__snix__";

/// File name of the manifest schema inside [`CODE_DIRNAME`].
pub const SCHEMA_FILE: &str = "schema.json";

/// Extension of manifest files.
pub const MANIFEST_EXTENSION: &str = "snix";

/// Draft-04 schema shipped with the binary; `snix init` installs it.
pub const BUNDLED_SCHEMA: &str = include_str!("../../schema/schema.json");

/// Location of the schema for the install root `home`.
#[must_use]
pub fn schema_path(home: &Path) -> PathBuf {
    home.join(CODE_DIRNAME).join(SCHEMA_FILE)
}

/// One validated manifest file.
///
/// Every key is optional; an empty object is a valid manifest that declares
/// nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ManifestDocument {
    /// Free-form settings such as `workingdir` and `applications_dir`.
    pub config: BTreeMap<String, String>,
    /// Packages to install.
    pub items: Vec<ItemSpec>,
    /// Repository locations to clone into the install root.
    pub repos: Vec<String>,
    /// Script paths relative to the install root.
    pub custom_scripts: Vec<String>,
    /// Manifests from other repositories to merge in.
    pub includes: Vec<Include>,
}

/// A group of packages installed the same way.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ItemSpec {
    /// Package names; each becomes its own item.
    pub names: Vec<String>,
    /// How to install them: `brew`, `brew-cask`, a URL, or a shell command.
    pub via: String,
    /// Directory, relative to the install root, a shell command runs in.
    #[serde(default)]
    pub dir: Option<String>,
}

/// Reference to a group manifest in another repository.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Include {
    /// Repository holding the group manifest.
    pub upstream_repo: String,
    /// Group directory; the manifest is `<group>/<group>.snix` inside the clone.
    pub path_relative_to_group_manifest_dir: String,
}

impl Include {
    /// Path of the included manifest once its repository lives in
    /// `home/<repo_dir>`.
    #[must_use]
    pub fn manifest_path(&self, home: &Path, repo_dir: &str) -> PathBuf {
        let group = &self.path_relative_to_group_manifest_dir;
        home.join(repo_dir)
            .join(group)
            .join(format!("{group}.{MANIFEST_EXTENSION}"))
    }
}
