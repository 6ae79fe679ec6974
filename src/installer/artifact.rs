//! Download-and-copy installation for URL artifacts.
//!
//! The artifact is downloaded into the manifest's `workingdir`, extracted
//! next to the download, and the first application bundle (`*.app`) found in
//! the extracted tree is copied into the applications directory.
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use url::Url;
use walkdir::WalkDir;

use crate::error::{ConfigError, ResourceError};
use crate::exec::Executor;
use crate::resources::ResourceChange;
use crate::resources::helpers::fs::copy_dir_recursive;

/// Manifest config key naming the download directory.
pub const WORKING_DIR_KEY: &str = "workingdir";

/// Manifest config key overriding the applications directory.
pub const APPLICATIONS_DIR_KEY: &str = "applications_dir";

/// Applications directory used when the manifest does not set one.
pub const DEFAULT_APPLICATIONS_DIR: &str = "/Applications";

/// Extension of application bundles.
const BUNDLE_EXTENSION: &str = "app";

/// One URL artifact bound to the directories it is installed through.
#[derive(Debug, Clone)]
pub struct ArtifactInstaller<'a> {
    name: &'a str,
    url: &'a Url,
    working_dir: PathBuf,
    applications_dir: PathBuf,
}

impl<'a> ArtifactInstaller<'a> {
    /// Bind `name`/`url` to the directories named in the manifest `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingKey`] when `workingdir` is not set.
    pub fn from_config(
        name: &'a str,
        url: &'a Url,
        config: &BTreeMap<String, String>,
    ) -> Result<Self> {
        let working_dir = config
            .get(WORKING_DIR_KEY)
            .map(PathBuf::from)
            .ok_or_else(|| ConfigError::MissingKey {
                key: WORKING_DIR_KEY.to_string(),
                needed_by: url.to_string(),
            })?;
        let applications_dir = config
            .get(APPLICATIONS_DIR_KEY)
            .map_or_else(|| PathBuf::from(DEFAULT_APPLICATIONS_DIR), PathBuf::from);
        Ok(Self {
            name,
            url,
            working_dir,
            applications_dir,
        })
    }

    /// Where the downloaded file is stored.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::Download`] if the URL path has no file name.
    pub fn download_path(&self) -> Result<PathBuf> {
        let file_name = self
            .url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ResourceError::Download {
                url: self.url.to_string(),
                message: "URL path has no file name".to_string(),
            })?;
        Ok(self.working_dir.join(file_name))
    }

    /// Directory the archive is extracted into.
    #[must_use]
    pub fn extract_dir(&self) -> PathBuf {
        self.working_dir.join(self.name)
    }

    /// Directory bundles are copied into.
    #[must_use]
    pub fn applications_dir(&self) -> &Path {
        &self.applications_dir
    }

    /// Download, extract, and copy the bundle.
    ///
    /// Returns [`ResourceChange::AlreadyCorrect`] when a bundle of the same
    /// name already exists in the applications directory.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::MissingDirectory`] if the working directory
    /// does not exist, [`ResourceError::NetworkUnreachable`] or
    /// [`ResourceError::Download`] if the download fails,
    /// [`ResourceError::UnsupportedArchive`] for non-zip files, and
    /// [`ResourceError::ArtifactNotFound`] when no bundle was extracted.
    pub fn install(&self, executor: &dyn Executor) -> Result<ResourceChange> {
        if !self.working_dir.is_dir() {
            return Err(ResourceError::MissingDirectory(self.working_dir.clone()).into());
        }

        let archive = self.download_path()?;
        if archive.exists() {
            tracing::debug!("{} already downloaded", archive.display());
        } else {
            if !executor.network_reachable() {
                return Err(
                    ResourceError::NetworkUnreachable(format!("download {}", self.url)).into(),
                );
            }
            download(self.url, &archive)?;
        }

        let extracted = self.extract_dir();
        extract_zip(&archive, &extracted)?;
        let bundle = find_app_bundle(&extracted)?;

        let Some(bundle_name) = bundle.file_name() else {
            return Err(ResourceError::ArtifactNotFound(extracted).into());
        };
        let target = self.applications_dir.join(bundle_name);
        if target.exists() {
            tracing::debug!("{} already present", target.display());
            return Ok(ResourceChange::AlreadyCorrect);
        }

        tracing::info!(
            "Copying {} to {}",
            bundle.display(),
            self.applications_dir.display()
        );
        copy_dir_recursive(&bundle, &target)?;
        Ok(ResourceChange::Applied)
    }
}

/// Fetch `url` into `dest`.
///
/// The body is streamed into a `.part` file that is renamed on completion, so
/// an interrupted download is not mistaken for a finished one.
fn download(url: &Url, dest: &Path) -> Result<()> {
    tracing::info!("Downloading {url}");
    let download_err = |message: String| ResourceError::Download {
        url: url.to_string(),
        message,
    };

    let response = ureq::get(url.as_str())
        .call()
        .map_err(|e| download_err(e.to_string()))?;
    let mut reader = response.into_body().into_reader();

    let mut partial = dest.as_os_str().to_owned();
    partial.push(".part");
    let partial = PathBuf::from(partial);
    let mut file = File::create(&partial)
        .with_context(|| format!("creating {}", partial.display()))?;
    std::io::copy(&mut reader, &mut file).map_err(|e| download_err(e.to_string()))?;
    fs::rename(&partial, dest)
        .with_context(|| format!("renaming {} to {}", partial.display(), dest.display()))?;

    tracing::debug!("downloaded to {}", dest.display());
    Ok(())
}

/// Extract the zip archive at `archive` into `dest`.
///
/// # Errors
///
/// Returns [`ResourceError::UnsupportedArchive`] if `archive` is not a zip.
fn extract_zip(archive: &Path, dest: &Path) -> Result<()> {
    let file = File::open(archive).with_context(|| format!("opening {}", archive.display()))?;
    let mut zip = zip::ZipArchive::new(BufReader::new(file))
        .map_err(|_| ResourceError::UnsupportedArchive(archive.to_path_buf()))?;

    fs::create_dir_all(dest).with_context(|| format!("creating {}", dest.display()))?;
    tracing::info!("Extracting {}", archive.display());

    for i in 0..zip.len() {
        let mut entry = zip
            .by_index(i)
            .with_context(|| format!("reading entry {i} of {}", archive.display()))?;
        let Some(relative) = entry.enclosed_name() else {
            tracing::warn!("skipping unsafe zip entry {}", entry.name());
            continue;
        };
        let out = dest.join(&relative);

        if entry.is_dir() {
            fs::create_dir_all(&out).with_context(|| format!("creating {}", out.display()))?;
            continue;
        }
        if let Some(parent) = out.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }

        #[cfg(unix)]
        if entry.is_symlink() {
            use std::io::Read as _;
            let mut target = String::new();
            entry
                .read_to_string(&mut target)
                .with_context(|| format!("reading link target of {}", entry.name()))?;
            if !link_stays_inside(&relative, Path::new(&target)) {
                tracing::warn!("skipping zip link {} -> {target}", entry.name());
                continue;
            }
            if out.symlink_metadata().is_ok() {
                fs::remove_file(&out).with_context(|| format!("replacing {}", out.display()))?;
            }
            std::os::unix::fs::symlink(&target, &out)
                .with_context(|| format!("creating link {}", out.display()))?;
            continue;
        }
        let mut outfile =
            File::create(&out).with_context(|| format!("creating {}", out.display()))?;
        std::io::copy(&mut entry, &mut outfile)
            .with_context(|| format!("extracting {}", out.display()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt as _;
            if let Some(mode) = entry.unix_mode() {
                fs::set_permissions(&out, fs::Permissions::from_mode(mode))
                    .with_context(|| format!("setting mode on {}", out.display()))?;
            }
        }
    }
    Ok(())
}

/// Whether a link at `link` (relative to the extraction root) pointing at
/// `target` resolves inside that root.  Judged lexically.
#[cfg(unix)]
fn link_stays_inside(link: &Path, target: &Path) -> bool {
    use std::path::Component;

    let mut depth = link.components().count().saturating_sub(1);
    for component in target.components() {
        match component {
            Component::Normal(_) => depth += 1,
            Component::CurDir => {}
            Component::ParentDir => {
                if depth == 0 {
                    return false;
                }
                depth -= 1;
            }
            Component::RootDir | Component::Prefix(_) => return false,
        }
    }
    true
}

/// First `*.app` directory under `root`, in file-name order.
fn find_app_bundle(root: &Path) -> Result<PathBuf> {
    WalkDir::new(root)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .find(|entry| {
            entry.file_type().is_dir()
                && entry
                    .path()
                    .extension()
                    .is_some_and(|ext| ext == BUNDLE_EXTENSION)
        })
        .map(walkdir::DirEntry::into_path)
        .ok_or_else(|| ResourceError::ArtifactNotFound(root.to_path_buf()).into())
}
