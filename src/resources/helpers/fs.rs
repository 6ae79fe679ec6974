//! File-system resource helpers.
use anyhow::{Context as _, Result};
use std::path::Path;

/// Recursively copy a directory tree such as an application bundle.
///
/// Symlinks inside the tree are recreated as symlinks on unix (bundles use
/// them for framework versions); elsewhere they are followed.
///
/// # Errors
///
/// Returns an error if the destination directory cannot be created, a source
/// entry cannot be read, or a file cannot be copied.
pub fn copy_dir_recursive(src: &Path, dst: &Path) -> Result<()> {
    std::fs::create_dir_all(dst)
        .with_context(|| format!("creating directory {}", dst.display()))?;
    for entry in
        std::fs::read_dir(src).with_context(|| format!("reading directory {}", src.display()))?
    {
        let entry = entry.with_context(|| format!("reading entry in {}", src.display()))?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        #[cfg(unix)]
        if entry
            .file_type()
            .with_context(|| format!("reading file type of {}", src_path.display()))?
            .is_symlink()
        {
            let target = std::fs::read_link(&src_path)
                .with_context(|| format!("reading link {}", src_path.display()))?;
            std::os::unix::fs::symlink(&target, &dst_path)
                .with_context(|| format!("creating link {}", dst_path.display()))?;
            continue;
        }

        if src_path.is_dir() {
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            std::fs::copy(&src_path, &dst_path).with_context(|| {
                format!("copying {} to {}", src_path.display(), dst_path.display())
            })?;
        }
    }
    Ok(())
}
