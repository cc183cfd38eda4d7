//! Output path resolution and overwrite protection.

use std::path::{Path, PathBuf};

use anyhow::{Context, bail};

/// Where to write one result, and whether clobbering is allowed.
pub struct OutputTarget {
    pub path: PathBuf,
    force: bool,
}

impl OutputTarget {
    /// Use `output` if given, else `input` with `extension` swapped in.
    pub fn resolve(input: &Path, output: Option<&Path>, extension: &str, force: bool) -> Self {
        let path = match output {
            Some(path) => path.to_path_buf(),
            None => input.with_extension(extension),
        };
        Self { path, force }
    }

    /// A numbered file inside `dir`, e.g. `anim-0003.png`.
    pub fn numbered(dir: &Path, stem: &str, index: usize, extension: &str, force: bool) -> Self {
        Self {
            path: dir.join(format!("{stem}-{index:04}.{extension}")),
            force,
        }
    }

    /// Refuse to overwrite the input, or any existing file without --force.
    pub fn check_writable(&self, input: &Path) -> anyhow::Result<()> {
        if let (Ok(ci), Ok(co)) = (input.canonicalize(), self.path.canonicalize()) {
            if ci == co {
                bail!("output would overwrite input: {}", input.display());
            }
        }
        if self.path.exists() && !self.force {
            bail!(
                "output already exists: {}\nUse --force to overwrite",
                self.path.display()
            );
        }
        Ok(())
    }

    /// Check, create parent directories, then write.
    pub fn write(&self, input: &Path, data: &[u8]) -> anyhow::Result<()> {
        self.check_writable(input)?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("creating directory: {}", parent.display()))?;
            }
        }
        std::fs::write(&self.path, data)
            .with_context(|| format!("writing {}", self.path.display()))?;
        tracing::debug!(path = %self.path.display(), bytes = data.len(), "wrote output");
        Ok(())
    }
}
