use std::{
  env, fs,
  path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use linuxdoc_kdoc::{Markup, ParseOptions};

/// Root for relative source paths: `$srctree`, or the working directory.
#[must_use]
pub fn source_root() -> PathBuf {
  env::var_os("srctree")
    .map(PathBuf::from)
    .or_else(|| env::current_dir().ok())
    .unwrap_or_else(|| PathBuf::from("."))
}

/// Resolve a user-supplied path against the source root.
#[must_use]
pub fn resolve(path: &Path) -> PathBuf {
  if path.is_absolute() {
    path.to_owned()
  } else {
    source_root().join(path)
  }
}

/// Read a source file as UTF-8 with normalized line endings.
pub fn read_source(path: &Path) -> Result<String> {
  let raw = fs::read(path)
    .with_context(|| format!("Failed to read source file: {}", path.display()))?;
  Ok(
    String::from_utf8_lossy(&raw)
      .replace("\r\n", "\n")
      .replace('\r', "\n"),
  )
}

/// Whether autodoc/lintdoc should look at this file.
#[must_use]
pub fn is_source_file(path: &Path) -> bool {
  path
    .extension()
    .and_then(|ext| ext.to_str())
    .is_some_and(|ext| ext == "c" || ext == "h")
}

/// Base options shared by every subcommand.
pub fn base_options(fname: &str, markup: &str, sloppy: bool) -> Result<ParseOptions> {
  let mut opts = ParseOptions::new(fname);
  opts.markup = markup
    .parse::<Markup>()
    .map_err(|e| anyhow::anyhow!(e))?;
  opts.verbose_warn = !sloppy;
  opts.set_defaults();
  Ok(opts)
}

#[cfg(test)]
mod tests {
  use std::path::Path;

  use super::is_source_file;

  #[test]
  fn source_file_extensions() {
    assert!(is_source_file(Path::new("drivers/foo.c")));
    assert!(is_source_file(Path::new("include/foo.h")));
    assert!(!is_source_file(Path::new("README.rst")));
    assert!(!is_source_file(Path::new("Makefile")));
  }
}
