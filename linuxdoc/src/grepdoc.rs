//! The `grepdoc` subcommand: find sources referenced by reST trees.
use std::{
  collections::BTreeSet,
  fs,
  io::{self, Write},
  path::Path,
  sync::LazyLock,
};

use anyhow::{Context, Result};
use log::error;
use regex::Regex;
use walkdir::WalkDir;

/// `.. kernel-doc:: <path>` directive in a reST document.
static KERNEL_DOC_DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"^\s*\.\.\s+kernel-doc::\s*(.+?)\s*$").unwrap_or_else(|e| {
    error!("Failed to compile KERNEL_DOC_DIRECTIVE regex: {e}");
    #[allow(
      clippy::expect_used,
      reason = "This pattern is guaranteed to be valid"
    )]
    Regex::new(r"[^\s\S]").expect("regex pattern [^\\s\\S] should always compile")
  })
});

/// Print the sorted unique source paths referenced below `dir`.
pub fn run(dir: &Path) -> Result<usize> {
  let mut found: BTreeSet<String> = BTreeSet::new();

  for entry in WalkDir::new(dir).into_iter().filter_map(Result::ok) {
    let path = entry.path();
    let is_rest = path
      .extension()
      .and_then(|ext| ext.to_str())
      .is_some_and(|ext| ext == "rst" || ext == "txt");
    if !path.is_file() || !is_rest {
      continue;
    }
    let text = fs::read_to_string(path)
      .with_context(|| format!("Failed to read reST file: {}", path.display()))?;
    for line in text.lines() {
      if let Some(caps) = KERNEL_DOC_DIRECTIVE.captures(line) {
        found.insert(caps[1].to_owned());
      }
    }
  }

  let mut out = io::stdout().lock();
  for path in found {
    writeln!(out, "{path}")?;
  }
  Ok(0)
}
