//! The `lintdoc` subcommand: parse-only error reporting.
use std::path::{Path, PathBuf};

use anyhow::Result;
use linuxdoc_kdoc::{NullTranslator, Parser, parse_with_recovery};
use log::error;
use walkdir::WalkDir;

use crate::utils;

/// Check every given file (or every source file below a given directory);
/// returns the number of kernel-doc errors.
pub fn run(paths: &[PathBuf], markup: &str, sloppy: bool) -> Result<usize> {
  let mut files: Vec<PathBuf> = Vec::new();
  for path in paths {
    let path = utils::resolve(path);
    if path.is_dir() {
      files.extend(
        WalkDir::new(&path)
          .into_iter()
          .filter_map(Result::ok)
          .filter(|e| e.path().is_file() && utils::is_source_file(e.path()))
          .map(walkdir::DirEntry::into_path),
      );
    } else {
      files.push(path);
    }
  }

  let mut errors = 0usize;
  let mut warnings = 0usize;
  for file in &files {
    let (e, w) = lint_file(file, markup, sloppy)?;
    errors += e;
    warnings += w;
  }

  #[allow(clippy::print_stdout, reason = "The lint summary is the command's output")]
  {
    println!(
      "checked {} file(s): {errors} error(s), {warnings} warning(s)",
      files.len()
    );
  }
  Ok(errors)
}

fn lint_file(path: &Path, markup: &str, sloppy: bool) -> Result<(usize, usize)> {
  let src = utils::read_source(path)?;
  let opts = utils::base_options(&path.display().to_string(), markup, sloppy)?;
  let mut parser = Parser::new(opts, NullTranslator);
  if let Err(e) = parse_with_recovery(&mut parser, &src) {
    error!("{e}");
    return Ok((parser.errors() + 1, parser.warnings()));
  }
  parser.close()?;
  Ok((parser.errors(), parser.warnings()))
}
