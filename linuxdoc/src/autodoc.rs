//! The `autodoc` subcommand: mirror a source tree as reST.
use std::{
  collections::BTreeSet,
  fs,
  path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use linuxdoc_kdoc::{Parser, ReSTTranslator, parse_with_recovery};
use log::{error, info};
use rayon::prelude::*;
use walkdir::WalkDir;

use crate::utils;

/// Walk `srctree`, parse every C source and header, and write the reST
/// rendition into the mirrored path below `doctree`; returns the number
/// of kernel-doc errors.
pub fn run(
  srctree: &Path,
  doctree: &Path,
  threads: Option<usize>,
  markup: &str,
  sloppy: bool,
) -> Result<usize> {
  let files: Vec<PathBuf> = WalkDir::new(srctree)
    .into_iter()
    .filter_map(Result::ok)
    .filter(|e| e.path().is_file() && utils::is_source_file(e.path()))
    .map(walkdir::DirEntry::into_path)
    .collect();
  info!("autodoc: {} source files below {}", files.len(), srctree.display());

  let pool = rayon::ThreadPoolBuilder::new()
    .num_threads(threads.unwrap_or(0))
    .build()
    .context("Failed to build worker pool")?;

  let errors: usize = pool.install(|| {
    files
      .par_iter()
      .map(|path| {
        process_file(path, srctree, doctree, markup, sloppy).unwrap_or_else(|e| {
          error!("{}: {e}", path.display());
          1
        })
      })
      .sum()
  });

  write_indexes(doctree)?;
  Ok(errors)
}

/// Parse one file; skip files without any kernel-doc comment.
fn process_file(
  path: &Path,
  srctree: &Path,
  doctree: &Path,
  markup: &str,
  sloppy: bool,
) -> Result<usize> {
  let src = utils::read_source(path)?;
  if !src.contains("/**") {
    return Ok(0);
  }

  let rel = path.strip_prefix(srctree).unwrap_or(path);
  let mut opts = utils::base_options(&rel.display().to_string(), markup, sloppy)?;
  opts.use_all_docs = true;
  opts.gather_context = true;
  opts.set_defaults();

  let mut parser = Parser::new(opts, ReSTTranslator::new(Vec::new()));
  if let Err(e) = parse_with_recovery(&mut parser, &src) {
    error!("{e}");
    return Ok(parser.errors() + 1);
  }
  parser.close()?;
  let errors = parser.errors();

  // foo/bar.c maps to <doctree>/foo/bar.c.rst; appending keeps a header
  // and a source of the same stem apart.
  let mut out_path = doctree.join(rel);
  let file_name = out_path
    .file_name()
    .map_or_else(|| "index".to_owned(), |n| n.to_string_lossy().into_owned());
  out_path.set_file_name(format!("{file_name}.rst"));

  if let Some(parent) = out_path.parent() {
    fs::create_dir_all(parent)
      .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
  }
  let (_, translator, _) = parser.into_parts();
  fs::write(&out_path, translator.into_inner())
    .with_context(|| format!("Failed to write reST file: {}", out_path.display()))?;

  Ok(errors)
}

/// Generate an `index.rst` with a toctree in every output directory.
fn write_indexes(doctree: &Path) -> Result<()> {
  let mut dirs: BTreeSet<PathBuf> = BTreeSet::new();
  for entry in WalkDir::new(doctree).into_iter().filter_map(Result::ok) {
    if entry.path().is_dir() {
      dirs.insert(entry.into_path());
    }
  }

  for dir in dirs {
    let mut entries: BTreeSet<String> = BTreeSet::new();
    for child in fs::read_dir(&dir)
      .with_context(|| format!("Failed to list directory: {}", dir.display()))?
      .filter_map(Result::ok)
    {
      let path = child.path();
      let name = child.file_name().to_string_lossy().into_owned();
      if path.is_dir() {
        entries.insert(format!("{name}/index"));
      } else if name.ends_with(".rst") && name != "index.rst" {
        entries.insert(name.trim_end_matches(".rst").to_owned());
      }
    }
    if entries.is_empty() {
      continue;
    }

    let title = dir
      .file_name()
      .map_or_else(|| "Index".to_owned(), |n| n.to_string_lossy().into_owned());
    let mut index = String::new();
    index.push_str(&title);
    index.push('\n');
    index.push_str(&"=".repeat(title.chars().count()));
    index.push_str("\n\n.. toctree::\n    :maxdepth: 1\n\n");
    for entry in entries {
      index.push_str("    ");
      index.push_str(&entry);
      index.push('\n');
    }

    fs::write(dir.join("index.rst"), index)
      .with_context(|| format!("Failed to write index below {}", dir.display()))?;
  }
  Ok(())
}
