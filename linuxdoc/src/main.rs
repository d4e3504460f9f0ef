use anyhow::Result;
use log::LevelFilter;

mod autodoc;
mod cli;
mod grepdoc;
mod lint;
mod rest;
mod utils;

use cli::{Cli, Commands};

fn main() -> Result<()> {
  // Parse command line arguments
  let cli = Cli::parse_args();

  // Initialize logging first so every command can report diagnostics
  let level = if cli.debug {
    LevelFilter::Debug
  } else if cli.verbose {
    LevelFilter::Info
  } else if cli.quiet {
    LevelFilter::Off
  } else {
    LevelFilter::Warn
  };
  env_logger::Builder::new()
    .filter_level(level)
    .write_style(env_logger::WriteStyle::Always)
    .init();

  let errors = match &cli.command {
    Commands::Rest {
      files,
      id_prefix,
      markup,
      use_names,
      exported,
      internal,
      list_exports,
      list_internals,
      skip_preamble,
      skip_epilog,
      symbols_exported_method,
      symbols_exported_identifiers,
      known_attrs,
      sloppy,
      man_sect,
    } => rest::run(&rest::RestOpts {
      files: files.clone(),
      id_prefix: id_prefix.clone(),
      markup: markup.clone(),
      use_names: use_names.clone(),
      exported: *exported,
      internal: *internal,
      list_exports: *list_exports,
      list_internals: list_internals.clone(),
      skip_preamble: *skip_preamble,
      skip_epilog: *skip_epilog,
      exp_method: symbols_exported_method.clone(),
      exp_ids: symbols_exported_identifiers.clone(),
      known_attrs: known_attrs.clone(),
      sloppy: *sloppy,
      man_sect: *man_sect,
    })?,

    Commands::Autodoc {
      srctree,
      doctree,
      threads,
      markup,
      sloppy,
    } => autodoc::run(srctree, doctree, *threads, markup, *sloppy)?,

    Commands::Lintdoc {
      paths,
      markup,
      sloppy,
    } => lint::run(paths, markup, *sloppy)?,

    Commands::Grepdoc { dir } => grepdoc::run(dir)?,
  };

  if errors > 0 {
    anyhow::bail!("finished with {errors} kernel-doc error(s)");
  }
  Ok(())
}
