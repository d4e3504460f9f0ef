use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Command line interface for linuxdoc
#[derive(Parser, Debug)]
#[command(author, version, about = "Process kernel-doc comments in C/C++ sources")]
pub struct Cli {
  /// Subcommand to execute (see [`Commands`])
  #[command(subcommand)]
  pub command: Commands,

  /// Verbose output with log messages to stderr
  #[arg(short, long, global = true)]
  pub verbose: bool,

  /// Debug messages to stderr
  #[arg(long, global = true)]
  pub debug: bool,

  /// No messages to stderr
  #[arg(short, long, global = true)]
  pub quiet: bool,
}

/// All supported subcommands for the linuxdoc CLI.
#[derive(Subcommand, Debug)]
pub enum Commands {
  /// Convert kernel-doc comments to reST markup on stdout.
  Rest {
    /// Source file(s) to parse, absolute or relative to `$srctree`.
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Prefix for automatically generated IDs. IDs are generated from
    /// declaration and section names; the prefix also acts as the
    /// C-domain namespace.
    #[arg(long, default_value = "")]
    id_prefix: String,

    /// Markup of the comments. Change this only if you know what you
    /// do; new comments must be marked up with reST.
    #[arg(long, default_value = "reST", value_parser = ["reST", "kernel-doc"])]
    markup: String,

    /// Print only the given functions, structs or DOC titles.
    #[arg(long, num_args = 1..)]
    use_names: Vec<String>,

    /// Print documentation of all exported symbols.
    #[arg(long)]
    exported: bool,

    /// Print documentation of all symbols that are documented but not
    /// exported.
    #[arg(long)]
    internal: bool,

    /// List all exported symbols.
    #[arg(long)]
    list_exports: bool,

    /// List symbols, titles or whatever is documented but *not* exported.
    #[arg(long, num_args = 1..,
          value_parser = ["DOC", "function", "struct", "union", "enum", "typedef", "all"])]
    list_internals: Vec<String>,

    /// Skip the preamble in the output.
    #[arg(long)]
    skip_preamble: bool,

    /// Skip the epilog in the output.
    #[arg(long)]
    skip_epilog: bool,

    /// How an exported symbol is marked in the source.
    #[arg(long, default_value = "macro", value_parser = ["macro", "attribute"])]
    symbols_exported_method: String,

    /// Identifiers that mark an exported symbol.
    #[arg(long, num_args = 1..)]
    symbols_exported_identifiers: Vec<String>,

    /// Known attributes hidden from displayed function prototypes.
    #[arg(long, num_args = 1..)]
    known_attrs: Vec<String>,

    /// Sloppy linting: report only severe errors.
    #[arg(long)]
    sloppy: bool,

    /// Emit a `:man-sect:` field on function declarations.
    #[arg(long)]
    man_sect: Option<u32>,
  },

  /// Parse a whole source tree and write a mirrored reST tree.
  Autodoc {
    /// Root of the C/C++ sources.
    srctree: PathBuf,

    /// Output root for the generated reST files.
    doctree: PathBuf,

    /// Number of threads for parallel file processing.
    #[arg(short = 'j', long)]
    threads: Option<usize>,

    /// Markup of the comments.
    #[arg(long, default_value = "reST", value_parser = ["reST", "kernel-doc"])]
    markup: String,

    /// Sloppy linting: report only severe errors.
    #[arg(long)]
    sloppy: bool,
  },

  /// Parse only; report kernel-doc errors and warnings.
  Lintdoc {
    /// Files or directories to check.
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Markup of the comments.
    #[arg(long, default_value = "reST", value_parser = ["reST", "kernel-doc"])]
    markup: String,

    /// Sloppy linting: report only severe errors.
    #[arg(long)]
    sloppy: bool,
  },

  /// Scan a reST tree for `.. kernel-doc::` directives and print the
  /// referenced source paths.
  Grepdoc {
    /// Directory containing reST files.
    dir: PathBuf,
  },
}

impl Cli {
  #[must_use]
  pub fn parse_args() -> Self {
    Self::parse()
  }
}
