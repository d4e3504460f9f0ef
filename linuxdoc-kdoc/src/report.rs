use log::{debug, error, info, warn};

/// Diagnostic sink for a single parse.
///
/// Messages are routed through the `log` facade formatted as
/// `<filename>:<line>: <message>`, and error/warning totals are tracked
/// here so exit codes and lint summaries do not depend on logger
/// configuration.
///
/// `verbose_warn = false` ("sloppy" mode) drops non-severe warnings from
/// both the output and the warning count.
#[derive(Debug, Default, Clone)]
pub struct Reporter {
  fname:        String,
  errors:       usize,
  warnings:     usize,
  verbose_warn: bool,
}

impl Reporter {
  #[must_use]
  pub fn new(fname: &str, verbose_warn: bool) -> Self {
    Self {
      fname: fname.to_owned(),
      errors: 0,
      warnings: 0,
      verbose_warn,
    }
  }

  #[must_use]
  pub const fn errors(&self) -> usize {
    self.errors
  }

  #[must_use]
  pub const fn warnings(&self) -> usize {
    self.warnings
  }

  pub fn error(&mut self, line: u32, msg: &str) {
    self.errors += 1;
    error!("{}:{line}: {msg}", self.fname);
  }

  pub fn warn(&mut self, line: u32, msg: &str) {
    self.warnings += 1;
    warn!("{}:{line}: {msg}", self.fname);
  }

  /// Non-severe warning, suppressed in sloppy mode.
  pub fn vwarn(&mut self, line: u32, msg: &str) {
    if self.verbose_warn {
      self.warn(line, msg);
    }
  }

  pub fn info(&self, line: u32, msg: &str) {
    info!("{}:{line}: {msg}", self.fname);
  }

  pub fn debug(&self, line: u32, msg: &str) {
    debug!("{}:{line}: {msg}", self.fname);
  }
}
