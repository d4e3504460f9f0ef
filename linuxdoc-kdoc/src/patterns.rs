//! Curated regular expressions of the kernel-doc recognizer.
//!
//! The scanner is intentionally not a C grammar: these patterns recognize
//! the *shapes* of comment lines and declarations, nothing more. They are
//! grouped by concern and compiled once.
use std::sync::LazyLock;

use log::error;
use regex::Regex;

/// Fallback used when a pattern fails to compile; matches nothing.
pub(crate) fn never_matching() -> Regex {
  #[allow(
    clippy::expect_used,
    reason = "This pattern is guaranteed to be valid"
  )]
  Regex::new(r"[^\s\S]").expect("regex pattern [^\\s\\S] should always compile")
}

fn build(pattern: &str) -> Regex {
  Regex::new(pattern).unwrap_or_else(|e| {
    error!("Failed to compile pattern {pattern:?}: {e}");
    never_matching()
  })
}

// Comment delimiters

/// A line that is exactly `/**`, opening a kernel-doc comment.
pub static DOC_START: LazyLock<Regex> =
  LazyLock::new(|| build(r"^/\*\*\s*$"));

/// An indented `/**` inside a declaration body (split-doc comment).
pub static DOC_SPLIT_START: LazyLock<Regex> =
  LazyLock::new(|| build(r"^\s*/\*\*\s*$"));

/// A line containing the comment terminator.
pub static DOC_END: LazyLock<Regex> = LazyLock::new(|| build(r"\*/"));

/// The continuation marker at the start of a comment body line.
pub static DOC_COM: LazyLock<Regex> = LazyLock::new(|| build(r"^\s*\*\s?"));

/// `* DOC: <title>` opening a free-form block.
pub static DOC_BLOCK: LazyLock<Regex> =
  LazyLock::new(|| build(r"^\s*\*\s*DOC:\s*(.*?)\s*$"));

// Name-line recognizers (state: seek name)

/// `* struct foo`, `* enum bar`, ... a keyword-qualified declaration name.
pub static DOC_DECL_KIND: LazyLock<Regex> = LazyLock::new(|| {
  build(r"^\s*\*\s*(struct|union|enum|typedef|function)\s+([\w.]+)")
});

/// First identifier on the name line; without a keyword it names a function.
pub static DOC_DECL_NAME: LazyLock<Regex> =
  LazyLock::new(|| build(r"^\s*\*\s*([\w.]+)"));

// Section headers (state: scan sections)

/// `@param:`, `@param.sub:` or `@...:` introducing a parameter description.
pub static SECT_PARAM: LazyLock<Regex> = LazyLock::new(|| {
  build(r"^\s*\*\s*@(\w+(?:\.\w+)*|\.\.\.)\s*:\s*(.*?)\s*$")
});

/// kernel-doc markup: any `Title words:` header. The content guard against
/// `http://` lives in the caller.
pub static SECT_TITLE: LazyLock<Regex> = LazyLock::new(|| {
  build(r"^\s*\*\s*([A-Za-z_][-\w ]*?)\s*:\s*(.*?)\s*$")
});

/// reST markup: the whitelisted section titles.
pub static SECT_KNOWN: LazyLock<Regex> = LazyLock::new(|| {
  build(
    r"(?i)^\s*\*\s*(description|context|returns?|examples?|notes?|intro(?:duction)?|todo)\s*:\s*(.*?)\s*$",
  )
});

/// reST markup: a bare `Title:` alone on its line.
pub static SECT_BARE_TITLE: LazyLock<Regex> =
  LazyLock::new(|| build(r"^\s*\*\s*([A-Za-z_][-\w ]*?):\s*$"));

// Prototype shapes

/// Ordered function-prototype shapes, longest specifier run first.
///
/// Applied to a normalized `ret name(args)` string; captures are
/// `(return type, name, argument list)`. The first match wins.
pub static FUNC_PROTOTYPES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
  [
    r"^(\w+(?:\s+\w+){3}\s*\*+)\s*([\w~:]+)\s*\((.*)\)$",
    r"^(\w+(?:\s+\w+){3})\s+([\w~:]+)\s*\((.*)\)$",
    r"^(\w+(?:\s+\w+){2}\s*\*+)\s*([\w~:]+)\s*\((.*)\)$",
    r"^(\w+(?:\s+\w+){2})\s+([\w~:]+)\s*\((.*)\)$",
    r"^(\w+\s+\w+\s*\*+)\s*([\w~:]+)\s*\((.*)\)$",
    r"^(\w+\s+\w+)\s+([\w~:]+)\s*\((.*)\)$",
    r"^(\w+\s*\*+)\s*([\w~:]+)\s*\((.*)\)$",
    r"^(\w+)\s+([\w~:]+)\s*\((.*)\)$",
    r"^()([\w~:]+)\s*\((.*)\)$",
  ]
  .iter()
  .map(|p| build(p))
  .collect()
});

/// `#define NAME` or `#define NAME(args)`.
pub static DEFINE_PROTO: LazyLock<Regex> =
  LazyLock::new(|| build(r"^#\s*define\s+(\w+)(?:\(([^)]*)\))?"));

// Macro forms needing normalization

pub static SYSCALL_DEFINE: LazyLock<Regex> =
  LazyLock::new(|| build(r"^SYSCALL_DEFINE(\d)\s*\("));

pub static TRACE_EVENT: LazyLock<Regex> =
  LazyLock::new(|| build(r"^TRACE_EVENT\s*\(\s*(\w+)"));

pub static DEFINE_EVENT: LazyLock<Regex> =
  LazyLock::new(|| build(r"^DEFINE_EVENT\s*\(\s*\w+\s*,\s*(\w+)"));

pub static DEFINE_SINGLE_EVENT: LazyLock<Regex> =
  LazyLock::new(|| build(r"^DEFINE_SINGLE_EVENT\s*\(\s*(\w+)"));

/// `TP_PROTO(` opener; the balanced argument list is scanned by hand.
pub static TP_PROTO: LazyLock<Regex> =
  LazyLock::new(|| build(r"TP_PROTO\s*\("));

// Prototype scrubbing

/// Known storage-class and kernel modifiers stripped from prototypes.
pub static MODIFIERS: LazyLock<Regex> = LazyLock::new(|| {
  build(
    r"\b(?:static|extern|__always_inline|__inline__|inline|noinline|asmlinkage|__init_or_module|__init|__meminit|__must_check|__weak)\b",
  )
});

/// `__attribute__((...))` with one level of nested parentheses.
pub static ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
  build(r"__attribute__\s*\(\((?:[^()]|\([^()]*\))*\)\)")
});

pub static ALIGNED_ATTR: LazyLock<Regex> =
  LazyLock::new(|| build(r"__aligned\s*\([^)]*\)|CRYPTO_MINALIGN_ATTR"));

// Struct body cleanup

/// `/* private: */ ... /* public: */` region (terminated form).
pub static PRIVATE_REGION: LazyLock<Regex> = LazyLock::new(|| {
  build(r"(?s)/\*\s*private:.*?/\*\s*public:[^*]*\*/")
});

/// `/* private: */ ...` running to the end of the body.
pub static PRIVATE_TAIL: LazyLock<Regex> =
  LazyLock::new(|| build(r"(?s)/\*\s*private:.*$"));

pub static KMEMCHECK_BITFIELD: LazyLock<Regex> =
  LazyLock::new(|| build(r"kmemcheck_bitfield_[a-z]+\s*\([^)]*\)\s*;"));

pub static C89_COMMENT: LazyLock<Regex> =
  LazyLock::new(|| build(r"(?s)/\*.*?\*/"));

pub static C99_COMMENT: LazyLock<Regex> = LazyLock::new(|| build(r"//.*"));

pub static DECLARE_BITMAP: LazyLock<Regex> = LazyLock::new(|| {
  build(r"DECLARE_BITMAP\s*\(\s*([^,)]+?)\s*,\s*([^)]+?)\s*\)")
});

pub static DECLARE_HASHTABLE: LazyLock<Regex> = LazyLock::new(|| {
  build(r"DECLARE_HASHTABLE\s*\(\s*([^,)]+?)\s*,\s*([^)]+?)\s*\)")
});

pub static DECLARE_KFIFO: LazyLock<Regex> = LazyLock::new(|| {
  build(r"DECLARE_KFIFO\s*\(\s*([^,)]+?)\s*,\s*([^,)]+?)\s*,\s*([^)]+?)\s*\)")
});

pub static DECLARE_KFIFO_PTR: LazyLock<Regex> = LazyLock::new(|| {
  build(r"DECLARE_KFIFO_PTR\s*\(\s*([^,)]+?)\s*,\s*([^)]+?)\s*\)")
});

/// A whole member field declaring a nested `struct { ... } a, *b`.
pub static NESTED_AGGREGATE_FIELD: LazyLock<Regex> = LazyLock::new(|| {
  build(r"(?s)^(struct|union)\s*\{(.*)\}\s*([^;]*)$")
});

/// An innermost brace body (used to drop deeper nesting).
pub static BRACE_BODY: LazyLock<Regex> =
  LazyLock::new(|| build(r"\{[^{}]*\}"));

// Parameter splitting

/// Pointer-to-function parameter: `ret (*name)(args)`.
pub static FUNC_PTR_PARAM: LazyLock<Regex> = LazyLock::new(|| {
  build(r"^([\w\s*]+?\(\s*\*+)\s*([\w.]*)\s*(\)\s*\(.*\))\s*$")
});

/// `name:width` bitfield.
pub static BITFIELD: LazyLock<Regex> =
  LazyLock::new(|| build(r"^([\w.]+)\s*:\s*(\d+)$"));

/// Array suffix on a parameter name.
pub static ARRAY_SUFFIX: LazyLock<Regex> =
  LazyLock::new(|| build(r"\[[^\]]*\]"));

// Declaration bodies (states: scan prototype)

pub static STRUCT_PROTO: LazyLock<Regex> = LazyLock::new(|| {
  build(r"(?s)^\s*(struct|union)\s+(\w+)\s*\{(.*)\}(.*?);?\s*$")
});

pub static ENUM_PROTO: LazyLock<Regex> =
  LazyLock::new(|| build(r"(?s)^\s*enum\s+(\w+)\s*\{(.*)\}\s*;?\s*$"));

pub static TYPEDEF_FUNC_PTR: LazyLock<Regex> = LazyLock::new(|| {
  build(r"(?s)^\s*typedef\s+[\w\s*]+?\(\s*\*\s*(\w+)\s*\)\s*\(.*\)\s*;?\s*$")
});

pub static TYPEDEF_FUNC: LazyLock<Regex> = LazyLock::new(|| {
  build(r"(?s)^\s*typedef\s+[\w\s*]+?\b(\w+)\s*\(.*\)\s*;?\s*$")
});

pub static TYPEDEF_SIMPLE: LazyLock<Regex> = LazyLock::new(|| {
  build(r"(?s)^\s*typedef\s+.*?(\w+)(?:\s*\[[^\]]*\])*\s*;\s*$")
});

// Context gathering

pub static MODULE_INFO: LazyLock<Regex> = LazyLock::new(|| {
  build(r#"MODULE_(AUTHOR|DESCRIPTION|LICENSE)\s*\(\s*"([^"]*)""#)
});

/// `/* parse-<opt>: <value> */` inline directive.
pub static PARSE_OPTION: LazyLock<Regex> = LazyLock::new(|| {
  build(r"^\s*/\*\s*parse-([\w-]+)\s*:\s*(.*?)\s*\*/\s*$")
});

/// Build the macro-form export recognizer for the configured identifiers.
#[must_use]
pub fn export_macro_re(exp_ids: &[String]) -> Regex {
  let ids = exp_ids
    .iter()
    .map(|id| regex::escape(id))
    .collect::<Vec<_>>()
    .join("|");
  build(&format!(r"^\s*(?:{ids})\s*\(\s*(\w+)\s*\)"))
}

/// Build the attribute-form export recognizer: `EXPORT <type> name(...)`.
#[must_use]
pub fn export_attr_re(exp_ids: &[String]) -> Regex {
  let ids = exp_ids
    .iter()
    .map(|id| regex::escape(id))
    .collect::<Vec<_>>()
    .join("|");
  build(&format!(r"^\s*(?:{ids})\b[\w\s*]*?(\w+)\s*\("))
}
