//! Declaration normalizers.
//!
//! Prototype strings arrive here as accumulated source text. These routines
//! rewrite the well-known kernel macro forms into canonical C prototypes,
//! scrub attributes and modifiers, clean struct bodies, and split argument
//! strings into `(type, name)` pairs.
use regex::Regex;

use crate::{
  context::ParserContext,
  patterns,
  report::Reporter,
  types::{UNNAMED_STRUCT, UNNAMED_UNION},
};

/// Strip `//` comments from a single source line.
#[must_use]
pub fn strip_c99_comments(line: &str) -> String {
  patterns::C99_COMMENT.replace_all(line, "").into_owned()
}

/// Strip `/* ... */` comments.
#[must_use]
pub fn strip_c89_comments(text: &str) -> String {
  patterns::C89_COMMENT.replace_all(text, " ").into_owned()
}

/// Collapse whitespace runs (including newlines) into single spaces.
#[must_use]
pub fn normalize_ws(text: &str) -> String {
  text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Remove known modifiers, `__attribute__((...))` clauses and the
/// user-configured attribute names from a prototype.
#[must_use]
pub fn sanitize_prototype(proto: &str, known_attrs: Option<&Regex>) -> String {
  let mut p = patterns::ATTRIBUTE.replace_all(proto, " ").into_owned();
  p = patterns::ALIGNED_ATTR.replace_all(&p, " ").into_owned();
  p = patterns::MODIFIERS.replace_all(&p, " ").into_owned();
  if let Some(re) = known_attrs {
    p = re.replace_all(&p, " ").into_owned();
  }
  normalize_ws(&p)
}

/// Return the balanced `(...)` content starting at the first `(` at or
/// after `from`.
#[must_use]
pub fn balanced_parens(text: &str, from: usize) -> Option<&str> {
  let bytes = text.as_bytes();
  let open = text[from..].find('(')? + from;
  let mut depth = 0usize;
  for (idx, &b) in bytes.iter().enumerate().skip(open) {
    match b {
      b'(' => depth += 1,
      b')' => {
        depth -= 1;
        if depth == 0 {
          return Some(&text[open + 1..idx]);
        }
      },
      _ => {},
    }
  }
  None
}

/// Split `text` on `sep`, ignoring separators inside parentheses.
#[must_use]
pub fn split_outer(text: &str, sep: char) -> Vec<String> {
  let mut parts = Vec::new();
  let mut depth = 0usize;
  let mut current = String::new();
  for c in text.chars() {
    match c {
      '(' => {
        depth += 1;
        current.push(c);
      },
      ')' => {
        depth = depth.saturating_sub(1);
        current.push(c);
      },
      c if c == sep && depth == 0 => {
        parts.push(current.trim().to_owned());
        current.clear();
      },
      _ => current.push(c),
    }
  }
  if !current.trim().is_empty() {
    parts.push(current.trim().to_owned());
  }
  parts
}

/// Rewrite `SYSCALL_DEFINE<n>(name, type1, arg1, ...)` into
/// `long sys_<name>(type1 arg1, ...)`.
///
/// The macro separates types and names with commas; every second comma is
/// joined so each `(type, name)` pair becomes one parameter token.
/// `SYSCALL_DEFINE0` yields `long sys_<name>(void)`.
#[must_use]
pub fn normalize_syscall(proto: &str) -> Option<String> {
  let caps = patterns::SYSCALL_DEFINE.captures(proto)?;
  let args = balanced_parens(proto, caps.get(0)?.end() - 1)?;
  let mut parts = split_outer(args, ',').into_iter();
  let name = parts.next()?;
  let pairs: Vec<String> = parts.collect();
  if pairs.is_empty() {
    return Some(format!("long sys_{name}(void)"));
  }
  let joined = pairs
    .chunks(2)
    .map(|pair| pair.join(" "))
    .collect::<Vec<_>>()
    .join(", ");
  Some(format!("long sys_{name}({joined})"))
}

/// Rewrite the tracepoint macro family into
/// `static inline void trace_<name>(<TP_PROTO args>)`.
#[must_use]
pub fn normalize_tracepoint(proto: &str) -> Option<String> {
  let name = patterns::TRACE_EVENT
    .captures(proto)
    .or_else(|| patterns::DEFINE_EVENT.captures(proto))
    .or_else(|| patterns::DEFINE_SINGLE_EVENT.captures(proto))
    .map(|c| c[1].to_owned())?;
  let tp = patterns::TP_PROTO.find(proto)?;
  let args = balanced_parens(proto, tp.start())?;
  Some(format!(
    "static inline void trace_{name}({})",
    normalize_ws(args)
  ))
}

/// Clean a struct/union body for display and member extraction: private
/// regions, kmemcheck bitfields, attributes, and remaining comments go
/// away; DECLARE_* helper macros expand to their effective member.
#[must_use]
pub fn cleanup_struct_body(body: &str) -> String {
  let mut b = patterns::PRIVATE_REGION.replace_all(body, " ").into_owned();
  b = patterns::PRIVATE_TAIL.replace_all(&b, " ").into_owned();
  b = patterns::KMEMCHECK_BITFIELD.replace_all(&b, " ").into_owned();
  b = patterns::ATTRIBUTE.replace_all(&b, " ").into_owned();
  b = patterns::ALIGNED_ATTR.replace_all(&b, " ").into_owned();
  b = strip_c89_comments(&b);
  b = patterns::DECLARE_BITMAP
    .replace_all(&b, "unsigned long $1[BITS_TO_LONGS($2)]")
    .into_owned();
  b = patterns::DECLARE_HASHTABLE
    .replace_all(&b, "unsigned long $1[1 << (($2) - 1)]")
    .into_owned();
  b = patterns::DECLARE_KFIFO.replace_all(&b, "$2 $1").into_owned();
  b = patterns::DECLARE_KFIFO_PTR.replace_all(&b, "$2 $1").into_owned();
  b
}

/// Split on `sep` outside parentheses *and* braces.
fn split_fields(text: &str, sep: char) -> Vec<String> {
  let mut parts = Vec::new();
  let mut depth = 0usize;
  let mut current = String::new();
  for c in text.chars() {
    match c {
      '(' | '{' => {
        depth += 1;
        current.push(c);
      },
      ')' | '}' => {
        depth = depth.saturating_sub(1);
        current.push(c);
      },
      c if c == sep && depth == 0 => {
        parts.push(current.trim().to_owned());
        current.clear();
      },
      _ => current.push(c),
    }
  }
  if !current.trim().is_empty() {
    parts.push(current.trim().to_owned());
  }
  parts
}

/// Flatten one level of nested `struct { ... } a, *b;` members.
///
/// Each nested aggregate becomes a synthetic `struct a;` member plus
/// dotted `type a.field;` entries; pointer-to-function fields keep their
/// full declarator with the dotted prefix. Anything nested deeper than
/// one level is dropped from the member list.
#[must_use]
pub fn flatten_nested(body: &str) -> String {
  let mut out = String::new();
  for field in split_fields(body, ';') {
    if field.is_empty() {
      continue;
    }
    let Some(caps) = patterns::NESTED_AGGREGATE_FIELD.captures(&field) else {
      out.push_str(&field);
      out.push(';');
      continue;
    };
    let kind = caps[1].to_owned();
    let names = caps[3].to_owned();
    // Deeper nesting inside the captured body is dropped, one level at a
    // time, so only direct fields survive.
    let mut inner = caps[2].to_owned();
    loop {
      let reduced = patterns::BRACE_BODY.replace_all(&inner, " ").into_owned();
      if reduced == inner {
        break;
      }
      inner = reduced;
    }

    let declared: Vec<String> = split_outer(&names, ',')
      .into_iter()
      .filter(|n| !n.trim().is_empty())
      .collect();
    if declared.is_empty() {
      let synthetic =
        if kind == "union" { UNNAMED_UNION } else { UNNAMED_STRUCT };
      out.push_str(&format!("{kind} {synthetic};"));
      continue;
    }
    for raw_name in &declared {
      let name = raw_name.trim_start_matches('*').trim().to_owned();
      let name = patterns::ARRAY_SUFFIX.replace_all(&name, "");
      let name = name.trim();
      if name.is_empty() {
        continue;
      }
      out.push_str(&format!("{kind} {name};"));
      for inner_field in split_outer(&inner, ';') {
        if inner_field.is_empty() {
          continue;
        }
        out.push_str(&dotted_member(&inner_field, name));
        out.push(';');
      }
    }
  }
  out
}

/// Rewrite one nested field declaration so its name carries `parent.`.
fn dotted_member(field: &str, parent: &str) -> String {
  if let Some(caps) = patterns::FUNC_PTR_PARAM.captures(field) {
    // Keep the full declarator shape for pointer-to-function members.
    return format!("{}{parent}.{}{}", &caps[1], &caps[2], &caps[3]);
  }
  let field = normalize_ws(field);
  match field.rsplit_once(|c: char| c.is_whitespace() || c == '*') {
    Some((head, name)) => {
      let sep_char = field[head.len()..].chars().next().unwrap_or(' ');
      format!("{head}{sep_char}{parent}.{name}")
    },
    None => format!("{parent}.{field}"),
  }
}

/// Split a declaration's argument (or member) string into the context's
/// `parameter_list` / `parameter_types` maps.
///
/// `splitter` is `,` for function arguments and `;` for struct members.
/// Commas inside parenthesized function-pointer arguments never split.
pub fn create_parameterlist(
  args: &str,
  splitter: char,
  ctx: &mut ParserContext,
  reporter: &mut Reporter,
) {
  for raw in split_outer(args, splitter) {
    let arg = normalize_ws(&raw);
    if arg.is_empty() {
      continue;
    }

    if arg == "..." {
      push_parameter(ctx, "...", "", Some("variable arguments"));
      continue;
    }
    if arg == "void" {
      push_parameter(ctx, "void", "", Some("no arguments"));
      continue;
    }
    if arg == "struct" || arg == "union" {
      // Bare keyword left over from an anonymous aggregate.
      let synthetic = if arg == "union" { UNNAMED_UNION } else { UNNAMED_STRUCT };
      push_parameter(ctx, synthetic, &arg, Some("anonymous"));
      continue;
    }

    if let Some(caps) = patterns::FUNC_PTR_PARAM.captures(&arg) {
      let name = caps[2].to_owned();
      let ty = format!("{}{}", &caps[1], &caps[3]);
      if name.is_empty() {
        reporter.vwarn(
          ctx.decl_offset,
          &format!("unnamed function-pointer argument '{arg}'"),
        );
        continue;
      }
      push_parameter(ctx, &name, &normalize_ws(&ty), None);
      continue;
    }

    // In member lists one declaration can carry several names:
    // `int a, b;`. The first chunk holds the type.
    let name_chunks: Vec<String> = if splitter == ';' {
      split_outer(&arg, ',')
    } else {
      vec![arg.clone()]
    };

    let mut base_type = String::new();
    for (idx, chunk) in name_chunks.iter().enumerate() {
      let chunk = chunk.trim();
      let (ty, name) = if idx == 0 {
        match split_type_name(chunk) {
          Some(pair) => {
            base_type = pair.0.clone();
            pair
          },
          None => {
            // A single token: a name without a type.
            (String::new(), chunk.to_owned())
          },
        }
      } else {
        (base_type.clone(), chunk.to_owned())
      };

      let mut name = name;
      let mut ty = ty;

      // Pointer markers belong to the type.
      while let Some(stripped) = name.strip_prefix('*') {
        ty.push('*');
        name = stripped.trim_start().to_owned();
      }

      // Bitfields: `name:width` becomes `(type:width, name)`; an unnamed
      // bitfield is padding and is skipped.
      if let Some(caps) = patterns::BITFIELD.captures(&name) {
        ty = format!("{ty}:{}", &caps[2]);
        name = caps[1].to_owned();
      } else if name.starts_with(':') {
        continue;
      }

      // Array suffixes are part of the type story, not the name.
      let cleaned = patterns::ARRAY_SUFFIX.replace_all(&name, "");
      let name = cleaned.trim();
      if name.is_empty() {
        continue;
      }
      let auto_desc = (name == UNNAMED_STRUCT || name == UNNAMED_UNION)
        .then_some("anonymous");
      push_parameter(ctx, name, &ty, auto_desc);
    }
  }
}

fn split_type_name(decl: &str) -> Option<(String, String)> {
  let idx = decl.rfind(|c: char| c.is_whitespace() || c == '*')?;
  let (head, tail) = decl.split_at(idx + 1);
  if tail.is_empty() {
    return None;
  }
  Some((head.trim_end().to_owned(), tail.to_owned()))
}

fn push_parameter(
  ctx: &mut ParserContext,
  name: &str,
  ty: &str,
  auto_desc: Option<&str>,
) {
  if ctx.parameter_list.iter().any(|p| p == name) {
    return;
  }
  ctx.parameter_list.push(name.to_owned());
  ctx.parameter_types.insert(name.to_owned(), ty.to_owned());
  if let Some(desc) = auto_desc {
    ctx
      .parameter_descs
      .entry(name.to_owned())
      .or_insert_with(|| desc.to_owned());
  }
}

#[cfg(test)]
mod tests {
  #![allow(clippy::unwrap_used, reason = "Fine in tests")]
  use super::*;

  fn fresh() -> (ParserContext, Reporter) {
    (ParserContext::new(), Reporter::new("test.c", true))
  }

  #[test]
  fn syscall_define3_joins_pairs() {
    let p = normalize_syscall("SYSCALL_DEFINE3(bar, int, a, int, b, int, c)");
    assert_eq!(p.unwrap(), "long sys_bar(int a, int b, int c)");
  }

  #[test]
  fn syscall_define0_is_void() {
    let p = normalize_syscall("SYSCALL_DEFINE0(sync)");
    assert_eq!(p.unwrap(), "long sys_sync(void)");
  }

  #[test]
  fn trace_event_becomes_inline_stub() {
    let proto =
      "TRACE_EVENT(sched_switch, TP_PROTO(struct task_struct *prev, struct task_struct *next), TP_ARGS(prev, next))";
    let p = normalize_tracepoint(proto).unwrap();
    assert_eq!(
      p,
      "static inline void trace_sched_switch(struct task_struct *prev, struct task_struct *next)"
    );
  }

  #[test]
  fn define_event_uses_event_name() {
    let proto = "DEFINE_EVENT(sched_class, sched_wakeup, TP_PROTO(int cpu), TP_ARGS(cpu))";
    let p = normalize_tracepoint(proto).unwrap();
    assert_eq!(p, "static inline void trace_sched_wakeup(int cpu)");
  }

  #[test]
  fn parameterlist_function_pointer() {
    let (mut ctx, mut rep) = fresh();
    create_parameterlist(
      "int x, void (*cb)(void *data, int len)",
      ',',
      &mut ctx,
      &mut rep,
    );
    assert_eq!(ctx.parameter_list, vec!["x", "cb"]);
    assert_eq!(ctx.parameter_types["cb"], "void (*)(void *data, int len)");
  }

  #[test]
  fn parameterlist_varargs_and_void() {
    let (mut ctx, mut rep) = fresh();
    create_parameterlist("void", ',', &mut ctx, &mut rep);
    assert_eq!(ctx.parameter_list, vec!["void"]);
    assert_eq!(ctx.parameter_descs["void"], "no arguments");

    let (mut ctx, mut rep) = fresh();
    create_parameterlist("const char *fmt, ...", ',', &mut ctx, &mut rep);
    assert_eq!(ctx.parameter_list, vec!["fmt", "..."]);
    assert_eq!(ctx.parameter_descs["..."], "variable arguments");
    assert_eq!(ctx.parameter_types["fmt"], "const char *");
  }

  #[test]
  fn member_list_shares_type_across_names() {
    let (mut ctx, mut rep) = fresh();
    create_parameterlist("int a, b; unsigned long flags:4;", ';', &mut ctx, &mut rep);
    assert_eq!(ctx.parameter_list, vec!["a", "b", "flags"]);
    assert_eq!(ctx.parameter_types["b"], "int");
    assert_eq!(ctx.parameter_types["flags"], "unsigned long:4");
  }

  #[test]
  fn nested_struct_flattens_with_dots() {
    let out = flatten_nested("int a; struct { int x; void (*fn)(int); } ops;");
    assert!(out.contains("struct ops;"));
    assert!(out.contains("int ops.x;"));
    assert!(out.contains("(*ops.fn)"));
  }

  #[test]
  fn anonymous_union_gets_synthetic_name() {
    let out = flatten_nested("union { int a; long b; };");
    assert!(out.contains("union {unnamed_union};"));
  }

  #[test]
  fn declare_macros_expand() {
    let body = "DECLARE_BITMAP(mask, MAX_CPUS); DECLARE_KFIFO(fifo, u8, 16);";
    let out = cleanup_struct_body(body);
    assert!(out.contains("unsigned long mask[BITS_TO_LONGS(MAX_CPUS)]"));
    assert!(out.contains("u8 fifo"));
  }

  #[test]
  fn private_region_removed() {
    let body = "int a; /* private: */ int secret; /* public: */ int b;";
    let out = cleanup_struct_body(body);
    assert!(out.contains("int a"));
    assert!(out.contains("int b"));
    assert!(!out.contains("secret"));
  }
}
