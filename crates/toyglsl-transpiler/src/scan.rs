//! Lexical helpers shared by the analyzer and the rewrite rules.
//!
//! Nothing here builds a syntax tree. The helpers know just enough GLSL to balance brackets,
//! step over comments and split on top-level commas.

use std::ops::Range;

use regex::{Captures, Match, Regex};
use toyglsl_core::ToyglslError;

fn skip_line_comment(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() && bytes[i] != b'\n' {
        i += 1;
    }
    i
}

fn skip_block_comment(bytes: &[u8], mut i: usize) -> usize {
    i += 2;
    while i + 1 < bytes.len() {
        if bytes[i] == b'*' && bytes[i + 1] == b'/' {
            return i + 2;
        }
        i += 1;
    }
    bytes.len()
}

/// If a comment starts at `i`, returns the index just past it.
fn comment_end(bytes: &[u8], i: usize) -> Option<usize> {
    if bytes.get(i) != Some(&b'/') {
        return None;
    }
    match bytes.get(i + 1) {
        Some(b'/') => Some(skip_line_comment(bytes, i)),
        Some(b'*') => Some(skip_block_comment(bytes, i)),
        _ => None,
    }
}

/// Byte ranges of every `//` and `/* */` comment in `code`.
pub fn comment_spans(code: &str) -> Vec<Range<usize>> {
    let bytes = code.as_bytes();
    let mut spans = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        if let Some(end) = comment_end(bytes, i) {
            spans.push(i..end);
            i = end;
        } else {
            i += 1;
        }
    }
    spans
}

fn in_spans(spans: &[Range<usize>], pos: usize) -> bool {
    spans.iter().any(|s| s.contains(&pos))
}

/// Index of the `)` matching the `(` at `open`. Comments are skipped.
pub fn matching_paren(code: &str, open: usize) -> Option<usize> {
    let bytes = code.as_bytes();
    if bytes.get(open) != Some(&b'(') {
        return None;
    }
    let mut depth = 0usize;
    let mut i = open;
    while i < bytes.len() {
        if let Some(end) = comment_end(bytes, i) {
            i = end;
            continue;
        }
        match bytes[i] {
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// Split on commas that are not nested inside `()`, `[]` or `{}`. Slices are untrimmed.
pub fn split_top_level(s: &str) -> Vec<&str> {
    let bytes = s.as_bytes();
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        if let Some(end) = comment_end(bytes, i) {
            i = end;
            continue;
        }
        match bytes[i] {
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => depth -= 1,
            b',' if depth == 0 => {
                parts.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    parts.push(&s[start..]);
    parts
}

/// `true` for expressions that bind tighter than any binary operator:
/// identifiers, literals, swizzles, calls and indexing.
pub fn is_atom(expr: &str) -> bool {
    let expr = expr.trim();
    if expr.is_empty() {
        return false;
    }
    let mut depth = 0i32;
    for c in expr.chars() {
        match c {
            '(' | '[' => depth += 1,
            ')' | ']' => depth -= 1,
            _ if depth > 0 => {}
            c if c.is_ascii_alphanumeric() || c == '_' || c == '.' => {}
            _ => return false,
        }
    }
    depth == 0
}

/// Wrap `expr` in parentheses unless it is already an atom.
pub fn paren(expr: &str) -> String {
    let expr = expr.trim();
    if is_atom(expr) {
        expr.to_string()
    } else {
        format!("({expr})")
    }
}

/// Calls of one rule nested deeper than this are rejected instead of recursed into.
pub const MAX_CALL_DEPTH: usize = 64;

/// Rewrite every call matched by `pattern` (which must end in `\(`).
///
/// Arguments are rewritten first, so nested calls are handled inside-out. `rewrite` receives
/// the trimmed top-level arguments and returns `None` to keep the call as written. Matches
/// inside comments or preceded by `.` (member access) are left alone.
///
/// Fails when calls nest deeper than [`MAX_CALL_DEPTH`] or when the rewritten text grows past
/// `max_len` bytes; rewrites that repeat an operand double in size per nesting level.
pub fn rewrite_calls<F>(
    rule: &'static str,
    code: &str,
    pattern: &Regex,
    rewrite: &F,
    max_len: usize,
) -> Result<String, ToyglslError>
where
    F: Fn(&[&str]) -> Option<String>,
{
    rewrite_calls_at(rule, code, pattern, rewrite, max_len, 0)
}

fn rewrite_calls_at<F>(
    rule: &'static str,
    code: &str,
    pattern: &Regex,
    rewrite: &F,
    max_len: usize,
    depth: usize,
) -> Result<String, ToyglslError>
where
    F: Fn(&[&str]) -> Option<String>,
{
    let comments = comment_spans(code);
    let mut out = String::with_capacity(code.len());
    let mut last = 0;
    let mut from = 0;

    while let Some(m) = pattern.find_at(code, from) {
        if in_spans(&comments, m.start()) || code[..m.start()].ends_with('.') {
            from = m.end();
            continue;
        }
        if depth >= MAX_CALL_DEPTH {
            return Err(ToyglslError::rule(
                rule,
                format!("calls nested deeper than {MAX_CALL_DEPTH} levels"),
            ));
        }
        let open = m.end() - 1;
        let close = matching_paren(code, open).ok_or_else(|| {
            ToyglslError::rule(
                rule,
                format!("unbalanced parentheses after '{}'", m.as_str().trim_end()),
            )
        })?;

        let inner = rewrite_calls_at(
            rule,
            &code[open + 1..close],
            pattern,
            rewrite,
            max_len,
            depth + 1,
        )?;
        let args: Vec<&str> = split_top_level(&inner).into_iter().map(str::trim).collect();

        out.push_str(&code[last..m.start()]);
        match rewrite(&args) {
            Some(replacement) => out.push_str(&replacement),
            None => {
                out.push_str(&code[m.start()..=open]);
                out.push_str(&inner);
                out.push(')');
            }
        }
        if out.len() > max_len {
            return Err(ToyglslError::rule(
                rule,
                format!("rewritten text exceeds {max_len} bytes"),
            ));
        }
        last = close + 1;
        from = close + 1;
    }
    out.push_str(&code[last..]);
    Ok(out)
}

/// First match of `pattern` that does not start inside a comment.
pub fn find_outside_comments<'t>(pattern: &Regex, code: &'t str) -> Option<Match<'t>> {
    let comments = comment_spans(code);
    pattern
        .find_iter(code)
        .find(|m| !in_spans(&comments, m.start()))
}

/// Like [`find_outside_comments`], with capture groups.
pub fn captures_outside_comments<'t>(pattern: &Regex, code: &'t str) -> Option<Captures<'t>> {
    let comments = comment_spans(code);
    pattern
        .captures_iter(code)
        .find(|c| c.get(0).is_some_and(|m| !in_spans(&comments, m.start())))
}

/// One declarator of a multi-declaration, with the comments/whitespace that preceded it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declarator<'a> {
    pub leading: &'a str,
    pub body: &'a str,
}

/// A line-leading declaration statement with more than one declarator,
/// e.g. `float t = iTime, z, d;`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiDeclaration<'a> {
    /// From the type keyword up to and including the `;`.
    pub span: Range<usize>,
    pub type_prefix: &'a str,
    pub declarators: Vec<Declarator<'a>>,
}

fn split_leading_trivia(s: &str) -> (&str, &str) {
    let bytes = s.as_bytes();
    let mut i = 0;
    loop {
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        match comment_end(bytes, i) {
            Some(end) => i = end,
            None => break,
        }
    }
    s.split_at(i)
}

fn prev_significant_byte(code: &str, pos: usize) -> Option<u8> {
    code[..pos]
        .bytes()
        .rev()
        .find(|b| !b.is_ascii_whitespace())
}

/// Find multi-declarations whose type keyword starts a line. `start` must capture the type
/// (with qualifiers) in a group named `ty` and end right before the first declarator.
pub fn find_multi_declarations<'a>(code: &'a str, start: &Regex) -> Vec<MultiDeclaration<'a>> {
    let comments = comment_spans(code);
    let bytes = code.as_bytes();
    let mut found = Vec::new();
    let mut resume = 0;

    for caps in start.captures_iter(code) {
        let (Some(whole), Some(ty)) = (caps.get(0), caps.name("ty")) else {
            continue;
        };
        if ty.start() < resume || in_spans(&comments, ty.start()) {
            continue;
        }
        // `for (\n float i = 0., j = 1.; ...)` must stay a single init-statement.
        if matches!(prev_significant_byte(code, ty.start()), Some(b'(') | Some(b',')) {
            continue;
        }
        let body_start = whole.end();
        if !code[body_start..].starts_with(|c: char| c.is_ascii_alphabetic() || c == '_') {
            continue;
        }

        let mut depth = 0i32;
        let mut commas = Vec::new();
        let mut end = None;
        let mut i = body_start;
        while i < bytes.len() {
            if let Some(next) = comment_end(bytes, i) {
                i = next;
                continue;
            }
            match bytes[i] {
                b'(' | b'[' => depth += 1,
                b')' | b']' => depth -= 1,
                b'{' | b'}' if depth == 0 => break,
                b',' if depth == 0 => commas.push(i),
                b';' if depth == 0 => {
                    end = Some(i);
                    break;
                }
                _ => {}
            }
            i += 1;
        }
        let Some(end) = end else { continue };
        if commas.is_empty() {
            continue;
        }

        let mut bounds = Vec::with_capacity(commas.len() + 1);
        let mut piece_start = body_start;
        for &c in &commas {
            bounds.push(piece_start..c);
            piece_start = c + 1;
        }
        bounds.push(piece_start..end);

        let declarators = bounds
            .into_iter()
            .map(|r| {
                let (leading, body) = split_leading_trivia(&code[r]);
                Declarator { leading, body }
            })
            .collect();

        found.push(MultiDeclaration {
            span: ty.start()..end + 1,
            type_prefix: ty.as_str(),
            declarators,
        });
        resume = end + 1;
    }
    found
}

fn ends_in_line_comment(body: &str) -> bool {
    let last_line = body.rsplit('\n').next().unwrap_or(body);
    last_line.contains("//")
}

impl MultiDeclaration<'_> {
    /// One declaration statement per declarator, keeping comments between them.
    pub fn split(&self) -> String {
        let mut out = String::new();
        for (i, d) in self.declarators.iter().enumerate() {
            if i > 0 {
                if d.leading.is_empty() {
                    out.push(' ');
                } else {
                    out.push_str(d.leading);
                    if !d.leading.ends_with(|c: char| c.is_ascii_whitespace()) {
                        out.push(' ');
                    }
                }
            } else {
                out.push_str(d.leading);
            }
            let body = d.body.trim_end();
            out.push_str(self.type_prefix);
            out.push(' ');
            out.push_str(body);
            if ends_in_line_comment(body) {
                out.push('\n');
            }
            out.push(';');
        }
        out
    }
}

/// Replace every multi-declaration in `code` with its split form.
pub fn split_multi_declarations(code: &str, start: &Regex) -> String {
    let decls = find_multi_declarations(code, start);
    if decls.is_empty() {
        return code.to_string();
    }
    let mut out = String::with_capacity(code.len() + decls.len() * 16);
    let mut last = 0;
    for d in &decls {
        out.push_str(&code[last..d.span.start]);
        out.push_str(&d.split());
        last = d.span.end;
    }
    out.push_str(&code[last..]);
    out
}
