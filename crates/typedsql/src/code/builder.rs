//! SQL text accumulator with indentation and a bind ledger.
//!
//! `CodeBuilder` stores text pieces and placeholders separately (like a
//! parameterized `Sql` buffer) so a builder can be embedded into another one
//! without renumbering anything: placeholder positions are offset when the
//! ledger is spliced, and the marker text is only produced in [`CodeBuilder::finish`].

use super::ident::CodeIdent;
use crate::bind::{BindName, BindVariable, BindWithPosition};
use crate::config::PlaceholderStyle;
use crate::error::SqlGenResult;
use indexmap::IndexMap;
use std::ops::Range;

#[derive(Debug, Clone)]
enum Part {
    Raw(String),
    /// Text whose line breaks belong to a literal and get no prefix.
    Verbatim(String),
    Bind(usize),
}

#[derive(Debug, Clone)]
struct IndentEntry {
    ident: CodeIdent,
    line_started: bool,
}

#[derive(Debug, Clone)]
struct LedgerEntry {
    variable: BindVariable,
    positions: Vec<usize>,
}

/// Mutable SQL text buffer for one render.
#[derive(Debug, Clone)]
pub struct CodeBuilder {
    parts: Vec<Part>,
    stack: Vec<IndentEntry>,
    at_line_start: bool,
    /// A line break is owed before the next text (after a `--` comment).
    pending_break: bool,
    unsafe_tail: bool,
    bind_count: usize,
    ledger: IndexMap<BindName, LedgerEntry>,
    style: PlaceholderStyle,
}

impl Default for CodeBuilder {
    fn default() -> Self {
        Self::new(PlaceholderStyle::default())
    }
}

impl CodeBuilder {
    pub fn new(style: PlaceholderStyle) -> Self {
        Self {
            parts: Vec::new(),
            stack: Vec::new(),
            at_line_start: true,
            pending_break: false,
            unsafe_tail: false,
            bind_count: 0,
            ledger: IndexMap::new(),
            style,
        }
    }

    /// An empty builder using the same placeholder style.
    pub fn sibling(&self) -> Self {
        Self::new(self.style)
    }

    /// Number of placeholders emitted so far.
    pub fn bind_count(&self) -> usize {
        self.bind_count
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Whether the next identifier-like token needs a separating space.
    pub fn is_unsafe(&self) -> bool {
        self.unsafe_tail
    }

    fn push_raw(&mut self, s: &str) {
        match self.parts.last_mut() {
            Some(Part::Raw(last)) => last.push_str(s),
            _ => self.parts.push(Part::Raw(s.to_string())),
        }
    }

    fn settle_break(&mut self) {
        if self.pending_break && !self.at_line_start {
            self.append_line();
        }
        self.pending_break = false;
    }

    fn start_line(&mut self) {
        if !self.at_line_start {
            return;
        }
        let mut prefix = String::new();
        for entry in &mut self.stack {
            entry.ident.write_prefix(&mut prefix, !entry.line_started);
            entry.line_started = true;
        }
        if !prefix.is_empty() {
            self.push_raw(&prefix);
        }
        self.at_line_start = false;
    }

    fn append_segment(&mut self, segment: &str) {
        if segment.is_empty() {
            return;
        }
        self.settle_break();
        self.start_line();
        self.push_raw(segment);
        self.unsafe_tail = segment.chars().last().is_some_and(is_word_char);
    }

    /// Append text. Embedded newlines start new, prefixed lines.
    pub fn append(&mut self, text: &str) -> &mut Self {
        let mut lines = text.split('\n');
        if let Some(first) = lines.next() {
            self.append_segment(first);
        }
        for line in lines {
            self.append_line();
            self.append_segment(line);
        }
        self
    }

    pub fn append_char(&mut self, c: char) -> &mut Self {
        let mut buf = [0u8; 4];
        self.append(c.encode_utf8(&mut buf))
    }

    pub fn append_int(&mut self, n: i64) -> &mut Self {
        self.append(&n.to_string())
    }

    /// Append an identifier or keyword, separated by a space when the previous
    /// character would otherwise run into it.
    pub fn append_name(&mut self, name: &str) -> &mut Self {
        self.settle_break();
        if self.unsafe_tail && !self.at_line_start {
            self.push_raw(" ");
        }
        self.append(name)
    }

    /// Append text as is: its line breaks get no indentation and nothing in
    /// it is stripped. Used for string literals spanning lines.
    pub fn append_verbatim(&mut self, text: &str) -> &mut Self {
        if text.is_empty() {
            return self;
        }
        self.settle_break();
        self.start_line();
        self.parts.push(Part::Verbatim(text.to_string()));
        self.unsafe_tail = text.chars().last().is_some_and(is_word_char);
        self
    }

    /// End the current line.
    pub fn append_line(&mut self) -> &mut Self {
        self.push_raw("\n");
        self.at_line_start = true;
        self.pending_break = false;
        self.unsafe_tail = false;
        self
    }

    /// Make sure whatever is appended next starts on a new line.
    ///
    /// Nothing is written until then, so a caller that ends the line itself
    /// does not get an empty one.
    pub fn break_before_next(&mut self) -> &mut Self {
        if !self.at_line_start {
            self.pending_break = true;
        }
        self
    }

    /// Run `f` against this builder.
    pub fn apply<F>(&mut self, f: F) -> SqlGenResult<&mut Self>
    where
        F: FnOnce(&mut Self) -> SqlGenResult<()>,
    {
        f(self)?;
        Ok(self)
    }

    pub fn push_indent(&mut self, ident: CodeIdent) -> &mut Self {
        let line_started = !self.at_line_start;
        self.stack.push(IndentEntry {
            ident,
            line_started,
        });
        self
    }

    pub fn pop_indent(&mut self) -> &mut Self {
        self.stack.pop();
        self
    }

    /// Run `f` with continuation lines indented one column right of the
    /// current indent plus `extra_indent`; the current line is unaffected.
    pub fn wrapped<F, R>(&mut self, extra_indent: usize, f: F) -> R
    where
        F: FnOnce(&mut Self) -> R,
    {
        self.push_indent(CodeIdent::first_line("", " ".repeat(extra_indent + 1)));
        let result = f(self);
        self.stack.pop();
        result
    }

    /// Append a caller-supplied, possibly multi-line fragment re-indented to
    /// the current position (see [`normalize_fragment`]).
    pub fn wrap(&mut self, text: &str, extra_indent: usize) -> &mut Self {
        self.wrap_keeping(text, &[], extra_indent)
    }

    /// [`wrap`](Self::wrap), leaving the byte ranges in `verbatim` (string
    /// literals spanning lines) exactly as written.
    pub fn wrap_keeping(
        &mut self,
        text: &str,
        verbatim: &[Range<usize>],
        extra_indent: usize,
    ) -> &mut Self {
        let fragment = Fragment::normalize(text, verbatim);
        let kept: Vec<Range<usize>> = verbatim.iter().map(|r| fragment.map_range(r)).collect();
        self.wrapped(extra_indent, |b| {
            let mut last = 0;
            for range in &kept {
                b.append(&fragment.text[last..range.start]);
                b.append_verbatim(&fragment.text[range.clone()]);
                last = range.end;
            }
            b.append(&fragment.text[last..]);
        });
        self
    }

    /// Register one more occurrence of `var` without writing a marker.
    ///
    /// Returns the assigned 1-based position. Repeated names are merged with
    /// [`BindVariable::combine`].
    pub fn add_bind(&mut self, var: &BindVariable) -> SqlGenResult<usize> {
        self.bind_count += 1;
        let position = self.bind_count;
        self.record(var, &[position])?;
        Ok(position)
    }

    /// Write a placeholder marker for `var` and register it.
    pub fn append_bind(&mut self, var: &BindVariable) -> SqlGenResult<&mut Self> {
        self.settle_break();
        self.start_line();
        let position = self.add_bind(var)?;
        self.parts.push(Part::Bind(position));
        self.unsafe_tail = self.style == PlaceholderStyle::Dollar;
        Ok(self)
    }

    fn record(&mut self, var: &BindVariable, positions: &[usize]) -> SqlGenResult<()> {
        match self.ledger.get_mut(var.name()) {
            Some(entry) => {
                entry.variable = entry.variable.combine(var)?;
                entry.positions.extend_from_slice(positions);
            }
            None => {
                self.ledger.insert(
                    var.name().clone(),
                    LedgerEntry {
                        variable: var.clone(),
                        positions: positions.to_vec(),
                    },
                );
            }
        }
        Ok(())
    }

    /// Splice another builder's text and binds in at the current position.
    ///
    /// Lines of `other` after its first get this builder's current prefix, and
    /// its bind positions are shifted past the binds already emitted here.
    pub fn embed(&mut self, other: CodeBuilder) -> SqlGenResult<&mut Self> {
        let offset = self.bind_count;
        for part in other.parts {
            match part {
                Part::Raw(text) => {
                    self.append(&text);
                }
                Part::Verbatim(text) => {
                    self.append_verbatim(&text);
                }
                Part::Bind(position) => {
                    self.settle_break();
                    self.start_line();
                    self.parts.push(Part::Bind(position + offset));
                    self.unsafe_tail = self.style == PlaceholderStyle::Dollar;
                }
            }
        }
        self.bind_count += other.bind_count;
        if other.pending_break {
            self.break_before_next();
        }
        for (_, entry) in other.ledger {
            let shifted: Vec<usize> = entry.positions.iter().map(|p| p + offset).collect();
            self.record(&entry.variable, &shifted)?;
        }
        Ok(self)
    }

    fn render_text(&self) -> String {
        let mut out = String::new();
        for part in &self.parts {
            match part {
                Part::Raw(s) | Part::Verbatim(s) => out.push_str(s),
                Part::Bind(position) => self.style.write(&mut out, *position),
            }
        }
        out
    }

    /// Rendered text plus the merged bind variables, in order of first use.
    pub(crate) fn into_parts(self) -> (String, Vec<BindWithPosition>, Vec<BindVariable>) {
        let text = self.render_text();
        let mut binds = Vec::with_capacity(self.ledger.len());
        let mut variables = Vec::with_capacity(self.ledger.len());
        for (name, entry) in self.ledger {
            binds.push(BindWithPosition {
                name,
                type_tag: entry.variable.type_tag(),
                positions: entry.positions,
            });
            variables.push(entry.variable);
        }
        (text, binds, variables)
    }

    /// Consume the builder, producing the SQL text and its bind positions.
    pub fn finish(self) -> (String, Vec<BindWithPosition>) {
        let (text, binds, _) = self.into_parts();
        (text, binds)
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Leading spaces and tabs, in bytes.
fn indent_width(line: &str) -> usize {
    line.bytes().take_while(|b| matches!(b, b' ' | b'\t')).count()
}

/// A fragment after [`normalize_fragment`], with enough bookkeeping to map
/// byte offsets of the input into the output.
struct Fragment {
    text: String,
    /// Per output line: input offset of its first kept byte, output offset.
    lines: Vec<(usize, usize)>,
}

impl Fragment {
    fn normalize(text: &str, verbatim: &[Range<usize>]) -> Self {
        let within = |offset: usize| verbatim.iter().any(|r| r.start < offset && offset < r.end);

        // (input offset, line text, starts inside a literal)
        let mut lines = Vec::new();
        let mut offset = 0;
        for raw in text.split('\n') {
            let end = offset + raw.len();
            let line = if within(end) { raw } else { raw.trim_end() };
            lines.push((offset, line, within(offset)));
            offset = end + 1;
        }

        fn blank(&(_, line, kept): &(usize, &str, bool)) -> bool {
            !kept && line.trim().is_empty()
        }
        let (Some(first), Some(last)) = (
            lines.iter().position(|l| !blank(l)),
            lines.iter().rposition(|l| !blank(l)),
        ) else {
            return Self {
                text: String::new(),
                lines: Vec::new(),
            };
        };
        let lines = &lines[first..=last];

        let common = lines[1..]
            .iter()
            .filter(|(_, line, kept)| !kept && !line.is_empty())
            .map(|(_, line, _)| indent_width(line))
            .min()
            .unwrap_or(0);

        let mut out = Self {
            text: String::with_capacity(text.len()),
            lines: Vec::with_capacity(lines.len()),
        };
        for (i, &(start, line, kept)) in lines.iter().enumerate() {
            let skip = match (i, kept) {
                (0, _) => line.len() - line.trim_start().len(),
                (_, true) => 0,
                _ => common.min(line.len()),
            };
            if i > 0 {
                out.text.push('\n');
            }
            out.lines.push((start + skip, out.text.len()));
            out.text.push_str(&line[skip..]);
        }
        out
    }

    /// Output offset of input offset `at`, which must not fall in stripped
    /// whitespace.
    fn map(&self, at: usize) -> usize {
        let line = self.lines.partition_point(|&(start, _)| start <= at);
        match line.checked_sub(1).map(|i| self.lines[i]) {
            Some((start, out)) => out + (at - start),
            None => 0,
        }
    }

    fn map_range(&self, range: &Range<usize>) -> Range<usize> {
        self.map(range.start)..self.map(range.end)
    }
}

/// Normalize a caller-supplied SQL fragment for re-indentation.
///
/// Trailing whitespace is dropped from every line, blank leading/trailing lines
/// are removed, the first line is trimmed, and the common leading indentation
/// (spaces and tabs) of the remaining non-blank lines is stripped.
pub fn normalize_fragment(text: &str) -> String {
    Fragment::normalize(text, &[]).text
}

/// [`normalize_fragment`] for a fragment containing literals that span lines.
///
/// Lines that begin or end inside one of the `verbatim` byte ranges keep that
/// side untouched and do not count towards the common indentation. Returns the
/// normalized text and the ranges' new positions in it.
pub fn normalize_fragment_keeping(
    text: &str,
    verbatim: &[Range<usize>],
) -> (String, Vec<Range<usize>>) {
    let fragment = Fragment::normalize(text, verbatim);
    let kept = verbatim.iter().map(|r| fragment.map_range(r)).collect();
    (fragment.text, kept)
}
