//! Line prefix strategies.

/// What to write at the start of each new line while an ident is on the stack.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CodeIdent {
    /// No prefix.
    #[default]
    Void,
    /// The same prefix on every line.
    Simple(String),
    /// `first` on the first line after the push, `rest` afterwards.
    ///
    /// Used for delimiter lists: `"  , "` before the second column, plain
    /// alignment for that column's continuation lines.
    FirstLine { first: String, rest: String },
    /// `outer` followed by `inner`.
    Linked(Box<CodeIdent>, Box<CodeIdent>),
}

impl CodeIdent {
    pub fn void() -> Self {
        CodeIdent::Void
    }

    pub fn simple(prefix: impl Into<String>) -> Self {
        CodeIdent::Simple(prefix.into())
    }

    /// Plain indentation of `width` spaces.
    pub fn spaces(width: usize) -> Self {
        if width == 0 {
            CodeIdent::Void
        } else {
            CodeIdent::Simple(" ".repeat(width))
        }
    }

    pub fn first_line(first: impl Into<String>, rest: impl Into<String>) -> Self {
        CodeIdent::FirstLine {
            first: first.into(),
            rest: rest.into(),
        }
    }

    pub fn linked(outer: CodeIdent, inner: CodeIdent) -> Self {
        CodeIdent::Linked(Box::new(outer), Box::new(inner))
    }

    /// Append this ident's prefix for a line to `out`.
    pub fn write_prefix(&self, out: &mut String, first_line: bool) {
        match self {
            CodeIdent::Void => {}
            CodeIdent::Simple(prefix) => out.push_str(prefix),
            CodeIdent::FirstLine { first, rest } => {
                out.push_str(if first_line { first } else { rest })
            }
            CodeIdent::Linked(outer, inner) => {
                outer.write_prefix(out, first_line);
                inner.write_prefix(out, first_line);
            }
        }
    }

    pub fn prefix(&self, first_line: bool) -> String {
        let mut out = String::new();
        self.write_prefix(&mut out, first_line);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixes() {
        assert_eq!(CodeIdent::void().prefix(true), "");
        assert_eq!(CodeIdent::simple("> ").prefix(false), "> ");
        assert_eq!(CodeIdent::spaces(0), CodeIdent::Void);

        let list = CodeIdent::first_line("  , ", "    ");
        assert_eq!(list.prefix(true), "  , ");
        assert_eq!(list.prefix(false), "    ");

        let linked = CodeIdent::linked(CodeIdent::spaces(2), list);
        assert_eq!(linked.prefix(true), "    , ");
        assert_eq!(linked.prefix(false), "      ");
    }
}
