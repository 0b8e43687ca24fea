use crate::diagnostic::{Diagnostic, DiagnosticBuilder, Span};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum TokenKind {
    /// Identifiers, numbers and dotted paths like `img.width`.
    Word,
    /// `%name`
    Value,
    Comma,
    Colon,
    Equals,
    Question,
}

impl TokenKind {
    pub(super) fn describe(self) -> &'static str {
        match self {
            TokenKind::Word => "identifier",
            TokenKind::Value => "value",
            TokenKind::Comma => "`,`",
            TokenKind::Colon => "`:`",
            TokenKind::Equals => "`=`",
            TokenKind::Question => "`?`",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct Token<'s> {
    pub kind: TokenKind,
    pub text: &'s str,
    pub span: Span,
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '.'
}

/// Splits one line (without its newline) into tokens. `offset` is the byte offset of the line in
/// the whole source. Everything after `//` is ignored.
pub(super) fn lex_line(line: &str, offset: usize) -> Result<Vec<Token<'_>>, Diagnostic> {
    let line = match line.find("//") {
        Some(comment) => &line[..comment],
        None => line,
    };

    let mut tokens = Vec::new();
    let mut chars = line.char_indices().peekable();
    while let Some((start, c)) = chars.next() {
        let kind = match c {
            c if c.is_whitespace() => continue,
            ',' => TokenKind::Comma,
            ':' => TokenKind::Colon,
            '=' => TokenKind::Equals,
            '?' => TokenKind::Question,
            c if c == '%' || is_word_char(c) => {
                while chars.next_if(|&(_, c)| is_word_char(c)).is_some() {}
                if c == '%' {
                    TokenKind::Value
                } else {
                    TokenKind::Word
                }
            }
            _ => {
                let span = Span::from(offset + start..offset + start + c.len_utf8());
                return Err(DiagnosticBuilder::new(span).build_syntax_error(&c.to_string(), vec![]));
            }
        };
        let end = chars.peek().map_or(line.len(), |&(i, _)| i);
        tokens.push(Token {
            kind,
            text: &line[start..end],
            span: Span::from(offset + start..offset + end),
        });
    }
    Ok(tokens)
}
