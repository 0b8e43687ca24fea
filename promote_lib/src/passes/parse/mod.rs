//! Parser for the textual kernel listing format.
//!
//! A listing holds one or more kernels. Every line is a directive, a value definition or a
//! result-less operation:
//!
//! ```text
//! kernel blur
//! block 128 1
//! filter 5 5
//! param %img : struct Image
//! param %mask : filter struct Filter
//! param %x : scalar
//! buffer %img f32 width=img.w height=img.h
//! %p = extract %img, data : ptr
//! %a = lea %p, %x, %x : ptr
//! %v = load %a : scalar
//! store %a, %v
//! ```
//!
//! Errors are reported per line, parsing continues with the next line.

mod lexer;

use crate::{
    codegen::{BufferDescriptor, Buffers},
    diagnostic::{AggregateResult, Diagnostic, DiagnosticBuilder, Span},
};
use kernel_ir::{KernelBuilder, KernelFunction, OpId, OpKind, ParameterDescriptor, ScalarTy, TypeTag};
use lexer::{lex_line, Token, TokenKind};
use std::collections::{BTreeMap, HashMap};

/// One kernel of a listing, together with the launch configuration and buffer layouts it
/// declares.
#[derive(Debug, Clone)]
pub struct ParsedKernel {
    pub kernel: KernelFunction,
    /// The `kernel` directive.
    pub span: Span,
    pub block: Option<((u32, u32), Span)>,
    pub filter: Option<((u32, u32), Span)>,
    pub buffers: Buffers,
    /// The `buffer` directive of each declared buffer.
    pub buffer_spans: BTreeMap<OpId, Span>,
    /// The line defining each value.
    pub spans: BTreeMap<OpId, Span>,
}

impl ParsedKernel {
    /// The line defining `id`, or the `kernel` directive if `id` is unknown.
    pub fn span_of(&self, id: OpId) -> Span {
        self.spans.get(&id).copied().unwrap_or(self.span)
    }
}

pub fn parse(source: &str) -> AggregateResult<Vec<ParsedKernel>> {
    let mut parser = Parser::new();
    let mut offset = 0;
    for line in source.split_inclusive('\n') {
        parser.parse_line(line.trim_end_matches(|c| c == '\n' || c == '\r'), offset);
        offset += line.len();
    }
    parser.finish()
}

struct Parser {
    res: AggregateResult<()>,
    kernels: Vec<ParsedKernel>,
    current: Option<KernelState>,
}

impl Parser {
    fn new() -> Self {
        Self {
            res: AggregateResult::new_ok(()),
            kernels: Vec::new(),
            current: None,
        }
    }

    fn parse_line(&mut self, line: &str, offset: usize) {
        let tokens = match lex_line(line, offset) {
            Ok(tokens) => tokens,
            Err(diagnostic) => return self.res.add_err(diagnostic),
        };
        let (Some(first), Some(last)) = (tokens.first(), tokens.last()) else {
            return;
        };
        let mut cursor = Cursor {
            tokens: &tokens,
            pos: 1,
            span: first.span.to(last.span),
        };

        if let Err(diagnostic) = self.parse_tokens(*first, &mut cursor) {
            self.res.add_err(diagnostic);
        }
    }

    fn parse_tokens(&mut self, first: Token<'_>, cursor: &mut Cursor<'_, '_>) -> Result<(), Diagnostic> {
        if first.kind == TokenKind::Word && first.text == "kernel" {
            let name = cursor.expect(TokenKind::Word, "kernel name")?;
            cursor.expect_end()?;
            self.finish_kernel();
            self.current = Some(KernelState::new(name.text, cursor.span));
            return Ok(());
        }

        let Some(state) = self.current.as_mut() else {
            return Err(DiagnosticBuilder::new(cursor.span).build_outside_kernel(first.text));
        };
        match (first.kind, first.text) {
            (TokenKind::Word, "block") => state.parse_block(cursor),
            (TokenKind::Word, "filter") => state.parse_filter(cursor),
            (TokenKind::Word, "param") => state.parse_param(cursor, &mut self.res),
            (TokenKind::Word, "buffer") => state.parse_buffer(cursor),
            (TokenKind::Word, "store") => state.parse_store(cursor),
            (TokenKind::Value, _) => state.parse_definition(first, cursor),
            (TokenKind::Word, _) => state.parse_call(first, cursor),
            _ => Err(cursor.unexpected(Some(first), vec!["directive", "value"])),
        }
    }

    fn finish_kernel(&mut self) {
        let Some(state) = self.current.take() else {
            return;
        };
        let span = state.span;
        match state.finish() {
            Ok(kernel) => self.kernels.push(kernel),
            Err(err) => self
                .res
                .add_err(DiagnosticBuilder::new(span).build_invalid_operands(err.to_string())),
        }
    }

    fn finish(mut self) -> AggregateResult<Vec<ParsedKernel>> {
        self.finish_kernel();
        let kernels = self.kernels;
        self.res.map(|()| kernels)
    }
}

/// The tokens of one line.
struct Cursor<'t, 's> {
    tokens: &'t [Token<'s>],
    pos: usize,
    /// The whole line.
    span: Span,
}

impl<'t, 's> Cursor<'t, 's> {
    fn peek(&self) -> Option<Token<'s>> {
        self.tokens.get(self.pos).copied()
    }

    fn next(&mut self) -> Option<Token<'s>> {
        let token = self.peek()?;
        self.pos += 1;
        Some(token)
    }

    /// Consumes the next token if it is of kind `kind`.
    fn eat(&mut self, kind: TokenKind) -> Option<Token<'s>> {
        self.peek()
            .filter(|token| token.kind == kind)
            .and_then(|_| self.next())
    }

    fn eat_word(&mut self, word: &str) -> bool {
        match self.peek() {
            Some(token) if token.kind == TokenKind::Word && token.text == word => {
                self.pos += 1;
                true
            }
            _ => false,
        }
    }

    fn expect(&mut self, kind: TokenKind, expected: &str) -> Result<Token<'s>, Diagnostic> {
        match self.next() {
            Some(token) if token.kind == kind => {
                if kind == TokenKind::Value && token.text.len() < 2 {
                    return Err(self.unexpected(Some(token), vec![expected]));
                }
                Ok(token)
            }
            token => Err(self.unexpected(token, vec![expected])),
        }
    }

    fn expect_number(&mut self) -> Result<(u32, Span), Diagnostic> {
        let token = self.expect(TokenKind::Word, "number")?;
        match token.text.parse() {
            Ok(n) => Ok((n, token.span)),
            Err(_) => Err(self.unexpected(Some(token), vec!["number"])),
        }
    }

    fn expect_end(&mut self) -> Result<(), Diagnostic> {
        match self.next() {
            None => Ok(()),
            token => Err(self.unexpected(token, vec!["end of line"])),
        }
    }

    /// Comma separated values and words, up to a `:` or the end of the line.
    fn items(&mut self) -> Result<Vec<Token<'s>>, Diagnostic> {
        let mut items = Vec::new();
        if matches!(self.peek(), None | Some(Token { kind: TokenKind::Colon, .. })) {
            return Ok(items);
        }
        loop {
            match self.next() {
                Some(token) if matches!(token.kind, TokenKind::Value | TokenKind::Word) => {
                    items.push(token)
                }
                token => return Err(self.unexpected(token, vec!["value"])),
            }
            if self.eat(TokenKind::Comma).is_none() {
                return Ok(items);
            }
        }
    }

    /// `unexpected` is `None` at the end of the line.
    fn unexpected(&self, unexpected: Option<Token<'_>>, expected: Vec<&str>) -> Diagnostic {
        match unexpected {
            Some(token) => DiagnosticBuilder::new(token.span).build_syntax_error(token.text, expected),
            None => {
                let end = self.span.excl_end();
                DiagnosticBuilder::new(end..end).build_syntax_error("end of line", expected)
            }
        }
    }
}

/// A defined value of the kernel being parsed.
#[derive(Debug, Clone, Copy)]
struct Value {
    id: OpId,
    span: Span,
}

struct KernelState {
    builder: KernelBuilder,
    span: Span,
    values: HashMap<String, Value>,
    params: BTreeMap<OpId, ParameterDescriptor>,
    block: Option<((u32, u32), Span)>,
    filter: Option<((u32, u32), Span)>,
    buffers: Buffers,
    buffer_spans: BTreeMap<OpId, Span>,
    spans: BTreeMap<OpId, Span>,
}

impl KernelState {
    fn new(name: &str, span: Span) -> Self {
        Self {
            builder: KernelBuilder::new(name),
            span,
            values: HashMap::new(),
            params: BTreeMap::new(),
            block: None,
            filter: None,
            buffers: Buffers::new(),
            buffer_spans: BTreeMap::new(),
            spans: BTreeMap::new(),
        }
    }

    fn finish(self) -> Result<ParsedKernel, kernel_ir::ValidationError> {
        Ok(ParsedKernel {
            kernel: self.builder.build()?,
            span: self.span,
            block: self.block,
            filter: self.filter,
            buffers: self.buffers,
            buffer_spans: self.buffer_spans,
            spans: self.spans,
        })
    }

    fn parse_block(&mut self, cursor: &mut Cursor<'_, '_>) -> Result<(), Diagnostic> {
        let size = parse_dimensions(cursor, "block dimensions must be at least 1")?;
        self.block = Some((size, cursor.span));
        Ok(())
    }

    fn parse_filter(&mut self, cursor: &mut Cursor<'_, '_>) -> Result<(), Diagnostic> {
        let size = parse_dimensions(cursor, "filter dimensions must be at least 1")?;
        self.filter = Some((size, cursor.span));
        Ok(())
    }

    /// `param %NAME : [filter] TYPE`
    fn parse_param(
        &mut self,
        cursor: &mut Cursor<'_, '_>,
        res: &mut AggregateResult<()>,
    ) -> Result<(), Diagnostic> {
        let name = cursor.expect(TokenKind::Value, "value")?;
        cursor.expect(TokenKind::Colon, "`:`")?;
        let is_filter = cursor.eat_word("filter");
        let ty = if let Some(unknown) = cursor.eat(TokenKind::Question) {
            res.add_rec_diagnostic(
                DiagnosticBuilder::new(unknown.span).build_unknown_param_type(name.text),
            );
            None
        } else {
            let word = cursor.expect(TokenKind::Word, "type")?;
            match word.text {
                "scalar" => Some(TypeTag::Scalar),
                "ptr" => Some(TypeTag::Pointer),
                "struct" => Some(TypeTag::Struct(
                    cursor.expect(TokenKind::Word, "struct name")?.text.to_owned(),
                )),
                _ => {
                    res.add_rec_diagnostic(
                        DiagnosticBuilder::new(word.span).build_unknown_param_type(name.text),
                    );
                    None
                }
            }
        };
        cursor.expect_end()?;

        self.check_new(name)?;
        let id = self.builder.add_param(&name.text[1..], ty.clone(), is_filter);
        self.params.insert(
            id,
            ParameterDescriptor {
                id,
                name: name.text[1..].to_owned(),
                ty,
                is_filter,
            },
        );
        self.define(name, id, cursor.span);
        Ok(())
    }

    /// `buffer %NAME ELEM [data=E] [width=E] [height=E] [stride=N]`, where `%NAME` is a parameter
    /// or a pointer extracted from a struct.
    fn parse_buffer(&mut self, cursor: &mut Cursor<'_, '_>) -> Result<(), Diagnostic> {
        let name = cursor.expect(TokenKind::Value, "value")?;
        let id = self.resolve(name)?;
        let kernel = self.builder.function();
        if !self.params.contains_key(&id) && kernel.buffer_of(id) != Some(id) {
            return Err(DiagnosticBuilder::new(name.span).build_invalid_operands(format!(
                "`{}` is neither a parameter nor an extracted pointer",
                name.text
            )));
        }
        let elem = cursor.expect(TokenKind::Word, "element type")?;
        let mut buffer = BufferDescriptor::for_buffer(kernel, id);
        buffer.elem = ScalarTy::from_name(elem.text).ok_or_else(|| {
            DiagnosticBuilder::new(elem.span).build_unknown_scalar_type(elem.text)
        })?;

        while let Some(key) = cursor.eat(TokenKind::Word) {
            cursor.expect(TokenKind::Equals, "`=`")?;
            let value = cursor.expect(TokenKind::Word, "expression")?;
            match key.text {
                "data" => buffer.data = value.text.to_owned(),
                "width" => buffer.width = value.text.to_owned(),
                "height" => buffer.height = value.text.to_owned(),
                "stride" => match value.text.parse() {
                    Ok(stride) if stride > 0 => buffer.stride = stride,
                    _ => return Err(cursor.unexpected(Some(value), vec!["positive number"])),
                },
                _ => {
                    let expected = vec!["data", "width", "height", "stride"];
                    return Err(cursor.unexpected(Some(key), expected));
                }
            }
        }
        cursor.expect_end()?;

        if let Some(&first_seen) = self.buffer_spans.get(&id) {
            return Err(DiagnosticBuilder::new(cursor.span)
                .build_duplicate_value(&format!("buffer {}", name.text), first_seen));
        }
        self.buffer_spans.insert(id, cursor.span);
        self.buffers.declare(id, buffer);
        Ok(())
    }

    /// `store %PTR, %VALUE`
    fn parse_store(&mut self, cursor: &mut Cursor<'_, '_>) -> Result<(), Diagnostic> {
        let items = cursor.items()?;
        cursor.expect_end()?;
        let operands = self.resolve_values(cursor, &items)?;
        check_arity(&OpKind::Store, operands.len(), cursor.span)?;
        let id = self.builder.store(operands[0], operands[1]);
        self.spans.insert(id, cursor.span);
        Ok(())
    }

    /// `NAME [%a, %b, ...]`: an operation without a result.
    fn parse_call(&mut self, name: Token<'_>, cursor: &mut Cursor<'_, '_>) -> Result<(), Diagnostic> {
        let unknown = || DiagnosticBuilder::new(name.span).build_unknown_directive(name.text);
        let items = cursor.items().map_err(|_| unknown())?;
        if cursor.peek().is_some() || items.iter().any(|t| t.kind != TokenKind::Value) {
            return Err(unknown());
        }
        let operands = self.resolve_values(cursor, &items)?;
        let kind = OpKind::Other {
            name: name.text.to_owned(),
        };
        let id = self.builder.push(kind, operands, None);
        self.spans.insert(id, cursor.span);
        Ok(())
    }

    /// `%NAME = KIND OPERANDS [: TYPE]`
    fn parse_definition(
        &mut self,
        name: Token<'_>,
        cursor: &mut Cursor<'_, '_>,
    ) -> Result<(), Diagnostic> {
        if name.text.len() < 2 {
            return Err(cursor.unexpected(Some(name), vec!["value"]));
        }
        cursor.expect(TokenKind::Equals, "`=`")?;
        let mnemonic = cursor.expect(TokenKind::Word, "operation")?;
        let mut items = cursor.items()?;
        let ty = match cursor.eat(TokenKind::Colon) {
            Some(_) => Some(parse_type(cursor)?),
            None => None,
        };
        cursor.expect_end()?;

        let kind = match mnemonic.text {
            "extract" => {
                let field = match items.pop() {
                    Some(field) if field.kind == TokenKind::Word => field,
                    other => return Err(cursor.unexpected(other, vec!["field name"])),
                };
                OpKind::StructExtract {
                    field: field.text.to_owned(),
                }
            }
            "bitcast" => OpKind::Reinterpret,
            "lea" => OpKind::AddressCompute,
            "load" => OpKind::Load,
            "store" | "param" => {
                return Err(DiagnosticBuilder::new(mnemonic.span).build_invalid_operands(
                    format!("`{}` doesn't produce a value", mnemonic.text),
                ))
            }
            other => OpKind::Other {
                name: other.to_owned(),
            },
        };
        let ty = match (ty, &kind) {
            (Some(ty), _) => ty,
            (None, OpKind::StructExtract { .. }) => {
                return Err(cursor.unexpected(None, vec!["`:`"]));
            }
            (None, OpKind::Reinterpret | OpKind::AddressCompute) => TypeTag::Pointer,
            (None, _) => TypeTag::Scalar,
        };

        let operands = self.resolve_values(cursor, &items)?;
        check_arity(&kind, operands.len(), mnemonic.span)?;
        self.check_new(name)?;
        let id = self.builder.push(kind, operands, Some(ty));
        self.define(name, id, cursor.span);
        Ok(())
    }

    fn resolve(&self, token: Token<'_>) -> Result<OpId, Diagnostic> {
        self.values
            .get(&token.text[1..])
            .map(|value| value.id)
            .ok_or_else(|| DiagnosticBuilder::new(token.span).build_undefined_value(token.text))
    }

    fn resolve_values(
        &self,
        cursor: &Cursor<'_, '_>,
        items: &[Token<'_>],
    ) -> Result<Vec<OpId>, Diagnostic> {
        items
            .iter()
            .map(|&token| match token.kind {
                TokenKind::Value if token.text.len() > 1 => self.resolve(token),
                _ => Err(cursor.unexpected(Some(token), vec!["value"])),
            })
            .collect()
    }

    fn check_new(&self, name: Token<'_>) -> Result<(), Diagnostic> {
        match self.values.get(&name.text[1..]) {
            Some(first) => Err(DiagnosticBuilder::new(name.span)
                .build_duplicate_value(name.text, first.span)),
            None => Ok(()),
        }
    }

    fn define(&mut self, name: Token<'_>, id: OpId, line: Span) {
        let name = &name.text[1..];
        self.builder.set_name(id, name);
        self.values.insert(
            name.to_owned(),
            Value {
                id,
                span: line,
            },
        );
        self.spans.insert(id, line);
    }
}

fn parse_dimensions(cursor: &mut Cursor<'_, '_>, zero: &str) -> Result<(u32, u32), Diagnostic> {
    let (x, _) = cursor.expect_number()?;
    let (y, _) = cursor.expect_number()?;
    cursor.expect_end()?;
    if x == 0 || y == 0 {
        return Err(DiagnosticBuilder::new(cursor.span).build_invalid_launch_config(zero));
    }
    Ok((x, y))
}

fn parse_type(cursor: &mut Cursor<'_, '_>) -> Result<TypeTag, Diagnostic> {
    let word = cursor.expect(TokenKind::Word, "type")?;
    match word.text {
        "scalar" => Ok(TypeTag::Scalar),
        "ptr" => Ok(TypeTag::Pointer),
        "struct" => {
            let name = cursor.expect(TokenKind::Word, "struct name")?;
            Ok(TypeTag::Struct(name.text.to_owned()))
        }
        _ => Err(cursor.unexpected(Some(word), vec!["scalar", "ptr", "struct"])),
    }
}

fn check_arity(kind: &OpKind, found: usize, span: Span) -> Result<(), Diagnostic> {
    let (min, max) = kind.arity();
    if (min..=max).contains(&found) {
        return Ok(());
    }
    let expected = match min == max {
        true => format!("{min}"),
        false => format!("{min} to {max}"),
    };
    Err(DiagnosticBuilder::new(span).build_invalid_operands(format!(
        "`{}` takes {expected} operands, found {found}",
        kind.mnemonic()
    )))
}
