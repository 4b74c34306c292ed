// ==============================================================================
// Declaration-level Go parser
// ==============================================================================
//
// This is not a full Go parser. It understands exactly what struct filling
// needs: the package clause, imports, type and integer-constant declarations
// (top level and function local) and every composite literal that spells out
// its type. Statements and expressions are otherwise scanned token by token.
//
// The one real ambiguity is `T {`: a literal, or an `if`/`for`/`switch`
// header followed by its block. Go resolves it by forbidding bare type-name
// literals at the top level of a header, so we track open headers together
// with the paren depth they were opened at. A func header additionally turns
// any `type {` at its depth into "result type, then body".

use std::collections::HashSet;

use la_arena::Arena;
use smol_str::SmolStr;

use crate::ast::{
    ArrayLen, ChanDir, CompositeLit, ConstDecl, Element, FieldDecl, ImportSpec, Key, SourceFile,
    TypeDecl, TypeExpr,
};
use crate::error::{Diag, Span};
use crate::lexer::{comments_in, tokenize, TokKind, Token};
use crate::line_index::LineIndex;

/// Parse a Go source file. Never fails; problems end up in `diags`.
pub fn parse(text: impl Into<String>) -> SourceFile {
    let text = text.into();
    let (toks, mut diags) = tokenize(&text);
    let (package, imports, types, consts, literals) = {
        let mut parser = Parser::new(&text, toks);
        parser.run();
        diags.append(&mut parser.diags);
        (
            parser.package,
            parser.imports,
            parser.types,
            parser.consts,
            parser.literals,
        )
    };
    if !diags.is_empty() {
        log::debug!("parsed with {} diagnostics", diags.len());
    }

    let line_index = LineIndex::new(&text);
    SourceFile {
        text,
        package,
        imports,
        types,
        consts,
        literals,
        diags,
        line_index,
    }
}

#[derive(Debug, Clone, Copy)]
struct Header {
    depth: usize,
    /// Number of literal bodies open when the header started.
    level: usize,
    func: bool,
}

struct Parser<'a> {
    src: &'a str,
    toks: Vec<Token>,
    /// For every opening `(`, `[` or `{`, the index of its closer.
    matching: Vec<Option<usize>>,
    pos: usize,

    paren_depth: usize,
    headers: Vec<Header>,
    bodies: Vec<Span>,
    literal_braces: HashSet<usize>,
    /// Closing-brace indices of the literals we are currently inside.
    open_literals: Vec<usize>,

    package: Option<SmolStr>,
    imports: Vec<ImportSpec>,
    types: Arena<TypeDecl>,
    consts: Vec<ConstDecl>,
    literals: Arena<CompositeLit>,
    diags: Vec<Diag>,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str, toks: Vec<Token>) -> Self {
        let mut diags = Vec::new();
        let matching = match_delimiters(&toks, &mut diags);
        Self {
            src,
            toks,
            matching,
            pos: 0,
            paren_depth: 0,
            headers: Vec::new(),
            bodies: Vec::new(),
            literal_braces: HashSet::new(),
            open_literals: Vec::new(),
            package: None,
            imports: Vec::new(),
            types: Arena::new(),
            consts: Vec::new(),
            literals: Arena::new(),
            diags,
        }
    }

    // -- token helpers -----------------------------------------------------

    fn kind_at(&self, idx: usize) -> Option<TokKind> {
        self.toks.get(idx).map(|t| t.kind)
    }

    fn peek(&self) -> Option<TokKind> {
        self.kind_at(self.pos)
    }

    fn peek_nth(&self, n: usize) -> Option<TokKind> {
        self.kind_at(self.pos + n)
    }

    fn at(&self, kind: TokKind) -> bool {
        self.peek() == Some(kind)
    }

    fn eat(&mut self, kind: TokKind) -> bool {
        if self.at(kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn text(&self, idx: usize) -> &'a str {
        let src: &'a str = self.src;
        &src[self.toks[idx].span.clone()]
    }

    fn start_of(&self, idx: usize) -> usize {
        self.toks
            .get(idx)
            .map(|t| t.span.start)
            .unwrap_or(self.src.len())
    }

    /// End offset of the last token before `pos`.
    fn prev_end(&self) -> usize {
        self.pos
            .checked_sub(1)
            .and_then(|i| self.toks.get(i))
            .map(|t| t.span.end)
            .unwrap_or(0)
    }

    fn eof(&self) -> bool {
        self.pos >= self.toks.len()
    }

    fn error_here(&mut self, message: &str) {
        let span = self
            .toks
            .get(self.pos)
            .map(|t| t.span.clone())
            .unwrap_or(self.src.len()..self.src.len());
        self.diags.push(Diag::parse(span, message));
    }

    /// Skip to just past the next `;` at the current nesting level, stopping
    /// early at `limit` or at an unbalanced closer. Always consumes at least
    /// one token when not already at `limit`.
    fn recover_to_semi(&mut self, limit: usize) {
        let start = self.pos;
        while self.pos < limit {
            match self.toks[self.pos].kind {
                TokKind::Semi => {
                    self.pos += 1;
                    return;
                }
                TokKind::RParen | TokKind::RBrack | TokKind::RBrace if self.pos > start => return,
                TokKind::LParen | TokKind::LBrack | TokKind::LBrace => {
                    self.pos = self.matching[self.pos].map(|c| c + 1).unwrap_or(limit);
                }
                _ => self.pos += 1,
            }
        }
    }

    /// The innermost header, if it was opened at the current nesting.
    fn header_here(&self) -> Option<Header> {
        self.headers
            .last()
            .copied()
            .filter(|h| h.depth == self.paren_depth && h.level == self.open_literals.len())
    }

    fn current_scope(&self, offset: usize) -> Option<Span> {
        self.bodies
            .iter()
            .rev()
            .find(|body| body.contains(&offset))
            .cloned()
    }

    // -- driver --------------------------------------------------------------

    fn run(&mut self) {
        while !self.eof() {
            let tok = self.toks[self.pos].clone();
            match tok.kind {
                TokKind::KwPackage => {
                    self.pos += 1;
                    if self.at(TokKind::Ident) {
                        self.package = Some(self.text(self.pos).into());
                        self.pos += 1;
                    } else {
                        self.error_here("expected package name");
                    }
                }
                TokKind::KwImport => self.import_decl(),
                TokKind::KwType if self.starts_type_decl() => self.type_decl(),
                TokKind::KwConst => self.const_decl(),
                TokKind::KwFunc
                | TokKind::KwIf
                | TokKind::KwFor
                | TokKind::KwSwitch
                | TokKind::KwSelect => {
                    self.headers.push(Header {
                        depth: self.paren_depth,
                        level: self.open_literals.len(),
                        func: tok.kind == TokKind::KwFunc,
                    });
                    self.pos += 1;
                }
                TokKind::Semi => {
                    let (depth, level) = (self.paren_depth, self.open_literals.len());
                    // `for` clauses hold explicit semicolons; only a newline
                    // ends a control header.
                    let implicit = tok.is_implicit_semi();
                    while self.headers.last().is_some_and(|h| {
                        h.level == level && h.depth >= depth && (implicit || h.func)
                    }) {
                        self.headers.pop();
                    }
                    self.pos += 1;
                }
                TokKind::LBrack if self.try_literal() => {}
                TokKind::LParen | TokKind::LBrack => {
                    self.paren_depth += 1;
                    self.pos += 1;
                }
                TokKind::RParen | TokKind::RBrack => {
                    self.paren_depth = self.paren_depth.saturating_sub(1);
                    let depth = self.paren_depth;
                    while self.headers.last().is_some_and(|h| h.depth > depth) {
                        self.headers.pop();
                    }
                    self.pos += 1;
                }
                TokKind::LBrace => {
                    self.open_brace(self.pos);
                    self.pos += 1;
                }
                TokKind::RBrace => {
                    if self.open_literals.last() == Some(&self.pos) {
                        self.open_literals.pop();
                        let level = self.open_literals.len();
                        while self.headers.last().is_some_and(|h| h.level > level) {
                            self.headers.pop();
                        }
                    }
                    let start = tok.span.start;
                    self.bodies.retain(|body| body.end > start + 1);
                    self.pos += 1;
                }
                TokKind::Ident | TokKind::KwMap | TokKind::KwStruct if self.try_literal() => {}
                // A type body is never a block, even right before one.
                TokKind::KwStruct | TokKind::KwInterface => {
                    self.pos += 1;
                    if self.at(TokKind::LBrace) {
                        self.pos = self.matching[self.pos].map_or(self.pos + 1, |c| c + 1);
                    }
                }
                _ => self.pos += 1,
            }
        }
    }

    /// `type` also appears in type switches: `x.(type)`.
    fn starts_type_decl(&self) -> bool {
        let after = self.peek_nth(1);
        let before = self.pos.checked_sub(1).and_then(|i| self.kind_at(i));
        before != Some(TokKind::LParen)
            && matches!(after, Some(TokKind::Ident) | Some(TokKind::LParen))
    }

    fn open_brace(&mut self, idx: usize) {
        if self.literal_braces.contains(&idx) {
            if let Some(close) = self.matching[idx] {
                self.open_literals.push(close);
            }
            return;
        }
        if let Some(header) = self.header_here() {
            self.headers.pop();
            if header.func {
                let start = self.toks[idx].span.start;
                let end = self.matching[idx]
                    .map(|close| self.toks[close].span.end)
                    .unwrap_or(self.src.len());
                self.bodies.push(start..end);
            }
        }
    }

    // -- composite literals --------------------------------------------------

    /// Try to read `Type {` at the current position. On success records the
    /// literal and leaves `pos` on its `{`; otherwise leaves `pos` untouched.
    fn try_literal(&mut self) -> bool {
        let start = self.pos;
        let diag_mark = self.diags.len();
        let ty = match self.parse_type() {
            Some(ty) if self.at(TokKind::LBrace) => ty,
            _ => return self.backtrack(start, diag_mark),
        };

        if let Some(header) = self.header_here() {
            if header.func || ty.is_type_name() {
                return self.backtrack(start, diag_mark);
            }
        }

        let lbrace = self.pos;
        let Some(rbrace) = self.matching[lbrace] else {
            return self.backtrack(start, diag_mark);
        };

        let ty_span = self.toks[start].span.start..self.prev_end();
        let (elements, dangling) = self.split_elements(lbrace, rbrace);
        self.literals.alloc(CompositeLit {
            ty,
            ty_span,
            lbrace: self.toks[lbrace].span.start,
            rbrace: self.toks[rbrace].span.start,
            elements,
            dangling,
        });
        self.literal_braces.insert(lbrace);
        true
    }

    fn backtrack(&mut self, pos: usize, diag_mark: usize) -> bool {
        self.pos = pos;
        self.diags.truncate(diag_mark);
        false
    }

    fn split_elements(&self, lbrace: usize, rbrace: usize) -> (Vec<Element>, Vec<SmolStr>) {
        let src = self.src;
        let mut elements = Vec::new();
        let mut prev_end = self.toks[lbrace].span.end;
        let mut i = lbrace + 1;

        loop {
            let mut first = None;
            let mut last = None;
            let mut j = i;
            while j < rbrace {
                let kind = self.toks[j].kind;
                if kind == TokKind::Comma {
                    break;
                }
                if kind == TokKind::Semi {
                    j += 1;
                    continue;
                }
                if first.is_none() {
                    first = Some(j);
                }
                match self.matching[j] {
                    Some(close) if close <= rbrace => {
                        last = Some(close);
                        j = close + 1;
                    }
                    _ => {
                        last = Some(j);
                        j += 1;
                    }
                }
            }
            let comma = (j < rbrace).then_some(j);

            if let (Some(first), Some(last)) = (first, last) {
                let first_start = self.toks[first].span.start;
                let leading = comments_in(&src[prev_end.min(first_start)..first_start])
                    .into_iter()
                    .map(|(_, c)| SmolStr::from(c))
                    .collect();

                let (key, value_first) = self.element_key(first, last);
                let value_end = self.toks[last].span.end;
                // Comments between `key:` and the value belong to the value.
                let value = match value_first {
                    Some(v) if key.is_some() => {
                        let colon_end = self.toks[v - 1].span.end;
                        let gap = &src[colon_end..self.toks[v].span.start];
                        colon_end + (gap.len() - gap.trim_start().len())..value_end
                    }
                    Some(v) => self.toks[v].span.start..value_end,
                    None => value_end..value_end,
                };

                let after = comma
                    .map(|c| self.toks[c].span.end)
                    .unwrap_or(value_end);
                let next_start = self.start_of(comma.map(|c| c + 1).unwrap_or(rbrace));
                let next_start = next_start.max(after);
                let line_end = src[after..next_start]
                    .find('\n')
                    .map(|off| after + off)
                    .unwrap_or(next_start);
                let trailing: Vec<&str> = comments_in(&src[value_end..line_end])
                    .into_iter()
                    .map(|(_, c)| c)
                    .collect();
                prev_end = if trailing.is_empty() {
                    after
                } else {
                    line_end
                };

                elements.push(Element {
                    key,
                    value,
                    span: first_start..value_end,
                    leading,
                    trailing: (!trailing.is_empty()).then(|| trailing.join(" ").into()),
                });
            }

            match comma {
                Some(c) => i = c + 1,
                None => break,
            }
        }

        let rbrace_start = self.toks[rbrace].span.start;
        let dangling = comments_in(&src[prev_end.min(rbrace_start)..rbrace_start])
            .into_iter()
            .map(|(_, c)| SmolStr::from(c))
            .collect();
        (elements, dangling)
    }

    /// Find `key:` at the start of an element spanning tokens `first..=last`.
    /// Returns the key and the first token of the value.
    fn element_key(&self, first: usize, last: usize) -> (Option<Key>, Option<usize>) {
        if self.toks[first].kind == TokKind::Ident
            && first < last
            && self.toks[first + 1].kind == TokKind::Colon
        {
            let key = Key {
                text: self.text(first).into(),
                span: self.toks[first].span.clone(),
                is_ident: true,
            };
            let value = (first + 2 <= last).then_some(first + 2);
            return (Some(key), value);
        }

        let mut k = first;
        while k <= last {
            match self.toks[k].kind {
                TokKind::Colon if k > first => {
                    let span = self.toks[first].span.start..self.toks[k - 1].span.end;
                    let key = Key {
                        text: self.src[span.clone()].into(),
                        span,
                        is_ident: false,
                    };
                    return (Some(key), (k < last).then_some(k + 1));
                }
                TokKind::LParen | TokKind::LBrack | TokKind::LBrace => {
                    k = self.matching[k].map(|c| c + 1).unwrap_or(last + 1);
                }
                _ => k += 1,
            }
        }
        (None, Some(first))
    }

    // -- types ---------------------------------------------------------------

    fn parse_type(&mut self) -> Option<TypeExpr> {
        match self.peek()? {
            TokKind::Ident => {
                let first = self.text(self.pos);
                self.pos += 1;
                let (qualifier, name) =
                    if self.at(TokKind::Dot) && self.peek_nth(1) == Some(TokKind::Ident) {
                        let name = self.text(self.pos + 1);
                        self.pos += 2;
                        (Some(SmolStr::from(first)), SmolStr::from(name))
                    } else {
                        (None, SmolStr::from(first))
                    };
                let args = self.type_args().unwrap_or_default();
                Some(TypeExpr::Name {
                    qualifier,
                    name,
                    args,
                })
            }
            TokKind::Star => {
                self.pos += 1;
                Some(TypeExpr::Pointer(Box::new(self.parse_type()?)))
            }
            TokKind::LBrack => {
                if self.peek_nth(1) == Some(TokKind::RBrack) {
                    self.pos += 2;
                    return Some(TypeExpr::Slice(Box::new(self.parse_type()?)));
                }
                let close = self.matching[self.pos]?;
                let len = if close == self.pos + 2 && self.peek_nth(1) == Some(TokKind::Ellipsis)
                {
                    ArrayLen::Ellipsis
                } else if close == self.pos + 2 && self.peek_nth(1) == Some(TokKind::Number) {
                    let text = self.text(self.pos + 1);
                    ArrayLen::Int(parse_int(text)?)
                } else if close > self.pos + 1 {
                    let span = self.toks[self.pos + 1].span.start..self.toks[close - 1].span.end;
                    ArrayLen::Expr(self.src[span].into())
                } else {
                    return None;
                };
                self.pos = close + 1;
                let elem = self.parse_type()?;
                Some(TypeExpr::Array {
                    len,
                    elem: Box::new(elem),
                })
            }
            TokKind::KwMap => {
                self.pos += 1;
                if !self.eat(TokKind::LBrack) {
                    return None;
                }
                let key = self.parse_type()?;
                if !self.eat(TokKind::RBrack) {
                    return None;
                }
                let value = self.parse_type()?;
                Some(TypeExpr::Map {
                    key: Box::new(key),
                    value: Box::new(value),
                })
            }
            TokKind::KwChan => {
                self.pos += 1;
                let dir = if self.eat(TokKind::Arrow) {
                    ChanDir::Send
                } else {
                    ChanDir::Both
                };
                Some(TypeExpr::Chan {
                    dir,
                    elem: Box::new(self.parse_type()?),
                })
            }
            TokKind::Arrow if self.peek_nth(1) == Some(TokKind::KwChan) => {
                self.pos += 2;
                Some(TypeExpr::Chan {
                    dir: ChanDir::Recv,
                    elem: Box::new(self.parse_type()?),
                })
            }
            TokKind::KwFunc => {
                let start = self.toks[self.pos].span.start;
                self.pos += 1;
                if !self.at(TokKind::LParen) {
                    return None;
                }
                self.pos = self.matching[self.pos]? + 1;
                match self.peek() {
                    Some(TokKind::LParen) => self.pos = self.matching[self.pos]? + 1,
                    Some(kind) if starts_type(kind) => {
                        let save = self.pos;
                        if self.parse_type().is_none() {
                            self.pos = save;
                        }
                    }
                    _ => {}
                }
                let text = &self.src[start..self.prev_end()];
                Some(TypeExpr::Func { text: text.into() })
            }
            TokKind::KwStruct => {
                self.pos += 1;
                if !self.at(TokKind::LBrace) {
                    return None;
                }
                let lbrace = self.pos;
                let rbrace = self.matching[lbrace]?;
                let fields = self.parse_fields(lbrace, rbrace);
                self.pos = rbrace + 1;
                Some(TypeExpr::Struct { fields })
            }
            TokKind::KwInterface => {
                let start = self.toks[self.pos].span.start;
                self.pos += 1;
                if !self.at(TokKind::LBrace) {
                    return None;
                }
                self.pos = self.matching[self.pos]? + 1;
                let text = &self.src[start..self.prev_end()];
                Some(TypeExpr::Interface { text: text.into() })
            }
            TokKind::LParen => {
                self.pos += 1;
                let inner = self.parse_type()?;
                self.eat(TokKind::RParen).then_some(inner)
            }
            _ => None,
        }
    }

    /// `[T1, T2]` after a type name. Restores `pos` when the brackets do not
    /// hold a type list.
    fn type_args(&mut self) -> Option<Vec<TypeExpr>> {
        if !self.at(TokKind::LBrack) || self.peek_nth(1) == Some(TokKind::RBrack) {
            return None;
        }
        let save = self.pos;
        let close = self.matching[self.pos]?;
        self.pos += 1;
        let mut args = Vec::new();
        loop {
            match self.parse_type() {
                Some(arg) => args.push(arg),
                None => {
                    self.pos = save;
                    return None;
                }
            }
            if self.eat(TokKind::Comma) {
                continue;
            }
            if self.pos == close {
                self.pos += 1;
                return Some(args);
            }
            self.pos = save;
            return None;
        }
    }

    fn parse_fields(&mut self, lbrace: usize, rbrace: usize) -> Vec<FieldDecl> {
        let mut fields = Vec::new();
        self.pos = lbrace + 1;
        while self.pos < rbrace {
            if self.eat(TokKind::Semi) {
                continue;
            }
            let start_tok = self.pos;
            let start = self.toks[start_tok].span.start;

            let parsed = match self.peek() {
                Some(TokKind::Ident) if self.field_is_embedded(rbrace) => {
                    self.parse_type().map(|ty| (Vec::new(), ty))
                }
                Some(TokKind::Ident) => {
                    let mut names = vec![SmolStr::from(self.text(self.pos))];
                    self.pos += 1;
                    while self.at(TokKind::Comma) && self.peek_nth(1) == Some(TokKind::Ident) {
                        names.push(self.text(self.pos + 1).into());
                        self.pos += 2;
                    }
                    self.parse_type().map(|ty| (names, ty))
                }
                Some(TokKind::Star) => {
                    self.pos += 1;
                    self.parse_type()
                        .map(|ty| (Vec::new(), TypeExpr::Pointer(Box::new(ty))))
                }
                _ => None,
            };

            let Some((names, ty)) = parsed else {
                self.pos = start_tok;
                self.error_here("expected field declaration");
                self.pos = start_tok + 1;
                self.recover_to_semi(rbrace);
                continue;
            };

            let tag = match self.peek() {
                Some(TokKind::String) | Some(TokKind::RawString) if self.pos < rbrace => {
                    let tag = self.text(self.pos);
                    self.pos += 1;
                    Some(SmolStr::from(tag))
                }
                _ => None,
            };

            fields.push(FieldDecl {
                names,
                ty,
                tag,
                span: start..self.prev_end(),
            });

            if self.pos < rbrace && !self.eat(TokKind::Semi) {
                self.error_here("expected `;` after field");
                self.recover_to_semi(rbrace);
            }
        }
        fields
    }

    /// At an identifier inside a struct body: is this an embedded field
    /// (`T`, `pkg.T`, `G[int]`) rather than a named one?
    fn field_is_embedded(&self, rbrace: usize) -> bool {
        let ends_field = |idx: usize| {
            idx >= rbrace
                || matches!(
                    self.kind_at(idx),
                    Some(TokKind::Semi) | Some(TokKind::String) | Some(TokKind::RawString)
                )
        };
        match self.peek_nth(1) {
            Some(TokKind::Dot) => true,
            Some(TokKind::LBrack) => self.matching[self.pos + 1]
                .is_some_and(|close| ends_field(close + 1)),
            _ => ends_field(self.pos + 1),
        }
    }

    // -- declarations --------------------------------------------------------

    fn import_decl(&mut self) {
        self.pos += 1;
        if self.at(TokKind::LParen) {
            let close = self.matching[self.pos].unwrap_or(self.toks.len());
            self.pos += 1;
            while self.pos < close {
                if self.eat(TokKind::Semi) {
                    continue;
                }
                if !self.import_spec() {
                    self.recover_to_semi(close);
                }
            }
            self.pos = close + 1;
        } else if !self.import_spec() {
            self.recover_to_semi(self.toks.len());
        }
    }

    fn import_spec(&mut self) -> bool {
        let start = self.start_of(self.pos);
        let name = match self.peek() {
            Some(TokKind::Ident) => {
                let name = self.text(self.pos);
                self.pos += 1;
                Some(SmolStr::from(name))
            }
            Some(TokKind::Dot) => {
                self.pos += 1;
                Some(SmolStr::from("."))
            }
            _ => None,
        };
        match self.peek() {
            Some(TokKind::String) | Some(TokKind::RawString) => {
                let quoted = self.text(self.pos);
                self.pos += 1;
                self.imports.push(ImportSpec {
                    name,
                    path: unquote(quoted).into(),
                    span: start..self.prev_end(),
                });
                true
            }
            _ => {
                self.error_here("expected import path");
                false
            }
        }
    }

    fn type_decl(&mut self) {
        let scope = self.current_scope(self.toks[self.pos].span.start);
        self.pos += 1;
        if self.at(TokKind::LParen) {
            let close = self.matching[self.pos].unwrap_or(self.toks.len());
            self.pos += 1;
            while self.pos < close {
                if self.eat(TokKind::Semi) {
                    continue;
                }
                if !self.type_spec(scope.clone()) {
                    self.recover_to_semi(close);
                }
            }
            self.pos = close + 1;
        } else if !self.type_spec(scope) {
            self.recover_to_semi(self.toks.len());
        }
    }

    fn type_spec(&mut self, scope: Option<Span>) -> bool {
        if !self.at(TokKind::Ident) {
            self.error_here("expected type name");
            return false;
        }
        let start = self.toks[self.pos].span.start;
        let name = SmolStr::from(self.text(self.pos));
        self.pos += 1;

        let params = if self.at(TokKind::LBrack) && self.starts_type_params() {
            let close = self.matching[self.pos].unwrap_or(self.pos);
            let params = self.type_param_names(self.pos + 1, close);
            self.pos = close + 1;
            params
        } else {
            Vec::new()
        };

        let alias = self.eat(TokKind::Assign);
        let Some(ty) = self.parse_type() else {
            self.error_here("expected type");
            return false;
        };

        self.types.alloc(TypeDecl {
            name,
            params,
            alias,
            ty,
            span: start..self.prev_end(),
            scope,
        });
        true
    }

    /// `type G[T any]` versus the array type in `type A [N]int`.
    fn starts_type_params(&self) -> bool {
        self.peek_nth(1) == Some(TokKind::Ident)
            && matches!(
                self.peek_nth(2),
                Some(
                    TokKind::Ident
                        | TokKind::Comma
                        | TokKind::Tilde
                        | TokKind::Star
                        | TokKind::LBrack
                        | TokKind::KwInterface
                        | TokKind::KwMap
                        | TokKind::KwChan
                        | TokKind::KwFunc
                )
            )
    }

    fn type_param_names(&self, from: usize, to: usize) -> Vec<SmolStr> {
        let mut names = Vec::new();
        let mut group_start = true;
        let mut i = from;
        while i < to {
            let kind = self.toks[i].kind;
            if group_start && kind == TokKind::Ident {
                names.push(self.text(i).into());
            }
            group_start = kind == TokKind::Comma;
            i = match kind {
                TokKind::LParen | TokKind::LBrack | TokKind::LBrace => {
                    self.matching[i].map(|c| c + 1).unwrap_or(to)
                }
                _ => i + 1,
            };
        }
        names
    }

    fn const_decl(&mut self) {
        let scope = self.current_scope(self.toks[self.pos].span.start);
        self.pos += 1;
        if self.at(TokKind::LParen) {
            let close = self.matching[self.pos].unwrap_or(self.toks.len());
            self.pos += 1;
            while self.pos < close {
                if self.eat(TokKind::Semi) {
                    continue;
                }
                self.const_spec(close, scope.clone());
            }
            self.pos = close + 1;
        } else {
            self.const_spec(self.toks.len(), scope);
        }
    }

    fn const_spec(&mut self, limit: usize, scope: Option<Span>) {
        let mut names = Vec::new();
        while self.at(TokKind::Ident) {
            names.push(SmolStr::from(self.text(self.pos)));
            self.pos += 1;
            if !self.eat(TokKind::Comma) {
                break;
            }
        }
        if names.is_empty() {
            self.error_here("expected constant name");
            self.recover_to_semi(limit);
            return;
        }

        // Optional type, then `= values`.
        while self.pos < limit && !matches!(self.peek(), Some(TokKind::Assign | TokKind::Semi)) {
            self.pos += 1;
        }
        let mut values: Vec<Option<u64>> = Vec::new();
        if self.eat(TokKind::Assign) {
            loop {
                let start = self.pos;
                while self.pos < limit
                    && !matches!(self.peek(), Some(TokKind::Comma | TokKind::Semi))
                {
                    match self.peek() {
                        Some(TokKind::LParen | TokKind::LBrack | TokKind::LBrace) => {
                            self.pos = self.matching[self.pos].map(|c| c + 1).unwrap_or(limit)
                        }
                        _ => self.pos += 1,
                    }
                }
                let single_number =
                    self.pos == start + 1 && self.kind_at(start) == Some(TokKind::Number);
                values.push(if single_number {
                    parse_int(self.text(start))
                } else {
                    None
                });
                if !self.eat(TokKind::Comma) {
                    break;
                }
            }
        }

        for (i, name) in names.into_iter().enumerate() {
            self.consts.push(ConstDecl {
                name,
                value: values.get(i).copied().flatten(),
                scope: scope.clone(),
            });
        }
        self.recover_to_semi(limit);
    }
}

fn starts_type(kind: TokKind) -> bool {
    matches!(
        kind,
        TokKind::Ident
            | TokKind::Star
            | TokKind::LBrack
            | TokKind::KwMap
            | TokKind::KwChan
            | TokKind::KwFunc
            | TokKind::KwStruct
            | TokKind::KwInterface
            | TokKind::Arrow
    )
}

fn match_delimiters(toks: &[Token], diags: &mut Vec<Diag>) -> Vec<Option<usize>> {
    let mut matching = vec![None; toks.len()];
    let mut stack: Vec<usize> = Vec::new();
    for (i, tok) in toks.iter().enumerate() {
        let opener = match tok.kind {
            TokKind::LParen | TokKind::LBrack | TokKind::LBrace => {
                stack.push(i);
                continue;
            }
            TokKind::RParen => TokKind::LParen,
            TokKind::RBrack => TokKind::LBrack,
            TokKind::RBrace => TokKind::LBrace,
            _ => continue,
        };
        match stack.last() {
            Some(&open) if toks[open].kind == opener => {
                stack.pop();
                matching[open] = Some(i);
            }
            _ => diags.push(Diag::parse(tok.span.clone(), "unbalanced delimiter")),
        }
    }
    for open in stack {
        diags.push(Diag::parse(toks[open].span.clone(), "unclosed delimiter"));
    }
    matching
}

fn unquote(lit: &str) -> &str {
    lit.get(1..lit.len().saturating_sub(1)).unwrap_or("")
}

/// Go integer literal: decimal, `0x`, `0o`, `0b`, legacy octal, underscores.
pub fn parse_int(text: &str) -> Option<u64> {
    let clean: String = text.chars().filter(|c| *c != '_').collect();
    let lower = clean.to_ascii_lowercase();
    if let Some(hex) = lower.strip_prefix("0x") {
        u64::from_str_radix(hex, 16).ok()
    } else if let Some(oct) = lower.strip_prefix("0o") {
        u64::from_str_radix(oct, 8).ok()
    } else if let Some(bin) = lower.strip_prefix("0b") {
        u64::from_str_radix(bin, 2).ok()
    } else if lower.len() > 1 && lower.starts_with('0') {
        u64::from_str_radix(&lower[1..], 8).ok()
    } else {
        lower.parse().ok()
    }
}
