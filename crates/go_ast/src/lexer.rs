// ==============================================================================
// Go lexer
// ==============================================================================
//
// Raw tokens come from a logos DFA; the `Lexer` wrapper implements Go's
// automatic semicolon insertion and turns lex errors into diagnostics instead
// of stopping. Comments never reach the parser: line comments are skipped by
// the DFA and block comments are dropped by the wrapper (after they had their
// say in semicolon insertion). Everything skipped stays recoverable from the
// source text between two token spans.

use logos::{Lexer as LogosLexer, Logos};

use crate::error::{Diag, LexError, LexErrorKind, Span};

fn skip_line_comment(lex: &mut LogosLexer<'_, TokKind>) -> logos::Skip {
    let rest = lex.remainder();
    let len = rest.find('\n').unwrap_or(rest.len());
    lex.bump(len);
    logos::Skip
}

fn lex_block_comment(lex: &mut LogosLexer<'_, TokKind>) -> Result<(), LexErrorKind> {
    let rest = lex.remainder();
    match rest.find("*/") {
        Some(end) => {
            lex.bump(end + 2);
            Ok(())
        }
        None => {
            lex.bump(rest.len());
            Err(LexErrorKind::UnterminatedComment)
        }
    }
}

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[logos(error = LexErrorKind)]
#[logos(skip r"[ \t\r\f]+")]
#[rustfmt::skip]
pub enum TokKind {
    #[token("\u{FEFF}")] Bom,

    // Trivia, never handed out by `Lexer`.
    #[token("\n")] Newline,
    #[token("//", skip_line_comment)] _LineComment,
    #[token("/*", lex_block_comment)] BlockComment,

    #[token("break")] KwBreak,
    #[token("case")] KwCase,
    #[token("chan")] KwChan,
    #[token("const")] KwConst,
    #[token("continue")] KwContinue,
    #[token("default")] KwDefault,
    #[token("defer")] KwDefer,
    #[token("else")] KwElse,
    #[token("fallthrough")] KwFallthrough,
    #[token("for")] KwFor,
    #[token("func")] KwFunc,
    #[token("go")] KwGo,
    #[token("goto")] KwGoto,
    #[token("if")] KwIf,
    #[token("import")] KwImport,
    #[token("interface")] KwInterface,
    #[token("map")] KwMap,
    #[token("package")] KwPackage,
    #[token("range")] KwRange,
    #[token("return")] KwReturn,
    #[token("select")] KwSelect,
    #[token("struct")] KwStruct,
    #[token("switch")] KwSwitch,
    #[token("type")] KwType,
    #[token("var")] KwVar,

    #[regex(r"[_\p{L}][_\p{L}\p{Nd}]*")] Ident,

    #[regex(r"[0-9][0-9a-zA-Z_]*(\.[0-9a-zA-Z_]*)?([eEpP][+-]?[0-9_]+)?i?")]
    #[regex(r"\.[0-9][0-9_]*([eE][+-]?[0-9_]+)?i?")]
    Number,

    #[regex(r#""([^"\\\n]|\\.)*""#)] String,
    #[regex(r"`[^`]*`")] RawString,
    #[regex(r"'([^'\\\n]|\\.)+'")] Rune,

    #[token("...")] Ellipsis,
    #[token("<-")] Arrow,
    #[token(":=")] Define,
    #[token("=")] Assign,
    #[token("++")] Inc,
    #[token("--")] Dec,
    #[token("*")] Star,
    #[token("~")] Tilde,
    #[token("|")] Pipe,

    #[token("<<=")] #[token(">>=")] #[token("&^=")] #[token("+=")] #[token("-=")]
    #[token("*=")] #[token("/=")] #[token("%=")] #[token("&=")] #[token("|=")]
    #[token("^=")] #[token("<<")] #[token(">>")] #[token("&^")] #[token("&&")]
    #[token("||")] #[token("==")] #[token("!=")] #[token("<=")] #[token(">=")]
    #[token("+")] #[token("-")] #[token("/")] #[token("%")] #[token("&")]
    #[token("^")] #[token("!")] #[token("<")] #[token(">")]
    Op,

    #[token("(")] LParen,
    #[token(")")] RParen,
    #[token("[")] LBrack,
    #[token("]")] RBrack,
    #[token("{")] LBrace,
    #[token("}")] RBrace,
    #[token(",")] Comma,
    #[token(";")] Semi,
    #[token(":")] Colon,
    #[token(".")] Dot,

    // Catch-all (lowest priority)
    #[regex(r".", priority = 0)] Error,
}

impl TokKind {
    /// Whether a newline after this token ends the statement.
    pub const fn can_insert_semicolon(self) -> bool {
        matches!(
            self,
            TokKind::Ident
                | TokKind::Number
                | TokKind::String
                | TokKind::RawString
                | TokKind::Rune
                | TokKind::KwBreak
                | TokKind::KwContinue
                | TokKind::KwFallthrough
                | TokKind::KwReturn
                | TokKind::Inc
                | TokKind::Dec
                | TokKind::RParen
                | TokKind::RBrack
                | TokKind::RBrace
        )
    }

    pub const fn is_trivia(self) -> bool {
        matches!(
            self,
            TokKind::Newline | TokKind::_LineComment | TokKind::BlockComment | TokKind::Bom
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokKind,
    pub span: Span,
}

impl Token {
    pub fn text<'a>(&self, src: &'a str) -> &'a str {
        &src[self.span.clone()]
    }

    /// Semicolons synthesized from a newline have an empty span.
    pub fn is_implicit_semi(&self) -> bool {
        self.kind == TokKind::Semi && self.span.is_empty()
    }
}

pub struct Lexer<'src> {
    logos: LogosLexer<'src, TokKind>,
    pending: Option<Token>,
    diags: Vec<Diag>,
    last_can_insert_semi: bool,
    eof_done: bool,
}

impl<'src> Lexer<'src> {
    pub fn new(input: &'src str) -> Self {
        Self {
            logos: TokKind::lexer(input),
            pending: None,
            diags: Vec::new(),
            last_can_insert_semi: false,
            eof_done: false,
        }
    }

    pub fn take_diags(&mut self) -> Vec<Diag> {
        std::mem::take(&mut self.diags)
    }

    fn implicit_semi(&mut self, pos: usize) {
        self.last_can_insert_semi = false;
        self.pending = Some(Token {
            kind: TokKind::Semi,
            span: pos..pos,
        });
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        loop {
            if let Some(tok) = self.pending.take() {
                return Some(tok);
            }
            if self.eof_done {
                return None;
            }

            let Some(raw) = self.logos.next() else {
                self.eof_done = true;
                if self.last_can_insert_semi {
                    self.implicit_semi(self.logos.source().len());
                }
                continue;
            };
            let span = self.logos.span();

            let kind = match raw {
                Ok(kind) => kind,
                Err(kind) => {
                    self.diags.push(
                        LexError {
                            kind,
                            span: span.clone(),
                        }
                        .diag(),
                    );
                    self.last_can_insert_semi = false;
                    return Some(Token {
                        kind: TokKind::Error,
                        span,
                    });
                }
            };

            match kind {
                TokKind::Newline => {
                    if self.last_can_insert_semi {
                        self.implicit_semi(span.start);
                    }
                }
                TokKind::BlockComment => {
                    let text = self.logos.slice();
                    if self.last_can_insert_semi {
                        if let Some(off) = text.find('\n') {
                            self.implicit_semi(span.start + off);
                        }
                    }
                }
                TokKind::Bom if span.start == 0 => {}
                TokKind::Bom | TokKind::Error => {
                    self.diags.push(
                        LexError {
                            kind: LexErrorKind::InvalidToken,
                            span: span.clone(),
                        }
                        .diag(),
                    );
                    self.last_can_insert_semi = false;
                    if kind == TokKind::Error {
                        return Some(Token { kind, span });
                    }
                }
                kind => {
                    self.last_can_insert_semi = kind.can_insert_semicolon();
                    return Some(Token { kind, span });
                }
            }
        }
    }
}

/// Lex a whole file, returning the significant tokens and any diagnostics.
pub fn tokenize(src: &str) -> (Vec<Token>, Vec<Diag>) {
    let mut lexer = Lexer::new(src);
    let tokens: Vec<Token> = lexer.by_ref().collect();
    (tokens, lexer.take_diags())
}

/// Comments found in a run of trivia text (the gap between two tokens).
/// Returns each comment with its offset relative to the start of `gap`.
pub fn comments_in(gap: &str) -> Vec<(usize, &str)> {
    let mut out = Vec::new();
    let mut rest = gap;
    let mut base = 0;
    while let Some(start) = rest.find('/') {
        let tail = &rest[start..];
        let len = if tail.starts_with("//") {
            tail.find('\n').unwrap_or(tail.len())
        } else if tail.starts_with("/*") {
            tail.find("*/").map(|e| e + 2).unwrap_or(tail.len())
        } else {
            // A lone slash cannot appear in trivia; step over it.
            base += start + 1;
            rest = &rest[start + 1..];
            continue;
        };
        out.push((base + start, tail[..len].trim_end()));
        base += start + len;
        rest = &rest[start + len..];
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokKind> {
        tokenize(src).0.into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn inserts_semicolon_after_ident_at_newline() {
        assert_eq!(
            kinds("a\nb"),
            vec![TokKind::Ident, TokKind::Semi, TokKind::Ident, TokKind::Semi]
        );
    }

    #[test]
    fn no_semicolon_after_open_brace_or_comma() {
        assert_eq!(
            kinds("T{\n1,\n}"),
            vec![
                TokKind::Ident,
                TokKind::LBrace,
                TokKind::Number,
                TokKind::Comma,
                TokKind::RBrace,
                TokKind::Semi,
            ]
        );
    }

    #[test]
    fn line_comment_is_skipped_but_still_ends_line() {
        assert_eq!(
            kinds("x // trailing, with comma\ny"),
            vec![TokKind::Ident, TokKind::Semi, TokKind::Ident, TokKind::Semi]
        );
    }

    #[test]
    fn multiline_block_comment_inserts_semicolon() {
        let (toks, _) = tokenize("x /* a\nb */ y");
        assert_eq!(toks[1].kind, TokKind::Semi);
        assert_eq!(toks[1].span, 6..6);
    }

    #[test]
    fn operators_are_munched() {
        assert_eq!(
            kinds("a := <-ch"),
            vec![
                TokKind::Ident,
                TokKind::Define,
                TokKind::Arrow,
                TokKind::Ident,
                TokKind::Semi
            ]
        );
    }

    #[test]
    fn numbers_and_strings() {
        let src = "1e+5 0x1F .5 3i \"a\\\"b\" `raw\nstr` 'x'";
        let (toks, diags) = tokenize(src);
        assert!(diags.is_empty(), "{diags:?}");
        let texts: Vec<&str> = toks
            .iter()
            .filter(|t| !t.is_implicit_semi())
            .map(|t| t.text(src))
            .collect();
        assert_eq!(
            texts,
            vec!["1e+5", "0x1F", ".5", "3i", "\"a\\\"b\"", "`raw\nstr`", "'x'"]
        );
    }

    #[test]
    fn unterminated_comment_is_reported() {
        let (_, diags) = tokenize("x /* never closed");
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].message, "unterminated comment");
    }

    #[test]
    fn finds_comments_in_gap() {
        let gap = "  // one\n\t/* two */ ";
        let found = comments_in(gap);
        assert_eq!(found, vec![(2, "// one"), (10, "/* two */")]);
    }
}
