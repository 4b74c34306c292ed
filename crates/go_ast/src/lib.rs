mod ast;
mod error;
mod lexer;
mod line_index;
mod parser;

#[cfg(test)]
mod tests;

pub use ast::{
    default_package_name, ArrayLen, ChanDir, CompositeLit, ConstDecl, Element, FieldDecl,
    ImportSpec, Key, LiteralId, SourceFile, TypeDecl, TypeDeclId, TypeExpr,
};
pub use error::{Diag, DiagKind, LexError, LexErrorKind, Span};
pub use lexer::{comments_in, tokenize, TokKind, Token};
pub use line_index::LineIndex;
pub use parser::{parse, parse_int};

impl SourceFile {
    pub fn parse(text: impl Into<String>) -> Self {
        parser::parse(text)
    }

    /// Literals whose braces contain `offset`, innermost first.
    pub fn literals_at(&self, offset: usize) -> Vec<LiteralId> {
        let mut hits: Vec<LiteralId> = self
            .literals()
            .filter(|(_, lit)| lit.span().contains(&offset) || lit.rbrace == offset)
            .map(|(id, _)| id)
            .collect();
        hits.sort_by_key(|id| self[*id].span().len());
        hits
    }
}
