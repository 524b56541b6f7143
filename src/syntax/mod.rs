pub mod consteval;
pub mod lexeme;
pub mod lexer;
pub mod parser;
pub mod source;
pub mod span;

use crate::ast::TranslationUnit;
use crate::diagnostic::Diagnostic;
use lexer::Lexer;
use parser::Parser;
use source::SourceFile;

/// Lex and parse one input file. Any lexical or syntax error in a region
/// the frontend models fails the whole parse.
pub fn parse_source(source: &SourceFile) -> Result<TranslationUnit, Vec<Diagnostic>> {
    let (tokens, lex_errors) = Lexer::new(&source.text).tokenize();
    if !lex_errors.is_empty() {
        return Err(lex_errors);
    }
    let unit = Parser::new(tokens).parse_translation_unit()?;
    tracing::debug!(file = %source.name, items = unit.items.len(), "parsed translation unit");
    Ok(unit)
}
