//! Terminal syntax highlighting for relic source, driven by the scanner.

use colored::Colorize;

use crate::lexer::token::{Token, TokenKind};
use crate::lexer::Scanner;

#[derive(Debug, Clone, Copy, Default)]
pub struct SyntaxHighlighter;

impl SyntaxHighlighter {
    pub fn new() -> Self {
        Self
    }

    /// Colorize `source`. Text the scanner skips (whitespace, comments) is
    /// copied through unchanged; source that does not scan is returned as is.
    pub fn highlight(&self, source: &str) -> String {
        match Scanner::new(source).scan_tokens() {
            Ok(tokens) => self.render_highlighted(source, &tokens),
            Err(_) => source.to_string(),
        }
    }

    fn render_highlighted(&self, source: &str, tokens: &[Token]) -> String {
        let mut result = String::new();
        let mut last_end = 0;

        for token in tokens {
            if token.kind == TokenKind::Eof {
                break;
            }

            let token_text = &source[token.span.start..token.span.end];
            result.push_str(&source[last_end..token.span.start]);
            result.push_str(&self.colorize_token(token, token_text));
            last_end = token.span.end;
        }

        result.push_str(&source[last_end..]);
        result
    }

    fn colorize_token(&self, token: &Token, text: &str) -> String {
        use TokenKind::*;

        match &token.kind {
            Int(_) | Double(_) => text.bright_blue().to_string(),
            String(_) => text.bright_green().to_string(),
            True | False => text.bright_magenta().to_string(),
            Nil => text.cyan().to_string(),

            If | Else | Is | Include | Var | Print => text.bright_yellow().bold().to_string(),

            Plus | Minus | Star | Slash | Bang | BangEqual | Equal | EqualEqual | Greater
            | GreaterEqual | Less | LessEqual | And | Or => text.red().to_string(),

            LeftParen | RightParen | LeftBrace | RightBrace | Comma | Dot | Semicolon => {
                text.white().bold().to_string()
            }

            Identifier(_) => text.white().to_string(),
            Eof => std::string::String::new(),
        }
    }
}
