//! Tokenizer for attribute expressions.
//!
//! Produces a flat token list with byte offsets into the source. Template
//! literals are split into text chunks and raw substitution sources; the
//! parser tokenizes each substitution on its own.

use std::fmt;

use crate::error::ExprError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Punct {
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Dot,
    QuestionDot,
    Semicolon,
    Colon,
    Question,
    Plus,
    Minus,
    Star,
    StarStar,
    Slash,
    Percent,
    PlusPlus,
    MinusMinus,
    Bang,
    Assign,
    PlusAssign,
    MinusAssign,
    StarAssign,
    SlashAssign,
    PercentAssign,
    StarStarAssign,
    NullishAssign,
    EqEq,
    NotEq,
    EqEqEq,
    NotEqEq,
    Lt,
    Le,
    Gt,
    Ge,
    AndAnd,
    OrOr,
    Nullish,
}

/// Punctuators, longest first so the scan is maximal munch.
const PUNCTUATORS: &[(&str, Punct)] = &[
    ("===", Punct::EqEqEq),
    ("!==", Punct::NotEqEq),
    ("**=", Punct::StarStarAssign),
    ("??=", Punct::NullishAssign),
    ("==", Punct::EqEq),
    ("!=", Punct::NotEq),
    ("<=", Punct::Le),
    (">=", Punct::Ge),
    ("&&", Punct::AndAnd),
    ("||", Punct::OrOr),
    ("??", Punct::Nullish),
    ("?.", Punct::QuestionDot),
    ("++", Punct::PlusPlus),
    ("--", Punct::MinusMinus),
    ("+=", Punct::PlusAssign),
    ("-=", Punct::MinusAssign),
    ("*=", Punct::StarAssign),
    ("/=", Punct::SlashAssign),
    ("%=", Punct::PercentAssign),
    ("**", Punct::StarStar),
    ("(", Punct::LParen),
    (")", Punct::RParen),
    ("[", Punct::LBracket),
    ("]", Punct::RBracket),
    ("{", Punct::LBrace),
    ("}", Punct::RBrace),
    (",", Punct::Comma),
    (".", Punct::Dot),
    (";", Punct::Semicolon),
    (":", Punct::Colon),
    ("?", Punct::Question),
    ("+", Punct::Plus),
    ("-", Punct::Minus),
    ("*", Punct::Star),
    ("/", Punct::Slash),
    ("%", Punct::Percent),
    ("!", Punct::Bang),
    ("=", Punct::Assign),
    ("<", Punct::Lt),
    (">", Punct::Gt),
];

impl Punct {
    pub fn as_str(self) -> &'static str {
        PUNCTUATORS
            .iter()
            .find(|(_, p)| *p == self)
            .map_or("?", |(text, _)| *text)
    }
}

/// A piece of a template literal as written.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateChunk {
    Text(String),
    /// The source between `${` and `}`, with its absolute offset.
    Source { text: String, offset: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Number(f64),
    String(String),
    Template(Vec<TemplateChunk>),
    Ident(String),
    Punct(Punct),
    Eof,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(n) => write!(f, "number {n}"),
            Token::String(s) => write!(f, "string {s:?}"),
            Token::Template(_) => f.write_str("template literal"),
            Token::Ident(name) => write!(f, "`{name}`"),
            Token::Punct(p) => write!(f, "`{}`", p.as_str()),
            Token::Eof => f.write_str("end of input"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub offset: usize,
}

/// Tokenize `src`. The result always ends with [`Token::Eof`].
pub fn tokenize(src: &str) -> Result<Vec<Spanned>, ExprError> {
    tokenize_at(src, 0)
}

/// Tokenize `src`, reporting offsets relative to `base`.
pub fn tokenize_at(src: &str, base: usize) -> Result<Vec<Spanned>, ExprError> {
    let mut lexer = Lexer { src, pos: 0, base };
    let mut tokens = Vec::new();
    loop {
        lexer.skip_whitespace();
        let offset = base + lexer.pos;
        let token = lexer.next_token()?;
        let done = token == Token::Eof;
        tokens.push(Spanned { token, offset });
        if done {
            return Ok(tokens);
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c == '_' || c == '$' || c.is_alphabetic()
}

fn is_ident_continue(c: char) -> bool {
    is_ident_start(c) || c.is_ascii_digit()
}

struct Lexer<'a> {
    src: &'a str,
    pos: usize,
    base: usize,
}

impl<'a> Lexer<'a> {
    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_at(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn error(&self, message: impl Into<String>) -> ExprError {
        ExprError::syntax(self.base + self.pos, message)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn next_token(&mut self) -> Result<Token, ExprError> {
        let Some(c) = self.peek() else {
            return Ok(Token::Eof);
        };

        if c.is_ascii_digit() || (c == '.' && self.peek_at(1).is_some_and(|d| d.is_ascii_digit())) {
            return self.number();
        }
        if is_ident_start(c) {
            let start = self.pos;
            while self.peek().is_some_and(is_ident_continue) {
                self.bump();
            }
            return Ok(Token::Ident(self.src[start..self.pos].to_string()));
        }
        match c {
            '"' | '\'' => return self.string(c),
            '`' => return self.template(),
            _ => {}
        }

        let rest = self.rest();
        for (text, punct) in PUNCTUATORS {
            if !rest.starts_with(text) {
                continue;
            }
            // `a?.5:b` is a conditional, not optional chaining.
            if *punct == Punct::QuestionDot && rest[2..].starts_with(|d: char| d.is_ascii_digit()) {
                continue;
            }
            self.pos += text.len();
            return Ok(Token::Punct(*punct));
        }

        Err(self.error(format!("unexpected character {c:?}")))
    }

    fn number(&mut self) -> Result<Token, ExprError> {
        let start = self.pos;
        let rest = self.rest();
        if rest.starts_with("0x") || rest.starts_with("0X") {
            self.pos += 2;
            let digits_start = self.pos;
            while self.peek().is_some_and(|c| c.is_ascii_hexdigit()) {
                self.bump();
            }
            let digits = &self.src[digits_start..self.pos];
            let value = u64::from_str_radix(digits, 16)
                .map_err(|_| self.error("malformed hexadecimal literal"))?;
            return self.finish_number(value as f64);
        }

        self.eat_digits();
        if self.peek() == Some('.') {
            self.bump();
            self.eat_digits();
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            let sign = usize::from(matches!(self.peek_at(1), Some('+' | '-')));
            if self.peek_at(1 + sign).is_some_and(|c| c.is_ascii_digit()) {
                self.bump();
                if sign == 1 {
                    self.bump();
                }
                self.eat_digits();
            }
        }
        let text = &self.src[start..self.pos];
        let value = text
            .parse::<f64>()
            .map_err(|_| ExprError::syntax(self.base + start, "malformed number"))?;
        self.finish_number(value)
    }

    fn eat_digits(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
        }
    }

    fn finish_number(&mut self, value: f64) -> Result<Token, ExprError> {
        if self.peek().is_some_and(is_ident_start) {
            return Err(self.error("identifier starts immediately after numeric literal"));
        }
        Ok(Token::Number(value))
    }

    fn string(&mut self, quote: char) -> Result<Token, ExprError> {
        self.bump();
        let mut out = String::new();
        loop {
            match self.bump() {
                None | Some('\n') => return Err(self.error("unterminated string literal")),
                Some(c) if c == quote => return Ok(Token::String(out)),
                Some('\\') => self.escape(&mut out)?,
                Some(c) => out.push(c),
            }
        }
    }

    fn escape(&mut self, out: &mut String) -> Result<(), ExprError> {
        let Some(c) = self.bump() else {
            return Err(self.error("unterminated escape sequence"));
        };
        match c {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'b' => out.push('\u{8}'),
            'f' => out.push('\u{c}'),
            'v' => out.push('\u{b}'),
            '0' => out.push('\0'),
            '\n' => {}
            'x' => {
                let code = self.hex_digits(2)?;
                out.push(char::from_u32(code).ok_or_else(|| self.error("invalid escape"))?);
            }
            'u' => {
                let code = if self.peek() == Some('{') {
                    self.bump();
                    let start = self.pos;
                    while self.peek().is_some_and(|c| c.is_ascii_hexdigit()) {
                        self.bump();
                    }
                    let digits = &self.src[start..self.pos];
                    if self.bump() != Some('}') {
                        return Err(self.error("malformed unicode escape"));
                    }
                    u32::from_str_radix(digits, 16).map_err(|_| self.error("malformed unicode escape"))?
                } else {
                    self.hex_digits(4)?
                };
                out.push(char::from_u32(code).ok_or_else(|| self.error("invalid unicode escape"))?);
            }
            other => out.push(other),
        }
        Ok(())
    }

    fn hex_digits(&mut self, count: usize) -> Result<u32, ExprError> {
        let start = self.pos;
        for _ in 0..count {
            if !self.peek().is_some_and(|c| c.is_ascii_hexdigit()) {
                return Err(self.error("malformed escape sequence"));
            }
            self.bump();
        }
        u32::from_str_radix(&self.src[start..self.pos], 16)
            .map_err(|_| self.error("malformed escape sequence"))
    }

    fn template(&mut self) -> Result<Token, ExprError> {
        self.bump();
        let mut chunks = Vec::new();
        let mut text = String::new();
        loop {
            match self.peek() {
                None => return Err(self.error("unterminated template literal")),
                Some('`') => {
                    self.bump();
                    break;
                }
                Some('\\') => {
                    self.bump();
                    self.escape(&mut text)?;
                }
                Some('$') if self.peek_at(1) == Some('{') => {
                    self.pos += 2;
                    let start = self.pos;
                    let end = self.substitution_end(start)?;
                    if !text.is_empty() {
                        chunks.push(TemplateChunk::Text(std::mem::take(&mut text)));
                    }
                    chunks.push(TemplateChunk::Source {
                        text: self.src[start..end].to_string(),
                        offset: self.base + start,
                    });
                    self.pos = end + 1;
                }
                Some(c) => {
                    text.push(c);
                    self.bump();
                }
            }
        }
        if !text.is_empty() {
            chunks.push(TemplateChunk::Text(text));
        }
        Ok(Token::Template(chunks))
    }

    /// Byte index of the `}` closing a substitution that starts at `start`.
    fn substitution_end(&self, start: usize) -> Result<usize, ExprError> {
        let bytes = self.src.as_bytes();
        let mut depth = 0usize;
        let mut i = start;
        while i < bytes.len() {
            match bytes[i] {
                b'{' => depth += 1,
                b'}' if depth == 0 => return Ok(i),
                b'}' => depth -= 1,
                quote @ (b'"' | b'\'') => i = self.skip_quoted(i, quote)?,
                b'`' => i = self.skip_template(i)?,
                _ => {}
            }
            i += 1;
        }
        Err(ExprError::syntax(self.base + start, "unterminated template substitution"))
    }

    /// Index of the closing quote of the string opened at `open`.
    fn skip_quoted(&self, open: usize, quote: u8) -> Result<usize, ExprError> {
        let bytes = self.src.as_bytes();
        let mut i = open + 1;
        while i < bytes.len() {
            match bytes[i] {
                b'\\' => i += 1,
                b if b == quote => return Ok(i),
                _ => {}
            }
            i += 1;
        }
        Err(ExprError::syntax(self.base + open, "unterminated string literal"))
    }

    /// Index of the closing backtick of the template opened at `open`.
    fn skip_template(&self, open: usize) -> Result<usize, ExprError> {
        let bytes = self.src.as_bytes();
        let mut i = open + 1;
        while i < bytes.len() {
            match bytes[i] {
                b'\\' => i += 1,
                b'`' => return Ok(i),
                b'$' if bytes.get(i + 1) == Some(&b'{') => {
                    i = self.substitution_end(i + 2)?;
                }
                _ => {}
            }
            i += 1;
        }
        Err(ExprError::syntax(self.base + open, "unterminated template literal"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(src: &str) -> Vec<Token> {
        tokenize(src)
            .unwrap()
            .into_iter()
            .map(|spanned| spanned.token)
            .collect()
    }

    #[test]
    fn lexes_operators_with_maximal_munch() {
        assert_eq!(
            tokens("a === b ?? c**=2"),
            vec![
                Token::Ident("a".into()),
                Token::Punct(Punct::EqEqEq),
                Token::Ident("b".into()),
                Token::Punct(Punct::Nullish),
                Token::Ident("c".into()),
                Token::Punct(Punct::StarStarAssign),
                Token::Number(2.0),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn question_dot_before_digit_is_conditional() {
        assert_eq!(
            tokens("a?.5:1"),
            vec![
                Token::Ident("a".into()),
                Token::Punct(Punct::Question),
                Token::Number(0.5),
                Token::Punct(Punct::Colon),
                Token::Number(1.0),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn lexes_numbers() {
        assert_eq!(tokens("1.5e3")[0], Token::Number(1500.0));
        assert_eq!(tokens("0xff")[0], Token::Number(255.0));
        assert_eq!(tokens(".25")[0], Token::Number(0.25));
        assert!(tokenize("3px").is_err());
    }

    #[test]
    fn lexes_strings_with_escapes() {
        assert_eq!(tokens(r#"'it\'s'"#)[0], Token::String("it's".into()));
        assert_eq!(tokens(r#""a\nbA""#)[0], Token::String("a\nbA".into()));
        assert!(matches!(
            tokenize("'open"),
            Err(ExprError::Syntax { .. })
        ));
    }

    #[test]
    fn splits_template_literals() {
        let toks = tokens("`Count: ${count + 1}!`");
        assert_eq!(
            toks[0],
            Token::Template(vec![
                TemplateChunk::Text("Count: ".into()),
                TemplateChunk::Source {
                    text: "count + 1".into(),
                    offset: 10,
                },
                TemplateChunk::Text("!".into()),
            ])
        );
    }

    #[test]
    fn template_substitution_may_contain_braces_and_strings() {
        let toks = tokens("`${ {a: '}'}.a }`");
        let Token::Template(chunks) = &toks[0] else {
            panic!("expected template, got {:?}", toks[0]);
        };
        assert_eq!(
            chunks,
            &vec![TemplateChunk::Source {
                text: " {a: '}'}.a ".into(),
                offset: 3,
            }]
        );
    }

    #[test]
    fn records_offsets() {
        let spanned = tokenize("  count++").unwrap();
        assert_eq!(spanned[0].offset, 2);
        assert_eq!(spanned[1].offset, 7);
        assert_eq!(spanned[2].token, Token::Eof);
    }

    #[test]
    fn rejects_unknown_characters() {
        let err = tokenize("a # b").unwrap_err();
        assert_eq!(
            err,
            ExprError::Syntax {
                offset: 2,
                message: "unexpected character '#'".into(),
            }
        );
    }
}
