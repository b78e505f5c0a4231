//! Recursive-descent parser.
//!
//! Binary operators are handled by precedence climbing; everything else is
//! one function per grammar level. Nesting depth is capped so hostile
//! attribute text cannot exhaust the stack.

use super::ast::{
    AssignOp, BinaryOp, Expr, Literal, LogicalOp, Program, Property, Stmt, TemplatePart, UnaryOp,
    UpdateOp,
};
use super::lexer::{tokenize_at, Punct, Spanned, TemplateChunk, Token};
use crate::error::ExprError;

/// Maximum nesting of sub-expressions and statements.
pub const MAX_DEPTH: usize = 128;

/// Words that belong to the full language but not to this subset.
const UNSUPPORTED_WORDS: &[&str] = &[
    "function", "new", "this", "return", "for", "while", "do", "class", "delete", "void", "in",
    "instanceof", "switch", "try", "throw", "yield", "await", "import", "export",
];

/// Parse `src` as exactly one expression.
pub fn parse_expression(src: &str) -> Result<Expr, ExprError> {
    let mut parser = Parser::new(src, 0, 0)?;
    let expr = parser.expression()?;
    parser.expect_end()?;
    Ok(expr)
}

/// Parse `src` as a statement sequence.
pub fn parse_program(src: &str) -> Result<Program, ExprError> {
    let mut parser = Parser::new(src, 0, 0)?;
    let mut body = Vec::new();
    while parser.peek() != &Token::Eof {
        body.push(parser.statement()?);
    }
    Ok(Program { body })
}

#[derive(Clone, Copy)]
enum BinaryKind {
    Binary(BinaryOp),
    Logical(LogicalOp),
}

/// Binding power of a binary operator token; higher binds tighter.
fn binary_operator(token: &Token) -> Option<(u8, BinaryKind)> {
    let Token::Punct(punct) = token else {
        return None;
    };
    let entry = match punct {
        Punct::Nullish => (1, BinaryKind::Logical(LogicalOp::Nullish)),
        Punct::OrOr => (2, BinaryKind::Logical(LogicalOp::Or)),
        Punct::AndAnd => (3, BinaryKind::Logical(LogicalOp::And)),
        Punct::EqEq => (4, BinaryKind::Binary(BinaryOp::Eq)),
        Punct::NotEq => (4, BinaryKind::Binary(BinaryOp::Ne)),
        Punct::EqEqEq => (4, BinaryKind::Binary(BinaryOp::StrictEq)),
        Punct::NotEqEq => (4, BinaryKind::Binary(BinaryOp::StrictNe)),
        Punct::Lt => (5, BinaryKind::Binary(BinaryOp::Lt)),
        Punct::Le => (5, BinaryKind::Binary(BinaryOp::Le)),
        Punct::Gt => (5, BinaryKind::Binary(BinaryOp::Gt)),
        Punct::Ge => (5, BinaryKind::Binary(BinaryOp::Ge)),
        Punct::Plus => (6, BinaryKind::Binary(BinaryOp::Add)),
        Punct::Minus => (6, BinaryKind::Binary(BinaryOp::Sub)),
        Punct::Star => (7, BinaryKind::Binary(BinaryOp::Mul)),
        Punct::Slash => (7, BinaryKind::Binary(BinaryOp::Div)),
        Punct::Percent => (7, BinaryKind::Binary(BinaryOp::Mod)),
        Punct::StarStar => (8, BinaryKind::Binary(BinaryOp::Pow)),
        _ => return None,
    };
    Some(entry)
}

fn assign_operator(token: &Token) -> Option<AssignOp> {
    let Token::Punct(punct) = token else {
        return None;
    };
    let op = match punct {
        Punct::Assign => AssignOp::Assign,
        Punct::PlusAssign => AssignOp::Compound(BinaryOp::Add),
        Punct::MinusAssign => AssignOp::Compound(BinaryOp::Sub),
        Punct::StarAssign => AssignOp::Compound(BinaryOp::Mul),
        Punct::SlashAssign => AssignOp::Compound(BinaryOp::Div),
        Punct::PercentAssign => AssignOp::Compound(BinaryOp::Mod),
        Punct::StarStarAssign => AssignOp::Compound(BinaryOp::Pow),
        Punct::NullishAssign => AssignOp::Nullish,
        _ => return None,
    };
    Some(op)
}

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn new(src: &str, base: usize, depth: usize) -> Result<Self, ExprError> {
        Ok(Self {
            tokens: tokenize_at(src, base)?,
            pos: 0,
            depth,
        })
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)].token
    }

    fn peek_next(&self) -> &Token {
        &self.tokens[(self.pos + 1).min(self.tokens.len() - 1)].token
    }

    fn offset(&self) -> usize {
        self.tokens[self.pos.min(self.tokens.len() - 1)].offset
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn at(&self, punct: Punct) -> bool {
        self.peek() == &Token::Punct(punct)
    }

    fn at_word(&self, word: &str) -> bool {
        matches!(self.peek(), Token::Ident(name) if name == word)
    }

    fn eat(&mut self, punct: Punct) -> bool {
        if self.at(punct) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, punct: Punct) -> Result<(), ExprError> {
        if self.eat(punct) {
            Ok(())
        } else {
            Err(self.unexpected(&format!("`{}`", punct.as_str())))
        }
    }

    fn expect_end(&self) -> Result<(), ExprError> {
        match self.peek() {
            Token::Eof => Ok(()),
            _ => Err(self.unexpected("end of expression")),
        }
    }

    fn unexpected(&self, expected: &str) -> ExprError {
        ExprError::syntax(self.offset(), format!("expected {expected}, found {}", self.peek()))
    }

    fn enter(&mut self) -> Result<(), ExprError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(ExprError::TooDeep(MAX_DEPTH));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    // ------------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------------

    fn statement(&mut self) -> Result<Stmt, ExprError> {
        self.enter()?;
        let stmt = self.statement_inner();
        self.leave();
        stmt
    }

    fn statement_inner(&mut self) -> Result<Stmt, ExprError> {
        if self.eat(Punct::Semicolon) {
            return Ok(Stmt::Empty);
        }
        if self.at(Punct::LBrace) {
            return self.block();
        }
        let declares = self.at_word("let") || self.at_word("const") || self.at_word("var");
        if declares && matches!(self.peek_next(), Token::Ident(_)) {
            self.advance();
            let Token::Ident(name) = self.advance() else {
                return Err(self.unexpected("a name"));
            };
            let init = if self.eat(Punct::Assign) {
                Some(self.expression()?)
            } else {
                None
            };
            self.terminator()?;
            return Ok(Stmt::Let { name, init });
        }
        if self.at_word("if") {
            self.advance();
            self.expect(Punct::LParen)?;
            let test = self.expression()?;
            self.expect(Punct::RParen)?;
            let consequent = Box::new(self.statement()?);
            let alternate = if self.at_word("else") {
                self.advance();
                Some(Box::new(self.statement()?))
            } else {
                None
            };
            return Ok(Stmt::If {
                test,
                consequent,
                alternate,
            });
        }

        let expr = self.expression()?;
        self.terminator()?;
        Ok(Stmt::Expr(expr))
    }

    fn block(&mut self) -> Result<Stmt, ExprError> {
        self.expect(Punct::LBrace)?;
        let mut body = Vec::new();
        while !self.eat(Punct::RBrace) {
            if self.peek() == &Token::Eof {
                return Err(self.unexpected("`}`"));
            }
            body.push(self.statement()?);
        }
        Ok(Stmt::Block(body))
    }

    /// A statement ends at `;`, a closing brace or the end of input.
    fn terminator(&mut self) -> Result<(), ExprError> {
        if self.eat(Punct::Semicolon) || self.at(Punct::RBrace) || self.peek() == &Token::Eof {
            Ok(())
        } else {
            Err(self.unexpected("`;`"))
        }
    }

    // ------------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------------

    fn expression(&mut self) -> Result<Expr, ExprError> {
        self.enter()?;
        let expr = self.assignment();
        self.leave();
        expr
    }

    fn assignment(&mut self) -> Result<Expr, ExprError> {
        let start = self.offset();
        let target = self.conditional()?;
        let Some(op) = assign_operator(self.peek()) else {
            return Ok(target);
        };
        if !target.is_assignable() {
            return Err(ExprError::syntax(start, "invalid assignment target"));
        }
        self.advance();
        let value = self.expression()?;
        Ok(Expr::Assign {
            op,
            target: Box::new(target),
            value: Box::new(value),
        })
    }

    fn conditional(&mut self) -> Result<Expr, ExprError> {
        let test = self.binary(0)?;
        if !self.eat(Punct::Question) {
            return Ok(test);
        }
        let consequent = self.expression()?;
        self.expect(Punct::Colon)?;
        let alternate = self.expression()?;
        Ok(Expr::Conditional {
            test: Box::new(test),
            consequent: Box::new(consequent),
            alternate: Box::new(alternate),
        })
    }

    fn binary(&mut self, min_power: u8) -> Result<Expr, ExprError> {
        let mut left = self.unary()?;
        // Each folded operator nests `left` one level deeper.
        let mut folded = 0;
        while let Some((power, kind)) = binary_operator(self.peek()) {
            if power < min_power {
                break;
            }
            self.advance();
            self.enter()?;
            folded += 1;
            // `**` is right-associative; everything else associates left.
            let right = match kind {
                BinaryKind::Binary(BinaryOp::Pow) => self.binary(power),
                _ => self.binary(power + 1),
            };
            let right = Box::new(right?);
            let left_box = Box::new(left);
            left = match kind {
                BinaryKind::Binary(op) => Expr::Binary {
                    op,
                    left: left_box,
                    right,
                },
                BinaryKind::Logical(op) => Expr::Logical {
                    op,
                    left: left_box,
                    right,
                },
            };
        }
        self.depth -= folded;
        Ok(left)
    }

    fn unary(&mut self) -> Result<Expr, ExprError> {
        self.enter()?;
        let expr = self.unary_inner();
        self.leave();
        expr
    }

    fn unary_inner(&mut self) -> Result<Expr, ExprError> {
        let op = match self.peek() {
            Token::Punct(Punct::Bang) => Some(UnaryOp::Not),
            Token::Punct(Punct::Minus) => Some(UnaryOp::Neg),
            Token::Punct(Punct::Plus) => Some(UnaryOp::Plus),
            Token::Ident(word) if word == "typeof" => Some(UnaryOp::TypeOf),
            _ => None,
        };
        if let Some(op) = op {
            self.advance();
            let operand = self.unary()?;
            return Ok(Expr::Unary {
                op,
                operand: Box::new(operand),
            });
        }

        let update = match self.peek() {
            Token::Punct(Punct::PlusPlus) => Some(UpdateOp::Increment),
            Token::Punct(Punct::MinusMinus) => Some(UpdateOp::Decrement),
            _ => None,
        };
        if let Some(op) = update {
            self.advance();
            let start = self.offset();
            let target = self.unary()?;
            if !target.is_assignable() {
                return Err(ExprError::syntax(start, "invalid update target"));
            }
            return Ok(Expr::Update {
                op,
                prefix: true,
                target: Box::new(target),
            });
        }

        self.postfix()
    }

    fn postfix(&mut self) -> Result<Expr, ExprError> {
        let start = self.offset();
        let expr = self.call_member()?;
        let op = match self.peek() {
            Token::Punct(Punct::PlusPlus) => UpdateOp::Increment,
            Token::Punct(Punct::MinusMinus) => UpdateOp::Decrement,
            _ => return Ok(expr),
        };
        if !expr.is_assignable() {
            return Err(ExprError::syntax(start, "invalid update target"));
        }
        self.advance();
        Ok(Expr::Update {
            op,
            prefix: false,
            target: Box::new(expr),
        })
    }

    fn call_member(&mut self) -> Result<Expr, ExprError> {
        let mut expr = self.primary()?;
        let mut links = 0;
        loop {
            if matches!(
                self.peek(),
                Token::Punct(Punct::Dot | Punct::QuestionDot | Punct::LBracket | Punct::LParen)
            ) {
                self.enter()?;
                links += 1;
            }
            if self.eat(Punct::Dot) {
                let name = self.property_name()?;
                expr = member(expr, Property::Named(name), false);
            } else if self.eat(Punct::QuestionDot) {
                if self.eat(Punct::LParen) {
                    let args = self.arguments()?;
                    expr = call(expr, args, true);
                } else if self.eat(Punct::LBracket) {
                    let key = self.expression()?;
                    self.expect(Punct::RBracket)?;
                    expr = member(expr, Property::Computed(Box::new(key)), true);
                } else {
                    let name = self.property_name()?;
                    expr = member(expr, Property::Named(name), true);
                }
            } else if self.eat(Punct::LBracket) {
                let key = self.expression()?;
                self.expect(Punct::RBracket)?;
                expr = member(expr, Property::Computed(Box::new(key)), false);
            } else if self.eat(Punct::LParen) {
                let args = self.arguments()?;
                expr = call(expr, args, false);
            } else {
                self.depth -= links;
                return Ok(expr);
            }
        }
    }

    fn property_name(&mut self) -> Result<String, ExprError> {
        match self.peek() {
            Token::Ident(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            _ => Err(self.unexpected("a property name")),
        }
    }

    /// Arguments after an opening `(`, through the closing `)`.
    fn arguments(&mut self) -> Result<Vec<Expr>, ExprError> {
        let mut args = Vec::new();
        while !self.eat(Punct::RParen) {
            args.push(self.expression()?);
            if !self.eat(Punct::Comma) {
                self.expect(Punct::RParen)?;
                break;
            }
        }
        Ok(args)
    }

    fn primary(&mut self) -> Result<Expr, ExprError> {
        let offset = self.offset();
        let checkpoint = self.pos;
        match self.advance() {
            Token::Number(n) => Ok(Expr::Literal(Literal::Number(n))),
            Token::String(s) => Ok(Expr::Literal(Literal::String(s))),
            Token::Template(chunks) => self.template(chunks),
            Token::Ident(word) => word_expression(word, offset),
            Token::Punct(Punct::LParen) => {
                let expr = self.expression()?;
                self.expect(Punct::RParen)?;
                Ok(expr)
            }
            Token::Punct(Punct::LBracket) => {
                let mut items = Vec::new();
                while !self.eat(Punct::RBracket) {
                    items.push(self.expression()?);
                    if !self.eat(Punct::Comma) {
                        self.expect(Punct::RBracket)?;
                        break;
                    }
                }
                Ok(Expr::Array(items))
            }
            Token::Punct(Punct::LBrace) => self.object(),
            _ => {
                self.pos = checkpoint;
                Err(self.unexpected("an expression"))
            }
        }
    }

    /// Object literal body after the opening `{`.
    fn object(&mut self) -> Result<Expr, ExprError> {
        let mut entries = Vec::new();
        while !self.eat(Punct::RBrace) {
            let offset = self.offset();
            let key = match self.advance() {
                Token::Ident(name) => {
                    if self.at(Punct::Comma) || self.at(Punct::RBrace) {
                        entries.push((name.clone(), Expr::Ident(name)));
                        if !self.eat(Punct::Comma) {
                            self.expect(Punct::RBrace)?;
                            break;
                        }
                        continue;
                    }
                    name
                }
                Token::String(s) => s,
                Token::Number(n) => crate::value::format_number(n),
                _ => return Err(ExprError::syntax(offset, "expected a property key")),
            };
            self.expect(Punct::Colon)?;
            let value = self.expression()?;
            entries.push((key, value));
            if !self.eat(Punct::Comma) {
                self.expect(Punct::RBrace)?;
                break;
            }
        }
        Ok(Expr::Object(entries))
    }

    fn template(&mut self, chunks: Vec<TemplateChunk>) -> Result<Expr, ExprError> {
        let mut parts = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            match chunk {
                TemplateChunk::Text(text) => parts.push(TemplatePart::Text(text)),
                TemplateChunk::Source { text, offset } => {
                    let mut inner = Parser::new(&text, offset, self.depth)?;
                    let expr = inner.expression()?;
                    inner.expect_end()?;
                    parts.push(TemplatePart::Expr(expr));
                }
            }
        }
        Ok(Expr::Template(parts))
    }
}

/// A bare word in expression position: keyword literal or identifier.
fn word_expression(word: String, offset: usize) -> Result<Expr, ExprError> {
    let literal = match word.as_str() {
        "true" => Some(Literal::Bool(true)),
        "false" => Some(Literal::Bool(false)),
        "null" => Some(Literal::Null),
        "undefined" => Some(Literal::Undefined),
        _ => None,
    };
    if let Some(literal) = literal {
        return Ok(Expr::Literal(literal));
    }
    if UNSUPPORTED_WORDS.contains(&word.as_str()) {
        return Err(ExprError::syntax(
            offset,
            format!("`{word}` is not supported in attribute expressions"),
        ));
    }
    Ok(Expr::Ident(word))
}

fn member(object: Expr, property: Property, optional: bool) -> Expr {
    Expr::Member {
        object: Box::new(object),
        property,
        optional,
    }
}

fn call(callee: Expr, args: Vec<Expr>, optional: bool) -> Expr {
    Expr::Call {
        callee: Box::new(callee),
        args,
        optional,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(name: &str) -> Box<Expr> {
        Box::new(Expr::Ident(name.to_string()))
    }

    fn num(n: f64) -> Box<Expr> {
        Box::new(Expr::Literal(Literal::Number(n)))
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        assert_eq!(
            parse_expression("a + b * 2").unwrap(),
            Expr::Binary {
                op: BinaryOp::Add,
                left: ident("a"),
                right: Box::new(Expr::Binary {
                    op: BinaryOp::Mul,
                    left: ident("b"),
                    right: num(2.0),
                }),
            }
        );
    }

    #[test]
    fn subtraction_is_left_associative() {
        assert_eq!(
            parse_expression("a - b - c").unwrap(),
            Expr::Binary {
                op: BinaryOp::Sub,
                left: Box::new(Expr::Binary {
                    op: BinaryOp::Sub,
                    left: ident("a"),
                    right: ident("b"),
                }),
                right: ident("c"),
            }
        );
    }

    #[test]
    fn exponent_is_right_associative() {
        assert_eq!(
            parse_expression("2 ** 3 ** 2").unwrap(),
            Expr::Binary {
                op: BinaryOp::Pow,
                left: num(2.0),
                right: Box::new(Expr::Binary {
                    op: BinaryOp::Pow,
                    left: num(3.0),
                    right: num(2.0),
                }),
            }
        );
    }

    #[test]
    fn parses_assignment_as_expression() {
        assert_eq!(
            parse_expression("count = count + 1").unwrap(),
            Expr::Assign {
                op: AssignOp::Assign,
                target: ident("count"),
                value: Box::new(Expr::Binary {
                    op: BinaryOp::Add,
                    left: ident("count"),
                    right: num(1.0),
                }),
            }
        );
    }

    #[test]
    fn parses_member_calls_and_optional_chains() {
        let expr = parse_expression("user?.name.toUpperCase()").unwrap();
        let Expr::Call { callee, args, optional } = expr else {
            panic!("expected call");
        };
        assert!(args.is_empty());
        assert!(!optional);
        let Expr::Member { object, property, optional } = *callee else {
            panic!("expected member");
        };
        assert_eq!(property, Property::Named("toUpperCase".into()));
        assert!(!optional);
        assert!(matches!(*object, Expr::Member { optional: true, .. }));
    }

    #[test]
    fn parses_update_operators() {
        assert_eq!(
            parse_expression("count++").unwrap(),
            Expr::Update {
                op: UpdateOp::Increment,
                prefix: false,
                target: ident("count"),
            }
        );
        assert_eq!(
            parse_expression("--count").unwrap(),
            Expr::Update {
                op: UpdateOp::Decrement,
                prefix: true,
                target: ident("count"),
            }
        );
    }

    #[test]
    fn parses_literals() {
        assert_eq!(
            parse_expression("[1, 'a', {x, y: null},]").unwrap(),
            Expr::Array(vec![
                Expr::Literal(Literal::Number(1.0)),
                Expr::Literal(Literal::String("a".into())),
                Expr::Object(vec![
                    ("x".into(), Expr::Ident("x".into())),
                    ("y".into(), Expr::Literal(Literal::Null)),
                ]),
            ])
        );
    }

    #[test]
    fn parses_template_substitutions() {
        assert_eq!(
            parse_expression("`n=${n}`").unwrap(),
            Expr::Template(vec![
                TemplatePart::Text("n=".into()),
                TemplatePart::Expr(Expr::Ident("n".into())),
            ])
        );
    }

    #[test]
    fn template_errors_report_absolute_offsets() {
        let err = parse_expression("`${a +}`").unwrap_err();
        assert!(matches!(err, ExprError::Syntax { offset: 6, .. }), "{err:?}");
    }

    #[test]
    fn rejects_invalid_assignment_targets() {
        assert!(matches!(
            parse_expression("a + 1 = 2"),
            Err(ExprError::Syntax { .. })
        ));
        assert!(matches!(
            parse_expression("f()++"),
            Err(ExprError::Syntax { .. })
        ));
    }

    #[test]
    fn expression_rejects_trailing_statements() {
        let err = parse_expression("a; b").unwrap_err();
        assert_eq!(
            err,
            ExprError::Syntax {
                offset: 1,
                message: "expected end of expression, found `;`".into(),
            }
        );
    }

    #[test]
    fn rejects_unsupported_words() {
        let err = parse_expression("new Thing()").unwrap_err();
        assert!(err.to_string().contains("`new` is not supported"));
    }

    #[test]
    fn parses_statement_sequences() {
        let program = parse_program("let next = count + 1; count = next;").unwrap();
        assert_eq!(program.len(), 2);
        assert!(matches!(&program.body[0], Stmt::Let { name, init: Some(_) } if name == "next"));
        assert!(matches!(&program.body[1], Stmt::Expr(Expr::Assign { .. })));
    }

    #[test]
    fn parses_if_else_with_blocks() {
        let program = parse_program("if (count > 0) { count--; } else count = 10").unwrap();
        let [Stmt::If { consequent, alternate, .. }] = program.body.as_slice() else {
            panic!("expected a single if statement");
        };
        assert!(matches!(**consequent, Stmt::Block(ref body) if body.len() == 1));
        assert!(alternate.is_some());
    }

    #[test]
    fn empty_program_is_allowed() {
        assert!(parse_program("").unwrap().is_empty());
        assert!(parse_program("   ").unwrap().is_empty());
    }

    #[test]
    fn empty_expression_is_an_error() {
        let err = parse_expression("").unwrap_err();
        assert!(err.to_string().contains("expected an expression"));
    }

    #[test]
    fn statements_need_separators() {
        assert!(parse_program("a = 1 b = 2").is_err());
        assert_eq!(parse_program("a = 1; b = 2").unwrap().len(), 2);
    }

    #[test]
    fn nesting_is_capped() {
        let deep = format!("{}1{}", "(".repeat(MAX_DEPTH * 2), ")".repeat(MAX_DEPTH * 2));
        assert_eq!(parse_expression(&deep), Err(ExprError::TooDeep(MAX_DEPTH)));

        let shallow = format!("{}1{}", "(".repeat(10), ")".repeat(10));
        assert!(parse_expression(&shallow).is_ok());
    }

    #[test]
    fn long_operator_chains_are_capped() {
        let sum = vec!["1"; 10_000].join("+");
        assert_eq!(parse_expression(&sum), Err(ExprError::TooDeep(MAX_DEPTH)));

        let conjunction = vec!["a"; 10_000].join(" && ");
        assert_eq!(parse_expression(&conjunction), Err(ExprError::TooDeep(MAX_DEPTH)));
    }

    #[test]
    fn long_member_and_call_chains_are_capped() {
        let members = format!("o{}", ".x".repeat(10_000));
        assert_eq!(parse_expression(&members), Err(ExprError::TooDeep(MAX_DEPTH)));

        let calls = format!("f{}", "()".repeat(10_000));
        assert_eq!(parse_expression(&calls), Err(ExprError::TooDeep(MAX_DEPTH)));

        let indexes = format!("o{}", "[0]".repeat(10_000));
        assert_eq!(parse_expression(&indexes), Err(ExprError::TooDeep(MAX_DEPTH)));
    }

    #[test]
    fn chains_within_the_cap_still_parse() {
        let sum = vec!["1"; 50].join("+");
        assert!(parse_expression(&sum).is_ok());
        let members = format!("o{}", ".x".repeat(50));
        assert!(parse_expression(&members).is_ok());

        // Depth is released after each chain, so siblings do not add up.
        let siblings = vec![format!("o{}", ".x".repeat(50)); 20].join(", ");
        assert!(parse_expression(&format!("[{siblings}]")).is_ok());
        let terms = vec![format!("o{}", ".x".repeat(50)); 20].join(" + ");
        assert!(parse_expression(&terms).is_ok());
    }
}
