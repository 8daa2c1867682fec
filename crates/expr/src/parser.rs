//! Recursive-descent parser.
//!
//! Precedence, loosest first: `||`/`or`, `&&`/`and`, comparisons,
//! `+ -`, `* / %`, unary `- ! not`, `^` (right associative).
//!
//! Parenthesis and prefix-operator nesting is capped at [`MAX_NESTING`]
//! and the operator count at [`MAX_OPERATORS`], which also bounds the
//! height of the tree the interpreter walks.

use std::str::FromStr;

use rust_decimal::Decimal;

use crate::ast::{BinaryOp, Expr, Function, UnaryOp};
use crate::error::ExprError;
use crate::lexer::{lex, Spanned, Token};

pub const MAX_NESTING: usize = 256;
pub const MAX_OPERATORS: usize = 512;

pub fn parse(src: &str) -> Result<Expr, ExprError> {
    let tokens = lex(src)?;
    let mut parser = Parser::new(&tokens);
    let expr = parser.parse_expr()?;
    if parser.peek() != &Token::Eof {
        return Err(parser.err(format!("unexpected {:?} after expression", parser.peek())));
    }
    Ok(expr)
}

struct Parser<'a> {
    tokens: &'a [Spanned],
    pos: usize,
    depth: usize,
    operators: usize,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Spanned]) -> Self {
        Parser {
            tokens,
            pos: 0,
            depth: 0,
            operators: 0,
        }
    }

    fn cur(&self) -> &Spanned {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek(&self) -> &Token {
        &self.cur().token
    }

    fn advance(&mut self) {
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
    }

    fn err(&self, msg: impl Into<String>) -> ExprError {
        ExprError::parse(self.cur().pos, msg)
    }

    fn is_keyword(&self, kw: &str) -> bool {
        matches!(self.peek(), Token::Word(w) if w.eq_ignore_ascii_case(kw))
    }

    fn expect_rparen(&mut self) -> Result<(), ExprError> {
        if self.peek() == &Token::RParen {
            self.advance();
            Ok(())
        } else {
            Err(self.err(format!("expected ')', got {:?}", self.peek())))
        }
    }

    fn enter(&mut self) -> Result<(), ExprError> {
        if self.depth >= MAX_NESTING {
            return Err(self.err("expression nested too deeply"));
        }
        self.depth += 1;
        Ok(())
    }

    /// Counts one operator or call node about to be built.
    fn operator(&mut self) -> Result<(), ExprError> {
        if self.operators >= MAX_OPERATORS {
            return Err(self.err(format!(
                "expression has more than {} operators",
                MAX_OPERATORS
            )));
        }
        self.operators += 1;
        Ok(())
    }

    fn parse_expr(&mut self) -> Result<Expr, ExprError> {
        self.enter()?;
        let expr = self.parse_or();
        self.depth -= 1;
        expr
    }

    fn parse_or(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.parse_and()?;
        while self.peek() == &Token::OrOr || self.is_keyword("or") {
            self.operator()?;
            self.advance();
            let right = self.parse_and()?;
            left = binary(BinaryOp::Or, left, right);
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.parse_comparison()?;
        while self.peek() == &Token::AndAnd || self.is_keyword("and") {
            self.operator()?;
            self.advance();
            let right = self.parse_comparison()?;
            left = binary(BinaryOp::And, left, right);
        }
        Ok(left)
    }

    fn parse_comparison(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.parse_additive()?;
        loop {
            let op = match self.peek() {
                Token::Eq => BinaryOp::Eq,
                Token::Neq => BinaryOp::Neq,
                Token::Lt => BinaryOp::Lt,
                Token::Lte => BinaryOp::Lte,
                Token::Gt => BinaryOp::Gt,
                Token::Gte => BinaryOp::Gte,
                _ => return Ok(left),
            };
            self.operator()?;
            self.advance();
            let right = self.parse_additive()?;
            left = binary(op, left, right);
        }
    }

    fn parse_additive(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.peek() {
                Token::Plus => BinaryOp::Add,
                Token::Minus => BinaryOp::Sub,
                _ => return Ok(left),
            };
            self.operator()?;
            self.advance();
            let right = self.parse_multiplicative()?;
            left = binary(op, left, right);
        }
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Token::Star => BinaryOp::Mul,
                Token::Slash => BinaryOp::Div,
                Token::Percent => BinaryOp::Rem,
                _ => return Ok(left),
            };
            self.operator()?;
            self.advance();
            let right = self.parse_unary()?;
            left = binary(op, left, right);
        }
    }

    fn parse_unary(&mut self) -> Result<Expr, ExprError> {
        self.enter()?;
        let expr = self.parse_prefixed();
        self.depth -= 1;
        expr
    }

    fn parse_prefixed(&mut self) -> Result<Expr, ExprError> {
        let op = if self.peek() == &Token::Minus {
            Some(UnaryOp::Neg)
        } else if self.peek() == &Token::Bang || self.is_keyword("not") {
            Some(UnaryOp::Not)
        } else if self.peek() == &Token::Plus {
            self.advance();
            return self.parse_unary();
        } else {
            None
        };
        match op {
            Some(op) => {
                self.operator()?;
                self.advance();
                let operand = self.parse_unary()?;
                Ok(Expr::Unary {
                    op,
                    operand: Box::new(operand),
                })
            }
            None => self.parse_power(),
        }
    }

    fn parse_power(&mut self) -> Result<Expr, ExprError> {
        let base = self.parse_primary()?;
        if self.peek() == &Token::Caret {
            self.operator()?;
            self.advance();
            // Right associative, and the exponent may carry its own sign.
            let exponent = self.parse_unary()?;
            return Ok(binary(BinaryOp::Pow, base, exponent));
        }
        Ok(base)
    }

    fn parse_primary(&mut self) -> Result<Expr, ExprError> {
        let start = self.cur().pos;
        match self.peek().clone() {
            Token::Number(text) => {
                let n = Decimal::from_str(&text)
                    .map_err(|e| self.err(format!("invalid number '{}': {}", text, e)))?;
                self.advance();
                Ok(Expr::Number(n))
            }
            Token::Str(s) => {
                self.advance();
                Ok(Expr::Text(s))
            }
            Token::LParen => {
                self.advance();
                let e = self.parse_expr()?;
                self.expect_rparen()?;
                Ok(e)
            }
            Token::Word(w) if w.eq_ignore_ascii_case("true") => {
                self.advance();
                Ok(Expr::Bool(true))
            }
            Token::Word(w) if w.eq_ignore_ascii_case("false") => {
                self.advance();
                Ok(Expr::Bool(false))
            }
            Token::Word(w) => {
                self.advance();
                if self.peek() == &Token::LParen {
                    self.operator()?;
                    self.advance();
                    self.parse_call(&w, start)
                } else {
                    Ok(Expr::Var {
                        name: w,
                        pos: start,
                    })
                }
            }
            other => Err(self.err(format!("expected operand, got {:?}", other))),
        }
    }

    /// Parses a call's argument list; the opening '(' is already consumed.
    fn parse_call(&mut self, name: &str, start: usize) -> Result<Expr, ExprError> {
        let func = Function::lookup(name)
            .ok_or_else(|| ExprError::parse(start, format!("unknown function '{}'", name)))?;
        let mut args = Vec::new();
        if self.peek() != &Token::RParen {
            loop {
                args.push(self.parse_expr()?);
                if self.peek() == &Token::Comma {
                    self.advance();
                    continue;
                }
                break;
            }
        }
        self.expect_rparen()?;

        let (min, max) = func.arity();
        if args.len() < min || max.is_some_and(|m| args.len() > m) {
            let expected = match max {
                Some(m) if m == min => format!("{}", m),
                Some(m) => format!("{} to {}", min, m),
                None => format!("at least {}", min),
            };
            return Err(ExprError::parse(
                start,
                format!(
                    "{} expects {} argument(s), got {}",
                    func.name(),
                    expected,
                    args.len()
                ),
            ));
        }
        Ok(Expr::Call { func, args })
    }
}

fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
    Expr::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}
