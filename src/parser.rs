//! The GQL recursive-descent parser.
//!
//! Precedence, low to high: `or`, `and`, `|`, `&`, equality, relational,
//! `in`/`not in`, additive (`+`/`-`), multiplicative (`*`/`/`), unary
//! (`not`/`-`), postfix `with`, postfix `mapped with`/`filtered with`,
//! postfix (calls, Kleene `*`).

use crate::ast::{
    BinOp, Expr, GetWhat, Literal, Pattern, Program, Stmt, StartOrFinal, UnOp, WithClause,
};
use crate::error::{ErrorKind, RsmqlError, Span};
use crate::lexer::{lex, Token, TokenKind};

/// Parses a full program from source text.
pub fn parse_program(source: &str) -> Result<Program, RsmqlError> {
    let tokens = lex(source)?;
    let mut p = Parser { tokens, pos: 0 };
    let mut statements = Vec::new();
    while !p.at_eof() {
        statements.push(p.statement()?);
    }
    Ok(Program { statements })
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn at_eof(&self) -> bool {
        matches!(self.peek().kind, TokenKind::Eof)
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn peek_at(&self, offset: usize) -> &Token {
        let idx = (self.pos + offset).min(self.tokens.len() - 1);
        &self.tokens[idx]
    }

    fn advance(&mut self) -> Token {
        let t = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        t
    }

    fn ident_is(&self, word: &str) -> bool {
        matches!(&self.peek().kind, TokenKind::Ident(s) if s == word)
    }

    fn ident_at_is(&self, offset: usize, word: &str) -> bool {
        matches!(&self.peek_at(offset).kind, TokenKind::Ident(s) if s == word)
    }

    fn eat_ident(&mut self, word: &str) -> Result<Span, RsmqlError> {
        if self.ident_is(word) {
            Ok(self.advance().span)
        } else {
            self.error(format!("`{word}`"))
        }
    }

    fn expect(&mut self, kind: &TokenKind) -> Result<Span, RsmqlError> {
        if &self.peek().kind == kind {
            Ok(self.advance().span)
        } else {
            self.error(format!("{kind:?}"))
        }
    }

    fn error<T>(&self, expected: String) -> Result<T, RsmqlError> {
        let tok = self.peek();
        Err(RsmqlError::new(
            ErrorKind::ParseError {
                found: format!("{:?}", tok.kind),
                expected,
            },
            tok.span,
        ))
    }

    fn statement(&mut self) -> Result<Stmt, RsmqlError> {
        if self.ident_is("let") {
            let span = self.advance().span;
            let name = self.ident_name()?;
            self.expect(&TokenKind::Assign)?;
            let value = self.expr()?;
            self.expect(&TokenKind::Semicolon)?;
            return Ok(Stmt::Let { name, value, span });
        }
        let span = self.peek().span;
        if self.ident_is("print") {
            self.advance();
        }
        let value = self.expr()?;
        self.expect(&TokenKind::Semicolon)?;
        Ok(Stmt::Print { value, span })
    }

    fn ident_name(&mut self) -> Result<String, RsmqlError> {
        match &self.peek().kind {
            TokenKind::Ident(s) => {
                let s = s.clone();
                self.advance();
                Ok(s)
            }
            _ => self.error("an identifier".to_string()),
        }
    }

    fn expr(&mut self) -> Result<Expr, RsmqlError> {
        self.or_expr()
    }

    fn or_expr(&mut self) -> Result<Expr, RsmqlError> {
        let mut lhs = self.and_expr()?;
        while self.ident_is("or") {
            let span = self.advance().span;
            let rhs = self.and_expr()?;
            lhs = Expr::BinOp { op: BinOp::Or, lhs: Box::new(lhs), rhs: Box::new(rhs), span };
        }
        Ok(lhs)
    }

    fn and_expr(&mut self) -> Result<Expr, RsmqlError> {
        let mut lhs = self.bitor_expr()?;
        while self.ident_is("and") {
            let span = self.advance().span;
            let rhs = self.bitor_expr()?;
            lhs = Expr::BinOp { op: BinOp::And, lhs: Box::new(lhs), rhs: Box::new(rhs), span };
        }
        Ok(lhs)
    }

    fn bitor_expr(&mut self) -> Result<Expr, RsmqlError> {
        let mut lhs = self.bitand_expr()?;
        while matches!(self.peek().kind, TokenKind::Pipe) {
            let span = self.advance().span;
            let rhs = self.bitand_expr()?;
            lhs = Expr::BinOp { op: BinOp::BitOr, lhs: Box::new(lhs), rhs: Box::new(rhs), span };
        }
        Ok(lhs)
    }

    fn bitand_expr(&mut self) -> Result<Expr, RsmqlError> {
        let mut lhs = self.eq_expr()?;
        while matches!(self.peek().kind, TokenKind::Amp) {
            let span = self.advance().span;
            let rhs = self.eq_expr()?;
            lhs = Expr::BinOp { op: BinOp::BitAnd, lhs: Box::new(lhs), rhs: Box::new(rhs), span };
        }
        Ok(lhs)
    }

    fn eq_expr(&mut self) -> Result<Expr, RsmqlError> {
        let mut lhs = self.rel_expr()?;
        loop {
            let op_span = self.peek().span;
            let op = match self.peek().kind {
                TokenKind::EqEq => BinOp::Eq,
                TokenKind::NotEq => BinOp::NotEq,
                _ => break,
            };
            self.advance();
            let rhs = self.rel_expr()?;
            lhs = Expr::BinOp { op, lhs: Box::new(lhs), rhs: Box::new(rhs), span: op_span };
        }
        Ok(lhs)
    }

    fn rel_expr(&mut self) -> Result<Expr, RsmqlError> {
        let mut lhs = self.in_expr()?;
        loop {
            let op_span = self.peek().span;
            let op = match self.peek().kind {
                TokenKind::Lt => BinOp::Lt,
                TokenKind::LtEq => BinOp::LtEq,
                TokenKind::Gt => BinOp::Gt,
                TokenKind::GtEq => BinOp::GtEq,
                _ => break,
            };
            self.advance();
            let rhs = self.in_expr()?;
            lhs = Expr::BinOp { op, lhs: Box::new(lhs), rhs: Box::new(rhs), span: op_span };
        }
        Ok(lhs)
    }

    fn in_expr(&mut self) -> Result<Expr, RsmqlError> {
        let mut lhs = self.additive_expr()?;
        loop {
            if self.ident_is("in") {
                let span = self.advance().span;
                let rhs = self.additive_expr()?;
                lhs = Expr::BinOp { op: BinOp::In, lhs: Box::new(lhs), rhs: Box::new(rhs), span };
            } else if self.ident_is("not") && self.ident_at_is(1, "in") {
                let span = self.advance().span;
                self.advance();
                let rhs = self.additive_expr()?;
                lhs = Expr::BinOp { op: BinOp::NotIn, lhs: Box::new(lhs), rhs: Box::new(rhs), span };
            } else {
                break;
            }
        }
        Ok(lhs)
    }

    fn additive_expr(&mut self) -> Result<Expr, RsmqlError> {
        let mut lhs = self.multiplicative_expr()?;
        loop {
            let op_span = self.peek().span;
            let op = match self.peek().kind {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => break,
            };
            self.advance();
            let rhs = self.multiplicative_expr()?;
            lhs = Expr::BinOp { op, lhs: Box::new(lhs), rhs: Box::new(rhs), span: op_span };
        }
        Ok(lhs)
    }

    fn multiplicative_expr(&mut self) -> Result<Expr, RsmqlError> {
        let mut lhs = self.unary_expr()?;
        loop {
            let op_span = self.peek().span;
            let op = match self.peek().kind {
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                _ => break,
            };
            self.advance();
            let rhs = self.unary_expr()?;
            lhs = Expr::BinOp { op, lhs: Box::new(lhs), rhs: Box::new(rhs), span: op_span };
        }
        Ok(lhs)
    }

    fn unary_expr(&mut self) -> Result<Expr, RsmqlError> {
        if self.ident_is("not") {
            self.advance();
            let operand = self.unary_expr()?;
            let span = operand.span();
            return Ok(Expr::UnOp { op: UnOp::Not, operand: Box::new(operand), span });
        }
        if matches!(self.peek().kind, TokenKind::Minus) {
            self.advance();
            let operand = self.unary_expr()?;
            let span = operand.span();
            return Ok(Expr::UnOp { op: UnOp::Neg, operand: Box::new(operand), span });
        }
        self.with_expr()
    }

    /// `expr ('with' CLAUSE ('start'|'final') 'states' expr)*`, postfix and
    /// left-associative (each rebuild takes the previous result as its base).
    fn with_expr(&mut self) -> Result<Expr, RsmqlError> {
        let mut base = self.map_filter_expr()?;
        while self.ident_is("with") {
            let span = self.advance().span;
            let clause = if self.ident_is("only") {
                self.advance();
                WithClause::Only
            } else if self.ident_is("additional") {
                self.advance();
                WithClause::Additional
            } else {
                WithClause::Additional
            };
            let which = if self.ident_is("start") {
                self.advance();
                StartOrFinal::Start
            } else if self.ident_is("final") {
                self.advance();
                StartOrFinal::Final
            } else {
                return self.error("`start` or `final`".to_string());
            };
            self.eat_ident("states")?;
            let states = self.map_filter_expr()?;
            base = Expr::With {
                clause,
                which,
                base: Box::new(base),
                states: Box::new(states),
                span,
            };
        }
        Ok(base)
    }

    /// `expr (('mapped'|'filtered') 'with' expr)*`, postfix and
    /// left-associative.
    fn map_filter_expr(&mut self) -> Result<Expr, RsmqlError> {
        let mut collection = self.postfix_expr()?;
        loop {
            if self.ident_is("mapped") {
                let span = self.advance().span;
                self.eat_ident("with")?;
                let lambda = self.postfix_expr()?;
                collection = Expr::Map {
                    collection: Box::new(collection),
                    lambda: Box::new(lambda),
                    span,
                };
            } else if self.ident_is("filtered") {
                let span = self.advance().span;
                self.eat_ident("with")?;
                let lambda = self.postfix_expr()?;
                collection = Expr::Filter {
                    collection: Box::new(collection),
                    lambda: Box::new(lambda),
                    span,
                };
            } else {
                break;
            }
        }
        Ok(collection)
    }

    fn postfix_expr(&mut self) -> Result<Expr, RsmqlError> {
        let mut expr = self.primary_expr()?;
        loop {
            match &self.peek().kind {
                TokenKind::Star => {
                    let span = self.advance().span;
                    expr = Expr::UnOp { op: UnOp::Star, operand: Box::new(expr), span };
                }
                TokenKind::LParen => {
                    let span = self.advance().span;
                    let mut args = Vec::new();
                    if !matches!(self.peek().kind, TokenKind::RParen) {
                        args.push(self.expr()?);
                        while matches!(self.peek().kind, TokenKind::Comma) {
                            self.advance();
                            args.push(self.expr()?);
                        }
                    }
                    self.expect(&TokenKind::RParen)?;
                    expr = Expr::Call { callee: Box::new(expr), args, span };
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn primary_expr(&mut self) -> Result<Expr, RsmqlError> {
        let span = self.peek().span;
        match self.peek().kind.clone() {
            TokenKind::Int(n) => {
                self.advance();
                if matches!(self.peek().kind, TokenKind::DotDot) {
                    self.advance();
                    let hi = self.int_literal()?;
                    Ok(Expr::Literal(Literal::Range(n, hi), span))
                } else {
                    Ok(Expr::Literal(Literal::Int(n), span))
                }
            }
            TokenKind::Real(n) => {
                self.advance();
                Ok(Expr::Literal(Literal::Real(n), span))
            }
            TokenKind::Str(s) => {
                self.advance();
                Ok(Expr::Literal(Literal::Str(s), span))
            }
            TokenKind::LParen => {
                self.advance();
                let mut items = vec![self.expr()?];
                let mut is_tuple = false;
                while matches!(self.peek().kind, TokenKind::Comma) {
                    is_tuple = true;
                    self.advance();
                    if matches!(self.peek().kind, TokenKind::RParen) {
                        break;
                    }
                    items.push(self.expr()?);
                }
                self.expect(&TokenKind::RParen)?;
                if is_tuple {
                    Ok(Expr::Tuple(items, span))
                } else {
                    Ok(items.into_iter().next().unwrap())
                }
            }
            TokenKind::LBrace => {
                self.advance();
                let mut items = Vec::new();
                if !matches!(self.peek().kind, TokenKind::RBrace) {
                    items.push(self.expr()?);
                    while matches!(self.peek().kind, TokenKind::Comma) {
                        self.advance();
                        if matches!(self.peek().kind, TokenKind::RBrace) {
                            break;
                        }
                        items.push(self.expr()?);
                    }
                }
                self.expect(&TokenKind::RBrace)?;
                Ok(Expr::Set(items, span))
            }
            TokenKind::Backslash => self.lambda_expr(),
            TokenKind::Ident(word) => self.keyword_or_name(word, span),
            _ => self.error("an expression".to_string()),
        }
    }

    fn int_literal(&mut self) -> Result<i64, RsmqlError> {
        match self.peek().kind {
            TokenKind::Int(n) => {
                self.advance();
                Ok(n)
            }
            _ => self.error("an integer literal".to_string()),
        }
    }

    fn keyword_or_name(&mut self, word: String, span: Span) -> Result<Expr, RsmqlError> {
        match word.as_str() {
            "true" => {
                self.advance();
                Ok(Expr::Literal(Literal::Bool(true), span))
            }
            "false" => {
                self.advance();
                Ok(Expr::Literal(Literal::Bool(false), span))
            }
            "load" => {
                self.advance();
                let str_span = self.peek().span;
                let TokenKind::Str(s) = self.peek().kind.clone() else {
                    return self.error("a string literal".to_string());
                };
                self.advance();
                Ok(Expr::Load(Box::new(Expr::Literal(Literal::Str(s), str_span)), span))
            }
            "rec" => {
                self.advance();
                let name = self.ident_name()?;
                Ok(Expr::Rec(name, span))
            }
            "start" | "final" | "reachable" | "nodes" | "edges" | "labels" => self.get_what_expr(span),
            _ => {
                self.advance();
                Ok(Expr::Name(word, span))
            }
        }
    }

    /// `(GET_WHAT 'states'|'nodes'|'edges'|'labels') 'of' expr`.
    fn get_what_expr(&mut self, span: Span) -> Result<Expr, RsmqlError> {
        let what = if self.ident_is("start") {
            self.advance();
            self.eat_ident("states")?;
            GetWhat::StartStates
        } else if self.ident_is("final") {
            self.advance();
            self.eat_ident("states")?;
            GetWhat::FinalStates
        } else if self.ident_is("reachable") {
            self.advance();
            self.eat_ident("states")?;
            GetWhat::ReachableStates
        } else if self.ident_is("nodes") {
            self.advance();
            GetWhat::Nodes
        } else if self.ident_is("edges") {
            self.advance();
            GetWhat::Edges
        } else {
            self.eat_ident("labels")?;
            GetWhat::Labels
        };
        self.eat_ident("of")?;
        let base = self.map_filter_expr()?;
        Ok(Expr::Of { what, base: Box::new(base), span })
    }

    fn lambda_expr(&mut self) -> Result<Expr, RsmqlError> {
        let span = self.advance().span;
        let param = self.pattern()?;
        self.expect(&TokenKind::Arrow)?;
        let body = self.expr()?;
        Ok(Expr::Lambda { param, body: Box::new(body), span })
    }

    /// `NAME | '(' pattern (',' pattern)+ ','? ')'`.
    fn pattern(&mut self) -> Result<Pattern, RsmqlError> {
        if matches!(self.peek().kind, TokenKind::LParen) {
            self.advance();
            let mut items = vec![self.pattern()?];
            while matches!(self.peek().kind, TokenKind::Comma) {
                self.advance();
                if matches!(self.peek().kind, TokenKind::RParen) {
                    break;
                }
                items.push(self.pattern()?);
            }
            self.expect(&TokenKind::RParen)?;
            return Ok(Pattern::Tuple(items));
        }
        Ok(Pattern::Name(self.ident_name()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_let_and_print() {
        let program = parse_program("let x = 1; x + 2;").unwrap();
        assert_eq!(program.statements.len(), 2);
        assert!(matches!(program.statements[0], Stmt::Let { .. }));
        assert!(matches!(program.statements[1], Stmt::Print { .. }));
    }

    #[test]
    fn parses_optional_print_keyword_and_arrow_form() {
        let program = parse_program(">>> 1 + 1;\nprint 2;").unwrap();
        assert_eq!(program.statements.len(), 2);
    }

    #[test]
    fn parses_with_builder_postfix() {
        let program = parse_program("\"a\" with only start states {1};").unwrap();
        match &program.statements[0] {
            Stmt::Print { value: Expr::With { clause, which, .. }, .. } => {
                assert_eq!(*clause, WithClause::Only);
                assert_eq!(*which, StartOrFinal::Start);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn parses_of_accessor() {
        let program = parse_program("reachable states of g;").unwrap();
        match &program.statements[0] {
            Stmt::Print { value: Expr::Of { what, .. }, .. } => {
                assert_eq!(*what, GetWhat::ReachableStates);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn parses_mapped_and_filtered_with_postfix() {
        let program = parse_program("(0..3 filtered with \\x -> x != 1 mapped with \\x -> x + 1);").unwrap();
        assert!(matches!(
            program.statements[0],
            Stmt::Print { value: Expr::Map { .. }, .. }
        ));
    }

    #[test]
    fn parses_lambda_without_parens() {
        let program = parse_program("({0,1} mapped with \\x -> x + 1);").unwrap();
        match &program.statements[0] {
            Stmt::Print { value: Expr::Map { lambda, .. }, .. } => {
                assert!(matches!(**lambda, Expr::Lambda { .. }));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn parses_range_literal() {
        let program = parse_program("0..3;").unwrap();
        assert!(matches!(
            program.statements[0],
            Stmt::Print { value: Expr::Literal(Literal::Range(0, 3), _), .. }
        ));
    }

    #[test]
    fn parses_not_in_as_one_operator() {
        let program = parse_program("1 not in {2, 3};").unwrap();
        match &program.statements[0] {
            Stmt::Print { value: Expr::BinOp { op: BinOp::NotIn, .. }, .. } => {}
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn operator_precedence_additive_over_relational() {
        let program = parse_program("1 + 2 < 4;").unwrap();
        match &program.statements[0] {
            Stmt::Print { value: Expr::BinOp { op: BinOp::Lt, lhs, .. }, .. } => {
                assert!(matches!(**lhs, Expr::BinOp { op: BinOp::Add, .. }));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn operator_precedence_multiplicative_over_additive() {
        let program = parse_program("1 + 2 * 3;").unwrap();
        match &program.statements[0] {
            Stmt::Print { value: Expr::BinOp { op: BinOp::Add, rhs, .. }, .. } => {
                assert!(matches!(**rhs, Expr::BinOp { op: BinOp::Mul, .. }));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn type_error_scenario_parses_as_unary_neg_on_string() {
        let program = parse_program("(- \"1\");").unwrap();
        match &program.statements[0] {
            Stmt::Print { value: Expr::UnOp { op: UnOp::Neg, .. }, .. } => {}
            other => panic!("unexpected {other:?}"),
        }
    }
}
