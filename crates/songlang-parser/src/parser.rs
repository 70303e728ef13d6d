//! Recursive-descent statement parser with a Pratt expression parser
//! (spec §4.2), following the teacher's binding-power-table shape
//! (`crates/snow-parser/src/parser/expressions.rs`) but building plain
//! [`Expression`]/[`Statement`] values directly rather than CST events.

use songlang_common::{Position, Token, TokenKind, TokenValue};

use crate::ast::{
    AllTarget, BinaryOp, DebugTarget, Expression, Literal, LosesKind, QueryPattern, QueryRelation,
    Statement, UnaryOp,
};
use crate::error::ParserError;

/// Returns `(left_bp, right_bp)` for an infix operator, lowest to highest
/// per spec §4.2: `or`, `and`, comparisons, additive, multiplicative.
/// `left_bp < right_bp` means left-associative.
fn infix_binding_power(kind: TokenKind) -> Option<(u8, u8)> {
    match kind {
        TokenKind::Or => Some((1, 2)),
        TokenKind::And => Some((3, 4)),
        TokenKind::Eq | TokenKind::Neq => Some((5, 6)),
        TokenKind::Lt | TokenKind::Gt | TokenKind::Lte | TokenKind::Gte => Some((7, 8)),
        TokenKind::Plus | TokenKind::Minus => Some((9, 10)),
        TokenKind::Star | TokenKind::Slash | TokenKind::Percent => Some((11, 12)),
        _ => None,
    }
}

fn to_binary_op(kind: TokenKind) -> BinaryOp {
    match kind {
        TokenKind::Or => BinaryOp::Or,
        TokenKind::And => BinaryOp::And,
        TokenKind::Eq => BinaryOp::Eq,
        TokenKind::Neq => BinaryOp::Neq,
        TokenKind::Lt => BinaryOp::Lt,
        TokenKind::Gt => BinaryOp::Gt,
        TokenKind::Lte => BinaryOp::Lte,
        TokenKind::Gte => BinaryOp::Gte,
        TokenKind::Plus => BinaryOp::Add,
        TokenKind::Minus => BinaryOp::Sub,
        TokenKind::Star => BinaryOp::Mul,
        TokenKind::Slash => BinaryOp::Div,
        TokenKind::Percent => BinaryOp::Mod,
        other => unreachable!("{other:?} is not an infix operator"),
    }
}

/// Parse a full program: a sequence of statements separated by newlines.
pub fn parse(tokens: Vec<Token>) -> Result<Vec<Statement>, ParserError> {
    let mut parser = Parser::new(tokens);
    let mut statements = Vec::new();
    parser.skip_newlines();
    while !parser.at_end() {
        statements.push(parser.parse_statement()?);
        parser.skip_newlines();
    }
    Ok(statements)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    // ── Token stream helpers ────────────────────────────────────────

    fn current(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn peek(&self, n: usize) -> &Token {
        let idx = (self.pos + n).min(self.tokens.len() - 1);
        &self.tokens[idx]
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.current().kind == kind
    }

    fn at_end(&self) -> bool {
        self.check(TokenKind::Eof)
    }

    fn advance(&mut self) -> Token {
        let tok = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn expect(&mut self, kind: TokenKind, message: &str) -> Result<Token, ParserError> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.error(message))
        }
    }

    fn error(&self, message: impl Into<String>) -> ParserError {
        ParserError::new(message, self.current())
    }

    fn skip_newlines(&mut self) {
        while self.check(TokenKind::Newline) {
            self.advance();
        }
    }

    fn current_starts_literal(&self) -> bool {
        matches!(
            self.current().kind,
            TokenKind::Number | TokenKind::String | TokenKind::Identifier
        )
    }

    fn parse_literal(&mut self) -> Result<Literal, ParserError> {
        match self.current().kind {
            TokenKind::Number => {
                let tok = self.advance();
                match tok.value {
                    Some(TokenValue::Number(n)) => Ok(Literal::Number(n)),
                    _ => unreachable!("NUMBER token always carries a numeric value"),
                }
            }
            TokenKind::String => {
                let tok = self.advance();
                match tok.value {
                    Some(TokenValue::String(s)) => Ok(Literal::String(s)),
                    _ => unreachable!("STRING token always carries a string value"),
                }
            }
            TokenKind::Identifier => Ok(Literal::Identifier(self.advance().lexeme)),
            _ => Err(self.error("expected a number, string, or identifier")),
        }
    }

    // ── Statements ───────────────────────────────────────────────────

    /// Parse one statement, including the legacy trailing `WHEN` wrapper
    /// (spec §4.2: "A trailing WHEN after any statement S").
    fn parse_statement(&mut self) -> Result<Statement, ParserError> {
        let stmt = self.parse_core_statement()?;
        if self.check(TokenKind::When) {
            let position = self.current().position;
            self.advance();
            self.expect(TokenKind::Do, "expected DO after trailing WHEN")?;
            let body = self.parse_block()?;
            self.expect(TokenKind::End, "expected END to close WHEN block")?;
            return Ok(Statement::When {
                condition: Box::new(stmt),
                body,
                position,
            });
        }
        Ok(stmt)
    }

    fn parse_core_statement(&mut self) -> Result<Statement, ParserError> {
        match self.current().kind {
            TokenKind::Debug => self.parse_debug(),
            TokenKind::All => self.parse_all(),
            TokenKind::Question | TokenKind::QueryVar => self.parse_query(),
            TokenKind::LParen => self.parse_paren_subject(),
            TokenKind::Chance => self.parse_chance(),
            TokenKind::Identifier => self.parse_identifier_subject(),
            _ => Err(self.error("expected a statement")),
        }
    }

    /// Parse statements until `END`, `ELSE`, or end-of-input. Used for
    /// `DO ... END` bodies (and their `ELSE` continuations).
    fn parse_block(&mut self) -> Result<Vec<Statement>, ParserError> {
        let mut statements = Vec::new();
        self.skip_newlines();
        while !self.check(TokenKind::End) && !self.check(TokenKind::Else) && !self.at_end() {
            statements.push(self.parse_statement()?);
            self.skip_newlines();
        }
        Ok(statements)
    }

    fn parse_identifier_subject(&mut self) -> Result<Statement, ParserError> {
        let subject_tok = self.advance();
        let subject = subject_tok.lexeme;
        let position = subject_tok.position;

        if self.check(TokenKind::Dot) {
            let mut expr = Expression::Identifier {
                name: subject,
                position,
            };
            while self.check(TokenKind::Dot) {
                self.advance();
                let prop = self.expect(TokenKind::Identifier, "expected property name after '.'")?;
                expr = Expression::PropertyAccess {
                    object: Box::new(expr),
                    property: prop.lexeme,
                    position,
                };
            }
            return self.parse_expression_subject_tail(expr, position);
        }

        match self.current().kind {
            TokenKind::Do => self.parse_do_block(subject, position),
            TokenKind::Print => {
                self.advance();
                Ok(Statement::Relation {
                    subject,
                    relation: "PRINT".to_string(),
                    args: Vec::new(),
                    position,
                })
            }
            TokenKind::Can => self.parse_can(subject, position),
            TokenKind::Loses => self.parse_loses(subject, position),
            TokenKind::Has => {
                self.advance();
                self.parse_has_body(subject, position)
            }
            TokenKind::Is => self.parse_is(subject, position),
            TokenKind::Each => self.parse_each(subject, position),
            TokenKind::When => {
                self.advance();
                self.parse_when_expression(subject, position)
            }
            TokenKind::Identifier => {
                let relation_tok = self.advance();
                let args = self.parse_relation_args()?;
                Ok(Statement::Relation {
                    subject,
                    relation: relation_tok.lexeme,
                    args,
                    position,
                })
            }
            _ => Err(self.error("expected a relation after subject")),
        }
    }

    /// Finish a statement whose subject is an expression (a parenthesized
    /// group, or an `identifier.prop...` chain): only `PRINT` or `HAS`
    /// may follow (spec §4.2).
    fn parse_expression_subject_tail(
        &mut self,
        subject: Expression,
        position: Position,
    ) -> Result<Statement, ParserError> {
        if self.check(TokenKind::Print) {
            self.advance();
            return Ok(Statement::ExpressionPrint { subject, position });
        }
        if self.check(TokenKind::Has) {
            self.advance();
            let property = self
                .expect(TokenKind::Identifier, "expected property name after HAS")?
                .lexeme;
            let (literal_value, value_expression) = if self.check(TokenKind::LParen) {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect(TokenKind::RParen, "expected ')'")?;
                (None, Some(expr))
            } else if self.current_starts_literal() {
                (Some(self.parse_literal()?), None)
            } else {
                (None, None)
            };
            return Ok(Statement::ExpressionHas {
                subject,
                property,
                literal_value,
                value_expression,
                position,
            });
        }
        Err(self.error("expected PRINT or HAS"))
    }

    fn parse_is(&mut self, subject: String, position: Position) -> Result<Statement, ParserError> {
        self.advance(); // IS
        let type_name = match self.current().kind {
            TokenKind::Identifier => self.advance().lexeme,
            TokenKind::Relation => {
                self.advance();
                "RELATION".to_string()
            }
            _ => return Err(self.error("expected a type name after IS")),
        };
        Ok(Statement::Relation {
            subject,
            relation: "IS".to_string(),
            args: vec![Literal::Identifier(type_name)],
            position,
        })
    }

    /// `HAS` with the leading `HAS` token already consumed.
    fn parse_has_body(&mut self, subject: String, position: Position) -> Result<Statement, ParserError> {
        let property = self
            .expect(TokenKind::Identifier, "expected property name after HAS")?
            .lexeme;

        if self.check(TokenKind::LParen) {
            let is_role_definition = self.peek(1).kind == TokenKind::Identifier
                && self.peek(1).lexeme.eq_ignore_ascii_case("node")
                && self.peek(2).kind == TokenKind::RParen;
            if is_role_definition {
                self.advance(); // (
                self.advance(); // Node
                self.advance(); // )
                return Ok(Statement::RoleDefinition {
                    subject,
                    role_name: property,
                    position,
                });
            }
            self.advance(); // (
            let expr = self.parse_expression()?;
            self.expect(TokenKind::RParen, "expected ')'")?;
            return Ok(Statement::HasExpression {
                subject,
                property,
                value_expression: expr,
                position,
            });
        }

        if self.current_starts_literal() {
            let value = self.parse_literal()?;
            return Ok(Statement::Relation {
                subject,
                relation: "HAS".to_string(),
                args: vec![Literal::Identifier(property), value],
                position,
            });
        }

        Ok(Statement::Relation {
            subject,
            relation: "HAS".to_string(),
            args: vec![Literal::Identifier(property)],
            position,
        })
    }

    fn parse_can(&mut self, subject: String, position: Position) -> Result<Statement, ParserError> {
        self.advance(); // CAN
        let ability = self
            .expect(TokenKind::Identifier, "expected an ability name after CAN")?
            .lexeme;
        Ok(Statement::Can {
            subject,
            ability,
            position,
        })
    }

    fn parse_loses(&mut self, subject: String, position: Position) -> Result<Statement, ParserError> {
        self.advance(); // LOSES
        if self.check(TokenKind::Is) {
            self.advance();
            let target = self
                .expect(TokenKind::Identifier, "expected a parent name after LOSES IS")?
                .lexeme;
            return Ok(Statement::Loses {
                subject,
                target,
                kind: LosesKind::Is,
                position,
            });
        }
        let target = self
            .expect(TokenKind::Identifier, "expected a target after LOSES")?
            .lexeme;
        Ok(Statement::Loses {
            subject,
            target,
            kind: LosesKind::Auto,
            position,
        })
    }

    fn parse_do_block(&mut self, subject: String, position: Position) -> Result<Statement, ParserError> {
        self.advance(); // DO
        let body = self.parse_block()?;
        self.expect(TokenKind::End, "expected END to close DO block")?;
        Ok(Statement::DoBlock {
            subject,
            body,
            position,
        })
    }

    fn parse_each(&mut self, subject: String, position: Position) -> Result<Statement, ParserError> {
        self.advance(); // EACH
        let variable = self
            .expect(TokenKind::Identifier, "expected a loop variable after EACH")?
            .lexeme;
        self.expect(TokenKind::Do, "expected DO after EACH variable")?;
        let body = self.parse_block()?;
        self.expect(TokenKind::End, "expected END to close EACH block")?;
        Ok(Statement::Each {
            collection: subject,
            variable,
            body,
            position,
        })
    }

    /// The `WHEN` keyword has already been consumed; parses the
    /// `(expr) DO ... [ELSE ...] END` tail.
    fn parse_when_expression(&mut self, subject: String, position: Position) -> Result<Statement, ParserError> {
        let stmt = self.parse_when_clause(&subject, position)?;
        self.expect(TokenKind::End, "expected END to close WHEN block")?;
        Ok(stmt)
    }

    /// Parses one `(expr) DO body [ELSE DO body | ELSE WHEN clause]`
    /// clause, without consuming the final `END` -- the outermost caller
    /// does that once the whole `ELSE WHEN` chain has unwound.
    fn parse_when_clause(&mut self, subject: &str, position: Position) -> Result<Statement, ParserError> {
        self.expect(TokenKind::LParen, "expected '(' after WHEN")?;
        let condition = self.parse_expression()?;
        self.expect(TokenKind::RParen, "expected ')'")?;
        self.expect(TokenKind::Do, "expected DO after WHEN condition")?;
        let body = self.parse_block()?;

        let mut else_body = None;
        let mut else_when = None;
        if self.check(TokenKind::Else) {
            self.advance();
            if self.check(TokenKind::When) {
                let nested_position = self.current().position;
                self.advance();
                let nested = self.parse_when_clause(subject, nested_position)?;
                else_when = Some(Box::new(nested));
            } else {
                self.expect(TokenKind::Do, "expected DO after ELSE")?;
                else_body = Some(self.parse_block()?);
            }
        }

        Ok(Statement::WhenExpression {
            subject: subject.to_string(),
            condition,
            body,
            else_body,
            else_when,
            position,
        })
    }

    fn parse_chance(&mut self) -> Result<Statement, ParserError> {
        let position = self.current().position;
        self.advance(); // CHANCE

        let percent = if self.check(TokenKind::LParen) {
            self.advance();
            let expr = self.parse_expression()?;
            self.expect(TokenKind::RParen, "expected ')'")?;
            expr
        } else {
            let tok = self.expect(TokenKind::Number, "expected a number or '(' after CHANCE")?;
            let value = match tok.value {
                Some(TokenValue::Number(n)) => n,
                _ => unreachable!("NUMBER token always carries a numeric value"),
            };
            Expression::Number {
                value,
                position: tok.position,
            }
        };

        self.expect(TokenKind::Do, "expected DO after CHANCE percent")?;
        let body = self.parse_block()?;

        let else_body = if self.check(TokenKind::Else) {
            self.advance();
            self.expect(TokenKind::Do, "expected DO after ELSE")?;
            Some(self.parse_block()?)
        } else {
            None
        };

        self.expect(TokenKind::End, "expected END to close CHANCE block")?;
        Ok(Statement::Chance {
            percent,
            body,
            else_body,
            position,
        })
    }

    fn parse_all(&mut self) -> Result<Statement, ParserError> {
        let position = self.current().position;
        self.advance(); // ALL

        let target = if self.check(TokenKind::QueryVar) {
            let tok = self.advance();
            let name = match tok.value {
                Some(TokenValue::String(s)) => s,
                _ => unreachable!("QUERY_VAR token always carries its name"),
            };
            AllTarget::QueryVariable(name)
        } else {
            let tok = self.expect(
                TokenKind::Identifier,
                "expected a type name or query variable after ALL",
            )?;
            AllTarget::TypeName(tok.lexeme)
        };

        let action = self.parse_all_action(position)?;
        Ok(Statement::All {
            target,
            action,
            position,
        })
    }

    /// Spec §9: an `ALL` action is restricted to `HAS <prop> [literal]`,
    /// bare `PRINT`, or a custom-relation invocation -- never `HAS` with a
    /// parenthesized expression, since the action has no fixed subject to
    /// evaluate such an expression against until a match is found.
    fn parse_all_action(&mut self, position: Position) -> Result<Option<Box<Statement>>, ParserError> {
        if self.check(TokenKind::Has) {
            self.advance();
            let property = self
                .expect(TokenKind::Identifier, "expected property name after HAS")?
                .lexeme;
            let mut args = vec![Literal::Identifier(property)];
            if self.current_starts_literal() {
                args.push(self.parse_literal()?);
            }
            Ok(Some(Box::new(Statement::Relation {
                subject: "_".to_string(),
                relation: "HAS".to_string(),
                args,
                position,
            })))
        } else if self.check(TokenKind::Print) {
            self.advance();
            Ok(Some(Box::new(Statement::Relation {
                subject: "_".to_string(),
                relation: "PRINT".to_string(),
                args: Vec::new(),
                position,
            })))
        } else if self.check(TokenKind::Identifier) {
            let relation_tok = self.advance();
            let args = self.parse_relation_args()?;
            Ok(Some(Box::new(Statement::Relation {
                subject: "_".to_string(),
                relation: relation_tok.lexeme,
                args,
                position,
            })))
        } else {
            Ok(None)
        }
    }

    fn parse_relation_args(&mut self) -> Result<Vec<Literal>, ParserError> {
        let mut args = Vec::new();
        if self.current_starts_literal() {
            args.push(self.parse_literal()?);
            while self.check(TokenKind::Comma) {
                self.advance();
                args.push(self.parse_literal()?);
            }
        }
        Ok(args)
    }

    fn parse_query(&mut self) -> Result<Statement, ParserError> {
        let (pattern, position) = if self.check(TokenKind::QueryVar) {
            let tok = self.advance();
            let name = match tok.value {
                Some(TokenValue::String(s)) => s,
                _ => unreachable!("QUERY_VAR token always carries its name"),
            };
            (QueryPattern::Variable(name), tok.position)
        } else {
            let tok = self.expect(TokenKind::Question, "expected '?' to start a query")?;
            (QueryPattern::Wildcard, tok.position)
        };

        let relation = match self.current().kind {
            TokenKind::Is => {
                self.advance();
                QueryRelation::Is
            }
            TokenKind::Has => {
                self.advance();
                QueryRelation::Has
            }
            TokenKind::Can => {
                self.advance();
                QueryRelation::Can
            }
            _ => return Err(self.error("expected IS, HAS, or CAN after query pattern")),
        };

        let target = if self.check(TokenKind::Identifier) {
            Some(self.advance().lexeme)
        } else {
            None
        };

        let target_value = if relation == QueryRelation::Has
            && target.is_some()
            && self.current_starts_literal()
        {
            Some(self.parse_literal()?)
        } else {
            None
        };

        let where_condition = if self.check(TokenKind::Where) {
            self.advance();
            Some(self.parse_expression()?)
        } else {
            None
        };

        Ok(Statement::Query {
            subject: pattern,
            relation,
            target,
            target_value,
            where_condition,
            position,
        })
    }

    fn parse_paren_subject(&mut self) -> Result<Statement, ParserError> {
        let position = self.current().position;
        self.advance(); // (
        let inner = self.parse_expression()?;
        self.expect(TokenKind::RParen, "expected ')'")?;
        let expr = Expression::Grouping {
            inner: Box::new(inner),
            position,
        };
        self.parse_expression_subject_tail(expr, position)
    }

    fn parse_debug(&mut self) -> Result<Statement, ParserError> {
        let position = self.current().position;
        self.advance(); // DEBUG
        let tok = self.expect(
            TokenKind::Identifier,
            "expected GRAPH, TOKENS, or AST after DEBUG",
        )?;
        let target = match tok.lexeme.to_ascii_uppercase().as_str() {
            "GRAPH" => DebugTarget::Graph,
            "TOKENS" => DebugTarget::Tokens,
            "AST" => DebugTarget::Ast,
            other => {
                return Err(ParserError::new(
                    format!("unknown DEBUG target '{other}'"),
                    &tok,
                ))
            }
        };
        Ok(Statement::Debug { target, position })
    }

    // ── Expressions ──────────────────────────────────────────────────

    fn parse_expression(&mut self) -> Result<Expression, ParserError> {
        self.expr_bp(0)
    }

    fn expr_bp(&mut self, min_bp: u8) -> Result<Expression, ParserError> {
        let mut lhs = self.parse_unary()?;
        loop {
            let Some((l_bp, r_bp)) = infix_binding_power(self.current().kind) else {
                break;
            };
            if l_bp < min_bp {
                break;
            }
            let op_tok = self.advance();
            let op = to_binary_op(op_tok.kind);
            let rhs = self.expr_bp(r_bp)?;
            lhs = Expression::Binary {
                left: Box::new(lhs),
                op,
                right: Box::new(rhs),
                position: op_tok.position,
            };
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expression, ParserError> {
        if self.check(TokenKind::Minus) {
            let tok = self.advance();
            let operand = self.parse_unary()?;
            return Ok(Expression::Unary {
                op: UnaryOp::Negate,
                operand: Box::new(operand),
                position: tok.position,
            });
        }
        if self.check(TokenKind::Not) {
            let tok = self.advance();
            let operand = self.parse_unary()?;
            return Ok(Expression::Unary {
                op: UnaryOp::Not,
                operand: Box::new(operand),
                position: tok.position,
            });
        }
        self.parse_postfix(true)
    }

    /// Parses a primary expression, then any `.property` or `prop OF
    /// object` postfixes. `allow_of` is `false` when parsing the
    /// right-hand object of an `OF`, since `OF` itself does not chain.
    fn parse_postfix(&mut self, allow_of: bool) -> Result<Expression, ParserError> {
        let mut expr = self.parse_primary()?;
        loop {
            if self.check(TokenKind::Dot) {
                self.advance();
                let prop = self.expect(TokenKind::Identifier, "expected property name after '.'")?;
                expr = Expression::PropertyAccess {
                    object: Box::new(expr),
                    property: prop.lexeme,
                    position: prop.position,
                };
            } else if allow_of && self.check(TokenKind::Of) {
                let name = match &expr {
                    Expression::Identifier { name, .. } => name.clone(),
                    _ => return Err(self.error("OF requires a bare identifier on the left")),
                };
                let of_position = self.current().position;
                self.advance();
                let object = self.parse_postfix(false)?;
                expr = Expression::PropertyAccess {
                    object: Box::new(object),
                    property: name,
                    position: of_position,
                };
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expression, ParserError> {
        match self.current().kind {
            TokenKind::Number => {
                let tok = self.advance();
                let value = match tok.value {
                    Some(TokenValue::Number(n)) => n,
                    _ => unreachable!("NUMBER token always carries a numeric value"),
                };
                Ok(Expression::Number {
                    value,
                    position: tok.position,
                })
            }
            TokenKind::String => {
                let tok = self.advance();
                let value = match tok.value {
                    Some(TokenValue::String(s)) => s,
                    _ => unreachable!("STRING token always carries a string value"),
                };
                Ok(Expression::String {
                    value,
                    position: tok.position,
                })
            }
            TokenKind::QueryVar => {
                let tok = self.advance();
                let name = match tok.value {
                    Some(TokenValue::String(s)) => s,
                    _ => unreachable!("QUERY_VAR token always carries its name"),
                };
                Ok(Expression::Identifier {
                    name,
                    position: tok.position,
                })
            }
            TokenKind::Identifier => {
                let tok = self.advance();
                Ok(Expression::Identifier {
                    name: tok.lexeme,
                    position: tok.position,
                })
            }
            TokenKind::LParen => {
                let position = self.current().position;
                self.advance();
                let inner = self.parse_expression()?;
                self.expect(TokenKind::RParen, "expected ')'")?;
                Ok(Expression::Grouping {
                    inner: Box::new(inner),
                    position,
                })
            }
            TokenKind::Random => {
                let tok = self.advance();
                let min = self.parse_random_operand()?;
                let max = self.parse_random_operand()?;
                Ok(Expression::Random {
                    min: Box::new(min),
                    max: Box::new(max),
                    position: tok.position,
                })
            }
            _ => Err(self.error("expected an expression")),
        }
    }

    /// `RANDOM` takes exactly two primary-ish operands: a number, an
    /// identifier with an optional `.`-chain, or a parenthesized
    /// expression (spec §4.2) -- deliberately narrower than a full
    /// primary (no strings, no nested `RANDOM`).
    fn parse_random_operand(&mut self) -> Result<Expression, ParserError> {
        match self.current().kind {
            TokenKind::Number => {
                let tok = self.advance();
                let value = match tok.value {
                    Some(TokenValue::Number(n)) => n,
                    _ => unreachable!("NUMBER token always carries a numeric value"),
                };
                Ok(Expression::Number {
                    value,
                    position: tok.position,
                })
            }
            TokenKind::LParen => {
                let position = self.current().position;
                self.advance();
                let inner = self.parse_expression()?;
                self.expect(TokenKind::RParen, "expected ')'")?;
                Ok(Expression::Grouping {
                    inner: Box::new(inner),
                    position,
                })
            }
            TokenKind::Identifier => {
                let tok = self.advance();
                let mut expr = Expression::Identifier {
                    name: tok.lexeme,
                    position: tok.position,
                };
                while self.check(TokenKind::Dot) {
                    self.advance();
                    let prop = self.expect(TokenKind::Identifier, "expected property name after '.'")?;
                    expr = Expression::PropertyAccess {
                        object: Box::new(expr),
                        property: prop.lexeme,
                        position: prop.position,
                    };
                }
                Ok(expr)
            }
            _ => Err(self.error(
                "expected a number, identifier, or parenthesized expression as a RANDOM operand",
            )),
        }
    }
}
