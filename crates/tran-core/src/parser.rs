//! Parser for the Tran language.
//!
//! Recursive descent over the token stream produced by the lexer. Blocks are
//! delimited by INDENT/DEDENT, statements end at NEWLINE (or at a DEDENT or
//! the end of input). The first error aborts the parse.

use crate::ast::*;
use crate::cursor::TokenCursor;
use crate::error::{Error, Result};
use crate::lexer::{Token, TokenKind};
use crate::span::Span;

/// Parser for the Tran language.
pub struct Parser {
    cursor: TokenCursor,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            cursor: TokenCursor::new(tokens),
        }
    }

    /// Parse the entire program.
    pub fn parse(mut self) -> Result<TranUnit> {
        let mut unit = TranUnit::default();

        while !self.cursor.done() {
            if self.cursor.match_and_remove(TokenKind::Newline).is_some()
                || self.cursor.match_and_remove(TokenKind::Dedent).is_some()
            {
                continue;
            }

            if self.cursor.match_and_remove(TokenKind::Interface).is_some() {
                let interface = self.parse_interface()?;
                tracing::debug!(name = %interface.name.name, methods = interface.methods.len(), "parsed interface");
                unit.interfaces.push(interface);
            } else if self.cursor.match_and_remove(TokenKind::Class).is_some() {
                let class = self.parse_class()?;
                tracing::debug!(
                    name = %class.name.name,
                    methods = class.methods.len(),
                    members = class.members.len(),
                    "parsed class"
                );
                unit.classes.push(class);
            } else {
                return Err(self.error("'class' or 'interface'"));
            }
        }

        Ok(unit)
    }

    /// Parse an interface declaration. The `interface` keyword is already consumed.
    fn parse_interface(&mut self) -> Result<InterfaceDecl> {
        let start_span = self.cursor.previous_span();
        let name = self.expect_word("interface name")?;
        self.require_newline()?;
        self.expect(TokenKind::Indent, "indented method headers")?;

        let mut methods = Vec::new();
        loop {
            self.skip_newlines();
            if self.cursor.match_and_remove(TokenKind::Dedent).is_some() || self.cursor.done() {
                break;
            }
            methods.push(self.parse_method_header()?);
            self.end_of_line()?;
        }

        if methods.is_empty() {
            return Err(Error::syntax(
                format!("interface '{}' must declare at least one method", name.name),
                name.span,
            ));
        }

        Ok(InterfaceDecl {
            name,
            methods,
            span: start_span.merge(&self.cursor.previous_span()),
        })
    }

    /// Parse `name(type a, type b) : type r`.
    fn parse_method_header(&mut self) -> Result<MethodHeader> {
        let start_span = self.cursor.current_span();
        let name = self.expect_word("method name")?;
        self.expect(TokenKind::LParen, "'(' after method name")?;

        let mut parameters = Vec::new();
        if self.cursor.match_and_remove(TokenKind::RParen).is_none() {
            loop {
                parameters.push(self.parse_variable_decl()?);
                if self.cursor.match_and_remove(TokenKind::Comma).is_none() {
                    break;
                }
            }
            self.expect(TokenKind::RParen, "')' after parameters")?;
        }

        let mut returns = Vec::new();
        if self.cursor.match_and_remove(TokenKind::Colon).is_some() {
            loop {
                returns.push(self.parse_variable_decl()?);
                if self.cursor.match_and_remove(TokenKind::Comma).is_none() {
                    break;
                }
            }
        }

        Ok(MethodHeader {
            name,
            parameters,
            returns,
            span: start_span.merge(&self.cursor.previous_span()),
        })
    }

    /// Parse `type name`.
    fn parse_variable_decl(&mut self) -> Result<VariableDecl> {
        let type_name = self.expect_word("variable type")?;
        let name = self.expect_word("variable name")?;
        let span = type_name.span.merge(&name.span);
        Ok(VariableDecl {
            type_name,
            name,
            span,
        })
    }

    /// Parse a class declaration. The `class` keyword is already consumed.
    fn parse_class(&mut self) -> Result<ClassDecl> {
        let start_span = self.cursor.previous_span();
        let name = self.expect_word("class name")?;

        let mut interfaces = Vec::new();
        if self.cursor.match_and_remove(TokenKind::Implements).is_some() {
            loop {
                interfaces.push(self.expect_word("interface name")?);
                if self.cursor.match_and_remove(TokenKind::Comma).is_none() {
                    break;
                }
            }
        }

        self.require_newline()?;
        self.expect(TokenKind::Indent, "indented class body")?;

        let mut constructors = Vec::new();
        let mut methods = Vec::new();
        let mut members = Vec::new();

        loop {
            self.skip_newlines();
            if self.cursor.match_and_remove(TokenKind::Dedent).is_some() || self.cursor.done() {
                break;
            }

            if self.cursor.match_and_remove(TokenKind::Construct).is_some() {
                constructors.push(self.parse_constructor()?);
            } else if self.cursor.check(TokenKind::Private)
                || self.cursor.check(TokenKind::Shared)
                || self.cursor.next_two_match(TokenKind::Word, TokenKind::LParen)
            {
                methods.push(self.parse_method()?);
            } else if self.cursor.next_two_match(TokenKind::Word, TokenKind::Word) {
                let (member, has_block) = self.parse_member()?;
                members.push(member);
                if !has_block {
                    self.end_of_line()?;
                }
            } else {
                return Err(self.error("constructor, method or member declaration"));
            }
        }

        Ok(ClassDecl {
            name,
            interfaces,
            constructors,
            methods,
            members,
            span: start_span.merge(&self.cursor.previous_span()),
        })
    }

    /// Parse `construct(params)` and its body. The keyword is already consumed.
    fn parse_constructor(&mut self) -> Result<ConstructorDecl> {
        let start_span = self.cursor.previous_span();
        self.expect(TokenKind::LParen, "'(' after 'construct'")?;

        let mut parameters = Vec::new();
        if self.cursor.match_and_remove(TokenKind::RParen).is_none() {
            loop {
                parameters.push(self.parse_variable_decl()?);
                if self.cursor.match_and_remove(TokenKind::Comma).is_none() {
                    break;
                }
            }
            self.expect(TokenKind::RParen, "')' after parameters")?;
        }

        let (locals, statements) = self.parse_body()?;
        Ok(ConstructorDecl {
            parameters,
            locals,
            statements,
            span: start_span.merge(&self.cursor.previous_span()),
        })
    }

    /// Parse `[private] [shared] header` and its body.
    fn parse_method(&mut self) -> Result<MethodDecl> {
        let start_span = self.cursor.current_span();
        let mut is_private = false;
        let mut is_shared = false;

        loop {
            let (flag, keyword) = if self.cursor.check(TokenKind::Private) {
                (&mut is_private, "private")
            } else if self.cursor.check(TokenKind::Shared) {
                (&mut is_shared, "shared")
            } else {
                break;
            };
            if *flag {
                return Err(Error::syntax(
                    format!("duplicate '{}' modifier", keyword),
                    self.cursor.current_span(),
                ));
            }
            *flag = true;
            self.cursor.advance();
        }

        let header = self.parse_method_header()?;
        let (locals, statements) = self.parse_body()?;

        Ok(MethodDecl {
            header,
            is_private,
            is_shared,
            locals,
            statements,
            span: start_span.merge(&self.cursor.previous_span()),
        })
    }

    /// Parse a member declaration with its optional accessor/mutator block.
    /// Returns whether a block was present (the block consumes its own line end).
    fn parse_member(&mut self) -> Result<(MemberDecl, bool)> {
        let declaration = self.parse_variable_decl()?;
        let mut member = MemberDecl {
            declaration,
            accessor: false,
            mutator: false,
        };

        let mark = self.cursor.mark();
        self.skip_newlines();
        if self.cursor.match_and_remove(TokenKind::Indent).is_none() {
            self.cursor.reset(mark);
            return Ok((member, false));
        }

        loop {
            self.skip_newlines();
            if self.cursor.match_and_remove(TokenKind::Dedent).is_some() || self.cursor.done() {
                break;
            }
            if self.cursor.match_and_remove(TokenKind::Accessor).is_some() {
                member.accessor = true;
            } else if self.cursor.match_and_remove(TokenKind::Mutator).is_some() {
                member.mutator = true;
            } else {
                return Err(self.error("'accessor:' or 'mutator:'"));
            }
            self.expect(TokenKind::Colon, "':'")?;
            self.end_of_line()?;
        }

        Ok((member, true))
    }

    /// Parse an indented body: local declarations first, then statements.
    fn parse_body(&mut self) -> Result<(Vec<VariableDecl>, Vec<Statement>)> {
        self.require_newline()?;
        self.expect(TokenKind::Indent, "indented body")?;

        let mut locals = Vec::new();
        self.skip_newlines();
        while self.cursor.next_two_match(TokenKind::Word, TokenKind::Word) {
            locals.push(self.parse_variable_decl()?);
            self.end_of_line()?;
            self.skip_newlines();
        }

        let statements = self.parse_statements()?;
        Ok((locals, statements))
    }

    /// Parse statements up to and including the closing DEDENT.
    fn parse_statements(&mut self) -> Result<Vec<Statement>> {
        let mut statements = Vec::new();
        loop {
            self.skip_newlines();
            if self.cursor.match_and_remove(TokenKind::Dedent).is_some() || self.cursor.done() {
                break;
            }
            statements.push(self.parse_statement()?);
        }
        Ok(statements)
    }

    /// Parse a NEWLINE INDENT block holding at least one statement.
    fn parse_block(&mut self, owner: &str) -> Result<Vec<Statement>> {
        let start_span = self.cursor.current_span();
        self.require_newline()?;
        self.expect(TokenKind::Indent, "indented block")?;
        let statements = self.parse_statements()?;
        if statements.is_empty() {
            return Err(Error::syntax(
                format!("{} block must contain at least one statement", owner),
                start_span,
            ));
        }
        Ok(statements)
    }

    fn parse_statement(&mut self) -> Result<Statement> {
        if self.cursor.match_and_remove(TokenKind::If).is_some() {
            self.parse_if().map(Statement::If)
        } else if self.cursor.match_and_remove(TokenKind::Loop).is_some() {
            self.parse_loop().map(Statement::Loop)
        } else if self.cursor.check(TokenKind::Word) {
            self.parse_simple_statement()
        } else {
            Err(self.error("statement"))
        }
    }

    /// Parse `if condition` with its block and optional `else` block.
    fn parse_if(&mut self) -> Result<IfStatement> {
        let start_span = self.cursor.previous_span();
        let condition = self.parse_expression()?;
        let statements = self.parse_block("if")?;

        let else_statements = if self.cursor.match_and_remove(TokenKind::Else).is_some() {
            Some(self.parse_block("else")?)
        } else {
            None
        };

        Ok(IfStatement {
            condition,
            statements,
            else_statements,
            span: start_span.merge(&self.cursor.previous_span()),
        })
    }

    /// Parse `loop [var =] (count.times | condition)` with its block.
    fn parse_loop(&mut self) -> Result<LoopStatement> {
        let start_span = self.cursor.previous_span();

        let variable = if self.cursor.next_two_match(TokenKind::Word, TokenKind::Assign) {
            let token = self.expect(TokenKind::Word, "loop variable")?;
            self.cursor.advance();
            Some(VariableReference::new(token.text, token.span))
        } else {
            None
        };

        let control = if self.at_times_call() {
            let count = match self.cursor.advance() {
                Some(token) if token.kind == TokenKind::Number => {
                    Expression::Number(self.number_literal(&token)?)
                }
                Some(token) => Expression::Variable(VariableReference::new(token.text, token.span)),
                None => return Err(self.error("loop count")),
            };
            // `.times`
            self.cursor.advance();
            self.cursor.advance();
            if self.cursor.match_and_remove(TokenKind::LParen).is_some() {
                self.expect(TokenKind::RParen, "')' after 'times('")?;
            }
            LoopControl::Times(count)
        } else {
            LoopControl::Condition(self.parse_expression()?)
        };

        let statements = self.parse_block("loop")?;
        Ok(LoopStatement {
            variable,
            control,
            statements,
            span: start_span.merge(&self.cursor.previous_span()),
        })
    }

    /// Whether the cursor is at `<number|word>.times`.
    fn at_times_call(&self) -> bool {
        matches!(
            self.cursor.peek_kind(0),
            Some(TokenKind::Number) | Some(TokenKind::Word)
        ) && self.cursor.peek_kind(1) == Some(TokenKind::Dot)
            && self
                .cursor
                .peek(2)
                .is_some_and(|t| t.kind == TokenKind::Word && t.text == "times")
    }

    /// Decide between a bare call, an assignment and a call with result bindings.
    ///
    /// Each tentative production runs against a cursor mark and rewinds on failure.
    fn parse_simple_statement(&mut self) -> Result<Statement> {
        let start_span = self.cursor.current_span();

        // [receiver.]method(args) on its own
        let call_error = match self.attempt(Self::parse_terminated_call) {
            Ok(call) => {
                self.end_of_line()?;
                return Ok(Statement::MethodCall(MethodCallStatement {
                    results: Vec::new(),
                    span: start_span.merge(&call.span),
                    call,
                }));
            }
            Err(err) => err,
        };

        let first = self.parse_variable_reference()?;

        // a, b = [receiver.]method(args)
        if self.cursor.check(TokenKind::Comma) {
            let mut results = vec![first];
            while self.cursor.match_and_remove(TokenKind::Comma).is_some() {
                results.push(self.parse_variable_reference()?);
            }
            self.expect(TokenKind::Assign, "'=' after result variables")?;
            let call = self.parse_method_call()?;
            self.end_of_line()?;
            return Ok(Statement::MethodCall(MethodCallStatement {
                results,
                span: start_span.merge(&call.span),
                call,
            }));
        }

        if self.cursor.match_and_remove(TokenKind::Assign).is_none() {
            return Err(call_error);
        }

        if self.cursor.check(TokenKind::Loop) {
            return Err(Error::syntax(
                "loop is a statement, not an expression",
                self.cursor.current_span(),
            ));
        }

        // x = [receiver.]method(args)
        if let Ok(call) = self.attempt(Self::parse_terminated_call) {
            self.end_of_line()?;
            return Ok(Statement::MethodCall(MethodCallStatement {
                results: vec![first],
                span: start_span.merge(&call.span),
                call,
            }));
        }

        // x = expression
        let expression = self.parse_expression()?;
        self.end_of_line()?;
        Ok(Statement::Assignment(Assignment {
            span: start_span.merge(&expression.span()),
            target: first,
            expression,
        }))
    }

    /// A method call that is the whole remainder of the statement.
    fn parse_terminated_call(&mut self) -> Result<MethodCall> {
        let call = self.parse_method_call()?;
        if !self.at_terminator() {
            return Err(self.error("end of statement"));
        }
        Ok(call)
    }

    /// Run `production`, rewinding the cursor if it fails.
    fn attempt<T>(&mut self, production: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let mark = self.cursor.mark();
        let result = production(self);
        if result.is_err() {
            self.cursor.reset(mark);
        }
        result
    }

    /// Parse `[receiver.]method(args)`.
    fn parse_method_call(&mut self) -> Result<MethodCall> {
        let start_span = self.cursor.current_span();
        let first = self.expect_word("method name")?;
        let (receiver, method) = if self.cursor.match_and_remove(TokenKind::Dot).is_some() {
            (Some(first), self.expect_word("method name after '.'")?)
        } else {
            (None, first)
        };
        self.expect(TokenKind::LParen, "'(' after method name")?;
        let arguments = self.parse_arguments()?;

        Ok(MethodCall {
            receiver,
            method,
            arguments,
            span: start_span.merge(&self.cursor.previous_span()),
        })
    }

    /// Parse a comma-separated argument list through the closing ')'.
    fn parse_arguments(&mut self) -> Result<Vec<Expression>> {
        let mut arguments = Vec::new();
        if self.cursor.match_and_remove(TokenKind::RParen).is_some() {
            return Ok(arguments);
        }
        loop {
            arguments.push(self.parse_expression()?);
            if self.cursor.match_and_remove(TokenKind::Comma).is_none() {
                break;
            }
        }
        self.expect(TokenKind::RParen, "')' after arguments")?;
        Ok(arguments)
    }

    fn parse_variable_reference(&mut self) -> Result<VariableReference> {
        let token = self.expect(TokenKind::Word, "variable name")?;
        Ok(VariableReference::new(token.text, token.span))
    }

    /// Parse an expression.
    pub(crate) fn parse_expression(&mut self) -> Result<Expression> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<Expression> {
        let mut left = self.parse_and()?;
        while self.cursor.match_and_remove(TokenKind::Or).is_some() {
            let right = self.parse_and()?;
            left = boolean_op(left, BooleanOperator::Or, right);
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expression> {
        let mut left = self.parse_not()?;
        while self.cursor.match_and_remove(TokenKind::And).is_some() {
            let right = self.parse_not()?;
            left = boolean_op(left, BooleanOperator::And, right);
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> Result<Expression> {
        if let Some(token) = self.cursor.match_and_remove(TokenKind::Not) {
            let operand = self.parse_not()?;
            let span = token.span.merge(&operand.span());
            return Ok(Expression::BooleanOp {
                left: Box::new(operand),
                op: BooleanOperator::Not,
                right: None,
                span,
            });
        }
        self.parse_comparison()
    }

    /// Comparisons do not chain: `a < b < c` is an error.
    fn parse_comparison(&mut self) -> Result<Expression> {
        let left = self.parse_additive()?;
        let Some(op) = self.compare_operator() else {
            return Ok(left);
        };
        self.cursor.advance();
        let right = self.parse_additive()?;

        if self.compare_operator().is_some() {
            return Err(Error::syntax(
                "comparison operators cannot be chained",
                self.cursor.current_span(),
            ));
        }

        let span = left.span().merge(&right.span());
        Ok(Expression::Compare {
            left: Box::new(left),
            op,
            right: Box::new(right),
            span,
        })
    }

    fn compare_operator(&self) -> Option<CompareOperator> {
        match self.cursor.peek_kind(0)? {
            TokenKind::Equal => Some(CompareOperator::Eq),
            TokenKind::NotEqual => Some(CompareOperator::Ne),
            TokenKind::LessThan => Some(CompareOperator::Lt),
            TokenKind::LessThanEqual => Some(CompareOperator::Le),
            TokenKind::GreaterThan => Some(CompareOperator::Gt),
            TokenKind::GreaterThanEqual => Some(CompareOperator::Ge),
            _ => None,
        }
    }

    fn parse_additive(&mut self) -> Result<Expression> {
        let mut left = self.parse_term()?;
        loop {
            let op = match self.cursor.peek_kind(0) {
                Some(TokenKind::Plus) => MathOperator::Add,
                Some(TokenKind::Minus) => MathOperator::Subtract,
                _ => break,
            };
            self.cursor.advance();
            let right = self.parse_term()?;
            left = math_op(left, op, right);
        }
        Ok(left)
    }

    fn parse_term(&mut self) -> Result<Expression> {
        let mut left = self.parse_factor()?;
        loop {
            let op = match self.cursor.peek_kind(0) {
                Some(TokenKind::Times) => MathOperator::Multiply,
                Some(TokenKind::Divide) => MathOperator::Divide,
                Some(TokenKind::Modulo) => MathOperator::Modulo,
                _ => break,
            };
            self.cursor.advance();
            let right = self.parse_factor()?;
            left = math_op(left, op, right);
        }
        Ok(left)
    }

    /// Parse a literal, parenthesized expression, `new`, method call or variable.
    fn parse_factor(&mut self) -> Result<Expression> {
        let Some(kind) = self.cursor.peek_kind(0) else {
            return Err(self.error("expression"));
        };

        match kind {
            TokenKind::True | TokenKind::False => {
                let span = self.cursor.current_span();
                self.cursor.advance();
                Ok(Expression::Boolean(BooleanLiteral::new(
                    kind == TokenKind::True,
                    span,
                )))
            }
            TokenKind::Number => {
                let token = self.expect(TokenKind::Number, "number")?;
                Ok(Expression::Number(self.number_literal(&token)?))
            }
            TokenKind::QuotedString => {
                let token = self.expect(TokenKind::QuotedString, "string")?;
                Ok(Expression::String(StringLiteral::new(token.text, token.span)))
            }
            TokenKind::QuotedCharacter => {
                let token = self.expect(TokenKind::QuotedCharacter, "character")?;
                let value = token.text.chars().next().ok_or_else(|| {
                    Error::syntax("empty character literal", token.span)
                })?;
                Ok(Expression::Character(CharacterLiteral::new(value, token.span)))
            }
            TokenKind::LParen => {
                self.cursor.advance();
                let expression = self.parse_expression()?;
                self.expect(TokenKind::RParen, "')'")?;
                Ok(expression)
            }
            TokenKind::New => self.parse_new().map(Expression::New),
            TokenKind::Word => {
                if matches!(
                    self.cursor.peek_kind(1),
                    Some(TokenKind::LParen) | Some(TokenKind::Dot)
                ) {
                    self.parse_method_call().map(Expression::MethodCall)
                } else {
                    self.parse_variable_reference().map(Expression::Variable)
                }
            }
            _ => Err(self.error("expression")),
        }
    }

    /// Parse `new ClassName(args)`.
    fn parse_new(&mut self) -> Result<NewExpression> {
        let start_span = self.cursor.current_span();
        self.expect(TokenKind::New, "'new'")?;
        let class_name = self.expect_word("class name after 'new'")?;
        self.expect(TokenKind::LParen, "'(' after class name")?;
        let arguments = self.parse_arguments()?;
        Ok(NewExpression {
            class_name,
            arguments,
            span: start_span.merge(&self.cursor.previous_span()),
        })
    }

    fn number_literal(&self, token: &Token) -> Result<NumberLiteral> {
        let value: f64 = token.text.parse().map_err(|_| {
            Error::syntax(format!("invalid number '{}'", token.text), token.span)
        })?;
        Ok(NumberLiteral::new(value, token.span))
    }

    // Helper methods

    fn error(&self, expected: &str) -> Error {
        Error::syntax(
            format!("expected {}, found {}", expected, self.cursor.describe_current()),
            self.cursor.current_span(),
        )
    }

    fn expect(&mut self, kind: TokenKind, expected: &str) -> Result<Token> {
        match self.cursor.match_and_remove(kind) {
            Some(token) => Ok(token),
            None => Err(self.error(expected)),
        }
    }

    fn expect_word(&mut self, expected: &str) -> Result<Identifier> {
        let token = self.expect(TokenKind::Word, expected)?;
        Ok(Identifier::new(token.text, token.span))
    }

    fn at_terminator(&self) -> bool {
        self.cursor.peek_kind(0).map_or(true, |kind| kind.is_terminator())
    }

    /// One or more NEWLINE tokens.
    fn require_newline(&mut self) -> Result<()> {
        self.expect(TokenKind::Newline, "new line")?;
        self.skip_newlines();
        Ok(())
    }

    /// End of a line: NEWLINEs are consumed, a DEDENT or end of input is left in place.
    fn end_of_line(&mut self) -> Result<()> {
        if self.cursor.check(TokenKind::Newline) {
            self.skip_newlines();
            Ok(())
        } else if self.at_terminator() {
            Ok(())
        } else {
            Err(self.error("new line"))
        }
    }

    fn skip_newlines(&mut self) {
        while self.cursor.match_and_remove(TokenKind::Newline).is_some() {}
    }
}

fn math_op(left: Expression, op: MathOperator, right: Expression) -> Expression {
    let span = left.span().merge(&right.span());
    Expression::MathOp {
        left: Box::new(left),
        op,
        right: Box::new(right),
        span,
    }
}

fn boolean_op(left: Expression, op: BooleanOperator, right: Expression) -> Expression {
    let span: Span = left.span().merge(&right.span());
    Expression::BooleanOp {
        left: Box::new(left),
        op,
        right: Some(Box::new(right)),
        span,
    }
}

/// Parse a token stream into a [`TranUnit`].
pub fn parse(tokens: Vec<Token>) -> Result<TranUnit> {
    Parser::new(tokens).parse()
}
