//! A minimal recursive-descent parser for HULK surface syntax.
//!
//! This exists only so the CLI and the end-to-end tests have real source
//! text to drive into the pipeline — spec.md §1 treats lexing/parsing as
//! external glue, not part of the compiler this crate models. The grammar
//! below is a reduced approximation (no precedence table beyond what's
//! needed for the constructs the other modules actually lower), not a
//! transcription of any particular reference grammar.

pub mod lexer;

use crate::ast::{Declaration, Node, NodeIdAllocator, Param, TypeDeclaration};
use lexer::{Lexer, Spanned, Token};

pub fn parse(src: &str) -> Result<Node, String> {
    let tokens = Lexer::new(src).tokenize();
    let mut parser = Parser {
        tokens,
        pos: 0,
        ids: NodeIdAllocator::new(),
    };
    parser.parse_program()
}

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    ids: NodeIdAllocator,
}

type PResult<T> = Result<T, String>;

impl Parser {
    fn peek(&self) -> &Token {
        &self.tokens[self.pos].token
    }

    fn line(&self) -> u32 {
        self.tokens[self.pos].line
    }

    fn advance(&mut self) -> Token {
        let tok = self.tokens[self.pos].token.clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn check(&self, t: &Token) -> bool {
        self.peek() == t
    }

    fn eat(&mut self, t: &Token) -> PResult<()> {
        if self.check(t) {
            self.advance();
            Ok(())
        } else {
            Err(format!("line {}: expected {:?}, found {:?}", self.line(), t, self.peek()))
        }
    }

    fn eat_identifier(&mut self) -> PResult<String> {
        match self.advance() {
            Token::Identifier(name) => Ok(name),
            other => Err(format!("line {}: expected identifier, found {:?}", self.line(), other)),
        }
    }

    // ---- top level ------------------------------------------------------

    fn parse_program(&mut self) -> PResult<Node> {
        let line = self.line();
        let mut functions = Vec::new();
        let mut types = Vec::new();

        loop {
            match self.peek() {
                Token::Function => functions.push(self.parse_function_decl()?),
                Token::Type => types.push(self.parse_type_decl()?),
                Token::Eof => break,
                _ => break,
            }
        }

        let main = if self.check(&Token::Eof) {
            Node::CompoundInstruction { instructions: Vec::new(), line }
        } else {
            self.parse_statement_sequence()?
        };

        Ok(Node::Program {
            functions,
            types,
            main: Box::new(main),
            line,
        })
    }

    fn parse_param_list(&mut self) -> PResult<Vec<Param>> {
        self.eat(&Token::LParen)?;
        let mut params = Vec::new();
        while !self.check(&Token::RParen) {
            let line = self.line();
            let name = self.eat_identifier()?;
            self.eat(&Token::Colon)?;
            let annotation = self.parse_type_annotation()?;
            params.push(Param { name, annotation, line });
            if self.check(&Token::Comma) {
                self.advance();
            } else {
                break;
            }
        }
        self.eat(&Token::RParen)?;
        Ok(params)
    }

    /// A type annotation is a dotted-free identifier, possibly prefixed by
    /// repeated `[]` to mean `Array_<inner>` (`number[]` -> `Array_number`).
    fn parse_type_annotation(&mut self) -> PResult<String> {
        let base = self.eat_identifier()?;
        let mut annotation = base;
        while self.check(&Token::LBracket) {
            self.advance();
            self.eat(&Token::RBracket)?;
            annotation = format!("Array_{annotation}");
        }
        Ok(annotation)
    }

    fn parse_function_decl(&mut self) -> PResult<Node> {
        let line = self.line();
        self.eat(&Token::Function)?;
        let name = self.eat_identifier()?;
        let params = self.parse_param_list()?;
        self.eat(&Token::Colon)?;
        let return_annotation = self.parse_type_annotation()?;
        let body = if self.check(&Token::Arrow) {
            self.advance();
            let e = self.parse_expression()?;
            self.eat(&Token::Semicolon)?;
            e
        } else {
            self.parse_block()?
        };
        Ok(Node::Function {
            name,
            params,
            return_annotation,
            body: Box::new(body),
            line,
            id: self.ids.next(),
        })
    }

    fn parse_type_decl(&mut self) -> PResult<TypeDeclaration> {
        let line = self.line();
        self.eat(&Token::Type)?;
        let name = self.eat_identifier()?;
        let params = if self.check(&Token::LParen) {
            self.parse_param_list()?
        } else {
            Vec::new()
        };

        let (parent, parent_args) = if self.check(&Token::Inherits) {
            self.advance();
            let pname = self.eat_identifier()?;
            let args = if self.check(&Token::LParen) {
                self.parse_arg_list()?
            } else {
                Vec::new()
            };
            (Some(pname), args)
        } else {
            (None, Vec::new())
        };

        self.eat(&Token::LBrace)?;
        let mut properties = Vec::new();
        let mut methods = Vec::new();
        while !self.check(&Token::RBrace) {
            if self.check(&Token::Function) {
                methods.push(self.parse_function_decl()?);
                continue;
            }
            let pline = self.line();
            let pname = self.eat_identifier()?;
            let annotation = if self.check(&Token::Colon) {
                self.advance();
                Some(self.parse_type_annotation()?)
            } else {
                None
            };
            self.eat(&Token::EqEq)?;
            let init = self.parse_expression()?;
            self.eat(&Token::Semicolon)?;
            properties.push(Declaration {
                name: pname,
                annotation,
                init: Box::new(init),
                line: pline,
            });
        }
        self.eat(&Token::RBrace)?;

        Ok(TypeDeclaration {
            name,
            params,
            parent,
            parent_args,
            properties,
            methods,
            line,
        })
    }

    // ---- statements -------------------------------------------------------

    /// Parses instructions until EOF or a closing brace, joining more than
    /// one into a `CompoundInstruction`.
    fn parse_statement_sequence(&mut self) -> PResult<Node> {
        let line = self.line();
        let mut instructions = Vec::new();
        while !self.check(&Token::Eof) && !self.check(&Token::RBrace) {
            instructions.push(self.parse_statement()?);
        }
        if instructions.len() == 1 {
            Ok(instructions.into_iter().next().unwrap())
        } else {
            Ok(Node::CompoundInstruction { instructions, line })
        }
    }

    fn parse_block(&mut self) -> PResult<Node> {
        self.eat(&Token::LBrace)?;
        let body = self.parse_statement_sequence()?;
        self.eat(&Token::RBrace)?;
        Ok(body)
    }

    fn parse_statement(&mut self) -> PResult<Node> {
        match self.peek() {
            Token::Let => self.parse_let(),
            Token::While => self.parse_while(),
            Token::If => self.parse_if(),
            Token::LBrace => self.parse_block_statement(),
            Token::Return => {
                let line = self.line();
                self.advance();
                let value = if self.check(&Token::Semicolon) {
                    None
                } else {
                    Some(Box::new(self.parse_expression()?))
                };
                self.eat(&Token::Semicolon)?;
                Ok(Node::ReturnStatement { value, line })
            }
            Token::Break => {
                let line = self.line();
                self.advance();
                self.eat(&Token::Semicolon)?;
                Ok(Node::BreakStatement { line })
            }
            Token::Continue => {
                let line = self.line();
                self.advance();
                self.eat(&Token::Semicolon)?;
                Ok(Node::ContinueStatement { line })
            }
            _ => {
                let expr = self.parse_expression()?;
                if self.check(&Token::Semicolon) {
                    self.advance();
                }
                Ok(expr)
            }
        }
    }

    /// A braced block used as a statement returns its contained value
    /// directly; it doesn't require a trailing `;` the way an expression
    /// statement does.
    fn parse_block_statement(&mut self) -> PResult<Node> {
        let result = self.parse_block()?;
        if self.check(&Token::Semicolon) {
            self.advance();
        }
        Ok(result)
    }

    fn parse_let(&mut self) -> PResult<Node> {
        let line = self.line();
        self.eat(&Token::Let)?;
        let mut declarations = Vec::new();
        loop {
            let dline = self.line();
            let name = self.eat_identifier()?;
            let annotation = if self.check(&Token::Colon) {
                self.advance();
                Some(self.parse_type_annotation()?)
            } else {
                None
            };
            self.eat(&Token::EqEq)?;
            let init = self.parse_expression()?;
            declarations.push(Declaration {
                name,
                annotation,
                init: Box::new(init),
                line: dline,
            });
            if self.check(&Token::Comma) {
                self.advance();
            } else {
                break;
            }
        }
        self.eat(&Token::In)?;
        let body = self.parse_statement()?;
        Ok(Node::VarInst {
            declarations,
            body: Box::new(body),
            line,
            id: self.ids.next(),
        })
    }

    fn parse_while(&mut self) -> PResult<Node> {
        let line = self.line();
        self.eat(&Token::While)?;
        self.eat(&Token::LParen)?;
        let condition = self.parse_expression()?;
        self.eat(&Token::RParen)?;
        let body = self.parse_statement()?;
        Ok(Node::WhileLoop {
            condition: Box::new(condition),
            body: Box::new(body),
            line,
        })
    }

    fn parse_if(&mut self) -> PResult<Node> {
        let line = self.line();
        self.eat(&Token::If)?;
        self.eat(&Token::LParen)?;
        let if_condition = self.parse_expression()?;
        self.eat(&Token::RParen)?;
        let if_body = self.parse_statement()?;

        let mut elifs = Vec::new();
        while self.check(&Token::Elif) {
            self.advance();
            self.eat(&Token::LParen)?;
            let cond = self.parse_expression()?;
            self.eat(&Token::RParen)?;
            let body = self.parse_statement()?;
            elifs.push((cond, body));
        }

        let else_body = if self.check(&Token::Else) {
            self.advance();
            self.parse_statement()?
        } else {
            Node::CompoundInstruction { instructions: Vec::new(), line }
        };

        Ok(Node::Conditional {
            if_condition: Box::new(if_condition),
            if_body: Box::new(if_body),
            elifs,
            else_body: Box::new(else_body),
            line,
        })
    }

    // ---- expressions (precedence climbing) --------------------------------

    fn parse_arg_list(&mut self) -> PResult<Vec<Node>> {
        self.eat(&Token::LParen)?;
        let mut args = Vec::new();
        while !self.check(&Token::RParen) {
            args.push(self.parse_expression()?);
            if self.check(&Token::Comma) {
                self.advance();
            } else {
                break;
            }
        }
        self.eat(&Token::RParen)?;
        Ok(args)
    }

    fn parse_expression(&mut self) -> PResult<Node> {
        self.parse_assignment()
    }

    fn parse_assignment(&mut self) -> PResult<Node> {
        let line = self.line();
        let target = self.parse_or()?;
        if self.check(&Token::Assign) {
            self.advance();
            let value = self.parse_assignment()?;
            return Ok(Node::Assignment {
                target: Box::new(target),
                value: Box::new(value),
                line,
            });
        }
        Ok(target)
    }

    fn parse_or(&mut self) -> PResult<Node> {
        let mut left = self.parse_and()?;
        while self.check(&Token::OrOr) {
            let line = self.line();
            self.advance();
            let right = self.parse_and()?;
            left = Node::BinOp { op: "||".to_string(), left: Box::new(left), right: Box::new(right), line };
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> PResult<Node> {
        let mut left = self.parse_equality()?;
        while self.check(&Token::AndAnd) {
            let line = self.line();
            self.advance();
            let right = self.parse_equality()?;
            left = Node::BinOp { op: "&&".to_string(), left: Box::new(left), right: Box::new(right), line };
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> PResult<Node> {
        let mut left = self.parse_relational()?;
        loop {
            let op = match self.peek() {
                Token::EqEq => "==",
                Token::NotEq => "!=",
                _ => break,
            };
            let line = self.line();
            self.advance();
            let right = self.parse_relational()?;
            left = Node::BinOp { op: op.to_string(), left: Box::new(left), right: Box::new(right), line };
        }
        Ok(left)
    }

    fn parse_relational(&mut self) -> PResult<Node> {
        let mut left = self.parse_concat()?;
        loop {
            let op = match self.peek() {
                Token::Lt => "<",
                Token::Le => "<=",
                Token::Gt => ">",
                Token::Ge => ">=",
                _ => break,
            };
            let line = self.line();
            self.advance();
            let right = self.parse_concat()?;
            left = Node::BinOp { op: op.to_string(), left: Box::new(left), right: Box::new(right), line };
        }
        Ok(left)
    }

    fn parse_concat(&mut self) -> PResult<Node> {
        let mut left = self.parse_additive()?;
        loop {
            let is_double = match self.peek() {
                Token::At => false,
                Token::AtAt => true,
                _ => break,
            };
            let line = self.line();
            self.advance();
            let right = self.parse_additive()?;
            left = Node::StrConcat { left: Box::new(left), right: Box::new(right), is_double, line };
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> PResult<Node> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.peek() {
                Token::Plus => "+",
                Token::Minus => "-",
                _ => break,
            };
            let line = self.line();
            self.advance();
            let right = self.parse_multiplicative()?;
            left = Node::BinOp { op: op.to_string(), left: Box::new(left), right: Box::new(right), line };
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> PResult<Node> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Token::Star => "*",
                Token::Slash => "/",
                _ => break,
            };
            let line = self.line();
            self.advance();
            let right = self.parse_unary()?;
            left = Node::BinOp { op: op.to_string(), left: Box::new(left), right: Box::new(right), line };
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> PResult<Node> {
        let line = self.line();
        let op = match self.peek() {
            Token::Minus => Some("-"),
            Token::Plus => Some("+"),
            Token::Bang => Some("!"),
            _ => None,
        };
        if let Some(op) = op {
            self.advance();
            let operand = self.parse_unary()?;
            return Ok(Node::Unary { op: op.to_string(), operand: Box::new(operand), line });
        }
        self.parse_downcast()
    }

    fn parse_downcast(&mut self) -> PResult<Node> {
        let mut expr = self.parse_postfix()?;
        while self.check(&Token::As) {
            let line = self.line();
            self.advance();
            let target_type = self.eat_identifier()?;
            expr = Node::Downcast { expr: Box::new(expr), target_type, line };
        }
        Ok(expr)
    }

    fn parse_postfix(&mut self) -> PResult<Node> {
        let mut expr = self.parse_primary()?;
        loop {
            match self.peek() {
                Token::Dot => {
                    let line = self.line();
                    self.advance();
                    let right = self.parse_primary()?;
                    expr = Node::Access { left: Box::new(expr), right: Box::new(right), line };
                }
                Token::LBracket => {
                    let line = self.line();
                    self.advance();
                    let index = self.parse_expression()?;
                    self.eat(&Token::RBracket)?;
                    expr = Node::ArrayAccess { array: Box::new(expr), index: Box::new(index), line };
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> PResult<Node> {
        let line = self.line();
        match self.peek().clone() {
            Token::Number(n) => {
                self.advance();
                Ok(Node::Number { value: n, line })
            }
            Token::String(s) => {
                self.advance();
                Ok(Node::StringLit { value: s, line })
            }
            Token::True => {
                self.advance();
                Ok(Node::Bool { value: true, line })
            }
            Token::False => {
                self.advance();
                Ok(Node::Bool { value: false, line })
            }
            Token::LParen => {
                self.advance();
                let inner = self.parse_expression()?;
                self.eat(&Token::RParen)?;
                Ok(Node::Grouped { inner: Box::new(inner), line })
            }
            Token::LBracket => {
                self.advance();
                let mut items = Vec::new();
                while !self.check(&Token::RBracket) {
                    items.push(self.parse_expression()?);
                    if self.check(&Token::Comma) {
                        self.advance();
                    } else {
                        break;
                    }
                }
                self.eat(&Token::RBracket)?;
                Ok(Node::ArrayDeclarationExplicit { items, line })
            }
            Token::New => {
                self.advance();
                let type_name = self.eat_identifier()?;
                let args = self.parse_arg_list()?;
                Ok(Node::Instance { type_name, args, line })
            }
            Token::If => self.parse_if(),
            Token::While => self.parse_while(),
            Token::Let => self.parse_let(),
            Token::LBrace => self.parse_block(),
            Token::Identifier(name) => {
                self.advance();
                if self.check(&Token::LParen) {
                    let args = self.parse_arg_list()?;
                    Ok(Node::FunctionCall { name, args, line })
                } else {
                    Ok(Node::Name { name, line })
                }
            }
            other => Err(format!("line {line}: unexpected token {other:?}")),
        }
    }
}
