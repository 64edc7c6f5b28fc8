//! Hand-rolled tokenizer for the bundled recursive-descent parser. Grounded
//! in the token set implied by `examples/original_source/src/lexer.py`'s
//! grammar, not reproduced literally (out of scope per spec.md §1 — this
//! exists only so the CLI has something runnable to feed the core
//! pipeline).

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Let,
    In,
    Function,
    Type,
    Inherits,
    If,
    Elif,
    Else,
    While,
    New,
    As,
    Return,
    Break,
    Continue,
    True,
    False,
    Number(f64),
    String(String),
    Identifier(String),
    Arrow,
    Colon,
    Comma,
    Semicolon,
    Dot,
    Assign,
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Plus,
    Minus,
    Star,
    Slash,
    EqEq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    AndAnd,
    OrOr,
    Bang,
    At,
    AtAt,
    Eof,
}

#[derive(Debug, Clone)]
pub struct Spanned {
    pub token: Token,
    pub line: u32,
}

pub struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    line: u32,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Lexer {
            chars: src.chars().peekable(),
            line: 1,
        }
    }

    pub fn tokenize(mut self) -> Vec<Spanned> {
        let mut out = Vec::new();
        loop {
            let spanned = self.next_token();
            let is_eof = spanned.token == Token::Eof;
            out.push(spanned);
            if is_eof {
                break;
            }
        }
        out
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next();
        if c == Some('\n') {
            self.line += 1;
        }
        c
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('/') => {
                    let mut clone = self.chars.clone();
                    clone.next();
                    if clone.peek() == Some(&'/') {
                        while let Some(c) = self.peek() {
                            if c == '\n' {
                                break;
                            }
                            self.bump();
                        }
                    } else {
                        break;
                    }
                }
                _ => break,
            }
        }
    }

    fn next_token(&mut self) -> Spanned {
        self.skip_trivia();
        let line = self.line;
        let Some(c) = self.peek() else {
            return Spanned { token: Token::Eof, line };
        };

        if c.is_ascii_digit() {
            return Spanned { token: self.lex_number(), line };
        }
        if c.is_alphabetic() || c == '_' {
            return Spanned { token: self.lex_identifier(), line };
        }
        if c == '"' {
            return Spanned { token: self.lex_string(), line };
        }

        self.bump();
        let token = match c {
            '+' => Token::Plus,
            '-' => {
                if self.peek() == Some('>') {
                    self.bump();
                    Token::Arrow
                } else {
                    Token::Minus
                }
            }
            '*' => Token::Star,
            '/' => Token::Slash,
            '(' => Token::LParen,
            ')' => Token::RParen,
            '{' => Token::LBrace,
            '}' => Token::RBrace,
            '[' => Token::LBracket,
            ']' => Token::RBracket,
            ',' => Token::Comma,
            ';' => Token::Semicolon,
            '.' => Token::Dot,
            '!' => {
                if self.peek() == Some('=') {
                    self.bump();
                    Token::NotEq
                } else {
                    Token::Bang
                }
            }
            '=' => {
                if self.peek() == Some('=') {
                    self.bump();
                    Token::EqEq
                } else if self.peek() == Some('>') {
                    self.bump();
                    Token::Arrow
                } else {
                    Token::EqEq
                }
            }
            ':' => {
                if self.peek() == Some('=') {
                    self.bump();
                    Token::Assign
                } else {
                    Token::Colon
                }
            }
            '<' => {
                if self.peek() == Some('=') {
                    self.bump();
                    Token::Le
                } else {
                    Token::Lt
                }
            }
            '>' => {
                if self.peek() == Some('=') {
                    self.bump();
                    Token::Ge
                } else {
                    Token::Gt
                }
            }
            '&' => {
                if self.peek() == Some('&') {
                    self.bump();
                }
                Token::AndAnd
            }
            '|' => {
                if self.peek() == Some('|') {
                    self.bump();
                }
                Token::OrOr
            }
            '@' => {
                if self.peek() == Some('@') {
                    self.bump();
                    Token::AtAt
                } else {
                    Token::At
                }
            }
            other => panic!("unexpected character '{other}' at line {line}"),
        };
        Spanned { token, line }
    }

    fn lex_number(&mut self) -> Token {
        let mut s = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() || c == '.' {
                s.push(c);
                self.bump();
            } else {
                break;
            }
        }
        Token::Number(s.parse().unwrap_or(0.0))
    }

    fn lex_identifier(&mut self) -> Token {
        let mut s = String::new();
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                s.push(c);
                self.bump();
            } else {
                break;
            }
        }
        match s.as_str() {
            "let" => Token::Let,
            "in" => Token::In,
            "function" => Token::Function,
            "type" => Token::Type,
            "inherits" => Token::Inherits,
            "if" => Token::If,
            "elif" => Token::Elif,
            "else" => Token::Else,
            "while" => Token::While,
            "new" => Token::New,
            "as" => Token::As,
            "return" => Token::Return,
            "break" => Token::Break,
            "continue" => Token::Continue,
            "true" => Token::True,
            "false" => Token::False,
            _ => Token::Identifier(s),
        }
    }

    fn lex_string(&mut self) -> Token {
        self.bump();
        let mut s = String::new();
        while let Some(c) = self.peek() {
            if c == '"' {
                self.bump();
                break;
            }
            if c == '\\' {
                self.bump();
                match self.peek() {
                    Some('n') => {
                        s.push('\n');
                        self.bump();
                    }
                    Some('"') => {
                        s.push('"');
                        self.bump();
                    }
                    Some(other) => {
                        s.push(other);
                        self.bump();
                    }
                    None => {}
                }
                continue;
            }
            s.push(c);
            self.bump();
        }
        Token::String(s)
    }
}
