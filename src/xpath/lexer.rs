//! XPath Lexer
//!
//! Tokenizes XPath expressions into tokens. `*` and the operator names
//! `and`, `or`, `div`, `mod` are only operators where an operator is
//! expected: after a token that can end an operand. Elsewhere they are name
//! tests, so `//div` selects `div` elements.

/// XPath token types
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Operators
    Slash,       // /
    DoubleSlash, // //
    Dot,         // .
    DoubleDot,   // ..
    At,          // @
    Pipe,        // |
    Plus,        // +
    Minus,       // -
    Star,        // * (multiply or wildcard, by position)
    Eq,          // =
    NotEq,       // !=
    Lt,          // <
    LtEq,        // <=
    Gt,          // >
    GtEq,        // >=
    And,         // and
    Or,          // or
    Mod,         // mod
    Div,         // div

    // Brackets
    LeftParen,    // (
    RightParen,   // )
    LeftBracket,  // [
    RightBracket, // ]

    // Literals
    Number(f64),
    String(String),

    // Names
    Name(String),     // NCName
    NameTest(String), // prefix:* or prefix:local
    NodeType(String), // node, text, comment, processing-instruction (before '(')

    // Axis
    Axis(String), // child, descendant, etc. (before '::')

    // Special
    DoubleColon, // ::
    Comma,       // ,
    Dollar,      // $

    // End of input
    Eof,
}

impl Token {
    /// Whether the next `*` or operator name is an operator after this token
    fn ends_operand(&self) -> bool {
        matches!(
            self,
            Token::RightParen
                | Token::RightBracket
                | Token::Dot
                | Token::DoubleDot
                | Token::Number(_)
                | Token::String(_)
                | Token::Name(_)
                | Token::NameTest(_)
        )
    }
}

/// XPath lexer
pub struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    /// True when the previous token ends an operand
    operator_expected: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Lexer {
            input,
            pos: 0,
            operator_expected: false,
        }
    }

    fn remaining(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.remaining().chars().nth(offset)
    }

    fn advance(&mut self, n: usize) {
        self.pos = (self.pos + n).min(self.input.len());
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.advance(c.len_utf8());
            } else {
                break;
            }
        }
    }

    /// Get the next token
    pub fn next_token(&mut self) -> Result<Token, String> {
        let token = self.lex()?;
        // A wildcard `*` ends an operand; a multiplication `*` does not
        self.operator_expected = match token {
            Token::Star => !self.operator_expected,
            ref t => t.ends_operand(),
        };
        Ok(token)
    }

    fn lex(&mut self) -> Result<Token, String> {
        self.skip_whitespace();

        let Some(c) = self.peek() else {
            return Ok(Token::Eof);
        };

        let token = match c {
            '/' => {
                self.advance(1);
                if self.peek() == Some('/') {
                    self.advance(1);
                    Token::DoubleSlash
                } else {
                    Token::Slash
                }
            }
            '.' => {
                if self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
                    return Ok(self.read_number());
                }
                self.advance(1);
                if self.peek() == Some('.') {
                    self.advance(1);
                    Token::DoubleDot
                } else {
                    Token::Dot
                }
            }
            '@' => self.single(Token::At),
            '|' => self.single(Token::Pipe),
            '+' => self.single(Token::Plus),
            '-' => self.single(Token::Minus),
            '*' => self.single(Token::Star),
            '=' => self.single(Token::Eq),
            '(' => self.single(Token::LeftParen),
            ')' => self.single(Token::RightParen),
            '[' => self.single(Token::LeftBracket),
            ']' => self.single(Token::RightBracket),
            ',' => self.single(Token::Comma),
            '$' => self.single(Token::Dollar),
            '!' => {
                if self.peek_at(1) != Some('=') {
                    return Err(format!("Unexpected character '!' at {}", self.pos));
                }
                self.advance(2);
                Token::NotEq
            }
            '<' => {
                self.advance(1);
                if self.peek() == Some('=') {
                    self.advance(1);
                    Token::LtEq
                } else {
                    Token::Lt
                }
            }
            '>' => {
                self.advance(1);
                if self.peek() == Some('=') {
                    self.advance(1);
                    Token::GtEq
                } else {
                    Token::Gt
                }
            }
            ':' => {
                if self.peek_at(1) != Some(':') {
                    return Err(format!("Unexpected character ':' at {}", self.pos));
                }
                self.advance(2);
                Token::DoubleColon
            }
            '"' | '\'' => self.read_string(c)?,
            '0'..='9' => self.read_number(),
            _ if is_name_start_char(c) => self.read_name_or_keyword(),
            _ => return Err(format!("Unexpected character '{}' at {}", c, self.pos)),
        };
        Ok(token)
    }

    fn single(&mut self, token: Token) -> Token {
        self.advance(1);
        token
    }

    fn read_number(&mut self) -> Token {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance(1);
        }
        if self.peek() == Some('.') {
            self.advance(1);
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.advance(1);
            }
        }
        let value = self.input[start..self.pos].parse().unwrap_or(f64::NAN);
        Token::Number(value)
    }

    fn read_string(&mut self, quote: char) -> Result<Token, String> {
        let open = self.pos;
        self.advance(1);
        let start = self.pos;
        let len = self
            .remaining()
            .find(quote)
            .ok_or_else(|| format!("Unterminated string literal at {}", open))?;
        let value = self.input[start..start + len].to_string();
        self.advance(len + 1);
        Ok(Token::String(value))
    }

    fn read_ncname(&mut self) -> &'a str {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if is_name_char(c) {
                self.advance(c.len_utf8());
            } else {
                break;
            }
        }
        &self.input[start..self.pos]
    }

    fn read_name_or_keyword(&mut self) -> Token {
        let name = self.read_ncname();

        if self.operator_expected {
            match name {
                "and" => return Token::And,
                "or" => return Token::Or,
                "mod" => return Token::Mod,
                "div" => return Token::Div,
                _ => {}
            }
        }

        // prefix:local or prefix:*
        if self.peek() == Some(':') && self.peek_at(1) != Some(':') {
            if self.peek_at(1) == Some('*') {
                self.advance(2);
                return Token::NameTest(format!("{}:*", name));
            }
            if self.peek_at(1).is_some_and(is_name_start_char) {
                self.advance(1);
                let local = self.read_ncname();
                return Token::NameTest(format!("{}:{}", name, local));
            }
        }

        // Lookahead past whitespace for '::' (axis) or '(' (function or node type)
        let after = self.remaining().trim_start();
        if after.starts_with("::") {
            Token::Axis(name.to_string())
        } else if after.starts_with('(') {
            match name {
                "node" | "text" | "comment" | "processing-instruction" => {
                    Token::NodeType(name.to_string())
                }
                _ => Token::Name(name.to_string()),
            }
        } else {
            Token::Name(name.to_string())
        }
    }

    /// Tokenize entire input
    pub fn tokenize(&mut self) -> Result<Vec<Token>, String> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            if token == Token::Eof {
                break;
            }
            tokens.push(token);
        }
        Ok(tokens)
    }
}

fn is_name_start_char(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-' || c == '.'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &str) -> Vec<Token> {
        Lexer::new(input).tokenize().unwrap()
    }

    fn name(s: &str) -> Token {
        Token::Name(s.to_string())
    }

    #[test]
    fn test_simple_path() {
        assert_eq!(
            tokens("/root/child"),
            vec![Token::Slash, name("root"), Token::Slash, name("child")]
        );
    }

    #[test]
    fn test_predicate() {
        assert_eq!(
            tokens("item[@id='test']"),
            vec![
                name("item"),
                Token::LeftBracket,
                Token::At,
                name("id"),
                Token::Eq,
                Token::String("test".to_string()),
                Token::RightBracket,
            ]
        );
    }

    #[test]
    fn test_axis_and_qname() {
        assert_eq!(
            tokens("descendant-or-self::svg:rect"),
            vec![
                Token::Axis("descendant-or-self".to_string()),
                Token::DoubleColon,
                Token::NameTest("svg:rect".to_string()),
            ]
        );
    }

    #[test]
    fn test_operator_names_by_position() {
        assert_eq!(tokens("//div"), vec![Token::DoubleSlash, name("div")]);
        assert_eq!(
            tokens("div div div"),
            vec![name("div"), Token::Div, name("div")]
        );
        assert_eq!(
            tokens("a and not(or)"),
            vec![
                name("a"),
                Token::And,
                name("not"),
                Token::LeftParen,
                name("or"),
                Token::RightParen,
            ]
        );
    }

    #[test]
    fn test_star_disambiguation() {
        assert_eq!(
            tokens("* * 2"),
            vec![Token::Star, Token::Star, Token::Number(2.0)]
        );
        let mut lexer = Lexer::new("2 * and");
        lexer.next_token().unwrap();
        lexer.next_token().unwrap();
        // after a multiplication operator, 'and' is a name
        assert_eq!(lexer.next_token().unwrap(), name("and"));
    }

    #[test]
    fn test_numbers() {
        assert_eq!(tokens(".5"), vec![Token::Number(0.5)]);
        assert_eq!(tokens("3.25"), vec![Token::Number(3.25)]);
    }

    #[test]
    fn test_errors() {
        assert!(Lexer::new("'open").tokenize().is_err());
        assert!(Lexer::new("a # b").tokenize().is_err());
    }
}
