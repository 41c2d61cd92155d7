//! XPath Parser
//!
//! Recursive descent parser for XPath 1.0 expressions.

use super::lexer::{Lexer, Token};

/// XPath expression AST node
#[derive(Debug, Clone)]
pub enum Expr {
    /// Root path (/)
    Root,
    /// Union of two expressions (|)
    Union(Box<Expr>, Box<Expr>),
    /// Path expression (expr/step)
    Path(Box<Expr>, Box<Step>),
    /// Filter expression with predicate
    Filter(Box<Expr>, Box<Expr>),
    /// Function call
    Function(String, Vec<Expr>),
    /// Binary operation
    Binary(Box<Expr>, BinaryOp, Box<Expr>),
    /// Unary negation
    Negate(Box<Expr>),
    /// Literal number
    Number(f64),
    /// Literal string
    String(String),
    /// Variable reference
    Variable(String),
    /// Location step relative to the context node
    Step(Box<Step>),
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

/// Location step in a path
#[derive(Debug, Clone)]
pub struct Step {
    pub axis: Axis,
    pub node_test: NodeTest,
    pub predicates: Vec<Expr>,
}

impl Step {
    fn new(axis: Axis, node_test: NodeTest) -> Self {
        Step {
            axis,
            node_test,
            predicates: Vec::new(),
        }
    }

    /// `descendant-or-self::node()`, the expansion of `//`
    fn descendant_or_self() -> Self {
        Step::new(Axis::DescendantOrSelf, NodeTest::Node)
    }
}

/// XPath axes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Child,
    Descendant,
    DescendantOrSelf,
    Parent,
    Ancestor,
    AncestorOrSelf,
    FollowingSibling,
    PrecedingSibling,
    Following,
    Preceding,
    Self_,
    Attribute,
    Namespace,
}

impl Axis {
    pub fn from_name(s: &str) -> Option<Self> {
        match s {
            "child" => Some(Axis::Child),
            "descendant" => Some(Axis::Descendant),
            "descendant-or-self" => Some(Axis::DescendantOrSelf),
            "parent" => Some(Axis::Parent),
            "ancestor" => Some(Axis::Ancestor),
            "ancestor-or-self" => Some(Axis::AncestorOrSelf),
            "following-sibling" => Some(Axis::FollowingSibling),
            "preceding-sibling" => Some(Axis::PrecedingSibling),
            "following" => Some(Axis::Following),
            "preceding" => Some(Axis::Preceding),
            "self" => Some(Axis::Self_),
            "attribute" => Some(Axis::Attribute),
            "namespace" => Some(Axis::Namespace),
            _ => None,
        }
    }
}

/// Node test in a location step
#[derive(Debug, Clone, PartialEq)]
pub enum NodeTest {
    /// Any node of the axis' principal type (*)
    Any,
    /// Principal-type node with this name
    Name(String),
    /// prefix:localname
    QName(String, String),
    /// prefix:*
    NamespaceWildcard(String),
    /// node()
    Node,
    /// text()
    Text,
    /// comment()
    Comment,
    /// processing-instruction('target'?)
    ProcessingInstruction(Option<String>),
}

/// XPath parser
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
    peeked: Option<Token>,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str) -> Result<Self, String> {
        let mut lexer = Lexer::new(input);
        let current = lexer.next_token()?;
        Ok(Parser {
            lexer,
            current,
            peeked: None,
        })
    }

    /// Parse a complete XPath expression; trailing tokens are an error
    pub fn parse(&mut self) -> Result<Expr, String> {
        let expr = self.parse_expr()?;
        if self.current != Token::Eof {
            return Err(format!("Unexpected token: {:?}", self.current));
        }
        Ok(expr)
    }

    fn advance(&mut self) -> Result<(), String> {
        self.current = match self.peeked.take() {
            Some(t) => t,
            None => self.lexer.next_token()?,
        };
        Ok(())
    }

    fn peek(&mut self) -> Result<&Token, String> {
        if self.peeked.is_none() {
            self.peeked = Some(self.lexer.next_token()?);
        }
        Ok(self.peeked.get_or_insert(Token::Eof))
    }

    fn expect(&mut self, token: Token, message: &str) -> Result<(), String> {
        if self.current != token {
            return Err(format!("{}, got {:?}", message, self.current));
        }
        self.advance()
    }

    fn parse_expr(&mut self) -> Result<Expr, String> {
        self.parse_or_expr()
    }

    fn parse_or_expr(&mut self) -> Result<Expr, String> {
        let mut left = self.parse_and_expr()?;
        while self.current == Token::Or {
            self.advance()?;
            let right = self.parse_and_expr()?;
            left = Expr::Binary(Box::new(left), BinaryOp::Or, Box::new(right));
        }
        Ok(left)
    }

    fn parse_and_expr(&mut self) -> Result<Expr, String> {
        let mut left = self.parse_equality_expr()?;
        while self.current == Token::And {
            self.advance()?;
            let right = self.parse_equality_expr()?;
            left = Expr::Binary(Box::new(left), BinaryOp::And, Box::new(right));
        }
        Ok(left)
    }

    fn parse_equality_expr(&mut self) -> Result<Expr, String> {
        let mut left = self.parse_relational_expr()?;
        loop {
            let op = match self.current {
                Token::Eq => BinaryOp::Eq,
                Token::NotEq => BinaryOp::NotEq,
                _ => break,
            };
            self.advance()?;
            let right = self.parse_relational_expr()?;
            left = Expr::Binary(Box::new(left), op, Box::new(right));
        }
        Ok(left)
    }

    fn parse_relational_expr(&mut self) -> Result<Expr, String> {
        let mut left = self.parse_additive_expr()?;
        loop {
            let op = match self.current {
                Token::Lt => BinaryOp::Lt,
                Token::LtEq => BinaryOp::LtEq,
                Token::Gt => BinaryOp::Gt,
                Token::GtEq => BinaryOp::GtEq,
                _ => break,
            };
            self.advance()?;
            let right = self.parse_additive_expr()?;
            left = Expr::Binary(Box::new(left), op, Box::new(right));
        }
        Ok(left)
    }

    fn parse_additive_expr(&mut self) -> Result<Expr, String> {
        let mut left = self.parse_multiplicative_expr()?;
        loop {
            let op = match self.current {
                Token::Plus => BinaryOp::Add,
                Token::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.advance()?;
            let right = self.parse_multiplicative_expr()?;
            left = Expr::Binary(Box::new(left), op, Box::new(right));
        }
        Ok(left)
    }

    fn parse_multiplicative_expr(&mut self) -> Result<Expr, String> {
        let mut left = self.parse_unary_expr()?;
        loop {
            let op = match self.current {
                Token::Star => BinaryOp::Mul,
                Token::Div => BinaryOp::Div,
                Token::Mod => BinaryOp::Mod,
                _ => break,
            };
            self.advance()?;
            let right = self.parse_unary_expr()?;
            left = Expr::Binary(Box::new(left), op, Box::new(right));
        }
        Ok(left)
    }

    fn parse_unary_expr(&mut self) -> Result<Expr, String> {
        if self.current == Token::Minus {
            self.advance()?;
            let expr = self.parse_unary_expr()?;
            Ok(Expr::Negate(Box::new(expr)))
        } else {
            self.parse_union_expr()
        }
    }

    fn parse_union_expr(&mut self) -> Result<Expr, String> {
        let mut left = self.parse_path_expr()?;
        while self.current == Token::Pipe {
            self.advance()?;
            let right = self.parse_path_expr()?;
            left = Expr::Union(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    /// Whether the current token can begin a location step
    fn at_step_start(&self) -> bool {
        matches!(
            self.current,
            Token::Name(_)
                | Token::NameTest(_)
                | Token::NodeType(_)
                | Token::Star
                | Token::At
                | Token::Axis(_)
                | Token::Dot
                | Token::DoubleDot
        )
    }

    fn parse_path_expr(&mut self) -> Result<Expr, String> {
        let expr = match self.current {
            Token::Slash => {
                self.advance()?;
                if !self.at_step_start() {
                    return Ok(Expr::Root);
                }
                let step = self.parse_step()?;
                Expr::Path(Box::new(Expr::Root), Box::new(step))
            }
            Token::DoubleSlash => {
                self.advance()?;
                let step = self.parse_step()?;
                Expr::Path(
                    Box::new(Expr::Path(
                        Box::new(Expr::Root),
                        Box::new(Step::descendant_or_self()),
                    )),
                    Box::new(step),
                )
            }
            _ => self.parse_filter_expr()?,
        };
        self.parse_path_continuation(expr)
    }

    /// `/step` and `//step` after a path start or filter expression
    fn parse_path_continuation(&mut self, mut expr: Expr) -> Result<Expr, String> {
        loop {
            match self.current {
                Token::Slash => {
                    self.advance()?;
                    let step = self.parse_step()?;
                    expr = Expr::Path(Box::new(expr), Box::new(step));
                }
                Token::DoubleSlash => {
                    self.advance()?;
                    let step = self.parse_step()?;
                    expr = Expr::Path(
                        Box::new(Expr::Path(Box::new(expr), Box::new(Step::descendant_or_self()))),
                        Box::new(step),
                    );
                }
                _ => return Ok(expr),
            }
        }
    }

    /// Primary expression followed by any predicates, or a relative
    /// location path
    fn parse_filter_expr(&mut self) -> Result<Expr, String> {
        if self.at_step_start() && !self.at_function_call()? {
            let step = self.parse_step()?;
            return Ok(Expr::Step(Box::new(step)));
        }

        let mut expr = self.parse_primary_expr()?;
        while self.current == Token::LeftBracket {
            self.advance()?;
            let pred = self.parse_expr()?;
            self.expect(Token::RightBracket, "Expected ]")?;
            expr = Expr::Filter(Box::new(expr), Box::new(pred));
        }
        Ok(expr)
    }

    fn at_function_call(&mut self) -> Result<bool, String> {
        if !matches!(self.current, Token::Name(_)) {
            return Ok(false);
        }
        Ok(matches!(self.peek()?, Token::LeftParen))
    }

    fn parse_primary_expr(&mut self) -> Result<Expr, String> {
        match &self.current {
            Token::Number(n) => {
                let n = *n;
                self.advance()?;
                Ok(Expr::Number(n))
            }
            Token::String(s) => {
                let s = s.clone();
                self.advance()?;
                Ok(Expr::String(s))
            }
            Token::Dollar => {
                self.advance()?;
                match &self.current {
                    Token::Name(name) => {
                        let name = name.clone();
                        self.advance()?;
                        Ok(Expr::Variable(name))
                    }
                    _ => Err("Expected variable name".to_string()),
                }
            }
            Token::LeftParen => {
                self.advance()?;
                let expr = self.parse_expr()?;
                self.expect(Token::RightParen, "Expected )")?;
                Ok(expr)
            }
            Token::Name(name) => {
                let name = name.clone();
                self.advance()?;
                self.expect(Token::LeftParen, "Expected (")?;
                let args = self.parse_function_args()?;
                Ok(Expr::Function(name, args))
            }
            other => Err(format!("Unexpected token: {:?}", other)),
        }
    }

    fn parse_step(&mut self) -> Result<Step, String> {
        match self.current {
            Token::Dot => {
                self.advance()?;
                return Ok(Step::new(Axis::Self_, NodeTest::Node));
            }
            Token::DoubleDot => {
                self.advance()?;
                return Ok(Step::new(Axis::Parent, NodeTest::Node));
            }
            _ => {}
        }

        let mut axis = Axis::Child;
        if self.current == Token::At {
            axis = Axis::Attribute;
            self.advance()?;
        } else if let Token::Axis(axis_name) = &self.current {
            axis = Axis::from_name(axis_name)
                .ok_or_else(|| format!("Unknown axis: {}", axis_name))?;
            self.advance()?;
            self.expect(Token::DoubleColon, "Expected :: after axis")?;
        }

        let node_test = match &self.current {
            Token::Star => {
                self.advance()?;
                NodeTest::Any
            }
            Token::Name(name) => {
                let name = name.clone();
                self.advance()?;
                NodeTest::Name(name)
            }
            Token::NameTest(qname) => {
                let qname = qname.clone();
                self.advance()?;
                match qname.split_once(':') {
                    Some((prefix, "*")) => NodeTest::NamespaceWildcard(prefix.to_string()),
                    Some((prefix, local)) => NodeTest::QName(prefix.to_string(), local.to_string()),
                    None => NodeTest::Name(qname),
                }
            }
            Token::NodeType(name) => {
                let name = name.clone();
                self.advance()?;
                self.expect(Token::LeftParen, "Expected (")?;
                let arg = match &self.current {
                    Token::String(s) if name == "processing-instruction" => {
                        let s = s.clone();
                        self.advance()?;
                        Some(s)
                    }
                    _ => None,
                };
                self.expect(Token::RightParen, "Expected )")?;
                match name.as_str() {
                    "node" => NodeTest::Node,
                    "text" => NodeTest::Text,
                    "comment" => NodeTest::Comment,
                    _ => NodeTest::ProcessingInstruction(arg),
                }
            }
            other => return Err(format!("Expected node test, got {:?}", other)),
        };

        let mut predicates = Vec::new();
        while self.current == Token::LeftBracket {
            self.advance()?;
            predicates.push(self.parse_expr()?);
            self.expect(Token::RightBracket, "Expected ]")?;
        }

        Ok(Step {
            axis,
            node_test,
            predicates,
        })
    }

    fn parse_function_args(&mut self) -> Result<Vec<Expr>, String> {
        let mut args = Vec::new();
        if self.current != Token::RightParen {
            args.push(self.parse_expr()?);
            while self.current == Token::Comma {
                self.advance()?;
                args.push(self.parse_expr()?);
            }
        }
        self.expect(Token::RightParen, "Expected )")?;
        Ok(args)
    }
}

/// Parse an XPath expression string
pub fn parse(input: &str) -> Result<Expr, String> {
    Parser::new(input)?.parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_path() {
        let expr = parse("/root/child").unwrap();
        assert!(matches!(expr, Expr::Path(..)));
    }

    #[test]
    fn test_step_predicates_stay_on_step() {
        match parse("item[@id='test'][2]").unwrap() {
            Expr::Step(step) => {
                assert_eq!(step.node_test, NodeTest::Name("item".to_string()));
                assert_eq!(step.predicates.len(), 2);
            }
            other => panic!("expected step, got {other:?}"),
        }
    }

    #[test]
    fn test_descendant() {
        let expr = parse("//item").unwrap();
        assert!(matches!(expr, Expr::Path(..)));
    }

    #[test]
    fn test_function() {
        let expr = parse("count(//item)").unwrap();
        assert!(matches!(expr, Expr::Function(name, _) if name == "count"));
    }

    #[test]
    fn test_filter_expression() {
        let expr = parse("(//a | //b)[1]").unwrap();
        assert!(matches!(expr, Expr::Filter(..)));
    }

    #[test]
    fn test_qname_and_dots() {
        assert!(parse("descendant-or-self::svg:rect/../svg:*").is_ok());
        assert!(parse("./li/text()").is_ok());
        assert!(parse("/").is_ok());
    }

    #[test]
    fn test_errors() {
        for input in ["", "li item", "a[", "foo(", "@", "child::", "bogus::a", "1 +"] {
            assert!(parse(input).is_err(), "expected error for {input:?}");
        }
    }
}
