//! Expression parsing and evaluation
//!
//! Tag parameters such as `user.age >= 18 and admin` are parsed once, when a
//! template is compiled, and evaluated on every render.
//!
//! # Examples
//!
//! ```
//! use tagflow::domain::{Expression, Value};
//! use std::collections::HashMap;
//!
//! let expr = Expression::parse("count > 2 and name == 'ada'").unwrap();
//! let mut vars = HashMap::new();
//! vars.insert("count".to_string(), Value::Int(3));
//! vars.insert("name".to_string(), Value::from("ada"));
//! assert!(expr.evaluate(&vars, false).unwrap().is_truthy());
//! ```

use super::value::{compare, equal, Value};
use crate::error::{Result, TagflowError};
use regex::Regex;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Contains,
}

/// One step of a variable path after its root name
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// `.name`
    Field(String),
    /// `[expr]`
    Index(Box<Expression>),
}

/// A variable reference such as `user.roles[0]`
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    pub root: String,
    pub segments: Vec<Segment>,
}

/// Parsed expression tree
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Literal(Value),
    Variable(Path),
    Compare(Box<Expression>, Comparison, Box<Expression>),
    And(Box<Expression>, Box<Expression>),
    Or(Box<Expression>, Box<Expression>),
    /// Logical negation of the inner expression's truthiness
    Not(Box<Expression>),
}

impl Expression {
    /// Parse expression text
    ///
    /// Operator precedence: comparison > `and` > `or`
    pub fn parse(text: &str) -> Result<Self> {
        let tokens = tokenize(text)?;
        if tokens.is_empty() {
            return Err(TagflowError::expression(text, "empty expression"));
        }

        let mut parser = Parser {
            text,
            tokens: &tokens,
            pos: 0,
        };
        let expr = parser.parse_or()?;

        // Ensure all tokens were consumed
        if parser.pos != tokens.len() {
            return Err(TagflowError::expression(
                text,
                format!("unexpected {} after expression", tokens[parser.pos]),
            ));
        }

        Ok(expr)
    }

    /// Negate the truthiness of an expression
    pub fn negate(expr: Expression) -> Self {
        match expr {
            Expression::Not(inner) => *inner,
            other => Expression::Not(Box::new(other)),
        }
    }

    /// A literal expression that always evaluates to `value`
    pub fn constant(value: impl Into<Value>) -> Self {
        Expression::Literal(value.into())
    }

    /// Evaluate against a variable map
    ///
    /// With `strict` set, a reference to an undefined top-level variable is an
    /// error; otherwise it evaluates to nil.
    pub fn evaluate(&self, vars: &HashMap<String, Value>, strict: bool) -> Result<Value> {
        match self {
            Expression::Literal(value) => Ok(value.clone()),
            Expression::Variable(path) => path.resolve(vars, strict),
            Expression::Compare(left, op, right) => {
                let left = left.evaluate(vars, strict)?;
                let right = right.evaluate(vars, strict)?;
                Ok(Value::Bool(op.apply(&left, &right)))
            }
            Expression::And(left, right) => Ok(Value::Bool(
                left.evaluate(vars, strict)?.is_truthy()
                    && right.evaluate(vars, strict)?.is_truthy(),
            )),
            Expression::Or(left, right) => Ok(Value::Bool(
                left.evaluate(vars, strict)?.is_truthy()
                    || right.evaluate(vars, strict)?.is_truthy(),
            )),
            Expression::Not(inner) => Ok(Value::Bool(!inner.evaluate(vars, strict)?.is_truthy())),
        }
    }
}

impl Comparison {
    fn apply(self, left: &Value, right: &Value) -> bool {
        match self {
            Comparison::Eq => equal(left, right),
            Comparison::Ne => !equal(left, right),
            Comparison::Lt => compare(left, right) == Some(Ordering::Less),
            Comparison::Le => matches!(
                compare(left, right),
                Some(Ordering::Less | Ordering::Equal)
            ),
            Comparison::Gt => compare(left, right) == Some(Ordering::Greater),
            Comparison::Ge => matches!(
                compare(left, right),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            Comparison::Contains => match left {
                Value::String(haystack) => match right {
                    Value::String(needle) => haystack.contains(needle.as_str()),
                    Value::Nil => false,
                    other => haystack.contains(&other.to_string()),
                },
                Value::Array(items) => items.iter().any(|item| equal(item, right)),
                Value::Map(map) => matches!(right, Value::String(key) if map.contains_key(key)),
                _ => false,
            },
        }
    }
}

impl Path {
    fn resolve(&self, vars: &HashMap<String, Value>, strict: bool) -> Result<Value> {
        let mut current = match vars.get(&self.root) {
            Some(value) => value.clone(),
            None if strict => return Err(TagflowError::UndefinedVariable(self.to_string())),
            None => return Ok(Value::Nil),
        };

        for segment in &self.segments {
            current = match segment {
                Segment::Field(name) => current.field(name),
                Segment::Index(key) => current.index(&key.evaluate(vars, strict)?),
            };
        }

        Ok(current)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.root)?;
        for segment in &self.segments {
            match segment {
                Segment::Field(name) => write!(f, ".{}", name)?,
                Segment::Index(key) => write!(f, "[{}]", key)?,
            }
        }
        Ok(())
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Comparison::Eq => "==",
            Comparison::Ne => "!=",
            Comparison::Lt => "<",
            Comparison::Le => "<=",
            Comparison::Gt => ">",
            Comparison::Ge => ">=",
            Comparison::Contains => "contains",
        })
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Literal(Value::String(s)) => write!(f, "{:?}", s),
            Expression::Literal(Value::Nil) => f.write_str("nil"),
            Expression::Literal(value) => write!(f, "{}", value),
            Expression::Variable(path) => write!(f, "{}", path),
            Expression::Compare(left, op, right) => write!(f, "{} {} {}", left, op, right),
            Expression::And(left, right) => write!(f, "{} and {}", left, right),
            Expression::Or(left, right) => write!(f, "({} or {})", left, right),
            Expression::Not(inner) => write!(f, "not ({})", inner),
        }
    }
}

/// Token types for expression parsing
#[derive(Debug, Clone, PartialEq)]
enum Token {
    Literal(Value),
    Ident(String),
    Op(Comparison),
    And,
    Or,
    Dot,
    OpenBracket,
    CloseBracket,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Literal(Value::String(s)) => write!(f, "string {:?}", s),
            Token::Literal(value) => write!(f, "literal '{}'", value),
            Token::Ident(name) => write!(f, "'{}'", name),
            Token::Op(op) => write!(f, "'{}'", op),
            Token::And => f.write_str("'and'"),
            Token::Or => f.write_str("'or'"),
            Token::Dot => f.write_str("'.'"),
            Token::OpenBracket => f.write_str("'['"),
            Token::CloseBracket => f.write_str("']'"),
        }
    }
}

/// Regex matching exactly one token at the start of the input
fn token_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(
            r#"^(?:'(?P<sq>[^']*)'|"(?P<dq>[^"]*)"|(?P<float>-?\d+\.\d+)|(?P<int>-?\d+)|(?P<op>==|!=|<>|<=|>=|<|>)|(?P<punct>[.\[\]])|(?P<ident>[A-Za-z_][\w-]*\??))"#,
        )
        .unwrap()
    })
}

/// Tokenize expression text
fn tokenize(text: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut rest = text.trim_start();

    while !rest.is_empty() {
        let caps = token_regex().captures(rest).ok_or_else(|| {
            let found = rest.chars().next().unwrap_or_default();
            TagflowError::expression(text, format!("unexpected character '{}'", found))
        })?;
        let len = caps.get(0).map_or(0, |m| m.end());

        let token = if let Some(s) = caps.name("sq").or_else(|| caps.name("dq")) {
            Token::Literal(Value::String(s.as_str().to_string()))
        } else if let Some(m) = caps.name("float") {
            let x = m
                .as_str()
                .parse()
                .map_err(|_| TagflowError::expression(text, "invalid number"))?;
            Token::Literal(Value::Float(x))
        } else if let Some(m) = caps.name("int") {
            let i = m
                .as_str()
                .parse()
                .map_err(|_| TagflowError::expression(text, "integer out of range"))?;
            Token::Literal(Value::Int(i))
        } else if let Some(m) = caps.name("op") {
            Token::Op(match m.as_str() {
                "==" => Comparison::Eq,
                "!=" | "<>" => Comparison::Ne,
                "<=" => Comparison::Le,
                ">=" => Comparison::Ge,
                "<" => Comparison::Lt,
                _ => Comparison::Gt,
            })
        } else if let Some(m) = caps.name("punct") {
            match m.as_str() {
                "." => Token::Dot,
                "[" => Token::OpenBracket,
                _ => Token::CloseBracket,
            }
        } else {
            match &caps["ident"] {
                "and" => Token::And,
                "or" => Token::Or,
                "contains" => Token::Op(Comparison::Contains),
                "true" => Token::Literal(Value::Bool(true)),
                "false" => Token::Literal(Value::Bool(false)),
                "nil" | "null" => Token::Literal(Value::Nil),
                ident => Token::Ident(ident.to_string()),
            }
        };

        tokens.push(token);
        rest = rest[len..].trim_start();
    }

    Ok(tokens)
}

struct Parser<'a> {
    text: &'a str,
    tokens: &'a [Token],
    pos: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn error(&self, reason: impl Into<String>) -> TagflowError {
        TagflowError::expression(self.text, reason)
    }

    fn unexpected(&self) -> TagflowError {
        match self.peek() {
            Some(token) => self.error(format!("unexpected {}", token)),
            None => self.error("unexpected end of expression"),
        }
    }

    /// Parse `or` chains (lowest precedence)
    fn parse_or(&mut self) -> Result<Expression> {
        let mut left = self.parse_and()?;
        while matches!(self.peek(), Some(Token::Or)) {
            self.pos += 1; // consume or
            let right = self.parse_and()?;
            left = Expression::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    /// Parse `and` chains
    fn parse_and(&mut self) -> Result<Expression> {
        let mut left = self.parse_comparison()?;
        while matches!(self.peek(), Some(Token::And)) {
            self.pos += 1; // consume and
            let right = self.parse_comparison()?;
            left = Expression::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    /// Parse a single, non-associative comparison
    fn parse_comparison(&mut self) -> Result<Expression> {
        let left = self.parse_operand()?;
        if let Some(Token::Op(op)) = self.peek() {
            let op = *op;
            self.pos += 1;
            let right = self.parse_operand()?;
            return Ok(Expression::Compare(Box::new(left), op, Box::new(right)));
        }
        Ok(left)
    }

    /// Parse literals and variable paths
    fn parse_operand(&mut self) -> Result<Expression> {
        match self.peek() {
            Some(Token::Literal(value)) => {
                let value = value.clone();
                self.pos += 1;
                Ok(Expression::Literal(value))
            }
            Some(Token::Ident(root)) => {
                let root = root.clone();
                self.pos += 1;
                self.parse_path(root)
            }
            _ => Err(self.unexpected()),
        }
    }

    fn parse_path(&mut self, root: String) -> Result<Expression> {
        let mut segments = Vec::new();
        loop {
            match self.peek() {
                Some(Token::Dot) => {
                    self.pos += 1;
                    match self.peek() {
                        Some(Token::Ident(name)) => {
                            segments.push(Segment::Field(name.clone()));
                            self.pos += 1;
                        }
                        _ => return Err(self.unexpected()),
                    }
                }
                Some(Token::OpenBracket) => {
                    self.pos += 1;
                    let key = self.parse_operand()?;
                    if !matches!(self.peek(), Some(Token::CloseBracket)) {
                        return Err(self.unexpected());
                    }
                    self.pos += 1;
                    segments.push(Segment::Index(Box::new(key)));
                }
                _ => break,
            }
        }
        Ok(Expression::Variable(Path { root, segments }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, Value)]) -> HashMap<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn eval(text: &str, vars: &HashMap<String, Value>) -> Value {
        Expression::parse(text).unwrap().evaluate(vars, false).unwrap()
    }

    #[test]
    fn test_parse_literals() {
        assert_eq!(Expression::parse("1").unwrap(), Expression::constant(1i64));
        assert_eq!(
            Expression::parse("-2.5").unwrap(),
            Expression::constant(-2.5)
        );
        assert_eq!(
            Expression::parse("'hi there'").unwrap(),
            Expression::constant("hi there")
        );
        assert_eq!(
            Expression::parse("\"x\"").unwrap(),
            Expression::constant("x")
        );
        assert_eq!(Expression::parse("true").unwrap(), Expression::constant(true));
        assert_eq!(
            Expression::parse("nil").unwrap(),
            Expression::Literal(Value::Nil)
        );
    }

    #[test]
    fn test_parse_path() {
        let expr = Expression::parse("user.roles[0].name").unwrap();
        assert_eq!(expr.to_string(), "user.roles[0].name");
    }

    #[test]
    fn test_precedence() {
        // a or b and c parses as a or (b and c)
        let expr = Expression::parse("a or b and c").unwrap();
        assert!(matches!(expr, Expression::Or(_, _)));
        assert_eq!(expr.to_string(), "(a or b and c)");
    }

    #[test]
    fn test_parse_errors_name_the_text() {
        for text in ["", "a ==", "a b", "user.", "x[1", "a & b", "== 1"] {
            let err = Expression::parse(text).unwrap_err();
            match err {
                TagflowError::Expression { text: t, .. } => assert_eq!(t, text),
                other => panic!("Expected expression error, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_evaluate_comparisons() {
        let v = vars(&[("n", Value::Int(5)), ("s", Value::from("hello"))]);
        assert!(eval("n == 5", &v).is_truthy());
        assert!(eval("n == 5.0", &v).is_truthy());
        assert!(eval("n <> 4", &v).is_truthy());
        assert!(eval("n >= 5", &v).is_truthy());
        assert!(!eval("n < 5", &v).is_truthy());
        assert!(eval("s contains 'ell'", &v).is_truthy());
        assert!(!eval("s > 1", &v).is_truthy());
    }

    #[test]
    fn test_evaluate_contains_collections() {
        let v = vars(&[("list", Value::from(vec![1i64, 2]))]);
        assert!(eval("list contains 2", &v).is_truthy());
        assert!(!eval("list contains 3", &v).is_truthy());
    }

    #[test]
    fn test_evaluate_and_or() {
        let v = vars(&[("t", Value::Bool(true)), ("z", Value::Int(0))]);
        assert!(eval("t and z", &v).is_truthy());
        assert!(eval("missing or t", &v).is_truthy());
        assert!(!eval("missing and t", &v).is_truthy());
    }

    #[test]
    fn test_negate() {
        let v = vars(&[]);
        let not_true = Expression::negate(Expression::constant(true));
        assert_eq!(not_true.evaluate(&v, false).unwrap(), Value::Bool(false));

        let not_nil = Expression::negate(Expression::Literal(Value::Nil));
        assert_eq!(not_nil.evaluate(&v, false).unwrap(), Value::Bool(true));

        // Negating twice restores the original expression
        let expr = Expression::parse("a").unwrap();
        assert_eq!(Expression::negate(Expression::negate(expr.clone())), expr);
    }

    #[test]
    fn test_undefined_variable_lax_and_strict() {
        let expr = Expression::parse("user.name").unwrap();
        let v = vars(&[]);
        assert!(expr.evaluate(&v, false).unwrap().is_nil());
        match expr.evaluate(&v, true).unwrap_err() {
            TagflowError::UndefinedVariable(name) => assert_eq!(name, "user.name"),
            other => panic!("Expected UndefinedVariable, got {:?}", other),
        }
    }

    #[test]
    fn test_index_with_variable_key() {
        let mut map = std::collections::BTreeMap::new();
        map.insert("b".to_string(), Value::Int(7));
        let v = vars(&[("m", Value::Map(map)), ("k", Value::from("b"))]);
        assert_eq!(eval("m[k]", &v), Value::Int(7));
        assert_eq!(eval("m['b']", &v), Value::Int(7));
    }
}
