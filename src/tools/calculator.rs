//! Arithmetic calculator tool.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{parse_args, Invoke, Tool, ToolArgs, ToolError, ToolProvider, ToolRegistry};

/// Deepest allowed nesting of parentheses, unary signs and exponents.
const MAX_DEPTH: usize = 256;

/// Registers [`Calculator`].
pub struct CalculatorTools;

impl ToolProvider for CalculatorTools {
    fn name(&self) -> &str {
        "calculator"
    }

    fn register(&self, registry: &mut ToolRegistry) {
        registry.register_tool(Calculator);
    }
}

/// Evaluate a math expression over a fixed set of functions and constants.
pub struct Calculator;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CalculatorArgs {
    expression: String,
}

#[async_trait]
impl Invoke for Calculator {
    async fn invoke(&self, args: &ToolArgs) -> Result<String, ToolError> {
        let args: CalculatorArgs = parse_args(args)?;
        let value = evaluate(&args.expression)?;
        Ok(format_number(value))
    }
}

impl Tool for Calculator {
    fn name(&self) -> &str {
        "calculator"
    }

    fn description(&self) -> &str {
        "Safe math calculator (supports + - * / % ** and sqrt, sin, cos, log, pi, e ...). \
         Works in floating point; integral results print without a fraction"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "expression": {
                    "type": "string",
                    "description": "Expression to evaluate, e.g. 'sin(pi/6)+sqrt(2)'"
                }
            },
            "required": ["expression"]
        })
    }
}

/// Evaluate `expr`, rejecting any name outside the allowed set.
pub fn evaluate(expr: &str) -> anyhow::Result<f64> {
    let tokens = tokenize(expr)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let value = parser.expr()?;
    if let Some(tok) = parser.peek() {
        anyhow::bail!("unexpected token {:?} in expression", tok);
    }
    if value.is_nan() {
        anyhow::bail!("math domain error");
    }
    Ok(value)
}

fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Num(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Pow,
    LParen,
    RParen,
    Comma,
}

fn tokenize(expr: &str) -> anyhow::Result<Vec<Token>> {
    let chars: Vec<char> = expr.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            ' ' | '\t' | '\n' | '\r' => {
                i += 1;
            }
            '0'..='9' | '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                // exponent suffix: 1e3, 2.5E-4
                if i < chars.len() && (chars[i] == 'e' || chars[i] == 'E') {
                    let mut j = i + 1;
                    if j < chars.len() && (chars[j] == '+' || chars[j] == '-') {
                        j += 1;
                    }
                    if j < chars.len() && chars[j].is_ascii_digit() {
                        while j < chars.len() && chars[j].is_ascii_digit() {
                            j += 1;
                        }
                        i = j;
                    }
                }
                let literal: String = chars[start..i].iter().collect();
                let value = literal
                    .parse::<f64>()
                    .map_err(|_| anyhow::anyhow!("invalid number: {}", literal))?;
                tokens.push(Token::Num(value));
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                tokens.push(Token::Ident(chars[start..i].iter().collect()));
            }
            '*' if chars.get(i + 1) == Some(&'*') => {
                tokens.push(Token::Pow);
                i += 2;
            }
            _ => {
                let tok = match c {
                    '+' => Token::Plus,
                    '-' => Token::Minus,
                    '*' => Token::Star,
                    '/' => Token::Slash,
                    '%' => Token::Percent,
                    '^' => Token::Pow,
                    '(' => Token::LParen,
                    ')' => Token::RParen,
                    ',' => Token::Comma,
                    other => anyhow::bail!("invalid character {:?} in expression", other),
                };
                tokens.push(tok);
                i += 1;
            }
        }
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        tok
    }

    fn expect(&mut self, expected: Token) -> anyhow::Result<()> {
        match self.advance() {
            Some(tok) if tok == expected => Ok(()),
            Some(tok) => anyhow::bail!("expected {:?}, found {:?}", expected, tok),
            None => anyhow::bail!("expected {:?}, found end of expression", expected),
        }
    }

    // expr := term (('+' | '-') term)*
    fn expr(&mut self) -> anyhow::Result<f64> {
        let mut value = self.term()?;
        loop {
            match self.peek() {
                Some(Token::Plus) => {
                    self.pos += 1;
                    value += self.term()?;
                }
                Some(Token::Minus) => {
                    self.pos += 1;
                    value -= self.term()?;
                }
                _ => return Ok(value),
            }
        }
    }

    // term := unary (('*' | '/' | '%') unary)*
    fn term(&mut self) -> anyhow::Result<f64> {
        let mut value = self.unary()?;
        loop {
            match self.peek() {
                Some(Token::Star) => {
                    self.pos += 1;
                    value *= self.unary()?;
                }
                Some(Token::Slash) => {
                    self.pos += 1;
                    let rhs = self.unary()?;
                    if rhs == 0.0 {
                        anyhow::bail!("division by zero");
                    }
                    value /= rhs;
                }
                Some(Token::Percent) => {
                    self.pos += 1;
                    let rhs = self.unary()?;
                    if rhs == 0.0 {
                        anyhow::bail!("modulo by zero");
                    }
                    value = floor_mod(value, rhs);
                }
                _ => return Ok(value),
            }
        }
    }

    // unary := ('-' | '+') unary | power
    // all recursion passes through here
    fn unary(&mut self) -> anyhow::Result<f64> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            anyhow::bail!("expression nested too deeply");
        }
        let value = self.signed();
        self.depth -= 1;
        value
    }

    fn signed(&mut self) -> anyhow::Result<f64> {
        match self.peek() {
            Some(Token::Minus) => {
                self.pos += 1;
                Ok(-self.unary()?)
            }
            Some(Token::Plus) => {
                self.pos += 1;
                self.unary()
            }
            _ => self.power(),
        }
    }

    // power := primary ('**' unary)?, right associative
    fn power(&mut self) -> anyhow::Result<f64> {
        let base = self.primary()?;
        if self.peek() == Some(&Token::Pow) {
            self.pos += 1;
            let exponent = self.unary()?;
            return Ok(base.powf(exponent));
        }
        Ok(base)
    }

    fn primary(&mut self) -> anyhow::Result<f64> {
        match self.advance() {
            Some(Token::Num(v)) => Ok(v),
            Some(Token::LParen) => {
                let value = self.expr()?;
                self.expect(Token::RParen)?;
                Ok(value)
            }
            Some(Token::Ident(name)) => {
                if self.peek() == Some(&Token::LParen) {
                    self.pos += 1;
                    let args = self.call_args()?;
                    call(&name, &args)
                } else {
                    constant(&name)
                }
            }
            Some(tok) => anyhow::bail!("unexpected token {:?}", tok),
            None => anyhow::bail!("unexpected end of expression"),
        }
    }

    fn call_args(&mut self) -> anyhow::Result<Vec<f64>> {
        let mut args = Vec::new();
        if self.peek() == Some(&Token::RParen) {
            self.pos += 1;
            return Ok(args);
        }
        loop {
            args.push(self.expr()?);
            match self.advance() {
                Some(Token::Comma) => continue,
                Some(Token::RParen) => return Ok(args),
                Some(tok) => anyhow::bail!("expected ',' or ')', found {:?}", tok),
                None => anyhow::bail!("unclosed function call"),
            }
        }
    }
}

/// Modulo whose result takes the sign of the divisor.
fn floor_mod(value: f64, rhs: f64) -> f64 {
    let rem = value % rhs;
    if rem != 0.0 && (rem < 0.0) != (rhs < 0.0) {
        rem + rhs
    } else {
        rem
    }
}

fn constant(name: &str) -> anyhow::Result<f64> {
    match name {
        "pi" => Ok(std::f64::consts::PI),
        "e" => Ok(std::f64::consts::E),
        "tau" => Ok(std::f64::consts::TAU),
        "inf" => Ok(f64::INFINITY),
        other => anyhow::bail!("illegal name: {}", other),
    }
}

fn call(name: &str, args: &[f64]) -> anyhow::Result<f64> {
    let unary = |f: fn(f64) -> f64| -> anyhow::Result<f64> {
        match args {
            [x] => Ok(f(*x)),
            _ => anyhow::bail!("{}() takes exactly one argument ({} given)", name, args.len()),
        }
    };

    match name {
        "sqrt" => unary(f64::sqrt),
        "abs" | "fabs" => unary(f64::abs),
        "sin" => unary(f64::sin),
        "cos" => unary(f64::cos),
        "tan" => unary(f64::tan),
        "asin" => unary(f64::asin),
        "acos" => unary(f64::acos),
        "atan" => unary(f64::atan),
        "exp" => unary(f64::exp),
        "ln" => unary(f64::ln),
        "log10" => unary(f64::log10),
        "log2" => unary(f64::log2),
        "floor" => unary(f64::floor),
        "ceil" => unary(f64::ceil),
        "round" => unary(f64::round_ties_even),
        "degrees" => unary(f64::to_degrees),
        "radians" => unary(f64::to_radians),
        "log" => match args {
            [x] => Ok(x.ln()),
            [x, base] => Ok(x.log(*base)),
            _ => anyhow::bail!("log() takes one or two arguments ({} given)", args.len()),
        },
        "pow" => match args {
            [x, y] => Ok(x.powf(*y)),
            _ => anyhow::bail!("pow() takes exactly two arguments ({} given)", args.len()),
        },
        "min" | "max" if args.is_empty() => {
            anyhow::bail!("{}() expects at least one argument", name)
        }
        "min" => Ok(args.iter().copied().fold(f64::INFINITY, f64::min)),
        "max" => Ok(args.iter().copied().fold(f64::NEG_INFINITY, f64::max)),
        other => anyhow::bail!("illegal name: {}", other),
    }
}
