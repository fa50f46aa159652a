//! # Expression parser
//!
//! Turns text like `"x^2 + sin(theta)*rho"` into an [`Expr`]. Built with `nom` as a
//! small precedence-climbing grammar:
//!
//! ```text
//! sum     := product (('+' | '-') product)*
//! product := unary (('*' | '/') unary)*
//! unary   := ('-' | '+') unary | power
//! power   := atom (('**' | '^') unary)?
//! atom    := number | '(' sum ')' | name '(' sum ')' | name
//! ```
//!
//! Greek letters are accepted as aliases of their spelled-out names
//! (`θ` → `theta`, `φ`/`ϕ` → `phi`, `ρ` → `rho`, `π` → `pi`).
use crate::symbolic::symbolic_engine::Expr;
use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{char, multispace0},
    combinator::{cut, map_res, not, opt, recognize},
    error::ErrorKind,
    number::complete::recognize_float,
    sequence::{delimited, pair, preceded, terminated},
};
use std::fmt;

/// Malformed input expression. `fragment` holds the part of the input where
/// parsing stopped, when there is one.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
    pub fragment: Option<String>,
}

impl ParseError {
    pub fn new(message: &str, fragment: Option<&str>) -> Self {
        ParseError {
            message: message.to_string(),
            fragment: fragment.map(|s| s.to_string()),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.fragment {
            Some(fragment) => write!(f, "{} at '{}'", self.message, fragment),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for ParseError {}

impl Expr {
    /// Parses a string into a symbolic expression.
    ///
    /// # Examples
    /// ```rust, ignore
    /// let expr = Expr::parse_expression("x**2 + 2*x*y").unwrap();
    /// ```
    pub fn parse_expression(input: &str) -> Result<Expr, ParseError> {
        if input.trim().is_empty() {
            return Err(ParseError::new("empty expression", None));
        }
        match parse_sum(input) {
            Ok((rest, expr)) => {
                let rest = rest.trim();
                if rest.is_empty() {
                    Ok(expr)
                } else {
                    Err(ParseError::new("unexpected input", Some(rest)))
                }
            }
            Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
                let fragment = e.input.trim();
                let fragment = (!fragment.is_empty()).then_some(fragment);
                Err(ParseError::new(describe(e.code), fragment))
            }
            Err(nom::Err::Incomplete(_)) => Err(ParseError::new("incomplete expression", None)),
        }
    }

    /// Parses and checks that every free variable is one of `allowed`.
    pub fn parse_with_variables(input: &str, allowed: &[&str]) -> Result<Expr, ParseError> {
        let expr = Expr::parse_expression(input)?;
        if let Some(unknown) = expr
            .variables()
            .into_iter()
            .find(|v| !allowed.contains(&v.as_str()))
        {
            return Err(ParseError::new("unknown variable", Some(&unknown)));
        }
        Ok(expr)
    }
}

fn describe(code: ErrorKind) -> &'static str {
    match code {
        ErrorKind::Tag => "unknown function",
        ErrorKind::Char => "expected closing parenthesis",
        ErrorKind::Digit | ErrorKind::Float => "malformed number",
        _ => "unexpected input",
    }
}

fn parse_sum(input: &str) -> IResult<&str, Expr> {
    let (mut input, mut acc) = parse_product(input)?;
    loop {
        let (rest, op) = opt(preceded(multispace0, alt((char('+'), char('-'))))).parse(input)?;
        let Some(op) = op else {
            return Ok((input, acc));
        };
        let (rest, rhs) = parse_product(rest)?;
        acc = if op == '+' { acc + rhs } else { acc - rhs };
        input = rest;
    }
}

fn parse_product(input: &str) -> IResult<&str, Expr> {
    let (mut input, mut acc) = parse_unary(input)?;
    loop {
        // a lone '*', never the first half of '**'
        let multiply_or_divide = alt((terminated(char('*'), not(char('*'))), char('/')));
        let (rest, op) = opt(preceded(multispace0, multiply_or_divide)).parse(input)?;
        let Some(op) = op else {
            return Ok((input, acc));
        };
        let (rest, rhs) = parse_unary(rest)?;
        acc = if op == '*' { acc * rhs } else { acc / rhs };
        input = rest;
    }
}

fn parse_unary(input: &str) -> IResult<&str, Expr> {
    let (input, _) = multispace0(input)?;
    let (rest, sign) = opt(alt((char('-'), char('+')))).parse(input)?;
    match sign {
        Some('-') => {
            let (rest, operand) = parse_unary(rest)?;
            let negated = match operand {
                Expr::Const(c) => Expr::Const(-c),
                other => -other,
            };
            Ok((rest, negated))
        }
        Some(_) => parse_unary(rest),
        None => parse_power(rest),
    }
}

fn parse_power(input: &str) -> IResult<&str, Expr> {
    let (input, base) = parse_atom(input)?;
    let (rest, op) = opt(preceded(multispace0, alt((tag("**"), tag("^"))))).parse(input)?;
    match op {
        Some(_) => {
            let (rest, exponent) = parse_unary(rest)?;
            Ok((rest, base.pow(exponent)))
        }
        None => Ok((input, base)),
    }
}

fn parse_atom(input: &str) -> IResult<&str, Expr> {
    let (input, _) = multispace0(input)?;
    alt((parse_number, parse_parenthesized, parse_name)).parse(input)
}

fn parse_number(input: &str) -> IResult<&str, Expr> {
    map_res(recognize_float, |s: &str| s.parse::<f64>().map(Expr::Const)).parse(input)
}

fn parse_parenthesized(input: &str) -> IResult<&str, Expr> {
    delimited(
        char('('),
        parse_sum,
        cut(preceded(multispace0, char(')'))),
    )
    .parse(input)
}

fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        take_while1(|c: char| c.is_alphabetic() || c == '_'),
        take_while(|c: char| c.is_alphanumeric() || c == '_'),
    ))
    .parse(input)
}

/// function call, named constant or variable
fn parse_name(input: &str) -> IResult<&str, Expr> {
    let (rest, name) = identifier(input)?;
    let (after_paren, open) = opt(preceded(multispace0, char('('))).parse(rest)?;
    if open.is_none() {
        return Ok((rest, constant_or_variable(name)));
    }
    let Some(build) = function_builder(name) else {
        return Err(nom::Err::Failure(nom::error::Error::new(input, ErrorKind::Tag)));
    };
    let (rest, argument) = parse_sum(after_paren)?;
    let (rest, _) = cut(preceded(multispace0, char(')'))).parse(rest)?;
    Ok((rest, build(argument)))
}

fn constant_or_variable(name: &str) -> Expr {
    match name {
        "pi" | "π" => Expr::Pi,
        "E" | "e" => Expr::Const(1.0).exp(),
        "θ" | "theta" | "vartheta" => Expr::var("theta"),
        "φ" | "ϕ" | "phi" | "varphi" => Expr::var("phi"),
        "ρ" | "rho" => Expr::var("rho"),
        other => Expr::var(other),
    }
}

fn function_builder(name: &str) -> Option<fn(Expr) -> Expr> {
    let build: fn(Expr) -> Expr = match name {
        "sin" => |a| Expr::sin(a.boxed()),
        "cos" => |a| Expr::cos(a.boxed()),
        "tan" | "tg" => |a| Expr::tg(a.boxed()),
        "sqrt" => |a| a.sqrt(),
        "log" | "ln" => |a| a.ln(),
        "exp" => |a| a.exp(),
        "Abs" | "abs" => |a| Expr::Abs(a.boxed()),
        _ => return None,
    };
    Some(build)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_parse_polynomial() {
        let expr = Expr::parse_expression("x^2 + y").unwrap();
        let expected = Expr::var("x").pow(Expr::Const(2.0)) + Expr::var("y");
        assert_eq!(expr, expected);
    }

    #[test]
    fn test_double_star_is_power() {
        let a = Expr::parse_expression("x**3").unwrap();
        let b = Expr::parse_expression("x^3").unwrap();
        assert_eq!(a, b);
        let product = Expr::parse_expression("2*3").unwrap();
        assert_relative_eq!(product.eval_expression(&[], &[]), 6.0);
    }

    #[test]
    fn test_unary_minus_binds_looser_than_power() {
        let expr = Expr::parse_expression("-x^2").unwrap();
        assert_relative_eq!(expr.eval_expression(&["x"], &[3.0]), -9.0);
    }

    #[test]
    fn test_power_is_right_associative() {
        let expr = Expr::parse_expression("2^3^2").unwrap();
        assert_relative_eq!(expr.eval_expression(&[], &[]), 512.0);
    }

    #[test]
    fn test_greek_aliases() {
        let greek = Expr::parse_expression("ρ^2*sin(φ)*cos(θ)").unwrap();
        let spelled = Expr::parse_expression("rho^2*sin(phi)*cos(theta)").unwrap();
        assert_eq!(greek, spelled);
        let varphi = Expr::parse_expression("sin(varphi) + ϕ").unwrap();
        assert_eq!(varphi, Expr::parse_expression("sin(phi) + phi").unwrap());
    }

    #[test]
    fn test_constants_and_functions() {
        let expr = Expr::parse_expression("sqrt(4) + exp(0) + log(E) + Abs(-2) + cos(pi)").unwrap();
        assert_relative_eq!(expr.eval_expression(&[], &[]), 2.0 + 1.0 + 1.0 + 2.0 - 1.0);
        let tan = Expr::parse_expression("tan(x)").unwrap();
        assert_eq!(tan, Expr::tg(Expr::var("x").boxed()));
    }

    #[test]
    fn test_scientific_notation() {
        let expr = Expr::parse_expression("1.5e-3*x").unwrap();
        assert_relative_eq!(expr.eval_expression(&["x"], &[2.0]), 3.0e-3);
    }

    #[test]
    fn test_errors_carry_fragment() {
        let err = Expr::parse_expression("x + * y").unwrap_err();
        assert!(err.fragment.is_some());

        let err = Expr::parse_expression("foo(x) + 1").unwrap_err();
        assert_eq!(err.message, "unknown function");
        assert!(err.fragment.unwrap().starts_with("foo"));

        let err = Expr::parse_expression("(x + 1").unwrap_err();
        assert_eq!(err.message, "expected closing parenthesis");

        let err = Expr::parse_expression("x y").unwrap_err();
        assert_eq!(err.fragment.as_deref(), Some("y"));

        assert!(Expr::parse_expression("   ").is_err());
    }

    #[test]
    fn test_parse_with_variables() {
        assert!(Expr::parse_with_variables("x*y + z", &["x", "y", "z"]).is_ok());
        let err = Expr::parse_with_variables("x + w", &["x", "y", "z"]).unwrap_err();
        assert_eq!(err.fragment.as_deref(), Some("w"));
    }
}
