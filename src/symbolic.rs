#![allow(non_camel_case_types)]
#![allow(non_snake_case)]
/// a module turns a String expression into a symbolic expression
///
///# Example
/// ```
/// use RustedVectorCalc::symbolic::symbolic_engine::Expr;
/// let parsed_expression = Expr::parse_expression("x^2 + sin(θ)").unwrap();
/// let same = Expr::parse_expression("x**2 + sin(theta)").unwrap();
/// assert_eq!(parsed_expression, same);
///  ```
/// ________________________________________________________________________________________________________________________________
pub mod parse_expr;
///____________________________________________________________________________________________________________________________
/// # Symbolic engine
/// a module
/// 1) defines the expression tree and its printing
/// 2) substitutes variables (changes of coordinates)
/// 3) lists free variables
///# Example#
/// ```
/// use RustedVectorCalc::symbolic::symbolic_engine::Expr;
/// let f = Expr::parse_expression("x*y + z").unwrap();
/// let g = f.substitute_variable("z", &Expr::Const(2.0));
/// assert_eq!(g.eval_expression(&["x", "y"], &[3.0, 4.0]), 14.0);
/// ```
pub mod symbolic_engine;
/// analytical differentiation and numerical evaluation
///# Example#
/// ```
/// use RustedVectorCalc::symbolic::symbolic_engine::Expr;
/// let f = Expr::parse_expression("x^2*y").unwrap();
/// let df_dx = f.diff("x").simplify();
/// assert_eq!(df_dx.to_string(), "2*x*y");
/// ```
pub mod symbolic_engine_derivatives;
///____________________________________________________________________________________________________________________________
/// canonical simplification: sums of monomials, exact multiples of pi, trigonometric and
/// exponential rules
pub mod symbolic_simplify;
///____________________________________________________________________________________________________________________________
/// table-driven analytical integration, indefinite and definite
///# Example#
/// ```
/// use RustedVectorCalc::symbolic::symbolic_engine::Expr;
/// let f = Expr::parse_expression("rho^2*sin(phi)").unwrap();
/// let volume = f
///     .definite_integrate("rho", &Expr::Const(0.0), &Expr::Const(1.0)).unwrap()
///     .definite_integrate("phi", &Expr::Const(0.0), &Expr::Pi).unwrap()
///     .definite_integrate("theta", &Expr::Const(0.0), &(Expr::Const(2.0) * Expr::Pi)).unwrap();
/// assert_eq!(volume.to_string(), "4*pi/3");
/// ```
pub mod symbolic_integration;
/// vectors of symbolic expressions
pub mod symbolic_vectors;
/// numeric helpers
pub mod utils;
