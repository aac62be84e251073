//! Link expressions over parameters
//!
//! A linked parameter does not store its own value; it is derived from an
//! expression tree combining other parameters and constants. The tree is
//! built either through the arithmetic operators (`10.0 - a`, `2.0 * p + 3.0`)
//! or by parsing a text form (`"10 - m.a"`). Evaluation is a fresh post-order
//! walk on every read; nothing is cached.

use std::collections::HashMap;

use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{alpha1, alphanumeric1, char, multispace0},
    combinator::recognize,
    multi::many0,
    number::complete::double,
    sequence::pair,
    IResult, Parser,
};
use serde::{Deserialize, Serialize};

use crate::error::{ParameterError, Result};
use crate::parameters::parameters::{ParamId, Parameters};

/// One-argument numeric operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    /// Negation (`-`)
    Neg,

    /// Absolute value (`abs`)
    Abs,
}

impl UnaryOp {
    pub fn apply(&self, value: f64) -> f64 {
        match self {
            Self::Neg => -value,
            Self::Abs => value.abs(),
        }
    }

    /// The symbol used in the synthesized expression name.
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Neg => "-",
            Self::Abs => "abs",
        }
    }
}

/// Two-argument numeric operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Rem,
    Pow,
}

impl BinaryOp {
    pub fn apply(&self, lhs: f64, rhs: f64) -> f64 {
        match self {
            Self::Add => lhs + rhs,
            Self::Sub => lhs - rhs,
            Self::Mul => lhs * rhs,
            // IEEE division; a zero divisor yields an infinity, matching
            // the array-math conventions of the model libraries this
            // system serves.
            Self::Div => lhs / rhs,
            Self::FloorDiv => (lhs / rhs).floor(),
            // Remainder takes the sign of the divisor, not the dividend.
            Self::Rem => lhs - rhs * (lhs / rhs).floor(),
            Self::Pow => lhs.powf(rhs),
        }
    }

    /// The symbol used in the synthesized expression name.
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::FloorDiv => "//",
            Self::Rem => "%",
            Self::Pow => "**",
        }
    }
}

/// Provides parameter values during expression evaluation.
pub trait EvaluationContext {
    /// The current value of the parameter, or an error if the id does not
    /// belong to this context or the value violates the parameter's limits.
    fn value_of(&self, id: ParamId) -> Result<f64>;
}

impl EvaluationContext for HashMap<ParamId, f64> {
    fn value_of(&self, id: ParamId) -> Result<f64> {
        self.get(&id).copied().ok_or(ParameterError::NotLink)
    }
}

/// A link expression tree.
///
/// Leaves are constants or parameter references; interior nodes apply a
/// unary or binary operator. A node owns its children, so a tree can never
/// contain itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    /// A bare numeric literal lifted into the expression graph.
    Const(f64),

    /// A reference to a stored parameter.
    Param(ParamId),

    /// A one-argument operator applied to a child expression.
    Unary(UnaryOp, Box<Expr>),

    /// A two-argument operator applied to two child expressions.
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
}

impl From<f64> for Expr {
    fn from(value: f64) -> Self {
        Expr::Const(value)
    }
}

impl From<ParamId> for Expr {
    fn from(id: ParamId) -> Self {
        Expr::Param(id)
    }
}

/// Anything usable as an operand when building expressions.
pub trait IntoExpr {
    fn into_expr(self) -> Expr;
}

impl IntoExpr for Expr {
    fn into_expr(self) -> Expr {
        self
    }
}

impl IntoExpr for ParamId {
    fn into_expr(self) -> Expr {
        Expr::Param(self)
    }
}

impl IntoExpr for f64 {
    fn into_expr(self) -> Expr {
        Expr::Const(self)
    }
}

impl IntoExpr for i32 {
    fn into_expr(self) -> Expr {
        Expr::Const(f64::from(self))
    }
}

impl Expr {
    pub fn unary(op: UnaryOp, arg: impl IntoExpr) -> Self {
        Expr::Unary(op, Box::new(arg.into_expr()))
    }

    pub fn binary(op: BinaryOp, lhs: impl IntoExpr, rhs: impl IntoExpr) -> Self {
        Expr::Binary(op, Box::new(lhs.into_expr()), Box::new(rhs.into_expr()))
    }

    /// Absolute value of this expression.
    pub fn abs(self) -> Expr {
        Expr::unary(UnaryOp::Abs, self)
    }

    /// Raise this expression to a power.
    pub fn pow(self, rhs: impl IntoExpr) -> Expr {
        Expr::binary(BinaryOp::Pow, self, rhs)
    }

    /// Floor division of this expression by another operand.
    pub fn floor_div(self, rhs: impl IntoExpr) -> Expr {
        Expr::binary(BinaryOp::FloorDiv, self, rhs)
    }

    /// The parameter id if this node is a plain parameter reference.
    pub fn as_param(&self) -> Option<ParamId> {
        match self {
            Expr::Param(id) => Some(*id),
            _ => None,
        }
    }

    fn children(&self) -> Vec<&Expr> {
        match self {
            Expr::Const(_) | Expr::Param(_) => Vec::new(),
            Expr::Unary(_, arg) => vec![arg.as_ref()],
            Expr::Binary(_, lhs, rhs) => vec![lhs.as_ref(), rhs.as_ref()],
        }
    }

    /// Flatten the tree below this node: each direct child followed by its
    /// own parts, recursively. Duplicate references are kept.
    pub fn parts(&self) -> Vec<&Expr> {
        let mut out = Vec::new();
        self.collect_parts(&mut out);
        out
    }

    fn collect_parts<'a>(&'a self, out: &mut Vec<&'a Expr>) {
        for child in self.children() {
            out.push(child);
            child.collect_parts(out);
        }
    }

    /// Leaf parameter ids in traversal order. Duplicates are kept.
    pub fn params(&self) -> Vec<ParamId> {
        let mut out = Vec::new();
        self.collect_params(&mut out);
        out
    }

    fn collect_params(&self, out: &mut Vec<ParamId>) {
        match self {
            Expr::Const(_) => {}
            Expr::Param(id) => out.push(*id),
            Expr::Unary(_, arg) => arg.collect_params(out),
            Expr::Binary(_, lhs, rhs) => {
                lhs.collect_params(out);
                rhs.collect_params(out);
            }
        }
    }

    /// Does any leaf of this tree reference the given parameter?
    pub fn contains_param(&self, id: ParamId) -> bool {
        match self {
            Expr::Const(_) => false,
            Expr::Param(p) => *p == id,
            Expr::Unary(_, arg) => arg.contains_param(id),
            Expr::Binary(_, lhs, rhs) => lhs.contains_param(id) || rhs.contains_param(id),
        }
    }

    /// Evaluate the tree bottom-up against the given context.
    pub fn eval<C: EvaluationContext + ?Sized>(&self, ctx: &C) -> Result<f64> {
        match self {
            Expr::Const(value) => Ok(*value),
            Expr::Param(id) => ctx.value_of(*id),
            Expr::Unary(op, arg) => Ok(op.apply(arg.eval(ctx)?)),
            Expr::Binary(op, lhs, rhs) => Ok(op.apply(lhs.eval(ctx)?, rhs.eval(ctx)?)),
        }
    }

    /// Synthesize the display form of the expression, e.g.
    /// `"(2 * other.beta)"`. Fails if a leaf id is not in the collection.
    pub fn fullname(&self, pars: &Parameters) -> Result<String> {
        match self {
            Expr::Const(value) => Ok(format!("{value}")),
            Expr::Param(id) => pars
                .get(*id)
                .map(|p| p.fullname().to_string())
                .ok_or(ParameterError::NotLink),
            Expr::Unary(op, arg) => Ok(format!("{}({})", op.symbol(), arg.fullname(pars)?)),
            Expr::Binary(op, lhs, rhs) => Ok(format!(
                "({} {} {})",
                lhs.fullname(pars)?,
                op.symbol(),
                rhs.fullname(pars)?
            )),
        }
    }

    /// Parse the text form of an expression, resolving identifiers through
    /// the supplied lookup. Identifiers may be dotted (`model.par`); the
    /// supported operators are `+ - * / // % **` (with `^` accepted for
    /// power), unary minus, and `abs(...)`.
    pub fn parse<F>(input: &str, resolve: F) -> Result<Expr>
    where
        F: Fn(&str) -> Option<ParamId>,
    {
        let ast = match expr_parser(input.trim()) {
            Ok((remainder, ast)) => {
                if remainder.trim().is_empty() {
                    ast
                } else {
                    return Err(ParameterError::Parse {
                        message: format!("unexpected trailing characters: '{remainder}'"),
                    });
                }
            }
            Err(e) => {
                return Err(ParameterError::Parse {
                    message: format!("{e:?}"),
                })
            }
        };

        resolve_ast(&ast, &resolve)
    }
}

// Unary negation.

impl std::ops::Neg for Expr {
    type Output = Expr;

    fn neg(self) -> Expr {
        Expr::unary(UnaryOp::Neg, self)
    }
}

impl std::ops::Neg for ParamId {
    type Output = Expr;

    fn neg(self) -> Expr {
        Expr::unary(UnaryOp::Neg, self)
    }
}

// Binary operators: forward for Expr/ParamId on the left, reflected for
// bare numbers on the left.
macro_rules! impl_binary_op {
    ($trait:ident, $method:ident, $op:expr) => {
        impl<R: IntoExpr> std::ops::$trait<R> for Expr {
            type Output = Expr;

            fn $method(self, rhs: R) -> Expr {
                Expr::binary($op, self, rhs)
            }
        }

        impl<R: IntoExpr> std::ops::$trait<R> for ParamId {
            type Output = Expr;

            fn $method(self, rhs: R) -> Expr {
                Expr::binary($op, self, rhs)
            }
        }

        impl std::ops::$trait<Expr> for f64 {
            type Output = Expr;

            fn $method(self, rhs: Expr) -> Expr {
                Expr::binary($op, self, rhs)
            }
        }

        impl std::ops::$trait<ParamId> for f64 {
            type Output = Expr;

            fn $method(self, rhs: ParamId) -> Expr {
                Expr::binary($op, self, rhs)
            }
        }

        impl std::ops::$trait<Expr> for i32 {
            type Output = Expr;

            fn $method(self, rhs: Expr) -> Expr {
                Expr::binary($op, self, rhs)
            }
        }

        impl std::ops::$trait<ParamId> for i32 {
            type Output = Expr;

            fn $method(self, rhs: ParamId) -> Expr {
                Expr::binary($op, self, rhs)
            }
        }
    };
}

impl_binary_op!(Add, add, BinaryOp::Add);
impl_binary_op!(Sub, sub, BinaryOp::Sub);
impl_binary_op!(Mul, mul, BinaryOp::Mul);
impl_binary_op!(Div, div, BinaryOp::Div);
impl_binary_op!(Rem, rem, BinaryOp::Rem);

impl ParamId {
    /// Absolute value of this parameter, as an expression.
    pub fn abs(self) -> Expr {
        Expr::unary(UnaryOp::Abs, self)
    }

    /// Raise this parameter to a power, as an expression.
    pub fn pow(self, rhs: impl IntoExpr) -> Expr {
        Expr::binary(BinaryOp::Pow, self, rhs)
    }

    /// Floor division of this parameter by another operand.
    pub fn floor_div(self, rhs: impl IntoExpr) -> Expr {
        Expr::binary(BinaryOp::FloorDiv, self, rhs)
    }
}

// Parser internals: a name-based AST produced by nom, resolved to ids
// afterwards.

#[derive(Debug, Clone, PartialEq)]
enum Ast {
    Num(f64),
    Var(String),
    Func(String, Box<Ast>),
    Unary(UnaryOp, Box<Ast>),
    Binary(BinaryOp, Box<Ast>, Box<Ast>),
}

fn resolve_ast<F>(ast: &Ast, resolve: &F) -> Result<Expr>
where
    F: Fn(&str) -> Option<ParamId>,
{
    match ast {
        Ast::Num(value) => Ok(Expr::Const(*value)),
        Ast::Var(name) => resolve(name)
            .map(Expr::Param)
            .ok_or_else(|| ParameterError::NotFound { name: name.clone() }),
        Ast::Func(name, arg) => {
            if name.eq_ignore_ascii_case("abs") {
                Ok(Expr::unary(UnaryOp::Abs, resolve_ast(arg, resolve)?))
            } else {
                Err(ParameterError::Parse {
                    message: format!("unknown function '{name}'"),
                })
            }
        }
        Ast::Unary(op, arg) => Ok(Expr::unary(*op, resolve_ast(arg, resolve)?)),
        Ast::Binary(op, lhs, rhs) => Ok(Expr::binary(
            *op,
            resolve_ast(lhs, resolve)?,
            resolve_ast(rhs, resolve)?,
        )),
    }
}

/// Parse an identifier; dotted names are allowed so that parameters can be
/// referenced by fullname (`model.par`).
fn identifier(input: &str) -> IResult<&str, String> {
    let mut parser = recognize(pair(
        alt((alpha1, tag("_"))),
        many0(alt((alphanumeric1, tag("_"), tag(".")))),
    ));

    let (input, matched) = parser.parse(input)?;
    Ok((input, matched.to_string()))
}

/// Parse a single-argument function call such as `abs(x)`.
fn function_call(input: &str) -> IResult<&str, Ast> {
    let (input, name) = identifier(input)?;
    let (input, _) = multispace0.parse(input)?;
    let (input, _) = char('(').parse(input)?;
    let (input, _) = multispace0.parse(input)?;
    let (input, arg) = expr_parser(input)?;
    let (input, _) = multispace0.parse(input)?;
    let (input, _) = char::<_, nom::error::Error<_>>(')').parse(input)?;

    Ok((input, Ast::Func(name, Box::new(arg))))
}

fn number(input: &str) -> IResult<&str, Ast> {
    let (input, num) = double(input)?;
    Ok((input, Ast::Num(num)))
}

fn variable(input: &str) -> IResult<&str, Ast> {
    let (input, name) = identifier(input)?;
    Ok((input, Ast::Var(name)))
}

fn parens(input: &str) -> IResult<&str, Ast> {
    let (input, _) = char('(').parse(input)?;
    let (input, _) = multispace0.parse(input)?;
    let (input, ast) = expr_parser(input)?;
    let (input, _) = multispace0.parse(input)?;
    let (input, _) = char::<_, nom::error::Error<_>>(')').parse(input)?;
    Ok((input, ast))
}

fn primary(input: &str) -> IResult<&str, Ast> {
    if let Ok(result) = number(input) {
        return Ok(result);
    }

    if let Ok(result) = function_call(input) {
        return Ok(result);
    }

    if let Ok(result) = variable(input) {
        return Ok(result);
    }

    parens(input)
}

fn unary(input: &str) -> IResult<&str, Ast> {
    let (input, _) = multispace0.parse(input)?;

    let mut neg_parser = char::<_, nom::error::Error<_>>('-');
    match neg_parser.parse(input) {
        Ok((remaining, _)) => {
            let (remaining, ast) = unary(remaining)?;
            Ok((remaining, Ast::Unary(UnaryOp::Neg, Box::new(ast))))
        }
        Err(_) => primary(input),
    }
}

/// Power is right-associative: `2 ** 3 ** 2` is `2 ** (3 ** 2)`.
fn power(input: &str) -> IResult<&str, Ast> {
    let (input, left) = unary(input)?;
    let (after_ws, _) = multispace0.parse(input)?;

    let rest = if let Ok((rest, _)) = tag::<_, _, nom::error::Error<_>>("**").parse(after_ws) {
        Some(rest)
    } else if let Ok((rest, _)) = char::<_, nom::error::Error<_>>('^').parse(after_ws) {
        Some(rest)
    } else {
        None
    };

    match rest {
        Some(rest) => {
            let (rest, right) = power(rest)?;
            Ok((
                rest,
                Ast::Binary(BinaryOp::Pow, Box::new(left), Box::new(right)),
            ))
        }
        None => Ok((input, left)),
    }
}

/// Multiplicative level, left-associative. `//` must be tried before `/`,
/// and `**` has already been consumed by the power level.
fn term(input: &str) -> IResult<&str, Ast> {
    let (mut input, mut acc) = power(input)?;

    loop {
        let (after_ws, _) = multispace0.parse(input)?;

        let op = if let Ok((rest, _)) = char::<_, nom::error::Error<_>>('*').parse(after_ws) {
            Some((rest, BinaryOp::Mul))
        } else if let Ok((rest, _)) = tag::<_, _, nom::error::Error<_>>("//").parse(after_ws) {
            Some((rest, BinaryOp::FloorDiv))
        } else if let Ok((rest, _)) = char::<_, nom::error::Error<_>>('/').parse(after_ws) {
            Some((rest, BinaryOp::Div))
        } else if let Ok((rest, _)) = char::<_, nom::error::Error<_>>('%').parse(after_ws) {
            Some((rest, BinaryOp::Rem))
        } else {
            None
        };

        match op {
            Some((rest, op)) => {
                let (rest, rhs) = power(rest)?;
                acc = Ast::Binary(op, Box::new(acc), Box::new(rhs));
                input = rest;
            }
            None => return Ok((input, acc)),
        }
    }
}

/// Additive level, left-associative.
fn expr_parser(input: &str) -> IResult<&str, Ast> {
    let (input, _) = multispace0.parse(input)?;
    let (mut input, mut acc) = term(input)?;

    loop {
        let (after_ws, _) = multispace0.parse(input)?;

        let op = if let Ok((rest, _)) = char::<_, nom::error::Error<_>>('+').parse(after_ws) {
            Some((rest, BinaryOp::Add))
        } else if let Ok((rest, _)) = char::<_, nom::error::Error<_>>('-').parse(after_ws) {
            Some((rest, BinaryOp::Sub))
        } else {
            None
        };

        match op {
            Some((rest, op)) => {
                let (rest, rhs) = term(rest)?;
                acc = Ast::Binary(op, Box::new(acc), Box::new(rhs));
                input = rest;
            }
            None => return Ok((input, acc)),
        }
    }
}
