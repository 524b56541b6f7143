//! Integer constant-expression evaluation.
//!
//! Enough of C++ constant evaluation to read workgroup sizes, template
//! binding indices and array lengths: integer/bool/char literals, named
//! constants, integral casts, and the arithmetic, bitwise, comparison and
//! logical operators.

use std::collections::HashMap;

use crate::ast::*;
use crate::syntax::span::Spanned;

/// Named integer constants visible to the evaluator.
#[derive(Clone, Debug, Default)]
pub struct ConstEnv {
    values: HashMap<String, i64>,
}

impl ConstEnv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: i64) {
        self.values.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<i64> {
        self.values.get(name).copied()
    }

    /// Collect the `static constexpr` / `static const` integer members of a
    /// record, evaluated in declaration order so later constants may refer
    /// to earlier ones.
    pub fn from_record(record: &Record) -> Self {
        let mut env = Self::new();
        let Some(body) = &record.body else {
            return env;
        };
        for member in &body.members {
            let Member::Field(decl) = member else {
                continue;
            };
            let is_constant = decl.has_spec(DeclSpec::Constexpr)
                || (decl.has_spec(DeclSpec::Static) && decl.ty.is_const());
            if !is_constant {
                continue;
            }
            for d in &decl.declarators {
                if !d.array_dims.is_empty() {
                    continue;
                }
                let value = match &d.init {
                    Some(Initializer::Assign { value, .. }) => eval_int(value, &env),
                    Some(Initializer::Braced(list)) if list.elems.len() == 1 => {
                        eval_int(&list.elems[0], &env)
                    }
                    _ => None,
                };
                if let Some(v) = value {
                    env.insert(d.name.node.clone(), v);
                }
            }
        }
        env
    }

    fn lookup_path(&self, path: &Path) -> Option<i64> {
        if path.segments.iter().any(|s| s.template_args.is_some()) {
            return None;
        }
        self.get(&path.joined())
            .or_else(|| path.last().and_then(|s| self.get(&s.name.node)))
    }
}

/// Evaluate an integer constant expression.
pub fn eval_int(expr: &Spanned<Expr>, env: &ConstEnv) -> Option<i64> {
    match &expr.node {
        Expr::Literal(lit) => match lit {
            Literal::Int { value, .. } => i64::try_from(*value).ok(),
            Literal::Bool(b) => Some(i64::from(*b)),
            Literal::Char(c) => Some(*c as i64),
            _ => None,
        },
        Expr::Path(path) => env.lookup_path(path),
        Expr::Paren(inner) => eval_int(inner, env),
        Expr::Unary { op, operand } => {
            let v = eval_int(operand, env)?;
            match op {
                UnaryOp::Neg => v.checked_neg(),
                UnaryOp::Plus => Some(v),
                UnaryOp::Not => Some(i64::from(v == 0)),
                UnaryOp::BitNot => Some(!v),
                _ => None,
            }
        }
        Expr::Binary { op, lhs, rhs } => eval_binary(*op, lhs, rhs, env),
        Expr::Conditional {
            cond,
            then_expr,
            else_expr,
        } => {
            if eval_int(cond, env)? != 0 {
                eval_int(then_expr, env)
            } else {
                eval_int(else_expr, env)
            }
        }
        Expr::Cast { ty, operand, .. } if is_integral(ty) => eval_int(operand, env),
        Expr::Construct { ty, args, .. } if is_integral(ty) && args.len() == 1 => {
            eval_int(&args[0], env)
        }
        _ => None,
    }
}

fn eval_binary(
    op: BinOp,
    lhs: &Spanned<Expr>,
    rhs: &Spanned<Expr>,
    env: &ConstEnv,
) -> Option<i64> {
    // Short-circuit forms evaluate the right side only when needed.
    match op {
        BinOp::And => {
            return if eval_int(lhs, env)? == 0 {
                Some(0)
            } else {
                Some(i64::from(eval_int(rhs, env)? != 0))
            };
        }
        BinOp::Or => {
            return if eval_int(lhs, env)? != 0 {
                Some(1)
            } else {
                Some(i64::from(eval_int(rhs, env)? != 0))
            };
        }
        BinOp::Comma => return eval_int(rhs, env),
        _ => {}
    }

    let a = eval_int(lhs, env)?;
    let b = eval_int(rhs, env)?;
    match op {
        BinOp::Add => a.checked_add(b),
        BinOp::Sub => a.checked_sub(b),
        BinOp::Mul => a.checked_mul(b),
        BinOp::Div => a.checked_div(b),
        BinOp::Rem => a.checked_rem(b),
        BinOp::Shl => u32::try_from(b).ok().and_then(|s| a.checked_shl(s)),
        BinOp::Shr => u32::try_from(b).ok().and_then(|s| a.checked_shr(s)),
        BinOp::Lt => Some(i64::from(a < b)),
        BinOp::Gt => Some(i64::from(a > b)),
        BinOp::Le => Some(i64::from(a <= b)),
        BinOp::Ge => Some(i64::from(a >= b)),
        BinOp::Eq => Some(i64::from(a == b)),
        BinOp::Ne => Some(i64::from(a != b)),
        BinOp::BitAnd => Some(a & b),
        BinOp::BitXor => Some(a ^ b),
        BinOp::BitOr => Some(a | b),
        BinOp::And | BinOp::Or | BinOp::Comma => None,
    }
}

/// Evaluate a template argument: an expression, or a bare name that
/// refers to a known constant.
pub fn eval_template_arg(arg: &TemplateArg, env: &ConstEnv) -> Option<i64> {
    match arg {
        TemplateArg::Expr(e) => eval_int(e, env),
        TemplateArg::Type(ty) => match &ty.base {
            TypeBase::Path(path) if ty.ptr_ops.is_empty() => env.lookup_path(path),
            _ => None,
        },
    }
}

/// The value of a string-literal expression.
pub fn eval_str(expr: &Spanned<Expr>) -> Option<&str> {
    match &Expr::unparen(expr).node {
        Expr::Literal(Literal::Str { value, suffix }) if suffix.is_empty() => Some(value),
        _ => None,
    }
}

fn is_integral(ty: &TypeExpr) -> bool {
    if !ty.ptr_ops.is_empty() {
        return false;
    }
    match &ty.base {
        TypeBase::Builtin(words) => words
            .iter()
            .all(|w| matches!(w.as_str(), "int" | "unsigned" | "signed" | "short" | "long" | "char" | "bool")),
        TypeBase::Path(path) => matches!(
            path.last().map(|s| s.name.node.as_str()),
            Some(
                "uint"
                    | "integer"
                    | "size_t"
                    | "int8_t"
                    | "int16_t"
                    | "int32_t"
                    | "int64_t"
                    | "uint8_t"
                    | "uint16_t"
                    | "uint32_t"
                    | "uint64_t"
            )
        ),
        _ => false,
    }
}
