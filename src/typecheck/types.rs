use crate::ast::*;
use crate::syntax::consteval::{self, ConstEnv};
use crate::transpile::image_format;
use crate::transpile::typemap::{self, ScalarKind};

/// Semantic types of kernel values (distinct from the written `TypeExpr`).
#[derive(Clone, Debug, PartialEq)]
pub enum Ty {
    Scalar(ScalarKind),
    Vector(ScalarKind, u32),
    /// Fixed-size array; length 0 when the size is not a known constant.
    Array(Box<Ty>, u64),
    /// Storage buffer of elements.
    Buffer(Box<Ty>),
    /// Storage image; `format` is the host enumerator name.
    Image { format: String, dim: u32 },
    /// Uniform value; reads as the inner type.
    Uniform(Box<Ty>),
    Record(String),
    Void,
    Unknown,
}

impl Ty {
    /// The type a read of this value produces.
    pub fn value(&self) -> &Ty {
        match self {
            Ty::Uniform(inner) => inner.value(),
            other => other,
        }
    }

    pub fn scalar(&self) -> Option<ScalarKind> {
        match self.value() {
            Ty::Scalar(k) => Some(*k),
            _ => None,
        }
    }

    /// Component kind of a scalar or vector.
    pub fn component(&self) -> Option<ScalarKind> {
        match self.value() {
            Ty::Scalar(k) | Ty::Vector(k, _) => Some(*k),
            _ => None,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Ty::Unknown)
    }

    /// GLSL spelling for scalars and vectors.
    pub fn glsl_name(&self) -> Option<String> {
        match self.value() {
            Ty::Scalar(k) => Some(k.glsl_name().to_string()),
            Ty::Vector(k, n) => typemap::vector_name(*k, *n),
            _ => None,
        }
    }

    pub fn display(&self) -> String {
        match self {
            Ty::Scalar(k) => k.glsl_name().to_string(),
            Ty::Vector(k, n) => {
                typemap::vector_name(*k, *n).unwrap_or_else(|| format!("vec_base<{}, {}>", k.glsl_name(), n))
            }
            Ty::Array(inner, n) => format!("{}[{}]", inner.display(), n),
            Ty::Buffer(inner) => format!("buffer<{}>", inner.display()),
            Ty::Image { format, dim } => format!("image{}D<{}>", dim, format),
            Ty::Uniform(inner) => format!("uniform<{}>", inner.display()),
            Ty::Record(name) => name.clone(),
            Ty::Void => "void".to_string(),
            Ty::Unknown => "?".to_string(),
        }
    }
}

/// Resolve a written type. References resolve to their referent; pointers
/// and `auto` are unknown.
pub fn resolve_type(ty: &TypeExpr, env: &ConstEnv) -> Ty {
    if ty.ptr_ops.iter().any(|p| p.node == PtrOp::Pointer) {
        return Ty::Unknown;
    }
    match &ty.base {
        TypeBase::Builtin(words) => {
            if words.len() == 1 && words[0] == "void" {
                Ty::Void
            } else {
                typemap::builtin_scalar(words).map_or(Ty::Unknown, Ty::Scalar)
            }
        }
        TypeBase::Path(path) => resolve_path(path, env),
        TypeBase::Auto | TypeBase::Opaque => Ty::Unknown,
    }
}

fn resolve_path(path: &Path, env: &ConstEnv) -> Ty {
    let Some(last) = path.last() else {
        return Ty::Unknown;
    };
    let name = last.name.node.as_str();
    let Some(targs) = &last.template_args else {
        if let Some(kind) = typemap::host_scalar(name) {
            return Ty::Scalar(kind);
        }
        if let Some((kind, n)) = typemap::host_vector(name) {
            return Ty::Vector(kind, n);
        }
        return Ty::Record(name.to_string());
    };
    let args = &targs.args;

    match name {
        "vec_base" if args.len() == 2 => {
            let kind = arg_type(&args[0], env).and_then(|t| t.scalar());
            let n = consteval::eval_template_arg(&args[1], env);
            match (kind, n) {
                (Some(kind), Some(n @ 2..=4)) => Ty::Vector(kind, n as u32),
                _ => Ty::Unknown,
            }
        }
        "BufferBinding" if !args.is_empty() => {
            let elem = arg_type(&args[0], env).unwrap_or(Ty::Unknown);
            Ty::Buffer(Box::new(elem))
        }
        "ImageBinding" if args.len() >= 2 => {
            let format = arg_name(&args[0]).unwrap_or_default().to_string();
            let dim = arg_name(&args[1])
                .and_then(image_format::parse_dim)
                .or_else(|| {
                    consteval::eval_template_arg(&args[1], env).and_then(|d| u32::try_from(d).ok())
                })
                .unwrap_or(0);
            Ty::Image { format, dim }
        }
        "Uniform" if !args.is_empty() => {
            let inner = arg_type(&args[0], env).unwrap_or(Ty::Unknown);
            Ty::Uniform(Box::new(inner))
        }
        "array" if args.len() == 2 => {
            let elem = arg_type(&args[0], env).unwrap_or(Ty::Unknown);
            let n = consteval::eval_template_arg(&args[1], env)
                .and_then(|n| u64::try_from(n).ok())
                .unwrap_or(0);
            Ty::Array(Box::new(elem), n)
        }
        _ => Ty::Record(name.to_string()),
    }
}

fn arg_type(arg: &TemplateArg, env: &ConstEnv) -> Option<Ty> {
    match arg {
        TemplateArg::Type(t) => Some(resolve_type(t, env)),
        TemplateArg::Expr(_) => None,
    }
}

/// The last path segment named by a template argument
/// (`tc::GPUFormat::RGBA32F` gives `RGBA32F`).
pub fn arg_name(arg: &TemplateArg) -> Option<&str> {
    let path = match arg {
        TemplateArg::Type(TypeExpr {
            base: TypeBase::Path(p),
            ..
        }) => p,
        TemplateArg::Expr(e) => match &e.node {
            Expr::Path(p) => p,
            _ => return None,
        },
        TemplateArg::Type(_) => return None,
    };
    path.last().map(|s| s.name.node.as_str())
}

/// Wrap `base` in one array level per declarator dimension.
pub fn with_array_dims(base: Ty, dims: &[ArrayDim], env: &ConstEnv) -> Ty {
    dims.iter().rev().fold(base, |inner, dim| {
        let n = dim
            .size
            .as_ref()
            .and_then(|s| consteval::eval_int(s, env))
            .and_then(|n| u64::try_from(n).ok())
            .unwrap_or(0);
        Ty::Array(Box::new(inner), n)
    })
}
