//! Types of the GLSL built-in variables and functions the kernel dialect
//! mirrors.

use super::types::Ty;
use crate::transpile::image_format;
use crate::transpile::typemap::ScalarKind;

pub(super) fn builtin_var(name: &str) -> Option<Ty> {
    match name {
        "gl_GlobalInvocationID"
        | "gl_LocalInvocationID"
        | "gl_WorkGroupID"
        | "gl_NumWorkGroups"
        | "gl_WorkGroupSize" => Some(Ty::Vector(ScalarKind::UInt, 3)),
        "gl_LocalInvocationIndex" => Some(Ty::Scalar(ScalarKind::UInt)),
        _ => None,
    }
}

/// Result type of a built-in call, or `None` when `name` is not a built-in.
pub(super) fn builtin_call(name: &str, args: &[Ty]) -> Option<Ty> {
    let first = args.first().map(|t| t.value().clone()).unwrap_or(Ty::Unknown);
    let ty = match name {
        "imageLoad" => match &first {
            Ty::Image { format, .. } => image_format::lookup(format)
                .map_or(Ty::Unknown, |f| Ty::Vector(f.scalar.texel_kind(), 4)),
            _ => Ty::Unknown,
        },
        "imageSize" => match &first {
            Ty::Image { dim: 1, .. } => Ty::Scalar(ScalarKind::Int),
            Ty::Image { dim, .. } if (2..=3).contains(dim) => Ty::Vector(ScalarKind::Int, *dim),
            _ => Ty::Unknown,
        },
        "imageStore" | "barrier" | "memoryBarrier" | "memoryBarrierShared"
        | "memoryBarrierBuffer" | "memoryBarrierImage" | "groupMemoryBarrier" => Ty::Void,

        // Component-wise functions returning their first argument's type.
        "abs" | "sign" | "floor" | "ceil" | "trunc" | "round" | "fract" | "mod" | "min"
        | "max" | "clamp" | "mix" | "step" | "smoothstep" | "sqrt" | "inversesqrt" | "pow"
        | "exp" | "exp2" | "log" | "log2" | "sin" | "cos" | "tan" | "asin" | "acos" | "atan"
        | "radians" | "degrees" | "normalize" | "reflect" | "refract" | "cross"
        | "faceforward" | "atomicAdd" | "atomicMin" | "atomicMax" | "atomicAnd"
        | "atomicOr" | "atomicXor" | "atomicExchange" | "atomicCompSwap" => first,

        "length" | "distance" | "dot" => match first.component() {
            Some(k) => Ty::Scalar(k),
            None => Ty::Scalar(ScalarKind::Float),
        },
        "any" | "all" => Ty::Scalar(ScalarKind::Bool),
        _ => return None,
    };
    Some(ty)
}
