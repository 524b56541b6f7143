//! Host scalar/vector spellings to GLSL type names.
//!
//! Pure lookup tables. Everything that needs a target spelling, and the
//! implicit-cast decision, goes through here.

/// Scalar component kinds, declared in type-rank order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ScalarKind {
    Bool,
    Int,
    UInt,
    Float,
    Double,
}

impl ScalarKind {
    pub const ALL: [ScalarKind; 5] = [
        ScalarKind::Bool,
        ScalarKind::Int,
        ScalarKind::UInt,
        ScalarKind::Float,
        ScalarKind::Double,
    ];

    /// Position in the conversion order `bool < int < uint < float < double`.
    pub fn rank(self) -> u8 {
        match self {
            ScalarKind::Bool => 0,
            ScalarKind::Int => 1,
            ScalarKind::UInt => 2,
            ScalarKind::Float => 3,
            ScalarKind::Double => 4,
        }
    }

    pub fn glsl_name(self) -> &'static str {
        match self {
            ScalarKind::Bool => "bool",
            ScalarKind::Int => "int",
            ScalarKind::UInt => "uint",
            ScalarKind::Float => "float",
            ScalarKind::Double => "double",
        }
    }

    pub fn vector_prefix(self) -> &'static str {
        match self {
            ScalarKind::Float => "",
            ScalarKind::Double => "d",
            ScalarKind::Int => "i",
            ScalarKind::UInt => "u",
            ScalarKind::Bool => "b",
        }
    }
}

/// GLSL spelling of a vector with `n` components, or `None` when `n` is
/// not 2, 3 or 4.
pub fn vector_name(kind: ScalarKind, n: u32) -> Option<String> {
    match n {
        2..=4 => Some(format!("{}vec{}", kind.vector_prefix(), n)),
        _ => None,
    }
}

/// Whether an implicit conversion must be spelled out as a constructor
/// call: narrowing conversions, and every conversion to or from `bool`.
pub fn needs_cast(from: ScalarKind, to: ScalarKind) -> bool {
    from != to
        && (from.rank() > to.rank() || from == ScalarKind::Bool || to == ScalarKind::Bool)
}

/// A single-identifier scalar spelling (`uint`, `integer`, `size_t`, ...).
/// 64-bit integer aliases have no mapping.
pub fn host_scalar(name: &str) -> Option<ScalarKind> {
    match name {
        "bool" => Some(ScalarKind::Bool),
        "int" | "integer" | "int8_t" | "int16_t" | "int32_t" => Some(ScalarKind::Int),
        "uint" | "uint8_t" | "uint16_t" | "uint32_t" | "size_t" => Some(ScalarKind::UInt),
        "float" => Some(ScalarKind::Float),
        "double" => Some(ScalarKind::Double),
        _ => None,
    }
}

/// A builtin multi-word scalar spelling such as `unsigned int` or `short`.
pub fn builtin_scalar(words: &[String]) -> Option<ScalarKind> {
    let has = |w: &str| words.iter().any(|x| x == w);
    let longs = words.iter().filter(|w| *w == "long").count();

    if has("bool") {
        return (words.len() == 1).then_some(ScalarKind::Bool);
    }
    if has("float") {
        return (words.len() == 1).then_some(ScalarKind::Float);
    }
    if has("double") {
        // `long double` has no GLSL counterpart.
        return (words.len() == 1).then_some(ScalarKind::Double);
    }
    if has("void") || (has("char") && words.len() == 1) {
        return None;
    }
    if longs >= 2 {
        return None;
    }
    if has("unsigned") {
        Some(ScalarKind::UInt)
    } else if has("int") || has("signed") || has("short") || has("long") || has("char") {
        Some(ScalarKind::Int)
    } else {
        None
    }
}

/// Vector aliases: `vec3`, `ivec2`, `uvec4`, `dvec3`, `bvec2`.
pub fn host_vector(name: &str) -> Option<(ScalarKind, u32)> {
    let (kind, rest) = if let Some(rest) = name.strip_prefix("vec") {
        (ScalarKind::Float, rest)
    } else {
        let kind = match name.as_bytes().first()? {
            b'd' => ScalarKind::Double,
            b'i' => ScalarKind::Int,
            b'u' => ScalarKind::UInt,
            b'b' => ScalarKind::Bool,
            _ => return None,
        };
        (kind, name[1..].strip_prefix("vec")?)
    };
    match rest {
        "2" => Some((kind, 2)),
        "3" => Some((kind, 3)),
        "4" => Some((kind, 4)),
        _ => None,
    }
}
