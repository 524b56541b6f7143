//! Image format descriptors: format identifier to GLSL image qualifier and
//! texel scalar kind.

use super::typemap::ScalarKind;

/// How the texel channels of an image format are interpreted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormatScalar {
    Float,
    Int,
    UInt,
    UNorm,
    SNorm,
}

impl FormatScalar {
    /// Prefix of the GLSL image type (`image2D`, `iimage2D`, `uimage2D`).
    pub fn type_prefix(self) -> &'static str {
        match self {
            FormatScalar::Int => "i",
            FormatScalar::UInt => "u",
            FormatScalar::Float | FormatScalar::UNorm | FormatScalar::SNorm => "",
        }
    }

    /// Component kind of the `gvec4` that `imageLoad` returns.
    pub fn texel_kind(self) -> ScalarKind {
        match self {
            FormatScalar::Int => ScalarKind::Int,
            FormatScalar::UInt => ScalarKind::UInt,
            FormatScalar::Float | FormatScalar::UNorm | FormatScalar::SNorm => ScalarKind::Float,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageFormat {
    /// Host enumerator name, e.g. `RGBA32F`.
    pub id: &'static str,
    /// GLSL layout qualifier, e.g. `rgba32f`.
    pub qualifier: &'static str,
    pub scalar: FormatScalar,
}

const fn format(id: &'static str, qualifier: &'static str, scalar: FormatScalar) -> ImageFormat {
    ImageFormat {
        id,
        qualifier,
        scalar,
    }
}

use FormatScalar::*;

static FORMATS: &[ImageFormat] = &[
    format("RGBA32F", "rgba32f", Float),
    format("RGBA16F", "rgba16f", Float),
    format("RG32F", "rg32f", Float),
    format("RG16F", "rg16f", Float),
    format("R11F_G11F_B10F", "r11f_g11f_b10f", Float),
    format("R32F", "r32f", Float),
    format("R16F", "r16f", Float),
    format("RGBA16", "rgba16", UNorm),
    format("RGB10_A2", "rgb10_a2", UNorm),
    format("RGBA8", "rgba8", UNorm),
    format("RG16", "rg16", UNorm),
    format("RG8", "rg8", UNorm),
    format("R16", "r16", UNorm),
    format("R8", "r8", UNorm),
    format("RGBA16_SNORM", "rgba16_snorm", SNorm),
    format("RGBA8_SNORM", "rgba8_snorm", SNorm),
    format("RG16_SNORM", "rg16_snorm", SNorm),
    format("RG8_SNORM", "rg8_snorm", SNorm),
    format("R16_SNORM", "r16_snorm", SNorm),
    format("R8_SNORM", "r8_snorm", SNorm),
    format("RGBA32I", "rgba32i", Int),
    format("RGBA16I", "rgba16i", Int),
    format("RGBA8I", "rgba8i", Int),
    format("RG32I", "rg32i", Int),
    format("RG16I", "rg16i", Int),
    format("RG8I", "rg8i", Int),
    format("R32I", "r32i", Int),
    format("R16I", "r16i", Int),
    format("R8I", "r8i", Int),
    format("RGBA32UI", "rgba32ui", UInt),
    format("RGBA16UI", "rgba16ui", UInt),
    format("RGB10_A2UI", "rgb10_a2ui", UInt),
    format("RGBA8UI", "rgba8ui", UInt),
    format("RG32UI", "rg32ui", UInt),
    format("RG16UI", "rg16ui", UInt),
    format("RG8UI", "rg8ui", UInt),
    format("R32UI", "r32ui", UInt),
    format("R16UI", "r16ui", UInt),
    format("R8UI", "r8ui", UInt),
];

/// Look up a format by its host enumerator name.
pub fn lookup(id: &str) -> Option<&'static ImageFormat> {
    FORMATS.iter().find(|f| f.id == id)
}

/// `1D`, `2D` or `3D` for an image dimensionality.
pub fn dim_suffix(dim: u32) -> Option<&'static str> {
    match dim {
        1 => Some("1D"),
        2 => Some("2D"),
        3 => Some("3D"),
        _ => None,
    }
}

/// Parse a `Dim` enumerator name (`D1`, `D2`, `D3`).
pub fn parse_dim(name: &str) -> Option<u32> {
    match name {
        "D1" => Some(1),
        "D2" => Some(2),
        "D3" => Some(3),
        _ => None,
    }
}
