mod conversions;

use crate::ast::{Item, Record};
use crate::syntax::consteval::ConstEnv;
use crate::syntax::source::SourceFile;
use crate::syntax::parse_source;
use crate::transpile::typemap::needs_cast;
use crate::typecheck::{check_kernel, KernelTypes};

pub(super) fn kernel(source: &str) -> (SourceFile, Record, KernelTypes) {
    let file = SourceFile::new("test.h", source);
    let unit = parse_source(&file).unwrap();
    let record = unit
        .items
        .into_iter()
        .find_map(|i| match i {
            Item::Record(r) => Some(r),
            _ => None,
        })
        .expect("no record");
    let env = ConstEnv::from_record(&record);
    let types = check_kernel(&record, &env, &["tc".to_string()]);
    (file, record, types)
}

/// Conversions that must be spelled out, as `(expression text, target)`.
pub(super) fn casts(source: &str) -> Vec<(String, &'static str)> {
    let (file, _, types) = kernel(source);
    types
        .conversions()
        .into_iter()
        .filter(|c| needs_cast(c.from, c.to))
        .map(|c| (file.slice(c.span).to_string(), c.to.glsl_name()))
        .collect()
}

pub(super) fn body(stmts: &str) -> String {
    format!(
        "struct [[clang::annotate(\"kernel\")]] K {{\n\
         tc::BufferBinding<tc::uint, 0> data;\n\
         tc::Uniform<tc::integer, 1> WIDTH{{ 32 }};\n\
         tc::uint sample(tc::uvec2 c) {{ return data[c.y * WIDTH + c.x]; }}\n\
         void store(tc::uvec2 c, tc::uint v) {{ data[c.x] = v; }}\n\
         void main() {{\n{}\n}}\n}};",
        stmts
    )
}
