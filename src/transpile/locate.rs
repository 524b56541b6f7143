//! Finding kernel records and their boilerplate.

use crate::ast::*;
use crate::syntax::consteval;
use crate::syntax::parser::KERNEL_ATTRIBUTE;
use crate::syntax::span::Span;

use super::edit::{whole_line, EditQueue};

/// What the runtime selector and the later stages know about one kernel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KernelDescriptor {
    /// Namespace-qualified record name, e.g. `demo::GameOfLife`.
    pub name: String,
    /// Output path without extension.
    pub file_location: String,
    pub has_main: bool,
    pub has_file_location: bool,
    pub has_local_size: bool,
    /// The whole record definition.
    pub span: Span,
    /// Between the record's braces.
    pub interior: Span,
}

/// A kernel found in a translation unit, with its initial edits.
#[derive(Debug)]
pub struct LocatedKernel<'a> {
    pub descriptor: KernelDescriptor,
    pub record: &'a Record,
    /// Removal of `fileLocation` and of every `_`-prefixed method.
    pub edits: EditQueue,
}

/// Every kernel-marked, complete record declaring `fileLocation` and
/// `main`, in source order. Top-level, namespace-nested and
/// record-nested definitions are all searched. `text` is the source the
/// unit was parsed from.
pub fn locate_kernels<'a>(unit: &'a TranslationUnit, text: &str) -> Vec<LocatedKernel<'a>> {
    let mut found = Vec::new();
    let mut scope = Vec::new();
    scan_items(&unit.items, text, &mut scope, &mut found);
    found
}

/// Descriptors only.
pub fn kernel_descriptors(unit: &TranslationUnit, text: &str) -> Vec<KernelDescriptor> {
    locate_kernels(unit, text)
        .into_iter()
        .map(|k| k.descriptor)
        .collect()
}

fn scan_items<'a>(
    items: &'a [Item],
    text: &str,
    scope: &mut Vec<String>,
    found: &mut Vec<LocatedKernel<'a>>,
) {
    for item in items {
        match item {
            Item::Namespace(ns) => {
                let pushed = match &ns.name {
                    Some(name) => {
                        scope.push(name.node.clone());
                        true
                    }
                    None => false,
                };
                scan_items(&ns.items, text, scope, found);
                if pushed {
                    scope.pop();
                }
            }
            Item::Record(record) => scan_record(record, text, scope, found),
            Item::Using(_) | Item::Opaque(_) => {}
        }
    }
}

fn scan_record<'a>(
    record: &'a Record,
    text: &str,
    scope: &mut Vec<String>,
    found: &mut Vec<LocatedKernel<'a>>,
) {
    let qualified = qualify(scope, &record.name.node);
    if let Some(kernel) = qualify_kernel(record, &qualified, text) {
        found.push(kernel);
    }
    if let Some(body) = &record.body {
        scope.push(record.name.node.clone());
        for member in &body.members {
            if let Member::Record(nested) = member {
                scan_record(nested, text, scope, found);
            }
        }
        scope.pop();
    }
}

fn qualify(scope: &[String], name: &str) -> String {
    if scope.is_empty() {
        name.to_string()
    } else {
        format!("{}::{}", scope.join("::"), name)
    }
}

fn qualify_kernel<'a>(record: &'a Record, name: &str, text: &str) -> Option<LocatedKernel<'a>> {
    let (attr, arg) = KERNEL_ATTRIBUTE;
    if !record.has_attribute(attr, arg) {
        return None;
    }
    let Some(body) = &record.body else {
        tracing::debug!(kernel = name, "kernel marker on a forward declaration, skipped");
        return None;
    };

    let file_location = body.members.iter().find_map(|m| match m {
        Member::Field(decl) => file_location_of(decl).map(|value| (decl, value)),
        _ => None,
    });
    let has_main = body
        .members
        .iter()
        .any(|m| matches!(m, Member::Method(method) if method.name.node == "main"));
    let has_local_size = body
        .members
        .iter()
        .any(|m| matches!(m, Member::Field(decl) if decl.name() == Some("local_size")));

    let Some((location_decl, location)) = file_location else {
        tracing::debug!(kernel = name, "no constant string fileLocation, skipped");
        return None;
    };
    if !has_main {
        tracing::debug!(kernel = name, "no main method, skipped");
        return None;
    }

    let mut edits = EditQueue::new();
    edits.remove(whole_line(text, location_decl.span));
    for member in &body.members {
        if let Member::Method(method) = member {
            if method.name.node.starts_with('_') {
                tracing::debug!(kernel = name, method = %method.name.node, "removing host-only method");
                edits.remove(whole_line(text, method.span));
            }
        }
    }

    tracing::debug!(kernel = name, file_location = %location, "located kernel");
    Some(LocatedKernel {
        descriptor: KernelDescriptor {
            name: name.to_string(),
            file_location: location.to_string(),
            has_main,
            has_file_location: true,
            has_local_size,
            span: record.span,
            interior: body.interior(),
        },
        record,
        edits,
    })
}

/// The value of a `static constexpr`/`static const` string `fileLocation`.
fn file_location_of(decl: &VarDecl) -> Option<&str> {
    if decl.name() != Some("fileLocation") {
        return None;
    }
    let constant = decl.has_spec(DeclSpec::Constexpr)
        || (decl.has_spec(DeclSpec::Static) && decl.ty.is_const());
    if !constant {
        return None;
    }
    match &decl.declarators[0].init {
        Some(Initializer::Assign { value, .. }) => consteval::eval_str(value),
        Some(Initializer::Braced(list)) if list.elems.len() == 1 => {
            consteval::eval_str(&list.elems[0])
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::parse_source;
    use crate::syntax::source::SourceFile;
    use crate::transpile::edit::apply_edits;

    fn parse(source: &str) -> (SourceFile, TranslationUnit) {
        let file = SourceFile::new("k.h", source);
        let unit = parse_source(&file).unwrap();
        (file, unit)
    }

    const GOL: &str = r#"
#include "vec.hpp"
struct [[clang::annotate("kernel")]] GameOfLife {
    static constexpr char fileLocation[] = "gol_v4";
    tc::uvec3 local_size{4, 4, 1};
    void main() {}
    void _printToConsole() { std::cout << "x"; }
};
"#;

    #[test]
    fn test_locates_marked_kernel() {
        let (file, unit) = parse(GOL);
        let kernels = kernel_descriptors(&unit, &file.text);
        assert_eq!(kernels.len(), 1);
        let k = &kernels[0];
        assert_eq!(k.name, "GameOfLife");
        assert_eq!(k.file_location, "gol_v4");
        assert!(k.has_main && k.has_file_location && k.has_local_size);
    }

    #[test]
    fn test_initial_edits_remove_boilerplate() {
        let (file, unit) = parse(GOL);
        let kernels = locate_kernels(&unit, &file.text);
        let k = &kernels[0];
        assert_eq!(k.edits.len(), 2);
        let body = apply_edits(&file.text, k.descriptor.interior, k.edits.clone().into_edits());
        assert!(!body.contains("fileLocation"));
        assert!(!body.contains("_printToConsole"));
        assert!(body.contains("tc::uvec3 local_size{4, 4, 1};"));
        assert!(body.contains("void main() {}"));
        assert!(body.lines().all(|line| line.is_empty() || !line.trim().is_empty()));
    }

    #[test]
    fn test_removed_members_take_their_lines() {
        let src = "struct [[clang::annotate(\"kernel\")]] K {\n\
                   \tstatic constexpr char fileLocation[] = \"k\";\n\
                   \tint a;\n\
                   \tvoid _dump() {}  \n\
                   \tvoid main() {}\n\
                   };\n";
        let (file, unit) = parse(src);
        let k = &locate_kernels(&unit, &file.text)[0];
        let body = apply_edits(&file.text, k.descriptor.interior, k.edits.clone().into_edits());
        assert_eq!(body, "\n\tint a;\n\tvoid main() {}\n");
    }

    #[test]
    fn test_skips_incomplete_candidates() {
        let (file, unit) = parse(
            r#"
struct [[clang::annotate("kernel")]] NoMain {
    static constexpr char fileLocation[] = "a";
};
struct [[clang::annotate("kernel")]] NoLocation {
    void main() {}
};
struct [[clang::annotate("kernel")]] Forward;
struct Unmarked {
    static constexpr char fileLocation[] = "b";
    void main() {}
};
struct [[clang::annotate("other")]] OtherAnnotation {
    static constexpr char fileLocation[] = "c";
    void main() {}
};
struct [[clang::annotate("kernel")]] NotConstant {
    char fileLocation[4] = "d";
    void main() {}
};
"#,
        );
        assert!(kernel_descriptors(&unit, &file.text).is_empty());
    }

    #[test]
    fn test_qualified_names_and_nesting() {
        let (file, unit) = parse(
            r#"
namespace demo::kernels {
struct [[clang::annotate("kernel")]] Blur {
    static constexpr char fileLocation[] = "blur";
    void main() {}
};
}
struct Outer {
    struct [[clang::annotate("kernel")]] Inner {
        static const char fileLocation[] = "inner/shader";
        void main() {}
    };
};
"#,
        );
        let names: Vec<(String, String)> = kernel_descriptors(&unit, &file.text)
            .into_iter()
            .map(|k| (k.name, k.file_location))
            .collect();
        assert_eq!(
            names,
            vec![
                ("demo::kernels::Blur".to_string(), "blur".to_string()),
                ("Outer::Inner".to_string(), "inner/shader".to_string()),
            ]
        );
    }
}
