//! Rejects host constructs GLSL cannot express.
//!
//! A single pass over a kernel's subtree. Every violation is recorded;
//! the kernel is invalid if any error was reported.

use crate::ast::*;
use crate::diagnostic::Diagnostic;
use crate::syntax::span::{Span, Spanned};

/// Host allocation functions treated like `new`.
const ALLOCATORS: &[&str] = &["malloc", "calloc", "realloc", "make_unique", "make_shared"];

/// GLSL keywords, reserved words and type names a method cannot be called.
const GLSL_RESERVED: &[&str] = &[
    // qualifiers and storage
    "attribute", "const", "uniform", "varying", "buffer", "shared", "coherent", "volatile",
    "restrict", "readonly", "writeonly", "atomic_uint", "layout", "centroid", "flat", "smooth",
    "noperspective", "patch", "sample", "invariant", "precise", "in", "out", "inout",
    "subroutine", "lowp", "mediump", "highp", "precision", "discard",
    // control flow and literals
    "break", "continue", "do", "for", "while", "switch", "case", "default", "if", "else",
    "return", "true", "false", "struct", "void",
    // scalar, vector and matrix types
    "bool", "int", "uint", "float", "double", "vec2", "vec3", "vec4", "dvec2", "dvec3",
    "dvec4", "ivec2", "ivec3", "ivec4", "uvec2", "uvec3", "uvec4", "bvec2", "bvec3", "bvec4",
    "mat2", "mat3", "mat4", "mat2x2", "mat2x3", "mat2x4", "mat3x2", "mat3x3", "mat3x4",
    "mat4x2", "mat4x3", "mat4x4", "dmat2", "dmat3", "dmat4", "dmat2x2", "dmat2x3", "dmat2x4",
    "dmat3x2", "dmat3x3", "dmat3x4", "dmat4x2", "dmat4x3", "dmat4x4",
    // opaque types
    "sampler1D", "sampler2D", "sampler3D", "samplerCube", "sampler2DRect", "samplerBuffer",
    "sampler1DArray", "sampler2DArray", "samplerCubeArray", "sampler2DMS",
    "sampler2DMSArray", "sampler1DShadow", "sampler2DShadow", "samplerCubeShadow",
    "isampler1D", "isampler2D", "isampler3D", "usampler1D", "usampler2D", "usampler3D",
    "image1D", "image2D", "image3D", "imageCube", "image2DRect", "imageBuffer",
    "image1DArray", "image2DArray", "imageCubeArray", "image2DMS", "image2DMSArray",
    "iimage1D", "iimage2D", "iimage3D", "uimage1D", "uimage2D", "uimage3D",
    // reserved for future use
    "common", "partition", "active", "asm", "class", "union", "enum", "typedef", "template",
    "this", "resource", "goto", "inline", "noinline", "public", "static", "extern",
    "external", "interface", "long", "short", "half", "fixed", "unsigned", "superp", "input",
    "output", "hvec2", "hvec3", "hvec4", "fvec2", "fvec3", "fvec4", "sampler3DRect",
    "filter", "sizeof", "cast", "namespace", "using",
];

pub fn is_glsl_reserved(name: &str) -> bool {
    GLSL_RESERVED.contains(&name)
}

/// Validate one kernel record. Returns every violation found.
pub fn validate_kernel(record: &Record) -> Vec<Diagnostic> {
    let mut v = Validator {
        diagnostics: Vec::new(),
    };
    v.check_record(record);
    tracing::debug!(
        kernel = %record.name.node,
        violations = v.diagnostics.len(),
        "validated kernel"
    );
    v.diagnostics
}

struct Validator {
    diagnostics: Vec<Diagnostic>,
}

impl Validator {
    fn error_with_help(&mut self, msg: String, span: Span, help: &str) {
        self.diagnostics
            .push(Diagnostic::error(msg, span).with_help(help.to_string()));
    }

    fn check_record(&mut self, record: &Record) {
        let Some(body) = &record.body else {
            return;
        };
        for member in &body.members {
            match member {
                Member::Field(decl) => {
                    self.check_field(decl);
                    for d in &decl.declarators {
                        self.check_initializer(d.init.as_ref());
                    }
                }
                Member::Method(method) => self.check_method(method),
                Member::Record(nested) => self.check_record(nested),
                Member::Template(span) => self.error_with_help(
                    format!("template declaration inside kernel '{}'", record.name.node),
                    *span,
                    "GLSL has no generics; instantiate the code by hand",
                ),
                Member::Access(..) | Member::Using(_) | Member::Opaque(_) => {}
            }
        }
    }

    fn check_field(&mut self, decl: &VarDecl) {
        for d in &decl.declarators {
            if decl.ty.is_pointer_or_ref() || !d.ptr_ops.is_empty() {
                let kind = decl
                    .ty
                    .ptr_ops
                    .iter()
                    .chain(&d.ptr_ops)
                    .map(|p| p.node)
                    .next();
                let what = match kind {
                    Some(PtrOp::Pointer) => "pointer",
                    _ => "reference",
                };
                self.diagnostics.push(
                    Diagnostic::error(
                        format!("field '{}' has {} type", d.name.node, what),
                        d.name.span,
                    )
                    .with_note(format!("GLSL has no {} types", what))
                    .with_help("kernel fields must be values, bindings or uniforms".to_string()),
                );
            }
        }
    }

    fn check_method(&mut self, method: &Method) {
        if method.kind == MethodKind::Normal && is_glsl_reserved(&method.name.node) {
            self.error_with_help(
                format!("method name '{}' is a reserved word in GLSL", method.name.node),
                method.name.span,
                "rename the method",
            );
        }
        for p in &method.params {
            if let Some(default) = &p.default {
                self.check_expr(default);
            }
        }
        if let Some(body) = &method.body {
            self.check_block(body);
        }
    }

    fn check_initializer(&mut self, init: Option<&Initializer>) {
        match init {
            None => {}
            Some(Initializer::Assign { value, .. }) => self.check_expr(value),
            Some(Initializer::Braced(list)) => self.check_exprs(&list.elems),
            Some(Initializer::Paren { args, .. }) => self.check_exprs(args),
        }
    }

    fn check_allocator(&mut self, path: &Path, span: Span) {
        let Some(last) = path.last() else {
            return;
        };
        if ALLOCATORS.contains(&last.name.node.as_str()) {
            self.error_with_help(
                format!("dynamic allocation with '{}' in a kernel", path.joined()),
                span,
                "GPU kernels cannot allocate; use a fixed-size array or a buffer binding",
            );
        }
    }

    fn check_block(&mut self, block: &Block) {
        for stmt in &block.stmts {
            self.check_stmt(stmt);
        }
    }

    fn check_stmt(&mut self, stmt: &Spanned<Stmt>) {
        match &stmt.node {
            Stmt::Block(block) => self.check_block(block),
            Stmt::Decl(decl) => {
                for d in &decl.declarators {
                    self.check_initializer(d.init.as_ref());
                }
            }
            Stmt::Expr(e) | Stmt::Case(e) | Stmt::Return(Some(e)) => self.check_expr(e),
            Stmt::If {
                cond,
                then_branch,
                else_branch,
            } => {
                self.check_expr(cond);
                self.check_stmt(then_branch);
                if let Some(e) = else_branch {
                    self.check_stmt(e);
                }
            }
            Stmt::For {
                init,
                cond,
                step,
                body,
            } => {
                if let Some(init) = init {
                    self.check_stmt(init);
                }
                if let Some(cond) = cond {
                    self.check_expr(cond);
                }
                if let Some(step) = step {
                    self.check_expr(step);
                }
                self.check_stmt(body);
            }
            Stmt::RangeFor { range, body, .. } => {
                self.check_expr(range);
                self.check_stmt(body);
            }
            Stmt::While { cond, body }
            | Stmt::DoWhile { body, cond }
            | Stmt::Switch { cond, body } => {
                self.check_expr(cond);
                self.check_stmt(body);
            }
            Stmt::Return(None)
            | Stmt::Default
            | Stmt::Break
            | Stmt::Continue
            | Stmt::Using(_)
            | Stmt::Empty
            | Stmt::Opaque => {}
        }
    }

    fn check_exprs(&mut self, exprs: &[Spanned<Expr>]) {
        for e in exprs {
            self.check_expr(e);
        }
    }

    fn check_expr(&mut self, expr: &Spanned<Expr>) {
        match &expr.node {
            Expr::New { args, .. } => {
                self.error_with_help(
                    "dynamic allocation with 'new' in a kernel".to_string(),
                    expr.span,
                    "GPU kernels cannot allocate; use a fixed-size array or a buffer binding",
                );
                self.check_exprs(args);
            }
            Expr::Delete { operand, .. } => {
                self.error_with_help(
                    "'delete' in a kernel".to_string(),
                    expr.span,
                    "GPU kernels cannot allocate or free memory",
                );
                self.check_expr(operand);
            }
            Expr::Lambda { .. } => self.error_with_help(
                "lambda expression in a kernel".to_string(),
                expr.span,
                "GLSL has no closures; move the body into a kernel method",
            ),
            Expr::Call { callee, args } => {
                if let Expr::Path(path) = &Expr::unparen(callee).node {
                    self.check_allocator(path, expr.span);
                }
                self.check_expr(callee);
                self.check_exprs(args);
            }
            // `std::make_unique<T>(...)` parses as a construction.
            Expr::Construct { ty, args, .. } => {
                if let TypeBase::Path(path) = &ty.base {
                    self.check_allocator(path, expr.span);
                }
                self.check_exprs(args);
            }
            Expr::Paren(inner)
            | Expr::Unary { operand: inner, .. }
            | Expr::Postfix { operand: inner, .. }
            | Expr::Cast { operand: inner, .. } => self.check_expr(inner),
            Expr::Member { base, .. } => self.check_expr(base),
            Expr::Binary { lhs, rhs, .. } | Expr::Assign { lhs, rhs, .. } => {
                self.check_expr(lhs);
                self.check_expr(rhs);
            }
            Expr::Conditional {
                cond,
                then_expr,
                else_expr,
            } => {
                self.check_expr(cond);
                self.check_expr(then_expr);
                self.check_expr(else_expr);
            }
            Expr::Index { base, index, .. } => {
                self.check_expr(base);
                self.check_expr(index);
            }
            Expr::InitList(list) => self.check_exprs(&list.elems),
            Expr::Literal(_) | Expr::Path(_) | Expr::This | Expr::Sizeof => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::parse_source;
    use crate::syntax::source::SourceFile;

    fn kernel(members: &str) -> (SourceFile, Record) {
        let src = format!(
            "struct [[clang::annotate(\"kernel\")]] K {{\n\
             static constexpr char fileLocation[] = \"k\";\n\
             {}\n\
             }};\n",
            members
        );
        let file = SourceFile::new("k.h", src);
        let unit = parse_source(&file).unwrap();
        let record = match unit.items.into_iter().next() {
            Some(Item::Record(r)) => r,
            other => panic!("expected record, got {:?}", other),
        };
        (file, record)
    }

    fn messages(members: &str) -> Vec<String> {
        let (_, record) = kernel(members);
        validate_kernel(&record)
            .into_iter()
            .map(|d| d.message)
            .collect()
    }

    #[test]
    fn test_clean_kernel_passes() {
        let errors = messages(
            "tc::uvec3 local_size{8, 8, 1};\n\
             tc::uint square(tc::uint x) { return x * x; }\n\
             void main() { tc::uint y = square(3u); }",
        );
        assert!(errors.is_empty(), "{:?}", errors);
    }

    #[test]
    fn test_rejects_new_and_delete() {
        let errors = messages("void main() { int* p = new int[4]; delete[] p; }");
        assert_eq!(errors.len(), 2, "{:?}", errors);
        assert!(errors[0].contains("'new'"));
        assert!(errors[1].contains("'delete'"));
    }

    #[test]
    fn test_rejects_allocation_calls() {
        let errors = messages("void main() { auto p = std::make_unique<int>(3); void* q = malloc(8); }");
        assert_eq!(errors.len(), 2, "{:?}", errors);
        assert!(errors[0].contains("std::make_unique"));
        assert!(errors[1].contains("malloc"));
    }

    #[test]
    fn test_rejects_lambda() {
        let errors = messages("void main() { auto f = [](int x) { return x; }; }");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("lambda"));
    }

    #[test]
    fn test_rejects_template_member() {
        let errors = messages("template <typename T> T twice(T x) { return x + x; }\nvoid main() {}");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("template"));
    }

    #[test]
    fn test_rejects_pointer_and_reference_fields() {
        let errors = messages("int* data;\nint& ref;\nint value, *other;\nvoid main() {}");
        assert_eq!(
            errors,
            vec![
                "field 'data' has pointer type".to_string(),
                "field 'ref' has reference type".to_string(),
                "field 'other' has pointer type".to_string(),
            ]
        );
    }

    #[test]
    fn test_pointer_field_carries_note_and_help() {
        let (_, record) = kernel("int* data;\nvoid main() {}");
        let diags = validate_kernel(&record);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].notes, vec!["GLSL has no pointer types".to_string()]);
        assert_eq!(
            diags[0].help.as_deref(),
            Some("kernel fields must be values, bindings or uniforms")
        );
    }

    #[test]
    fn test_rejects_reserved_method_names() {
        let errors = messages("float sample(float x) { return x; }\nvoid main() {}");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("'sample'"));
        assert!(!is_glsl_reserved("main"));
        assert!(is_glsl_reserved("ivec3"));
    }

    #[test]
    fn test_collects_all_violations_in_nested_records() {
        let errors = messages(
            "struct Helper { float* scratch; };\n\
             void main() { auto f = [] {}; int* p = new int; }",
        );
        assert_eq!(errors.len(), 3, "{:?}", errors);
    }

    #[test]
    fn test_violation_location() {
        let (file, record) = kernel("void main() {\n    int* p = new int;\n}");
        let diags = validate_kernel(&record);
        assert_eq!(diags.len(), 1);
        assert_eq!(
            diags[0].render_line(&file),
            "k.h(4,14): error: dynamic allocation with 'new' in a kernel"
        );
    }
}
