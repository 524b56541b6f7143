use super::*;
use crate::syntax::lexer::Lexer;

fn parse(source: &str) -> TranslationUnit {
    let (tokens, lex_errors) = Lexer::new(source).tokenize();
    assert!(lex_errors.is_empty(), "lex errors: {:?}", lex_errors);
    match Parser::new(tokens).parse_translation_unit() {
        Ok(unit) => unit,
        Err(errors) => panic!("parse errors: {:?}", errors),
    }
}

fn parse_err(source: &str) -> Vec<Diagnostic> {
    let (tokens, _) = Lexer::new(source).tokenize();
    match Parser::new(tokens).parse_translation_unit() {
        Ok(_) => panic!("expected parse failure"),
        Err(errors) => errors,
    }
}

fn only_record(unit: &TranslationUnit) -> &Record {
    unit.items
        .iter()
        .find_map(|item| match item {
            Item::Record(r) => Some(r),
            _ => None,
        })
        .expect("record")
}

fn members(record: &Record) -> &[Member] {
    &record.body.as_ref().expect("body").members
}

fn method<'a>(record: &'a Record, name: &str) -> &'a Method {
    members(record)
        .iter()
        .find_map(|m| match m {
            Member::Method(m) if m.name.node == name => Some(m),
            _ => None,
        })
        .expect("method")
}

fn field<'a>(record: &'a Record, name: &str) -> &'a VarDecl {
    members(record)
        .iter()
        .find_map(|m| match m {
            Member::Field(f) if f.name() == Some(name) => Some(f),
            _ => None,
        })
        .expect("field")
}

/// Parse `body` as the statements of a kernel method.
fn stmts(body: &str) -> Vec<Spanned<Stmt>> {
    let source = format!(
        "struct [[clang::annotate(\"kernel\")]] K {{ void main() {{ {} }} }};",
        body
    );
    let unit = parse(&source);
    let record = only_record(&unit);
    method(record, "main")
        .body
        .as_ref()
        .expect("body")
        .stmts
        .clone()
}

fn expr_of(stmt: &Spanned<Stmt>) -> &Spanned<Expr> {
    match &stmt.node {
        Stmt::Expr(e) => e,
        other => panic!("expected expression statement, got {:?}", other),
    }
}

// ── records ──

#[test]
fn test_kernel_record_with_attribute() {
    let unit = parse(
        r#"
struct [[clang::annotate("kernel")]] Gol {
    static constexpr char fileLocation[] = "gol_v4";
    tc::uvec3 local_size{4, 4, 1};
    tc::BufferBinding<tc::uint, 0> inData;
    void main() {}
};
"#,
    );
    let record = only_record(&unit);
    assert_eq!(record.name.node, "Gol");
    assert_eq!(record.key, RecordKey::Struct);
    assert!(record.has_attribute("clang::annotate", "kernel"));
    assert_eq!(members(record).len(), 4);

    let file_location = field(record, "fileLocation");
    assert!(file_location.has_spec(DeclSpec::Static));
    assert!(file_location.has_spec(DeclSpec::Constexpr));
    assert_eq!(file_location.declarators[0].array_dims.len(), 1);
    match &file_location.declarators[0].init {
        Some(Initializer::Assign { value, .. }) => assert!(matches!(
            &value.node,
            Expr::Literal(Literal::Str { value, .. }) if value == "gol_v4"
        )),
        other => panic!("unexpected initializer {:?}", other),
    }

    let local_size = field(record, "local_size");
    match &local_size.declarators[0].init {
        Some(Initializer::Braced(list)) => assert_eq!(list.elems.len(), 3),
        other => panic!("unexpected initializer {:?}", other),
    }
}

#[test]
fn test_template_arguments_on_field_type() {
    let unit = parse(
        "struct K { tc::ImageBinding<tc::GPUFormat::R8UI, tc::Dim::D2, tc::cpu::R8UI, 0, 1> img; };",
    );
    let record = only_record(&unit);
    let img = field(record, "img");
    let TypeBase::Path(path) = &img.ty.base else {
        panic!("expected path type");
    };
    assert_eq!(path.joined(), "tc::ImageBinding");
    assert_eq!(path.qualifier(), vec!["tc"]);
    let args = path.last().and_then(|s| s.template_args.as_ref()).expect("args");
    assert_eq!(args.args.len(), 5);
    assert!(matches!(&args.args[0], TemplateArg::Type(_)));
    assert!(matches!(
        &args.args[3],
        TemplateArg::Expr(e) if matches!(e.node, Expr::Literal(Literal::Int { value: 0, .. }))
    ));
}

#[test]
fn test_nested_template_closers() {
    let unit = parse("struct K { std::array<tc::vec_base<int, 2>, 8> offsets; };");
    let record = only_record(&unit);
    let offsets = field(record, "offsets");
    let TypeBase::Path(path) = &offsets.ty.base else {
        panic!("expected path type");
    };
    let args = path.last().and_then(|s| s.template_args.as_ref()).expect("args");
    assert_eq!(args.args.len(), 2);
}

#[test]
fn test_methods_and_specifiers() {
    let unit = parse(
        r#"
class K {
public:
    K(int a) : x(a), y{a} {}
    ~K() {}
    static inline int twice(const int& v) const noexcept { return v * 2; }
    tc::uint& operator[](int i);
    void _debug() {}
private:
    int x, y;
};
"#,
    );
    let record = only_record(&unit);
    assert_eq!(record.key, RecordKey::Class);
    assert!(matches!(members(record)[0], Member::Access(AccessSpecifier::Public, _)));

    let ctor = method(record, "K");
    assert_eq!(ctor.kind, MethodKind::Constructor);
    assert!(ctor.ret.is_none());

    assert_eq!(method(record, "~K").kind, MethodKind::Destructor);

    let twice = method(record, "twice");
    assert_eq!(twice.specifiers.len(), 2);
    assert_eq!(twice.params.len(), 1);
    assert!(twice.params[0].ty.is_pointer_or_ref());
    let trailing: Vec<&str> = twice.trailing.iter().map(|t| t.node.as_str()).collect();
    assert_eq!(trailing, vec!["const", "noexcept"]);

    let index = method(record, "operator[]");
    assert_eq!(index.kind, MethodKind::Operator);
    assert!(index.body.is_none());

    let xy = field(record, "x");
    assert_eq!(xy.declarators.len(), 2);
}

#[test]
fn test_pointer_and_reference_fields() {
    let unit = parse("struct K { int* p; float &r; int a, *b; };");
    let record = only_record(&unit);
    assert!(field(record, "p").ty.is_pointer_or_ref());
    assert!(field(record, "r").ty.is_pointer_or_ref());
    let ab = field(record, "a");
    assert!(!ab.ty.is_pointer_or_ref());
    assert_eq!(ab.declarators[1].ptr_ops.len(), 1);
}

#[test]
fn test_nested_records_and_templates_in_kernel() {
    let unit = parse(
        r#"
struct [[clang::annotate("kernel")]] K {
    struct Inner { int v; };
    template <typename T> T id(T t) { return t; }
    void main() {}
};
"#,
    );
    let record = only_record(&unit);
    assert!(matches!(members(record)[0], Member::Record(ref r) if r.name.node == "Inner"));
    assert!(matches!(members(record)[1], Member::Template(_)));
}

#[test]
fn test_interior_span_excludes_braces() {
    let source = "struct K { int a; };";
    let unit = parse(source);
    let body = only_record(&unit).body.as_ref().expect("body");
    assert_eq!(&source[body.interior().range()], " int a; ");
}

// ── top level ──

#[test]
fn test_namespaces_using_and_opaque_items() {
    let unit = parse(
        r#"
#include <vector>
using namespace tc;
namespace demo::kernels {
    inline int helper(int x) { return x + 1; }
    template <typename T> struct Box { T v; };
    enum class Mode { A, B };
    struct Plain { int v; };
}
int main() { return 0; }
"#,
    );
    assert!(matches!(
        &unit.items[0],
        Item::Using(UsingDecl { kind: UsingKind::Directive(ns), .. }) if ns == "tc"
    ));
    let Item::Namespace(ns) = &unit.items[1] else {
        panic!("expected namespace");
    };
    assert_eq!(ns.name.as_ref().map(|n| n.node.as_str()), Some("demo::kernels"));
    let records: Vec<&str> = ns
        .items
        .iter()
        .filter_map(|i| match i {
            Item::Record(r) => Some(r.name.node.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(records, vec!["Plain"]);
    assert!(matches!(unit.items.last(), Some(Item::Opaque(_))));
}

#[test]
fn test_unmarked_record_tolerates_unmodelled_members() {
    let unit = parse(
        r#"
struct Host {
    auto f() -> decltype(auto) { return [this](auto&&... xs) { return sizeof...(xs); }; }
    int ok;
};
"#,
    );
    let record = only_record(&unit);
    assert_eq!(field(record, "ok").name(), Some("ok"));
}

#[test]
fn test_kernel_parse_errors_are_fatal() {
    let errors = parse_err(
        r#"
struct [[clang::annotate("kernel")]] K {
    void main() { int x = ; }
};
"#,
    );
    assert!(!errors.is_empty());
}

// ── statements ──

#[test]
fn test_local_declarations() {
    let body = stmts(
        r#"
        tc::uvec2 gId = tc::gl_GlobalInvocationID["xy"_sw];
        unsigned int count = 0u;
        auto v = tc::vec3(1.0f, 2.0f, 3.0f);
        int arr[3] = {1, 2, 3};
        tc::ivec2 p{1, 2};
        "#,
    );
    assert_eq!(body.len(), 5);
    for stmt in &body {
        assert!(matches!(stmt.node, Stmt::Decl(_)), "{:?}", stmt.node);
    }
    let Stmt::Decl(count) = &body[1].node else {
        unreachable!()
    };
    assert!(matches!(&count.ty.base, TypeBase::Builtin(words) if words == &["unsigned", "int"]));
    let Stmt::Decl(v) = &body[2].node else {
        unreachable!()
    };
    assert!(matches!(v.ty.base, TypeBase::Auto));
}

#[test]
fn test_expression_statements_not_declarations() {
    let body = stmts("x = 3; foo(x); a < b; outData[i] = v; std::cout << x; i++;");
    assert_eq!(body.len(), 6);
    for stmt in &body {
        assert!(matches!(stmt.node, Stmt::Expr(_)), "{:?}", stmt.node);
    }
}

#[test]
fn test_control_flow() {
    let body = stmts(
        r#"
        for (int i = 0; i < 4; ++i) { continue; }
        for (auto& c : cells) sum += c;
        while (n > 0) n--;
        do { n++; } while (n < 10);
        switch (v) { case 0: break; default: break; }
        if (a) return; else { return; }
        "#,
    );
    assert!(matches!(body[0].node, Stmt::For { .. }));
    assert!(matches!(body[1].node, Stmt::RangeFor { .. }));
    assert!(matches!(body[2].node, Stmt::While { .. }));
    assert!(matches!(body[3].node, Stmt::DoWhile { .. }));
    assert!(matches!(body[4].node, Stmt::Switch { .. }));
    assert!(matches!(body[5].node, Stmt::If { else_branch: Some(_), .. }));
}

// ── expressions ──

#[test]
fn test_swizzle_subscript() {
    let body = stmts(r#"v["wzyx"_sw];"#);
    let Expr::Index { base, index, .. } = &expr_of(&body[0]).node else {
        panic!("expected index");
    };
    assert!(matches!(base.node, Expr::Path(_)));
    assert!(matches!(
        &index.node,
        Expr::Literal(Literal::Str { value, suffix }) if value == "wzyx" && suffix == "_sw"
    ));
}

#[test]
fn test_precedence_and_shift() {
    let body = stmts("r = a + b * c >> 2 == d && e;");
    let Expr::Assign { rhs, .. } = &expr_of(&body[0]).node else {
        panic!("expected assignment");
    };
    let Expr::Binary { op, lhs, .. } = &rhs.node else {
        panic!("expected binary");
    };
    assert_eq!(*op, BinOp::And);
    let Expr::Binary { op, lhs, .. } = &lhs.node else {
        panic!("expected binary");
    };
    assert_eq!(*op, BinOp::Eq);
    assert!(matches!(lhs.node, Expr::Binary { op: BinOp::Shr, .. }));
}

#[test]
fn test_casts_and_constructs() {
    let body = stmts(
        r#"
        static_cast<int>(x);
        (uint)y;
        (y) + 1;
        tc::vec_base<float, 3>(1.0f, 2.0f, 3.0f);
        tc::uvec3{1, 2, 3};
        float(n);
        "#,
    );
    assert!(matches!(
        expr_of(&body[0]).node,
        Expr::Cast { kind: CastKind::Static, .. }
    ));
    assert!(matches!(
        expr_of(&body[1]).node,
        Expr::Cast { kind: CastKind::CStyle, .. }
    ));
    assert!(matches!(
        expr_of(&body[2]).node,
        Expr::Binary { op: BinOp::Add, .. }
    ));
    assert!(matches!(
        expr_of(&body[3]).node,
        Expr::Construct { braced: false, .. }
    ));
    assert!(matches!(
        expr_of(&body[4]).node,
        Expr::Construct { braced: true, .. }
    ));
    assert!(matches!(
        expr_of(&body[5]).node,
        Expr::Construct { braced: false, .. }
    ));
}

#[test]
fn test_comparison_not_template() {
    let body = stmts("b = i < N && j > 0;");
    let Expr::Assign { rhs, .. } = &expr_of(&body[0]).node else {
        panic!("expected assignment");
    };
    assert!(matches!(rhs.node, Expr::Binary { op: BinOp::And, .. }));
}

#[test]
fn test_allocation_and_lambda_expressions() {
    let body = stmts(
        r#"
        int* p = new int[4];
        delete[] p;
        auto f = [&](int x) { return x + 1; };
        "#,
    );
    let Stmt::Decl(p) = &body[0].node else {
        panic!("expected declaration");
    };
    assert!(matches!(
        p.declarators[0].init,
        Some(Initializer::Assign { ref value, .. }) if matches!(value.node, Expr::New { .. })
    ));
    assert!(matches!(
        expr_of(&body[1]).node,
        Expr::Delete { array: true, .. }
    ));
    let Stmt::Decl(f) = &body[2].node else {
        panic!("expected declaration");
    };
    assert!(matches!(
        f.declarators[0].init,
        Some(Initializer::Assign { ref value, .. }) if matches!(value.node, Expr::Lambda { .. })
    ));
}

#[test]
fn test_member_access_and_calls() {
    let body = stmts("this->count = arr.size(); tc::imageStore(img, p, c);");
    let Expr::Assign { lhs, rhs, .. } = &expr_of(&body[0]).node else {
        panic!("expected assignment");
    };
    assert!(matches!(lhs.node, Expr::Member { arrow: true, .. }));
    assert!(matches!(rhs.node, Expr::Call { .. }));
    let Expr::Call { callee, args } = &expr_of(&body[1]).node else {
        panic!("expected call");
    };
    assert!(matches!(&callee.node, Expr::Path(p) if p.joined() == "tc::imageStore"));
    assert_eq!(args.len(), 3);
}

#[test]
fn test_expression_spans() {
    let source = "struct K { void f() { x = tc::uvec2(a, b); } };";
    let unit = parse(source);
    let record = only_record(&unit);
    let body = method(record, "f").body.as_ref().expect("body");
    let Expr::Assign { rhs, .. } = &expr_of(&body.stmts[0]).node else {
        panic!("expected assignment");
    };
    assert_eq!(&source[rhs.span.range()], "tc::uvec2(a, b)");
}
