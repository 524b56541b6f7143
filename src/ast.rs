//! Kernel-dialect syntax tree.
//!
//! Every node keeps byte spans into the original source, because the
//! transpiler never re-prints the tree: it rewrites the source text in
//! place through range edits.

use crate::syntax::span::{Span, Spanned};

/// A parsed input file.
#[derive(Clone, Debug)]
pub struct TranslationUnit {
    pub items: Vec<Item>,
}

/// Top-level (or namespace-level) items.
#[derive(Clone, Debug)]
pub enum Item {
    Namespace(Namespace),
    Record(Record),
    Using(UsingDecl),
    /// Anything the frontend does not model (free functions, templates,
    /// enums, globals). Skipped as a balanced token region.
    Opaque(Span),
}

#[derive(Clone, Debug)]
pub struct Namespace {
    /// `None` for anonymous namespaces. Nested `a::b` names are kept joined.
    pub name: Option<Spanned<String>>,
    pub items: Vec<Item>,
    pub span: Span,
}

/// `using namespace x;`, `using x::y;` or `using alias = T;`.
#[derive(Clone, Debug)]
pub struct UsingDecl {
    pub kind: UsingKind,
    /// Through the terminating `;`.
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UsingKind {
    Directive(String),
    Declaration(String),
    Alias(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordKey {
    Struct,
    Class,
    Union,
}

/// An attribute inside `[[...]]`, e.g. `clang::annotate("kernel")`.
#[derive(Clone, Debug, PartialEq)]
pub struct Attribute {
    /// Scoped name, `::`-joined.
    pub name: String,
    /// String-literal arguments, in order. Non-string arguments are dropped.
    pub args: Vec<String>,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub struct Record {
    pub key: RecordKey,
    pub attributes: Vec<Attribute>,
    pub name: Spanned<String>,
    /// `None` for a forward declaration.
    pub body: Option<RecordBody>,
    /// From the class key (or leading attribute) through the closing `;`.
    pub span: Span,
}

impl Record {
    pub fn has_attribute(&self, name: &str, arg: &str) -> bool {
        self.attributes
            .iter()
            .any(|a| a.name == name && a.args.iter().any(|x| x == arg))
    }
}

#[derive(Clone, Debug)]
pub struct RecordBody {
    pub members: Vec<Member>,
    pub open: Span,
    pub close: Span,
}

impl RecordBody {
    /// The text between the braces.
    pub fn interior(&self) -> Span {
        Span::new(self.open.end, self.close.start)
    }
}

#[derive(Clone, Debug)]
pub enum Member {
    Field(VarDecl),
    Method(Method),
    Record(Record),
    /// `template <...> ...` inside a record.
    Template(Span),
    Access(AccessSpecifier, Span),
    Using(UsingDecl),
    Opaque(Span),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessSpecifier {
    Public,
    Private,
    Protected,
}

/// Declaration specifiers that are not part of the type itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeclSpec {
    Static,
    Constexpr,
    Consteval,
    Inline,
    Virtual,
    Mutable,
    Extern,
    ThreadLocal,
    Explicit,
    Friend,
}

/// A variable declaration: a field, a static member, or a local.
#[derive(Clone, Debug)]
pub struct VarDecl {
    pub specifiers: Vec<Spanned<DeclSpec>>,
    pub ty: TypeExpr,
    pub declarators: Vec<Declarator>,
    /// Through the terminating `;` (when there is one).
    pub span: Span,
}

impl VarDecl {
    pub fn has_spec(&self, spec: DeclSpec) -> bool {
        self.specifiers.iter().any(|s| s.node == spec)
    }

    /// Name of the first declarator.
    pub fn name(&self) -> Option<&str> {
        self.declarators.first().map(|d| d.name.node.as_str())
    }
}

#[derive(Clone, Debug)]
pub struct Declarator {
    /// Pointer/reference operators written on this declarator, beyond the
    /// ones folded into the declaration's type.
    pub ptr_ops: Vec<Spanned<PtrOp>>,
    pub name: Spanned<String>,
    pub array_dims: Vec<ArrayDim>,
    pub init: Option<Initializer>,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub struct ArrayDim {
    pub size: Option<Spanned<Expr>>,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub enum Initializer {
    /// `= expr` (the expression may be a brace list).
    Assign { eq: Span, value: Spanned<Expr> },
    /// `name{...}`
    Braced(InitList),
    /// `name(...)`
    Paren {
        args: Vec<Spanned<Expr>>,
        open: Span,
        close: Span,
    },
}

#[derive(Clone, Debug)]
pub struct InitList {
    pub elems: Vec<Spanned<Expr>>,
    pub open: Span,
    pub close: Span,
}

impl InitList {
    pub fn span(&self) -> Span {
        self.open.merge(self.close)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MethodKind {
    Normal,
    Constructor,
    Destructor,
    Operator,
    Conversion,
}

#[derive(Clone, Debug)]
pub struct Method {
    pub specifiers: Vec<Spanned<DeclSpec>>,
    /// `None` for constructors, destructors and conversion operators.
    pub ret: Option<TypeExpr>,
    pub kind: MethodKind,
    pub name: Spanned<String>,
    pub params: Vec<Param>,
    /// Trailing `const`, `noexcept(...)`, `override`, `final`, `&`, `&&`.
    pub trailing: Vec<Spanned<String>>,
    pub body: Option<Block>,
    /// Whole declaration; for definitions through the closing `}`.
    pub span: Span,
}

#[derive(Clone, Debug)]
pub struct Param {
    pub ty: TypeExpr,
    pub name: Option<Spanned<String>>,
    pub array_dims: Vec<ArrayDim>,
    pub default: Option<Spanned<Expr>>,
    pub span: Span,
}

// --- Types ---

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cv {
    Const,
    Volatile,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PtrOp {
    Pointer,
    LRef,
    RRef,
}

/// A type as written in source.
#[derive(Clone, Debug)]
pub struct TypeExpr {
    pub cv: Vec<Spanned<Cv>>,
    pub base: TypeBase,
    pub base_span: Span,
    pub ptr_ops: Vec<Spanned<PtrOp>>,
    pub span: Span,
}

impl TypeExpr {
    pub fn is_const(&self) -> bool {
        self.cv.iter().any(|c| c.node == Cv::Const)
    }

    pub fn is_pointer_or_ref(&self) -> bool {
        !self.ptr_ops.is_empty()
    }
}

#[derive(Clone, Debug)]
pub enum TypeBase {
    /// Builtin words in source order, e.g. `["unsigned", "int"]`.
    Builtin(Vec<String>),
    Path(Path),
    Auto,
    /// `decltype(...)` and other forms the frontend does not look into.
    Opaque,
}

/// A possibly qualified name: `tc::vec_base<float, 3>`, `::std::array<T, 4>`.
#[derive(Clone, Debug)]
pub struct Path {
    pub global: bool,
    pub segments: Vec<PathSegment>,
    pub span: Span,
}

impl Path {
    pub fn last(&self) -> Option<&PathSegment> {
        self.segments.last()
    }

    /// Segment names joined with `::`, template arguments omitted.
    pub fn joined(&self) -> String {
        self.segments
            .iter()
            .map(|s| s.name.node.as_str())
            .collect::<Vec<_>>()
            .join("::")
    }

    /// Names of every segment but the last.
    pub fn qualifier(&self) -> Vec<&str> {
        let n = self.segments.len().saturating_sub(1);
        self.segments[..n]
            .iter()
            .map(|s| s.name.node.as_str())
            .collect()
    }

    /// The span from the path start to the start of the last segment
    /// (`tc::` in `tc::uvec3`). Empty for unqualified paths.
    pub fn qualifier_span(&self) -> Span {
        match self.segments.last() {
            Some(last) => Span::new(self.span.start, last.name.span.start),
            None => Span::point(self.span.start),
        }
    }
}

#[derive(Clone, Debug)]
pub struct PathSegment {
    pub name: Spanned<String>,
    pub template_args: Option<TemplateArgs>,
}

#[derive(Clone, Debug)]
pub struct TemplateArgs {
    pub args: Vec<TemplateArg>,
    pub open: Span,
    pub close: Span,
}

#[derive(Clone, Debug)]
pub enum TemplateArg {
    Type(TypeExpr),
    Expr(Spanned<Expr>),
}

impl TemplateArg {
    pub fn span(&self) -> Span {
        match self {
            TemplateArg::Type(t) => t.span,
            TemplateArg::Expr(e) => e.span,
        }
    }
}

// --- Statements ---

#[derive(Clone, Debug)]
pub struct Block {
    pub stmts: Vec<Spanned<Stmt>>,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub enum Stmt {
    Block(Block),
    Decl(VarDecl),
    Expr(Spanned<Expr>),
    If {
        cond: Spanned<Expr>,
        then_branch: Box<Spanned<Stmt>>,
        else_branch: Option<Box<Spanned<Stmt>>>,
    },
    For {
        init: Option<Box<Spanned<Stmt>>>,
        cond: Option<Spanned<Expr>>,
        step: Option<Spanned<Expr>>,
        body: Box<Spanned<Stmt>>,
    },
    RangeFor {
        var: VarDecl,
        range: Spanned<Expr>,
        body: Box<Spanned<Stmt>>,
    },
    While {
        cond: Spanned<Expr>,
        body: Box<Spanned<Stmt>>,
    },
    DoWhile {
        body: Box<Spanned<Stmt>>,
        cond: Spanned<Expr>,
    },
    Switch {
        cond: Spanned<Expr>,
        body: Box<Spanned<Stmt>>,
    },
    Case(Spanned<Expr>),
    Default,
    Break,
    Continue,
    Return(Option<Spanned<Expr>>),
    Using(UsingDecl),
    Empty,
    /// `static_assert`, `typedef`, `goto`, labels.
    Opaque,
}

// --- Expressions ---

#[derive(Clone, Debug, PartialEq)]
pub enum Literal {
    Int { value: u64, suffix: String },
    Float { value: f64, suffix: String },
    Bool(bool),
    Char(char),
    Str { value: String, suffix: String },
    Nullptr,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Plus,
    Not,
    BitNot,
    Deref,
    AddrOf,
    PreInc,
    PreDec,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PostfixOp {
    Inc,
    Dec,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinOp {
    Mul,
    Div,
    Rem,
    Add,
    Sub,
    Shl,
    Shr,
    Lt,
    Gt,
    Le,
    Ge,
    Eq,
    Ne,
    BitAnd,
    BitXor,
    BitOr,
    And,
    Or,
    Comma,
}

impl BinOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Rem => "%",
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Shl => "<<",
            BinOp::Shr => ">>",
            BinOp::Lt => "<",
            BinOp::Gt => ">",
            BinOp::Le => "<=",
            BinOp::Ge => ">=",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::BitAnd => "&",
            BinOp::BitXor => "^",
            BinOp::BitOr => "|",
            BinOp::And => "&&",
            BinOp::Or => "||",
            BinOp::Comma => ",",
        }
    }

    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinOp::Lt | BinOp::Gt | BinOp::Le | BinOp::Ge | BinOp::Eq | BinOp::Ne
        )
    }

    pub fn is_logical(&self) -> bool {
        matches!(self, BinOp::And | BinOp::Or)
    }
}

/// `=` or a compound assignment operator (`+=` carries `Some(Add)`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AssignOp(pub Option<BinOp>);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CastKind {
    Static,
    Reinterpret,
    Const,
    Dynamic,
    /// `(T)e`
    CStyle,
}

#[derive(Clone, Debug)]
pub enum Expr {
    Literal(Literal),
    Path(Path),
    This,
    Paren(Box<Spanned<Expr>>),
    Unary {
        op: UnaryOp,
        operand: Box<Spanned<Expr>>,
    },
    Postfix {
        op: PostfixOp,
        operand: Box<Spanned<Expr>>,
    },
    Binary {
        op: BinOp,
        lhs: Box<Spanned<Expr>>,
        rhs: Box<Spanned<Expr>>,
    },
    Assign {
        op: AssignOp,
        lhs: Box<Spanned<Expr>>,
        rhs: Box<Spanned<Expr>>,
    },
    Conditional {
        cond: Box<Spanned<Expr>>,
        then_expr: Box<Spanned<Expr>>,
        else_expr: Box<Spanned<Expr>>,
    },
    Call {
        callee: Box<Spanned<Expr>>,
        args: Vec<Spanned<Expr>>,
    },
    /// Functional cast / temporary: `T(args)` or `T{args}` where `T` is a
    /// builtin type word or a path with template arguments.
    Construct {
        ty: TypeExpr,
        args: Vec<Spanned<Expr>>,
        braced: bool,
        open: Span,
        close: Span,
    },
    Index {
        base: Box<Spanned<Expr>>,
        index: Box<Spanned<Expr>>,
        open: Span,
        close: Span,
    },
    Member {
        base: Box<Spanned<Expr>>,
        member: Spanned<String>,
        arrow: bool,
    },
    Cast {
        kind: CastKind,
        ty: TypeExpr,
        operand: Box<Spanned<Expr>>,
    },
    InitList(InitList),
    New {
        ty: TypeExpr,
        args: Vec<Spanned<Expr>>,
    },
    Delete {
        array: bool,
        operand: Box<Spanned<Expr>>,
    },
    Lambda {
        body: Block,
    },
    Sizeof,
}

impl Expr {
    /// Strip any number of enclosing parentheses.
    pub fn unparen(expr: &Spanned<Expr>) -> &Spanned<Expr> {
        match &expr.node {
            Expr::Paren(inner) => Expr::unparen(inner),
            _ => expr,
        }
    }
}
