/// All lexemes of the C++ kernel dialect.
///
/// Only the keywords the parser needs to structure a translation unit are
/// distinguished; contextual words (`override`, `final`, `_sw` literal
/// suffixes) stay identifiers or literal suffixes.
#[derive(Clone, Debug, PartialEq)]
pub enum Lexeme {
    // Declaration keywords
    Struct,
    Class,
    Union,
    Enum,
    Namespace,
    Using,
    Template,
    Typename,
    Typedef,
    Public,
    Private,
    Protected,
    Static,
    Constexpr,
    Consteval,
    Const,
    Volatile,
    Inline,
    Virtual,
    Mutable,
    Extern,
    ThreadLocal,
    Explicit,
    Friend,
    Operator,
    Noexcept,
    StaticAssert,
    Decltype,
    Alignas,

    // Statement keywords
    If,
    Else,
    For,
    While,
    Do,
    Switch,
    Case,
    Default,
    Break,
    Continue,
    Return,
    Goto,

    // Expression keywords
    New,
    Delete,
    This,
    True,
    False,
    Nullptr,
    Sizeof,
    StaticCast,
    ReinterpretCast,
    ConstCast,
    DynamicCast,

    // Builtin type words
    Auto,
    Void,
    Bool,
    Char,
    Short,
    Int,
    Long,
    Signed,
    Unsigned,
    Float,
    Double,

    // Symbols
    LParen,       // (
    RParen,       // )
    LBrace,       // {
    RBrace,       // }
    LBracket,     // [
    RBracket,     // ]
    Comma,        // ,
    Semicolon,    // ;
    Colon,        // :
    ColonColon,   // ::
    Dot,          // .
    Ellipsis,     // ...
    Arrow,        // ->
    Question,     // ?
    Plus,         // +
    Minus,        // -
    Star,         // *
    Slash,        // /
    Percent,      // %
    Amp,          // &
    Pipe,         // |
    Caret,        // ^
    Tilde,        // ~
    Bang,         // !
    Eq,           // =
    Lt,           // <
    Gt,           // >  (`>>` is two of these; the parser joins adjacent ones)
    LtEq,         // <=
    GtEq,         // >=
    EqEq,         // ==
    BangEq,       // !=
    AmpAmp,       // &&
    PipePipe,     // ||
    Shl,          // <<
    PlusPlus,     // ++
    MinusMinus,   // --
    PlusEq,       // +=
    MinusEq,      // -=
    StarEq,       // *=
    SlashEq,      // /=
    PercentEq,    // %=
    AmpEq,        // &=
    PipeEq,       // |=
    CaretEq,      // ^=
    ShlEq,        // <<=

    // Literals
    Integer { value: u64, suffix: String },
    FloatLit { value: f64, suffix: String },
    /// String literal; `suffix` is a user-defined literal suffix such as `_sw`.
    Str { value: String, suffix: String },
    CharLit(char),
    Ident(String),

    // End of file
    Eof,
}

impl Lexeme {
    /// Try to match an identifier string to a keyword lexeme.
    pub fn from_keyword(s: &str) -> Option<Lexeme> {
        let tok = match s {
            "struct" => Lexeme::Struct,
            "class" => Lexeme::Class,
            "union" => Lexeme::Union,
            "enum" => Lexeme::Enum,
            "namespace" => Lexeme::Namespace,
            "using" => Lexeme::Using,
            "template" => Lexeme::Template,
            "typename" => Lexeme::Typename,
            "typedef" => Lexeme::Typedef,
            "public" => Lexeme::Public,
            "private" => Lexeme::Private,
            "protected" => Lexeme::Protected,
            "static" => Lexeme::Static,
            "constexpr" => Lexeme::Constexpr,
            "consteval" => Lexeme::Consteval,
            "const" => Lexeme::Const,
            "volatile" => Lexeme::Volatile,
            "inline" => Lexeme::Inline,
            "virtual" => Lexeme::Virtual,
            "mutable" => Lexeme::Mutable,
            "extern" => Lexeme::Extern,
            "thread_local" => Lexeme::ThreadLocal,
            "explicit" => Lexeme::Explicit,
            "friend" => Lexeme::Friend,
            "operator" => Lexeme::Operator,
            "noexcept" => Lexeme::Noexcept,
            "static_assert" => Lexeme::StaticAssert,
            "decltype" => Lexeme::Decltype,
            "alignas" => Lexeme::Alignas,
            "if" => Lexeme::If,
            "else" => Lexeme::Else,
            "for" => Lexeme::For,
            "while" => Lexeme::While,
            "do" => Lexeme::Do,
            "switch" => Lexeme::Switch,
            "case" => Lexeme::Case,
            "default" => Lexeme::Default,
            "break" => Lexeme::Break,
            "continue" => Lexeme::Continue,
            "return" => Lexeme::Return,
            "goto" => Lexeme::Goto,
            "new" => Lexeme::New,
            "delete" => Lexeme::Delete,
            "this" => Lexeme::This,
            "true" => Lexeme::True,
            "false" => Lexeme::False,
            "nullptr" => Lexeme::Nullptr,
            "sizeof" => Lexeme::Sizeof,
            "static_cast" => Lexeme::StaticCast,
            "reinterpret_cast" => Lexeme::ReinterpretCast,
            "const_cast" => Lexeme::ConstCast,
            "dynamic_cast" => Lexeme::DynamicCast,
            "auto" => Lexeme::Auto,
            "void" => Lexeme::Void,
            "bool" => Lexeme::Bool,
            "char" => Lexeme::Char,
            "short" => Lexeme::Short,
            "int" => Lexeme::Int,
            "long" => Lexeme::Long,
            "signed" => Lexeme::Signed,
            "unsigned" => Lexeme::Unsigned,
            "float" => Lexeme::Float,
            "double" => Lexeme::Double,
            _ => return None,
        };
        Some(tok)
    }

    /// Spelling of a builtin type word, if this lexeme is one.
    pub fn builtin_type_word(&self) -> Option<&'static str> {
        match self {
            Lexeme::Void => Some("void"),
            Lexeme::Bool => Some("bool"),
            Lexeme::Char => Some("char"),
            Lexeme::Short => Some("short"),
            Lexeme::Int => Some("int"),
            Lexeme::Long => Some("long"),
            Lexeme::Signed => Some("signed"),
            Lexeme::Unsigned => Some("unsigned"),
            Lexeme::Float => Some("float"),
            Lexeme::Double => Some("double"),
            _ => None,
        }
    }

    /// Human-readable description for error messages.
    pub fn description(&self) -> String {
        match self {
            Lexeme::Integer { value, .. } => format!("integer '{}'", value),
            Lexeme::FloatLit { value, .. } => format!("float '{}'", value),
            Lexeme::Str { value, .. } => format!("string \"{}\"", value),
            Lexeme::CharLit(c) => format!("character '{}'", c),
            Lexeme::Ident(s) => format!("identifier '{}'", s),
            Lexeme::Eof => "end of file".to_string(),
            other => format!("'{}'", other.spelling()),
        }
    }

    /// Source spelling of keywords and symbols.
    pub fn spelling(&self) -> &'static str {
        match self {
            Lexeme::Struct => "struct",
            Lexeme::Class => "class",
            Lexeme::Union => "union",
            Lexeme::Enum => "enum",
            Lexeme::Namespace => "namespace",
            Lexeme::Using => "using",
            Lexeme::Template => "template",
            Lexeme::Typename => "typename",
            Lexeme::Typedef => "typedef",
            Lexeme::Public => "public",
            Lexeme::Private => "private",
            Lexeme::Protected => "protected",
            Lexeme::Static => "static",
            Lexeme::Constexpr => "constexpr",
            Lexeme::Consteval => "consteval",
            Lexeme::Const => "const",
            Lexeme::Volatile => "volatile",
            Lexeme::Inline => "inline",
            Lexeme::Virtual => "virtual",
            Lexeme::Mutable => "mutable",
            Lexeme::Extern => "extern",
            Lexeme::ThreadLocal => "thread_local",
            Lexeme::Explicit => "explicit",
            Lexeme::Friend => "friend",
            Lexeme::Operator => "operator",
            Lexeme::Noexcept => "noexcept",
            Lexeme::StaticAssert => "static_assert",
            Lexeme::Decltype => "decltype",
            Lexeme::Alignas => "alignas",
            Lexeme::If => "if",
            Lexeme::Else => "else",
            Lexeme::For => "for",
            Lexeme::While => "while",
            Lexeme::Do => "do",
            Lexeme::Switch => "switch",
            Lexeme::Case => "case",
            Lexeme::Default => "default",
            Lexeme::Break => "break",
            Lexeme::Continue => "continue",
            Lexeme::Return => "return",
            Lexeme::Goto => "goto",
            Lexeme::New => "new",
            Lexeme::Delete => "delete",
            Lexeme::This => "this",
            Lexeme::True => "true",
            Lexeme::False => "false",
            Lexeme::Nullptr => "nullptr",
            Lexeme::Sizeof => "sizeof",
            Lexeme::StaticCast => "static_cast",
            Lexeme::ReinterpretCast => "reinterpret_cast",
            Lexeme::ConstCast => "const_cast",
            Lexeme::DynamicCast => "dynamic_cast",
            Lexeme::Auto => "auto",
            Lexeme::Void => "void",
            Lexeme::Bool => "bool",
            Lexeme::Char => "char",
            Lexeme::Short => "short",
            Lexeme::Int => "int",
            Lexeme::Long => "long",
            Lexeme::Signed => "signed",
            Lexeme::Unsigned => "unsigned",
            Lexeme::Float => "float",
            Lexeme::Double => "double",
            Lexeme::LParen => "(",
            Lexeme::RParen => ")",
            Lexeme::LBrace => "{",
            Lexeme::RBrace => "}",
            Lexeme::LBracket => "[",
            Lexeme::RBracket => "]",
            Lexeme::Comma => ",",
            Lexeme::Semicolon => ";",
            Lexeme::Colon => ":",
            Lexeme::ColonColon => "::",
            Lexeme::Dot => ".",
            Lexeme::Ellipsis => "...",
            Lexeme::Arrow => "->",
            Lexeme::Question => "?",
            Lexeme::Plus => "+",
            Lexeme::Minus => "-",
            Lexeme::Star => "*",
            Lexeme::Slash => "/",
            Lexeme::Percent => "%",
            Lexeme::Amp => "&",
            Lexeme::Pipe => "|",
            Lexeme::Caret => "^",
            Lexeme::Tilde => "~",
            Lexeme::Bang => "!",
            Lexeme::Eq => "=",
            Lexeme::Lt => "<",
            Lexeme::Gt => ">",
            Lexeme::LtEq => "<=",
            Lexeme::GtEq => ">=",
            Lexeme::EqEq => "==",
            Lexeme::BangEq => "!=",
            Lexeme::AmpAmp => "&&",
            Lexeme::PipePipe => "||",
            Lexeme::Shl => "<<",
            Lexeme::PlusPlus => "++",
            Lexeme::MinusMinus => "--",
            Lexeme::PlusEq => "+=",
            Lexeme::MinusEq => "-=",
            Lexeme::StarEq => "*=",
            Lexeme::SlashEq => "/=",
            Lexeme::PercentEq => "%=",
            Lexeme::AmpEq => "&=",
            Lexeme::PipeEq => "|=",
            Lexeme::CaretEq => "^=",
            Lexeme::ShlEq => "<<=",
            Lexeme::Integer { .. } => "<integer>",
            Lexeme::FloatLit { .. } => "<float>",
            Lexeme::Str { .. } => "<string>",
            Lexeme::CharLit(_) => "<char>",
            Lexeme::Ident(_) => "<identifier>",
            Lexeme::Eof => "<eof>",
        }
    }

    pub fn is_ident(&self) -> bool {
        matches!(self, Lexeme::Ident(_))
    }
}

impl std::fmt::Display for Lexeme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}
