use serde_repr::{Deserialize_repr, Serialize_repr};

/// Unified syntax kind for both tokens and nodes.
///
/// Token kinds come first; [`SyntaxKind::is_token`] relies on
/// [`SyntaxKind::Error`] being the last of them.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize_repr, Deserialize_repr,
)]
#[repr(u16)]
pub enum SyntaxKind {
    // --- Trivia ---
    Whitespace,
    LineComment,
    BlockComment,
    DocComment,

    // --- Preprocessor directives (trivia) ---
    IfDirective,
    ElifDirective,
    ElseDirective,
    EndIfDirective,
    RegionDirective,
    EndRegionDirective,

    // --- Identifiers & literals ---
    Identifier,
    IntLiteral,
    FloatLiteral,
    CharLiteral,
    StringLiteral,

    // --- Keywords ---
    AsyncKw,
    AwaitKw,
    BaseKw,
    BoolKw,
    BreakKw,
    ClassKw,
    ConstKw,
    ContinueKw,
    DoKw,
    ElseKw,
    FalseKw,
    ForKw,
    ForeachKw,
    GetKw,
    GotoKw,
    IfKw,
    InKw,
    IntKw,
    InterfaceKw,
    NewKw,
    NextKw,
    NullKw,
    OutKw,
    ReadonlyKw,
    RecordKw,
    RefKw,
    ReturnKw,
    SetKw,
    StaticKw,
    StringKw,
    StructKw,
    ThisKw,
    ThrowKw,
    TrueKw,
    UsingKw,
    VarKw,
    VoidKw,
    WhileKw,
    YieldKw,

    // --- Punctuation ---
    LBrace,
    RBrace,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Semicolon,
    Comma,
    Dot,
    Colon,
    Question,
    Eq,
    EqEq,
    BangEq,
    Bang,
    Plus,
    PlusPlus,
    PlusEq,
    Minus,
    MinusMinus,
    MinusEq,
    Star,
    Slash,
    Percent,
    Amp,
    AmpAmp,
    PipePipe,
    Lt,
    Gt,
    Arrow,

    /// Unlexable input. Must stay the last token kind.
    Error,

    // --- Nodes: declarations ---
    CompilationUnit,
    NamespaceDeclaration,
    ClassDeclaration,
    StructDeclaration,
    RecordDeclaration,
    InterfaceDeclaration,
    BaseList,
    /// `record R(int x) : Base(x)`: the base type together with its
    /// argument list.
    PrimaryConstructorBaseType,
    MethodDeclaration,
    ConstructorDeclaration,
    PropertyDeclaration,
    AccessorList,
    AccessorDeclaration,
    FieldDeclaration,
    VariableDeclaration,
    VariableDeclarator,
    EqualsValueClause,
    ArrowExpressionClause,
    ParameterList,
    Parameter,
    TypeRef,

    // --- Nodes: statements ---
    Block,
    LocalDeclarationStatement,
    ExpressionStatement,
    IfStatement,
    ElseClause,
    WhileStatement,
    DoStatement,
    ForStatement,
    ForEachStatement,
    UsingStatement,
    ReturnStatement,
    YieldStatement,
    BreakStatement,
    ContinueStatement,
    GotoStatement,
    ThrowStatement,
    LabeledStatement,
    EmptyStatement,
    LocalFunctionStatement,
    /// A loop whose header and trailer are separate statements (`For ... Next`).
    LoopBlock,
    LoopHeader,
    LoopTrailer,

    // --- Nodes: expressions ---
    NameExpression,
    LiteralExpression,
    ThisExpression,
    ParenthesizedExpression,
    TupleExpression,
    BinaryExpression,
    PrefixUnaryExpression,
    PostfixUnaryExpression,
    AssignmentExpression,
    ConditionalExpression,
    CastExpression,
    InvocationExpression,
    MemberAccessExpression,
    ElementAccessExpression,
    ObjectCreationExpression,
    AnonymousObjectCreationExpression,
    AwaitExpression,
    LambdaExpression,
    RefExpression,
    AddressOfExpression,
    ArgumentList,
    Argument,

    ErrorNode,

    __Last,
}

impl SyntaxKind {
    pub fn from_raw(raw: u16) -> Option<SyntaxKind> {
        if raw < SyntaxKind::__Last as u16 {
            // SAFETY: We've verified the numeric value is within the enum range.
            Some(unsafe { std::mem::transmute::<u16, SyntaxKind>(raw) })
        } else {
            None
        }
    }

    pub fn is_token(self) -> bool {
        self <= SyntaxKind::Error
    }

    pub fn is_node(self) -> bool {
        !self.is_token() && self != SyntaxKind::__Last
    }

    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            SyntaxKind::Whitespace
                | SyntaxKind::LineComment
                | SyntaxKind::BlockComment
                | SyntaxKind::DocComment
        ) || self.is_directive()
    }

    pub fn is_directive(self) -> bool {
        matches!(
            self,
            SyntaxKind::IfDirective
                | SyntaxKind::ElifDirective
                | SyntaxKind::ElseDirective
                | SyntaxKind::EndIfDirective
                | SyntaxKind::RegionDirective
                | SyntaxKind::EndRegionDirective
        )
    }

    /// Directives that open a region which must be closed in the same
    /// extracted body.
    pub fn is_opening_directive(self) -> bool {
        matches!(self, SyntaxKind::IfDirective | SyntaxKind::RegionDirective)
    }

    pub fn is_closing_directive(self) -> bool {
        matches!(
            self,
            SyntaxKind::EndIfDirective | SyntaxKind::EndRegionDirective
        )
    }

    pub fn is_keyword(self) -> bool {
        self >= SyntaxKind::AsyncKw && self <= SyntaxKind::YieldKw
    }

    pub fn is_type_declaration(self) -> bool {
        matches!(
            self,
            SyntaxKind::ClassDeclaration
                | SyntaxKind::StructDeclaration
                | SyntaxKind::RecordDeclaration
                | SyntaxKind::InterfaceDeclaration
        )
    }

    pub fn is_statement(self) -> bool {
        self >= SyntaxKind::Block && self <= SyntaxKind::LoopTrailer && self != SyntaxKind::ElseClause
    }

    /// Nodes whose children form a statement list.
    pub fn is_statement_container(self) -> bool {
        matches!(self, SyntaxKind::Block | SyntaxKind::LoopBlock)
    }

    pub fn is_expression(self) -> bool {
        self >= SyntaxKind::NameExpression && self <= SyntaxKind::AddressOfExpression
    }

    /// Loop statements: the targets of `break` and `continue`.
    pub fn is_loop(self) -> bool {
        matches!(
            self,
            SyntaxKind::WhileStatement
                | SyntaxKind::DoStatement
                | SyntaxKind::ForStatement
                | SyntaxKind::ForEachStatement
                | SyntaxKind::LoopBlock
        )
    }

    /// Nodes that introduce their own body: nested analysis (await, yield)
    /// does not look inside them.
    pub fn is_nested_function(self) -> bool {
        matches!(
            self,
            SyntaxKind::LambdaExpression | SyntaxKind::LocalFunctionStatement
        )
    }

    pub fn from_keyword(text: &str) -> Option<SyntaxKind> {
        Some(match text {
            "async" => SyntaxKind::AsyncKw,
            "await" => SyntaxKind::AwaitKw,
            "base" => SyntaxKind::BaseKw,
            "bool" => SyntaxKind::BoolKw,
            "break" => SyntaxKind::BreakKw,
            "class" => SyntaxKind::ClassKw,
            "const" => SyntaxKind::ConstKw,
            "continue" => SyntaxKind::ContinueKw,
            "do" => SyntaxKind::DoKw,
            "else" => SyntaxKind::ElseKw,
            "false" => SyntaxKind::FalseKw,
            "for" => SyntaxKind::ForKw,
            "foreach" => SyntaxKind::ForeachKw,
            "get" => SyntaxKind::GetKw,
            "goto" => SyntaxKind::GotoKw,
            "if" => SyntaxKind::IfKw,
            "in" => SyntaxKind::InKw,
            "int" => SyntaxKind::IntKw,
            "interface" => SyntaxKind::InterfaceKw,
            "new" => SyntaxKind::NewKw,
            "Next" => SyntaxKind::NextKw,
            "null" => SyntaxKind::NullKw,
            "out" => SyntaxKind::OutKw,
            "readonly" => SyntaxKind::ReadonlyKw,
            "record" => SyntaxKind::RecordKw,
            "ref" => SyntaxKind::RefKw,
            "return" => SyntaxKind::ReturnKw,
            "set" => SyntaxKind::SetKw,
            "static" => SyntaxKind::StaticKw,
            "string" => SyntaxKind::StringKw,
            "struct" => SyntaxKind::StructKw,
            "this" => SyntaxKind::ThisKw,
            "throw" => SyntaxKind::ThrowKw,
            "true" => SyntaxKind::TrueKw,
            "using" => SyntaxKind::UsingKw,
            "var" => SyntaxKind::VarKw,
            "void" => SyntaxKind::VoidKw,
            "while" => SyntaxKind::WhileKw,
            "yield" => SyntaxKind::YieldKw,
            _ => return None,
        })
    }

    pub fn from_punct(text: &str) -> Option<SyntaxKind> {
        Some(match text {
            "{" => SyntaxKind::LBrace,
            "}" => SyntaxKind::RBrace,
            "(" => SyntaxKind::LParen,
            ")" => SyntaxKind::RParen,
            "[" => SyntaxKind::LBracket,
            "]" => SyntaxKind::RBracket,
            ";" => SyntaxKind::Semicolon,
            "," => SyntaxKind::Comma,
            "." => SyntaxKind::Dot,
            ":" => SyntaxKind::Colon,
            "?" => SyntaxKind::Question,
            "=" => SyntaxKind::Eq,
            "==" => SyntaxKind::EqEq,
            "!=" => SyntaxKind::BangEq,
            "!" => SyntaxKind::Bang,
            "+" => SyntaxKind::Plus,
            "++" => SyntaxKind::PlusPlus,
            "+=" => SyntaxKind::PlusEq,
            "-" => SyntaxKind::Minus,
            "--" => SyntaxKind::MinusMinus,
            "-=" => SyntaxKind::MinusEq,
            "*" => SyntaxKind::Star,
            "/" => SyntaxKind::Slash,
            "%" => SyntaxKind::Percent,
            "&" => SyntaxKind::Amp,
            "&&" => SyntaxKind::AmpAmp,
            "||" => SyntaxKind::PipePipe,
            "<" => SyntaxKind::Lt,
            ">" => SyntaxKind::Gt,
            "=>" => SyntaxKind::Arrow,
            _ => return None,
        })
    }

    /// Best-effort token kind for a piece of source text: keywords,
    /// punctuation, literals, identifiers, then whitespace/comments.
    pub fn infer_token(text: &str) -> SyntaxKind {
        if let Some(kind) = SyntaxKind::from_keyword(text).or_else(|| SyntaxKind::from_punct(text)) {
            return kind;
        }

        let mut chars = text.chars();
        let Some(first) = chars.next() else {
            return SyntaxKind::Error;
        };

        if text.chars().all(char::is_whitespace) {
            SyntaxKind::Whitespace
        } else if text.starts_with("///") {
            SyntaxKind::DocComment
        } else if text.starts_with("//") {
            SyntaxKind::LineComment
        } else if text.starts_with("/*") {
            SyntaxKind::BlockComment
        } else if text.starts_with("#if") {
            SyntaxKind::IfDirective
        } else if text.starts_with("#elif") {
            SyntaxKind::ElifDirective
        } else if text.starts_with("#else") {
            SyntaxKind::ElseDirective
        } else if text.starts_with("#endif") {
            SyntaxKind::EndIfDirective
        } else if text.starts_with("#endregion") {
            SyntaxKind::EndRegionDirective
        } else if text.starts_with("#region") {
            SyntaxKind::RegionDirective
        } else if first == '"' {
            SyntaxKind::StringLiteral
        } else if first == '\'' {
            SyntaxKind::CharLiteral
        } else if first.is_ascii_digit() {
            if text.contains('.') {
                SyntaxKind::FloatLiteral
            } else {
                SyntaxKind::IntLiteral
            }
        } else if (first == '_' || first.is_alphabetic())
            && chars.all(|c| c == '_' || c.is_alphanumeric())
        {
            SyntaxKind::Identifier
        } else {
            SyntaxKind::Error
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_classes_do_not_overlap() {
        for raw in 0..(SyntaxKind::__Last as u16) {
            let kind = SyntaxKind::from_raw(raw).unwrap();
            assert_eq!(kind as u16, raw);
            assert!(kind.is_token() != kind.is_node(), "{kind:?}");
            if kind.is_statement() || kind.is_expression() || kind.is_type_declaration() {
                assert!(kind.is_node(), "{kind:?}");
            }
            assert!(!(kind.is_statement() && kind.is_expression()), "{kind:?}");
            if kind.is_trivia() {
                assert!(kind.is_token(), "{kind:?}");
            }
        }
        assert_eq!(SyntaxKind::from_raw(SyntaxKind::__Last as u16), None);
    }

    #[test]
    fn infers_token_kinds() {
        assert_eq!(SyntaxKind::infer_token("await"), SyntaxKind::AwaitKw);
        assert_eq!(SyntaxKind::infer_token("=>"), SyntaxKind::Arrow);
        assert_eq!(SyntaxKind::infer_token("total"), SyntaxKind::Identifier);
        assert_eq!(SyntaxKind::infer_token("42"), SyntaxKind::IntLiteral);
        assert_eq!(SyntaxKind::infer_token("1.5"), SyntaxKind::FloatLiteral);
        assert_eq!(SyntaxKind::infer_token("\"s\""), SyntaxKind::StringLiteral);
        assert_eq!(SyntaxKind::infer_token("\n  "), SyntaxKind::Whitespace);
        assert_eq!(SyntaxKind::infer_token("// hi"), SyntaxKind::LineComment);
        assert_eq!(SyntaxKind::infer_token("#region Init"), SyntaxKind::RegionDirective);
        assert_eq!(SyntaxKind::infer_token("#endregion"), SyntaxKind::EndRegionDirective);
        assert_eq!(SyntaxKind::infer_token("@"), SyntaxKind::Error);
    }

    #[test]
    fn serializes_as_number() {
        let json = serde_json::to_string(&SyntaxKind::Whitespace).unwrap();
        assert_eq!(json, "0");
        let back: SyntaxKind = serde_json::from_str(&json).unwrap();
        assert_eq!(back, SyntaxKind::Whitespace);
    }
}
