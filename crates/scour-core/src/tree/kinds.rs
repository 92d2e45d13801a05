//! Closed set of node, token and trivia kinds.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! syntax_kinds {
    (
        nodes { $($node:ident => $node_name:literal,)* }
        tokens { $($token:ident => $token_name:literal,)* }
    ) => {
        /// Kind of a tree element. Token kinds are leaves carrying text.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum SyntaxKind {
            $($node,)*
            $($token,)*
        }

        impl SyntaxKind {
            /// Every kind, nodes first, in declaration order.
            pub const ALL: &'static [SyntaxKind] = &[
                $(SyntaxKind::$node,)*
                $(SyntaxKind::$token,)*
            ];

            /// Stable snake_case name.
            pub fn name(self) -> &'static str {
                match self {
                    $(SyntaxKind::$node => $node_name,)*
                    $(SyntaxKind::$token => $token_name,)*
                }
            }

            /// Look a kind up by its snake_case name.
            pub fn from_name(name: &str) -> Option<SyntaxKind> {
                match name {
                    $($node_name => Some(SyntaxKind::$node),)*
                    $($token_name => Some(SyntaxKind::$token),)*
                    _ => None,
                }
            }

            /// True for leaf kinds that carry source text.
            pub fn is_token(self) -> bool {
                matches!(self, $(SyntaxKind::$token)|*)
            }
        }
    };
}

syntax_kinds! {
    nodes {
        CompilationUnit => "compilation_unit",
        UsingDirective => "using_directive",
        NamespaceDeclaration => "namespace_declaration",
        ClassDeclaration => "class_declaration",
        StructDeclaration => "struct_declaration",
        InterfaceDeclaration => "interface_declaration",
        EnumDeclaration => "enum_declaration",
        BaseList => "base_list",
        MethodDeclaration => "method_declaration",
        ConstructorDeclaration => "constructor_declaration",
        PropertyDeclaration => "property_declaration",
        AccessorList => "accessor_list",
        AccessorDeclaration => "accessor_declaration",
        FieldDeclaration => "field_declaration",
        VariableDeclaration => "variable_declaration",
        VariableDeclarator => "variable_declarator",
        EqualsValueClause => "equals_value_clause",
        ParameterList => "parameter_list",
        Parameter => "parameter",
        AttributeList => "attribute_list",
        AttributeTargetSpecifier => "attribute_target_specifier",
        Attribute => "attribute",
        AttributeArgumentList => "attribute_argument_list",
        AttributeArgument => "attribute_argument",
        NameEquals => "name_equals",
        Block => "block",
        IfStatement => "if_statement",
        ElseClause => "else_clause",
        ExpressionStatement => "expression_statement",
        LocalDeclarationStatement => "local_declaration_statement",
        ReturnStatement => "return_statement",
        ThrowStatement => "throw_statement",
        ForStatement => "for_statement",
        ForEachStatement => "for_each_statement",
        WhileStatement => "while_statement",
        DoStatement => "do_statement",
        TryStatement => "try_statement",
        CatchClause => "catch_clause",
        CatchDeclaration => "catch_declaration",
        FinallyClause => "finally_clause",
        InvocationExpression => "invocation_expression",
        ArgumentList => "argument_list",
        Argument => "argument",
        MemberAccessExpression => "member_access_expression",
        ObjectCreationExpression => "object_creation_expression",
        AssignmentExpression => "assignment_expression",
        BinaryExpression => "binary_expression",
        ParenthesizedExpression => "parenthesized_expression",
        IdentifierName => "identifier_name",
        GenericName => "generic_name",
        TypeArgumentList => "type_argument_list",
        QualifiedName => "qualified_name",
        PredefinedType => "predefined_type",
        LiteralExpression => "literal_expression",
    }
    tokens {
        Keyword => "keyword",
        Identifier => "identifier",
        Punctuation => "punctuation",
        StringLiteral => "string_literal",
        NumericLiteral => "numeric_literal",
        CharacterLiteral => "character_literal",
    }
}

impl SyntaxKind {
    /// Kinds that declare a symbol when bound by a semantic model.
    pub fn declares_symbol(self) -> bool {
        matches!(
            self,
            SyntaxKind::ClassDeclaration
                | SyntaxKind::StructDeclaration
                | SyntaxKind::InterfaceDeclaration
                | SyntaxKind::EnumDeclaration
                | SyntaxKind::MethodDeclaration
                | SyntaxKind::ConstructorDeclaration
                | SyntaxKind::PropertyDeclaration
                | SyntaxKind::VariableDeclarator
        )
    }

    /// Type declarations (the scopes that can carry type-level attributes).
    pub fn is_type_declaration(self) -> bool {
        matches!(
            self,
            SyntaxKind::ClassDeclaration
                | SyntaxKind::StructDeclaration
                | SyntaxKind::InterfaceDeclaration
                | SyntaxKind::EnumDeclaration
        )
    }

    /// Member declarations that may own attribute lists.
    pub fn is_member_declaration(self) -> bool {
        matches!(
            self,
            SyntaxKind::MethodDeclaration
                | SyntaxKind::ConstructorDeclaration
                | SyntaxKind::PropertyDeclaration
                | SyntaxKind::FieldDeclaration
        )
    }

    /// Statement kinds.
    pub fn is_statement(self) -> bool {
        matches!(
            self,
            SyntaxKind::Block
                | SyntaxKind::IfStatement
                | SyntaxKind::ExpressionStatement
                | SyntaxKind::LocalDeclarationStatement
                | SyntaxKind::ReturnStatement
                | SyntaxKind::ThrowStatement
                | SyntaxKind::ForStatement
                | SyntaxKind::ForEachStatement
                | SyntaxKind::WhileStatement
                | SyntaxKind::DoStatement
                | SyntaxKind::TryStatement
        )
    }

    /// Loop statements.
    pub fn is_loop(self) -> bool {
        matches!(
            self,
            SyntaxKind::ForStatement
                | SyntaxKind::ForEachStatement
                | SyntaxKind::WhileStatement
                | SyntaxKind::DoStatement
        )
    }

    /// Kinds whose body sits between `{` and `}` and is indented one level.
    pub fn has_brace_body(self) -> bool {
        matches!(
            self,
            SyntaxKind::Block
                | SyntaxKind::NamespaceDeclaration
                | SyntaxKind::ClassDeclaration
                | SyntaxKind::StructDeclaration
                | SyntaxKind::InterfaceDeclaration
                | SyntaxKind::EnumDeclaration
                | SyntaxKind::AccessorList
        )
    }

    /// Kinds that own an embedded statement (indented one level when it is
    /// not a block).
    pub fn owns_embedded_statement(self) -> bool {
        self.is_loop() || matches!(self, SyntaxKind::IfStatement | SyntaxKind::ElseClause)
    }
}

impl fmt::Display for SyntaxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Kind of a trivia piece attached to a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriviaKind {
    /// Spaces and tabs.
    Whitespace,
    /// `\n` or `\r\n`.
    EndOfLine,
    /// `// ...` up to (not including) the line end.
    SingleLineComment,
    /// `/* ... */`.
    MultiLineComment,
    /// `/// ...` up to (not including) the line end.
    DocComment,
}

impl TriviaKind {
    /// True for comment kinds, which rewrites must preserve.
    pub fn is_comment(self) -> bool {
        matches!(
            self,
            TriviaKind::SingleLineComment | TriviaKind::MultiLineComment | TriviaKind::DocComment
        )
    }
}

/// C#-style reserved words, used to classify bare tokens.
pub const KEYWORDS: &[&str] = &[
    "abstract", "as", "assembly", "base", "bool", "break", "byte", "case", "catch", "char",
    "checked", "class", "const", "continue", "decimal", "default", "delegate", "do", "double",
    "else", "enum", "event", "explicit", "extern", "false", "finally", "fixed", "float", "for",
    "foreach", "get", "goto", "if", "implicit", "in", "int", "interface", "internal", "is",
    "lock", "long", "namespace", "new", "null", "object", "operator", "out", "override",
    "params", "partial", "private", "protected", "public", "readonly", "ref", "return",
    "sbyte", "sealed", "set", "short", "sizeof", "static", "string", "struct", "switch",
    "this", "throw", "true", "try", "typeof", "uint", "ulong", "unchecked", "unsafe",
    "ushort", "using", "virtual", "void", "volatile", "while",
];

/// True if `word` is a reserved word.
pub fn is_keyword(word: &str) -> bool {
    KEYWORDS.contains(&word)
}
