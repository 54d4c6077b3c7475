//! Syntax kinds understood by the semantic core.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SyntaxKind {
    SourceFile,

    // Names and literals
    Identifier,
    QualifiedName,
    NumericLiteral,
    StringLiteral,
    TrueKeyword,
    FalseKeyword,
    NullKeyword,
    ThisKeyword,

    // Declarations
    ModuleDeclaration,
    ClassDeclaration,
    InterfaceDeclaration,
    EnumDeclaration,
    EnumMember,
    TypeAliasDeclaration,
    FunctionDeclaration,
    VariableDeclaration,
    Parameter,
    TypeParameter,
    PropertyDeclaration,
    PropertySignature,
    MethodDeclaration,
    MethodSignature,
    Constructor,
    GetAccessor,
    SetAccessor,
    CallSignature,
    ConstructSignature,
    IndexSignature,

    // Types
    AnyKeyword,
    NumberKeyword,
    StringKeyword,
    BooleanKeyword,
    VoidKeyword,
    UndefinedKeyword,
    TypeReference,
    ArrayType,
    TypeLiteral,
    FunctionType,
    ConstructorType,

    // Statements
    Block,
    ExpressionStatement,
    ReturnStatement,
    IfStatement,
    TryStatement,
    CatchClause,
    WithStatement,

    // Expressions
    ObjectLiteralExpression,
    PropertyAssignment,
    ArrayLiteralExpression,
    CallExpression,
    NewExpression,
    PropertyAccessExpression,
    ElementAccessExpression,
    ConditionalExpression,
    BinaryExpression,
    ParenthesizedExpression,
    FunctionExpression,
    ArrowFunction,
    TypeAssertion,
}

impl SyntaxKind {
    /// Kinds whose data is [`NodeData::FunctionLike`](crate::NodeData::FunctionLike).
    pub const fn is_function_like(self) -> bool {
        matches!(
            self,
            Self::FunctionDeclaration
                | Self::MethodDeclaration
                | Self::MethodSignature
                | Self::Constructor
                | Self::GetAccessor
                | Self::SetAccessor
                | Self::CallSignature
                | Self::ConstructSignature
                | Self::IndexSignature
                | Self::FunctionType
                | Self::ConstructorType
                | Self::FunctionExpression
                | Self::ArrowFunction
        )
    }

    /// Keyword kinds usable in type position.
    pub const fn is_type_keyword(self) -> bool {
        matches!(
            self,
            Self::AnyKeyword
                | Self::NumberKeyword
                | Self::StringKeyword
                | Self::BooleanKeyword
                | Self::VoidKeyword
                | Self::UndefinedKeyword
                | Self::NullKeyword
        )
    }

    /// Kinds that can appear as the type of an annotation.
    pub const fn is_type_node(self) -> bool {
        self.is_type_keyword()
            || matches!(
                self,
                Self::TypeReference
                    | Self::ArrayType
                    | Self::TypeLiteral
                    | Self::FunctionType
                    | Self::ConstructorType
            )
    }

    /// Source text width of a token kind, used when laying out built trees.
    pub const fn token_width(self) -> u32 {
        match self {
            Self::TrueKeyword | Self::NullKeyword | Self::ThisKeyword | Self::VoidKeyword => 4,
            Self::FalseKeyword => 5,
            Self::AnyKeyword => 3,
            Self::NumberKeyword | Self::StringKeyword => 6,
            Self::BooleanKeyword => 7,
            Self::UndefinedKeyword => 9,
            _ => 1,
        }
    }
}
