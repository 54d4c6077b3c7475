//! Node representation.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use tsb_common::Span;

use crate::base::{NodeIndex, NodeList};
use crate::kind::SyntaxKind;

bitflags! {
    /// Declaration modifiers and parameter markers as written in source.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct ModifierFlags: u16 {
        const EXPORT = 1 << 0;
        const DECLARE = 1 << 1;
        const PUBLIC = 1 << 2;
        const PRIVATE = 1 << 3;
        const STATIC = 1 << 4;
        /// `x?: T` on parameters and members.
        const OPTIONAL = 1 << 5;
        /// `...rest: T[]` on parameters.
        const REST = 1 << 6;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOperator {
    Assign,
    Plus,
    Minus,
    Star,
    Slash,
    Less,
    Greater,
    LessEquals,
    GreaterEquals,
    EqualsEquals,
    EqualsEqualsEquals,
    NotEquals,
    NotEqualsEquals,
    AmpersandAmpersand,
    BarBar,
    Comma,
}

impl BinaryOperator {
    pub const fn is_comparison(self) -> bool {
        matches!(
            self,
            Self::Less
                | Self::Greater
                | Self::LessEquals
                | Self::GreaterEquals
                | Self::EqualsEquals
                | Self::EqualsEqualsEquals
                | Self::NotEquals
                | Self::NotEqualsEquals
        )
    }

    pub const fn is_arithmetic(self) -> bool {
        matches!(self, Self::Minus | Self::Star | Self::Slash)
    }
}

/// Kind-specific payload of a node.
///
/// Several kinds share one shape; e.g. every function-like construct
/// (declarations, signatures, function types, expressions) uses
/// [`NodeData::FunctionLike`], and variables, parameters and properties use
/// [`NodeData::Variable`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum NodeData {
    /// Keywords and other tokens without payload.
    Token,
    SourceFile {
        statements: NodeList,
    },
    Identifier {
        text: String,
    },
    QualifiedName {
        left: NodeIndex,
        right: NodeIndex,
    },
    NumericLiteral {
        value: f64,
    },
    StringLiteral {
        text: String,
    },
    Module {
        name: NodeIndex,
        body: NodeList,
    },
    Class {
        name: NodeIndex,
        type_parameters: NodeList,
        extends: NodeIndex,
        implements: NodeList,
        members: NodeList,
    },
    Interface {
        name: NodeIndex,
        type_parameters: NodeList,
        extends: NodeList,
        members: NodeList,
    },
    Enum {
        name: NodeIndex,
        members: NodeList,
    },
    EnumMember {
        name: NodeIndex,
        initializer: NodeIndex,
    },
    TypeAlias {
        name: NodeIndex,
        type_parameters: NodeList,
        type_node: NodeIndex,
    },
    FunctionLike {
        /// Absent for signatures, function types, constructors and anonymous functions.
        name: NodeIndex,
        type_parameters: NodeList,
        parameters: NodeList,
        return_type: NodeIndex,
        /// A `Block`, an expression (arrow functions), or `NONE` for overloads and signatures.
        body: NodeIndex,
    },
    Variable {
        name: NodeIndex,
        type_annotation: NodeIndex,
        initializer: NodeIndex,
    },
    TypeParameter {
        name: NodeIndex,
        constraint: NodeIndex,
    },
    TypeReference {
        type_name: NodeIndex,
        type_arguments: NodeList,
    },
    ArrayType {
        element_type: NodeIndex,
    },
    TypeLiteral {
        members: NodeList,
    },
    Block {
        statements: NodeList,
    },
    ExpressionStatement {
        expression: NodeIndex,
    },
    Return {
        expression: NodeIndex,
    },
    If {
        condition: NodeIndex,
        then_statement: NodeIndex,
        else_statement: NodeIndex,
    },
    Try {
        try_block: NodeIndex,
        catch_clause: NodeIndex,
        finally_block: NodeIndex,
    },
    CatchClause {
        variable: NodeIndex,
        block: NodeIndex,
    },
    With {
        expression: NodeIndex,
        statement: NodeIndex,
    },
    ObjectLiteral {
        properties: NodeList,
    },
    PropertyAssignment {
        name: NodeIndex,
        initializer: NodeIndex,
    },
    ArrayLiteral {
        elements: NodeList,
    },
    Call {
        expression: NodeIndex,
        type_arguments: NodeList,
        arguments: NodeList,
    },
    PropertyAccess {
        expression: NodeIndex,
        name: NodeIndex,
    },
    ElementAccess {
        expression: NodeIndex,
        argument: NodeIndex,
    },
    Conditional {
        condition: NodeIndex,
        when_true: NodeIndex,
        when_false: NodeIndex,
    },
    Binary {
        left: NodeIndex,
        operator: BinaryOperator,
        right: NodeIndex,
    },
    Parenthesized {
        expression: NodeIndex,
    },
    TypeAssertion {
        type_node: NodeIndex,
        expression: NodeIndex,
    },
}

/// One syntax node.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub kind: SyntaxKind,
    #[serde(default)]
    pub span: Span,
    #[serde(default)]
    pub modifiers: ModifierFlags,
    pub data: NodeData,
}

impl Node {
    pub fn new(kind: SyntaxKind, data: NodeData) -> Self {
        Self {
            kind,
            span: Span::default(),
            modifiers: ModifierFlags::empty(),
            data,
        }
    }

    #[inline]
    pub fn has_modifier(&self, flag: ModifierFlags) -> bool {
        self.modifiers.contains(flag)
    }

    /// Declared name of a declaration node, if it has one.
    pub fn name(&self) -> NodeIndex {
        match &self.data {
            NodeData::Module { name, .. }
            | NodeData::Class { name, .. }
            | NodeData::Interface { name, .. }
            | NodeData::Enum { name, .. }
            | NodeData::EnumMember { name, .. }
            | NodeData::TypeAlias { name, .. }
            | NodeData::FunctionLike { name, .. }
            | NodeData::Variable { name, .. }
            | NodeData::TypeParameter { name, .. }
            | NodeData::PropertyAssignment { name, .. } => *name,
            _ => NodeIndex::NONE,
        }
    }

    /// Visit every child slot in source order. Optional children that are
    /// absent are reported as `NodeIndex::NONE`, and lists report their length
    /// first, so the sequence is a faithful description of the node's shape.
    pub fn for_each_slot(&self, mut f: impl FnMut(Slot<'_>)) {
        use Slot::{List, One};
        match &self.data {
            NodeData::Token
            | NodeData::Identifier { .. }
            | NodeData::NumericLiteral { .. }
            | NodeData::StringLiteral { .. } => {}
            NodeData::SourceFile { statements } => f(List(statements)),
            NodeData::QualifiedName { left, right } => {
                f(One(*left));
                f(One(*right));
            }
            NodeData::Module { name, body } => {
                f(One(*name));
                f(List(body));
            }
            NodeData::Class {
                name,
                type_parameters,
                extends,
                implements,
                members,
            } => {
                f(One(*name));
                f(List(type_parameters));
                f(One(*extends));
                f(List(implements));
                f(List(members));
            }
            NodeData::Interface {
                name,
                type_parameters,
                extends,
                members,
            } => {
                f(One(*name));
                f(List(type_parameters));
                f(List(extends));
                f(List(members));
            }
            NodeData::Enum { name, members } => {
                f(One(*name));
                f(List(members));
            }
            NodeData::EnumMember { name, initializer } => {
                f(One(*name));
                f(One(*initializer));
            }
            NodeData::TypeAlias {
                name,
                type_parameters,
                type_node,
            } => {
                f(One(*name));
                f(List(type_parameters));
                f(One(*type_node));
            }
            NodeData::FunctionLike {
                name,
                type_parameters,
                parameters,
                return_type,
                body,
            } => {
                f(One(*name));
                f(List(type_parameters));
                f(List(parameters));
                f(One(*return_type));
                f(One(*body));
            }
            NodeData::Variable {
                name,
                type_annotation,
                initializer,
            } => {
                f(One(*name));
                f(One(*type_annotation));
                f(One(*initializer));
            }
            NodeData::TypeParameter { name, constraint } => {
                f(One(*name));
                f(One(*constraint));
            }
            NodeData::TypeReference {
                type_name,
                type_arguments,
            } => {
                f(One(*type_name));
                f(List(type_arguments));
            }
            NodeData::ArrayType { element_type } => f(One(*element_type)),
            NodeData::TypeLiteral { members } => f(List(members)),
            NodeData::Block { statements } => f(List(statements)),
            NodeData::ExpressionStatement { expression }
            | NodeData::Return { expression }
            | NodeData::Parenthesized { expression } => f(One(*expression)),
            NodeData::If {
                condition,
                then_statement,
                else_statement,
            } => {
                f(One(*condition));
                f(One(*then_statement));
                f(One(*else_statement));
            }
            NodeData::Try {
                try_block,
                catch_clause,
                finally_block,
            } => {
                f(One(*try_block));
                f(One(*catch_clause));
                f(One(*finally_block));
            }
            NodeData::CatchClause { variable, block } => {
                f(One(*variable));
                f(One(*block));
            }
            NodeData::With {
                expression,
                statement,
            } => {
                f(One(*expression));
                f(One(*statement));
            }
            NodeData::ObjectLiteral { properties } => f(List(properties)),
            NodeData::PropertyAssignment { name, initializer } => {
                f(One(*name));
                f(One(*initializer));
            }
            NodeData::ArrayLiteral { elements } => f(List(elements)),
            NodeData::Call {
                expression,
                type_arguments,
                arguments,
            } => {
                f(One(*expression));
                f(List(type_arguments));
                f(List(arguments));
            }
            NodeData::PropertyAccess { expression, name } => {
                f(One(*expression));
                f(One(*name));
            }
            NodeData::ElementAccess {
                expression,
                argument,
            } => {
                f(One(*expression));
                f(One(*argument));
            }
            NodeData::Conditional {
                condition,
                when_true,
                when_false,
            } => {
                f(One(*condition));
                f(One(*when_true));
                f(One(*when_false));
            }
            NodeData::Binary { left, right, .. } => {
                f(One(*left));
                f(One(*right));
            }
            NodeData::TypeAssertion {
                type_node,
                expression,
            } => {
                f(One(*type_node));
                f(One(*expression));
            }
        }
    }

    /// Visit present children in source order.
    pub fn for_each_child(&self, mut f: impl FnMut(NodeIndex)) {
        self.for_each_slot(|slot| match slot {
            Slot::One(idx) => {
                if idx.is_some() {
                    f(idx);
                }
            }
            Slot::List(list) => list.iter().for_each(&mut f),
        });
    }
}

/// A child slot of a node: a single optional child or a list.
#[derive(Clone, Copy, Debug)]
pub enum Slot<'a> {
    One(NodeIndex),
    List(&'a NodeList),
}
