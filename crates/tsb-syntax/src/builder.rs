//! Programmatic tree construction.
//!
//! `TreeBuilder` assembles a [`NodeArena`] without a parser. All methods take
//! `&self`, so nested construction reads like source:
//!
//! ```ignore
//! let b = TreeBuilder::new();
//! let call = b.call(b.ident("id"), &[b.number_type()], &[b.num(1.0)]);
//! let statement = b.expr_stmt(call);
//! let arena = b.finish(&[statement]);
//! ```
//!
//! Spans are assigned by [`TreeBuilder::finish`] with a source-order layout:
//! every token gets its own range and every composite covers its children, so
//! position queries behave as they would on parsed text.

use std::cell::RefCell;

use tsb_common::Span;

use crate::arena::NodeArena;
use crate::base::{NodeIndex, NodeList};
use crate::kind::SyntaxKind;
use crate::node::{BinaryOperator, ModifierFlags, Node, NodeData};

#[derive(Default)]
pub struct TreeBuilder {
    nodes: RefCell<Vec<Node>>,
}

#[inline]
fn opt(index: Option<NodeIndex>) -> NodeIndex {
    index.unwrap_or(NodeIndex::NONE)
}

#[inline]
fn list(nodes: &[NodeIndex]) -> NodeList {
    NodeList::from(nodes)
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn add(&self, kind: SyntaxKind, data: NodeData) -> NodeIndex {
        let mut nodes = self.nodes.borrow_mut();
        let index = NodeIndex(nodes.len() as u32);
        nodes.push(Node::new(kind, data));
        index
    }

    /// Add modifier flags to an already-built node and return it.
    pub fn with_modifiers(&self, index: NodeIndex, flags: ModifierFlags) -> NodeIndex {
        if let Some(node) = self.nodes.borrow_mut().get_mut(index.0 as usize) {
            node.modifiers |= flags;
        }
        index
    }

    pub fn exported(&self, index: NodeIndex) -> NodeIndex {
        self.with_modifiers(index, ModifierFlags::EXPORT)
    }

    /// Wrap `statements` in a source file and lay out spans.
    pub fn finish(self, statements: &[NodeIndex]) -> NodeArena {
        let root = self.add(
            SyntaxKind::SourceFile,
            NodeData::SourceFile {
                statements: list(statements),
            },
        );
        let nodes = self.nodes.into_inner();
        let mut arena = NodeArena::from_nodes(nodes, root);
        let mut cursor = 0;
        layout(&mut arena, root, &mut cursor);
        arena
    }

    // =========================================================================
    // Names and literals
    // =========================================================================

    pub fn ident(&self, text: &str) -> NodeIndex {
        self.add(
            SyntaxKind::Identifier,
            NodeData::Identifier {
                text: text.to_string(),
            },
        )
    }

    /// Identifier or qualified name from dotted text: `"A.B.C"`.
    pub fn entity_name(&self, dotted: &str) -> NodeIndex {
        let mut parts = dotted.split('.');
        let mut current = self.ident(parts.next().unwrap_or_default());
        for part in parts {
            let right = self.ident(part);
            current = self.add(
                SyntaxKind::QualifiedName,
                NodeData::QualifiedName {
                    left: current,
                    right,
                },
            );
        }
        current
    }

    pub fn num(&self, value: f64) -> NodeIndex {
        self.add(SyntaxKind::NumericLiteral, NodeData::NumericLiteral { value })
    }

    pub fn str_lit(&self, text: &str) -> NodeIndex {
        self.add(
            SyntaxKind::StringLiteral,
            NodeData::StringLiteral {
                text: text.to_string(),
            },
        )
    }

    pub fn true_lit(&self) -> NodeIndex {
        self.add(SyntaxKind::TrueKeyword, NodeData::Token)
    }

    pub fn false_lit(&self) -> NodeIndex {
        self.add(SyntaxKind::FalseKeyword, NodeData::Token)
    }

    pub fn null_lit(&self) -> NodeIndex {
        self.add(SyntaxKind::NullKeyword, NodeData::Token)
    }

    pub fn this_expr(&self) -> NodeIndex {
        self.add(SyntaxKind::ThisKeyword, NodeData::Token)
    }

    // =========================================================================
    // Types
    // =========================================================================

    pub fn any_type(&self) -> NodeIndex {
        self.add(SyntaxKind::AnyKeyword, NodeData::Token)
    }

    pub fn number_type(&self) -> NodeIndex {
        self.add(SyntaxKind::NumberKeyword, NodeData::Token)
    }

    pub fn string_type(&self) -> NodeIndex {
        self.add(SyntaxKind::StringKeyword, NodeData::Token)
    }

    pub fn boolean_type(&self) -> NodeIndex {
        self.add(SyntaxKind::BooleanKeyword, NodeData::Token)
    }

    pub fn void_type(&self) -> NodeIndex {
        self.add(SyntaxKind::VoidKeyword, NodeData::Token)
    }

    pub fn undefined_type(&self) -> NodeIndex {
        self.add(SyntaxKind::UndefinedKeyword, NodeData::Token)
    }

    pub fn type_ref(&self, name: &str, type_arguments: &[NodeIndex]) -> NodeIndex {
        let type_name = self.entity_name(name);
        self.add(
            SyntaxKind::TypeReference,
            NodeData::TypeReference {
                type_name,
                type_arguments: list(type_arguments),
            },
        )
    }

    pub fn array_type(&self, element_type: NodeIndex) -> NodeIndex {
        self.add(SyntaxKind::ArrayType, NodeData::ArrayType { element_type })
    }

    pub fn type_literal(&self, members: &[NodeIndex]) -> NodeIndex {
        self.add(
            SyntaxKind::TypeLiteral,
            NodeData::TypeLiteral {
                members: list(members),
            },
        )
    }

    pub fn function_type(
        &self,
        type_parameters: &[NodeIndex],
        parameters: &[NodeIndex],
        return_type: NodeIndex,
    ) -> NodeIndex {
        self.function_like(
            SyntaxKind::FunctionType,
            None,
            type_parameters,
            parameters,
            Some(return_type),
            NodeIndex::NONE,
        )
    }

    pub fn constructor_type(
        &self,
        type_parameters: &[NodeIndex],
        parameters: &[NodeIndex],
        return_type: NodeIndex,
    ) -> NodeIndex {
        self.function_like(
            SyntaxKind::ConstructorType,
            None,
            type_parameters,
            parameters,
            Some(return_type),
            NodeIndex::NONE,
        )
    }

    // =========================================================================
    // Declarations
    // =========================================================================

    fn function_like(
        &self,
        kind: SyntaxKind,
        name: Option<&str>,
        type_parameters: &[NodeIndex],
        parameters: &[NodeIndex],
        return_type: Option<NodeIndex>,
        body: NodeIndex,
    ) -> NodeIndex {
        let name = name.map_or(NodeIndex::NONE, |n| self.ident(n));
        self.add(
            kind,
            NodeData::FunctionLike {
                name,
                type_parameters: list(type_parameters),
                parameters: list(parameters),
                return_type: opt(return_type),
                body,
            },
        )
    }

    fn variable_like(
        &self,
        kind: SyntaxKind,
        name: &str,
        type_annotation: Option<NodeIndex>,
        initializer: Option<NodeIndex>,
    ) -> NodeIndex {
        let name = self.ident(name);
        self.add(
            kind,
            NodeData::Variable {
                name,
                type_annotation: opt(type_annotation),
                initializer: opt(initializer),
            },
        )
    }

    fn body_block(&self, body: Option<&[NodeIndex]>) -> NodeIndex {
        body.map_or(NodeIndex::NONE, |stmts| self.block(stmts))
    }

    pub fn type_param(&self, name: &str, constraint: Option<NodeIndex>) -> NodeIndex {
        let name = self.ident(name);
        self.add(
            SyntaxKind::TypeParameter,
            NodeData::TypeParameter {
                name,
                constraint: opt(constraint),
            },
        )
    }

    pub fn param(&self, name: &str, type_annotation: Option<NodeIndex>) -> NodeIndex {
        self.variable_like(SyntaxKind::Parameter, name, type_annotation, None)
    }

    pub fn optional_param(&self, name: &str, type_annotation: Option<NodeIndex>) -> NodeIndex {
        let p = self.param(name, type_annotation);
        self.with_modifiers(p, ModifierFlags::OPTIONAL)
    }

    pub fn rest_param(&self, name: &str, type_annotation: Option<NodeIndex>) -> NodeIndex {
        let p = self.param(name, type_annotation);
        self.with_modifiers(p, ModifierFlags::REST)
    }

    pub fn var_decl(
        &self,
        name: &str,
        type_annotation: Option<NodeIndex>,
        initializer: Option<NodeIndex>,
    ) -> NodeIndex {
        self.variable_like(
            SyntaxKind::VariableDeclaration,
            name,
            type_annotation,
            initializer,
        )
    }

    /// Function declaration; `body: None` declares an overload signature.
    pub fn function_decl(
        &self,
        name: &str,
        type_parameters: &[NodeIndex],
        parameters: &[NodeIndex],
        return_type: Option<NodeIndex>,
        body: Option<&[NodeIndex]>,
    ) -> NodeIndex {
        let body = self.body_block(body);
        self.function_like(
            SyntaxKind::FunctionDeclaration,
            Some(name),
            type_parameters,
            parameters,
            return_type,
            body,
        )
    }

    pub fn interface_decl(
        &self,
        name: &str,
        type_parameters: &[NodeIndex],
        extends: &[NodeIndex],
        members: &[NodeIndex],
    ) -> NodeIndex {
        let name = self.ident(name);
        self.add(
            SyntaxKind::InterfaceDeclaration,
            NodeData::Interface {
                name,
                type_parameters: list(type_parameters),
                extends: list(extends),
                members: list(members),
            },
        )
    }

    pub fn property_sig(&self, name: &str, type_annotation: Option<NodeIndex>) -> NodeIndex {
        self.variable_like(SyntaxKind::PropertySignature, name, type_annotation, None)
    }

    pub fn optional_property_sig(&self, name: &str, type_annotation: Option<NodeIndex>) -> NodeIndex {
        let p = self.property_sig(name, type_annotation);
        self.with_modifiers(p, ModifierFlags::OPTIONAL)
    }

    pub fn method_sig(
        &self,
        name: &str,
        type_parameters: &[NodeIndex],
        parameters: &[NodeIndex],
        return_type: Option<NodeIndex>,
    ) -> NodeIndex {
        self.function_like(
            SyntaxKind::MethodSignature,
            Some(name),
            type_parameters,
            parameters,
            return_type,
            NodeIndex::NONE,
        )
    }

    pub fn call_sig(
        &self,
        type_parameters: &[NodeIndex],
        parameters: &[NodeIndex],
        return_type: Option<NodeIndex>,
    ) -> NodeIndex {
        self.function_like(
            SyntaxKind::CallSignature,
            None,
            type_parameters,
            parameters,
            return_type,
            NodeIndex::NONE,
        )
    }

    pub fn construct_sig(
        &self,
        type_parameters: &[NodeIndex],
        parameters: &[NodeIndex],
        return_type: Option<NodeIndex>,
    ) -> NodeIndex {
        self.function_like(
            SyntaxKind::ConstructSignature,
            None,
            type_parameters,
            parameters,
            return_type,
            NodeIndex::NONE,
        )
    }

    pub fn index_sig(&self, parameter: NodeIndex, return_type: NodeIndex) -> NodeIndex {
        self.function_like(
            SyntaxKind::IndexSignature,
            None,
            &[],
            &[parameter],
            Some(return_type),
            NodeIndex::NONE,
        )
    }

    pub fn class_decl(
        &self,
        name: &str,
        type_parameters: &[NodeIndex],
        extends: Option<NodeIndex>,
        implements: &[NodeIndex],
        members: &[NodeIndex],
    ) -> NodeIndex {
        let name = self.ident(name);
        self.add(
            SyntaxKind::ClassDeclaration,
            NodeData::Class {
                name,
                type_parameters: list(type_parameters),
                extends: opt(extends),
                implements: list(implements),
                members: list(members),
            },
        )
    }

    pub fn property_decl(
        &self,
        name: &str,
        type_annotation: Option<NodeIndex>,
        initializer: Option<NodeIndex>,
    ) -> NodeIndex {
        self.variable_like(
            SyntaxKind::PropertyDeclaration,
            name,
            type_annotation,
            initializer,
        )
    }

    pub fn method_decl(
        &self,
        name: &str,
        type_parameters: &[NodeIndex],
        parameters: &[NodeIndex],
        return_type: Option<NodeIndex>,
        body: Option<&[NodeIndex]>,
    ) -> NodeIndex {
        let body = self.body_block(body);
        self.function_like(
            SyntaxKind::MethodDeclaration,
            Some(name),
            type_parameters,
            parameters,
            return_type,
            body,
        )
    }

    pub fn constructor(&self, parameters: &[NodeIndex], body: &[NodeIndex]) -> NodeIndex {
        let body = self.block(body);
        self.function_like(SyntaxKind::Constructor, None, &[], parameters, None, body)
    }

    pub fn get_accessor(
        &self,
        name: &str,
        return_type: Option<NodeIndex>,
        body: &[NodeIndex],
    ) -> NodeIndex {
        let body = self.block(body);
        self.function_like(SyntaxKind::GetAccessor, Some(name), &[], &[], return_type, body)
    }

    pub fn set_accessor(&self, name: &str, parameter: NodeIndex, body: &[NodeIndex]) -> NodeIndex {
        let body = self.block(body);
        self.function_like(
            SyntaxKind::SetAccessor,
            Some(name),
            &[],
            &[parameter],
            None,
            body,
        )
    }

    pub fn module_decl(&self, name: &str, body: &[NodeIndex]) -> NodeIndex {
        let name = self.ident(name);
        self.add(
            SyntaxKind::ModuleDeclaration,
            NodeData::Module {
                name,
                body: list(body),
            },
        )
    }

    pub fn enum_decl(&self, name: &str, members: &[NodeIndex]) -> NodeIndex {
        let name = self.ident(name);
        self.add(
            SyntaxKind::EnumDeclaration,
            NodeData::Enum {
                name,
                members: list(members),
            },
        )
    }

    pub fn enum_member(&self, name: &str, initializer: Option<NodeIndex>) -> NodeIndex {
        let name = self.ident(name);
        self.add(
            SyntaxKind::EnumMember,
            NodeData::EnumMember {
                name,
                initializer: opt(initializer),
            },
        )
    }

    pub fn type_alias(
        &self,
        name: &str,
        type_parameters: &[NodeIndex],
        type_node: NodeIndex,
    ) -> NodeIndex {
        let name = self.ident(name);
        self.add(
            SyntaxKind::TypeAliasDeclaration,
            NodeData::TypeAlias {
                name,
                type_parameters: list(type_parameters),
                type_node,
            },
        )
    }

    // =========================================================================
    // Statements
    // =========================================================================

    pub fn block(&self, statements: &[NodeIndex]) -> NodeIndex {
        self.add(
            SyntaxKind::Block,
            NodeData::Block {
                statements: list(statements),
            },
        )
    }

    pub fn expr_stmt(&self, expression: NodeIndex) -> NodeIndex {
        self.add(
            SyntaxKind::ExpressionStatement,
            NodeData::ExpressionStatement { expression },
        )
    }

    pub fn return_stmt(&self, expression: Option<NodeIndex>) -> NodeIndex {
        self.add(
            SyntaxKind::ReturnStatement,
            NodeData::Return {
                expression: opt(expression),
            },
        )
    }

    pub fn if_stmt(
        &self,
        condition: NodeIndex,
        then_statement: NodeIndex,
        else_statement: Option<NodeIndex>,
    ) -> NodeIndex {
        self.add(
            SyntaxKind::IfStatement,
            NodeData::If {
                condition,
                then_statement,
                else_statement: opt(else_statement),
            },
        )
    }

    pub fn try_catch(
        &self,
        try_statements: &[NodeIndex],
        catch_variable: &str,
        catch_statements: &[NodeIndex],
    ) -> NodeIndex {
        let try_block = self.block(try_statements);
        let variable = self.variable_like(SyntaxKind::Parameter, catch_variable, None, None);
        let block = self.block(catch_statements);
        let catch_clause = self.add(
            SyntaxKind::CatchClause,
            NodeData::CatchClause { variable, block },
        );
        self.add(
            SyntaxKind::TryStatement,
            NodeData::Try {
                try_block,
                catch_clause,
                finally_block: NodeIndex::NONE,
            },
        )
    }

    pub fn with_stmt(&self, expression: NodeIndex, statements: &[NodeIndex]) -> NodeIndex {
        let statement = self.block(statements);
        self.add(
            SyntaxKind::WithStatement,
            NodeData::With {
                expression,
                statement,
            },
        )
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    pub fn prop_assign(&self, name: &str, initializer: NodeIndex) -> NodeIndex {
        let name = self.ident(name);
        self.add(
            SyntaxKind::PropertyAssignment,
            NodeData::PropertyAssignment { name, initializer },
        )
    }

    pub fn object_lit(&self, properties: &[NodeIndex]) -> NodeIndex {
        self.add(
            SyntaxKind::ObjectLiteralExpression,
            NodeData::ObjectLiteral {
                properties: list(properties),
            },
        )
    }

    pub fn array_lit(&self, elements: &[NodeIndex]) -> NodeIndex {
        self.add(
            SyntaxKind::ArrayLiteralExpression,
            NodeData::ArrayLiteral {
                elements: list(elements),
            },
        )
    }

    pub fn call(
        &self,
        expression: NodeIndex,
        type_arguments: &[NodeIndex],
        arguments: &[NodeIndex],
    ) -> NodeIndex {
        self.add(
            SyntaxKind::CallExpression,
            NodeData::Call {
                expression,
                type_arguments: list(type_arguments),
                arguments: list(arguments),
            },
        )
    }

    pub fn new_expr(
        &self,
        expression: NodeIndex,
        type_arguments: &[NodeIndex],
        arguments: &[NodeIndex],
    ) -> NodeIndex {
        self.add(
            SyntaxKind::NewExpression,
            NodeData::Call {
                expression,
                type_arguments: list(type_arguments),
                arguments: list(arguments),
            },
        )
    }

    pub fn access(&self, expression: NodeIndex, name: &str) -> NodeIndex {
        let name = self.ident(name);
        self.add(
            SyntaxKind::PropertyAccessExpression,
            NodeData::PropertyAccess { expression, name },
        )
    }

    pub fn element_access(&self, expression: NodeIndex, argument: NodeIndex) -> NodeIndex {
        self.add(
            SyntaxKind::ElementAccessExpression,
            NodeData::ElementAccess {
                expression,
                argument,
            },
        )
    }

    pub fn conditional(
        &self,
        condition: NodeIndex,
        when_true: NodeIndex,
        when_false: NodeIndex,
    ) -> NodeIndex {
        self.add(
            SyntaxKind::ConditionalExpression,
            NodeData::Conditional {
                condition,
                when_true,
                when_false,
            },
        )
    }

    pub fn binary(&self, left: NodeIndex, operator: BinaryOperator, right: NodeIndex) -> NodeIndex {
        self.add(
            SyntaxKind::BinaryExpression,
            NodeData::Binary {
                left,
                operator,
                right,
            },
        )
    }

    pub fn assign(&self, left: NodeIndex, right: NodeIndex) -> NodeIndex {
        self.binary(left, BinaryOperator::Assign, right)
    }

    pub fn paren(&self, expression: NodeIndex) -> NodeIndex {
        self.add(
            SyntaxKind::ParenthesizedExpression,
            NodeData::Parenthesized { expression },
        )
    }

    pub fn function_expr(
        &self,
        type_parameters: &[NodeIndex],
        parameters: &[NodeIndex],
        return_type: Option<NodeIndex>,
        body: &[NodeIndex],
    ) -> NodeIndex {
        let body = self.block(body);
        self.function_like(
            SyntaxKind::FunctionExpression,
            None,
            type_parameters,
            parameters,
            return_type,
            body,
        )
    }

    /// Arrow function with an expression body.
    pub fn arrow(
        &self,
        parameters: &[NodeIndex],
        return_type: Option<NodeIndex>,
        body: NodeIndex,
    ) -> NodeIndex {
        self.function_like(SyntaxKind::ArrowFunction, None, &[], parameters, return_type, body)
    }

    pub fn assertion(&self, type_node: NodeIndex, expression: NodeIndex) -> NodeIndex {
        self.add(
            SyntaxKind::TypeAssertion,
            NodeData::TypeAssertion {
                type_node,
                expression,
            },
        )
    }
}

/// Assign source-order spans: tokens get distinct ranges separated by one
/// byte, composites cover their children plus one leading byte.
fn layout(arena: &mut NodeArena, index: NodeIndex, cursor: &mut u32) -> Span {
    let children = arena.children(index);
    let span = if children.is_empty() {
        let width = match arena.get(index).map(|n| (&n.data, n.kind)) {
            Some((NodeData::Identifier { text }, _)) => text.len().max(1) as u32,
            Some((NodeData::StringLiteral { text }, _)) => text.len() as u32 + 2,
            Some((NodeData::NumericLiteral { value }, _)) => value.to_string().len() as u32,
            Some((_, kind)) => kind.token_width(),
            None => 1,
        };
        let span = Span::new(*cursor, *cursor + width);
        *cursor += width + 1;
        span
    } else {
        let start = *cursor;
        *cursor += 1;
        let mut end = start + 1;
        for child in children {
            end = end.max(layout(arena, child, cursor).end);
        }
        *cursor = end + 1;
        Span::new(start, end)
    };
    if let Some(node) = arena.nodes.get_mut(index.0 as usize) {
        node.span = span;
    }
    span
}

#[cfg(test)]
#[path = "../tests/builder_tests.rs"]
mod tests;
