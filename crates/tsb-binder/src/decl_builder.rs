//! Declaration tree builder.
//!
//! One pre-order pass over a syntax tree. Every name-introducing construct
//! yields exactly one [`Decl`]; constructs that only refine an existing name
//! (a second overload, a reopened interface) yield a sibling with the same
//! name and kind. No resolution and no diagnostics happen here.

use std::hash::{Hash, Hasher};

use rustc_hash::FxHasher;
use smallvec::SmallVec;
use tracing::trace;
use tsb_syntax::{ModifierFlags, Node, NodeArena, NodeData, NodeIndex, NodeList, SyntaxKind};

use crate::decls::{Decl, DeclFlags, DeclId, DeclKind, DeclTree};

/// Build the decl tree for one unit.
pub fn build_decl_tree(arena: &NodeArena) -> DeclTree {
    let mut builder = DeclTreeBuilder {
        arena,
        tree: DeclTree::default(),
    };
    builder.visit_children(arena.root(), None, DeclFlags::empty());
    trace!(decls = builder.tree.len(), "built decl tree");
    builder.tree
}

const fn decl_kind_of(kind: SyntaxKind) -> Option<DeclKind> {
    Some(match kind {
        SyntaxKind::ModuleDeclaration => DeclKind::Module,
        SyntaxKind::ClassDeclaration => DeclKind::Class,
        SyntaxKind::InterfaceDeclaration => DeclKind::Interface,
        SyntaxKind::EnumDeclaration => DeclKind::Enum,
        SyntaxKind::EnumMember => DeclKind::EnumMember,
        SyntaxKind::TypeAliasDeclaration => DeclKind::TypeAlias,
        SyntaxKind::FunctionDeclaration => DeclKind::Function,
        SyntaxKind::VariableDeclaration => DeclKind::Variable,
        SyntaxKind::Parameter => DeclKind::Parameter,
        SyntaxKind::TypeParameter => DeclKind::TypeParameter,
        SyntaxKind::PropertyDeclaration | SyntaxKind::PropertySignature => DeclKind::Property,
        SyntaxKind::MethodDeclaration | SyntaxKind::MethodSignature => DeclKind::Method,
        SyntaxKind::Constructor => DeclKind::Constructor,
        SyntaxKind::GetAccessor => DeclKind::GetAccessor,
        SyntaxKind::SetAccessor => DeclKind::SetAccessor,
        SyntaxKind::CallSignature => DeclKind::CallSignature,
        SyntaxKind::ConstructSignature => DeclKind::ConstructSignature,
        SyntaxKind::IndexSignature => DeclKind::IndexSignature,
        SyntaxKind::TypeLiteral => DeclKind::TypeLiteral,
        SyntaxKind::FunctionType => DeclKind::FunctionType,
        SyntaxKind::ConstructorType => DeclKind::ConstructorType,
        SyntaxKind::FunctionExpression => DeclKind::FunctionExpression,
        SyntaxKind::ArrowFunction => DeclKind::ArrowFunction,
        SyntaxKind::CatchClause => DeclKind::Catch,
        SyntaxKind::WithStatement => DeclKind::With,
        _ => return None,
    })
}

struct DeclTreeBuilder<'a> {
    arena: &'a NodeArena,
    tree: DeclTree,
}

impl DeclTreeBuilder<'_> {
    fn visit(&mut self, idx: NodeIndex, parent: Option<DeclId>, inherited: DeclFlags) {
        let Some(node) = self.arena.get(idx) else {
            return;
        };
        let Some(kind) = decl_kind_of(node.kind) else {
            self.visit_children(idx, parent, inherited);
            return;
        };

        let flags = Self::flags_of(node, kind) | inherited;
        let id = DeclId(self.tree.decls.len() as u32);
        let name_node = node.name();
        let name = match kind {
            // Catch clauses and with blocks are scopes, not names.
            DeclKind::Catch | DeclKind::With => String::new(),
            _ => self
                .arena
                .identifier_text(name_node)
                .unwrap_or_default()
                .to_string(),
        };
        self.tree.decls.push(Decl {
            kind,
            name,
            flags,
            node: idx,
            name_node,
            span: node.span,
            name_span: self.arena.span(name_node),
            parent,
            children: SmallVec::new(),
            shape: self.shape_of(node, kind, flags),
        });
        self.tree.node_to_decl.insert(idx, id);
        match parent {
            Some(p) => {
                if let Some(parent_decl) = self.tree.decls.get_mut(p.0 as usize) {
                    parent_decl.children.push(id);
                }
            }
            None => self.tree.roots.push(id),
        }

        self.visit_children(idx, Some(id), inherited | (flags & DeclFlags::AMBIENT));
    }

    fn visit_children(&mut self, idx: NodeIndex, parent: Option<DeclId>, inherited: DeclFlags) {
        for child in self.arena.children(idx) {
            self.visit(child, parent, inherited);
        }
    }

    fn flags_of(node: &Node, kind: DeclKind) -> DeclFlags {
        let mut flags = DeclFlags::empty();
        let modifiers = node.modifiers;
        for (modifier, flag) in [
            (ModifierFlags::EXPORT, DeclFlags::EXPORTED),
            (ModifierFlags::DECLARE, DeclFlags::AMBIENT),
            (ModifierFlags::PUBLIC, DeclFlags::PUBLIC),
            (ModifierFlags::PRIVATE, DeclFlags::PRIVATE),
            (ModifierFlags::STATIC, DeclFlags::STATIC),
            (ModifierFlags::OPTIONAL, DeclFlags::OPTIONAL),
            (ModifierFlags::REST, DeclFlags::REST),
        ] {
            if modifiers.contains(modifier) {
                flags |= flag;
            }
        }
        match &node.data {
            NodeData::FunctionLike {
                return_type, body, ..
            } => {
                if return_type.is_some() {
                    flags |= DeclFlags::ANNOTATED;
                }
                if body.is_some() && kind.is_signature_owner() {
                    flags |= DeclFlags::HAS_BODY;
                }
            }
            NodeData::Variable {
                type_annotation, ..
            } if type_annotation.is_some() => flags |= DeclFlags::ANNOTATED,
            NodeData::TypeAlias { .. } => flags |= DeclFlags::ANNOTATED,
            _ => {}
        }
        flags
    }

    /// Fingerprint of the parts of a declaration that determine its type.
    fn shape_of(&self, node: &Node, kind: DeclKind, flags: DeclFlags) -> u64 {
        let mut h = FxHasher::default();
        kind.hash(&mut h);
        (flags - DeclFlags::AMBIENT).bits().hash(&mut h);
        let arena = self.arena;
        let one = |h: &mut FxHasher, idx: NodeIndex| arena.hash_subtree(idx, h);
        let list = |h: &mut FxHasher, list: &NodeList| {
            h.write_usize(list.len());
            for idx in list.iter() {
                arena.hash_subtree(idx, h);
            }
        };
        match &node.data {
            NodeData::Class {
                type_parameters,
                extends,
                implements,
                ..
            } => {
                list(&mut h, type_parameters);
                one(&mut h, *extends);
                list(&mut h, implements);
            }
            NodeData::Interface {
                type_parameters,
                extends,
                ..
            } => {
                list(&mut h, type_parameters);
                list(&mut h, extends);
            }
            NodeData::EnumMember { initializer, .. } => one(&mut h, *initializer),
            NodeData::TypeAlias {
                type_parameters,
                type_node,
                ..
            } => {
                list(&mut h, type_parameters);
                one(&mut h, *type_node);
            }
            NodeData::FunctionLike {
                type_parameters,
                parameters,
                return_type,
                body,
                ..
            } => {
                list(&mut h, type_parameters);
                list(&mut h, parameters);
                one(&mut h, *return_type);
                // The return type is inferred from the body.
                if return_type.is_none() {
                    one(&mut h, *body);
                }
            }
            NodeData::Variable {
                type_annotation,
                initializer,
                ..
            } => {
                one(&mut h, *type_annotation);
                if type_annotation.is_none() {
                    one(&mut h, *initializer);
                }
            }
            NodeData::TypeParameter { constraint, .. } => one(&mut h, *constraint),
            _ => {}
        }
        h.finish()
    }
}

#[cfg(test)]
#[path = "../tests/decl_builder_tests.rs"]
mod tests;
