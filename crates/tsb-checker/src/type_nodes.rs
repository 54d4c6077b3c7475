//! Type annotations to type symbols.

use smallvec::SmallVec;
use tracing::trace;
use tsb_binder::{SymbolId, UnitId};
use tsb_common::DiagnosticKind;
use tsb_solver::specialize;
use tsb_syntax::{NodeArena, NodeData, NodeIndex, NodeList, SyntaxKind};

use crate::scope::Meaning;
use crate::state::CheckerState;

impl<'a> CheckerState<'a> {
    /// Resolve a type node. A missing annotation reads as `any`.
    pub(crate) fn resolve_type_node(&mut self, unit: UnitId, node: NodeIndex) -> SymbolId {
        if node.is_none() {
            return SymbolId::ANY;
        }
        if let Some(ty) = self.lookup_type(unit, node, None) {
            return ty;
        }
        let Some(arena) = self.arena(unit) else {
            return SymbolId::ERROR;
        };
        let Some(n) = arena.get(node) else {
            return SymbolId::ERROR;
        };
        let ty = match (n.kind, &n.data) {
            (SyntaxKind::AnyKeyword, _) => SymbolId::ANY,
            (SyntaxKind::NumberKeyword, _) => SymbolId::NUMBER,
            (SyntaxKind::StringKeyword, _) => SymbolId::STRING,
            (SyntaxKind::BooleanKeyword, _) => SymbolId::BOOLEAN,
            (SyntaxKind::VoidKeyword, _) => SymbolId::VOID,
            (SyntaxKind::UndefinedKeyword, _) => SymbolId::UNDEFINED,
            (SyntaxKind::NullKeyword, _) => SymbolId::NULL,
            (
                _,
                NodeData::TypeReference {
                    type_name,
                    type_arguments,
                },
            ) => self.resolve_type_reference(unit, &arena, node, *type_name, type_arguments),
            (_, NodeData::ArrayType { element_type }) => {
                let element = self.resolve_type_node(unit, *element_type);
                self.chain.graph.array_of(element)
            }
            (SyntaxKind::TypeLiteral | SyntaxKind::FunctionType | SyntaxKind::ConstructorType, _) => {
                self.bound_type_of_node(unit, node)
            }
            _ => SymbolId::ERROR,
        };
        self.store_type(unit, node, None, ty);
        ty
    }

    fn resolve_type_reference(
        &mut self,
        unit: UnitId,
        arena: &NodeArena,
        node: NodeIndex,
        type_name: NodeIndex,
        type_arguments: &NodeList,
    ) -> SymbolId {
        let Some(root) = self.resolve_entity_name(unit, type_name, Meaning::Type) else {
            return SymbolId::ERROR;
        };
        if root == SymbolId::ANY || root == SymbolId::ERROR {
            return root;
        }
        let args: SmallVec<[SymbolId; 4]> = type_arguments
            .iter()
            .map(|arg| self.resolve_type_node(unit, arg))
            .collect();
        let expected = self
            .chain
            .graph
            .get(root)
            .map_or(0, |s| s.type_parameters.len());
        if args.len() != expected {
            let name = arena.entity_name_parts(type_name).join(".");
            self.report(
                unit,
                node,
                DiagnosticKind::GenericTypeArity,
                vec![name, expected.to_string()],
            );
            return SymbolId::ERROR;
        }
        if args.is_empty() {
            return root;
        }
        let ty = specialize(self, root, &args);
        trace!(root = root.0, ?args, ty = ty.0, "type reference specialized");
        ty
    }

    /// Symbol the binder created for an anonymous type node.
    pub(crate) fn bound_type_of_node(&self, unit: UnitId, node: NodeIndex) -> SymbolId {
        self.bound_symbol_of_node(unit, node)
            .unwrap_or(SymbolId::ERROR)
    }

    /// Symbol bound to the decl of `node`, if `node` introduces one.
    pub(crate) fn bound_symbol_of_node(&self, unit: UnitId, node: NodeIndex) -> Option<SymbolId> {
        let u = self.chain.unit(unit)?;
        let decl = u.decls.decl_of_node(node)?;
        u.info.decl_symbol(decl)
    }
}
