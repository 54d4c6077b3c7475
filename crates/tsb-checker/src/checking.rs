//! The check pass: walks a unit's statements and declarations, forcing
//! resolution and reporting relational errors that resolution alone does
//! not surface.

use smallvec::SmallVec;
use tracing::{debug, trace};
use tsb_binder::{DeclFlags, LinkKind, SymbolId, SymbolKind, UnitId};
use tsb_common::DiagnosticKind;
use tsb_solver::objects::{arity, parameter_type_at, resolve_alias};
use tsb_solver::{ComparisonInfo, RelationKind, erase_signature, is_assignable, is_related_with, type_to_string};
use tsb_syntax::{NodeArena, NodeData, NodeIndex, SyntaxKind};

use crate::state::CheckerState;

impl<'a> CheckerState<'a> {
    pub(crate) fn check_unit(&mut self, unit: UnitId) {
        let Some(arena) = self.arena(unit) else {
            return;
        };
        debug!(unit = unit.0, nodes = arena.len(), "checking unit");
        if let Some(NodeData::SourceFile { statements }) = arena.get(arena.root()).map(|n| &n.data) {
            for stmt in statements.iter() {
                self.check_statement(unit, &arena, stmt, None);
            }
        }
        self.check_type_references(unit, &arena);
    }

    /// Check one statement or declaration. `returns` is the declared return
    /// type of the enclosing function, when it has one.
    fn check_statement(
        &mut self,
        unit: UnitId,
        arena: &NodeArena,
        node: NodeIndex,
        returns: Option<SymbolId>,
    ) {
        let Some(n) = arena.get(node) else {
            return;
        };
        match (n.kind, &n.data) {
            (
                SyntaxKind::VariableDeclaration
                | SyntaxKind::PropertyDeclaration
                | SyntaxKind::PropertySignature,
                NodeData::Variable {
                    type_annotation,
                    initializer,
                    ..
                },
            ) => self.check_variable(unit, node, *type_annotation, *initializer),
            (kind, NodeData::FunctionLike { .. })
                if matches!(
                    kind,
                    SyntaxKind::FunctionDeclaration
                        | SyntaxKind::MethodDeclaration
                        | SyntaxKind::Constructor
                        | SyntaxKind::GetAccessor
                        | SyntaxKind::SetAccessor
                ) =>
            {
                self.check_function_declaration(unit, node);
            }
            (_, NodeData::FunctionLike { .. }) => {
                if let Some(sig) = self.signature_of_node(unit, node) {
                    self.return_type(sig);
                }
            }
            (_, NodeData::Class { members, .. }) => {
                self.check_class(unit, node);
                for member in members.iter() {
                    self.check_statement(unit, arena, member, None);
                }
            }
            (_, NodeData::Interface { members, .. }) => {
                self.check_interface(unit, node);
                for member in members.iter() {
                    self.check_statement(unit, arena, member, None);
                }
            }
            (_, NodeData::Enum { members, .. }) => {
                for member in members.iter() {
                    if let Some(NodeData::EnumMember { initializer, .. }) = arena.get(member).map(|m| &m.data)
                        && initializer.is_some()
                    {
                        let value = self.resolve_expression(unit, *initializer, Some(SymbolId::NUMBER));
                        self.check_assignable(unit, *initializer, value, SymbolId::NUMBER);
                    }
                }
            }
            (_, NodeData::TypeAlias { .. }) => {
                if let Some(alias) = self.bound_symbol_of_node(unit, node) {
                    self.declared_type(alias);
                }
            }
            (_, NodeData::Module { body, .. }) | (_, NodeData::Block { statements: body }) => {
                for stmt in body.iter() {
                    self.check_statement(unit, arena, stmt, returns);
                }
            }
            (_, NodeData::ExpressionStatement { expression }) => {
                self.resolve_expression(unit, *expression, None);
            }
            (_, NodeData::Return { expression }) => {
                if expression.is_none() {
                    return;
                }
                let value = self.resolve_expression(unit, *expression, returns);
                if let Some(expected) = returns {
                    self.check_assignable(unit, *expression, value, expected);
                }
            }
            (_, NodeData::If {
                condition,
                then_statement,
                else_statement,
            }) => {
                self.resolve_expression(unit, *condition, None);
                self.check_statement(unit, arena, *then_statement, returns);
                self.check_statement(unit, arena, *else_statement, returns);
            }
            (_, NodeData::Try {
                try_block,
                catch_clause,
                finally_block,
            }) => {
                self.check_statement(unit, arena, *try_block, returns);
                if let Some(NodeData::CatchClause { block, .. }) = arena.get(*catch_clause).map(|c| &c.data) {
                    self.check_statement(unit, arena, *block, returns);
                }
                self.check_statement(unit, arena, *finally_block, returns);
            }
            (_, NodeData::With {
                expression,
                statement,
            }) => {
                self.resolve_expression(unit, *expression, None);
                self.check_statement(unit, arena, *statement, returns);
            }
            _ => {}
        }
    }

    fn check_variable(
        &mut self,
        unit: UnitId,
        node: NodeIndex,
        annotation: NodeIndex,
        initializer: NodeIndex,
    ) {
        let Some(sym) = self.bound_symbol_of_node(unit, node) else {
            return;
        };
        let declared = self.declared_type(sym);
        if annotation.is_none() || initializer.is_none() {
            return;
        }
        let value = self.resolve_expression(unit, initializer, Some(declared));
        self.check_assignable(unit, initializer, value, declared);
    }

    fn signature_of_node(&self, unit: UnitId, node: NodeIndex) -> Option<SymbolId> {
        let u = self.chain.unit(unit)?;
        let decl = u.decls.decl_of_node(node)?;
        u.info.decl_signature(decl)
    }

    // =========================================================================
    // Functions
    // =========================================================================

    fn check_function_declaration(&mut self, unit: UnitId, node: NodeIndex) {
        let Some(sig) = self.signature_of_node(unit, node) else {
            return;
        };
        self.report_implicit_any(unit, sig);
        self.return_type(sig);
        self.check_function_body(unit, node);
        if self.signature_has_body(sig) {
            self.check_overloads(unit, sig);
        }
    }

    /// Check the body of a function-like node against its annotated return
    /// type. Nested function expressions are checked when resolved.
    pub(crate) fn check_function_body(&mut self, unit: UnitId, node: NodeIndex) {
        let Some(arena) = self.arena(unit) else {
            return;
        };
        let Some(NodeData::FunctionLike { body, .. }) = arena.get(node).map(|n| &n.data) else {
            return;
        };
        if body.is_none() {
            return;
        }
        let returns = match self.signature_of_node(unit, node) {
            Some(sig) if self.declaration_has_flag(sig, DeclFlags::ANNOTATED) => Some(self.return_type(sig)),
            _ => None,
        };
        if arena.get(*body).map(|b| b.kind) == Some(SyntaxKind::Block) {
            self.check_statement(unit, &arena, *body, returns);
            return;
        }
        let value = self.resolve_expression(unit, *body, returns);
        if let Some(expected) = returns {
            self.check_assignable(unit, *body, value, expected);
        }
    }

    /// Every overload in the group of `implementation` must be compatible
    /// with it.
    fn check_overloads(&mut self, unit: UnitId, implementation: SymbolId) {
        let Some(&owner) = self
            .chain
            .graph
            .targets(implementation, LinkKind::MemberOf)
            .first()
        else {
            return;
        };
        let kind = match self.chain.graph.kind(implementation) {
            SymbolKind::Signature(kind) => kind,
            _ => return,
        };
        let group: SmallVec<[SymbolId; 4]> = self
            .chain
            .graph
            .get(owner)
            .map(|s| s.signatures(kind).iter().copied().collect())
            .unwrap_or_default();
        for overload in group {
            if overload == implementation || self.signature_has_body(overload) {
                continue;
            }
            if self.overload_compatible(implementation, overload) {
                continue;
            }
            let Some(site) = self.first_site(overload) else {
                continue;
            };
            if site.unit != unit {
                continue;
            }
            let name = self.chain.graph.name(overload).to_string();
            trace!(overload = overload.0, implementation = implementation.0, "incompatible overload");
            let at = if site.name_node.is_some() { site.name_node } else { site.node };
            self.report(unit, at, DiagnosticKind::OverloadNotCompatible, vec![name]);
        }
    }

    /// An overload is compatible when the implementation accepts its
    /// parameters (either direction) and its return type relates to the
    /// implementation's.
    fn overload_compatible(&mut self, implementation: SymbolId, overload: SymbolId) -> bool {
        let implementation = erase_signature(self, implementation);
        let overload = erase_signature(self, overload);
        let impl_arity = arity(&*self, implementation);
        let overload_arity = arity(&*self, overload);
        if impl_arity.required > overload_arity.fixed && !overload_arity.has_rest {
            return false;
        }
        let count = self
            .chain
            .graph
            .get(overload)
            .map_or(0, |s| s.parameters.len());
        for index in 0..count {
            let expected = parameter_type_at(self, overload, index);
            let actual = parameter_type_at(self, implementation, index);
            if !is_assignable(self, expected, actual) && !is_assignable(self, actual, expected) {
                return false;
            }
        }
        let overload_return = self.return_type(overload);
        if resolve_alias(self, overload_return) == SymbolId::VOID {
            return true;
        }
        let impl_return = self.return_type(implementation);
        is_assignable(self, impl_return, overload_return) || is_assignable(self, overload_return, impl_return)
    }

    // =========================================================================
    // Heritage
    // =========================================================================

    /// Symbol of a merged declaration, when `node` is its first declaration.
    fn first_declared_symbol(&self, unit: UnitId, node: NodeIndex) -> Option<SymbolId> {
        let sym = self.bound_symbol_of_node(unit, node)?;
        let first = self.first_site(sym)?;
        (first.unit == unit && first.node == node).then_some(sym)
    }

    fn check_class(&mut self, unit: UnitId, node: NodeIndex) {
        let Some(class) = self.first_declared_symbol(unit, node) else {
            return;
        };
        self.bases_of(class);
        let implemented: SmallVec<[SymbolId; 4]> = self.chain.graph.targets(class, LinkKind::Implements);
        for interface in implemented {
            self.check_heritage(unit, node, class, interface, DiagnosticKind::ClassIncorrectlyImplements);
        }
    }

    fn check_interface(&mut self, unit: UnitId, node: NodeIndex) {
        let Some(interface) = self.first_declared_symbol(unit, node) else {
            return;
        };
        let bases = self.bases_of(interface);
        for base in bases {
            self.check_heritage(unit, node, interface, base, DiagnosticKind::InterfaceIncorrectlyExtends);
        }
    }

    fn check_heritage(
        &mut self,
        unit: UnitId,
        node: NodeIndex,
        derived: SymbolId,
        base: SymbolId,
        kind: DiagnosticKind,
    ) {
        let mut info = ComparisonInfo::new();
        if is_related_with(self, derived, base, RelationKind::Subtype, Some(&mut info)) {
            return;
        }
        let mut args = vec![
            type_to_string(&self.chain.graph, derived),
            type_to_string(&self.chain.graph, base),
        ];
        if let Some(member) = info.failure().and_then(|f| f.member_name()) {
            args.push(member.to_string());
        }
        let at = self
            .arena(unit)
            .and_then(|arena| arena.get(node).map(|n| n.name()))
            .filter(|n| n.is_some())
            .unwrap_or(node);
        self.report(unit, at, kind, args);
    }

    // =========================================================================
    // Type references
    // =========================================================================

    /// Resolve every type reference so that unresolvable names and arity
    /// errors are reported even in positions nothing else resolves.
    fn check_type_references(&mut self, unit: UnitId, arena: &NodeArena) {
        for i in 0..arena.len() {
            let node = NodeIndex(i as u32);
            if arena.get(node).is_some_and(|n| n.kind == SyntaxKind::TypeReference) {
                self.resolve_type_node(unit, node);
            }
        }
    }
}

#[cfg(test)]
#[path = "../tests/checking_tests.rs"]
mod tests;
