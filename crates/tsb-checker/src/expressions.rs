//! Expression typing.
//!
//! `resolve_expression` maps an expression node to its type under an
//! optional contextual type. Results are memoized per
//! `(node, contextual type)` in the unit's `SemanticInfo`, except while
//! resolving speculatively (overload candidates) or inside a contextually
//! typed function body, where they go to scratch space instead.

use smallvec::SmallVec;
use tracing::trace;
use tsb_binder::{LinkKind, ResolutionState, SignatureKind, SymbolFlags, SymbolId, SymbolKind, UnitId};
use tsb_common::DiagnosticKind;
use tsb_solver::objects::{find_member, member_type, resolve_alias, signatures_of};
use tsb_solver::{is_assignable, type_to_string};
use tsb_syntax::{BinaryOperator, ModifierFlags, NodeArena, NodeData, NodeIndex, NodeList, SyntaxKind};

use crate::resolver::widen;
use crate::scope::{Meaning, NameLookup};
use crate::state::CheckerState;

impl<'a> CheckerState<'a> {
    pub(crate) fn resolve_expression(
        &mut self,
        unit: UnitId,
        node: NodeIndex,
        contextual: Option<SymbolId>,
    ) -> SymbolId {
        if node.is_none() {
            return SymbolId::ANY;
        }
        if let Some(ty) = self.lookup_type(unit, node, contextual) {
            return ty;
        }
        if !self.depth.enter() {
            trace!(node = node.0, "expression depth exceeded");
            return SymbolId::ERROR;
        }
        let ty = self.compute_expression(unit, node, contextual);
        self.depth.leave();
        self.store_type(unit, node, contextual, ty);
        ty
    }

    fn compute_expression(
        &mut self,
        unit: UnitId,
        node: NodeIndex,
        contextual: Option<SymbolId>,
    ) -> SymbolId {
        let Some(arena) = self.arena(unit) else {
            return SymbolId::ERROR;
        };
        let Some(n) = arena.get(node) else {
            return SymbolId::ERROR;
        };
        match (n.kind, &n.data) {
            (SyntaxKind::NumericLiteral, _) => SymbolId::NUMBER,
            (SyntaxKind::StringLiteral, _) => SymbolId::STRING,
            (SyntaxKind::TrueKeyword | SyntaxKind::FalseKeyword, _) => SymbolId::BOOLEAN,
            (SyntaxKind::NullKeyword, _) => SymbolId::NULL,
            (SyntaxKind::ThisKeyword, _) => self.this_type(unit, &arena, node),
            (_, NodeData::Identifier { text }) => self.resolve_identifier(unit, node, text),
            (_, NodeData::Parenthesized { expression }) => {
                self.resolve_expression(unit, *expression, contextual)
            }
            (_, NodeData::TypeAssertion {
                type_node,
                expression,
            }) => {
                let asserted = self.resolve_type_node(unit, *type_node);
                self.resolve_expression(unit, *expression, Some(asserted));
                asserted
            }
            (_, NodeData::ObjectLiteral { properties }) => {
                self.resolve_object_literal(unit, &arena, node, properties, contextual)
            }
            (_, NodeData::ArrayLiteral { elements }) => {
                self.resolve_array_literal(unit, node, elements, contextual)
            }
            (_, NodeData::Conditional {
                condition,
                when_true,
                when_false,
            }) => {
                self.resolve_expression(unit, *condition, None);
                let a = self.resolve_expression(unit, *when_true, contextual);
                let b = self.resolve_expression(unit, *when_false, contextual);
                self.common_type_or_report(unit, node, &[a, b])
            }
            (_, NodeData::Binary {
                left,
                operator,
                right,
            }) => self.resolve_binary(unit, node, *left, *operator, *right, contextual),
            (_, NodeData::PropertyAccess { expression, name }) => {
                self.resolve_property_access(unit, &arena, *expression, *name)
            }
            (_, NodeData::ElementAccess {
                expression,
                argument,
            }) => self.resolve_element_access(unit, *expression, *argument),
            (SyntaxKind::CallExpression, NodeData::Call { .. }) => {
                self.resolve_call_expression(unit, node, SignatureKind::Call)
            }
            (SyntaxKind::NewExpression, NodeData::Call { .. }) => {
                self.resolve_call_expression(unit, node, SignatureKind::Construct)
            }
            (SyntaxKind::FunctionExpression | SyntaxKind::ArrowFunction, _) => {
                self.resolve_function_expression(unit, node, contextual)
            }
            _ => SymbolId::ERROR,
        }
    }

    // =========================================================================
    // Names
    // =========================================================================

    fn resolve_identifier(&mut self, unit: UnitId, node: NodeIndex, name: &str) -> SymbolId {
        match self.lookup_name(unit, node, name, Meaning::Value) {
            NameLookup::Dynamic => SymbolId::ANY,
            NameLookup::Missing if name == "undefined" => SymbolId::UNDEFINED,
            NameLookup::Missing => {
                self.record_unresolved(unit, name);
                self.report(unit, node, DiagnosticKind::NameNotFound, vec![name.to_string()]);
                SymbolId::ERROR
            }
            NameLookup::Found(sym) => {
                self.record_symbol(unit, node, sym);
                if !self.chain.graph.kind(sym).is_value() {
                    self.report(unit, node, DiagnosticKind::WrongSymbolKind, vec![name.to_string()]);
                    return SymbolId::ERROR;
                }
                self.declared_type(sym)
            }
        }
    }

    /// `this` is the instance type inside instance members and the
    /// constructor type inside static members.
    fn this_type(&mut self, unit: UnitId, arena: &NodeArena, node: NodeIndex) -> SymbolId {
        let mut is_static = false;
        for ancestor in arena.ancestors(node) {
            let Some(n) = arena.get(ancestor) else {
                break;
            };
            match n.kind {
                SyntaxKind::FunctionExpression | SyntaxKind::FunctionDeclaration => {
                    return SymbolId::ANY;
                }
                SyntaxKind::ClassDeclaration => {
                    let Some(class) = self.bound_symbol_of_node(unit, ancestor) else {
                        return SymbolId::ERROR;
                    };
                    return if is_static { self.declared_type(class) } else { class };
                }
                _ => is_static |= n.has_modifier(ModifierFlags::STATIC),
            }
        }
        SymbolId::ANY
    }

    // =========================================================================
    // Literals
    // =========================================================================

    fn resolve_object_literal(
        &mut self,
        unit: UnitId,
        arena: &NodeArena,
        node: NodeIndex,
        properties: &NodeList,
        contextual: Option<SymbolId>,
    ) -> SymbolId {
        let contextual = contextual
            .map(|c| self.apparent_type(c))
            .filter(|&c| self.chain.graph.kind(c).is_object_like());
        let object = self.chain.graph.alloc(SymbolKind::ObjectType, "");
        if let Some(s) = self.chain.graph.get_mut(object) {
            s.flags |= SymbolFlags::TRANSIENT | SymbolFlags::OBJECT_LITERAL;
            s.state = ResolutionState::Resolved;
        }
        self.record_transient(unit, object);

        for property in properties.iter() {
            let Some(NodeData::PropertyAssignment { name, initializer }) =
                arena.get(property).map(|n| &n.data)
            else {
                continue;
            };
            let Some(text) = arena.name_text(*name) else {
                continue;
            };
            let expected = match contextual {
                Some(c) => find_member(self, c, text).map(|m| member_type(self, m)),
                None => None,
            };
            let value = self.resolve_expression(unit, *initializer, expected);
            let value = if expected.is_some() { value } else { widen(value) };

            let member = self.chain.graph.alloc(SymbolKind::Property, text);
            if let Some(s) = self.chain.graph.get_mut(member) {
                s.flags |= SymbolFlags::TRANSIENT;
                s.type_of = Some(value);
                s.owner = Some(object);
                s.state = ResolutionState::Resolved;
            }
            self.chain.graph.link(member, object, LinkKind::MemberOf);
            self.chain.graph.link(member, value, LinkKind::TypeOf);
            if let Some(s) = self.chain.graph.get_mut(object) {
                s.members.insert(text.to_string(), member);
            }
            self.record_transient(unit, member);
            self.record_symbol(unit, *name, member);
        }
        trace!(node = node.0, object = object.0, "object literal type");
        object
    }

    fn resolve_array_literal(
        &mut self,
        unit: UnitId,
        node: NodeIndex,
        elements: &NodeList,
        contextual: Option<SymbolId>,
    ) -> SymbolId {
        let expected_element = contextual.and_then(|c| {
            let c = self.apparent_type(c);
            self.chain.graph.get(c).and_then(|s| s.element_type)
        });
        if let Some(expected) = expected_element {
            let types: SmallVec<[SymbolId; 8]> = elements
                .iter()
                .map(|e| self.resolve_expression(unit, e, Some(expected)))
                .collect();
            if types.iter().all(|&t| is_assignable(self, t, expected)) {
                return self.chain.graph.array_of(expected);
            }
        }
        if elements.is_empty() {
            return self.chain.graph.array_of(SymbolId::ANY);
        }
        let types: SmallVec<[SymbolId; 8]> = elements
            .iter()
            .map(|e| self.resolve_expression(unit, e, None))
            .collect();
        let element = self.common_type_or_report(unit, node, &types);
        if element == SymbolId::ERROR {
            return SymbolId::ERROR;
        }
        let element = widen(element);
        self.chain.graph.array_of(element)
    }

    /// The most specific candidate every other candidate is assignable to.
    pub(crate) fn best_common_type(&mut self, candidates: &[SymbolId]) -> Option<SymbolId> {
        if candidates.contains(&SymbolId::ERROR) {
            return Some(SymbolId::ERROR);
        }
        if candidates.contains(&SymbolId::ANY) {
            return Some(SymbolId::ANY);
        }
        let concrete: SmallVec<[SymbolId; 8]> = candidates
            .iter()
            .copied()
            .filter(|t| !t.is_widening())
            .collect();
        let Some(&first) = concrete.first() else {
            return candidates.first().copied();
        };
        if concrete.iter().all(|&t| t == first) {
            return Some(first);
        }
        for &candidate in &concrete {
            if concrete
                .iter()
                .all(|&other| other == candidate || is_assignable(self, other, candidate))
            {
                return Some(candidate);
            }
        }
        None
    }

    fn common_type_or_report(&mut self, unit: UnitId, node: NodeIndex, candidates: &[SymbolId]) -> SymbolId {
        match self.best_common_type(candidates) {
            Some(ty) => ty,
            None => {
                let names = candidates
                    .iter()
                    .map(|&t| type_to_string(&self.chain.graph, t))
                    .collect::<Vec<_>>()
                    .join(", ");
                self.report(unit, node, DiagnosticKind::NoBestCommonType, vec![names]);
                SymbolId::ERROR
            }
        }
    }

    // =========================================================================
    // Operators
    // =========================================================================

    fn resolve_binary(
        &mut self,
        unit: UnitId,
        node: NodeIndex,
        left: NodeIndex,
        operator: BinaryOperator,
        right: NodeIndex,
        contextual: Option<SymbolId>,
    ) -> SymbolId {
        match operator {
            BinaryOperator::Assign => {
                let target = self.resolve_expression(unit, left, None);
                let value = self.resolve_expression(unit, right, Some(target));
                self.check_assignable(unit, right, value, target);
                value
            }
            BinaryOperator::AmpersandAmpersand => {
                self.resolve_expression(unit, left, None);
                self.resolve_expression(unit, right, contextual)
            }
            BinaryOperator::BarBar => {
                let a = self.resolve_expression(unit, left, contextual);
                let b = self.resolve_expression(unit, right, contextual);
                self.best_common_type(&[a, b]).unwrap_or(a)
            }
            BinaryOperator::Comma => {
                self.resolve_expression(unit, left, None);
                self.resolve_expression(unit, right, contextual)
            }
            BinaryOperator::Plus => {
                let a = self.resolve_expression(unit, left, None);
                let b = self.resolve_expression(unit, right, None);
                let (a, b) = (self.apparent_type(a), self.apparent_type(b));
                if a == SymbolId::STRING || b == SymbolId::STRING {
                    SymbolId::STRING
                } else if self.is_numeric(a) && self.is_numeric(b) {
                    SymbolId::NUMBER
                } else {
                    SymbolId::ANY
                }
            }
            op if op.is_arithmetic() => {
                self.resolve_expression(unit, left, None);
                self.resolve_expression(unit, right, None);
                SymbolId::NUMBER
            }
            _ => {
                trace!(node = node.0, ?operator, "comparison");
                self.resolve_expression(unit, left, None);
                self.resolve_expression(unit, right, None);
                SymbolId::BOOLEAN
            }
        }
    }

    fn is_numeric(&self, ty: SymbolId) -> bool {
        ty == SymbolId::NUMBER || self.chain.graph.kind(ty) == SymbolKind::Enum
    }

    /// Report `type-mismatch` at `node` unless `source` is assignable to
    /// `target`. The first failing member, if any, is an extra argument.
    pub(crate) fn check_assignable(
        &mut self,
        unit: UnitId,
        node: NodeIndex,
        source: SymbolId,
        target: SymbolId,
    ) -> bool {
        let mut info = tsb_solver::ComparisonInfo::new();
        if tsb_solver::is_related_with(
            self,
            source,
            target,
            tsb_solver::RelationKind::Assignable,
            Some(&mut info),
        ) {
            return true;
        }
        let mut args = vec![
            type_to_string(&self.chain.graph, source),
            type_to_string(&self.chain.graph, target),
        ];
        if let Some(member) = info.failure().and_then(|f| f.member_name()) {
            args.push(member.to_string());
        }
        self.report(unit, node, DiagnosticKind::TypeNotAssignable, args);
        false
    }

    // =========================================================================
    // Member access
    // =========================================================================

    /// The type whose members a value of type `ty` exposes: aliases are
    /// followed and type parameters read as their constraint.
    pub(crate) fn apparent_type(&mut self, ty: SymbolId) -> SymbolId {
        let mut current = ty;
        for _ in 0..8 {
            current = resolve_alias(self, current);
            if self.chain.graph.kind(current) != SymbolKind::TypeParameter {
                return current;
            }
            match self.constraint(current) {
                Some(constraint) => current = constraint,
                None => return SymbolId::ANY,
            }
        }
        SymbolId::ANY
    }

    /// Primitives and arrays have no declared members without a standard
    /// library, so any member access on them is accepted as `any`.
    fn has_opaque_members(&self, ty: SymbolId) -> bool {
        matches!(
            self.chain.graph.kind(ty),
            SymbolKind::Primitive | SymbolKind::Array | SymbolKind::Enum
        ) && ty != SymbolId::VOID
    }

    /// Member `name` of a value of type `object`: declared and inherited
    /// members first, then the exports of a module, class or enum when
    /// `object` is its value side.
    pub(crate) fn find_property(&mut self, object: SymbolId, name: &str) -> Option<SymbolId> {
        let apparent = self.apparent_type(object);
        if self.chain.graph.kind(apparent).is_object_like()
            && let Some(member) = find_member(self, apparent, name)
        {
            return Some(member);
        }
        let owner = self
            .chain
            .graph
            .get(apparent)
            .filter(|s| s.kind == SymbolKind::ObjectType)
            .and_then(|s| s.owner)?;
        self.chain
            .graph
            .get(owner)
            .and_then(|s| s.exports.get(name).copied())
    }

    fn resolve_property_access(
        &mut self,
        unit: UnitId,
        arena: &NodeArena,
        expression: NodeIndex,
        name: NodeIndex,
    ) -> SymbolId {
        let object = self.resolve_expression(unit, expression, None);
        let Some(text) = arena.identifier_text(name) else {
            return SymbolId::ERROR;
        };
        if object == SymbolId::ANY || object == SymbolId::ERROR {
            return object;
        }
        if let Some(member) = self.find_property(object, text) {
            self.record_symbol(unit, name, member);
            if !self.chain.graph.kind(member).is_value() {
                self.report(unit, name, DiagnosticKind::WrongSymbolKind, vec![text.to_string()]);
                return SymbolId::ERROR;
            }
            return member_type(self, member);
        }
        let apparent = self.apparent_type(object);
        if apparent == SymbolId::ANY || self.has_opaque_members(apparent) {
            return SymbolId::ANY;
        }
        let type_name = type_to_string(&self.chain.graph, object);
        self.report(
            unit,
            name,
            DiagnosticKind::PropertyNotFound,
            vec![text.to_string(), type_name],
        );
        SymbolId::ERROR
    }

    fn resolve_element_access(
        &mut self,
        unit: UnitId,
        expression: NodeIndex,
        argument: NodeIndex,
    ) -> SymbolId {
        let object = self.resolve_expression(unit, expression, None);
        self.resolve_expression(unit, argument, None);
        if object == SymbolId::ERROR {
            return SymbolId::ERROR;
        }
        let apparent = self.apparent_type(object);
        if let Some(element) = self.chain.graph.get(apparent).and_then(|s| s.element_type) {
            return element;
        }
        if self.chain.graph.kind(apparent).is_object_like()
            && let Some(&index) = signatures_of(self, apparent, SignatureKind::Index).first()
        {
            return self.return_type(index);
        }
        SymbolId::ANY
    }
}

#[cfg(test)]
#[path = "../tests/expression_tests.rs"]
mod tests;
