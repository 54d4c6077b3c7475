//! Editor tooling queries: hover, signature help, completion scope and
//! go-to-definition.
//!
//! Queries run the check pass on the unit first so that every name node has
//! been resolved and every call site has a recorded resolution. Results carry
//! symbol ids; rendering them as text is a separate step.

use serde::Serialize;
use tsb_binder::{DeclKind, SymbolId, UnitId};
use tsb_common::Span;
use tsb_solver::signature_to_string;
use tsb_syntax::{NodeData, NodeIndex, SyntaxKind};

use crate::program::Program;

/// A name visible in some scope.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ScopeSymbol {
    pub name: String,
    pub symbol: SymbolId,
    pub kind: &'static str,
}

/// The symbol a position refers to, with its type rendered for display.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SymbolAtPosition {
    pub symbol: ScopeSymbol,
    #[serde(rename = "type")]
    pub type_text: String,
    /// Span of the name node under the cursor.
    pub span: Span,
    pub enclosing_scope: Option<SymbolId>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureHelp {
    /// Candidate signatures in declaration order.
    pub candidates: Vec<SymbolId>,
    /// The candidate overload resolution picked, before specialization.
    pub chosen: Option<SymbolId>,
    /// Argument the position falls in (or the next one to be written).
    pub active_argument: usize,
    pub enclosing_scope: Option<SymbolId>,
}

/// Names visible at a position, innermost scope first.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisibleSymbols {
    pub symbols: Vec<ScopeSymbol>,
    pub enclosing_scope: Option<SymbolId>,
}

/// Decls whose body forms a scope a position can sit in.
const fn is_scope_container(kind: DeclKind) -> bool {
    matches!(
        kind,
        DeclKind::Module
            | DeclKind::Class
            | DeclKind::Interface
            | DeclKind::Enum
            | DeclKind::Function
            | DeclKind::Method
            | DeclKind::Constructor
            | DeclKind::GetAccessor
            | DeclKind::SetAccessor
            | DeclKind::FunctionExpression
            | DeclKind::ArrowFunction
    )
}

impl Program {
    fn ensure_checked(&mut self, unit: UnitId) {
        self.check_unit(unit);
    }

    fn node_at(&self, unit: UnitId, offset: u32) -> Option<NodeIndex> {
        let node = self.chain().unit(unit)?.arena.node_at_offset(offset);
        node.to_option()
    }

    fn scope_symbol(&self, name: String, symbol: SymbolId) -> ScopeSymbol {
        ScopeSymbol {
            name,
            symbol,
            kind: self.chain().graph.kind(symbol).description(),
        }
    }

    /// Symbol of the innermost named container around `node`, or the global
    /// scope at top level. A declaration's own name sits in its parent's scope.
    fn enclosing_scope(&self, unit: UnitId, node: NodeIndex) -> Option<SymbolId> {
        let u = self.chain().unit(unit)?;
        let inner = u
            .arena
            .ancestors(node)
            .filter_map(|ancestor| u.decls.decl_of_node(ancestor))
            .find_map(|decl| {
                let d = u.decls.get(decl)?;
                if d.name_node == node || !is_scope_container(d.kind) {
                    return None;
                }
                u.info.decl_symbol(decl)
            });
        Some(inner.unwrap_or(SymbolId::GLOBAL))
    }

    /// Render a signature the way diagnostics print it.
    pub fn signature_to_string(&self, signature: SymbolId) -> String {
        signature_to_string(&self.chain().graph, signature)
    }

    /// Symbol referenced or declared by the name at `offset`.
    pub fn symbol_at_position(&mut self, unit: UnitId, offset: u32) -> Option<SymbolAtPosition> {
        self.ensure_checked(unit);
        let node = self.node_at(unit, offset)?;
        let u = self.chain().unit(unit)?;
        let symbol = match u.info.node_symbols.get(&node) {
            Some(&sym) => sym,
            None => {
                // A declaration's own name.
                let parent = u.arena.parent(node).to_option()?;
                let decl = u.decls.decl_of_node(parent)?;
                if u.decls.get(decl)?.name_node != node {
                    return None;
                }
                u.info.decl_symbol(decl)?
            }
        };
        let span = u.arena.span(node);
        let name = self.chain().graph.name(symbol).to_string();
        let ty = if self.chain().graph.kind(symbol).is_value() {
            self.type_of_symbol(symbol)
        } else {
            symbol
        };
        Some(SymbolAtPosition {
            symbol: self.scope_symbol(name, symbol),
            type_text: self.type_to_string(ty),
            span,
            enclosing_scope: self.enclosing_scope(unit, node),
        })
    }

    /// Overload help for the innermost call enclosing `offset`.
    pub fn signature_at_position(&mut self, unit: UnitId, offset: u32) -> Option<SignatureHelp> {
        self.ensure_checked(unit);
        let node = self.node_at(unit, offset)?;
        let u = self.chain().unit(unit)?;
        let (call, arguments) = u.arena.ancestors(node).find_map(|ancestor| {
            let n = u.arena.get(ancestor)?;
            match (&n.data, n.kind) {
                (
                    NodeData::Call { arguments, .. },
                    SyntaxKind::CallExpression | SyntaxKind::NewExpression,
                ) if u.info.call_resolutions.contains_key(&ancestor) => Some((ancestor, arguments)),
                _ => None,
            }
        })?;
        let resolution = u.info.call_resolutions.get(&call)?;
        let active_argument = arguments
            .iter()
            .position(|arg| u.arena.span(arg).end >= offset)
            .unwrap_or(arguments.len());
        let candidates = resolution.candidates.to_vec();
        let chosen = resolution
            .chosen_index
            .and_then(|index| candidates.get(index).copied());
        Some(SignatureHelp {
            candidates,
            chosen,
            active_argument,
            enclosing_scope: self.enclosing_scope(unit, call),
        })
    }

    /// Every name visible at `offset`, innermost scope first.
    pub fn visible_symbols_at_position(&mut self, unit: UnitId, offset: u32) -> VisibleSymbols {
        let Some(node) = self.node_at(unit, offset) else {
            return VisibleSymbols::default();
        };
        let visible = self.state().visible_symbols(unit, node);
        VisibleSymbols {
            symbols: visible
                .into_iter()
                .map(|(name, sym)| self.scope_symbol(name, sym))
                .collect(),
            enclosing_scope: self.enclosing_scope(unit, node),
        }
    }

    /// Path and name span of every declaration behind `symbol`.
    pub fn definition_of(&self, symbol: SymbolId) -> Vec<(String, Span)> {
        let Some(s) = self.chain().graph.get(symbol) else {
            return Vec::new();
        };
        s.declarations
            .iter()
            .filter_map(|&d| {
                let decl = self.chain().decl(d)?;
                let span = if decl.name_node.is_some() {
                    decl.name_span
                } else {
                    decl.span
                };
                Some((self.chain().path(d.unit).to_string(), span))
            })
            .collect()
    }
}

#[cfg(test)]
#[path = "../tests/query_tests.rs"]
mod tests;
