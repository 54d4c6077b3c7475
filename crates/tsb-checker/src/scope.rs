//! Name lookup.
//!
//! Scopes are found by walking syntax ancestors: every ancestor that has a
//! decl contributes its locals (and a module its exports), then the global
//! table. A `with` statement body makes every value name resolve to `any`.

use tsb_binder::{DeclKind, SymbolId, SymbolKind, SymbolTable, UnitId};
use tsb_common::DiagnosticKind;
use tsb_syntax::{NodeData, NodeIndex};

use crate::state::CheckerState;

/// What a name is looked up as.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Meaning {
    Value,
    Type,
    /// Module prefix of a qualified name.
    Namespace,
}

impl Meaning {
    fn admits(self, kind: SymbolKind) -> bool {
        match self {
            Self::Value => kind.is_value(),
            Self::Type => kind.is_type(),
            Self::Namespace => matches!(kind, SymbolKind::Module | SymbolKind::Enum | SymbolKind::Error),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum NameLookup {
    Found(SymbolId),
    /// Inside a `with` body; the name's meaning is unknowable.
    Dynamic,
    Missing,
}

enum ScopeRef<'t> {
    With,
    Table(&'t SymbolTable),
}

impl<'a> CheckerState<'a> {
    /// Scopes visible at `node`, innermost first.
    fn scopes(&self, unit: UnitId, node: NodeIndex) -> Vec<ScopeRef<'_>> {
        let mut out = Vec::new();
        let Some(u) = self.chain.unit(unit) else {
            return out;
        };
        let mut previous = NodeIndex::NONE;
        for ancestor in u.arena.ancestors(node) {
            if let Some(NodeData::With { statement, .. }) = u.arena.get(ancestor).map(|n| &n.data)
                && *statement == previous
            {
                out.push(ScopeRef::With);
            }
            if let Some(decl) = u.decls.decl_of_node(ancestor) {
                if let Some(locals) = u.info.locals(decl) {
                    out.push(ScopeRef::Table(locals));
                }
                if u.decls.get(decl).is_some_and(|d| d.kind == DeclKind::Module)
                    && let Some(module) = u.info.decl_symbol(decl).and_then(|s| self.chain.graph.get(s))
                {
                    out.push(ScopeRef::Table(&module.exports));
                }
            }
            previous = ancestor;
        }
        if let Some(globals) = self.chain.globals() {
            out.push(ScopeRef::Table(globals));
        }
        out
    }

    pub(crate) fn lookup_name(
        &self,
        unit: UnitId,
        node: NodeIndex,
        name: &str,
        meaning: Meaning,
    ) -> NameLookup {
        for scope in self.scopes(unit, node) {
            match scope {
                ScopeRef::With if meaning == Meaning::Value => return NameLookup::Dynamic,
                ScopeRef::With => {}
                ScopeRef::Table(table) => {
                    if let Some(&sym) = table.get(name) {
                        return NameLookup::Found(sym);
                    }
                }
            }
        }
        NameLookup::Missing
    }

    /// Every name visible at `node`; inner declarations shadow outer ones.
    pub(crate) fn visible_symbols(&self, unit: UnitId, node: NodeIndex) -> Vec<(String, SymbolId)> {
        let mut out: Vec<(String, SymbolId)> = Vec::new();
        for scope in self.scopes(unit, node) {
            let ScopeRef::Table(table) = scope else {
                continue;
            };
            for (name, &sym) in table {
                if !out.iter().any(|(n, _)| n == name) {
                    out.push((name.clone(), sym));
                }
            }
        }
        out
    }

    /// Resolve an identifier or qualified name. Reports and returns `None`
    /// when any segment is missing or the symbol has the wrong meaning.
    pub(crate) fn resolve_entity_name(
        &mut self,
        unit: UnitId,
        name_node: NodeIndex,
        meaning: Meaning,
    ) -> Option<SymbolId> {
        let arena = self.arena(unit)?;
        let parts = arena.entity_name_parts(name_node);
        let (&first, rest) = parts.split_first()?;
        let first_meaning = if rest.is_empty() { meaning } else { Meaning::Namespace };

        let mut current = match self.lookup_name(unit, name_node, first, first_meaning) {
            NameLookup::Found(sym) => sym,
            NameLookup::Dynamic => return Some(SymbolId::ANY),
            NameLookup::Missing => {
                self.record_unresolved(unit, first);
                self.report(unit, name_node, DiagnosticKind::NameNotFound, vec![first.to_string()]);
                return None;
            }
        };
        self.record_symbol(unit, name_node, current);

        for &part in rest {
            let next = self
                .chain
                .graph
                .get(current)
                .and_then(|s| s.exports.get(part).copied());
            let Some(next) = next else {
                self.record_unresolved(unit, part);
                self.report(unit, name_node, DiagnosticKind::NameNotFound, vec![part.to_string()]);
                return None;
            };
            current = next;
            self.record_symbol(unit, name_node, current);
        }

        let kind = self.chain.graph.kind(current);
        if !meaning.admits(kind) {
            let name = parts.join(".");
            self.report(unit, name_node, DiagnosticKind::WrongSymbolKind, vec![name]);
            return None;
        }
        Some(current)
    }
}
