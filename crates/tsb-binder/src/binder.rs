//! Binder: turns decls into symbols.
//!
//! Depth-first over the decl tree, parents before children so container
//! symbols exist before their members attach. A decl whose (scope, name)
//! already has a symbol of a mergeable kind extends that symbol; any other
//! collision is a duplicate-identifier diagnostic on the later decl, which
//! then gets an orphan symbol of its own.
//!
//! When a unit is rebound after an edit, `reuse` maps new decls to the
//! symbols of their unchanged or changed counterparts so symbol identity
//! survives the edit.

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, trace};
use tsb_common::{Diagnostic, DiagnosticKind, Span};
use tsb_syntax::NodeIndex;

use crate::decls::{Decl, DeclFlags, DeclId, DeclKind, DeclRef, DeclTree, UnitId};
use crate::graph::SymbolGraph;
use crate::links::LinkKind;
use crate::semantic_info::{AttachedDiagnostic, SemanticInfo, Unit};
use crate::symbols::{
    ResolutionState, SignatureKind, SymbolFlags, SymbolId, SymbolKind, SymbolTable,
};

/// How a new decl combines with a symbol already bound under its name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MergeAction {
    /// Extend the existing symbol.
    Merge,
    /// Add another signature to a function or method overload group.
    Overload,
    /// Duplicate identifier.
    Conflict,
}

/// The declaration merge matrix.
pub const fn merge_action(existing: SymbolKind, incoming: DeclKind) -> MergeAction {
    use SymbolKind as S;
    match (existing, incoming) {
        (S::Interface, DeclKind::Interface)
        | (S::Module, DeclKind::Module)
        | (S::Enum, DeclKind::Enum)
        | (S::Class | S::Function | S::Enum, DeclKind::Module)
        | (S::Accessor, DeclKind::GetAccessor | DeclKind::SetAccessor) => MergeAction::Merge,
        (S::Function, DeclKind::Function) | (S::Method, DeclKind::Method) => MergeAction::Overload,
        (
            S::Primitive
            | S::Error
            | S::Class
            | S::Interface
            | S::ObjectType
            | S::Enum
            | S::Array
            | S::TypeParameter
            | S::TypeAlias
            | S::Module
            | S::Variable
            | S::Parameter
            | S::Property
            | S::Method
            | S::Function
            | S::Accessor
            | S::EnumMember
            | S::Signature(_),
            _,
        ) => MergeAction::Conflict,
    }
}

fn symbol_flags_for(decl: &Decl) -> SymbolFlags {
    let mut flags = SymbolFlags::empty();
    for (d, s) in [
        (DeclFlags::EXPORTED, SymbolFlags::EXPORTED),
        (DeclFlags::OPTIONAL, SymbolFlags::OPTIONAL),
        (DeclFlags::REST, SymbolFlags::REST),
        (DeclFlags::STATIC, SymbolFlags::STATIC),
        (DeclFlags::PRIVATE, SymbolFlags::PRIVATE),
        (DeclFlags::AMBIENT, SymbolFlags::AMBIENT),
    ] {
        if decl.has_flag(d) {
            flags |= s;
        }
    }
    flags
}

/// Where a named decl is entered.
#[derive(Clone, Copy, Debug)]
enum Scope {
    /// Module or global exports.
    Exports(SymbolId),
    /// Instance or static members of a type.
    Members(SymbolId),
    /// Locals of a function-like, catch or with decl.
    Locals(DeclId),
}

pub(crate) struct Binder<'a> {
    graph: &'a mut SymbolGraph,
    units: &'a [Option<Unit>],
    unit: UnitId,
    path: &'a str,
    tree: &'a DeclTree,
    info: &'a mut SemanticInfo,
    reuse: &'a FxHashMap<DeclId, SymbolId>,
    reuse_signatures: &'a FxHashMap<DeclId, SymbolId>,
    /// Containers whose tables were touched; re-sorted into declaration order at the end.
    touched: FxHashSet<SymbolId>,
}

impl<'a> Binder<'a> {
    pub(crate) fn new(
        graph: &'a mut SymbolGraph,
        units: &'a [Option<Unit>],
        unit: &'a mut Unit,
        reuse: &'a FxHashMap<DeclId, SymbolId>,
        reuse_signatures: &'a FxHashMap<DeclId, SymbolId>,
    ) -> Self {
        Self {
            graph,
            units,
            unit: unit.id,
            path: &unit.path,
            tree: &unit.decls,
            info: &mut unit.info,
            reuse,
            reuse_signatures,
            touched: FxHashSet::default(),
        }
    }

    #[tracing::instrument(level = "debug", skip(self), fields(unit = self.unit.0, path = self.path))]
    pub(crate) fn bind_unit(mut self) {
        for &root in self.tree.roots() {
            self.bind_decl(root, Scope::Exports(SymbolId::GLOBAL));
        }
        self.finish();
        debug!(
            symbols = self.info.decl_symbols.len(),
            signatures = self.info.decl_signatures.len(),
            diagnostics = self.info.binder_diagnostics.len(),
            "unit bound"
        );
    }

    fn decl(&self, id: DeclId) -> Option<&'a Decl> {
        self.tree.get(id)
    }

    fn decl_by_ref(&self, r: DeclRef) -> Option<&'a Decl> {
        if r.unit == self.unit {
            return self.tree.get(r.decl);
        }
        self.units
            .get(r.unit.0 as usize)
            .and_then(Option::as_ref)
            .and_then(|u| u.decls.get(r.decl))
    }

    fn decl_location(&self, r: DeclRef) -> (String, Span) {
        let path = if r.unit == self.unit {
            self.path.to_string()
        } else {
            self.units
                .get(r.unit.0 as usize)
                .and_then(Option::as_ref)
                .map_or_else(String::new, |u| u.path.clone())
        };
        let span = self.decl_by_ref(r).map_or_else(Span::default, name_span);
        (path, span)
    }

    fn diagnostic(&self, decl: DeclId, kind: DiagnosticKind, args: Vec<String>) -> AttachedDiagnostic {
        let (node, span) = self
            .decl(decl)
            .map_or((NodeIndex::NONE, Span::default()), |d| (d.name_node, name_span(d)));
        AttachedDiagnostic {
            decl: Some(decl),
            node,
            diagnostic: Diagnostic::new(self.path, span, kind, args),
        }
    }

    fn report(&mut self, decl: DeclId, kind: DiagnosticKind, args: Vec<String>) {
        let diagnostic = self.diagnostic(decl, kind, args);
        self.info.binder_diagnostics.push(diagnostic);
    }

    // =========================================================================
    // Decl dispatch
    // =========================================================================

    fn bind_decl(&mut self, id: DeclId, scope: Scope) {
        let Some(decl) = self.decl(id) else {
            return;
        };
        trace!(decl = id.0, kind = ?decl.kind, name = %decl.name, "binding decl");
        match decl.kind {
            DeclKind::Module => {
                let sym = self.declare(id, scope, SymbolKind::Module);
                if self.graph.kind(sym) == SymbolKind::Module {
                    self.ensure_value_type(sym, SymbolFlags::empty());
                }
                for &child in &decl.children {
                    self.bind_decl(child, Scope::Exports(sym));
                }
            }
            DeclKind::Class => self.bind_class(id, decl, scope),
            DeclKind::Interface => {
                let sym = self.declare(id, scope, SymbolKind::Interface);
                self.bind_type_parameters(id, sym);
                self.bind_type_members(id, sym);
            }
            DeclKind::TypeLiteral => {
                let sym = self.anonymous(id, SymbolKind::ObjectType);
                self.bind_type_members(id, sym);
            }
            DeclKind::Enum => {
                let sym = self.declare(id, scope, SymbolKind::Enum);
                let value_type = self.ensure_value_type(sym, SymbolFlags::empty());
                for &child in &decl.children {
                    match self.decl(child).map(|d| d.kind) {
                        Some(DeclKind::EnumMember) => {
                            let member =
                                self.declare(child, Scope::Members(value_type), SymbolKind::EnumMember);
                            self.set_bound_type(member, sym);
                        }
                        _ => self.bind_decl(child, Scope::Locals(id)),
                    }
                }
            }
            DeclKind::TypeAlias => {
                let sym = self.declare(id, scope, SymbolKind::TypeAlias);
                self.bind_type_parameters(id, sym);
                self.bind_locals(id);
            }
            DeclKind::Function | DeclKind::Method => {
                let kind = if decl.kind == DeclKind::Function {
                    SymbolKind::Function
                } else {
                    SymbolKind::Method
                };
                let sym = self.declare(id, scope, kind);
                let value_type = self.ensure_value_type(sym, SymbolFlags::empty());
                self.bind_signature(id, value_type, SignatureKind::Call);
            }
            DeclKind::GetAccessor | DeclKind::SetAccessor => {
                let sym = self.declare(id, scope, SymbolKind::Accessor);
                self.bind_signature(id, sym, SignatureKind::Call);
            }
            DeclKind::FunctionType | DeclKind::FunctionExpression | DeclKind::ArrowFunction => {
                let sym = self.anonymous(id, SymbolKind::ObjectType);
                self.bind_signature(id, sym, SignatureKind::Call);
            }
            DeclKind::ConstructorType => {
                let sym = self.anonymous(id, SymbolKind::ObjectType);
                self.bind_signature(id, sym, SignatureKind::Construct);
            }
            DeclKind::Variable | DeclKind::Property | DeclKind::TypeParameter => {
                let kind = match decl.kind {
                    DeclKind::Variable => SymbolKind::Variable,
                    DeclKind::Property => SymbolKind::Property,
                    _ => SymbolKind::TypeParameter,
                };
                self.declare(id, scope, kind);
                self.bind_locals(id);
            }
            DeclKind::Parameter => {
                self.declare(id, scope, SymbolKind::Parameter);
                self.bind_locals(id);
            }
            DeclKind::Catch => {
                for &child in &decl.children {
                    match self.decl(child).map(|d| d.kind) {
                        Some(DeclKind::Parameter) => {
                            let var = self.declare(child, Scope::Locals(id), SymbolKind::Variable);
                            self.set_bound_type(var, SymbolId::ANY);
                        }
                        _ => self.bind_decl(child, Scope::Locals(id)),
                    }
                }
            }
            DeclKind::With => self.bind_locals(id),
            // Signatures outside a type body: attach to whatever owns the scope.
            DeclKind::Constructor
            | DeclKind::CallSignature
            | DeclKind::ConstructSignature
            | DeclKind::IndexSignature => {
                let owner = match scope {
                    Scope::Exports(s) | Scope::Members(s) => s,
                    Scope::Locals(_) => SymbolId::ERROR,
                };
                self.bind_signature(id, owner, signature_kind_of(decl.kind));
            }
            // Enum members only bind inside their enum.
            DeclKind::EnumMember => {}
        }
    }

    fn bind_locals(&mut self, id: DeclId) {
        let Some(decl) = self.decl(id) else {
            return;
        };
        for &child in &decl.children {
            self.bind_decl(child, Scope::Locals(id));
        }
    }

    fn bind_class(&mut self, id: DeclId, decl: &'a Decl, scope: Scope) {
        let sym = self.declare(id, scope, SymbolKind::Class);
        let ctor_type = self.ensure_value_type(sym, SymbolFlags::CONSTRUCTOR_TYPE);
        self.bind_type_parameters(id, sym);

        // Implicit constructors are recreated on every bind.
        self.drop_transient_signatures(ctor_type, SignatureKind::Construct);

        let mut has_constructor = false;
        for &child in &decl.children {
            let Some(member) = self.decl(child) else {
                continue;
            };
            match member.kind {
                DeclKind::TypeParameter => {}
                DeclKind::Constructor => {
                    has_constructor = true;
                    self.bind_signature(child, ctor_type, SignatureKind::Construct);
                    let type_parameters = self
                        .graph
                        .get(sym)
                        .map(|s| s.type_parameters.clone())
                        .unwrap_or_default();
                    if let Some(sig) = self.info.decl_signature(child)
                        && let Some(s) = self.graph.get_mut(sig)
                    {
                        s.type_parameters = type_parameters;
                    }
                }
                DeclKind::Property
                | DeclKind::Method
                | DeclKind::GetAccessor
                | DeclKind::SetAccessor => {
                    let owner = if member.has_flag(DeclFlags::STATIC) {
                        ctor_type
                    } else {
                        sym
                    };
                    self.bind_decl(child, Scope::Members(owner));
                }
                DeclKind::IndexSignature => {
                    self.bind_signature(child, sym, SignatureKind::Index);
                }
                _ => self.bind_decl(child, Scope::Locals(id)),
            }
        }

        if !has_constructor && self.graph.kind(sym) == SymbolKind::Class {
            let sig = self.graph.alloc(SymbolKind::Signature(SignatureKind::Construct), "");
            let type_parameters = self
                .graph
                .get(sym)
                .map(|s| s.type_parameters.clone())
                .unwrap_or_default();
            if let Some(s) = self.graph.get_mut(sig) {
                s.flags |= SymbolFlags::TRANSIENT;
                s.type_parameters = type_parameters;
            }
            self.attach_signature(sig, ctor_type, SignatureKind::Construct);
        }
    }

    /// Members and signatures of an interface or type literal.
    fn bind_type_members(&mut self, id: DeclId, sym: SymbolId) {
        let Some(decl) = self.decl(id) else {
            return;
        };
        for &child in &decl.children {
            match self.decl(child).map(|d| d.kind) {
                Some(DeclKind::TypeParameter) => {}
                Some(DeclKind::Property | DeclKind::Method) => {
                    self.bind_decl(child, Scope::Members(sym));
                }
                Some(
                    kind @ (DeclKind::CallSignature
                    | DeclKind::ConstructSignature
                    | DeclKind::IndexSignature),
                ) => {
                    self.bind_signature(child, sym, signature_kind_of(kind));
                }
                _ => self.bind_decl(child, Scope::Locals(id)),
            }
        }
    }

    // =========================================================================
    // Symbols
    // =========================================================================

    fn table(&mut self, scope: Scope) -> Option<&mut SymbolTable> {
        match scope {
            Scope::Exports(owner) => self.graph.get_mut(owner).map(|s| &mut s.exports),
            Scope::Members(owner) => self.graph.get_mut(owner).map(|s| &mut s.members),
            Scope::Locals(decl) => Some(self.info.decl_locals.entry(decl).or_default()),
        }
    }

    /// A symbol still in a table but without declarations is stale: its
    /// decls were detached by a rebind and it awaits cleanup.
    fn live_entry(&self, sym: SymbolId) -> bool {
        self.graph
            .get(sym)
            .is_some_and(|s| !s.declarations.is_empty())
    }

    fn reusable(&self, id: DeclId, kind: SymbolKind) -> Option<SymbolId> {
        self.reuse
            .get(&id)
            .copied()
            .filter(|&s| self.graph.get(s).is_some_and(|sym| sym.kind == kind))
    }

    /// Enter a named decl into `scope`, merging with an existing symbol when the
    /// merge matrix allows it.
    fn declare(&mut self, id: DeclId, scope: Scope, kind: SymbolKind) -> SymbolId {
        let Some(decl) = self.decl(id) else {
            return SymbolId::ERROR;
        };
        let decl_ref = DeclRef::new(self.unit, id);
        let reused = self.reusable(id, kind);
        let existing = self
            .table(scope)
            .and_then(|t| t.get(&decl.name).copied())
            .filter(|&s| self.live_entry(s));

        let sym = match existing {
            None => {
                let sym = reused.unwrap_or_else(|| self.graph.alloc(kind, decl.name.clone()));
                if let Some(table) = self.table(scope) {
                    table.insert(decl.name.clone(), sym);
                }
                self.attach_to_scope(sym, scope);
                sym
            }
            Some(existing) if Some(existing) == reused => existing,
            Some(existing) => match merge_action(self.graph.kind(existing), decl.kind) {
                MergeAction::Merge => {
                    trace!(name = %decl.name, symbol = existing.0, "merging declaration");
                    existing
                }
                MergeAction::Overload => {
                    if decl.has_flag(DeclFlags::HAS_BODY) && self.has_implementation(existing) {
                        self.report(
                            id,
                            DiagnosticKind::DuplicateFunctionImplementation,
                            vec![decl.name.clone()],
                        );
                    }
                    existing
                }
                MergeAction::Conflict => {
                    self.report_duplicate(id, existing);
                    let orphan = reused.unwrap_or_else(|| self.graph.alloc(kind, decl.name.clone()));
                    if let Some(s) = self.graph.get_mut(orphan) {
                        s.flags |= SymbolFlags::ORPHAN;
                    }
                    orphan
                }
            },
        };

        let flags = symbol_flags_for(decl);
        if let Some(s) = self.graph.get_mut(sym) {
            s.add_declaration(decl_ref);
            s.flags |= flags;
        }
        self.info.decl_symbols.insert(id, sym);
        sym
    }

    fn attach_to_scope(&mut self, sym: SymbolId, scope: Scope) {
        match scope {
            Scope::Exports(owner) => {
                self.graph.link(sym, owner, LinkKind::ContainedBy);
                if let Some(s) = self.graph.get_mut(sym) {
                    s.owner = Some(owner);
                }
                self.touched.insert(owner);
            }
            Scope::Members(owner) => {
                self.graph.link(sym, owner, LinkKind::MemberOf);
                if let Some(s) = self.graph.get_mut(sym) {
                    s.owner = Some(owner);
                }
                self.touched.insert(owner);
            }
            Scope::Locals(_) => {}
        }
    }

    /// Symbol for an anonymous structural decl (type literal, function type,
    /// function expression); never entered in a table.
    fn anonymous(&mut self, id: DeclId, kind: SymbolKind) -> SymbolId {
        let sym = self
            .reusable(id, kind)
            .unwrap_or_else(|| self.graph.alloc(kind, ""));
        if let Some(s) = self.graph.get_mut(sym) {
            s.add_declaration(DeclRef::new(self.unit, id));
            s.state = ResolutionState::Resolved;
        }
        self.info.decl_symbols.insert(id, sym);
        sym
    }

    fn has_implementation(&self, sym: SymbolId) -> bool {
        self.graph.get(sym).is_some_and(|s| {
            s.declarations.iter().any(|&r| {
                self.decl_by_ref(r)
                    .is_some_and(|d| d.has_flag(DeclFlags::HAS_BODY))
            })
        })
    }

    fn report_duplicate(&mut self, id: DeclId, existing: SymbolId) {
        let name = self.decl(id).map(|d| d.name.clone()).unwrap_or_default();
        debug!(name = %name, existing = existing.0, "duplicate identifier");
        let mut entry = self.diagnostic(id, DiagnosticKind::DuplicateIdentifier, vec![name.clone()]);
        if let Some(first) = self.graph.get(existing).and_then(|s| s.first_declaration()) {
            let (path, span) = self.decl_location(first);
            entry.diagnostic = entry.diagnostic.with_related(
                path,
                span,
                DiagnosticKind::DuplicateIdentifier,
                vec![name],
            );
        }
        self.info.binder_diagnostics.push(entry);
    }

    /// Value-side object type of a class, function, method, enum or module.
    fn ensure_value_type(&mut self, sym: SymbolId, flags: SymbolFlags) -> SymbolId {
        if let Some(existing) = self.graph.get(sym).and_then(|s| s.type_of) {
            return existing;
        }
        let name = self.graph.name(sym).to_string();
        let value_type = self.graph.alloc(SymbolKind::ObjectType, name);
        if let Some(t) = self.graph.get_mut(value_type) {
            t.flags |= flags;
            t.owner = Some(sym);
            t.state = ResolutionState::Resolved;
        }
        self.set_bound_type(sym, value_type);
        value_type
    }

    /// Record a type fixed at bind time (not computed by the resolver).
    fn set_bound_type(&mut self, sym: SymbolId, ty: SymbolId) {
        if let Some(s) = self.graph.get_mut(sym) {
            s.type_of = Some(ty);
            s.state = ResolutionState::Resolved;
        }
        self.graph.link(sym, ty, LinkKind::TypeOf);
    }

    // =========================================================================
    // Signatures and type parameters
    // =========================================================================

    /// Bind the signature of a function-like decl: type parameters and
    /// parameters become locals of the decl; other children are nested decls.
    fn bind_signature(&mut self, id: DeclId, owner: SymbolId, kind: SignatureKind) {
        let Some(decl) = self.decl(id) else {
            return;
        };
        let sig_kind = SymbolKind::Signature(kind);
        let sig = self
            .reuse_signatures
            .get(&id)
            .copied()
            .filter(|&s| self.graph.kind(s) == sig_kind)
            .unwrap_or_else(|| self.graph.alloc(sig_kind, decl.name.clone()));
        if let Some(s) = self.graph.get_mut(sig) {
            s.add_declaration(DeclRef::new(self.unit, id));
            s.parameters.clear();
            s.type_parameters.clear();
        }
        self.info.decl_signatures.insert(id, sig);
        self.attach_signature(sig, owner, kind);

        for &child in &decl.children {
            match self.decl(child).map(|d| d.kind) {
                Some(DeclKind::TypeParameter) => {
                    let tp = self.declare(child, Scope::Locals(id), SymbolKind::TypeParameter);
                    if let Some(s) = self.graph.get_mut(sig) {
                        s.type_parameters.push(tp);
                    }
                    self.graph.link(tp, sig, LinkKind::ContainedBy);
                    self.bind_locals(child);
                }
                Some(DeclKind::Parameter) => {
                    let param = self.declare(child, Scope::Locals(id), SymbolKind::Parameter);
                    if let Some(s) = self.graph.get_mut(sig) {
                        s.parameters.push(param);
                    }
                    self.graph.link(param, sig, LinkKind::ParameterOf);
                    self.bind_locals(child);
                }
                _ => self.bind_decl(child, Scope::Locals(id)),
            }
        }
    }

    fn attach_signature(&mut self, sig: SymbolId, owner: SymbolId, kind: SignatureKind) {
        if let Some(o) = self.graph.get_mut(owner) {
            let list = o.signatures_mut(kind);
            if !list.contains(&sig) {
                list.push(sig);
            }
        }
        self.graph.link(sig, owner, LinkKind::MemberOf);
        self.touched.insert(owner);
    }

    fn drop_transient_signatures(&mut self, owner: SymbolId, kind: SignatureKind) {
        let transient: Vec<SymbolId> = self
            .graph
            .get(owner)
            .map(|o| {
                o.signatures(kind)
                    .iter()
                    .copied()
                    .filter(|&s| self.graph.flags(s).contains(SymbolFlags::TRANSIENT))
                    .collect()
            })
            .unwrap_or_default();
        if transient.is_empty() {
            return;
        }
        if let Some(o) = self.graph.get_mut(owner) {
            o.signatures_mut(kind).retain(|s| !transient.contains(s));
        }
        for sig in transient {
            self.graph.remove_symbol(sig);
        }
    }

    /// Type parameters of a class, interface or type alias. The first decl of
    /// a merged symbol defines them; later decls must repeat the same names.
    fn bind_type_parameters(&mut self, id: DeclId, owner: SymbolId) {
        let Some(decl) = self.decl(id) else {
            return;
        };
        let params: Vec<DeclId> = decl
            .children
            .iter()
            .copied()
            .filter(|&c| self.decl(c).is_some_and(|d| d.kind == DeclKind::TypeParameter))
            .collect();
        let existing = self
            .graph
            .get(owner)
            .map(|s| s.type_parameters.clone())
            .unwrap_or_default();

        if existing.is_empty() {
            for &param in &params {
                let tp = self.declare(param, Scope::Locals(id), SymbolKind::TypeParameter);
                if let Some(s) = self.graph.get_mut(owner) {
                    s.type_parameters.push(tp);
                }
                self.graph.link(tp, owner, LinkKind::ContainedBy);
                self.bind_locals(param);
            }
            return;
        }

        let names_match = existing.len() == params.len()
            && existing.iter().zip(&params).all(|(&tp, &p)| {
                self.decl(p)
                    .is_some_and(|d| d.name == self.graph.name(tp))
            });
        if !names_match && !params.is_empty() {
            self.report(
                id,
                DiagnosticKind::ConflictingTypeParameters,
                vec![decl.name.clone()],
            );
        }
        for (i, &param) in params.iter().enumerate() {
            let Some(p) = self.decl(param) else {
                continue;
            };
            let tp = match existing.get(i) {
                Some(&tp) if names_match => {
                    if let Some(s) = self.graph.get_mut(tp) {
                        s.add_declaration(DeclRef::new(self.unit, param));
                    }
                    self.info.decl_symbols.insert(param, tp);
                    tp
                }
                _ => {
                    let orphan = self.graph.alloc(SymbolKind::TypeParameter, p.name.clone());
                    if let Some(s) = self.graph.get_mut(orphan) {
                        s.add_declaration(DeclRef::new(self.unit, param));
                        s.flags |= SymbolFlags::ORPHAN;
                    }
                    self.info.decl_symbols.insert(param, orphan);
                    orphan
                }
            };
            self.info
                .decl_locals
                .entry(id)
                .or_default()
                .insert(p.name.clone(), tp);
            self.bind_locals(param);
        }
    }

    /// Restore declaration order in every touched table and signature list.
    fn finish(&mut self) {
        let touched: Vec<SymbolId> = self.touched.drain().collect();
        for owner in touched {
            let graph: &SymbolGraph = self.graph;
            let Some(sym) = graph.get(owner) else {
                continue;
            };
            let order = |s: &SymbolId| {
                graph
                    .get(*s)
                    .and_then(|sym| sym.first_declaration())
                    .map_or((1, None), |d| (0, Some(d)))
            };
            let mut members = sym.members.clone();
            let mut exports = sym.exports.clone();
            let mut signatures = [
                sym.call_signatures.clone(),
                sym.construct_signatures.clone(),
                sym.index_signatures.clone(),
            ];
            members.sort_by(|_, a, _, b| order(a).cmp(&order(b)));
            exports.sort_by(|_, a, _, b| order(a).cmp(&order(b)));
            for list in &mut signatures {
                list.sort_by_key(|s| order(s));
            }
            if let Some(sym) = self.graph.get_mut(owner) {
                let [call, construct, index] = signatures;
                sym.members = members;
                sym.exports = exports;
                sym.call_signatures = call;
                sym.construct_signatures = construct;
                sym.index_signatures = index;
            }
        }
    }
}

const fn signature_kind_of(kind: DeclKind) -> SignatureKind {
    match kind {
        DeclKind::Constructor | DeclKind::ConstructSignature | DeclKind::ConstructorType => {
            SignatureKind::Construct
        }
        DeclKind::IndexSignature => SignatureKind::Index,
        _ => SignatureKind::Call,
    }
}

/// Span of a decl's name, or of the whole decl when anonymous.
pub fn name_span(decl: &Decl) -> Span {
    if decl.name_node.is_some() {
        decl.name_span
    } else {
        decl.span
    }
}

#[cfg(test)]
#[path = "../tests/binder_tests.rs"]
mod tests;
