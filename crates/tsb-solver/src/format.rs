//! Human-readable type names for diagnostics and tooling.
//!
//! Formatting only reads the graph. A member whose type was never resolved
//! prints as `any`, and unmaterialized anonymous specializations print their
//! root's shape.

use tsb_binder::{SignatureKind, SymbolFlags, SymbolGraph, SymbolId, SymbolKind};

use crate::recursion::{DepthCounter, RecursionProfile};

pub fn type_to_string(graph: &SymbolGraph, ty: SymbolId) -> String {
    TypeFormatter::new(graph).format(ty)
}

pub fn signature_to_string(graph: &SymbolGraph, signature: SymbolId) -> String {
    let mut formatter = TypeFormatter::new(graph);
    let mut out = String::new();
    formatter.write_signature(&mut out, signature, SignatureStyle::Arrow);
    out
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum SignatureStyle {
    /// `(a: number) => string`
    Arrow,
    /// `(a: number): string`, as inside an object type.
    Member,
}

pub struct TypeFormatter<'g> {
    graph: &'g SymbolGraph,
    depth: DepthCounter,
}

impl<'g> TypeFormatter<'g> {
    pub fn new(graph: &'g SymbolGraph) -> Self {
        Self {
            graph,
            depth: DepthCounter::with_profile(RecursionProfile::ShallowTraversal),
        }
    }

    pub fn format(&mut self, ty: SymbolId) -> String {
        let mut out = String::new();
        self.write_type(&mut out, ty);
        out
    }

    fn write_type(&mut self, out: &mut String, ty: SymbolId) {
        if !self.depth.enter() {
            out.push_str("...");
            return;
        }
        self.write_type_inner(out, ty);
        self.depth.leave();
    }

    fn write_type_inner(&mut self, out: &mut String, ty: SymbolId) {
        let graph = self.graph;
        let Some(sym) = graph.get(ty) else {
            out.push_str("error");
            return;
        };
        if ty.is_intrinsic() {
            out.push_str(&sym.name);
            return;
        }
        match sym.kind {
            SymbolKind::Array => {
                let element = sym.element_type.unwrap_or(SymbolId::ANY);
                let needs_parens = self.is_arrow_type(element);
                if needs_parens {
                    out.push('(');
                }
                self.write_type(out, element);
                if needs_parens {
                    out.push(')');
                }
                out.push_str("[]");
            }
            SymbolKind::ObjectType => {
                // Unmaterialized anonymous specializations print their root.
                let shape = match &sym.specialization {
                    Some(spec) if !sym.state.is_done() => spec.root,
                    _ => ty,
                };
                self.write_object(out, shape);
            }
            SymbolKind::Class | SymbolKind::Interface | SymbolKind::TypeAlias => {
                out.push_str(&sym.name);
                let args = match &sym.specialization {
                    Some(spec) => spec.args.to_vec(),
                    None => sym.type_parameters.clone(),
                };
                self.write_type_list(out, &args);
            }
            SymbolKind::Module => {
                out.push_str("typeof ");
                out.push_str(&sym.name);
            }
            _ => out.push_str(&sym.name),
        }
    }

    fn write_type_list(&mut self, out: &mut String, types: &[SymbolId]) {
        if types.is_empty() {
            return;
        }
        out.push('<');
        for (i, &t) in types.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            self.write_type(out, t);
        }
        out.push('>');
    }

    /// An object type consisting of a single call signature.
    fn is_arrow_type(&self, ty: SymbolId) -> bool {
        self.graph.get(ty).is_some_and(|s| {
            s.kind == SymbolKind::ObjectType
                && s.members.is_empty()
                && s.call_signatures.len() == 1
                && s.construct_signatures.is_empty()
                && s.index_signatures.is_empty()
        })
    }

    fn write_object(&mut self, out: &mut String, ty: SymbolId) {
        let graph = self.graph;
        let Some(sym) = graph.get(ty) else {
            out.push_str("error");
            return;
        };
        if self.is_arrow_type(ty) {
            self.write_signature(out, sym.call_signatures[0], SignatureStyle::Arrow);
            return;
        }
        if let Some(owner) = sym.owner
            && (sym.has_flag(SymbolFlags::CONSTRUCTOR_TYPE) || graph.kind(owner).is_value())
        {
            out.push_str("typeof ");
            out.push_str(graph.name(owner));
            return;
        }

        let has_content = !sym.members.is_empty()
            || !sym.call_signatures.is_empty()
            || !sym.construct_signatures.is_empty()
            || !sym.index_signatures.is_empty();
        if !has_content {
            out.push_str("{}");
            return;
        }
        out.push('{');
        for kind in [SignatureKind::Call, SignatureKind::Construct, SignatureKind::Index] {
            for &sig in sym.signatures(kind) {
                out.push(' ');
                if kind == SignatureKind::Construct {
                    out.push_str("new ");
                }
                self.write_signature(out, sig, SignatureStyle::Member);
                out.push(';');
            }
        }
        for (name, &member) in &sym.members {
            out.push(' ');
            self.write_member(out, name, member);
            out.push(';');
        }
        out.push_str(" }");
    }

    fn write_member(&mut self, out: &mut String, name: &str, member: SymbolId) {
        let graph = self.graph;
        let Some(m) = graph.get(member) else {
            return;
        };
        out.push_str(name);
        if m.has_flag(SymbolFlags::OPTIONAL) {
            out.push('?');
        }
        let method_signatures = match m.kind {
            SymbolKind::Method => m
                .type_of
                .and_then(|t| graph.get(t))
                .map(|t| t.call_signatures.clone())
                .unwrap_or_default(),
            _ => Vec::new(),
        };
        if let [sig] = method_signatures.as_slice() {
            self.write_signature(out, *sig, SignatureStyle::Member);
            return;
        }
        out.push_str(": ");
        match (m.kind, m.type_of) {
            (SymbolKind::Accessor, _) => {
                let ret = m
                    .call_signatures
                    .first()
                    .and_then(|&g| graph.get(g))
                    .and_then(|g| g.return_type)
                    .unwrap_or(SymbolId::ANY);
                self.write_type(out, ret);
            }
            (_, Some(t)) => self.write_type(out, t),
            (_, None) => out.push_str("any"),
        }
    }

    fn write_signature(&mut self, out: &mut String, signature: SymbolId, style: SignatureStyle) {
        let graph = self.graph;
        let Some(sig) = graph.get(signature) else {
            out.push_str("error");
            return;
        };
        let is_index = sig.kind == SymbolKind::Signature(SignatureKind::Index);
        if !sig.type_parameters.is_empty() {
            out.push('<');
            for (i, &tp) in sig.type_parameters.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                out.push_str(graph.name(tp));
            }
            out.push('>');
        }
        out.push(if is_index { '[' } else { '(' });
        for (i, &param) in sig.parameters.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            let Some(p) = graph.get(param) else {
                continue;
            };
            if p.has_flag(SymbolFlags::REST) {
                out.push_str("...");
            }
            out.push_str(&p.name);
            if p.has_flag(SymbolFlags::OPTIONAL) {
                out.push('?');
            }
            out.push_str(": ");
            self.write_type(out, p.type_of.unwrap_or(SymbolId::ANY));
        }
        out.push(if is_index { ']' } else { ')' });
        out.push_str(match style {
            SignatureStyle::Arrow => " => ",
            SignatureStyle::Member => ": ",
        });
        self.write_type(out, sig.return_type.unwrap_or(SymbolId::ANY));
    }
}

#[cfg(test)]
#[path = "../tests/format_tests.rs"]
mod tests;
