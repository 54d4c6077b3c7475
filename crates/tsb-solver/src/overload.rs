//! Overload resolution.
//!
//! Candidates are tried in declaration order: filter by arity, specialize
//! generic candidates (explicit type arguments or inference), then keep the
//! ones whose every argument is assignable to its parameter. Among those,
//! the candidate needing the fewest widening conversions wins, with ties
//! going to the earlier declaration.
//!
//! An argument needs a widening conversion when it is assignable to the
//! parameter but not a subtype of it, e.g. `any` passed to `number`.

use smallvec::SmallVec;
use tracing::{debug, trace};
use tsb_binder::{CallResolution, SymbolId};
use tsb_common::limits;

use crate::infer::InferenceContext;
use crate::instantiate::{erase_signature, specialize_signature};
use crate::objects::{arity, parameter_type_at};
use crate::relation::{is_assignable, is_subtype};
use crate::resolver::SymbolResolver;

/// The argument side of a call site.
///
/// `argument_type` may be called several times per argument with different
/// contextual types; implementations must not record diagnostics from these
/// speculative calls.
pub trait CallArguments: SymbolResolver {
    fn argument_count(&self) -> usize;

    fn argument_type(&mut self, index: usize, contextual: Option<SymbolId>) -> SymbolId;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OverloadError {
    /// No candidate accepts the arguments. `nearest` is the candidate that
    /// accepted the most arguments, if there were any candidates.
    NoMatch { nearest: Option<usize> },
    /// Several candidates tie for best on a call involving `any`.
    Ambiguous { tied: Vec<usize> },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OverloadResolution {
    pub candidates: Vec<SymbolId>,
    /// The chosen signature, specialized when generic.
    pub chosen: Option<SymbolId>,
    pub chosen_index: Option<usize>,
    pub return_type: SymbolId,
    /// Expected type of each argument under the chosen (or nearest) signature.
    pub parameter_types: Vec<SymbolId>,
    pub error: Option<OverloadError>,
}

impl OverloadResolution {
    pub fn is_ok(&self) -> bool {
        !matches!(self.error, Some(OverloadError::NoMatch { .. }))
    }

    pub fn to_call_resolution(&self) -> CallResolution {
        CallResolution {
            chosen: self.chosen,
            chosen_index: self.chosen_index,
            candidates: self.candidates.clone(),
        }
    }
}

struct Applicable {
    index: usize,
    signature: SymbolId,
    widenings: u32,
    has_any_argument: bool,
}

pub fn resolve_call<C: CallArguments + ?Sized>(
    site: &mut C,
    signatures: &[SymbolId],
    type_arguments: Option<&[SymbolId]>,
) -> OverloadResolution {
    let argc = site.argument_count();
    let mut applicable: Vec<Applicable> = Vec::new();

    for (index, &sig) in signatures.iter().enumerate() {
        if !arity(&*site, sig).accepts(argc) {
            trace!(index, argc, "overload rejected by arity");
            continue;
        }
        let Some(specialized) = specialize_candidate(site, sig, argc, type_arguments) else {
            trace!(index, "overload rejected by type argument count");
            continue;
        };
        if let Some(found) = check_applicable(site, index, specialized, argc) {
            applicable.push(found);
        }
    }

    let Some(best) = applicable.iter().map(|a| a.widenings).min() else {
        let nearest = nearest_candidate(site, signatures, argc);
        debug!(candidates = signatures.len(), ?nearest, "no overload matches");
        let parameter_types = match nearest {
            Some(i) => {
                let erased = erase_signature(site, signatures[i]);
                expected_types(site, erased, argc)
            }
            None => Vec::new(),
        };
        return OverloadResolution {
            candidates: signatures.to_vec(),
            chosen: None,
            chosen_index: None,
            return_type: SymbolId::ERROR,
            parameter_types,
            error: Some(OverloadError::NoMatch { nearest }),
        };
    };

    let tied: Vec<&Applicable> = applicable.iter().filter(|a| a.widenings == best).collect();
    let winner = tied[0];
    let error = if site.options().report_ambiguous_overloads
        && tied.len() > 1
        && winner.has_any_argument
    {
        Some(OverloadError::Ambiguous {
            tied: tied.iter().map(|a| a.index).collect(),
        })
    } else {
        None
    };
    let (chosen, chosen_index) = (winner.signature, winner.index);
    trace!(chosen_index, widenings = best, "overload chosen");

    OverloadResolution {
        candidates: signatures.to_vec(),
        chosen: Some(chosen),
        chosen_index: Some(chosen_index),
        return_type: site.return_type_of(chosen),
        parameter_types: expected_types(site, chosen, argc),
        error,
    }
}

/// The candidate with explicit or inferred type arguments applied.
fn specialize_candidate<C: CallArguments + ?Sized>(
    site: &mut C,
    signature: SymbolId,
    argc: usize,
    type_arguments: Option<&[SymbolId]>,
) -> Option<SymbolId> {
    let type_params: SmallVec<[SymbolId; 4]> = site
        .graph()
        .get(signature)
        .map(|s| s.type_parameters.iter().copied().collect())
        .unwrap_or_default();
    match type_arguments {
        Some(args) if args.len() != type_params.len() => None,
        Some(args) if !args.is_empty() => Some(specialize_signature(site, signature, args)),
        _ if type_params.is_empty() => Some(signature),
        _ => Some(infer_type_arguments(site, signature, &type_params, argc)),
    }
}

/// Infer and apply type arguments. Later rounds re-derive argument types
/// with the parameter types of the previous round as context.
fn infer_type_arguments<C: CallArguments + ?Sized>(
    site: &mut C,
    signature: SymbolId,
    type_params: &[SymbolId],
    argc: usize,
) -> SymbolId {
    let mut context = InferenceContext::new(type_params);
    let mut fixed: SmallVec<[SymbolId; 4]> = SmallVec::new();
    for round in 0..limits::MAX_INFERENCE_ROUNDS {
        context.start_round();
        let contextual_sig = (round > 0).then(|| specialize_signature(site, signature, &fixed));
        for i in 0..argc {
            let declared = parameter_type_at(site, signature, i);
            let contextual = contextual_sig.map(|sig| parameter_type_at(site, sig, i));
            let argument = site.argument_type(i, contextual);
            context.infer(site, argument, declared);
        }
        fixed = context.fix(site);
    }
    trace!(signature = signature.0, ?fixed, "inferred type arguments");
    specialize_signature(site, signature, &fixed)
}

fn check_applicable<C: CallArguments + ?Sized>(
    site: &mut C,
    index: usize,
    signature: SymbolId,
    argc: usize,
) -> Option<Applicable> {
    let mut widenings = 0;
    let mut has_any_argument = false;
    for i in 0..argc {
        let expected = parameter_type_at(site, signature, i);
        let argument = site.argument_type(i, Some(expected));
        has_any_argument |= argument == SymbolId::ANY;
        if !is_assignable(site, argument, expected) {
            trace!(index, argument = i, "overload rejected by argument type");
            return None;
        }
        if !is_subtype(site, argument, expected) {
            widenings += 1;
        }
    }
    Some(Applicable {
        index,
        signature,
        widenings,
        has_any_argument,
    })
}

/// Candidate accepting the most arguments against its erased parameters.
fn nearest_candidate<C: CallArguments + ?Sized>(
    site: &mut C,
    signatures: &[SymbolId],
    argc: usize,
) -> Option<usize> {
    let mut best: Option<(usize, usize)> = None;
    for (index, &sig) in signatures.iter().enumerate() {
        let erased = erase_signature(site, sig);
        let mut accepted = 0;
        for i in 0..argc {
            let expected = parameter_type_at(site, erased, i);
            let argument = site.argument_type(i, Some(expected));
            if is_assignable(site, argument, expected) {
                accepted += 1;
            }
        }
        if best.is_none_or(|(_, most)| accepted > most) {
            best = Some((index, accepted));
        }
    }
    best.map(|(index, _)| index)
}

fn expected_types<C: CallArguments + ?Sized>(site: &mut C, signature: SymbolId, argc: usize) -> Vec<SymbolId> {
    (0..argc)
        .map(|i| parameter_type_at(site, signature, i))
        .collect()
}

#[cfg(test)]
#[path = "../tests/overload_tests.rs"]
mod tests;
