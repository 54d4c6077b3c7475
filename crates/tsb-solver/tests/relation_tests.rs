use super::*;
use crate::fixture::*;

fn explain(fx: &mut Fixture, source: SymbolId, target: SymbolId) -> Option<ComparisonFailure> {
    let mut info = ComparisonInfo::new();
    let related = is_related_with(&mut fx.resolver, source, target, RelationKind::Assignable, Some(&mut info));
    assert!(!related, "expected a failed relation");
    info.take_failure()
}

#[test]
fn every_relation_is_reflexive() {
    let mut fx = Fixture::new();
    let point = fx.interface("Point");
    fx.prop(point, "x", NUMBER);
    for ty in [NUMBER, STRING, VOID, ANY, point] {
        assert!(is_identical(&mut fx.resolver, ty, ty));
        assert!(is_subtype(&mut fx.resolver, ty, ty));
        assert!(is_assignable(&mut fx.resolver, ty, ty));
    }
}

#[test]
fn structurally_equal_interfaces_relate_both_ways() {
    let mut fx = Fixture::new();
    let a = fx.interface("A");
    fx.prop(a, "x", NUMBER);
    let b = fx.interface("B");
    fx.prop(b, "x", NUMBER);

    assert!(is_identical(&mut fx.resolver, a, b));
    assert!(is_subtype(&mut fx.resolver, a, b));
    assert!(is_subtype(&mut fx.resolver, b, a));
}

#[test]
fn optional_member_cannot_satisfy_required_one() {
    let mut fx = Fixture::new();
    let a = fx.interface("A");
    fx.prop(a, "x", NUMBER);
    fx.optional_prop(a, "y", STRING);
    let b = fx.interface("B");
    fx.prop(b, "x", NUMBER);
    fx.prop(b, "y", STRING);

    assert!(is_assignable(&mut fx.resolver, b, a));
    assert!(!is_assignable(&mut fx.resolver, a, b));
    assert!(!is_identical(&mut fx.resolver, a, b));
    assert_eq!(
        explain(&mut fx, a, b),
        Some(ComparisonFailure::OptionalMemberRequired {
            name: "y".to_string()
        })
    );
}

#[test]
fn any_is_assignable_but_not_a_subtype() {
    let mut fx = Fixture::new();
    assert!(is_assignable(&mut fx.resolver, ANY, NUMBER));
    assert!(!is_subtype(&mut fx.resolver, ANY, NUMBER));
    assert!(is_subtype(&mut fx.resolver, NUMBER, ANY));
    assert!(!is_identical(&mut fx.resolver, NUMBER, ANY));
}

#[test]
fn null_and_undefined_relate_to_everything_but_void_does_not() {
    let mut fx = Fixture::new();
    let point = fx.interface("Point");
    fx.prop(point, "x", NUMBER);
    assert!(is_subtype(&mut fx.resolver, NULL, NUMBER));
    assert!(is_assignable(&mut fx.resolver, SymbolId::UNDEFINED, point));
    assert!(!is_assignable(&mut fx.resolver, NUMBER, VOID));
    assert!(!is_assignable(&mut fx.resolver, VOID, NUMBER));
}

#[test]
fn error_type_relates_both_ways() {
    let mut fx = Fixture::new();
    let point = fx.interface("Point");
    fx.prop(point, "x", NUMBER);
    assert!(is_subtype(&mut fx.resolver, ERROR, point));
    assert!(is_identical(&mut fx.resolver, point, ERROR));
}

#[test]
fn enums_and_numbers() {
    let mut fx = Fixture::new();
    let color = fx.enum_type("Color");
    assert!(is_subtype(&mut fx.resolver, color, NUMBER));
    assert!(is_assignable(&mut fx.resolver, NUMBER, color));
    assert!(!is_subtype(&mut fx.resolver, NUMBER, color));
    assert!(!is_assignable(&mut fx.resolver, STRING, color));
}

#[test]
fn recursive_types_compare_coinductively() {
    let mut fx = Fixture::new();
    let node = fx.interface("Node");
    fx.prop(node, "next", node);
    fx.prop(node, "value", NUMBER);
    let link = fx.interface("Link");
    fx.prop(link, "next", link);
    fx.prop(link, "value", NUMBER);
    let bad = fx.interface("Bad");
    fx.prop(bad, "next", bad);
    fx.prop(bad, "value", STRING);

    assert!(is_assignable(&mut fx.resolver, node, link));
    assert!(is_identical(&mut fx.resolver, link, node));
    assert!(!is_assignable(&mut fx.resolver, node, bad));
}

#[test]
fn subtyping_is_transitive_through_width() {
    let mut fx = Fixture::new();
    let a = fx.interface("A");
    fx.prop(a, "x", NUMBER);
    let b = fx.interface("B");
    fx.prop(b, "x", NUMBER);
    fx.prop(b, "y", NUMBER);
    let c = fx.interface("C");
    fx.prop(c, "x", NUMBER);
    fx.prop(c, "y", NUMBER);
    fx.prop(c, "z", NUMBER);

    assert!(is_subtype(&mut fx.resolver, c, b));
    assert!(is_subtype(&mut fx.resolver, b, a));
    assert!(is_subtype(&mut fx.resolver, c, a));
    assert!(!is_subtype(&mut fx.resolver, a, c));
}

#[test]
fn inherited_members_count() {
    let mut fx = Fixture::new();
    let base = fx.class("Base");
    fx.prop(base, "id", NUMBER);
    let derived = fx.class("Derived");
    fx.prop(derived, "name", STRING);
    fx.extends(derived, base);
    let target = fx.interface("HasId");
    fx.prop(target, "id", NUMBER);

    assert!(is_subtype(&mut fx.resolver, derived, target));
}

#[test]
fn type_parameters_relate_through_constraints() {
    let mut fx = Fixture::new();
    let shape = fx.interface("Shape");
    fx.prop(shape, "x", NUMBER);
    let t = fx.constrained("T", shape);
    let u = fx.type_param("U");
    let empty = fx.object();

    assert!(is_assignable(&mut fx.resolver, t, shape));
    assert!(is_assignable(&mut fx.resolver, u, empty));
    assert!(!is_assignable(&mut fx.resolver, u, NUMBER));
    assert!(!is_assignable(&mut fx.resolver, shape, t));
}

#[test]
fn arrays_are_covariant() {
    let mut fx = Fixture::new();
    let numbers = fx.array(NUMBER);
    let strings = fx.array(STRING);
    let anys = fx.array(ANY);

    assert!(is_subtype(&mut fx.resolver, numbers, anys));
    assert!(!is_assignable(&mut fx.resolver, strings, numbers));
    assert!(matches!(
        explain(&mut fx, strings, numbers),
        Some(ComparisonFailure::ElementTypeMismatch {
            source_type: STRING,
            target_type: NUMBER,
            ..
        })
    ));
}

#[test]
fn function_types_compare_by_signature() {
    let mut fx = Fixture::new();
    let to_string = fx.call(&[p("x", NUMBER)], STRING);
    let to_void = fx.call(&[p("x", NUMBER)], VOID);
    let no_params = fx.call(&[], STRING);
    let two_params = fx.call(&[p("a", NUMBER), p("b", NUMBER)], VOID);
    let f_string = fx.function_type(&[to_string]);
    let f_void = fx.function_type(&[to_void]);
    let f_none = fx.function_type(&[no_params]);
    let f_two = fx.function_type(&[two_params]);

    // A void-returning target accepts any return type.
    assert!(is_assignable(&mut fx.resolver, f_string, f_void));
    assert!(!is_assignable(&mut fx.resolver, f_void, f_string));
    // Fewer parameters are fine, more required ones are not.
    assert!(is_assignable(&mut fx.resolver, f_none, f_string));
    assert!(!is_assignable(&mut fx.resolver, f_two, f_void));

    let failure = explain(&mut fx, f_two, f_void);
    assert!(matches!(
        failure.as_ref().map(ComparisonFailure::innermost),
        Some(ComparisonFailure::ParameterCount {
            source_required: 2,
            target_count: 1
        })
    ));
}

#[test]
fn explain_names_missing_and_nested_members() {
    let mut fx = Fixture::new();
    let small = fx.interface("Small");
    fx.prop(small, "x", NUMBER);
    let big = fx.interface("Big");
    fx.prop(big, "x", NUMBER);
    fx.prop(big, "y", NUMBER);

    assert_eq!(
        explain(&mut fx, small, big),
        Some(ComparisonFailure::MissingMember {
            name: "y".to_string(),
            source: small,
            target: big,
        })
    );

    let inner_src = fx.object();
    fx.prop(inner_src, "q", STRING);
    let inner_tgt = fx.object();
    fx.prop(inner_tgt, "q", NUMBER);
    let outer_src = fx.object();
    fx.prop(outer_src, "p", inner_src);
    let outer_tgt = fx.object();
    fx.prop(outer_tgt, "p", inner_tgt);

    // Warm the cache; explaining must still report the reason.
    assert!(!is_assignable(&mut fx.resolver, outer_src, outer_tgt));
    let failure = explain(&mut fx, outer_src, outer_tgt).expect("failure recorded");
    assert_eq!(failure.member_name(), Some("p"));
    assert_eq!(
        failure.innermost(),
        &ComparisonFailure::TypeMismatch {
            source: STRING,
            target: NUMBER
        }
    );
}

#[test]
fn index_signatures_accept_object_literals_only() {
    let mut fx = Fixture::new();
    let index = fx.signature(SignatureKind::Index, &[p("key", STRING)], NUMBER);
    let dictionary = fx.object();
    fx.add_signature(dictionary, index);

    let literal = fx.object_literal();
    fx.prop(literal, "a", NUMBER);
    let named = fx.interface("Named");
    fx.prop(named, "a", NUMBER);
    let wrong = fx.object_literal();
    fx.prop(wrong, "a", STRING);

    assert!(is_assignable(&mut fx.resolver, literal, dictionary));
    assert!(!is_assignable(&mut fx.resolver, wrong, dictionary));
    assert_eq!(
        explain(&mut fx, named, dictionary),
        Some(ComparisonFailure::MissingIndexSignature { target: dictionary })
    );
}

#[test]
fn results_are_cached_until_cleared() {
    let mut fx = Fixture::new();
    let a = fx.interface("A");
    fx.prop(a, "x", NUMBER);
    let b = fx.interface("B");
    fx.prop(b, "x", NUMBER);

    assert!(is_assignable(&mut fx.resolver, a, b));
    let cache = fx.resolver.relation_cache();
    assert_eq!(cache.lookup(a, b, RelationKind::Assignable), Some(true));
    assert_eq!(cache.lookup(a, b, RelationKind::Subtype), None);
    cache.clear();
    assert!(cache.is_empty());
}

#[test]
fn failed_outer_comparison_does_not_cache_assumed_pairs() {
    // A = { c: C, x: number }, C = { a: A }
    // B = { c: D, x: string }, D = { a: B }
    let mut fx = Fixture::new();
    let a = fx.interface("A");
    let b = fx.interface("B");
    let c = fx.interface("C");
    let d = fx.interface("D");
    fx.prop(a, "c", c);
    fx.prop(a, "x", NUMBER);
    fx.prop(c, "a", a);
    fx.prop(b, "c", d);
    fx.prop(b, "x", STRING);
    fx.prop(d, "a", b);

    assert!(!is_assignable(&mut fx.resolver, a, b));
    let cache = fx.resolver.relation_cache();
    assert_eq!(cache.lookup(a, b, RelationKind::Assignable), Some(false));
    assert_eq!(cache.lookup(c, d, RelationKind::Assignable), None);
    assert!(!is_assignable(&mut fx.resolver, c, d));

    let mut fresh = Fixture::new();
    let (a, b, c, d) = (
        fresh.interface("A"),
        fresh.interface("B"),
        fresh.interface("C"),
        fresh.interface("D"),
    );
    fresh.prop(a, "c", c);
    fresh.prop(a, "x", NUMBER);
    fresh.prop(c, "a", a);
    fresh.prop(b, "c", d);
    fresh.prop(b, "x", STRING);
    fresh.prop(d, "a", b);
    assert!(!is_assignable(&mut fresh.resolver, c, d));
}

#[test]
fn assumed_pairs_are_cached_once_the_cycle_succeeds() {
    let mut fx = Fixture::new();
    let a = fx.interface("A");
    let b = fx.interface("B");
    let c = fx.interface("C");
    let d = fx.interface("D");
    fx.prop(a, "c", c);
    fx.prop(a, "x", NUMBER);
    fx.prop(c, "a", a);
    fx.prop(b, "c", d);
    fx.prop(b, "x", NUMBER);
    fx.prop(d, "a", b);

    assert!(is_assignable(&mut fx.resolver, a, b));
    let cache = fx.resolver.relation_cache();
    assert_eq!(cache.lookup(a, b, RelationKind::Assignable), Some(true));
    assert_eq!(cache.lookup(c, d, RelationKind::Assignable), Some(true));
}

#[test]
fn purge_drops_only_results_touching_stale_symbols() {
    let mut fx = Fixture::new();
    let a = fx.interface("A");
    fx.prop(a, "x", NUMBER);
    let b = fx.interface("B");
    fx.prop(b, "x", NUMBER);
    let c = fx.interface("C");
    fx.prop(c, "y", STRING);
    let d = fx.interface("D");
    fx.prop(d, "y", STRING);

    assert!(is_assignable(&mut fx.resolver, a, b));
    assert!(is_assignable(&mut fx.resolver, c, d));
    let cache = fx.resolver.relation_cache();
    cache.purge(|s| s == a);
    assert_eq!(cache.lookup(a, b, RelationKind::Assignable), None);
    assert_eq!(cache.lookup(c, d, RelationKind::Assignable), Some(true));
}
