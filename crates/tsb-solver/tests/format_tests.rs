use super::*;
use crate::fixture::*;
use crate::instantiate::specialize;

#[test]
fn intrinsics_and_arrays() {
    let mut fx = Fixture::new();
    let numbers = fx.array(NUMBER);
    let nested = fx.array(numbers);
    let callback = fx.call(&[], VOID);
    let callback_type = fx.function_type(&[callback]);
    let callbacks = fx.array(callback_type);
    let graph = &fx.resolver.graph;

    assert_eq!(type_to_string(graph, NUMBER), "number");
    assert_eq!(type_to_string(graph, SymbolId::UNDEFINED), "undefined");
    assert_eq!(type_to_string(graph, numbers), "number[]");
    assert_eq!(type_to_string(graph, nested), "number[][]");
    assert_eq!(type_to_string(graph, callbacks), "(() => void)[]");
}

#[test]
fn generic_roots_and_specializations() {
    let mut fx = Fixture::new();
    let bx = fx.interface("Box");
    fx.generic(bx, &["T"]);
    let spec = specialize(&mut fx.resolver, bx, &[NUMBER]);
    let graph = &fx.resolver.graph;

    assert_eq!(type_to_string(graph, bx), "Box<T>");
    assert_eq!(type_to_string(graph, spec), "Box<number>");
}

#[test]
fn object_types_list_members() {
    let mut fx = Fixture::new();
    let point = fx.object();
    fx.prop(point, "x", NUMBER);
    fx.optional_prop(point, "y", STRING);
    let greet = fx.call(&[p("name", STRING)], STRING);
    fx.method(point, "greet", &[greet]);
    let empty = fx.object();
    let index = fx.signature(SignatureKind::Index, &[p("key", STRING)], NUMBER);
    let dictionary = fx.object();
    fx.add_signature(dictionary, index);
    let graph = &fx.resolver.graph;

    assert_eq!(
        type_to_string(graph, point),
        "{ x: number; y?: string; greet(name: string): string; }"
    );
    assert_eq!(type_to_string(graph, empty), "{}");
    assert_eq!(type_to_string(graph, dictionary), "{ [key: string]: number; }");
}

#[test]
fn signatures_print_as_arrows() {
    let mut fx = Fixture::new();
    let numbers = fx.array(NUMBER);
    let sig = fx.call(&[p("a", NUMBER), opt("b", STRING), rest("c", numbers)], BOOLEAN);
    let fn_type = fx.function_type(&[sig]);
    let t = fx.type_param("T");
    let identity = fx.call(&[p("x", t)], t);
    if let Some(s) = fx.resolver.graph.get_mut(identity) {
        s.type_parameters.push(t);
    }
    let graph = &fx.resolver.graph;

    assert_eq!(
        type_to_string(graph, fn_type),
        "(a: number, b?: string, ...c: number[]) => boolean"
    );
    assert_eq!(signature_to_string(graph, identity), "<T>(x: T) => T");
}

#[test]
fn overloaded_value_types_name_their_owner() {
    let mut fx = Fixture::new();
    let first = fx.call(&[p("x", NUMBER)], NUMBER);
    let second = fx.call(&[p("x", STRING)], STRING);
    let value_type = fx.function_type(&[first, second]);
    let f = fx.resolver.graph.alloc(SymbolKind::Function, "parse");
    if let Some(s) = fx.resolver.graph.get_mut(value_type) {
        s.owner = Some(f);
    }
    assert_eq!(type_to_string(&fx.resolver.graph, value_type), "typeof parse");
}
