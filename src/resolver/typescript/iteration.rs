// Iteration idioms
//
// A callback or loop parameter with no type inherits the element set of the
// collection being iterated:
//
//   Object.values(Side).forEach((side) => ...)
//   for (const key of Object.keys(CONFIG)) ...
//   ROLES.map(role => ...)

use tree_sitter::Node;

use super::declarations::{Declaration, DeclarationKind, Namespace};
use super::helpers::{call_arguments, call_target, first_named_child, unwrap_expression};
use super::imports_exports::with_declaration;
use super::literals::{
    array_elements, declaration_keys, enum_member_values, extract_literal_values, object_keys,
    object_property_values,
};
use super::property_access::resolve_member_expression;
use crate::resolver::base::{LiteralValueSet, ResolutionContext, SourceUnit};

/// Array methods whose callback receives each element as its first argument
const ITERATION_METHODS: &[&str] = &[
    "forEach", "map", "filter", "some", "every", "flatMap", "find", "findIndex",
];

/// Values a parameter receives from the collection its function iterates over
pub fn parameter_iteration_values(
    unit: &SourceUnit,
    declaration: &Declaration<'_>,
    ctx: &mut ResolutionContext,
) -> LiteralValueSet {
    if declaration.kind != DeclarationKind::Parameter {
        return LiteralValueSet::new();
    }
    let Some(parent) = declaration.node.parent() else {
        return LiteralValueSet::new();
    };

    match parent.kind() {
        "for_in_statement" => loop_values(unit, &parent, ctx),
        "arrow_function" => callback_values(unit, &parent, ctx),
        "formal_parameters" => {
            if !is_first_parameter(&parent, &declaration.node) {
                return LiteralValueSet::new();
            }
            match parent.parent() {
                Some(function)
                    if matches!(function.kind(), "arrow_function" | "function_expression" | "function") =>
                {
                    callback_values(unit, &function, ctx)
                }
                _ => LiteralValueSet::new(),
            }
        }
        _ => LiteralValueSet::new(),
    }
}

fn is_first_parameter(parameters: &Node, parameter: &Node) -> bool {
    first_named_child(parameters).is_some_and(|first| first == *parameter)
}

/// `collection.forEach(fn)` where `fn` is the given function node
fn callback_values(unit: &SourceUnit, function: &Node, ctx: &mut ResolutionContext) -> LiteralValueSet {
    let Some(call) = function
        .parent()
        .filter(|arguments| arguments.kind() == "arguments")
        .and_then(|arguments| arguments.parent())
    else {
        return LiteralValueSet::new();
    };
    if call_arguments(&call).first() != Some(function) {
        return LiteralValueSet::new();
    }

    let Some(callee) = call
        .child_by_field_name("function")
        .filter(|callee| callee.kind() == "member_expression")
    else {
        return LiteralValueSet::new();
    };
    let is_iteration = unit
        .get_field_text(&callee, "property")
        .is_some_and(|method| ITERATION_METHODS.contains(&method));
    if !is_iteration {
        return LiteralValueSet::new();
    }

    match callee.child_by_field_name("object") {
        Some(collection) => collection_values(unit, &collection, ctx),
        None => LiteralValueSet::new(),
    }
}

/// `for (const x of collection)` / `for (const k in object)`
fn loop_values(unit: &SourceUnit, statement: &Node, ctx: &mut ResolutionContext) -> LiteralValueSet {
    let Some(right) = statement.child_by_field_name("right") else {
        return LiteralValueSet::new();
    };
    let operator = statement
        .child_by_field_name("operator")
        .map(|operator| unit.node_text(&operator))
        .or_else(|| {
            let mut cursor = statement.walk();
            let keyword = statement
                .children(&mut cursor)
                .map(|child| child.kind())
                .find(|kind| matches!(*kind, "of" | "in"));
            keyword
        });

    match operator {
        Some("of") => collection_values(unit, &right, ctx),
        Some("in") => key_values(unit, &right, ctx),
        _ => LiteralValueSet::new(),
    }
}

/// Element values of an iterable expression
pub fn collection_values(
    unit: &SourceUnit,
    collection: &Node,
    ctx: &mut ResolutionContext,
) -> LiteralValueSet {
    let node = unwrap_expression(unit, *collection);
    match node.kind() {
        "call_expression" => {
            let argument = call_arguments(&node).into_iter().next();
            match (call_target(unit, &node), argument) {
                (Some("Object.values"), Some(argument)) => object_values(unit, &argument, ctx),
                (Some("Object.keys"), Some(argument)) => key_values(unit, &argument, ctx),
                _ => LiteralValueSet::new(),
            }
        }
        "array" => array_elements(unit, &node, ctx),
        "identifier" => {
            let name = unit.node_text(&node);
            with_declaration(unit, name, Namespace::Value, ctx, |u, decl, c| {
                extract_literal_values(u, decl, c)
            })
            .unwrap_or_default()
        }
        "member_expression" => resolve_member_expression(unit, &node, ctx),
        _ => LiteralValueSet::new(),
    }
}

/// `Object.values(E)`: enum member values or object property values
fn object_values(unit: &SourceUnit, source: &Node, ctx: &mut ResolutionContext) -> LiteralValueSet {
    let node = unwrap_expression(unit, *source);
    match node.kind() {
        "object" => object_property_values(unit, &node, ctx),
        "identifier" => {
            let name = unit.node_text(&node);
            with_declaration(unit, name, Namespace::Value, ctx, |u, decl, c| match decl.kind {
                DeclarationKind::Enum => enum_member_values(u, &decl.node),
                DeclarationKind::Variable => match decl.initializer().map(|v| unwrap_expression(u, v)) {
                    Some(object) if object.kind() == "object" => object_property_values(u, &object, c),
                    _ => LiteralValueSet::new(),
                },
                _ => LiteralValueSet::new(),
            })
            .unwrap_or_default()
        }
        _ => LiteralValueSet::new(),
    }
}

/// Key set of an object or enum expression (`Object.keys(E)`, `for...in`)
pub fn key_values(unit: &SourceUnit, source: &Node, ctx: &mut ResolutionContext) -> LiteralValueSet {
    let node = unwrap_expression(unit, *source);
    match node.kind() {
        "object" => object_keys(unit, &node),
        "identifier" => {
            let name = unit.node_text(&node);
            with_declaration(unit, name, Namespace::Value, ctx, |u, decl, c| {
                declaration_keys(u, &decl, c)
            })
            .unwrap_or_default()
        }
        _ => LiteralValueSet::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::base::{Position, ResolverConfig};
    use crate::resolver::module_path::ModuleResolver;
    use std::sync::Arc;

    fn values_at(content: &str, line: usize, column: usize) -> Vec<String> {
        let unit = SourceUnit::parse("mem/iteration.ts", content).unwrap();
        let node = unit.node_at(Position::new(line, column)).unwrap();
        let declaration = Declaration::enclosing(node).unwrap();
        let mut ctx = ResolutionContext::new(
            Arc::new(ResolverConfig::default()),
            Arc::new(ModuleResolver::relative_only()),
        );
        extract_literal_values(&unit, declaration, &mut ctx).to_vec()
    }

    const PRELUDE: &str = r#"enum Side { Buy = "BUY", Sell = "SELL" }
const LEVELS = { low: "L", high: "H" } as const;
const ROLES = ["admin", "user"];
"#;

    #[test]
    fn test_object_values_for_each() {
        let content = format!("{}Object.values(Side).forEach((side) => log(side));\n", PRELUDE);
        assert_eq!(values_at(&content, 3, 30), vec!["BUY", "SELL"]);

        let content = format!("{}Object.values(LEVELS).map(level => level);\n", PRELUDE);
        assert_eq!(values_at(&content, 3, 27), vec!["L", "H"]);
    }

    #[test]
    fn test_object_keys_and_arrays() {
        let content = format!("{}Object.keys(LEVELS).filter(function (k) {{ return k; }});\n", PRELUDE);
        assert_eq!(values_at(&content, 3, 37), vec!["low", "high"]);

        let content = format!("{}ROLES.forEach(role => role);\n", PRELUDE);
        assert_eq!(values_at(&content, 3, 14), vec!["admin", "user"]);

        let content = format!("{}['a', 'b'].some((x, i) => i);\n", PRELUDE);
        assert_eq!(values_at(&content, 3, 17), vec!["a", "b"]);
        // Only the first callback parameter receives elements
        assert!(values_at(&content, 3, 20).is_empty());
    }

    #[test]
    fn test_for_of_and_for_in() {
        let content = format!("{}for (const s of Object.values(Side)) {{}}\n", PRELUDE);
        assert_eq!(values_at(&content, 3, 11), vec!["BUY", "SELL"]);

        let content = format!("{}for (const r of ROLES) {{}}\n", PRELUDE);
        assert_eq!(values_at(&content, 3, 11), vec!["admin", "user"]);

        let content = format!("{}for (const k in Side) {{}}\n", PRELUDE);
        assert_eq!(values_at(&content, 3, 11), vec!["Buy", "Sell"]);
    }

    #[test]
    fn test_non_iteration_callbacks_are_empty() {
        let content = format!("{}setTimeout((x) => x, 10);\n", PRELUDE);
        assert!(values_at(&content, 3, 12).is_empty());
    }
}
