// Literal Value Extractor
//
// Turns a declaration into the finite set of string literals it can hold.
// Every rule fails closed: shapes we do not understand produce an empty set.

use regex::Regex;
use std::sync::LazyLock;
use tree_sitter::Node;

use super::declarations::{Declaration, DeclarationKind, Namespace};
use super::helpers::{
    first_named_child, last_named_child, property_key_text, string_literal_value, unwrap_expression,
};
use super::imports_exports::with_declaration;
use super::iteration::parameter_iteration_values;
use super::property_access::resolve_member_expression;
use crate::resolver::base::{DeclarationKey, LiteralValueSet, ResolutionContext, SourceUnit};

/// `(typeof X)[keyof typeof X]`, parentheses optional
static VALUES_OF_OBJECT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\(?\s*typeof\s+([A-Za-z_$][\w$]*)\s*\)?\s*\[\s*keyof\s+typeof\s+([A-Za-z_$][\w$]*)\s*\]$",
    )
    .expect("values-of-object pattern is valid")
});

/// `keyof typeof X`
static KEYS_OF_OBJECT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^keyof\s+typeof\s+([A-Za-z_$][\w$]*)$").expect("keyof pattern is valid")
});

/// `(typeof X)[number]`
static ELEMENTS_OF_ARRAY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\(\s*typeof\s+([A-Za-z_$][\w$]*)\s*\)\s*\[\s*number\s*\]$")
        .expect("element pattern is valid")
});

/// Literal values of a declaration
///
/// The declaration is entered into `ctx` for the duration of the extraction;
/// meeting it again while it is in progress yields an empty set. Results not
/// cut short by a cycle or the depth limit are memoized in `ctx`.
pub fn extract_literal_values(
    unit: &SourceUnit,
    declaration: Declaration<'_>,
    ctx: &mut ResolutionContext,
) -> LiteralValueSet {
    let key = DeclarationKey::new(unit.path(), &declaration.node);
    if let Some(values) = ctx.finished(&key) {
        return values.clone();
    }
    if !ctx.enter(key.clone()) {
        return LiteralValueSet::new();
    }
    let refusals = ctx.refusals();

    let values = match declaration.kind {
        DeclarationKind::Enum => enum_member_values(unit, &declaration.node),
        DeclarationKind::Variable => variable_values(unit, &declaration, ctx),
        DeclarationKind::TypeAlias => declaration
            .node
            .child_by_field_name("value")
            .map(|value| type_values(unit, &value, ctx))
            .unwrap_or_default(),
        DeclarationKind::Interface => LiteralValueSet::new(),
        DeclarationKind::Parameter => parameter_values(unit, &declaration, ctx),
        DeclarationKind::Property => property_values(unit, &declaration, ctx),
    };

    ctx.leave(&key);
    if ctx.refusals() == refusals {
        ctx.finish(key, values.clone());
    }
    values
}

/// Each member's string initializer, else its name, in declaration order
pub fn enum_member_values(unit: &SourceUnit, enum_declaration: &Node) -> LiteralValueSet {
    enum_members(unit, enum_declaration)
        .into_iter()
        .map(|(name, value)| value.unwrap_or(name))
        .collect()
}

/// Member names of an enum (`keyof typeof E`, `Object.keys(E)`)
pub fn enum_member_names(unit: &SourceUnit, enum_declaration: &Node) -> LiteralValueSet {
    enum_members(unit, enum_declaration)
        .into_iter()
        .map(|(name, _)| name)
        .collect()
}

/// Value of one enum member, by name
pub fn enum_member_value(unit: &SourceUnit, enum_declaration: &Node, member: &str) -> LiteralValueSet {
    enum_members(unit, enum_declaration)
        .into_iter()
        .find(|(name, _)| name == member)
        .map(|(name, value)| LiteralValueSet::singleton(value.unwrap_or(name)))
        .unwrap_or_default()
}

/// (name, string initializer) pairs of an enum body
fn enum_members(unit: &SourceUnit, enum_declaration: &Node) -> Vec<(String, Option<String>)> {
    let Some(body) = enum_declaration.child_by_field_name("body") else {
        return Vec::new();
    };
    let mut cursor = body.walk();
    body.named_children(&mut cursor)
        .filter_map(|member| match member.kind() {
            "enum_assignment" => {
                let name = property_key_text(unit, &member.child_by_field_name("name")?)?;
                let value = member
                    .child_by_field_name("value")
                    .and_then(|value| string_literal_value(unit, &value));
                Some((name, value))
            }
            "property_identifier" | "string" => Some((property_key_text(unit, &member)?, None)),
            _ => None,
        })
        .collect()
}

fn variable_values(
    unit: &SourceUnit,
    declaration: &Declaration<'_>,
    ctx: &mut ResolutionContext,
) -> LiteralValueSet {
    if let Some(annotation) = declaration.type_annotation() {
        let declared = type_values(unit, &annotation, ctx);
        if !declared.is_empty() {
            return declared;
        }
    }
    declaration
        .initializer()
        .map(|value| expression_values(unit, &value, ctx))
        .unwrap_or_default()
}

/// Literal values of an expression (initializers and property values)
pub fn expression_values(
    unit: &SourceUnit,
    expression: &Node,
    ctx: &mut ResolutionContext,
) -> LiteralValueSet {
    let node = unwrap_expression(unit, *expression);
    match node.kind() {
        "string" | "template_string" => string_literal_value(unit, &node)
            .map(LiteralValueSet::singleton)
            .unwrap_or_default(),
        "object" => object_keys(unit, &node),
        "array" => array_elements(unit, &node, ctx),
        "as_expression" => assertion_values(unit, &node, ctx),
        "identifier" => {
            let name = unit.node_text(&node);
            with_declaration(unit, name, Namespace::Value, ctx, |u, decl, c| {
                extract_literal_values(u, decl, c)
            })
            .unwrap_or_default()
        }
        "member_expression" => resolve_member_expression(unit, &node, ctx),
        "ternary_expression" => {
            let mut values = LiteralValueSet::new();
            for field in ["consequence", "alternative"] {
                if let Some(branch) = node.child_by_field_name(field) {
                    values.extend(expression_values(unit, &branch, ctx));
                }
            }
            values
        }
        _ => LiteralValueSet::new(),
    }
}

/// `expr as T`: the asserted type wins; the expression's own literal is the fallback
pub fn assertion_values(
    unit: &SourceUnit,
    assertion: &Node,
    ctx: &mut ResolutionContext,
) -> LiteralValueSet {
    if let Some(asserted_type) = last_named_child(assertion) {
        let from_type = type_values(unit, &asserted_type, ctx);
        if !from_type.is_empty() {
            return from_type;
        }
    }
    first_named_child(assertion)
        .map(|inner| unwrap_expression(unit, inner))
        .and_then(|inner| string_literal_value(unit, &inner))
        .map(LiteralValueSet::singleton)
        .unwrap_or_default()
}

/// Literal values described by a type expression
pub fn type_values(unit: &SourceUnit, type_node: &Node, ctx: &mut ResolutionContext) -> LiteralValueSet {
    match type_node.kind() {
        "type_annotation" | "parenthesized_type" | "readonly_type" => first_named_child(type_node)
            .map(|inner| type_values(unit, &inner, ctx))
            .unwrap_or_default(),
        "union_type" => {
            let mut values = LiteralValueSet::new();
            let mut cursor = type_node.walk();
            let members: Vec<Node> = type_node.named_children(&mut cursor).collect();
            for member in members {
                values.extend(type_values(unit, &member, ctx));
            }
            values
        }
        "literal_type" => first_named_child(type_node)
            .and_then(|literal| string_literal_value(unit, &literal))
            .map(LiteralValueSet::singleton)
            .unwrap_or_default(),
        "string" => string_literal_value(unit, type_node)
            .map(LiteralValueSet::singleton)
            .unwrap_or_default(),
        "template_literal_type" => {
            let has_substitution = unit
                .find_child_by_type(type_node, "template_type")
                .is_some();
            if has_substitution {
                LiteralValueSet::new()
            } else {
                super::helpers::unquote(unit.node_text(type_node))
                    .map(LiteralValueSet::singleton)
                    .unwrap_or_default()
            }
        }
        "type_identifier" => named_type_values(unit, unit.node_text(type_node), ctx),
        "nested_type_identifier" => type_node
            .child_by_field_name("name")
            .map(|name| named_type_values(unit, unit.node_text(&name), ctx))
            .unwrap_or_default(),
        "generic_type" => generic_type_values(unit, type_node, ctx),
        "array_type" => first_named_child(type_node)
            .map(|element| type_values(unit, &element, ctx))
            .unwrap_or_default(),
        _ => typeof_idiom_values(unit, type_node, ctx),
    }
}

fn named_type_values(unit: &SourceUnit, name: &str, ctx: &mut ResolutionContext) -> LiteralValueSet {
    with_declaration(unit, name, Namespace::Type, ctx, |u, decl, c| {
        extract_literal_values(u, decl, c)
    })
    .unwrap_or_default()
}

/// `Foo<T>` resolves as `Foo`; `Array<T>` / `ReadonlyArray<T>` as `T`
fn generic_type_values(
    unit: &SourceUnit,
    generic: &Node,
    ctx: &mut ResolutionContext,
) -> LiteralValueSet {
    let Some(name) = generic.child_by_field_name("name") else {
        return LiteralValueSet::new();
    };
    if matches!(unit.node_text(&name), "Array" | "ReadonlyArray") {
        return generic
            .child_by_field_name("type_arguments")
            .and_then(|arguments| first_named_child(&arguments))
            .map(|element| type_values(unit, &element, ctx))
            .unwrap_or_default();
    }
    type_values(unit, &name, ctx)
}

/// `(typeof X)[keyof typeof X]`, `keyof typeof X` and `(typeof X)[number]`
fn typeof_idiom_values(
    unit: &SourceUnit,
    type_node: &Node,
    ctx: &mut ResolutionContext,
) -> LiteralValueSet {
    let text = unit.node_text(type_node).trim();

    if let Some(captures) = VALUES_OF_OBJECT.captures(text) {
        if captures[1] != captures[2] {
            return LiteralValueSet::new();
        }
        return with_declaration(unit, &captures[1], Namespace::Value, ctx, |u, decl, c| {
            match decl.kind {
                DeclarationKind::Enum => enum_member_values(u, &decl.node),
                _ => declaration_keys(u, &decl, c),
            }
        })
        .unwrap_or_default();
    }

    if let Some(captures) = KEYS_OF_OBJECT.captures(text) {
        return with_declaration(unit, &captures[1], Namespace::Value, ctx, |u, decl, c| {
            declaration_keys(u, &decl, c)
        })
        .unwrap_or_default();
    }

    if let Some(captures) = ELEMENTS_OF_ARRAY.captures(text) {
        return with_declaration(unit, &captures[1], Namespace::Value, ctx, |u, decl, c| {
            match decl.initializer().map(|value| unwrap_expression(u, value)) {
                Some(array) if array.kind() == "array" => array_elements(u, &array, c),
                _ => LiteralValueSet::new(),
            }
        })
        .unwrap_or_default();
    }

    LiteralValueSet::new()
}

/// Key set of an enum or of a variable initialized with an object literal
pub fn declaration_keys(
    unit: &SourceUnit,
    declaration: &Declaration<'_>,
    ctx: &mut ResolutionContext,
) -> LiteralValueSet {
    match declaration.kind {
        DeclarationKind::Enum => enum_member_names(unit, &declaration.node),
        DeclarationKind::Variable => {
            let key = DeclarationKey::new(unit.path(), &declaration.node);
            if !ctx.enter(key.clone()) {
                return LiteralValueSet::new();
            }
            let keys = match declaration.initializer().map(|value| unwrap_expression(unit, value)) {
                Some(object) if object.kind() == "object" => object_keys(unit, &object),
                Some(identifier) if identifier.kind() == "identifier" => {
                    with_declaration(unit, unit.node_text(&identifier), Namespace::Value, ctx, |u, decl, c| {
                        declaration_keys(u, &decl, c)
                    })
                    .unwrap_or_default()
                }
                _ => LiteralValueSet::new(),
            };
            ctx.leave(&key);
            keys
        }
        _ => LiteralValueSet::new(),
    }
}

/// The object's own property names, unquoted
pub fn object_keys(unit: &SourceUnit, object: &Node) -> LiteralValueSet {
    let mut keys = LiteralValueSet::new();
    let mut cursor = object.walk();
    for member in object.named_children(&mut cursor) {
        let key = match member.kind() {
            "pair" => member
                .child_by_field_name("key")
                .and_then(|key| property_key_text(unit, &key)),
            "shorthand_property_identifier" => property_key_text(unit, &member),
            "method_definition" => member
                .child_by_field_name("name")
                .and_then(|name| property_key_text(unit, &name)),
            _ => None,
        };
        if let Some(key) = key {
            keys.insert(key);
        }
    }
    keys
}

/// String values of an object's properties (`Object.values(obj)`)
pub fn object_property_values(
    unit: &SourceUnit,
    object: &Node,
    ctx: &mut ResolutionContext,
) -> LiteralValueSet {
    let mut values = LiteralValueSet::new();
    let mut cursor = object.walk();
    let members: Vec<Node> = object.named_children(&mut cursor).collect();
    for member in members {
        match member.kind() {
            "pair" => {
                if let Some(value) = member.child_by_field_name("value") {
                    values.extend(expression_values(unit, &value, ctx));
                }
            }
            "shorthand_property_identifier" => {
                let name = unit.node_text(&member);
                values.extend(
                    with_declaration(unit, name, Namespace::Value, ctx, |u, decl, c| {
                        extract_literal_values(u, decl, c)
                    })
                    .unwrap_or_default(),
                );
            }
            _ => {}
        }
    }
    values
}

/// Elements of an array literal, each resolved as an expression
pub fn array_elements(unit: &SourceUnit, array: &Node, ctx: &mut ResolutionContext) -> LiteralValueSet {
    let mut values = LiteralValueSet::new();
    let mut cursor = array.walk();
    let elements: Vec<Node> = array
        .named_children(&mut cursor)
        .filter(|element| element.kind() != "comment")
        .collect();
    for element in elements {
        values.extend(expression_values(unit, &element, ctx));
    }
    values
}

fn parameter_values(
    unit: &SourceUnit,
    declaration: &Declaration<'_>,
    ctx: &mut ResolutionContext,
) -> LiteralValueSet {
    if let Some(annotation) = declaration.type_annotation() {
        let declared = type_values(unit, &annotation, ctx);
        if !declared.is_empty() {
            return declared;
        }
    }
    parameter_iteration_values(unit, declaration, ctx)
}

/// Property signature, object pair, class field or enum member
fn property_values(
    unit: &SourceUnit,
    declaration: &Declaration<'_>,
    ctx: &mut ResolutionContext,
) -> LiteralValueSet {
    match declaration.node.kind() {
        "enum_assignment" => {
            let value = declaration
                .initializer()
                .and_then(|value| string_literal_value(unit, &value));
            let name = property_key_text(unit, &declaration.name);
            value
                .or(name)
                .map(LiteralValueSet::singleton)
                .unwrap_or_default()
        }
        "property_identifier" => property_key_text(unit, &declaration.name)
            .map(LiteralValueSet::singleton)
            .unwrap_or_default(),
        _ => variable_values(unit, declaration, ctx),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::base::ResolverConfig;
    use crate::resolver::module_path::ModuleResolver;
    use crate::resolver::typescript::declarations::{find_declaration, find_declaration_in};
    use std::fs;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn context() -> ResolutionContext {
        ResolutionContext::new(
            Arc::new(ResolverConfig::default()),
            Arc::new(ModuleResolver::relative_only()),
        )
    }

    fn values_of(content: &str, name: &str) -> Vec<String> {
        let unit = SourceUnit::parse("mem/literals.ts", content).unwrap();
        let declaration = find_declaration(&unit, name).unwrap();
        extract_literal_values(&unit, declaration, &mut context()).to_vec()
    }

    #[test]
    fn test_enum_member_values() {
        assert_eq!(
            values_of(r#"enum E { A = "x", B = "y" }"#, "E"),
            vec!["x", "y"]
        );
        assert_eq!(values_of("enum N { Up = 1, Down, 'Left' }", "N"), vec!["Up", "Down", "Left"]);
    }

    #[test]
    fn test_const_object_keys() {
        assert_eq!(values_of(r#"const C = { p: "1", q: "2" };"#, "C"), vec!["p", "q"]);
        assert_eq!(
            values_of(r#"const C = Object.freeze({ 'p-1': 1, ["q"]: 2 } as const);"#, "C"),
            vec!["p-1", "q"]
        );
    }

    #[test]
    fn test_assertion_type_wins_over_literal() {
        let content = r#"type T = "x" | "y";
const v = "q" as T;
const w = "q" as Unknown;
"#;
        assert_eq!(values_of(content, "v"), vec!["x", "y"]);
        assert_eq!(values_of(content, "w"), vec!["q"]);
    }

    #[test]
    fn test_union_alias_ignores_non_literal_members() {
        assert_eq!(
            values_of(r#"type U = "a" | 'b' | number | null | `c`;"#, "U"),
            vec!["a", "b", "c"]
        );
    }

    #[test]
    fn test_typeof_idiom_yields_keys() {
        let content = r#"const C = { A: "a", B: "b" } as const;
type T = (typeof C)[keyof typeof C];
let t: T;
"#;
        assert_eq!(values_of(content, "t"), vec!["A", "B"]);
        assert_eq!(values_of("const C = {X: 1};\ntype K = keyof typeof C;", "K"), vec!["X"]);
        assert_eq!(
            values_of("const ROLES = ['admin', 'user'] as const;\ntype Role = (typeof ROLES)[number];", "Role"),
            vec!["admin", "user"]
        );
    }

    #[test]
    fn test_declared_type_before_initializer() {
        let content = r#"type Mode = "light" | "dark";
const mode: Mode = "light";
const alias = mode;
const list = ["a", "b"];
"#;
        assert_eq!(values_of(content, "mode"), vec!["light", "dark"]);
        assert_eq!(values_of(content, "alias"), vec!["light", "dark"]);
        assert_eq!(values_of(content, "list"), vec!["a", "b"]);
    }

    #[test]
    fn test_self_reference_terminates() {
        assert!(values_of("type A = B;\ntype B = A | C;\ntype C = A;", "A").is_empty());
        assert_eq!(values_of("type A = 'x' | B;\ntype B = A | 'y';", "A"), vec!["x", "y"]);
    }

    #[test]
    fn test_shared_references_resolve_once() {
        let mut content = String::from("type T0 = 'a' | 'b';\n");
        for level in 1..=24 {
            content.push_str(&format!("type T{level} = T{prev} | T{prev};\n", prev = level - 1));
        }
        let started = std::time::Instant::now();
        assert_eq!(values_of(&content, "T24"), vec!["a", "b"]);
        assert!(started.elapsed() < std::time::Duration::from_secs(5));
    }

    #[test]
    fn test_values_cut_short_by_a_cycle_are_not_memoized() {
        let unit = SourceUnit::parse("mem/cycle.ts", "type A = 'x' | B;\ntype B = A | 'y';").unwrap();
        let mut ctx = context();
        let a = find_declaration(&unit, "A").unwrap();
        assert_eq!(extract_literal_values(&unit, a, &mut ctx).to_vec(), vec!["x", "y"]);

        // Inside A, B only saw 'y'; on its own it must see A as well
        let b = find_declaration(&unit, "B").unwrap();
        assert_eq!(extract_literal_values(&unit, b, &mut ctx).to_vec(), vec!["x", "y"]);
    }

    #[test]
    fn test_typed_parameter() {
        let content = "type Side = 'buy' | 'sell';\nfunction place(side: Side) { return `${side}`; }";
        let unit = SourceUnit::parse("mem/param.ts", content).unwrap();
        let declaration = find_declaration_in(&unit, "side", Namespace::Value).unwrap();
        assert_eq!(
            extract_literal_values(&unit, declaration, &mut context()).to_vec(),
            vec!["buy", "sell"]
        );
    }

    #[test]
    fn test_cross_file_cycle_terminates_empty() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("a.ts"), "import { B } from './b';\nexport type A = B;\n").unwrap();
        fs::write(root.join("b.ts"), "import { A } from './a';\nexport type B = A;\n").unwrap();

        let path = root.join("a.ts");
        let unit = SourceUnit::parse(&path, fs::read_to_string(&path).unwrap()).unwrap();
        let declaration = find_declaration(&unit, "A").unwrap();
        let values = extract_literal_values(&unit, declaration, &mut context());
        assert!(values.is_empty());
    }

    #[test]
    fn test_imported_enum_through_type_reference() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(
            root.join("enums.ts"),
            "export enum ExchangeType { A = 'A', B = 'B', C = 'C' }\n",
        )
        .unwrap();
        fs::write(
            root.join("main.ts"),
            "import { ExchangeType } from './enums';\nlet e: ExchangeType;\n",
        )
        .unwrap();

        let path = root.join("main.ts");
        let unit = SourceUnit::parse(&path, fs::read_to_string(&path).unwrap()).unwrap();
        let declaration = find_declaration(&unit, "e").unwrap();
        assert_eq!(
            extract_literal_values(&unit, declaration, &mut context()).to_vec(),
            vec!["A", "B", "C"]
        );
    }
}
