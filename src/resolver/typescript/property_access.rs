// Property Access Resolver
//
// Resolves dotted chains such as `m.exchangeType` or `config.transport.mode`.
// The root's declared type is consulted first; the object literal it was
// initialized with is the fallback. Enum roots yield the member's value.

use tree_sitter::Node;

use super::declarations::{Declaration, DeclarationKind, Namespace};
use super::helpers::{
    first_named_child, is_identifier_name, last_named_child, normalize_expression_text,
    property_key_text, unwrap_expression,
};
use super::imports_exports::{with_declaration, with_namespace_member};
use super::literals::{enum_member_value, expression_values, extract_literal_values, type_values};
use crate::resolver::base::{DeclarationKey, LiteralValueSet, ResolutionContext, SourceUnit};

/// Resolve a normalized dotted expression (`root.a.b`)
pub fn resolve_property_access(
    unit: &SourceUnit,
    expression: &str,
    ctx: &mut ResolutionContext,
) -> LiteralValueSet {
    let segments: Vec<&str> = expression.split('.').collect();
    if segments.len() < 2 || !segments.iter().all(|segment| is_identifier_name(segment)) {
        return LiteralValueSet::new();
    }
    let (root, path) = (segments[0], &segments[1..]);

    let resolved = with_declaration(unit, root, Namespace::Value, ctx, |u, decl, c| {
        member_chain_values(u, decl, path, c)
    });
    if let Some(values) = resolved {
        return values;
    }

    // import * as ns from "..."; ns.Member.rest
    with_namespace_member(unit, root, path[0], Namespace::Value, ctx, |u, decl, c| {
        member_chain_values(u, decl, &path[1..], c)
    })
    .unwrap_or_default()
}

/// Resolve a `member_expression` node
pub fn resolve_member_expression(
    unit: &SourceUnit,
    node: &Node,
    ctx: &mut ResolutionContext,
) -> LiteralValueSet {
    let expression = normalize_expression_text(unit.node_text(node));
    resolve_property_access(unit, &expression, ctx)
}

/// Values of `declaration.path[0].path[1]...`
pub fn member_chain_values(
    unit: &SourceUnit,
    declaration: Declaration<'_>,
    path: &[&str],
    ctx: &mut ResolutionContext,
) -> LiteralValueSet {
    if path.is_empty() {
        return extract_literal_values(unit, declaration, ctx);
    }

    let key = DeclarationKey::new(unit.path(), &declaration.node);
    if !ctx.enter(key.clone()) {
        return LiteralValueSet::new();
    }
    let values = member_values(unit, &declaration, path, ctx);
    ctx.leave(&key);
    values
}

fn member_values(
    unit: &SourceUnit,
    declaration: &Declaration<'_>,
    path: &[&str],
    ctx: &mut ResolutionContext,
) -> LiteralValueSet {
    match declaration.kind {
        DeclarationKind::Enum => {
            if path.len() == 1 {
                enum_member_value(unit, &declaration.node, path[0])
            } else {
                LiteralValueSet::new()
            }
        }
        DeclarationKind::TypeAlias | DeclarationKind::Interface => {
            declared_type_member_values(unit, declaration, path, ctx)
        }
        DeclarationKind::Variable | DeclarationKind::Parameter | DeclarationKind::Property => {
            if let Some(annotation) = declaration.type_annotation() {
                let declared = type_member_values(unit, &annotation, path, ctx);
                if !declared.is_empty() {
                    return declared;
                }
            }
            declaration
                .initializer()
                .map(|value| value_member_values(unit, &value, path, ctx))
                .unwrap_or_default()
        }
    }
}

/// Follow `path` through a value expression
fn value_member_values(
    unit: &SourceUnit,
    value: &Node,
    path: &[&str],
    ctx: &mut ResolutionContext,
) -> LiteralValueSet {
    let node = unwrap_expression(unit, *value);
    match node.kind() {
        "object" => {
            let Some(member) = find_object_member(unit, &node, path[0]) else {
                return LiteralValueSet::new();
            };
            let rest = &path[1..];
            if member.kind() == "shorthand_property_identifier" {
                let name = unit.node_text(&member);
                return with_declaration(unit, name, Namespace::Value, ctx, |u, decl, c| {
                    member_chain_values(u, decl, rest, c)
                })
                .unwrap_or_default();
            }
            if rest.is_empty() {
                expression_values(unit, &member, ctx)
            } else {
                value_member_values(unit, &member, rest, ctx)
            }
        }
        "identifier" => {
            let name = unit.node_text(&node);
            with_declaration(unit, name, Namespace::Value, ctx, |u, decl, c| {
                member_chain_values(u, decl, path, c)
            })
            .unwrap_or_default()
        }
        "as_expression" => {
            let from_type = last_named_child(&node)
                .map(|asserted| type_member_values(unit, &asserted, path, ctx))
                .unwrap_or_default();
            if !from_type.is_empty() {
                return from_type;
            }
            first_named_child(&node)
                .map(|inner| value_member_values(unit, &inner, path, ctx))
                .unwrap_or_default()
        }
        "member_expression" => {
            let expression = format!(
                "{}.{}",
                normalize_expression_text(unit.node_text(&node)),
                path.join(".")
            );
            resolve_property_access(unit, &expression, ctx)
        }
        _ => LiteralValueSet::new(),
    }
}

/// Value node of `{ name: value }`, or the identifier itself for `{ name }`
fn find_object_member<'t>(unit: &SourceUnit, object: &Node<'t>, name: &str) -> Option<Node<'t>> {
    let mut cursor = object.walk();
    let members: Vec<Node<'t>> = object.named_children(&mut cursor).collect();
    members.into_iter().find_map(|member| match member.kind() {
        "pair" => {
            let key = member.child_by_field_name("key")?;
            if property_key_text(unit, &key).as_deref() == Some(name) {
                member.child_by_field_name("value")
            } else {
                None
            }
        }
        "shorthand_property_identifier" if unit.node_text(&member) == name => Some(member),
        _ => None,
    })
}

/// Follow `path` through a type expression
pub fn type_member_values(
    unit: &SourceUnit,
    type_node: &Node,
    path: &[&str],
    ctx: &mut ResolutionContext,
) -> LiteralValueSet {
    match type_node.kind() {
        "type_annotation" | "parenthesized_type" | "readonly_type" => first_named_child(type_node)
            .map(|inner| type_member_values(unit, &inner, path, ctx))
            .unwrap_or_default(),
        "object_type" | "interface_body" => {
            let Some(signature) = find_property_signature(unit, type_node, path[0]) else {
                return LiteralValueSet::new();
            };
            let Some(property_type) = signature.child_by_field_name("type") else {
                return LiteralValueSet::new();
            };
            let rest = &path[1..];
            if rest.is_empty() {
                type_values(unit, &property_type, ctx)
            } else {
                type_member_values(unit, &property_type, rest, ctx)
            }
        }
        "type_identifier" => {
            let name = unit.node_text(type_node);
            with_declaration(unit, name, Namespace::Type, ctx, |u, decl, c| {
                member_chain_values(u, decl, path, c)
            })
            .unwrap_or_default()
        }
        "generic_type" | "nested_type_identifier" => type_node
            .child_by_field_name("name")
            .map(|name| type_member_values(unit, &name, path, ctx))
            .unwrap_or_default(),
        // Discriminated unions: every variant contributes its member's values
        "union_type" => {
            let mut values = LiteralValueSet::new();
            let mut cursor = type_node.walk();
            let variants: Vec<Node> = type_node.named_children(&mut cursor).collect();
            for variant in variants {
                values.extend(type_member_values(unit, &variant, path, ctx));
            }
            values
        }
        "intersection_type" => {
            let mut cursor = type_node.walk();
            let parts: Vec<Node> = type_node.named_children(&mut cursor).collect();
            for part in parts {
                let values = type_member_values(unit, &part, path, ctx);
                if !values.is_empty() {
                    return values;
                }
            }
            LiteralValueSet::new()
        }
        _ => LiteralValueSet::new(),
    }
}

/// Members of an interface (including `extends`) or of an object type alias
fn declared_type_member_values(
    unit: &SourceUnit,
    declaration: &Declaration<'_>,
    path: &[&str],
    ctx: &mut ResolutionContext,
) -> LiteralValueSet {
    match declaration.kind {
        DeclarationKind::Interface => {
            if let Some(body) = declaration.node.child_by_field_name("body") {
                let own = type_member_values(unit, &body, path, ctx);
                if !own.is_empty() {
                    return own;
                }
            }
            let Some(extends) = unit.find_child_by_type(&declaration.node, "extends_type_clause")
            else {
                return LiteralValueSet::new();
            };
            let mut cursor = extends.walk();
            let bases: Vec<Node> = extends.named_children(&mut cursor).collect();
            for base in bases {
                let inherited = type_member_values(unit, &base, path, ctx);
                if !inherited.is_empty() {
                    return inherited;
                }
            }
            LiteralValueSet::new()
        }
        DeclarationKind::TypeAlias => declaration
            .node
            .child_by_field_name("value")
            .map(|value| type_member_values(unit, &value, path, ctx))
            .unwrap_or_default(),
        _ => LiteralValueSet::new(),
    }
}

/// `name: T` inside an object type or interface body
pub fn find_property_signature<'t>(
    unit: &SourceUnit,
    body: &Node<'t>,
    name: &str,
) -> Option<Node<'t>> {
    let mut cursor = body.walk();
    let signatures: Vec<Node<'t>> = body.named_children(&mut cursor).collect();
    signatures.into_iter().find(|member| {
        member.kind() == "property_signature"
            && member
                .child_by_field_name("name")
                .and_then(|key| property_key_text(unit, &key))
                .as_deref()
                == Some(name)
    })
}
