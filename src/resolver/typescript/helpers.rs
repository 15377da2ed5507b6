// Syntax helpers shared by the TypeScript resolver modules

use crate::resolver::base::SourceUnit;
use tree_sitter::Node;

/// Strip one pair of matching quotes and undo simple escapes
pub fn unquote(text: &str) -> Option<String> {
    let mut chars = text.chars();
    let first = chars.next()?;
    if !matches!(first, '"' | '\'' | '`') || text.len() < 2 || !text.ends_with(first) {
        return None;
    }
    let inner = &text[1..text.len() - 1];
    if !inner.contains('\\') {
        return Some(inner.to_string());
    }

    let mut out = String::with_capacity(inner.len());
    let mut escaped = inner.chars();
    while let Some(c) = escaped.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match escaped.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    Some(out)
}

/// Value of a string literal or a substitution-free template literal
pub fn string_literal_value(unit: &SourceUnit, node: &Node) -> Option<String> {
    match node.kind() {
        "string" => unquote(unit.node_text(node)),
        "template_string" => {
            let mut cursor = node.walk();
            let has_substitution = node
                .named_children(&mut cursor)
                .any(|child| child.kind() == "template_substitution");
            if has_substitution {
                None
            } else {
                unquote(unit.node_text(node))
            }
        }
        _ => None,
    }
}

/// `x as const`
pub fn is_const_assertion(unit: &SourceUnit, node: &Node) -> bool {
    if node.kind() != "as_expression" {
        return false;
    }
    let mut cursor = node.walk();
    let last = node.children(&mut cursor).last();
    last.is_some_and(|child| unit.node_text(&child) == "const")
}

/// Peel wrappers that do not change an expression's literal content
///
/// Parentheses, `as const`, `satisfies T`, `x!` and `Object.freeze(x)`.
/// A plain `x as T` is kept: the asserted type matters.
pub fn unwrap_expression<'t>(unit: &SourceUnit, node: Node<'t>) -> Node<'t> {
    let mut current = node;
    loop {
        let inner = match current.kind() {
            "parenthesized_expression" | "satisfies_expression" | "non_null_expression" => {
                first_named_child(&current)
            }
            "as_expression" if is_const_assertion(unit, &current) => first_named_child(&current),
            "call_expression" if call_target(unit, &current) == Some("Object.freeze") => {
                call_arguments(&current).into_iter().next()
            }
            _ => None,
        };
        match inner {
            Some(next) => current = next,
            None => return current,
        }
    }
}

/// First named child that is not a comment
pub fn first_named_child<'t>(node: &Node<'t>) -> Option<Node<'t>> {
    let mut cursor = node.walk();
    let found = node
        .named_children(&mut cursor)
        .find(|child| child.kind() != "comment");
    found
}

/// Last named child that is not a comment
pub fn last_named_child<'t>(node: &Node<'t>) -> Option<Node<'t>> {
    let mut cursor = node.walk();
    let found = node
        .named_children(&mut cursor)
        .filter(|child| child.kind() != "comment")
        .last();
    found
}

/// Callee text of a call expression (`Object.values`); None for callees spanning whitespace
pub fn call_target<'u>(unit: &'u SourceUnit, call: &Node) -> Option<&'u str> {
    if call.kind() != "call_expression" {
        return None;
    }
    let function = call.child_by_field_name("function")?;
    matches!(function.kind(), "member_expression" | "identifier")
        .then(|| unit.node_text(&function))
        .filter(|text| !text.chars().any(char::is_whitespace))
}

/// Argument expressions of a call, comments skipped
pub fn call_arguments<'t>(call: &Node<'t>) -> Vec<Node<'t>> {
    let Some(arguments) = call.child_by_field_name("arguments") else {
        return Vec::new();
    };
    let mut cursor = arguments.walk();
    arguments
        .named_children(&mut cursor)
        .filter(|child| child.kind() != "comment")
        .collect()
}

/// Text of an object key / property name, unquoted
pub fn property_key_text(unit: &SourceUnit, key: &Node) -> Option<String> {
    match key.kind() {
        "property_identifier"
        | "shorthand_property_identifier"
        | "private_property_identifier"
        | "identifier"
        | "number" => Some(unit.node_text(key).to_string()),
        "string" => unquote(unit.node_text(key)),
        "computed_property_name" => {
            let inner = first_named_child(key)?;
            string_literal_value(unit, &inner)
        }
        _ => None,
    }
}

/// JavaScript identifier syntax (ASCII subset plus `$` and `_`)
pub fn is_identifier_name(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

/// Canonical text of an interpolated expression
///
/// Optional chaining and non-null assertions are dropped and whitespace around
/// dots removed, so `a?.b!` and `a . b` both become `a.b`. Quoted spans are
/// left untouched.
pub fn normalize_expression_text(text: &str) -> String {
    let chars: Vec<char> = text.trim().chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '"' | '\'' | '`' => {
                // quoted spans are copied verbatim
                out.push(c);
                while let Some(&q) = chars.get(i + 1) {
                    i += 1;
                    out.push(q);
                    if q == '\\' {
                        if let Some(&escaped) = chars.get(i + 1) {
                            i += 1;
                            out.push(escaped);
                        }
                    } else if q == c {
                        break;
                    }
                }
            }
            '?' if chars.get(i + 1) == Some(&'.')
                && !chars.get(i + 2).is_some_and(|n| n.is_ascii_digit()) =>
            {
                // `?.` → `.`
            }
            '!' if out.chars().last().is_some_and(|p| {
                p.is_alphanumeric() || matches!(p, '_' | '$' | ')' | ']')
            }) && chars.get(i + 1) != Some(&'=') => {}
            c if c.is_whitespace() => {
                let next = chars[i..].iter().find(|n| !n.is_whitespace());
                let previous = out.chars().last();
                if previous != Some('.') && next != Some(&'.') {
                    out.push(' ');
                }
                while i + 1 < chars.len() && chars[i + 1].is_whitespace() {
                    i += 1;
                }
            }
            _ => out.push(c),
        }
        i += 1;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unquote() {
        assert_eq!(unquote("'a'"), Some("a".to_string()));
        assert_eq!(unquote("\"a\\\"b\""), Some("a\"b".to_string()));
        assert_eq!(unquote("`t`"), Some("t".to_string()));
        assert_eq!(unquote("'a\""), None);
        assert_eq!(unquote("a"), None);
        assert_eq!(unquote("'"), None);
    }

    #[test]
    fn test_normalize_expression_text() {
        assert_eq!(normalize_expression_text("a?.b!"), "a.b");
        assert_eq!(normalize_expression_text("a.b"), "a.b");
        assert_eq!(normalize_expression_text("msg!.payload?.kind"), "msg.payload.kind");
        assert_eq!(normalize_expression_text("config\n  .mode"), "config.mode");
        assert_eq!(normalize_expression_text("a !== b"), "a !== b");
        assert_eq!(normalize_expression_text("ok ? 'x' : 'y'"), "ok ? 'x' : 'y'");
        assert_eq!(normalize_expression_text(r#"ok ? "yes!" : "no""#), r#"ok ? "yes!" : "no""#);
        assert_eq!(normalize_expression_text("m['a ?. b']!"), "m['a ?. b']");
        assert_eq!(normalize_expression_text(r#"f("it\"s!")"#), r#"f("it\"s!")"#);
    }

    #[test]
    fn test_identifier_names() {
        assert!(is_identifier_name("status"));
        assert!(is_identifier_name("$el"));
        assert!(is_identifier_name("_x1"));
        assert!(!is_identifier_name("a.b"));
        assert!(!is_identifier_name("1a"));
        assert!(!is_identifier_name(""));
    }

    #[test]
    fn test_unwrap_expression_peels_const_wrappers() {
        let unit = SourceUnit::parse(
            "mem/a.ts",
            "const a = Object.freeze(({ p: 1 } as const) satisfies Record<string, number>);\nconst b = 'q' as T;\n",
        )
        .unwrap();
        let declarators = unit.find_nodes_by_type(&unit.root(), "variable_declarator");

        let a = declarators[0].child_by_field_name("value").unwrap();
        assert_eq!(unwrap_expression(&unit, a).kind(), "object");

        let b = declarators[1].child_by_field_name("value").unwrap();
        let unwrapped = unwrap_expression(&unit, b);
        assert_eq!(unwrapped.kind(), "as_expression");
        assert!(!is_const_assertion(&unit, &unwrapped));
    }
}
