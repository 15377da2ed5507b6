// Template Site Scanner
//
// Finds every template literal with at least one `${...}` substitution and
// splits it into static text and variable parts.

use tracing::trace;
use tree_sitter::Node;

use super::helpers::{first_named_child, normalize_expression_text};
use crate::resolver::base::{Position, SourceUnit, TemplatePart, TemplateSite};

/// Declarations that end a statement without their kind ending in `_statement`
const STATEMENT_LIKE: &[&str] = &[
    "lexical_declaration",
    "variable_declaration",
    "public_field_definition",
    "field_definition",
];

/// All template sites in document (pre-)order
pub fn scan_template_sites(unit: &SourceUnit) -> Vec<TemplateSite> {
    let root = unit.root();
    let sites: Vec<TemplateSite> = unit
        .find_nodes_by_type(&root, "template_string")
        .into_iter()
        .filter_map(|template| scan_template(unit, &template))
        .collect();
    trace!("{} template sites in '{}'", sites.len(), unit.path().display());
    sites
}

fn scan_template(unit: &SourceUnit, template: &Node) -> Option<TemplateSite> {
    let content = unit.content();
    let mut parts = Vec::new();
    // Skip the opening backtick
    let mut cursor_byte = template.start_byte() + 1;

    let mut cursor = template.walk();
    for substitution in template
        .named_children(&mut cursor)
        .filter(|child| child.kind() == "template_substitution")
    {
        push_static(&mut parts, content, cursor_byte, substitution.start_byte());
        cursor_byte = substitution.end_byte();

        let Some(expression) = first_named_child(&substitution) else {
            continue;
        };
        parts.push(TemplatePart::Variable {
            expression: normalize_expression_text(unit.node_text(&expression)),
            position: variable_position(&expression),
        });
    }
    push_static(
        &mut parts,
        content,
        cursor_byte,
        template.end_byte().saturating_sub(1),
    );

    if !parts.iter().any(TemplatePart::is_variable) {
        return None;
    }

    Some(TemplateSite {
        parts,
        start: unit.position_of(template),
        anchor: anchor_position(unit, template),
    })
}

fn push_static(parts: &mut Vec<TemplatePart>, content: &str, start: usize, end: usize) {
    if start >= end {
        return;
    }
    if let Some(text) = content.get(start..end) {
        parts.push(TemplatePart::Static {
            text: text.to_string(),
        });
    }
}

/// Where the symbol oracle should be asked about an interpolated expression
///
/// Member chains are queried on their last property, identifiers on
/// themselves, anything else at its start.
pub fn variable_position(expression: &Node) -> Position {
    let mut node = *expression;
    while node.kind() == "non_null_expression" || node.kind() == "parenthesized_expression" {
        match first_named_child(&node) {
            Some(inner) => node = inner,
            None => break,
        }
    }
    match node.kind() {
        "member_expression" => node
            .child_by_field_name("property")
            .map(|property| property.start_position().into())
            .unwrap_or_else(|| node.start_position().into()),
        _ => node.start_position().into(),
    }
}

/// End of the last line of the statement enclosing the template
fn anchor_position(unit: &SourceUnit, template: &Node) -> Position {
    let mut anchor = *template;
    let mut current = template.parent();
    while let Some(parent) = current {
        let kind = parent.kind();
        if kind.ends_with("_statement") || STATEMENT_LIKE.contains(&kind) {
            anchor = parent;
            break;
        }
        current = parent.parent();
    }
    let line = anchor.end_position().row;
    Position::new(line, unit.line_end_column(line))
}
