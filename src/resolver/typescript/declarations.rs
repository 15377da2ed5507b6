// Declaration Locator
//
// Whole-file, scope-naive lookup of the declaration a name refers to. The
// first match in document order wins; shadowing is not modelled.

use tree_sitter::Node;

use crate::resolver::base::SourceUnit;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeclarationKind {
    Enum,
    Variable,
    TypeAlias,
    Interface,
    Parameter,
    /// Property signature, object pair, class field or enum member
    Property,
}

/// Which TypeScript namespace a lookup targets
///
/// `type Status = ...` and `const Status = ...` may coexist; type positions
/// want the alias, value positions the variable. Enums live in both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Namespace {
    Type,
    Value,
    Any,
}

impl DeclarationKind {
    pub fn in_namespace(self, namespace: Namespace) -> bool {
        match namespace {
            Namespace::Any => true,
            Namespace::Type => matches!(
                self,
                DeclarationKind::Enum | DeclarationKind::TypeAlias | DeclarationKind::Interface
            ),
            Namespace::Value => matches!(
                self,
                DeclarationKind::Enum
                    | DeclarationKind::Variable
                    | DeclarationKind::Parameter
                    | DeclarationKind::Property
            ),
        }
    }

    /// Kinds a plain name lookup may return
    pub fn is_named_binding(self) -> bool {
        !matches!(self, DeclarationKind::Property)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Declaration<'t> {
    pub kind: DeclarationKind,
    /// The declaring node (e.g. `variable_declarator`, `enum_declaration`)
    pub node: Node<'t>,
    /// The node holding the bound name
    pub name: Node<'t>,
}

impl<'t> Declaration<'t> {
    /// Interpret `node` itself as a declaration
    pub fn from_node(node: Node<'t>) -> Option<Self> {
        let named = |kind, field: &str| {
            node.child_by_field_name(field).map(|name| Declaration {
                kind,
                node,
                name,
            })
        };

        match node.kind() {
            "enum_declaration" => named(DeclarationKind::Enum, "name"),
            "type_alias_declaration" => named(DeclarationKind::TypeAlias, "name"),
            "interface_declaration" => named(DeclarationKind::Interface, "name"),
            "variable_declarator" => named(DeclarationKind::Variable, "name")
                .filter(|decl| decl.name.kind() == "identifier"),
            "required_parameter" | "optional_parameter" => named(DeclarationKind::Parameter, "pattern")
                .filter(|decl| decl.name.kind() == "identifier"),
            "identifier" if is_parameter_identifier(&node) => Some(Declaration {
                kind: DeclarationKind::Parameter,
                node,
                name: node,
            }),
            "property_signature" | "public_field_definition" | "field_definition"
            | "enum_assignment" => named(DeclarationKind::Property, "name")
                .or_else(|| named(DeclarationKind::Property, "property")),
            "pair" => named(DeclarationKind::Property, "key"),
            "property_identifier"
                if node.parent().is_some_and(|parent| parent.kind() == "enum_body") =>
            {
                Some(Declaration {
                    kind: DeclarationKind::Property,
                    node,
                    name: node,
                })
            }
            _ => None,
        }
    }

    /// The declaration `node` belongs to, walking up from `node` itself
    ///
    /// Used for oracle locations, which point at names rather than declarations.
    pub fn enclosing(node: Node<'t>) -> Option<Self> {
        let mut current = Some(node);
        while let Some(candidate) = current {
            if candidate.kind() == "program" {
                return None;
            }
            if let Some(declaration) = Self::from_node(candidate) {
                return Some(declaration);
            }
            current = candidate.parent();
        }
        None
    }

    pub fn name_text<'u>(&self, unit: &'u SourceUnit) -> &'u str {
        unit.node_text(&self.name)
    }

    /// Explicit type annotation (`: T`) of a variable, parameter or field
    pub fn type_annotation(&self) -> Option<Node<'t>> {
        match self.kind {
            DeclarationKind::Variable | DeclarationKind::Property => {
                self.node.child_by_field_name("type")
            }
            DeclarationKind::Parameter if self.node.kind() != "identifier" => {
                self.node.child_by_field_name("type")
            }
            _ => None,
        }
    }

    /// Initializer / value expression of a variable or property
    pub fn initializer(&self) -> Option<Node<'t>> {
        match self.kind {
            DeclarationKind::Variable | DeclarationKind::Property => {
                self.node.child_by_field_name("value")
            }
            _ => None,
        }
    }
}

/// Is this identifier bound as a function/arrow parameter or a `for` loop variable?
fn is_parameter_identifier(node: &Node) -> bool {
    let Some(parent) = node.parent() else {
        return false;
    };
    match parent.kind() {
        "formal_parameters" => true,
        "arrow_function" => parent.child_by_field_name("parameter") == Some(*node),
        "for_in_statement" => {
            parent.child_by_field_name("left") == Some(*node)
                && (parent.child_by_field_name("kind").is_some()
                    || node
                        .prev_sibling()
                        .is_some_and(|keyword| matches!(keyword.kind(), "const" | "let" | "var")))
        }
        _ => false,
    }
}

/// First declaration named `name` in the file (any namespace)
pub fn find_declaration<'u>(unit: &'u SourceUnit, name: &str) -> Option<Declaration<'u>> {
    find_declaration_in(unit, name, Namespace::Any)
}

/// First declaration named `name` in the file whose kind lives in `namespace`
pub fn find_declaration_in<'u>(
    unit: &'u SourceUnit,
    name: &str,
    namespace: Namespace,
) -> Option<Declaration<'u>> {
    find_in_subtree(unit, unit.root(), name, namespace)
}

fn find_in_subtree<'u>(
    unit: &'u SourceUnit,
    node: Node<'u>,
    name: &str,
    namespace: Namespace,
) -> Option<Declaration<'u>> {
    if let Some(declaration) = Declaration::from_node(node) {
        if declaration.kind.is_named_binding()
            && declaration.kind.in_namespace(namespace)
            && unit.node_text(&declaration.name) == name
        {
            return Some(declaration);
        }
    }

    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        if let Some(found) = find_in_subtree(unit, child, name, namespace) {
            return Some(found);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::base::Position;

    fn parse(path: &str, content: &str) -> SourceUnit {
        SourceUnit::parse(path, content).unwrap()
    }

    #[test]
    fn test_finds_each_declaration_kind() {
        let unit = parse(
            "mem/decl.ts",
            r#"
enum Color { Red = "red" }
type Mode = "a" | "b";
interface Message { kind: Mode }
const payload = { a: 1 };
function send(target: Mode, retries?: number) {}
"#,
        );
        let kind = |name| find_declaration(&unit, name).map(|d| d.kind);
        assert_eq!(kind("Color"), Some(DeclarationKind::Enum));
        assert_eq!(kind("Mode"), Some(DeclarationKind::TypeAlias));
        assert_eq!(kind("Message"), Some(DeclarationKind::Interface));
        assert_eq!(kind("payload"), Some(DeclarationKind::Variable));
        assert_eq!(kind("target"), Some(DeclarationKind::Parameter));
        assert_eq!(kind("retries"), Some(DeclarationKind::Parameter));
        // Properties are never returned by name lookup
        assert_eq!(kind("kind"), None);
        assert_eq!(kind("send"), None);
    }

    #[test]
    fn test_namespaces_separate_type_and_value() {
        let unit = parse(
            "mem/ns.ts",
            "export type Status = (typeof Status)[keyof typeof Status];\nexport const Status = { On: 'on' } as const;\n",
        );
        let ty = find_declaration_in(&unit, "Status", Namespace::Type).unwrap();
        let value = find_declaration_in(&unit, "Status", Namespace::Value).unwrap();
        assert_eq!(ty.kind, DeclarationKind::TypeAlias);
        assert_eq!(value.kind, DeclarationKind::Variable);
        assert_eq!(find_declaration(&unit, "Status").unwrap().kind, DeclarationKind::TypeAlias);
    }

    #[test]
    fn test_javascript_parameters_and_loop_bindings() {
        let unit = parse(
            "mem/params.js",
            "function f(a, b) {}\nitems.forEach(item => item);\nfor (const key in obj) {}\nfor (x of xs) {}\n",
        );
        assert_eq!(find_declaration(&unit, "a").unwrap().kind, DeclarationKind::Parameter);
        assert_eq!(find_declaration(&unit, "item").unwrap().kind, DeclarationKind::Parameter);
        assert_eq!(find_declaration(&unit, "key").unwrap().kind, DeclarationKind::Parameter);
        assert!(find_declaration(&unit, "x").is_none());
        assert!(find_declaration(&unit, "obj").is_none());
    }

    #[test]
    fn test_first_match_in_document_order() {
        let unit = parse(
            "mem/shadow.ts",
            "function f() { const v = 'inner'; }\nconst v = 'outer';\n",
        );
        let declaration = find_declaration(&unit, "v").unwrap();
        assert_eq!(declaration.node.start_position().row, 0);
    }

    #[test]
    fn test_enclosing_declaration_from_name_position() {
        let unit = parse(
            "mem/enclosing.ts",
            "interface M {\n  kind: 'a' | 'b';\n}\nenum E { A = 'x', B }\n",
        );
        let name = unit.node_at(Position::new(1, 3)).unwrap();
        let property = Declaration::enclosing(name).unwrap();
        assert_eq!(property.kind, DeclarationKind::Property);
        assert_eq!(property.node.kind(), "property_signature");
        assert!(property.type_annotation().is_some());

        let member = unit.node_at(Position::new(3, 18)).unwrap();
        let enum_member = Declaration::enclosing(member).unwrap();
        assert_eq!(enum_member.kind, DeclarationKind::Property);
        assert_eq!(enum_member.name_text(&unit), "B");
    }
}
