// Imports and exports: following a name across module boundaries
//
// Lookups that may land in another file take a callback instead of returning
// the declaration, because the target `SourceUnit` only lives for the
// duration of the lookup.

use tracing::debug;
use tree_sitter::Node;

use super::declarations::{find_declaration_in, Declaration, Namespace};
use super::helpers::unquote;
use crate::resolver::base::{ResolutionContext, SourceUnit};
use std::path::Path;

/// A top-level import binding a local name
#[derive(Debug, Clone)]
pub struct ImportBinding<'t> {
    pub statement: Node<'t>,
    /// Module specifier as written (`"./types"`, `"@app/models"`)
    pub source: String,
    /// Name to look up among the target module's exports (`default` for default imports)
    pub imported_name: String,
    pub is_default: bool,
    /// `import * as ns from ...`
    pub is_namespace: bool,
}

/// `export { name } from "..."` or `export * from "..."` that may provide a name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReExport {
    pub source: String,
    pub imported_name: String,
}

/// Find the top-level import that binds `local_name`
pub fn find_import_of<'u>(unit: &'u SourceUnit, local_name: &str) -> Option<ImportBinding<'u>> {
    let root = unit.root();
    let mut cursor = root.walk();
    for statement in root
        .named_children(&mut cursor)
        .filter(|node| node.kind() == "import_statement")
    {
        let Some(source) = statement
            .child_by_field_name("source")
            .and_then(|node| unquote(unit.node_text(&node)))
        else {
            continue;
        };
        let binding = |imported_name: String, is_default: bool, is_namespace: bool| ImportBinding {
            statement,
            source: source.clone(),
            imported_name,
            is_default,
            is_namespace,
        };

        let Some(clause) = unit.find_child_by_type(&statement, "import_clause") else {
            continue;
        };
        let mut clause_cursor = clause.walk();
        for child in clause.named_children(&mut clause_cursor) {
            match child.kind() {
                "identifier" if unit.node_text(&child) == local_name => {
                    return Some(binding("default".to_string(), true, false));
                }
                "namespace_import" => {
                    let bound = unit
                        .find_child_by_type(&child, "identifier")
                        .map(|identifier| unit.node_text(&identifier));
                    if bound == Some(local_name) {
                        return Some(binding("*".to_string(), false, true));
                    }
                }
                "named_imports" => {
                    for specifier in unit.get_children_of_type(&child, "import_specifier") {
                        let Some(name) = specifier.child_by_field_name("name") else {
                            continue;
                        };
                        let local = specifier.child_by_field_name("alias").unwrap_or(name);
                        if binding_text(unit, &local) == local_name {
                            return Some(binding(binding_text(unit, &name), false, false));
                        }
                    }
                }
                _ => {}
            }
        }
    }
    None
}

/// Names in import/export clauses may be string literals (`export { a as "b-c" }`)
fn binding_text(unit: &SourceUnit, node: &Node) -> String {
    let text = unit.node_text(node);
    if node.kind() == "string" {
        unquote(text).unwrap_or_default()
    } else {
        text.to_string()
    }
}

fn top_level_exports<'u>(unit: &'u SourceUnit) -> Vec<Node<'u>> {
    unit.get_children_of_type(&unit.root(), "export_statement")
}

/// Declarations introduced by an exported declaration node
fn declarations_of(node: Node<'_>) -> Vec<Declaration<'_>> {
    match node.kind() {
        "lexical_declaration" | "variable_declaration" => {
            let mut cursor = node.walk();
            node.named_children(&mut cursor)
                .filter_map(Declaration::from_node)
                .collect()
        }
        "ambient_declaration" => {
            let mut cursor = node.walk();
            let children: Vec<_> = node.named_children(&mut cursor).collect();
            children.into_iter().flat_map(declarations_of).collect()
        }
        _ => Declaration::from_node(node).into_iter().collect(),
    }
}

/// Exported declaration named `name` in this file, without following re-exports
/// or falling back to non-exported declarations
pub fn find_exported_strict<'u>(
    unit: &'u SourceUnit,
    name: &str,
    namespace: Namespace,
) -> Option<Declaration<'u>> {
    let exports = top_level_exports(unit);

    for export in &exports {
        if let Some(declaration) = export.child_by_field_name("declaration") {
            let found = declarations_of(declaration).into_iter().find(|decl| {
                decl.kind.in_namespace(namespace) && unit.node_text(&decl.name) == name
            });
            if found.is_some() {
                return found;
            }
        }
    }

    if name == "default" {
        if let Some(local) = find_default_export_name(unit) {
            return find_declaration_in(unit, local, namespace);
        }
    }

    let local = find_local_export_alias(unit, name)?;
    find_declaration_in(unit, &local, namespace)
}

/// `export default Identifier;`
pub fn find_default_export_name(unit: &SourceUnit) -> Option<&str> {
    top_level_exports(unit).into_iter().find_map(|export| {
        unit.find_child_by_type(&export, "default")?;
        let value = export.child_by_field_name("value")?;
        (value.kind() == "identifier").then(|| unit.node_text(&value))
    })
}

/// Local name behind `export { local as name }` (no `from` clause)
pub fn find_local_export_alias(unit: &SourceUnit, name: &str) -> Option<String> {
    for export in top_level_exports(unit) {
        if export.child_by_field_name("source").is_some() {
            continue;
        }
        let Some(clause) = unit.find_child_by_type(&export, "export_clause") else {
            continue;
        };
        for specifier in unit.get_children_of_type(&clause, "export_specifier") {
            let Some(local) = specifier.child_by_field_name("name") else {
                continue;
            };
            let exported = specifier.child_by_field_name("alias").unwrap_or(local);
            if binding_text(unit, &exported) == name {
                return Some(binding_text(unit, &local));
            }
        }
    }
    None
}

/// Re-exports that may provide `name`: named ones first, then `export *`
pub fn find_reexports(unit: &SourceUnit, name: &str) -> Vec<ReExport> {
    let mut named = Vec::new();
    let mut stars = Vec::new();

    for export in top_level_exports(unit) {
        let Some(source) = export
            .child_by_field_name("source")
            .and_then(|node| unquote(unit.node_text(&node)))
        else {
            continue;
        };

        if let Some(clause) = unit.find_child_by_type(&export, "export_clause") {
            for specifier in unit.get_children_of_type(&clause, "export_specifier") {
                let Some(imported) = specifier.child_by_field_name("name") else {
                    continue;
                };
                let exported = specifier.child_by_field_name("alias").unwrap_or(imported);
                if binding_text(unit, &exported) == name {
                    named.push(ReExport {
                        source: source.clone(),
                        imported_name: binding_text(unit, &imported),
                    });
                }
            }
        } else if unit.find_child_by_type(&export, "*").is_some()
            && unit.find_child_by_type(&export, "namespace_export").is_none()
        {
            stars.push(ReExport {
                source,
                imported_name: name.to_string(),
            });
        }
    }

    named.extend(stars);
    named
}

/// Open and parse a file, logging failures
pub fn open_unit(path: &Path, ctx: &ResolutionContext) -> Option<SourceUnit> {
    match SourceUnit::open(path, ctx.config().file_retry_delay()) {
        Ok(unit) => Some(unit),
        Err(e) => {
            debug!("Skipping module: {}", e);
            None
        }
    }
}

/// Resolve and parse the module `specifier` imported from `unit`
pub fn open_module(unit: &SourceUnit, specifier: &str, ctx: &ResolutionContext) -> Option<SourceUnit> {
    let path = ctx.modules().resolve(unit.path(), specifier)?;
    open_unit(&path, ctx)
}

/// Run `f` on the declaration `name` refers to: local first, then through imports
pub fn with_declaration<R, F>(
    unit: &SourceUnit,
    name: &str,
    namespace: Namespace,
    ctx: &mut ResolutionContext,
    f: F,
) -> Option<R>
where
    F: for<'u> FnOnce(&'u SourceUnit, Declaration<'u>, &mut ResolutionContext) -> R,
{
    if let Some(declaration) = find_declaration_in(unit, name, namespace) {
        return Some(f(unit, declaration, ctx));
    }
    with_imported_declaration(unit, name, namespace, ctx, f)
}

/// Run `f` on the declaration an import of `name` points at
pub fn with_imported_declaration<R, F>(
    unit: &SourceUnit,
    name: &str,
    namespace: Namespace,
    ctx: &mut ResolutionContext,
    f: F,
) -> Option<R>
where
    F: for<'u> FnOnce(&'u SourceUnit, Declaration<'u>, &mut ResolutionContext) -> R,
{
    let hops = ctx.config().max_reexport_hops;
    try_imported(unit, name, namespace, ctx, hops, f).ok()
}

/// Run `f` on `member` exported by the module behind `import * as root`
pub fn with_namespace_member<R, F>(
    unit: &SourceUnit,
    root: &str,
    member: &str,
    namespace: Namespace,
    ctx: &mut ResolutionContext,
    f: F,
) -> Option<R>
where
    F: for<'u> FnOnce(&'u SourceUnit, Declaration<'u>, &mut ResolutionContext) -> R,
{
    let import = find_import_of(unit, root).filter(|import| import.is_namespace)?;
    let target = open_module(unit, &import.source, ctx)?;
    let hops = ctx.config().max_reexport_hops;
    follow_export(&target, member, namespace, ctx, hops, f).ok()
}

fn try_imported<R, F>(
    unit: &SourceUnit,
    local_name: &str,
    namespace: Namespace,
    ctx: &mut ResolutionContext,
    hops: usize,
    f: F,
) -> Result<R, F>
where
    F: for<'u> FnOnce(&'u SourceUnit, Declaration<'u>, &mut ResolutionContext) -> R,
{
    let Some(import) = find_import_of(unit, local_name).filter(|import| !import.is_namespace)
    else {
        return Err(f);
    };
    let Some(target) = open_module(unit, &import.source, ctx) else {
        return Err(f);
    };
    follow_export(&target, &import.imported_name, namespace, ctx, hops, f)
}

/// Locate the export `name` of `unit`, following at most `hops` re-exports
///
/// Hands `f` back when nothing is found so the caller can try elsewhere.
pub fn follow_export<R, F>(
    unit: &SourceUnit,
    name: &str,
    namespace: Namespace,
    ctx: &mut ResolutionContext,
    hops: usize,
    f: F,
) -> Result<R, F>
where
    F: for<'u> FnOnce(&'u SourceUnit, Declaration<'u>, &mut ResolutionContext) -> R,
{
    if let Some(declaration) = find_exported_strict(unit, name, namespace) {
        return Ok(f(unit, declaration, ctx));
    }

    let mut f = f;
    if hops > 0 {
        // import { X } from "./a"; export { X };
        if let Some(local) = find_local_export_alias(unit, name) {
            match try_imported(unit, &local, namespace, ctx, hops - 1, f) {
                Ok(result) => return Ok(result),
                Err(back) => f = back,
            }
        }

        for reexport in find_reexports(unit, name) {
            let Some(target) = open_module(unit, &reexport.source, ctx) else {
                continue;
            };
            match follow_export(&target, &reexport.imported_name, namespace, ctx, hops - 1, f) {
                Ok(result) => return Ok(result),
                Err(back) => f = back,
            }
        }
    } else {
        debug!("Re-export hop limit reached looking for '{}'", name);
    }

    match find_declaration_in(unit, name, namespace) {
        Some(declaration) => Ok(f(unit, declaration, ctx)),
        None => Err(f),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::base::ResolverConfig;
    use crate::resolver::module_path::ModuleResolver;
    use crate::resolver::typescript::declarations::DeclarationKind;
    use std::fs;
    use std::path::PathBuf;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn context() -> ResolutionContext {
        ResolutionContext::new(
            Arc::new(ResolverConfig::default()),
            Arc::new(ModuleResolver::relative_only()),
        )
    }

    fn write(root: &Path, relative: &str, content: &str) -> PathBuf {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_find_import_of_each_form() {
        let unit = SourceUnit::parse(
            "mem/imports.ts",
            r#"import Default, { Plain, Original as Renamed } from "./a";
import * as models from './models';
import type { Mode } from "./types";
"#,
        )
        .unwrap();

        let default = find_import_of(&unit, "Default").unwrap();
        assert!(default.is_default);
        assert_eq!(default.imported_name, "default");
        assert_eq!(default.source, "./a");

        assert_eq!(find_import_of(&unit, "Plain").unwrap().imported_name, "Plain");
        assert_eq!(find_import_of(&unit, "Renamed").unwrap().imported_name, "Original");
        assert!(find_import_of(&unit, "Original").is_none());

        let namespace = find_import_of(&unit, "models").unwrap();
        assert!(namespace.is_namespace);
        assert_eq!(namespace.source, "./models");

        assert_eq!(find_import_of(&unit, "Mode").unwrap().source, "./types");
    }

    #[test]
    fn test_exported_forms() {
        let unit = SourceUnit::parse(
            "mem/exports.ts",
            r#"export const A = "a";
export enum Kind { X = "x" }
const hidden = "h";
type Local = "l";
export { hidden as Visible, Local };
const fallbackOnly = 1;
export default hidden;
"#,
        )
        .unwrap();

        let kind = |name| find_exported_strict(&unit, name, Namespace::Any).map(|d| d.kind);
        assert_eq!(kind("A"), Some(DeclarationKind::Variable));
        assert_eq!(kind("Kind"), Some(DeclarationKind::Enum));
        assert_eq!(kind("Visible"), Some(DeclarationKind::Variable));
        assert_eq!(kind("Local"), Some(DeclarationKind::TypeAlias));
        assert_eq!(kind("default"), Some(DeclarationKind::Variable));
        assert_eq!(kind("fallbackOnly"), None);
    }

    #[test]
    fn test_follows_imports_through_barrel_files() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let main = write(root, "src/main.ts", "import { Mode as M } from './shared';\n");
        write(
            root,
            "src/shared/index.ts",
            "export { Other } from './other';\nexport * from './types';\n",
        );
        write(root, "src/shared/other.ts", "export const Other = 1;\n");
        let types = write(root, "src/shared/types.ts", "export type Mode = 'x' | 'y';\n");

        let unit = SourceUnit::parse(&main, fs::read_to_string(&main).unwrap()).unwrap();
        let mut ctx = context();
        let found = with_declaration(&unit, "M", Namespace::Type, &mut ctx, |u, d, _| {
            (u.path().to_path_buf(), d.kind, d.name_text(u).to_string())
        });
        assert_eq!(
            found,
            Some((
                types.canonicalize().unwrap(),
                DeclarationKind::TypeAlias,
                "Mode".to_string()
            ))
        );
    }

    #[test]
    fn test_reexport_cycle_terminates() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let main = write(root, "main.ts", "import { Ghost } from './a';\n");
        write(root, "a.ts", "export * from './b';\n");
        write(root, "b.ts", "export * from './a';\n");

        let unit = SourceUnit::parse(&main, fs::read_to_string(&main).unwrap()).unwrap();
        let mut ctx = context();
        let found = with_declaration(&unit, "Ghost", Namespace::Any, &mut ctx, |_, d, _| d.kind);
        assert_eq!(found, None);
    }

    #[test]
    fn test_namespace_member() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let main = write(root, "main.ts", "import * as enums from './enums';\n");
        write(root, "enums.ts", "export enum Side { Buy = 'BUY' }\n");

        let unit = SourceUnit::parse(&main, fs::read_to_string(&main).unwrap()).unwrap();
        let mut ctx = context();
        let found =
            with_namespace_member(&unit, "enums", "Side", Namespace::Value, &mut ctx, |_, d, _| {
                d.kind
            });
        assert_eq!(found, Some(DeclarationKind::Enum));
    }
}
