//! TypeScript/JavaScript literal resolution
//!
//! One grammar family covers `.ts`, `.tsx`, `.js` and friends; the node kinds
//! this module inspects are shared by both grammars.
//!
//! - **scanner**: template literals split into static and variable parts
//! - **declarations**: whole-file declaration lookup by name and namespace
//! - **imports_exports**: import bindings, exports and re-export chains across files
//! - **literals**: the finite literal set of a declaration, expression or type
//! - **iteration**: values reaching untyped callback and loop parameters
//! - **property_access**: dotted chains through declared types and object literals
//! - **helpers**: string unquoting, expression unwrapping, text normalization

pub mod declarations;
pub mod helpers;
pub mod imports_exports;
pub mod iteration;
pub mod literals;
pub mod property_access;
pub mod scanner;

pub use declarations::{find_declaration, find_declaration_in, Declaration, DeclarationKind, Namespace};
pub use literals::extract_literal_values;
pub use property_access::resolve_property_access;
pub use scanner::scan_template_sites;
