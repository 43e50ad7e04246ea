//! Program model provider: loads Go compilation units with tree-sitter and
//! resolves identifier references into a symbol-usage table.

mod loader;
mod resolve;
mod symbols;

pub use loader::PackageLoader;
pub use symbols::{
    FunctionSymbol, PackageRef, Program, ResolvedSymbol, Scope, Signature, SourceLocation,
    SymbolUsage, TypeSymbol, ValueSymbol,
};
