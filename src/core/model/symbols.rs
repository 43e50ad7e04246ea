use std::path::PathBuf;

/// Identity of the package owning a symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageRef {
    /// Fully-qualified import path, unique across the program.
    pub path: String,

    /// Declared short identifier, used only for display.
    pub name: String,
}

/// Scope a function symbol is declared in.
///
/// Top-level functions carry their package scope. Unbound method
/// declarations have no parent scope at all, which is how a type checker
/// reports them; the extractor keys off that nullability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Package,
}

/// A resolved function signature: the declared result types, each rendered
/// as a fully-qualified type string (e.g. `*github.com/aws/aws-sdk-go-v2/service/dynamodb.ListTablesOutput`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub results: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct FunctionSymbol {
    pub name: String,

    /// Universe-scoped symbols (e.g. the `error` interface's `Error`
    /// method) resolve without an owning package.
    pub package: Option<PackageRef>,

    /// `None` marks an unbound method declaration; `Some(Scope::Package)`
    /// a top-level function.
    pub parent: Option<Scope>,

    /// `None` when the declaration site could not be resolved structurally.
    pub signature: Option<Signature>,
}

#[derive(Debug, Clone)]
pub struct ValueSymbol {
    pub name: String,
    pub package: Option<PackageRef>,
}

#[derive(Debug, Clone)]
pub struct TypeSymbol {
    pub name: String,
    pub package: Option<PackageRef>,
}

/// Discriminated union over resolved symbols. The extractor pattern-matches
/// on the variant instead of downcasting.
#[derive(Debug, Clone)]
pub enum ResolvedSymbol {
    Function(FunctionSymbol),
    Variable(ValueSymbol),
    Type(TypeSymbol),
    Other,
}

#[derive(Debug, Clone)]
pub struct SourceLocation {
    pub file: PathBuf,
    pub line: usize,
}

/// One identifier-to-symbol resolution from the scanned source.
#[derive(Debug, Clone)]
pub struct SymbolUsage {
    pub symbol: ResolvedSymbol,
    pub location: SourceLocation,
}

/// The provider's output: every resolved symbol usage across the loaded
/// compilation units. No ordering guarantee.
#[derive(Debug, Default)]
pub struct Program {
    pub usages: Vec<SymbolUsage>,
}
