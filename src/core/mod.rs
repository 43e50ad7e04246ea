mod aggregate;
mod engine;
mod extract;
mod format;
mod naming;
mod render;
mod writer;

// Program model provider
mod model;

pub use aggregate::{Aggregator, FuncSig, PackageBucket};
pub use engine::{Engine, Options};
pub use extract::{inner_type_name, CallSiteExtractor, SymbolObservation};
pub use format::GoFormatter;
pub use model::{
    FunctionSymbol, PackageLoader, PackageRef, Program, ResolvedSymbol, Scope, Signature,
    SourceLocation, SymbolUsage,
};
pub use naming::{first_char_lower, lower_case_first, NamingResolver};
pub use render::{MockRenderer, TemplateData};
pub use writer::OutputSink;
