use regex::Regex;
use tracing::debug;

use crate::error::{MockerError, Result};

use super::model::{Program, ResolvedSymbol};

/// One qualifying call site: a function of a filtered package together
/// with its extracted return type name. Transient; consumed by the
/// aggregator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolObservation {
    pub package_path: String,
    pub package_name: String,
    pub func_name: String,
    pub return_type: String,
}

/// Walks a program's symbol-usage table and emits an observation for every
/// unbound method declaration whose owning package matches the filter.
pub struct CallSiteExtractor {
    filter: Regex,
}

impl CallSiteExtractor {
    pub fn new(filter: Regex) -> Self {
        Self { filter }
    }

    /// Emission order follows the usage table and carries no guarantee.
    pub fn extract(&self, program: &Program) -> Result<Vec<SymbolObservation>> {
        let mut observations = Vec::new();

        for usage in &program.usages {
            let ResolvedSymbol::Function(func) = &usage.symbol else {
                continue;
            };

            // Universe-scoped symbols (e.g. (error).Error) have no owning
            // package; skip them, never fail.
            let Some(package) = &func.package else {
                continue;
            };

            if !self.filter.is_match(&package.path) {
                continue;
            }

            // Top-level functions carry their package scope; only unbound
            // method declarations qualify.
            if func.parent.is_some() {
                continue;
            }

            let signature = func.signature.as_ref().ok_or_else(|| {
                MockerError::StructuralMismatch(format!(
                    "failed to resolve signature of {}.{}",
                    package.path, func.name
                ))
            })?;
            let first = signature.results.first().ok_or_else(|| {
                MockerError::StructuralMismatch(format!(
                    "{}.{} has no return values",
                    package.path, func.name
                ))
            })?;

            let return_type = inner_type_name(first)?;

            debug!(
                func = %func.name,
                package = %package.name,
                path = %package.path,
                file = %usage.location.file.display(),
                line = usage.location.line,
                "accepted call site"
            );

            observations.push(SymbolObservation {
                package_path: package.path.clone(),
                package_name: package.name.clone(),
                func_name: func.name.clone(),
                return_type,
            });
        }

        Ok(observations)
    }
}

/// Project the simple type name out of a fully-qualified return type
/// string such as `*github.com/aws/aws-sdk-go-v2/service/dynamodb.ListTablesOutput`.
///
/// Assumes the import path is host-qualified with exactly one dot in the
/// host, so the string splits into exactly three dot-separated components
/// with the type name last (pointer/slice qualifiers ride along in the
/// first component). Any other shape means the package filter matched a
/// construct this tool does not understand.
pub fn inner_type_name(qualified: &str) -> Result<String> {
    let parts: Vec<&str> = qualified.split('.').collect();
    if parts.len() != 3 {
        return Err(MockerError::StructuralMismatch(format!(
            "return type '{}' is not shaped like host.tld/pkg/path.Type",
            qualified
        )));
    }
    Ok(parts[2].to_string())
}
