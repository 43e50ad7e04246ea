use std::collections::{BTreeMap, BTreeSet};

use regex::Regex;

use crate::error::{MockerError, Result};

use super::aggregate::PackageBucket;

/// Aliases the generated mock surface always resolves against, beyond the
/// service packages themselves.
const WELL_KNOWN: &[(&str, &str)] = &[
    ("context", "context"),
    ("middleware", "github.com/aws/smithy-go/middleware"),
    ("awsmiddleware", "github.com/aws/aws-sdk-go-v2/aws/middleware"),
];

/// Canonicalizes rendered Go text and synthesizes its import block from
/// the package selectors actually referenced. Structural problems in the
/// rendered text are fatal; the engine surfaces the raw text at debug
/// verbosity before failing.
pub struct GoFormatter {
    selector: Regex,
}

impl GoFormatter {
    pub fn new() -> Result<Self> {
        let selector = Regex::new(r"([A-Za-z_][A-Za-z0-9_]*)\.")
            .map_err(|e| MockerError::Format(e.to_string()))?;
        Ok(Self { selector })
    }

    pub fn format(&self, rendered: &str, packages: &[PackageBucket]) -> Result<String> {
        let lines: Vec<&str> = rendered.lines().collect();
        let package_idx = lines
            .iter()
            .position(|l| l.trim_start().starts_with("package "))
            .ok_or_else(|| {
                MockerError::Format("generated text has no package clause".to_string())
            })?;

        check_balanced(rendered)?;

        let mut known: BTreeMap<&str, &str> = WELL_KNOWN.iter().cloned().collect();
        for pkg in packages {
            known.insert(pkg.short_name.as_str(), pkg.path.as_str());
        }

        let body = lines[package_idx + 1..].join("\n");
        let mut used: BTreeSet<&str> = BTreeSet::new();
        for caps in self.selector.captures_iter(&body) {
            let alias = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
            if let Some((key, _)) = known.get_key_value(alias) {
                used.insert(*key);
            }
        }

        let mut out: Vec<String> = Vec::new();
        for line in &lines[..=package_idx] {
            out.push(line.trim_end().to_string());
        }

        if !used.is_empty() {
            out.push(String::new());
            out.extend(import_block(&used, &known));
        }

        out.push(String::new());
        let mut blank_run = true;
        for line in &lines[package_idx + 1..] {
            let trimmed = line.trim_end();
            if trimmed.is_empty() {
                if !blank_run {
                    out.push(String::new());
                }
                blank_run = true;
            } else {
                out.push(trimmed.to_string());
                blank_run = false;
            }
        }
        while matches!(out.last(), Some(l) if l.is_empty()) {
            out.pop();
        }

        Ok(out.join("\n") + "\n")
    }
}

/// Import block in gofmt's grouping: standard library first, then the
/// rest, both sorted by path, aliased where the alias differs from the
/// path's last segment.
fn import_block(used: &BTreeSet<&str>, known: &BTreeMap<&str, &str>) -> Vec<String> {
    let mut stdlib: Vec<String> = Vec::new();
    let mut external: Vec<String> = Vec::new();

    let mut imports: Vec<(&str, &str)> = used
        .iter()
        .filter_map(|alias| known.get(alias).map(|path| (*alias, *path)))
        .collect();
    imports.sort_by_key(|(_, path)| *path);

    for (alias, path) in imports {
        let last_segment = path.rsplit('/').next().unwrap_or(path);
        let line = if alias == last_segment {
            format!("\t\"{}\"", path)
        } else {
            format!("\t{} \"{}\"", alias, path)
        };
        if path.contains('/') {
            external.push(line);
        } else {
            stdlib.push(line);
        }
    }

    let mut block = vec!["import (".to_string()];
    block.extend(stdlib.iter().cloned());
    if !stdlib.is_empty() && !external.is_empty() {
        block.push(String::new());
    }
    block.extend(external);
    block.push(")".to_string());
    block
}

fn check_balanced(text: &str) -> Result<()> {
    let mut depth: i64 = 0;
    for c in text.chars() {
        match c {
            '{' => depth += 1,
            '}' => depth -= 1,
            _ => {}
        }
        if depth < 0 {
            return Err(MockerError::Format(
                "generated text has unbalanced braces".to_string(),
            ));
        }
    }
    if depth != 0 {
        return Err(MockerError::Format(
            "generated text has unbalanced braces".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::aggregate::FuncSig;

    fn bucket() -> PackageBucket {
        PackageBucket {
            path: "github.com/aws/aws-sdk-go-v2/service/dynamodb".to_string(),
            short_name: "dynamodb".to_string(),
            signatures: vec![FuncSig {
                name: "ListTables".to_string(),
                return_type: "ListTablesOutput".to_string(),
            }],
        }
    }

    #[test]
    fn synthesizes_imports_for_referenced_packages() {
        let rendered = "// Code generated by aws-mocker. DO NOT EDIT.\npackage awsmocked\n\nfunc f(ctx context.Context) *dynamodb.ListTablesOutput {\n\tawsmiddleware.GetOperationName(ctx)\n\treturn nil\n}\n";
        let out = GoFormatter::new()
            .unwrap()
            .format(rendered, &[bucket()])
            .unwrap();

        assert!(out.contains("import ("));
        assert!(out.contains("\t\"context\""));
        assert!(out.contains("\t\"github.com/aws/aws-sdk-go-v2/service/dynamodb\""));
        assert!(out.contains("\tawsmiddleware \"github.com/aws/aws-sdk-go-v2/aws/middleware\""));
        // stdlib group comes first
        assert!(out.find("\"context\"").unwrap() < out.find("aws-sdk-go-v2").unwrap());
    }

    #[test]
    fn leaves_unreferenced_packages_out() {
        let rendered = "package awsmocked\n\nfunc f() {}\n";
        let out = GoFormatter::new()
            .unwrap()
            .format(rendered, &[bucket()])
            .unwrap();
        assert!(!out.contains("import"));
    }

    #[test]
    fn collapses_blank_runs_and_trailing_whitespace() {
        let rendered = "package awsmocked\n\n\n\nfunc f() {}   \n\n\n";
        let out = GoFormatter::new().unwrap().format(rendered, &[]).unwrap();
        assert_eq!(out, "package awsmocked\n\nfunc f() {}\n");
    }

    #[test]
    fn missing_package_clause_is_fatal() {
        let err = GoFormatter::new().unwrap().format("func f() {}\n", &[]);
        assert!(matches!(err, Err(MockerError::Format(_))));
    }

    #[test]
    fn unbalanced_braces_are_fatal() {
        let err = GoFormatter::new()
            .unwrap()
            .format("package awsmocked\n\nfunc f() {\n", &[]);
        assert!(matches!(err, Err(MockerError::Format(_))));
    }
}
