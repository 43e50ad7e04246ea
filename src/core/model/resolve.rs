use std::collections::HashMap;

use tree_sitter::Node;

use crate::error::Result;

use super::loader::{node_text, CompilationUnit, DependencyIndex, FuncDecl, PackageDecls};
use super::symbols::{
    FunctionSymbol, PackageRef, ResolvedSymbol, Scope, Signature, SourceLocation, SymbolUsage,
    TypeSymbol, ValueSymbol,
};

/// What a local variable is known to hold. Only the single pattern that
/// matters for client mocking is tracked: a variable bound to the result
/// of an imported constructor call.
#[derive(Debug, Clone)]
enum LocalType {
    /// A value of a defined type from an indexed package.
    Defined { pkg_path: String, type_name: String },
    /// A value of the predeclared `error` interface.
    ErrorInterface,
}

/// Walk one compilation unit and append every resolvable symbol usage,
/// mirroring a type checker's uses table. Emission order is whatever the
/// tree walk yields; the aggregator must not depend on it.
pub(super) fn collect_usages(
    unit: &CompilationUnit,
    own: &HashMap<String, PackageDecls>,
    deps: &mut DependencyIndex,
    usages: &mut Vec<SymbolUsage>,
) -> Result<()> {
    let mut locals: HashMap<String, LocalType> = HashMap::new();
    walk(unit, unit.tree.root_node(), own, deps, &mut locals, usages)
}

fn walk(
    unit: &CompilationUnit,
    node: Node,
    own: &HashMap<String, PackageDecls>,
    deps: &mut DependencyIndex,
    locals: &mut HashMap<String, LocalType>,
    usages: &mut Vec<SymbolUsage>,
) -> Result<()> {
    match node.kind() {
        "function_declaration" | "method_declaration" => {
            // Each declaration body is its own lexical scope; bindings must
            // not leak into sibling declarations. Function literals keep the
            // enclosing scope, the way closures capture.
            let mut scoped: HashMap<String, LocalType> = HashMap::new();
            let mut cursor = node.walk();
            for child in node.named_children(&mut cursor) {
                walk(unit, child, own, deps, &mut scoped, usages)?;
            }
            return Ok(());
        }
        "short_var_declaration" => {
            // Resolve the right-hand side first; the bindings it creates
            // only shadow later references.
            let mut cursor = node.walk();
            for child in node.named_children(&mut cursor) {
                walk(unit, child, own, deps, locals, usages)?;
            }
            record_locals(unit, node, deps, locals)?;
            return Ok(());
        }
        "selector_expression" => {
            resolve_selector(unit, node, deps, locals, usages)?;
            // Chained selectors still need their operand resolved.
            if let Some(operand) = node.child_by_field_name("operand") {
                if operand.kind() != "identifier" {
                    walk(unit, operand, own, deps, locals, usages)?;
                }
            }
            return Ok(());
        }
        "qualified_type" => {
            resolve_qualified_type(unit, node, deps, usages)?;
            return Ok(());
        }
        "call_expression" => {
            if let Some(function) = node.child_by_field_name("function") {
                if function.kind() == "identifier" {
                    resolve_plain_call(unit, function, own, usages);
                }
            }
        }
        _ => {}
    }

    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        walk(unit, child, own, deps, locals, usages)?;
    }
    Ok(())
}

/// `x := pkg.New(...)` binds `x` to the constructor's first result type;
/// multi-value forms bind each name to the matching result.
fn record_locals(
    unit: &CompilationUnit,
    node: Node,
    deps: &mut DependencyIndex,
    locals: &mut HashMap<String, LocalType>,
) -> Result<()> {
    let (Some(left), Some(right)) = (
        node.child_by_field_name("left"),
        node.child_by_field_name("right"),
    ) else {
        return Ok(());
    };

    let mut left_cursor = left.walk();
    let names: Vec<String> = left
        .named_children(&mut left_cursor)
        .filter(|n| n.kind() == "identifier")
        .map(|n| node_text(n, &unit.source).to_string())
        .collect();

    let mut right_cursor = right.walk();
    let values: Vec<Node> = right.named_children(&mut right_cursor).collect();

    if values.len() == 1 && names.len() > 1 {
        // Multi-value call: names take the call's results pairwise.
        if let Some(results) = call_result_types(unit, values[0], deps, locals)? {
            for (name, result) in names.iter().zip(results.iter()) {
                if let Some(local) = local_type_of(result) {
                    locals.insert(name.clone(), local);
                }
            }
        }
        return Ok(());
    }

    for (name, value) in names.iter().zip(values.iter()) {
        if let Some(results) = call_result_types(unit, *value, deps, locals)? {
            if let Some(first) = results.first() {
                if let Some(local) = local_type_of(first) {
                    locals.insert(name.clone(), local);
                }
            }
        }
    }
    Ok(())
}

/// Result types of a `pkg.Func(...)` or `recv.Method(...)` expression, if
/// the callee resolves against the dependency index.
fn call_result_types(
    unit: &CompilationUnit,
    node: Node,
    deps: &mut DependencyIndex,
    locals: &HashMap<String, LocalType>,
) -> Result<Option<Vec<String>>> {
    if node.kind() != "call_expression" {
        return Ok(None);
    }
    let Some(function) = node.child_by_field_name("function") else {
        return Ok(None);
    };
    if function.kind() != "selector_expression" {
        return Ok(None);
    }
    let (Some(operand), Some(field)) = (
        function.child_by_field_name("operand"),
        function.child_by_field_name("field"),
    ) else {
        return Ok(None);
    };
    if operand.kind() != "identifier" {
        return Ok(None);
    }

    let operand_name = node_text(operand, &unit.source);
    let field_name = node_text(field, &unit.source);

    // Locals shadow import aliases.
    if let Some(LocalType::Defined { pkg_path, type_name }) = locals.get(operand_name) {
        if let Some(decls) = deps.lookup(pkg_path)? {
            if let Some(method) = decls.methods.get(&(type_name.clone(), field_name.to_string())) {
                return Ok(Some(method.results.clone()));
            }
        }
        return Ok(None);
    }

    if let Some(import_path) = unit.imports.get(operand_name) {
        if let Some(decls) = deps.lookup(import_path)? {
            if let Some(func) = decls.funcs.get(field_name) {
                return Ok(Some(func.results.clone()));
            }
        }
    }
    Ok(None)
}

/// Strip pointer/slice qualifiers and split `path.Type` into a trackable
/// local type. Predeclared `error` is tracked so `err.Error()` resolves.
fn local_type_of(qualified: &str) -> Option<LocalType> {
    let bare = qualified.trim_start_matches(['*', '[', ']']);
    if bare == "error" {
        return Some(LocalType::ErrorInterface);
    }
    let (pkg_path, type_name) = bare.rsplit_once('.')?;
    Some(LocalType::Defined {
        pkg_path: pkg_path.to_string(),
        type_name: type_name.to_string(),
    })
}

fn resolve_selector(
    unit: &CompilationUnit,
    node: Node,
    deps: &mut DependencyIndex,
    locals: &HashMap<String, LocalType>,
    usages: &mut Vec<SymbolUsage>,
) -> Result<()> {
    let (Some(operand), Some(field)) = (
        node.child_by_field_name("operand"),
        node.child_by_field_name("field"),
    ) else {
        return Ok(());
    };
    if operand.kind() != "identifier" {
        return Ok(());
    }

    let operand_name = node_text(operand, &unit.source);
    let field_name = node_text(field, &unit.source);
    let location = location_of(unit, field);

    // Locals shadow import aliases, matching lexical scoping.
    if let Some(local) = locals.get(operand_name) {
        match local {
            LocalType::Defined { pkg_path, type_name } => {
                if let Some(decls) = deps.lookup(pkg_path)? {
                    if let Some(method) =
                        decls.methods.get(&(type_name.clone(), field_name.to_string()))
                    {
                        usages.push(SymbolUsage {
                            symbol: ResolvedSymbol::Function(FunctionSymbol {
                                name: field_name.to_string(),
                                package: Some(PackageRef {
                                    path: pkg_path.clone(),
                                    name: decls.name.clone(),
                                }),
                                // Unbound method declaration: no parent scope.
                                parent: None,
                                signature: Some(signature_of(method)),
                            }),
                            location,
                        });
                    }
                }
            }
            LocalType::ErrorInterface => {
                if field_name == "Error" {
                    // The error interface's method has no owning package.
                    usages.push(SymbolUsage {
                        symbol: ResolvedSymbol::Function(FunctionSymbol {
                            name: "Error".to_string(),
                            package: None,
                            parent: None,
                            signature: Some(Signature {
                                results: vec!["string".to_string()],
                            }),
                        }),
                        location,
                    });
                }
            }
        }
        return Ok(());
    }

    let Some(import_path) = unit.imports.get(operand_name) else {
        return Ok(());
    };
    let Some(decls) = deps.lookup(import_path)? else {
        return Ok(());
    };

    let package = Some(PackageRef {
        path: import_path.clone(),
        name: decls.name.clone(),
    });

    if let Some(func) = decls.funcs.get(field_name) {
        usages.push(SymbolUsage {
            symbol: ResolvedSymbol::Function(FunctionSymbol {
                name: field_name.to_string(),
                package,
                // Top-level function: declared in the package scope.
                parent: Some(Scope::Package),
                signature: Some(signature_of(func)),
            }),
            location,
        });
    } else if decls.types.contains(field_name) {
        usages.push(SymbolUsage {
            symbol: ResolvedSymbol::Type(TypeSymbol {
                name: field_name.to_string(),
                package,
            }),
            location,
        });
    } else {
        usages.push(SymbolUsage {
            symbol: ResolvedSymbol::Variable(ValueSymbol {
                name: field_name.to_string(),
                package,
            }),
            location,
        });
    }

    Ok(())
}

/// `pkg.Type` in type position (composite literals, declarations).
fn resolve_qualified_type(
    unit: &CompilationUnit,
    node: Node,
    deps: &mut DependencyIndex,
    usages: &mut Vec<SymbolUsage>,
) -> Result<()> {
    let (Some(package), Some(name)) = (
        node.child_by_field_name("package"),
        node.child_by_field_name("name"),
    ) else {
        return Ok(());
    };

    let alias = node_text(package, &unit.source);
    let Some(import_path) = unit.imports.get(alias) else {
        return Ok(());
    };
    let Some(decls) = deps.lookup(import_path)? else {
        return Ok(());
    };

    usages.push(SymbolUsage {
        symbol: ResolvedSymbol::Type(TypeSymbol {
            name: node_text(name, &unit.source).to_string(),
            package: Some(PackageRef {
                path: import_path.clone(),
                name: decls.name.clone(),
            }),
        }),
        location: location_of(unit, name),
    });
    Ok(())
}

/// A bare `helper()` call resolves against the unit's own package; Go
/// builtins are function-like but not function symbols.
fn resolve_plain_call(
    unit: &CompilationUnit,
    function: Node,
    own: &HashMap<String, PackageDecls>,
    usages: &mut Vec<SymbolUsage>,
) {
    let name = node_text(function, &unit.source);
    let location = location_of(unit, function);

    if is_builtin(name) {
        usages.push(SymbolUsage {
            symbol: ResolvedSymbol::Other,
            location,
        });
        return;
    }

    let Some(decls) = own.get(&unit.package_path) else {
        return;
    };
    if let Some(func) = decls.funcs.get(name) {
        usages.push(SymbolUsage {
            symbol: ResolvedSymbol::Function(FunctionSymbol {
                name: name.to_string(),
                package: Some(PackageRef {
                    path: unit.package_path.clone(),
                    name: decls.name.clone(),
                }),
                parent: Some(Scope::Package),
                signature: Some(signature_of(func)),
            }),
            location,
        });
    }
}

fn signature_of(decl: &FuncDecl) -> Signature {
    Signature {
        results: decl.results.clone(),
    }
}

fn location_of(unit: &CompilationUnit, node: Node) -> SourceLocation {
    SourceLocation {
        file: unit.path.clone(),
        line: node.start_position().row + 1,
    }
}

fn is_builtin(name: &str) -> bool {
    matches!(
        name,
        "append"
            | "cap"
            | "clear"
            | "close"
            | "complex"
            | "copy"
            | "delete"
            | "imag"
            | "len"
            | "make"
            | "max"
            | "min"
            | "new"
            | "panic"
            | "print"
            | "println"
            | "real"
            | "recover"
    )
}
