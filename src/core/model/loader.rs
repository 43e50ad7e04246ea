use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use ignore::WalkBuilder;
use tracing::debug;
use tree_sitter::{Node, Parser, Tree};

use crate::error::{MockerError, Result};

use super::resolve;
use super::symbols::Program;

/// Go's predeclared type identifiers; these render without a package
/// qualifier, the way a type checker prints them.
const PREDECLARED: &[&str] = &[
    "any", "bool", "byte", "complex64", "complex128", "error", "float32", "float64", "int",
    "int8", "int16", "int32", "int64", "rune", "string", "uint", "uint8", "uint16", "uint32",
    "uint64", "uintptr",
];

/// One parsed Go source file.
pub(super) struct CompilationUnit {
    pub path: PathBuf,
    pub package_path: String,
    pub source: String,
    pub tree: Tree,
    /// Import alias to import path.
    pub imports: HashMap<String, String>,
}

/// A top-level function or method declaration.
pub(super) struct FuncDecl {
    pub results: Vec<String>,
}

/// Declaration index for a single package.
#[derive(Default)]
pub(super) struct PackageDecls {
    pub name: String,
    pub funcs: HashMap<String, FuncDecl>,
    /// Keyed by (receiver type, method name).
    pub methods: HashMap<(String, String), FuncDecl>,
    pub types: HashSet<String>,
}

/// Loads the requested packages and resolves every symbol usage in them
/// into a [`Program`].
pub struct PackageLoader {
    parser: Parser,
}

impl PackageLoader {
    pub fn new() -> Result<Self> {
        Ok(Self {
            parser: new_go_parser()?,
        })
    }

    /// Load and resolve all compilation units matched by the comma
    /// separated pattern list, rooted at `base_dir`.
    ///
    /// Any unit carrying syntax errors is fatal; there is no partial
    /// loading.
    pub fn load(&mut self, base_dir: &Path, patterns: &str) -> Result<Program> {
        let module_path = read_module_path(base_dir);
        let files = resolve_patterns(base_dir, patterns)?;

        if files.is_empty() {
            return Err(MockerError::Load(format!(
                "no Go files matched '{}' under {}",
                patterns,
                base_dir.display()
            )));
        }

        let mut units = Vec::new();
        let mut diagnostics = Vec::new();

        for file in files {
            let source = fs::read_to_string(&file)
                .map_err(|e| MockerError::Load(format!("{}: {}", file.display(), e)))?;
            let tree = self
                .parser
                .parse(&source, None)
                .ok_or_else(|| MockerError::Load(format!("{}: parser failure", file.display())))?;

            if tree.root_node().has_error() {
                diagnostics.push(format!(
                    "{}:{}: syntax error",
                    file.display(),
                    first_error_line(tree.root_node())
                ));
                continue;
            }

            let package_path = unit_package_path(base_dir, &file, module_path.as_deref());
            let imports = collect_imports(tree.root_node(), &source);

            units.push(CompilationUnit {
                path: file,
                package_path,
                source,
                tree,
                imports,
            });
        }

        if !diagnostics.is_empty() {
            return Err(MockerError::SourceDiagnostic(diagnostics.join("; ")));
        }

        // Index the scanned packages' own top-level declarations so calls
        // to sibling functions resolve like any other.
        let mut own: HashMap<String, PackageDecls> = HashMap::new();
        for unit in &units {
            let root = unit.tree.root_node();
            let entry = own.entry(unit.package_path.clone()).or_default();
            if entry.name.is_empty() {
                entry.name = declared_package_name(root, &unit.source).unwrap_or_default();
            }
            index_declarations(root, &unit.source, &unit.package_path, &unit.imports, entry);
        }

        let mut deps = DependencyIndex::new(base_dir, module_path)?;
        let mut program = Program::default();
        for unit in &units {
            resolve::collect_usages(unit, &own, &mut deps, &mut program.usages)?;
        }

        debug!(
            "resolved {} symbol usages across {} compilation units",
            program.usages.len(),
            units.len()
        );

        Ok(program)
    }
}

/// Lazily loads imported packages' declarations from their on-disk
/// sources (`vendor/<import-path>/`, or the module's own tree).
pub(super) struct DependencyIndex {
    base_dir: PathBuf,
    module_path: Option<String>,
    parser: Parser,
    cache: HashMap<String, Option<Rc<PackageDecls>>>,
}

impl DependencyIndex {
    fn new(base_dir: &Path, module_path: Option<String>) -> Result<Self> {
        Ok(Self {
            base_dir: base_dir.to_path_buf(),
            module_path,
            parser: new_go_parser()?,
            cache: HashMap::new(),
        })
    }

    /// Declaration index for an imported package, or `None` when its
    /// sources are not on disk. References through unindexed packages
    /// resolve to nothing downstream.
    pub(super) fn lookup(&mut self, import_path: &str) -> Result<Option<Rc<PackageDecls>>> {
        if let Some(hit) = self.cache.get(import_path) {
            return Ok(hit.clone());
        }
        let loaded = self.load_package(import_path)?;
        self.cache.insert(import_path.to_string(), loaded.clone());
        Ok(loaded)
    }

    fn package_dir(&self, import_path: &str) -> Option<PathBuf> {
        let vendored = self.base_dir.join("vendor").join(import_path);
        if vendored.is_dir() {
            return Some(vendored);
        }
        if let Some(module) = &self.module_path {
            if let Some(rest) = import_path.strip_prefix(module.as_str()) {
                let rest = rest.trim_start_matches('/');
                let local = if rest.is_empty() {
                    self.base_dir.clone()
                } else {
                    self.base_dir.join(rest)
                };
                if local.is_dir() {
                    return Some(local);
                }
            }
        }
        None
    }

    fn load_package(&mut self, import_path: &str) -> Result<Option<Rc<PackageDecls>>> {
        let Some(dir) = self.package_dir(import_path) else {
            return Ok(None);
        };

        let mut decls = PackageDecls::default();

        let entries = fs::read_dir(&dir)
            .map_err(|e| MockerError::Load(format!("{}: {}", dir.display(), e)))?;
        for entry in entries {
            let entry = entry.map_err(|e| MockerError::Load(e.to_string()))?;
            let path = entry.path();
            if !path.is_file() || !is_go_source(&path) {
                continue;
            }

            let source = fs::read_to_string(&path)
                .map_err(|e| MockerError::Load(format!("{}: {}", path.display(), e)))?;
            let tree = self
                .parser
                .parse(&source, None)
                .ok_or_else(|| MockerError::Load(format!("{}: parser failure", path.display())))?;
            let root = tree.root_node();

            if root.has_error() {
                return Err(MockerError::SourceDiagnostic(format!(
                    "{}:{}: syntax error",
                    path.display(),
                    first_error_line(root)
                )));
            }

            if decls.name.is_empty() {
                decls.name = declared_package_name(root, &source).unwrap_or_default();
            }
            let imports = collect_imports(root, &source);
            index_declarations(root, &source, import_path, &imports, &mut decls);
        }

        if decls.name.is_empty() {
            decls.name = import_path.rsplit('/').next().unwrap_or(import_path).to_string();
        }

        debug!(
            "indexed package {} ({} funcs, {} methods)",
            import_path,
            decls.funcs.len(),
            decls.methods.len()
        );

        Ok(Some(Rc::new(decls)))
    }
}

fn new_go_parser() -> Result<Parser> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_go::LANGUAGE.into())
        .map_err(|e| MockerError::Load(format!("failed to set Go language: {}", e)))?;
    Ok(parser)
}

/// Resolve the comma separated pattern list into a set of Go source files.
/// A trailing `/...` walks recursively; plain patterns name one directory.
fn resolve_patterns(base_dir: &Path, patterns: &str) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for raw in patterns.split(',') {
        let pattern = raw.trim();
        if pattern.is_empty() {
            continue;
        }

        let (rel, recursive) = if pattern == "..." || pattern == "./..." {
            (String::new(), true)
        } else if let Some(prefix) = pattern.strip_suffix("/...") {
            (prefix.trim_start_matches("./").to_string(), true)
        } else {
            (pattern.trim_start_matches("./").to_string(), false)
        };

        let root = if rel.is_empty() {
            base_dir.to_path_buf()
        } else {
            base_dir.join(&rel)
        };
        if !root.is_dir() {
            return Err(MockerError::Load(format!(
                "pattern '{}' does not name a directory under {}",
                pattern,
                base_dir.display()
            )));
        }

        if recursive {
            let walker = WalkBuilder::new(&root).hidden(false).git_ignore(true).build();
            for entry in walker {
                let entry = entry.map_err(|e| MockerError::Load(e.to_string()))?;
                let path = entry.path();
                if path.is_file() && is_go_source(path) && !under_vendor(path) {
                    files.push(path.to_path_buf());
                }
            }
        } else {
            let entries = fs::read_dir(&root)
                .map_err(|e| MockerError::Load(format!("{}: {}", root.display(), e)))?;
            for entry in entries {
                let entry = entry.map_err(|e| MockerError::Load(e.to_string()))?;
                let path = entry.path();
                if path.is_file() && is_go_source(&path) {
                    files.push(path);
                }
            }
        }
    }

    files.sort();
    files.dedup();
    Ok(files)
}

fn is_go_source(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    name.ends_with(".go") && !name.ends_with("_test.go")
}

fn under_vendor(path: &Path) -> bool {
    path.components().any(|c| c.as_os_str() == "vendor")
}

/// The `module` line of go.mod, if present.
fn read_module_path(base_dir: &Path) -> Option<String> {
    let content = fs::read_to_string(base_dir.join("go.mod")).ok()?;
    content
        .lines()
        .find_map(|line| line.trim().strip_prefix("module "))
        .map(|m| m.trim().to_string())
}

/// Import path of the package a scanned file belongs to.
fn unit_package_path(base_dir: &Path, file: &Path, module_path: Option<&str>) -> String {
    let rel = file
        .parent()
        .and_then(|dir| dir.strip_prefix(base_dir).ok())
        .map(|dir| {
            dir.components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/")
        })
        .unwrap_or_default();

    match (module_path, rel.is_empty()) {
        (Some(module), true) => module.to_string(),
        (Some(module), false) => format!("{}/{}", module, rel),
        (None, true) => ".".to_string(),
        (None, false) => rel,
    }
}

pub(super) fn node_text<'a>(node: Node, source: &'a str) -> &'a str {
    &source[node.byte_range()]
}

fn declared_package_name(root: Node, source: &str) -> Option<String> {
    let mut cursor = root.walk();
    for child in root.named_children(&mut cursor) {
        if child.kind() == "package_clause" {
            return child.named_child(0).map(|n| node_text(n, source).to_string());
        }
    }
    None
}

fn collect_imports(root: Node, source: &str) -> HashMap<String, String> {
    let mut imports = HashMap::new();
    let mut cursor = root.walk();

    for child in root.named_children(&mut cursor) {
        if child.kind() != "import_declaration" {
            continue;
        }
        let mut decl_cursor = child.walk();
        for spec in child.named_children(&mut decl_cursor) {
            match spec.kind() {
                "import_spec" => record_import(spec, source, &mut imports),
                "import_spec_list" => {
                    let mut list_cursor = spec.walk();
                    for inner in spec.named_children(&mut list_cursor) {
                        if inner.kind() == "import_spec" {
                            record_import(inner, source, &mut imports);
                        }
                    }
                }
                _ => {}
            }
        }
    }

    imports
}

fn record_import(spec: Node, source: &str, imports: &mut HashMap<String, String>) {
    let Some(path_node) = spec.child_by_field_name("path") else {
        return;
    };
    let path = node_text(path_node, source).trim_matches('"').to_string();

    let alias = match spec.child_by_field_name("name") {
        // Dot and blank imports cannot be resolved through an alias.
        Some(name) => match node_text(name, source) {
            "_" | "." => return,
            n => n.to_string(),
        },
        None => path.rsplit('/').next().unwrap_or(path.as_str()).to_string(),
    };

    imports.insert(alias, path);
}

/// Index the top-level declarations of one compilation unit into `decls`.
fn index_declarations(
    root: Node,
    source: &str,
    pkg_path: &str,
    imports: &HashMap<String, String>,
    decls: &mut PackageDecls,
) {
    let mut cursor = root.walk();
    for child in root.named_children(&mut cursor) {
        match child.kind() {
            "function_declaration" => {
                if let Some(name) = child.child_by_field_name("name") {
                    decls.funcs.insert(
                        node_text(name, source).to_string(),
                        FuncDecl {
                            results: result_types(child, source, pkg_path, imports),
                        },
                    );
                }
            }
            "method_declaration" => {
                if let Some(name) = child.child_by_field_name("name") {
                    let receiver = receiver_type(child, source);
                    decls.methods.insert(
                        (receiver, node_text(name, source).to_string()),
                        FuncDecl {
                            results: result_types(child, source, pkg_path, imports),
                        },
                    );
                }
            }
            "type_declaration" => {
                let mut spec_cursor = child.walk();
                for spec in child.named_children(&mut spec_cursor) {
                    if matches!(spec.kind(), "type_spec" | "type_alias") {
                        if let Some(name) = spec.child_by_field_name("name") {
                            decls.types.insert(node_text(name, source).to_string());
                        }
                    }
                }
            }
            _ => {}
        }
    }
}

/// Bare name of a method's receiver type, pointer stripped.
fn receiver_type(decl: Node, source: &str) -> String {
    let Some(receiver) = decl.child_by_field_name("receiver") else {
        return String::new();
    };

    let mut cursor = receiver.walk();
    for param in receiver.named_children(&mut cursor) {
        if param.kind() != "parameter_declaration" {
            continue;
        }
        let Some(mut ty) = param.child_by_field_name("type") else {
            continue;
        };
        if ty.kind() == "pointer_type" {
            if let Some(inner) = ty.named_child(0) {
                ty = inner;
            }
        }
        // Generic receivers carry a type argument list; the identifier is
        // the first named child then.
        if ty.kind() == "generic_type" {
            if let Some(inner) = ty.named_child(0) {
                ty = inner;
            }
        }
        return node_text(ty, source).to_string();
    }
    String::new()
}

/// Declared result types of a function, as fully-qualified strings.
fn result_types(
    decl: Node,
    source: &str,
    pkg_path: &str,
    imports: &HashMap<String, String>,
) -> Vec<String> {
    let Some(result) = decl.child_by_field_name("result") else {
        return Vec::new();
    };

    if result.kind() == "parameter_list" {
        let mut out = Vec::new();
        let mut cursor = result.walk();
        for param in result.named_children(&mut cursor) {
            if param.kind() != "parameter_declaration" {
                continue;
            }
            if let Some(ty) = param.child_by_field_name("type") {
                out.push(type_string(ty, source, pkg_path, imports));
            }
        }
        out
    } else {
        vec![type_string(result, source, pkg_path, imports)]
    }
}

/// Render a type node the way a type checker would print it:
/// qualified names carry the full import path, predeclared names none.
fn type_string(
    node: Node,
    source: &str,
    pkg_path: &str,
    imports: &HashMap<String, String>,
) -> String {
    match node.kind() {
        "pointer_type" => match node.named_child(0) {
            Some(inner) => format!("*{}", type_string(inner, source, pkg_path, imports)),
            None => node_text(node, source).to_string(),
        },
        "qualified_type" => {
            let alias = node
                .child_by_field_name("package")
                .map(|n| node_text(n, source))
                .unwrap_or_default();
            let name = node
                .child_by_field_name("name")
                .map(|n| node_text(n, source))
                .unwrap_or_default();
            let path = imports
                .get(alias)
                .cloned()
                .unwrap_or_else(|| alias.to_string());
            format!("{}.{}", path, name)
        }
        "type_identifier" => {
            let text = node_text(node, source);
            if PREDECLARED.contains(&text) {
                text.to_string()
            } else {
                format!("{}.{}", pkg_path, text)
            }
        }
        "slice_type" => match node.child_by_field_name("element") {
            Some(element) => format!("[]{}", type_string(element, source, pkg_path, imports)),
            None => node_text(node, source).to_string(),
        },
        _ => node_text(node, source).to_string(),
    }
}

fn first_error_line(root: Node) -> usize {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_error() || node.is_missing() {
            return node.start_position().row + 1;
        }
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            stack.push(child);
        }
    }
    root.start_position().row + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_module(dir: &Path, files: &[(&str, &str)]) {
        for (rel, content) in files {
            let path = dir.join(rel);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, content).unwrap();
        }
    }

    #[test]
    fn broken_source_is_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        write_module(
            tmp.path(),
            &[
                ("go.mod", "module example.com/app\n"),
                ("main.go", "package main\n\nfunc main() {\n"),
            ],
        );

        let mut loader = PackageLoader::new().unwrap();
        let err = loader.load(tmp.path(), "./...").unwrap_err();
        assert!(matches!(err, MockerError::SourceDiagnostic(_)));
    }

    #[test]
    fn missing_pattern_directory_is_a_load_failure() {
        let tmp = tempfile::tempdir().unwrap();
        write_module(tmp.path(), &[("go.mod", "module example.com/app\n")]);

        let mut loader = PackageLoader::new().unwrap();
        let err = loader.load(tmp.path(), "./nope").unwrap_err();
        assert!(matches!(err, MockerError::Load(_)));
    }

    #[test]
    fn test_files_and_vendor_are_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        write_module(
            tmp.path(),
            &[
                ("go.mod", "module example.com/app\n"),
                ("main.go", "package main\n\nfunc main() {}\n"),
                ("main_test.go", "package main\n\nthis is not go\n"),
                ("vendor/some.io/pkg/broken.go", "also not go\n"),
            ],
        );

        let mut loader = PackageLoader::new().unwrap();
        let program = loader.load(tmp.path(), "./...").unwrap();
        // Nothing to resolve, but the broken test/vendor files never load.
        assert!(program.usages.is_empty());
    }

    #[test]
    fn bindings_do_not_leak_across_declarations() {
        use crate::core::model::ResolvedSymbol;

        let tmp = tempfile::tempdir().unwrap();
        write_module(
            tmp.path(),
            &[
                ("go.mod", "module example.com/app\n"),
                (
                    "main.go",
                    concat!(
                        "package main\n\n",
                        "import \"example.com/app/sub\"\n\n",
                        // Shadows the import alias inside one function only.
                        "func setup() {\n\tsub := sub.New()\n\t_ = sub\n}\n\n",
                        "func use() {\n\tsub.Other()\n}\n",
                    ),
                ),
                (
                    "sub/sub.go",
                    "package sub\n\ntype Client struct{}\n\nfunc New() *Client {\n\treturn &Client{}\n}\n\nfunc Other() {}\n",
                ),
            ],
        );

        let mut loader = PackageLoader::new().unwrap();
        let program = loader.load(tmp.path(), "./...").unwrap();

        // The second function's `sub` is the import alias again, so Other
        // must resolve as a package-level function.
        let other_resolved = program.usages.iter().any(|u| {
            matches!(
                &u.symbol,
                ResolvedSymbol::Function(f)
                    if f.name == "Other"
                        && f.package.as_ref().is_some_and(|p| p.path == "example.com/app/sub")
            )
        });
        assert!(other_resolved);
    }

    #[test]
    fn module_path_qualifies_scanned_units() {
        let tmp = tempfile::tempdir().unwrap();
        assert_eq!(
            unit_package_path(tmp.path(), &tmp.path().join("pkg/sub/x.go"), Some("example.com/app")),
            "example.com/app/pkg/sub"
        );
        assert_eq!(
            unit_package_path(tmp.path(), &tmp.path().join("x.go"), Some("example.com/app")),
            "example.com/app"
        );
    }
}
