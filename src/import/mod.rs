//! Import resolution across ADL source files and JSON component files (C5):
//! caching, circular-import detection, and JSON-component adaptation into
//! `TypeDef`s.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use walkdir::WalkDir;

use crate::ast::{EnumDef, FieldDef, Primitive, Program, TypeBody, TypeDef, TypeExpr};
use crate::error::{Code, Diagnostic};
use crate::location::SourceLocation;

/// Declarations exposed by a resolved import: only enums and types.
/// Agent/workflow/policy declarations in an imported file are ignored.
#[derive(Debug, Clone, Default)]
pub struct ImportedUnit {
    pub enums: Vec<EnumDef>,
    pub types: Vec<TypeDef>,
}

pub struct ImportResolver {
    project_root: PathBuf,
    cache: HashMap<PathBuf, ImportedUnit>,
    in_progress: HashSet<PathBuf>,
}

impl ImportResolver {
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            cache: HashMap::new(),
            in_progress: HashSet::new(),
        }
    }

    /// Infers a project root by the default convention: two directories
    /// above `entry_file`. Prefer `discover_project_root`, which tries an
    /// `adl.toml` marker first and only falls back to this.
    pub fn infer_project_root(entry_file: &Path) -> PathBuf {
        entry_file
            .parent()
            .and_then(|p| p.parent())
            .and_then(|p| p.parent())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| entry_file.parent().unwrap_or(Path::new(".")).to_path_buf())
    }

    /// Walks upward from `entry_file`'s directory looking for an `adl.toml`
    /// marker file and reads its `root` key: a deterministic project root
    /// instead of the "two directories above by convention" default. Falls
    /// back to `infer_project_root` when no marker is found or it has no
    /// usable `root` key.
    pub fn discover_project_root(entry_file: &Path) -> PathBuf {
        let mut dir = entry_file.parent().map(Path::to_path_buf);
        while let Some(current) = dir {
            let marker = current.join("adl.toml");
            if marker.is_file() {
                if let Some(root) = read_adl_toml_root(&marker, &current) {
                    return root;
                }
                return current;
            }
            dir = current.parent().map(Path::to_path_buf);
        }
        Self::infer_project_root(entry_file)
    }

    pub fn resolve(
        &mut self,
        import_path: &str,
        current_file: &Path,
    ) -> Result<ImportedUnit, Diagnostic> {
        let resolved = self.locate(import_path, current_file)?;
        let canonical = fs::canonicalize(&resolved).unwrap_or(resolved.clone());

        if let Some(cached) = self.cache.get(&canonical) {
            return Ok(cached.clone());
        }
        if self.in_progress.contains(&canonical) {
            return Err(Diagnostic::new(
                Code::CircularImport,
                format!("circular import detected resolving `{}`", import_path),
                SourceLocation::dummy(),
            ));
        }
        self.in_progress.insert(canonical.clone());
        let unit = self.load(&canonical, import_path)?;
        self.in_progress.remove(&canonical);
        self.cache.insert(canonical, unit.clone());
        Ok(unit)
    }

    /// Lookup order: relative paths resolve against the importing file's
    /// directory; absolute (bare) paths resolve against the project root. A
    /// directory resolves to `index.adl`, then `index.json`, then the union
    /// of its `*.json` children; otherwise try the `.adl` then `.json`
    /// suffix.
    fn locate(&self, import_path: &str, current_file: &Path) -> Result<PathBuf, Diagnostic> {
        let base = if import_path.starts_with('.') {
            current_file
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("."))
        } else {
            self.project_root.clone()
        };
        let candidate = normalize_dots(import_path, &base);

        if candidate.is_dir() {
            let index_adl = candidate.join("index.adl");
            if index_adl.is_file() {
                return Ok(index_adl);
            }
            let index_json = candidate.join("index.json");
            if index_json.is_file() {
                return Ok(index_json);
            }
            if has_json_children(&candidate) {
                return Ok(candidate);
            }
            return Err(not_found(import_path));
        }
        let adl = with_suffix(&candidate, "adl");
        if adl.is_file() {
            return Ok(adl);
        }
        let json = with_suffix(&candidate, "json");
        if json.is_file() {
            return Ok(json);
        }
        Err(not_found(import_path))
    }

    fn load(&mut self, resolved: &Path, import_path: &str) -> Result<ImportedUnit, Diagnostic> {
        if resolved.is_dir() {
            return self.load_json_dir_union(resolved);
        }
        match resolved.extension().and_then(|e| e.to_str()) {
            Some("adl") => self.load_adl(resolved),
            Some("json") => {
                let type_def = load_json_component(resolved)?;
                Ok(ImportedUnit {
                    enums: Vec::new(),
                    types: vec![type_def],
                })
            }
            _ => Err(Diagnostic::new(
                Code::ParseError,
                format!("cannot determine import kind for `{}`", import_path),
                SourceLocation::dummy(),
            )),
        }
    }

    fn load_adl(&mut self, path: &Path) -> Result<ImportedUnit, Diagnostic> {
        let source = read_to_string(path)?;
        let program = crate::parser::parse(&source).map_err(|mut d| {
            d.location.file = Some(path.display().to_string());
            d
        })?;
        Ok(ImportedUnit {
            enums: program.enums().cloned().collect(),
            types: program.types().cloned().collect(),
        })
    }

    /// Unions every `*.json` file in a directory into one environment. Two
    /// files defining the same type name fail closed with `DUPLICATE_TYPE`
    /// rather than silently picking one (documented decision in DESIGN.md).
    fn load_json_dir_union(&mut self, dir: &Path) -> Result<ImportedUnit, Diagnostic> {
        let mut seen = HashSet::new();
        let mut types = Vec::new();
        let mut entries: Vec<_> = WalkDir::new(dir)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .map(|e| e.into_path())
            .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("json"))
            .collect();
        entries.sort();
        for entry in entries {
            let type_def = load_json_component(&entry)?;
            if !seen.insert(type_def.name.clone()) {
                return Err(Diagnostic::new(
                    Code::DuplicateType,
                    format!(
                        "type `{}` is defined by more than one JSON file in `{}`",
                        type_def.name,
                        dir.display()
                    ),
                    SourceLocation::dummy(),
                ));
            }
            types.push(type_def);
        }
        Ok(ImportedUnit {
            enums: Vec::new(),
            types,
        })
    }
}

/// Joins an import path onto `base`. `base` is already the right starting
/// point for both cases the caller distinguishes (the importing file's
/// parent directory for a relative path, the project root otherwise); this
/// function only has to turn the path's own `.`/`/` separators into path
/// components, with one extra `..` popping one directory above `base`.
fn normalize_dots(import_path: &str, base: &Path) -> PathBuf {
    let mut result = base.to_path_buf();
    let rest = if let Some(rest) = import_path.strip_prefix("..") {
        result.pop();
        rest
    } else if let Some(rest) = import_path.strip_prefix('.') {
        rest
    } else {
        import_path
    };
    let rest = rest.trim_start_matches(['/', '.']);
    for segment in rest.split(['/', '.']).filter(|s| !s.is_empty()) {
        result.push(segment);
    }
    result
}

/// Extracts a bare `root = "..."` key from an `adl.toml` marker. Deliberately
/// not a full TOML parse (this crate has no general use for a `toml`
/// dependency) — just the one key the project-root override needs, resolved
/// relative to the marker's own directory.
fn read_adl_toml_root(marker: &Path, marker_dir: &Path) -> Option<PathBuf> {
    let text = fs::read_to_string(marker).ok()?;
    for line in text.lines() {
        let line = line.trim();
        let Some(rest) = line.strip_prefix("root") else {
            continue;
        };
        let rest = rest.trim_start();
        let Some(rest) = rest.strip_prefix('=') else {
            continue;
        };
        let value = rest.trim().trim_matches('"');
        if value.is_empty() {
            continue;
        }
        return Some(marker_dir.join(value));
    }
    None
}

fn has_json_children(dir: &Path) -> bool {
    fs::read_dir(dir)
        .map(|mut it| {
            it.any(|e| {
                e.ok()
                    .map(|e| e.path().extension().and_then(|e| e.to_str()) == Some("json"))
                    .unwrap_or(false)
            })
        })
        .unwrap_or(false)
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut p = path.to_path_buf();
    match p.extension() {
        Some(_) => p,
        None => {
            p.set_extension(suffix);
            p
        }
    }
}

fn not_found(import_path: &str) -> Diagnostic {
    Diagnostic::new(
        Code::ParseError,
        format!("could not resolve import `{}`", import_path),
        SourceLocation::dummy(),
    )
}

fn io_err(path: &Path, e: &std::io::Error) -> Diagnostic {
    Diagnostic::new(
        Code::ParseError,
        format!("could not read `{}`: {}", path.display(), e),
        SourceLocation::dummy(),
    )
}

fn read_to_string(path: &Path) -> Result<String, Diagnostic> {
    fs::read_to_string(path).map_err(|e| io_err(path, &e))
}

/// Builds a `TypeDef` named after the file stem from a JSON component's
/// `properties`/`required` (or a bare `{"type":"object","properties":...}`
/// document).
fn load_json_component(path: &Path) -> Result<TypeDef, Diagnostic> {
    let text = read_to_string(path)?;
    let value: Value = serde_json::from_str(&text).map_err(|e| {
        Diagnostic::new(
            Code::ParseError,
            format!("invalid JSON in `{}`: {}", path.display(), e),
            SourceLocation::dummy(),
        )
    })?;
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("Component")
        .to_string();
    let properties = value.get("properties").and_then(Value::as_object);
    let required: HashSet<String> = value
        .get("required")
        .and_then(Value::as_array)
        .map(|arr| {
            arr.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    let mut fields = Vec::new();
    if let Some(props) = properties {
        for (field_name, schema) in props {
            let type_expr = json_schema_to_type_expr(schema);
            fields.push(FieldDef {
                name: field_name.clone(),
                optional: !required.contains(field_name),
                type_expr,
                location: SourceLocation::dummy(),
            });
        }
    }
    Ok(TypeDef {
        name,
        body: Some(TypeBody {
            fields,
            location: SourceLocation::dummy(),
        }),
        location: SourceLocation::dummy(),
    })
}

fn json_schema_to_type_expr(schema: &Value) -> TypeExpr {
    let loc = SourceLocation::dummy();
    match schema.get("type").and_then(Value::as_str) {
        Some("string") => {
            let format = schema.get("format").and_then(Value::as_str).map(str::to_string);
            let pattern = schema.get("pattern").and_then(Value::as_str).map(str::to_string);
            let base = TypeExpr::Primitive {
                kind: Primitive::String,
                location: loc.clone(),
            };
            if format.is_some() || pattern.is_some() {
                TypeExpr::Constrained {
                    base: Box::new(base),
                    min: None,
                    max: None,
                    format,
                    pattern,
                    location: loc,
                }
            } else {
                base
            }
        }
        Some("integer") => TypeExpr::Primitive {
            kind: Primitive::Integer,
            location: loc,
        },
        Some("number") => TypeExpr::Primitive {
            kind: Primitive::Number,
            location: loc,
        },
        Some("boolean") => TypeExpr::Primitive {
            kind: Primitive::Boolean,
            location: loc,
        },
        Some("object") => TypeExpr::Primitive {
            kind: Primitive::Object,
            location: loc,
        },
        Some("array") => {
            let element = schema
                .get("items")
                .map(json_schema_to_type_expr)
                .unwrap_or(TypeExpr::Primitive {
                    kind: Primitive::Any,
                    location: loc.clone(),
                });
            TypeExpr::Array {
                element: Box::new(element),
                location: loc,
            }
        }
        Some("null") => TypeExpr::Primitive {
            kind: Primitive::Null,
            location: loc,
        },
        _ => TypeExpr::Primitive {
            kind: Primitive::Any,
            location: loc,
        },
    }
}

/// Merges a program's direct imports into one environment: local
/// declarations always win silently; a name introduced by two *different*
/// imports is flagged against the second occurrence. Imports are processed
/// in source order.
pub fn merge_imports(
    program: &Program,
    resolver: &mut ImportResolver,
    entry_file: &Path,
) -> (ImportedUnit, Vec<Diagnostic>) {
    let mut merged = ImportedUnit::default();
    let mut diagnostics = Vec::new();
    let mut seen_enum_names: HashSet<String> = HashSet::new();
    let mut seen_type_names: HashSet<String> = HashSet::new();

    let local_enum_names: HashSet<&str> = program.enums().map(|e| e.name.as_str()).collect();
    let local_type_names: HashSet<&str> = program.types().map(|t| t.name.as_str()).collect();

    for import in &program.imports {
        match resolver.resolve(&import.path, entry_file) {
            Ok(unit) => {
                for e in unit.enums {
                    if local_enum_names.contains(e.name.as_str()) {
                        continue;
                    }
                    if !seen_enum_names.insert(e.name.clone()) {
                        diagnostics.push(Diagnostic::new(
                            Code::DuplicateEnum,
                            format!(
                                "enum `{}` is introduced by more than one import",
                                e.name
                            ),
                            import.location.clone(),
                        ));
                        continue;
                    }
                    merged.enums.push(e);
                }
                for t in unit.types {
                    if local_type_names.contains(t.name.as_str()) {
                        continue;
                    }
                    if !seen_type_names.insert(t.name.clone()) {
                        diagnostics.push(Diagnostic::new(
                            Code::DuplicateType,
                            format!(
                                "type `{}` is introduced by more than one import",
                                t.name
                            ),
                            import.location.clone(),
                        ));
                        continue;
                    }
                    merged.types.push(t);
                }
            }
            Err(mut d) => {
                if d.location == SourceLocation::dummy() {
                    d.location = import.location.clone();
                }
                diagnostics.push(d);
            }
        }
    }
    (merged, diagnostics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn resolves_sibling_adl_file() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("shared.adl"), "enum Color { red green }").unwrap();
        let entry = dir.path().join("main.adl");
        fs::write(&entry, "import .shared\nagent A { c: Color }").unwrap();
        let mut resolver = ImportResolver::new(dir.path());
        let unit = resolver.resolve("./shared", &entry).unwrap();
        assert_eq!(unit.enums.len(), 1);
        assert_eq!(unit.enums[0].name, "Color");
    }

    #[test]
    fn detects_circular_import() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a.adl");
        fs::write(&a, "enum A { x }").unwrap();
        let mut resolver = ImportResolver::new(dir.path());
        // Simulate entering `a.adl` mid-resolution (as `merge_imports` would
        // while walking its own import list) and then re-entering it before
        // that resolution completes.
        resolver
            .in_progress
            .insert(fs::canonicalize(&a).unwrap());
        let err = resolver.resolve("./a", &dir.path().join("main.adl"));
        assert_eq!(err.unwrap_err().code, Code::CircularImport);
    }

    #[test]
    fn json_directory_union_of_distinct_stems() {
        let dir = tempdir().unwrap();
        let comp_dir = dir.path().join("components");
        fs::create_dir(&comp_dir).unwrap();
        fs::write(comp_dir.join("widget.json"), r#"{"properties":{}}"#).unwrap();
        fs::write(comp_dir.join("widget2.json"), r#"{"properties":{}}"#).unwrap();
        let mut resolver = ImportResolver::new(dir.path());
        let entry = dir.path().join("main.adl");
        let unit = resolver.resolve("./components", &entry).unwrap();
        assert_eq!(unit.types.len(), 2);
    }

    #[test]
    fn discover_project_root_follows_adl_toml_marker() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("src").join("agents");
        fs::create_dir_all(&nested).unwrap();
        fs::write(dir.path().join("adl.toml"), "root = \"pkg\"\n").unwrap();
        fs::create_dir(dir.path().join("pkg")).unwrap();
        let entry = nested.join("main.adl");
        fs::write(&entry, "agent A { name: string }").unwrap();

        let root = ImportResolver::discover_project_root(&entry);
        assert_eq!(root, dir.path().join("pkg"));
    }

    #[test]
    fn discover_project_root_falls_back_without_marker() {
        let dir = tempdir().unwrap();
        let entry = dir.path().join("a").join("b").join("main.adl");
        fs::create_dir_all(entry.parent().unwrap()).unwrap();
        fs::write(&entry, "agent A { name: string }").unwrap();

        let root = ImportResolver::discover_project_root(&entry);
        assert_eq!(root, ImportResolver::infer_project_root(&entry));
    }
}
