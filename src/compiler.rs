//! The compiler driver: one test description in, one test unit out.
//!
//! A test description is a YAML document with a `name`, a `plan` to compile
//! against the schema, and optionally a `diags` list of global diagnostic
//! overrides. The driver strips the plan's markers, reverses the event list
//! into root-first order, serializes the stripped plan, resolves and parses
//! every annotation, and assembles the [`TestUnit`]. Embedded documents
//! become side files next to the unit.
//!
//! [`compile_suite`] compiles a whole directory of descriptions, skipping
//! up-to-date outputs and aggregating per-file failures instead of aborting
//! on the first one.

use crate::error::{Error, Result};
use crate::instruction::{parse_annotation, parse_diag_overrides, take};
use crate::resolve::resolve_path;
use crate::schema::{MessageNode, PlanSerializer};
use crate::strip::{strip_document, Event};
use crate::unit::TestUnit;
use serde::Serialize;
use serde_yaml::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use walkdir::WalkDir;

/// Everything produced by compiling one test description.
#[derive(Debug)]
pub struct CompiledTest {
    pub unit: TestUnit,
    /// The stripped plan, written beside the unit for debugging.
    pub plan: Value,
    /// Embedded documents to externalize, keyed by their assigned index.
    pub embeds: Vec<(usize, Value)>,
}

/// Compiles a test description document. Pure: all file writing is left to
/// [`compile_file`].
pub fn compile_document(
    document: Value,
    schema: Option<&dyn MessageNode>,
    serializer: &dyn PlanSerializer,
) -> Result<CompiledTest> {
    let mut root = match document {
        Value::Mapping(root) => root,
        _ => {
            return Err(Error::WrongType {
                context: "test description".to_string(),
                expected: "a mapping",
            })
        }
    };

    let name = match take(&mut root, "name") {
        Some(Value::String(name)) => name,
        _ => return Err(Error::MissingKey("name")),
    };
    let diag_overrides = take(&mut root, "diags")
        .map(parse_diag_overrides)
        .transpose()?
        .unwrap_or_default();
    let plan = match take(&mut root, "plan") {
        Some(plan @ Value::Mapping(_)) => plan,
        _ => return Err(Error::MissingKey("plan")),
    };
    if !root.is_empty() {
        let keys = root
            .keys()
            .map(|key| key.as_str().unwrap_or("?").to_string())
            .collect::<Vec<_>>()
            .join(", ");
        return Err(Error::UnknownKeys {
            context: "root".to_string(),
            keys,
        });
    }

    let (plan, mut events) = strip_document(plan)?;
    // Stripping emits post-order; the runner needs annotations resolved
    // root-first, so the combined event list is reversed wholesale.
    events.reverse();

    // Serialize before touching the annotations: the serializer sees the
    // whole plan shape and reports schema-level mistakes with far more
    // context than the path resolver can.
    let payload = serializer.serialize(&plan)?;

    let mut instructions = Vec::new();
    let mut embeds = Vec::new();
    for event in events {
        match event {
            Event::Annotation { path, payload } => {
                let canonical = resolve_path(&path, schema)?;
                instructions.extend(parse_annotation(payload, &canonical)?);
            }
            Event::Embed { index, document } => embeds.push((index, document)),
        }
    }

    Ok(CompiledTest {
        unit: TestUnit {
            name,
            plan: payload,
            diag_overrides,
            instructions,
        },
        plan,
        embeds,
    })
}

/// Compiles one test description file to its output unit, writing the unit,
/// a `<output>.plan.yaml` debug copy of the stripped plan, and one
/// `<output>.<N>.yaml` side file per embedded document. On failure all
/// generated outputs for this description are removed.
pub fn compile_file(
    input: &Path,
    output: &Path,
    schema: Option<&dyn MessageNode>,
    serializer: &dyn PlanSerializer,
) -> Result<()> {
    let result = compile_file_inner(input, output, schema, serializer);
    if result.is_err() {
        remove_outputs(output);
    }
    result
}

fn compile_file_inner(
    input: &Path,
    output: &Path,
    schema: Option<&dyn MessageNode>,
    serializer: &dyn PlanSerializer,
) -> Result<()> {
    let text = fs::read_to_string(input).map_err(|e| Error::FileRead {
        path: input.to_path_buf(),
        source: e,
    })?;
    let document: Value = serde_yaml::from_str(&text)?;
    let compiled = compile_document(document, schema, serializer)?;

    write_yaml(&side_path(output, "plan.yaml"), &compiled.plan)?;
    for (index, document) in &compiled.embeds {
        write_yaml(&side_path(output, &format!("{index}.yaml")), document)?;
    }
    let unit = serde_json::to_vec(&compiled.unit)?;
    fs::write(output, unit).map_err(|e| Error::FileWrite {
        path: output.to_path_buf(),
        source: e,
    })
}

fn side_path(output: &Path, suffix: &str) -> PathBuf {
    PathBuf::from(format!("{}.{}", output.display(), suffix))
}

fn write_yaml(path: &Path, value: &Value) -> Result<()> {
    let text = serde_yaml::to_string(value)?;
    fs::write(path, text).map_err(|e| Error::FileWrite {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Best-effort removal of everything a compilation may have written for
/// `output`: the unit itself plus its side files. Stale outputs from an
/// earlier run must not survive a failed recompile.
fn remove_outputs(output: &Path) {
    let _ = fs::remove_file(output);
    let Some(parent) = output.parent() else {
        return;
    };
    let Some(prefix) = output.file_name().map(|n| n.to_string_lossy().to_string()) else {
        return;
    };
    let Ok(entries) = fs::read_dir(parent) else {
        return;
    };
    for entry in entries.filter_map(|e| e.ok()) {
        let name = entry.file_name().to_string_lossy().to_string();
        if name.starts_with(&format!("{prefix}.")) && name.ends_with(".yaml") {
            let _ = fs::remove_file(entry.path());
        }
    }
}

/// One failed compilation within a batch.
#[derive(Debug, Serialize)]
pub struct BatchError {
    pub file: PathBuf,
    pub message: String,
}

/// Result of compiling a suite of test descriptions. Failures are collected
/// per input file; a failing description never blocks its siblings.
#[derive(Debug, Default, Serialize)]
pub struct BatchResult {
    pub compiled: usize,
    pub skipped: usize,
    pub errors: Vec<BatchError>,
}

impl BatchResult {
    /// True if every description compiled (or was up-to-date).
    pub fn passed(&self) -> bool {
        self.errors.is_empty()
    }
}

fn mtime(path: &Path) -> SystemTime {
    fs::metadata(path)
        .and_then(|meta| meta.modified())
        .unwrap_or(SystemTime::UNIX_EPOCH)
}

/// True for test description inputs: `*.yaml` files that are not themselves
/// generated side files.
fn is_description(name: &str) -> bool {
    name.ends_with(".yaml") && !name.contains(".test.")
}

/// Compiles every test description under `suite` to `<input>.test`.
/// Descriptions older than their existing output are skipped unless `force`
/// is set.
pub fn compile_suite(
    suite: &Path,
    schema: Option<&dyn MessageNode>,
    serializer: &dyn PlanSerializer,
    force: bool,
) -> BatchResult {
    let mut result = BatchResult::default();
    for entry in WalkDir::new(suite)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
    {
        let input = entry.path();
        let name = entry.file_name().to_string_lossy();
        if !is_description(&name) {
            continue;
        }
        let output = PathBuf::from(format!("{}.test", input.display()));
        if !force && mtime(input) < mtime(&output) {
            result.skipped += 1;
            continue;
        }
        match compile_file(input, &output, schema, serializer) {
            Ok(()) => result.compiled += 1,
            Err(e) => result.errors.push(BatchError {
                file: input.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }
    result
}

/// Removes all generated files (`*.test` units and their side files) under
/// the suite directory, returning how many were removed.
pub fn clean_suite(suite: &Path) -> Result<usize> {
    let mut removed = 0;
    for entry in WalkDir::new(suite)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
    {
        if entry.file_name().to_string_lossy().contains(".test") {
            fs::remove_file(entry.path())?;
            removed += 1;
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::PathElement;
    use crate::schema::{plan_schema, JsonPlanSerializer};
    use crate::unit::{Instruction, Severity};
    use std::io::Write;
    use tempfile::TempDir;

    fn yaml(text: &str) -> Value {
        serde_yaml::from_str(text).unwrap()
    }

    fn compile(text: &str) -> Result<CompiledTest> {
        let schema = plan_schema();
        compile_document(
            yaml(text),
            Some(&schema as &dyn MessageNode),
            &JsonPlanSerializer,
        )
    }

    #[test]
    fn test_end_to_end_level_instruction() {
        let compiled = compile(
            "name: t1\nplan:\n  version: {majorNumber: 1}\n  version.majorNumber__test: [{level: e}]",
        )
        .unwrap();
        assert_eq!(compiled.unit.name, "t1");
        assert_eq!(
            compiled.unit.instructions,
            vec![Instruction::Level {
                path: vec![
                    PathElement::Field {
                        field: "version".to_string()
                    },
                    PathElement::Field {
                        field: "major_number".to_string()
                    },
                ],
                allowed_severities: vec![Severity::Error],
            }]
        );
        assert_eq!(compiled.plan, yaml("version: {majorNumber: 1}"));
        assert_eq!(
            compiled.unit.plan,
            br#"{"version":{"majorNumber":1}}"#.to_vec()
        );
    }

    #[test]
    fn test_end_to_end_diag_glob() {
        let compiled = compile(
            "name: t2\nplan:\n  __test: [{diag: {code: 1001, msg: 'no ** rule'}}]",
        )
        .unwrap();
        match &compiled.unit.instructions[0] {
            Instruction::Diag { code, msg, .. } => {
                assert_eq!(*code, Some(1001));
                assert_eq!(msg.as_deref(), Some("no [*]"));
            }
            other => panic!("unexpected instruction {other:?}"),
        }
    }

    #[test]
    fn test_instructions_are_root_first() {
        let compiled = compile(
            "name: t3\nplan:\n  __test: [{level: e}]\n  version:\n    __test: [{level: w}]",
        )
        .unwrap();
        let depths: Vec<usize> = compiled
            .unit
            .instructions
            .iter()
            .map(|insn| match insn {
                Instruction::Level { path, .. } => path.len(),
                other => panic!("unexpected instruction {other:?}"),
            })
            .collect();
        assert_eq!(depths, vec![0, 1]);
    }

    #[test]
    fn test_diag_overrides_key() {
        let compiled =
            compile("name: t4\ndiags: [{code: 1, max: w}]\nplan: {}").unwrap();
        assert_eq!(compiled.unit.diag_overrides.len(), 1);
        assert_eq!(compiled.unit.diag_overrides[0].max, Severity::Warning);
    }

    #[test]
    fn test_missing_name_is_structural_error() {
        assert!(matches!(
            compile("plan: {}"),
            Err(Error::MissingKey("name"))
        ));
        assert!(matches!(
            compile("name: 3\nplan: {}"),
            Err(Error::MissingKey("name"))
        ));
    }

    #[test]
    fn test_unknown_root_key() {
        assert!(matches!(
            compile("name: t\nplan: {}\nextra: 1"),
            Err(Error::UnknownKeys { context, keys }) if context == "root" && keys == "extra"
        ));
    }

    #[test]
    fn test_compile_file_writes_unit_and_side_files() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("case.yaml");
        let output = dir.path().join("case.yaml.test");
        let mut file = fs::File::create(&input).unwrap();
        writeln!(
            file,
            "name: t5\nplan:\n  version: {{majorNumber: 1}}\n  ext__yaml: {{a: 1}}"
        )
        .unwrap();

        compile_file(&input, &output, None, &JsonPlanSerializer).unwrap();

        let unit: TestUnit =
            serde_json::from_slice(&fs::read(&output).unwrap()).unwrap();
        assert_eq!(unit.name, "t5");
        let embed = fs::read_to_string(dir.path().join("case.yaml.test.0.yaml")).unwrap();
        assert_eq!(yaml(&embed), yaml("a: 1"));
        let debug_plan =
            fs::read_to_string(dir.path().join("case.yaml.test.plan.yaml")).unwrap();
        assert_eq!(
            yaml(&debug_plan),
            yaml("version: {majorNumber: 1}\next: 'test:0.yaml'")
        );
    }

    #[test]
    fn test_failed_compile_removes_stale_outputs() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("case.yaml");
        let output = dir.path().join("case.yaml.test");
        fs::write(&input, "plan: {}").unwrap();
        fs::write(&output, "stale").unwrap();

        assert!(compile_file(&input, &output, None, &JsonPlanSerializer).is_err());
        assert!(!output.exists());
    }

    #[test]
    fn test_suite_aggregates_failures() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("good.yaml"), "name: g\nplan: {}").unwrap();
        fs::write(dir.path().join("bad.yaml"), "plan: {}").unwrap();

        let result = compile_suite(dir.path(), None, &JsonPlanSerializer, false);
        assert_eq!(result.compiled, 1);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].file.ends_with("bad.yaml"));
        assert!(dir.path().join("good.yaml.test").exists());
        assert!(!dir.path().join("bad.yaml.test").exists());
        assert!(!result.passed());
    }

    #[test]
    fn test_suite_skips_generated_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("case.test.0.yaml"), "not a description").unwrap();

        let result = compile_suite(dir.path(), None, &JsonPlanSerializer, false);
        assert_eq!(result.compiled, 0);
        assert!(result.passed());
    }

    #[test]
    fn test_clean_removes_generated_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("case.yaml"), "name: c\nplan: {}").unwrap();
        let result = compile_suite(dir.path(), None, &JsonPlanSerializer, false);
        assert!(result.passed());

        let removed = clean_suite(dir.path()).unwrap();
        assert_eq!(removed, 2);
        assert!(dir.path().join("case.yaml").exists());
        assert!(!dir.path().join("case.yaml.test").exists());
    }
}
