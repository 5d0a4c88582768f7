use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use gritbook::{ErrorKind, Options, TranslationError};

const TEST_SUFFIX: &str = ".test.xml";

#[derive(Debug, Deserialize)]
pub struct ExpectedWarning {
    /// Substring that must appear in the warning message.
    pub contains: String,

    /// If set, the warning must point at this 1-based line of the XML body.
    #[serde(default)]
    pub line: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TestConfig {
    /// Human-readable test description.
    #[serde(default)]
    pub description: Option<String>,

    /// Translate in strict mode.
    #[serde(default)]
    pub strict: bool,

    /// Thumbnail prefix override.
    #[serde(default)]
    pub thumbnail_prefix: Option<String>,

    /// Expected outline of the translated tree (trimmed comparison).
    #[serde(default)]
    pub expect_outline: Option<String>,

    /// Expected translation error: its Display string must contain this substring.
    #[serde(default)]
    pub expect_error: Option<String>,

    /// If true, the test expects the XML itself to be rejected.
    #[serde(default)]
    pub expect_load_error: bool,

    /// Expected warnings. If present (even empty), count and content are checked.
    #[serde(default)]
    pub expect_warnings: Option<Vec<ExpectedWarning>>,
}

/// Split a `.test.xml` file into its TOML frontmatter and XML body.
fn parse_test_file(content: &str) -> Result<(TestConfig, &str), String> {
    let content = content.trim_start_matches('\u{feff}');

    let after_open = content
        .strip_prefix("---")
        .ok_or("missing opening --- frontmatter delimiter")?;
    let after_open = after_open
        .strip_prefix('\n')
        .or_else(|| after_open.strip_prefix("\r\n"))
        .unwrap_or(after_open);

    let close_pos = after_open
        .find("\n---")
        .ok_or("missing closing --- frontmatter delimiter")?;

    let toml_str = after_open[..close_pos].trim_end_matches('\r');
    let rest = &after_open[close_pos + 4..];
    let body = rest
        .strip_prefix("\r\n")
        .or_else(|| rest.strip_prefix('\n'))
        .unwrap_or(rest);

    let config: TestConfig =
        toml::from_str(toml_str).map_err(|e| format!("TOML parse error: {}", e))?;

    Ok((config, body))
}

pub enum TestOutcome {
    Pass,
    Fail(String),
}

pub struct TestResult {
    pub path: PathBuf,
    pub description: Option<String>,
    pub outcome: TestOutcome,
}

impl TestResult {
    fn label(&self) -> String {
        match &self.description {
            Some(description) => description.clone(),
            None => self
                .path
                .file_name()
                .and_then(|s| s.to_str())
                .map(|s| s.trim_end_matches(TEST_SUFFIX).to_string())
                .unwrap_or_else(|| "?".to_string()),
        }
    }
}

fn run_single_test(path: &Path) -> TestResult {
    let (description, outcome) = match check_test_file(path) {
        Ok((description, None)) => (description, TestOutcome::Pass),
        Ok((description, Some(reason))) => (description, TestOutcome::Fail(reason)),
        Err(reason) => (None, TestOutcome::Fail(reason)),
    };
    TestResult {
        path: path.to_path_buf(),
        description,
        outcome,
    }
}

/// Run one golden file. `Ok((description, Some(reason)))` is a failed
/// expectation; `Err` means the file itself could not be used.
fn check_test_file(path: &Path) -> Result<(Option<String>, Option<String>), String> {
    let content =
        std::fs::read_to_string(path).map_err(|e| format!("cannot read file: {}", e))?;
    let (config, body) =
        parse_test_file(&content).map_err(|e| format!("frontmatter error: {}", e))?;
    let description = config.description.clone();

    let name = path.display().to_string();
    let root = match (gritbook::xml::parse_str(body, &name), config.expect_load_error) {
        (Err(_), true) => return Ok((description, None)),
        (Ok(_), true) => {
            let reason = "expected the XML to be rejected, but it loaded".to_string();
            return Ok((description, Some(reason)));
        }
        (Err(e), false) => return Ok((description, Some(format!("unexpected load error: {}", e)))),
        (Ok(root), false) => root,
    };

    let mut options = Options {
        base_dir: path
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from(".")),
        strict: config.strict,
        ..Options::default()
    };
    if let Some(prefix) = &config.thumbnail_prefix {
        options.thumbnail_prefix = prefix.clone();
    }

    let (document, warnings) = match (gritbook::translate(&root, &options), &config.expect_error) {
        (Err(error), Some(expected)) => {
            let actual = error.to_string();
            let reason = (!actual.contains(expected.as_str())).then(|| {
                format!("expected error containing \"{}\", got: {}", expected, actual)
            });
            return Ok((description, reason));
        }
        (Ok(_), Some(expected)) => {
            let reason = format!(
                "expected error containing \"{}\", but translation succeeded",
                expected
            );
            return Ok((description, Some(reason)));
        }
        (Err(error), None) => {
            return Ok((description, Some(format!("unexpected error: {}", error))));
        }
        (Ok(pair), None) => pair,
    };

    if let Some(expected) = &config.expect_outline {
        let actual = document.to_string();
        if actual.trim() != expected.trim() {
            let reason = format!(
                "outline mismatch\n  expected:\n{}\n  actual:\n{}",
                indent_block(expected.trim()),
                indent_block(actual.trim())
            );
            return Ok((description, Some(reason)));
        }
    }

    if let Some(expected) = &config.expect_warnings {
        if let Some(reason) = check_warnings(&warnings, expected) {
            return Ok((description, Some(reason)));
        }
    }

    Ok((description, None))
}

fn indent_block(text: &str) -> String {
    text.lines()
        .map(|line| format!("    {}", line))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Check that actual warnings match expectations. Returns `Some(reason)` on mismatch.
fn check_warnings(warnings: &[TranslationError], expected: &[ExpectedWarning]) -> Option<String> {
    let actual: Vec<&TranslationError> = warnings
        .iter()
        .filter(|w| w.kind == ErrorKind::UnknownTag)
        .collect();

    if actual.len() != expected.len() {
        let listed = if actual.is_empty() {
            "    (none)".to_string()
        } else {
            actual
                .iter()
                .map(|w| format!("  - {}", w))
                .collect::<Vec<_>>()
                .join("\n")
        };
        return Some(format!(
            "expected {} warning(s), got {}\n  actual warnings:\n{}",
            expected.len(),
            actual.len(),
            listed
        ));
    }

    for (i, (actual, expected)) in actual.iter().zip(expected).enumerate() {
        if !actual.message.contains(&expected.contains) {
            return Some(format!(
                "warning[{}]: expected message containing \"{}\", got: {}",
                i, expected.contains, actual
            ));
        }
        if let Some(line) = expected.line {
            if actual.line != line {
                return Some(format!(
                    "warning[{}]: expected on line {}, but it is on line {}",
                    i, line, actual.line
                ));
            }
        }
    }

    None
}

/// Discover `.test.xml` files grouped by category (subfolder relative to root).
/// Files directly in `root` get category "" (uncategorized).
fn discover_categorized(root: &Path) -> BTreeMap<String, Vec<PathBuf>> {
    let mut categories: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    collect_tests(root, root, &mut categories);
    for files in categories.values_mut() {
        files.sort();
    }
    categories
}

fn collect_tests(dir: &Path, root: &Path, out: &mut BTreeMap<String, Vec<PathBuf>>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_tests(&path, root, out);
        } else if path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(TEST_SUFFIX))
        {
            let category = path
                .parent()
                .and_then(|p| p.strip_prefix(root).ok())
                .map(|p| p.to_string_lossy().replace('\\', "/"))
                .unwrap_or_default();
            out.entry(category).or_default().push(path);
        }
    }
}

fn category_label(category: &str) -> &str {
    if category.is_empty() { "(root)" } else { category }
}

/// List available categories for the given test path.
pub fn list_categories(path: &Path) {
    if path.is_file() {
        eprintln!("(single file, no categories)");
        return;
    }

    let categories = discover_categorized(path);
    if categories.is_empty() {
        eprintln!("no {} files found in {}", TEST_SUFFIX, path.display());
        return;
    }

    eprintln!("available categories:");
    for (category, files) in &categories {
        eprintln!("  {} ({} tests)", category_label(category), files.len());
    }
}

struct Palette {
    no_color: bool,
}

impl Palette {
    fn paint(&self, text: &str, code: &str) -> String {
        if self.no_color {
            text.to_string()
        } else {
            format!("\x1b[{}m{}\x1b[0m", code, text)
        }
    }

    fn pass(&self) -> String {
        self.paint("PASS", "32")
    }

    fn fail(&self) -> String {
        self.paint("FAIL", "31")
    }

    fn bold(&self, text: &str) -> String {
        self.paint(text, "1")
    }
}

/// Pick the categories to run. Unknown requests are reported and skipped.
fn select_categories<'a>(
    all: &'a BTreeMap<String, Vec<PathBuf>>,
    requested: &[String],
) -> BTreeMap<&'a str, &'a Vec<PathBuf>> {
    if requested.is_empty() {
        return all.iter().map(|(k, v)| (k.as_str(), v)).collect();
    }

    let mut selected = BTreeMap::new();
    for request in requested {
        let request = request.trim_matches('/');
        let prefix = format!("{}/", request);
        let before = selected.len();
        for (category, files) in all {
            if category == request || category.starts_with(&prefix) {
                selected.insert(category.as_str(), files);
            }
        }
        if selected.len() == before {
            let available: Vec<&str> = all.keys().map(|k| category_label(k)).collect();
            eprintln!(
                "warning: category '{}' not found (available: {})",
                request,
                available.join(", ")
            );
        }
    }
    selected
}

/// Run all `.test.xml` files under `path` (or a single file).
/// If `categories` is non-empty, only run tests in those categories.
/// Returns exit code: 0 = all pass, 1 = any failure.
pub fn run_tests(path: &Path, no_color: bool, categories: &[String]) -> i32 {
    let palette = Palette { no_color };

    let groups: BTreeMap<String, Vec<PathBuf>> = if path.is_file() {
        BTreeMap::from([(String::new(), vec![path.to_path_buf()])])
    } else {
        discover_categorized(path)
    };
    if groups.is_empty() {
        eprintln!("no {} files found in {}", TEST_SUFFIX, path.display());
        return 1;
    }

    let selected = select_categories(&groups, categories);
    if selected.is_empty() {
        eprintln!("no matching categories found");
        return 1;
    }

    let mut passed = 0usize;
    let mut failures: Vec<TestResult> = Vec::new();

    for (category, files) in &selected {
        eprintln!();
        eprintln!("{}", palette.bold(category_label(category)));

        for file in files.iter() {
            let result = run_single_test(file);
            match &result.outcome {
                TestOutcome::Pass => {
                    passed += 1;
                    eprintln!("  {}  {}", palette.pass(), result.label());
                }
                TestOutcome::Fail(_) => {
                    eprintln!("  {}  {}", palette.fail(), result.label());
                    failures.push(result);
                }
            }
        }
    }

    if !failures.is_empty() {
        eprintln!();
        eprintln!("failures:");
        for failure in &failures {
            eprintln!();
            eprintln!("  --- {} ---", failure.path.display());
            if let TestOutcome::Fail(reason) = &failure.outcome {
                for line in reason.lines() {
                    eprintln!("  {}", line);
                }
            }
        }
    }

    eprintln!();
    let failed = failures.len();
    if failed == 0 {
        eprintln!("test result: {}. {} passed, 0 failed", palette.paint("ok", "32"), passed);
        0
    } else {
        eprintln!(
            "test result: {}. {} passed, {} failed (of {})",
            palette.paint("FAILED", "31"),
            passed,
            failed,
            passed + failed
        );
        1
    }
}
