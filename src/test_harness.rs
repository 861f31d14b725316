//! IPL Test Harness Library Module
//!
//! Provides reusable parser-conformance testing: a built-in corpus of named
//! source snippets with expected outcomes, plus file-driven discovery of
//! `*.good.ipl` (must parse) and `*.bad.ipl` (must fail) scripts under a
//! directory tree.
//!
//! # Public API
//!
//! - [`builtin_cases`] - The built-in corpus
//! - [`discover_script_files`] - Find all `*.good.ipl` / `*.bad.ipl` files
//! - [`run_all_tests`] - Complete suite execution with reporting
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use ipl::test_harness::{run_all_tests, TestConfig};
//!
//! let config = TestConfig::default();
//! let (_passed, failed) = run_all_tests(None, &config);
//! if failed > 0 {
//!     std::process::exit(1);
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::syntax::{Node, Outcome, Parser};

// =============================================================================
// CORE TYPES
// =============================================================================

/// One named source snippet with its expected parse outcome.
#[derive(Debug, Clone)]
pub struct TestCase {
    pub name: String,
    pub source: String,
    pub should_parse: bool,
}

impl TestCase {
    pub fn new(name: &str, source: &str, should_parse: bool) -> Self {
        TestCase {
            name: name.to_string(),
            source: source.to_string(),
            should_parse,
        }
    }
}

/// Represents the result of executing a single test case.
#[derive(Debug, Clone)]
pub enum TestResult {
    /// Test passed: the outcome matched the expectation.
    Pass { name: String },
    /// Test failed; `detail` describes how far a rejected parse got, or
    /// notes that a bad input parsed cleanly.
    Fail { name: String, detail: String },
}

/// Configuration for test execution and reporting.
pub struct TestConfig {
    pub use_colors: bool,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            use_colors: atty::is(atty::Stream::Stderr),
        }
    }
}

// Color constants for terminal output
const RESET: &str = "\x1b[0m";
const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";

impl TestConfig {
    /// Apply color formatting to text if colors are enabled.
    pub fn colorize(&self, text: &str, color: &str) -> String {
        if self.use_colors {
            format!("{}{}{}", color, text, RESET)
        } else {
            text.to_string()
        }
    }
}

// =============================================================================
// BUILT-IN CORPUS
// =============================================================================

/// The built-in conformance corpus: one entry per construct the grammar
/// accepts or rejects, from empty input through regex match declarations.
pub fn builtin_cases() -> Vec<TestCase> {
    let cases: &[(&str, &str, bool)] = &[
        ("nothing to parse", "", true),
        ("comment", "# this is a comment", true),
        ("bool #01", "true;", true),
        ("bool #02", "false;", true),
        ("integer #01", "0;", true),
        ("integer #02", "1234;", true),
        ("integer #03", "0x5;", true),
        ("integer #04", "0x1;", true),
        ("integer #05", "0x1a;", true),
        ("integer #06", "0xe8;", true),
        ("float #01", "123.;", true),
        ("float #02", ".234;", true),
        ("float #03", "0.3;", true),
        ("float #04", "4.0;", true),
        ("float #05", "5e6;", true),
        ("float #06", "6.e7;", true),
        ("float #07", ".7e8;", true),
        ("float #08", "8.1e9;", true),
        ("float #09", "8.2e-9;", true),
        ("float #10", "8.3e+9;", true),
        ("string #01", "\"\";", true),
        ("string #02", "\"foo\";", true),
        ("string #03", "\"\\\"foo\\\"\";", true),
        // multiple adjacent strings are allowed
        (
            "string #04",
            "\"multiple\" \" adjacent\" \" strings\";",
            true,
        ),
        ("identifier #01", "a;", true),
        ("identifier #02", "Avar;", true),
        ("identifier #03", "_avar;", true),
        ("identifier #04", "a_var;", true),
        ("identifier #05", "avar_;", true),
        ("identifier #06", "a1var_1;", true),
        ("identifier #07", "1var;", false),
        ("arithmetic", "a = (b % c + d / e) - x * -y;", true),
        ("boolean arithmetic", "a = ~x & (y << 1) | (z >> 2) ^ w;", true),
        ("boolean logic", "a = !(x < 1) && (x < 10) || (x == 12);", true),
        ("parentheses", "a = (1);", true),
        ("nested parentheses", "a = ((1));", true),
        // parentheses must contain something
        ("empty parentheses", "a = ();", false),
        // parentheses must match count
        ("too many closing parentheses", "a = ());", false),
        ("too many opening parentheses", "a = (();", false),
        ("group #01", "(1);", true),
        ("group #02", "(\"a literal string\");", true),
        ("group #03", "(someFunctionOrMethod(a, 1));", true),
        ("group #04", "(aVariable);", true),
        // cannot assign in a group
        ("group #05", "(a = b + c);", false),
        ("loop test #01", "loop {}", true),
        ("loop test #02", "loop post {}", true),
        ("loop test #03", "loop { break; }", true),
        ("loop test #04", "loop { continue; }", true),
        ("loop test #05", "loop { return; }", true),
        ("loop test #06", "loop (;;) {}", true),
        ("loop test #07", "loop (a += 1;;) {}", true),
        ("loop test #08", "loop (a += 1, b += 1;;) {}", true),
        (
            "loop test #09",
            "loop (a = b - 7 * 5, c = d + 1, x = 5;;) {}",
            true,
        ),
        (
            "loop test #10",
            "loop (int32 a = b, c = d + 1, x = 5;;) {}",
            true,
        ),
        (
            "loop test #11",
            "loop (SomeClass a = 1, b = 2, c = 3;;) {}",
            true,
        ),
        (
            "loop test #12",
            "loop (int32 a = 1, b = 2, c = 3; a < 10; a += 1, b += 1, c += 1) {}",
            true,
        ),
        (
            "loop test #13",
            "loop post (int32 a = 1; a < 10; a += 1) {}",
            true,
        ),
        ("vector test #01", "vector<sint32> foo1 = [];", true),
        ("vector test #02", "vector<sint32> foo2 = [ 5 ];", true),
        ("vector test #03", "vector<sint32> foo3 = [5,];", true),
        ("vector test #04", "vector<sint32> foo4 = [5,6];", true),
        ("vector test #05", "vector<sint32> foo2 = [2+7, asdf ];", true),
        (
            "vector test #06",
            "vector<vector<sint32>> foo2 = [[1], [2, 3]];",
            true,
        ),
        // parser does no type checking, so it will not fail on type
        // mismatch in assignment
        ("map test #01", "map<uint32, customType > bar = 1;", true),
        (
            "map test #02",
            "map<uint32, customType > bar = [ \"a\" : 1];",
            true,
        ),
        (
            "map test #03",
            "map< uint32, vector < customType>> bar = [];",
            true,
        ),
        (
            "map test #04",
            "map< uint32, vector < customType>> bar = [1:1];",
            true,
        ),
        (
            "map test #05",
            "map< uint32, vector < customType>> bar = [ 1 : 1, asdf : 5 + 7, ];",
            true,
        ),
        ("function test #01", "void aVoidFunc() {}", true),
        // parser does no type checking, so it will not fail on a missing
        // return statement
        ("function test #02", "uint32 aParameterlessFunc() {}", true),
        (
            "function test #03",
            "sint32 myfunc(uint32 foo, uint8 bar) {}",
            true,
        ),
        // curly braces required (i.e. no forward declarations allowed)
        ("function test #04", "void aVoidFunc()", false),
        ("function test #05", "void aVoidFunc();", false),
        // cannot declare access specifier for a function, only for a method
        ("function test #06", "public uint32 myFunc1() {}", false),
        ("method test #01", "myMethod1();", true),
        ("method test #02", "someInstance.myMethod1();", true),
        (
            "method test #03",
            "someInstance.someSubInstance.myMethod1();",
            true,
        ),
        // variable access specifier required
        ("class test #01", "class SomeClass { int x = 1; }", false),
        // method access specifier required
        ("class test #02", "class SomeClass { void someMethod() {} }", false),
        // method return type required
        (
            "class test #03",
            "class SomeClass { private someMethod() {} }",
            false,
        ),
        ("class test #04", "class SomeClass {}", true),
        (
            "class test #05",
            "class SomeChildClass : SomeParentClass {}",
            true,
        ),
        ("class test #06", "class SomeClass { private int x = 1; }", true),
        (
            "class test #07",
            "class SomeClass { private int x = 1, y = 2; }",
            true,
        ),
        ("class test #08", "class SomeClass { protected int x = 1; }", true),
        ("class test #09", "class SomeClass { public int x = 1; }", true),
        (
            "class test #10",
            "class SomeClass { private void someMethod() {} }",
            true,
        ),
        (
            "class test #11",
            "class SomeClass { protected void someMethod() {} }",
            true,
        ),
        (
            "class test #12",
            "class SomeClass { public void someMethod() {} }",
            true,
        ),
        (
            "class test #13",
            "class SomeClass { public int32 someMethod(int64 a, string b) {} }",
            true,
        ),
        // empty regex not allowed
        ("regex test #01", "//;", false),
        ("regex test #02", "/1/;", true),
        ("regex test #03", "/[ab]/;", true),
        ("regex test #04", "/[a-z]/;", true),
        ("regex test #05", "/[a-z]*/;", true),
        ("regex test #06", "/[a-z]+/;", true),
        ("regex test #07", "/[a-z]?/;", true),
        ("regex test #08", "/[a-z]+|[0-9]+/;", true),
        ("regex test #09", "/[_A-Za-z][0-9_A-Za-z]*/;", true),
        ("regex test #10", "/ab+(c|[de])*/;", true),
        // check for match
        (
            "regex test #11",
            "bool found =~ /[_A-Za-z][0-9_A-Za-z]*/;",
            true,
        ),
        // check for match and capture results
        (
            "regex test #12",
            "vector<string> matches =~ /x(([_A-Za-z])[0-9_A-Za-z]*)y/;",
            true,
        ),
    ];
    cases
        .iter()
        .map(|(name, source, should_parse)| TestCase::new(name, source, *should_parse))
        .collect()
}

// =============================================================================
// TEST DISCOVERY
// =============================================================================

/// Whether a file name carries one of the harness suffixes, and which
/// expectation it encodes. `None` for unrelated files.
pub fn expected_outcome(path: &Path) -> Option<bool> {
    let name = path.file_name()?.to_str()?;
    if name.ends_with(".good.ipl") {
        Some(true)
    } else if name.ends_with(".bad.ipl") {
        Some(false)
    } else {
        None
    }
}

/// Discovers all `*.good.ipl` / `*.bad.ipl` files recursively under the
/// given root, in sorted order for deterministic reporting.
pub fn discover_script_files<P: AsRef<Path>>(root: P) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && expected_outcome(e.path()).is_some())
        .map(|e| e.path().to_path_buf())
        .collect();
    files.sort();
    files
}

// =============================================================================
// TEST EXECUTION
// =============================================================================

/// Parses one snippet and compares the outcome against the expectation.
pub fn run_case(name: &str, source: &str, should_parse: bool) -> TestResult {
    let mut root = Node::root();
    let mut parser = Parser::new(source);
    let parsed = parser.parse(&mut root) == Outcome::Ok;
    if parsed == should_parse {
        return TestResult::Pass {
            name: name.to_string(),
        };
    }
    let detail = if should_parse {
        format!(
            "good input failed to parse; complete statements end at line {}, col {} \
             (position {} of {}); deepest attempt reached line {}, col {}",
            parser.line(),
            parser.column(),
            parser.pos(),
            parser.len(),
            parser.high_water().line,
            parser.high_water().column,
        )
    } else {
        "bad input parsed successfully".to_string()
    };
    TestResult::Fail {
        name: name.to_string(),
        detail,
    }
}

/// Runs the built-in corpus.
pub fn run_builtin_cases() -> Vec<TestResult> {
    builtin_cases()
        .iter()
        .map(|case| run_case(&case.name, &case.source, case.should_parse))
        .collect()
}

/// Runs every discovered script file under `root`. Unreadable files are
/// reported as failures rather than aborting the run.
pub fn run_directory<P: AsRef<Path>>(root: P) -> Vec<TestResult> {
    discover_script_files(root)
        .into_iter()
        .map(|path| {
            let name = path.display().to_string();
            let should_parse = expected_outcome(&path).unwrap_or(true);
            match fs::read_to_string(&path) {
                Ok(source) => run_case(&name, &source, should_parse),
                Err(e) => TestResult::Fail {
                    name,
                    detail: format!("could not read file: {}", e),
                },
            }
        })
        .collect()
}

// =============================================================================
// REPORTING AND OUTPUT
// =============================================================================

/// Partition test results into (passed, failed) counts.
pub fn partition_results(results: &[TestResult]) -> (usize, usize) {
    let passed = results
        .iter()
        .filter(|r| matches!(r, TestResult::Pass { .. }))
        .count();
    (passed, results.len() - passed)
}

/// Print per-case lines and a summary with colored PASS/FAIL markers.
pub fn report_results(results: &[TestResult], config: &TestConfig) {
    for r in results {
        match r {
            TestResult::Pass { name } => {
                println!("{}: {}", config.colorize("PASS", GREEN), name);
            }
            TestResult::Fail { name, detail } => {
                eprintln!("{}: {}", config.colorize("FAIL", RED), name);
                eprintln!("  {}", detail);
            }
        }
    }
    let (passed, failed) = partition_results(results);
    println!(
        "\nTest summary: total {}, {} {}, {} {}",
        results.len(),
        config.colorize("passed", GREEN),
        passed,
        config.colorize("failed", RED),
        failed,
    );
}

// =============================================================================
// PUBLIC API
// =============================================================================

/// Runs the built-in corpus, then any script files under `dir`, reporting
/// as it goes. Returns `(passed, failed)`.
pub fn run_all_tests(dir: Option<&Path>, config: &TestConfig) -> (usize, usize) {
    let mut results = run_builtin_cases();
    if let Some(dir) = dir {
        results.extend(run_directory(dir));
    }
    report_results(&results, config);
    partition_results(&results)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_corpus_is_green() {
        for result in run_builtin_cases() {
            if let TestResult::Fail { name, detail } = result {
                panic!("builtin case '{}' failed: {}", name, detail);
            }
        }
    }

    #[test]
    fn expected_outcome_follows_suffix() {
        assert_eq!(expected_outcome(Path::new("x/a.good.ipl")), Some(true));
        assert_eq!(expected_outcome(Path::new("x/a.bad.ipl")), Some(false));
        assert_eq!(expected_outcome(Path::new("x/a.ipl")), None);
        assert_eq!(expected_outcome(Path::new("x/a.rs")), None);
    }

    #[test]
    fn mismatch_is_reported_with_positions() {
        let result = run_case("bad", "int32 x = ;", true);
        let TestResult::Fail { detail, .. } = result else {
            panic!("expected failure");
        };
        assert!(detail.contains("line"));
    }
}
