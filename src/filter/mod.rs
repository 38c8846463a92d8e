//! Gitignore-style path filtering.
//!
//! A [`PatternSet`] is an ordered list of compiled patterns. Evaluation is
//! last-match-wins: a path is included when the last pattern that matches it
//! is positive. A negated pattern (`!pattern`) can only take back an inclusion
//! made by an earlier positive pattern; on its own it includes nothing.
//!
//! ```
//! use sourcepack::filter::PatternSet;
//!
//! let set = PatternSet::compile(["*.go", "!*_test.go"]);
//! assert!(set.matches("main.go"));
//! assert!(!set.matches("main_test.go"));
//! assert!(!set.matches("README.md"));
//! ```

mod translate;

use std::borrow::Cow;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors raised while loading patterns from disk.
#[derive(Debug, Error)]
pub enum FilterError {
    /// The pattern file could not be read.
    #[error("failed to read pattern file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// One compiled pattern line.
#[derive(Debug, Clone)]
pub struct Pattern {
    matcher: Regex,
    negated: bool,
    line_no: usize,
    text: String,
}

impl Pattern {
    /// Whether the pattern was written with a `!` prefix.
    pub fn is_negated(&self) -> bool {
        self.negated
    }

    /// 1-based position of the pattern in its source, counting skipped lines.
    pub fn line_no(&self) -> usize {
        self.line_no
    }

    /// The trimmed source text, including any `!` prefix.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Test a forward-slash relative path against this pattern alone,
    /// ignoring negation.
    pub fn is_match(&self, path: &str) -> bool {
        self.matcher.is_match(path)
    }

    fn negated_copy(&self) -> Pattern {
        let text = match self.text.strip_prefix('!') {
            Some(rest) => rest.to_string(),
            None => format!("!{}", self.text),
        };
        Pattern {
            matcher: self.matcher.clone(),
            negated: !self.negated,
            line_no: self.line_no,
            text,
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (line {})", self.text, self.line_no)
    }
}

/// Compile a single pattern line.
///
/// Returns `None` for blank lines, comments, a lone `!`, and patterns whose
/// regex fails to build. Skipping never fails the whole set.
pub fn compile_line(line: &str, line_no: usize) -> Option<Pattern> {
    let text = line.trim_end_matches('\r').trim();
    if text.is_empty() || text.starts_with('#') {
        return None;
    }

    let mut negated = false;
    let mut body = text;
    while let Some(rest) = body.strip_prefix('!') {
        negated = !negated;
        body = rest;
    }
    if body.is_empty() {
        debug!(line_no, pattern = text, "skipping empty negation");
        return None;
    }

    let source = translate::translate(body);
    match Regex::new(&source) {
        Ok(matcher) => Some(Pattern {
            matcher,
            negated,
            line_no,
            text: text.to_string(),
        }),
        Err(err) => {
            warn!(line_no, pattern = text, error = %err, "skipping pattern that does not compile");
            None
        }
    }
}

/// Outcome of evaluating a path, with the pattern that decided it.
#[derive(Debug, Clone, Copy)]
pub struct Verdict<'a> {
    pub included: bool,
    /// The last pattern that matched, or `None` if nothing matched.
    pub decisive: Option<&'a Pattern>,
}

/// An ordered, immutable collection of compiled patterns.
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    patterns: Vec<Pattern>,
}

impl PatternSet {
    /// An empty set. It matches nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile pattern lines in order. Line numbers start at 1.
    pub fn compile<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = lines
            .into_iter()
            .enumerate()
            .filter_map(|(idx, line)| compile_line(line.as_ref(), idx + 1))
            .collect();
        Self { patterns }
    }

    /// Read a pattern file and compile each line.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, FilterError> {
        Self::from_file_with_lines(path, std::iter::empty::<&str>())
    }

    /// Read a pattern file, then append extra lines after its contents.
    ///
    /// The file is split on line feeds, so a trailing newline yields a final
    /// empty line. Extra lines are numbered after it and take precedence over
    /// everything in the file. Bytes that are not valid UTF-8 are replaced.
    pub fn from_file_with_lines<I, S>(path: impl AsRef<Path>, extra: I) -> Result<Self, FilterError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|source| FilterError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let contents = String::from_utf8_lossy(&bytes);

        let file_lines = contents.split('\n').count();
        let patterns = contents
            .split('\n')
            .enumerate()
            .filter_map(|(idx, line)| compile_line(line, idx + 1))
            .chain(
                extra
                    .into_iter()
                    .enumerate()
                    .filter_map(|(idx, line)| compile_line(line.as_ref(), file_lines + idx + 1)),
            )
            .collect();

        let set = Self { patterns };
        debug!(path = %path.display(), patterns = set.len(), "loaded pattern file");
        Ok(set)
    }

    /// Whether the path is included under last-match-wins.
    pub fn matches(&self, path: &str) -> bool {
        self.explain(path).included
    }

    /// Evaluate the path and report which pattern decided it.
    pub fn explain(&self, path: &str) -> Verdict<'_> {
        let path = normalize_separators(path);
        let mut verdict = Verdict {
            included: false,
            decisive: None,
        };

        for pattern in &self.patterns {
            if !pattern.matcher.is_match(&path) {
                continue;
            }
            if pattern.negated {
                // A negation only takes back an earlier inclusion.
                if verdict.included {
                    verdict = Verdict {
                        included: false,
                        decisive: Some(pattern),
                    };
                }
            } else {
                verdict = Verdict {
                    included: true,
                    decisive: Some(pattern),
                };
            }
        }

        verdict
    }

    /// Combine with `other`, whose patterns come first and so lose ties.
    pub fn with_lower_precedence(self, other: PatternSet) -> Self {
        let mut patterns = other.patterns;
        patterns.extend(self.patterns);
        Self { patterns }
    }

    /// Combine with `other`, whose patterns come last and so win ties.
    pub fn with_higher_precedence(self, mut other: PatternSet) -> Self {
        let mut patterns = self.patterns;
        patterns.append(&mut other.patterns);
        Self { patterns }
    }

    /// Flip the negation of every pattern.
    ///
    /// This is how an ignore file becomes an exclusion list: `target/` turns
    /// into `!target/`, which then takes back inclusions made by earlier
    /// patterns once merged with higher precedence.
    pub fn negate_all(self) -> Self {
        let patterns = self.patterns.iter().map(Pattern::negated_copy).collect();
        Self { patterns }
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Pattern> {
        self.patterns.iter()
    }
}

impl<'a> IntoIterator for &'a PatternSet {
    type Item = &'a Pattern;
    type IntoIter = std::slice::Iter<'a, Pattern>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

fn normalize_separators(path: &str) -> Cow<'_, str> {
    if std::path::MAIN_SEPARATOR == '/' {
        Cow::Borrowed(path)
    } else {
        Cow::Owned(path.replace(std::path::MAIN_SEPARATOR, "/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn assert_cases(patterns: &[&str], cases: &[(&str, bool)]) {
        let set = PatternSet::compile(patterns);
        for (path, expected) in cases {
            assert_eq!(
                set.matches(path),
                *expected,
                "patterns {:?} on {:?}",
                patterns,
                path
            );
        }
    }

    #[test]
    fn test_double_asterisk() {
        assert_cases(
            &["**/test.txt", "src/**"],
            &[
                ("test.txt", true),
                ("a/test.txt", true),
                ("a/b/test.txt", true),
                ("src/any/number/of/subdirs", true),
                ("src/main.go", true),
                ("other/file.txt", false),
            ],
        );
    }

    #[test]
    fn test_root_anchored() {
        assert_cases(
            &["/root.txt"],
            &[
                ("root.txt", true),
                ("/root.txt", true),
                ("subdir/root.txt", false),
            ],
        );
    }

    #[test]
    fn test_question_mark() {
        assert_cases(
            &["test?.txt"],
            &[
                ("test1.txt", true),
                ("testa.txt", true),
                ("test.txt", false),
                ("test12.txt", false),
            ],
        );
    }

    #[test]
    fn test_complex_nesting_with_negation() {
        assert_cases(
            &["**/build/**", "!**/build/keep/**", "build/temp/"],
            &[
                ("build/output.txt", true),
                ("src/build/output.txt", true),
                ("build/keep/important.txt", false),
                ("src/build/keep/data.txt", false),
                ("build/temp/cache.txt", true),
            ],
        );
    }

    #[test]
    fn test_negation_excludes_matched_file() {
        assert_cases(
            &["*.txt", "!important.txt"],
            &[("important.txt", false), ("notes.txt", true)],
        );
    }

    #[test]
    fn test_reinclusion_after_negation() {
        assert_cases(
            &["*.txt", "!important.txt", "important.txt"],
            &[("important.txt", true), ("notes.txt", true)],
        );
    }

    #[test]
    fn test_go_files_excluding_vendor() {
        assert_cases(
            &["**/*.go", "!vendor/**"],
            &[
                ("main.go", true),
                ("pkg/util/strings.go", true),
                ("vendor/pkg/file.go", false),
                ("vendor/file.go", false),
                ("src/vendor/file.go", true),
            ],
        );
    }

    #[test]
    fn test_complex_nesting_with_vendor_negation() {
        assert_cases(
            &["src/**/*.go", "!src/vendor/**", "!**/*_test.go"],
            &[
                ("src/main.go", true),
                ("src/pkg/util/strings.go", true),
                ("src/vendor/lib/lib.go", false),
                ("src/pkg/util/strings_test.go", false),
                ("cmd/main.go", false),
            ],
        );
    }

    #[test]
    fn test_appended_pattern_wins() {
        let set = PatternSet::compile(["*.txt", "!important.txt"]);
        assert!(!set.matches("important.txt"));

        let set = set.with_higher_precedence(PatternSet::compile(["important.txt"]));
        assert!(set.matches("important.txt"));
        assert_eq!(
            set.explain("important.txt").decisive.map(Pattern::text),
            Some("important.txt")
        );

        let set = set.with_higher_precedence(PatternSet::compile(["!*.txt"]));
        assert!(!set.matches("important.txt"));
        assert!(!set.matches("notes.txt"));
    }

    #[test]
    fn test_whitespace_and_comments() {
        let set = PatternSet::compile([
            "  *.txt  ",
            "*.log\r",
            "# comment",
            "",
            "   ",
            "  # indented comment",
        ]);
        assert_eq!(set.len(), 2);
        assert!(set.matches("notes.txt"));
        assert!(set.matches("debug.log"));
        assert!(!set.matches("# comment"));
    }

    #[test]
    fn test_escaped_special_characters() {
        assert_cases(
            &[r"\#file.txt", r"\!important.txt"],
            &[
                ("#file.txt", true),
                ("!important.txt", true),
                ("file.txt", false),
                ("important.txt", false),
            ],
        );
    }

    #[test]
    fn test_directory_only_pattern() {
        assert_cases(
            &["logs/"],
            &[
                ("logs/debug.log", true),
                ("logs/2024/01/app.log", true),
                ("logs", false),
                ("logs.txt", false),
            ],
        );
    }

    #[test]
    fn test_directory_with_negated_subdirectory() {
        assert_cases(
            &["docs/", "!docs/internal/"],
            &[
                ("docs/readme.md", true),
                ("docs/api/index.md", true),
                ("docs/internal/secret.md", false),
                ("docs/internal/deep/notes.md", false),
            ],
        );
    }

    #[test]
    fn test_go_files_excluding_test_dirs() {
        assert_cases(
            &["/*/*.go", "!/**/test/"],
            &[
                ("cmd/main.go", true),
                ("pkg/util.go", true),
                ("main.go", false),
                ("cmd/sub/main.go", false),
                ("test/helper.go", false),
            ],
        );
    }

    #[test]
    fn test_nested_test_tree() {
        assert_cases(
            &["src/*/test/**/*.go"],
            &[
                ("src/pkg/test/unit/main_test.go", true),
                ("src/pkg/test/main_test.go", true),
                ("src/test/main_test.go", false),
                ("src/pkg/other/main.go", false),
            ],
        );
    }

    #[test]
    fn test_double_negation_ordering() {
        assert_cases(
            &["*.txt", "!important.txt", "!!important.txt"],
            &[
                ("notes.txt", true),
                ("important.txt", true),
            ],
        );
    }

    #[test]
    fn test_fixed_width_wildcards() {
        assert_cases(
            &["lib/????.go"],
            &[
                ("lib/main.go", true),
                ("lib/util.go", true),
                ("lib/helper.go", false),
                ("lib/a.go", false),
            ],
        );
    }

    #[test]
    fn test_default_filter_excludes_dotfiles() {
        assert_cases(
            &["*", "!.*"],
            &[
                ("main.go", true),
                ("src/main.go", true),
                (".gitignore", false),
                (".git/config", false),
            ],
        );
    }

    #[test]
    fn test_negation_alone_includes_nothing() {
        assert_cases(
            &["!**/.*"],
            &[(".hidden", false), ("visible.txt", false), ("a/.env", false)],
        );
    }

    #[test]
    fn test_later_positive_overrides_negation() {
        assert_cases(
            &["*.go", "!*_test.go", "keep_test.go"],
            &[
                ("main.go", true),
                ("main_test.go", false),
                ("keep_test.go", true),
            ],
        );
    }

    #[test]
    fn test_empty_set_matches_nothing() {
        let set = PatternSet::new();
        assert!(set.is_empty());
        assert!(!set.matches("anything"));
        assert!(!set.matches(""));
    }

    #[test]
    fn test_lone_negation_is_skipped() {
        let set = PatternSet::compile(["!", "!!", "*.rs"]);
        assert_eq!(set.len(), 1);
        assert_eq!(set.iter().next().map(Pattern::line_no), Some(3));
    }

    #[test]
    fn test_line_numbers_count_skipped_lines() {
        let set = PatternSet::compile(["# header", "", "*.go", "!vendor/"]);
        let lines: Vec<usize> = set.iter().map(Pattern::line_no).collect();
        assert_eq!(lines, vec![3, 4]);
    }

    #[test]
    fn test_pattern_accessors() {
        let pattern = compile_line("  !build/  ", 7).unwrap();
        assert!(pattern.is_negated());
        assert_eq!(pattern.line_no(), 7);
        assert_eq!(pattern.text(), "!build/");
        assert!(pattern.is_match("build/out.o"));
        assert_eq!(pattern.to_string(), "!build/ (line 7)");
    }

    #[test]
    fn test_compile_line_skips_blank_and_comment() {
        assert!(compile_line("", 1).is_none());
        assert!(compile_line("   \r", 1).is_none());
        assert!(compile_line("# note", 1).is_none());
        assert!(compile_line("!", 1).is_none());
    }

    #[test]
    fn test_explain_reports_decisive_negation() {
        let set = PatternSet::compile(["*.txt", "!test.txt"]);
        let verdict = set.explain("test.txt");
        assert!(!verdict.included);
        let decisive = verdict.decisive.unwrap();
        assert!(decisive.is_negated());
        assert_eq!(decisive.text(), "!test.txt");
        assert_eq!(decisive.line_no(), 2);
    }

    #[test]
    fn test_explain_reports_decisive_positive() {
        let set = PatternSet::compile(["*.txt", "!test.txt"]);
        let verdict = set.explain("other.txt");
        assert!(verdict.included);
        assert_eq!(verdict.decisive.map(Pattern::text), Some("*.txt"));
    }

    #[test]
    fn test_explain_without_match() {
        let set = PatternSet::compile(["*.txt"]);
        let verdict = set.explain("main.go");
        assert!(!verdict.included);
        assert!(verdict.decisive.is_none());
    }

    #[test]
    fn test_explain_ignores_unanchored_negation() {
        // A negation that matches with nothing to take back is not decisive.
        let set = PatternSet::compile(["!*.md"]);
        let verdict = set.explain("README.md");
        assert!(!verdict.included);
        assert!(verdict.decisive.is_none());
    }

    #[test]
    fn test_with_lower_precedence() {
        let cli = PatternSet::compile(["!*.txt"]);
        let base = PatternSet::compile(["*"]);
        let merged = cli.with_lower_precedence(base);

        assert_eq!(merged.len(), 2);
        assert!(!merged.matches("notes.txt"));
        assert!(merged.matches("main.go"));
    }

    #[test]
    fn test_with_higher_precedence() {
        let base = PatternSet::compile(["*"]);
        let overrides = PatternSet::compile(["!*.log"]);
        let merged = base.with_higher_precedence(overrides);

        assert_eq!(merged.len(), 2);
        assert!(!merged.matches("debug.log"));
        assert!(merged.matches("main.go"));
    }

    #[test]
    fn test_merge_order_matters() {
        let positive = || PatternSet::compile(["*.txt"]);
        let negative = || PatternSet::compile(["!a.txt"]);

        assert!(!positive().with_higher_precedence(negative()).matches("a.txt"));
        assert!(positive().with_lower_precedence(negative()).matches("a.txt"));
    }

    #[test]
    fn test_negate_all() {
        let set = PatternSet::compile(["target/", "!keep.log", "*.log"]).negate_all();
        let texts: Vec<&str> = set.iter().map(Pattern::text).collect();
        assert_eq!(texts, vec!["!target/", "keep.log", "!*.log"]);

        let flags: Vec<bool> = set.iter().map(Pattern::is_negated).collect();
        assert_eq!(flags, vec![true, false, true]);
    }

    #[test]
    fn test_negate_all_twice_restores_verdicts() {
        let original = PatternSet::compile(["*.go", "!vendor/"]);
        let restored = original.clone().negate_all().negate_all();
        for path in ["main.go", "vendor/lib.go", "README.md"] {
            assert_eq!(original.matches(path), restored.matches(path), "{path}");
        }
    }

    #[test]
    fn test_ignore_file_as_exclusions() {
        let ignore = PatternSet::compile(["target/", "*.log"]).negate_all();
        let set = PatternSet::compile(["*", "src/**"]).with_higher_precedence(ignore);

        assert!(set.matches("Cargo.toml"));
        assert!(set.matches("src/lib.rs"));
        assert!(!set.matches("target/debug/app"));
        assert!(!set.matches("app.log"));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# ignore build output").unwrap();
        writeln!(file, "build/").unwrap();
        writeln!(file, "!build/keep.txt").unwrap();

        let set = PatternSet::from_file(file.path()).unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.matches("build/out.o"));
        assert!(!set.matches("build/keep.txt"));
    }

    #[test]
    fn test_from_file_with_lines() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "*.txt").unwrap();

        let set = PatternSet::from_file_with_lines(file.path(), ["!secret.txt"]).unwrap();
        assert_eq!(set.len(), 2);
        // "*.txt\n" splits into two lines, the second one empty.
        assert_eq!(set.iter().last().map(Pattern::line_no), Some(3));
        assert!(set.matches("notes.txt"));
        assert!(!set.matches("secret.txt"));
    }

    #[test]
    fn test_from_file_without_trailing_newline() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "*.txt").unwrap();

        let set = PatternSet::from_file_with_lines(file.path(), ["!secret.txt"]).unwrap();
        assert_eq!(set.iter().last().map(Pattern::line_no), Some(2));
    }

    #[test]
    fn test_from_file_crlf() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"*.txt\r\n!keep.txt\r\n").unwrap();

        let set = PatternSet::from_file(file.path()).unwrap();
        let lines: Vec<usize> = set.iter().map(Pattern::line_no).collect();
        assert_eq!(lines, vec![1, 2]);
        assert!(set.matches("notes.txt"));
        assert!(!set.matches("keep.txt"));
    }

    #[test]
    fn test_from_file_invalid_utf8() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"caf\xe9.txt\n*.log\n").unwrap();

        let set = PatternSet::from_file(file.path()).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.iter().next().map(Pattern::text), Some("caf\u{fffd}.txt"));
        assert!(set.matches("debug.log"));
        assert!(!set.matches("cafe.txt"));
    }

    #[test]
    fn test_from_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.ignore");

        let err = PatternSet::from_file(&missing).unwrap_err();
        match err {
            FilterError::Read { path, .. } => assert_eq!(path, missing),
        }
    }

    #[test]
    fn test_pattern_set_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PatternSet>();
    }
}
