//! Source analysis shared by the collectors
//!
//! One tree-sitter pass per file produces everything the collectors need:
//! a normalised token stream, code and comment line counts, per-function
//! cyclomatic complexity and Halstead counts. Results (including syntax
//! errors) are kept in an [`AnalysisCache`] owned by the source tree, so
//! every collector reads the same parse.

mod languages;

use crate::tree::Language;
use dashmap::DashMap;
use rustc_hash::FxHashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tree_sitter::{Node, Parser};

/// Placeholder that replaces string literals in the token stream.
pub const STRING_PLACEHOLDER: &str = "$STR";
/// Placeholder that replaces numeric literals in the token stream.
pub const NUMBER_PLACEHOLDER: &str = "$NUM";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyntaxError {
    #[error("failed to load {language} grammar: {message}")]
    Grammar {
        language: &'static str,
        message: String,
    },

    #[error("parser produced no tree")]
    NoTree,

    #[error("syntax error at line {line}")]
    Malformed { line: usize },
}

/// One normalised token. Lines are 1-based and inclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    pub start_line: usize,
    pub end_line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionInfo {
    pub name: String,
    pub line: usize,
    pub complexity: u32,
}

/// Halstead base counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Halstead {
    pub distinct_operators: usize,
    pub distinct_operands: usize,
    pub total_operators: usize,
    pub total_operands: usize,
}

impl Halstead {
    pub fn vocabulary(&self) -> usize {
        self.distinct_operators + self.distinct_operands
    }

    pub fn length(&self) -> usize {
        self.total_operators + self.total_operands
    }

    /// `N * log2(n)`, zero for an empty vocabulary.
    pub fn volume(&self) -> f64 {
        let n = self.vocabulary();
        if n == 0 {
            return 0.0;
        }
        self.length() as f64 * (n as f64).log2()
    }
}

/// Everything the collectors read from one file.
#[derive(Debug, Clone)]
pub struct SourceAnalysis {
    pub language: Language,
    pub total_lines: usize,
    /// Lines holding at least one code token.
    pub code_lines: usize,
    /// Lines holding only comments (or docstrings).
    pub comment_lines: usize,
    pub tokens: Vec<Token>,
    pub functions: Vec<FunctionInfo>,
    /// Decision points outside any function.
    pub module_complexity: u32,
    pub halstead: Halstead,
}

impl SourceAnalysis {
    /// Sum of function complexities plus top-level decisions.
    pub fn total_complexity(&self) -> u32 {
        self.functions.iter().map(|f| f.complexity).sum::<u32>() + self.module_complexity
    }

    /// Comment lines as a percentage of all non-blank lines.
    pub fn comment_percent(&self) -> f64 {
        let non_blank = self.code_lines + self.comment_lines;
        if non_blank == 0 {
            return 0.0;
        }
        self.comment_lines as f64 * 100.0 / non_blank as f64
    }
}

/// Thread-safe parse cache: path -> analysis or the syntax error it hit.
#[derive(Default)]
pub struct AnalysisCache {
    entries: DashMap<PathBuf, Result<Arc<SourceAnalysis>, SyntaxError>>,
}

impl AnalysisCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached analysis for `path`, parsing `source` on first use.
    pub fn get_or_analyze(
        &self,
        path: &Path,
        language: Language,
        source: &str,
    ) -> Result<Arc<SourceAnalysis>, SyntaxError> {
        if let Some(cached) = self.entries.get(path) {
            return cached.value().clone();
        }

        let result = analyze(language, source).map(Arc::new);
        self.entries.insert(path.to_path_buf(), result.clone());
        result
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Parse and analyse one file.
pub fn analyze(language: Language, source: &str) -> Result<SourceAnalysis, SyntaxError> {
    let mut parser = Parser::new();
    parser
        .set_language(&languages::grammar(language))
        .map_err(|e| SyntaxError::Grammar {
            language: language.name(),
            message: e.to_string(),
        })?;

    let tree = parser.parse(source, None).ok_or(SyntaxError::NoTree)?;
    let root = tree.root_node();
    if root.has_error() {
        let line = first_error_line(&root).unwrap_or(root.start_position().row + 1);
        return Err(SyntaxError::Malformed { line });
    }

    let total_lines = source.lines().count();
    let mut walker = Walker {
        profile: languages::profile(language),
        src: source.as_bytes(),
        code: vec![false; total_lines + 1],
        comment: vec![false; total_lines + 1],
        tokens: Vec::new(),
        functions: Vec::new(),
        module_complexity: 0,
        operators: FxHashSet::default(),
        operands: FxHashSet::default(),
        total_operators: 0,
        total_operands: 0,
    };
    walker.visit(root, None);

    let code_lines = walker.code.iter().filter(|&&c| c).count();
    let comment_lines = walker
        .code
        .iter()
        .zip(&walker.comment)
        .filter(|(&code, &comment)| comment && !code)
        .count();

    Ok(SourceAnalysis {
        language,
        total_lines,
        code_lines,
        comment_lines,
        halstead: Halstead {
            distinct_operators: walker.operators.len(),
            distinct_operands: walker.operands.len(),
            total_operators: walker.total_operators,
            total_operands: walker.total_operands,
        },
        tokens: walker.tokens,
        functions: walker.functions,
        module_complexity: walker.module_complexity,
    })
}

fn first_error_line(node: &Node) -> Option<usize> {
    if node.is_error() || node.is_missing() {
        return Some(node.start_position().row + 1);
    }
    for child in node.children(&mut node.walk()) {
        if child.has_error() {
            if let Some(line) = first_error_line(&child) {
                return Some(line);
            }
        }
    }
    None
}

struct Walker<'a> {
    profile: &'static languages::Profile,
    src: &'a [u8],
    code: Vec<bool>,
    comment: Vec<bool>,
    tokens: Vec<Token>,
    functions: Vec<FunctionInfo>,
    module_complexity: u32,
    operators: FxHashSet<&'a str>,
    operands: FxHashSet<&'a str>,
    total_operators: usize,
    total_operands: usize,
}

impl<'a> Walker<'a> {
    fn visit(&mut self, node: Node<'_>, current: Option<usize>) {
        let kind = node.kind();
        let p = self.profile;

        if p.comments.contains(&kind) {
            self.mark(&node, false);
            return;
        }

        if p.string_statements_are_comments && is_string_statement(&node) {
            self.mark(&node, false);
            return;
        }

        if p.strings.contains(&kind) {
            self.emit(&node, STRING_PLACEHOLDER, true);
            return;
        }
        if p.numbers.contains(&kind) {
            self.emit(&node, NUMBER_PLACEHOLDER, true);
            return;
        }

        let mut current = current;
        if node.is_named() && p.functions.contains(&kind) {
            self.functions.push(FunctionInfo {
                name: self.function_name(&node),
                line: node.start_position().row + 1,
                complexity: 1,
            });
            current = Some(self.functions.len() - 1);
        } else if node.is_named() {
            let decisions = decision_points(p, &node);
            if decisions > 0 {
                match current {
                    Some(i) => self.functions[i].complexity += decisions,
                    None => self.module_complexity += decisions,
                }
            }
        }

        if node.child_count() == 0 {
            if !node.is_missing() {
                if let Ok(text) = node.utf8_text(self.src) {
                    if !text.trim().is_empty() {
                        let operand = is_operand(p, kind);
                        self.emit(&node, text, operand);
                    }
                }
            }
            return;
        }

        for child in node.children(&mut node.walk()) {
            self.visit(child, current);
        }
    }

    fn emit(&mut self, node: &Node<'_>, normalised: &str, operand: bool) {
        let (start, end) = self.mark(node, true);
        if let Ok(raw) = node.utf8_text(self.src) {
            if operand {
                self.operands.insert(raw);
                self.total_operands += 1;
            } else {
                self.operators.insert(raw);
                self.total_operators += 1;
            }
        }
        self.tokens.push(Token {
            text: normalised.to_string(),
            start_line: start,
            end_line: end,
        });
    }

    /// Flag the node's lines as code or comment; returns 1-based lines.
    fn mark(&mut self, node: &Node<'_>, code: bool) -> (usize, usize) {
        let start = node.start_position().row;
        let mut end = node.end_position().row;
        // a node ending at column 0 finishes on the previous line
        if end > start && node.end_position().column == 0 {
            end -= 1;
        }
        let lines = if code {
            &mut self.code
        } else {
            &mut self.comment
        };
        for row in start..=end {
            if row < lines.len() {
                lines[row] = true;
            }
        }
        (start + 1, end + 1)
    }

    fn function_name(&self, node: &Node<'_>) -> String {
        let text = |n: Node<'_>| n.utf8_text(self.src).ok().map(str::to_string);

        if let Some(name) = node.child_by_field_name("name").and_then(text) {
            return name;
        }
        // `const f = () => ...`, `obj.f = function () {}`, `{ f: () => ... }`
        if let Some(parent) = node.parent() {
            let field = match parent.kind() {
                "variable_declarator" => Some("name"),
                "assignment_expression" => Some("left"),
                "pair" => Some("key"),
                "public_field_definition" | "field_definition" => Some("name"),
                _ => None,
            };
            if let Some(name) = field
                .and_then(|f| parent.child_by_field_name(f))
                .and_then(text)
            {
                return name;
            }
        }
        "<anonymous>".to_string()
    }
}

fn decision_points(p: &languages::Profile, node: &Node<'_>) -> u32 {
    let kind = node.kind();
    if p.decisions.contains(&kind) {
        return 1;
    }
    if kind == "binary_expression" {
        return node
            .children(&mut node.walk())
            .filter(|c| matches!(c.kind(), "&&" | "||"))
            .count() as u32;
    }
    0
}

fn is_operand(p: &languages::Profile, kind: &str) -> bool {
    kind.ends_with("identifier") || p.constants.contains(&kind)
}

/// `"""docstring"""` on a line of its own.
fn is_string_statement(node: &Node<'_>) -> bool {
    node.kind() == "expression_statement"
        && node.named_child_count() == 1
        && node
            .named_child(0)
            .map(|c| c.kind() == "string")
            .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_python_lines_and_docstrings() {
        let source = r#""""Module docstring."""

# a comment
def greet(name):
    """Say hello.

    Longer description.
    """
    return "hello " + name  # trailing


x = 1
"#;
        let a = analyze(Language::Python, source).unwrap();
        // def, return, x = 1
        assert_eq!(a.code_lines, 3);
        // module docstring, comment, 4-line docstring
        assert_eq!(a.comment_lines, 6);
        assert_eq!(a.functions.len(), 1);
        assert_eq!(a.functions[0].name, "greet");
        assert_eq!(a.functions[0].line, 4);
        assert_eq!(a.functions[0].complexity, 1);
    }

    #[test]
    fn test_python_complexity() {
        let source = r#"
def check(a, b, items):
    if a and b:
        return 1
    elif a or b:
        return 2
    for i in items:
        while i > 0:
            i -= 1
    try:
        pass
    except ValueError:
        pass
    return 3 if a else 4
"#;
        let a = analyze(Language::Python, source).unwrap();
        // 1 + if + and + elif + or + for + while + except + ternary
        assert_eq!(a.functions[0].complexity, 9);
    }

    #[test]
    fn test_nested_functions_measured_separately() {
        let source = r#"
def outer(x):
    def inner(y):
        if y:
            return 1
        return 2
    if x:
        return inner(x)
    return 0
"#;
        let a = analyze(Language::Python, source).unwrap();
        let outer = a.functions.iter().find(|f| f.name == "outer").unwrap();
        let inner = a.functions.iter().find(|f| f.name == "inner").unwrap();
        assert_eq!(outer.complexity, 2);
        assert_eq!(inner.complexity, 2);
        assert_eq!(a.total_complexity(), 4);
    }

    #[test]
    fn test_literals_are_folded() {
        let a = analyze(Language::Python, "x = 'abc'\ny = 42\n").unwrap();
        let texts: Vec<_> = a.tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["x", "=", STRING_PLACEHOLDER, "y", "=", NUMBER_PLACEHOLDER]);
        assert_eq!(a.tokens[3].start_line, 2);
    }

    #[test]
    fn test_javascript_functions() {
        let source = r#"
// helpers
function pick(a, b) {
  return a && b ? a : b;
}
const twice = (n) => {
  switch (n) {
    case 1: return 2;
    case 2: return 4;
    default: return n * 2;
  }
};
"#;
        let a = analyze(Language::JavaScript, source).unwrap();
        let pick = a.functions.iter().find(|f| f.name == "pick").unwrap();
        let twice = a.functions.iter().find(|f| f.name == "twice").unwrap();
        assert_eq!(pick.complexity, 3);
        assert_eq!(twice.complexity, 3);
        assert_eq!(a.comment_lines, 1);
    }

    #[test]
    fn test_rust_and_go() {
        let rust = r#"
/// Doc
fn classify(n: i32) -> &'static str {
    match n {
        0 => "zero",
        x if x < 0 => "negative",
        _ => "positive",
    }
}
"#;
        let a = analyze(Language::Rust, rust).unwrap();
        assert_eq!(a.functions[0].name, "classify");
        assert_eq!(a.functions[0].complexity, 4);

        let go = r#"
package main

func abs(x int) int {
	if x < 0 || x == -0 {
		return -x
	}
	return x
}
"#;
        let a = analyze(Language::Go, go).unwrap();
        assert_eq!(a.functions[0].name, "abs");
        assert_eq!(a.functions[0].complexity, 3);
    }

    #[test]
    fn test_malformed_source() {
        let err = analyze(Language::Python, "def broken(:\n    pass\n").unwrap_err();
        assert!(matches!(err, SyntaxError::Malformed { .. }));
    }

    #[test]
    fn test_halstead_volume() {
        let a = analyze(Language::Python, "x = y + 1\n").unwrap();
        // operands x, y, 1; operators =, +
        assert_eq!(a.halstead.distinct_operands, 3);
        assert_eq!(a.halstead.distinct_operators, 2);
        assert!((a.halstead.volume() - 5.0 * 5f64.log2()).abs() < 1e-9);
        assert_eq!(Halstead::default().volume(), 0.0);
    }

    #[test]
    fn test_cache_keeps_results_and_errors() {
        let cache = AnalysisCache::new();
        let path = Path::new("app.py");
        let first = cache
            .get_or_analyze(path, Language::Python, "def f():\n    return 1\n")
            .unwrap();
        // a cached path is not re-parsed, whatever the new source says
        let again = cache.get_or_analyze(path, Language::Python, "def g(:\n").unwrap();
        assert!(Arc::ptr_eq(&first, &again));

        let bad = Path::new("bad.py");
        assert!(cache.get_or_analyze(bad, Language::Python, "def g(:\n").is_err());
        assert!(cache.get_or_analyze(bad, Language::Python, "x = 1\n").is_err());
        assert_eq!(cache.len(), 2);
    }
}
