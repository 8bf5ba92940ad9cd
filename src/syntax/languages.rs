//! Per-language node kinds.

use crate::tree::Language;

pub(crate) struct Profile {
    /// Nodes that start a separately measured function.
    pub functions: &'static [&'static str],
    /// Nodes that add one decision point each.
    pub decisions: &'static [&'static str],
    pub comments: &'static [&'static str],
    /// Literal nodes, folded to a placeholder and never descended into.
    pub strings: &'static [&'static str],
    pub numbers: &'static [&'static str],
    /// Leaf kinds counted as Halstead operands besides identifiers and literals.
    pub constants: &'static [&'static str],
    /// Bare string statements count as comments (docstrings).
    pub string_statements_are_comments: bool,
}

static PYTHON: Profile = Profile {
    functions: &["function_definition"],
    decisions: &[
        "if_statement",
        "elif_clause",
        "while_statement",
        "for_statement",
        "except_clause",
        "conditional_expression",
        "boolean_operator",
        "case_clause",
        "if_clause",
    ],
    comments: &["comment"],
    strings: &["string"],
    numbers: &["integer", "float"],
    constants: &["true", "false", "none"],
    string_statements_are_comments: true,
};

static JAVASCRIPT: Profile = Profile {
    functions: &[
        "function_declaration",
        "generator_function_declaration",
        "function_expression",
        "function",
        "generator_function",
        "arrow_function",
        "method_definition",
    ],
    decisions: &[
        "if_statement",
        "while_statement",
        "do_statement",
        "for_statement",
        "for_in_statement",
        "switch_case",
        "catch_clause",
        "ternary_expression",
    ],
    comments: &["comment", "html_comment"],
    strings: &["string", "template_string", "regex"],
    numbers: &["number"],
    constants: &["true", "false", "null", "undefined", "this", "super"],
    string_statements_are_comments: false,
};

static RUST: Profile = Profile {
    functions: &["function_item"],
    decisions: &[
        "if_expression",
        "while_expression",
        "for_expression",
        "loop_expression",
        "match_arm",
    ],
    comments: &["line_comment", "block_comment"],
    strings: &[
        "string_literal",
        "raw_string_literal",
        "char_literal",
    ],
    numbers: &["integer_literal", "float_literal"],
    constants: &["true", "false", "self", "crate", "super"],
    string_statements_are_comments: false,
};

static GO: Profile = Profile {
    functions: &["function_declaration", "method_declaration", "func_literal"],
    decisions: &[
        "if_statement",
        "for_statement",
        "expression_case",
        "type_case",
        "communication_case",
    ],
    comments: &["comment"],
    strings: &[
        "interpreted_string_literal",
        "raw_string_literal",
        "rune_literal",
    ],
    numbers: &["int_literal", "float_literal", "imaginary_literal"],
    constants: &["true", "false", "nil", "iota"],
    string_statements_are_comments: false,
};

pub(crate) fn profile(language: Language) -> &'static Profile {
    match language {
        Language::Python => &PYTHON,
        Language::JavaScript | Language::TypeScript | Language::Tsx => &JAVASCRIPT,
        Language::Rust => &RUST,
        Language::Go => &GO,
    }
}

pub(crate) fn grammar(language: Language) -> tree_sitter::Language {
    match language {
        Language::Python => tree_sitter_python::LANGUAGE.into(),
        Language::JavaScript => tree_sitter_javascript::LANGUAGE.into(),
        Language::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
        Language::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
        Language::Rust => tree_sitter_rust::LANGUAGE.into(),
        Language::Go => tree_sitter_go::LANGUAGE.into(),
    }
}
