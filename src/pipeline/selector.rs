use std::collections::HashSet;

/// Well-known files, in priority order, that describe a project's purpose and setup.
/// Extend this table to teach the selector about new ecosystems.
pub const KEY_FILES: &[&str] = &[
    "README.md",
    "package.json",
    "tsconfig.json",
    "next.config.js",
    "next.config.mjs",
    "next.config.ts",
    "tailwind.config.ts",
    "src/app/page.tsx",
    "src/pages/index.js",
    "requirements.txt",
    "pyproject.toml",
    "pom.xml",
    "build.gradle",
    "src/main.py",
    "src/main.java",
    "main.go",
    "Cargo.toml",
    "composer.json",
    "Gemfile",
];

/// Entries of `KEY_FILES` present verbatim in `tree`, in `KEY_FILES` order
pub fn select_key_files(tree: &[String]) -> Vec<&'static str> {
    select_from(KEY_FILES, tree)
}

pub fn select_from(candidates: &[&'static str], tree: &[String]) -> Vec<&'static str> {
    let present: HashSet<&str> = tree.iter().map(String::as_str).collect();
    candidates
        .iter()
        .copied()
        .filter(|candidate| present.contains(candidate))
        .collect()
}
