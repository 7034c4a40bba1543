use std::fmt::Write;
use std::path::Path;

use super::content::FetchedFile;
use super::options::GenerationOptions;
use crate::models::repository::{RepositoryMetadata, RepositoryRef};

/// Only the first files are embedded, to keep the prompt within model limits
pub const MAX_PROMPT_FILES: usize = 10;

const NOT_PROVIDED: &str = "Not provided.";
const NOT_SPECIFIED: &str = "Not specified.";

const INSTRUCTIONS: &str = "\
**INSTRUCTIONS:**
1.  **Analyze the context:** Thoroughly examine the file structure and the contents of the key files to understand the project's purpose, technologies, dependencies, and architecture.
2.  **Installation Guide:** Use files like `package.json` or `requirements.txt` to provide accurate installation steps. Mention the exact commands to run (e.g., `npm install`).
3.  **Core Features:** Based on the code, README, and description, explain what the project does and its main features.
4.  **Usage Examples:** Create clear, practical code examples. If you see functions or components in the provided source code, show how to use them.
5.  **Structure and Formatting:** Format the output as clean, well-structured Markdown. Use headings, lists, and code blocks effectively. Start with relevant shields.io badges for license, language, etc., if information is available.
6.  **Fact-Based:** Base your documentation strictly on the provided context. Do not invent information. If a piece of information (like a license) is missing, state that it was not found.

Now, generate the complete Markdown documentation.";

/// Code fence label for a file: its extension, or nothing
fn fence_label(path: &str) -> &str {
    Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
}

fn or_fallback<'a>(value: Option<&'a str>, fallback: &'a str) -> &'a str {
    value.filter(|v| !v.trim().is_empty()).unwrap_or(fallback)
}

/// Assemble the repository documentation prompt.
///
/// Pure and deterministic: identical inputs give byte-identical output.
pub fn build_repository_prompt(
    repo: &RepositoryRef,
    metadata: &RepositoryMetadata,
    tree: &[String],
    files: &[FetchedFile],
    options: &GenerationOptions,
) -> String {
    let depth = options.depth().instruction();
    let sections = options.sections().join(", ");

    let mut file_contents = String::new();
    for file in files.iter().take(MAX_PROMPT_FILES) {
        // Writing into a String cannot fail
        let _ = write!(
            file_contents,
            "\n--- File: {} ---\n```{}\n{}\n```\n",
            file.path,
            fence_label(&file.path),
            file.content
        );
    }

    let mut prompt = String::with_capacity(4096 + file_contents.len());
    let _ = write!(
        prompt,
        "You are an expert technical writer. Your task is to generate high-quality, {depth} documentation for a GitHub repository based on the context provided below.

**Repository Information:**
- Full Name: {full_name}
- Description: {description}
- Primary Language: {language}
- Stars: {stars}
- Forks: {forks}
- License: {license}

**File & Directory Structure:**
This is a summary of the repository's file structure:
```
{tree}
```

**Key File Contents:**
I have retrieved the content of the following key files for your analysis:
{file_contents}
**YOUR TASK:**
Generate {depth} documentation for this repository. The user has requested the following sections: {sections}.

{instructions}",
        depth = depth,
        full_name = repo.full_name(),
        description = or_fallback(metadata.description.as_deref(), NOT_PROVIDED),
        language = or_fallback(metadata.language.as_deref(), NOT_SPECIFIED),
        stars = metadata.stars,
        forks = metadata.forks,
        license = or_fallback(metadata.license.as_deref(), NOT_SPECIFIED),
        tree = tree.join("\n"),
        file_contents = file_contents,
        sections = sections,
        instructions = INSTRUCTIONS,
    );
    prompt
}

/// Prompt for documenting a single pasted source file
pub fn build_code_prompt(code: &str, file_type: &str, file_name: Option<&str>) -> String {
    let location = file_name
        .filter(|name| !name.trim().is_empty())
        .map(|name| format!(" in the file {}", name))
        .unwrap_or_default();

    format!(
        "You're a professional technical writer and software engineer.

Generate detailed, production-grade documentation in **Markdown** for the following {file_type} code{location}. Follow these strict formatting rules:

---

## 1. Overview
- Start with a clear summary of what this file/module does.
- Explain its role within a typical project.

## 2. Exported Functions/Classes
For each export:
- **Name**
- **Description**
- **Parameters:** list in a Markdown table with name, type, and description
- **Return Value:** what it returns and when
- **Edge Cases:** any special scenarios it handles

## 3. Usage Example(s)
Provide at least one copy-paste-ready example wrapped in triple backticks.

## 4. Notes
- Include performance tips, limitations, or design decisions if relevant.

## 5. Visual Formatting
- Use **headings**, bullet points, and tables
- Syntax-highlighted code blocks

---

Code:
```{file_type}
{code}
```
"
    )
}
