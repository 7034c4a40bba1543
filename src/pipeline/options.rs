use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Coarse verbosity control translated into the prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Depth {
    Basic,
    Detailed,
    Comprehensive,
}

impl Depth {
    /// Unrecognized and absent values fall back to `Detailed`
    pub fn from_label(label: Option<&str>) -> Self {
        match label.map(str::trim) {
            Some("basic") => Depth::Basic,
            Some("comprehensive") => Depth::Comprehensive,
            _ => Depth::Detailed,
        }
    }

    pub fn instruction(&self) -> &'static str {
        match self {
            Depth::Basic => "brief and concise",
            Depth::Detailed => "detailed and thorough",
            Depth::Comprehensive => "extremely detailed with comprehensive examples",
        }
    }
}

/// Requested output format. Advisory only: the model always writes Markdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Markdown,
    Html,
    Pdf,
}

impl OutputFormat {
    pub fn from_label(label: Option<&str>) -> Self {
        match label.map(str::trim) {
            Some("html") => OutputFormat::Html,
            Some("pdf") => OutputFormat::Pdf,
            _ => OutputFormat::Markdown,
        }
    }
}

/// User-selected generation options. Absent section flags mean "include",
/// except `includeContributing` which defaults to excluded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerationOptions {
    pub include_readme: Option<bool>,
    pub include_installation: Option<bool>,
    pub include_api: Option<bool>,
    pub include_examples: Option<bool>,
    pub include_contributing: Option<bool>,
    /// `basic`, `detailed` or `comprehensive`
    pub depth: Option<String>,
    /// `markdown`, `html` or `pdf`
    pub format: Option<String>,
    /// Sampling temperature, clamped into [0, 2]
    pub temperature: Option<f32>,
    /// Output token budget, clamped into [1, 8192]
    pub max_output_tokens: Option<u32>,
}

impl GenerationOptions {
    pub fn depth(&self) -> Depth {
        Depth::from_label(self.depth.as_deref())
    }

    pub fn format(&self) -> OutputFormat {
        OutputFormat::from_label(self.format.as_deref())
    }

    /// Section names requested by the caller, in a fixed order
    pub fn sections(&self) -> Vec<&'static str> {
        let mut sections = Vec::new();
        if self.include_readme.unwrap_or(true) {
            sections.push("A project overview and README");
        }
        if self.include_installation.unwrap_or(true) {
            sections.push("Installation instructions");
        }
        if self.include_api.unwrap_or(true) {
            sections.push("API documentation/core features");
        }
        if self.include_examples.unwrap_or(true) {
            sections.push("Usage and code examples");
        }
        if self.include_contributing.unwrap_or(false) {
            sections.push("Contributing guidelines");
        }
        sections
    }
}
