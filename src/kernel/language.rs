use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// How a file is rendered: a structured block document or plain source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewKind {
    Rich,
    Source,
}

impl ViewKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rich => "rich",
            Self::Source => "source",
        }
    }
}

impl FromStr for ViewKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rich" => Ok(Self::Rich),
            "source" => Ok(Self::Source),
            other => Err(format!("unknown view `{other}` (expected rich or source)")),
        }
    }
}

impl fmt::Display for ViewKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Markdown,
    Plaintext,
    Python,
    JavaScript,
    TypeScript,
    Jsx,
    Tsx,
}

impl FileType {
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|s| s.to_str())
            .map(Self::from_extension)
            .unwrap_or(Self::Plaintext)
    }

    pub fn from_extension(ext: &str) -> Self {
        match ext.to_ascii_lowercase().as_str() {
            "md" | "markdown" => Self::Markdown,
            "py" | "pyi" => Self::Python,
            "js" | "mjs" | "cjs" => Self::JavaScript,
            "ts" | "mts" | "cts" => Self::TypeScript,
            "jsx" => Self::Jsx,
            "tsx" => Self::Tsx,
            _ => Self::Plaintext,
        }
    }

    pub fn supported_views(self) -> &'static [ViewKind] {
        match self {
            Self::Markdown | Self::Python => &[ViewKind::Rich, ViewKind::Source],
            Self::JavaScript | Self::TypeScript | Self::Jsx | Self::Tsx | Self::Plaintext => {
                &[ViewKind::Source]
            }
        }
    }

    pub fn supports(self, view: ViewKind) -> bool {
        self.supported_views().contains(&view)
    }

    /// Structured types are re-derived into blocks after every rich save.
    pub fn is_structured(self) -> bool {
        self.supports(ViewKind::Rich)
    }

    /// View a freshly created editor starts in.
    pub fn default_view(self) -> ViewKind {
        if self.is_structured() {
            ViewKind::Rich
        } else {
            ViewKind::Source
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::Markdown => "Markdown",
            Self::Plaintext => "Plain Text",
            Self::Python => "Python",
            Self::JavaScript => "JavaScript",
            Self::TypeScript => "TypeScript",
            Self::Jsx => "JSX",
            Self::Tsx => "TSX",
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/kernel/language.rs"]
mod tests;
