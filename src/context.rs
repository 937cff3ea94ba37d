//! Trigger context: where the jump starts from.

use serde::Serialize;

use crate::error::Result;
use crate::validate;

/// Immutable snapshot of the host's cursor position at trigger time.
/// Derived per trigger event; never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectContext {
    /// Workspace/project root path.
    pub root_path: String,
    /// Absolute path of the file under the cursor.
    pub file_path: String,
    /// 1-based line number.
    pub line: u32,
    /// 1-based column number.
    pub column: u32,
    pub workspace_name: Option<String>,
    pub project_kind: Option<String>,
}

impl ProjectContext {
    /// Build a validated snapshot.
    pub fn new(
        root_path: impl Into<String>,
        file_path: impl Into<String>,
        line: u32,
        column: u32,
    ) -> Result<Self> {
        let context = Self {
            root_path: root_path.into(),
            file_path: file_path.into(),
            line,
            column,
            workspace_name: None,
            project_kind: None,
        };
        context.validate()?;
        Ok(context)
    }

    #[must_use]
    pub fn with_workspace_name(mut self, name: impl Into<String>) -> Self {
        self.workspace_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_project_kind(mut self, kind: impl Into<String>) -> Self {
        self.project_kind = Some(kind.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        validate::non_empty_path(&self.root_path, "root path")?;
        validate::non_empty_path(&self.file_path, "file path")?;
        validate::line_number(self.line)?;
        validate::column_number(self.column)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_one_based_positions() {
        let context = ProjectContext::new("/proj", "/proj/src/main.kt", 1, 1).unwrap();
        assert_eq!(context.line, 1);
        assert_eq!(context.column, 1);
    }

    #[test]
    fn rejects_zero_line_or_column() {
        assert!(ProjectContext::new("/proj", "/proj/a.rs", 0, 1).is_err());
        assert!(ProjectContext::new("/proj", "/proj/a.rs", 1, 0).is_err());
    }

    #[test]
    fn rejects_empty_paths() {
        assert!(ProjectContext::new("", "/proj/a.rs", 1, 1).is_err());
        assert!(ProjectContext::new("/proj", "", 1, 1).is_err());
    }
}
