//! Importing a source file into the code pane and exporting it back out.

use std::path::Path;

use crate::error::Result;

/// Title used until a file is imported or the user renames the pad.
pub const DEFAULT_TITLE: &str = "pyaiPrompt";

/// A file read into the code pane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedFile {
    /// File name without its directory; becomes the pad title.
    pub title: String,
    pub text: String,
}

pub fn import_file(path: &Path) -> Result<ImportedFile> {
    let text = std::fs::read_to_string(path)?;
    let title = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(ImportedFile { title, text })
}

/// Name offered when saving: `pyai_<title>`, or nothing for an untitled pad.
pub fn default_export_name(title: &str) -> String {
    if title == DEFAULT_TITLE || title.is_empty() {
        String::new()
    } else {
        format!("pyai_{title}")
    }
}

pub fn export_file(path: &Path, text: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, text)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_name_depends_on_title() {
        assert_eq!(default_export_name(DEFAULT_TITLE), "");
        assert_eq!(default_export_name("solver.py"), "pyai_solver.py");
    }

    #[test]
    fn import_then_export() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("solver.py");
        std::fs::write(&source, "print(1)\n").unwrap();

        let imported = import_file(&source).unwrap();
        assert_eq!(imported.title, "solver.py");
        assert_eq!(imported.text, "print(1)\n");

        let target = dir.path().join("out").join(default_export_name(&imported.title));
        export_file(&target, &imported.text).unwrap();
        assert_eq!(std::fs::read_to_string(target).unwrap(), "print(1)\n");
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = import_file(&dir.path().join("nope.py")).unwrap_err();
        assert!(matches!(err, crate::error::PadError::Io(_)));
    }
}
