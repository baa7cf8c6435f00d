// src/system/editor.rs

use crate::core::paths;
use std::env;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Cannot open an editor: none of [{}] was found.", .0.join(", "))]
    NotFound(Vec<String>),
    #[error("Editor '{editor}' exited with code {code:?}; settings left unchanged.")]
    Failed { editor: String, code: Option<i32> },
    #[error("Filesystem Error: {0}")]
    Io(#[from] std::io::Error),
}

/// Hands a document to the user for editing and returns the edited text.
pub trait DocumentEditor {
    /// Opens `document` for editing and blocks until the user is done.
    fn edit(&self, document: &str) -> Result<String, EditorError>;
}

/// Edits documents with the first available program from a candidate list.
#[derive(Debug, Clone)]
pub struct ExternalEditor {
    candidates: Vec<String>,
}

/// A resolved editor: the program to run plus any arguments from its candidate entry.
#[derive(Debug, Clone, PartialEq, Eq)]
struct EditorProgram {
    path: PathBuf,
    args: Vec<String>,
}

impl ExternalEditor {
    /// Candidates are tried in order. Entries may carry arguments (`code --wait`)
    /// and use `~` or environment variables.
    pub fn new(candidates: Vec<String>) -> Self {
        Self { candidates }
    }

    fn find_program(&self) -> Result<EditorProgram, EditorError> {
        self.candidates
            .iter()
            .find_map(|candidate| resolve_candidate(candidate))
            .ok_or_else(|| EditorError::NotFound(self.candidates.clone()))
    }
}

impl DocumentEditor for ExternalEditor {
    fn edit(&self, document: &str) -> Result<String, EditorError> {
        let program = self.find_program()?;
        log::debug!("Using editor '{}'", program.path.display());

        let mut scratch = tempfile::Builder::new()
            .prefix("tp-settings-")
            .suffix(".toml")
            .tempfile()?;
        scratch.write_all(document.as_bytes())?;
        scratch.flush()?;

        let status = Command::new(&program.path)
            .args(&program.args)
            .arg(scratch.path())
            .status()?;
        if !status.success() {
            return Err(EditorError::Failed {
                editor: program.path.display().to_string(),
                code: status.code(),
            });
        }

        // Editors often replace the file rather than write in place, so re-read by path.
        let edited = fs::read_to_string(scratch.path())?;
        Ok(edited)
    }
}

fn resolve_candidate(candidate: &str) -> Option<EditorProgram> {
    let mut parts = shlex::split(candidate)?;
    if parts.is_empty() {
        return None;
    }
    let program = parts.remove(0);
    let expanded = match paths::expand_path(&program) {
        Ok(path) => path,
        Err(e) => {
            log::debug!("Skipping editor candidate '{}': {}", candidate, e);
            return None;
        }
    };
    let path = find_executable(&expanded)?;
    Some(EditorProgram { path, args: parts })
}

/// Looks `program` up the way a shell would: as given when it contains a path
/// separator, otherwise in each `PATH` entry.
fn find_executable(program: &Path) -> Option<PathBuf> {
    if program.components().count() > 1 || program.is_absolute() {
        return is_executable(program).then(|| program.to_path_buf());
    }
    let path_var = env::var_os("PATH")?;
    env::split_paths(&path_var).find_map(|dir| {
        let direct = dir.join(program);
        if is_executable(&direct) {
            return Some(direct);
        }
        if cfg!(target_os = "windows") {
            let with_exe = dir.join(program).with_extension("exe");
            if is_executable(&with_exe) {
                return Some(with_exe);
            }
        }
        None
    })
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    fs::metadata(path)
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_candidates_yield_not_found_listing_them() {
        let editor = ExternalEditor::new(vec![
            "tp-no-such-editor-a".to_string(),
            "tp-no-such-editor-b".to_string(),
        ]);
        let err = editor.edit("x = 1").unwrap_err();
        assert!(matches!(&err, EditorError::NotFound(list) if list.len() == 2));
        assert!(err.to_string().contains("tp-no-such-editor-a, tp-no-such-editor-b"));
    }

    #[test]
    fn test_empty_candidate_list_is_not_found() {
        let editor = ExternalEditor::new(Vec::new());
        assert!(matches!(editor.edit(""), Err(EditorError::NotFound(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_candidate_arguments_are_kept_and_first_available_wins() {
        let editor = ExternalEditor::new(vec![
            "tp-no-such-editor".to_string(),
            "sh -c 'true'".to_string(),
        ]);
        let program = editor.find_program().unwrap();
        assert!(program.path.ends_with("sh"));
        assert_eq!(program.args, vec!["-c", "true"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_edit_returns_text_written_by_the_editor() {
        // `sh -c '<script>' <scratch-path>`: $0 is the scratch file.
        let editor = ExternalEditor::new(vec![
            r#"sh -c 'printf "shell = \"zsh -c\"\n" > "$0"'"#.to_string(),
        ]);
        let edited = editor.edit("shell = \"bash -c\"\n").unwrap();
        assert_eq!(edited, "shell = \"zsh -c\"\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_unchanged_document_comes_back_verbatim() {
        let editor = ExternalEditor::new(vec!["true".to_string()]);
        assert_eq!(editor.edit("editors = []\n").unwrap(), "editors = []\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_editor_is_an_error() {
        let editor = ExternalEditor::new(vec!["false".to_string()]);
        assert!(matches!(editor.edit("x"), Err(EditorError::Failed { code: Some(1), .. })));
    }

    #[cfg(unix)]
    #[test]
    fn test_absolute_paths_are_checked_directly() {
        assert_eq!(find_executable(Path::new("/bin/sh")), Some(PathBuf::from("/bin/sh")));
        assert_eq!(find_executable(Path::new("/definitely/not/here")), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_files_without_execute_bits_are_skipped() {
        use std::os::unix::fs::PermissionsExt;

        // --- Setup ---
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("my-editor");
        fs::write(&script, "#!/bin/sh\n").unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o644)).unwrap();

        // --- Execute & Assert ---
        assert_eq!(find_executable(&script), None);
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
        assert_eq!(find_executable(&script), Some(script.clone()));
    }
}
