//! Targeted string-replacement edit decorator.

use thiserror::Error;

use crate::{Vfs, VfsError};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EditError {
    #[error(transparent)]
    Vfs(#[from] VfsError),
    #[error("string to replace not found in {path}")]
    NotFound { path: String },
    #[error("string to replace occurs {count} times in {path}; pass replace_all to change every occurrence")]
    NotUnique { path: String, count: usize },
    #[error("old and new strings are identical")]
    NoChange,
}

#[derive(Clone, Debug)]
pub struct EditRequest {
    pub old_string: String,
    pub new_string: String,
    pub replace_all: bool,
}

/// Replace one (or all) occurrences of `old_string` in a file.
///
/// Preconditions are checked before anything is written: the needle must
/// exist, must differ from the replacement, and must be unique unless
/// `replace_all` is set. On success exactly one write happens.
pub fn edit_file(vfs: &dyn Vfs, path: &str, request: &EditRequest) -> Result<(), EditError> {
    if request.old_string == request.new_string {
        return Err(EditError::NoChange);
    }
    let text = vfs.read_file(path)?;

    let count = text.matches(&request.old_string).count();
    match count {
        0 => {
            return Err(EditError::NotFound {
                path: path.to_string(),
            });
        }
        1 => {}
        n if !request.replace_all => {
            return Err(EditError::NotUnique {
                path: path.to_string(),
                count: n,
            });
        }
        _ => {}
    }

    let updated = if request.replace_all {
        text.replace(&request.old_string, &request.new_string)
    } else {
        text.replacen(&request.old_string, &request.new_string, 1)
    };
    vfs.write_file(path, &updated)?;
    Ok(())
}
