//! Reading a build output directory as an [`ArtifactSet`] and writing the
//! transformed set back.

use std::fs;
use std::io::Write;
use std::path::{Component, Path, PathBuf};

use log::debug;

use crate::artifact::{Artifact, ArtifactSet};
use crate::classify::has_script_extension;
use crate::error::{CssInjectError, Result};

/// Files to write and delete so that a directory matching `before` comes to
/// match `after`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirChanges {
    pub written: Vec<String>,
    pub removed: Vec<String>,
}

impl DirChanges {
    pub fn is_empty(&self) -> bool {
        self.written.is_empty() && self.removed.is_empty()
    }
}

/// Load every file under `root`. Artifacts are named by their path relative
/// to `root` with `/` separators, in sorted order. Script files become chunks
/// and everything else becomes an asset.
pub fn load_dir(root: &Path) -> Result<ArtifactSet> {
    let mut names = Vec::new();
    collect_files(root, root, &mut names)?;
    names.sort();

    let mut artifacts = ArtifactSet::new();
    for name in names {
        let path = root.join(&name);
        let bytes = fs::read(&path).map_err(|err| CssInjectError::io(&path, err))?;
        let artifact = if has_script_extension(&name) {
            let code = String::from_utf8(bytes).map_err(|err| {
                CssInjectError::malformed(&name, format!("script is not valid UTF-8: {err}"))
            })?;
            Artifact::chunk(&name, code)
        } else {
            match String::from_utf8(bytes) {
                Ok(text) => Artifact::asset(&name, text),
                Err(err) => Artifact::asset(&name, err.into_bytes()),
            }
        };
        debug!("Loaded {name}");
        artifacts.insert(name, artifact);
    }
    Ok(artifacts)
}

fn collect_files(root: &Path, dir: &Path, names: &mut Vec<String>) -> Result<()> {
    let entries = fs::read_dir(dir).map_err(|err| CssInjectError::io(dir, err))?;
    for entry in entries {
        let entry = entry.map_err(|err| CssInjectError::io(dir, err))?;
        let path = entry.path();
        let file_type = entry
            .file_type()
            .map_err(|err| CssInjectError::io(&path, err))?;
        if file_type.is_dir() {
            collect_files(root, &path, names)?;
        } else if file_type.is_file() {
            let relative = path.strip_prefix(root).unwrap_or(&path);
            let name = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            names.push(name);
        }
    }
    Ok(())
}

/// Compare two artifact sets by name and contents.
pub fn diff(before: &ArtifactSet, after: &ArtifactSet) -> DirChanges {
    let removed = before
        .names()
        .filter(|name| !after.contains(name))
        .map(str::to_string)
        .collect();
    let written = after
        .iter()
        .filter(|(name, artifact)| {
            before
                .get(name)
                .map_or(true, |old| old.contents() != artifact.contents())
        })
        .map(|(name, _)| name.to_string())
        .collect();
    DirChanges { written, removed }
}

/// Apply `changes` under `root`, taking file contents from `after`.
///
/// Every file is first written next to its destination and moved into place
/// once all of them are staged. Nothing is deleted until every write has
/// succeeded, so a failure never leaves stylesheets removed without their
/// CSS injected.
pub fn apply_changes(root: &Path, after: &ArtifactSet, changes: &DirChanges) -> Result<()> {
    let mut staged = Vec::with_capacity(changes.written.len());
    for name in &changes.written {
        let artifact = after
            .get(name)
            .ok_or_else(|| CssInjectError::malformed(name, "artifact to write is missing"))?;
        let path = artifact_path(root, name)?;
        let parent = path.parent().unwrap_or(root);
        fs::create_dir_all(parent).map_err(|err| CssInjectError::io(parent, err))?;

        let mut temp_file = tempfile::Builder::new()
            .prefix(".css-inject-")
            .tempfile_in(parent)
            .map_err(|err| CssInjectError::io(parent, err))?;
        temp_file
            .write_all(artifact.contents())
            .map_err(|err| CssInjectError::io(temp_file.path(), err))?;
        staged.push((temp_file, path));
    }

    for (temp_file, path) in staged {
        temp_file
            .persist(&path)
            .map_err(|err| CssInjectError::io(&path, err.error))?;
        debug!("Wrote {}", path.display());
    }

    for name in &changes.removed {
        let path = artifact_path(root, name)?;
        fs::remove_file(&path).map_err(|err| CssInjectError::io(&path, err))?;
        debug!("Removed {}", path.display());
    }
    Ok(())
}

/// Resolve an artifact name below `root`, refusing names that would escape it.
fn artifact_path(root: &Path, name: &str) -> Result<PathBuf> {
    let relative = Path::new(name);
    let escapes = relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if name.is_empty() || escapes {
        return Err(CssInjectError::malformed(
            name,
            "artifact name is not a relative path inside the output directory",
        ));
    }
    Ok(root.join(relative))
}
