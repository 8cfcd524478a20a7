//! Tree storage backends, one per file format.

use globset::GlobBuilder;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{SyncError, SyncResult};
use crate::tree::Tree;

mod json;
mod yaml;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Yaml,
    Json,
}

impl FileFormat {
    pub fn from_name(name: &str) -> SyncResult<Self> {
        match name.trim().to_lowercase().as_str() {
            "yaml" | "yml" => Ok(FileFormat::Yaml),
            "json" => Ok(FileFormat::Json),
            _ => Err(SyncError::UnsupportedFormat(name.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FileFormat::Yaml => "yaml",
            FileFormat::Json => "json",
        }
    }

    /// Extensions picked up when a directory is scanned.
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            FileFormat::Yaml => &["yml", "yaml"],
            FileFormat::Json => &["json"],
        }
    }

    pub fn read(&self, path: &Path) -> SyncResult<Tree> {
        let content = fs::read_to_string(path).map_err(|err| match err.kind() {
            ErrorKind::InvalidData => SyncError::parse(path, "file is not valid UTF-8"),
            _ => SyncError::io(path, err),
        })?;
        if content.trim().is_empty() {
            return Ok(Tree::new());
        }
        match self {
            FileFormat::Yaml => yaml::parse(path, &content),
            FileFormat::Json => json::parse(path, &content),
        }
    }

    pub fn write(&self, path: &Path, tree: &Tree) -> SyncResult<()> {
        let content = match self {
            FileFormat::Yaml => yaml::render(path, tree)?,
            FileFormat::Json => json::render(path, tree)?,
        };
        ensure_parent_dir(path)?;
        fs::write(path, content).map_err(|err| SyncError::io(path, err))
    }

    /// Creates an empty document at `path`.
    pub fn touch(&self, path: &Path) -> SyncResult<()> {
        let content = match self {
            FileFormat::Yaml => "",
            FileFormat::Json => "{}\n",
        };
        ensure_parent_dir(path)?;
        fs::write(path, content).map_err(|err| SyncError::io(path, err))
    }

    /// Files for `path`: every file with a matching extension below a
    /// directory, the file itself, or the files matching a glob pattern.
    pub fn files_matching_path(&self, path: &str) -> SyncResult<Vec<PathBuf>> {
        let target = Path::new(path);
        if target.is_dir() {
            let files = collect_directory_files(target)?
                .into_iter()
                .filter(|file| self.has_extension(file))
                .collect();
            return Ok(files);
        }
        if target.is_file() {
            return Ok(vec![target.to_path_buf()]);
        }
        glob_files(path)
    }

    fn has_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.extensions().contains(&ext))
    }
}

pub fn file_exists(path: &Path) -> bool {
    path.exists()
}

fn ensure_parent_dir(path: &Path) -> SyncResult<()> {
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(|err| SyncError::io(dir, err))?;
    }
    Ok(())
}

fn collect_directory_files(root: &Path) -> SyncResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        let entries = fs::read_dir(&dir).map_err(|err| SyncError::io(&dir, err))?;
        for entry in entries {
            let entry = entry.map_err(|err| SyncError::io(&dir, err))?;
            let path = entry.path();
            let file_type = entry.file_type().map_err(|err| SyncError::io(&path, err))?;
            if file_type.is_dir() {
                stack.push(path);
            } else if file_type.is_file() {
                files.push(path);
            }
        }
    }
    files.sort();
    Ok(files)
}

fn glob_files(pattern: &str) -> SyncResult<Vec<PathBuf>> {
    let matcher = GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map_err(|err| SyncError::InvalidPattern {
            pattern: pattern.to_string(),
            message: err.to_string(),
        })?
        .compile_matcher();
    let root = literal_root(pattern);
    if !root.is_dir() {
        return Ok(Vec::new());
    }
    let files = collect_directory_files(&root)?
        .into_iter()
        .map(|file| relative_to_pattern(file, pattern))
        .filter(|file| matcher.is_match(file))
        .collect();
    Ok(files)
}

/// Walking `.` yields `./name`; a pattern without that prefix matches the
/// bare relative path.
fn relative_to_pattern(file: PathBuf, pattern: &str) -> PathBuf {
    if Path::new(pattern).starts_with(".") {
        return file;
    }
    match file.strip_prefix(".") {
        Ok(rest) => rest.to_path_buf(),
        Err(_) => file,
    }
}

/// The directory part of `pattern` before the first component with a glob
/// metacharacter.
pub(crate) fn literal_root(pattern: &str) -> PathBuf {
    let mut root = PathBuf::new();
    for component in Path::new(pattern).components() {
        let part = component.as_os_str().to_string_lossy();
        if part.contains(['*', '?', '[', '{']) {
            break;
        }
        root.push(component.as_os_str());
    }
    if root.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        root
    }
}
