use anyhow::{Context, Result, anyhow};
use std::fs;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

// @module: File and directory utilities

/// Extensions treated as translatable markup
pub const MARKUP_EXTENSIONS: &[&str] = &["html", "htm", "xhtml"];

/// Files of a document directory, as paths relative to its root, sorted
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentFiles {
    /// Markup sub-files to translate
    pub markup: Vec<PathBuf>,
    /// Everything else, copied verbatim
    pub assets: Vec<PathBuf>,
}

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().is_file()
    }

    // @checks: Directory existence
    pub fn dir_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().is_dir()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.exists() {
            fs::create_dir_all(path)
                .with_context(|| format!("Failed to create directory: {:?}", path))?;
        }
        Ok(())
    }

    // @checks: Markup extension, case-insensitive
    pub fn is_markup_file<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref()
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .is_some_and(|ext| MARKUP_EXTENSIONS.contains(&ext.as_str()))
    }

    // @generates: Sibling output directory `<input>-<target_language>`
    pub fn default_output_dir<P: AsRef<Path>>(input_dir: P, target_language: &str) -> PathBuf {
        let input_dir = input_dir.as_ref();
        let name = input_dir
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "output".to_string());
        input_dir.with_file_name(format!("{}-{}", name, target_language))
    }

    /// One absolute spelling per directory.
    ///
    /// Existing paths are canonicalized. Missing ones are made absolute
    /// against the working directory with `.` and `..` resolved lexically.
    pub fn normalize_path<P: AsRef<Path>>(path: P) -> PathBuf {
        let path = path.as_ref();
        if let Ok(canonical) = fs::canonicalize(path) {
            return canonical;
        }

        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()
                .map(|cwd| cwd.join(path))
                .unwrap_or_else(|_| path.to_path_buf())
        };

        let mut normalized = PathBuf::new();
        for component in absolute.components() {
            match component {
                Component::CurDir => {}
                Component::ParentDir => {
                    normalized.pop();
                }
                other => normalized.push(other.as_os_str()),
            }
        }
        normalized
    }

    /// Checkpoint key of the document rooted at `dir`
    pub fn document_id<P: AsRef<Path>>(dir: P) -> String {
        Self::normalize_path(dir).to_string_lossy().to_string()
    }

    /// Stable `/`-separated identifier of `path` relative to `root`
    pub fn relative_id<P1: AsRef<Path>, P2: AsRef<Path>>(root: P1, path: P2) -> Result<String> {
        let relative = path
            .as_ref()
            .strip_prefix(root.as_ref())
            .with_context(|| format!("{:?} is not inside {:?}", path.as_ref(), root.as_ref()))?;
        let parts: Vec<String> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().to_string())
            .collect();
        Ok(parts.join("/"))
    }

    /// Walk `dir` and sort its files into markup and assets.
    ///
    /// Anything under `exclude` (typically an output directory nested in the
    /// input) is ignored, however either path is spelled.
    pub fn find_document_files<P: AsRef<Path>>(dir: P, exclude: Option<&Path>) -> Result<DocumentFiles> {
        if !dir.as_ref().is_dir() {
            return Err(anyhow!("Not a directory: {:?}", dir.as_ref()));
        }
        let dir = &Self::normalize_path(dir);
        let exclude = exclude.map(Self::normalize_path);

        let mut files = DocumentFiles::default();
        let walker = WalkDir::new(dir)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| exclude.as_deref().is_none_or(|excluded| entry.path() != excluded));

        for entry in walker {
            let entry = entry.context("Failed to read directory entry")?;
            if !entry.file_type().is_file() {
                continue;
            }

            let relative = entry
                .path()
                .strip_prefix(dir)
                .context("Directory walk left the document root")?
                .to_path_buf();
            if Self::is_markup_file(&relative) {
                files.markup.push(relative);
            } else {
                files.assets.push(relative);
            }
        }

        files.markup.sort();
        files.assets.sort();
        Ok(files)
    }

    /// Read a file to a string
    pub fn read_to_string<P: AsRef<Path>>(path: P) -> Result<String> {
        fs::read_to_string(&path).with_context(|| format!("Failed to read file: {:?}", path.as_ref()))
    }

    /// Write a string to a file, creating parent directories
    pub fn write_to_file<P: AsRef<Path>>(path: P, content: &str) -> std::io::Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)
    }

    /// Copy a file from one location to another, ensuring the target directory exists
    pub fn copy_file<P1: AsRef<Path>, P2: AsRef<Path>>(from: P1, to: P2) -> Result<()> {
        let from = from.as_ref();
        let to = to.as_ref();

        if !from.exists() {
            return Err(anyhow!("Source file does not exist: {:?}", from));
        }

        if let Some(parent) = to.parent() {
            Self::ensure_dir(parent)?;
        }

        fs::copy(from, to).with_context(|| format!("Failed to copy {:?} to {:?}", from, to))?;
        Ok(())
    }
}
