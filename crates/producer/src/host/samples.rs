use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

use glob::Pattern;
use producer_core::host::{SampleCategory, SampleInfo, SampleQuery};

/// File extensions recognized as samples.
const SAMPLE_EXTENSIONS: &[&str] = &["wav", "ogg", "mp3", "flac", "ds"];

/// Sample folders on disk, typically a factory and a user directory.
///
/// Nothing is cached; every query walks the roots again.
#[derive(Clone, Debug, Default)]
pub struct SampleLibrary {
    roots: Vec<PathBuf>,
}

impl SampleLibrary {
    /// Creates a library over the given root directories, searched in
    /// order.
    pub fn new<I, P>(roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            roots: roots.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns the root directories.
    #[inline]
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Lists first-level folders of every root. A folder name seen in an
    /// earlier root hides the same name in later ones.
    pub fn categories(&self) -> Vec<SampleCategory> {
        let mut seen = HashSet::new();
        let mut categories = vec![];
        for root in &self.roots {
            let dirs = entries(root, "*").into_iter().filter(|p| p.is_dir());
            for dir in dirs {
                let Some(name) = dir.file_name().and_then(|n| n.to_str())
                else {
                    continue;
                };
                if !seen.insert(name.to_owned()) {
                    continue;
                }
                let file_count = entries(&dir, "*")
                    .into_iter()
                    .filter(|path| path.is_file() && is_sample(path))
                    .count();
                categories.push(SampleCategory {
                    name: name.to_owned(),
                    path: dir.to_string_lossy().into_owned(),
                    file_count,
                });
            }
        }
        categories
    }

    /// Lists samples matching `query`, recursing into subfolders.
    pub fn samples(&self, query: &SampleQuery) -> Vec<SampleInfo> {
        let category = query.category.as_deref().map(Path::new);
        if category.is_some_and(|category| !is_relative_below(category)) {
            warn!("rejected sample category {:?}", query.category);
            return vec![];
        }
        let search = query.search.as_deref().map(str::to_lowercase);

        let mut samples = vec![];
        for root in &self.roots {
            let dir = match category {
                Some(category) => root.join(category),
                None => root.clone(),
            };
            for path in entries(&dir, "**/*") {
                if samples.len() >= query.limit {
                    return samples;
                }
                if !path.is_file() || !is_sample(&path) {
                    continue;
                }
                let Some(name) = path.file_name().and_then(|n| n.to_str())
                else {
                    continue;
                };
                if search
                    .as_deref()
                    .is_some_and(|search| !name.to_lowercase().contains(search))
                {
                    continue;
                }
                samples.push(SampleInfo {
                    name: name.to_owned(),
                    path: path.to_string_lossy().into_owned(),
                    category: relative_dir(root, &path),
                });
            }
        }
        samples
    }
}

/// Expands `pattern` below `dir`. Unreadable entries are skipped.
fn entries(dir: &Path, pattern: &str) -> Vec<PathBuf> {
    let Some(dir) = dir.to_str() else {
        warn!("skipping non UTF-8 sample folder {}", dir.display());
        return vec![];
    };
    let mut full = Pattern::escape(dir);
    if !full.ends_with('/') {
        full.push('/');
    }
    full.push_str(pattern);
    match glob::glob(&full) {
        Ok(paths) => paths.flatten().collect(),
        Err(err) => {
            warn!("invalid sample pattern {full:?}: {err}");
            vec![]
        }
    }
}

fn is_sample(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            SAMPLE_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

fn is_relative_below(path: &Path) -> bool {
    path.components()
        .all(|component| matches!(component, Component::Normal(_)))
}

/// The folder of `path` relative to `root`, unless it is the root itself.
fn relative_dir(root: &Path, path: &Path) -> Option<String> {
    let parent = path.parent()?.strip_prefix(root).ok()?;
    let parts = parent
        .components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>();
    (!parts.is_empty()).then(|| parts.join("/"))
}
