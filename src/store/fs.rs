//! Filesystem-backed content store.
//!
//! ```text
//! content/
//! ├── posts/
//! │   └── hello-world.md                   # post "hello-world"
//! └── courses/
//!     └── flutter-ship/
//!         ├── index.md                     # course "flutter-ship"
//!         └── 01-intro/
//!             ├── index.md                 # section "flutter-ship/01-intro"
//!             └── 01-setup.md              # lesson "flutter-ship/01-intro/01-setup"
//! ```
//!
//! Parent ids are derived from the directory a file lives in. A markdown file
//! directly under a course directory is loaded as a lesson without a section
//! and fails validation downstream.

use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use super::{ContentStore, RawEntry, Result, StoreError};
use crate::frontmatter;
use crate::model::ContentKind;

const INDEX_FILE: &str = "index.md";
const MARKDOWN_EXTENSIONS: &[&str] = &["md", "mdx"];
const NOT_UTF8: &str = "content is not valid UTF-8";

#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl ContentStore for FsStore {
    async fn load(&self, kind: ContentKind) -> Result<Vec<RawEntry>> {
        let root = self.root.clone();
        tokio::task::spawn_blocking(move || load_collection(&root, kind)).await?
    }
}

#[derive(Debug, PartialEq)]
struct Identity {
    slug: String,
    course_id: Option<String>,
    section_id: Option<String>,
}

fn load_collection(root: &Path, kind: ContentKind) -> Result<Vec<RawEntry>> {
    if !root.is_dir() {
        return Err(StoreError::Io {
            path: root.to_path_buf(),
            source: io::Error::new(io::ErrorKind::NotFound, "content directory not found"),
        });
    }
    let collection = match kind {
        ContentKind::Post => root.join("posts"),
        _ => root.join("courses"),
    };
    if !collection.is_dir() {
        debug!(path = %collection.display(), "collection directory missing; treating as empty");
        return Ok(Vec::new());
    }

    let mut entries = Vec::new();
    let walker = WalkDir::new(&collection)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e));
    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() || !is_markdown(entry.path()) {
            continue;
        }
        let Ok(rel) = entry.path().strip_prefix(&collection) else {
            continue;
        };
        let segments: Vec<String> = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        let Some(identity) = classify(kind, &segments) else {
            if !in_layout(kind, &segments) {
                warn!(path = %rel.display(), "ignoring markdown file outside the content layout");
            }
            continue;
        };

        let bytes = std::fs::read(entry.path()).map_err(|source| StoreError::Io {
            path: entry.path().to_path_buf(),
            source,
        })?;
        // undecodable files are reported by validation, not as store errors
        let (front_matter, body) = match String::from_utf8(bytes) {
            Ok(content) => match frontmatter::parse(&content) {
                Ok((value, body)) => (Ok(value), body.to_string()),
                Err(err) => (Err(err.to_string()), content.clone()),
            },
            Err(_) => (Err(NOT_UTF8.to_string()), String::new()),
        };

        entries.push(RawEntry {
            id: segments.join("/"),
            slug: identity.slug,
            course_id: identity.course_id,
            section_id: identity.section_id,
            body,
            front_matter,
        });
    }
    debug!(kind = kind.as_str(), count = entries.len(), "loaded collection");
    Ok(entries)
}

/// Map a path (relative to its collection directory) to the record it holds, if
/// it holds one of `kind`.
fn classify(kind: ContentKind, segments: &[String]) -> Option<Identity> {
    let is_index = |s: &String| s == INDEX_FILE;
    match (kind, segments) {
        (ContentKind::Post, [.., last]) => {
            let mut parts: Vec<&str> = segments[..segments.len() - 1]
                .iter()
                .map(String::as_str)
                .collect();
            parts.push(file_stem(last));
            Some(Identity {
                slug: parts.join("/"),
                course_id: None,
                section_id: None,
            })
        }
        (ContentKind::Course, [course, file]) if is_index(file) => Some(Identity {
            slug: course.clone(),
            course_id: None,
            section_id: None,
        }),
        (ContentKind::Section, [course, section, file]) if is_index(file) => Some(Identity {
            slug: format!("{course}/{section}"),
            course_id: Some(course.clone()),
            section_id: None,
        }),
        (ContentKind::Lesson, [course, section, file]) if !is_index(file) => Some(Identity {
            slug: format!("{course}/{section}/{}", file_stem(file)),
            course_id: Some(course.clone()),
            section_id: Some(format!("{course}/{section}")),
        }),
        (ContentKind::Lesson, [course, file]) if !is_index(file) => Some(Identity {
            slug: format!("{course}/{}", file_stem(file)),
            course_id: Some(course.clone()),
            section_id: None,
        }),
        _ => None,
    }
}

/// Whether any kind stored in the same collection claims this path.
fn in_layout(kind: ContentKind, segments: &[String]) -> bool {
    let kinds: &[ContentKind] = match kind {
        ContentKind::Post => &[ContentKind::Post],
        _ => &[ContentKind::Course, ContentKind::Section, ContentKind::Lesson],
    };
    kinds.iter().any(|k| classify(*k, segments).is_some())
}

fn file_stem(name: &str) -> &str {
    Path::new(name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(name)
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|s| s.starts_with('.') || s.starts_with('_'))
        .unwrap_or(false)
}

fn is_markdown(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| MARKDOWN_EXTENSIONS.iter().any(|m| e.eq_ignore_ascii_case(m)))
        .unwrap_or(false)
}
