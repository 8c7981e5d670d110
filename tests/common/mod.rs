#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Mutex;

use course_index::cache::ContentCache;
use course_index::model::ContentKind;
use course_index::store::{ContentStore, RawEntry, StoreError};
use course_index::visibility::{BuildMode, ModeSource};
use course_index::{ContentIndex, IndexOptions};

/// In-memory store that records every load and can be told to fail.
#[derive(Clone, Default)]
pub struct RecordingStore {
    entries: Arc<Mutex<HashMap<ContentKind, Vec<RawEntry>>>>,
    calls: Arc<Mutex<Vec<ContentKind>>>,
    failing: Arc<Mutex<HashSet<ContentKind>>>,
}

impl RecordingStore {
    pub fn with_entries(entries: Vec<(ContentKind, RawEntry)>) -> Self {
        let mut by_kind: HashMap<ContentKind, Vec<RawEntry>> = HashMap::new();
        for (kind, entry) in entries {
            by_kind.entry(kind).or_default().push(entry);
        }
        Self {
            entries: Arc::new(Mutex::new(by_kind)),
            ..Default::default()
        }
    }

    pub async fn fail_on(&self, kind: ContentKind) {
        self.failing.lock().await.insert(kind);
    }

    pub async fn calls(&self) -> Vec<ContentKind> {
        self.calls.lock().await.clone()
    }

    pub async fn call_count(&self, kind: ContentKind) -> usize {
        self.calls.lock().await.iter().filter(|k| **k == kind).count()
    }
}

#[async_trait]
impl ContentStore for RecordingStore {
    async fn load(&self, kind: ContentKind) -> Result<Vec<RawEntry>, StoreError> {
        self.calls.lock().await.push(kind);
        if self.failing.lock().await.contains(&kind) {
            return Err(StoreError::Unavailable(format!("{} offline", kind.as_str())));
        }
        Ok(self
            .entries
            .lock()
            .await
            .get(&kind)
            .cloned()
            .unwrap_or_default())
    }
}

fn raw(
    slug: &str,
    course_id: Option<&str>,
    section_id: Option<&str>,
    yaml: &str,
) -> RawEntry {
    RawEntry {
        id: format!("{slug}.md"),
        slug: slug.to_string(),
        course_id: course_id.map(str::to_string),
        section_id: section_id.map(str::to_string),
        body: format!("Body of {slug}"),
        front_matter: serde_yaml::from_str(yaml).map_err(|e| e.to_string()),
    }
}

pub fn post(slug: &str, published: &str, draft: bool, tags: &[&str]) -> (ContentKind, RawEntry) {
    let yaml = format!(
        "title: Post {slug}\npublished: {published}\ndraft: {draft}\ndescription: About {slug}\ntags: [{}]\n",
        tags.join(", ")
    );
    (ContentKind::Post, raw(slug, None, None, &yaml))
}

pub fn course(slug: &str, published: &str, draft: bool, level: &str) -> (ContentKind, RawEntry) {
    let yaml = format!(
        "title: Course {slug}\ndescription: Learn {slug}\nlevel: {level}\ncategory: mobile\npublished: {published}\ndraft: {draft}\n"
    );
    (ContentKind::Course, raw(slug, None, None, &yaml))
}

pub fn section(course: &str, dir: &str, order: u32) -> (ContentKind, RawEntry) {
    let slug = format!("{course}/{dir}");
    let yaml = format!("title: Section {dir}\norder: {order}\n");
    (ContentKind::Section, raw(&slug, Some(course), None, &yaml))
}

pub fn lesson(
    course: &str,
    dir: &str,
    file: &str,
    order: u32,
    published: &str,
    draft: bool,
) -> (ContentKind, RawEntry) {
    let section_id = format!("{course}/{dir}");
    let slug = format!("{section_id}/{file}");
    let yaml = format!("title: Lesson {file}\norder: {order}\npublished: {published}\ndraft: {draft}\n");
    (
        ContentKind::Lesson,
        raw(&slug, Some(course), Some(&section_id), &yaml),
    )
}

/// Raw lesson entry with arbitrary front matter.
pub fn lesson_yaml(course: &str, dir: &str, file: &str, yaml: &str) -> (ContentKind, RawEntry) {
    let section_id = format!("{course}/{dir}");
    let slug = format!("{section_id}/{file}");
    (
        ContentKind::Lesson,
        raw(&slug, Some(course), Some(&section_id), yaml),
    )
}

/// Two courses, a draft course, posts with tags and one draft post.
///
/// `flutter-ship` has five visible lessons across `01-intro` and
/// `02-advanced`, plus one draft lesson.
pub fn flutter_ship_site() -> RecordingStore {
    RecordingStore::with_entries(vec![
        post("hello", "2024-03-01", false, &["meta", "rust"]),
        post("rust-tips", "2024-02-01", false, &["rust", "tips"]),
        post("draft-post", "2024-04-01", true, &["rust"]),
        course("flutter-ship", "2024-01-15", false, "Beginner"),
        course("go-basics", "2024-05-01", false, "Intermediate"),
        course("secret-course", "2024-06-01", true, "Advanced"),
        section("flutter-ship", "02-advanced", 2),
        section("flutter-ship", "01-intro", 1),
        section("go-basics", "01-start", 1),
        section("secret-course", "01-hidden", 1),
        lesson("flutter-ship", "02-advanced", "02-routing", 2, "2024-01-24", false),
        lesson("flutter-ship", "01-intro", "02-widgets", 2, "2024-01-18", false),
        lesson("flutter-ship", "02-advanced", "04-wip", 4, "2024-01-30", true),
        lesson("flutter-ship", "01-intro", "01-setup", 1, "2024-01-16", false),
        lesson("flutter-ship", "02-advanced", "01-state", 1, "2024-01-20", false),
        lesson("flutter-ship", "02-advanced", "03-release", 3, "2024-01-28", false),
        lesson("go-basics", "01-start", "01-hello", 1, "2024-05-02", false),
        lesson("secret-course", "01-hidden", "01-teaser", 1, "2024-06-02", false),
    ])
}

pub fn index_with(store: &RecordingStore, mode: BuildMode, options: IndexOptions) -> ContentIndex {
    ContentIndex::new(
        Arc::new(store.clone()),
        ContentCache::default(),
        ModeSource::Fixed(mode),
    )
    .with_options(options)
}

pub fn production_index(store: &RecordingStore) -> ContentIndex {
    index_with(store, BuildMode::production(), IndexOptions::default())
}

pub fn development_index(store: &RecordingStore) -> ContentIndex {
    index_with(store, BuildMode::development(), IndexOptions::default())
}

pub fn slugs<D>(entries: &[course_index::model::Entry<D>]) -> Vec<&str> {
    entries.iter().map(|e| e.slug.as_str()).collect()
}
