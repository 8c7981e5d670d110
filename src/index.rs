//! Aggregation layer over a [`ContentStore`].
//!
//! Every listing goes cache → store → visibility filter → sort → cache. The
//! build mode is read once per call, so visibility and cache lifetime always
//! agree within one operation.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::instrument;

use crate::cache::{CacheKey, CachedValue, ContentCache};
use crate::config::{Config, Pinning};
use crate::model::{
    ContentKind, Course, CourseBundle, CourseData, Entry, Lesson, LessonData, LessonNavigation,
    Level, Post, PostData, Schema, Section, SectionData, TagCount,
};
use crate::ordering::{self, by_order_asc, by_published_desc, stable_sort, LessonOrder};
use crate::store::{self, ContentStore, Result, Skipped};
use crate::visibility::{BuildMode, ModeSource};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexOptions {
    pub pinning: Pinning,
    pub lesson_order: LessonOrder,
}

impl IndexOptions {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            pinning: cfg.pinning.clone(),
            lesson_order: cfg.ordering.lesson_order,
        }
    }
}

pub struct ContentIndex {
    store: Arc<dyn ContentStore>,
    cache: ContentCache,
    mode: ModeSource,
    pub(crate) options: IndexOptions,
    skipped: Mutex<HashMap<ContentKind, Vec<Skipped>>>,
}

impl std::fmt::Debug for ContentIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentIndex")
            .field("mode", &self.mode)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl ContentIndex {
    pub fn new(store: Arc<dyn ContentStore>, cache: ContentCache, mode: ModeSource) -> Self {
        Self {
            store,
            cache,
            mode,
            options: IndexOptions::default(),
            skipped: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config(cfg: &Config, store: Arc<dyn ContentStore>, mode: ModeSource) -> Self {
        Self::new(store, ContentCache::new(cfg.cache.ttl()), mode)
            .with_options(IndexOptions::from_config(cfg))
    }

    pub fn with_options(mut self, options: IndexOptions) -> Self {
        self.options = options;
        self
    }

    pub fn mode(&self) -> BuildMode {
        self.mode.current()
    }

    pub fn cache(&self) -> &ContentCache {
        &self.cache
    }

    pub async fn clear_cache(&self) {
        self.cache.clear().await;
    }

    /// Records dropped by validation on the most recent load of each kind.
    pub async fn skipped(&self) -> Vec<Skipped> {
        let guard = self.skipped.lock().await;
        ContentKind::all()
            .iter()
            .filter_map(|kind| guard.get(kind))
            .flatten()
            .cloned()
            .collect()
    }

    /// Load every collection and return the records that failed validation.
    pub async fn validate_all(&self) -> Result<Vec<Skipped>> {
        futures::try_join!(
            self.load::<PostData, _>(|_| false),
            self.load::<CourseData, _>(|_| false),
            self.load::<SectionData, _>(|_| false),
            self.load::<LessonData, _>(|_| false),
        )?;
        Ok(self.skipped().await)
    }

    async fn load<D, F>(&self, predicate: F) -> Result<Vec<Entry<D>>>
    where
        D: Schema,
        F: Fn(&Entry<D>) -> bool,
    {
        let loaded = store::query::<D, F>(self.store.as_ref(), predicate).await?;
        self.skipped.lock().await.insert(D::KIND, loaded.skipped);
        Ok(loaded.records)
    }

    /// Visible courses, newest first.
    #[instrument(skip_all)]
    pub async fn list_courses(&self) -> Result<Vec<Course>> {
        let mode = self.mode();
        if let Some(courses) = self.cache.courses(&mode).await {
            return Ok(courses);
        }
        let mut courses = self.load::<CourseData, _>(|c| mode.include(c)).await?;
        stable_sort(&mut courses, by_published_desc);
        self.cache
            .put(CacheKey::Courses, CachedValue::Courses(courses.clone()), &mode)
            .await;
        Ok(courses)
    }

    /// Sections of one course by their `order` field.
    #[instrument(skip(self))]
    pub async fn list_sections(&self, course_slug: &str) -> Result<Vec<Section>> {
        let mode = self.mode();
        let key = CacheKey::CourseSections(course_slug.to_string());
        if let Some(sections) = self.cache.sections(&key, &mode).await {
            return Ok(sections);
        }
        let mut sections = self
            .load::<SectionData, _>(|s| {
                s.course_id.as_deref() == Some(course_slug) && mode.include(s)
            })
            .await?;
        stable_sort(&mut sections, by_order_asc);
        self.cache
            .put(key, CachedValue::Sections(sections.clone()), &mode)
            .await;
        Ok(sections)
    }

    /// Visible lessons of one section by their `order` field.
    #[instrument(skip(self))]
    pub async fn list_lessons(&self, section_slug: &str) -> Result<Vec<Lesson>> {
        let mode = self.mode();
        let key = CacheKey::SectionLessons(section_slug.to_string());
        if let Some(lessons) = self.cache.lessons(&key, &mode).await {
            return Ok(lessons);
        }
        let mut lessons = self
            .load::<LessonData, _>(|l| {
                l.section_id.as_deref() == Some(section_slug) && mode.include(l)
            })
            .await?;
        stable_sort(&mut lessons, by_order_asc);
        self.cache
            .put(key, CachedValue::Lessons(lessons.clone()), &mode)
            .await;
        Ok(lessons)
    }

    /// Visible lessons of a whole course in reading order.
    #[instrument(skip(self))]
    pub async fn list_all_lessons_for_course(&self, course_slug: &str) -> Result<Vec<Lesson>> {
        let mode = self.mode();
        let key = CacheKey::CourseLessons(course_slug.to_string());
        if let Some(lessons) = self.cache.lessons(&key, &mode).await {
            return Ok(lessons);
        }
        let mut lessons = self
            .load::<LessonData, _>(|l| {
                l.course_id.as_deref() == Some(course_slug) && mode.include(l)
            })
            .await?;
        match self.options.lesson_order {
            LessonOrder::SectionPath => stable_sort(&mut lessons, ordering::by_global_lesson_order),
            LessonOrder::SectionOrder => {
                let section_orders: HashMap<String, u32> = self
                    .list_sections(course_slug)
                    .await?
                    .into_iter()
                    .map(|s| (s.slug, s.data.order))
                    .collect();
                stable_sort(&mut lessons, ordering::by_section_order(&section_orders));
            }
        }
        self.cache
            .put(key, CachedValue::Lessons(lessons.clone()), &mode)
            .await;
        Ok(lessons)
    }

    pub async fn get_course(&self, slug: &str) -> Result<Option<Course>> {
        Ok(self.list_courses().await?.into_iter().find(|c| c.slug == slug))
    }

    pub async fn get_lesson_count(&self, course_slug: &str) -> Result<usize> {
        Ok(self.list_all_lessons_for_course(course_slug).await?.len())
    }

    /// Course with its sections and lessons, fetched concurrently. `None` when
    /// the course itself is not visible.
    #[instrument(skip(self))]
    pub async fn get_course_bundle(&self, course_slug: &str) -> Result<Option<CourseBundle>> {
        let (course, sections, lessons) = futures::try_join!(
            self.get_course(course_slug),
            self.list_sections(course_slug),
            self.list_all_lessons_for_course(course_slug),
        )?;
        Ok(course.map(|course| CourseBundle {
            course,
            sections,
            lessons,
        }))
    }

    /// Previous/next lessons around `lesson_slug` within the course.
    ///
    /// `lesson_slug` is either the full lesson slug or the part after the
    /// course slug (`01-intro/01-setup`).
    #[instrument(skip(self))]
    pub async fn get_lesson_navigation(
        &self,
        course_slug: &str,
        lesson_slug: &str,
    ) -> Result<Option<LessonNavigation>> {
        let lessons = self.list_all_lessons_for_course(course_slug).await?;
        let Some(index) = lessons
            .iter()
            .position(|l| lesson_matches(l, course_slug, lesson_slug))
        else {
            return Ok(None);
        };
        let total = lessons.len();
        Ok(Some(LessonNavigation {
            current_lesson: lessons[index].clone(),
            previous_lesson: index.checked_sub(1).map(|i| lessons[i].clone()),
            next_lesson: lessons.get(index + 1).cloned(),
            current_index: index,
            total_lessons: total,
            is_first: index == 0,
            is_last: index + 1 == total,
        }))
    }

    /// Visible posts, newest first.
    #[instrument(skip_all)]
    pub async fn list_posts(&self) -> Result<Vec<Post>> {
        let mode = self.mode();
        let mut posts = self.load::<PostData, _>(|p| mode.include(p)).await?;
        stable_sort(&mut posts, by_published_desc);
        Ok(posts)
    }

    pub async fn posts_by_tag(&self, tag: &str) -> Result<Vec<Post>> {
        let mut posts = self.list_posts().await?;
        posts.retain(|p| p.data.tags.iter().any(|t| t.eq_ignore_ascii_case(tag)));
        Ok(posts)
    }

    /// Tags used by visible posts, most used first, then by name.
    pub async fn tag_counts(&self) -> Result<Vec<TagCount>> {
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for post in self.list_posts().await? {
            for tag in post.data.tags {
                *counts.entry(tag).or_default() += 1;
            }
        }
        let mut tags: Vec<TagCount> = counts
            .into_iter()
            .map(|(tag, count)| TagCount { tag, count })
            .collect();
        tags.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.tag.cmp(&b.tag)));
        Ok(tags)
    }

    pub async fn courses_by_level(&self, level: Level) -> Result<Vec<Course>> {
        let mut courses = self.list_courses().await?;
        courses.retain(|c| c.data.level == level);
        Ok(courses)
    }
}

fn lesson_matches(lesson: &Lesson, course_slug: &str, lesson_slug: &str) -> bool {
    lesson.slug == lesson_slug
        || lesson
            .slug
            .strip_prefix(course_slug)
            .and_then(|rest| rest.strip_prefix('/'))
            == Some(lesson_slug)
}
