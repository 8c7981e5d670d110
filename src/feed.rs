//! Combined timeline and the main feed with its optional pinned course.

use futures::future::try_join_all;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{instrument, warn};

use crate::index::ContentIndex;
use crate::model::{ArchiveItem, ArchiveKind, Course, FeedItem, Lesson, Post, Section};
use crate::ordering::{by_published_desc, stable_sort};
use crate::store::Result;

static ORDER_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+[-_]").expect("valid order prefix regex"));

/// Drop a leading `NN-` ordering prefix from a path segment.
pub fn strip_order_prefix(segment: &str) -> &str {
    match ORDER_PREFIX.find(segment) {
        Some(m) if m.end() < segment.len() => &segment[m.end()..],
        _ => segment,
    }
}

fn last_segment(slug: &str) -> &str {
    slug.rsplit('/').next().unwrap_or(slug)
}

pub fn post_url(post: &Post) -> String {
    format!("/blog/{}/", post.slug)
}

pub fn course_url(course: &Course) -> String {
    format!("/courses/{}/", course.slug)
}

pub fn lesson_url(course: &Course, section: &Section, lesson: &Lesson) -> String {
    format!(
        "/courses/{}/{}/{}/",
        course.slug,
        strip_order_prefix(last_segment(&section.slug)),
        strip_order_prefix(last_segment(&lesson.slug)),
    )
}

fn post_item(post: Post) -> ArchiveItem {
    ArchiveItem {
        kind: ArchiveKind::Post,
        url: post_url(&post),
        title: post.data.title,
        published: post.data.published,
        description: Some(post.data.description),
        slug: post.slug,
        course_title: None,
        section_title: None,
    }
}

fn course_item(course: &Course) -> ArchiveItem {
    ArchiveItem {
        kind: ArchiveKind::Course,
        slug: course.slug.clone(),
        title: course.data.title.clone(),
        published: course.data.published,
        description: Some(course.data.description.clone()),
        url: course_url(course),
        course_title: None,
        section_title: None,
    }
}

fn lesson_item(course: &Course, section: &Section, lesson: Lesson) -> ArchiveItem {
    ArchiveItem {
        kind: ArchiveKind::Lesson,
        url: lesson_url(course, section, &lesson),
        slug: lesson.slug,
        title: lesson.data.title,
        published: lesson.data.published,
        description: None,
        course_title: Some(course.data.title.clone()),
        section_title: Some(section.data.title.clone()),
    }
}

impl ContentIndex {
    /// Posts, courses and lessons on one timeline, newest first.
    #[instrument(skip_all)]
    pub async fn get_combined_archive(&self) -> Result<Vec<ArchiveItem>> {
        let (posts, courses) = futures::try_join!(self.list_posts(), self.list_courses())?;
        let lesson_groups = try_join_all(courses.iter().map(|c| self.course_lesson_items(c))).await?;

        let mut items: Vec<ArchiveItem> = posts.into_iter().map(post_item).collect();
        items.extend(courses.iter().map(course_item));
        items.extend(lesson_groups.into_iter().flatten());
        stable_sort(&mut items, by_published_desc);
        Ok(items)
    }

    async fn course_lesson_items(&self, course: &Course) -> Result<Vec<ArchiveItem>> {
        let sections = self.list_sections(&course.slug).await?;
        let per_section = try_join_all(sections.iter().map(|s| self.list_lessons(&s.slug))).await?;
        Ok(sections
            .iter()
            .zip(per_section)
            .flat_map(|(section, lessons)| {
                lessons
                    .into_iter()
                    .map(move |lesson| lesson_item(course, section, lesson))
            })
            .collect())
    }

    /// Visible posts, newest first, preceded by the pinned course when one is
    /// configured and resolvable. Pinned-course failures never fail the feed.
    #[instrument(skip_all)]
    pub async fn get_feed_with_pinned_course(&self) -> Result<Vec<FeedItem>> {
        let (pinned, posts) = futures::join!(self.resolve_pinned_course(), self.list_posts());
        let posts = posts?;

        let mut feed = Vec::with_capacity(posts.len() + 1);
        feed.extend(pinned);
        feed.extend(posts.into_iter().map(|post| FeedItem::Post { post }));
        Ok(feed)
    }

    async fn resolve_pinned_course(&self) -> Option<FeedItem> {
        let pinning = &self.options.pinning;
        if !pinning.enable_pinning {
            return None;
        }
        let slug = pinning.pinned_course_slug.trim();
        if slug.is_empty() {
            warn!("pinning enabled without a course slug");
            return None;
        }

        let course = match self.get_course(slug).await {
            Ok(Some(course)) if !course.data.draft => course,
            Ok(Some(_)) => {
                warn!(slug, "pinned course is a draft; feed rendered without it");
                return None;
            }
            Ok(None) => {
                warn!(slug, "pinned course not found; feed rendered without it");
                return None;
            }
            Err(err) => {
                warn!(slug, error = %err, "failed to load pinned course; feed rendered without it");
                return None;
            }
        };
        match self.get_lesson_count(slug).await {
            Ok(total_lessons) => Some(FeedItem::PinnedCourse {
                course,
                total_lessons,
            }),
            Err(err) => {
                warn!(slug, error = %err, "failed to count pinned course lessons; feed rendered without it");
                None
            }
        }
    }
}
