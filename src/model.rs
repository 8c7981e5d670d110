use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Post,
    Course,
    Section,
    Lesson,
}

impl ContentKind {
    /// Collection name used by the store.
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Post => "posts",
            ContentKind::Course => "courses",
            ContentKind::Section => "sections",
            ContentKind::Lesson => "lessons",
        }
    }

    pub fn all() -> [ContentKind; 4] {
        [
            ContentKind::Post,
            ContentKind::Course,
            ContentKind::Section,
            ContentKind::Lesson,
        ]
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Level {
    Beginner,
    Intermediate,
    Advanced,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Beginner => "Beginner",
            Level::Intermediate => "Intermediate",
            Level::Advanced => "Advanced",
        }
    }
}

/// A loaded content record with typed front matter.
///
/// `course_id` is set on sections and lessons, `section_id` on lessons. Both
/// are filled by the store from the directory hierarchy.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Entry<D> {
    pub id: String,
    pub slug: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section_id: Option<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub body: String,
    pub data: D,
}

pub type Post = Entry<PostData>;
pub type Course = Entry<CourseData>;
pub type Section = Entry<SectionData>;
pub type Lesson = Entry<LessonData>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PostData {
    pub title: String,
    #[serde(deserialize_with = "de_date")]
    pub published: DateTime<Utc>,
    #[serde(default, deserialize_with = "de_opt_date", skip_serializing_if = "Option::is_none")]
    pub updated: Option<DateTime<Utc>>,
    #[serde(default)]
    pub draft: bool,
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CourseData {
    pub title: String,
    pub description: String,
    pub level: Level,
    pub category: String,
    #[serde(deserialize_with = "de_date")]
    pub published: DateTime<Utc>,
    #[serde(default)]
    pub draft: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SectionData {
    pub title: String,
    pub order: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LessonData {
    pub title: String,
    pub order: u32,
    #[serde(deserialize_with = "de_date")]
    pub published: DateTime<Utc>,
    #[serde(default)]
    pub draft: bool,
}

/// Front-matter schemas that can be decoded from a store entry.
pub trait Schema: Clone + Send + Sync + for<'de> Deserialize<'de> + 'static {
    const KIND: ContentKind;

    /// `None` when the schema has no draft flag at all.
    fn draft(&self) -> Option<bool> {
        None
    }

    /// Explicit ordering field, for schemas that have one.
    fn order(&self) -> Option<u32> {
        None
    }
}

impl Schema for PostData {
    const KIND: ContentKind = ContentKind::Post;

    fn draft(&self) -> Option<bool> {
        Some(self.draft)
    }
}

impl Schema for CourseData {
    const KIND: ContentKind = ContentKind::Course;

    fn draft(&self) -> Option<bool> {
        Some(self.draft)
    }
}

impl Schema for SectionData {
    const KIND: ContentKind = ContentKind::Section;

    fn order(&self) -> Option<u32> {
        Some(self.order)
    }
}

impl Schema for LessonData {
    const KIND: ContentKind = ContentKind::Lesson;

    fn draft(&self) -> Option<bool> {
        Some(self.draft)
    }

    fn order(&self) -> Option<u32> {
        Some(self.order)
    }
}

/// Records carrying a publication date.
pub trait Published {
    fn published(&self) -> DateTime<Utc>;
}

/// Records carrying an explicit `order` field.
pub trait Ordered {
    fn order(&self) -> u32;
}

impl Published for Post {
    fn published(&self) -> DateTime<Utc> {
        self.data.published
    }
}

impl Published for Course {
    fn published(&self) -> DateTime<Utc> {
        self.data.published
    }
}

impl Published for Lesson {
    fn published(&self) -> DateTime<Utc> {
        self.data.published
    }
}

impl Ordered for Section {
    fn order(&self) -> u32 {
        self.data.order
    }
}

impl Ordered for Lesson {
    fn order(&self) -> u32 {
        self.data.order
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LessonNavigation {
    pub current_lesson: Lesson,
    pub previous_lesson: Option<Lesson>,
    pub next_lesson: Option<Lesson>,
    pub current_index: usize,
    pub total_lessons: usize,
    pub is_first: bool,
    pub is_last: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CourseBundle {
    pub course: Course,
    pub sections: Vec<Section>,
    pub lessons: Vec<Lesson>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveKind {
    Post,
    Course,
    Lesson,
}

/// Flattened, type-tagged row of the combined timeline.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ArchiveItem {
    #[serde(rename = "type")]
    pub kind: ArchiveKind,
    pub slug: String,
    pub title: String,
    pub published: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section_title: Option<String>,
}

impl Published for ArchiveItem {
    fn published(&self) -> DateTime<Utc> {
        self.published
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeedItem {
    PinnedCourse { course: Course, total_lessons: usize },
    Post { post: Post },
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TagCount {
    pub tag: String,
    pub count: usize,
}

/// Parses `YYYY-MM-DD` (midnight UTC) or an RFC 3339 timestamp.
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?;
    let midnight = date.and_hms_opt(0, 0, 0)?;
    Some(Utc.from_utc_datetime(&midnight))
}

fn de_date<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_date(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid date '{}'", raw)))
}

fn de_opt_date<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(raw) => parse_date(&raw)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid date '{}'", raw))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn parse_plain_and_rfc3339_dates() {
        let d = parse_date("2024-03-05").unwrap();
        assert_eq!((d.year(), d.month(), d.day()), (2024, 3, 5));

        let t = parse_date("2024-03-05T10:00:00+02:00").unwrap();
        assert_eq!(t.to_rfc3339(), "2024-03-05T08:00:00+00:00");

        assert!(parse_date("March 5th").is_none());
    }

    #[test]
    fn post_defaults_apply() {
        let yaml = "title: Hello\npublished: 2024-01-02\ndescription: hi\n";
        let data: PostData = serde_yaml::from_str(yaml).unwrap();
        assert!(!data.draft);
        assert!(data.tags.is_empty());
        assert!(data.updated.is_none());
    }

    #[test]
    fn course_level_must_be_known() {
        let yaml = "title: C\ndescription: d\nlevel: Expert\ncategory: mobile\npublished: 2024-01-02\n";
        assert!(serde_yaml::from_str::<CourseData>(yaml).is_err());
    }

    #[test]
    fn kinds_map_to_collections() {
        let names: Vec<_> = ContentKind::all().iter().map(|k| k.as_str()).collect();
        assert_eq!(names, vec!["posts", "courses", "sections", "lessons"]);
    }
}
