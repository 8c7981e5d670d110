//! Memoized aggregation results.
//!
//! One cache instance is owned by a [`ContentIndex`](crate::index::ContentIndex)
//! and lives as long as the build process, or until [`ContentCache::clear`].
//! Freshness is tracked with a single timestamp for the whole cache: once it
//! expires every key-space is dropped together.
//!
//! Lifetime is derived from the build mode at access time unless an explicit
//! TTL is configured:
//!
//! | Mode | Lifetime |
//! |------|----------|
//! | development | zero, every read is a miss and nothing is stored |
//! | production | until cleared |

use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;

use crate::model::{Course, Lesson, Section};
use crate::visibility::BuildMode;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CacheTtl {
    /// Zero outside production, unbounded in production.
    #[default]
    FromMode,
    After(Duration),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifetime {
    Zero,
    Bounded(Duration),
    Forever,
}

impl CacheTtl {
    fn lifetime(&self, mode: &BuildMode) -> Lifetime {
        match self {
            CacheTtl::After(d) if d.is_zero() => Lifetime::Zero,
            CacheTtl::After(d) => Lifetime::Bounded(*d),
            CacheTtl::FromMode if mode.is_production() => Lifetime::Forever,
            CacheTtl::FromMode => Lifetime::Zero,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Courses,
    CourseLessons(String),
    CourseSections(String),
    SectionLessons(String),
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::Courses => write!(f, "courses"),
            CacheKey::CourseLessons(slug) => write!(f, "courseLessons[{}]", slug),
            CacheKey::CourseSections(slug) => write!(f, "courseSections[{}]", slug),
            CacheKey::SectionLessons(slug) => write!(f, "sectionLessons[{}]", slug),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CachedValue {
    Courses(Vec<Course>),
    Sections(Vec<Section>),
    Lessons(Vec<Lesson>),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} hits, {} misses, {} entries",
            self.hits, self.misses, self.entries
        )
    }
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<CacheKey, CachedValue>,
    refreshed_at: Option<Instant>,
    hits: u64,
    misses: u64,
}

impl CacheState {
    fn reset(&mut self) {
        self.entries.clear();
        self.refreshed_at = None;
    }

    /// Whether stored entries may be served. Drops every key-space once a
    /// bounded lifetime has run out.
    fn fresh(&mut self, lifetime: Lifetime) -> bool {
        let refreshed_at = self.refreshed_at;
        match lifetime {
            Lifetime::Zero => false,
            Lifetime::Forever => true,
            Lifetime::Bounded(ttl) => match refreshed_at {
                Some(at) if at.elapsed() >= ttl => {
                    debug!("cache expired; dropping all entries");
                    self.reset();
                    false
                }
                _ => true,
            },
        }
    }
}

#[derive(Debug, Default)]
pub struct ContentCache {
    ttl: CacheTtl,
    state: Mutex<CacheState>,
}

impl ContentCache {
    pub fn new(ttl: CacheTtl) -> Self {
        Self {
            ttl,
            state: Mutex::new(CacheState::default()),
        }
    }

    pub fn ttl(&self) -> CacheTtl {
        self.ttl
    }

    pub async fn get(&self, key: &CacheKey, mode: &BuildMode) -> Option<CachedValue> {
        let mut state = self.state.lock().await;
        let value = if state.fresh(self.ttl.lifetime(mode)) {
            state.entries.get(key).cloned()
        } else {
            None
        };
        match value {
            Some(v) => {
                state.hits += 1;
                debug!(%key, "cache hit");
                Some(v)
            }
            None => {
                state.misses += 1;
                debug!(%key, "cache miss");
                None
            }
        }
    }

    pub async fn put(&self, key: CacheKey, value: CachedValue, mode: &BuildMode) {
        if self.ttl.lifetime(mode) == Lifetime::Zero {
            return;
        }
        let mut state = self.state.lock().await;
        // a write after expiry starts a new generation
        state.fresh(self.ttl.lifetime(mode));
        if state.refreshed_at.is_none() {
            state.refreshed_at = Some(Instant::now());
        }
        state.entries.insert(key, value);
    }

    pub async fn courses(&self, mode: &BuildMode) -> Option<Vec<Course>> {
        match self.get(&CacheKey::Courses, mode).await {
            Some(CachedValue::Courses(v)) => Some(v),
            _ => None,
        }
    }

    pub async fn sections(&self, key: &CacheKey, mode: &BuildMode) -> Option<Vec<Section>> {
        match self.get(key, mode).await {
            Some(CachedValue::Sections(v)) => Some(v),
            _ => None,
        }
    }

    pub async fn lessons(&self, key: &CacheKey, mode: &BuildMode) -> Option<Vec<Lesson>> {
        match self.get(key, mode).await {
            Some(CachedValue::Lessons(v)) => Some(v),
            _ => None,
        }
    }

    /// Drop every key-space and the freshness timestamp.
    pub async fn clear(&self) {
        self.state.lock().await.reset();
    }

    pub async fn stats(&self) -> CacheStats {
        let state = self.state.lock().await;
        CacheStats {
            hits: state.hits,
            misses: state.misses,
            entries: state.entries.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lessons_value() -> CachedValue {
        CachedValue::Lessons(Vec::new())
    }

    #[tokio::test]
    async fn production_keeps_entries_until_cleared() {
        let cache = ContentCache::default();
        let prod = BuildMode::production();
        let key = CacheKey::CourseLessons("c".into());

        assert!(cache.lessons(&key, &prod).await.is_none());
        cache.put(key.clone(), lessons_value(), &prod).await;
        assert_eq!(cache.lessons(&key, &prod).await, Some(Vec::new()));

        cache.clear().await;
        assert!(cache.lessons(&key, &prod).await.is_none());

        let stats = cache.stats().await;
        assert_eq!((stats.hits, stats.misses, stats.entries), (1, 2, 0));
    }

    #[tokio::test]
    async fn development_never_stores() {
        let cache = ContentCache::default();
        let dev = BuildMode::development();
        cache.put(CacheKey::Courses, CachedValue::Courses(Vec::new()), &dev).await;
        assert!(cache.courses(&dev).await.is_none());
        assert_eq!(cache.stats().await.entries, 0);
    }

    #[tokio::test]
    async fn clear_is_idempotent_on_empty_cache() {
        let cache = ContentCache::default();
        cache.clear().await;
        cache.clear().await;
        assert_eq!(cache.stats().await, CacheStats::default());
    }

    #[tokio::test]
    async fn bounded_ttl_expires_every_key_space() {
        let cache = ContentCache::new(CacheTtl::After(Duration::from_millis(20)));
        let dev = BuildMode::development();
        let a = CacheKey::SectionLessons("c/01".into());
        let b = CacheKey::CourseSections("c".into());
        cache.put(a.clone(), lessons_value(), &dev).await;
        cache.put(b.clone(), CachedValue::Sections(Vec::new()), &dev).await;
        assert!(cache.lessons(&a, &dev).await.is_some());

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert!(cache.lessons(&a, &dev).await.is_none());
        assert_eq!(cache.stats().await.entries, 0);
        assert!(cache.sections(&b, &dev).await.is_none());
    }

    #[tokio::test]
    async fn write_after_expiry_starts_a_fresh_generation() {
        let cache = ContentCache::new(CacheTtl::After(Duration::from_millis(50)));
        let prod = BuildMode::production();
        let b = CacheKey::CourseSections("c".into());
        cache.put(CacheKey::Courses, CachedValue::Courses(Vec::new()), &prod).await;

        tokio::time::sleep(Duration::from_millis(60)).await;
        cache.put(b.clone(), CachedValue::Sections(Vec::new()), &prod).await;

        assert_eq!(cache.sections(&b, &prod).await, Some(Vec::new()));
        assert!(cache.courses(&prod).await.is_none());
        assert_eq!(cache.stats().await.entries, 1);
    }

    #[tokio::test]
    async fn typed_accessors_ignore_mismatched_values() {
        let cache = ContentCache::default();
        let prod = BuildMode::production();
        let key = CacheKey::CourseSections("c".into());
        cache.put(key.clone(), lessons_value(), &prod).await;
        assert!(cache.sections(&key, &prod).await.is_none());
    }

    #[test]
    fn keys_display_like_key_spaces() {
        assert_eq!(CacheKey::Courses.to_string(), "courses");
        assert_eq!(
            CacheKey::SectionLessons("c/01".into()).to_string(),
            "sectionLessons[c/01]"
        );
    }
}
