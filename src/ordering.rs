//! Comparators for content listings and the sort primitive they run under.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

use crate::model::{Lesson, Ordered, Published};

/// Above this many items `stable_sort` switches to a merge sort.
pub const MERGE_SORT_THRESHOLD: usize = 50;

/// How lessons from different sections of one course are interleaved.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LessonOrder {
    /// Section path compared as a string, then lesson order.
    #[default]
    SectionPath,
    /// Owning section's declared `order`, then section path, then lesson order.
    SectionOrder,
}

/// Newest first.
pub fn by_published_desc<T: Published>(a: &T, b: &T) -> Ordering {
    b.published().cmp(&a.published())
}

pub fn by_order_asc<T: Ordered>(a: &T, b: &T) -> Ordering {
    a.order().cmp(&b.order())
}

pub fn by_global_lesson_order(a: &Lesson, b: &Lesson) -> Ordering {
    section_path(a)
        .cmp(section_path(b))
        .then_with(|| by_order_asc(a, b))
}

/// Comparator ranking lessons by their section's declared order. Sections
/// missing from `section_orders` sort last.
pub fn by_section_order(
    section_orders: &HashMap<String, u32>,
) -> impl Fn(&Lesson, &Lesson) -> Ordering + '_ {
    move |a, b| {
        let rank = |l: &Lesson| {
            l.section_id
                .as_deref()
                .and_then(|id| section_orders.get(id).copied())
                .unwrap_or(u32::MAX)
        };
        rank(a)
            .cmp(&rank(b))
            .then_with(|| by_global_lesson_order(a, b))
    }
}

fn section_path(lesson: &Lesson) -> &str {
    lesson.section_id.as_deref().unwrap_or("")
}

/// Stable sort. Equal elements keep their input order regardless of size.
pub fn stable_sort<T, F>(items: &mut Vec<T>, mut cmp: F)
where
    F: FnMut(&T, &T) -> Ordering,
{
    if items.len() > MERGE_SORT_THRESHOLD {
        let taken = std::mem::take(items);
        *items = merge_sort(taken, &mut cmp);
    } else {
        items.sort_by(cmp);
    }
}

fn merge_sort<T, F>(mut items: Vec<T>, cmp: &mut F) -> Vec<T>
where
    F: FnMut(&T, &T) -> Ordering,
{
    if items.len() <= 1 {
        return items;
    }
    let right = items.split_off(items.len() / 2);
    let left = merge_sort(items, cmp);
    let right = merge_sort(right, cmp);

    let mut merged = Vec::with_capacity(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();
    loop {
        // left wins ties
        let take_right = match (left.peek(), right.peek()) {
            (Some(a), Some(b)) => cmp(b, a) == Ordering::Less,
            (Some(_), None) => false,
            (None, Some(_)) => true,
            (None, None) => break,
        };
        let next = if take_right { right.next() } else { left.next() };
        merged.extend(next);
    }
    merged
}
