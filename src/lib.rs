//! Content index for a blog with hierarchical courses (course → section → lesson).
//!
//! Records come from a [`store::ContentStore`], drafts are filtered by
//! [`visibility`], listings are sorted by [`ordering`], and
//! [`index::ContentIndex`] memoizes aggregates in a [`cache::ContentCache`].

pub mod cache;
pub mod config;
pub mod feed;
pub mod frontmatter;
pub mod index;
pub mod model;
pub mod ordering;
pub mod store;
pub mod visibility;

pub use index::{ContentIndex, IndexOptions};
pub use store::{ContentStore, FsStore, StoreError};
