//! The library code for `gazette`, a content-feed formatter for static sites.
//! The site pipeline hands us a list of content items; we order them, render
//! them through templates, and syndicate them:
//!
//! 1. Loading items and ordering them into the posts collection
//!    ([`crate::item`])
//! 2. Formatting dates, excerpts, and slices ([`crate::filters`]), exposed to
//!    templates as filters ([`crate::template`])
//! 3. Writing the Atom feed ([`crate::feed`])
//!
//! [`crate::build::build_site`] runs all of them against a project
//! configuration ([`crate::config`]) and copies passthrough assets.
//!
//! The filters are the only part with real rules to them, and they are
//! deliberately literal: `excerpt` strips tags with a pattern rather than a
//! parser, and `head` clamps its count instead of failing.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod build;
pub mod config;
pub mod feed;
pub mod filters;
pub mod item;
pub mod template;
