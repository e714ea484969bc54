//! Pipeline stages for Markdown-to-rows extraction.
//!
//! Each submodule implements exactly one transformation step, so each can be
//! tested on its own and reused by callers that bring their own text
//! producer.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ pages ──▶ classify ──▶ outline
//! (URL/path) (split)   (rows)       (enrich)
//!                         │
//!                     normalize
//! ```
//!
//! 1. [`input`]     — read the user-supplied path or download the URL
//! 2. [`pages`]     — cut the bytes into page segments, decoding each one
//!    separately so a bad page is isolated
//! 3. [`classify`]  — one pass per page: headings, tables, bullets, text
//!    sentences, each tagged with the heading context in effect
//! 4. [`normalize`] — idempotent text cleanup applied to every emitted field
//! 5. [`outline`]   — fill empty `h1`/`h2`/`h3` from a PDF outline, strictly
//!    after classification

pub mod classify;
pub mod input;
pub mod normalize;
pub mod outline;
pub mod pages;
