//! UGC blog backend library.
//!
//! Serves the post API for the blog's browser client, proxies hashtag searches
//! to the Twitter/X API, and bridges Google sign-in back to the client window.

pub mod auth;
pub mod config;
pub mod db;
pub mod hashtag;
pub mod posts;
pub mod web;
