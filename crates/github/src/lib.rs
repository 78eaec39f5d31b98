//! autocut GitHub infrastructure adapter.
//!
//! Implements the ports defined in the [`autocut`] crate (`IssueTracker`,
//! `ProjectBoard`) against the GitHub REST API using [`reqwest`].
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** This crate must not contain domain rules.
//! All GitHub API details (authentication, pagination, rate-limit signalling)
//! are handled here; the [`autocut`] crate never sees them.
//!
//! | Module     | Contents                                                   |
//! |------------|------------------------------------------------------------|
//! | `client`   | [`GithubClient`], [`GithubConfig`], request and paging     |
//! | `issues`   | `IssueTracker` over `/repos/{owner}/{repo}/issues`         |
//! | `projects` | `ProjectBoard` over classic organization projects          |
//! | `models`   | Wire DTOs                                                  |
//! | `errors`   | [`GithubError`] and its mapping to `TrackerError`          |
//!
//! Pull requests are returned by the issues endpoint; they are filtered out
//! before anything reaches the domain.

mod client;
mod errors;
mod issues;
mod models;
mod projects;

pub use client::{GithubClient, GithubConfig, DEFAULT_API_BASE};
pub use errors::GithubError;
