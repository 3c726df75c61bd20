// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Inbound sync: reconcile changed remote records into local entities.
//!
//! [`PullFetcher`] finds changed records per mapping and hands each one to
//! [`PullProcessor`], which decides between create, update and no-op.

mod fetch;
mod processor;

pub use fetch::{build_pull_query, PullFetcher, PullRunSummary};
pub use processor::{PullBatchReport, PullItem, PullOutcome, PullProcessor};
