// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Outbound sync: the push queue, its processors and change capture.
//!
//! Item lifecycle:
//!
//! ```text
//! pending -> claimed -> deleted                  (success)
//!                    -> pending, fail_count + 1  (retry)
//!                    -> dropped                  (retries exhausted or terminal error)
//! ```

mod capture;
mod item;
mod processor;
mod queue;

pub use capture::{CaptureOutcome, Captured, ChangeCapture};
pub use item::QueueItem;
pub use processor::{BatchReport, ProcessorRegistry, PushProcessor, RestProcessor};
pub use queue::{FailOutcome, PushQueue, PushRunSummary, PushScope};
