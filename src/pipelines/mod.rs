// SPDX-License-Identifier: MPL-2.0

//! Processing pipelines
//!
//! ```text
//! ┌──────────────┐     ┌───────────────────┐     ┌──────────────┐
//! │ Camera Frame │ ──▶ │  Photo Pipeline   │ ──▶ │ JPEG/PNG file│
//! │ (YUYV, MJPG…)│     │  - → RGB          │     │              │
//! │              │     │  - Orientation    │     │              │
//! │              │     │  - Encoding       │     │              │
//! └──────────────┘     └───────────────────┘     └──────────────┘
//! ```
//!
//! Heavy work runs on tokio's blocking pool so the preview keeps drawing.

pub mod photo;
