// SPDX-License-Identifier: GPL-3.0-only

//! Message handler modules
//!
//! Handlers are grouped by concern; each adds methods to `CaptureScreen`.

pub mod camera;
pub mod capture;
pub mod system;
