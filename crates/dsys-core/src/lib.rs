// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! # Dsys Core
//!
//! Foundational crate for the platform services layer: the backend contract
//! every platform implementation must satisfy, the engine-level event model
//! and its bounded queue, the input-trace canonicalizer used for
//! cross-backend determinism testing, and the shared report/time utilities
//! consumed by the guard and telemetry subsystems.

#![warn(missing_docs)]

pub mod error;
pub mod event;
pub mod platform;
pub mod report;
pub mod time;
pub mod trace;

pub use error::{ErrorCode, LastError, PlatformError, PlatformResult};
pub use event::{Event, EventKind, EventQueue, KeyCode, MouseButton};
pub use report::ActStamp;
pub use time::Stopwatch;
