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

//! # Dsys Platform
//!
//! The concrete platform layer: the backend dispatcher (an application-owned
//! [`Platform`] context object), the deterministic null backend every build
//! can fall back to, and the translation layer that turns raw OS input into
//! engine events.
//!
//! Real per-OS backends implement the traits from `dsys-core` and plug in
//! here; nothing above this crate ever sees a toolkit type.

#![warn(missing_docs)]

pub mod backend;
pub mod dispatch;
pub mod input;

pub use backend::null::NullBackend;
pub use dispatch::registry;
pub use dispatch::{DirId, FileId, Platform, PlatformConfig, ProcessId, WindowId};
pub use input::{CaptureBatch, RawInput, CAPTURE_BATCH_CAPACITY};
