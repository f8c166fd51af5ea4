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

//! Selection of the compiled-in backend.
//!
//! Exactly one real backend is burned into a build; runtime selection only
//! decides between that backend and nothing. [`select`] therefore succeeds
//! only when the requested name matches the compiled backend,
//! case-insensitively. Multi-backend runtime selection is not supported.

use crate::backend::null::NullBackend;
use dsys_core::error::{PlatformError, PlatformResult};
use dsys_core::platform::PlatformBackend;

/// Returns the name of the backend compiled into this build.
///
/// Builds without a real platform backend compile the null backend as
/// their primary, which keeps headless/CI targets first-class.
pub fn compiled_backend_name() -> &'static str {
    NullBackend::NAME
}

/// Creates the backend compiled into this build, uninitialized.
pub fn create_compiled() -> Box<dyn PlatformBackend> {
    Box::new(NullBackend::new())
}

/// Creates the deterministic null backend, uninitialized.
pub fn create_null() -> Box<dyn PlatformBackend> {
    Box::new(NullBackend::new())
}

/// Resolves a backend by name against the compiled-in choice.
///
/// Matching is case-insensitive; any other name fails, it does not fall
/// back. Fallback to the null backend is the dispatcher's job, at init.
pub fn select(name: &str) -> PlatformResult<Box<dyn PlatformBackend>> {
    if name.eq_ignore_ascii_case(compiled_backend_name()) {
        Ok(create_compiled())
    } else {
        Err(PlatformError::NotFound(format!(
            "backend '{name}' is not compiled into this build (have '{}')",
            compiled_backend_name()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_matches_case_insensitively() {
        assert!(select("null").is_ok());
        assert!(select("NULL").is_ok());
        assert!(select("Null").is_ok());
    }

    #[test]
    fn select_rejects_unknown_backends() {
        assert!(matches!(
            select("win32"),
            Err(PlatformError::NotFound(_))
        ));
    }
}
