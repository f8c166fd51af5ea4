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

//! The dispatcher's window registry.
//!
//! Window ids are assigned here, monotonically and independently of which
//! backend created the window, so outgoing events can be tagged with a
//! stable owner id under any backend.

use dsys_core::platform::BackendWindow;

/// A dispatcher-issued window identifier. Never zero; zero marks "unset"
/// in event metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowId(pub u32);

/// Live windows, in creation order.
pub struct WindowRegistry {
    entries: Vec<(u32, Box<dyn BackendWindow>)>,
    next_id: u32,
}

impl Default for WindowRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl WindowRegistry {
    /// Creates an empty registry. Ids start at 1.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 1,
        }
    }

    /// Registers a window and returns its new id.
    pub fn insert(&mut self, window: Box<dyn BackendWindow>) -> WindowId {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.push((id, window));
        WindowId(id)
    }

    /// Looks up a live window.
    pub fn get_mut(&mut self, id: WindowId) -> Option<&mut (dyn BackendWindow + 'static)> {
        self.entries
            .iter_mut()
            .find(|(existing, _)| *existing == id.0)
            .map(|(_, window)| window.as_mut())
    }

    /// Immutable lookup of a live window.
    pub fn get(&self, id: WindowId) -> Option<&dyn BackendWindow> {
        self.entries
            .iter()
            .find(|(existing, _)| *existing == id.0)
            .map(|(_, window)| window.as_ref())
    }

    /// Removes a window, returning whether it existed.
    pub fn remove(&mut self, id: WindowId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(existing, _)| *existing != id.0);
        self.entries.len() != before
    }

    /// The oldest live window's id, used to tag window-scoped events that
    /// arrive without an owner.
    pub fn primary_id(&self) -> Option<WindowId> {
        self.entries.first().map(|(id, _)| WindowId(*id))
    }

    /// Number of live windows.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no windows are live.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every window. Ids are not reused afterwards.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
