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

//! Process-spawning abstractions of the backend contract.

use crate::error::PlatformResult;
use std::path::PathBuf;

/// A command line to spawn.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessCommand {
    /// The program to run.
    pub program: String,
    /// Arguments, not including the program name.
    pub args: Vec<String>,
    /// Working directory, or inherit when `None`.
    pub cwd: Option<PathBuf>,
}

impl ProcessCommand {
    /// Creates a command for the given program with no arguments.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
        }
    }

    /// Appends an argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Sets the working directory.
    pub fn cwd(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }
}

/// A spawned child process owned by a backend.
pub trait BackendProcess {
    /// Blocks until the child exits and returns its exit code.
    fn wait(&mut self) -> PlatformResult<i32>;

    /// Forcibly terminates the child. Idempotent; a child that already
    /// exited is left alone.
    fn destroy(&mut self);
}
