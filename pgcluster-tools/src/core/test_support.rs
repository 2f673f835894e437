// Copyright 2023 The PgCluster Rust Authors
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

use std::collections::HashMap;
use std::collections::VecDeque;

use parking_lot::Mutex;

use crate::core::runner::CommandLine;
use crate::core::runner::CommandOutput;
use crate::core::runner::CommandRunner;
use crate::core::ClusterResult;

/// Replays canned outputs per program. The last queued response of a program is repeated once
/// the queue is drained; programs without any response exit 0 with empty output.
#[derive(Default)]
pub(crate) struct ScriptedRunner {
    responses: Mutex<HashMap<String, VecDeque<CommandOutput>>>,
    calls: Mutex<Vec<CommandLine>>,
}

impl ScriptedRunner {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn respond(&self, program: &str, exit_code: i32, stdout: &str, stderr: &str) {
        self.responses
            .lock()
            .entry(program.to_string())
            .or_default()
            .push_back(CommandOutput {
                stdout: stdout.to_string(),
                stderr: stderr.to_string(),
                exit_code: Some(exit_code),
            });
    }

    pub(crate) fn calls(&self) -> Vec<CommandLine> {
        self.calls.lock().clone()
    }

    pub(crate) fn calls_to(&self, program: &str) -> usize {
        self.calls.lock().iter().filter(|c| c.program() == program).count()
    }
}

impl CommandRunner for ScriptedRunner {
    async fn execute(&self, command: &CommandLine) -> ClusterResult<CommandOutput> {
        self.calls.lock().push(command.clone());
        let mut responses = self.responses.lock();
        let output = match responses.get_mut(command.program()) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap_or_default(),
            Some(queue) => queue.front().cloned().unwrap_or_default(),
            None => CommandOutput {
                exit_code: Some(0),
                ..Default::default()
            },
        };
        Ok(output)
    }
}
