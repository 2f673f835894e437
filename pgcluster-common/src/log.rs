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

use std::str::FromStr;

use tracing::Level;

/// Initializes the logger.
///
/// The log level is read from the `RUST_LOG` environment variable, defaulting to "INFO" if it is
/// not set or cannot be parsed. Log lines go to stderr so that command output on stdout stays
/// machine readable.
pub fn init_logger() {
    init_logger_with_level(level_from_env(std::env::var("RUST_LOG").ok().as_deref()));
}

pub fn init_logger_with_level(level: Level) {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_level(true)
        .with_line_number(true)
        .with_target(false)
        .with_max_level(level)
        .init();
}

fn level_from_env(value: Option<&str>) -> Level {
    value
        .and_then(|v| Level::from_str(v.trim()).ok())
        .unwrap_or(Level::INFO)
}
