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

//! CLI input validators
//!
//! The `parse_*` functions are clap value parsers built on the `validate_*` checks.

use crate::core::parser::OutputFormat as ToolOutput;
use crate::core::types::validate_identifier;
use crate::core::types::PgVersion;
use crate::core::ClusterError;
use crate::core::ClusterResult;

/// Validate a cluster, role or database name
pub fn validate_name(field: &str, value: &str) -> ClusterResult<()> {
    if value.is_empty() {
        return Err(ClusterError::validation_error(field, "cannot be empty"));
    }
    validate_identifier(field, value)
}

/// Validate a TCP port; 0 would let the server pick one at random
pub fn validate_port(port: u16) -> ClusterResult<()> {
    match port {
        0 => Err(ClusterError::validation_error("port", "must be between 1 and 65535, got 0")),
        p if p < 1024 => Err(ClusterError::validation_error(
            "port",
            format!("{p} is a privileged port"),
        )),
        _ => Ok(()),
    }
}

pub fn validate_version(version: &str) -> ClusterResult<PgVersion> {
    let parsed: PgVersion = version.parse()?;
    if parsed.major() < 8 {
        return Err(ClusterError::validation_error(
            "version",
            format!("{version} is older than any version postgresql-common supports"),
        ));
    }
    Ok(parsed)
}

pub fn parse_version(value: &str) -> Result<PgVersion, String> {
    validate_version(value).map_err(|e| e.to_string())
}

pub fn parse_name(value: &str) -> Result<String, String> {
    validate_name("name", value).map_err(|e| e.to_string())?;
    Ok(value.to_string())
}

pub fn parse_port(value: &str) -> Result<u16, String> {
    let port = value.parse::<u16>().map_err(|_| format!("'{value}' is not a valid port"))?;
    validate_port(port).map_err(|e| e.to_string())?;
    Ok(port)
}

/// Accepts the names of the registered output parsers
pub fn parse_tool_output(value: &str) -> Result<String, String> {
    value.parse::<ToolOutput>().map_err(|e| e.to_string())?;
    Ok(value.to_string())
}
