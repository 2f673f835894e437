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

use std::io;

use thiserror::Error;

/// Errors raised while parsing administrative output or driving a cluster
#[derive(Debug, Error)]
pub enum ClusterError {
    // ============================================================================
    // Parsing Errors
    // ============================================================================
    /// The requested output format has no parser
    #[error("Unsupported output format '{format}'")]
    UnsupportedFormat { format: String },

    /// A required field of a single-record format is missing or malformed
    #[error("Failed to parse {format} output: field '{field}' {reason}")]
    ParseError {
        format: &'static str,
        field: &'static str,
        reason: String,
    },

    /// One row of a multi-record format is malformed
    #[error("Failed to parse {format} line {line_number} '{line}': {reason}")]
    RowParseError {
        format: &'static str,
        line_number: usize,
        line: String,
        reason: String,
    },

    // ============================================================================
    // Cluster State Errors
    // ============================================================================
    /// A cluster with the same version and name is already present
    #[error("Cluster {version}/{name} already exists")]
    ClusterAlreadyExists { version: String, name: String },

    /// The requested port is reserved by another cluster
    #[error("Port {port} is already assigned to cluster {cluster}")]
    PortInUse { port: u16, cluster: String },

    /// The cluster is not reported by the cluster listing
    #[error("Cluster {version}/{name} not found")]
    ClusterNotFound { version: String, name: String },

    /// The cluster is still listed after a best-effort teardown
    #[error("Cluster {cluster} is still present after teardown")]
    TeardownIncomplete { cluster: String },

    /// The cluster exists but is not accepting connections
    #[error("Cluster {version}/{name} is not online (status: {status})")]
    ClusterNotOnline {
        version: String,
        name: String,
        status: String,
    },

    // ============================================================================
    // External Command Errors
    // ============================================================================
    /// An administrative command exited unsuccessfully
    #[error("Command `{command}` failed with {}: {stderr}", exit_code.map(|c| format!("exit status {c}")).unwrap_or_else(|| "no exit status".to_string()))]
    CommandFailed {
        command: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    /// One SQL statement of a batch failed
    #[error("Statement #{index} failed: {error}\n  statement: {statement}")]
    StatementFailed {
        index: usize,
        statement: String,
        error: String,
    },

    // ============================================================================
    // Input & Environment Errors
    // ============================================================================
    /// Input validation failed
    #[error("Validation failed for '{field}': {reason}")]
    Validation { field: String, reason: String },

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors, e.g. a program that cannot be spawned
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl ClusterError {
    #[inline]
    pub fn unsupported_format(format: impl Into<String>) -> Self {
        Self::UnsupportedFormat { format: format.into() }
    }

    #[inline]
    pub fn parse_error(format: &'static str, field: &'static str, reason: impl Into<String>) -> Self {
        Self::ParseError {
            format,
            field,
            reason: reason.into(),
        }
    }

    #[inline]
    pub fn row_parse_error(
        format: &'static str,
        line_number: usize,
        line: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::RowParseError {
            format,
            line_number,
            line: line.into(),
            reason: reason.into(),
        }
    }

    #[inline]
    pub fn cluster_already_exists(version: impl ToString, name: impl Into<String>) -> Self {
        Self::ClusterAlreadyExists {
            version: version.to_string(),
            name: name.into(),
        }
    }

    #[inline]
    pub fn port_in_use(port: u16, cluster: impl Into<String>) -> Self {
        Self::PortInUse {
            port,
            cluster: cluster.into(),
        }
    }

    #[inline]
    pub fn cluster_not_found(version: impl ToString, name: impl Into<String>) -> Self {
        Self::ClusterNotFound {
            version: version.to_string(),
            name: name.into(),
        }
    }

    #[inline]
    pub fn cluster_not_online(version: impl ToString, name: impl Into<String>, status: impl ToString) -> Self {
        Self::ClusterNotOnline {
            version: version.to_string(),
            name: name.into(),
            status: status.to_string(),
        }
    }

    #[inline]
    pub fn teardown_incomplete(cluster: impl Into<String>) -> Self {
        Self::TeardownIncomplete { cluster: cluster.into() }
    }

    #[inline]
    pub fn command_failed(command: impl Into<String>, exit_code: Option<i32>, stderr: impl Into<String>) -> Self {
        Self::CommandFailed {
            command: command.into(),
            exit_code,
            stderr: stderr.into(),
        }
    }

    #[inline]
    pub fn statement_failed(index: usize, statement: impl Into<String>, error: impl Into<String>) -> Self {
        Self::StatementFailed {
            index,
            statement: statement.into(),
            error: error.into(),
        }
    }

    #[inline]
    pub fn validation_error(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Row errors are the only kind a multi-record parse may skip
    #[inline]
    pub fn is_row_error(&self) -> bool {
        matches!(self, Self::RowParseError { .. })
    }
}

impl From<config::ConfigError> for ClusterError {
    fn from(e: config::ConfigError) -> Self {
        Self::Config(e.to_string())
    }
}

/// Result type alias for cluster operations
pub type ClusterResult<T> = std::result::Result<T, ClusterError>;
