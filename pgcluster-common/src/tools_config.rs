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

//! Tool-wide configuration: where the administrative programs live, how strictly their output is
//! parsed, and which roles/extensions a fresh cluster receives.

use std::path::Path;
use std::path::PathBuf;

use pgcluster_error::ClusterResult;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;

use crate::utils::parse_config_file::parse_config_file;

pub const ENV_PREFIX: &str = "PGCLUSTER";
pub const DEFAULT_SOCKET_DIR: &str = "/var/run/postgresql";

/// What a multi-record parser does with a malformed row
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParsePolicy {
    /// Drop the row, log a warning and keep parsing
    #[default]
    Skip,
    /// Return the first row error
    FailFast,
}

/// Names of the administrative programs, resolved against `bin_dir` when it is set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgramNames {
    pub lsclusters: String,
    pub createcluster: String,
    pub ctlcluster: String,
    pub dropcluster: String,
    pub createdb: String,
    pub dropdb: String,
    pub psql: String,
}

impl Default for ProgramNames {
    fn default() -> Self {
        ProgramNames {
            lsclusters: "pg_lsclusters".to_string(),
            createcluster: "pg_createcluster".to_string(),
            ctlcluster: "pg_ctlcluster".to_string(),
            dropcluster: "pg_dropcluster".to_string(),
            createdb: "createdb".to_string(),
            dropdb: "dropdb".to_string(),
            psql: "psql".to_string(),
        }
    }
}

/// Roles created when a cluster is initialized
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoleNames {
    /// Login superuser used by the application's administrators
    pub admin: String,
    /// Group role granted to the admin role and the owner role
    pub group: String,
    /// Superuser kept for tools that expect a `postgres` role
    pub compat_superuser: String,
}

impl Default for RoleNames {
    fn default() -> Self {
        RoleNames {
            admin: "admin".to_string(),
            group: "xtrole".to_string(),
            compat_superuser: "postgres".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    #[serde(alias = "binDir")]
    pub bin_dir: Option<PathBuf>,

    pub programs: ProgramNames,

    #[serde(alias = "parsePolicy")]
    pub parse_policy: ParsePolicy,

    #[serde(alias = "socketDir")]
    pub socket_dir: PathBuf,

    pub extensions: Vec<String>,

    pub roles: RoleNames,

    #[serde(alias = "passwordLength")]
    pub password_length: usize,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        ToolsConfig {
            bin_dir: None,
            programs: ProgramNames::default(),
            parse_policy: ParsePolicy::default(),
            socket_dir: PathBuf::from(DEFAULT_SOCKET_DIR),
            extensions: vec!["plv8".to_string(), "plpgsql".to_string(), "hstore".to_string()],
            roles: RoleNames::default(),
            password_length: 24,
        }
    }
}

impl ToolsConfig {
    /// Loads the configuration from an optional TOML/YAML/JSON file plus `PGCLUSTER_*`
    /// environment variables. Missing keys keep their defaults.
    pub fn load(config_file: Option<&Path>) -> ClusterResult<Self> {
        let config: ToolsConfig = parse_config_file(config_file, ENV_PREFIX, &["extensions"])?;
        debug!("pgcluster tools config: {:?}", config);
        Ok(config)
    }

    /// Resolves a program name against `bin_dir`. Names that already contain a path separator
    /// are returned untouched.
    pub fn resolve_program(&self, program: &str) -> String {
        match &self.bin_dir {
            Some(dir) if !program.contains(std::path::MAIN_SEPARATOR) => {
                dir.join(program).to_string_lossy().into_owned()
            }
            _ => program.to_string(),
        }
    }
}
