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

//! Admin handle and its builder
//!
//! [`PgAdmin`] pairs a [`CommandRunner`] with the [`ToolsConfig`] every operation reads program
//! names, socket directory and role names from.

use std::path::PathBuf;

use pgcluster_common::tools_config::ToolsConfig;

use crate::core::admin_commands::AdminCommands;
use crate::core::runner;
use crate::core::runner::CommandLine;
use crate::core::runner::CommandOutput;
use crate::core::runner::CommandRunner;
use crate::core::runner::RunOptions;
use crate::core::runner::SystemCommandRunner;
use crate::core::ClusterResult;

/// Builder for [`PgAdmin`]
///
/// # Examples
///
/// ```rust,ignore
/// use pgcluster_tools::core::admin::PgAdminBuilder;
///
/// let admin = PgAdminBuilder::new()
///     .config_file("/etc/pgcluster/tools.toml")
///     .build()?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct PgAdminBuilder {
    config: Option<ToolsConfig>,
    config_file: Option<PathBuf>,
}

impl PgAdminBuilder {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an already loaded configuration. Takes precedence over [`PgAdminBuilder::config_file`].
    #[inline]
    pub fn config(mut self, config: ToolsConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Load the configuration from a file, merged with `PGCLUSTER_*` environment variables
    #[inline]
    pub fn config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_file = Some(path.into());
        self
    }

    /// Build an admin handle that spawns real processes
    pub fn build(self) -> ClusterResult<PgAdmin<SystemCommandRunner>> {
        self.build_with_runner(SystemCommandRunner)
    }

    pub fn build_with_runner<R: CommandRunner>(self, runner: R) -> ClusterResult<PgAdmin<R>> {
        let config = match self.config {
            Some(config) => config,
            None => ToolsConfig::load(self.config_file.as_deref())?,
        };
        Ok(PgAdmin::new(runner, config))
    }
}

pub struct PgAdmin<R> {
    runner: R,
    config: ToolsConfig,
}

impl<R: CommandRunner> PgAdmin<R> {
    #[inline]
    pub fn new(runner: R, config: ToolsConfig) -> Self {
        Self { runner, config }
    }

    #[inline]
    pub fn config(&self) -> &ToolsConfig {
        &self.config
    }

    #[inline]
    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Command line factory bound to this handle's configuration
    #[inline]
    pub fn commands(&self) -> AdminCommands<'_> {
        AdminCommands::new(&self.config)
    }

    /// See [`runner::run`]
    pub async fn run(&self, command: &CommandLine, options: RunOptions) -> ClusterResult<CommandOutput> {
        runner::run(&self.runner, command, options).await
    }
}
