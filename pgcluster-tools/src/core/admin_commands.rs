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

//! Command lines for the postgresql-common programs.
//!
//! Every value is passed as its own argument; nothing goes through a shell.

use pgcluster_common::tools_config::ToolsConfig;

use crate::core::parser::PSQL_FIELD_SEPARATOR;
use crate::core::query::Statement;
use crate::core::runner::CommandLine;
use crate::core::types::ClusterAction;
use crate::core::types::ClusterIdentity;
use crate::core::types::ProvisioningOptions;

pub struct AdminCommands<'a> {
    config: &'a ToolsConfig,
}

impl<'a> AdminCommands<'a> {
    #[inline]
    pub fn new(config: &'a ToolsConfig) -> Self {
        Self { config }
    }

    fn program(&self, name: &str) -> CommandLine {
        CommandLine::new(self.config.resolve_program(name))
    }

    /// `pg_lsclusters`
    pub fn lsclusters(&self) -> CommandLine {
        self.program(&self.config.programs.lsclusters)
    }

    /// `pg_createcluster --user <owner> --socketdir <dir> [--port <p>] [--locale <l>] <version> <name>`
    pub fn createcluster(&self, options: &ProvisioningOptions) -> CommandLine {
        let mut cmd = self
            .program(&self.config.programs.createcluster)
            .arg(format!("--user={}", options.owner))
            .arg(format!("--socketdir={}", options.socket_dir.display()));
        if let Some(port) = options.port {
            cmd = cmd.arg(format!("--port={port}"));
        }
        if let Some(locale) = &options.locale {
            cmd = cmd.arg(format!("--locale={locale}"));
        }
        cmd.arg(options.version().to_string()).arg(options.cluster_name())
    }

    /// `pg_ctlcluster <version> <name> <action>`
    pub fn ctlcluster(&self, cluster: &impl ClusterIdentity, action: ClusterAction) -> CommandLine {
        self.program(&self.config.programs.ctlcluster)
            .arg(cluster.version().to_string())
            .arg(cluster.cluster_name())
            .arg(action.as_str())
    }

    /// `pg_dropcluster --stop <version> <name>`
    pub fn dropcluster(&self, cluster: &impl ClusterIdentity) -> CommandLine {
        self.program(&self.config.programs.dropcluster)
            .arg("--stop")
            .arg(cluster.version().to_string())
            .arg(cluster.cluster_name())
    }

    /// `createdb`, connecting as the cluster owner and assigning `db_owner`
    pub fn createdb(&self, options: &ProvisioningOptions, port: u16, db_owner: &str, database: &str) -> CommandLine {
        self.connect(self.program(&self.config.programs.createdb), options, port)
            .arg(format!("--owner={db_owner}"))
            .arg(database)
    }

    pub fn dropdb(&self, options: &ProvisioningOptions, port: u16, database: &str) -> CommandLine {
        self.connect(self.program(&self.config.programs.dropdb), options, port)
            .arg("--if-exists")
            .arg(database)
    }

    /// `psql` reading `statement` from stdin, unaligned NUL-terminated records, stop on the first error
    pub fn psql(&self, options: &ProvisioningOptions, port: u16, database: &str, statement: &Statement) -> CommandLine {
        let mut cmd = self
            .connect(self.program(&self.config.programs.psql), options, port)
            .arg(format!("--dbname={database}"))
            .args([
                "--no-psqlrc",
                "--quiet",
                "--no-align",
                "--pset=footer=off",
                "--record-separator-zero",
                "--set=ON_ERROR_STOP=1",
            ])
            .arg(format!("--field-separator={PSQL_FIELD_SEPARATOR}"));
        for param in statement.params() {
            let arg = format!("--set={}={}", param.name, param.value);
            cmd = if param.secret { cmd.secret_arg(arg) } else { cmd.arg(arg) };
        }
        cmd.arg("--file=-").stdin(statement.sql())
    }

    fn connect(&self, cmd: CommandLine, options: &ProvisioningOptions, port: u16) -> CommandLine {
        cmd.arg(format!("--host={}", options.socket_dir.display()))
            .arg(format!("--port={port}"))
            .arg(format!("--username={}", options.owner))
    }
}
