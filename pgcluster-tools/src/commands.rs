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

mod cluster_commands;
mod database_commands;
mod parse_command;
mod query_command;

use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;
use serde_json::Map;
use serde_json::Value;
use tabled::settings::Style;
use tabled::Table;
use tabled::Tabled;

use crate::cli::formatters::get_formatter;
use crate::cli::formatters::OutputFormat;
use crate::cli::validators::parse_name;
use crate::cli::validators::parse_port;
use crate::cli::validators::parse_version;
use crate::core::admin::PgAdmin;
use crate::core::runner::CommandRunner;
use crate::core::runner::SystemCommandRunner;
use crate::core::types::PgVersion;
use crate::core::types::ProvisioningOptions;
use crate::core::types::ResultSet;
use crate::core::ClusterResult;

/// A trait that defines the execution behavior for commands.
///
/// Every command receives the admin handle built from the global `--config` option.
pub trait CommandExecute {
    async fn execute(&self, admin: &PgAdmin<SystemCommandRunner>) -> ClusterResult<()>;
}

#[derive(Debug, Parser, Clone)]
pub struct CommonArgs {
    /// Output format
    #[arg(long = "format", value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

impl CommonArgs {
    pub fn print<T: serde::Serialize>(&self, data: &T) {
        println!("{}", get_formatter(self.format).format(data));
    }
}

/// Identifies one cluster on the host
#[derive(Debug, Parser, Clone)]
pub struct ClusterArgs {
    #[arg(
        short = 'v',
        long = "pg-version",
        value_parser = parse_version,
        help = "PostgreSQL major version, eg: 9.3 or 16"
    )]
    pub version: PgVersion,

    #[arg(short = 'c', long = "cluster", value_parser = parse_name, help = "Cluster name")]
    pub name: String,

    #[arg(
        short = 'o',
        long = "owner",
        default_value = "postgres",
        value_parser = parse_name,
        help = "OS user owning the cluster; psql connects as this user"
    )]
    pub owner: String,

    #[arg(short = 'p', long = "port", value_parser = parse_port, help = "Cluster port")]
    pub port: Option<u16>,

    #[arg(long = "socket-dir", help = "Unix socket directory, defaults to the configured one")]
    pub socket_dir: Option<PathBuf>,
}

impl ClusterArgs {
    pub fn to_options<R: CommandRunner>(&self, admin: &PgAdmin<R>) -> ProvisioningOptions {
        let mut options = ProvisioningOptions::new(self.version, &self.name, &self.owner, admin.config());
        if let Some(port) = self.port {
            options = options.with_port(port);
        }
        if let Some(dir) = &self.socket_dir {
            options = options.with_socket_dir(dir);
        }
        options
    }
}

/// One JSON object per row, keyed by column name
pub(crate) fn result_rows(result: &ResultSet) -> Vec<Map<String, Value>> {
    result
        .rows
        .iter()
        .map(|row| {
            result
                .columns
                .iter()
                .cloned()
                .zip(row.iter().cloned().map(Value::String))
                .collect()
        })
        .collect()
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(subcommand)]
    #[command(about = "Cluster commands")]
    Cluster(cluster_commands::ClusterCommands),

    #[command(subcommand)]
    #[command(about = "Database commands")]
    Database(database_commands::DatabaseCommands),

    #[command(about = "Run SQL statements against a cluster")]
    Query(query_command::QueryCommand),

    #[command(about = "Parse the output of a cluster tool")]
    Parse(parse_command::ParseCommand),

    #[command(about = "List the available commands")]
    Show(ClassificationTablePrint),
}

impl CommandExecute for Commands {
    async fn execute(&self, admin: &PgAdmin<SystemCommandRunner>) -> ClusterResult<()> {
        match self {
            Commands::Cluster(value) => value.execute(admin).await,
            Commands::Database(value) => value.execute(admin).await,
            Commands::Query(value) => value.execute(admin).await,
            Commands::Parse(value) => value.execute(admin).await,
            Commands::Show(value) => value.execute(admin).await,
        }
    }
}

// ================for commands table print================
#[derive(Tabled, Clone)]
struct Command {
    #[tabled(rename = "Category")]
    category: &'static str,

    #[tabled(rename = "Command")]
    command: &'static str,

    #[tabled(rename = "Remark")]
    remark: &'static str,
}

#[derive(Parser)]
pub(crate) struct ClassificationTablePrint;

impl CommandExecute for ClassificationTablePrint {
    async fn execute(&self, _admin: &PgAdmin<SystemCommandRunner>) -> ClusterResult<()> {
        let commands: Vec<Command> = vec![
            Command {
                category: "Cluster",
                command: "list",
                remark: "List the clusters installed on this host.",
            },
            Command {
                category: "Cluster",
                command: "create",
                remark: "Create a new cluster.",
            },
            Command {
                category: "Cluster",
                command: "provision",
                remark: "Create, start and initialize a cluster.",
            },
            Command {
                category: "Cluster",
                command: "ctl",
                remark: "Start, stop, restart or reload a cluster.",
            },
            Command {
                category: "Cluster",
                command: "drop",
                remark: "Stop and remove a cluster.",
            },
            Command {
                category: "Cluster",
                command: "teardown",
                remark: "Best-effort stop and removal, ignoring failures.",
            },
            Command {
                category: "Database",
                command: "create",
                remark: "Create a database in a cluster.",
            },
            Command {
                category: "Database",
                command: "drop",
                remark: "Drop a database from a cluster.",
            },
            Command {
                category: "SQL",
                command: "query",
                remark: "Run SQL statements through psql.",
            },
            Command {
                category: "Tools",
                command: "parse",
                remark: "Parse pg_createcluster, pg_hba, pg_lsclusters or psql output.",
            },
        ];
        let mut table = Table::new(commands);
        table.with(Style::extended());
        print!("{table}");
        Ok(())
    }
}
