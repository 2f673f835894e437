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

use std::path::PathBuf;

use clap::Parser;

use crate::cli::validators::parse_name;
use crate::commands::result_rows;
use crate::commands::ClusterArgs;
use crate::commands::CommandExecute;
use crate::commands::CommonArgs;
use crate::core::admin::PgAdmin;
use crate::core::lifecycle::ClusterLifecycle;
use crate::core::query::QueryExecutor;
use crate::core::query::Statement;
use crate::core::runner::SystemCommandRunner;
use crate::core::ClusterResult;

#[derive(Debug, Clone, Parser)]
pub struct QueryCommand {
    #[command(flatten)]
    common: CommonArgs,

    #[command(flatten)]
    cluster: ClusterArgs,

    #[arg(short = 'd', long = "database", value_parser = parse_name, help = "Database, defaults to --owner")]
    database: Option<String>,

    /// psql variable available to every statement as :'name' or :"name"
    #[arg(long = "set", value_name = "NAME=VALUE", value_parser = parse_binding)]
    bindings: Vec<(String, String)>,

    #[arg(short = 'f', long = "file", help = "Read one statement from a file")]
    file: Option<PathBuf>,

    #[arg(required_unless_present = "file", help = "Statements, run in order")]
    statements: Vec<String>,
}

fn parse_binding(value: &str) -> Result<(String, String), String> {
    value
        .split_once('=')
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .ok_or_else(|| format!("'{value}' is not NAME=VALUE"))
}

impl QueryCommand {
    async fn statements(&self) -> ClusterResult<Vec<Statement>> {
        let mut sql = self.statements.clone();
        if let Some(file) = &self.file {
            sql.push(tokio::fs::read_to_string(file).await?);
        }
        Ok(sql
            .into_iter()
            .map(|text| {
                self.bindings
                    .iter()
                    .fold(Statement::new(text), |statement, (name, value)| statement.bind(name, value))
            })
            .collect())
    }
}

impl CommandExecute for QueryCommand {
    async fn execute(&self, admin: &PgAdmin<SystemCommandRunner>) -> ClusterResult<()> {
        let options = ClusterLifecycle::discover(admin, &self.cluster.to_options(admin)).await?;
        let database = self.database.as_deref().unwrap_or(&options.owner);
        let statements = self.statements().await?;

        let results = QueryExecutor::execute(admin, &options, database, &statements).await?;
        for result in results.iter().filter(|result| !result.columns.is_empty()) {
            self.common.print(&result_rows(result));
        }
        Ok(())
    }
}
