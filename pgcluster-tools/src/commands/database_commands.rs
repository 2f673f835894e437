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

mod create_database_command;
mod drop_database_command;

use clap::Subcommand;

use crate::commands::database_commands::create_database_command::CreateDatabaseCommand;
use crate::commands::database_commands::drop_database_command::DropDatabaseCommand;
use crate::commands::CommandExecute;
use crate::core::admin::PgAdmin;
use crate::core::runner::SystemCommandRunner;
use crate::core::ClusterResult;

#[derive(Subcommand)]
pub enum DatabaseCommands {
    #[command(
        name = "create",
        about = "Create a database in a cluster.",
        long_about = None,
    )]
    Create(CreateDatabaseCommand),

    #[command(
        name = "drop",
        about = "Drop a database if it exists.",
        long_about = None,
    )]
    Drop(DropDatabaseCommand),
}

impl CommandExecute for DatabaseCommands {
    async fn execute(&self, admin: &PgAdmin<SystemCommandRunner>) -> ClusterResult<()> {
        match self {
            DatabaseCommands::Create(value) => value.execute(admin).await,
            DatabaseCommands::Drop(value) => value.execute(admin).await,
        }
    }
}
