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

mod create_cluster_command;
mod ctl_cluster_command;
mod drop_cluster_command;
mod list_clusters_command;
mod provision_cluster_command;
mod teardown_cluster_command;

use clap::Subcommand;

use crate::commands::cluster_commands::create_cluster_command::CreateClusterCommand;
use crate::commands::cluster_commands::ctl_cluster_command::CtlClusterCommand;
use crate::commands::cluster_commands::drop_cluster_command::DropClusterCommand;
use crate::commands::cluster_commands::list_clusters_command::ListClustersCommand;
use crate::commands::cluster_commands::provision_cluster_command::ProvisionClusterCommand;
use crate::commands::cluster_commands::teardown_cluster_command::TeardownClusterCommand;
use crate::commands::CommandExecute;
use crate::core::admin::PgAdmin;
use crate::core::runner::SystemCommandRunner;
use crate::core::ClusterResult;

#[derive(Subcommand)]
pub enum ClusterCommands {
    #[command(
        name = "list",
        about = "List the clusters installed on this host.",
        long_about = None,
    )]
    List(ListClustersCommand),

    #[command(
        name = "create",
        about = "Create a new cluster. Fails if the cluster or the port already exists.",
        long_about = None,
    )]
    Create(CreateClusterCommand),

    #[command(
        name = "provision",
        about = "Create, start and initialize a cluster with roles and extensions.",
        long_about = None,
    )]
    Provision(ProvisionClusterCommand),

    #[command(
        name = "ctl",
        about = "Start, stop, restart or reload a cluster.",
        long_about = None,
    )]
    Ctl(CtlClusterCommand),

    #[command(
        name = "drop",
        about = "Stop and remove a cluster.",
        long_about = None,
    )]
    Drop(DropClusterCommand),

    #[command(
        name = "teardown",
        about = "Stop and remove a cluster, ignoring failures.",
        long_about = None,
    )]
    Teardown(TeardownClusterCommand),
}

impl CommandExecute for ClusterCommands {
    async fn execute(&self, admin: &PgAdmin<SystemCommandRunner>) -> ClusterResult<()> {
        match self {
            ClusterCommands::List(value) => value.execute(admin).await,
            ClusterCommands::Create(value) => value.execute(admin).await,
            ClusterCommands::Provision(value) => value.execute(admin).await,
            ClusterCommands::Ctl(value) => value.execute(admin).await,
            ClusterCommands::Drop(value) => value.execute(admin).await,
            ClusterCommands::Teardown(value) => value.execute(admin).await,
        }
    }
}
