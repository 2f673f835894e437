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

use clap::Parser;

use crate::commands::ClusterArgs;
use crate::commands::CommandExecute;
use crate::core::admin::PgAdmin;
use crate::core::lifecycle::ClusterLifecycle;
use crate::core::runner::CommandRunner;
use crate::core::runner::SystemCommandRunner;
use crate::core::types::ClusterIdentity;
use crate::core::ClusterError;
use crate::core::ClusterResult;

#[derive(Debug, Clone, Parser)]
pub struct TeardownClusterCommand {
    #[command(flatten)]
    cluster: ClusterArgs,
}

impl TeardownClusterCommand {
    /// Fails when the cluster is still listed afterwards, so scripts see a non-zero exit
    async fn teardown<R: CommandRunner>(&self, admin: &PgAdmin<R>) -> ClusterResult<String> {
        let options = self.cluster.to_options(admin);
        if !ClusterLifecycle::teardown(admin, &options).await {
            return Err(ClusterError::teardown_incomplete(options.cluster_id()));
        }
        Ok(options.cluster_id())
    }
}

impl CommandExecute for TeardownClusterCommand {
    async fn execute(&self, admin: &PgAdmin<SystemCommandRunner>) -> ClusterResult<()> {
        let cluster = self.teardown(admin).await?;
        println!("Cluster {cluster} is gone");
        Ok(())
    }
}
