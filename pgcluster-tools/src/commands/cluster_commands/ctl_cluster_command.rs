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

use std::str::FromStr;

use clap::Parser;

use crate::commands::ClusterArgs;
use crate::commands::CommandExecute;
use crate::core::admin::PgAdmin;
use crate::core::lifecycle::ClusterLifecycle;
use crate::core::runner::SystemCommandRunner;
use crate::core::types::ClusterAction;
use crate::core::types::ClusterIdentity;
use crate::core::ClusterResult;

#[derive(Debug, Clone, Parser)]
pub struct CtlClusterCommand {
    #[command(flatten)]
    cluster: ClusterArgs,

    #[arg(value_parser = ClusterAction::from_str, help = "start, stop, restart or reload")]
    action: ClusterAction,
}

impl CommandExecute for CtlClusterCommand {
    async fn execute(&self, admin: &PgAdmin<SystemCommandRunner>) -> ClusterResult<()> {
        let options = self.cluster.to_options(admin);
        ClusterLifecycle::ctl(admin, &options, self.action).await?;
        println!("{} {}: done", self.action, options.cluster_id());
        Ok(())
    }
}
