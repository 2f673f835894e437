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

use crate::commands::CommandExecute;
use crate::commands::CommonArgs;
use crate::core::admin::PgAdmin;
use crate::core::directory::ClusterDirectory;
use crate::core::runner::SystemCommandRunner;
use crate::core::ClusterResult;

#[derive(Debug, Clone, Parser)]
pub struct ListClustersCommand {
    #[command(flatten)]
    common: CommonArgs,

    #[arg(long = "online", help = "Only show online clusters")]
    online: bool,
}

impl CommandExecute for ListClustersCommand {
    async fn execute(&self, admin: &PgAdmin<SystemCommandRunner>) -> ClusterResult<()> {
        let mut clusters = ClusterDirectory::list_clusters(admin).await?;
        if self.online {
            clusters.retain(|cluster| cluster.is_online());
        }
        self.common.print(&clusters);
        Ok(())
    }
}
