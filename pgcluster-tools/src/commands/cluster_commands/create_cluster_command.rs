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
use crate::commands::CommonArgs;
use crate::core::admin::PgAdmin;
use crate::core::lifecycle::ClusterLifecycle;
use crate::core::runner::SystemCommandRunner;
use crate::core::ClusterResult;

#[derive(Debug, Clone, Parser)]
pub struct CreateClusterCommand {
    #[command(flatten)]
    common: CommonArgs,

    #[command(flatten)]
    cluster: ClusterArgs,

    #[arg(long = "locale", help = "Locale of the new cluster, eg: en_US.UTF-8")]
    locale: Option<String>,
}

impl CommandExecute for CreateClusterCommand {
    async fn execute(&self, admin: &PgAdmin<SystemCommandRunner>) -> ClusterResult<()> {
        let mut options = self.cluster.to_options(admin);
        if let Some(locale) = &self.locale {
            options = options.with_locale(locale);
        }
        let created = ClusterLifecycle::create(admin, &options).await?;
        self.common.print(&created);
        Ok(())
    }
}
