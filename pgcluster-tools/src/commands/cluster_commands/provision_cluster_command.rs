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
pub struct ProvisionClusterCommand {
    #[command(flatten)]
    common: CommonArgs,

    #[command(flatten)]
    cluster: ClusterArgs,

    #[arg(long = "locale", help = "Locale of the new cluster, eg: en_US.UTF-8")]
    locale: Option<String>,

    /// Password of the admin role. A random one is generated and printed when omitted.
    #[arg(long = "admin-password", env = "PGCLUSTER_ADMIN_PASSWORD", hide_env_values = true)]
    admin_password: Option<String>,

    #[arg(
        long = "extensions",
        value_delimiter = ',',
        help = "Extensions to create, defaults to the configured list"
    )]
    extensions: Option<Vec<String>>,
}

impl CommandExecute for ProvisionClusterCommand {
    async fn execute(&self, admin: &PgAdmin<SystemCommandRunner>) -> ClusterResult<()> {
        let mut options = self.cluster.to_options(admin);
        if let Some(locale) = &self.locale {
            options = options.with_locale(locale);
        }
        if let Some(password) = &self.admin_password {
            options = options.with_admin_password(password);
        }
        if let Some(extensions) = &self.extensions {
            options = options.with_extensions(extensions.clone());
        }

        let report = ClusterLifecycle::provision(admin, &options).await?;
        self.common.print(&report);
        Ok(())
    }
}
