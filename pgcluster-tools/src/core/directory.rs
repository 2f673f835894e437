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

//! Cluster directory queries backed by `pg_lsclusters`.
//!
//! Nothing is cached: every call re-reads the host's state.

use tracing::debug;

use crate::core::admin::PgAdmin;
use crate::core::parser::parse_lsclusters;
use crate::core::runner::CommandRunner;
use crate::core::runner::RunOptions;
use crate::core::types::ClusterDescriptor;
use crate::core::types::ClusterIdentity;
use crate::core::types::PgVersion;
use crate::core::ClusterResult;

pub struct ClusterDirectory;

impl ClusterDirectory {
    /// Every cluster installed on the host. An empty listing is an empty list.
    pub async fn list_clusters<R: CommandRunner>(admin: &PgAdmin<R>) -> ClusterResult<Vec<ClusterDescriptor>> {
        let output = admin.run(&admin.commands().lsclusters(), RunOptions::default()).await?;
        let parsed = parse_lsclusters(&output.stdout, admin.config().parse_policy)?;
        debug!(
            clusters = parsed.records.len(),
            rejected = parsed.rejected.len(),
            "listed clusters"
        );
        Ok(parsed.into_records())
    }

    pub async fn find<R: CommandRunner>(
        admin: &PgAdmin<R>,
        version: PgVersion,
        name: &str,
    ) -> ClusterResult<Option<ClusterDescriptor>> {
        Ok(Self::list_clusters(admin)
            .await?
            .into_iter()
            .find(|cluster| cluster.version() == version && cluster.cluster_name() == name))
    }

    /// The cluster listening on `port`, whatever its version
    pub async fn find_by_port<R: CommandRunner>(
        admin: &PgAdmin<R>,
        port: u16,
    ) -> ClusterResult<Option<ClusterDescriptor>> {
        Ok(Self::list_clusters(admin)
            .await?
            .into_iter()
            .find(|cluster| cluster.port == port))
    }
}

#[cfg(test)]
mod tests {
    use pgcluster_common::tools_config::ParsePolicy;
    use pgcluster_common::tools_config::ToolsConfig;

    use super::*;
    use crate::core::test_support::ScriptedRunner;
    use crate::core::types::ClusterStatus;
    use crate::core::ClusterError;

    const LISTING: &str = "\
Ver Cluster   Port Status Owner    Data directory                      Log file
9.1 main      5432 online postgres /var/lib/postgresql/9.1/main        /var/log/postgresql/postgresql-9.1-main.log
9.3 main      5434 online postgres /var/lib/postgresql/9.3/main        /var/log/postgresql/postgresql-9.3-main.log
9.3 mochatest 5439 down   postgres /var/lib/postgresql/9.3/mochatest   /var/log/postgresql/postgresql-9.3-mochatest.log
";

    const HOST_LISTING: &str = "\
Ver Cluster   Port Status Owner    Data directory                    Log file
9.1 main      5432 online postgres /var/lib/postgresql/9.1/main      /var/log/postgresql/postgresql-9.1-main.log
9.1 mochatest 5439 down   postgres /var/lib/postgresql/9.1/mochatest /var/log/postgresql/postgresql-9.1-mochatest.log
9.1 test2     5438 down   postgres /var/lib/postgresql/9.1/test2     /var/log/postgresql/postgresql-9.1-test2.log
9.3 local     5434 online postgres /var/lib/postgresql/9.3/local     /var/log/postgresql/postgresql-9.3-local.log
9.3 local93   5435 online postgres /var/lib/postgresql/9.3/local93   /var/log/postgresql/postgresql-9.3-local93.log
9.3 main      5433 online postgres /var/lib/postgresql/9.3/main      /var/log/postgresql/postgresql-9.3-main.log
9.3 xtuple    5436 online postgres /var/lib/postgresql/9.3/xtuple    /var/log/postgresql/postgresql-9.3-xtuple.log
";

    fn admin_with_listing(listing: &str, config: ToolsConfig) -> PgAdmin<ScriptedRunner> {
        let runner = ScriptedRunner::new();
        runner.respond("pg_lsclusters", 0, listing, "");
        PgAdmin::new(runner, config)
    }

    #[tokio::test]
    async fn list_and_find() {
        let admin = admin_with_listing(LISTING, ToolsConfig::default());

        let clusters = ClusterDirectory::list_clusters(&admin).await.unwrap();
        assert_eq!(clusters.len(), 3);

        let found = ClusterDirectory::find(&admin, PgVersion::new(9, Some(3)), "mochatest")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.port, 5439);
        assert_eq!(found.status, ClusterStatus::Down);

        assert!(ClusterDirectory::find(&admin, PgVersion::new(9, Some(1)), "mochatest")
            .await
            .unwrap()
            .is_none());

        let by_port = ClusterDirectory::find_by_port(&admin, 5434).await.unwrap().unwrap();
        assert_eq!(by_port.cluster_id(), "9.3/main");
        assert_eq!(admin.runner().calls_to("pg_lsclusters"), 4);
    }

    #[tokio::test]
    async fn lists_every_cluster_on_the_host() {
        let admin = admin_with_listing(HOST_LISTING, ToolsConfig::default());

        let clusters = ClusterDirectory::list_clusters(&admin).await.unwrap();
        assert_eq!(clusters.len(), 7);
        assert_eq!(
            clusters.iter().filter(|cluster| cluster.is_online()).count(),
            5
        );

        let mochatest = clusters
            .iter()
            .find(|cluster| cluster.name == "mochatest")
            .unwrap();
        assert_eq!(mochatest.version, PgVersion::new(9, Some(1)));
        assert_eq!(mochatest.port, 5439);
        assert_eq!(mochatest.status, ClusterStatus::Down);
        assert_eq!(mochatest.owner, "postgres");

        let calls = admin.runner().calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].get_args().is_empty());
    }

    #[tokio::test]
    async fn empty_listing_is_empty_list() {
        let admin = admin_with_listing("", ToolsConfig::default());
        assert!(ClusterDirectory::list_clusters(&admin).await.unwrap().is_empty());

        let admin = admin_with_listing("Ver Cluster Port Status Owner Data directory Log file\n", ToolsConfig::default());
        assert!(ClusterDirectory::list_clusters(&admin).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn malformed_row_follows_configured_policy() {
        let listing = format!("{LISTING}9.3 broken 5440 online\n");

        let admin = admin_with_listing(&listing, ToolsConfig::default());
        assert_eq!(ClusterDirectory::list_clusters(&admin).await.unwrap().len(), 3);

        let strict = ToolsConfig {
            parse_policy: ParsePolicy::FailFast,
            ..Default::default()
        };
        let admin = admin_with_listing(&listing, strict);
        assert!(matches!(
            ClusterDirectory::list_clusters(&admin).await,
            Err(ClusterError::RowParseError { line_number: 5, .. })
        ));
    }

    #[tokio::test]
    async fn failing_listing_command_propagates() {
        let runner = ScriptedRunner::new();
        runner.respond("pg_lsclusters", 127, "", "pg_lsclusters: command not found");
        let admin = PgAdmin::new(runner, ToolsConfig::default());
        assert!(matches!(
            ClusterDirectory::list_clusters(&admin).await,
            Err(ClusterError::CommandFailed { exit_code: Some(127), .. })
        ));
    }
}
