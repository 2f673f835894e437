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

mod common;

use common::FakeCluster;
use common::FakeHost;
use pgcluster_common::tools_config::ToolsConfig;
use pgcluster_tools::core::admin::PgAdmin;
use pgcluster_tools::core::directory::ClusterDirectory;
use pgcluster_tools::core::lifecycle::ClusterLifecycle;
use pgcluster_tools::core::query::QueryExecutor;
use pgcluster_tools::core::query::Statement;
use pgcluster_tools::core::types::ClusterAction;
use pgcluster_tools::core::types::ClusterStatus;
use pgcluster_tools::core::types::PgVersion;
use pgcluster_tools::core::types::ProvisioningOptions;
use pgcluster_tools::core::ClusterError;

fn mochatest() -> ProvisioningOptions {
    ProvisioningOptions::new(PgVersion::new(9, Some(3)), "mochatest", "xtuple", &ToolsConfig::default())
        .with_extensions(vec!["plpgsql".to_string(), "hstore".to_string()])
}

#[tokio::test]
async fn empty_host_lists_no_clusters() {
    let admin = FakeHost::new().admin();
    assert!(ClusterDirectory::list_clusters(&admin).await.unwrap().is_empty());
}

#[tokio::test]
async fn create_initialize_stop_drop() {
    let admin = FakeHost::new().admin();
    let options = mochatest();

    let created = ClusterLifecycle::create(&admin, &options).await.unwrap();
    assert_eq!(created.creation.port, 5432);
    assert_eq!(created.options.port, Some(5432));
    assert_eq!(created.descriptor.status, ClusterStatus::Down);
    assert_eq!(created.descriptor.owner, "xtuple");
    assert_eq!(created.descriptor.locale.as_deref(), Some("en_US.UTF-8"));

    ClusterLifecycle::ctl(&admin, &created.options, ClusterAction::Restart)
        .await
        .unwrap();
    let online = ClusterDirectory::find(&admin, options.version, "mochatest")
        .await
        .unwrap()
        .unwrap();
    assert!(online.is_online());

    let report = ClusterLifecycle::initialize(&admin, &online, &created.options)
        .await
        .unwrap();
    assert_eq!(report.database, "xtuple");
    assert!(report.database_created);
    assert_eq!(report.extensions, vec!["plpgsql", "hstore"]);
    assert_eq!(report.created_roles, vec!["admin", "xtrole", "postgres"]);
    assert_eq!(report.grants, vec!["xtrole TO admin", "xtrole TO xtuple"]);
    assert_eq!(report.generated_password.as_ref().map(String::len), Some(24));

    let host = admin.runner();
    let cluster = host.cluster("9.3", "mochatest").unwrap();
    assert!(cluster.databases.contains(&"xtuple".to_string()));
    assert!(cluster.extensions.contains(&"hstore".to_string()));
    assert!(cluster
        .grants
        .contains(&("xtrole".to_string(), "xtuple".to_string())));
    // the generated password never appears on a displayed command line
    let password = report.generated_password.clone().unwrap();
    assert!(host.calls().iter().all(|call| !call.to_string().contains(&password)));

    ClusterLifecycle::ctl(&admin, &created.options, ClusterAction::Stop)
        .await
        .unwrap();
    let stopped = ClusterDirectory::find(&admin, options.version, "mochatest")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stopped.status, ClusterStatus::Down);

    ClusterLifecycle::drop(&admin, &created.options).await.unwrap();
    assert!(ClusterDirectory::find(&admin, options.version, "mochatest")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn initialize_twice_is_a_no_op_for_roles() {
    let admin = FakeHost::new().admin();
    let report = ClusterLifecycle::provision(&admin, &mochatest().with_admin_password("s3cret"))
        .await
        .unwrap();
    assert!(report.init.generated_password.is_none());

    let again = ClusterLifecycle::initialize(&admin, &report.descriptor, &report.options)
        .await
        .unwrap();
    assert!(!again.database_created);
    assert!(again.created_roles.is_empty());
    assert_eq!(again.existing_roles, vec!["admin", "xtrole", "postgres"]);
    assert_eq!(admin.runner().calls_to("createdb"), 1);
}

#[tokio::test]
async fn create_twice_fails_without_second_createcluster() {
    let admin = FakeHost::new().admin();
    ClusterLifecycle::create(&admin, &mochatest()).await.unwrap();

    match ClusterLifecycle::create(&admin, &mochatest()).await {
        Err(ClusterError::ClusterAlreadyExists { version, name }) => {
            assert_eq!(version, "9.3");
            assert_eq!(name, "mochatest");
        }
        other => panic!("expected ClusterAlreadyExists, got {other:?}"),
    }
    assert_eq!(admin.runner().calls_to("pg_createcluster"), 1);
}

#[tokio::test]
async fn create_on_taken_port_runs_no_command() {
    let admin = FakeHost::new()
        .with_cluster(FakeCluster::new("9.1", "main", 5439, "postgres").online())
        .admin();

    match ClusterLifecycle::create(&admin, &mochatest().with_port(5439)).await {
        Err(ClusterError::PortInUse { port, cluster }) => {
            assert_eq!(port, 5439);
            assert_eq!(cluster, "9.1/main");
        }
        other => panic!("expected PortInUse, got {other:?}"),
    }
    assert_eq!(admin.runner().calls_to("pg_createcluster"), 0);
}

#[tokio::test]
async fn provision_assigns_next_free_port() {
    let admin = FakeHost::new()
        .with_cluster(FakeCluster::new("9.1", "main", 5432, "postgres").online())
        .admin();

    let report = ClusterLifecycle::provision(&admin, &mochatest()).await.unwrap();
    assert_eq!(report.options.port, Some(5433));
    assert!(report.descriptor.is_online());
    assert_eq!(
        report.descriptor.config_directory.as_deref(),
        Some(std::path::Path::new("/etc/postgresql/9.3/mochatest"))
    );
    assert_eq!(admin.runner().calls_to("pg_ctlcluster"), 1);
}

#[tokio::test]
async fn provision_fails_when_cluster_does_not_come_online() {
    let admin = FakeHost::new().refusing_start().admin();
    assert!(matches!(
        ClusterLifecycle::provision(&admin, &mochatest()).await,
        Err(ClusterError::ClusterNotOnline { .. })
    ));
    assert_eq!(admin.runner().calls_to("psql"), 0);
}

#[tokio::test]
async fn missing_extension_surfaces_as_statement_failure() {
    let admin = FakeHost::new().without_extension("plv8").admin();
    let options = mochatest().with_extensions(vec!["plv8".to_string()]);

    match ClusterLifecycle::provision(&admin, &options).await {
        Err(ClusterError::StatementFailed { index, statement, error }) => {
            assert_eq!(index, 0);
            assert!(statement.starts_with("CREATE EXTENSION"));
            assert!(error.contains("plv8.control"));
        }
        other => panic!("expected StatementFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn drop_of_missing_cluster_is_command_failure() {
    let admin = FakeHost::new().admin();
    match ClusterLifecycle::drop(&admin, &mochatest()).await {
        Err(ClusterError::CommandFailed { command, exit_code, stderr }) => {
            assert_eq!(command, "pg_dropcluster --stop 9.3 mochatest");
            assert_eq!(exit_code, Some(1));
            assert_eq!(stderr, "Error: specified cluster does not exist");
        }
        other => panic!("expected CommandFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn teardown_removes_online_cluster_and_tolerates_repeats() {
    let admin = FakeHost::new()
        .with_cluster(FakeCluster::new("9.3", "mochatest", 5439, "xtuple").online())
        .admin();

    assert!(ClusterLifecycle::teardown(&admin, &mochatest()).await);
    assert!(admin.runner().cluster("9.3", "mochatest").is_none());
    assert!(ClusterLifecycle::teardown(&admin, &mochatest()).await);
    assert_eq!(admin.runner().calls_to("pg_dropcluster"), 1);
}

#[tokio::test]
async fn databases_and_queries() {
    let admin = FakeHost::new()
        .with_cluster(FakeCluster::new("9.3", "mochatest", 5439, "xtuple").online())
        .admin();
    let options = ClusterLifecycle::discover(&admin, &mochatest()).await.unwrap();
    assert_eq!(options.port, Some(5439));

    ClusterLifecycle::create_database(&admin, &options, "xtuple", "scratch")
        .await
        .unwrap();
    assert!(matches!(
        ClusterLifecycle::create_database(&admin, &options, "xtuple", "scratch").await,
        Err(ClusterError::CommandFailed { .. })
    ));

    let results = QueryExecutor::execute(
        &admin,
        &options,
        "scratch",
        &[
            Statement::new("SELECT current_database() AS db, current_user AS usr"),
            Statement::new("SELECT rolname FROM pg_roles ORDER BY rolname"),
        ],
    )
    .await
    .unwrap();
    assert_eq!(results[0].get(0, "db"), Some("scratch"));
    assert_eq!(results[0].get(0, "usr"), Some("xtuple"));
    assert_eq!(results[1].len(), 1);

    ClusterLifecycle::drop_database(&admin, &options, "scratch").await.unwrap();
    assert!(matches!(
        QueryExecutor::execute_one(&admin, &options, "scratch", "SELECT 1".into()).await,
        Err(ClusterError::StatementFailed { index: 0, .. })
    ));
}

#[tokio::test]
async fn queries_against_a_stopped_cluster_fail() {
    let admin: PgAdmin<FakeHost> = FakeHost::new()
        .with_cluster(FakeCluster::new("9.3", "mochatest", 5439, "xtuple"))
        .admin();
    let options = mochatest().with_port(5439);

    match QueryExecutor::execute_one(&admin, &options, "postgres", "SELECT 1".into()).await {
        Err(ClusterError::StatementFailed { error, .. }) => assert!(error.contains("could not connect")),
        other => panic!("expected StatementFailed, got {other:?}"),
    }
    assert!(matches!(
        ClusterLifecycle::initialize(
            &admin,
            &ClusterDirectory::find(&admin, options.version, "mochatest")
                .await
                .unwrap()
                .unwrap(),
            &options
        )
        .await,
        Err(ClusterError::ClusterNotOnline { .. })
    ));
}

#[tokio::test]
async fn create_accepts_name_with_leading_digit() {
    let admin = FakeHost::new().admin();
    let options = ProvisioningOptions::new(
        PgVersion::new(9, Some(3)),
        "5f3a2b-mochatest1.2.3",
        "xtuple",
        &ToolsConfig::default(),
    );

    let created = ClusterLifecycle::create(&admin, &options).await.unwrap();
    assert_eq!(created.descriptor.name, "5f3a2b-mochatest1.2.3");
    assert_eq!(admin.runner().calls_to("pg_createcluster"), 1);
    assert!(admin.runner().cluster("9.3", "5f3a2b-mochatest1.2.3").is_some());
}

#[tokio::test]
async fn multiline_values_stay_in_one_row() {
    let admin = FakeHost::new()
        .with_cluster(FakeCluster::new("9.3", "mochatest", 5439, "xtuple").online())
        .admin();
    let options = mochatest().with_port(5439);

    let result = QueryExecutor::execute_one(&admin, &options, "postgres", "SELECT E'line1\\nline2' AS note".into())
        .await
        .unwrap();
    assert_eq!(result.columns, vec!["note"]);
    assert_eq!(result.len(), 1);
    assert_eq!(result.get(0, "note"), Some("line1\nline2"));
}
