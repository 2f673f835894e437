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

//! Cluster lifecycle: create, initialize, control, drop.
//!
//! ```text
//! absent --create--> down --start/restart--> online --stop--> down --drop--> absent
//! ```
//!
//! Every operation re-reads the directory instead of trusting earlier observations. There is
//! no lock between the existence check in [`ClusterLifecycle::create`] and `pg_createcluster`;
//! two concurrent creators can both pass the check.

use std::fmt;

use pgcluster_common::StringUtils::random_alphanumeric;
use serde::Serialize;
use tracing::info;
use tracing::warn;

use crate::core::admin::PgAdmin;
use crate::core::directory::ClusterDirectory;
use crate::core::parser::parse_createcluster;
use crate::core::query::QueryExecutor;
use crate::core::query::Statement;
use crate::core::runner::CommandRunner;
use crate::core::runner::RunOptions;
use crate::core::types::validate_identifier;
use crate::core::types::ClusterAction;
use crate::core::types::ClusterCreationResult;
use crate::core::types::ClusterDescriptor;
use crate::core::types::ClusterIdentity;
use crate::core::types::ProvisioningOptions;
use crate::core::types::ResultSet;
use crate::core::ClusterError;
use crate::core::ClusterResult;

/// Database every cluster ships with; used to look up other databases
const MAINTENANCE_DATABASE: &str = "postgres";

/// Outcome of [`ClusterLifecycle::create`]
#[derive(Debug, Clone, Serialize)]
pub struct CreatedCluster {
    /// The input options with the port assigned by `pg_createcluster`
    #[serde(skip)]
    pub options: ProvisioningOptions,
    pub descriptor: ClusterDescriptor,
    pub creation: ClusterCreationResult,
}

/// What [`ClusterLifecycle::initialize`] did
#[derive(Clone, Default, Serialize)]
pub struct InitReport {
    pub database: String,
    pub database_created: bool,
    pub extensions: Vec<String>,
    pub created_roles: Vec<String>,
    pub existing_roles: Vec<String>,
    pub grants: Vec<String>,
    /// Set only when the admin role was created with a generated password
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generated_password: Option<String>,
}

impl fmt::Debug for InitReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InitReport")
            .field("database", &self.database)
            .field("database_created", &self.database_created)
            .field("extensions", &self.extensions)
            .field("created_roles", &self.created_roles)
            .field("existing_roles", &self.existing_roles)
            .field("grants", &self.grants)
            .field("generated_password", &self.generated_password.as_ref().map(|_| "******"))
            .finish()
    }
}

/// Outcome of [`ClusterLifecycle::provision`]
#[derive(Debug, Clone, Serialize)]
pub struct ProvisionReport {
    #[serde(skip)]
    pub options: ProvisioningOptions,
    pub descriptor: ClusterDescriptor,
    pub creation: ClusterCreationResult,
    pub init: InitReport,
}

pub struct ClusterLifecycle;

impl ClusterLifecycle {
    /// Creates a new cluster.
    ///
    /// Fails with [`ClusterError::ClusterAlreadyExists`] or [`ClusterError::PortInUse`] before
    /// any command runs. The returned options carry the port the cluster was given.
    pub async fn create<R: CommandRunner>(
        admin: &PgAdmin<R>,
        options: &ProvisioningOptions,
    ) -> ClusterResult<CreatedCluster> {
        options.validate()?;

        let clusters = ClusterDirectory::list_clusters(admin).await?;
        if clusters
            .iter()
            .any(|c| c.version() == options.version() && c.cluster_name() == options.cluster_name())
        {
            return Err(ClusterError::cluster_already_exists(options.version, &options.name));
        }
        if let Some(port) = options.port {
            if let Some(holder) = clusters.iter().find(|c| c.port == port) {
                return Err(ClusterError::port_in_use(port, holder.cluster_id()));
            }
        }

        info!(cluster = %options.cluster_id(), owner = %options.owner, "creating cluster");
        let output = admin
            .run(&admin.commands().createcluster(options), RunOptions::default())
            .await?;
        let creation = parse_createcluster(&output.stdout)?;

        let mut descriptor = ClusterDirectory::find(admin, options.version, &options.name)
            .await?
            .ok_or_else(|| ClusterError::cluster_not_found(options.version, &options.name))?;
        descriptor.merge_creation(&creation);
        info!(cluster = %descriptor.cluster_id(), port = creation.port, "cluster created");

        Ok(CreatedCluster {
            options: options.clone().with_port(creation.port),
            descriptor,
            creation,
        })
    }

    /// Runs `pg_ctlcluster`. The resulting state is not verified.
    pub async fn ctl<R: CommandRunner>(
        admin: &PgAdmin<R>,
        cluster: &impl ClusterIdentity,
        action: ClusterAction,
    ) -> ClusterResult<()> {
        info!(cluster = %cluster.cluster_id(), %action, "controlling cluster");
        admin
            .run(&admin.commands().ctlcluster(cluster, action), RunOptions::default())
            .await?;
        Ok(())
    }

    /// Stops and removes the cluster. A missing cluster surfaces as [`ClusterError::CommandFailed`].
    pub async fn drop<R: CommandRunner>(admin: &PgAdmin<R>, cluster: &impl ClusterIdentity) -> ClusterResult<()> {
        info!(cluster = %cluster.cluster_id(), "dropping cluster");
        admin
            .run(&admin.commands().dropcluster(cluster), RunOptions::default())
            .await?;
        Ok(())
    }

    pub async fn create_database<R: CommandRunner>(
        admin: &PgAdmin<R>,
        options: &ProvisioningOptions,
        owner: &str,
        database: &str,
    ) -> ClusterResult<()> {
        validate_identifier("owner", owner)?;
        validate_identifier("database", database)?;
        let port = options.require_port()?;
        info!(cluster = %options.cluster_id(), database, owner, "creating database");
        admin
            .run(
                &admin.commands().createdb(options, port, owner, database),
                RunOptions::default(),
            )
            .await?;
        Ok(())
    }

    pub async fn drop_database<R: CommandRunner>(
        admin: &PgAdmin<R>,
        options: &ProvisioningOptions,
        database: &str,
    ) -> ClusterResult<()> {
        validate_identifier("database", database)?;
        let port = options.require_port()?;
        info!(cluster = %options.cluster_id(), database, "dropping database");
        admin
            .run(&admin.commands().dropdb(options, port, database), RunOptions::default())
            .await?;
        Ok(())
    }

    /// Fills in the port of an existing cluster from the directory
    pub async fn discover<R: CommandRunner>(
        admin: &PgAdmin<R>,
        options: &ProvisioningOptions,
    ) -> ClusterResult<ProvisioningOptions> {
        if options.port.is_some() {
            return Ok(options.clone());
        }
        let descriptor = ClusterDirectory::find(admin, options.version, &options.name)
            .await?
            .ok_or_else(|| ClusterError::cluster_not_found(options.version, &options.name))?;
        Ok(options.clone().with_port(descriptor.port))
    }

    /// Prepares an online cluster for the application: owner database, extensions, roles and
    /// grants. Safe to re-run; existing roles are left untouched.
    ///
    /// # Errors
    /// - [`ClusterError::ClusterNotOnline`] when the directory does not report the cluster online
    /// - [`ClusterError::StatementFailed`] with the index of the failing step
    pub async fn initialize<R: CommandRunner>(
        admin: &PgAdmin<R>,
        descriptor: &ClusterDescriptor,
        options: &ProvisioningOptions,
    ) -> ClusterResult<InitReport> {
        options.validate()?;
        let roles = &admin.config().roles;
        validate_identifier("roles.admin", &roles.admin)?;
        validate_identifier("roles.group", &roles.group)?;
        validate_identifier("roles.compat_superuser", &roles.compat_superuser)?;

        let current = ClusterDirectory::find(admin, descriptor.version, &descriptor.name)
            .await?
            .ok_or_else(|| ClusterError::cluster_not_found(descriptor.version, &descriptor.name))?;
        if !current.is_online() {
            return Err(ClusterError::cluster_not_online(
                current.version,
                &current.name,
                current.status,
            ));
        }
        let target = options.clone().with_port(current.port);
        let database = target.owner.clone();
        info!(cluster = %target.cluster_id(), %database, "initializing cluster");

        let mut report = InitReport {
            database: database.clone(),
            ..Default::default()
        };

        let lookup = Statement::new("SELECT 1 AS present FROM pg_database WHERE datname = :'dbname'")
            .bind("dbname", &database);
        if QueryExecutor::execute_one(admin, &target, MAINTENANCE_DATABASE, lookup)
            .await?
            .is_empty()
        {
            Self::create_database(admin, &target, &target.owner, &database).await?;
            report.database_created = true;
        }

        let mut session = InitSession {
            admin,
            target: &target,
            database: &database,
            step: 0,
        };

        for extension in &target.extensions {
            session
                .run(Statement::new("CREATE EXTENSION IF NOT EXISTS :\"extension\"").bind("extension", extension))
                .await?;
            report.extensions.push(extension.clone());
        }

        let (password, generated) = match &target.admin_password {
            Some(password) => (password.clone(), false),
            None => (random_alphanumeric(admin.config().password_length), true),
        };
        let admin_role = Statement::new("CREATE ROLE :\"role\" WITH LOGIN PASSWORD :'password' SUPERUSER")
            .bind("role", &roles.admin)
            .bind_secret("password", &password);
        if session.ensure_role(&roles.admin, admin_role, &mut report).await? && generated {
            report.generated_password = Some(password);
        }

        let group_role = Statement::new("CREATE ROLE :\"role\" WITH ROLE :\"member\"")
            .bind("role", &roles.group)
            .bind("member", &roles.admin);
        session.ensure_role(&roles.group, group_role, &mut report).await?;

        let compat_role = Statement::new("CREATE ROLE :\"role\" LOGIN SUPERUSER").bind("role", &roles.compat_superuser);
        session
            .ensure_role(&roles.compat_superuser, compat_role, &mut report)
            .await?;

        for member in [&roles.admin, &target.owner] {
            session
                .run(
                    Statement::new("GRANT :\"group\" TO :\"member\"")
                        .bind("group", &roles.group)
                        .bind("member", member),
                )
                .await?;
            report.grants.push(format!("{} TO {}", roles.group, member));
        }

        info!(
            cluster = %target.cluster_id(),
            created_roles = ?report.created_roles,
            "cluster initialized"
        );
        Ok(report)
    }

    /// Create, restart, confirm online, initialize
    pub async fn provision<R: CommandRunner>(
        admin: &PgAdmin<R>,
        options: &ProvisioningOptions,
    ) -> ClusterResult<ProvisionReport> {
        let created = Self::create(admin, options).await?;
        Self::ctl(admin, &created.options, ClusterAction::Restart).await?;

        let descriptor = ClusterDirectory::find(admin, options.version, &options.name)
            .await?
            .ok_or_else(|| ClusterError::cluster_not_found(options.version, &options.name))?;
        if !descriptor.is_online() {
            return Err(ClusterError::cluster_not_online(
                descriptor.version,
                &descriptor.name,
                descriptor.status,
            ));
        }

        let init = Self::initialize(admin, &descriptor, &created.options).await?;
        let mut descriptor = descriptor;
        descriptor.merge_creation(&created.creation);

        Ok(ProvisionReport {
            options: created.options,
            descriptor,
            creation: created.creation,
            init,
        })
    }

    /// Best-effort uninstall: stop and drop the cluster, logging every failure instead of
    /// returning it. Returns whether the cluster is absent afterwards.
    pub async fn teardown<R: CommandRunner>(admin: &PgAdmin<R>, options: &ProvisioningOptions) -> bool {
        let cluster = options.cluster_id();
        match ClusterDirectory::find(admin, options.version, &options.name).await {
            Ok(None) => {
                info!(%cluster, "cluster already absent");
                return true;
            }
            Ok(Some(descriptor)) if descriptor.is_online() => {
                if let Err(err) = Self::ctl(admin, options, ClusterAction::Stop).await {
                    warn!(%cluster, "failed to stop cluster, dropping anyway: {}", err);
                }
            }
            Ok(Some(_)) => {}
            Err(err) => warn!(%cluster, "failed to look up cluster: {}", err),
        }

        if let Err(err) = Self::drop(admin, options).await {
            warn!(%cluster, "failed to drop cluster: {}", err);
        }

        match ClusterDirectory::find(admin, options.version, &options.name).await {
            Ok(None) => true,
            Ok(Some(_)) => {
                warn!(%cluster, "cluster still present after teardown");
                false
            }
            Err(err) => {
                warn!(%cluster, "failed to confirm teardown: {}", err);
                false
            }
        }
    }
}

/// Numbers the statements of an initialization run so a failure reports its step
struct InitSession<'a, R> {
    admin: &'a PgAdmin<R>,
    target: &'a ProvisioningOptions,
    database: &'a str,
    step: usize,
}

impl<R: CommandRunner> InitSession<'_, R> {
    async fn run(&mut self, statement: Statement) -> ClusterResult<ResultSet> {
        let index = self.step;
        self.step += 1;
        QueryExecutor::execute_one(self.admin, self.target, self.database, statement)
            .await
            .map_err(|err| match err {
                ClusterError::StatementFailed { statement, error, .. } => ClusterError::StatementFailed {
                    index,
                    statement,
                    error,
                },
                other => other,
            })
    }

    /// Creates `role` with `create` unless `pg_roles` already lists it. Returns whether it was created.
    async fn ensure_role(&mut self, role: &str, create: Statement, report: &mut InitReport) -> ClusterResult<bool> {
        let exists = self
            .run(Statement::new("SELECT 1 AS present FROM pg_roles WHERE rolname = :'role'").bind("role", role))
            .await?;
        if !exists.is_empty() {
            report.existing_roles.push(role.to_string());
            return Ok(false);
        }
        self.run(create).await?;
        report.created_roles.push(role.to_string());
        Ok(true)
    }
}
