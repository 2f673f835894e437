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

//! PgCluster Tools - PostgreSQL cluster provisioning on top of postgresql-common
//!
//! This crate provides both:
//! - **Core**: parsers for the cluster tools' output and the cluster lifecycle operations
//! - **CLI**: the `pgcluster-admin-cli` command-line interface
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │        CLI Layer (commands/, cli/)      │
//! │  - Command parsing (clap)               │
//! │  - Output formatting (formatters/)      │
//! │  - Input validation (validators)        │
//! └─────────────────┬───────────────────────┘
//!                   │
//!                   ▼
//! ┌─────────────────────────────────────────┐
//! │         Core Logic (core/)              │
//! │  - Cluster directory and lifecycle      │
//! │  - SQL execution through psql           │
//! │  - Output parsers                       │
//! └─────────────────┬───────────────────────┘
//!                   │
//!                   ▼
//! ┌─────────────────────────────────────────┐
//! │     CommandRunner (core/runner)         │
//! │  - pg_lsclusters, pg_createcluster, ... │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Usage Examples
//!
//! ```rust,ignore
//! use pgcluster_tools::core::admin::PgAdminBuilder;
//! use pgcluster_tools::core::lifecycle::ClusterLifecycle;
//! use pgcluster_tools::core::types::ProvisioningOptions;
//!
//! let admin = PgAdminBuilder::new().build()?;
//! let options = ProvisioningOptions::new("9.3".parse()?, "mochatest", "xtuple", admin.config());
//! let report = ClusterLifecycle::provision(&admin, &options).await?;
//! println!("cluster online on port {}", report.descriptor.port);
//! ```
//!
//! ```bash
//! pgcluster-admin-cli cluster provision -v 9.3 -c mochatest -o xtuple
//! ```

pub mod core {
    //! Core business logic, independent of the CLI
    //!
    //! - [`admin`] - admin handle and builder
    //! - [`parser`] - parsers for the tools' text output
    //! - [`directory`] - cluster listing
    //! - [`lifecycle`] - create, initialize, control and drop clusters
    //! - [`query`] - SQL through psql

    pub mod admin;
    pub mod admin_commands;
    pub mod directory;
    pub mod lifecycle;
    pub mod parser;
    pub mod query;
    pub mod runner;
    pub mod types;

    #[cfg(test)]
    pub(crate) mod test_support;

    // Re-export error types from pgcluster-error
    pub use pgcluster_error::ClusterError;
    pub use pgcluster_error::ClusterResult;
}

pub mod cli {
    //! CLI presentation layer
    //!
    //! - [`formatters`] - output formatters (Table, JSON)
    //! - [`validators`] - input validators

    pub mod formatters;
    pub mod validators;
}

pub(crate) mod commands;

pub mod pgcluster_cli;
