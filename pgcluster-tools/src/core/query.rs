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

//! SQL execution through `psql`.
//!
//! Statements are sent as literal text on psql's stdin. Values travel separately as psql
//! variables (`--set=name=value`) and are referenced in the text as `:'name'` (quoted literal)
//! or `:"name"` (quoted identifier), so psql does the quoting and nothing is spliced into SQL.

use std::fmt;

use tracing::debug;

use crate::core::admin::PgAdmin;
use crate::core::parser::parse_psql;
use crate::core::runner::CommandRunner;
use crate::core::types::ProvisioningOptions;
use crate::core::types::ResultSet;
use crate::core::ClusterError;
use crate::core::ClusterResult;

/// A psql variable bound to a statement
#[derive(Clone, PartialEq, Eq)]
pub struct SqlParam {
    pub name: String,
    pub value: String,
    /// Masked in logs and error messages
    pub secret: bool,
}

impl fmt::Debug for SqlParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = if self.secret { "******" } else { self.value.as_str() };
        f.debug_struct("SqlParam")
            .field("name", &self.name)
            .field("value", &value)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    sql: String,
    params: Vec<SqlParam>,
}

impl Statement {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    /// Binds `value` to the psql variable `name`
    pub fn bind(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push(SqlParam {
            name: name.into(),
            value: value.into(),
            secret: false,
        });
        self
    }

    /// Same as [`Statement::bind`], but the value never shows up in logs or errors
    pub fn bind_secret(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push(SqlParam {
            name: name.into(),
            value: value.into(),
            secret: true,
        });
        self
    }

    #[inline]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    #[inline]
    pub fn params(&self) -> &[SqlParam] {
        &self.params
    }

    fn validate(&self) -> ClusterResult<()> {
        for param in &self.params {
            let valid = !param.name.is_empty()
                && param.name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
                && param.name != "ON_ERROR_STOP";
            if !valid {
                return Err(ClusterError::validation_error(
                    "statement parameter",
                    format!("'{}' is not a valid psql variable name", param.name),
                ));
            }
            if param.value.contains('\0') {
                return Err(ClusterError::validation_error(
                    "statement parameter",
                    format!("value of '{}' contains a NUL byte", param.name),
                ));
            }
        }
        Ok(())
    }
}

impl From<&str> for Statement {
    fn from(sql: &str) -> Self {
        Statement::new(sql)
    }
}

impl From<String> for Statement {
    fn from(sql: String) -> Self {
        Statement::new(sql)
    }
}

/// Query executor
pub struct QueryExecutor;

impl QueryExecutor {
    /// Runs `statements` in order against `database` of the cluster described by `target`.
    ///
    /// # Returns
    /// One result set per statement, empty for statements that return no rows
    ///
    /// # Errors
    /// The first failing statement stops the batch with [`ClusterError::StatementFailed`],
    /// carrying its index and psql's error text
    pub async fn execute<R: CommandRunner>(
        admin: &PgAdmin<R>,
        target: &ProvisioningOptions,
        database: &str,
        statements: &[Statement],
    ) -> ClusterResult<Vec<ResultSet>> {
        let port = target.require_port()?;
        let mut results = Vec::with_capacity(statements.len());

        for (index, statement) in statements.iter().enumerate() {
            statement.validate()?;
            let command = admin.commands().psql(target, port, database, statement);
            debug!(index, command = %command, sql = statement.sql(), "executing statement");

            let output = admin.runner().execute(&command).await?;
            if !output.success() {
                let error = match output.stderr.trim() {
                    "" => format!("psql exited with {:?}", output.exit_code),
                    stderr => stderr.to_string(),
                };
                return Err(ClusterError::statement_failed(index, statement.sql(), error));
            }
            let result = parse_psql(&output.stdout)
                .map_err(|e| ClusterError::statement_failed(index, statement.sql(), e.to_string()))?;
            results.push(result);
        }

        Ok(results)
    }

    /// Runs a single statement and returns its rows
    pub async fn execute_one<R: CommandRunner>(
        admin: &PgAdmin<R>,
        target: &ProvisioningOptions,
        database: &str,
        statement: Statement,
    ) -> ClusterResult<ResultSet> {
        let mut results = Self::execute(admin, target, database, std::slice::from_ref(&statement)).await?;
        Ok(results.pop().unwrap_or_default())
    }
}
