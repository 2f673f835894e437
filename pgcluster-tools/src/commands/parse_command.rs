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

use std::path::PathBuf;

use clap::Parser;
use pgcluster_common::tools_config::ParsePolicy;
use tokio::io::AsyncReadExt;

use crate::cli::validators::parse_tool_output;
use crate::commands::result_rows;
use crate::commands::CommandExecute;
use crate::commands::CommonArgs;
use crate::core::admin::PgAdmin;
use crate::core::parser::parse_with_policy;
use crate::core::parser::ParsedOutput;
use crate::core::runner::SystemCommandRunner;
use crate::core::ClusterResult;

#[derive(Debug, Clone, Parser)]
pub struct ParseCommand {
    #[command(flatten)]
    common: CommonArgs,

    #[arg(
        value_name = "FORMAT",
        value_parser = parse_tool_output,
        help = "Tool output to parse: pg_createcluster, pg_hba, pg_lsclusters or psql"
    )]
    tool_output: String,

    #[arg(help = "File to parse, stdin when omitted")]
    file: Option<PathBuf>,

    #[arg(long = "fail-fast", help = "Fail on the first malformed row instead of skipping it")]
    fail_fast: bool,
}

impl CommandExecute for ParseCommand {
    async fn execute(&self, admin: &PgAdmin<SystemCommandRunner>) -> ClusterResult<()> {
        let raw = match &self.file {
            Some(file) => tokio::fs::read_to_string(file).await?,
            None => {
                let mut raw = String::new();
                tokio::io::stdin().read_to_string(&mut raw).await?;
                raw
            }
        };
        let policy = if self.fail_fast {
            ParsePolicy::FailFast
        } else {
            admin.config().parse_policy
        };

        match parse_with_policy(&raw, &self.tool_output, policy)? {
            ParsedOutput::ResultSet(result) => self.common.print(&result_rows(&result)),
            parsed => self.common.print(&parsed),
        }
        Ok(())
    }
}
