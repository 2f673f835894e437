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

use anyhow::bail;
use clap::CommandFactory;
use clap::Parser;
use clap_complete::generate;
use clap_complete::shells::Bash;
use clap_complete::shells::Fish;
use clap_complete::shells::Zsh;

use crate::commands::CommandExecute;
use crate::commands::Commands;
use crate::core::admin::PgAdminBuilder;

const BIN_NAME: &str = "pgcluster-admin-cli";

#[derive(Parser)]
#[command(name = "pgcluster-admin-cli")]
#[command(about = "PostgreSQL cluster provisioning commands", long_about = None)]
pub struct PgClusterCli {
    /// Generate shell completion script
    #[arg(
        long = "generate-completion",
        value_name = "SHELL",
        help = "Generate shell completion script (bash, zsh, fish)"
    )]
    completion: Option<String>,

    /// Configuration file (TOML, YAML or JSON); PGCLUSTER_* environment variables override it
    #[arg(long = "config", global = true, env = "PGCLUSTER_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    commands: Option<Commands>,
}

impl PgClusterCli {
    pub async fn handle(&self) -> anyhow::Result<()> {
        // Handle completion generation
        if let Some(shell) = &self.completion {
            let mut cmd = PgClusterCli::command();
            match shell.to_lowercase().as_str() {
                "bash" => generate(Bash, &mut cmd, BIN_NAME, &mut std::io::stdout()),
                "zsh" => generate(Zsh, &mut cmd, BIN_NAME, &mut std::io::stdout()),
                "fish" => generate(Fish, &mut cmd, BIN_NAME, &mut std::io::stdout()),
                _ => bail!("Unsupported shell: {shell}. Supported shells: bash, zsh, fish"),
            }
            return Ok(());
        }

        let Some(commands) = &self.commands else {
            eprintln!("No command specified. Use --help for usage information.");
            return Ok(());
        };

        let mut builder = PgAdminBuilder::new();
        if let Some(config) = &self.config {
            builder = builder.config_file(config);
        }
        let admin = builder.build()?;
        commands.execute(&admin).await?;
        Ok(())
    }
}
