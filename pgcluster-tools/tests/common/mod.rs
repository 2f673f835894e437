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

//! A simulated host running the postgresql-common tools.

#![allow(dead_code)]

use std::collections::HashMap;

use parking_lot::Mutex;
use pgcluster_common::tools_config::ToolsConfig;
use pgcluster_tools::core::admin::PgAdmin;
use pgcluster_tools::core::parser::PSQL_FIELD_SEPARATOR;
use pgcluster_tools::core::parser::PSQL_RECORD_SEPARATOR;
use pgcluster_tools::core::runner::CommandLine;
use pgcluster_tools::core::runner::CommandOutput;
use pgcluster_tools::core::runner::CommandRunner;
use pgcluster_tools::core::ClusterResult;

const FIRST_PORT: u16 = 5432;

#[derive(Debug, Clone)]
pub struct FakeCluster {
    pub version: String,
    pub name: String,
    pub port: u16,
    pub online: bool,
    pub owner: String,
    pub locale: String,
    pub databases: Vec<String>,
    pub roles: Vec<String>,
    pub extensions: Vec<String>,
    pub grants: Vec<(String, String)>,
}

impl FakeCluster {
    pub fn new(version: &str, name: &str, port: u16, owner: &str) -> Self {
        FakeCluster {
            version: version.to_string(),
            name: name.to_string(),
            port,
            online: false,
            owner: owner.to_string(),
            locale: "en_US.UTF-8".to_string(),
            databases: vec!["postgres".to_string(), "template0".to_string(), "template1".to_string()],
            roles: vec![owner.to_string()],
            extensions: vec!["plpgsql".to_string()],
            grants: Vec::new(),
        }
    }

    pub fn online(mut self) -> Self {
        self.online = true;
        self
    }

    fn data_directory(&self) -> String {
        format!("/var/lib/postgresql/{}/{}", self.version, self.name)
    }
}

#[derive(Default)]
struct HostState {
    clusters: Vec<FakeCluster>,
    calls: Vec<CommandLine>,
    /// Extensions whose control file is missing
    unavailable_extensions: Vec<String>,
    /// `pg_ctlcluster start` succeeds but the cluster stays down
    refuse_start: bool,
}

#[derive(Default)]
pub struct FakeHost {
    state: Mutex<HostState>,
}

impl FakeHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cluster(self, cluster: FakeCluster) -> Self {
        self.state.lock().clusters.push(cluster);
        self
    }

    pub fn without_extension(self, extension: &str) -> Self {
        self.state.lock().unavailable_extensions.push(extension.to_string());
        self
    }

    pub fn refusing_start(self) -> Self {
        self.state.lock().refuse_start = true;
        self
    }

    pub fn cluster(&self, version: &str, name: &str) -> Option<FakeCluster> {
        self.state
            .lock()
            .clusters
            .iter()
            .find(|c| c.version == version && c.name == name)
            .cloned()
    }

    pub fn calls_to(&self, program: &str) -> usize {
        self.state.lock().calls.iter().filter(|c| c.program() == program).count()
    }

    pub fn calls(&self) -> Vec<CommandLine> {
        self.state.lock().calls.clone()
    }

    pub fn admin(self) -> PgAdmin<FakeHost> {
        PgAdmin::new(self, ToolsConfig::default())
    }
}

impl CommandRunner for FakeHost {
    async fn execute(&self, command: &CommandLine) -> ClusterResult<CommandOutput> {
        let mut state = self.state.lock();
        state.calls.push(command.clone());

        let (flags, positionals) = split_args(command.get_args());
        let output = match command.program() {
            "pg_lsclusters" => lsclusters(&state),
            "pg_createcluster" => createcluster(&mut state, &flags, &positionals),
            "pg_ctlcluster" => ctlcluster(&mut state, &positionals),
            "pg_dropcluster" => dropcluster(&mut state, &positionals),
            "createdb" => createdb(&mut state, &flags, &positionals),
            "dropdb" => dropdb(&mut state, &flags, &positionals),
            "psql" => psql(&mut state, &flags, command.get_stdin().unwrap_or_default()),
            other => failure(127, &format!("{other}: command not found")),
        };
        Ok(output)
    }
}

/// `--key=value` flags (bare `--flag` maps to an empty value) and positional arguments.
/// Repeated `--set` flags are folded into `set.<name>` entries.
fn split_args(args: &[String]) -> (HashMap<String, String>, Vec<String>) {
    let mut flags = HashMap::new();
    let mut positionals = Vec::new();
    for arg in args {
        match arg.strip_prefix("--") {
            Some(flag) => {
                let (key, value) = flag.split_once('=').unwrap_or((flag, ""));
                if key == "set" {
                    let (name, value) = value.split_once('=').unwrap_or((value, ""));
                    flags.insert(format!("set.{name}"), value.to_string());
                } else {
                    flags.insert(key.to_string(), value.to_string());
                }
            }
            None => positionals.push(arg.clone()),
        }
    }
    (flags, positionals)
}

fn success(stdout: impl Into<String>) -> CommandOutput {
    CommandOutput {
        stdout: stdout.into(),
        stderr: String::new(),
        exit_code: Some(0),
    }
}

fn failure(code: i32, stderr: &str) -> CommandOutput {
    CommandOutput {
        stdout: String::new(),
        stderr: format!("{stderr}\n"),
        exit_code: Some(code),
    }
}

fn lsclusters(state: &HostState) -> CommandOutput {
    if state.clusters.is_empty() {
        return success("");
    }
    let mut out = String::from("Ver Cluster Port Status Owner Data directory Log file\n");
    for c in &state.clusters {
        out.push_str(&format!(
            "{} {} {} {} {} {} /var/log/postgresql/postgresql-{}-{}.log\n",
            c.version,
            c.name,
            c.port,
            if c.online { "online" } else { "down" },
            c.owner,
            c.data_directory(),
            c.version,
            c.name
        ));
    }
    success(out)
}

fn createcluster(state: &mut HostState, flags: &HashMap<String, String>, positionals: &[String]) -> CommandOutput {
    let [version, name] = positionals else {
        return failure(1, "Usage: pg_createcluster [options] <version> <cluster name>");
    };
    if state.clusters.iter().any(|c| &c.version == version && &c.name == name) {
        return failure(1, &format!("Error: cluster configuration already exists for {version}/{name}"));
    }
    let port = match flags.get("port") {
        Some(port) => match port.parse::<u16>() {
            Ok(port) => port,
            Err(_) => return failure(1, "Error: invalid port"),
        },
        None => {
            let mut port = FIRST_PORT;
            while state.clusters.iter().any(|c| c.port == port) {
                port += 1;
            }
            port
        }
    };
    let owner = flags.get("user").cloned().unwrap_or_else(|| "postgres".to_string());
    let mut cluster = FakeCluster::new(version, name, port, &owner);
    if let Some(locale) = flags.get("locale") {
        cluster.locale = locale.clone();
    }

    let out = format!(
        "Creating new cluster {version}/{name} ...\n  config /etc/postgresql/{version}/{name}\n  data   {}\n  locale {}\n  port   {port}\n",
        cluster.data_directory(),
        cluster.locale
    );
    state.clusters.push(cluster);
    success(out)
}

fn ctlcluster(state: &mut HostState, positionals: &[String]) -> CommandOutput {
    let [version, name, action] = positionals else {
        return failure(1, "Usage: pg_ctlcluster <version> <cluster> <action>");
    };
    let refuse_start = state.refuse_start;
    let Some(cluster) = state
        .clusters
        .iter_mut()
        .find(|c| &c.version == version && &c.name == name)
    else {
        return failure(1, "Error: specified cluster does not exist");
    };
    match action.as_str() {
        "start" | "restart" => {
            cluster.online = !refuse_start;
            success("")
        }
        "stop" if !cluster.online => failure(2, "Cluster is not running."),
        "stop" => {
            cluster.online = false;
            success("")
        }
        "reload" if !cluster.online => failure(2, "Cluster is not running."),
        "reload" => success(""),
        other => failure(1, &format!("Error: invalid action '{other}'")),
    }
}

fn dropcluster(state: &mut HostState, positionals: &[String]) -> CommandOutput {
    let [version, name] = positionals else {
        return failure(1, "Usage: pg_dropcluster [--stop] <version> <cluster>");
    };
    let before = state.clusters.len();
    state.clusters.retain(|c| !(&c.version == version && &c.name == name));
    if state.clusters.len() == before {
        return failure(1, "Error: specified cluster does not exist");
    }
    success("")
}

fn connect<'a>(state: &'a mut HostState, flags: &HashMap<String, String>) -> Result<&'a mut FakeCluster, CommandOutput> {
    let port = flags.get("port").and_then(|p| p.parse::<u16>().ok());
    let socket = flags.get("host").cloned().unwrap_or_default();
    match state.clusters.iter_mut().find(|c| Some(c.port) == port) {
        Some(cluster) if cluster.online => Ok(cluster),
        _ => Err(failure(
            2,
            &format!(
                "could not connect to server: No such file or directory\n\tIs the server running locally and accepting connections on Unix domain socket \"{socket}/.s.PGSQL.{}\"?",
                port.unwrap_or_default()
            ),
        )),
    }
}

fn createdb(state: &mut HostState, flags: &HashMap<String, String>, positionals: &[String]) -> CommandOutput {
    let cluster = match connect(state, flags) {
        Ok(cluster) => cluster,
        Err(output) => return output,
    };
    let [database] = positionals else {
        return failure(1, "createdb: too many command-line arguments");
    };
    if cluster.databases.contains(database) {
        return failure(
            1,
            &format!("createdb: database creation failed: ERROR:  database \"{database}\" already exists"),
        );
    }
    cluster.databases.push(database.clone());
    success("")
}

fn dropdb(state: &mut HostState, flags: &HashMap<String, String>, positionals: &[String]) -> CommandOutput {
    let cluster = match connect(state, flags) {
        Ok(cluster) => cluster,
        Err(output) => return output,
    };
    if let [database] = positionals {
        cluster.databases.retain(|db| db != database);
    }
    success("")
}

fn psql(state: &mut HostState, flags: &HashMap<String, String>, sql: &str) -> CommandOutput {
    let unavailable = state.unavailable_extensions.clone();
    let cluster = match connect(state, flags) {
        Ok(cluster) => cluster,
        Err(output) => return output,
    };
    let database = flags.get("dbname").cloned().unwrap_or_default();
    if !cluster.databases.contains(&database) {
        return failure(2, &format!("psql: FATAL:  database \"{database}\" does not exist"));
    }
    let var = |name: &str| flags.get(&format!("set.{name}")).cloned().unwrap_or_default();
    let present = |found: bool| success(if found { "present\01\0" } else { "present\0" });

    match sql {
        s if s.contains("FROM pg_database WHERE datname = :'dbname'") => {
            present(cluster.databases.contains(&var("dbname")))
        }
        s if s.contains("FROM pg_roles WHERE rolname = :'role'") => present(cluster.roles.contains(&var("role"))),
        s if s.starts_with("CREATE EXTENSION IF NOT EXISTS :\"extension\"") => {
            let extension = var("extension");
            if unavailable.contains(&extension) {
                return failure(
                    3,
                    &format!("ERROR:  could not open extension control file \"{extension}.control\": No such file or directory"),
                );
            }
            if !cluster.extensions.contains(&extension) {
                cluster.extensions.push(extension);
            }
            success("")
        }
        s if s.starts_with("CREATE ROLE :\"role\"") => {
            let role = var("role");
            if cluster.roles.contains(&role) {
                return failure(3, &format!("ERROR:  role \"{role}\" already exists"));
            }
            cluster.roles.push(role);
            success("")
        }
        s if s.starts_with("GRANT :\"group\" TO :\"member\"") => {
            let (group, member) = (var("group"), var("member"));
            for role in [&group, &member] {
                if !cluster.roles.contains(role) {
                    return failure(3, &format!("ERROR:  role \"{role}\" does not exist"));
                }
            }
            cluster.grants.push((group, member));
            success("")
        }
        "SELECT rolname FROM pg_roles ORDER BY rolname" => {
            let mut roles = cluster.roles.clone();
            roles.sort();
            success(records(std::iter::once("rolname".to_string()).chain(roles)))
        }
        "SELECT current_database() AS db, current_user AS usr" => success(records([
            format!("db{PSQL_FIELD_SEPARATOR}usr"),
            format!(
                "{database}{PSQL_FIELD_SEPARATOR}{}",
                flags.get("username").cloned().unwrap_or_default()
            ),
        ])),
        "SELECT E'line1\\nline2' AS note" => success(records(["note".to_string(), "line1\nline2".to_string()])),
        _ => failure(3, "ERROR:  syntax error at or near \"NOT\""),
    }
}

/// psql output with `--record-separator-zero`: every record NUL-terminated
fn records(records: impl IntoIterator<Item = String>) -> String {
    records
        .into_iter()
        .map(|record| format!("{record}{PSQL_RECORD_SEPARATOR}"))
        .collect()
}
