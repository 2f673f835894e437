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

use std::fmt::Debug;
use std::path::Path;

use config::Config;
use config::Environment;
use pgcluster_error::ClusterResult;
use serde::de::DeserializeOwned;

/// Builds a configuration value from an optional file layered under `<PREFIX>_*` environment
/// variables. Nested keys use `__` in variable names (`PGCLUSTER_PROGRAMS__PSQL`), and the keys
/// named in `list_keys` accept comma separated values.
pub fn parse_config_file<C>(config_file: Option<&Path>, env_prefix: &str, list_keys: &[&str]) -> ClusterResult<C>
where
    C: Debug + DeserializeOwned,
{
    let mut builder = Config::builder();
    if let Some(path) = config_file {
        builder = builder.add_source(config::File::from(path));
    }

    let mut environment = Environment::with_prefix(env_prefix)
        .prefix_separator("_")
        .separator("__")
        .list_separator(",")
        .try_parsing(true);
    for key in list_keys {
        environment = environment.with_list_parse_key(key);
    }

    let cfg = builder.add_source(environment).build()?;
    let config = cfg.try_deserialize::<C>()?;
    Ok(config)
}
