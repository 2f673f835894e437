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

//! Cluster-related types

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use pgcluster_common::tools_config::ToolsConfig;
use pgcluster_common::StringUtils::is_plain_identifier;
use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;

use crate::core::ClusterError;
use crate::core::ClusterResult;

/// PostgreSQL major version as printed by the cluster tools: `9.3` before 10, `16` after
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PgVersion {
    major: u32,
    minor: Option<u32>,
}

impl PgVersion {
    #[inline]
    pub const fn new(major: u32, minor: Option<u32>) -> Self {
        Self { major, minor }
    }

    #[inline]
    pub fn major(&self) -> u32 {
        self.major
    }

    #[inline]
    pub fn minor(&self) -> Option<u32> {
        self.minor
    }
}

impl FromStr for PgVersion {
    type Err = ClusterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ClusterError::validation_error("version", format!("'{s}' is not a numeric PostgreSQL version"));
        let (major, minor) = match s.split_once('.') {
            Some((major, minor)) => (major, Some(minor)),
            None => (s, None),
        };
        let major = major.parse::<u32>().map_err(|_| invalid())?;
        let minor = minor.map(|m| m.parse::<u32>().map_err(|_| invalid())).transpose()?;
        Ok(PgVersion { major, minor })
    }
}

impl fmt::Display for PgVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.minor {
            Some(minor) => write!(f, "{}.{}", self.major, minor),
            None => write!(f, "{}", self.major),
        }
    }
}

impl Serialize for PgVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PgVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        value.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClusterStatus {
    Online,
    Down,
}

impl FromStr for ClusterStatus {
    type Err = String;

    /// Accepts decorated states such as `online,recovery` or `down,binaries_missing`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split(',').next().unwrap_or_default() {
            "online" => Ok(ClusterStatus::Online),
            "down" => Ok(ClusterStatus::Down),
            other => Err(format!("unknown cluster status '{other}'")),
        }
    }
}

impl fmt::Display for ClusterStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClusterStatus::Online => f.pad("online"),
            ClusterStatus::Down => f.pad("down"),
        }
    }
}

/// Anything that names a single cluster
pub trait ClusterIdentity {
    fn version(&self) -> PgVersion;

    fn cluster_name(&self) -> &str;

    fn cluster_id(&self) -> String {
        format!("{}/{}", self.version(), self.cluster_name())
    }
}

/// One row of `pg_lsclusters`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterDescriptor {
    pub version: PgVersion,
    pub name: String,
    pub port: u16,
    pub status: ClusterStatus,
    pub owner: String,
    pub data_directory: PathBuf,
    pub log_file: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub config_directory: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub locale: Option<String>,
}

impl ClusterDescriptor {
    #[inline]
    pub fn is_online(&self) -> bool {
        self.status == ClusterStatus::Online
    }

    /// Folds the fields reported by `pg_createcluster` into this descriptor
    pub fn merge_creation(&mut self, creation: &ClusterCreationResult) {
        self.port = creation.port;
        self.data_directory = creation.data_directory.clone();
        self.config_directory = Some(creation.config_directory.clone());
        self.locale = Some(creation.locale.clone());
    }
}

impl ClusterIdentity for ClusterDescriptor {
    fn version(&self) -> PgVersion {
        self.version
    }

    fn cluster_name(&self) -> &str {
        &self.name
    }
}

/// The label block printed by `pg_createcluster`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterCreationResult {
    pub config_directory: PathBuf,
    pub data_directory: PathBuf,
    pub locale: String,
    pub port: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HbaConnectionType {
    Local,
    Host,
    HostSsl,
    HostNoSsl,
    HostGssEnc,
    HostNoGssEnc,
}

impl HbaConnectionType {
    /// `local` rules have no address column
    #[inline]
    pub fn has_address(&self) -> bool {
        !matches!(self, HbaConnectionType::Local)
    }
}

impl FromStr for HbaConnectionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "local" => Ok(HbaConnectionType::Local),
            "host" => Ok(HbaConnectionType::Host),
            "hostssl" => Ok(HbaConnectionType::HostSsl),
            "hostnossl" => Ok(HbaConnectionType::HostNoSsl),
            "hostgssenc" => Ok(HbaConnectionType::HostGssEnc),
            "hostnogssenc" => Ok(HbaConnectionType::HostNoGssEnc),
            other => Err(format!("unknown connection type '{other}'")),
        }
    }
}

impl fmt::Display for HbaConnectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            HbaConnectionType::Local => "local",
            HbaConnectionType::Host => "host",
            HbaConnectionType::HostSsl => "hostssl",
            HbaConnectionType::HostNoSsl => "hostnossl",
            HbaConnectionType::HostGssEnc => "hostgssenc",
            HbaConnectionType::HostNoGssEnc => "hostnogssenc",
        };
        f.pad(s)
    }
}

/// One `pg_hba.conf` authentication rule. Rule order is significant: the first match wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HbaRule {
    pub connection_type: HbaConnectionType,
    pub database: String,
    pub user: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub netmask: Option<String>,
    pub method: String,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub options: Vec<String>,
}

/// Rows returned by one SQL statement
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ResultSet {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Value of `column` in row `row`
    pub fn get(&self, row: usize, column: &str) -> Option<&str> {
        let index = self.columns.iter().position(|c| c == column)?;
        self.rows.get(row)?.get(index).map(String::as_str)
    }
}

/// `pg_ctlcluster` actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClusterAction {
    Start,
    Stop,
    Restart,
    Reload,
}

impl ClusterAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClusterAction::Start => "start",
            ClusterAction::Stop => "stop",
            ClusterAction::Restart => "restart",
            ClusterAction::Reload => "reload",
        }
    }
}

impl FromStr for ClusterAction {
    type Err = ClusterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "start" => Ok(ClusterAction::Start),
            "stop" => Ok(ClusterAction::Stop),
            "restart" => Ok(ClusterAction::Restart),
            "reload" => Ok(ClusterAction::Reload),
            _ => Err(ClusterError::validation_error(
                "action",
                format!("'{s}' is not one of start, stop, restart, reload"),
            )),
        }
    }
}

impl fmt::Display for ClusterAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Everything the lifecycle operations need to know about the cluster they act on.
///
/// Operations take the options by reference or value and hand back an updated copy; the port
/// assigned by `pg_createcluster`, for instance, comes back in the returned options.
#[derive(Clone, PartialEq, Eq)]
pub struct ProvisioningOptions {
    pub version: PgVersion,
    pub name: String,
    /// OS user owning the cluster; also the database superuser psql connects as
    pub owner: String,
    pub socket_dir: PathBuf,
    pub port: Option<u16>,
    pub locale: Option<String>,
    pub admin_password: Option<String>,
    pub extensions: Vec<String>,
}

impl ProvisioningOptions {
    pub fn new(version: PgVersion, name: impl Into<String>, owner: impl Into<String>, config: &ToolsConfig) -> Self {
        Self {
            version,
            name: name.into(),
            owner: owner.into(),
            socket_dir: config.socket_dir.clone(),
            port: None,
            locale: None,
            admin_password: None,
            extensions: config.extensions.clone(),
        }
    }

    #[inline]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    #[inline]
    pub fn with_socket_dir(mut self, socket_dir: impl Into<PathBuf>) -> Self {
        self.socket_dir = socket_dir.into();
        self
    }

    #[inline]
    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    #[inline]
    pub fn with_admin_password(mut self, password: impl Into<String>) -> Self {
        self.admin_password = Some(password.into());
        self
    }

    #[inline]
    pub fn with_extensions(mut self, extensions: Vec<String>) -> Self {
        self.extensions = extensions;
        self
    }

    /// The port to connect to, once known
    pub fn require_port(&self) -> ClusterResult<u16> {
        self.port.ok_or_else(|| {
            ClusterError::validation_error(
                "port",
                format!("port of cluster {} is not known yet", self.cluster_id()),
            )
        })
    }

    /// Rejects names that cannot safely appear on a command line or as SQL identifiers
    pub fn validate(&self) -> ClusterResult<()> {
        validate_identifier("name", &self.name)?;
        validate_identifier("owner", &self.owner)?;
        for extension in &self.extensions {
            validate_identifier("extensions", extension)?;
        }
        if let Some(locale) = &self.locale {
            if locale.is_empty() || locale.chars().any(|c| c.is_whitespace()) {
                return Err(ClusterError::validation_error("locale", format!("invalid locale '{locale}'")));
            }
        }
        if self.port == Some(0) {
            return Err(ClusterError::validation_error("port", "port must be between 1 and 65535"));
        }
        Ok(())
    }
}

impl ClusterIdentity for ProvisioningOptions {
    fn version(&self) -> PgVersion {
        self.version
    }

    fn cluster_name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for ProvisioningOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProvisioningOptions")
            .field("version", &self.version)
            .field("name", &self.name)
            .field("owner", &self.owner)
            .field("socket_dir", &self.socket_dir)
            .field("port", &self.port)
            .field("locale", &self.locale)
            .field("admin_password", &self.admin_password.as_ref().map(|_| "******"))
            .field("extensions", &self.extensions)
            .finish()
    }
}

/// Validates a cluster, role, database or extension name
pub fn validate_identifier(field: &str, value: &str) -> ClusterResult<()> {
    if value.len() > 63 {
        return Err(ClusterError::validation_error(
            field,
            format!("'{value}' exceeds maximum length of 63 characters"),
        ));
    }
    if !is_plain_identifier(value) {
        return Err(ClusterError::validation_error(
            field,
            format!("'{value}' must start with a letter, digit or '_' and contain only letters, digits, '_', '.' or '-'"),
        ));
    }
    Ok(())
}
