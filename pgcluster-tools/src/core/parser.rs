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

//! Parsers for the text printed by the cluster administration tools.
//!
//! Each output format is an unversioned text contract owned by postgresql-common, so every
//! format gets its own parser behind [`OutputFormat`]. Callers pick a parser by name through
//! [`parse`], or call the typed functions directly.
//!
//! Multi-record formats report malformed rows according to a [`ParsePolicy`]: with
//! [`ParsePolicy::Skip`] the row lands in [`ParsedRows::rejected`] and parsing goes on, with
//! [`ParsePolicy::FailFast`] the first [`ClusterError::RowParseError`] is returned.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use pgcluster_common::tools_config::ParsePolicy;
use serde::Serialize;
use tracing::warn;

use crate::core::types::ClusterCreationResult;
use crate::core::types::ClusterDescriptor;
use crate::core::types::ClusterStatus;
use crate::core::types::HbaConnectionType;
use crate::core::types::HbaRule;
use crate::core::types::PgVersion;
use crate::core::types::ResultSet;
use crate::core::ClusterError;
use crate::core::ClusterResult;

/// Field separator passed to `psql --field-separator`
pub const PSQL_FIELD_SEPARATOR: char = '\u{1f}';

/// Record separator selected by `psql --record-separator-zero`
pub const PSQL_RECORD_SEPARATOR: char = '\0';

const HBA_METHODS: &[&str] = &[
    "trust",
    "reject",
    "scram-sha-256",
    "md5",
    "password",
    "gss",
    "sspi",
    "ident",
    "peer",
    "pam",
    "ldap",
    "radius",
    "cert",
    "bsd",
    "crypt",
    "krb5",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    CreateCluster,
    Hba,
    LsClusters,
    Psql,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 4] = [
        OutputFormat::CreateCluster,
        OutputFormat::Hba,
        OutputFormat::LsClusters,
        OutputFormat::Psql,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            OutputFormat::CreateCluster => "pg_createcluster",
            OutputFormat::Hba => "pg_hba",
            OutputFormat::LsClusters => "pg_lsclusters",
            OutputFormat::Psql => "psql",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = ClusterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OutputFormat::ALL
            .into_iter()
            .find(|format| format.name() == s)
            .ok_or_else(|| ClusterError::unsupported_format(s))
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

/// Records of a multi-record format plus the rows that were skipped
#[derive(Debug, Default)]
pub struct ParsedRows<T> {
    pub records: Vec<T>,
    pub rejected: Vec<ClusterError>,
}

impl<T> ParsedRows<T> {
    #[inline]
    pub fn into_records(self) -> Vec<T> {
        self.records
    }
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ParsedOutput {
    CreateCluster(ClusterCreationResult),
    Hba(Vec<HbaRule>),
    Clusters(Vec<ClusterDescriptor>),
    ResultSet(ResultSet),
}

/// Parses `raw` with the parser registered under `format_name`, skipping malformed rows
pub fn parse(raw: &str, format_name: &str) -> ClusterResult<ParsedOutput> {
    parse_with_policy(raw, format_name, ParsePolicy::Skip)
}

pub fn parse_with_policy(raw: &str, format_name: &str, policy: ParsePolicy) -> ClusterResult<ParsedOutput> {
    let parsed = match format_name.parse::<OutputFormat>()? {
        OutputFormat::CreateCluster => ParsedOutput::CreateCluster(parse_createcluster(raw)?),
        OutputFormat::Hba => ParsedOutput::Hba(parse_hba(raw, policy)?.into_records()),
        OutputFormat::LsClusters => ParsedOutput::Clusters(parse_lsclusters(raw, policy)?.into_records()),
        OutputFormat::Psql => ParsedOutput::ResultSet(parse_psql(raw)?),
    };
    Ok(parsed)
}

/// Parses the `config`/`data`/`locale`/`port` block printed by `pg_createcluster`.
///
/// ```text
/// Creating new cluster 9.3/faketest ...
///   config /etc/postgresql/9.3/faketest
///   data   /var/lib/postgresql/9.3/faketest
///   locale en_US.UTF-8
///   port   5442
/// ```
pub fn parse_createcluster(raw: &str) -> ClusterResult<ClusterCreationResult> {
    const FORMAT: &str = "pg_createcluster";

    let mut config = None;
    let mut data = None;
    let mut locale = None;
    let mut port = None;

    for line in raw.lines() {
        let line = line.trim();
        let (label, value) = match line.split_once(char::is_whitespace) {
            Some((label, value)) => (label, value.trim()),
            None => (line, ""),
        };
        let slot = match label {
            "config" => &mut config,
            "data" => &mut data,
            "locale" => &mut locale,
            "port" => &mut port,
            _ => continue,
        };
        // first occurrence wins
        if slot.is_none() {
            *slot = Some(value);
        }
    }

    let require = |field: &'static str, value: Option<&str>| -> ClusterResult<String> {
        match value {
            Some(v) if !v.is_empty() => Ok(v.to_string()),
            Some(_) => Err(ClusterError::parse_error(FORMAT, field, "has no value")),
            None => Err(ClusterError::parse_error(FORMAT, field, "is missing")),
        }
    };

    let config_directory = require("config", config)?;
    let data_directory = require("data", data)?;
    let locale = require("locale", locale)?;
    let port = require("port", port)?;
    let port = port
        .parse::<u16>()
        .map_err(|_| ClusterError::parse_error(FORMAT, "port", format!("'{port}' is not a port number")))?;

    Ok(ClusterCreationResult {
        config_directory: PathBuf::from(config_directory),
        data_directory: PathBuf::from(data_directory),
        locale,
        port,
    })
}

/// Parses `pg_hba.conf` rules, preserving their order
pub fn parse_hba(raw: &str, policy: ParsePolicy) -> ClusterResult<ParsedRows<HbaRule>> {
    collect_rows("pg_hba", raw, policy, |line| {
        let content = line.split('#').next().unwrap_or_default();
        let fields: Vec<&str> = content.split_whitespace().collect();
        if fields.is_empty() {
            return Ok(None);
        }
        parse_hba_fields(&fields).map(Some)
    })
}

fn parse_hba_fields(fields: &[&str]) -> Result<HbaRule, String> {
    let connection_type = fields[0].parse::<HbaConnectionType>()?;

    // `host ... 127.0.0.1 255.255.255.255 md5` spells the mask as its own column
    let has_netmask = connection_type.has_address()
        && fields.len() >= 6
        && !HBA_METHODS.contains(&fields[4])
        && fields[4].parse::<std::net::IpAddr>().is_ok();

    let method_index = match (connection_type.has_address(), has_netmask) {
        (false, _) => 3,
        (true, false) => 4,
        (true, true) => 5,
    };
    if fields.len() <= method_index {
        return Err(format!(
            "{connection_type} rules need {} fields, got {}",
            method_index + 1,
            fields.len()
        ));
    }

    let method = fields[method_index];
    if !HBA_METHODS.contains(&method) {
        return Err(format!("unknown authentication method '{method}'"));
    }

    let options = &fields[method_index + 1..];
    if let Some(extra) = options.iter().find(|option| !option.contains('=')) {
        return Err(format!(
            "{connection_type} rules need {} fields, got {} (unexpected '{extra}')",
            method_index + 1,
            fields.len()
        ));
    }

    Ok(HbaRule {
        connection_type,
        database: fields[1].to_string(),
        user: fields[2].to_string(),
        address: connection_type.has_address().then(|| fields[3].to_string()),
        netmask: has_netmask.then(|| fields[4].to_string()),
        method: method.to_string(),
        options: options.iter().map(|o| o.to_string()).collect(),
    })
}

/// Parses `pg_lsclusters` output. The `Ver Cluster Port ...` header is discarded.
pub fn parse_lsclusters(raw: &str, policy: ParsePolicy) -> ClusterResult<ParsedRows<ClusterDescriptor>> {
    collect_rows("pg_lsclusters", raw, policy, |line| {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.is_empty() || fields[0] == "Ver" {
            return Ok(None);
        }
        if fields.len() != 7 {
            return Err(format!("expected 7 fields, got {}", fields.len()));
        }

        let version = fields[0]
            .parse::<PgVersion>()
            .map_err(|_| format!("version '{}' is not numeric", fields[0]))?;
        let port = fields[2]
            .parse::<u16>()
            .map_err(|_| format!("port '{}' is not numeric", fields[2]))?;
        let status = fields[3].parse::<ClusterStatus>()?;

        Ok(Some(ClusterDescriptor {
            version,
            name: fields[1].to_string(),
            port,
            status,
            owner: fields[4].to_string(),
            data_directory: PathBuf::from(fields[5]),
            log_file: PathBuf::from(fields[6]),
            config_directory: None,
            locale: None,
        }))
    })
}

/// Parses unaligned `psql` output: a header record, then one record per row, fields separated
/// by [`PSQL_FIELD_SEPARATOR`] and records terminated by [`PSQL_RECORD_SEPARATOR`]. Values may
/// contain newlines. Output without any NUL byte is read one record per line. Statements that
/// return nothing print nothing.
pub fn parse_psql(raw: &str) -> ClusterResult<ResultSet> {
    let records: Vec<&str> = if raw.contains(PSQL_RECORD_SEPARATOR) {
        let body = raw.trim_end_matches('\n');
        let body = body.strip_suffix(PSQL_RECORD_SEPARATOR).unwrap_or(body);
        body.split(PSQL_RECORD_SEPARATOR).collect()
    } else {
        raw.lines().filter(|line| !line.is_empty()).collect()
    };
    let mut records = records.into_iter();
    let Some(header) = records.next().filter(|header| !header.is_empty()) else {
        return Ok(ResultSet::default());
    };
    let columns: Vec<String> = header.split(PSQL_FIELD_SEPARATOR).map(str::to_string).collect();

    let rows = records
        .enumerate()
        .map(|(index, record)| {
            let row: Vec<String> = record.split(PSQL_FIELD_SEPARATOR).map(str::to_string).collect();
            if row.len() != columns.len() {
                return Err(ClusterError::row_parse_error(
                    "psql",
                    index + 2,
                    record,
                    format!("expected {} fields, got {}", columns.len(), row.len()),
                ));
            }
            Ok(row)
        })
        .collect::<ClusterResult<Vec<_>>>()?;

    Ok(ResultSet { columns, rows })
}

/// Runs `parse_row` over every line. `Ok(None)` skips the line silently (blank, comment,
/// header), `Err(reason)` is a malformed row handled according to `policy`.
fn collect_rows<T>(
    format: &'static str,
    raw: &str,
    policy: ParsePolicy,
    mut parse_row: impl FnMut(&str) -> Result<Option<T>, String>,
) -> ClusterResult<ParsedRows<T>> {
    let mut parsed = ParsedRows {
        records: Vec::new(),
        rejected: Vec::new(),
    };

    for (index, line) in raw.lines().enumerate() {
        match parse_row(line) {
            Ok(Some(record)) => parsed.records.push(record),
            Ok(None) => {}
            Err(reason) => {
                let error = ClusterError::row_parse_error(format, index + 1, line.trim(), reason);
                if policy == ParsePolicy::FailFast {
                    return Err(error);
                }
                warn!("skipping malformed row: {}", error);
                parsed.rejected.push(error);
            }
        }
    }

    Ok(parsed)
}
