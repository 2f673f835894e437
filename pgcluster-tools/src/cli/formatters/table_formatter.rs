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

//! Table formatter
//!
//! A list of records becomes one row per record with the field names as header, a single
//! record becomes a `Key | Value` table.

use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
use tabled::builder::Builder;
use tabled::settings::Style;

use super::Formatter;

pub struct TableFormatter;

impl Formatter for TableFormatter {
    fn format<T: Serialize>(&self, data: &T) -> String {
        match serde_json::to_value(data) {
            Ok(Value::Array(items)) => records_table(&items),
            Ok(Value::Object(map)) => key_value_table(&map),
            Ok(other) => cell(&other),
            Err(e) => format!("error: failed to format as table: {e}"),
        }
    }
}

fn records_table(items: &[Value]) -> String {
    if items.is_empty() {
        return "(no rows)".to_string();
    }

    let mut columns: Vec<String> = Vec::new();
    for item in items {
        if let Value::Object(map) = item {
            for key in map.keys() {
                if !columns.contains(key) {
                    columns.push(key.clone());
                }
            }
        }
    }

    let mut builder = Builder::default();
    if columns.is_empty() {
        builder.push_record(["Value".to_string()]);
        for item in items {
            builder.push_record([cell(item)]);
        }
    } else {
        builder.push_record(columns.iter().map(|c| header(c)));
        for item in items {
            builder.push_record(columns.iter().map(|c| item.get(c).map(cell).unwrap_or_default()));
        }
    }
    render(builder)
}

fn key_value_table(map: &Map<String, Value>) -> String {
    let mut builder = Builder::default();
    builder.push_record(["Key".to_string(), "Value".to_string()]);
    for (key, value) in map {
        builder.push_record([header(key), cell(value)]);
    }
    render(builder)
}

fn render(builder: Builder) -> String {
    let mut table = builder.build();
    table.with(Style::extended());
    table.to_string()
}

/// `data_directory` -> `Data Directory`
fn header(key: &str) -> String {
    key.split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) if items.iter().all(|v| !v.is_object() && !v.is_array()) => {
            items.iter().map(cell).collect::<Vec<_>>().join(", ")
        }
        other => other.to_string(),
    }
}
