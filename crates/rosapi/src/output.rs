use std::io::IsTerminal;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use rosapi_client::{ChannelEvent, CommandReply};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct ReplyOutput<'a> {
    schema_id: &'a str,
    channel: &'a str,
    command: &'a str,
    records: Vec<serde_json::Map<String, serde_json::Value>>,
}

pub fn print_reply(reply: &CommandReply, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = ReplyOutput {
                schema_id: "https://schemas.3leaps.dev/rosapi/cli/v1/command-reply.schema.json",
                channel: &reply.channel,
                command: &reply.command,
                records: reply.records.iter().map(|r| record_json(r)).collect(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let columns = column_order(&reply.records);
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(columns.clone());
            for record in &reply.records {
                table.add_row(
                    columns
                        .iter()
                        .map(|column| attr_value(record, column).unwrap_or_default()),
                );
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for record in &reply.records {
                println!("{}", pretty_record(record));
            }
        }
        OutputFormat::Raw => {
            for record in &reply.records {
                for (key, value) in record {
                    println!("={key}={value}");
                }
                println!();
            }
        }
    }
}

pub fn print_event_record(event: &ChannelEvent, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(&record_json(&event.event.attributes))
                    .unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table | OutputFormat::Pretty => {
            println!("{}", pretty_record(&event.event.attributes));
        }
        OutputFormat::Raw => {
            for (key, value) in &event.event.attributes {
                println!("={key}={value}");
            }
        }
    }
}

fn record_json(record: &[(String, String)]) -> serde_json::Map<String, serde_json::Value> {
    record
        .iter()
        .map(|(key, value)| (key.clone(), serde_json::Value::String(value.clone())))
        .collect()
}

fn pretty_record(record: &[(String, String)]) -> String {
    record
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Union of keys across records, first-seen order.
fn column_order(records: &[Vec<(String, String)>]) -> Vec<String> {
    let mut columns = Vec::new();
    for record in records {
        for (key, _) in record {
            if !columns.iter().any(|column| column == key) {
                columns.push(key.clone());
            }
        }
    }
    columns
}

fn attr_value(record: &[(String, String)], name: &str) -> Option<String> {
    record
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_order_is_first_seen() {
        let records = vec![
            vec![
                ("name".to_string(), "ether1".to_string()),
                ("mtu".to_string(), "1500".to_string()),
            ],
            vec![
                ("name".to_string(), "ether2".to_string()),
                ("comment".to_string(), "uplink".to_string()),
            ],
        ];
        assert_eq!(column_order(&records), vec!["name", "mtu", "comment"]);
    }

    #[test]
    fn pretty_record_joins_pairs() {
        let record = vec![
            ("name".to_string(), "ether1".to_string()),
            ("running".to_string(), "true".to_string()),
        ];
        assert_eq!(pretty_record(&record), "name=ether1 running=true");
    }
}
