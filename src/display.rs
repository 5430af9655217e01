use crate::filter::{DynValue, Filter, Type, identifiers};
use chrono::SecondsFormat;
use colored::Colorize;
use comfy_table::{Cell, Table, presets::UTF8_FULL_CONDENSED};
use serde::Serialize;
use std::fmt::Write;

/// Result of evaluating a filter on one recorded message
#[derive(Debug, Clone, Serialize)]
pub struct EvalRecord {
    pub line: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    pub channel: String,
    pub author: String,
    pub content: String,
    pub result: DynValue,
}

impl EvalRecord {
    pub fn is_match(&self) -> bool {
        self.result.to_bool().unwrap_or(false)
    }
}

pub fn format_timestamp(ts: &chrono::DateTime<chrono::Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn format_check_report(filter: &Filter, debug: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} {}", "valid".green().bold(), "filter".bold());
    let _ = writeln!(out, "  type:   {}", filter.return_type().to_string().cyan());
    let _ = writeln!(out, "  source: {}", filter.filter_string());
    if debug {
        let _ = writeln!(out, "  debug:  {}", filter.debug_string());
    }
    out
}

pub fn format_filter_error(message: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} {}", "invalid".red().bold(), "filter".bold());
    for line in message.lines() {
        let _ = writeln!(out, "  {line}");
    }
    out
}

/// Text listing of evaluation results.
///
/// Bool filters list the matching messages (or every message when `all` is
/// set); other filters always list every message with its value.
pub fn format_eval_text(records: &[EvalRecord], return_type: Type, all: bool) -> String {
    let boolean = return_type == Type::Bool;
    let shown: Vec<&EvalRecord> = records
        .iter()
        .filter(|r| all || !boolean || r.is_match())
        .collect();

    let mut out = String::new();
    if boolean {
        let matched = records.iter().filter(|r| r.is_match()).count();
        let _ = writeln!(
            out,
            "FILTER matched {} of {} message{}",
            matched,
            records.len(),
            if records.len() == 1 { "" } else { "s" }
        );
    } else {
        let _ = writeln!(
            out,
            "FILTER evaluated {} message{} ({})",
            records.len(),
            if records.len() == 1 { "" } else { "s" },
            return_type
        );
    }

    for record in shown {
        let marker = if boolean && record.is_match() { '>' } else { ' ' };
        let ts = record.timestamp.as_deref().unwrap_or("-");
        let content = record.content.replace('\n', "\\n");
        let _ = write!(
            out,
            "{marker}{:>6}: {} #{} {}: {}",
            record.line,
            ts,
            record.channel,
            record.author.bold(),
            content
        );
        if all || !boolean {
            let _ = write!(out, " => {}", record.result.to_string().yellow());
        }
        out.push('\n');
    }

    out
}

pub fn format_eval_json(records: &[EvalRecord]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(records)
}

pub fn identifiers_table() -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(vec![
        Cell::new("Identifier"),
        Cell::new("Label"),
        Cell::new("Type"),
    ]);
    for (name, ident) in identifiers::identifiers() {
        table.add_row(vec![
            Cell::new(name),
            Cell::new(ident.label),
            Cell::new(ident.ty),
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(line: usize, result: DynValue) -> EvalRecord {
        EvalRecord {
            line,
            timestamp: None,
            channel: "forsen".to_string(),
            author: "icelys".to_string(),
            content: "hello\nthere".to_string(),
            result,
        }
    }

    #[test]
    fn test_bool_results_list_only_matches() {
        colored::control::set_override(false);
        let records = vec![record(1, true.into()), record(2, false.into())];
        let out = format_eval_text(&records, Type::Bool, false);

        assert!(out.starts_with("FILTER matched 1 of 2 messages"));
        assert!(out.contains(">     1: - #forsen icelys: hello\\nthere"));
        assert!(!out.contains("     2:"));
    }

    #[test]
    fn test_non_bool_results_list_values() {
        colored::control::set_override(false);
        let records = vec![record(1, DynValue::Int(42))];
        let out = format_eval_text(&records, Type::Int, false);

        assert!(out.starts_with("FILTER evaluated 1 message (Int)"));
        assert!(out.contains("=> 42"));
    }

    #[test]
    fn test_identifiers_table_lists_catalogue() {
        let rendered = identifiers_table().to_string();
        assert!(rendered.contains("author.badges"));
        assert!(rendered.contains("StringList"));
        assert!(rendered.contains("reward.cost"));
    }
}
