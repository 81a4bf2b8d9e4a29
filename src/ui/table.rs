use crate::scope::ScopeNode;
use crate::session::ResolutionStats;
use crate::survey::IncludeCount;
use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
pub struct TableRow {
    #[tabled(rename = "Metric")]
    pub metric: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

pub struct TableBuilder {
    rows: Vec<TableRow>,
}

impl TableBuilder {
    pub fn new() -> Self {
        Self { rows: Vec::new() }
    }

    pub fn add_row(&mut self, label: &str, value: &str) {
        self.rows.push(TableRow {
            metric: label.to_string(),
            value: value.to_string(),
        });
    }

    pub fn build(&self) -> String {
        if self.rows.is_empty() {
            return String::new();
        }

        Table::new(&self.rows).with(Style::rounded()).to_string()
    }
}

impl Default for TableBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub fn stats_table(stats: &ResolutionStats) -> String {
    let mut builder = TableBuilder::new();
    builder.add_row("Directory/mode pairs", &stats.total.to_string());
    builder.add_row("Resolved", &stats.resolved.to_string());
    builder.add_row("No scope", &stats.without_scope.to_string());
    builder.add_row("Failed", &stats.failed.to_string());
    builder.add_row("Errors", &stats.errors.to_string());
    builder.add_row("Warnings", &stats.warnings.to_string());
    builder.build()
}

#[derive(Tabled)]
struct ScopeRow {
    #[tabled(rename = "Scope")]
    directory: String,
    #[tabled(rename = "Inherits")]
    inherits: String,
    #[tabled(rename = "Includes")]
    includes: usize,
    #[tabled(rename = "Declared in")]
    origin: String,
}

/// One row per declared scope, in tree order
pub fn scope_table<'a>(nodes: impl IntoIterator<Item = &'a ScopeNode>) -> String {
    let rows: Vec<ScopeRow> = nodes
        .into_iter()
        .map(|node| ScopeRow {
            directory: node.directory.to_string(),
            inherits: if node.inherits_parent { "yes" } else { "no" }.to_string(),
            includes: node.includes.len(),
            origin: node.origin.display().to_string(),
        })
        .collect();
    if rows.is_empty() {
        return String::new();
    }
    Table::new(&rows).with(Style::rounded()).to_string()
}

#[derive(Tabled)]
struct SurveyRow {
    #[tabled(rename = "Include")]
    include: String,
    #[tabled(rename = "Files")]
    files: usize,
    #[tabled(rename = "In PCH")]
    in_pch: String,
}

/// Include usage of one scope, most used first
pub fn survey_table<'a>(counts: impl IntoIterator<Item = &'a IncludeCount>) -> String {
    let rows: Vec<SurveyRow> = counts
        .into_iter()
        .map(|count| SurveyRow {
            include: count.include.clone(),
            files: count.count,
            in_pch: if count.in_pch { "yes" } else { "" }.to_string(),
        })
        .collect();
    if rows.is_empty() {
        return String::new();
    }
    Table::new(&rows).with(Style::rounded()).to_string()
}
