//! Output formatting for codenarrator results.
//!
//! Supports two output formats:
//! - Pretty: colored terminal output for human readability
//! - JSON: structured output for programmatic consumption

use colored::*;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::diagnose::{Category, Diagnostic};
use crate::language::Language;
use crate::model::Extraction;

// =============================================================================
// Report model
// =============================================================================

/// Declaration counts of one documented file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EntityCounts {
    pub classes: usize,
    pub interfaces: usize,
    pub enums: usize,
    pub methods: usize,
    pub functions: usize,
    pub globals: usize,
    pub imports: usize,
}

impl EntityCounts {
    pub fn of(extraction: &Extraction) -> Self {
        let Some(module) = extraction.module() else {
            return Self::default();
        };
        Self {
            classes: module.classes().count(),
            interfaces: module.interfaces().count(),
            enums: module.enums().count(),
            methods: module
                .types
                .iter()
                .map(|t| t.methods.len() + t.constructors.len())
                .sum(),
            functions: module.functions.len(),
            globals: module.globals.len(),
            imports: module.imports.len(),
        }
    }

    fn add(&mut self, other: &EntityCounts) {
        self.classes += other.classes;
        self.interfaces += other.interfaces;
        self.enums += other.enums;
        self.methods += other.methods;
        self.functions += other.functions;
        self.globals += other.globals;
        self.imports += other.imports;
    }

    fn rows(&self) -> [(&'static str, usize); 7] {
        [
            ("classes", self.classes),
            ("interfaces", self.interfaces),
            ("enums", self.enums),
            ("methods", self.methods),
            ("functions", self.functions),
            ("globals", self.globals),
            ("imports", self.imports),
        ]
    }
}

/// One documented file.
#[derive(Debug, Clone, Serialize)]
pub struct DocsEntry {
    pub file: String,
    pub language: Language,
    pub syntax_error: bool,
    /// Where the document was written, when an output directory was given.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    pub markdown: String,
    pub counts: EntityCounts,
}

/// One analyzed file.
#[derive(Debug, Clone, Serialize)]
pub struct SuggestEntry {
    pub file: String,
    pub language: Language,
    pub diagnostics: Vec<Diagnostic>,
}

/// Per-category diagnostic count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BreakdownEntry {
    pub category: Category,
    pub emoji: &'static str,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct DocsReport<'a> {
    pub version: String,
    pub path: String,
    pub files_processed: usize,
    pub documents: &'a [DocsEntry],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub totals: Option<EntityCounts>,
}

#[derive(Debug, Serialize)]
pub struct SuggestReport<'a> {
    pub version: String,
    pub path: String,
    pub files_analyzed: usize,
    pub total: usize,
    pub files: &'a [SuggestEntry],
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub breakdown: Vec<BreakdownEntry>,
}

/// Count diagnostics per category, most frequent first. Ties keep the
/// category declaration order.
pub fn breakdown(entries: &[SuggestEntry]) -> Vec<BreakdownEntry> {
    let mut counts: BTreeMap<usize, usize> = BTreeMap::new();
    for d in entries.iter().flat_map(|e| &e.diagnostics) {
        if let Some(index) = Category::ALL.iter().position(|c| *c == d.category) {
            *counts.entry(index).or_insert(0) += 1;
        }
    }
    let mut rows: Vec<BreakdownEntry> = counts
        .into_iter()
        .map(|(index, count)| BreakdownEntry {
            category: Category::ALL[index],
            emoji: Category::ALL[index].emoji(),
            count,
        })
        .collect();
    rows.sort_by(|a, b| b.count.cmp(&a.count));
    rows
}

/// Sum of the counts of every entry.
pub fn totals(entries: &[DocsEntry]) -> EntityCounts {
    let mut total = EntityCounts::default();
    for entry in entries {
        total.add(&entry.counts);
    }
    total
}

pub fn docs_report<'a>(path: &str, entries: &'a [DocsEntry], stats: bool) -> DocsReport<'a> {
    DocsReport {
        version: env!("CARGO_PKG_VERSION").to_string(),
        path: path.to_string(),
        files_processed: entries.len(),
        documents: entries,
        totals: stats.then(|| totals(entries)),
    }
}

pub fn suggest_report<'a>(path: &str, entries: &'a [SuggestEntry], stats: bool) -> SuggestReport<'a> {
    SuggestReport {
        version: env!("CARGO_PKG_VERSION").to_string(),
        path: path.to_string(),
        files_analyzed: entries.len(),
        total: entries.iter().map(|e| e.diagnostics.len()).sum(),
        files: entries,
        breakdown: if stats { breakdown(entries) } else { Vec::new() },
    }
}

// =============================================================================
// JSON Format
// =============================================================================

/// Write any report as pretty-printed JSON on stdout.
pub fn write_json<T: Serialize>(report: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    println!("{}", json);
    Ok(())
}

// =============================================================================
// Pretty Format
// =============================================================================

fn write_header(verb: &str, path: &str) {
    println!();
    print!("  ");
    print!("{}", "codenarrator".cyan().bold());
    println!(" v{}", env!("CARGO_PKG_VERSION"));
    println!();
    print!("  {}", format!("{}: ", verb).dimmed());
    println!("{}", path);
    println!();
}

/// Write documentation results in pretty format.
///
/// Documents that were not written to disk are printed in full.
pub fn write_docs_pretty(report: &DocsReport<'_>) {
    write_header("Documenting", &report.path);

    for entry in report.documents {
        let tag = if entry.syntax_error {
            "SYNTAX".yellow()
        } else {
            "OK    ".green()
        };
        print!("    {} ", tag);
        print!("{}", entry.file.blue());
        print!("{}", format!(" ({})", entry.language).dimmed());
        if let Some(ref output) = entry.output {
            print!("  -> {}", output);
        }
        println!();
    }
    println!();

    for entry in report.documents.iter().filter(|e| e.output.is_none()) {
        if report.documents.len() > 1 {
            println!("{}", format!("---- {} ----", entry.file).dimmed());
        }
        println!("{}", entry.markdown);
    }

    if let Some(ref totals) = report.totals {
        write_counts(totals);
        println!();
    }

    let errors = report.documents.iter().filter(|e| e.syntax_error).count();
    print!("  {}", format!("Files: {}", report.files_processed).dimmed());
    if errors > 0 {
        print!("  {}", format!("{} with syntax errors", errors).yellow());
    }
    println!();
    println!();
}

fn write_counts(counts: &EntityCounts) {
    println!("  {}", "Entities:".bold());
    for (name, count) in counts.rows() {
        if count > 0 {
            println!("    {:<12} {:>5}", name, count);
        }
    }
}

/// Write suggestion results in pretty format.
pub fn write_suggest_pretty(report: &SuggestReport<'_>) {
    write_header("Analyzing", &report.path);

    for entry in report.files {
        write_file_suggestions(entry);
    }

    if !report.breakdown.is_empty() {
        write_breakdown(&report.breakdown);
        println!();
    }

    write_final_status(report.total, report.files_analyzed);
    println!();
}

fn write_file_suggestions(entry: &SuggestEntry) {
    print!("  {}", entry.file.blue());
    print!("{}", format!(" ({})", entry.language).dimmed());
    let count = entry.diagnostics.len();
    if count == 0 {
        println!("  {}", "clean".green());
        println!();
        return;
    }
    println!("  {}", plural(count, "suggestion").yellow());
    for d in &entry.diagnostics {
        let line = match d.line {
            Some(n) => format!("{:>5}", n),
            None => format!("{:>5}", "?"),
        };
        println!("    {} {} {}", line.dimmed(), d.emoji(), d.message);
    }
    println!();
}

fn write_breakdown(rows: &[BreakdownEntry]) {
    println!("  {}", "Breakdown:".bold());
    for row in rows {
        println!("    {} {:<14} {:>4}", row.emoji, row.category.as_str(), row.count);
    }
}

fn write_final_status(total: usize, files: usize) {
    print!("  {}", format!("Files: {}", files).dimmed());
    print!("  ");
    if total == 0 {
        print!("{}", "✓ No suggestions".green());
    } else {
        print!("{}", format!("✗ {}", plural(total, "suggestion")).yellow());
    }
    println!();
}

fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{} {}", count, noun)
    } else {
        format!("{} {}s", count, noun)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(diagnostics: Vec<Diagnostic>) -> SuggestEntry {
        SuggestEntry {
            file: "a.py".to_string(),
            language: Language::Python,
            diagnostics,
        }
    }

    #[test]
    fn test_breakdown_orders_by_count() {
        let entries = vec![
            entry(vec![
                Diagnostic::new(Category::Style, 1, "a"),
                Diagnostic::new(Category::Refactor, 2, "b"),
            ]),
            entry(vec![Diagnostic::new(Category::Style, 3, "c")]),
        ];
        let rows = breakdown(&entries);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].category, Category::Style);
        assert_eq!(rows[0].count, 2);
        assert_eq!(rows[1].category, Category::Refactor);
    }

    #[test]
    fn test_suggest_report_json_shape() {
        let entries = vec![entry(vec![Diagnostic::new(Category::Forbidden, 5, "no prints")])];
        let report = suggest_report("src", &entries, false);
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["files_analyzed"], 1);
        assert_eq!(json["total"], 1);
        assert!(json.get("breakdown").is_none());
        let d = &json["files"][0]["diagnostics"][0];
        assert_eq!(d["line"], 5);
        assert_eq!(d["text"], "🚫 Line 5: no prints");
        assert_eq!(json["files"][0]["language"], "Python");
    }

    #[test]
    fn test_entity_counts() {
        let extraction = crate::extract(
            Language::Java,
            "import java.util.List;\npublic class A {\n  public A() {}\n  void f() {}\n}\ninterface B {}\n",
        )
        .unwrap();
        let counts = EntityCounts::of(&extraction);
        assert_eq!(counts.classes, 1);
        assert_eq!(counts.interfaces, 1);
        assert_eq!(counts.methods, 2);
        assert_eq!(counts.imports, 1);
    }

    #[test]
    fn test_docs_report_totals_only_with_stats() {
        let entries = vec![DocsEntry {
            file: "a.py".to_string(),
            language: Language::Python,
            syntax_error: false,
            output: None,
            markdown: "# a".to_string(),
            counts: EntityCounts {
                functions: 2,
                ..Default::default()
            },
        }];
        assert!(docs_report(".", &entries, false).totals.is_none());
        assert_eq!(docs_report(".", &entries, true).totals.unwrap().functions, 2);
    }

    #[test]
    fn test_plural() {
        assert_eq!(plural(1, "suggestion"), "1 suggestion");
        assert_eq!(plural(3, "suggestion"), "3 suggestions");
    }
}
