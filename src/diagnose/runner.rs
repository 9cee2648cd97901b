//! Runs an ordered battery of analyzers over one source text.

use super::Diagnostic;

/// The analyzed text split into physical lines.
///
/// Lines are split on `\n` only, so numbering matches the exact input
/// including blank and comment lines.
pub struct Source<'a> {
    pub text: &'a str,
    pub lines: Vec<&'a str>,
    starts: Vec<usize>,
}

impl<'a> Source<'a> {
    pub fn new(text: &'a str) -> Self {
        let lines: Vec<&str> = text.split('\n').collect();
        let mut starts = Vec::with_capacity(lines.len());
        let mut offset = 0;
        for line in &lines {
            starts.push(offset);
            offset += line.len() + 1;
        }
        Self {
            text,
            lines,
            starts,
        }
    }

    /// `(line number, line)` pairs, numbered from 1.
    pub fn numbered(&self) -> impl Iterator<Item = (usize, &'a str)> + '_ {
        self.lines.iter().enumerate().map(|(i, line)| (i + 1, *line))
    }

    /// Byte offset where 1-based `line` starts.
    pub fn start_of(&self, line: usize) -> usize {
        line.checked_sub(1)
            .and_then(|i| self.starts.get(i))
            .copied()
            .unwrap_or(self.text.len())
    }

    /// 1-based line number containing byte `offset`.
    pub fn line_at(&self, offset: usize) -> usize {
        self.starts.partition_point(|&s| s <= offset).max(1)
    }

    /// Line by 1-based number.
    pub fn line(&self, line: usize) -> Option<&'a str> {
        line.checked_sub(1).and_then(|i| self.lines.get(i)).copied()
    }
}

/// A pure check over the full text and its lines.
pub type Analyzer = fn(&Source) -> Vec<Diagnostic>;

/// Named analyzers in the order they run.
pub type Battery = [(&'static str, Analyzer)];

/// Run every analyzer of `battery` in order and concatenate the results.
///
/// Diagnostics are never deduplicated: two analyzers may report the same
/// line under different categories.
pub fn run(source: &Source, battery: &Battery) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    for (name, analyzer) in battery {
        let found = analyzer(source);
        tracing::trace!(analyzer = name, count = found.len(), "analyzer finished");
        diagnostics.extend(found);
    }
    diagnostics
}
