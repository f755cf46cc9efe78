// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Listing tables for `gj list` and `gj gpus`.
//!
//! Cells are typed: ids and counts right-align, job states choose their own
//! color, GPU and job sets render as `0,1` or `-`. Widths count characters,
//! so comments and GPU names may be non-ASCII.

use std::io::Write;

use gj_core::{JobId, JobStatus};

use crate::color;

/// One value in a listing row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell {
    Text(String),
    /// Secondary text, drawn muted.
    Note(String),
    Id(JobId),
    Count(u64),
    /// A job's state; unfinished `run_now` jobs are tagged `(now)`.
    Status { status: JobStatus, run_now: bool },
    Gpus(Vec<u32>),
    Jobs(Vec<JobId>),
}

impl Cell {
    fn text(&self) -> String {
        match self {
            Cell::Text(s) | Cell::Note(s) => s.clone(),
            Cell::Id(id) => id.to_string(),
            Cell::Count(n) => n.to_string(),
            Cell::Status { status, run_now } if *run_now && *status != JobStatus::Finished => {
                format!("{} (now)", status)
            }
            Cell::Status { status, .. } => status.to_string(),
            Cell::Gpus(ids) => comma_or_dash(ids),
            Cell::Jobs(ids) => comma_or_dash(ids),
        }
    }

    fn right_aligned(&self) -> bool {
        matches!(self, Cell::Id(_) | Cell::Count(_))
    }

    fn paint(&self, padded: String) -> String {
        match self {
            Cell::Note(_) => color::apply_muted(&padded),
            Cell::Status { status, .. } => color::apply_status(*status, &padded),
            _ => padded,
        }
    }
}

fn comma_or_dash<T: ToString>(items: &[T]) -> String {
    if items.is_empty() {
        return "-".to_string();
    }
    items
        .iter()
        .map(T::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

/// A named column, optionally capped in width.
pub struct Column {
    name: &'static str,
    max_width: Option<usize>,
}

impl Column {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            max_width: None,
        }
    }

    /// Cap the width; longer values are cut.
    pub fn with_max(mut self, max: usize) -> Self {
        self.max_width = Some(max);
        self
    }
}

pub struct Table {
    columns: Vec<Column>,
    rows: Vec<Vec<Cell>>,
}

const SEP: &str = "  ";

impl Table {
    pub fn new(columns: Vec<Column>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn row(&mut self, cells: Vec<Cell>) {
        self.rows.push(cells);
    }

    /// Render with color when stdout wants it.
    pub fn render(&self, out: &mut impl Write) {
        self.render_with(out, color::should_colorize());
    }

    /// Render header and rows. Column alignment follows the first row's
    /// cells, the last left-aligned column is not padded, and color goes on
    /// after padding so escapes never count toward widths.
    pub fn render_with(&self, out: &mut impl Write, colorize: bool) {
        let Some(first) = self.rows.first() else {
            return;
        };
        let last = self.columns.len().saturating_sub(1);
        let right: Vec<bool> = (0..self.columns.len())
            .map(|i| first.get(i).is_some_and(Cell::right_aligned))
            .collect();

        let texts: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .enumerate()
                    .map(|(i, col)| {
                        let raw = row.get(i).map(Cell::text).unwrap_or_default();
                        truncate(raw, col.max_width)
                    })
                    .collect()
            })
            .collect();

        let widths: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, col)| {
                texts
                    .iter()
                    .map(|row| row[i].chars().count())
                    .chain([col.name.chars().count()])
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let layout = |i: usize, text: &str| {
            if i == last && !right[i] {
                text.to_string()
            } else {
                pad(text, widths[i], right[i])
            }
        };

        let header: Vec<String> = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, col)| {
                let padded = layout(i, col.name);
                if colorize {
                    color::apply_header(&padded)
                } else {
                    padded
                }
            })
            .collect();
        let _ = writeln!(out, "{}", header.join(SEP));

        for (row, row_texts) in self.rows.iter().zip(&texts) {
            let cells: Vec<String> = row_texts
                .iter()
                .enumerate()
                .map(|(i, text)| {
                    let padded = layout(i, text);
                    match row.get(i) {
                        Some(cell) if colorize => cell.paint(padded),
                        _ => padded,
                    }
                })
                .collect();
            let _ = writeln!(out, "{}", cells.join(SEP));
        }
    }
}

fn pad(text: &str, width: usize, right: bool) -> String {
    if right {
        format!("{:>width$}", text)
    } else {
        format!("{:<width$}", text)
    }
}

fn truncate(s: String, max: Option<usize>) -> String {
    match max.and_then(|m| s.char_indices().nth(m)) {
        Some((cut, _)) => s[..cut].to_string(),
        None => s,
    }
}

#[cfg(test)]
#[path = "table_tests.rs"]
mod tests;
