// Output formatting utilities

use chrono::{DateTime, Utc};
use std::io::IsTerminal;

use crate::lifecycle::{remaining, Notice, Tone};
use crate::models::{Task, TaskView};
use crate::utils::{format_countdown, format_elapsed};

const ANSI_BOLD: &str = "\x1b[1m";
const ANSI_RESET: &str = "\x1b[0m";
const ANSI_FG_RED: &str = "\x1b[31m";
const ANSI_FG_GREEN: &str = "\x1b[32m";
const ANSI_FG_YELLOW: &str = "\x1b[33m";

const MAX_TITLE_WIDTH: usize = 60;

/// Check if stdout is a terminal (TTY)
pub fn is_tty() -> bool {
    std::io::stdout().is_terminal()
}

fn bold_if_tty(text: &str, is_tty: bool) -> String {
    if is_tty {
        format!("{}{}{}", ANSI_BOLD, text, ANSI_RESET)
    } else {
        text.to_string()
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let mut cut: String = text.chars().take(max.saturating_sub(3)).collect();
        cut.push_str("...");
        cut
    }
}

/// Label of the time column for a view
fn time_column_label(view: TaskView) -> &'static str {
    match view {
        TaskView::Active => "Created",
        TaskView::Completed => "Completed",
        TaskView::Trash => "Expires",
    }
}

fn time_column_value(task: &Task, view: TaskView, now: DateTime<Utc>) -> String {
    match view {
        TaskView::Active => format_elapsed(task.created_at, now),
        TaskView::Completed => format_elapsed(task.completed_at.or(task.updated_at), now),
        TaskView::Trash => format_countdown(remaining(task, now)),
    }
}

/// Render a view's collection as a table
///
/// Columns are ID, Title and a view-specific time column: age in the active
/// view, completion age in the completed view and the retention countdown in
/// the trash.
pub fn format_task_table(tasks: &[Task], view: TaskView, now: DateTime<Utc>, is_tty: bool) -> String {
    if tasks.is_empty() {
        return match view {
            TaskView::Active => "No tasks found.".to_string(),
            TaskView::Completed => "No completed tasks.".to_string(),
            TaskView::Trash => "Trash is empty.".to_string(),
        };
    }

    let rows: Vec<[String; 3]> = tasks
        .iter()
        .map(|task| {
            [
                task.id.to_string(),
                truncate(task.display_title(), MAX_TITLE_WIDTH),
                time_column_value(task, view, now),
            ]
        })
        .collect();

    let labels = ["ID", "Title", time_column_label(view)];
    let mut widths = labels.map(|l| l.chars().count());
    for row in &rows {
        for (width, value) in widths.iter_mut().zip(row) {
            *width = (*width).max(value.chars().count());
        }
    }

    let mut output = String::new();
    let header = format!(
        "{:<w0$} {:<w1$} {}",
        labels[0],
        labels[1],
        labels[2],
        w0 = widths[0],
        w1 = widths[1]
    );
    output.push_str(&bold_if_tty(&header, is_tty));
    output.push('\n');
    let separator: Vec<String> = widths.iter().map(|w| "─".repeat(*w)).collect();
    output.push_str(&separator.join(" "));
    output.push('\n');

    for row in &rows {
        output.push_str(&format!(
            "{:<w0$} {:<w1$} {}\n",
            row[0],
            row[1],
            row[2],
            w0 = widths[0],
            w1 = widths[1]
        ));
    }
    output
}

/// One-line rendering of a notice, colored by tone on a terminal
pub fn format_notice(notice: &Notice, is_tty: bool) -> String {
    if !is_tty {
        return notice.text.clone();
    }
    let color = match notice.tone {
        Tone::Success => ANSI_FG_GREEN,
        Tone::Failure => ANSI_FG_RED,
        Tone::Warning => ANSI_FG_YELLOW,
    };
    format!("{}{}{}", color, notice.text, ANSI_RESET)
}

/// Tasks as a JSON array, in the canonical field names
pub fn format_task_json(tasks: &[Task]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(tasks)
}
