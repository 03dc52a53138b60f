//! Converts the structured template text into [`TaskRecord`]s.
//!
//! Every field has its own extraction rule and default. Only a block without a
//! recognisable title is discarded; nothing here returns an error.

use tracing::debug;

use crate::contract::{
    BLOCK_MARKER, CRITERIA_BULLET, CRITERIA_HEADING, CRITERIA_MARKERS, DESCRIPTION_MARKERS,
    PRIORITY_MARKERS, PROJECT_MARKERS, RENDERED_BULLET, RULE_LINE, TAGS_MARKERS,
    TITLE_SEPARATORS,
};
use crate::model::task::{Priority, TaskRecord, DEFAULT_PROJECT, MAX_TITLE_CHARS};

/// A subtask block: the remainder of the marker line plus the lines after it.
struct Block<'a> {
    header: &'a str,
    lines: Vec<&'a str>,
}

/// Parse structured text into task records, in source order.
pub fn parse(text: &str) -> Vec<TaskRecord> {
    split_blocks(text)
        .iter()
        .enumerate()
        .filter_map(|(i, block)| {
            let record = parse_block(block);
            if record.is_none() {
                debug!(block = i + 1, header = block.header, "dropping block without title");
            }
            record
        })
        .collect()
}

/// Text before the first block marker is the parent preamble and is discarded.
fn split_blocks(text: &str) -> Vec<Block<'_>> {
    let mut blocks: Vec<Block<'_>> = Vec::new();
    for line in text.lines() {
        if let Some(header) = line.trim_start().strip_prefix(BLOCK_MARKER) {
            blocks.push(Block {
                header,
                lines: Vec::new(),
            });
        } else if let Some(current) = blocks.last_mut() {
            current.lines.push(line);
        }
    }
    blocks
}

fn parse_block(block: &Block<'_>) -> Option<TaskRecord> {
    let title = extract_title(block.header)?;
    let lines = &block.lines;

    let description = extract_description(lines);
    let criteria = extract_criteria(lines);

    Some(TaskRecord {
        title: truncate_title(&title),
        description: render_description(&description, &criteria),
        priority: extract_priority(lines),
        tags: extract_tags(lines),
        project: extract_project(lines).unwrap_or_else(|| DEFAULT_PROJECT.to_string()),
    })
}

/// Title follows the last en-dash. Other dashes only count when the header
/// has no en-dash, and then the first of them wins.
fn extract_title(header: &str) -> Option<String> {
    let (primary, fallbacks) = TITLE_SEPARATORS.split_first()?;
    let (pos, sep) = match header.rfind(primary) {
        Some(pos) => (pos, *primary),
        None => fallbacks
            .iter()
            .filter_map(|sep| header.find(sep).map(|pos| (pos, *sep)))
            .min_by_key(|(pos, _)| *pos)?,
    };
    let title = header[pos + sep.len()..].trim();
    if title.is_empty() {
        None
    } else {
        Some(title.to_string())
    }
}

fn truncate_title(title: &str) -> String {
    title.chars().take(MAX_TITLE_CHARS).collect()
}

/// Value after any of `markers` when the line opens with one of them.
fn field_value<'a>(line: &'a str, markers: &[&str]) -> Option<&'a str> {
    let line = line.trim_start();
    markers
        .iter()
        .find_map(|m| line.strip_prefix(m))
        .map(str::trim)
}

fn is_field_line(line: &str) -> bool {
    [
        PROJECT_MARKERS,
        DESCRIPTION_MARKERS,
        CRITERIA_MARKERS,
        PRIORITY_MARKERS,
        TAGS_MARKERS,
    ]
    .iter()
    .any(|markers| field_value(line, markers).is_some())
}

fn find_field(lines: &[&str], markers: &[&str]) -> Option<usize> {
    lines.iter().position(|l| field_value(l, markers).is_some())
}

fn extract_project(lines: &[&str]) -> Option<String> {
    lines
        .iter()
        .find_map(|l| field_value(l, PROJECT_MARKERS))
        .filter(|v| !v.is_empty())
        .map(String::from)
}

/// Everything between the description marker and the criteria marker. Without
/// a later criteria marker the section ends at the next field or `---` rule.
fn extract_description(lines: &[&str]) -> String {
    let Some(start) = find_field(lines, DESCRIPTION_MARKERS) else {
        return String::new();
    };
    let inline = field_value(lines[start], DESCRIPTION_MARKERS).unwrap_or_default();
    let rest = &lines[start + 1..];

    let end = match find_field(rest, CRITERIA_MARKERS) {
        Some(end) => end,
        None => rest
            .iter()
            .position(|l| is_field_line(l) || l.trim() == RULE_LINE)
            .unwrap_or(rest.len()),
    };

    let mut body: Vec<&str> = Vec::new();
    if !inline.is_empty() {
        body.push(inline);
    }
    body.extend(rest[..end].iter().map(|l| l.trim_end()));
    body.join("\n").trim().to_string()
}

/// Consecutive `- ` bullet lines right after the criteria marker.
fn extract_criteria(lines: &[&str]) -> Vec<String> {
    let Some(start) = find_field(lines, CRITERIA_MARKERS) else {
        return Vec::new();
    };
    lines[start + 1..]
        .iter()
        .skip_while(|l| l.trim().is_empty())
        .map_while(|l| l.trim_start().strip_prefix(CRITERIA_BULLET))
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(String::from)
        .collect()
}

fn render_description(description: &str, criteria: &[String]) -> String {
    if criteria.is_empty() {
        return description.to_string();
    }
    let bullets = criteria
        .iter()
        .map(|c| format!("{RENDERED_BULLET}{c}"))
        .collect::<Vec<_>>()
        .join("\n");
    format!("{description}\n\n{CRITERIA_HEADING}\n{bullets}")
}

fn extract_priority(lines: &[&str]) -> Priority {
    let Some(value) = lines.iter().find_map(|l| field_value(l, PRIORITY_MARKERS)) else {
        return Priority::default();
    };
    let token = value
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .trim_matches(|c: char| !c.is_alphabetic());
    Priority::from_token(token).unwrap_or_else(|| {
        debug!(value, "unrecognised priority, using default");
        Priority::default()
    })
}

fn extract_tags(lines: &[&str]) -> Vec<String> {
    lines
        .iter()
        .find_map(|l| field_value(l, TAGS_MARKERS))
        .filter(|value| !value.is_empty())
        .map(|value| value.split(',').map(|t| t.trim().to_string()).collect())
        .unwrap_or_default()
}
