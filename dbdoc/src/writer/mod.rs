// Rendering of a layout back to documentation text. Text and Markdown share
// one traversal and differ only by the escape function; DBML is a separate,
// write-only export.

mod dbml;
mod wordwrap;

pub use dbml::render_dbml;
pub use wordwrap::WordWrap;

use crate::error::Result;
use crate::layout::Layout;
use std::io::Write;

type EscapeFn = fn(&str) -> String;

fn identity_escape(text: &str) -> String {
    text.to_string()
}

/// Prefix a backslash before every markdown-significant character so names
/// and comments survive a markdown renderer untouched.
pub fn markdown_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + text.len() / 8);
    for c in text.chars() {
        if matches!(
            c,
            '\\' | '`' | '{' | '}' | '[' | ']' | '<' | '>' | '(' | ')' | '#' | '*' | '+' | '-'
                | '_' | '!' | '|'
        ) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Collapse every `\` + character to just the character. Exactly inverts
/// [`markdown_escape`]; the parser runs this over markdown input before
/// splitting lines.
pub fn markdown_unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut escaped = false;
    for c in text.chars() {
        if c == '\\' && !escaped {
            escaped = true;
            continue;
        }
        escaped = false;
        out.push(c);
    }
    out
}

/// Render the documentation grammar with no escaping at all.
pub fn render_text<W: Write>(layout: &Layout, out: &mut W, line_length: usize) -> Result<()> {
    render_with_escape(layout, out, line_length, identity_escape)
}

/// Render the documentation grammar with markdown escaping applied to every
/// free-text token.
pub fn render_markdown<W: Write>(layout: &Layout, out: &mut W, line_length: usize) -> Result<()> {
    render_with_escape(layout, out, line_length, markdown_escape)
}

fn render_with_escape<W: Write>(
    layout: &Layout,
    out: &mut W,
    line_length: usize,
    escape: EscapeFn,
) -> Result<()> {
    let ww = WordWrap::new(line_length, 0);
    let ww_fields = WordWrap::new(line_length, 2);

    // the engine tag is never escaped: it is machine-chosen, not free text
    writeln!(out, "# {} ({})", escape(&layout.name), layout.kind)?;
    writeln!(out)?;
    if !layout.comment.is_empty() {
        writeln!(out, "{}", ww.wrap(&escape(&layout.comment)))?;
        writeln!(out)?;
    }

    for schema in &layout.schemas {
        // the anonymous schema gets no header, but its tables are emitted
        if let Some(name) = &schema.name {
            writeln!(out, "## {}", escape(name))?;
            writeln!(out)?;
            if !schema.comment.is_empty() {
                writeln!(out, "{}", ww.wrap(&escape(&schema.comment)))?;
                writeln!(out)?;
            }
        }

        for table in &schema.tables {
            writeln!(out, "### {}", escape(&table.name))?;
            writeln!(out)?;
            if !table.comment.is_empty() {
                writeln!(out, "{}", ww.wrap(&escape(&table.comment)))?;
                writeln!(out)?;
            }

            for field in &table.fields {
                let mut type_str = field.field_type.clone();
                if field.length > 0 {
                    type_str.push_str(&field.length.to_string());
                }
                if field.is_nullable {
                    type_str.push('?');
                }

                writeln!(out, "- {} [{}]", escape(&field.name), escape(&type_str))?;
                if !field.comment.is_empty() {
                    writeln!(out)?;
                    writeln!(out, "{}", ww_fields.wrap(&escape(&field.comment)))?;
                }
                writeln!(out)?;
            }
        }
    }

    Ok(())
}
