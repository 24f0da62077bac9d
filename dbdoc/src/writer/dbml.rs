use crate::error::Result;
use crate::layout::Layout;
use std::io::Write;

/// Quote a DBML string: internal whitespace is normalized to single spaces
/// and single quotes are backslash-escaped.
fn dbml_escape(input: &str) -> String {
    let normalized = input.split_whitespace().collect::<Vec<_>>().join(" ");
    format!("'{}'", normalized.replace('\'', "\\'"))
}

/// Write-only DBML export (https://www.dbml.org/docs/). There is no parser
/// counterpart, and schema grouping is lost: tables are flattened across all
/// schemas into one list. A `[not null]` flag is emitted exactly when the
/// field is not nullable.
pub fn render_dbml<W: Write>(layout: &Layout, out: &mut W, add_notes: bool) -> Result<()> {
    writeln!(out, "Project {}{{", layout.name)?;
    writeln!(out, "  database_type: {}", dbml_escape(layout.kind.as_str()))?;
    if add_notes && !layout.comment.is_empty() {
        writeln!(out, "  Note: {}", dbml_escape(&layout.comment))?;
    }
    writeln!(out, "}}")?;
    writeln!(out)?;

    for schema in &layout.schemas {
        for table in &schema.tables {
            writeln!(out, "Table {}{{", table.name)?;

            let name_width = table
                .fields
                .iter()
                .map(|f| f.name.len())
                .max()
                .unwrap_or(0)
                .max(10);

            for field in &table.fields {
                let mut type_str = field.field_type.clone();
                if field.length > 0 {
                    type_str.push_str(&field.length.to_string());
                }
                if !field.is_nullable {
                    type_str.push_str(" [not null]");
                }

                writeln!(out, "  {:<width$} {}", field.name, type_str, width = name_width)?;
            }

            writeln!(out, "}}")?;
            writeln!(out)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{EngineKind, FieldLayout};
    use pretty_assertions::assert_eq;

    #[test]
    fn renders_project_and_tables() {
        let mut layout = Layout::new("shop", EngineKind::Postgres);
        layout.comment = "the  shop's   database".to_string();

        let mut id = FieldLayout::new("id");
        id.field_type = "int".to_string();
        layout.add_field(Some("public"), "users", id).unwrap();

        let mut email = FieldLayout::new("email_address");
        email.field_type = "varchar".to_string();
        email.length = 255;
        email.is_nullable = true;
        layout.add_field(Some("public"), "users", email).unwrap();

        let mut out = Vec::new();
        render_dbml(&layout, &mut out, true).unwrap();

        let expected = "\
Project shop{
  database_type: 'PostgreSQL'
  Note: 'the shop\\'s database'
}

Table users{
  id            int [not null]
  email_address varchar255
}

";
        assert_eq!(String::from_utf8(out).unwrap(), expected);
    }

    #[test]
    fn schema_grouping_is_flattened() {
        let mut layout = Layout::new("app", EngineKind::Postgres);
        layout
            .add_field(Some("a"), "first", FieldLayout::new("x"))
            .unwrap();
        layout
            .add_field(Some("b"), "second", FieldLayout::new("y"))
            .unwrap();

        let mut out = Vec::new();
        render_dbml(&layout, &mut out, false).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("Table first{"));
        assert!(text.contains("Table second{"));
        assert!(!text.contains("\"a\"") && !text.contains("schema"));
    }

    #[test]
    fn notes_can_be_disabled() {
        let mut layout = Layout::new("app", EngineKind::Sqlite);
        layout.comment = "hidden".to_string();

        let mut out = Vec::new();
        render_dbml(&layout, &mut out, false).unwrap();
        assert!(!String::from_utf8(out).unwrap().contains("Note:"));
    }
}
