use crate::error::Result;
use crate::layout::{EngineKind, FieldLayout, Layout, SchemaLayout, TableLayout};
use crate::writer::markdown_unescape;
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

/// Which escaping the input file carries. Markdown gets the backslash
/// unescape pre-pass before line splitting; plain text is parsed as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flavor {
    Text,
    Markdown,
}

/// The currently open item. Indices point into the layout under
/// construction, which only ever grows during a parse, so they stay valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Context {
    None,
    Database,
    Schema(usize),
    Table(usize, usize),
    Field(usize, usize, usize),
}

fn field_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^-\s+(\S+)\s*(?:\[([^\]]+)\])?").expect("field line pattern")
    })
}

/// Line-oriented parser for the documentation grammar.
///
/// Headers open a context (`#` database, `##` schema, `###` table), field
/// lines (`- name [type]`) open a field, and every other non-empty line is
/// buffered as comment text for whichever item is currently open. The buffer
/// is flushed right before the next header or field line, and once more at
/// end of input. Malformed lines are logged and skipped; parsing never
/// aborts.
struct LayoutParser {
    layout: Layout,
    context: Context,
    pending: Vec<String>,
}

impl LayoutParser {
    fn new() -> Self {
        LayoutParser {
            layout: Layout::new("", EngineKind::Other(String::new())),
            context: Context::None,
            pending: Vec::new(),
        }
    }

    /// Schema the cursor currently sits in, at any depth.
    fn open_schema(&self) -> Option<usize> {
        match self.context {
            Context::Schema(s) | Context::Table(s, _) | Context::Field(s, _, _) => Some(s),
            _ => None,
        }
    }

    fn open_table(&self) -> Option<(usize, usize)> {
        match self.context {
            Context::Table(s, t) | Context::Field(s, t, _) => Some((s, t)),
            _ => None,
        }
    }

    /// Join the buffered lines with single spaces and assign them as the
    /// comment of the most recently opened item.
    fn flush_comment(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let comment = self.pending.join(" ").trim().to_string();
        self.pending.clear();
        if comment.is_empty() {
            return;
        }

        match self.context {
            Context::None => {
                log::warn!("Dropping comment with no open item: {comment}");
            }
            Context::Database => self.layout.comment = comment,
            Context::Schema(s) => self.layout.schemas[s].comment = comment,
            Context::Table(s, t) => self.layout.schemas[s].tables[t].comment = comment,
            Context::Field(s, t, f) => {
                self.layout.schemas[s].tables[t].fields[f].comment = comment;
            }
        }
    }

    /// `# db (engine)`, `## schema`, `### table`. A shallower or equal-depth
    /// header implicitly exits any deeper context; there is no stack.
    fn parse_header(&mut self, line: &str) {
        let depth = line.chars().take_while(|&c| c == '#').count();
        let rest = line[depth..].trim();

        match depth {
            1 => {
                let (name, tag) = split_name_and_tag(rest);
                if name.is_empty() {
                    log::warn!("Ignoring malformed database header: {line}");
                    return;
                }
                self.layout.name = name.to_string();
                self.layout.kind = EngineKind::from_tag(tag);
                self.context = Context::Database;
            }
            2 => {
                if rest.is_empty() {
                    log::warn!("Ignoring schema header with no name: {line}");
                    return;
                }
                // always a fresh schema: re-declaring a name duplicates it,
                // the sequence stays authoritative
                self.layout.schemas.push(SchemaLayout::new(Some(rest)));
                self.context = Context::Schema(self.layout.schemas.len() - 1);
            }
            3 => {
                if rest.is_empty() {
                    log::warn!("Ignoring table header with no name: {line}");
                    return;
                }
                let schema = match self.open_schema() {
                    Some(s) => s,
                    None => {
                        // table before any `##`: open an anonymous schema
                        self.layout.schemas.push(SchemaLayout::new(None));
                        self.layout.schemas.len() - 1
                    }
                };
                self.layout.schemas[schema].push_table(TableLayout::new(rest));
                let table = self.layout.schemas[schema].tables.len() - 1;
                self.context = Context::Table(schema, table);
            }
            _ => {
                log::warn!("Ignoring line, don't know how to parse: {line}");
            }
        }
    }

    /// `- name [type]`, with a trailing `?` inside the brackets marking the
    /// field nullable. The `?` is stripped from the stored type string.
    fn parse_field(&mut self, line: &str) {
        let caps = match field_line_re().captures(line) {
            Some(caps) => caps,
            None => {
                log::warn!("Ignoring malformed field line: {line}");
                return;
            }
        };
        let (schema, table) = match self.open_table() {
            Some(open) => open,
            None => {
                log::warn!("Ignoring field line with no open table: {line}");
                return;
            }
        };

        let mut field = FieldLayout::new(&caps[1]);
        if let Some(type_str) = caps.get(2) {
            let type_str = type_str.as_str().trim();
            match type_str.strip_suffix('?') {
                Some(stripped) => {
                    field.is_nullable = true;
                    field.field_type = stripped.to_string();
                }
                None => field.field_type = type_str.to_string(),
            }
        }

        // duplicates in a hand-edited file are tolerated here; the lookup
        // rebuild at the end keeps the last one addressable
        self.layout.schemas[schema].tables[table].push_field(field);
        let idx = self.layout.schemas[schema].tables[table].fields.len() - 1;
        self.context = Context::Field(schema, table, idx);
    }

    fn parse_line(&mut self, line: &str) {
        let line = line.trim();
        if line.is_empty() {
            // separator only: a blank line does not flush the comment buffer
            return;
        }

        if line.starts_with('#') {
            self.flush_comment();
            self.parse_header(line);
        } else if line.starts_with('-') {
            self.flush_comment();
            self.parse_field(line);
        } else {
            self.pending.push(line.to_string());
        }
    }

    fn finish(mut self) -> Layout {
        self.flush_comment();
        self.layout.rebuild_lookups();
        self.layout
    }
}

/// Split `users (PostgreSQL)` into name and engine tag. The tag is optional;
/// names may contain spaces.
fn split_name_and_tag(rest: &str) -> (&str, &str) {
    if let Some(open) = rest.rfind('(') {
        if let Some(stripped) = rest[open + 1..].strip_suffix(')') {
            return (rest[..open].trim(), stripped.trim());
        }
    }
    (rest, "")
}

/// Parse documentation text into a layout. Never fails: malformed lines are
/// logged and skipped, and the worst possible input yields an empty layout.
pub fn parse_layout_str(text: &str, flavor: Flavor) -> Layout {
    let unescaped;
    let text = match flavor {
        Flavor::Markdown => {
            unescaped = markdown_unescape(text);
            unescaped.as_str()
        }
        Flavor::Text => text,
    };

    let mut parser = LayoutParser::new();
    for line in text.lines() {
        parser.parse_line(line);
    }
    parser.finish()
}

/// Read and parse a documentation file, picking the flavor from the
/// extension (`.md` / `.markdown` get the unescape pre-pass).
pub fn parse_layout_file(path: &Path) -> Result<Layout> {
    let text = std::fs::read_to_string(path)?;
    let flavor = match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("md") | Some("markdown") => Flavor::Markdown,
        _ => Flavor::Text,
    };
    Ok(parse_layout_str(&text, flavor))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_table_with_comment_and_field() {
        let layout = parse_layout_str("### Orders\nTracks customer orders.\n- id [int]\n", Flavor::Text);

        assert_eq!(layout.schemas.len(), 1);
        assert_eq!(layout.schemas[0].name, None);
        let table = &layout.schemas[0].tables[0];
        assert_eq!(table.name, "Orders");
        assert_eq!(table.comment, "Tracks customer orders.");
        assert_eq!(table.fields.len(), 1);
        assert_eq!(table.fields[0].name, "id");
        assert_eq!(table.fields[0].field_type, "int");
        assert!(!table.fields[0].is_nullable);
    }

    #[test]
    fn parses_full_document() {
        let text = "\
# shop (PostgreSQL)

Main shop database.

## public

Default schema.

### users

People with accounts.

- id [int]

  Primary key.

- email [varchar255?]
";
        let layout = parse_layout_str(text, Flavor::Text);

        assert_eq!(layout.name, "shop");
        assert_eq!(layout.kind, EngineKind::Postgres);
        assert_eq!(layout.comment, "Main shop database.");

        let schema = layout.find_schema(Some("public")).unwrap();
        assert_eq!(schema.comment, "Default schema.");

        let table = layout.find_table(Some("public"), "users").unwrap();
        assert_eq!(table.comment, "People with accounts.");

        let id = layout.find_field(Some("public"), "users", "id").unwrap();
        assert_eq!(id.comment, "Primary key.");
        assert!(!id.is_nullable);

        let email = layout.find_field(Some("public"), "users", "email").unwrap();
        assert_eq!(email.field_type, "varchar255");
        assert!(email.is_nullable);
        assert_eq!(email.comment, "");
    }

    #[test]
    fn database_name_may_contain_spaces() {
        let layout = parse_layout_str("# my shop db (MySQL)\n", Flavor::Text);
        assert_eq!(layout.name, "my shop db");
        assert_eq!(layout.kind, EngineKind::Mysql);
    }

    #[test]
    fn blank_lines_join_comment_paragraphs() {
        let text = "### t\nfirst paragraph\n\nsecond paragraph\n- a [int]\n";
        let layout = parse_layout_str(text, Flavor::Text);
        assert_eq!(
            layout.schemas[0].tables[0].comment,
            "first paragraph second paragraph"
        );
    }

    #[test]
    fn comment_at_end_of_input_is_flushed() {
        let text = "### t\n- a [int]\ntrailing field comment";
        let layout = parse_layout_str(text, Flavor::Text);
        assert_eq!(
            layout.schemas[0].tables[0].fields[0].comment,
            "trailing field comment"
        );
    }

    #[test]
    fn redeclared_schema_duplicates_instead_of_merging() {
        let text = "## s\n### a\n## s\n### b\n";
        let layout = parse_layout_str(text, Flavor::Text);
        assert_eq!(layout.schemas.len(), 2);
        assert_eq!(layout.schemas[0].tables[0].name, "a");
        assert_eq!(layout.schemas[1].tables[0].name, "b");
    }

    #[test]
    fn schema_header_exits_table_context() {
        // the field line right after `##` has no open table and is skipped
        let text = "### t\n- a [int]\n## s\n- b [int]\n";
        let layout = parse_layout_str(text, Flavor::Text);
        assert_eq!(layout.schemas[0].tables[0].fields.len(), 1);
        assert!(layout.schemas[1].tables.is_empty());
    }

    #[test]
    fn malformed_lines_are_skipped_not_fatal() {
        let text = "#### too deep\n### t\n##\n- a [int]\n- \n";
        let layout = parse_layout_str(text, Flavor::Text);
        assert_eq!(layout.schemas.len(), 1);
        let table = &layout.schemas[0].tables[0];
        assert_eq!(table.fields.len(), 1);
        assert_eq!(table.fields[0].name, "a");
    }

    #[test]
    fn field_without_type_brackets() {
        let layout = parse_layout_str("### t\n- mystery\n", Flavor::Text);
        let field = &layout.schemas[0].tables[0].fields[0];
        assert_eq!(field.name, "mystery");
        assert_eq!(field.field_type, "");
        assert!(!field.is_nullable);
    }

    #[test]
    fn markdown_flavor_unescapes_before_parsing() {
        let text = "### snake\\_case\n- my\\_field [varchar?]\n";
        let layout = parse_layout_str(text, Flavor::Markdown);
        let table = &layout.schemas[0].tables[0];
        assert_eq!(table.name, "snake_case");
        assert_eq!(table.fields[0].name, "my_field");
        assert_eq!(table.fields[0].field_type, "varchar");
        assert!(table.fields[0].is_nullable);
    }

    #[test]
    fn lookups_are_built_after_parse() {
        let layout = parse_layout_str("## s\n### t\n- a [int]\n", Flavor::Text);
        assert!(layout.find_field(Some("s"), "t", "a").is_some());
    }

    #[test]
    fn parse_file_picks_flavor_from_extension() {
        use std::io::Write;

        let dir = tempfile::tempdir().unwrap();
        let md = dir.path().join("docs.md");
        let mut f = std::fs::File::create(&md).unwrap();
        write!(f, "### a\\_table\n- id [int]\n").unwrap();
        drop(f);

        let layout = parse_layout_file(&md).unwrap();
        assert_eq!(layout.schemas[0].tables[0].name, "a_table");

        let txt = dir.path().join("docs.txt");
        std::fs::write(&txt, "### a\\_table\n- id [int]\n").unwrap();
        let layout = parse_layout_file(&txt).unwrap();
        assert_eq!(layout.schemas[0].tables[0].name, "a\\_table");
    }
}
