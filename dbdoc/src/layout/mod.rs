use crate::error::{DbDocError, Result};
use std::collections::HashMap;
use std::fmt;

/// Which database technology produced a layout. Unknown tags round-trip
/// verbatim through `Other` so a hand-written header is never rewritten.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineKind {
    Postgres,
    Mysql,
    Mssql,
    Sqlite,
    Other(String),
}

impl EngineKind {
    pub fn as_str(&self) -> &str {
        match self {
            EngineKind::Postgres => "PostgreSQL",
            EngineKind::Mysql => "MySQL",
            EngineKind::Mssql => "MSSQL",
            EngineKind::Sqlite => "SQLite",
            EngineKind::Other(tag) => tag,
        }
    }

    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "PostgreSQL" => EngineKind::Postgres,
            "MySQL" => EngineKind::Mysql,
            "MSSQL" => EngineKind::Mssql,
            "SQLite" => EngineKind::Sqlite,
            other => EngineKind::Other(other.to_string()),
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single column. The type is stored exactly as the engine reports it;
/// no normalization happens across engines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldLayout {
    pub name: String,
    pub field_type: String,
    pub is_primary_key: bool,
    pub is_unique: bool,
    pub is_nullable: bool,
    /// 0 means unspecified (many engines embed the length in the type string).
    pub length: u32,
    pub default_value: String,
    pub comment: String,
}

impl FieldLayout {
    pub fn new(name: &str) -> Self {
        FieldLayout {
            name: name.to_string(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableLayout {
    pub name: String,
    pub comment: String,
    pub fields: Vec<FieldLayout>,
    field_lookup: HashMap<String, usize>,
}

/// One schema. `name` is `None` for engines without a schema concept
/// (SQLite); the writer then suppresses the `##` header but still emits
/// the schema's tables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaLayout {
    pub name: Option<String>,
    pub comment: String,
    pub tables: Vec<TableLayout>,
    table_lookup: HashMap<String, usize>,
}

/// In-memory tree of one database's documented structure:
/// database -> schemas -> tables -> fields.
///
/// The ordered child vectors are the source of truth; the name lookups are
/// derived caches. Anything that mutates or reorders a child vector in bulk
/// (parse, merge, sort) must end with [`Layout::rebuild_lookups`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub name: String,
    pub kind: EngineKind,
    pub comment: String,
    pub schemas: Vec<SchemaLayout>,
    schema_lookup: HashMap<Option<String>, usize>,
}

impl TableLayout {
    pub fn new(name: &str) -> Self {
        TableLayout {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Append a field, failing when the name is already taken in this table.
    pub fn add_field(&mut self, field: FieldLayout) -> Result<()> {
        if self.field_lookup.contains_key(&field.name) {
            return Err(DbDocError::DuplicateField {
                field: field.name,
                table: self.name.clone(),
            });
        }

        self.field_lookup
            .insert(field.name.clone(), self.fields.len());
        self.fields.push(field);
        Ok(())
    }

    /// Append a field without the duplicate check. The parser uses this so
    /// a malformed file with a repeated field never aborts the parse.
    pub(crate) fn push_field(&mut self, field: FieldLayout) {
        self.fields.push(field);
    }

    pub fn find_field(&self, name: &str) -> Option<&FieldLayout> {
        self.field_lookup.get(name).map(|&i| &self.fields[i])
    }

    pub fn rebuild_lookups(&mut self) {
        self.field_lookup = self
            .fields
            .iter()
            .enumerate()
            .map(|(i, field)| (field.name.clone(), i))
            .collect();
    }

    fn sort(&mut self) {
        self.fields.sort_by(|a, b| a.name.cmp(&b.name));
    }
}

impl SchemaLayout {
    pub fn new(name: Option<&str>) -> Self {
        SchemaLayout {
            name: name.map(str::to_string),
            ..Default::default()
        }
    }

    pub fn get_or_create_table(&mut self, name: &str) -> &mut TableLayout {
        if let Some(&idx) = self.table_lookup.get(name) {
            return &mut self.tables[idx];
        }

        self.table_lookup.insert(name.to_string(), self.tables.len());
        self.tables.push(TableLayout::new(name));
        self.tables.last_mut().unwrap()
    }

    /// Append a table without touching the lookup. The parser appends
    /// whatever the file declares (duplicates included) and rebuilds the
    /// lookups once at the end.
    pub(crate) fn push_table(&mut self, table: TableLayout) {
        self.tables.push(table);
    }

    pub fn find_table(&self, name: &str) -> Option<&TableLayout> {
        self.table_lookup.get(name).map(|&i| &self.tables[i])
    }

    pub fn rebuild_lookups(&mut self) {
        self.table_lookup = self
            .tables
            .iter()
            .enumerate()
            .map(|(i, table)| (table.name.clone(), i))
            .collect();
        for table in &mut self.tables {
            table.rebuild_lookups();
        }
    }

    fn sort(&mut self) {
        self.tables.sort_by(|a, b| a.name.cmp(&b.name));
        for table in &mut self.tables {
            table.sort();
        }
    }
}

impl Layout {
    pub fn new(name: &str, kind: EngineKind) -> Self {
        Layout {
            name: name.to_string(),
            kind,
            comment: String::new(),
            schemas: Vec::new(),
            schema_lookup: HashMap::new(),
        }
    }

    pub fn get_or_create_schema(&mut self, name: Option<&str>) -> &mut SchemaLayout {
        let key = name.map(str::to_string);
        if let Some(&idx) = self.schema_lookup.get(&key) {
            return &mut self.schemas[idx];
        }

        self.schema_lookup.insert(key, self.schemas.len());
        self.schemas.push(SchemaLayout::new(name));
        self.schemas.last_mut().unwrap()
    }

    /// Get-or-create a table, auto-creating its schema when absent.
    pub fn get_or_create_table(&mut self, schema: Option<&str>, table: &str) -> &mut TableLayout {
        self.get_or_create_schema(schema).get_or_create_table(table)
    }

    /// Append a field under `schema.table`, creating both nodes when absent.
    /// Fails with [`DbDocError::DuplicateField`] when the field name is
    /// already taken in that table.
    pub fn add_field(&mut self, schema: Option<&str>, table: &str, field: FieldLayout) -> Result<()> {
        self.get_or_create_table(schema, table).add_field(field)
    }

    /// Pure lookup; never creates nodes.
    pub fn find_schema(&self, name: Option<&str>) -> Option<&SchemaLayout> {
        let key = name.map(str::to_string);
        self.schema_lookup.get(&key).map(|&i| &self.schemas[i])
    }

    pub fn find_table(&self, schema: Option<&str>, table: &str) -> Option<&TableLayout> {
        self.find_schema(schema)?.find_table(table)
    }

    pub fn find_field(&self, schema: Option<&str>, table: &str, field: &str) -> Option<&FieldLayout> {
        self.find_table(schema, table)?.find_field(field)
    }

    /// Reconstruct every name lookup from the ordered child vectors.
    pub fn rebuild_lookups(&mut self) {
        self.schema_lookup = self
            .schemas
            .iter()
            .enumerate()
            .map(|(i, schema)| (schema.name.clone(), i))
            .collect();
        for schema in &mut self.schemas {
            schema.rebuild_lookups();
        }
    }

    /// Reorder schemas, tables and fields by case-sensitive ascending name
    /// (the anonymous schema sorts first). Comments and all other attributes
    /// are untouched. Used on a first run, when there is no persisted file
    /// whose order should win.
    pub fn sort(&mut self) {
        self.schemas.sort_by(|a, b| a.name.cmp(&b.name));
        for schema in &mut self.schemas {
            schema.sort();
        }
        // lookups cache positions, so any reorder invalidates them
        self.rebuild_lookups();
    }
}
