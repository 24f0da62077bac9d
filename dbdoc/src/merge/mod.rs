// Merge engine: reconcile a persisted layout (the documentation file, source
// of hand-written comments) with a freshly introspected one (source of
// structural truth). Total over any two well-formed trees; never fails.

use crate::layout::{FieldLayout, Layout, SchemaLayout, TableLayout};
use std::collections::HashMap;
use std::mem;

/// Which side wins when both the file and the database carry a comment for
/// the same item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommentPrecedence {
    /// Keep the file's comment when both sides have one; otherwise take
    /// whichever side is non-empty.
    #[default]
    FileFirst,
    /// Always take the database's comment, falling back to the file's only
    /// when the database has none.
    DbFirst,
}

#[derive(Debug, Clone)]
pub struct MergeOptions {
    pub comments: CommentPrecedence,
    /// Retain items that exist in the file but no longer in the database.
    /// `false` is the "clean" policy: dropped items disappear from the docs.
    pub keep_missing: bool,
}

impl Default for MergeOptions {
    fn default() -> Self {
        MergeOptions {
            comments: CommentPrecedence::default(),
            keep_missing: true,
        }
    }
}

fn resolve_comment(base: String, incoming: String, precedence: CommentPrecedence) -> String {
    match precedence {
        CommentPrecedence::FileFirst => {
            if base.is_empty() {
                incoming
            } else {
                base
            }
        }
        CommentPrecedence::DbFirst => {
            if incoming.is_empty() {
                base
            } else {
                incoming
            }
        }
    }
}

impl Layout {
    /// Merge `incoming` (live structure) into `self` (persisted docs).
    ///
    /// Matched items keep `self`'s position; incoming-only items are
    /// appended in `incoming`'s order; items missing from `incoming` are
    /// retained or dropped per [`MergeOptions::keep_missing`]. Every
    /// attribute other than comments is taken from `incoming`. Lookups are
    /// rebuilt once at the end.
    pub fn merge_from(&mut self, incoming: Layout, opts: &MergeOptions) {
        self.name = incoming.name;
        self.kind = incoming.kind;
        self.comment = resolve_comment(
            mem::take(&mut self.comment),
            incoming.comment,
            opts.comments,
        );

        let index: HashMap<Option<String>, usize> = incoming
            .schemas
            .iter()
            .enumerate()
            .map(|(i, schema)| (schema.name.clone(), i))
            .collect();
        let mut slots: Vec<Option<SchemaLayout>> =
            incoming.schemas.into_iter().map(Some).collect();

        let mut merged = Vec::with_capacity(slots.len());
        for mut schema in mem::take(&mut self.schemas) {
            match index.get(&schema.name).and_then(|&i| slots[i].take()) {
                Some(other) => {
                    schema.merge_from(other, opts);
                    merged.push(schema);
                }
                None if opts.keep_missing => merged.push(schema),
                None => {}
            }
        }
        merged.extend(slots.into_iter().flatten());
        self.schemas = merged;

        self.rebuild_lookups();
    }
}

impl SchemaLayout {
    fn merge_from(&mut self, incoming: SchemaLayout, opts: &MergeOptions) {
        self.name = incoming.name;
        self.comment = resolve_comment(
            mem::take(&mut self.comment),
            incoming.comment,
            opts.comments,
        );

        let index: HashMap<String, usize> = incoming
            .tables
            .iter()
            .enumerate()
            .map(|(i, table)| (table.name.clone(), i))
            .collect();
        let mut slots: Vec<Option<TableLayout>> =
            incoming.tables.into_iter().map(Some).collect();

        let mut merged = Vec::with_capacity(slots.len());
        for mut table in mem::take(&mut self.tables) {
            match index.get(&table.name).and_then(|&i| slots[i].take()) {
                Some(other) => {
                    table.merge_from(other, opts);
                    merged.push(table);
                }
                None if opts.keep_missing => merged.push(table),
                None => {}
            }
        }
        merged.extend(slots.into_iter().flatten());
        self.tables = merged;
    }
}

impl TableLayout {
    fn merge_from(&mut self, incoming: TableLayout, opts: &MergeOptions) {
        self.name = incoming.name;
        self.comment = resolve_comment(
            mem::take(&mut self.comment),
            incoming.comment,
            opts.comments,
        );

        let index: HashMap<String, usize> = incoming
            .fields
            .iter()
            .enumerate()
            .map(|(i, field)| (field.name.clone(), i))
            .collect();
        let mut slots: Vec<Option<FieldLayout>> =
            incoming.fields.into_iter().map(Some).collect();

        let mut merged = Vec::with_capacity(slots.len());
        for mut field in mem::take(&mut self.fields) {
            match index.get(&field.name).and_then(|&i| slots[i].take()) {
                Some(mut other) => {
                    // structure (type, flags, length, default) is live truth;
                    // only the comment is subject to precedence
                    other.comment = resolve_comment(
                        mem::take(&mut field.comment),
                        other.comment,
                        opts.comments,
                    );
                    merged.push(other);
                }
                None if opts.keep_missing => merged.push(field),
                None => {}
            }
        }
        merged.extend(slots.into_iter().flatten());
        self.fields = merged;
    }
}
