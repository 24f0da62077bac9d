// Introspection readers build a layout straight from a live database.
// SQLite ships in-tree; other engines populate a layout through the same
// `Layout` primitives from their own crates or tools.

pub mod sqlite;
