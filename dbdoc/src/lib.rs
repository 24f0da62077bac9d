pub mod error;
pub mod introspect;
pub mod layout;
pub mod merge;
pub mod parser;
pub mod writer;

pub use error::{DbDocError, Result};
pub use layout::{EngineKind, FieldLayout, Layout, SchemaLayout, TableLayout};
pub use merge::{CommentPrecedence, MergeOptions};
pub use parser::{parse_layout_file, parse_layout_str, Flavor};
pub use writer::{render_dbml, render_markdown, render_text};
