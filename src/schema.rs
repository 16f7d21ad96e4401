//! Table descriptors produced by the parser and consumed by the generator.
mod column;
mod foreign_key;
mod table;

pub use column::{Column, ColumnConstraint, ConstraintKind};
pub use foreign_key::{ForeignKey, ReferentialAction};
pub use table::Table;
