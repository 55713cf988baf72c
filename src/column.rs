//! Column Writers
//!
//! A column writer knows how to extract one column's value from a
//! [`LogEvent`](crate::event::LogEvent), which SQL type it declares, and how
//! that type maps onto DDL and onto a native client type.
//!
//! # Components
//!
//! - [`DbType`]: Declared SQL types and the type mapping table
//! - [`NativeType`] / [`SqlValue`]: Client-side cell values and coercion
//! - [`ColumnWriter`] / [`ColumnKind`]: The writer variants
//! - [`PropertyWriteMethod`]: How a single-property column renders its value

mod db_type;
mod value;
mod writer;

pub use db_type::{DbType, NativeType};
pub use value::{SqlValue, format_timestamp};
pub use writer::{ColumnKind, ColumnWriter, PropertyWriteMethod};
