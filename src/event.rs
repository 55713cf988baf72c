//! Log Event Model
//!
//! The immutable unit of work handed to the sink by a logging pipeline.
//!
//! # Components
//!
//! - [`LogEvent`]: Timestamp, level, message template, optional exception text and named properties
//! - [`Level`]: Severity with a numeric (`0..=5`) and a textual rendering
//! - [`PropertyValue`] / [`Scalar`]: Structured property values
//! - [`FormatProvider`]: Optional culture hook consulted when scalars are rendered as text

mod format;
mod level;
mod log_event;
mod template;
mod value;

pub use format::FormatProvider;
pub use level::Level;
pub use log_event::LogEvent;
pub use template::render_template;
pub use value::{PropertyValue, Scalar};
