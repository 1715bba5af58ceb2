//! Line timestamping: stamp each input line with the current or elapsed
//! time, or rewrite timestamps found in the line as relative times.
//!
//! - [`templates`] finds the first known timestamp in a line
//! - [`resolve`] parses it into an instant and picks the output text
//! - [`composite`] and [`relative`] produce compact durations like `2h15m ago`
//! - [`format`] validates and renders strftime-style formats
//! - [`clock`] provides wall/monotonic clocks and incremental stamping
//! - [`input`] and [`output`] move lines in and out
//! - [`annotate`] puts the pieces together per line

pub mod annotate;
pub mod clock;
pub mod composite;
pub mod config;
pub mod format;
pub mod input;
pub mod output;
pub mod relative;
pub mod resolve;
pub mod templates;
