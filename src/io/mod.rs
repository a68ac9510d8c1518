//! Local file input and Hadoop-style output layout

pub mod input;
pub mod output;

pub use input::{discover_inputs, read_splits, InputSplit};
pub use output::{prepare_output_dir, write_part_file, write_success_marker};
