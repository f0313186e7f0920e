pub mod points_text;

pub use points_text::{
    ParseError, ParseResult, ReadOptions, ReadReport, parse_columns, read_points, read_points_file,
    read_points_str,
};
