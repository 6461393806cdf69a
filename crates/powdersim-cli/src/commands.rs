pub mod engines;
pub mod parse_type;
pub mod simulate;
