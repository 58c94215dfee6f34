pub mod error;
pub mod layout;
pub mod parser;
pub mod reader;

pub use error::GroupError;
pub use parser::{DataGroup, parse_group};
