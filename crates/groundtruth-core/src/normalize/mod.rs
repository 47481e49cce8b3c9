pub mod authors;
pub mod dates;
pub mod markup;

pub use authors::{canonicalize_author_string, canonicalize_authors};
pub use dates::{canonicalize_date, find_date};
pub use markup::{clean_text, collapse_whitespace};
