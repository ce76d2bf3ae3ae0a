pub mod index;
pub mod normalize;
pub mod query;

pub use index::SearchIndex;
pub use normalize::{normalize, normalize_value};
pub use query::{split_field_list, FieldScope, Query, QueryError};
