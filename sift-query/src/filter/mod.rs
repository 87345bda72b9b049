//! The filter model: typed leaf filters, the presentation tree that holds
//! them, and the parser that builds trees from JSON or request parameters.

mod leaf;
mod parse;
mod presentation;
mod value;

pub use leaf::{
    BooleanFilter, CollectionFilter, CommonFilter, DateFilter, FilterLeaf, LeafKind, NumberFilter,
    PlainFilter, TextFilter,
};
pub use parse::FilterParser;
pub(crate) use parse::element_scalar;
pub use presentation::{FilterNode, FilterPresentation};
pub use value::FilterValue;
