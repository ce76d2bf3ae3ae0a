//! Data layer: source rows, working views, fields and the operations that
//! reshape them (ordering, column topology, roll-ups).

pub mod aggregate;
pub mod data_view;
pub mod datatable;
pub mod datavalue_compare;
pub mod field;
pub mod order;
pub mod topology;
