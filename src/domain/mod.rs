pub mod fields;
pub mod hierarchy;
pub mod markup;
pub mod relations;
pub mod ticket;
pub mod tracker;
