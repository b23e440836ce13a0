pub mod access;
pub mod traversal;
pub mod walk;
