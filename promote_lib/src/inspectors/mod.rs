mod alias_dot;
mod summary;

pub use alias_dot::inspect_aliases;
pub use summary::inspect_summary;
