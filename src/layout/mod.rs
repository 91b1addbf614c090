pub mod node;
pub mod treemap;
