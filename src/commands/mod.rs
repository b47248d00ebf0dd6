pub mod delete;
pub mod info;
pub mod merge;
pub mod reorder;
pub mod rotate;
pub mod split;
pub mod text;
