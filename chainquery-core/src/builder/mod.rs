//! Query builder module

pub mod common;
pub mod compile;
pub mod insert;
pub mod select;

// Re-export types from submodules
pub use common::{
    IntoFields, IntoJoinConditions, IntoJoinTarget, JoinClause, JoinConditions, JoinTarget,
    QueryBuilder,
};
pub use compile::compile;
pub use insert::{json_to_value, InsertBuilder, IntoInsertData};
pub use select::Query;
