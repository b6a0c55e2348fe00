//! Database module for PostgreSQL connection and operations.

mod companies;
mod feedback;
mod pool;
mod quotes;
mod schema;
mod users;

pub use companies::*;
pub use feedback::*;
pub use pool::DatabasePool;
pub use quotes::*;
pub use schema::*;
pub use users::*;
