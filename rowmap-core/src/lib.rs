mod as_value;
mod column;
mod data_map;
mod database;
mod driver;
mod entity;
mod entity_manager;
mod error;
mod events;
mod executor;
mod query;
mod query_executor;
mod registry;
mod sql_writer;
mod statement;
mod util;
mod value;

pub use ::anyhow::Context as ErrorContext;
pub use as_value::*;
pub use column::*;
pub use data_map::*;
pub use database::*;
pub use driver::*;
pub use entity::*;
pub use entity_manager::*;
pub use error::*;
pub use events::*;
pub use executor::*;
pub use query::*;
pub use query_executor::*;
pub use registry::*;
pub use sql_writer::*;
pub use statement::*;
pub use util::*;
pub use value::*;
pub mod stream {
    pub use ::futures::stream::*;
}
pub use ::futures::future;
