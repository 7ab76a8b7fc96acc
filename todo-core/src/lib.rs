pub mod config;
pub mod db;
pub mod error;
pub mod memory;
pub mod models;
pub mod store;
pub mod validate;

pub use config::{StoreBackend, TodoConfig};
pub use error::{TodoError, TodoResult};
pub use memory::MemoryTodoStore;
pub use models::{todo_key, NewTodo, Todo, TodoPatch};
pub use store::{PgTodoStore, TodoStore};
