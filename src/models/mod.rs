pub mod todo;
pub mod user;

pub use todo::{NewTodo, NewTodoRequest, Todo, TodoChanges, TodoId, TodoRules, UpdateTodoRequest};
pub use user::UserId;
