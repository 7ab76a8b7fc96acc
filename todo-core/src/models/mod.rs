mod todo;

pub use todo::*;
