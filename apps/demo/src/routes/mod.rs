mod todos;

pub use todos::{register, todo};
