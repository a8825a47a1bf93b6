pub mod project;
pub mod sensitivity;
