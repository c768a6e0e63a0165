pub mod model;
pub mod sensitivity;
