pub mod history;
pub mod reflection;
