pub mod command;
pub mod file;
pub mod install;
pub mod path;
pub mod script;
