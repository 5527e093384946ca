pub mod commands;
pub mod interpreter;
pub mod layout;
pub mod package;
pub mod probe;
pub mod runtime;
