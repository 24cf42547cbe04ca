pub mod commands;
pub mod render;
pub mod rt;
pub mod runner;
pub mod session;
