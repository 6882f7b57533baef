pub mod command;
pub mod commands;
pub mod control;
pub mod controllers;
pub mod settings;
pub mod subsystems;
pub mod time;

#[macro_use]
pub mod utils;
