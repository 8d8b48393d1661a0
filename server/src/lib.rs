// Candela core library
// Shared by the headless server binary and the desktop shell

pub mod commands;
pub mod config;
pub mod models;
pub mod services;
pub mod state;
