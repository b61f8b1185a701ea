pub mod app;
pub mod cache;
pub mod cli;
pub mod config;
pub mod fetch;
pub mod nav;
pub mod output;
pub mod runner;
pub mod session;
pub mod utils;

#[cfg(test)]
mod tests;
