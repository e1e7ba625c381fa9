pub mod backup;
pub mod cli;
pub mod config;
pub mod db;
pub mod serde_utils;

#[cfg(test)]
mod config_test;
