//! Command handlers

pub mod calendar;
pub mod config;
pub mod entry;
pub mod export;
pub mod restore;
pub mod search;
pub mod status;
pub mod template;
