//! Core functionality: catalog data, filtering, preview state, and configuration

pub mod assets;
pub mod catalog;
pub mod config;
pub mod debounce;
pub mod filter;
pub mod markup;
pub mod modal;
