pub mod cli;
pub mod config;
pub mod flowcell;
pub mod helper;
pub mod pipelines;
