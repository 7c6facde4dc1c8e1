//! Command handlers.

pub mod config;
pub mod export;
pub mod fields;
pub mod import;
pub mod info;
pub mod save;
pub mod sections;
pub mod show;

pub use config::{run_config_schema, run_config_show, run_config_validate};
pub use export::run_export;
pub use fields::run_fields;
pub use import::run_import;
pub use info::run_info;
pub use save::{SaveSource, run_save};
pub use sections::run_sections;
pub use show::run_show;
pub use test::run_test;
