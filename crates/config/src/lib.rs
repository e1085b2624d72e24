//! Configuration: schema, file discovery/loading, env substitution.

pub mod env_subst;
pub mod loader;
pub mod schema;

pub use {
    loader::{
        clear_config_dir, discover_and_load, discover_and_load_strict, load_config,
        set_config_dir,
    },
    schema::StewardConfig,
};
