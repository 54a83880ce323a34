mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{
    DEFAULT_PARTITIONS, DEFAULT_REPLY_BUFFER, KlogConfig, NodeConfig, RawKlogConfig, StoreConfig,
};
