//! Configuration for cursor queries and the shared query cache.
use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::Context;
use anyhow::Result;
use serde::Deserialize;
use serde::Serialize;

/// Cursor adapter configuration options.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Conf {
    /// Number of documents the driver fetches from the server per batch.
    #[serde(default)]
    pub batch_size: Option<u32>,

    /// Shared query results cache.
    #[serde(default)]
    pub cache: CacheConf,

    /// MongoDB connection options.
    #[serde(default)]
    pub mongodb: MongoDBConf,
}

impl Conf {
    /// Loads the configuration from the given [`std::fs::File`].
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Conf> {
        let path = path.as_ref();
        let file = File::open(path).with_context(|| ConfError::Open(path.display().to_string()))?;
        Conf::from_reader(file)
    }

    /// Loads the configuration from the given [`std::io::Read`].
    pub fn from_reader<R: Read>(reader: R) -> Result<Conf> {
        let conf: Conf = serde_yaml::from_reader(reader).context(ConfError::Decode)?;
        conf.cache.validate()?;
        Ok(conf)
    }
}

/// Shared query results cache options.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CacheConf {
    /// Maximum number of query results kept in the cache.
    #[serde(default = "CacheConf::default_capacity")]
    pub capacity: usize,

    /// Enable caching of query results across cursor adapters.
    #[serde(default)]
    pub enabled: bool,

    /// Seconds after which cached query results expire.
    #[serde(default = "CacheConf::default_expiration")]
    pub expiration: u64,
}

impl Default for CacheConf {
    fn default() -> CacheConf {
        CacheConf {
            capacity: CacheConf::default_capacity(),
            enabled: false,
            expiration: CacheConf::default_expiration(),
        }
    }
}

impl CacheConf {
    fn default_capacity() -> usize {
        32
    }

    fn default_expiration() -> u64 {
        600
    }

    /// Check the options describe a usable cache.
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            anyhow::bail!(ConfError::CacheCapacity);
        }
        Ok(())
    }
}

/// MongoDB connection options.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MongoDBConf {
    #[serde(default = "MongoDBConf::default_db")]
    pub db: String,

    #[serde(default = "MongoDBConf::default_uri")]
    pub uri: String,
}

impl Default for MongoDBConf {
    fn default() -> MongoDBConf {
        MongoDBConf {
            db: MongoDBConf::default_db(),
            uri: MongoDBConf::default_uri(),
        }
    }
}

impl MongoDBConf {
    fn default_db() -> String {
        String::from("odm")
    }

    fn default_uri() -> String {
        String::from("mongodb://localhost:27017/")
    }
}

/// The cursor adapter configuration is not valid.
#[derive(Debug, thiserror::Error)]
pub enum ConfError {
    #[error("the query cache capacity must be greater than zero")]
    CacheCapacity,

    #[error("unable to decode the configuration")]
    Decode,

    #[error("unable to open configuration file '{0}'")]
    Open(String),
}
