use crate::{autovoc::AutoVoc, config::Config, voice::SongbirdBackend};
use serenity::{all::ShardManager, prelude::TypeMapKey};
use std::sync::Arc;
use tokio::sync::RwLock;

pub type AutoVocService = AutoVoc<SongbirdBackend>;

/// The client's shard manager, stored in the serenity client data so handlers can read shard
/// latencies.
pub struct ShardManagerKey;

impl TypeMapKey for ShardManagerKey {
    type Value = Arc<ShardManager>;
}

/// Collection of data that is shared across events
pub struct Context<'a> {
    // Our own context types
    pub cfg: &'a RwLock<Config>,
    pub autovoc: &'a Arc<AutoVocService>,
    // Discord/Serenity context types
    pub cache: &'a Arc<serenity::all::Cache>,
    pub http: &'a Arc<serenity::all::Http>,
    pub cache_http: &'a CacheHttp,
}

/// Many Serenity functions take a `impl CacheHttp` in order to first check the cache if the item
/// is available and fall back to an http request otherwise.  The most readily available type that
/// impl's this is named very differently in a way that could be confusing, and so we alias it.
pub type CacheHttp = serenity::all::Context;
