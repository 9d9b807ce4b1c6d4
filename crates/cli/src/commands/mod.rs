//! Subcommand implementations and the shared loader stack they build.

pub mod cache;
pub mod config_cmd;
pub mod fetch;
pub mod inspect;

use loadstone_cache::{FileAssetCache, InMemoryAssetCache};
use loadstone_config::LoaderConfig;
use loadstone_content::HandlerChain;
use loadstone_core::cache::AssetCache;
use loadstone_loader::{LocationResolver, PoolSettings, ResourceLoader};
use loadstone_protocol::{ConnectionFactory, http_client};
use std::sync::Arc;
use std::time::Duration;

/// Everything a command needs, wired from one config.
pub struct Stack {
    pub cache: Arc<dyn AssetCache>,
    pub factory: ConnectionFactory,
    pub loader: ResourceLoader,
    pub chain: HandlerChain,
}

pub fn open_cache(config: &LoaderConfig) -> Result<Arc<dyn AssetCache>, Box<dyn std::error::Error>> {
    let policy = config.cache.policy();
    let cache: Arc<dyn AssetCache> = match config.cache.backend.as_str() {
        "memory" => Arc::new(InMemoryAssetCache::new(policy)),
        _ => Arc::new(FileAssetCache::open(config.cache.resolved_dir(), policy)?),
    };
    Ok(cache)
}

pub fn build_stack(config: &LoaderConfig) -> Result<Stack, Box<dyn std::error::Error>> {
    let cache = open_cache(config)?;

    let client = http_client(
        Duration::from_secs(config.http.timeout_secs),
        &config.http.user_agent,
    )?;
    let factory = ConnectionFactory::new(cache.clone()).with_client(client);

    let resolver = LocationResolver::new(factory.clone())
        .with_search_roots(config.resolver.search_roots.iter().cloned());
    let loader = ResourceLoader::new(
        cache.clone(),
        Arc::new(resolver),
        PoolSettings {
            file_pool_size: config.pools.file_pool_size,
            data_pool_size: config.pools.data_pool_size,
        },
    );

    let mut chain = HandlerChain::standard();
    chain.mime_table_mut().extend(&config.content.mime_types);

    Ok(Stack {
        cache,
        factory,
        loader,
        chain,
    })
}
