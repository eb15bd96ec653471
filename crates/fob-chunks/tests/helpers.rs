//! Shared test utilities for fob-chunks tests

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use fob_chunks::{
    CacheResult, CachedItem, ChunksPlugin, ChunksPluginOptions, ContentCache, ETag, MemoryCache,
    MemoryCompilation, OutputOptions, PublicPathConfig, RawSource, Template,
};

/// A [`MemoryCache`] that counts every call made through [`ContentCache`].
#[derive(Debug, Default)]
pub struct CountingCache {
    inner: MemoryCache,
    pub etags: AtomicUsize,
    pub merges: AtomicUsize,
    pub gets: AtomicUsize,
    pub stores: AtomicUsize,
}

impl CountingCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn merges(&self) -> usize {
        self.merges.load(Ordering::SeqCst)
    }

    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn stores(&self) -> usize {
        self.stores.load(Ordering::SeqCst)
    }

    pub fn inner(&self) -> &MemoryCache {
        &self.inner
    }
}

#[async_trait]
impl ContentCache for CountingCache {
    fn etag(&self, source: &RawSource) -> ETag {
        self.etags.fetch_add(1, Ordering::SeqCst);
        self.inner.etag(source)
    }

    fn merge_etags(&self, a: &ETag, b: &ETag) -> ETag {
        self.merges.fetch_add(1, Ordering::SeqCst);
        self.inner.merge_etags(a, b)
    }

    async fn get(&self, key: &str, etag: &ETag) -> CacheResult<Option<CachedItem>> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.inner.get(key, etag).await
    }

    async fn store(&self, key: &str, etag: &ETag, item: CachedItem) -> CacheResult<()> {
        self.stores.fetch_add(1, Ordering::SeqCst);
        self.inner.store(key, etag, item).await
    }
}

/// A script template that counts its invocations.
pub fn counting_script_template() -> (Template, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let template = Template::function(move |url, _entry| {
        counter.fetch_add(1, Ordering::SeqCst);
        format!(r#"<script defer src="{url}"></script>"#)
    });
    (template, calls)
}

pub fn plugin(options: ChunksPluginOptions) -> ChunksPlugin {
    ChunksPlugin::new(options).expect("valid options")
}

/// `home` with `a.css`, `b.css`, `a.js`, `b.js` and a source map, public path `/dist/`.
pub fn home_compilation() -> MemoryCompilation {
    MemoryCompilation::new(OutputOptions::new(PublicPathConfig::parse("/dist/")))
        .with_entrypoint("home", ["a.css", "b.css", "a.js", "b.js", "a.js.map"])
        .with_asset("a.css", "a{color:red}")
        .with_asset("b.css", "b{color:blue}")
        .with_asset("a.js", "console.log('a')")
        .with_asset("b.js", "console.log('b')")
        .with_asset("a.js.map", "{}")
}

/// Two entries sharing a vendor chunk, registered in the given order.
pub fn two_entries(order: [&str; 2]) -> MemoryCompilation {
    let mut compilation =
        MemoryCompilation::new(OutputOptions::new(PublicPathConfig::parse("/assets/")));
    for name in order {
        compilation = compilation.with_entrypoint(
            name,
            [
                format!("{name}.css"),
                "vendors.js".to_string(),
                format!("{name}.js"),
            ],
        );
    }
    compilation
        .with_asset("a.css", "a{}")
        .with_asset("b.css", "b{}")
        .with_asset("vendors.js", "vendors()")
        .with_asset("a.js", "a()")
        .with_asset("b.js", "b()")
}
