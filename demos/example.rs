use std::sync::Arc;

use cfgpath::{context, PathResolver, StoreBuilder};
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Serialize, Deserialize)]
struct HttpSection {
    enabled: bool,
    port: u16,
    timeout_secs: u64,
}

impl Default for HttpSection {
    fn default() -> Self {
        Self {
            enabled: false,
            port: 80,
            timeout_secs: 30,
        }
    }
}

fn main() -> Result<(), cfgpath::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let store = StoreBuilder::new()
        .with_file("demos/default.toml", true)
        .with_file("demos/dev.toml", false)
        .with_env("DRAGON", "__")
        .build()?;

    let resolver = PathResolver::new(store);

    let name: String = resolver.select_value("app.name", String::from("unnamed"));
    let debug: bool = resolver.select_value("app.debug", false);
    println!("App: {name} (debug={debug})");

    let (found, http) = resolver.try_populate_object::<HttpSection>("service.http");
    println!("HTTP (found={found}): {http:?}");

    // Code without access to `resolver` goes through the process-wide handle.
    context::initialize(Arc::clone(resolver.store()));
    let port: u16 = context::resolve_value("service.http.port")?;
    println!("Port via context: {port}");
    context::destroy();

    Ok(())
}
