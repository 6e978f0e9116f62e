use std::collections::BTreeMap;
use std::io::Write;

use cfgpath::{HierarchicalStore, PathResolver, ResolveError, Section, StoreBuilder};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use toml::Value;

/// A minimal store keyed by full dotted section paths, with exact key matching.
#[derive(Debug, Default)]
struct FlatStore {
    leaves: BTreeMap<String, String>,
}

impl FlatStore {
    fn with(mut self, key: &str, value: &str) -> Self {
        self.leaves.insert(key.to_owned(), value.to_owned());
        self
    }
}

#[derive(Debug)]
struct FlatSection<'a> {
    store: &'a FlatStore,
    prefix: Option<String>,
}

impl<'a> FlatSection<'a> {
    fn key(&self, key: &str) -> String {
        match &self.prefix {
            Some(prefix) => format!("{prefix}.{key}"),
            None => key.to_owned(),
        }
    }
}

impl<'a> Section<'a> for FlatSection<'a> {
    fn exists(&self) -> bool {
        match &self.prefix {
            None => true,
            Some(prefix) => {
                let nested = format!("{prefix}.");
                self.store.leaves.keys().any(|k| k.starts_with(&nested))
            }
        }
    }

    fn section(&self, key: &str) -> Box<dyn Section<'a> + 'a> {
        Box::new(FlatSection {
            store: self.store,
            prefix: Some(self.key(key)),
        })
    }

    fn leaf(&self, key: &str) -> Option<Value> {
        self.store.leaves.get(&self.key(key)).cloned().map(Value::String)
    }

    fn tree(&self) -> Option<Value> {
        if !self.exists() {
            return None;
        }
        let prefix = self.prefix.as_deref().map(|p| format!("{p}.")).unwrap_or_default();
        let table = self
            .store
            .leaves
            .iter()
            .filter_map(|(k, v)| {
                let rest = k.strip_prefix(&prefix)?;
                (!rest.contains('.')).then(|| (rest.to_owned(), Value::String(v.clone())))
            })
            .collect();
        Some(Value::Table(table))
    }
}

impl HierarchicalStore for FlatStore {
    fn root(&self) -> Box<dyn Section<'_> + '_> {
        Box::new(FlatSection {
            store: self,
            prefix: None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Http {
    enabled: bool,
    port: i32,
    timeout: i32,
}

impl Default for Http {
    fn default() -> Self {
        Self {
            enabled: false,
            port: 0,
            timeout: 30,
        }
    }
}

fn flat_resolver() -> PathResolver {
    PathResolver::new(
        FlatStore::default()
            .with("A.B.C", "42")
            .with("Service.Http.enabled", "true")
            .with("Service.Http.port", "8080")
            .with("Legacy.Http.Enabled", "true")
            .with("Legacy.Http.Port", "8080")
            .with("TopLevelKey", "top"),
    )
}

#[test]
fn test_custom_store_values() {
    let resolver = flat_resolver();
    assert_eq!(resolver.try_select_value::<i32>("A.B.C", 0), (true, 42));
    assert_eq!(resolver.try_select_value::<i32>("A.B.D", 7), (false, 7));
    assert_eq!(
        resolver.try_select_value("TopLevelKey", String::from("fallback")),
        (true, String::from("top"))
    );
}

#[test]
fn test_custom_store_decides_case_sensitivity() {
    let resolver = flat_resolver();
    assert_eq!(resolver.try_select_value::<i32>("a.b.c", 0), (false, 0));
}

#[test]
fn test_custom_store_binding() {
    let resolver = flat_resolver();
    assert_eq!(
        resolver.try_populate_object::<Http>("Service.Http"),
        (
            true,
            Http {
                enabled: true,
                port: 8080,
                timeout: 30
            }
        )
    );
    assert_eq!(
        resolver.resolve_object::<Http>("Service.Missing"),
        Err(ResolveError::SectionNotFound("Service.Missing".into()))
    );
}

#[test]
fn test_custom_store_binds_field_names_exactly() {
    let resolver = flat_resolver();
    assert_eq!(
        resolver.try_populate_object::<Http>("Legacy.Http"),
        (true, Http::default())
    );

    let mut http = Http {
        timeout: 5,
        ..Http::default()
    };
    assert!(resolver.bind("Legacy.Http", &mut http));
    assert_eq!(
        http,
        Http {
            enabled: false,
            port: 0,
            timeout: 5
        }
    );
}

#[test]
fn test_layered_store_end_to_end() {
    let mut defaults = NamedTempFile::new().unwrap();
    write!(
        defaults,
        "[service.http]\nenabled = false\nport = 80\n\n[service.grpc]\nport = 50051\n"
    )
    .unwrap();

    let store = StoreBuilder::new()
        .with_file(defaults.path(), true)
        .with_override("service.http.enabled", "true")
        .with_override("service.http.port", "8080")
        .build()
        .unwrap();
    let resolver = PathResolver::new(store);

    assert_eq!(resolver.select_value("service.grpc.port", 0u16), 50051);
    assert_eq!(resolver.select_value("Service.HTTP.Port", 0u16), 8080);
    assert_eq!(
        resolver.populate_object::<Http>("service.http"),
        Http {
            enabled: true,
            port: 8080,
            timeout: 30
        }
    );
    assert_eq!(resolver.populate_object::<Http>("service.none"), Http::default());
}

#[test]
fn test_select_value_returns_default_exactly() {
    let resolver = flat_resolver();
    let fallback = vec![String::from("x"), String::from("y")];
    assert_eq!(resolver.select_value("nowhere", fallback.clone()), fallback);
}
