//! A [`HierarchicalStore`] backed by a merged TOML table.

use std::str::FromStr;

use toml::{Table, Value};

use super::ConfigError;
use crate::store::{HierarchicalStore, Section};

/// A configuration tree held as a TOML table.
///
/// Tables are sections; every other value is a leaf. Array elements are
/// reachable as child sections named by their decimal index. Keys match
/// exactly when possible and otherwise fall back to an ASCII
/// case-insensitive match. Binding matches field names by the same rule.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TomlStore {
    root: Table,
}

impl TomlStore {
    pub fn from_table(root: Table) -> Self {
        Self { root }
    }

    /// Parses a TOML document into a store.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let root = toml::from_str(contents).map_err(ConfigError::InvalidToml)?;
        Ok(Self { root })
    }

    pub fn as_table(&self) -> &Table {
        &self.root
    }

    pub fn into_table(self) -> Table {
        self.root
    }
}

impl FromStr for TomlStore {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_toml_str(s)
    }
}

impl From<Table> for TomlStore {
    fn from(root: Table) -> Self {
        Self::from_table(root)
    }
}

impl HierarchicalStore for TomlStore {
    fn root(&self) -> Box<dyn Section<'_> + '_> {
        Box::new(TomlSection {
            node: Node::Root(&self.root),
        })
    }
}

#[derive(Debug, Clone, Copy)]
enum Node<'a> {
    Root(&'a Table),
    Value(&'a Value),
    Missing,
}

#[derive(Debug)]
struct TomlSection<'a> {
    node: Node<'a>,
}

impl<'a> TomlSection<'a> {
    fn child(&self, key: &str) -> Option<&'a Value> {
        match self.node {
            Node::Root(table) | Node::Value(Value::Table(table)) => lookup(table, key),
            Node::Value(Value::Array(items)) => {
                key.parse::<usize>().ok().and_then(|index| items.get(index))
            }
            _ => None,
        }
    }
}

impl<'a> Section<'a> for TomlSection<'a> {
    fn exists(&self) -> bool {
        !matches!(self.node, Node::Missing)
    }

    fn section(&self, key: &str) -> Box<dyn Section<'a> + 'a> {
        let node = self.child(key).map_or(Node::Missing, Node::Value);
        Box::new(TomlSection { node })
    }

    fn leaf(&self, key: &str) -> Option<Value> {
        match self.child(key)? {
            Value::Table(_) => None,
            value => Some(value.clone()),
        }
    }

    fn tree(&self) -> Option<Value> {
        match self.node {
            Node::Root(table) => Some(Value::Table(table.clone())),
            Node::Value(value) => Some(value.clone()),
            Node::Missing => None,
        }
    }

    fn keys_match(&self, key: &str, name: &str) -> bool {
        keys_match(key, name)
    }
}

fn keys_match(key: &str, name: &str) -> bool {
    key.eq_ignore_ascii_case(name)
}

fn lookup<'a>(table: &'a Table, key: &str) -> Option<&'a Value> {
    table.get(key).or_else(|| {
        table
            .iter()
            .find(|(name, _)| keys_match(name, key))
            .map(|(_, value)| value)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> TomlStore {
        TomlStore::from_toml_str(
            r#"
            name = "dragon"
            ports = [80, 443]

            [server]
            host = "localhost"

            [server.tls]

            [[server.routes]]
            path = "/api"
            "#,
        )
        .unwrap()
    }

    #[test]
    fn test_root_always_exists() {
        let store = TomlStore::default();
        assert!(store.root().exists());
    }

    #[test]
    fn test_root_leaf() {
        let store = store();
        assert_eq!(
            store.root().leaf("name"),
            Some(Value::String("dragon".into()))
        );
    }

    #[test]
    fn test_table_is_section_not_leaf() {
        let store = store();
        let root = store.root();
        assert!(root.leaf("server").is_none());
        assert!(root.section("server").exists());
    }

    #[test]
    fn test_empty_section_exists() {
        let store = store();
        let tls = store.root().section("server").section("tls");
        assert!(tls.exists());
        assert_eq!(tls.tree(), Some(Value::Table(Table::new())));
    }

    #[test]
    fn test_missing_section_chain() {
        let store = store();
        let missing = store.root().section("nope").section("deeper");
        assert!(!missing.exists());
        assert!(missing.leaf("host").is_none());
        assert!(missing.tree().is_none());
    }

    #[test]
    fn test_case_insensitive_fallback() {
        let store = store();
        let server = store.root().section("SERVER");
        assert!(server.exists());
        assert_eq!(
            server.leaf("Host"),
            Some(Value::String("localhost".into()))
        );
    }

    #[test]
    fn test_keys_match_ignores_ascii_case() {
        let store = store();
        let root = store.root();
        assert!(root.keys_match("Port", "port"));
        assert!(root.keys_match("TIMEOUT", "timeout"));
        assert!(!root.keys_match("port", "ports"));
    }

    #[test]
    fn test_array_index_sections() {
        let store = store();
        let root = store.root();
        assert_eq!(root.section("ports").leaf("1"), Some(Value::Integer(443)));
        assert!(root.section("ports").leaf("2").is_none());
        let route = root.section("server").section("routes").section("0");
        assert_eq!(route.leaf("path"), Some(Value::String("/api".into())));
    }

    #[test]
    fn test_parse_and_from_table_agree() {
        let parsed: TomlStore = "a = 1".parse().unwrap();
        let table = parsed.clone().into_table();
        assert_eq!(TomlStore::from(table), parsed);
    }

    #[test]
    fn test_invalid_toml() {
        let result = TomlStore::from_toml_str("key = ");
        assert!(matches!(result, Err(ConfigError::InvalidToml(_))));
    }
}
