//! Binding a section's leaves onto the fields of a structured target.
//!
//! The target's current state is captured as a [`Node`] tree, the section is
//! laid over it key by key, and the result is deserialized back. Fields the
//! section does not mention keep whatever value the target already had, and
//! section keys with no matching field are ignored by the deserializer.

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use toml::Value;

use super::convert::{self, ConvertError, KeyMatch};
use super::node::{self, Node};

#[derive(Debug, Error)]
pub(crate) enum BindError {
    /// The target's current state could not be captured.
    #[error("target cannot be captured: {0}")]
    Capture(#[source] ConvertError),
    /// A leaf could not be converted to the type of its field.
    #[error(transparent)]
    Convert(#[from] ConvertError),
}

/// Returns `target` with the leaves of `section` bound onto it.
///
/// A section that is itself a leaf has nothing to bind and yields `target`
/// unchanged. Section keys are matched to existing keys by `keys`.
pub(crate) fn bind_section<T>(section: Value, target: &T, keys: KeyMatch<'_>) -> Result<T, BindError>
where
    T: Serialize + DeserializeOwned,
{
    let base = node::capture(target).map_err(BindError::Capture)?;
    let bound = overlay(base, Node::from(section), keys);
    Ok(convert::from_node(bound, keys)?)
}

fn overlay(base: Node, section: Node, keys: KeyMatch<'_>) -> Node {
    match (base, section) {
        (Node::Map(mut entries), Node::Map(section)) => {
            merge(&mut entries, section, keys);
            Node::Map(entries)
        }
        (_, section @ (Node::Map(_) | Node::Seq(_))) => section,
        (base, _) => base,
    }
}

/// Deep-merges `overlay` into `base`. A key equal to an existing one wins,
/// then the first existing key `keys` accepts.
fn merge(base: &mut Vec<(Node, Node)>, overlay: Vec<(Node, Node)>, keys: KeyMatch<'_>) {
    for (key, value) in overlay {
        let slot = base.iter().position(|(existing, _)| *existing == key).or_else(|| {
            let key = key.render()?;
            base.iter().position(|(existing, _)| {
                existing
                    .render()
                    .is_some_and(|existing| keys(key.as_str(), existing.as_str()))
            })
        });

        match slot {
            Some(index) => match (&mut base[index].1, value) {
                (Node::Map(entries), Node::Map(section)) => merge(entries, section, keys),
                (entry, value) => *entry = value,
            },
            None => base.push((key, value)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serializer};
    use std::collections::HashMap;

    fn exact(key: &str, name: &str) -> bool {
        key == name
    }

    fn ignore_case(key: &str, name: &str) -> bool {
        key.eq_ignore_ascii_case(name)
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Http {
        enabled: bool,
        port: i32,
        timeout: i32,
        #[serde(skip_serializing_if = "Option::is_none")]
        proxy: Option<String>,
        limits: Limits,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Limits {
        connections: u32,
        burst: u32,
    }

    impl Default for Http {
        fn default() -> Self {
            Self {
                enabled: false,
                port: 0,
                timeout: 30,
                proxy: None,
                limits: Limits {
                    connections: 100,
                    burst: 10,
                },
            }
        }
    }

    fn section(contents: &str) -> Value {
        Value::Table(toml::from_str(contents).unwrap())
    }

    #[test]
    fn test_unmatched_fields_keep_defaults() {
        let bound = bind_section(
            section("Enabled = \"true\"\nPort = \"8080\""),
            &Http::default(),
            &ignore_case,
        )
        .unwrap();

        assert!(bound.enabled);
        assert_eq!(bound.port, 8080);
        assert_eq!(bound.timeout, 30);
        assert_eq!(bound.proxy, None);
    }

    #[test]
    fn test_exact_keys_skip_other_case() {
        let bound = bind_section(
            section("Enabled = \"true\"\nport = \"8080\""),
            &Http::default(),
            &exact,
        )
        .unwrap();

        assert!(!bound.enabled);
        assert_eq!(bound.port, 8080);
    }

    #[test]
    fn test_optional_field_from_leaf() {
        let bound = bind_section(
            section("proxy = \"socks5://local\""),
            &Http::default(),
            &exact,
        )
        .unwrap();
        assert_eq!(bound.proxy.as_deref(), Some("socks5://local"));
    }

    #[test]
    fn test_nested_section_merges() {
        let bound = bind_section(
            section("[Limits]\nconnections = \"5\""),
            &Http::default(),
            &ignore_case,
        )
        .unwrap();

        assert_eq!(bound.limits.connections, 5);
        assert_eq!(bound.limits.burst, 10);
    }

    #[test]
    fn test_unknown_leaves_ignored() {
        let bound = bind_section(section("color = \"blue\""), &Http::default(), &exact).unwrap();
        assert_eq!(bound, Http::default());
    }

    #[test]
    fn test_scalar_section_binds_nothing() {
        let bound =
            bind_section(Value::String("plain".into()), &Http::default(), &exact).unwrap();
        assert_eq!(bound, Http::default());
    }

    #[test]
    fn test_unconvertible_leaf_fails() {
        let result = bind_section(section("port = \"eighty\""), &Http::default(), &exact);
        assert!(matches!(result, Err(BindError::Convert(_))));
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Limited {
        port: i32,
        limit: u64,
    }

    #[test]
    fn test_default_above_i64_range_survives() {
        let target = Limited {
            port: 0,
            limit: u64::MAX,
        };
        let bound = bind_section(section("port = \"8080\""), &target, &exact).unwrap();
        assert_eq!(
            bound,
            Limited {
                port: 8080,
                limit: u64::MAX
            }
        );
    }

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    struct Tagged {
        port: i32,
        tags: HashMap<u32, String>,
    }

    #[test]
    fn test_integer_keyed_map_field() {
        let target = Tagged {
            port: 0,
            tags: HashMap::from([(1, "primary".to_owned())]),
        };
        let bound = bind_section(
            section("port = \"8080\"\n[tags]\n2 = \"replica\""),
            &target,
            &exact,
        )
        .unwrap();

        assert_eq!(bound.port, 8080);
        assert_eq!(bound.tags.get(&1).map(String::as_str), Some("primary"));
        assert_eq!(bound.tags.get(&2).map(String::as_str), Some("replica"));
    }

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    struct Marked {
        port: i32,
        marker: (),
    }

    #[test]
    fn test_unit_field() {
        let bound = bind_section(section("port = \"8080\""), &Marked::default(), &exact).unwrap();
        assert_eq!(bound.port, 8080);
    }

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    struct Proxied {
        port: i32,
        proxy: Option<String>,
    }

    #[test]
    fn test_unset_option_field() {
        let bound = bind_section(section("port = \"8080\""), &Proxied::default(), &exact).unwrap();
        assert_eq!(
            bound,
            Proxied {
                port: 8080,
                proxy: None
            }
        );
    }

    #[derive(Debug, Deserialize)]
    struct Locked;

    impl Serialize for Locked {
        fn serialize<S: Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
            Err(serde::ser::Error::custom("state is locked"))
        }
    }

    #[test]
    fn test_uncapturable_target() {
        let result = bind_section(section("port = \"8080\""), &Locked, &exact);
        assert!(matches!(result, Err(BindError::Capture(_))));
    }
}
