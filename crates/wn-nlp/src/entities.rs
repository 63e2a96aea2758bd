//! Pattern-based entity extraction.
//!
//! Custom patterns run first (CIDR, IP, MAC, FQDN, TTL, comment, extensible
//! attributes), then an optional general-purpose [`EntityTagger`]. Every
//! span outside the comment is written into the entity set in order, so
//! the last match for a key wins.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value, json};
use wn_protocol::EntitySet;

static RE_CIDR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:\d{1,3}\.){3}\d{1,3}/\d{1,2}\b").unwrap());

static RE_IPV4: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:\d{1,3}\.){3}\d{1,3}\b").unwrap());

static RE_MAC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:[0-9A-Fa-f]{2}[:-]){5}[0-9A-Fa-f]{2}\b").unwrap());

static RE_FQDN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?\.)+[A-Za-z]{2,63}\b").unwrap()
});

static RE_BARE_INT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\d+\b").unwrap());

static RE_TTL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bttl\s*(?:(?:of|to|=|:)\s*)?(\d+)\b").unwrap()
});

static RE_COMMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?im)\bcomment\s*(?:(?:[:=]|to\b|as\b)\s*)?(?:"([^"]*)"|'([^']*)'|([^\r\n]+))"#,
    )
    .unwrap()
});

static RE_EXTATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)\b(site|owner|department|environment)\s*[=:]\s*(?:"([^"]*)"|'([^']*)'|([^\s,;]+))"#,
    )
    .unwrap()
});

/// General-purpose named-entity tagger plugged in after the custom patterns.
pub trait EntityTagger: Send + Sync {
    /// `(label, span)` pairs found in `text`.
    fn tag(&self, text: &str) -> Vec<(String, String)>;
}

/// Tagger that finds nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTagger;

impl EntityTagger for NoopTagger {
    fn tag(&self, _text: &str) -> Vec<(String, String)> {
        Vec::new()
    }
}

/// Turns query text into an [`EntitySet`].
pub struct EntityExtractor {
    tagger: Box<dyn EntityTagger>,
}

impl Default for EntityExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityExtractor {
    pub fn new() -> Self {
        Self {
            tagger: Box::new(NoopTagger),
        }
    }

    pub fn with_tagger(tagger: Box<dyn EntityTagger>) -> Self {
        Self { tagger }
    }

    pub fn extract(&self, text: &str) -> EntitySet {
        let mut entities = EntitySet::new();

        // Comment text is free-form: addresses, names and digits inside it
        // belong to the comment, not to the target object.
        let comment = RE_COMMENT.captures_iter(text).last();
        let comment_span = comment.as_ref().and_then(|caps| caps.get(0)).map(|m| m.range());
        let in_comment = |range: &Range<usize>| {
            comment_span
                .as_ref()
                .is_some_and(|c| c.start < range.end && range.start < c.end)
        };

        // Spans already claimed; digits inside them are not TTLs.
        let mut claimed: Vec<Range<usize>> = comment_span.iter().cloned().collect();

        for m in RE_CIDR.find_iter(text) {
            if in_comment(&m.range()) {
                continue;
            }
            entities.insert("network", m.as_str());
            claimed.push(m.range());
        }

        for m in RE_IPV4.find_iter(text) {
            if overlaps(&claimed, &m.range()) {
                continue;
            }
            entities.insert("ip", m.as_str());
            claimed.push(m.range());
        }

        for m in RE_MAC.find_iter(text) {
            if in_comment(&m.range()) {
                continue;
            }
            entities.insert("mac", m.as_str().to_lowercase());
            claimed.push(m.range());
        }

        for m in RE_FQDN.find_iter(text) {
            if in_comment(&m.range()) {
                continue;
            }
            entities.insert("fqdn", m.as_str().to_lowercase());
            claimed.push(m.range());
        }

        for m in RE_BARE_INT.find_iter(text) {
            if !overlaps(&claimed, &m.range()) {
                entities.insert("ttl", m.as_str());
            }
        }
        for caps in RE_TTL.captures_iter(text) {
            if caps.get(0).is_some_and(|m| in_comment(&m.range())) {
                continue;
            }
            entities.insert("ttl", &caps[1]);
        }

        if let Some(caps) = comment {
            let value = (1..=3)
                .find_map(|i| caps.get(i))
                .map(|m| m.as_str().trim().to_string());
            if let Some(value) = value.filter(|v| !v.is_empty()) {
                entities.insert("comment", value);
            }
        }

        let extattrs = extract_extattrs(text);
        if !extattrs.is_empty() {
            entities.insert("extattrs", Value::Object(extattrs));
        }

        for (label, span) in self.tagger.tag(text) {
            entities.insert(label, span);
        }

        entities
    }
}

/// `site=nyc owner: ops` → `{"Site": {"value": "nyc"}, "Owner": {"value": "ops"}}`.
fn extract_extattrs(text: &str) -> Map<String, Value> {
    let mut attrs = Map::new();
    for caps in RE_EXTATTR.captures_iter(text) {
        let name = capitalize(&caps[1]);
        let value = (2..=4)
            .find_map(|i| caps.get(i))
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_default();
        attrs.insert(name, json!({ "value": value }));
    }
    attrs
}

fn capitalize(word: &str) -> String {
    let lower = word.to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn overlaps(claimed: &[Range<usize>], range: &Range<usize>) -> bool {
    claimed
        .iter()
        .any(|c| c.start < range.end && range.start < c.end)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(text: &str) -> EntitySet {
        EntityExtractor::new().extract(text)
    }

    #[test]
    fn cidr_goes_to_network_exactly() {
        let e = extract("Create a network with CIDR 10.0.0.0/24");
        assert_eq!(e.get_str("network").as_deref(), Some("10.0.0.0/24"));
        assert!(!e.contains("ip"), "CIDR base address is not a bare IP");
        assert!(!e.contains("ttl"), "prefix length is not a TTL");
    }

    #[test]
    fn bare_ip_and_fqdn() {
        let e = extract("Create host record web01.example.com with IP 192.168.1.50");
        assert_eq!(e.get_str("ip").as_deref(), Some("192.168.1.50"));
        assert_eq!(e.get_str("fqdn").as_deref(), Some("web01.example.com"));
        assert!(!e.contains("ttl"));
    }

    #[test]
    fn last_ip_wins() {
        let e = extract("move 10.0.0.1 to 10.0.0.2");
        assert_eq!(e.get_str("ip").as_deref(), Some("10.0.0.2"));
    }

    #[test]
    fn mac_is_lowercased() {
        let e = extract("fixed address for 00:1A:2B:3C:4D:5E at 10.1.1.1");
        assert_eq!(e.get_str("mac").as_deref(), Some("00:1a:2b:3c:4d:5e"));
        assert_eq!(e.get_str("ip").as_deref(), Some("10.1.1.1"));
        assert!(!e.contains("ttl"));
    }

    #[test]
    fn bare_integer_is_ttl() {
        let e = extract("create A record api.example.com 10.0.0.7 3600");
        assert_eq!(e.get_str("ttl").as_deref(), Some("3600"));
    }

    #[test]
    fn explicit_ttl_overrides_bare_integer() {
        let e = extract("create record 2 for db.example.com ttl 300");
        assert_eq!(e.get_str("ttl").as_deref(), Some("300"));
    }

    #[test]
    fn quoted_comment() {
        let e = extract(r#"Create network 10.1.0.0/16 comment "Lab 42 servers""#);
        assert_eq!(e.get_str("comment").as_deref(), Some("Lab 42 servers"));
        assert!(!e.contains("ttl"), "digits inside the comment are not a TTL");
    }

    #[test]
    fn addresses_inside_comment_do_not_replace_the_target() {
        let e = extract(
            r#"Create host record web.example.com with IP 10.0.0.5 comment "alias of db.example.com at 10.0.0.9""#,
        );
        assert_eq!(e.get_str("fqdn").as_deref(), Some("web.example.com"));
        assert_eq!(e.get_str("ip").as_deref(), Some("10.0.0.5"));
        assert_eq!(
            e.get_str("comment").as_deref(),
            Some("alias of db.example.com at 10.0.0.9")
        );
    }

    #[test]
    fn unquoted_comment_keeps_its_network_and_ttl() {
        let e = extract("update network 10.0.0.0/24 comment moved from 10.9.0.0/16 ttl 60");
        assert_eq!(e.get_str("network").as_deref(), Some("10.0.0.0/24"));
        assert!(!e.contains("ttl"));
        assert_eq!(
            e.get_str("comment").as_deref(),
            Some("moved from 10.9.0.0/16 ttl 60")
        );
    }

    #[test]
    fn comment_to_rest_of_line() {
        let e = extract("update network 10.0.0.0/24 set comment to production core");
        assert_eq!(e.get_str("comment").as_deref(), Some("production core"));
    }

    #[test]
    fn single_quoted_comment() {
        let e = extract("add network 172.16.0.0/12 comment 'branch office'");
        assert_eq!(e.get_str("comment").as_deref(), Some("branch office"));
    }

    #[test]
    fn extattrs_are_nested() {
        let e = extract("create network 10.2.0.0/24 site=NYC owner: netops");
        assert_eq!(
            e.get("extattrs").cloned(),
            Some(json!({"Site": {"value": "NYC"}, "Owner": {"value": "netops"}}))
        );
    }

    #[test]
    fn nothing_to_extract() {
        assert!(extract("list all networks").is_empty());
    }

    struct FixedTagger;

    impl EntityTagger for FixedTagger {
        fn tag(&self, _text: &str) -> Vec<(String, String)> {
            vec![("ORG".into(), "Acme".into()), ("IP".into(), "10.9.9.9".into())]
        }
    }

    #[test]
    fn tagger_labels_are_lowercased_and_win() {
        let e = EntityExtractor::with_tagger(Box::new(FixedTagger)).extract("ping 10.0.0.1");
        assert_eq!(e.get_str("org").as_deref(), Some("Acme"));
        assert_eq!(e.get_str("ip").as_deref(), Some("10.9.9.9"));
    }
}
