//! Data models for HATEOAS resources and the CAS domain

pub mod calendar;
pub mod payments;
pub(crate) mod timestamp;
pub mod users;

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

/// A hypermedia link as serialized under `_links`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub href: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rel: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub templated: Option<bool>,
}

impl Link {
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            rel: None,
            media_type: None,
            templated: None,
        }
    }

    /// Whether `href` is an absolute URL or a root-relative path.
    pub fn is_valid_href(&self) -> bool {
        let href = self.href.trim();
        if href.is_empty() {
            return false;
        }
        if href.starts_with('/') {
            return !href.starts_with("//");
        }
        url::Url::parse(href).is_ok_and(|u| u.has_host())
    }

    /// The href ready to be requested.
    ///
    /// Templated links carry an RFC 6570 suffix such as `{?desde,hasta}`;
    /// it is cut off. Invalid hrefs yield `None`.
    pub fn resolved_href(&self) -> Option<String> {
        if !self.is_valid_href() {
            return None;
        }
        let href = self.href.trim();
        let href = if self.templated.unwrap_or(false) {
            href.find('{').map_or(href, |idx| &href[..idx])
        } else {
            href
        };
        Some(href.to_string())
    }
}

/// One relation under `_links`: a single link or an ordered list of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LinkRelation {
    One(Link),
    Many(Vec<Link>),
}

impl LinkRelation {
    /// The link to follow: the single link, or the first of a list.
    pub fn primary(&self) -> Option<&Link> {
        match self {
            Self::One(link) => Some(link),
            Self::Many(links) => links.first(),
        }
    }

    /// Resolved href of the primary link.
    pub fn href(&self) -> Option<String> {
        self.primary().and_then(Link::resolved_href)
    }
}

/// Relation name to link(s).
pub type LinkMap = HashMap<String, LinkRelation>;

/// Anything that exposes `_links`.
pub trait Linked {
    fn links(&self) -> &LinkMap;

    /// Resolved href of relation `rel`, if present and valid.
    fn link_href(&self, rel: &str) -> Option<String> {
        self.links().get(rel).and_then(LinkRelation::href)
    }
}

/// Implements [`Linked`] for types with a `links: LinkMap` field.
macro_rules! impl_linked {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::models::Linked for $ty {
                fn links(&self) -> &$crate::models::LinkMap {
                    &self.links
                }
            }
        )+
    };
}
pub(crate) use impl_linked;

/// A HAL collection.
///
/// The backend has two shapes for lists: a Spring HATEOAS `_embedded` map
/// keyed by an implementation-chosen name (e.g. `eventoCalendarioModelList`)
/// and a paged `content` array. Both are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Collection<T> {
    #[serde(rename = "_links", default, skip_serializing_if = "HashMap::is_empty")]
    pub links: LinkMap,
    #[serde(rename = "_embedded", default, skip_serializing_if = "Option::is_none")]
    pub embedded: Option<BTreeMap<String, Vec<T>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Vec<T>>,
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self {
            links: LinkMap::new(),
            embedded: None,
            content: None,
        }
    }
}

impl<T> Collection<T> {
    /// Collection holding `items` under `key` in `_embedded`.
    pub fn embedded(key: impl Into<String>, items: Vec<T>) -> Self {
        let mut embedded = BTreeMap::new();
        embedded.insert(key.into(), items);
        Self {
            embedded: Some(embedded),
            ..Self::default()
        }
    }

    /// Items of the first embedded key, ignoring `content`.
    pub fn embedded_items(&self) -> &[T] {
        self.embedded
            .as_ref()
            .and_then(|map| map.values().next())
            .map_or(&[][..], Vec::as_slice)
    }

    /// Items of the collection, preferring `content` over `_embedded`.
    pub fn items(&self) -> &[T] {
        match &self.content {
            Some(content) => content.as_slice(),
            None => self.embedded_items(),
        }
    }
}

impl<T> Linked for Collection<T> {
    fn links(&self) -> &LinkMap {
        &self.links
    }
}

/// Response of `GET /api`, the discovery entry point.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiRoot {
    #[serde(rename = "mensaje", default)]
    pub message: String,
    #[serde(rename = "emailUsuario", default, skip_serializing_if = "Option::is_none")]
    pub user_email: Option<String>,
    #[serde(rename = "nombreUsuario", default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roles: Option<Vec<String>>,
    #[serde(rename = "perfilCompleto", default, skip_serializing_if = "Option::is_none")]
    pub profile_complete: Option<bool>,
    #[serde(rename = "_links", default, skip_serializing_if = "HashMap::is_empty")]
    pub links: LinkMap,
}

impl_linked!(ApiRoot);

/// Body of `/actuator/health`.
#[derive(Debug, Clone, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}
