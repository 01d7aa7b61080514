//! In-memory shape of the published feed.

use crate::config::ChannelConfig;
use crate::posting::JobPosting;
use chrono::{DateTime, FixedOffset};
use serde::Serialize;

/// Feed-level metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
pub struct Channel {
    pub title: String,
    pub link: String,
    pub description: String,
    pub language: String,
    pub self_link: Option<String>,
    pub last_build_date: Option<DateTime<FixedOffset>>,
}

impl Channel {
    /// Names of required fields that are empty.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.title.trim().is_empty() {
            missing.push("title");
        }
        if self.link.trim().is_empty() {
            missing.push("link");
        }
        if self.description.trim().is_empty() {
            missing.push("description");
        }
        missing
    }
}

impl From<&ChannelConfig> for Channel {
    fn from(c: &ChannelConfig) -> Self {
        Self {
            title: c.title.clone(),
            link: c.link.clone(),
            description: c.description.clone(),
            language: c.language.clone(),
            self_link: c.self_link.clone(),
            last_build_date: None,
        }
    }
}

/// One published item. Written once, never edited afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedEntry {
    pub title: String,
    pub link: String,
    pub description: String,
    pub guid: String,
    /// RFC 2822 timestamp, kept verbatim from the feed file.
    pub pub_date: String,
    /// Raw grade label; published as `<category>`. Empty for older entries.
    pub grade_label: String,
}

impl FeedEntry {
    pub fn published_at(&self) -> Option<DateTime<FixedOffset>> {
        DateTime::parse_from_rfc2822(&self.pub_date).ok()
    }
}

impl From<&JobPosting> for FeedEntry {
    fn from(p: &JobPosting) -> Self {
        Self {
            title: p.title.clone(),
            link: p.link.clone(),
            description: p.description.clone(),
            guid: p.guid.clone(),
            pub_date: p.pub_date.to_rfc2822(),
            grade_label: p.grade_label.clone(),
        }
    }
}

/// The whole feed: channel metadata plus entries, newest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
pub struct FeedDocument {
    pub channel: Channel,
    pub entries: Vec<FeedEntry>,
}

impl FeedDocument {
    pub fn new(channel: Channel) -> Self {
        Self {
            channel,
            entries: Vec::new(),
        }
    }

    pub fn contains(&self, guid: &str) -> bool {
        self.entries.iter().any(|e| e.guid == guid)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Replace channel metadata with the configured values, keeping the
    /// last-build date.
    pub fn apply_channel(&mut self, config: &ChannelConfig) {
        let last_build_date = self.channel.last_build_date;
        self.channel = Channel {
            last_build_date,
            ..Channel::from(config)
        };
    }
}
