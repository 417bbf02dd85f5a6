use std::str::FromStr;
use thiserror::Error;

/// A named destination a post can be filed under, mapping to a forum
/// thread id in the channel chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topic {
    pub thread_id: i64,
    pub label: String,
}

/// The fixed topic list. Selection is by exact label match only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicSet {
    topics: Vec<Topic>,
}

#[derive(Debug, Error)]
#[error("invalid topic spec {0:?}, expected comma-separated `thread_id:label` pairs")]
pub struct ParseTopicSetError(pub String);

impl TopicSet {
    pub fn new(topics: Vec<Topic>) -> Self {
        Self { topics }
    }

    pub fn by_label(&self, label: &str) -> Option<&Topic> {
        self.topics.iter().find(|t| t.label == label)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Topic> {
        self.topics.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }
}

impl Default for TopicSet {
    fn default() -> Self {
        Self::new(vec![
            Topic { thread_id: 170, label: "Discussion 1".into() },
            Topic { thread_id: 171, label: "Discussion 2".into() },
            Topic { thread_id: 172, label: "Discussion 3".into() },
        ])
    }
}

/// Parses `"170:Discussion 1,171:Discussion 2"`. Labels may contain spaces
/// but not commas or colons.
impl FromStr for TopicSet {
    type Err = ParseTopicSetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut topics = Vec::new();
        for pair in s.split(',') {
            let pair = pair.trim();
            if pair.is_empty() {
                continue;
            }
            let (id, label) = pair
                .split_once(':')
                .ok_or_else(|| ParseTopicSetError(s.to_string()))?;
            let thread_id = id
                .trim()
                .parse::<i64>()
                .map_err(|_| ParseTopicSetError(s.to_string()))?;
            let label = label.trim();
            if label.is_empty() {
                return Err(ParseTopicSetError(s.to_string()));
            }
            topics.push(Topic { thread_id, label: label.to_string() });
        }
        if topics.is_empty() {
            return Err(ParseTopicSetError(s.to_string()));
        }
        Ok(Self::new(topics))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_label_match_only() {
        let topics = TopicSet::default();
        assert!(topics.by_label("Discussion 1").is_some());
        assert!(topics.by_label("discussion 1").is_none());
        assert!(topics.by_label("Discussion").is_none());
    }

    #[test]
    fn parses_topic_spec() {
        let topics: TopicSet = "7:News, 9:Prayer Requests".parse().unwrap();
        assert_eq!(topics.by_label("Prayer Requests").unwrap().thread_id, 9);
        assert_eq!(topics.iter().count(), 2);
    }

    #[test]
    fn rejects_bad_specs() {
        assert!("".parse::<TopicSet>().is_err());
        assert!("News".parse::<TopicSet>().is_err());
        assert!("x:News".parse::<TopicSet>().is_err());
        assert!("7:".parse::<TopicSet>().is_err());
    }
}
