use crate::condition::format_number;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A recorded response for one node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
    Number(f64),
    Text(String),
}

impl Answer {
    /// The answer as the raw text value conditions see.
    pub fn as_text(&self) -> String {
        match self {
            Answer::Number(n) => format_number(*n),
            Answer::Text(t) => t.clone(),
        }
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_text())
    }
}

/// Answers keyed by node id, in the order the nodes were first answered.
///
/// Recording an answer for a node that already has one replaces the value in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Answers {
    entries: Vec<(String, Answer)>,
}

impl Answers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, node_id: &str, answer: Answer) {
        match self.entries.iter_mut().find(|(id, _)| id == node_id) {
            Some((_, existing)) => *existing = answer,
            None => self.entries.push((node_id.to_string(), answer)),
        }
    }

    pub fn get(&self, node_id: &str) -> Option<&Answer> {
        self.entries
            .iter()
            .find(|(id, _)| id == node_id)
            .map(|(_, answer)| answer)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Answer)> {
        self.entries.iter().map(|(id, answer)| (id.as_str(), answer))
    }

    pub fn node_ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(id, _)| id.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Serialize for Answers {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (id, answer) in &self.entries {
            map.serialize_entry(id, answer)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Answers {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct AnswersVisitor;

        impl<'de> Visitor<'de> for AnswersVisitor {
            type Value = Answers;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of node ids to answers")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Answers, A::Error> {
                let mut answers = Answers::new();
                while let Some((id, answer)) = access.next_entry::<String, Answer>()? {
                    answers.record(&id, answer);
                }
                Ok(answers)
            }
        }

        deserializer.deserialize_map(AnswersVisitor)
    }
}
