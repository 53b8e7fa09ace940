use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Identifier as it arrives from the data store: a string or a number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Text(String),
    Number(serde_json::Number),
}

impl RecordId {
    /// Normalized person key. Numbers and their decimal string spelling map to
    /// the same key, whole floats map to the integer key; blank strings yield
    /// `None`.
    pub fn key(&self) -> Option<String> {
        match self {
            RecordId::Text(text) => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            }
            RecordId::Number(number) => Some(number_key(number)),
        }
    }
}

/// `1` and `1.0` name the same person.
fn number_key(number: &serde_json::Number) -> String {
    if number.is_f64()
        && let Some(value) = number.as_f64()
        && value.fract() == 0.0
        && value.abs() < 9_007_199_254_740_992.0
    {
        return format!("{}", value as i64);
    }
    number.to_string()
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        RecordId::Text(value.to_string())
    }
}

impl From<i64> for RecordId {
    fn from(value: i64) -> Self {
        RecordId::Number(value.into())
    }
}

/// Display attributes of one person. Text fields tolerate stores that hand out
/// numbers (`"date_of_birth": 1950`); other non-text values read as absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonData {
    #[serde(
        default,
        alias = "fullName",
        alias = "name",
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub full_name: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub gender: Option<String>,
    #[serde(
        default,
        alias = "dateOfBirth",
        alias = "birthDate",
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub date_of_birth: Option<String>,
    #[serde(
        default,
        alias = "dateOfDeath",
        alias = "deathDate",
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub date_of_death: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(text) => Some(text),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    })
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    #[serde(default)]
    pub id: Option<RecordId>,
    #[serde(default)]
    pub data: PersonData,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EdgeRecord {
    #[serde(default)]
    pub source: Option<RecordId>,
    #[serde(default)]
    pub target: Option<RecordId>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default, alias = "maritalStatus", skip_serializing_if = "Option::is_none")]
    pub marital_status: Option<String>,
}

/// One snapshot of the person/relationship graph handed over by the store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    #[serde(default)]
    pub nodes: Vec<NodeRecord>,
    #[serde(default)]
    pub edges: Vec<EdgeRecord>,
}

impl GraphSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn person(&mut self, id: impl Into<RecordId>, name: &str, gender: Option<&str>) -> &mut Self {
        self.nodes.push(NodeRecord {
            id: Some(id.into()),
            data: PersonData {
                full_name: Some(name.to_string()),
                gender: gender.map(str::to_string),
                ..Default::default()
            },
        });
        self
    }

    pub fn parent(&mut self, parent: impl Into<RecordId>, child: impl Into<RecordId>) -> &mut Self {
        self.edges.push(EdgeRecord {
            source: Some(parent.into()),
            target: Some(child.into()),
            kind: Some("parent".to_string()),
            marital_status: None,
        });
        self
    }

    pub fn spouse(
        &mut self,
        a: impl Into<RecordId>,
        b: impl Into<RecordId>,
        status: MaritalStatus,
    ) -> &mut Self {
        self.edges.push(EdgeRecord {
            source: Some(a.into()),
            target: Some(b.into()),
            kind: Some("spouse".to_string()),
            marital_status: Some(status.as_str().to_string()),
        });
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Female,
    Male,
    Other,
    Unknown,
}

impl Gender {
    pub fn from_token(token: Option<&str>) -> Self {
        let Some(token) = token else {
            return Self::Unknown;
        };
        match token.trim().to_ascii_lowercase().as_str() {
            "" => Self::Unknown,
            "female" | "f" | "woman" => Self::Female,
            "male" | "m" | "man" => Self::Male,
            "unknown" | "u" => Self::Unknown,
            _ => Self::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaritalStatus {
    #[default]
    Married,
    Divorced,
    Widowed,
}

impl MaritalStatus {
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "married" => Some(Self::Married),
            "divorced" => Some(Self::Divorced),
            "widowed" => Some(Self::Widowed),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Married => "married",
            Self::Divorced => "divorced",
            Self::Widowed => "widowed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationKind {
    Parent,
    Spouse,
}

impl RelationKind {
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "parent" => Some(Self::Parent),
            "spouse" => Some(Self::Spouse),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Person {
    pub id: String,
    pub name: String,
    pub gender: Gender,
    pub birth_date: Option<String>,
    pub death_date: Option<String>,
    /// Everything else from the record, passed through for renderers.
    pub payload: serde_json::Map<String, serde_json::Value>,
}

impl Person {
    pub fn from_record(id: String, data: &PersonData) -> Self {
        let name = data
            .full_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| id.clone());
        Self {
            name,
            gender: Gender::from_token(data.gender.as_deref()),
            birth_date: non_blank(data.date_of_birth.as_deref()),
            death_date: non_blank(data.date_of_death.as_deref()),
            payload: data.extra.clone(),
            id,
        }
    }

    pub fn is_female(&self) -> bool {
        self.gender == Gender::Female
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
