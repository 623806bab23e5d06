use serde::{Deserialize, Serialize};

/// Raw HTML returned by the edit endpoint, carried verbatim as the modal
/// body. The controller never interprets it beyond locating the form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fragment(pub String);

impl Fragment {
    pub fn new(html: impl Into<String>) -> Self {
        Self(html.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormMethod {
    Get,
    Post,
}

impl FormMethod {
    /// Case-insensitive parse of a `method` attribute value. An absent or
    /// empty attribute falls back to `Get`, matching HTML form semantics.
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.is_empty() || raw.eq_ignore_ascii_case("get") {
            Some(Self::Get)
        } else if raw.eq_ignore_ascii_case("post") {
            Some(Self::Post)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormField {
    pub name: String,
    pub value: String,
}

impl FormField {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Typed projection of the edit form found inside a fragment: the action
/// URL (possibly relative), the submit method, and the fields in document
/// order. One form definition serves both save and delete; delete only
/// swaps the destination URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordForm {
    pub action: String,
    pub method: FormMethod,
    pub fields: Vec<FormField>,
}

impl WordForm {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|field| field.name == name)
            .map(|field| field.value.as_str())
    }

    /// Field set as name/value pairs, in document order, ready for
    /// transmission as a urlencoded body or query string.
    pub fn serialized_fields(&self) -> Vec<(String, String)> {
        self.fields
            .iter()
            .map(|field| (field.name.clone(), field.value.clone()))
            .collect()
    }
}

#[cfg(test)]
#[path = "tests/domain_tests.rs"]
mod tests;
