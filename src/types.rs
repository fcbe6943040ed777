use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// Canonical shared rate metadata type used across HTTP and tools layers.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
pub struct RateMeta {
    pub remaining: Option<i32>,
    pub used: Option<i32>,
    pub reset_at: Option<String>,
}

// GitHub discussion models. Every known field is optional and unknown fields are
// kept in `extra`, so re-serializing an upstream payload does not drop data.

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct User {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub login: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html_url: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct DiscussionCategory {
    // GitHub has served both numeric and string ids here.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emoji: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_answerable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct Discussion {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locked: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<DiscussionCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer_html_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer_chosen_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct DiscussionComment {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_association: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// Request bodies

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct DiscussionRequest {
    pub title: String,
    pub body: String,
    pub category_id: String,
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct DiscussionCommentRequest {
    pub body: String,
}

// Query options

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ListOptions {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl ListOptions {
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut q = Vec::new();
        if let Some(p) = self.page {
            q.push(("page", p.to_string()));
        }
        if let Some(pp) = self.per_page {
            q.push(("per_page", pp.to_string()));
        }
        q
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DiscussionListOptions {
    pub direction: Option<String>,
    pub category: Option<String>,
    pub pinned: Option<bool>,
    pub list: ListOptions,
}

impl DiscussionListOptions {
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut q = Vec::new();
        if let Some(d) = &self.direction {
            q.push(("direction", d.clone()));
        }
        if let Some(c) = &self.category {
            q.push(("category", c.clone()));
        }
        if let Some(p) = self.pinned {
            q.push(("pinned", p.to_string()));
        }
        q.extend(self.list.query_pairs());
        q
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discussion_keeps_unknown_fields() {
        let raw = serde_json::json!({
            "number": 7,
            "title": "Hello",
            "reactions": {"+1": 2},
            "category": {"id": 3, "name": "Ideas", "is_answerable": false}
        });
        let d: Discussion = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(d.number, Some(7));
        assert!(d.extra.contains_key("reactions"));
        assert_eq!(serde_json::to_value(&d).unwrap(), raw);
    }

    #[test]
    fn list_query_order_and_omission() {
        let opts = DiscussionListOptions {
            direction: Some("desc".into()),
            category: None,
            pinned: Some(false),
            list: ListOptions {
                page: Some(2),
                per_page: Some(10),
            },
        };
        assert_eq!(
            opts.query_pairs(),
            vec![
                ("direction", "desc".to_string()),
                ("pinned", "false".to_string()),
                ("page", "2".to_string()),
                ("per_page", "10".to_string()),
            ]
        );
        assert!(ListOptions::default().query_pairs().is_empty());
    }
}
