use serde::{Deserialize, Serialize};

/// A capability name such as `blog:write`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Permission {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A named bundle of permissions that roles can attach.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PermissionGroup {
    /// Unique identifier (e.g. "blog_admin").
    pub id: String,

    /// Human-readable name.
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Permission names in this group, sorted.
    pub permissions: Vec<String>,
}

/// A role: direct permissions plus any number of permission groups.
///
/// Example:
///   id = "content_creator"
///   permissions = []
///   groups = ["content_creator"]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Role {
    /// Unique identifier (e.g. "blog_writer", "super_admin").
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Permissions granted directly, sorted.
    pub permissions: Vec<String>,

    /// Attached permission group ids, sorted.
    pub groups: Vec<String>,
}

/// Input for creating a role.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateRole {
    pub id: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub permissions: Vec<String>,
    #[serde(default)]
    pub groups: Vec<String>,
}
