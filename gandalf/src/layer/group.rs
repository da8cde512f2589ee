use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// What is detached when a member of an exclusivity group is shown.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupScope {
    /// Only the other members of the group.
    #[default]
    Members,
    /// Every other layer of the registry.
    Registry,
}

/// Set of layers of which at most one is attached at a time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExclusivityGroup {
    name: String,
    members: Vec<String>,
    #[serde(default)]
    scope: GroupScope,
    /// Legend image urls of the members, shown while the member is the visible one.
    #[serde(default)]
    legends: BTreeMap<String, String>,
}

impl ExclusivityGroup {
    /// Creates a group with [`GroupScope::Members`] scope. Duplicate member names are dropped.
    pub fn new<S: Into<String>>(name: impl Into<String>, members: impl IntoIterator<Item = S>) -> Self {
        let mut group = Self {
            name: name.into(),
            members: vec![],
            scope: GroupScope::Members,
            legends: BTreeMap::new(),
        };

        for member in members {
            let member = member.into();
            if !group.contains(&member) {
                group.members.push(member);
            }
        }

        group
    }

    /// Sets the scope of the group.
    pub fn with_scope(mut self, scope: GroupScope) -> Self {
        self.scope = scope;
        self
    }

    /// Sets the legend image shown while `member` is the visible member of the group.
    pub fn with_legend(mut self, member: impl Into<String>, url: impl Into<String>) -> Self {
        self.legends.insert(member.into(), url.into());
        self
    }

    /// Name of the group.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Member layer names.
    pub fn members(&self) -> &[String] {
        &self.members
    }

    /// Scope of the group.
    pub fn scope(&self) -> GroupScope {
        self.scope
    }

    /// Legend image url of the member.
    pub fn legend(&self, member: &str) -> Option<&str> {
        self.legends.get(member).map(String::as_str)
    }

    /// Returns true if the layer is a member of the group.
    pub fn contains(&self, layer: &str) -> bool {
        self.members.iter().any(|member| member == layer)
    }
}
