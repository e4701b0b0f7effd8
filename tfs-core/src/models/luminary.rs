use serde::{Deserialize, Serialize};

use crate::resource::{Resource, ResourceKind};

/// A faculty or leadership team member.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Luminary {
    pub id: String,
    pub name: String,
    pub title: String,
    pub bio: String,
    pub image: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
    pub achievements: Vec<String>,
    pub expertise: Vec<String>,
    pub quote: String,
    pub is_leadership: bool,
}

impl Resource for Luminary {
    const KIND: ResourceKind = ResourceKind::Luminaries;

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn label(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Default, PartialEq)]
pub struct Roster<'a> {
    pub faculty: Vec<&'a Luminary>,
    pub leadership: Vec<&'a Luminary>,
}

/// Splits the collection into faculty and leadership, keeping order.
pub fn split_roster(luminaries: &[Luminary]) -> Roster<'_> {
    let (leadership, faculty) = luminaries.iter().partition(|l| l.is_leadership);
    Roster {
        faculty,
        leadership,
    }
}
