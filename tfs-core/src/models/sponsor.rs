use serde::{Deserialize, Serialize};

use crate::resource::{Resource, ResourceKind};

const LOGO_BASE: &str = "https://cdn.builder.io/api/v1/image/assets%2Fb448f3665916406e992f77bf5e7d711e%2F";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Sponsor {
    pub id: String,
    pub name: String,
    pub logo: String,
    pub industry: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    pub is_active: bool,
}

impl Sponsor {
    fn founding(id: &str, name: &str, logo: &str, industry: &str, description: &str, website: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            logo: format!("{}{}", LOGO_BASE, logo),
            industry: industry.to_string(),
            description: description.to_string(),
            website: Some(website.to_string()),
            is_active: false,
        }
    }

    pub fn active(sponsors: &[Sponsor]) -> Vec<&Sponsor> {
        sponsors.iter().filter(|s| s.is_active).collect()
    }
}

impl Resource for Sponsor {
    const KIND: ResourceKind = ResourceKind::Sponsors;

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn label(&self) -> &str {
        &self.name
    }

    fn defaults() -> Vec<Self> {
        vec![
            Sponsor::founding(
                "citizen-cooperative-bank",
                "Citizen Cooperative Bank",
                "ec784fa823e24e5b9b1285f4ba0a99fb",
                "Banking",
                "Cooperative banking institution dedicated to financial inclusion and community development.",
                "https://citizenbankdelhi.com",
            ),
            Sponsor::founding(
                "saint-gobain",
                "Saint Gobain (through Mahantesh Associates)",
                "5b52ce39d6834f09a442954d4ab0e362",
                "Manufacturing",
                "Global leader in sustainable construction materials, partnering through Mahantesh Associates to enhance industry exposure.",
                "https://saint-gobain.com",
            ),
            Sponsor::founding(
                "zest-global-education",
                "Zest Global Education",
                "8d448a7548c345c0b5060392a99881c7",
                "Education",
                "International education consultancy providing global opportunities and career guidance to students.",
                "https://zestglobaleducation.com",
            ),
            Sponsor::founding(
                "iqas",
                "IQAS",
                "6d57193e366e4d44b95dae677d4162dc",
                "Quality Assurance",
                "Quality assurance and certification services provider supporting academic excellence standards.",
                "https://iqas.co.in",
            ),
        ]
    }
}
