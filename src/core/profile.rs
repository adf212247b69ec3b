use serde::{Deserialize, Serialize};

/// Descriptive company data. Every field is best-effort.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyProfile {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub market_cap: Option<u64>,
    #[serde(default)]
    pub sector: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub homepage_url: Option<String>,
    #[serde(default)]
    pub logo_url: Option<String>,
}

impl CompanyProfile {
    /// Synthetic profile with every field populated.
    pub fn placeholder(ticker: &str) -> Self {
        CompanyProfile {
            name: Some(ticker.to_string()),
            description: Some(String::new()),
            market_cap: Some(0),
            sector: Some("N/A".to_string()),
            industry: Some("N/A".to_string()),
            homepage_url: Some(String::new()),
            logo_url: Some(String::new()),
        }
    }

    /// Fills every missing field from `other`, keeping fields already present.
    pub fn or(self, other: CompanyProfile) -> Self {
        CompanyProfile {
            name: self.name.or(other.name),
            description: self.description.or(other.description),
            market_cap: self.market_cap.or(other.market_cap),
            sector: self.sector.or(other.sector),
            industry: self.industry.or(other.industry),
            homepage_url: self.homepage_url.or(other.homepage_url),
            logo_url: self.logo_url.or(other.logo_url),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.name.is_some()
            && self.description.is_some()
            && self.market_cap.is_some()
            && self.sector.is_some()
            && self.industry.is_some()
            && self.homepage_url.is_some()
            && self.logo_url.is_some()
    }
}
