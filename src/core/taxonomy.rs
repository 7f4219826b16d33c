use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::OnceLock;
use thiserror::Error;

/// Errors raised while loading a taxonomy document
#[derive(Debug, Error)]
pub enum TaxonomyError {
    #[error("Failed to read taxonomy file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid taxonomy document: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Attribute family a raw value belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Region,
    Stage,
    Vertical,
}

/// Region labels that match any startup region
pub const WILDCARD_REGIONS: [&str; 2] = ["Global", "Other"];

/// One canonical-label table with case-insensitive alias lookup
#[derive(Debug, Clone, Default)]
pub struct TaxonomyTable {
    labels: Vec<String>,
    aliases: HashMap<String, usize>,
}

impl TaxonomyTable {
    /// Build a table from (canonical, aliases) entries
    ///
    /// The canonical label always resolves to itself. When two entries claim
    /// the same alias, the entry declared first keeps it.
    pub fn new<I, L, A, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (L, A)>,
        L: Into<String>,
        A: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut table = TaxonomyTable::default();

        for (label, aliases) in entries {
            let label = label.into();
            let index = table.labels.len();
            table.aliases.entry(alias_key(&label)).or_insert(index);
            for alias in aliases {
                let key = alias_key(alias.as_ref());
                if !key.is_empty() {
                    table.aliases.entry(key).or_insert(index);
                }
            }
            table.labels.push(label);
        }

        table
    }

    /// Map a raw value to its canonical label, or return it trimmed
    pub fn normalize(&self, raw: &str) -> String {
        let trimmed = raw.trim();
        match self.aliases.get(&alias_key(trimmed)) {
            Some(&index) => self.labels[index].clone(),
            None => trimmed.to_string(),
        }
    }

    /// Normalize a list, dropping blanks and duplicate canonical labels
    pub fn normalize_all<S: AsRef<str>>(&self, raw: &[S]) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut out = Vec::with_capacity(raw.len());

        for value in raw {
            let label = self.normalize(value.as_ref());
            if label.is_empty() {
                continue;
            }
            if seen.insert(label.to_lowercase()) {
                out.push(label);
            }
        }

        out
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }
}

#[inline]
fn alias_key(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Region, stage and vertical tables used for every scoring pass
#[derive(Debug, Clone, Default)]
pub struct Taxonomy {
    pub region: TaxonomyTable,
    pub stage: TaxonomyTable,
    pub vertical: TaxonomyTable,
}

#[derive(Debug, Deserialize)]
struct TaxonomyDocument {
    #[serde(default)]
    region: Vec<TaxonomyEntry>,
    #[serde(default)]
    stage: Vec<TaxonomyEntry>,
    #[serde(default)]
    vertical: Vec<TaxonomyEntry>,
}

#[derive(Debug, Deserialize)]
struct TaxonomyEntry {
    label: String,
    #[serde(default)]
    aliases: Vec<String>,
}

impl Taxonomy {
    /// Built-in tables, constructed on first use and shared process-wide
    pub fn standard() -> &'static Taxonomy {
        static STANDARD: OnceLock<Taxonomy> = OnceLock::new();
        STANDARD.get_or_init(build_standard)
    }

    /// Load tables from a TOML document
    ///
    /// ```toml
    /// [[vertical]]
    /// label = "Fintech"
    /// aliases = ["fin tech", "payments"]
    /// ```
    pub fn from_toml_str(raw: &str) -> Result<Self, TaxonomyError> {
        let document: TaxonomyDocument = toml::from_str(raw)?;
        let table = |entries: Vec<TaxonomyEntry>| {
            TaxonomyTable::new(entries.into_iter().map(|e| (e.label, e.aliases)))
        };

        Ok(Self {
            region: table(document.region),
            stage: table(document.stage),
            vertical: table(document.vertical),
        })
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, TaxonomyError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    pub fn table(&self, category: Category) -> &TaxonomyTable {
        match category {
            Category::Region => &self.region,
            Category::Stage => &self.stage,
            Category::Vertical => &self.vertical,
        }
    }

    /// Total: always returns a string, never drops data
    pub fn normalize(&self, category: Category, raw: &str) -> String {
        self.table(category).normalize(raw)
    }

    pub fn normalize_all<S: AsRef<str>>(&self, category: Category, raw: &[S]) -> Vec<String> {
        self.table(category).normalize_all(raw)
    }
}

fn build_standard() -> Taxonomy {
    let region = TaxonomyTable::new([
        (
            "Europe",
            vec![
                "eu",
                "emea",
                "european union",
                "western europe",
                "eastern europe",
                "nordics",
                "uk",
                "united kingdom",
                "dach",
            ],
        ),
        ("North America", vec!["na", "usa", "us", "united states", "canada", "north-america"]),
        (
            "Latin America",
            vec!["latam", "south america", "central america", "brazil", "mexico", "latin-america"],
        ),
        (
            "Asia",
            vec![
                "apac",
                "asia pacific",
                "asia-pacific",
                "southeast asia",
                "sea",
                "east asia",
                "india",
                "china",
            ],
        ),
        ("Middle East", vec!["mena", "gcc", "middle-east"]),
        ("Africa", vec!["sub-saharan africa", "ssa", "north africa"]),
        ("Oceania", vec!["australia", "new zealand", "anz"]),
        ("Global", vec!["worldwide", "international", "any", "all regions", "world"]),
        ("Other", vec!["others", "rest of world", "row"]),
    ]);

    let stage = TaxonomyTable::new([
        ("Idea", vec!["ideation", "concept", "pre-product"]),
        ("Pre-Seed", vec!["preseed", "pre seed", "angel", "friends and family"]),
        ("Seed", vec!["seed stage", "seed round", "early stage", "early"]),
        ("Series A", vec!["series-a", "seriesa", "a round", "series a round"]),
        ("Series B", vec!["series-b", "seriesb", "b round"]),
        (
            "Growth",
            vec![
                "series c",
                "series-c",
                "series c+",
                "series d",
                "late stage",
                "scale-up",
                "scaleup",
                "growth stage",
            ],
        ),
    ]);

    let vertical = TaxonomyTable::new([
        (
            "Fintech",
            vec![
                "fin tech",
                "fin-tech",
                "financial services",
                "payments",
                "banking",
                "insurtech",
                "defi",
            ],
        ),
        (
            "Healthtech",
            vec!["health tech", "health-tech", "healthcare", "medtech", "digital health", "health"],
        ),
        ("Biotech", vec!["bio tech", "life sciences", "biotechnology", "pharma"]),
        ("Edtech", vec!["ed tech", "ed-tech", "education", "learning"]),
        (
            "AI/ML",
            vec![
                "ai",
                "ml",
                "artificial intelligence",
                "machine learning",
                "ai & ml",
                "ai/ml",
                "genai",
                "deep learning",
            ],
        ),
        ("SaaS", vec!["b2b saas", "software", "enterprise software", "b2b software"]),
        (
            "E-commerce",
            vec!["ecommerce", "e commerce", "retail", "marketplace", "marketplaces", "d2c", "dtc"],
        ),
        (
            "Climate",
            vec![
                "climatetech",
                "climate tech",
                "cleantech",
                "clean tech",
                "energy",
                "sustainability",
                "greentech",
            ],
        ),
        ("Mobility", vec!["transport", "transportation", "automotive", "logistics"]),
        ("Deeptech", vec!["deep tech", "deep-tech", "hardware", "robotics", "quantum", "space"]),
        ("Proptech", vec!["prop tech", "real estate", "construction tech", "contech"]),
        ("Agritech", vec!["agtech", "agri tech", "agriculture", "foodtech", "food tech"]),
        ("Cybersecurity", vec!["cyber", "security", "infosec", "cyber security"]),
        ("Consumer", vec!["b2c", "consumer apps", "social", "media", "gaming"]),
        ("Web3", vec!["blockchain", "crypto", "web 3"]),
    ]);

    Taxonomy { region, stage, vertical }
}
