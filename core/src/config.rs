use crate::finance_subsystem::{DEFAULT_OVERHEAD_FLOOR, DEFAULT_REVENUE_PER_SALE};
use crate::types::Days;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Shift applied to freshly drawn investor interest.
    pub fn investor_interest_bias(&self) -> f64 {
        match self {
            Self::Easy   =>  0.15,
            Self::Medium =>  0.0,
            Self::Hard   => -0.15,
        }
    }
}

/// A feature as authored in a product template.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureTemplate {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub priority: u32,
    /// 1–10; 5 is neutral development speed.
    pub base_complexity: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductTemplate {
    pub id: String,
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub description: String,
    pub estimated_complexity: f64,
    /// Scales the base revenue per salesperson. 1.0 = baseline.
    pub revenue_potential: f64,
    pub features: Vec<FeatureTemplate>,
}

#[derive(Debug, Clone, Deserialize)]
struct ProductTemplateFile {
    templates: Vec<ProductTemplate>,
}

/// Tunables read from `game/game_config.json`. Every field has a default
/// so partial files are accepted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfigFile {
    pub starting_money: f64,
    pub difficulty: Difficulty,
    pub start_date: NaiveDate,
    pub onboarding_days: Days,
    pub candidate_pool_size: usize,
    pub overhead_floor: f64,
    pub base_revenue_per_sale: f64,
}

impl Default for GameConfigFile {
    fn default() -> Self {
        Self {
            starting_money: 100_000.0,
            difficulty: Difficulty::Medium,
            start_date: default_start_date(),
            onboarding_days: 14.0,
            candidate_pool_size: 6,
            overhead_floor: DEFAULT_OVERHEAD_FLOOR,
            base_revenue_per_sale: DEFAULT_REVENUE_PER_SALE,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GameConfig {
    pub starting_money: f64,
    pub difficulty: Difficulty,
    pub start_date: NaiveDate,
    /// Days after hire before an employee contributes productivity.
    pub onboarding_days: Days,
    /// Target size of the hiring candidate pool.
    pub candidate_pool_size: usize,
    pub overhead_floor: f64,
    pub base_revenue_per_sale: f64,
    pub product_templates: HashMap<String, ProductTemplate>,
}

impl GameConfig {
    /// Load from the data/ directory.
    /// In tests, use GameConfig::default_test().
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let game_path = format!("{data_dir}/game/game_config.json");
        let game_file: GameConfigFile = match std::fs::read_to_string(&game_path) {
            Ok(content) => serde_json::from_str(&content)
                .map_err(|e| anyhow::anyhow!("Cannot parse {game_path}: {e}"))?,
            Err(e) => {
                log::warn!("Cannot read {game_path}: {e}; using defaults");
                GameConfigFile::default()
            }
        };

        let template_path = format!("{data_dir}/products/product_templates.json");
        let template_content = std::fs::read_to_string(&template_path)
            .map_err(|e| anyhow::anyhow!("Cannot read {template_path}: {e}"))?;
        let template_file: ProductTemplateFile = serde_json::from_str(&template_content)?;
        if template_file.templates.is_empty() {
            anyhow::bail!("{template_path} defines no product templates");
        }

        Ok(Self::from_parts(game_file, template_file.templates))
    }

    /// Defaults plus the built-in template catalog. Used when no data
    /// directory is available.
    pub fn builtin() -> Self {
        Self::from_parts(GameConfigFile::default(), builtin_templates())
    }

    /// Config with hardcoded defaults for use in tests.
    /// Adds a neutral two-feature template ("test_pair") for exact-arithmetic tests.
    pub fn default_test() -> Self {
        let mut templates = builtin_templates();
        templates.push(ProductTemplate {
            id: "test_pair".into(),
            name: "Test Pair".into(),
            category: "Test".into(),
            description: String::new(),
            estimated_complexity: 5.0,
            revenue_potential: 1.0,
            features: vec![
                feature("core", "Core", 1, 5.0),
                feature("extra", "Extra", 2, 5.0),
            ],
        });
        Self::from_parts(GameConfigFile::default(), templates)
    }

    pub fn with_starting_money(mut self, money: f64) -> Self {
        self.starting_money = money;
        self
    }

    pub fn with_difficulty(mut self, difficulty: Difficulty) -> Self {
        self.difficulty = difficulty;
        self
    }

    pub fn template(&self, template_id: &str) -> Option<&ProductTemplate> {
        self.product_templates.get(template_id)
    }

    fn from_parts(file: GameConfigFile, templates: Vec<ProductTemplate>) -> Self {
        Self {
            starting_money: file.starting_money,
            difficulty: file.difficulty,
            start_date: file.start_date,
            onboarding_days: file.onboarding_days.max(0.0),
            candidate_pool_size: file.candidate_pool_size,
            overhead_floor: file.overhead_floor.max(0.0),
            base_revenue_per_sale: file.base_revenue_per_sale.max(0.0),
            product_templates: templates.into_iter().map(|t| (t.id.clone(), t)).collect(),
        }
    }
}

fn default_start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 1).unwrap_or(NaiveDate::MIN)
}

fn feature(id: &str, name: &str, priority: u32, complexity: f64) -> FeatureTemplate {
    FeatureTemplate {
        id: id.into(),
        name: name.into(),
        description: String::new(),
        priority,
        base_complexity: complexity,
    }
}

/// The B2B SaaS products a player can choose at game start.
pub fn builtin_templates() -> Vec<ProductTemplate> {
    vec![
        ProductTemplate {
            id: "crm".into(),
            name: "Sales CRM".into(),
            category: "Sales".into(),
            description: "Pipeline tracking for small sales teams.".into(),
            estimated_complexity: 3.0,
            revenue_potential: 1.3,
            features: vec![
                feature("crm-contacts", "Contact Management", 1, 3.0),
                feature("crm-pipeline", "Deal Pipeline", 2, 4.0),
                feature("crm-email", "Email Sync", 3, 5.0),
                feature("crm-reports", "Sales Reports", 4, 4.0),
                feature("crm-mobile", "Mobile App", 5, 6.0),
            ],
        },
        ProductTemplate {
            id: "analytics".into(),
            name: "Product Analytics".into(),
            category: "Data".into(),
            description: "Event tracking and funnels for product teams.".into(),
            estimated_complexity: 5.0,
            revenue_potential: 1.5,
            features: vec![
                feature("an-ingest", "Event Ingestion", 1, 6.0),
                feature("an-dash", "Dashboards", 2, 4.0),
                feature("an-funnels", "Funnels", 3, 5.0),
                feature("an-cohorts", "Cohort Analysis", 4, 6.0),
                feature("an-sql", "SQL Explorer", 5, 7.0),
                feature("an-alerts", "Anomaly Alerts", 6, 8.0),
            ],
        },
        ProductTemplate {
            id: "helpdesk".into(),
            name: "Helpdesk".into(),
            category: "Support".into(),
            description: "Shared inbox and ticketing for support teams.".into(),
            estimated_complexity: 2.0,
            revenue_potential: 1.1,
            features: vec![
                feature("hd-inbox", "Shared Inbox", 1, 2.0),
                feature("hd-tickets", "Ticket Workflow", 2, 3.0),
                feature("hd-kb", "Knowledge Base", 3, 2.0),
                feature("hd-sla", "SLA Policies", 4, 3.0),
                feature("hd-chat", "Live Chat", 5, 4.0),
            ],
        },
    ]
}
