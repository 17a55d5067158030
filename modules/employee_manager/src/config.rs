use serde::{Deserialize, Serialize};

/// `modules.employee_manager` section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct EmployeeManagerConfig {
    pub default_page_size: u32,
    pub max_page_size: u32,
    /// Insert the demo company, departments and employees into empty tables.
    pub seed_on_startup: bool,
    pub statistics: StatisticsConfig,
}

impl Default for EmployeeManagerConfig {
    fn default() -> Self {
        Self {
            default_page_size: 10,
            max_page_size: 50,
            seed_on_startup: true,
            statistics: StatisticsConfig::default(),
        }
    }
}

/// Company figures reported next to the live counts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct StatisticsConfig {
    pub founded_year: i32,
    pub projects_completed: i32,
    pub client_satisfaction: f64,
    pub annual_revenue: String,
}

impl Default for StatisticsConfig {
    fn default() -> Self {
        Self {
            founded_year: 2024,
            projects_completed: 45,
            client_satisfaction: 98.5,
            annual_revenue: "$2.5M".to_string(),
        }
    }
}
