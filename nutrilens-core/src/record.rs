//! The nutrition record returned by a successful analysis.
//!
//! The types here are the single source of truth for the output schema:
//! `schemars` derives the JSON Schema sent to the model and used to
//! validate what comes back, and `serde` maps the wire names.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Structured nutritional report for one food item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NutritionRecord {
    #[schemars(
        description = "Nome principal do prato ou alimento",
        length(min = 1)
    )]
    pub food_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(
        description = "Nível de confiança da análise (0-1)",
        range(min = 0.0, max = 1.0)
    )]
    pub confidence: Option<f64>,

    #[schemars(description = "Breve descrição do alimento e seus componentes")]
    pub description: String,

    /// Free-form portion estimate, never parsed into a quantity.
    #[schemars(description = "Peso estimado da porção analisada")]
    pub estimated_weight: String,

    #[schemars(description = "Total de calorias (kcal)", range(min = 0.0))]
    pub calories: f64,

    pub macros: Macros,

    #[serde(default)]
    pub micronutrients: Vec<Micronutrient>,

    pub allergens: Vec<String>,

    #[schemars(
        description = "Nota de saúde de 0 a 100 baseada na densidade nutricional e nível de processamento",
        range(min = 0, max = 100)
    )]
    pub health_score: u8,

    #[schemars(description = "Lista de pontos positivos para a saúde")]
    pub pros: Vec<String>,

    #[schemars(description = "Lista de pontos de atenção ou negativos")]
    pub cons: Vec<String>,

    #[schemars(description = "Dicas de como tornar a refeição mais saudável")]
    pub tips: Vec<String>,

    pub processing_level: ProcessingLevel,
}

/// Macronutrients in grams.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Macros {
    #[schemars(range(min = 0.0))]
    pub protein: f64,
    #[schemars(range(min = 0.0))]
    pub carbs: f64,
    #[schemars(range(min = 0.0))]
    pub fat: f64,
    #[schemars(range(min = 0.0))]
    pub fiber: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Micronutrient {
    pub label: String,
    pub value: f64,
    pub unit: String,
}

/// How industrially processed a food item is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum ProcessingLevel {
    #[serde(rename = "Natural")]
    Natural,
    #[serde(rename = "Minimamente Processado")]
    MinimallyProcessed,
    #[serde(rename = "Processado")]
    Processed,
    #[serde(rename = "Ultraprocessado")]
    UltraProcessed,
}

impl ProcessingLevel {
    pub const ALL: [ProcessingLevel; 4] = [
        ProcessingLevel::Natural,
        ProcessingLevel::MinimallyProcessed,
        ProcessingLevel::Processed,
        ProcessingLevel::UltraProcessed,
    ];

    /// The wire label, as the model is instructed to write it
    pub fn label(&self) -> &'static str {
        match self {
            ProcessingLevel::Natural => "Natural",
            ProcessingLevel::MinimallyProcessed => "Minimamente Processado",
            ProcessingLevel::Processed => "Processado",
            ProcessingLevel::UltraProcessed => "Ultraprocessado",
        }
    }
}

impl fmt::Display for ProcessingLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Coarse banding of `healthScore` used by the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthRating {
    /// Above 70
    Good,
    /// Above 40
    Fair,
    Poor,
}

impl HealthRating {
    pub fn from_score(score: u8) -> Self {
        if score > 70 {
            HealthRating::Good
        } else if score > 40 {
            HealthRating::Fair
        } else {
            HealthRating::Poor
        }
    }
}

/// One labelled slice of the macro chart
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MacroShare {
    pub label: &'static str,
    pub grams: f64,
}

impl NutritionRecord {
    pub fn health_rating(&self) -> HealthRating {
        HealthRating::from_score(self.health_score)
    }

    /// Macros as labelled grams, in chart order
    pub fn macro_breakdown(&self) -> [MacroShare; 4] {
        [
            MacroShare {
                label: "Proteína",
                grams: self.macros.protein,
            },
            MacroShare {
                label: "Carboidrato",
                grams: self.macros.carbs,
            },
            MacroShare {
                label: "Gordura",
                grams: self.macros.fat,
            },
            MacroShare {
                label: "Fibra",
                grams: self.macros.fiber,
            },
        ]
    }

    pub fn has_allergens(&self) -> bool {
        !self.allergens.is_empty()
    }
}
