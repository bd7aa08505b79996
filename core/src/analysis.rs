//! Wire types for the Gemini `generateContent` food-image analysis call.

use std::fmt;
use std::str::FromStr;

use anyhow::{Context, Result, bail};
use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::models::FoodItem;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

pub const ANALYSIS_PROMPT: &str = "Analyze the food items in this image. Provide a list of each \
distinct food item with its estimated nutritional information (calories, protein, carbs, fat). \
Be as accurate as possible. If an item is not food, ignore it.";

/// Name of the stand-in item returned when analysis fails in placeholder mode.
pub const PLACEHOLDER_NAME: &str = "Error processing image";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    pub generation_config: GenerationConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<InlineData>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub response_mime_type: String,
    pub response_schema: serde_json::Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<Content>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    pub block_reason: Option<String>,
}

/// Body of a non-2xx reply.
#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    pub error: ApiError,
}

#[derive(Debug, Deserialize)]
pub struct ApiError {
    #[serde(default)]
    pub code: u16,
    #[serde(default)]
    pub message: String,
    pub status: Option<String>,
}

/// Best-effort description of an error body; falls back to the raw text.
#[must_use]
pub fn describe_error(body: &str) -> String {
    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(ErrorResponse { error }) => match error.status {
            Some(status) => format!("{status}: {}", error.message),
            None => error.message,
        },
        Err(_) => body.trim().chars().take(200).collect(),
    }
}

/// Response schema: an array of `{name, calories, protein, carbs, fat}`, all required.
#[must_use]
pub fn food_items_schema() -> serde_json::Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "name": { "type": "STRING", "description": "The name of the food item." },
                "calories": { "type": "NUMBER", "description": "Estimated calories for the food item." },
                "protein": { "type": "NUMBER", "description": "Estimated protein in grams." },
                "carbs": { "type": "NUMBER", "description": "Estimated carbohydrates in grams." },
                "fat": { "type": "NUMBER", "description": "Estimated fat in grams." }
            },
            "required": ["name", "calories", "protein", "carbs", "fat"]
        }
    })
}

#[must_use]
pub fn build_request(image: &[u8], mime_type: &str) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: vec![Content {
            role: None,
            parts: vec![
                Part {
                    text: Some(ANALYSIS_PROMPT.to_string()),
                    inline_data: None,
                },
                Part {
                    text: None,
                    inline_data: Some(InlineData {
                        mime_type: mime_type.to_string(),
                        data: STANDARD.encode(image),
                    }),
                },
            ],
        }],
        generation_config: GenerationConfig {
            response_mime_type: "application/json".to_string(),
            response_schema: food_items_schema(),
        },
    }
}

/// Concatenated text of the first candidate, if it has any.
#[must_use]
pub fn response_text(resp: &GenerateContentResponse) -> Option<String> {
    let content = resp.candidates.first()?.content.as_ref()?;
    let text: String = content
        .parts
        .iter()
        .filter_map(|p| p.text.as_deref())
        .collect();
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

pub fn parse_food_items(resp: &GenerateContentResponse) -> Result<Vec<FoodItem>> {
    let Some(text) = response_text(resp) else {
        if let Some(reason) = resp
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_deref())
        {
            bail!("Analysis was blocked: {reason}");
        }
        let finish = resp
            .candidates
            .first()
            .and_then(|c| c.finish_reason.as_deref())
            .unwrap_or("no candidates");
        bail!("Analysis returned no text ({finish})");
    };

    serde_json::from_str(text.trim()).context("Failed to parse food items from analysis response")
}

/// What the analysis call hands back when the request or parsing fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisFailureMode {
    /// Swallow the error and return a single zero-valued [`PLACEHOLDER_NAME`] item.
    #[default]
    Placeholder,
    /// Return the error to the caller.
    Surface,
}

impl fmt::Display for AnalysisFailureMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisFailureMode::Placeholder => write!(f, "placeholder"),
            AnalysisFailureMode::Surface => write!(f, "surface"),
        }
    }
}

impl FromStr for AnalysisFailureMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "placeholder" => Ok(AnalysisFailureMode::Placeholder),
            "surface" => Ok(AnalysisFailureMode::Surface),
            _ => bail!("Invalid analysis failure mode '{s}'. Must be one of: placeholder, surface"),
        }
    }
}

#[must_use]
pub fn placeholder_item() -> FoodItem {
    FoodItem::new(PLACEHOLDER_NAME, 0.0, 0.0, 0.0, 0.0)
}

#[must_use]
pub fn is_placeholder(item: &FoodItem) -> bool {
    *item == placeholder_item()
}

/// Apply the failure policy to the raw outcome of an analysis call.
pub fn settle(result: Result<Vec<FoodItem>>, mode: AnalysisFailureMode) -> Result<Vec<FoodItem>> {
    match result {
        Ok(items) => Ok(items),
        Err(e) => {
            tracing::error!("Error analyzing food image: {e:#}");
            match mode {
                AnalysisFailureMode::Placeholder => Ok(vec![placeholder_item()]),
                AnalysisFailureMode::Surface => Err(e),
            }
        }
    }
}
