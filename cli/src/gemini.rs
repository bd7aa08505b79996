use anyhow::{Context, Result, bail};

use snapcal_core::analysis::{
    AnalysisFailureMode, GenerateContentResponse, build_request, describe_error,
    parse_food_items, settle,
};
use snapcal_core::models::FoodItem;

use crate::config::Config;

pub struct GeminiClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(base_url: &str, model: &str, api_key: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(format!(
                "snapcal-cli/{} (calorie tracker)",
                env!("CARGO_PKG_VERSION")
            ))
            .timeout(std::time::Duration::from_secs(60))
            .connect_timeout(std::time::Duration::from_secs(5))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(&config.gemini_url, &config.model, config.require_api_key()?)
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }

    /// One `generateContent` call; any transport, status or parse failure is an error.
    pub async fn analyze_async(&self, image: &[u8], mime_type: &str) -> Result<Vec<FoodItem>> {
        let body = build_request(image, mime_type);
        tracing::debug!(
            model = %self.model,
            bytes = image.len(),
            mime_type,
            "Sending image for analysis"
        );

        let resp = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .context("Failed to reach Gemini API")?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            bail!("Gemini API returned {status}: {}", describe_error(&text));
        }

        let data: GenerateContentResponse = resp
            .json()
            .await
            .context("Failed to parse Gemini response")?;

        let items = parse_food_items(&data)?;
        tracing::debug!("Analysis returned {} item(s)", items.len());
        Ok(items)
    }

    /// Analyze and apply the failure policy.
    pub async fn analyze(
        &self,
        image: &[u8],
        mime_type: &str,
        mode: AnalysisFailureMode,
    ) -> Result<Vec<FoodItem>> {
        settle(self.analyze_async(image, mime_type).await, mode)
    }
}
