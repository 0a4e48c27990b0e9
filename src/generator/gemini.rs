// Gemini REST client: script research with search grounding, then two-voice TTS.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, error};

use super::traits::{GenerationError, PodcastGenerator};
use crate::catalog::Commodity;
use crate::config::EngineConfig;

const HOST_SPEAKER: &str = "Eric André";
const HOST_VOICE: &str = "Charon";
const INTERVIEWER_SPEAKER: &str = "Olivier Deschamps";
const INTERVIEWER_VOICE: &str = "Puck";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    text: Option<String>,
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    data: Option<String>,
}

impl GenerateContentResponse {
    fn first_parts(&self) -> &[Part] {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|c| c.parts.as_slice())
            .unwrap_or(&[])
    }

    fn text(&self) -> String {
        self.first_parts()
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect()
    }

    fn inline_audio(&self) -> Option<String> {
        self.first_parts()
            .first()
            .and_then(|p| p.inline_data.as_ref())
            .and_then(|d| d.data.clone())
            .filter(|d| !d.is_empty())
    }
}

fn script_prompt(commodity: &Commodity) -> String {
    format!(
        "En tant qu'expert des marchés pour le groupement UNL, recherche sur le web les informations \
les plus récentes (tendances de prix, facteurs d'offre et de demande, perspectives) sur le marché du {name}.

Ensuite, utilise ces informations pour rédiger un script de podcast. Le dialogue doit se faire entre \
{host}, Président du groupement UNL, et {interviewer}, directeur.

Format du script:
- Dialogue clair utilisant les noms complets comme préfixes, par exemple \"{host}:\" et \"{interviewer}:\".
- {interviewer} pose des questions pour guider la discussion.
- {host} répond avec les informations clés que tu as trouvées, de manière synthétique et accessible.
- Le ton doit être professionnel et adapté aux adhérents du groupement UNL.
- Le script doit durer environ 2 minutes (300-350 mots).
- Ne retourne que le script, sans préambule ni texte additionnel.",
        name = commodity.name,
        host = HOST_SPEAKER,
        interviewer = INTERVIEWER_SPEAKER,
    )
}

fn tts_prompt(script: &str) -> String {
    format!(
        "TTS the following conversation between {} and {}:\n{}",
        HOST_SPEAKER, INTERVIEWER_SPEAKER, script
    )
}

fn speaker_voice(speaker: &str, voice: &str) -> Value {
    json!({
        "speaker": speaker,
        "voiceConfig": { "prebuiltVoiceConfig": { "voiceName": voice } }
    })
}

pub struct GeminiGenerator {
    client: Client,
    api_base: String,
    api_key: Option<String>,
    script_model: String,
    tts_model: String,
}

impl GeminiGenerator {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            client: Client::new(),
            api_base: config.generator_api_base.clone(),
            api_key: config.api_key.clone(),
            script_model: config.script_model.clone(),
            tts_model: config.tts_model.clone(),
        }
    }

    fn endpoint(&self, model: &str) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.api_base.trim_end_matches('/'),
            model
        )
    }

    async fn generate_content(
        &self,
        api_key: &str,
        model: &str,
        body: Value,
    ) -> Result<GenerateContentResponse> {
        let resp = self
            .client
            .post(self.endpoint(model))
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        debug!("generateContent model={} status={}", model, status.as_u16());
        if !status.is_success() {
            let detail = resp.text().await.unwrap_or_default();
            return Err(anyhow!("HTTP {}: {}", status.as_u16(), detail));
        }
        Ok(resp.json::<GenerateContentResponse>().await?)
    }
}

#[async_trait]
impl PodcastGenerator for GeminiGenerator {
    async fn generate_script(&self, commodity: &Commodity) -> Result<String, GenerationError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(GenerationError::MissingApiKey)?;

        let body = json!({
            "contents": [{ "parts": [{ "text": script_prompt(commodity) }] }],
            "tools": [{ "google_search": {} }],
        });

        let script_err = |reason: String| GenerationError::Script {
            commodity: commodity.name.clone(),
            reason,
        };

        let resp = self
            .generate_content(api_key, &self.script_model, body)
            .await
            .map_err(|e| {
                error!("Error generating script for {}: {:#}", commodity.name, e);
                script_err(format!("{:#}", e))
            })?;

        let script = resp.text();
        if script.trim().is_empty() {
            error!("Empty script returned for {}", commodity.name);
            return Err(script_err("empty response".to_string()));
        }
        Ok(script)
    }

    async fn generate_audio(&self, script: &str) -> Result<String, GenerationError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(GenerationError::MissingApiKey)?;

        let body = json!({
            "contents": [{ "parts": [{ "text": tts_prompt(script) }] }],
            "generationConfig": {
                "responseModalities": ["AUDIO"],
                "speechConfig": {
                    "multiSpeakerVoiceConfig": {
                        "speakerVoiceConfigs": [
                            speaker_voice(HOST_SPEAKER, HOST_VOICE),
                            speaker_voice(INTERVIEWER_SPEAKER, INTERVIEWER_VOICE),
                        ]
                    }
                }
            }
        });

        let resp = self
            .generate_content(api_key, &self.tts_model, body)
            .await
            .map_err(|e| {
                error!("Error generating audio: {:#}", e);
                GenerationError::Audio {
                    reason: format!("{:#}", e),
                }
            })?;

        resp.inline_audio().ok_or_else(|| {
            error!("Error generating audio: no inline audio in response");
            GenerationError::MissingAudio
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompts_name_both_speakers() {
        let commodity = Commodity::new("cacao", "Cacao", "🍫");
        let prompt = script_prompt(&commodity);
        assert!(prompt.contains("marché du Cacao"));
        assert!(prompt.contains("\"Eric André:\""));
        assert!(prompt.contains("\"Olivier Deschamps:\""));

        let tts = tts_prompt("Eric André: Bonjour");
        assert!(tts.starts_with("TTS the following conversation between Eric André and Olivier Deschamps:\n"));
        assert!(tts.ends_with("Eric André: Bonjour"));
    }

    #[test]
    fn test_response_parsing() {
        let resp: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": { "parts": [{ "text": "Olivier: " }, { "text": "Bonjour" }] }
            }]
        }))
        .unwrap();
        assert_eq!(resp.text(), "Olivier: Bonjour");
        assert!(resp.inline_audio().is_none());

        let resp: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": { "parts": [{ "inlineData": { "mimeType": "audio/mpeg", "data": "SUQz" } }] }
            }]
        }))
        .unwrap();
        assert_eq!(resp.inline_audio().as_deref(), Some("SUQz"));

        let empty: GenerateContentResponse = serde_json::from_value(json!({})).unwrap();
        assert_eq!(empty.text(), "");
    }

    #[tokio::test]
    async fn test_missing_api_key_fails_at_invocation() {
        let generator = GeminiGenerator::from_config(&EngineConfig::default());
        let commodity = Commodity::new("miel", "Miel", "🍯");
        assert_eq!(
            generator.generate_script(&commodity).await,
            Err(GenerationError::MissingApiKey)
        );
        assert_eq!(
            generator.generate_audio("script").await,
            Err(GenerationError::MissingApiKey)
        );
    }
}
