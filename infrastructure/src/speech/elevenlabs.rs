//! ElevenLabs-compatible text-to-speech client.

use super::SpeechBackend;
use async_trait::async_trait;
use serde::Serialize;
use tavern_application::SpeechError;
use tracing::debug;

pub struct ElevenLabsClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model_id: String,
    output_format: String,
}

impl ElevenLabsClient {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model_id: "eleven_multilingual_v2".to_string(),
            output_format: "mp3_22050_32".to_string(),
        }
    }

    pub fn with_model_id(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = model_id.into();
        self
    }

    pub fn with_output_format(mut self, format: impl Into<String>) -> Self {
        self.output_format = format.into();
        self
    }

    fn endpoint(&self, voice_id: &str) -> String {
        format!("{}/v1/text-to-speech/{voice_id}", self.base_url)
    }
}

#[derive(Debug, Serialize)]
struct TtsRequest<'a> {
    text: &'a str,
    model_id: &'a str,
    voice_settings: VoiceSettings,
}

#[derive(Debug, Serialize)]
struct VoiceSettings {
    stability: f32,
    similarity_boost: f32,
    style: f32,
    use_speaker_boost: bool,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            stability: 0.0,
            similarity_boost: 1.0,
            style: 0.0,
            use_speaker_boost: true,
        }
    }
}

#[async_trait]
impl SpeechBackend for ElevenLabsClient {
    async fn fetch(&self, text: &str, voice_id: &str) -> Result<Vec<u8>, SpeechError> {
        debug!(voice = voice_id, chars = text.len(), "Requesting speech");
        let response = self
            .client
            .post(self.endpoint(voice_id))
            .query(&[("output_format", self.output_format.as_str())])
            .header("xi-api-key", &self.api_key)
            .json(&TtsRequest {
                text,
                model_id: &self.model_id,
                voice_settings: VoiceSettings::default(),
            })
            .send()
            .await
            .map_err(|e| SpeechError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SpeechError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| SpeechError::Request(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint() {
        let client = ElevenLabsClient::new("key", "https://api.elevenlabs.io/");
        assert_eq!(
            client.endpoint("N2lVS1w4EtoT3dr4eOWO"),
            "https://api.elevenlabs.io/v1/text-to-speech/N2lVS1w4EtoT3dr4eOWO"
        );
    }

    #[test]
    fn test_request_body() {
        let body = serde_json::to_value(TtsRequest {
            text: "Roll initiative.",
            model_id: "eleven_multilingual_v2",
            voice_settings: VoiceSettings::default(),
        })
        .unwrap();
        assert_eq!(body["text"], "Roll initiative.");
        assert_eq!(body["model_id"], "eleven_multilingual_v2");
        assert_eq!(body["voice_settings"]["use_speaker_boost"], true);
    }
}
