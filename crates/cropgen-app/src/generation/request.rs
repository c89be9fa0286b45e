//! Request body for one generation call.

use cropgen_core::ExportedArtifact;

/// Multipart field carrying the exported image.
pub const INIT_IMAGE_FIELD: &str = "init_image";

/// Prompt sent when none is configured.
pub const DEFAULT_PROMPT: &str = "outfit me as a sailor";

/// Generation parameters sent alongside the image.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParams {
    pub init_image_mode: String,
    /// How much of the init image survives, 0.0 to 1.0.
    pub image_strength: f64,
    pub prompt: String,
    pub cfg_scale: u32,
    pub samples: u32,
    pub steps: u32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            init_image_mode: "IMAGE_STRENGTH".to_string(),
            image_strength: 0.35,
            prompt: DEFAULT_PROMPT.to_string(),
            cfg_scale: 7,
            samples: 1,
            steps: 30,
        }
    }
}

/// One image-to-image request, borrowing the exported artifact.
#[derive(Debug, Clone, Copy)]
pub struct GenerationRequest<'a> {
    pub init_image: &'a ExportedArtifact,
    pub params: &'a GenerationParams,
}

impl<'a> GenerationRequest<'a> {
    pub fn new(init_image: &'a ExportedArtifact, params: &'a GenerationParams) -> Self {
        Self { init_image, params }
    }

    /// Text fields in wire order.
    pub fn text_fields(&self) -> Vec<(&'static str, String)> {
        let p = self.params;
        vec![
            ("init_image_mode", p.init_image_mode.clone()),
            ("image_strength", p.image_strength.to_string()),
            ("text_prompts[0][text]", p.prompt.clone()),
            ("cfg_scale", p.cfg_scale.to_string()),
            ("samples", p.samples.to_string()),
            ("steps", p.steps.to_string()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_text_fields() {
        let artifact = ExportedArtifact::png(vec![1, 2, 3]);
        let params = GenerationParams::default();
        let request = GenerationRequest::new(&artifact, &params);

        assert_eq!(
            request.text_fields(),
            vec![
                ("init_image_mode", "IMAGE_STRENGTH".to_string()),
                ("image_strength", "0.35".to_string()),
                ("text_prompts[0][text]", "outfit me as a sailor".to_string()),
                ("cfg_scale", "7".to_string()),
                ("samples", "1".to_string()),
                ("steps", "30".to_string()),
            ]
        );
    }

    #[test]
    fn test_custom_prompt() {
        let artifact = ExportedArtifact::png(Vec::new());
        let params = GenerationParams {
            prompt: "make it a watercolor".to_string(),
            image_strength: 0.5,
            ..Default::default()
        };
        let fields = GenerationRequest::new(&artifact, &params).text_fields();
        assert_eq!(fields[1].1, "0.5");
        assert_eq!(fields[2].1, "make it a watercolor");
    }
}
