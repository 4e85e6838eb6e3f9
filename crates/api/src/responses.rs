use serde::{Deserialize, Serialize};

pub const SERVICE_STATUS: &str = "YOLOv8 Skin Analysis API is running";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RootResponse {
    pub status: String,
    pub model_loaded: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelStatusResponse {
    pub model_loaded: bool,
    pub status: String,
    pub model_path: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisStatus {
    Success,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionBody {
    #[serde(rename = "box")]
    pub bbox: [f32; 4],
    pub confidence: f32,
    #[serde(rename = "class")]
    pub class_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub status: AnalysisStatus,
    pub detections: Vec<DetectionBody>,
    /// Base64 JPEG, `null` when the preview could not be rendered
    pub annotated_image: Option<String>,
}

impl AnalysisResult {
    pub fn success(detections: Vec<DetectionBody>, annotated_image: Option<String>) -> Self {
        Self {
            status: AnalysisStatus::Success,
            detections,
            annotated_image,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn analysis_result_uses_wire_field_names() {
        let result = AnalysisResult::success(
            vec![DetectionBody {
                bbox: [1.0, 2.0, 3.0, 4.0],
                confidence: 0.5,
                class_name: "acne".into(),
            }],
            None,
        );

        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({
                "status": "success",
                "detections": [{"box": [1.0, 2.0, 3.0, 4.0], "confidence": 0.5, "class": "acne"}],
                "annotated_image": null
            })
        );
    }

    #[test]
    fn model_status_serializes_nulls() {
        let status = ModelStatusResponse {
            model_loaded: false,
            status: "Model not loaded".into(),
            model_path: None,
            error: Some("missing".into()),
        };

        let value = serde_json::to_value(&status).unwrap();
        assert_eq!(value["model_path"], serde_json::Value::Null);
        assert_eq!(value["error"], "missing");
    }
}
