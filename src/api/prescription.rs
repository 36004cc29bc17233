//! Prescription image analysis (OCR plus medicine extraction).

use serde::{Deserialize, Serialize};

use crate::client::{ApiClient, Deadline, ProgressCallback, UploadSource};
use crate::error::ApiResult;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Medicine {
    pub name: String,
    #[serde(default)]
    pub active_ingredient: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrescriptionAnalysis {
    pub ocr_text: String,
    pub medicines: Vec<Medicine>,
}

#[derive(Deserialize)]
struct AnalysisWire {
    #[serde(default)]
    ocr_text: Option<String>,
    #[serde(default)]
    medicines: Vec<Medicine>,
}

/// `POST /prescription/analyze`: upload an image as multipart field
/// `file`. Uses the analysis deadline since OCR is slow.
pub async fn analyze_prescription(
    client: &ApiClient,
    image: UploadSource,
    on_progress: Option<ProgressCallback>,
) -> ApiResult<PrescriptionAnalysis> {
    let wire: AnalysisWire = client
        .post_multipart(
            "/prescription/analyze",
            "file",
            image,
            on_progress,
            Deadline::Analysis,
        )
        .await?;
    Ok(PrescriptionAnalysis {
        ocr_text: wire.ocr_text.unwrap_or_default(),
        medicines: wire.medicines,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn medicines_without_images() {
        let wire: AnalysisWire = serde_json::from_str(
            r#"{"signal":"ok","ocr_text":"Amoxil 500mg","medicines":[{"name":"Amoxil","active_ingredient":"Amoxicillin"}]}"#,
        )
        .unwrap();
        assert_eq!(wire.medicines.len(), 1);
        assert_eq!(wire.medicines[0].image_url, None);
        assert_eq!(wire.ocr_text.as_deref(), Some("Amoxil 500mg"));
    }
}
