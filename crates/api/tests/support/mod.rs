#![allow(dead_code)]

use api::{ApiConfig, AppState, ModelHandle, router};
use axum::{
    body::Body,
    http::{Request, Response, StatusCode, header},
};
use detector::{ClassNames, ExecutionProvider, InferenceBackend, InferenceOutput};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use ndarray::{Array, IxDyn};
use serde::de::DeserializeOwned;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

pub const BOUNDARY: &str = "X-DETECTOR-TEST-BOUNDARY";

/// Backend driven by the model file contents.
///
/// - `corrupt...` fails to load
/// - `explode...` loads but fails every inference
/// - `panic-once...` loads, panics on the first inference, then behaves
/// - anything else reports one `mole` box centred in the 64x64 input and a
///   low-confidence `acne` candidate that gets filtered
pub struct ScriptedBackend {
    class_names: ClassNames,
    explode: bool,
    panic_next: bool,
}

impl InferenceBackend for ScriptedBackend {
    fn load_model(path: &Path, _provider: ExecutionProvider) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        if contents.starts_with("corrupt") {
            anyhow::bail!("invalid model file {}", path.display());
        }

        Ok(Self {
            class_names: ["acne", "mole"].into_iter().collect(),
            explode: contents.starts_with("explode"),
            panic_next: contents.starts_with("panic-once"),
        })
    }

    fn input_size(&self) -> (u32, u32) {
        (64, 64)
    }

    fn class_names(&self) -> &ClassNames {
        &self.class_names
    }

    fn infer(&mut self, images: &Array<f32, IxDyn>) -> anyhow::Result<InferenceOutput> {
        if self.explode {
            anyhow::bail!("CUDA error: out of memory");
        }
        if std::mem::take(&mut self.panic_next) {
            panic!("inference kernel crashed");
        }
        assert_eq!(images.shape(), &[1, 3, 64, 64]);

        let mut predictions = Array::zeros(IxDyn(&[1, 6, 2]));
        // mole at (32, 32), 20x10
        predictions[[0, 0, 0]] = 32.0;
        predictions[[0, 1, 0]] = 32.0;
        predictions[[0, 2, 0]] = 20.0;
        predictions[[0, 3, 0]] = 10.0;
        predictions[[0, 5, 0]] = 0.87;
        // acne below threshold
        predictions[[0, 0, 1]] = 10.0;
        predictions[[0, 1, 1]] = 10.0;
        predictions[[0, 2, 1]] = 4.0;
        predictions[[0, 3, 1]] = 4.0;
        predictions[[0, 4, 1]] = 0.1;

        Ok(InferenceOutput { predictions })
    }
}

/// Service dir nested one level down so sibling `models` dirs stay inside the temp root.
pub struct TestService {
    pub root: TempDir,
    pub staging: TempDir,
    pub state: AppState<ScriptedBackend>,
}

impl TestService {
    pub fn new() -> Self {
        Self::with_config(|_| {})
    }

    pub fn with_config(configure: impl FnOnce(&mut ApiConfig)) -> Self {
        let root = tempfile::tempdir().unwrap();
        let staging = tempfile::tempdir().unwrap();
        let service_dir = root.path().join("api");
        fs::create_dir_all(&service_dir).unwrap();

        let mut config = ApiConfig::for_service_dir(&service_dir);
        config.staging_dir = staging.path().to_path_buf();
        configure(&mut config);

        let model = Arc::new(ModelHandle::new(
            config.model_candidates(),
            config.model_options.clone(),
        ));

        Self {
            root,
            staging,
            state: AppState::new(model, config),
        }
    }

    /// Service with a working model next to it, already loaded.
    pub fn loaded() -> Self {
        let service = Self::new();
        service.write_model("best.onnx", "weights");
        assert!(service.state.model.load_model());
        service
    }

    pub fn service_dir(&self) -> PathBuf {
        self.root.path().join("api")
    }

    /// Write a model file relative to the service dir.
    pub fn write_model(&self, relative: &str, contents: &str) -> PathBuf {
        let path = self.service_dir().join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, contents).unwrap();
        path
    }

    pub fn staged_files(&self) -> usize {
        fs::read_dir(self.staging.path()).unwrap().count()
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        router(self.state.clone()).oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str) -> Response<Body> {
        self.send(Request::get(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn analyze(&self, field: &str, bytes: &[u8]) -> Response<Body> {
        self.send(multipart_request(field, bytes)).await
    }
}

pub fn multipart_request(field: &str, bytes: &[u8]) -> Request<Body> {
    let mut body = multipart_body(field, bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    multipart_post(body)
}

/// Opening boundary, part headers and content, without the closing boundary.
pub fn multipart_body(field: &str, bytes: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{field}\"; filename=\"upload.png\"\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(bytes);
    body
}

pub fn multipart_post(body: Vec<u8>) -> Request<Body> {
    Request::post("/analyze")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

pub fn encoded_image(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let image = DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x * 3) as u8, (y * 5) as u8, 128])
    }));
    let mut bytes = Cursor::new(Vec::new());
    image.write_to(&mut bytes, format).unwrap();
    bytes.into_inner()
}

pub async fn json_body<T: DeserializeOwned>(response: Response<Body>) -> T {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn expect_status<T: DeserializeOwned>(response: Response<Body>, status: StatusCode) -> T {
    assert_eq!(response.status(), status);
    json_body(response).await
}
