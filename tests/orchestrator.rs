use std::sync::{Arc, Mutex};

use axum::{Json, Router, extract::State, routing::{get, post}};
use image::{DynamicImage, ImageFormat, RgbaImage};
use ink_it::config::OpenAiConfig;
use ink_it::providers::OpenAiProvider;
use ink_it::storage::LocalFileStorage;
use ink_it::store::{ImageStore, JsonRecordStore};
use ink_it::styles::{style_prompt, DEFAULT_STYLE_ID};
use ink_it::{GenerationRequest, TattooPipeline};
use reqwest::Client;
use serde_json::{json, Value};

fn png(width: u32, height: u32) -> Vec<u8> {
    let pixels = RgbaImage::from_pixel(width, height, image::Rgba([20, 20, 20, 255]));
    let mut output = Vec::new();
    DynamicImage::ImageRgba8(pixels)
        .write_to(&mut std::io::Cursor::new(&mut output), ImageFormat::Png)
        .unwrap();
    output
}

async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    format!("http://{addr}")
}

#[derive(Clone, Default)]
struct FakeOpenAi {
    base: Arc<Mutex<String>>,
    prompts: Arc<Mutex<Vec<String>>>,
    vision_bodies: Arc<Mutex<Vec<Value>>>,
}

/// Chat completions, image generations and the generated file itself.
async fn fake_openai(description: &'static str) -> (String, FakeOpenAi) {
    let fake = FakeOpenAi::default();
    let artwork = png(16, 16);
    let router = Router::new()
        .route(
            "/v1/chat/completions",
            post(move |State(fake): State<FakeOpenAi>, Json(body): Json<Value>| async move {
                fake.vision_bodies.lock().unwrap().push(body);
                Json(json!({"choices": [{"message": {"content": description}}]}))
            }),
        )
        .route(
            "/v1/images/generations",
            post(|State(fake): State<FakeOpenAi>, Json(body): Json<Value>| async move {
                let prompt = body["prompt"].as_str().unwrap_or_default().to_string();
                fake.prompts.lock().unwrap().push(prompt);
                let base = fake.base.lock().unwrap().clone();
                Json(json!({"data": [{"url": format!("{base}/generated/tattoo.png")}]}))
            }),
        )
        .route(
            "/generated/tattoo.png",
            get(move || {
                let bytes = artwork.clone();
                async move { bytes }
            }),
        )
        .with_state(fake.clone());
    let base = serve(router).await;
    *fake.base.lock().unwrap() = base.clone();
    (base, fake)
}

struct World {
    _dir: tempfile::TempDir,
    store: Arc<JsonRecordStore>,
    pipeline: TattooPipeline,
}

fn world(openai_base: String) -> World {
    let dir = tempfile::tempdir().unwrap();
    let storage = LocalFileStorage::new(
        dir.path().to_path_buf(),
        "http://localhost:3000/files".to_string(),
    );
    let store = Arc::new(JsonRecordStore::new(storage.clone()));
    let client = Client::new();
    let provider = Arc::new(OpenAiProvider::new(
        OpenAiConfig {
            api_key: "sk-test".to_string(),
            base_url: openai_base,
            vision_model: "gpt-4o".to_string(),
            image_model: "dall-e-3".to_string(),
            max_tokens: 300,
        },
        client.clone(),
    ));
    let pipeline = TattooPipeline::new(provider, store.clone(), Arc::new(storage), client);
    World {
        _dir: dir,
        store,
        pipeline,
    }
}

fn local_photo(dir: &tempfile::TempDir) -> String {
    let path = dir.path().join("koi.png");
    std::fs::write(&path, png(4, 4)).unwrap();
    format!("file://{}", path.display())
}

#[tokio::test]
async fn japanese_generation_end_to_end() {
    let (base, fake) = fake_openai("A koi fish swimming upstream past a waterfall").await;
    let world = world(format!("{base}/v1"));
    let photos = tempfile::tempdir().unwrap();
    let record = world
        .pipeline
        .submit_image("user-1", &local_photo(&photos))
        .await
        .unwrap();

    let result = world
        .pipeline
        .generate(&GenerationRequest {
            user_id: "user-1".to_string(),
            image_id: record.id,
            style: "Japanese".to_string(),
        })
        .await;

    assert!(result.success, "{result:?}");
    let tattoo_ref = result.tattoo_ref.expect("tattoo reference");
    assert!(!tattoo_ref.is_empty());
    assert_eq!(std::fs::read(&tattoo_ref).unwrap(), png(16, 16));

    let stored = world.store.get_image(record.id).await.unwrap().unwrap();
    assert!(stored.processed);
    assert_eq!(stored.tattoo_ref.as_deref(), Some(tattoo_ref.as_str()));
    assert_eq!(stored.style.as_deref(), Some("Japanese"));

    let vision = fake.vision_bodies.lock().unwrap();
    let image_url = vision[0]["messages"][1]["content"][1]["image_url"]["url"]
        .as_str()
        .unwrap();
    assert!(image_url.starts_with("data:image/png;base64,"));

    let prompts = fake.prompts.lock().unwrap();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("A koi fish swimming upstream past a waterfall"));
    assert!(prompts[0].contains(&style_prompt("Japanese")));
}

#[tokio::test]
async fn unreachable_vision_endpoint_reports_failure() {
    // Bind and drop to get a port nothing listens on.
    let closed = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };
    let world = world(format!("http://{closed}/v1"));
    let photos = tempfile::tempdir().unwrap();
    let record = world
        .pipeline
        .submit_image("user-1", &local_photo(&photos))
        .await
        .unwrap();

    let result = world
        .pipeline
        .generate(&GenerationRequest {
            user_id: "user-1".to_string(),
            image_id: record.id,
            style: "Japanese".to_string(),
        })
        .await;

    assert!(!result.success);
    assert!(result.tattoo_ref.is_none());
    let message = result.error.expect("error message");
    assert!(message.starts_with("image analysis failed"), "{message}");
    assert_eq!(world.store.get_image(record.id).await.unwrap(), Some(record));
}

#[tokio::test]
async fn unknown_style_generates_default_prompt() {
    let (base, fake) = fake_openai("A rose with a dagger").await;
    let world = world(format!("{base}/v1"));
    let photos = tempfile::tempdir().unwrap();

    for style in ["Unknown-Style-XYZ", DEFAULT_STYLE_ID] {
        let record = world
            .pipeline
            .submit_image("user-1", &local_photo(&photos))
            .await
            .unwrap();
        let result = world
            .pipeline
            .generate(&GenerationRequest {
                user_id: "user-1".to_string(),
                image_id: record.id,
                style: style.to_string(),
            })
            .await;
        assert!(result.success, "{result:?}");
    }

    let prompts = fake.prompts.lock().unwrap();
    assert_eq!(prompts.len(), 2);
    assert_eq!(prompts[0], prompts[1]);
}
