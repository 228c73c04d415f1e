use asset_pipeline::{
    compiler::{Compilation, Compiler},
    models::{CompiledAsset, PluginOptions, StorageConfig},
    plugins::{AssetUploader, SourceMapCleaner},
    storage::MockStorage,
};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

fn scenario_compilation() -> Compilation {
    Compilation::from_assets([
        CompiledAsset::new("main.js", "console.log('main')"),
        CompiledAsset::new("main.js.map", "{\"version\":3}"),
        CompiledAsset::new("logo.png", vec![0x89, 0x50, 0x4E, 0x47]),
        CompiledAsset::new("readme.md", "# readme"),
    ])
}

fn options_for(dist: &Path, dry_run: bool) -> PluginOptions {
    PluginOptions {
        dry_run,
        dist_path: Some(dist.to_path_buf()),
        storage: None,
    }
}

#[tokio::test]
async fn test_full_build_uploads_then_strips_source_maps() {
    let dir = tempfile::tempdir().unwrap();
    let dist = dir.path().join("dist");

    let storage = MockStorage::new();
    let uploader = AssetUploader::with_storage(Box::new(storage.clone()), "v1/", false);
    let cleaner = SourceMapCleaner::new(&options_for(&dist, false)).unwrap();

    let mut compiler = Compiler::new(&dist);
    compiler
        .apply(Arc::new(uploader))
        .apply(Arc::new(cleaner));
    compiler.run(&scenario_compilation()).await.unwrap();

    let mut keys: Vec<String> = storage.get_objects().into_keys().collect();
    keys.sort();
    assert_eq!(keys, vec!["v1/logo.png".to_string(), "v1/main.js".to_string()]);

    assert!(!dist.join("main.js.map").exists());
    assert!(dist.join("main.js").exists());
    assert!(dist.join("logo.png").exists());
    assert!(dist.join("readme.md").exists());
}

#[tokio::test]
async fn test_dry_run_build_has_no_side_effects() {
    let dir = tempfile::tempdir().unwrap();
    let dist = dir.path().join("dist");

    let storage = MockStorage::new();
    let uploader = AssetUploader::with_storage(Box::new(storage.clone()), "v1/", true);
    let cleaner = SourceMapCleaner::new(&options_for(&dist, true)).unwrap();

    let mut compiler = Compiler::new(&dist);
    compiler
        .apply(Arc::new(uploader))
        .apply(Arc::new(cleaner));
    compiler.run(&scenario_compilation()).await.unwrap();

    assert_eq!(storage.get_put_count(), 0);
    assert!(dist.join("main.js.map").exists());
}

#[tokio::test]
async fn test_failed_upload_still_completes_build() {
    let dir = tempfile::tempdir().unwrap();
    let dist = dir.path().join("dist");

    let storage = MockStorage::new().with_failure_for("v1/main.js");
    let uploader = AssetUploader::with_storage(Box::new(storage.clone()), "v1/", false);
    let cleaner = SourceMapCleaner::new(&options_for(&dist, false)).unwrap();

    let mut compiler = Compiler::new(&dist);
    compiler
        .apply(Arc::new(uploader))
        .apply(Arc::new(cleaner));
    compiler.run(&scenario_compilation()).await.unwrap();

    assert_eq!(storage.get_put_count(), 2);
    assert!(storage.get_objects().contains_key("v1/logo.png"));
    assert!(!dist.join("main.js.map").exists());
}

#[tokio::test]
async fn test_existing_output_dir_against_s3_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let dist = dir.path().to_path_buf();
    fs::create_dir_all(dist.join("js")).unwrap();
    fs::write(dist.join("js/app.js"), "app").unwrap();
    fs::write(dist.join("js/app.js.map"), "{}").unwrap();
    fs::write(dist.join("index.html"), "<html>").unwrap();

    let options = PluginOptions {
        dry_run: false,
        dist_path: Some(dist.clone()),
        storage: Some(StorageConfig {
            region: "us-east-1".to_string(),
            access_key_id: "test-id".to_string(),
            access_key_secret: "test-secret".to_string(),
            bucket: "static".to_string(),
            prefix: "v2/".to_string(),
            endpoint: Some(server.uri()),
            force_path_style: true,
        }),
    };

    let compilation = Compilation::from_output_dir(&dist).unwrap();
    assert_eq!(
        compilation.asset_names(),
        vec!["index.html", "js/app.js", "js/app.js.map"]
    );

    let mut compiler = Compiler::for_existing_output(&dist);
    compiler
        .apply(Arc::new(AssetUploader::from_options(&options).await.unwrap()))
        .apply(Arc::new(SourceMapCleaner::new(&options).unwrap()));
    compiler.run(&compilation).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let paths: Vec<String> = requests.iter().map(|r| r.url.path().to_string()).collect();
    assert_eq!(paths, vec!["/static/v2/js/app.js".to_string()]);

    assert!(dist.join("js/app.js").exists());
    assert!(!dist.join("js/app.js.map").exists());
    assert!(dist.join("index.html").exists());
}
