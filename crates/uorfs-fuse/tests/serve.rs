//! End-to-end: load a collection, build the tree and serve operations.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use uorfs_client::{digest, OciLayoutClient};
use uorfs_fuse::builder::{XATTR_ATTRIBUTE_PREFIX, XATTR_DIGEST, XATTR_MEDIA_TYPE};
use uorfs_fuse::{FuseOps, UorFileSystem, UorfsConfig};
use uorfs_proto::{media_type, Descriptor};
use uorfs_stubs::MockRegistry;

fn write_blob(dir: &Path, content: &[u8]) -> Descriptor {
    let d = digest::sha256(content);
    let (_, hex) = d.split_once(':').unwrap();
    let blobs = dir.join("blobs").join("sha256");
    std::fs::create_dir_all(&blobs).unwrap();
    std::fs::write(blobs.join(hex), content).unwrap();
    Descriptor::new("application/octet-stream", d, content.len() as u64)
}

/// OCI layout tagged `v1` holding `readme.md` and `data/table.csv`.
fn make_layout(dir: &Path) {
    let readme = write_blob(dir, b"# collection\n")
        .with_annotation(media_type::ANNOTATION_TITLE, "readme.md")
        .with_annotation(media_type::ANNOTATION_UOR_ATTRIBUTES, r#"{"kind":"doc"}"#);
    let table = write_blob(dir, b"a,b\n1,2\n")
        .with_annotation(media_type::ANNOTATION_TITLE, "data/table.csv")
        .with_annotation(media_type::ANNOTATION_UOR_ATTRIBUTES, r#"{"kind":"data","rows":1}"#);
    let mut config = write_blob(dir, b"{}");
    config.media_type = media_type::UOR_CONFIG.to_string();

    let manifest = serde_json::to_vec(&serde_json::json!({
        "schemaVersion": 2,
        "mediaType": media_type::OCI_MANIFEST,
        "config": config,
        "layers": [readme, table],
    }))
    .unwrap();
    let mut manifest_desc = write_blob(dir, &manifest)
        .with_annotation(media_type::ANNOTATION_REF_NAME, "v1");
    manifest_desc.media_type = media_type::OCI_MANIFEST.to_string();

    let index = serde_json::json!({"schemaVersion": 2, "manifests": [manifest_desc]});
    std::fs::write(dir.join("index.json"), serde_json::to_vec(&index).unwrap()).unwrap();
}

#[tokio::test]
async fn test_serves_oci_layout() {
    let tmp = tempfile::tempdir().unwrap();
    make_layout(tmp.path());
    let reference = format!("{}:v1", tmp.path().display());

    let fs = UorFileSystem::load(
        Arc::new(OciLayoutClient::new()),
        reference,
        None,
        UorfsConfig::default(),
    )
    .await
    .unwrap();
    fs.init().await.unwrap();

    let mut names = Vec::new();
    fs.readdir("/", &mut |name, _| {
        names.push(name.to_string());
        true
    })
    .await
    .unwrap();
    names.sort();
    assert_eq!(names, [".", "..", "data", "readme.md"]);

    let data = fs.getattr("/data").await.unwrap();
    assert!(data.attr.is_dir());
    assert_eq!(data.attr.nlink, 2);

    let table = fs.read("/data/table.csv", 0, 4096).await.unwrap();
    assert_eq!(&table.data[..], b"a,b\n1,2\n");

    let readme = fs.read("/readme.md", 2, 10).await.unwrap();
    assert_eq!(&readme.data[..], b"collection");

    let rows = fs
        .getxattr("/data/table.csv", &format!("{XATTR_ATTRIBUTE_PREFIX}rows"))
        .await
        .unwrap();
    assert_eq!(rows.data, b"1");
    let mt = fs.getxattr("/readme.md", XATTR_MEDIA_TYPE).await.unwrap();
    assert_eq!(mt.data, b"application/octet-stream");

    fs.destroy().await;
}

#[tokio::test]
async fn test_missing_paths_are_not_found() {
    let registry = Arc::new(MockRegistry::new());
    let file = registry.add_file("a/b.txt", b"bytes", serde_json::json!({}));
    registry.add_collection("repo:v1", &[file]);
    let fs = UorFileSystem::load(registry, "repo:v1", None, UorfsConfig::default())
        .await
        .unwrap();

    for path in ["/x", "/a/x", "/a/b.txt/x", "/b.txt"] {
        assert_eq!(fs.getattr(path).await.unwrap_err(), libc::ENOENT, "{path}");
        assert_eq!(fs.read(path, 0, 1).await.unwrap_err(), libc::ENOENT, "{path}");
        assert_eq!(
            fs.readdir(path, &mut |_, _| true).await.unwrap_err(),
            libc::ENOENT,
            "{path}"
        );
        assert_eq!(
            fs.listxattr(path, &mut |_| true).await.unwrap_err(),
            libc::ENOENT,
            "{path}"
        );
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_first_reads_fetch_once() {
    let registry = Arc::new(MockRegistry::new());
    let content: Vec<u8> = (0..64 * 1024).map(|i| (i % 251) as u8).collect();
    let file = registry.add_file("big.bin", &content, serde_json::json!({}));
    registry.add_collection("repo:v1", &[file.clone()]);
    registry.set_fetch_delay(Duration::from_millis(50));

    let fs = Arc::new(
        UorFileSystem::load(registry.clone(), "repo:v1", None, UorfsConfig::default())
            .await
            .unwrap(),
    );

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let fs = Arc::clone(&fs);
        tasks.push(tokio::spawn(async move {
            fs.read("/big.bin", 0, u32::MAX).await.unwrap().data
        }));
    }
    let mut results = Vec::new();
    for task in tasks {
        results.push(task.await.unwrap());
    }

    for data in &results {
        assert_eq!(&data[..], &content[..]);
    }
    assert_eq!(registry.fetch_count(&file.digest), 1);

    let digest_xattr = fs.getxattr("/big.bin", XATTR_DIGEST).await.unwrap();
    assert_eq!(digest_xattr.data, file.digest.as_bytes());
}
