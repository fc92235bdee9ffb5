extern crate icondrop;
extern crate image;
extern crate tempfile;

use icondrop::{ArtifactKind, CancelFlag, Config, Error, IconService,
               MimeType};
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;
use std::thread;
use std::time::{Duration, Instant};

#[test]
fn convert_then_fetch_both_kinds() {
    let service = IconService::from_config(&Config::default()).unwrap();
    let id = service.convert_and_store(upload(), MimeType::Png).unwrap();
    let ico = service.fetch_artifact(id.as_str(), ArtifactKind::Ico).unwrap();
    let icns = service.fetch_artifact(id.as_str(), ArtifactKind::Icns).unwrap();
    assert_eq!(&ico[0..4], &[0, 0, 1, 0]);
    assert_eq!(&icns[0..4], b"icns");

    let (kind, by_name) = service.fetch_file(&id.filename(ArtifactKind::Icns))
        .unwrap();
    assert_eq!(kind, ArtifactKind::Icns);
    assert_eq!(by_name, icns);
}

#[test]
fn unknown_and_malformed_names_are_not_found() {
    let service = IconService::from_config(&Config::default()).unwrap();
    assert!(matches!(service.fetch_artifact("neverissued", ArtifactKind::Ico),
                     Err(Error::NotFound(_))));
    for name in &["../etc/passwd.ico", "ABC123.exe", "abc/def.icns", ""] {
        assert!(matches!(service.fetch_file(name), Err(Error::NotFound(_))));
    }
}

#[test]
fn artifacts_expire_after_retention_window() {
    let config = Config {
        retention_secs: 1,
        sweep_interval_ms: 20,
        ..Config::default()
    };
    let service = IconService::from_config(&config).unwrap();
    let id = service.convert_and_store(upload(), MimeType::Png).unwrap();
    assert!(service.fetch_artifact(id.as_str(), ArtifactKind::Ico).is_ok());

    let started = Instant::now();
    while !service.store().is_empty() &&
          started.elapsed() < Duration::from_secs(10) {
        thread::sleep(Duration::from_millis(50));
    }
    for &kind in &ArtifactKind::ALL {
        assert!(matches!(service.fetch_artifact(id.as_str(), kind),
                         Err(Error::NotFound(_))));
    }
}

#[test]
fn oversize_and_bad_uploads_store_nothing() {
    let config = Config {
        max_source_bytes: 16,
        ..Config::default()
    };
    let service = IconService::from_config(&config).unwrap();
    assert!(matches!(service.convert_and_store(upload(), MimeType::Png),
                     Err(Error::InvalidImage(_))));
    assert!(matches!(service.convert_and_store(b"garbage".to_vec(),
                                               MimeType::Png),
                     Err(Error::InvalidImage(_))));
    assert!(service.store().is_empty());
}

#[test]
fn zero_durations_are_rejected() {
    let no_retention = Config {
        retention_secs: 0,
        ..Config::default()
    };
    assert!(matches!(IconService::from_config(&no_retention),
                     Err(Error::Config(_))));
    let no_interval = Config {
        sweep_interval_ms: 0,
        ..Config::default()
    };
    assert!(matches!(IconService::from_config(&no_interval),
                     Err(Error::Config(_))));
}

#[test]
fn cancelled_conversion_stores_nothing() {
    let service = IconService::from_config(&Config::default()).unwrap();
    let cancel = CancelFlag::new();
    cancel.cancel();
    let result =
        service.convert_and_store_with_cancel(upload(), MimeType::Png, &cancel);
    assert!(matches!(result, Err(Error::Cancelled)));
    assert!(service.store().is_empty());
}

#[test]
fn directory_backend_writes_named_files() {
    let dir = tempfile::tempdir().unwrap();
    let stale = dir.path().join("oldartifact.ico");
    std::fs::write(&stale, b"stale").unwrap();
    let config = Config {
        output_dir: Some(dir.path().to_path_buf()),
        ..Config::default()
    };
    let service = IconService::from_config(&config).unwrap();
    assert!(!stale.exists());

    let id = service.convert_and_store(upload(), MimeType::Png).unwrap();
    for &kind in &ArtifactKind::ALL {
        let path = dir.path().join(id.filename(kind));
        let on_disk = std::fs::read(&path).unwrap();
        let served = service.fetch_artifact(id.as_str(), kind).unwrap();
        assert_eq!(on_disk, served);
    }

    service.store().remove(&id);
    for &kind in &ArtifactKind::ALL {
        assert!(!dir.path().join(id.filename(kind)).exists());
        assert!(matches!(service.fetch_artifact(id.as_str(), kind),
                         Err(Error::NotFound(_))));
    }
}

#[test]
fn concurrent_uploads_get_distinct_ids() {
    let service = IconService::from_config(&Config::default()).unwrap();
    let ids: Vec<_> = thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                scope.spawn(|| {
                    service.convert_and_store(upload(), MimeType::Png).unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    assert_eq!(service.store().len(), 4);
    for (i, a) in ids.iter().enumerate() {
        for b in &ids[i + 1..] {
            assert_ne!(a, b);
        }
    }
}

fn upload() -> Vec<u8> {
    let image = RgbaImage::from_pixel(40, 40, Rgba([10, 120, 240, 255]));
    let mut bytes = Vec::new();
    DynamicImage::ImageRgba8(image)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}
