mod common;

use beatport4_source::art;
use beatport4_source::source::BeatportSource;
use common::{now, test_config, write_token_file, ScriptedPrompt};
use mockito::{Matcher, Server};
use serde_json::json;
use std::path::Path;
use tempfile::tempdir;

fn track_with_image(base: &str) -> String {
    json!({
        "id": 3001,
        "name": "Night Drive",
        "release": {
            "id": 4001,
            "name": "Night Drive EP",
            "image": {
                "uri": format!("{}/img/1400x1400/abc.jpg", base),
                "dynamic_uri": format!("{}/img/{{w}}x{{h}}/abc.jpg", base)
            }
        }
    })
    .to_string()
}

/// 16-bit mono PCM WAV with two silent samples.
fn write_silent_wav(path: &Path) {
    let mut wav = Vec::new();
    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&40u32.to_le_bytes());
    wav.extend_from_slice(b"WAVEfmt ");
    wav.extend_from_slice(&16u32.to_le_bytes());
    wav.extend_from_slice(&1u16.to_le_bytes()); // PCM
    wav.extend_from_slice(&1u16.to_le_bytes());
    wav.extend_from_slice(&44_100u32.to_le_bytes());
    wav.extend_from_slice(&88_200u32.to_le_bytes());
    wav.extend_from_slice(&2u16.to_le_bytes());
    wav.extend_from_slice(&16u16.to_le_bytes());
    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&4u32.to_le_bytes());
    wav.extend_from_slice(&[0, 0, 0, 0]);
    std::fs::write(path, wav).unwrap();
}

fn png_bytes() -> Vec<u8> {
    let mut png = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    png.extend_from_slice(&[0; 24]);
    png
}

#[test]
fn image_uses_dynamic_uri_when_sized() {
    let mut server = Server::new();
    let base = server.url();
    let _track = server
        .mock("GET", "/catalog/tracks/3001/")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(track_with_image(&base))
        .create();
    let sized = server
        .mock("GET", "/img/500x500/abc.jpg")
        .with_status(200)
        .with_header("content-type", "image/jpeg")
        .with_body(vec![0xFF, 0xD8, 0xFF, 0xE0])
        .expect(1)
        .create();
    let original = server
        .mock("GET", "/img/1400x1400/abc.jpg")
        .with_status(200)
        .with_body(vec![1, 2, 3])
        .expect(1)
        .create();

    let td = tempdir().unwrap();
    let cfg = test_config(&base, td.path());
    write_token_file(&cfg.token_path(), "tok", now() + 3600.0);
    let (prompt, _) = ScriptedPrompt::new(vec![]);
    let source = BeatportSource::from_config(&cfg, Box::new(prompt)).unwrap();
    let rt = tokio::runtime::Runtime::new().unwrap();

    let img = rt
        .block_on(source.client().get_image("3001", Some(500), None))
        .unwrap();
    assert_eq!(img, Some(vec![0xFF, 0xD8, 0xFF, 0xE0]));

    let img = rt
        .block_on(source.client().get_image("3001", Some(0), Some(0)))
        .unwrap();
    assert_eq!(img, Some(vec![1, 2, 3]));
    sized.assert();
    original.assert();
}

#[test]
fn image_absent_for_track_without_release() {
    let mut server = Server::new();
    let _track = server
        .mock("GET", "/catalog/tracks/8/")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"id": 8, "name": "Loose"}).to_string())
        .create();
    let td = tempdir().unwrap();
    let cfg = test_config(&server.url(), td.path());
    write_token_file(&cfg.token_path(), "tok", now() + 3600.0);
    let (prompt, _) = ScriptedPrompt::new(vec![]);
    let source = BeatportSource::from_config(&cfg, Box::new(prompt)).unwrap();
    let rt = tokio::runtime::Runtime::new().unwrap();

    assert_eq!(rt.block_on(source.client().get_image("8", None, None)).unwrap(), None);
}

#[test]
fn embed_art_disabled_does_nothing() {
    let mut server = Server::new();
    let any = server.mock("GET", Matcher::Any).expect(0).create();
    let td = tempdir().unwrap();
    let cfg = test_config(&server.url(), td.path());
    assert!(!cfg.art);
    let (prompt, _) = ScriptedPrompt::new(vec![]);
    let source = BeatportSource::from_config(&cfg, Box::new(prompt)).unwrap();
    let rt = tokio::runtime::Runtime::new().unwrap();

    let written = rt
        .block_on(source.embed_art("3001", &td.path().join("song.mp3")))
        .unwrap();
    assert!(!written);
    any.assert();
}

#[test]
fn embed_art_reports_unreadable_file() {
    let server = Server::new();
    let td = tempdir().unwrap();
    let mut cfg = test_config(&server.url(), td.path());
    cfg.art = true;
    let file = td.path().join("song.mp3");
    std::fs::write(&file, b"not audio").unwrap();
    let (prompt, _) = ScriptedPrompt::new(vec![]);
    let source = BeatportSource::from_config(&cfg, Box::new(prompt)).unwrap();
    let rt = tokio::runtime::Runtime::new().unwrap();

    assert!(rt.block_on(source.embed_art("3001", &file)).is_err());
}

#[test]
fn embed_art_writes_cover_then_skips_when_present() {
    let mut server = Server::new();
    let base = server.url();
    let _track = server
        .mock("GET", "/catalog/tracks/3001/")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(track_with_image(&base))
        .create();
    let image = server
        .mock("GET", "/img/1400x1400/abc.jpg")
        .with_status(200)
        .with_header("content-type", "image/png")
        .with_body(png_bytes())
        .expect(1)
        .create();

    let td = tempdir().unwrap();
    let mut cfg = test_config(&base, td.path());
    cfg.art = true;
    assert!(!cfg.art_overwrite);
    write_token_file(&cfg.token_path(), "tok", now() + 3600.0);
    let file = td.path().join("song.wav");
    write_silent_wav(&file);
    assert!(!art::has_cover(&file).unwrap());

    let (prompt, _) = ScriptedPrompt::new(vec![]);
    let source = BeatportSource::from_config(&cfg, Box::new(prompt)).unwrap();
    let rt = tokio::runtime::Runtime::new().unwrap();

    assert!(rt.block_on(source.embed_art("3001", &file)).unwrap());
    assert!(art::has_cover(&file).unwrap());

    // already has a cover and overwriting is off: no further image request
    assert!(!rt.block_on(source.embed_art("3001", &file)).unwrap());
    image.assert();
}
