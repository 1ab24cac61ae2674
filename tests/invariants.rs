//! Contract Invariant Tests
//!
//! These tests verify the guarantees every banner run relies on.

use std::fs;
use std::path::Path;

use bannerforge::{
    batch,
    palettes::HexColor,
    BannerPipeline, BannerSpec, ErrorKind, Format, PaletteStore, TemplateBody, TemplateStore,
};

fn spec(text: &str) -> BannerSpec {
    BannerSpec { subtitle: Some("Ship it".to_string()), ..BannerSpec::new(text) }
}

fn files_in(dir: &Path) -> Vec<String> {
    let mut names: Vec<_> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn invariant_rendering_is_deterministic() {
    let pipeline = BannerPipeline::default();
    let banner = BannerSpec { palette: Some("ember".into()), ..spec("Forge") };

    for format in Format::ALL {
        let first = pipeline.render(&banner, format).unwrap();
        let second = pipeline.render(&banner, format).unwrap();
        assert_eq!(first, second, "{} output differs between runs", format);
    }
}

#[test]
fn invariant_svg_placeholders_fully_substituted() {
    let pipeline = BannerPipeline::default();
    let styles: Vec<String> = pipeline.templates().svg_styles().into_iter().map(String::from).collect();

    for style in styles {
        for subtitle in [None, Some("Sub {{TITLE}}".to_string())] {
            let banner = BannerSpec { style: Some(style.clone()), subtitle, ..BannerSpec::new("{{TEXT}}") };
            let svg = String::from_utf8(pipeline.render(&banner, Format::Svg).unwrap().bytes).unwrap();
            assert!(!svg.contains("{{"), "placeholder left in style {}", style);
        }
    }
}

#[test]
fn invariant_template_with_unknown_token_never_written() {
    let dir = tempfile::tempdir().unwrap();
    let templates_dir = dir.path().join("templates");
    fs::create_dir(&templates_dir).unwrap();
    fs::write(templates_dir.join("logo.svg"), "<svg>{{TEXT}} {{LOGO_URL}}</svg>").unwrap();

    let mut templates = TemplateStore::builtin();
    templates.load_dir(&templates_dir).unwrap();
    let pipeline = BannerPipeline::new(PaletteStore::builtin(), templates);

    let out = dir.path().join("logo.svg");
    let banner = BannerSpec { style: Some("logo".into()), ..BannerSpec::new("Acme") };
    let err = pipeline.generate(&banner, Format::Svg, &out).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ParseFailure);
    assert!(!out.exists());
}

#[test]
fn invariant_palettes_have_valid_colors() {
    let store = PaletteStore::builtin();
    for palette in store.list() {
        let resolved = store.resolve(&palette.name).unwrap();
        for color in [&resolved.background, &resolved.accent, &resolved.text, &resolved.muted] {
            assert!(HexColor::parse(color.as_str()).is_some());
            assert_eq!(color.as_str().len(), 7);
        }
    }
    assert_eq!(store.resolve("does-not-exist").unwrap_err().kind(), ErrorKind::NotFound);
}

#[test]
fn invariant_template_lookup_fails_closed() {
    let store = TemplateStore::builtin();
    assert_eq!(store.resolve(Format::Svg, "missing").unwrap_err().kind(), ErrorKind::NotFound);
    assert!(matches!(
        store.resolve(Format::Ascii, "standard").unwrap().body,
        TemplateBody::AsciiFont(_)
    ));
}

#[test]
fn invariant_batch_isolates_failures() {
    let dir = tempfile::tempdir().unwrap();
    let spec_path = dir.path().join("banners.json");
    fs::write(
        &spec_path,
        r#"[
            {"text": "Alpha", "palette": "ocean", "formats": ["svg"]},
            {"text": "Beta", "palette": "no-such-palette", "formats": ["svg"]},
            {"text": "Gamma", "kind": "png"},
            {"text": "Delta", "formats": ["ascii"], "font": "block"}
        ]"#,
    )
    .unwrap();
    let out_dir = dir.path().join("out");

    let report = batch::run(&BannerPipeline::default(), &spec_path, &out_dir).unwrap();

    assert_eq!(report.entries, 4);
    assert_eq!(report.succeeded, 3);
    assert_eq!(report.failed, 1);
    assert_eq!(report.artifacts.len(), 3);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].entry, 2);
    assert_eq!(report.failures[0].kind, ErrorKind::NotFound);
    assert!(report.has_failures());
    assert_eq!(files_in(&out_dir), vec!["Alpha.svg", "Delta.txt", "Gamma.png"]);
}

#[test]
fn invariant_batch_isolates_failing_format() {
    let dir = tempfile::tempdir().unwrap();
    let spec_path = dir.path().join("banners.json");
    fs::write(
        &spec_path,
        r#"[
            {"text": "Mixed", "style": "no-such-style", "formats": ["svg", "ascii"]},
            {"text": "Plain"}
        ]"#,
    )
    .unwrap();
    let out_dir = dir.path().join("out");

    let report = batch::run(&BannerPipeline::default(), &spec_path, &out_dir).unwrap();

    assert_eq!((report.succeeded, report.failed), (1, 1));
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].entry, 1);
    assert_eq!(report.failures[0].format, Some(Format::Svg));
    assert_eq!(report.failures[0].kind, ErrorKind::NotFound);
    assert_eq!(files_in(&out_dir), vec!["Mixed.txt", "Plain.svg"]);
}

#[test]
fn invariant_batch_yaml_and_report() {
    let dir = tempfile::tempdir().unwrap();
    let spec_path = dir.path().join("banners.yml");
    fs::write(
        &spec_path,
        "- text: One\n  formats: [ascii, svg, png]\n  output: first\n- text: Two\n  subtitle: second\n",
    )
    .unwrap();
    let out_dir = dir.path().join("out");

    let report = batch::run(&BannerPipeline::default(), &spec_path, &out_dir).unwrap();
    assert!(!report.has_failures());
    assert_eq!(files_in(&out_dir), vec!["Two.svg", "first.png", "first.svg", "first.txt"]);

    let report_path = dir.path().join("report.json");
    report.write_json(&report_path).unwrap();
    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&report_path).unwrap()).unwrap();
    assert_eq!(json["report"]["succeeded"], 2);
    assert_eq!(json["report_sha256"].as_str().unwrap().len(), 64);
}

#[test]
fn invariant_combo_writes_three_files() {
    let dir = tempfile::tempdir().unwrap();
    let prefix = dir.path().join("out").join("x");

    let written = BannerPipeline::default().combo(&BannerSpec::new("X"), &prefix).unwrap();

    assert_eq!(written.len(), 3);
    assert_eq!(files_in(&dir.path().join("out")), vec!["x.png", "x.svg", "x.txt"]);
    let png = fs::read(prefix.with_extension("png")).unwrap();
    assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
}

#[test]
fn invariant_empty_text_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = BannerPipeline::default();

    for format in Format::ALL {
        let out = dir.path().join(format!("empty.{}", format.extension()));
        let err = pipeline.generate(&BannerSpec::new(""), format, &out).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert!(!out.exists());
    }

    let err = pipeline.combo(&BannerSpec::new(""), &dir.path().join("combo")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert!(files_in(dir.path()).is_empty());
}
