use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use pretty_assertions::assert_eq;
use restyle_lib::{
    ArchiveError, BuildOutcome, BuildStep, Modification, ModificationSet, PackageBuilder,
    PackageError, ProjectMetadata,
};
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

const MANIFEST: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<RDF xmlns="http://www.w3.org/1999/02/22-rdf-syntax-ns#" xmlns:em="http://www.mozilla.org/2004/em-rdf#">
  <Description about="urn:mozilla:install-manifest">
    <em:id>jid1-theme@jetpack</em:id>
    <em:version>0.1</em:version>
    <em:name>theme-my-site-template</em:name>
    <em:description>a basic add-on</em:description>
    <em:creator></em:creator>
  </Description>
</RDF>
"#;

const SCRIPT: &str = r#"const { PageMod } = require('sdk/page-mod');
const { data } = require('sdk/self');

PageMod({
  include: '*',
  contentStyleFile: data.url('style.css')
});
"#;

const SCRIPT_ENTRY: &str = "resources/theme-my-site-template/lib/main.js";
const STYLE_ENTRY: &str = "resources/theme-my-site-template/data/style.css";

fn write_template(path: &Path, manifest: &str) {
    let mut writer = ZipWriter::new(File::create(path).unwrap());
    for (name, contents) in [
        ("install.rdf", manifest),
        ("bootstrap.js", "// loader"),
        (SCRIPT_ENTRY, SCRIPT),
        (STYLE_ENTRY, ""),
    ] {
        writer.start_file(name, SimpleFileOptions::default()).unwrap();
        writer.write_all(contents.as_bytes()).unwrap();
    }
    writer.finish().unwrap();
}

fn read_entry(path: &Path, entry: &str) -> String {
    let mut archive = ZipArchive::new(File::open(path).unwrap()).unwrap();
    let mut text = String::new();
    archive
        .by_name(entry)
        .unwrap()
        .read_to_string(&mut text)
        .unwrap();
    text
}

fn metadata(applied_to_domain: bool, url: &str) -> ProjectMetadata {
    ProjectMetadata {
        name: "example.com".to_string(),
        author: "Ada".to_string(),
        description: "Mod for Example Domain".to_string(),
        image: None,
        applied_to_domain,
        url: url.to_string(),
    }
}

fn two_mods() -> ModificationSet {
    [
        Modification::new("https://example.com/path?x=1", "a{color:red}"),
        Modification::new("https://example.com/other", "b{color:blue}"),
    ]
    .into_iter()
    .collect()
}

struct Fixture {
    _dir: tempfile::TempDir,
    template: PathBuf,
    scratch: PathBuf,
    out: PathBuf,
}

fn fixture(manifest: &str) -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let template = dir.path().join("theme-my-site-template.xpi");
    write_template(&template, manifest);
    let scratch = dir.path().join("scratch");
    fs::create_dir(&scratch).unwrap();
    let out = dir.path().join("out.xpi");
    Fixture {
        template,
        scratch,
        out,
        _dir: dir,
    }
}

fn save_to(path: PathBuf) -> impl FnMut(&str) -> Option<PathBuf> {
    move |_suggested: &str| Some(path.clone())
}

#[test]
fn test_build_rewrites_all_three_entries() {
    let fx = fixture(MANIFEST);
    let builder = PackageBuilder::new(&fx.template).with_scratch_dir(&fx.scratch);

    let outcome = builder
        .build(
            &metadata(true, "https://example.com/path?x=1"),
            &two_mods(),
            &mut save_to(fx.out.clone()),
        )
        .unwrap();

    assert_eq!(outcome, BuildOutcome::Saved(fx.out.clone()));
    assert_eq!(read_entry(&fx.out, STYLE_ENTRY), "a{color:red}\nb{color:blue}");

    let manifest = read_entry(&fx.out, "install.rdf");
    assert!(manifest.contains("<em:name>example.com</em:name>"));
    assert!(manifest.contains("<em:description>Mod for Example Domain</em:description>"));
    assert!(manifest.contains("<em:creator>Ada</em:creator>"));
    assert!(manifest.contains("<em:id>jid1-theme@jetpack</em:id>"));

    let script = read_entry(&fx.out, SCRIPT_ENTRY);
    assert!(script.contains("include: 'https://example.com/*',"));

    assert_eq!(read_entry(&fx.out, "bootstrap.js"), "// loader");
    assert_eq!(fs::read_dir(&fx.scratch).unwrap().count(), 0);
}

#[test]
fn test_page_scope_uses_exact_url() {
    let fx = fixture(MANIFEST);
    let builder = PackageBuilder::new(&fx.template);

    builder
        .build(
            &metadata(false, "https://example.com/path"),
            &two_mods(),
            &mut save_to(fx.out.clone()),
        )
        .unwrap();

    let script = read_entry(&fx.out, SCRIPT_ENTRY);
    assert!(script.contains("include: 'https://example.com/path',"));
}

#[test]
fn test_suggested_name_comes_from_metadata() {
    let fx = fixture(MANIFEST);
    let builder = PackageBuilder::new(&fx.template);
    let mut suggested = String::new();

    let outcome = builder
        .build(
            &metadata(false, "https://example.com/"),
            &two_mods(),
            &mut |name: &str| -> Option<PathBuf> {
                suggested = name.to_string();
                None
            },
        )
        .unwrap();

    assert_eq!(outcome, BuildOutcome::UserCancelled);
    assert_eq!(suggested, "example.com.xpi");
}

#[test]
fn test_cancel_leaves_template_untouched() {
    let fx = fixture(MANIFEST);
    let before = fs::read(&fx.template).unwrap();
    let builder = PackageBuilder::new(&fx.template).with_scratch_dir(&fx.scratch);

    let outcome = builder
        .build(
            &metadata(true, "https://example.com/"),
            &two_mods(),
            &mut |_: &str| -> Option<PathBuf> { None },
        )
        .unwrap();

    assert_eq!(outcome, BuildOutcome::UserCancelled);
    assert_eq!(fs::read(&fx.template).unwrap(), before);
    assert!(!fx.out.exists());
    assert_eq!(fs::read_dir(&fx.scratch).unwrap().count(), 0);
}

#[test]
fn test_missing_name_placeholder_is_an_integrity_error() {
    let manifest = MANIFEST.replace("theme-my-site-template", "already-renamed");
    let fx = fixture(&manifest);
    let builder = PackageBuilder::new(&fx.template).with_scratch_dir(&fx.scratch);

    let err = builder
        .build(
            &metadata(false, "https://example.com/"),
            &two_mods(),
            &mut save_to(fx.out.clone()),
        )
        .unwrap_err();

    assert!(err.is_integrity());
    match err {
        PackageError::Placeholder {
            entry,
            placeholder,
            found,
        } => {
            assert_eq!(entry, "install.rdf");
            assert_eq!(placeholder, "theme-my-site-template");
            assert_eq!(found, 0);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!fx.out.exists());
    assert_eq!(fs::read_dir(&fx.scratch).unwrap().count(), 0);
}

#[test]
fn test_duplicated_name_placeholder_is_an_integrity_error() {
    let manifest = MANIFEST.replace(
        "<em:version>0.1</em:version>",
        "<em:version>0.1</em:version>\n    <em:homepageURL>theme-my-site-template</em:homepageURL>",
    );
    let fx = fixture(&manifest);
    let builder = PackageBuilder::new(&fx.template);

    let err = builder
        .build(
            &metadata(false, "https://example.com/"),
            &two_mods(),
            &mut save_to(fx.out.clone()),
        )
        .unwrap_err();

    assert!(matches!(err, PackageError::Placeholder { found: 2, .. }));
    assert!(!fx.out.exists());
}

#[test]
fn test_missing_template_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let builder = PackageBuilder::new(dir.path().join("nope.xpi"));

    let err = builder
        .build(
            &metadata(false, "https://example.com/"),
            &two_mods(),
            &mut |_: &str| -> Option<PathBuf> { None },
        )
        .unwrap_err();

    assert!(matches!(err, PackageError::TemplateMissing { .. }));
}

#[test]
fn test_missing_script_entry_names_the_entry() {
    let dir = tempfile::tempdir().unwrap();
    let template = dir.path().join("t.xpi");
    let mut writer = ZipWriter::new(File::create(&template).unwrap());
    writer
        .start_file("install.rdf", SimpleFileOptions::default())
        .unwrap();
    writer.write_all(MANIFEST.as_bytes()).unwrap();
    writer.finish().unwrap();

    let err = PackageBuilder::new(&template)
        .build(
            &metadata(false, "https://example.com/"),
            &two_mods(),
            &mut |_: &str| -> Option<PathBuf> { None },
        )
        .unwrap_err();

    match err {
        PackageError::Archive {
            step: BuildStep::ReadEntry,
            entry: Some(entry),
            source: ArchiveError::MissingEntry(_),
        } => assert_eq!(entry, SCRIPT_ENTRY),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_empty_modification_set_is_rejected() {
    let fx = fixture(MANIFEST);

    let err = PackageBuilder::new(&fx.template)
        .build(
            &metadata(false, "https://example.com/"),
            &ModificationSet::new(),
            &mut save_to(fx.out.clone()),
        )
        .unwrap_err();

    assert!(matches!(err, PackageError::EmptyModificationSet));
    assert!(!fx.out.exists());
}

#[test]
fn test_domain_scope_on_file_page_is_rejected() {
    let fx = fixture(MANIFEST);
    let before = fs::read(&fx.template).unwrap();

    let err = PackageBuilder::new(&fx.template)
        .build(
            &metadata(true, "file:///home/u/index.html"),
            &two_mods(),
            &mut save_to(fx.out.clone()),
        )
        .unwrap_err();

    assert!(matches!(err, PackageError::OpaqueOrigin { .. }));
    assert!(!fx.out.exists());
    assert_eq!(fs::read(&fx.template).unwrap(), before);
}

#[test]
fn test_user_values_stay_inside_their_fields() {
    let fx = fixture(MANIFEST);
    let metadata = ProjectMetadata {
        name: "A</em:name>".to_string(),
        author: "<b>".to_string(),
        description: "Tom & Jerry".to_string(),
        image: None,
        applied_to_domain: false,
        url: "https://example.com/it's".to_string(),
    };

    PackageBuilder::new(&fx.template)
        .build(&metadata, &two_mods(), &mut save_to(fx.out.clone()))
        .unwrap();

    let manifest = read_entry(&fx.out, "install.rdf");
    assert!(manifest.contains("<em:name>A&lt;/em:name&gt;</em:name>"));
    assert!(manifest.contains("<em:description>Tom &amp; Jerry</em:description>"));
    assert!(manifest.contains("<em:creator>&lt;b&gt;</em:creator>"));

    let script = read_entry(&fx.out, SCRIPT_ENTRY);
    assert!(script.contains(r"include: 'https://example.com/it\'s',"));
}

#[test]
fn test_template_directory_is_an_integrity_error() {
    let dir = tempfile::tempdir().unwrap();

    let err = PackageBuilder::new(dir.path())
        .build(
            &metadata(false, "https://example.com/"),
            &two_mods(),
            &mut |_: &str| -> Option<PathBuf> { None },
        )
        .unwrap_err();

    assert!(matches!(err, PackageError::TemplateMissing { .. }));
    assert!(err.is_integrity());
}
