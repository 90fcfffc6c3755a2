//! End-to-end tests for the `repo-meta profiles` command.

mod common;
use common::prelude::*;

#[test]
fn test_profiles_lists_bundled_profiles() {
    let fixture = TestFixture::new();
    fixture
        .command()
        .arg("profiles")
        .assert()
        .success()
        .stdout(predicate::str::contains("default (shared)"))
        .stdout(predicate::str::contains("pure-python"))
        .stdout(predicate::str::contains("c-extension"));
}

#[test]
fn test_profiles_shows_overrides() {
    let fixture = TestFixture::new()
        .with_file("templates/default/tox.ini.j2", "[tox]\n")
        .with_file("templates/default/editorconfig.j2", "root = true\n")
        .with_file("templates/plone/tox.ini.j2", "[tox]\nenvlist = test\n")
        .with_file("templates/plone/packages.txt", "plone.api\n");
    fixture
        .command()
        .arg("profiles")
        .arg("--templates")
        .arg(fixture.path().join("templates"))
        .assert()
        .success()
        .stdout(predicate::str::contains("plone (overrides: tox.ini.j2)"));
}

#[test]
fn test_profiles_with_packages() {
    let fixture = TestFixture::new()
        .with_file("templates/default/tox.ini.j2", "[tox]\n")
        .with_file("templates/plone/packages.txt", "plone.api\nplone.restapi\n");
    fixture
        .command()
        .arg("profiles")
        .arg("--packages")
        .env("REPO_META_TEMPLATES", fixture.path().join("templates"))
        .assert()
        .success()
        .stdout(predicate::str::contains("- plone.api"))
        .stdout(predicate::str::contains("- plone.restapi"));
}

#[test]
fn test_profiles_missing_template_root() {
    let fixture = TestFixture::new();
    fixture
        .command()
        .arg("profiles")
        .arg("--templates")
        .arg(fixture.path().join("nowhere"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Template directory not found"))
        .stderr(predicate::str::contains("REPO_META_TEMPLATES"));
}

#[test]
fn test_profiles_empty_root() {
    let fixture = TestFixture::new().with_dir("templates");
    fixture
        .command()
        .arg("profiles")
        .arg("--templates")
        .arg(fixture.path().join("templates"))
        .assert()
        .success()
        .stdout(predicate::str::contains("No profiles found"));
}
