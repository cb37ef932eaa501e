//! End-to-end tests for the `create` command.

mod common;
use common::prelude::*;

#[test]
fn test_create_stage_writes_stage_and_shadow_release() {
    let fixture = TestFixture::new().with_sample_inventory();

    fixture
        .command()
        .args(["create", "stage", "beta"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created stage beta"));

    fixture
        .child("inventory/classes/stages/beta.yml")
        .assert(predicate::str::contains("beta"));
    fixture
        .child("inventory/classes/releases/stage/beta.yml")
        .assert(predicate::path::exists());
}

#[test]
fn test_create_stage_twice_fails() {
    let fixture = TestFixture::new().with_sample_inventory();

    fixture
        .command()
        .args(["create", "stage", "alpha"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("The stage 'alpha' already exists"));
}

#[test]
fn test_create_app_in_existing_group() {
    let fixture = TestFixture::new().with_sample_inventory();

    fixture
        .command()
        .args(["create", "app", "app9", "--group", "test"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created app app9 in group test"));

    fixture
        .child("inventory/classes/apps/test/app9.yml")
        .assert(predicate::str::contains("artifacts"));
    fixture
        .child("inventory/classes/apps/test.yml")
        .assert(predicate::str::contains("apps.test.app1"))
        .assert(predicate::str::contains("apps.test.app9"));
}

#[test]
fn test_create_app_creates_missing_group() {
    let fixture = TestFixture::new().with_sample_inventory();

    fixture
        .command()
        .args(["create", "app", "billing", "-g", "payments"])
        .assert()
        .success();

    fixture
        .child("inventory/classes/apps/payments.yml")
        .assert(predicate::str::contains("apps.payments.billing"));
    fixture
        .child("inventory/classes/apps/payments/billing.yml")
        .assert(predicate::path::exists());
}

#[test]
fn test_create_app_name_taken_in_other_group() {
    let fixture = TestFixture::new().with_sample_inventory();

    fixture
        .command()
        .args(["create", "app", "app1", "--group", "other"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("The app 'app1' already exists"));

    fixture
        .child("inventory/classes/apps/other/app1.yml")
        .assert(predicate::path::missing());
}

#[test]
fn test_create_app_from_project_template() {
    let fixture = TestFixture::new().with_sample_inventory().with_file(
        ".gosh/templates/service.yml",
        r#"parameters:
  "{{name}}":
    team: core
    artifacts:
      docker: "[gosh:repo:docker]/{{name}}:[gosh:version]"
"#,
    );

    fixture
        .command()
        .args(["create", "app", "gateway", "-g", "test", "-t", "service"])
        .assert()
        .success();

    fixture
        .child("inventory/classes/apps/test/gateway.yml")
        .assert(predicate::str::contains("team: core"))
        .assert(predicate::str::contains("[gosh:repo:docker]/gateway:[gosh:version]"));
}

#[test]
fn test_create_app_from_missing_template() {
    let fixture = TestFixture::new().with_sample_inventory();

    fixture
        .command()
        .args(["create", "app", "gateway", "-g", "test", "-t", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("App template 'nope' not found"));
}

#[test]
fn test_create_release_from_stage() {
    let fixture = TestFixture::new().with_sample_inventory();

    fixture
        .command()
        .args(["create", "release", "product/2024.R2", "--from-stage", "alpha"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created release product/2024.R2"));

    fixture
        .child("inventory/classes/releases/product/2024.R2.yml")
        .assert(predicate::str::contains("version: 1.0.0"))
        .assert(predicate::str::contains("version: 3.0.0"));
}

#[test]
fn test_create_release_from_release() {
    let fixture = TestFixture::new().with_sample_inventory();

    fixture
        .command()
        .args(["create", "release", "hotfix/2024.R1.1", "-R", "product/2024.R1"])
        .assert()
        .success();

    fixture
        .child("inventory/classes/releases/hotfix/2024.R1.1.yml")
        .assert(predicate::str::contains("version: 0.9.0"));
}

#[test]
fn test_create_release_needs_a_source() {
    let fixture = TestFixture::new().with_sample_inventory();

    fixture
        .command()
        .args(["create", "release", "product/2024.R2"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--from-stage"));
}

#[test]
fn test_create_release_of_reserved_type() {
    let fixture = TestFixture::new().with_sample_inventory();

    fixture
        .command()
        .args(["create", "release", "stage/alpha2", "-S", "alpha"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid release name 'stage/alpha2'"))
        .stderr(predicate::str::contains("product, hotfix"));
}

#[test]
fn test_create_release_from_missing_stage() {
    let fixture = TestFixture::new().with_sample_inventory();

    fixture
        .command()
        .args(["create", "release", "product/2024.R2", "-S", "ghost"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("ghost"));

    fixture
        .child("inventory/classes/releases/product/2024.R2.yml")
        .assert(predicate::path::missing());
}

#[test]
fn test_create_push_without_repository_url() {
    let fixture = TestFixture::new().with_sample_inventory();

    fixture
        .command()
        .args(["create", "stage", "beta", "--push"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("repository"));

    fixture
        .child("inventory/classes/stages/beta.yml")
        .assert(predicate::path::missing());
}

#[test]
fn test_create_with_workdir_flag() {
    let fixture = TestFixture::new().with_sample_inventory();
    let other = assert_fs::TempDir::new().unwrap();

    let mut cmd = fixture.command();
    cmd.current_dir(other.path())
        .args(["create", "stage", "gamma", "--workdir"])
        .arg(fixture.path())
        .assert()
        .success();

    fixture
        .child("inventory/classes/stages/gamma.yml")
        .assert(predicate::path::exists());
}

#[test]
fn test_create_with_workdir_env() {
    let fixture = TestFixture::new().with_sample_inventory();
    let other = assert_fs::TempDir::new().unwrap();

    let mut cmd = fixture.command();
    cmd.current_dir(other.path())
        .env("GOSH_WORKING_DIR", fixture.path())
        .args(["create", "stage", "delta"])
        .assert()
        .success();

    fixture
        .child("inventory/classes/stages/delta.yml")
        .assert(predicate::path::exists());
}
