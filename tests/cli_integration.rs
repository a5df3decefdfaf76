//! CLI tests: drive the built binary against a temporary project.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

/// Helper to create a test project with every collaborator file
fn setup_test_project() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("src/server/durable")).unwrap();
    fs::create_dir_all(dir.path().join("src/shared")).unwrap();

    fs::write(
        dir.path().join("vite.config.ts"),
        "export default defineConfig({\n  build: {\n    rollupOptions: {\n      input: {\n        main: 'index.html',\n      },\n    },\n  },\n});\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("src/server/index.ts"),
        "import { Hono } from 'hono';\n\nconst app = new Hono();\n\nexport default app;\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("src/shared/schemas.ts"),
        "import { z } from 'zod';\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("src/server/durable/user-shard.ts"),
        "import { DurableObject } from 'cloudflare:workers';\n\nexport class UserShard extends DurableObject {\n}\n",
    )
    .unwrap();

    dir
}

fn stackgen(root: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_stackgen"))
        .arg("--root")
        .arg(root)
        .args(args)
        .env("NO_COLOR", "1")
        .output()
        .unwrap()
}

#[test]
fn test_help_lists_commands() {
    let output = Command::new(env!("CARGO_BIN_EXE_stackgen"))
        .arg("--help")
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("create-page"));
    assert!(stdout.contains("create-table"));
    assert!(stdout.contains("create-webhook"));
}

#[test]
fn test_create_page_feed() {
    let project = setup_test_project();

    let output = stackgen(
        project.path(),
        &["create-page", "user-profile", "--type", "feed", "-y"],
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "{stdout}");
    assert!(stdout.contains("Summary:"));
    assert!(stdout.contains("Next steps:"));
    assert!(project
        .path()
        .join("src/client/user-profile/App.tsx")
        .is_file());

    let vite = fs::read_to_string(project.path().join("vite.config.ts")).unwrap();
    assert!(vite.contains("'user-profile': 'src/client/user-profile/index.html',"));
}

#[test]
fn test_invalid_name_exits_nonzero() {
    let project = setup_test_project();

    let output = stackgen(
        project.path(),
        &["create-page", "class", "--type", "static", "-y"],
    );

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("reserved word"));
    assert!(!project.path().join("src/client").exists());
}

#[test]
fn test_collision_exits_nonzero() {
    let project = setup_test_project();
    fs::create_dir_all(project.path().join("src/client/inbox")).unwrap();

    let output = stackgen(
        project.path(),
        &["create-page", "inbox", "--type", "static", "-y"],
    );

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("already exists"));
}

#[test]
fn test_dry_run_with_diff() {
    let project = setup_test_project();
    let before = fs::read_to_string(project.path().join("src/server/index.ts")).unwrap();

    let output = stackgen(
        project.path(),
        &["--dry-run", "--diff", "create-webhook", "stripe"],
    );

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("DRY RUN"));
    assert!(stdout.contains("+app.post('/webhooks/stripe', handleStripeWebhook);"));
    assert!(!project.path().join("src/server/webhooks").exists());
    assert_eq!(
        fs::read_to_string(project.path().join("src/server/index.ts")).unwrap(),
        before
    );
}

#[test]
fn test_rerun_reports_already_applied() {
    let project = setup_test_project();

    let first = stackgen(project.path(), &["create-table", "notes", "-y"]);
    assert!(first.status.success());

    let second = stackgen(project.path(), &["create-table", "notes", "-y"]);
    assert!(second.status.success());
    let stdout = String::from_utf8_lossy(&second.stdout);
    assert!(stdout.contains("Already applied to"));
}

#[test]
fn test_missing_route_file_is_a_warning_not_an_error() {
    let project = setup_test_project();
    fs::remove_file(project.path().join("src/server/index.ts")).unwrap();

    let output = stackgen(project.path(), &["create-webhook", "github", "-y"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("route file not found"));
    assert!(stdout.contains("by hand"));
}
