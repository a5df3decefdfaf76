//! Patcher behaviour against realistic collaborator files.

use stackgen::patch::{
    CollaboratorKind, ImportSpec, InsertionTarget, PatchOutcome, PatchWarning, Patcher,
};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const ROUTES: &str = r#"import { Hono } from 'hono';
import { getSessionHandler } from './api/session';

const app = new Hono();

app.get('/api/session', getSessionHandler);

app.get('*', (c) => c.env.ASSETS.fetch(c.req.raw));

export default app;
"#;

const VITE: &str = r#"import { defineConfig } from 'vite';
import solid from 'vite-plugin-solid';
import { resolve } from 'path';

export default defineConfig({
  plugins: [solid()],
  build: {
    rollupOptions: {
      input: {
        main: resolve(__dirname, 'index.html'),
      },
    },
  },
});
"#;

const SHARD: &str = r#"import { DurableObject } from 'cloudflare:workers';

export class UserShard extends DurableObject {
  async ping() {
    return 'pong';
  }
}
"#;

fn write(dir: &TempDir, rel: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, contents).unwrap();
    path
}

fn feed_routes(file: &Path) -> InsertionTarget {
    InsertionTarget::new(
        file,
        CollaboratorKind::Routes,
        "// user-profile\napp.get('/api/user-profile', listUserProfileItemsHandler);\n",
    )
    .marker("'/api/user-profile'")
    .import(ImportSpec::named(
        "./api/user-profile",
        &["listUserProfileItemsHandler"],
    ))
}

#[test]
fn test_route_registration_before_catch_all() {
    let dir = TempDir::new().unwrap();
    let file = write(&dir, "src/server/index.ts", ROUTES);

    let outcome = Patcher::new().apply(&feed_routes(&file)).unwrap();
    assert!(matches!(outcome, PatchOutcome::Applied { warning: None, .. }));

    assert_eq!(
        fs::read_to_string(&file).unwrap(),
        r#"import { Hono } from 'hono';
import { listUserProfileItemsHandler } from './api/user-profile';
import { getSessionHandler } from './api/session';

const app = new Hono();

app.get('/api/session', getSessionHandler);

// user-profile
app.get('/api/user-profile', listUserProfileItemsHandler);

app.get('*', (c) => c.env.ASSETS.fetch(c.req.raw));

export default app;
"#
    );
}

#[test]
fn test_patching_twice_is_byte_identical() {
    let dir = TempDir::new().unwrap();
    let routes = write(&dir, "src/server/index.ts", ROUTES);
    let shard = write(&dir, "src/server/durable/user-shard.ts", SHARD);
    let patcher = Patcher::new();

    let shard_target = InsertionTarget::new(
        &shard,
        CollaboratorKind::UserShard,
        "  async listUserProfileItems() {\n    return [];\n  }\n",
    )
    .marker("listUserProfileItems(")
    .import(ImportSpec::types(
        "../../shared/schemas",
        &["UserProfileItem"],
    ));

    for target in [feed_routes(&routes), shard_target] {
        let first = patcher.apply(&target).unwrap();
        assert!(first.changed());
        let after_first = fs::read(&target.file).unwrap();

        let second = patcher.apply(&target).unwrap();
        assert!(matches!(second, PatchOutcome::AlreadyApplied { .. }));
        assert_eq!(fs::read(&target.file).unwrap(), after_first);
    }
}

#[test]
fn test_existing_route_section_left_unchanged() {
    let dir = TempDir::new().unwrap();
    let already = ROUTES.replace(
        "app.get('/api/session', getSessionHandler);\n",
        "app.get('/api/session', getSessionHandler);\napp.get('/api/user-profile', listUserProfileItemsHandler);\n",
    );
    let file = write(&dir, "src/server/index.ts", &already);

    let outcome = Patcher::new().apply(&feed_routes(&file)).unwrap();
    assert!(matches!(outcome, PatchOutcome::AlreadyApplied { .. }));

    let after = fs::read_to_string(&file).unwrap();
    assert_eq!(after.lines().count(), already.lines().count());
    assert_eq!(after, already);
}

#[test]
fn test_no_catch_all_or_export_appends_with_warning() {
    let dir = TempDir::new().unwrap();
    let bare = "import { Hono } from 'hono';\n\nconst app = new Hono();\napp.get('/api/session', s);\n";
    let file = write(&dir, "src/server/index.ts", bare);

    let outcome = Patcher::new().apply(&feed_routes(&file)).unwrap();
    assert!(matches!(
        outcome.warning(),
        Some(PatchWarning::AppendedAtEnd { .. })
    ));

    let after = fs::read_to_string(&file).unwrap();
    assert!(after.ends_with(
        "app.get('/api/session', s);\n\n// user-profile\napp.get('/api/user-profile', listUserProfileItemsHandler);\n"
    ));
}

#[test]
fn test_routes_land_after_global_middleware() {
    let dir = TempDir::new().unwrap();
    let guarded = r#"import { Hono } from 'hono';
import { authMiddleware } from './middleware/auth';

const app = new Hono();

app.use('*', authMiddleware);

app.get('/api/session', getSessionHandler);

export default app;
"#;
    let file = write(&dir, "src/server/index.ts", guarded);

    let outcome = Patcher::new().apply(&feed_routes(&file)).unwrap();
    assert!(matches!(outcome, PatchOutcome::Applied { warning: None, .. }));

    let after = fs::read_to_string(&file).unwrap();
    let middleware = after.find("app.use('*', authMiddleware);").unwrap();
    let route = after.find("app.get('/api/user-profile'").unwrap();
    let export = after.find("export default app;").unwrap();
    assert!(middleware < route && route < export);
    assert!(after.ends_with(
        "// user-profile\napp.get('/api/user-profile', listUserProfileItemsHandler);\n\nexport default app;\n"
    ));
}

#[test]
fn test_shard_methods_skip_code_after_class() {
    let dir = TempDir::new().unwrap();
    let with_helper = format!("{SHARD}\nfunction helper() {{\n  return 2;\n}}\n");
    let file = write(&dir, "user-shard.ts", &with_helper);
    let target = InsertionTarget::new(
        &file,
        CollaboratorKind::UserShard,
        "  async getFeedStats() {\n    return null;\n  }",
    );

    Patcher::new().apply(&target).unwrap();

    let after = fs::read_to_string(&file).unwrap();
    assert!(after.contains(
        "    return 'pong';\n  }\n\n  async getFeedStats() {\n    return null;\n  }\n}\n\nfunction helper() {\n  return 2;\n}\n"
    ));
}

#[test]
fn test_shard_with_unbalanced_class_is_skipped() {
    let dir = TempDir::new().unwrap();
    let broken = "export class UserShard extends DurableObject {\n  ping() {\n    return 1;\n}\n";
    let file = write(&dir, "user-shard.ts", broken);
    let target = InsertionTarget::new(&file, CollaboratorKind::UserShard, "  a() {}");

    let outcome = Patcher::new().apply(&target).unwrap();
    assert!(matches!(
        outcome,
        PatchOutcome::Skipped {
            warning: PatchWarning::AnchorNotFound { .. },
            ..
        }
    ));
    assert_eq!(fs::read_to_string(&file).unwrap(), broken);
}

#[test]
fn test_vite_entry_keyed_by_name() {
    let dir = TempDir::new().unwrap();
    let file = write(&dir, "vite.config.ts", VITE);
    let target = InsertionTarget::new(
        &file,
        CollaboratorKind::ViteConfig,
        "'user-profile': resolve(__dirname, 'src/client/user-profile/index.html')",
    )
    .marker("'user-profile':");

    Patcher::new().apply(&target).unwrap();

    let after = fs::read_to_string(&file).unwrap();
    assert_eq!(after.matches("'user-profile':").count(), 1);
    assert!(after.contains(
        "        main: resolve(__dirname, 'index.html'),\n        'user-profile': resolve(__dirname, 'src/client/user-profile/index.html'),\n      },"
    ));
}

#[test]
fn test_shard_methods_land_inside_class() {
    let dir = TempDir::new().unwrap();
    let file = write(&dir, "user-shard.ts", SHARD);
    let target = InsertionTarget::new(
        &file,
        CollaboratorKind::UserShard,
        "  async getFeedStats() {\n    return null;\n  }",
    )
    .import(ImportSpec::types("../../shared/schemas", &["FeedStats"]));

    Patcher::new().apply(&target).unwrap();

    assert_eq!(
        fs::read_to_string(&file).unwrap(),
        r#"import { DurableObject } from 'cloudflare:workers';
import type { FeedStats } from '../../shared/schemas';

export class UserShard extends DurableObject {
  async ping() {
    return 'pong';
  }

  async getFeedStats() {
    return null;
  }
}
"#
    );
}

#[test]
fn test_missing_vite_config_reports_fragment() {
    let dir = TempDir::new().unwrap();
    let target = InsertionTarget::new(
        dir.path().join("vite.config.ts"),
        CollaboratorKind::ViteConfig,
        "'feed': 'src/client/feed/index.html'",
    );

    match Patcher::new().apply(&target).unwrap() {
        PatchOutcome::Skipped {
            warning, fragment, ..
        } => {
            assert!(matches!(warning, PatchWarning::MissingCollaborator { .. }));
            assert_eq!(fragment, "'feed': 'src/client/feed/index.html'");
        }
        other => panic!("unexpected outcome {other:?}"),
    }
    assert!(!dir.path().join("vite.config.ts").exists());
}
