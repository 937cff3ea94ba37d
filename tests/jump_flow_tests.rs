//! End-to-end tests for the jump flow through the public API:
//! registry -> command builder -> executor, wired by the service.

use std::time::Duration;

use tempfile::TempDir;

use jumpline::command::Platform;
use jumpline::config::Config;
use jumpline::context::ProjectContext;
use jumpline::editors::{EditorRegistry, MemorySettings, NewEditor, TomlSettings};
use jumpline::service::JumpService;

fn new_editor(name: &str, path: &str, make_default: bool) -> NewEditor {
    NewEditor {
        name: name.to_string(),
        path: path.to_string(),
        kind: Some("intellij".to_string()),
        make_default,
    }
}

#[cfg(unix)]
#[tokio::test]
async fn jump_emits_the_exact_unix_command() {
    let service = JumpService::start_on(
        Config::default(),
        Box::new(MemorySettings::default()),
        Platform::Linux,
    )
    .unwrap();
    service
        .add_editor(new_editor("fake-ide", "/bin/sh", true))
        .unwrap();

    let context = ProjectContext::new("/proj", "/proj/src/main.kt", 42, 1).unwrap();
    let result = service.jump(&context).await;

    assert!(result.success, "error: {:?}", result.error);
    assert_eq!(
        result.command,
        "nohup '/bin/sh' --line 42 \"/proj/src/main.kt\" > /dev/null 2>&1 &"
    );
    assert!(result.process_id.is_some());
    service.dispose().await;
}

#[cfg(unix)]
#[tokio::test]
async fn repeated_jumps_hit_the_command_cache() {
    let service = JumpService::start_on(
        Config::default(),
        Box::new(MemorySettings::default()),
        Platform::Linux,
    )
    .unwrap();
    service
        .add_editor(new_editor("fake-ide", "/bin/sh", true))
        .unwrap();

    let context = ProjectContext::new("/proj", "/proj/src/main.kt", 42, 1).unwrap();
    let first = service.jump(&context).await;
    let second = service.jump(&context).await;
    assert!(first.success && second.success);

    // The second jump resolved its editor, command, and path check from
    // the caches.
    let diagnostics = service.diagnostics();
    assert!(diagnostics.cache.hits >= 2, "hits: {}", diagnostics.cache.hits);
    assert_eq!(diagnostics.executions.executions, 2);
    assert_eq!(diagnostics.executions.successes, 2);
    service.dispose().await;
}

#[tokio::test]
async fn missing_editor_executable_yields_failure_without_process() {
    let service = JumpService::start_on(
        Config::default(),
        Box::new(MemorySettings::default()),
        Platform::Linux,
    )
    .unwrap();
    service
        .add_editor(new_editor("ghost", "/no/such/ide/binary", true))
        .unwrap();

    let context = ProjectContext::new("/proj", "/proj/src/main.kt", 7, 1).unwrap();
    let result = service.jump(&context).await;

    assert!(!result.success);
    assert!(result.process_id.is_none());
    assert!(result.error.unwrap().contains("not found"));
    assert!(service.diagnostics().running.is_empty());
    service.dispose().await;
}

#[tokio::test]
async fn registry_persists_across_reopens() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("editors.toml");

    let idea_id = {
        let mut registry =
            EditorRegistry::open(Box::new(TomlSettings::new(path.clone()))).unwrap();
        registry
            .add(new_editor("idea", "/opt/idea/bin/idea", false))
            .unwrap();
        let clion = registry
            .add(new_editor("clion", "/opt/clion/bin/clion", false))
            .unwrap();
        registry.set_default(&clion.id).unwrap();
        registry.list()[0].id.clone()
    };

    let registry = EditorRegistry::open(Box::new(TomlSettings::new(path))).unwrap();
    assert_eq!(registry.len(), 2);
    assert_eq!(registry.default_editor().unwrap().name, "clion");
    assert_eq!(registry.list()[0].id, idea_id);
    assert_eq!(
        registry.list().iter().filter(|e| e.is_default).count(),
        1
    );
}

#[cfg(unix)]
#[tokio::test(start_paused = true)]
async fn trigger_bursts_are_debounced_end_to_end() {
    let service = JumpService::start_on(
        Config::default(),
        Box::new(MemorySettings::default()),
        Platform::Linux,
    )
    .unwrap();
    service
        .add_editor(new_editor("fake-ide", "/bin/sh", true))
        .unwrap();

    let context = ProjectContext::new("/proj", "/proj/src/main.kt", 3, 1).unwrap();
    for _ in 0..4 {
        service.trigger(context.clone());
        tokio::time::sleep(Duration::from_millis(25)).await;
    }

    tokio::time::sleep(Duration::from_secs(2)).await;
    for _ in 0..200 {
        if service.execution_stats().executions >= 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }

    assert_eq!(service.execution_stats().executions, 1);
    service.dispose().await;
}

#[tokio::test]
async fn dispose_clears_caches_and_trigger_state() {
    let service = JumpService::start_on(
        Config::default(),
        Box::new(MemorySettings::default()),
        Platform::Linux,
    )
    .unwrap();
    service
        .add_editor(new_editor("ghost", "/no/such/ide/binary", true))
        .unwrap();

    let context = ProjectContext::new("/proj", "/proj/a.rs", 1, 1).unwrap();
    let _ = service.jump(&context).await;
    assert!(service.diagnostics().cache.entries > 0);

    service.dispose().await;
    assert_eq!(service.diagnostics().cache.entries, 0);
    assert!(service.diagnostics().running.is_empty());
}
