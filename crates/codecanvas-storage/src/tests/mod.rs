use super::*;
use chrono::TimeZone;
use tempfile::tempdir;

fn workspace(name: &str, minute: u32) -> CanvasWorkspace {
    CanvasWorkspace {
        name: name.to_string(),
        unique_id: Uuid::new_v4(),
        camera_position: Vec2::new(-412.375, 1033.0625),
        canvas_scale: 0.6180339887,
        serialized_state: r#"{"version":1,"editors":[],"edges":[]}"#.to_string(),
        group_id_set: vec![3, 7, 12],
        updated_at: Utc.with_ymd_and_hms(2026, 3, 14, 9, minute, 0).unwrap(),
    }
}

#[test]
fn test_schema_version_recorded() -> Result<(), StorageError> {
    let storage = Storage::new_in_memory()?;
    assert_eq!(storage.schema_version()?, SCHEMA_VERSION);
    Ok(())
}

#[test]
fn test_round_trip_is_exact() -> Result<(), StorageError> {
    let storage = Storage::new_in_memory()?;
    let saved = workspace("W1", 0);
    storage.save_workspace(&saved)?;

    let loaded = storage.get_workspace(saved.unique_id)?.unwrap();
    assert_eq!(loaded, saved);
    Ok(())
}

#[test]
fn test_resave_overwrites_same_id() -> Result<(), StorageError> {
    let storage = Storage::new_in_memory()?;
    let mut saved = workspace("W1", 0);
    storage.save_workspace(&saved)?;

    saved.camera_position = Vec2::new(5.0, 6.0);
    saved.canvas_scale = 1.5;
    saved.group_id_set = vec![1];
    storage.save_workspace(&saved)?;

    assert_eq!(storage.workspace_count()?, 1);
    let loaded = storage.get_workspace(saved.unique_id)?.unwrap();
    assert_eq!(loaded.camera_position, Vec2::new(5.0, 6.0));
    assert_eq!(loaded.canvas_scale, 1.5);
    assert_eq!(loaded.group_id_set, vec![1]);
    Ok(())
}

#[test]
fn test_list_most_recent_first() -> Result<(), StorageError> {
    let storage = Storage::new_in_memory()?;
    storage.save_workspace(&workspace("old", 1))?;
    storage.save_workspace(&workspace("new", 30))?;
    storage.save_workspace(&workspace("middle", 10))?;

    let names: Vec<String> = storage
        .list_workspaces()?
        .into_iter()
        .map(|w| w.name)
        .collect();
    assert_eq!(names, vec!["new", "middle", "old"]);
    Ok(())
}

#[test]
fn test_delete_workspace() -> Result<(), StorageError> {
    let storage = Storage::new_in_memory()?;
    let saved = workspace("W1", 0);
    storage.save_workspace(&saved)?;

    assert!(storage.delete_workspace(saved.unique_id)?);
    assert!(!storage.delete_workspace(saved.unique_id)?);
    assert!(storage.get_workspace(saved.unique_id)?.is_none());
    Ok(())
}

#[test]
fn test_malformed_camera_is_repaired() -> Result<(), StorageError> {
    let storage = Storage::new_in_memory()?;
    let id = Uuid::new_v4();
    storage.conn.execute(
        "INSERT INTO canvas_workspace (unique_id, name, camera_x, camera_y, canvas_scale, serialized_state, group_id_set, updated_at)
         VALUES (?1, 'broken', 12.0, 4.0, 55.0, NULL, '', '2026-01-01T00:00:00Z')",
        params![id.to_string()],
    )?;

    let loaded = storage.get_workspace(id)?.unwrap();
    assert_eq!(loaded.canvas_scale, 2.0);
    assert_eq!(loaded.camera_position, Vec2::new(12.0, 4.0));
    assert!(loaded.group_id_set.is_empty());
    assert!(loaded.serialized_state.is_empty());
    Ok(())
}

#[test]
fn test_file_database_persists_across_opens() -> Result<(), StorageError> {
    let dir = tempdir().map_err(|e| StorageError::Other(e.to_string()))?;
    let path = dir.path().join("canvas.db");
    let saved = workspace("W1", 0);
    {
        let storage = Storage::open(&path)?;
        storage.save_workspace(&saved)?;
    }

    let storage = Storage::open(&path)?;
    assert_eq!(storage.get_workspace(saved.unique_id)?, Some(saved));
    Ok(())
}

#[test]
fn test_newer_schema_rejected() -> Result<(), StorageError> {
    let dir = tempdir().map_err(|e| StorageError::Other(e.to_string()))?;
    let path = dir.path().join("canvas.db");
    {
        let storage = Storage::open(&path)?;
        storage.set_schema_version(SCHEMA_VERSION + 1)?;
    }
    assert!(matches!(Storage::open(&path), Err(StorageError::Other(_))));
    Ok(())
}
