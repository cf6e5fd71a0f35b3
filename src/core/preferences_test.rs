#[cfg(test)]
mod tests {
    use crate::core::{PreferenceStore, Preferences, TrackId};
    use crate::core::{DEFAULT_VOLUME, DEFAULT_WINDOW_HEIGHT, DEFAULT_WINDOW_WIDTH};

    #[test]
    fn test_defaults_when_empty() {
        let preferences = Preferences::new();
        assert_eq!(preferences.volume(TrackId(1)), DEFAULT_VOLUME);
        assert_eq!(preferences.window_size(), (DEFAULT_WINDOW_WIDTH, DEFAULT_WINDOW_HEIGHT));
    }

    #[test]
    fn test_volume_is_keyed_by_track_id_text() {
        let mut preferences = Preferences::new();
        preferences.set_volume(TrackId(2), 40);

        assert_eq!(preferences.volume(TrackId(2)), 40);
        assert_eq!(preferences.volume(TrackId(1)), DEFAULT_VOLUME);
        assert!(preferences.to_json().unwrap().contains("\"2\": 40"));
    }

    #[test]
    fn test_out_of_range_values_are_clamped_or_defaulted() {
        let preferences = Preferences::from_json(
            r#"{"1": 250, "2": -5, "3": "loud", "window_width": 0, "window_height": -20}"#,
        )
        .unwrap();

        assert_eq!(preferences.volume(TrackId(1)), 100);
        assert_eq!(preferences.volume(TrackId(2)), 0);
        assert_eq!(preferences.volume(TrackId(3)), DEFAULT_VOLUME);
        assert_eq!(preferences.window_size(), (DEFAULT_WINDOW_WIDTH, DEFAULT_WINDOW_HEIGHT));
    }

    #[test]
    fn test_window_size_round_trip() {
        let mut preferences = Preferences::new();
        preferences.set_window_size(1280, 720);
        assert_eq!(preferences.window_size(), (1280, 720));
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = PreferenceStore::at(dir.path().join("absent.json"));
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_corrupt_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{ not json").unwrap();

        let store = PreferenceStore::at(&path);
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_non_object_document_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "[1, 2, 3]").unwrap();

        assert!(PreferenceStore::at(&path).load().is_empty());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = PreferenceStore::at(dir.path().join("nested").join("settings.json"));

        let mut preferences = Preferences::new();
        preferences.set_volume(TrackId(1), 100);
        preferences.set_volume(TrackId(2), 50);
        preferences.set_window_size(800, 600);
        store.save(&preferences);

        let loaded = store.load();
        assert_eq!(loaded, preferences);
        assert_eq!(loaded.volume(TrackId(2)), 50);
        assert_eq!(loaded.window_size(), (800, 600));
    }

    #[test]
    fn test_resaving_loaded_preferences_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{"window_height": 540, "1": 80, "future_key": {"nested": true}, "window_width": 960}"#,
        )
        .unwrap();
        let store = PreferenceStore::at(&path);

        let first = store.load();
        store.save(&first);
        let first_bytes = std::fs::read_to_string(&path).unwrap();

        let second = store.load();
        store.save(&second);
        let second_bytes = std::fs::read_to_string(&path).unwrap();

        assert_eq!(first, second);
        assert_eq!(first_bytes, second_bytes);
        assert!(second_bytes.contains("future_key"));
    }

    #[test]
    fn test_save_to_unwritable_location_is_swallowed() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where the file should be makes the write fail.
        let path = dir.path().join("settings.json");
        std::fs::create_dir(&path).unwrap();

        let store = PreferenceStore::at(&path);
        store.save(&Preferences::new());
        assert!(store.load().is_empty());
    }
}
