#[cfg(test)]
mod tests {
    use rowmap_core::{DataMap, Entity, EntityState, Value, data_map, impl_entity};

    #[derive(Default, Debug)]
    struct Note {
        id: i64,
        text: String,
        pinned: bool,
        state: EntityState,
    }
    impl_entity!(Note, state, [id, text, pinned]);

    fn data(note: &Note) -> DataMap {
        ["id", "text", "pinned"]
            .into_iter()
            .map(|f| (f, note.field_value(f).unwrap_or_default()))
            .collect()
    }

    #[test]
    fn lifecycle() {
        let mut note = Note::default();
        assert!(note.is_new());
        assert!(note.snapshot().is_none());
        note.set_new(false);
        assert!(!note.is_new());
        assert_eq!(
            Note::before_save_event(),
            format!("{}.before_save", Note::entity_name())
        );
        assert!(Note::after_save_event().ends_with("Note.after_save"));
    }

    #[test]
    fn field_access() {
        let mut note = Note::default();
        assert!(note.set_field_value("text", "hello".into()).unwrap());
        assert!(note.set_field_value("id", Value::Int32(Some(4))).unwrap());
        assert!(!note.set_field_value("color", "red".into()).unwrap());
        assert!(note.set_field_value("pinned", Value::Blob(None)).is_err());
        assert_eq!(note.field_value("text"), Some(Value::Varchar(Some("hello".into()))));
        assert_eq!(note.field_value("id"), Some(Value::Int64(Some(4))));
        assert_eq!(note.field_value("color"), None);
    }

    #[test]
    fn dirty_tracking() {
        let mut note = Note {
            id: 1,
            text: "first".into(),
            ..Default::default()
        };
        assert_eq!(note.dirty_fields(&data(&note)), data(&note));
        note.take_snapshot(data(&note));
        assert!(!note.is_dirty(&data(&note)));
        note.text = "second".into();
        note.pinned = true;
        assert_eq!(
            note.dirty_fields(&data(&note)),
            data_map! { "text" => "second", "pinned" => true }
        );
        note.take_snapshot(data(&note));
        assert!(note.dirty_fields(&data(&note)).is_empty());
        note.clear_snapshot();
        assert!(note.is_dirty(&data(&note)));
    }
}
