#[cfg(test)]
mod tests {
    use crate::core::{AudioTrack, TrackId};
    use crate::video::properties::{decode_position_reply, decode_property, PropertyValue};
    use crate::video::EngineEvent;

    fn text(value: &str) -> PropertyValue {
        PropertyValue::Text(value.to_string())
    }

    #[test]
    fn test_decode_native_numbers() {
        assert_eq!(
            decode_property("time-pos", &PropertyValue::Number(12.5)),
            Some(EngineEvent::TimePos(Some(12.5)))
        );
        assert_eq!(
            decode_property("duration", &PropertyValue::Number(90.0)),
            Some(EngineEvent::Duration(Some(90.0)))
        );
    }

    #[test]
    fn test_decode_numbers_from_text_fallback() {
        assert_eq!(
            decode_property("time-pos", &text("12.500000")),
            Some(EngineEvent::TimePos(Some(12.5)))
        );
        assert_eq!(
            decode_property("duration", &text("not a number")),
            Some(EngineEvent::Duration(None))
        );
    }

    #[test]
    fn test_decode_absent_values() {
        assert_eq!(
            decode_property("time-pos", &PropertyValue::Missing),
            Some(EngineEvent::TimePos(None))
        );
        assert_eq!(
            decode_property("duration", &PropertyValue::Number(f64::NAN)),
            Some(EngineEvent::Duration(None))
        );
    }

    #[test]
    fn test_decode_track_list_keeps_only_audio_in_order() {
        let list = text(
            r#"[
            {"id":1,"type":"video","codec":"h264"},
            {"id":2,"type":"audio","title":"Game","lang":"eng"},
            {"id":1,"type":"audio"},
            {"id":1,"type":"sub","title":"Signs"},
            {"id":3,"type":"audio","title":"Mic"}
        ]"#,
        );

        let expected = vec![
            AudioTrack {
                id: TrackId(2),
                title: Some("Game".to_string()),
                lang: Some("eng".to_string()),
            },
            AudioTrack::new(TrackId(1)),
            AudioTrack {
                id: TrackId(3),
                title: Some("Mic".to_string()),
                lang: None,
            },
        ];
        assert_eq!(decode_property("track-list", &list), Some(EngineEvent::TrackList(expected)));
    }

    #[test]
    fn test_decode_empty_missing_or_broken_track_list() {
        for value in [text("[]"), PropertyValue::Missing, text("{\"id\":1}"), text("[{")] {
            assert_eq!(
                decode_property("track-list", &value),
                Some(EngineEvent::TrackList(Vec::new()))
            );
        }
    }

    #[test]
    fn test_skips_malformed_track_entries() {
        let list = text(r#"[{"type":"audio"},{"id":4,"type":"audio"}]"#);
        assert_eq!(
            decode_property("track-list", &list),
            Some(EngineEvent::TrackList(vec![AudioTrack::new(TrackId(4))]))
        );
    }

    #[test]
    fn test_position_poll_reply() {
        assert_eq!(
            decode_position_reply(true, &PropertyValue::Number(42.25)),
            EngineEvent::TimePos(Some(42.25))
        );
        assert_eq!(
            decode_position_reply(false, &PropertyValue::Missing),
            EngineEvent::TimePos(None)
        );
    }

    #[test]
    fn test_ignores_unwatched_properties() {
        assert_eq!(decode_property("volume", &PropertyValue::Number(50.0)), None);
    }
}
