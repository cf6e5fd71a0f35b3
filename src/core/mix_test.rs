#[cfg(test)]
mod tests {
    use crate::core::{mix_expression, TrackId};

    #[test]
    fn test_empty_track_list_clears_mix() {
        assert_eq!(mix_expression(&[]), "");
    }

    #[test]
    fn test_two_tracks_full_and_half_gain() {
        let expression = mix_expression(&[(TrackId(1), 100), (TrackId(2), 50)]);
        assert_eq!(
            expression,
            "[aid1]volume=1[a0];[aid2]volume=0.5[a1];[a0][a1]amix=inputs=2[ao]"
        );
    }

    #[test]
    fn test_single_track_still_goes_through_amix() {
        let expression = mix_expression(&[(TrackId(3), 0)]);
        assert_eq!(expression, "[aid3]volume=0[a0];[a0]amix=inputs=1[ao]");
    }

    #[test]
    fn test_n_tracks_sum_exactly_n_streams() {
        for n in 1..=8i64 {
            let tracks: Vec<(TrackId, u8)> = (1..=n).map(|id| (TrackId(id), 75)).collect();
            let expression = mix_expression(&tracks);

            let stages: Vec<&str> = expression.split(';').collect();
            assert_eq!(stages.len() as i64, n + 1);
            assert!(expression.ends_with(&format!("amix=inputs={}[ao]", n)));

            let final_stage = stages.last().unwrap();
            assert_eq!(final_stage.matches("[a").count() as i64, n + 1); // n inputs + [ao]
        }
    }

    #[test]
    fn test_gain_keeps_track_order() {
        let expression = mix_expression(&[(TrackId(7), 33), (TrackId(2), 100)]);
        assert!(expression.starts_with("[aid7]volume=0.33[a0];[aid2]volume=1[a1]"));
    }
}
