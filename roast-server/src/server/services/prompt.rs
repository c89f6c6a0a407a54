use crate::common::ProfileSnapshot;

/// Instruction sent to the model for one roast.
///
/// Pure: the same snapshot always yields the same bytes.
pub fn build_prompt(snapshot: &ProfileSnapshot) -> String {
    format!(
        "Roast this person specifically and ruthlessly based on their Spotify history.\n\
         Be sarcastic, referencing pop culture stereotypes about these artists.\n\
         Don't write a generic intro, jump straight into the insult.\n\
         Top Artists: {}\n\
         Top Tracks: {}\n",
        snapshot.top_artist_names.join(", "),
        snapshot.top_track_descriptions.join(", "),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> ProfileSnapshot {
        ProfileSnapshot {
            top_artist_names: vec![
                "Nickelback".to_string(),
                "Coldplay".to_string(),
                "Imagine Dragons".to_string(),
            ],
            top_track_descriptions: vec![
                "Photograph by Nickelback".to_string(),
                "Yellow by Coldplay".to_string(),
            ],
            top_artist_image_url: Some("https://img/nickelback".to_string()),
        }
    }

    #[test]
    fn is_deterministic() {
        assert_eq!(build_prompt(&snapshot()), build_prompt(&snapshot()));
    }

    #[test]
    fn lists_artists_and_tracks_in_order() {
        let prompt = build_prompt(&snapshot());

        assert!(prompt.contains("Top Artists: Nickelback, Coldplay, Imagine Dragons\n"));
        assert!(prompt.contains("Top Tracks: Photograph by Nickelback, Yellow by Coldplay\n"));
    }

    #[test]
    fn sets_tone_and_forbids_intro() {
        let prompt = build_prompt(&snapshot());

        assert!(prompt.contains("ruthlessly"));
        assert!(prompt.contains("sarcastic"));
        assert!(prompt.contains("pop culture stereotypes"));
        assert!(prompt.contains("Don't write a generic intro"));
    }

    #[test]
    fn never_drops_an_item() {
        let snapshot = snapshot();
        let prompt = build_prompt(&snapshot);

        let mut cursor = 0;
        for item in snapshot
            .top_artist_names
            .iter()
            .chain(snapshot.top_track_descriptions.iter())
        {
            let found = prompt[cursor..]
                .find(item.as_str())
                .unwrap_or_else(|| panic!("{item} missing or out of order"));
            cursor += found + item.len();
        }
    }

    #[test]
    fn handles_empty_snapshot() {
        let prompt = build_prompt(&ProfileSnapshot::default());

        assert!(prompt.contains("Top Artists: \n"));
        assert!(prompt.contains("Top Tracks: \n"));
    }
}
