use super::*;

const PHONE_CLIP: &str = r#"{
  "streams": [
    {
      "codec_type": "video",
      "width": 1920,
      "height": 1080,
      "r_frame_rate": "30000/1001",
      "duration": "4.504500",
      "side_data_list": [{ "side_data_type": "Display Matrix", "rotation": -90 }]
    },
    { "codec_type": "audio", "duration": "4.5" }
  ],
  "format": { "duration": "4.510000" }
}"#;

#[test]
fn display_matrix_rotation_becomes_right() {
    let track = parse_video_probe(PHONE_CLIP.as_bytes()).unwrap();
    assert_eq!(track.natural_size, Size::new(1920.0, 1080.0));
    assert_eq!(track.orientation(), Orientation::Right);
    assert_eq!(track.duration, MediaTime::from_micros(4_504_500));
    assert_eq!(track.fps, Some(Fps::new(30000, 1001).unwrap()));
    assert!(track.has_audio);
}

#[test]
fn legacy_rotate_tag_wins_and_format_duration_is_fallback() {
    let json = r#"{
      "streams": [{ "codec_type": "video", "width": 640, "height": 480,
                    "r_frame_rate": "25/1", "tags": { "rotate": "270" } }],
      "format": { "duration": "2.0" }
    }"#;
    let track = parse_video_probe(json.as_bytes()).unwrap();
    assert_eq!(track.orientation(), Orientation::Left);
    assert_eq!(track.duration, MediaTime::from_secs(2));
    assert!(!track.has_audio);
}

#[test]
fn audio_only_file_is_not_a_video_track() {
    let json = r#"{ "streams": [{ "codec_type": "audio" }], "format": { "duration": "30.0" } }"#;
    assert!(parse_video_probe(json.as_bytes()).is_err());
    let audio = parse_audio_probe(json.as_bytes()).unwrap();
    assert_eq!(audio.duration, MediaTime::from_secs(30));
}

#[test]
fn zero_frame_rate_is_unknown() {
    let json = r#"{ "streams": [{ "codec_type": "video", "width": 2, "height": 2,
                                  "r_frame_rate": "0/0" }] }"#;
    let track = parse_video_probe(json.as_bytes()).unwrap();
    assert_eq!(track.fps, None);
    assert_eq!(track.duration, MediaTime::ZERO);
}
