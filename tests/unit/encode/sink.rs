use super::*;

fn cfg(width: u32, height: u32) -> SinkConfig {
    SinkConfig {
        width,
        height,
        fps: Fps::whole(30),
    }
}

fn frame(width: u32, height: u32, fill: u8) -> FrameRGBA {
    FrameRGBA {
        width,
        height,
        data: vec![fill; (width as usize) * (height as usize) * 4],
    }
}

#[test]
fn in_memory_sink_collects_frames_in_order() {
    let mut sink = InMemorySink::new();
    sink.begin(cfg(2, 2)).unwrap();
    sink.push_frame(FrameIndex(0), &frame(2, 2, 1)).unwrap();
    sink.push_frame(FrameIndex(1), &frame(2, 2, 2)).unwrap();

    assert_eq!(sink.frames().len(), 2);
    assert_eq!(sink.config(), Some(cfg(2, 2)));

    let video = sink.finalize().unwrap();
    assert_eq!(video.media_type, RAW_RGBA_MEDIA_TYPE);
    assert_eq!(video.len(), 2 * 2 * 2 * 4);
    assert_eq!(video.bytes[0], 1);
    assert_eq!(video.bytes[16], 2);
    assert_eq!(video.extension(), "rgba");
}

#[test]
fn push_before_begin_is_an_encoding_error() {
    let mut sink = InMemorySink::new();
    let err = sink.push_frame(FrameIndex(0), &frame(2, 2, 0)).unwrap_err();
    assert!(matches!(err, StillmotionError::Encoding(_)));
}

#[test]
fn push_after_finalize_is_rejected() {
    let mut sink = InMemorySink::new();
    sink.begin(cfg(2, 2)).unwrap();
    sink.push_frame(FrameIndex(0), &frame(2, 2, 0)).unwrap();
    sink.finalize().unwrap();

    let err = sink.push_frame(FrameIndex(1), &frame(2, 2, 0)).unwrap_err();
    assert!(matches!(err, StillmotionError::Encoding(_)));
    assert!(sink.finalize().is_err());
}

#[test]
fn out_of_order_and_duplicate_indices_are_rejected() {
    let mut sink = InMemorySink::new();
    sink.begin(cfg(2, 2)).unwrap();
    sink.push_frame(FrameIndex(3), &frame(2, 2, 0)).unwrap();

    assert!(sink.push_frame(FrameIndex(3), &frame(2, 2, 0)).is_err());
    assert!(sink.push_frame(FrameIndex(2), &frame(2, 2, 0)).is_err());
    assert_eq!(sink.frames().len(), 1);
}

#[test]
fn mis_sized_frames_are_rejected() {
    let mut sink = InMemorySink::new();
    sink.begin(cfg(4, 2)).unwrap();
    assert!(sink.push_frame(FrameIndex(0), &frame(2, 2, 0)).is_err());

    let mut short = frame(4, 2, 0);
    short.data.pop();
    assert!(sink.push_frame(FrameIndex(0), &short).is_err());
}

#[test]
fn begin_validates_config_and_rejects_double_open() {
    let mut sink = InMemorySink::new();
    let err = sink.begin(cfg(0, 2)).unwrap_err();
    assert!(matches!(err, StillmotionError::InvalidConfig(_)));

    sink.begin(cfg(2, 2)).unwrap();
    let err = sink.begin(cfg(2, 2)).unwrap_err();
    assert!(matches!(err, StillmotionError::EncoderInit(_)));
}

#[test]
fn abort_discards_frames_and_allows_reopen() {
    let mut sink = InMemorySink::new();
    sink.begin(cfg(2, 2)).unwrap();
    sink.push_frame(FrameIndex(0), &frame(2, 2, 9)).unwrap();
    sink.abort();
    sink.abort();

    assert!(sink.frames().is_empty());
    assert!(sink.finalize().is_err());

    sink.begin(cfg(2, 2)).unwrap();
    sink.push_frame(FrameIndex(0), &frame(2, 2, 9)).unwrap();
    assert_eq!(sink.finalize().unwrap().len(), 16);
}

#[test]
fn webm_video_reports_extension() {
    let v = EncodedVideo {
        bytes: vec![0x1a, 0x45, 0xdf, 0xa3],
        media_type: WEBM_MEDIA_TYPE,
    };
    assert_eq!(v.extension(), "webm");
    assert!(!v.is_empty());
}
