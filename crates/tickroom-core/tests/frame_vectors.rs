//! Frame decoder vector tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::fs;

use bytes::BytesMut;

use tickroom_core::protocol::frame::FrameDecoder;

use vector_loader::TestVector;

fn load(name: &str) -> TestVector {
    let s = fs::read_to_string(format!("tests/vectors/{name}")).unwrap();
    serde_json::from_str(&s).unwrap()
}

#[test]
fn frame_vectors() {
    let files = [
        "frame_single.json",
        "frame_pipelined.json",
        "frame_crlf_length.json",
        "frame_truncated.json",
        "frame_bad_length.json",
        "frame_negative_length.json",
        "frame_too_large.json",
        "frame_runaway_header.json",
    ];

    for f in files {
        let v = load(f);
        let mut dec = FrameDecoder::new(v.max_frame_bytes.unwrap_or(1024));
        let mut buf = BytesMut::from(&v.frame.decode()[..]);

        let mut frames = Vec::new();
        let res = loop {
            match dec.decode(&mut buf) {
                Ok(Some(frame)) => frames.push(String::from_utf8(frame.to_vec()).unwrap()),
                Ok(None) => break Ok(()),
                Err(e) => break Err(e),
            }
        };

        if let Some(err) = v.expect_error {
            let e = res.expect_err("expected error");
            assert_eq!(e.code().as_str(), err.code, "vector={}", v.description);
            continue;
        }

        res.expect("expected frames");
        let ex = v.expect.expect("missing expect block");
        let want: Vec<String> = serde_json::from_value(ex["frames"].clone()).unwrap();
        assert_eq!(frames, want, "vector={}", v.description);
        assert_eq!(
            dec.is_mid_frame(&buf),
            ex["mid_frame"].as_bool().unwrap(),
            "vector={}",
            v.description
        );
    }
}
