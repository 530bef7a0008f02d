//! Fuzz target: `codec::read_frame`
//!
//! Replays arbitrary chip output through the link and frame decoder and
//! asserts that decoding never panics, never reports more payload than
//! the buffers hold, and that anything it accepts survives re-encoding.
//!
//! cargo fuzz run fuzz_frame_decoder

#![no_main]

use core::time::Duration;
use std::collections::VecDeque;

use libfuzzer_sys::fuzz_target;
use pn532_hsu::codec;
use pn532_hsu::link::Link;
use pn532_hsu::Transport;

const WAIT: Duration = Duration::from_millis(5);

struct SliceUart(VecDeque<u8>);

impl Transport for SliceUart {
    type Error = ();

    fn write(&mut self, data: &[u8]) -> Result<usize, ()> {
        Ok(data.len())
    }

    fn read(&mut self, buf: &mut [u8], _timeout: Duration) -> Result<usize, ()> {
        let n = buf.len().min(self.0.len());
        for (slot, byte) in buf.iter_mut().zip(self.0.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }

    fn buffered_len(&mut self) -> Result<usize, ()> {
        Ok(self.0.len())
    }

    fn flush_input(&mut self) -> Result<(), ()> {
        self.0.clear();
        Ok(())
    }

    fn wait_tx_done(&mut self, _timeout: Duration) -> Result<(), ()> {
        Ok(())
    }

    fn set_baud_rate(&mut self, _baud: u32) -> Result<(), ()> {
        Ok(())
    }
}

fuzz_target!(|data: &[u8]| {
    // First byte picks the expected response id, the rest is the wire.
    let Some((&expected, wire)) = data.split_first() else {
        return;
    };
    let mut link = Link::new(SliceUart(wire.iter().copied().collect()));

    let mut status = [0u8; 1];
    let mut body = [0u8; 64];
    if let Ok(n) = codec::read_frame(&mut link, expected, &mut status, &mut body, WAIT) {
        assert!(n <= status.len() + body.len(), "payload exceeds buffers");

        // The decoded payload, re-encoded, must decode to the same bytes.
        let payload = [&status[..n.min(1)], &body[..n.saturating_sub(1)]].concat();
        let frame = codec::encode_response(expected, &payload);
        let mut again = Link::new(SliceUart(frame.into_iter().collect()));
        let mut copy = vec![0u8; payload.len()];
        let m = codec::read_frame(&mut again, expected, &mut copy, &mut [], WAIT)
            .expect("re-encoded frame must decode");
        assert_eq!(&copy[..m], &payload[..]);
    }
});
