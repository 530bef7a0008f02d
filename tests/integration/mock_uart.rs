//! Simulated PN532 on the far side of a mock UART.
//!
//! Parses every host frame written to it, records the command, and queues
//! an ACK plus a response the way the chip would.  Cards are modelled as
//! plain byte memories so card operations can be checked end to end.

use std::collections::VecDeque;
use std::time::Duration;

use pn532_hsu::Transport;
use pn532_hsu::codec::{ACK_FRAME, encode_response};

// ── Simulated card ────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct SimCard {
    pub uid: Vec<u8>,
    pub sens_res: u16,
    pub sel_res: u8,
    /// ATS as sent on the wire (first byte counts itself).
    pub ats: Option<Vec<u8>>,
    /// NTAG pages (4 bytes each) or MIFARE blocks (16 bytes each).
    pub memory: Vec<u8>,
    /// Pages whose writes the card refuses.
    pub locked_pages: Vec<u8>,
}

#[allow(dead_code)]
impl SimCard {
    pub fn ntag216(uid: [u8; 7]) -> Self {
        Self {
            uid: uid.to_vec(),
            sens_res: 0x0044,
            sel_res: 0x00,
            ats: None,
            memory: vec![0xAA; 231 * 4],
            locked_pages: Vec::new(),
        }
    }

    pub fn classic_1k(uid: [u8; 4]) -> Self {
        Self {
            uid: uid.to_vec(),
            sens_res: 0x0004,
            sel_res: 0x08,
            ats: None,
            memory: vec![0x00; 64 * 16],
            locked_pages: Vec::new(),
        }
    }

    pub fn desfire(uid: [u8; 7]) -> Self {
        Self {
            uid: uid.to_vec(),
            sens_res: 0x0344,
            sel_res: 0x20,
            ats: Some(vec![0x06, 0x75, 0x77, 0x81, 0x02, 0x80]),
            memory: Vec::new(),
            locked_pages: Vec::new(),
        }
    }

    pub fn page(&self, page: u8) -> [u8; 4] {
        let at = usize::from(page) * 4;
        [self.memory[at], self.memory[at + 1], self.memory[at + 2], self.memory[at + 3]]
    }

    pub fn block(&self, block: u8) -> &[u8] {
        let at = usize::from(block) * 16;
        &self.memory[at..at + 16]
    }

    fn is_classic(&self) -> bool {
        self.sel_res == 0x08
    }

    fn discovery_entry(&self, target: u8) -> Vec<u8> {
        let mut out = vec![target];
        out.extend_from_slice(&self.sens_res.to_be_bytes());
        out.push(self.sel_res);
        out.push(self.uid.len() as u8);
        out.extend_from_slice(&self.uid);
        if let Some(ats) = &self.ats {
            out.extend_from_slice(ats);
        }
        out
    }

    /// Answer an InDataExchange card command: status byte first.
    fn exchange(&mut self, request: &[u8]) -> Vec<u8> {
        match request {
            [0x30, block, ..] if self.is_classic() => {
                let at = usize::from(*block) * 16;
                if at + 16 > self.memory.len() {
                    return vec![0x01];
                }
                let mut out = vec![0x00];
                out.extend_from_slice(&self.memory[at..at + 16]);
                out
            }
            [0x30, page, ..] => {
                let at = usize::from(*page) * 4;
                if at + 16 > self.memory.len() {
                    return vec![0x01];
                }
                let mut out = vec![0x00];
                out.extend_from_slice(&self.memory[at..at + 16]);
                out
            }
            [0xA2, page, data @ ..] if data.len() == 4 => {
                if self.locked_pages.contains(page) {
                    return vec![0x01];
                }
                let at = usize::from(*page) * 4;
                self.memory[at..at + 4].copy_from_slice(data);
                vec![0x00]
            }
            [0xA0, block, data @ ..] if data.len() == 16 => {
                let at = usize::from(*block) * 16;
                self.memory[at..at + 16].copy_from_slice(data);
                vec![0x00]
            }
            _ => vec![0x27],
        }
    }
}

// ── Simulated chip ────────────────────────────────────────────

pub struct MockPn532 {
    rx: VecDeque<u8>,
    tx: Vec<u8>,
    /// Every command frame received: (command, payload).
    pub commands: Vec<(u8, Vec<u8>)>,
    /// Bare ACK frames the host sent.
    pub host_acks: usize,
    pub baud: u32,
    pub firmware: [u8; 4],
    pub cards: Vec<SimCard>,
    /// GPIO levels last written (P3, P7).
    pub gpio: (u8, u8),
    /// Commands to ignore entirely (no ACK, no response).
    pub drop_next: usize,
    /// NACK the next command instead of ACKing it.
    pub nack_next: bool,
    /// Corrupt the data checksum of the next response.
    pub corrupt_next: bool,
    /// Answer Diagnose attention-request tests with this status.
    pub attention_status: u8,
}

#[allow(dead_code)]
impl MockPn532 {
    pub fn new() -> Self {
        Self {
            rx: VecDeque::new(),
            tx: Vec::new(),
            commands: Vec::new(),
            host_acks: 0,
            baud: 115_200,
            firmware: [0x32, 0x01, 0x06, 0x07],
            cards: Vec::new(),
            gpio: (0xFF, 0xFF),
            drop_next: 0,
            nack_next: false,
            corrupt_next: false,
            attention_status: 0x00,
        }
    }

    pub fn with_card(card: SimCard) -> Self {
        let mut chip = Self::new();
        chip.cards.push(card);
        chip
    }

    pub fn command_ids(&self) -> Vec<u8> {
        self.commands.iter().map(|(cmd, _)| *cmd).collect()
    }

    pub fn count(&self, cmd: u8) -> usize {
        self.commands.iter().filter(|(c, _)| *c == cmd).count()
    }

    pub fn last_payload(&self, cmd: u8) -> Option<&[u8]> {
        self.commands
            .iter()
            .rev()
            .find(|(c, _)| *c == cmd)
            .map(|(_, p)| p.as_slice())
    }

    /// Extract complete host frames from `tx`.
    fn process(&mut self) {
        loop {
            let Some(start) = self.tx.windows(2).position(|w| w == [0x00, 0xFF]) else {
                return;
            };
            let body = &self.tx[start + 2..];
            if body.len() < 2 {
                return;
            }

            // Bare ACK from the host.
            if body[..2] == [0x00, 0xFF] {
                if body.len() < 3 {
                    return;
                }
                self.host_acks += 1;
                self.tx.drain(..start + 5);
                continue;
            }

            let (field, head) = if body[..2] == [0xFF, 0xFF] {
                if body.len() < 5 {
                    return;
                }
                (usize::from(u16::from_be_bytes([body[2], body[3]])), 5)
            } else {
                (usize::from(body[0]), 2)
            };
            let total = head + field + 2;
            if body.len() < total {
                return;
            }

            let cmd = body[head + 1];
            let payload = body[head + 2..head + field].to_vec();
            self.tx.drain(..start + 2 + total);
            self.commands.push((cmd, payload.clone()));
            self.answer(cmd, &payload);
        }
    }

    fn answer(&mut self, cmd: u8, payload: &[u8]) {
        if self.drop_next > 0 {
            self.drop_next -= 1;
            return;
        }
        if self.nack_next {
            self.nack_next = false;
            self.rx.extend([0x00, 0x00, 0xFF, 0xFF, 0x00, 0x00]);
            return;
        }

        let reply = match cmd {
            0x00 if payload == [0x06] => vec![self.attention_status],
            0x02 => self.firmware.to_vec(),
            0x0C => vec![self.gpio.0, self.gpio.1, 0x00],
            0x0E => {
                if payload.len() == 2 {
                    self.gpio = (payload[0] & 0x3F, payload[1] & 0x06);
                }
                Vec::new()
            }
            0x08 | 0x10 | 0x14 | 0x32 => Vec::new(),
            0x44 | 0x52 => vec![0x00],
            0x4A => {
                let max = usize::from(payload.first().copied().unwrap_or(1));
                let found: Vec<&SimCard> = self.cards.iter().take(max).collect();
                let mut out = vec![found.len() as u8];
                for (i, card) in found.iter().enumerate() {
                    out.extend(card.discovery_entry(i as u8 + 1));
                }
                out
            }
            0x40 => {
                let target = usize::from(payload.first().copied().unwrap_or(0));
                match self.cards.get_mut(target.wrapping_sub(1)) {
                    Some(card) => card.exchange(&payload[1..]),
                    None => vec![0x27],
                }
            }
            _ => return,
        };

        let mut frame = encode_response(cmd.wrapping_add(1), &reply);
        if self.corrupt_next {
            self.corrupt_next = false;
            let at = frame.len() - 2;
            frame[at] = frame[at].wrapping_add(1);
        }
        self.rx.extend(ACK_FRAME);
        self.rx.extend(frame);
    }
}

impl Default for MockPn532 {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for MockPn532 {
    type Error = ();

    fn write(&mut self, data: &[u8]) -> Result<usize, ()> {
        self.tx.extend_from_slice(data);
        self.process();
        Ok(data.len())
    }

    fn read(&mut self, buf: &mut [u8], _timeout: Duration) -> Result<usize, ()> {
        let n = buf.len().min(self.rx.len());
        for (slot, byte) in buf.iter_mut().zip(self.rx.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }

    fn buffered_len(&mut self) -> Result<usize, ()> {
        Ok(self.rx.len())
    }

    fn flush_input(&mut self) -> Result<(), ()> {
        self.rx.clear();
        Ok(())
    }

    fn wait_tx_done(&mut self, _timeout: Duration) -> Result<(), ()> {
        Ok(())
    }

    fn set_baud_rate(&mut self, baud: u32) -> Result<(), ()> {
        self.baud = baud;
        Ok(())
    }
}
