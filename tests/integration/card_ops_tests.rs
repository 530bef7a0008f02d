//! Card operations end to end against simulated cards.

use pn532_hsu::{EraseSummary, Error, Pn532, Pn532Config, StatusCode};

use crate::mock_uart::{MockPn532, SimCard};

const NTAG_UID: [u8; 7] = [0x04, 0x11, 0x22, 0x33, 0x44, 0x55, 0x80];

fn discovered(chip: &mut MockPn532) -> Pn532<&mut MockPn532> {
    let mut pn = Pn532::new(chip, Pn532Config::default());
    assert_eq!(pn.cards(), Ok(1));
    pn
}

// ── Data exchange ─────────────────────────────────────────────

#[test]
fn exchange_without_card_sends_nothing() {
    let mut chip = MockPn532::new();
    let mut pn = Pn532::new(&mut chip, Pn532Config::default());
    let mut buf = [0x30, 0x04, 0x00, 0x00];
    assert_eq!(pn.data_exchange(&mut buf, 2), Ok(0));
    drop(pn);
    assert!(chip.commands.is_empty());
}

#[test]
fn unsupported_card_command_surfaces_status() {
    let mut chip = MockPn532::with_card(SimCard::ntag216(NTAG_UID));
    let mut pn = discovered(&mut chip);
    let mut buf = [0x60, 0x04, 0x00, 0x00];
    let err = Error::CardStatus(StatusCode::NotAcceptable);
    assert_eq!(pn.data_exchange(&mut buf, 2), Err(err));
    assert_eq!(pn.last_error(), Some(err));
    assert_eq!(err.name(), "STATUS_NOTACCEPTABLE");
}

// ── NTAG2xx ───────────────────────────────────────────────────

#[test]
fn ntag_write_then_read() {
    let mut chip = MockPn532::with_card(SimCard::ntag216(NTAG_UID));
    let mut pn = discovered(&mut chip);
    pn.ntag_write_page(4, &[0x03, 0x0A, 0xD1, 0x01]).expect("write");
    assert_eq!(pn.ntag_read_page(4), Ok([0x03, 0x0A, 0xD1, 0x01]));
    drop(pn);
    assert_eq!(chip.cards[0].page(4), [0x03, 0x0A, 0xD1, 0x01]);
    assert_eq!(chip.last_payload(0x40), Some(&[0x01, 0x30, 0x04][..]));
}

#[test]
fn ntag_page_guards_skip_io() {
    let mut chip = MockPn532::with_card(SimCard::ntag216(NTAG_UID));
    let mut pn = discovered(&mut chip);
    assert_eq!(pn.ntag_write_page(3, &[0; 4]), Err(Error::PageOutOfRange(3)));
    assert_eq!(pn.ntag_write_page(226, &[0; 4]), Err(Error::PageOutOfRange(226)));
    assert_eq!(pn.ntag_read_page(231), Err(Error::PageOutOfRange(231)));
    assert_eq!(pn.last_error(), None);
    drop(pn);
    assert_eq!(chip.count(0x40), 0);
}

#[test]
fn ntag_erase_zeroes_user_pages() {
    let mut chip = MockPn532::with_card(SimCard::ntag216(NTAG_UID));
    let mut pn = discovered(&mut chip);
    assert_eq!(pn.ntag_erase(39), EraseSummary { attempted: 36, failed: 0 });
    drop(pn);

    let card = &chip.cards[0];
    assert_eq!(card.page(3), [0xAA; 4], "capability container untouched");
    assert!((4..=39).all(|p| card.page(p) == [0; 4]));
    assert_eq!(card.page(40), [0xAA; 4]);
    assert_eq!(chip.count(0x40), 36);
}

#[test]
fn ntag_erase_continues_past_locked_pages() {
    let mut card = SimCard::ntag216(NTAG_UID);
    card.locked_pages = vec![5, 9];
    let mut chip = MockPn532::with_card(card);
    let mut pn = discovered(&mut chip);
    let summary = pn.ntag_erase(12);
    assert_eq!(summary, EraseSummary { attempted: 9, failed: 2 });
    assert!(!summary.is_clean());
    drop(pn);

    let card = &chip.cards[0];
    assert_eq!(card.page(5), [0xAA; 4]);
    assert_eq!(card.page(12), [0; 4]);
}

// ── MIFARE Classic ────────────────────────────────────────────

#[test]
fn classic_ndef_format_writes_mad() {
    let mut chip = MockPn532::with_card(SimCard::classic_1k([0xDE, 0xAD, 0xBE, 0xEF]));
    let mut pn = discovered(&mut chip);
    assert_eq!(pn.mifare_format_ndef(), Ok(()));
    drop(pn);

    let card = &chip.cards[0];
    assert_eq!(&card.block(1)[..4], &[0x14, 0x01, 0x03, 0xE1]);
    assert!(card.block(2).chunks(2).all(|pair| pair == [0x03, 0xE1]));
    assert_eq!(
        card.block(3),
        &[0xA0, 0xA1, 0xA2, 0xA3, 0xA4, 0xA5, 0x78, 0x77, 0x88, 0xC1, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]
    );
}

#[test]
fn classic_block_write() {
    let mut chip = MockPn532::with_card(SimCard::classic_1k([0xDE, 0xAD, 0xBE, 0xEF]));
    let mut pn = discovered(&mut chip);
    let data: [u8; 16] = core::array::from_fn(|i| i as u8);
    assert_eq!(pn.mifare_write_block(8, &data), Ok(0));
    drop(pn);
    assert_eq!(chip.cards[0].block(8), &data);
}

#[test]
fn classic_block_read_back() {
    let mut card = SimCard::classic_1k([0xDE, 0xAD, 0xBE, 0xEF]);
    card.memory[4 * 16..5 * 16].copy_from_slice(&[0x5A; 16]);
    let mut chip = MockPn532::with_card(card);
    let mut pn = discovered(&mut chip);
    assert_eq!(pn.mifare_read_block(4), Ok([0x5A; 16]));
    assert_eq!(pn.mifare_read_block(64), Err(Error::CardStatus(StatusCode::Timeout)));
}
