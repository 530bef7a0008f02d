//! Bring-up sequence against the simulated chip.

use embedded_hal::delay::DelayNs;

use pn532_hsu::{BaudRate, Command, Error, Pn532, Pn532Config, TransportFault};

use crate::mock_uart::MockPn532;

/// Records requested delays instead of sleeping.
#[derive(Default)]
struct RecordingDelay {
    total_ns: u64,
}

impl DelayNs for RecordingDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns += u64::from(ns);
    }
}

fn init(chip: &mut MockPn532, config: Pn532Config) -> Result<Pn532<&mut MockPn532>, Error> {
    Pn532::init(chip, config, &mut RecordingDelay::default())
}

// ── Default bring-up ──────────────────────────────────────────

#[test]
fn default_bring_up_issues_commands_in_order() {
    let mut chip = MockPn532::new();
    let pn = init(&mut chip, Pn532Config::default()).expect("bring-up");
    assert!(!pn.is_pending());
    assert!(pn.registry().is_empty());
    drop(pn);

    assert_eq!(
        chip.command_ids(),
        vec![
            Command::SamConfiguration.code(),
            Command::GetFirmwareVersion.code(),
            Command::RfConfiguration.code(),
            Command::WriteRegister.code(),
            Command::RfConfiguration.code(),
            Command::RfConfiguration.code(),
        ]
    );
    assert_eq!(chip.last_payload(0x14), Some(&[0x01, 20, 0x00][..]));
    assert_eq!(chip.host_acks, 0);
    assert_eq!(chip.baud, 115_200);
}

#[test]
fn rf_configuration_follows_config() {
    let mut chip = MockPn532::new();
    let config = Pn532Config {
        atr_retries: 0x02,
        com_retries: 0x05,
        atr_res_timeout: 0x08,
        retry_timeout: 0x07,
        ..Pn532Config::default()
    };
    drop(init(&mut chip, config).expect("bring-up"));

    let rf: Vec<&[u8]> = chip
        .commands
        .iter()
        .filter(|(cmd, _)| *cmd == 0x32)
        .map(|(_, p)| p.as_slice())
        .collect();
    assert_eq!(rf, vec![&[0x05, 0x02, 0x01, 0x01][..], &[0x04, 0x05][..], &[0x02, 0x00, 0x08, 0x07][..]]);
}

// ── Baud change ───────────────────────────────────────────────

#[test]
fn baud_change_acks_then_switches_host() {
    let mut chip = MockPn532::new();
    let mut delay = RecordingDelay::default();
    let config = Pn532Config {
        baud: BaudRate::B460800,
        ..Pn532Config::default()
    };
    drop(Pn532::init(&mut chip, config, &mut delay).expect("bring-up"));

    assert_eq!(chip.commands[0], (0x10, vec![BaudRate::B460800.code()]));
    assert_eq!(chip.host_acks, 1);
    assert_eq!(chip.baud, 460_800);
    assert!(delay.total_ns >= 20_000_000, "settle delays on both sides of the switch");
}

// ── Failures ──────────────────────────────────────────────────

#[test]
fn sam_is_retried_once() {
    let mut chip = MockPn532::new();
    chip.drop_next = 1;
    let pn = init(&mut chip, Pn532Config::default()).expect("second SAM attempt succeeds");
    assert_eq!(pn.last_error(), Some(Error::Transport(TransportFault::AckTimeout)));
    drop(pn);
    assert_eq!(chip.count(0x14), 2);
}

#[test]
fn silent_chip_aborts_bring_up() {
    let mut chip = MockPn532::new();
    chip.drop_next = 2;
    let result = init(&mut chip, Pn532Config::default());
    assert!(matches!(result, Err(Error::Transport(TransportFault::AckTimeout))));
    assert_eq!(chip.command_ids(), vec![0x14, 0x14]);
}

#[test]
fn nacked_command_is_reported() {
    let mut chip = MockPn532::new();
    chip.nack_next = true;
    let mut pn = Pn532::new(&mut chip, Pn532Config::default());
    assert_eq!(pn.firmware_version(), Err(Error::Transport(TransportFault::Nack)));
    assert!(!pn.is_pending());
}

#[test]
fn firmware_version_reported() {
    let mut chip = MockPn532::new();
    chip.firmware = [0x32, 0x01, 0x06, 0x07];
    let mut pn = Pn532::new(&mut chip, Pn532Config::default());
    let fw = pn.firmware_version().expect("firmware");
    assert_eq!((fw.ic, fw.version, fw.revision, fw.support), (0x32, 1, 6, 7));
}

// ── GPIO ──────────────────────────────────────────────────────

#[test]
fn gpio_write_then_read_back() {
    let mut chip = MockPn532::new();
    let mut pn = Pn532::new(&mut chip, Pn532Config::default());
    pn.write_gpio(0b1000_0101).expect("write");
    assert_eq!(pn.read_gpio(), Ok(0b1000_0101));
}
