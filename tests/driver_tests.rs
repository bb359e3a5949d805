//! Driver and HAL Tests
//!
//! Tests for the SI4032 SPI driver, the UBX decoder and frame builders,
//! the indicator outputs and the ADC sample bank.
//! Run with: cargo test --test driver_tests

use std::cell::{Cell, RefCell};
use std::convert::Infallible;
use std::rc::Rc;

use embedded_hal::digital::{ErrorType as PinErrorType, OutputPin};
use embedded_hal::spi::{ErrorKind, ErrorType as SpiErrorType, SpiBus};

use balloon_tx::config::SI4032_XTAL_HZ;
use balloon_tx::drivers::si4032::{FrequencyWords, Si4032};
use balloon_tx::drivers::traits::{AdcSamples, GpsSource, Indicators, RadioPort};
use balloon_tx::drivers::ublox::{
    build_frame, configuration_frames, message_rate, UbxError, UbxMessage, UbxParser, CLASS_NAV,
    NAV_POSLLH, NAV_SOL, NAV_TIMEUTC, NAV_VELNED,
};
use balloon_tx::hal::adc::{AdcBank, AdcReading};
use balloon_tx::hal::gpio::{LedState, StatusLeds};
use balloon_tx::types::{AdcChannel, FixQuality, Frequency};

// =============================================================================
// SPI / Pin Mocks
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq)]
enum Bus {
    Select,
    Deselect,
    Write(Vec<u8>),
    Transfer(Vec<u8>),
}

type BusLog = Rc<RefCell<Vec<Bus>>>;

struct MockSpi {
    log: BusLog,
    response: u8,
    fail: Rc<Cell<bool>>,
}

impl SpiErrorType for MockSpi {
    type Error = ErrorKind;
}

impl MockSpi {
    fn check(&self) -> Result<(), ErrorKind> {
        if self.fail.get() {
            Err(ErrorKind::Overrun)
        } else {
            Ok(())
        }
    }
}

impl SpiBus for MockSpi {
    fn read(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        words.fill(self.response);
        self.check()
    }

    fn write(&mut self, words: &[u8]) -> Result<(), Self::Error> {
        self.log.borrow_mut().push(Bus::Write(words.to_vec()));
        self.check()
    }

    fn transfer(&mut self, read: &mut [u8], write: &[u8]) -> Result<(), Self::Error> {
        self.log.borrow_mut().push(Bus::Transfer(write.to_vec()));
        read.fill(self.response);
        self.check()
    }

    fn transfer_in_place(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        self.log.borrow_mut().push(Bus::Transfer(words.to_vec()));
        for word in words.iter_mut().skip(1) {
            *word = self.response;
        }
        self.check()
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

struct ChipSelect {
    log: BusLog,
}

impl PinErrorType for ChipSelect {
    type Error = Infallible;
}

impl OutputPin for ChipSelect {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.log.borrow_mut().push(Bus::Select);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.log.borrow_mut().push(Bus::Deselect);
        Ok(())
    }
}

/// Pin that remembers its last level
#[derive(Clone, Default)]
struct LevelPin(Rc<Cell<Option<bool>>>);

impl PinErrorType for LevelPin {
    type Error = Infallible;
}

impl OutputPin for LevelPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.0.set(Some(false));
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.0.set(Some(true));
        Ok(())
    }
}

struct Harness {
    log: BusLog,
    fail: Rc<Cell<bool>>,
    radio: Si4032<MockSpi, ChipSelect>,
}

fn harness(response: u8) -> Harness {
    let log = BusLog::default();
    let fail = Rc::new(Cell::new(false));
    let spi = MockSpi {
        log: Rc::clone(&log),
        response,
        fail: Rc::clone(&fail),
    };
    let radio = Si4032::new(spi, ChipSelect { log: Rc::clone(&log) });
    log.borrow_mut().clear();
    Harness { log, fail, radio }
}

fn framed(writes: &[[u8; 2]]) -> Vec<Bus> {
    writes
        .iter()
        .flat_map(|w| [Bus::Select, Bus::Write(w.to_vec()), Bus::Deselect])
        .collect()
}

// =============================================================================
// SI4032 Frequency Math
// =============================================================================

#[test]
fn frequency_words_low_band() {
    let freq = Frequency::from_hz(434_650_000).unwrap();
    let words = FrequencyWords::compute(freq, SI4032_XTAL_HZ);
    assert_eq!(words.band, 0x5A);
    assert_eq!(words.carrier, 0x25FB);
}

#[test]
fn frequency_words_high_band() {
    let freq = Frequency::from_hz(868_000_000).unwrap();
    let words = FrequencyWords::compute(freq, SI4032_XTAL_HZ);
    assert_eq!(words.band, 0x7A);
    assert_eq!(words.carrier, 4923);
}

// =============================================================================
// SI4032 Register Access
// =============================================================================

#[test]
fn chip_select_idles_high() {
    let log = BusLog::default();
    let spi = MockSpi {
        log: Rc::clone(&log),
        response: 0,
        fail: Rc::default(),
    };
    let _radio = Si4032::new(spi, ChipSelect { log: Rc::clone(&log) });
    assert_eq!(*log.borrow(), [Bus::Deselect]);
}

#[test]
fn set_frequency_writes_three_registers() {
    let mut h = harness(0);
    h.radio.set_tx_frequency(Frequency::from_hz(434_650_000).unwrap());
    assert_eq!(
        *h.log.borrow(),
        framed(&[[0xF5, 0x5A], [0xF6, 0x25], [0xF7, 0xFB]])
    );
}

#[test]
fn enable_tx_sets_operating_mode() {
    let mut h = harness(0);
    h.radio.enable_tx();
    assert_eq!(*h.log.borrow(), framed(&[[0x87, 0x48]]));
}

#[test]
fn temperature_reads_then_restarts_conversion() {
    let mut h = harness(200);
    assert_eq!(h.radio.read_temperature(), 20);
    assert_eq!(
        *h.log.borrow(),
        [
            Bus::Select,
            Bus::Transfer(vec![0x11, 0xFF]),
            Bus::Deselect,
            Bus::Select,
            Bus::Write(vec![0x8F, 0x80]),
            Bus::Deselect,
        ]
    );
}

#[test]
fn soft_reset_writes_operating_mode() {
    let mut h = harness(0);
    h.radio.soft_reset().unwrap();
    assert_eq!(*h.log.borrow(), framed(&[[0x87, 0x80]]));
    assert_eq!(h.radio.error_count(), 0);
}

#[test]
fn soft_reset_reports_bus_error() {
    let mut h = harness(0);
    h.fail.set(true);
    assert!(h.radio.soft_reset().is_err());
    assert_eq!(h.log.borrow().last(), Some(&Bus::Deselect));
}

#[test]
fn bus_errors_counted_not_propagated() {
    let mut h = harness(200);
    assert_eq!(h.radio.read_temperature(), 20);

    h.fail.set(true);
    h.radio.write_register(0x73, 0x03);
    assert_eq!(h.radio.error_count(), 1);
    // Last good reading survives a failed read
    assert_eq!(h.radio.read_temperature(), 20);
    assert_eq!(h.radio.error_count(), 2);
    // Chip select released even on failure
    assert_eq!(h.log.borrow().last(), Some(&Bus::Deselect));
}

// =============================================================================
// UBX Decoding
// =============================================================================

fn feed(parser: &mut UbxParser, frame: &[u8]) -> Vec<Result<UbxMessage, UbxError>> {
    frame
        .iter()
        .filter_map(|&b| parser.handle_incoming_byte(b))
        .collect()
}

fn nav(id: u8, len: usize, fill: impl FnOnce(&mut [u8])) -> Vec<u8> {
    let mut payload = vec![0u8; len];
    fill(&mut payload);
    build_frame(CLASS_NAV, id, &payload).unwrap().to_vec()
}

#[test]
fn decodes_full_fix() {
    let mut parser = UbxParser::new();

    let posllh = nav(NAV_POSLLH, 28, |p| {
        p[4..8].copy_from_slice(&1_452_345_678i32.to_le_bytes());
        p[8..12].copy_from_slice(&(-452_345_678i32).to_le_bytes());
        p[12..16].copy_from_slice(&99_999i32.to_le_bytes());
        p[16..20].copy_from_slice(&12_345_000i32.to_le_bytes());
    });
    let sol = nav(NAV_SOL, 52, |p| {
        p[10] = 3;
        p[11] = 0x01;
        p[47] = 8;
    });
    let velned = nav(NAV_VELNED, 36, |p| {
        p[20..24].copy_from_slice(&1234u32.to_le_bytes());
    });
    let timeutc = nav(NAV_TIMEUTC, 20, |p| {
        p[16] = 13;
        p[17] = 45;
        p[18] = 7;
    });

    assert_eq!(feed(&mut parser, &posllh), [Ok(UbxMessage::PosLlh)]);
    assert_eq!(feed(&mut parser, &sol), [Ok(UbxMessage::Sol)]);
    assert_eq!(feed(&mut parser, &velned), [Ok(UbxMessage::VelNed)]);
    assert_eq!(feed(&mut parser, &timeutc), [Ok(UbxMessage::TimeUtc)]);

    let fix = parser.last_fix();
    assert_eq!(fix.lon_raw, 1_452_345_678);
    assert_eq!(fix.lat_raw, -452_345_678);
    assert_eq!(fix.alt_raw, 12_345_000);
    assert_eq!(fix.fix, FixQuality::FIX_3D);
    assert!(fix.has_lock());
    assert_eq!(fix.sats_raw, 8);
    assert_eq!(fix.speed_raw, 1234);
    assert_eq!((fix.hours, fix.minutes, fix.seconds), (13, 45, 7));
    assert_eq!(parser.stats().frames, 4);
}

#[test]
fn fix_type_requires_fix_ok_flag() {
    let mut parser = UbxParser::new();
    let sol = nav(NAV_SOL, 52, |p| p[10] = 3);
    feed(&mut parser, &sol);
    assert_eq!(parser.fix().fix, FixQuality::NONE);
}

#[test]
fn noise_between_frames_ignored() {
    let mut parser = UbxParser::new();
    let mut stream = b"$GPGGA,junk\r\n".to_vec();
    stream.extend(nav(NAV_SOL, 52, |p| {
        p[10] = 2;
        p[11] = 1;
    }));
    stream.extend([0x00, 0xB5, 0x00]);
    assert_eq!(feed(&mut parser, &stream), [Ok(UbxMessage::Sol)]);
    assert_eq!(parser.fix().fix, FixQuality::FIX_2D);
}

#[test]
fn wrong_length_rejected() {
    let mut parser = UbxParser::new();
    let short = nav(NAV_SOL, 40, |_| {});
    assert_eq!(
        feed(&mut parser, &short),
        [Err(UbxError::Length { id: NAV_SOL, len: 40 })]
    );
    assert_eq!(parser.stats().errors, 1);
}

#[test]
fn oversize_payload_rejected() {
    let mut parser = UbxParser::new();
    let header = [0xB5, 0x62, 0x01, 0x07, 200, 0];
    assert_eq!(feed(&mut parser, &header), [Err(UbxError::Oversize(200))]);
}

// =============================================================================
// UBX Configuration Frames
// =============================================================================

#[test]
fn message_rate_frame_bytes() {
    let frame = message_rate(CLASS_NAV, NAV_POSLLH, 1).unwrap();
    assert_eq!(
        frame.as_slice(),
        &[0xB5, 0x62, 0x06, 0x01, 0x03, 0x00, 0x01, 0x02, 0x01, 0x0E, 0x47]
    );
}

#[test]
fn configuration_sequence() {
    let frames = configuration_frames(9600).unwrap();
    assert_eq!(frames.len(), 6);

    // CFG-PRT, CFG-NAV5, then one CFG-MSG per NAV message
    assert_eq!(&frames[0][2..4], &[0x06, 0x00]);
    assert_eq!(&frames[1][2..4], &[0x06, 0x24]);
    // Mask selects the dynamic model only; airborne <1g
    assert_eq!(frames[1][6], 0x01);
    assert_eq!(frames[1][8], 6);
    let ids: Vec<u8> = frames[2..].iter().map(|f| f[7]).collect();
    assert_eq!(ids, [NAV_POSLLH, NAV_SOL, NAV_VELNED, NAV_TIMEUTC]);

    // Baud rate field of CFG-PRT
    assert_eq!(&frames[0][14..18], &9600u32.to_le_bytes());

    // Every frame passes our own decoder
    let mut parser = UbxParser::new();
    for frame in &frames {
        assert!(matches!(
            feed(&mut parser, frame).as_slice(),
            [Ok(UbxMessage::Other { class: 0x06, .. })]
        ));
    }
}

// =============================================================================
// Indicators
// =============================================================================

#[test]
fn status_led_is_active_low() {
    let tx = LevelPin::default();
    let status = LevelPin::default();
    let cutoff = LevelPin::default();
    let mut leds = StatusLeds::new(tx.clone(), status.clone(), cutoff.clone());

    assert_eq!(tx.0.get(), Some(false));
    assert_eq!(status.0.get(), Some(true));
    assert_eq!(cutoff.0.get(), Some(false));

    leds.set_status_led(true);
    assert_eq!(status.0.get(), Some(false));
    assert_eq!(leds.status_state(), LedState::On);

    leds.toggle_status();
    assert_eq!(status.0.get(), Some(true));

    leds.set_tx_led(true);
    assert_eq!(tx.0.get(), Some(true));
    assert_eq!(leds.tx_state(), LedState::On);
}

#[test]
fn cutoff_latches() {
    let cutoff = LevelPin::default();
    let mut leds = StatusLeds::new(LevelPin::default(), LevelPin::default(), cutoff.clone());
    assert!(!leds.cutoff_asserted());
    leds.trigger_cutoff();
    assert!(leds.cutoff_asserted());
    assert_eq!(cutoff.0.get(), Some(true));
}

// =============================================================================
// ADC Bank
// =============================================================================

#[test]
fn adc_bank_channels_independent() {
    let bank = AdcBank::new();
    bank.store(AdcChannel::Battery, AdcReading::from_raw(2048));
    bank.store(AdcChannel::Button, AdcReading::from_raw(0xF123));

    assert_eq!(bank.sample(AdcChannel::Battery), 2048);
    assert_eq!(bank.sample(AdcChannel::Button), 0x0123);
    assert_eq!(bank.reading(AdcChannel::Battery).as_millivolts(), 1650);
}
