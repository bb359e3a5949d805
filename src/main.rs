//! Balloon Telemetry Transmitter Main Application
//!
//! Entry point for the STM32F100 + SI4032 payload firmware.
//! Initializes hardware, starts the symbol clock on a high-priority
//! interrupt executor and runs the mode sequencer in the thread executor.

#![no_std]
#![no_main]

use core::cell::{Cell, RefCell};

use defmt::{debug, error, info, warn};
use embassy_executor::{InterruptExecutor, Spawner};
use embassy_stm32::adc::Adc;
use embassy_stm32::gpio::{Level, Output, Speed};
use embassy_stm32::interrupt::{InterruptExt, Priority};
use embassy_stm32::mode::{Async, Blocking};
use embassy_stm32::peripherals::{ADC1, PA5, PA6};
use embassy_stm32::spi::{Config as SpiConfig, Spi};
use embassy_stm32::time::Hertz;
use embassy_stm32::usart::{Config as UsartConfig, Uart};
use embassy_stm32::{bind_interrupts, interrupt, peripherals, usart};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::signal::Signal;
use embassy_time::Ticker;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use balloon_tx::drivers::si4032::Si4032;
use balloon_tx::drivers::ublox::{self, UbxMessage, UbxParser};
use balloon_tx::hal::adc::{AdcBank, AdcReading};
use balloon_tx::hal::gpio::StatusLeds;
use balloon_tx::prelude::*;
use balloon_tx::radio::link::{PacketProducer, PacketQueue, TxLink};
use balloon_tx::radio::state::{ModeSequencer, StepOutcome};
use balloon_tx::radio::transmit::{configure_transmitter, ClockEvent, ClockEvents, SymbolClock};

// Bind interrupt handlers
bind_interrupts!(struct Irqs {
    USART1 => usart::InterruptHandler<peripherals::USART1>;
});

type Radio = Si4032<Spi<'static, Blocking>, Output<'static>>;
type Leds = StatusLeds<Output<'static>, Output<'static>, Output<'static>>;

/// Latest GPS fix, written by the GPS task and copied by the sequencer
struct GpsMailbox(Mutex<CriticalSectionRawMutex, Cell<Option<GpsFix>>>);

impl GpsMailbox {
    const fn new() -> Self {
        Self(Mutex::new(Cell::new(None)))
    }

    fn publish(&self, fix: GpsFix) {
        self.0.lock(|cell| cell.set(Some(fix)));
    }
}

impl GpsSource for GpsMailbox {
    fn last_fix(&self) -> GpsFix {
        self.0.lock(Cell::get).unwrap_or_default()
    }
}

static EXECUTOR_HIGH: InterruptExecutor = InterruptExecutor::new();
static RADIO: Mutex<CriticalSectionRawMutex, RefCell<Option<Radio>>> = Mutex::new(RefCell::new(None));
static TX_LINK: TxLink = TxLink::new();
static TX_READY: Signal<CriticalSectionRawMutex, ()> = Signal::new();
static ADC_BANK: AdcBank = AdcBank::new();
static GPS_FIX: GpsMailbox = GpsMailbox::new();
static PACKETS: StaticCell<PacketQueue> = StaticCell::new();

#[interrupt]
#[allow(non_snake_case)]
unsafe fn USART3() {
    EXECUTOR_HIGH.on_interrupt();
}

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Balloon TX Firmware v{}", env!("CARGO_PKG_VERSION"));

    let p = embassy_stm32::init(embassy_stm32::Config::default());
    info!("Peripherals initialized");

    // Red TX LED on PB8, green status LED on PB7 (active low), cutoff on PA12
    let leds = StatusLeds::new(
        Output::new(p.PB8, Level::Low, Speed::Low),
        Output::new(p.PB7, Level::High, Speed::Low),
        Output::new(p.PA12, Level::Low, Speed::Low),
    );

    // SI4032 on SPI2 (SCK=PB13, MISO=PB14, MOSI=PB15, CS=PC13)
    let mut spi_config = SpiConfig::default();
    spi_config.frequency = Hertz(1_000_000);
    let spi = Spi::new_blocking(p.SPI2, p.PB13, p.PB15, p.PB14, spi_config);
    let cs = Output::new(p.PC13, Level::High, Speed::VeryHigh);
    let mut radio = Si4032::new(spi, cs);

    let Some(carrier) = carrier_frequency() else {
        error!("Carrier {} Hz outside the synthesizer range", RTTY_FREQUENCY_HZ);
        return;
    };
    // A warm MCU reset leaves the previous flight's registers in place
    if let Err(e) = radio.soft_reset() {
        warn!("SI4032 soft reset failed: {}", e);
    }
    configure_transmitter(&mut radio, carrier, TX_POWER);
    info!("SI4032 keyed at {}", carrier);
    RADIO.lock(|cell| cell.replace(Some(radio)));

    // u-blox on USART1 (RX=PA10, TX=PA9)
    let mut gps_config = UsartConfig::default();
    gps_config.baudrate = GPS_BAUD_RATE;
    let gps_uart = match Uart::new(p.USART1, p.PA10, p.PA9, Irqs, p.DMA1_CH4, p.DMA1_CH5, gps_config) {
        Ok(uart) => uart,
        Err(e) => {
            error!("GPS UART config failed: {}", e);
            return;
        }
    };

    let adc = Adc::new(p.ADC1);

    let queue = PACKETS.init(PacketQueue::new());
    let (producer, consumer) = queue.split();
    let config = EngineConfig::default();
    let clock = SymbolClock::new(config, &TX_LINK, consumer);

    // Symbol clock preempts everything else
    interrupt::USART3.set_priority(Priority::P6);
    let high_spawner = EXECUTOR_HIGH.start(interrupt::USART3);
    high_spawner.spawn(symbol_clock_task(clock, leds)).unwrap();

    spawner.spawn(gps_task(gps_uart)).unwrap();
    spawner.spawn(adc_task(adc, p.PA5, p.PA6)).unwrap();

    info!("Tasks spawned, entering transmit cycle");

    let sequencer = ModeSequencer::new(CALLSIGN, config)
        .with_fsk_mode(FSK_MODE)
        .with_fsk_payload(FSK_PAYLOAD);
    run_sequencer(sequencer, producer).await;
}

/// Main loop: advance the transmit cycle, sleep until the clock frees the radio
async fn run_sequencer(mut sequencer: ModeSequencer, mut producer: PacketProducer<'static>) {
    loop {
        let outcome = RADIO.lock(|cell| {
            cell.borrow_mut()
                .as_mut()
                .map(|radio| sequencer.step(&TX_LINK, &mut producer, radio, &GPS_FIX, &ADC_BANK))
        });

        match outcome {
            Some(Ok(StepOutcome::Waiting)) => TX_READY.wait().await,
            Some(Ok(StepOutcome::Entered(mode))) => {
                info!("Mode {} (frame {})", mode, sequencer.frame_count());
                if mode == TxMode::Rtty {
                    if let Some(snapshot) = sequencer.snapshot() {
                        debug!("{}", snapshot);
                    }
                }
            }
            Some(Err(e)) => warn!("Packet skipped: {}", e),
            None => {
                error!("Radio missing");
                TX_READY.wait().await;
            }
        }
    }
}

/// Symbol clock task - one tick per symbol period
#[embassy_executor::task]
async fn symbol_clock_task(mut clock: SymbolClock<'static>, mut leds: Leds) {
    let mut ticker = Ticker::every(Duration::from_hz(u64::from(RTTY_SPEED)));
    loop {
        ticker.next().await;

        let events = RADIO.lock(|cell| match cell.borrow_mut().as_mut() {
            Some(radio) => clock.tick(radio, &mut leds, &ADC_BANK),
            None => ClockEvents::new(),
        });

        for event in events {
            match event {
                ClockEvent::ReadyToTransmit => TX_READY.signal(()),
                ClockEvent::CutoffAsserted => warn!("Cutoff asserted"),
                ClockEvent::DisableArmed => warn!("Disable armed, output muted"),
                ClockEvent::PacketStarted(_) | ClockEvent::PacketComplete(_) => debug!("{}", event),
            }
        }
    }
}

/// GPS task - configures the receiver, then decodes UBX bursts
#[embassy_executor::task]
async fn gps_task(mut uart: Uart<'static, Async>) {
    match ublox::configuration_frames(GPS_BAUD_RATE) {
        Ok(frames) => {
            for frame in &frames {
                if let Err(e) = uart.write(frame).await {
                    warn!("GPS config write failed: {}", e);
                }
            }
        }
        Err(e) => error!("GPS config frame: {}", e),
    }

    let mut parser = UbxParser::new();
    let mut buf = [0u8; 128];
    loop {
        match uart.read_until_idle(&mut buf).await {
            Ok(n) => {
                for &byte in &buf[..n] {
                    match parser.handle_incoming_byte(byte) {
                        Some(Ok(UbxMessage::Other { .. })) | None => {}
                        Some(Ok(_)) => GPS_FIX.publish(parser.last_fix()),
                        Some(Err(e)) => debug!("UBX rejected: {}", e),
                    }
                }
            }
            Err(e) => warn!("GPS UART error: {}", e),
        }
    }
}

/// ADC task - keeps the battery and button samples fresh
#[embassy_executor::task]
async fn adc_task(mut adc: Adc<'static, ADC1>, mut battery: PA5, mut button: PA6) {
    let mut ticker = Ticker::every(Duration::from_millis(5));
    loop {
        let raw = adc.read(&mut battery).await;
        ADC_BANK.store(AdcChannel::Battery, AdcReading::from_raw(raw));
        let raw = adc.read(&mut button).await;
        ADC_BANK.store(AdcChannel::Button, AdcReading::from_raw(raw));
        ticker.next().await;
    }
}
