//! Low-power sensor node - Main Entry Point
//!
//! Hardware-only entry point for STM32H743ZI (NUCLEO-H743ZI pinout).
//!
//! | Peripheral | Pins             | Role                            |
//! |------------|------------------|---------------------------------|
//! | SysTick    | -                | 250 ms heartbeat                |
//! | I2C1       | PB8 SCL, PB9 SDA | Si7021 temperature sensor       |
//! | USART3     | PD8 TX, PD9 RX   | report link, `#F?`/`#C?` input  |
//!
//! USART3 is polled from the main loop: received bytes are fed to the
//! command receiver and queued report bytes are drained each iteration. The
//! receiver holds `SERIAL_EM` from boot; a report frame holds it only for
//! the loop iteration that drains it.

#![no_std]
#![no_main]

use cortex_m::peripheral::syst::SystClkSource;
use cortex_m_rt::{entry, exception};
use embassy_stm32::dma::NoDma;
use embassy_stm32::i2c::{self, I2c};
use embassy_stm32::time::Hertz;
use embassy_stm32::usart::{self, Uart};
use embassy_stm32::{bind_interrupts, peripherals};
use energy::{EnergyArbiter, EventScheduler, SleepDecision};
use heapless::String;

use firmware::config::{
    AppEvent, APP_NAME, APP_VERSION, ARBITER_CONFIG, HEARTBEAT_RELOAD, SENSOR_EM, SERIAL_EM,
    TICKS_PER_READ, TIMER_EM,
};
use firmware::drivers::serial::{SerialError, SerialRx, SerialTx};
use firmware::drivers::si7021::{SensorError, Si7021};
use firmware::drivers::timer::{PeriodicTimer, TimerIrq};
use firmware::exception_handlers::halt;
use firmware::idle_step;
use firmware::power::CortexMSleep;
use firmware::report::{write_report, TempUnit};

// Logging transport and panic handler
use defmt_rtt as _;
use panic_probe as _;

/// Report frames are at most one formatted temperature line.
const FRAME_LEN: usize = 32;

/// Command frame bodies are a single unit letter; leave room for noise.
const COMMAND_LEN: usize = 8;

static ARBITER: EnergyArbiter = EnergyArbiter::new(ARBITER_CONFIG);
static SCHEDULER: EventScheduler<AppEvent> = EventScheduler::new();
static HEARTBEAT: PeriodicTimer<'static> = PeriodicTimer::new(&ARBITER, &SCHEDULER, TIMER_EM);
static REPORT: SerialTx<'static, FRAME_LEN> = SerialTx::new(&ARBITER, &SCHEDULER, SERIAL_EM);
static COMMANDS: SerialRx<'static, COMMAND_LEN> = SerialRx::new(&ARBITER, &SCHEDULER, SERIAL_EM);

bind_interrupts!(struct Irqs {
    I2C1_EV => i2c::EventInterruptHandler<peripherals::I2C1>;
    I2C1_ER => i2c::ErrorInterruptHandler<peripherals::I2C1>;
    USART3 => usart::InterruptHandler<peripherals::USART3>;
});

#[entry]
fn main() -> ! {
    defmt::info!("{=str} v{=str}", APP_NAME, APP_VERSION);

    ARBITER.initialize();
    SCHEDULER.open();

    let p = embassy_stm32::init(embassy_stm32::Config::default());
    let Some(mut cp) = cortex_m::Peripherals::take() else {
        defmt::panic!("core peripherals already taken");
    };

    let i2c = I2c::new(
        p.I2C1,
        p.PB8,
        p.PB9,
        Irqs,
        NoDma,
        NoDma,
        Hertz(100_000),
        i2c::Config::default(),
    );
    let mut sensor = Si7021::new(i2c, &ARBITER, &SCHEDULER, SENSOR_EM);

    let uart = match Uart::new(
        p.USART3,
        p.PD9,
        p.PD8,
        Irqs,
        NoDma,
        NoDma,
        usart::Config::default(),
    ) {
        Ok(uart) => uart,
        Err(_) => defmt::panic!("USART3 configuration rejected"),
    };
    let (mut tx, mut rx) = uart.split();

    // Heartbeat: SysTick from the core clock, underflow interrupt only.
    cp.SYST.set_clock_source(SystClkSource::Core);
    cp.SYST.set_reload(HEARTBEAT_RELOAD);
    cp.SYST.clear_current();
    cp.SYST.enable_counter();
    cp.SYST.enable_interrupt();

    let mut sleep = CortexMSleep::new(cp.SCB);
    let mut ticks_until_read = TICKS_PER_READ;
    let mut unit = TempUnit::default();

    SCHEDULER.add(AppEvent::BOOT_UP);
    defmt::info!("Boot complete, entering idle loop");

    loop {
        let step = idle_step(&ARBITER, &SCHEDULER, &mut sleep);
        if let Some(SleepDecision::StayAwake { blocked }) = step.decision {
            defmt::trace!("sleep vetoed by {}", blocked);
        }

        if SCHEDULER.take(AppEvent::BOOT_UP) {
            if let Err(fatal) = HEARTBEAT.start() {
                halt(fatal);
            }
            defmt::info!("Heartbeat running, holding {}", HEARTBEAT.block_mode());
            if let Err(fatal) = COMMANDS.listen() {
                halt(fatal);
            }
        }

        while let Ok(byte) = rx.nb_read() {
            if let Err(e) = COMMANDS.on_rx_byte(byte) {
                defmt::warn!("command dropped: {}", e);
            }
        }

        if SCHEDULER.take(AppEvent::SERIAL_RX) {
            if let Some(frame) = COMMANDS.take_frame() {
                match TempUnit::from_command(&frame) {
                    Some(selected) => {
                        unit = selected;
                        defmt::info!("reporting in {}", unit);
                    }
                    None => defmt::warn!("unknown command {=[u8]}", frame.as_slice()),
                }
            }
        }

        if SCHEDULER.take(AppEvent::TIMER_UF) {
            ticks_until_read = ticks_until_read.saturating_sub(1);
            if ticks_until_read == 0 {
                ticks_until_read = TICKS_PER_READ;
                match sensor.read_temperature() {
                    Ok(temperature) => {
                        let mut line: String<FRAME_LEN> = String::new();
                        if write_report(&mut line, temperature, unit).is_ok() {
                            match REPORT.start(line.as_bytes()) {
                                Ok(()) => {}
                                Err(SerialError::Fatal(fatal)) => halt(fatal),
                                Err(e) => defmt::warn!("report dropped: {}", e),
                            }
                        }
                    }
                    Err(SensorError::Fatal(fatal)) => halt(fatal),
                    Err(SensorError::I2c(e)) => {
                        defmt::warn!("Si7021 read failed: {}", e);
                    }
                }
            }
        }

        if SCHEDULER.take(AppEvent::SENSOR_READ_DONE) {
            defmt::debug!("temperature read complete");
        }

        // USART3 is polled: drain the frame, wait for the shift register,
        // then run the completion path the TC interrupt would.
        if REPORT.is_busy() {
            while let Some(byte) = REPORT.on_tx_ready() {
                if tx.blocking_write(&[byte]).is_err() {
                    defmt::warn!("USART3 write error");
                    break;
                }
            }
            if tx.blocking_flush().is_err() {
                defmt::warn!("USART3 flush error");
            }
            REPORT.on_tx_complete();
        }

        if SCHEDULER.take(AppEvent::SERIAL_TX_DONE) {
            defmt::debug!("report sent");
        }
    }
}

#[exception]
fn SysTick() {
    HEARTBEAT.on_interrupt(TimerIrq::UNDERFLOW);
}
