//! Driver integration tests
//!
//! Each driver must hold its energy mode exactly while its transaction is in
//! flight and raise its completion event afterwards. The Si7021 bus traffic
//! is checked against `embedded-hal-mock`.
//!
//! Run with: cargo test -p firmware --test integration_drivers

#![allow(clippy::unwrap_used)]

use embedded_hal::i2c::ErrorKind;
use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction as I2cTransaction};
use energy::{EnergyArbiter, EnergyMode, EventScheduler};
use firmware::config::{AppEvent, SENSOR_EM, SERIAL_EM, TIMER_EM};
use firmware::drivers::serial::{SerialError, SerialRx, SerialTx};
use firmware::drivers::si7021::{SensorError, Si7021, CMD_MEASURE_TEMP_HOLD, I2C_ADDR};
use firmware::drivers::timer::{PeriodicTimer, TimerIrq};
use firmware::report::TempUnit;

fn system() -> (EnergyArbiter, EventScheduler<AppEvent>) {
    let arbiter = EnergyArbiter::default();
    arbiter.initialize();
    let scheduler = EventScheduler::new();
    scheduler.open();
    (arbiter, scheduler)
}

// ─── Si7021 ─────────────────────────────────────────────────────────────────

#[test]
fn si7021_read_issues_hold_master_command() {
    let (arbiter, scheduler) = system();
    let expectations = [I2cTransaction::write_read(
        I2C_ADDR,
        vec![CMD_MEASURE_TEMP_HOLD],
        vec![0x66, 0x43],
    )];
    let i2c = I2cMock::new(&expectations);
    let mut sensor = Si7021::new(i2c, &arbiter, &scheduler, SENSOR_EM);

    let temperature = sensor.read_temperature().unwrap();

    assert_eq!(temperature.code(), 0x6640);
    assert!((23_000..24_000).contains(&temperature.milli_celsius()));
    sensor.release().done();
}

#[test]
fn si7021_releases_block_and_raises_event() {
    let (arbiter, scheduler) = system();
    let expectations = [I2cTransaction::write_read(
        I2C_ADDR,
        vec![CMD_MEASURE_TEMP_HOLD],
        vec![0x00, 0x00],
    )];
    let mut sensor = Si7021::new(I2cMock::new(&expectations), &arbiter, &scheduler, SENSOR_EM);

    sensor.read_temperature().unwrap();

    assert_eq!(arbiter.count(SENSOR_EM), 0);
    assert!(scheduler.take(AppEvent::SENSOR_READ_DONE));
    sensor.release().done();
}

#[test]
fn si7021_bus_error_still_releases_block() {
    let (arbiter, scheduler) = system();
    let expectations = [I2cTransaction::write_read(
        I2C_ADDR,
        vec![CMD_MEASURE_TEMP_HOLD],
        vec![0x00, 0x00],
    )
    .with_error(ErrorKind::Other)];
    let mut sensor = Si7021::new(I2cMock::new(&expectations), &arbiter, &scheduler, SENSOR_EM);

    let err = sensor.read_temperature().unwrap_err();

    assert_eq!(err, SensorError::I2c(ErrorKind::Other));
    assert!(arbiter.counts().is_clear());
    assert!(scheduler.is_idle(), "no completion event on failure");
    sensor.release().done();
}

#[test]
fn si7021_saturated_arbiter_skips_the_bus() {
    let (arbiter, scheduler) = system();
    for _ in 0..9 {
        arbiter.block(SENSOR_EM).unwrap();
    }
    // No expectations: any bus access would fail the mock.
    let mut sensor = Si7021::new(I2cMock::new(&[]), &arbiter, &scheduler, SENSOR_EM);

    assert!(matches!(
        sensor.read_temperature(),
        Err(SensorError::Fatal(_))
    ));
    assert_eq!(arbiter.count(SENSOR_EM), 9);
    sensor.release().done();
}

// ─── Serial transmitter ─────────────────────────────────────────────────────

#[test]
fn serial_holds_mode_for_the_whole_frame() {
    let (arbiter, scheduler) = system();
    let tx: SerialTx<'_, 16> = SerialTx::new(&arbiter, &scheduler, SERIAL_EM);

    tx.start(b"T=1\r\n").unwrap();
    assert!(tx.is_busy());
    assert_eq!(arbiter.select_sleep_depth(), SERIAL_EM);

    let mut sent = Vec::new();
    while let Some(byte) = tx.on_tx_ready() {
        sent.push(byte);
        assert_eq!(arbiter.count(SERIAL_EM), 1, "block held mid-frame");
    }
    assert_eq!(sent, b"T=1\r\n");

    tx.on_tx_complete();
    assert!(!tx.is_busy());
    assert!(arbiter.counts().is_clear());
    assert!(scheduler.take(AppEvent::SERIAL_TX_DONE));
}

#[test]
fn serial_can_send_again_after_completion() {
    let (arbiter, scheduler) = system();
    let tx: SerialTx<'_, 4> = SerialTx::new(&arbiter, &scheduler, SERIAL_EM);

    tx.start(b"a").unwrap();
    assert_eq!(tx.start(b"b"), Err(SerialError::Busy));
    while tx.on_tx_ready().is_some() {}
    tx.on_tx_complete();

    tx.start(b"b").unwrap();
    assert_eq!(tx.on_tx_ready(), Some(b'b'));
}

// ─── Serial receiver ────────────────────────────────────────────────────────

fn feed<const N: usize>(rx: &SerialRx<'_, N>, bytes: &[u8]) -> Result<(), SerialError> {
    bytes.iter().try_for_each(|&b| rx.on_rx_byte(b))
}

#[test]
fn receiver_holds_mode_while_listening() {
    let (arbiter, scheduler) = system();
    let rx: SerialRx<'_, 8> = SerialRx::new(&arbiter, &scheduler, SERIAL_EM);

    rx.listen().unwrap();
    assert_eq!(arbiter.select_sleep_depth(), SERIAL_EM);

    // The hold outlives individual frames.
    feed(&rx, b"#C?").unwrap();
    assert_eq!(arbiter.count(SERIAL_EM), 1);

    rx.stop();
    assert!(arbiter.counts().is_clear());
    assert_eq!(arbiter.select_sleep_depth(), EnergyMode::Em3);
}

#[test]
fn receiver_frames_select_the_report_unit() {
    let (arbiter, scheduler) = system();
    let rx: SerialRx<'_, 8> = SerialRx::new(&arbiter, &scheduler, SERIAL_EM);
    rx.listen().unwrap();

    feed(&rx, b"\r\n#F?").unwrap();
    assert!(scheduler.take(AppEvent::SERIAL_RX));
    let frame = rx.take_frame().unwrap();
    assert_eq!(TempUnit::from_command(&frame), Some(TempUnit::Fahrenheit));

    feed(&rx, b"#C?").unwrap();
    assert!(scheduler.take(AppEvent::SERIAL_RX));
    let frame = rx.take_frame().unwrap();
    assert_eq!(TempUnit::from_command(&frame), Some(TempUnit::Celsius));

    feed(&rx, b"#K?").unwrap();
    let frame = rx.take_frame().unwrap();
    assert_eq!(TempUnit::from_command(&frame), None);
}

#[test]
fn receiver_overlong_frame_raises_no_event() {
    let (arbiter, scheduler) = system();
    let rx: SerialRx<'_, 4> = SerialRx::new(&arbiter, &scheduler, SERIAL_EM);
    rx.listen().unwrap();

    assert_eq!(
        feed(&rx, b"#Fahrenheit?"),
        Err(SerialError::FrameOverrun { capacity: 4 })
    );
    assert!(scheduler.is_idle());
    assert_eq!(rx.take_frame(), None);
    assert_eq!(arbiter.count(SERIAL_EM), 1, "overrun keeps the receiver listening");
}

#[test]
fn receiver_and_transmitter_share_the_serial_mode() {
    let (arbiter, scheduler) = system();
    let rx: SerialRx<'_, 4> = SerialRx::new(&arbiter, &scheduler, SERIAL_EM);
    let tx: SerialTx<'_, 4> = SerialTx::new(&arbiter, &scheduler, SERIAL_EM);

    rx.listen().unwrap();
    tx.start(b"x").unwrap();
    assert_eq!(arbiter.count(SERIAL_EM), 2);

    while tx.on_tx_ready().is_some() {}
    tx.on_tx_complete();
    assert_eq!(arbiter.count(SERIAL_EM), 1);

    rx.stop();
    assert!(arbiter.counts().is_clear());
}

// ─── Timer ──────────────────────────────────────────────────────────────────

#[test]
fn running_timer_keeps_core_out_of_stop() {
    let (arbiter, scheduler) = system();
    let timer = PeriodicTimer::new(&arbiter, &scheduler, TIMER_EM);

    timer.start().unwrap();
    assert_eq!(arbiter.select_sleep_depth(), EnergyMode::Em2);
    timer.on_interrupt(TimerIrq::UNDERFLOW);
    assert!(scheduler.take(AppEvent::TIMER_UF));

    timer.stop();
    assert_eq!(arbiter.select_sleep_depth(), EnergyMode::Em3);
}

#[test]
fn all_drivers_active_pick_the_shallowest_hold() {
    let (arbiter, scheduler) = system();
    let timer = PeriodicTimer::new(&arbiter, &scheduler, TIMER_EM);
    let tx: SerialTx<'_, 8> = SerialTx::new(&arbiter, &scheduler, SERIAL_EM);

    timer.start().unwrap();
    tx.start(b"x").unwrap();
    assert_eq!(arbiter.select_sleep_depth(), EnergyMode::Em2);

    timer.stop();
    assert_eq!(arbiter.select_sleep_depth(), EnergyMode::Em3);
    while tx.on_tx_ready().is_some() {}
    tx.on_tx_complete();
    assert!(arbiter.counts().is_clear());
}
