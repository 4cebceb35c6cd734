//! klok-hw-interface
//!
//! Tempo clock generator firmware for the Raspberry Pi Pico 2. Wires the
//! `klok` timing engine to the module's hardware:
//!
//! 1. An 8 kHz ticker drives the engine's primary tick: button debouncing,
//!    clock generation, and the clock-output / LED levels.
//! 2. A 1 kHz ticker feeds the legacy counter clock while legacy mode is
//!    active.
//! 3. A pin-edge task follows the external pause gate.
//! 4. A cooperative scan loop samples the three analog channels, runs the
//!    settings menu, plays its acknowledgment animation, and persists
//!    settings to flash.
//!
//! The engine lives behind one mutex; cross-task flags (run state, legacy
//! tick enable and step) are plain atomics so the tick path never blocks on
//! the scan loop.

#![no_std]
#![no_main]

use core::cell::RefCell;
use core::sync::atomic::{AtomicBool, AtomicU32, AtomicU8, Ordering};

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::adc::{self, Adc, Channel};
use embassy_rp::bind_interrupts;
use embassy_rp::block::ImageDef;
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::pwm::Pwm;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex as BlockingMutex;
use embassy_sync::mutex::Mutex;
use embassy_time::{Duration, Ticker, Timer};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use klok::engine::{BRIGHTNESS_FULL, BRIGHTNESS_NONE, LEGACY_STEP_FAST};
use klok::{AnalogSnapshot, Engine, LedPattern, MenuTransition, RunState};

mod leds;
mod store;

use leds::Leds;
use store::SettingsStore;

// ---------------------------------------------------------------------------
// Boot block and interrupt binding
// ---------------------------------------------------------------------------

/// Tell the RP2350 Boot ROM about our application.
#[link_section = ".start_block"]
#[used]
pub static IMAGE_DEF: ImageDef = ImageDef::secure_exe();

// Wire the ADC FIFO interrupt to Embassy's async handler.
bind_interrupts!(struct Irqs {
    ADC_IRQ_FIFO => adc::InterruptHandler;
});

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

const RUN_RUNNING: u8 = 0;
const RUN_PAUSED: u8 = 1;

/// Run/pause word, written by the tick task (button toggles) and the pause
/// gate task, read every primary tick.
static RUN_STATE: AtomicU8 = AtomicU8::new(RUN_RUNNING);

/// Whether the legacy tick task should feed the counter clock.
static LEGACY_TICK_ENABLED: AtomicBool = AtomicBool::new(false);

/// Counts per legacy tick; depends on the speed-mode switch.
static LEGACY_STEP: AtomicU32 = AtomicU32::new(LEGACY_STEP_FAST);

type EngineMutex = Mutex<CriticalSectionRawMutex, Engine>;
type LedMutex = BlockingMutex<CriticalSectionRawMutex, RefCell<Leds>>;

static ENGINE: StaticCell<EngineMutex> = StaticCell::new();
static LEDS: StaticCell<LedMutex> = StaticCell::new();

fn load_run_state() -> RunState {
    if RUN_STATE.load(Ordering::Relaxed) == RUN_PAUSED {
        RunState::Paused
    } else {
        RunState::Running
    }
}

fn store_run_state(state: RunState) {
    let word = if state.is_paused() {
        RUN_PAUSED
    } else {
        RUN_RUNNING
    };
    RUN_STATE.store(word, Ordering::Relaxed);
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

/// 8 kHz primary tick: debounce, clock generation, output pin, LEDs.
#[embassy_executor::task]
async fn tick_task(
    engine: &'static EngineMutex,
    leds: &'static LedMutex,
    button: Input<'static>,
    mut clock_out: Output<'static>,
) {
    info!("tick task started");
    let mut ticker = Ticker::every(Duration::from_micros(125));
    loop {
        ticker.next().await;

        let run_state = load_run_state();
        let out = engine.lock().await.tick(button.is_low(), run_state);

        // Store back only on an actual toggle, so a concurrent pause-gate
        // write is never clobbered with a stale value.
        if out.run_state != run_state {
            store_run_state(out.run_state);
        }

        clock_out.set_level(if out.clock_out { Level::High } else { Level::Low });
        if let Some(pattern) = out.leds {
            leds.lock(|l| l.borrow_mut().set(pattern));
        }
    }
}

/// 1 kHz secondary tick feeding the legacy counter clock.
#[embassy_executor::task]
async fn legacy_tick_task(engine: &'static EngineMutex) {
    let mut ticker = Ticker::every(Duration::from_millis(1));
    loop {
        ticker.next().await;
        if LEGACY_TICK_ENABLED.load(Ordering::Relaxed) {
            let step = LEGACY_STEP.load(Ordering::Relaxed);
            engine.lock().await.advance_legacy(step);
        }
    }
}

/// Follows the external pause gate. The input stage inverts, so an active
/// gate reads LOW on the pin.
#[embassy_executor::task]
async fn pause_cv_task(mut gate: Input<'static>) {
    loop {
        gate.wait_for_any_edge().await;
        let state = if gate.is_low() {
            RunState::Paused
        } else {
            RunState::Running
        };
        store_run_state(state);
        debug!("pause gate: {}", state);
    }
}

/// Cooperative scan loop: analog sampling, settings menu, persistence.
///
/// Settings saves erase a flash sector and block this executor, the tick
/// task included, for the erase duration; the tick ticker bursts to catch
/// up afterwards. Saves happen only on menu exit and tap lock/unlock,
/// never per pass.
#[embassy_executor::task]
async fn scan_task(
    engine: &'static EngineMutex,
    leds: &'static LedMutex,
    mut adc: Adc<'static, adc::Async>,
    mut tempo_pot: Channel<'static>,
    mut tempo_cv: Channel<'static>,
    mut selector: Channel<'static>,
    mut store: SettingsStore,
) {
    info!("scan task started");
    loop {
        let snapshot = match read_snapshot(
            &mut adc,
            &mut tempo_pot,
            &mut tempo_cv,
            &mut selector,
        )
        .await
        {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("ADC read failed: {}", e);
                Timer::after_millis(1).await;
                continue;
            }
        };

        let output = engine.lock().await.scan(snapshot);

        LEGACY_TICK_ENABLED.store(output.legacy_tick_enabled, Ordering::Relaxed);
        LEGACY_STEP.store(output.legacy_step, Ordering::Relaxed);

        // Deferred persistence (tap lock/unlock) happens here, in loop
        // context, never from the tick path.
        if let Some(settings) = output.save_settings {
            store.save(settings);
        }

        match output.transition {
            Some(MenuTransition::Enter) => {
                menu_animation(leds).await;
                engine.lock().await.finish_menu_transition();
            }
            Some(MenuTransition::Exit {
                settings,
                force_running,
            }) => {
                store.save(settings);
                if force_running {
                    store_run_state(RunState::Running);
                }
                menu_animation(leds).await;
                engine.lock().await.finish_menu_transition();
            }
            None => {}
        }
    }
}

/// One pass over the three analog channels, scaled from the 12-bit
/// conversions to the engine's 8-bit range.
async fn read_snapshot(
    adc: &mut Adc<'static, adc::Async>,
    tempo_pot: &mut Channel<'static>,
    tempo_cv: &mut Channel<'static>,
    selector: &mut Channel<'static>,
) -> Result<AnalogSnapshot, adc::Error> {
    Ok(AnalogSnapshot {
        tempo_pot: (adc.read(tempo_pot).await? >> 4) as u8,
        tempo_cv: (adc.read(tempo_cv).await? >> 4) as u8,
        selector: (adc.read(selector).await? >> 4) as u8,
    })
}

/// Menu acknowledgment: alternate the two LEDs, then hold both on. The
/// engine sits in its transition state meanwhile and leaves the LEDs to us.
async fn menu_animation(leds: &'static LedMutex) {
    for step in 0..6u8 {
        let pattern = if step % 2 == 0 {
            LedPattern {
                clock: BRIGHTNESS_FULL,
                pause: BRIGHTNESS_NONE,
            }
        } else {
            LedPattern {
                clock: BRIGHTNESS_NONE,
                pause: BRIGHTNESS_FULL,
            }
        };
        leds.lock(|l| l.borrow_mut().set(pattern));
        Timer::after_millis(150).await;
    }
    leds.lock(|l| {
        l.borrow_mut().set(LedPattern {
            clock: BRIGHTNESS_FULL,
            pause: BRIGHTNESS_FULL,
        })
    });
    Timer::after_millis(150).await;
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let p = embassy_rp::init(Default::default());
    info!("klok-hw-interface starting");

    // —— Pin assignments ————————————————————————————————————————————————————
    // LED_CLOCK  → GP14 (PWM slice 7 A)
    // LED_PAUSE  → GP15 (PWM slice 7 B)
    // BUTTON     → GP16 (active-low, pull-up)
    // PAUSE_CV   → GP17 (inverted gate input)
    // CLOCK_OUT  → GP18
    // TEMPO_POT  → GP26 (ADC0)
    // TEMPO_CV   → GP27 (ADC1, inverted input stage)
    // SELECTOR   → GP28 (ADC2)
    // ———————————————————————————————————————————————————————————————————————

    let mut store = SettingsStore::new(p.FLASH);
    let mut engine = Engine::new();
    match store.load() {
        Some(byte) => engine.load_settings(byte),
        None => info!("no stored settings; using defaults"),
    }
    let engine = ENGINE.init(Mutex::new(engine));

    let pwm = Pwm::new_output_ab(
        p.PWM_SLICE7,
        p.PIN_14,
        p.PIN_15,
        embassy_rp::pwm::Config::default(),
    );
    let leds = LEDS.init(BlockingMutex::new(RefCell::new(Leds::new(pwm))));

    let button = Input::new(p.PIN_16, Pull::Up);
    let pause_cv = Input::new(p.PIN_17, Pull::Up);
    let clock_out = Output::new(p.PIN_18, Level::Low);

    let adc = Adc::new(p.ADC, Irqs, adc::Config::default());
    let tempo_pot = Channel::new_pin(p.PIN_26, Pull::None);
    let tempo_cv = Channel::new_pin(p.PIN_27, Pull::None);
    let selector = Channel::new_pin(p.PIN_28, Pull::None);

    spawner.spawn(tick_task(engine, leds, button, clock_out)).unwrap();
    spawner.spawn(legacy_tick_task(engine)).unwrap();
    spawner.spawn(pause_cv_task(pause_cv)).unwrap();
    spawner
        .spawn(scan_task(
            engine, leds, adc, tempo_pot, tempo_cv, selector, store,
        ))
        .unwrap();

    info!("All tasks spawned");
}
