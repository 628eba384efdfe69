//! 84VID Player Firmware
//!
//! Plays the rectangle-mesh video compiled into flash on a 320x240 ILI9341
//! panel driven by an RP2040.
//!
//! Wiring: SPI0 SCK=GP18, MOSI=GP19, CS=GP17, DC=GP20, RST=GP21.
//! Start button on GP15 to ground.

#![no_std]
#![no_main]

mod board;
mod ili9341;
mod panel;

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::spi::{self, Spi};
use embassy_time::Delay;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use vid84_core::{prompt, Phase, Player, PlayerConfig};
use vid84_display::FrameBuffer;

use crate::board::{Button, EmbassyClock};
use crate::ili9341::Ili9341;
use crate::panel::Panel;

/// Video container, copied by build.rs from the path in player.toml
static VIDEO: &[u8] = include_bytes!(concat!(env!("OUT_DIR"), "/video.84v"));

/// Postcard-encoded `PlayerConfig` from player.toml
static PLAYER_CONFIG: &[u8] = include_bytes!(concat!(env!("OUT_DIR"), "/player.bin"));

/// SPI clock for the panel
const PANEL_SPI_HZ: u32 = 62_500_000;

static FRAME_BUFFER: StaticCell<FrameBuffer> = StaticCell::new();

#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    info!("84VID player starting...");

    let p = embassy_rp::init(Default::default());
    let config = load_config();

    let mut spi_config = spi::Config::default();
    spi_config.frequency = PANEL_SPI_HZ;
    let spi = Spi::new_blocking_txonly(p.SPI0, p.PIN_18, p.PIN_19, spi_config);
    let dc = Output::new(p.PIN_20, Level::Low);
    let cs = Output::new(p.PIN_17, Level::High);
    let mut rst = Output::new(p.PIN_21, Level::High);
    let mut delay = Delay;

    let mut lcd = Ili9341::new(spi, dc, cs);
    if let Err(e) = lcd.init(&mut rst, &mut delay) {
        error!("Failed to initialize panel: {:?}", e);
        halt();
    }
    info!("Panel initialized");

    let frame = FRAME_BUFFER.init(FrameBuffer::new());
    let mut panel = Panel::new(lcd, frame);
    let mut button = Button::new(Input::new(p.PIN_15, Pull::Up));

    let container = match prompt::open(VIDEO, &mut panel, &mut button, &mut delay, &config) {
        Ok(container) => container,
        Err(e) => {
            error!("Video rejected: {:?}", e);
            halt();
        }
    };

    let header = container.header();
    info!(
        "Playing {} bytes at {} fps ({} ms/frame), scale {}",
        container.len(),
        header.refresh_rate(),
        header.time_per_frame_ms(),
        header.scale_factor()
    );

    let mut player: Player<'_, _, _, _> =
        match Player::new(&container, config, panel, EmbassyClock, delay) {
            Ok(player) => player,
            Err(e) => {
                error!("Player setup failed: {:?}", e);
                halt();
            }
        };

    loop {
        let before = player.phase();
        match player.step() {
            Ok(phase) => {
                if before == Phase::IdleOrPrime {
                    if let Some(report) = player.last_report() {
                        if report.slack_ms < 0 {
                            warn!("Frame {} late by {} ms", report.index, -report.slack_ms);
                        } else {
                            debug!(
                                "Frame {}: {} queued, {} live, {} prefetched, slept {} ms",
                                report.index,
                                report.queued,
                                report.live,
                                report.prefetched,
                                report.slept_ms
                            );
                        }
                    }
                }
                if phase.is_terminal() {
                    break;
                }
            }
            Err(e) => {
                error!("Playback stopped in {:?}: {:?}", player.phase(), e);
                break;
            }
        }
    }

    let summary = player.summary();
    info!(
        "Playback finished: {} frames, {} late",
        summary.frames, summary.late_frames
    );
    halt();
}

/// Decode the embedded config, falling back to the reference geometry
fn load_config() -> PlayerConfig {
    match postcard::from_bytes::<PlayerConfig>(PLAYER_CONFIG) {
        Ok(config) => {
            info!("Config loaded: {:?}", config);
            config
        }
        Err(_) => {
            warn!("Embedded config unreadable, using defaults");
            PlayerConfig::reference()
        }
    }
}

fn halt() -> ! {
    loop {
        cortex_m::asm::wfi();
    }
}
