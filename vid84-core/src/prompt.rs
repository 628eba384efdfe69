//! Start and abort prompts
//!
//! Shown before playback: either the container is rejected and the player
//! waits for a key to exit, or it is accepted and the player waits for a key
//! to start.

use embedded_hal::delay::DelayNs;
use vid84_display::{wait_for_any_key, DisplayBackend, DisplayError, InputSource, Screen};

use crate::config::PlayerConfig;
use crate::container::{Container, ContainerError};
use crate::error::PlaybackError;

/// Short reason for a rejected container
pub fn describe(error: ContainerError) -> &'static str {
    match error {
        ContainerError::TooShort => "File too short",
        ContainerError::BadIdentifier => "Not an 84VID file",
        ContainerError::BadRefreshRate(_) => "Refresh rate out of range",
        ContainerError::UnsupportedVersion(_) => "Unsupported format version",
        ContainerError::BadScaleFactor(_) => "Scale factor out of range",
        ContainerError::MissingEndMarker => "Missing end-of-stream marker",
    }
}

/// Tell the viewer the video was rejected and wait for a key
pub fn report_invalid<D, I, W>(
    display: &mut D,
    input: &mut I,
    delay: &mut W,
    config: &PlayerConfig,
    error: ContainerError,
) -> Result<(), DisplayError>
where
    D: DisplayBackend,
    I: InputSource,
    W: DelayNs,
{
    let mut screen = Screen::new();
    screen.set_line(0, "== BAD VIDEO FILE ==");
    screen.set_line(1, describe(error));
    screen.set_line(2, "Try encoding it again.");
    screen.set_line(4, "Press any key to exit..");
    screen.render(display)?;

    wait_for_any_key(input, delay, config.key_poll_ms);
    Ok(())
}

/// Announce an accepted video, wait for a key, then show the pre-load notice
pub fn await_start<D, I, W>(
    display: &mut D,
    input: &mut I,
    delay: &mut W,
    config: &PlayerConfig,
) -> Result<(), DisplayError>
where
    D: DisplayBackend,
    I: InputSource,
    W: DelayNs,
{
    let mut screen = Screen::new();
    screen.set_line(0, "== LOADED VIDEO FILE ==");
    screen.set_line(1, "Press any key to play!");
    screen.render(display)?;

    wait_for_any_key(input, delay, config.key_poll_ms);

    screen.set_line(2, "Pre-Loading first frame..");
    screen.render(display)
}

/// Validate `video` and run the matching prompt
///
/// A rejected container is reported on screen and returned as
/// [`PlaybackError::InvalidContainer`] once a key is pressed.
pub fn open<'a, D, I, W>(
    video: &'a [u8],
    display: &mut D,
    input: &mut I,
    delay: &mut W,
    config: &PlayerConfig,
) -> Result<Container<'a>, PlaybackError>
where
    D: DisplayBackend,
    I: InputSource,
    W: DelayNs,
{
    match Container::validate(video) {
        Ok(container) => {
            await_start(display, input, delay, config)?;
            Ok(container)
        }
        Err(e) => {
            report_invalid(display, input, delay, config, e)?;
            Err(e.into())
        }
    }
}
