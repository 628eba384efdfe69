//! Real-time playback loop

use embedded_hal::delay::DelayNs;
use vid84_display::GraphicsDisplayBackend;

use crate::config::PlayerConfig;
use crate::container::{Container, Header, END_OF_STREAM, FRAME_DATA_START, FRAME_START};
use crate::decoder::{FrameEnd, StreamDecoder};
use crate::error::PlaybackError;
use crate::queue::QUEUE_CAPACITY;
use crate::traits::{Clock, Deadline};

use super::render::{self, Layout, LiveSink};
use super::state::{Phase, PlayerState};

/// Timing and decode counts for one rendered frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FrameReport {
    /// Zero-based frame number
    pub index: u32,
    /// Render time from frame start to flush (ms)
    pub elapsed_ms: u64,
    /// Frame budget minus render time; negative when late
    pub slack_ms: i64,
    /// Rectangles drawn from the lookahead queue
    pub queued: usize,
    /// Rectangles drawn by live decoding
    pub live: usize,
    /// Rectangles decoded ahead for the next frame
    pub prefetched: usize,
    /// Time spent sleeping after the frame (ms)
    pub slept_ms: u32,
    /// Whether this was the last frame
    pub end: FrameEnd,
}

/// Totals for a finished playback
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PlaybackSummary {
    pub frames: u32,
    pub late_frames: u32,
}

/// A frame that has been flushed but not yet paced
#[derive(Debug, Clone, Copy)]
struct Rendered {
    started_ms: u64,
    queued: usize,
    live: usize,
    end: FrameEnd,
}

/// Frame scheduler
///
/// Owns the display, clock and delay for the duration of playback. Call
/// [`Player::step`] to advance one phase or [`Player::run`] to play to the
/// end of the stream.
pub struct Player<'a, D, C, W, const N: usize = QUEUE_CAPACITY> {
    decoder: StreamDecoder<'a>,
    header: Header,
    config: PlayerConfig,
    layout: Layout,
    display: D,
    clock: C,
    delay: W,
    state: PlayerState<N>,
    rendered: Option<Rendered>,
    last_report: Option<FrameReport>,
    fault: Option<PlaybackError>,
}

impl<'a, D, C, W, const N: usize> Player<'a, D, C, W, N>
where
    D: GraphicsDisplayBackend,
    C: Clock,
    W: DelayNs,
{
    /// Create a player for a validated container
    pub fn new(
        container: &Container<'a>,
        config: PlayerConfig,
        display: D,
        clock: C,
        delay: W,
    ) -> Result<Self, PlaybackError> {
        config.validate()?;
        let header = container.header();

        Ok(Self {
            decoder: StreamDecoder::new(container),
            header,
            config,
            layout: Layout::new(&config, header.scale_factor()),
            display,
            clock,
            delay,
            state: PlayerState::new(),
            rendered: None,
            last_report: None,
            fault: None,
        })
    }

    /// Current phase
    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    /// Playback state
    pub fn state(&self) -> &PlayerState<N> {
        &self.state
    }

    /// Container header
    pub fn header(&self) -> Header {
        self.header
    }

    /// Report for the most recently paced frame
    pub fn last_report(&self) -> Option<FrameReport> {
        self.last_report
    }

    /// Error that stopped playback, if any
    pub fn fault(&self) -> Option<PlaybackError> {
        self.fault
    }

    /// Totals so far
    pub fn summary(&self) -> PlaybackSummary {
        PlaybackSummary {
            frames: self.state.frames,
            late_frames: self.state.late_frames,
        }
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn display_mut(&mut self) -> &mut D {
        &mut self.display
    }

    /// Give back the display, clock and delay
    pub fn into_parts(self) -> (D, C, W) {
        (self.display, self.clock, self.delay)
    }

    /// Advance one phase and return the phase reached
    ///
    /// `Done` is sticky. An error ends playback: the phase it happened in is
    /// kept for reporting, and every later call returns the same error
    /// without touching the display or the stream.
    pub fn step(&mut self) -> Result<Phase, PlaybackError> {
        if let Some(fault) = self.fault {
            return Err(fault);
        }
        let result = match self.state.phase {
            Phase::AwaitStart => self.locate_first_frame(),
            Phase::PrimeFirstFrame => self.prime_first_frame(),
            Phase::RenderFrame => self.render_frame(),
            Phase::IdleOrPrime => self.idle_or_prime(),
            Phase::Done => Ok(Phase::Done),
        };
        match result {
            Ok(next) => {
                self.state.phase = next;
                Ok(next)
            }
            Err(e) => {
                self.fault = Some(e);
                Err(e)
            }
        }
    }

    /// Play until the end of the stream
    pub fn run(&mut self) -> Result<PlaybackSummary, PlaybackError> {
        while !self.step()?.is_terminal() {}
        Ok(self.summary())
    }

    fn locate_first_frame(&mut self) -> Result<Phase, PlaybackError> {
        match self.decoder.byte_at(FRAME_DATA_START)? {
            FRAME_START => {
                self.state.cursor = FRAME_DATA_START + 1;
                Ok(Phase::PrimeFirstFrame)
            }
            END_OF_STREAM => {
                self.state.cursor = FRAME_DATA_START;
                Ok(Phase::Done)
            }
            _ => Err(PlaybackError::MalformedFrame {
                offset: FRAME_DATA_START,
            }),
        }
    }

    fn prime_first_frame(&mut self) -> Result<Phase, PlaybackError> {
        if self.config.prefetch {
            let grace = Deadline::after(&self.clock, self.config.prime_grace_ms);
            self.state
                .queue
                .try_fill(&self.decoder, &mut self.state.cursor, &grace)?;
        }
        Ok(Phase::RenderFrame)
    }

    fn render_frame(&mut self) -> Result<Phase, PlaybackError> {
        let started_ms = self.clock.now_ms();

        render::paint_background(&mut self.display, &self.config)?;

        let layout = self.layout;
        let display = &mut self.display;
        let queued = if self.state.queue.is_primed() {
            self.state
                .queue
                .drain(|rect| render::paint_rect(display, rect, &layout))?
        } else {
            0
        };

        let mut live = LiveSink::new(&mut self.display, layout);
        let frame = self.decoder.decode_frame(&mut self.state.cursor, &mut live)?;

        self.display.flush()?;

        self.rendered = Some(Rendered {
            started_ms,
            queued,
            live: frame.rects,
            end: frame.end,
        });
        Ok(Phase::IdleOrPrime)
    }

    fn idle_or_prime(&mut self) -> Result<Phase, PlaybackError> {
        let Some(frame) = self.rendered.take() else {
            return Ok(Phase::RenderFrame);
        };

        let budget_ms = self.header.time_per_frame_ms() as u64;
        let elapsed_ms = self.clock.now_ms().saturating_sub(frame.started_ms);
        let slack_ms = budget_ms as i64 - elapsed_ms as i64;

        let mut prefetched = 0;
        let mut slept_ms = 0;

        if slack_ms > 0 {
            let remaining_ms = match frame.end {
                FrameEnd::Next if self.config.prefetch => {
                    let deadline = Deadline::at(&self.clock, frame.started_ms + budget_ms);
                    let segment = self.state.queue.try_fill(
                        &self.decoder,
                        &mut self.state.cursor,
                        &deadline,
                    )?;
                    prefetched = segment.emitted;
                    // Queue full or sentinel reached before the deadline
                    deadline.remaining_ms()
                }
                _ => slack_ms as u64,
            };
            if remaining_ms > 0 {
                slept_ms = remaining_ms.min(u32::MAX as u64) as u32;
                self.delay.delay_ms(slept_ms);
            }
        } else {
            // Late frames are shown late, never dropped
            self.state.late_frames += 1;
        }

        self.last_report = Some(FrameReport {
            index: self.state.frames,
            elapsed_ms,
            slack_ms,
            queued: frame.queued,
            live: frame.live,
            prefetched,
            slept_ms,
            end: frame.end,
        });
        self.state.frames += 1;

        Ok(match frame.end {
            FrameEnd::Next => Phase::RenderFrame,
            FrameEnd::Last => Phase::Done,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{rect_stream, video, ManualClock, RecordingDelay, RecordingDisplay};
    use vid84_display::{DisplayError, FrameBuffer};

    const SCENARIO: [u8; 14] = [
        b'8', b'4', b'V', b'I', b'D', 12, 1, 6, 0xFF, 10, 10, 20, 20, 0xFE,
    ];

    fn player<'a, 'c>(
        container: &Container<'a>,
        config: PlayerConfig,
        clock: &'c ManualClock,
        cost_ms: u64,
    ) -> Player<'a, RecordingDisplay<'c>, &'c ManualClock, RecordingDelay<'c>> {
        Player::new(
            container,
            config,
            RecordingDisplay::timed(clock, cost_ms),
            clock,
            RecordingDelay::new(clock),
        )
        .unwrap()
    }

    #[test]
    fn test_scenario_paints_one_rectangle() {
        let container = Container::validate(&SCENARIO).unwrap();
        let clock = ManualClock::new(0);
        let mut player: Player<'_, FrameBuffer, _, _> = Player::new(
            &container,
            PlayerConfig::reference(),
            FrameBuffer::new(),
            &clock,
            RecordingDelay::new(&clock),
        )
        .unwrap();

        let summary = player.run().unwrap();
        assert_eq!(summary, PlaybackSummary { frames: 1, late_frames: 0 });

        let fb = player.display();
        assert_eq!(fb.presented(), 1);
        assert_eq!(fb.ink_in(40, 0, 240, 240), 60 * 60);
        assert_eq!(fb.ink_in(100, 60, 60, 60), 60 * 60);
        assert_eq!(fb.ink_in(0, 0, 40, 240), 40 * 240);
        assert_eq!(fb.ink_in(280, 0, 40, 240), 40 * 240);

        let (_, _, delay) = player.into_parts();
        // 1000 / 12 = 83 ms budget, nothing charged for drawing
        assert_eq!(delay.sleeps, [83]);
    }

    #[test]
    fn test_phase_sequence() {
        let container = Container::validate(&SCENARIO).unwrap();
        let clock = ManualClock::new(0);
        let mut player = player(&container, PlayerConfig::reference(), &clock, 0);

        assert_eq!(player.phase(), Phase::AwaitStart);
        assert_eq!(player.step().unwrap(), Phase::PrimeFirstFrame);
        assert_eq!(player.step().unwrap(), Phase::RenderFrame);
        assert_eq!(player.state().queue().len(), 1);
        assert_eq!(player.step().unwrap(), Phase::IdleOrPrime);
        assert_eq!(player.step().unwrap(), Phase::Done);
        assert_eq!(player.step().unwrap(), Phase::Done);

        let report = player.last_report().unwrap();
        assert_eq!(report.index, 0);
        assert_eq!(report.queued, 1);
        assert_eq!(report.live, 0);
        assert_eq!(report.end, FrameEnd::Last);
    }

    #[test]
    fn test_degenerate_rectangle_uses_scale_unit() {
        let data = video(12, 2, &[&[[5, 5, 5, 5]]]);
        let container = Container::validate(&data).unwrap();
        let clock = ManualClock::new(0);
        let mut player = player(&container, PlayerConfig::reference(), &clock, 0);

        player.run().unwrap();

        assert_eq!(
            player.display().ink_fills(),
            [(0, 0, 40, 240), (280, 0, 40, 240), (50, 10, 2, 2)]
        );
    }

    #[test]
    fn test_prefetch_paces_every_frame() {
        // 100 ms per frame, 10 ms per fill, 3 fills of background per frame
        let frame = [[1, 1, 2, 2], [3, 3, 4, 4]];
        let data = video(10, 1, &[&frame, &frame, &frame]);
        let container = Container::validate(&data).unwrap();
        let clock = ManualClock::new(0);
        let mut player = player(&container, PlayerConfig::reference(), &clock, 10);

        let summary = player.run().unwrap();

        assert_eq!(summary, PlaybackSummary { frames: 3, late_frames: 0 });
        let report = player.last_report().unwrap();
        assert_eq!(report.queued, 2);
        assert_eq!(report.live, 0);
        assert_eq!(report.elapsed_ms, 50);
        assert_eq!(report.slack_ms, 50);
        assert_eq!(report.prefetched, 0);

        let (display, clock, delay) = player.into_parts();
        assert_eq!(delay.sleeps, [50, 50, 50]);
        assert_eq!(clock.peek(), 300);
        assert_eq!(display.flushes(), 3);
    }

    #[test]
    fn test_synchronous_variant_sleeps_the_slack() {
        let frame = [[1, 1, 2, 2], [3, 3, 4, 4]];
        let data = video(10, 1, &[&frame, &frame]);
        let container = Container::validate(&data).unwrap();
        let clock = ManualClock::new(0);
        let mut player = player(&container, PlayerConfig::synchronous(), &clock, 10);

        player.run().unwrap();

        let report = player.last_report().unwrap();
        assert_eq!(report.queued, 0);
        assert_eq!(report.live, 2);
        assert_eq!(report.prefetched, 0);
        assert!(player.state().queue().is_empty());

        let (_, _, delay) = player.into_parts();
        assert_eq!(delay.sleeps, [50, 50]);
    }

    #[test]
    fn test_large_frame_splits_between_queue_and_live() {
        let data = rect_stream(40, 1);
        let container = Container::validate(&data).unwrap();
        let clock = ManualClock::new(0);
        let mut player = player(&container, PlayerConfig::reference(), &clock, 0);

        player.run().unwrap();

        let report = player.last_report().unwrap();
        assert_eq!(report.queued, QUEUE_CAPACITY);
        assert_eq!(report.live, 8);
        // Two borders plus every rectangle
        assert_eq!(player.display().ink_fills().len(), 2 + 40);
    }

    #[test]
    fn test_prefetch_stops_at_queue_capacity() {
        let big: [[u8; 4]; 40] = core::array::from_fn(|i| [i as u8, 0, i as u8 + 1, 1]);
        let data = video(10, 1, &[&[[1, 1, 2, 2]], &big]);
        let container = Container::validate(&data).unwrap();
        let clock = ManualClock::new(0);
        let mut player = player(&container, PlayerConfig::reference(), &clock, 0);

        // Through the pacing of frame 0
        for _ in 0..4 {
            player.step().unwrap();
        }
        let report = player.last_report().unwrap();
        assert_eq!(report.prefetched, QUEUE_CAPACITY);
        assert_eq!(report.slept_ms, 100);

        player.run().unwrap();
        let report = player.last_report().unwrap();
        assert_eq!(report.queued, QUEUE_CAPACITY);
        assert_eq!(report.live, 8);
    }

    /// Plays four 30-rectangle frames through an 8-slot queue on a clock
    /// that moves 1 ms per reading, so prefetch runs into its deadline
    fn play_on_ticking_clock(refresh_rate: u8) -> (Vec<FrameReport>, usize) {
        let frame: [[u8; 4]; 30] =
            core::array::from_fn(|i| [i as u8, i as u8, i as u8 + 1, i as u8 + 1]);
        let data = video(refresh_rate, 1, &[&frame, &frame, &frame, &frame]);
        let container = Container::validate(&data).unwrap();
        let clock = ManualClock::ticking(0, 1);
        let mut player: Player<'_, RecordingDisplay<'_>, _, _, 8> = Player::new(
            &container,
            PlayerConfig::reference(),
            RecordingDisplay::new(),
            &clock,
            RecordingDelay::new(&clock),
        )
        .unwrap();

        let mut reports = Vec::new();
        loop {
            let before = player.phase();
            let phase = player.step().unwrap();
            if before == Phase::IdleOrPrime {
                reports.push(player.last_report().unwrap());
            }
            if phase.is_terminal() {
                break;
            }
        }
        (reports, player.display().ink_fills().len())
    }

    #[test]
    fn test_deadline_cut_prefetch_resumes_at_rewound_cursor() {
        for fps in [10, 30, 63] {
            let (reports, ink_fills) = play_on_ticking_clock(fps);

            assert_eq!(reports.len(), 4, "{} fps", fps);
            for report in &reports {
                assert_eq!(report.queued + report.live, 30, "{} fps: {:?}", fps, report);
            }
            // Two borders plus every rectangle, each drawn once
            assert_eq!(ink_fills, 4 * (2 + 30), "{} fps", fps);
        }
    }

    #[test]
    fn test_short_frame_budget_cuts_prefetch_early() {
        let (fast, _) = play_on_ticking_clock(63);
        assert!(fast[..3].iter().all(|r| r.prefetched > 0 && r.prefetched < 8));
        assert!(fast[1..].iter().all(|r| r.queued < 8));

        let (slow, _) = play_on_ticking_clock(10);
        assert!(slow[..3].iter().all(|r| r.prefetched == 8));
    }

    #[test]
    fn test_late_frame_is_shown_without_sleeping() {
        // 40 ms per fill against a 100 ms budget
        let frame = [[1, 1, 2, 2]];
        let data = video(10, 1, &[&frame, &frame]);
        let container = Container::validate(&data).unwrap();
        let clock = ManualClock::new(0);
        let mut player = player(&container, PlayerConfig::synchronous(), &clock, 40);

        let summary = player.run().unwrap();

        assert_eq!(summary, PlaybackSummary { frames: 2, late_frames: 2 });
        let report = player.last_report().unwrap();
        assert_eq!(report.elapsed_ms, 160);
        assert_eq!(report.slack_ms, -60);
        assert_eq!(report.slept_ms, 0);

        let (display, _, delay) = player.into_parts();
        assert!(delay.sleeps.is_empty());
        assert_eq!(display.flushes(), 2);
    }

    #[test]
    fn test_empty_video_plays_no_frames() {
        let data = [b'8', b'4', b'V', b'I', b'D', 12, 1, 1, 0xFE];
        let container = Container::validate(&data).unwrap();
        let clock = ManualClock::new(0);
        let mut player = player(&container, PlayerConfig::reference(), &clock, 0);

        assert_eq!(player.step().unwrap(), Phase::Done);
        assert_eq!(player.run().unwrap(), PlaybackSummary::default());
        assert!(player.display().calls.is_empty());
    }

    #[test]
    fn test_missing_first_frame_start() {
        let data = [b'8', b'4', b'V', b'I', b'D', 12, 1, 1, 0x05, 0xFE];
        let container = Container::validate(&data).unwrap();
        let clock = ManualClock::new(0);
        let mut player = player(&container, PlayerConfig::reference(), &clock, 0);

        assert_eq!(
            player.run(),
            Err(PlaybackError::MalformedFrame { offset: 8 })
        );
        assert_eq!(player.phase(), Phase::AwaitStart);
    }

    #[test]
    fn test_sentinel_inside_rectangle_stops_playback() {
        let data = [b'8', b'4', b'V', b'I', b'D', 12, 1, 1, 0xFF, 1, 2, 0xFF, 3, 4, 5, 6, 0xFE];
        let container = Container::validate(&data).unwrap();
        let clock = ManualClock::new(0);
        let mut player = player(&container, PlayerConfig::synchronous(), &clock, 0);

        assert_eq!(
            player.run(),
            Err(PlaybackError::MalformedFrame { offset: 11 })
        );
    }

    #[test]
    fn test_display_failure_propagates() {
        let container = Container::validate(&SCENARIO).unwrap();
        let clock = ManualClock::new(0);
        let mut player: Player<'_, RecordingDisplay<'_>, _, _> = Player::new(
            &container,
            PlayerConfig::reference(),
            RecordingDisplay::broken(),
            &clock,
            RecordingDelay::new(&clock),
        )
        .unwrap();

        assert_eq!(
            player.run(),
            Err(PlaybackError::Display(DisplayError::Communication))
        );
    }

    #[test]
    fn test_error_ends_playback() {
        let data = [b'8', b'4', b'V', b'I', b'D', 12, 1, 1, 0xFF, 1, 2, 3, 4, 0xFF, 5, 6, 0xFF, 0xFE];
        let container = Container::validate(&data).unwrap();
        let clock = ManualClock::new(0);
        let mut player = player(&container, PlayerConfig::synchronous(), &clock, 0);

        let error = PlaybackError::MalformedFrame { offset: 16 };
        assert_eq!(player.run(), Err(error));
        assert_eq!(player.fault(), Some(error));
        let phase = player.phase();
        let cursor = player.state().cursor();
        let calls = player.display().calls.len();

        assert_eq!(player.step(), Err(error));
        assert_eq!(player.run(), Err(error));
        assert_eq!(player.phase(), phase);
        assert_eq!(player.state().cursor(), cursor);
        assert_eq!(player.display().calls.len(), calls);
        assert_eq!(player.summary().frames, 1);
    }

    #[test]
    fn test_rejects_invalid_config() {
        let container = Container::validate(&SCENARIO).unwrap();
        let clock = ManualClock::new(0);
        let config = PlayerConfig {
            canvas_size: 0,
            ..PlayerConfig::reference()
        };

        let result: Result<Player<'_, RecordingDisplay<'_>, _, _>, _> = Player::new(
            &container,
            config,
            RecordingDisplay::new(),
            &clock,
            RecordingDelay::new(&clock),
        );

        assert!(matches!(result, Err(PlaybackError::InvalidConfig(_))));
    }
}
