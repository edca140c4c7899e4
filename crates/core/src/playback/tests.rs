use std::time::Duration;

use super::*;
use crate::SortSoundError;

#[derive(Debug, Default)]
struct RecordingRender {
    frames: Vec<Frame>,
    fail: bool,
}

impl RenderSink for RecordingRender {
    fn render(&mut self, frame: &Frame) -> Result<()> {
        if self.fail {
            return Err(SortSoundError::sink("no canvas"));
        }
        self.frames.push(frame.clone());
        Ok(())
    }
}

#[derive(Debug, Default)]
struct RecordingAudio {
    tones: Vec<f32>,
    fail: bool,
}

impl AudioSink for RecordingAudio {
    fn play(&mut self, value: f32, duration: Duration) -> Result<()> {
        assert_eq!(duration, Duration::from_millis(100));
        if self.fail {
            return Err(SortSoundError::sink("audio device unavailable"));
        }
        self.tones.push(value);
        Ok(())
    }
}

type Controller = PlaybackController<RecordingRender, RecordingAudio>;

fn test_config(algorithm: AlgorithmId) -> AppConfig {
    let mut config = AppConfig::default();
    config.dataset.bar_count = 10;
    config.dataset.seed = Some(42);
    config.playback.algorithm = algorithm;
    config
}

fn controller(algorithm: AlgorithmId) -> Controller {
    PlaybackController::new(
        &test_config(algorithm),
        RecordingRender::default(),
        RecordingAudio::default(),
    )
}

fn ms(value: u64) -> Duration {
    Duration::from_millis(value)
}

/// Polls at every deadline until nothing is scheduled.
fn drive(ctrl: &mut Controller) -> usize {
    let mut polls = 0;
    while let Some(due) = ctrl.next_deadline() {
        ctrl.poll(due).unwrap();
        polls += 1;
        assert!(polls < 100_000, "controller never settled");
    }
    polls
}

fn sorted_seed(ctrl: &Controller) -> Vec<f32> {
    Dataset::seed_values(ctrl.bar_count(), ctrl.dataset().height())
}

#[test]
fn draws_the_initial_frame_in_idle() {
    let ctrl = controller(AlgorithmId::Bubble);
    assert_eq!(ctrl.phase(), Phase::Idle);
    assert_eq!(ctrl.render_sink().frames.len(), 1);
    assert_eq!(ctrl.render_sink().frames[0].values.len(), 10);
    assert_eq!(ctrl.next_deadline(), None);
}

#[test]
fn completed_runs_leave_the_bars_sorted() {
    for id in AlgorithmId::ALL {
        let mut ctrl = controller(id);
        ctrl.start();
        assert_eq!(ctrl.phase(), Phase::Running);
        drive(&mut ctrl);

        assert_eq!(ctrl.phase(), Phase::Completed, "{id}");
        assert!(ctrl.state().completed);
        assert!(ctrl.dataset().is_sorted());
        assert_eq!(ctrl.dataset().snapshot(), sorted_seed(&ctrl));
        assert_eq!(ctrl.state().highlight_primary, None);
        assert_eq!(ctrl.state().highlight_secondary, None);
        assert!(!ctrl.is_finale_active());
    }
}

#[test]
fn sorted_playback_sweeps_every_bar_once() {
    let mut ctrl = controller(AlgorithmId::Quick);
    ctrl.start();
    drive(&mut ctrl);

    let values = ctrl.dataset().snapshot();
    let tones = &ctrl.audio_sink().tones;
    assert_eq!(&tones[tones.len() - values.len()..], values.as_slice());

    let frames = &ctrl.render_sink().frames;
    let last = frames.last().unwrap();
    assert_eq!(last.primary, None);
    assert_eq!(last.done_up_to, None);

    let sweep: Vec<_> = frames[frames.len() - 1 - values.len()..frames.len() - 1]
        .iter()
        .map(|frame| (frame.primary, frame.secondary, frame.done_up_to))
        .collect();
    let expected: Vec<_> = (0..values.len())
        .map(|index| (Some(index), None, Some(index)))
        .collect();
    assert_eq!(sweep, expected);
}

#[test]
fn sorted_playback_ignores_pause() {
    let mut ctrl = controller(AlgorithmId::Bubble);
    ctrl.start();
    while !ctrl.is_finale_active() {
        let due = ctrl.next_deadline().unwrap();
        ctrl.poll(due).unwrap();
    }
    ctrl.toggle_pause();
    assert!(!ctrl.state().paused);
    drive(&mut ctrl);
    assert!(!ctrl.is_finale_active());
}

#[test]
fn swap_events_sound_the_moved_value() {
    let mut config = test_config(AlgorithmId::Bubble);
    config.playback.sound_compares = false;
    config.audio.tone_ms = 100;
    let mut ctrl =
        PlaybackController::new(&config, RecordingRender::default(), RecordingAudio::default());
    let expected = {
        let mut shadow = ctrl.dataset().clone();
        let mut steps = AlgorithmId::Bubble.steps(shadow.len(), CancelToken::new());
        steps.drain(&mut shadow).unwrap()
    };

    ctrl.start();
    drive(&mut ctrl);
    assert_eq!(ctrl.audio_sink().tones.len(), expected.swaps + ctrl.bar_count());
}

/// Polls until the first tone sounds and returns the frame drawn with it.
fn first_swap_frame(algorithm: AlgorithmId) -> (Vec<f32>, Frame, f32) {
    let mut config = test_config(algorithm);
    config.playback.sound_compares = false;
    let mut ctrl =
        PlaybackController::new(&config, RecordingRender::default(), RecordingAudio::default());
    let before = ctrl.dataset().snapshot();

    ctrl.start();
    while ctrl.audio_sink().tones.is_empty() {
        let due = ctrl.next_deadline().unwrap();
        ctrl.poll(due).unwrap();
    }
    let frame = ctrl.render_sink().frames.last().unwrap().clone();
    assert_eq!(ctrl.audio_sink().tones.len(), 1);
    (before, frame, ctrl.audio_sink().tones[0])
}

#[test]
fn bubble_swaps_sound_the_value_moving_right() {
    let (before, frame, tone) = first_swap_frame(AlgorithmId::Bubble);
    let (i, j) = (frame.primary.unwrap(), frame.secondary.unwrap());

    assert_eq!(j, i + 1);
    assert!(before[i] > before[j]);
    assert_eq!(tone, before[i]);
    assert_eq!(frame.values[j], before[i]);
}

#[test]
fn quick_swaps_sound_the_value_landing_left() {
    let (_, frame, tone) = first_swap_frame(AlgorithmId::Quick);
    let i = frame.primary.unwrap();
    assert_eq!(tone, frame.values[i]);
}

#[test]
fn pause_blocks_steps_until_resumed() {
    let mut ctrl = controller(AlgorithmId::Bubble);
    ctrl.start();
    ctrl.poll(Duration::ZERO).unwrap();
    assert_eq!(ctrl.render_sink().frames.len(), 2);

    ctrl.toggle_pause();
    assert_eq!(ctrl.phase(), Phase::Paused);
    assert_eq!(ctrl.next_deadline(), None);
    ctrl.poll(Duration::from_secs(10)).unwrap();
    assert_eq!(ctrl.render_sink().frames.len(), 2);

    ctrl.toggle_pause();
    assert_eq!(ctrl.phase(), Phase::Running);
    assert_eq!(ctrl.next_deadline(), Some(Duration::from_secs(10) + ms(100)));
    ctrl.poll(Duration::from_secs(10) + ms(100)).unwrap();
    assert_eq!(ctrl.render_sink().frames.len(), 3);
}

#[test]
fn pause_is_ignored_when_idle() {
    let mut ctrl = controller(AlgorithmId::Bubble);
    ctrl.toggle_pause();
    assert!(!ctrl.state().paused);
    assert_eq!(ctrl.phase(), Phase::Idle);
}

#[test]
fn steps_wait_for_the_configured_delay() {
    let mut ctrl = controller(AlgorithmId::Bubble);
    ctrl.start();
    ctrl.poll(Duration::ZERO).unwrap();
    ctrl.poll(ms(50)).unwrap();
    assert_eq!(ctrl.render_sink().frames.len(), 2);
    ctrl.poll(ms(100)).unwrap();
    assert_eq!(ctrl.render_sink().frames.len(), 3);
}

#[test]
fn speed_changes_apply_from_the_next_step() {
    let mut ctrl = controller(AlgorithmId::Bubble);
    ctrl.start();
    ctrl.poll(Duration::ZERO).unwrap();
    assert_eq!(ctrl.next_deadline(), Some(ms(100)));

    ctrl.set_speed(100);
    assert_eq!(ctrl.state().speed_delay_ms, 1);
    assert_eq!(ctrl.next_deadline(), Some(ms(100)));
    ctrl.poll(ms(100)).unwrap();
    assert_eq!(ctrl.next_deadline(), Some(ms(101)));

    ctrl.set_speed(0);
    assert_eq!(ctrl.state().speed_delay_ms, 100);
}

#[test]
fn start_is_ignored_while_running() {
    let mut ctrl = controller(AlgorithmId::Bubble);
    ctrl.start();
    ctrl.poll(Duration::ZERO).unwrap();
    let highlights = (
        ctrl.state().highlight_primary,
        ctrl.state().highlight_secondary,
    );
    ctrl.start();
    assert_eq!(ctrl.phase(), Phase::Running);
    assert_eq!(ctrl.next_deadline(), Some(ms(100)));
    assert_eq!(
        (
            ctrl.state().highlight_primary,
            ctrl.state().highlight_secondary
        ),
        highlights
    );
}

#[test]
fn reset_twice_deals_fresh_bars() {
    let mut ctrl = controller(AlgorithmId::Bubble);
    ctrl.start();
    ctrl.poll(Duration::ZERO).unwrap();

    for _ in 0..2 {
        ctrl.reset();
        assert_eq!(ctrl.phase(), Phase::Idle);
        assert_eq!(ctrl.state().highlight_primary, None);
        assert_eq!(ctrl.state().highlight_secondary, None);
        assert_eq!(ctrl.dataset().len(), 10);

        let mut values = ctrl.dataset().snapshot();
        values.sort_by(f32::total_cmp);
        assert_eq!(values, sorted_seed(&ctrl));

        let last = ctrl.render_sink().frames.last().unwrap();
        assert_eq!(last.values, ctrl.dataset().snapshot());
        assert_eq!(last.primary, None);
    }
}

#[test]
fn reset_mid_run_leaves_nothing_scheduled() {
    let mut ctrl = controller(AlgorithmId::Quick);
    ctrl.start();
    for step in 0..5 {
        ctrl.poll(ms(step * 100)).unwrap();
    }
    ctrl.reset();

    assert!(!ctrl.state().running);
    assert!(!ctrl.state().completed);
    assert_eq!(ctrl.next_deadline(), None);
    let frames = ctrl.render_sink().frames.len();
    ctrl.poll(Duration::from_secs(60)).unwrap();
    assert_eq!(ctrl.render_sink().frames.len(), frames);
}

#[test]
fn reset_stops_the_sorted_playback() {
    let mut ctrl = controller(AlgorithmId::Quick);
    ctrl.start();
    while !ctrl.is_finale_active() {
        let due = ctrl.next_deadline().unwrap();
        ctrl.poll(due).unwrap();
    }
    ctrl.reset();
    assert!(!ctrl.is_finale_active());
    assert_eq!(ctrl.phase(), Phase::Idle);
    assert_eq!(ctrl.next_deadline(), None);
}

#[test]
fn switching_algorithm_mid_run_restarts_after_settling() {
    let mut ctrl = controller(AlgorithmId::Bubble);
    ctrl.start();
    for step in 0..3 {
        ctrl.poll(ms(step * 100)).unwrap();
    }

    ctrl.select_algorithm("quick");
    assert_eq!(ctrl.phase(), Phase::Idle);
    assert!(!ctrl.state().running);
    assert!(ctrl.is_restart_pending());
    assert_eq!(ctrl.state().algorithm, AlgorithmId::Quick);
    assert_eq!(ctrl.next_deadline(), Some(ms(300)));

    ctrl.poll(ms(250)).unwrap();
    assert!(ctrl.is_restart_pending());
    ctrl.start();
    assert!(ctrl.is_restart_pending());

    ctrl.poll(ms(300)).unwrap();
    assert!(!ctrl.is_restart_pending());
    assert_eq!(ctrl.phase(), Phase::Running);

    drive(&mut ctrl);
    assert_eq!(ctrl.phase(), Phase::Completed);
    assert_eq!(ctrl.state().algorithm, AlgorithmId::Quick);
    assert!(ctrl.dataset().is_sorted());
}

#[test]
fn switching_algorithm_while_paused_also_restarts() {
    let mut ctrl = controller(AlgorithmId::Quick);
    ctrl.start();
    ctrl.poll(Duration::ZERO).unwrap();
    ctrl.toggle_pause();
    ctrl.select(AlgorithmId::Bubble);

    assert!(!ctrl.state().paused);
    assert!(ctrl.is_restart_pending());
    drive(&mut ctrl);
    assert!(ctrl.dataset().is_sorted());
    assert_eq!(ctrl.state().algorithm, AlgorithmId::Bubble);
}

#[test]
fn reset_drops_a_pending_restart() {
    let mut ctrl = controller(AlgorithmId::Bubble);
    ctrl.start();
    ctrl.poll(Duration::ZERO).unwrap();
    ctrl.select(AlgorithmId::Quick);
    ctrl.reset();

    assert!(!ctrl.is_restart_pending());
    ctrl.poll(Duration::from_secs(1)).unwrap();
    assert_eq!(ctrl.phase(), Phase::Idle);
    assert_eq!(ctrl.state().algorithm, AlgorithmId::Quick);
}

#[test]
fn selecting_while_idle_only_switches() {
    let mut ctrl = controller(AlgorithmId::Bubble);
    ctrl.select_algorithm("quick");
    assert_eq!(ctrl.state().algorithm, AlgorithmId::Quick);
    assert!(!ctrl.is_restart_pending());
    assert_eq!(ctrl.phase(), Phase::Idle);
}

#[test]
fn unknown_algorithms_are_ignored() {
    let mut ctrl = controller(AlgorithmId::Quick);
    ctrl.start();
    ctrl.poll(Duration::ZERO).unwrap();
    ctrl.select_algorithm("bogosort");

    assert_eq!(ctrl.state().algorithm, AlgorithmId::Quick);
    assert_eq!(ctrl.phase(), Phase::Running);
    assert!(!ctrl.is_restart_pending());
}

#[test]
fn bar_count_is_clamped_and_resets() {
    let mut ctrl = controller(AlgorithmId::Bubble);
    ctrl.start();
    ctrl.poll(Duration::ZERO).unwrap();

    ctrl.set_bar_count(3);
    assert_eq!(ctrl.bar_count(), 10);
    assert_eq!(ctrl.phase(), Phase::Idle);

    ctrl.set_bar_count(5_000);
    assert_eq!(ctrl.dataset().len(), 2_000);

    ctrl.set_bar_count(250);
    assert_eq!(ctrl.dataset().len(), 250);
    assert!(ctrl.dataset().value(249).is_ok());
    assert!(ctrl.dataset().value(250).is_err());
}

#[test]
fn sink_failures_do_not_stop_the_run() {
    let render = RecordingRender {
        fail: true,
        ..RecordingRender::default()
    };
    let audio = RecordingAudio {
        fail: true,
        ..RecordingAudio::default()
    };
    let mut ctrl = PlaybackController::new(&test_config(AlgorithmId::Quick), render, audio);
    ctrl.start();
    drive(&mut ctrl);

    assert_eq!(ctrl.phase(), Phase::Completed);
    assert!(ctrl.dataset().is_sorted());
    assert!(ctrl.audio_sink().tones.is_empty());
}

#[test]
fn disabled_audio_stays_silent() {
    let mut config = test_config(AlgorithmId::Bubble);
    config.audio.enabled = false;
    let mut ctrl =
        PlaybackController::new(&config, RecordingRender::default(), RecordingAudio::default());
    ctrl.start();
    drive(&mut ctrl);
    assert!(ctrl.audio_sink().tones.is_empty());
}

#[test]
fn frames_carry_step_highlights() {
    let mut ctrl = controller(AlgorithmId::Bubble);
    ctrl.start();
    ctrl.poll(Duration::ZERO).unwrap();

    let frame = ctrl.render_sink().frames.last().unwrap();
    assert_eq!(frame.primary, Some(0));
    assert_eq!(frame.secondary, Some(1));
    assert_eq!(ctrl.frame(), *frame);
}
