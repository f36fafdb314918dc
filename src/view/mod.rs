//! # View Module
//!
//! The poll loop that drives the mapping flow, and the view model it hands
//! to a display.
//!
//! ## Tick
//!
//! Every poll interval [`MappingView::tick`]:
//!
//! 1. Samples the [`InputSource`].
//! 2. Resets the state if the device identity changed (new pad, reconnect,
//!    or disconnect).
//! 3. While a device is present and the mapping is not done, feeds the first
//!    active control into the state machine:
//!    - waiting for neutral: a neutral reading clears the gate;
//!    - otherwise: an active control is recorded for the current step.
//! 4. Renders the view model if the state is dirty.
//!
//! User actions arrive on a channel between ticks. Both are handled on the
//! same task, so the state needs no locking.

pub mod terminal;

use std::path::PathBuf;
use tokio::sync::mpsc;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::device::{DeviceIdentity, InputSource};
use crate::error::Result;
use crate::mapping::control::DEFAULT_AXIS_THRESHOLD;
use crate::mapping::export::MappingExport;
use crate::mapping::state::{MappingState, StepMapping};

/// Connection text shown while no device is present.
pub const NO_CONNECTION: &str = "No connection.";

/// Instruction shown while waiting for the device to return to neutral.
pub const RELEASE_INSTRUCTION: &str = "Release all buttons and center all axes";

/// Instruction shown once every step is finished.
pub const DONE_MESSAGE: &str =
    "All done. Please copy the mapping below and send it along with your device name.";

/// Default poll period.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Actions the user can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserAction {
    /// Leave the current step unassigned.
    Skip,
    /// Drop all results and start over.
    Reset,
    /// Return to the previous step.
    Back,
    /// Finish now, leaving remaining steps unassigned.
    Done,
    /// Stop the poll loop.
    Quit,
}

/// Which actions are currently allowed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActionAvailability {
    pub reset: bool,
    pub back: bool,
    pub skip: bool,
    pub done: bool,
}

impl ActionAvailability {
    /// Availability for `state`; everything is disabled without a device.
    ///
    /// Reset and back are disabled on the first step, skip and done once finished.
    #[must_use]
    pub fn for_state(connected: bool, state: &MappingState) -> Self {
        if !connected {
            return Self::default();
        }
        let at_start = state.current_step() == 0;
        let done = state.is_done();
        Self {
            reset: !at_start,
            back: !at_start,
            skip: !done,
            done: !done,
        }
    }

    /// Whether `action` may be applied. `Quit` is always allowed.
    #[must_use]
    pub fn allows(&self, action: UserAction) -> bool {
        match action {
            UserAction::Skip => self.skip,
            UserAction::Reset => self.reset,
            UserAction::Back => self.back,
            UserAction::Done => self.done,
            UserAction::Quit => true,
        }
    }
}

/// Everything a display needs to draw one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewModel {
    /// Device id, or [`NO_CONNECTION`].
    pub connection: String,
    /// What the user should do next; empty with no device.
    pub instruction: String,
    /// One row per step; empty with no device.
    pub rows: Vec<StepMapping>,
    /// Enabled actions.
    pub actions: ActionAvailability,
    /// The finished mapping, present once done.
    pub export: Option<MappingExport>,
}

impl ViewModel {
    /// Projects the state for the given device.
    ///
    /// # Errors
    ///
    /// Never fails in practice: the current step name is only read while
    /// the mapping is in progress.
    pub fn build(device: Option<&DeviceIdentity>, state: &MappingState) -> Result<Self> {
        let Some(device) = device else {
            return Ok(Self {
                connection: NO_CONNECTION.to_string(),
                instruction: String::new(),
                rows: Vec::new(),
                actions: ActionAvailability::default(),
                export: None,
            });
        };

        let done = state.is_done();

        let instruction = if done {
            DONE_MESSAGE.to_string()
        } else if state.wait_to_clear() {
            RELEASE_INSTRUCTION.to_string()
        } else {
            format!("Press {}", state.current_step_name()?)
        };

        Ok(Self {
            connection: device.id.clone(),
            instruction,
            rows: state.mappings().to_vec(),
            actions: ActionAvailability::for_state(true, state),
            export: done.then(|| MappingExport::from_state(device.id.clone(), state)),
        })
    }
}

/// Something that can draw a [`ViewModel`].
#[cfg_attr(test, mockall::automock)]
pub trait MappingDisplay {
    /// Draws one frame.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the output cannot be written.
    fn render(&mut self, view: &ViewModel) -> Result<()>;
}

/// Tunables for [`MappingView`].
#[derive(Debug, Clone)]
pub struct ViewOptions {
    /// Time between polls.
    pub poll_interval: Duration,
    /// Axis deflection that counts as active.
    pub threshold: f32,
    /// Where to save the export when the mapping finishes; `None` disables saving.
    pub export_dir: Option<PathBuf>,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            threshold: DEFAULT_AXIS_THRESHOLD,
            export_dir: None,
        }
    }
}

/// Owns the mapping state and drives it from device polls and user actions.
pub struct MappingView<S, D> {
    source: S,
    display: D,
    state: MappingState,
    device: Option<DeviceIdentity>,
    options: ViewOptions,
    export_saved: bool,
}

impl<S: InputSource, D: MappingDisplay> MappingView<S, D> {
    /// Creates the view. Nothing is polled or drawn until [`tick`](Self::tick) or [`run`](Self::run).
    pub fn new(source: S, display: D, state: MappingState, options: ViewOptions) -> Self {
        Self {
            source,
            display,
            state,
            device: None,
            options,
            export_saved: false,
        }
    }

    /// The mapping state.
    pub fn state(&self) -> &MappingState {
        &self.state
    }

    /// Identity of the device currently tracked.
    pub fn device(&self) -> Option<&DeviceIdentity> {
        self.device.as_ref()
    }

    /// The display.
    pub fn display(&self) -> &D {
        &self.display
    }

    /// Builds the view model for the current state.
    ///
    /// # Errors
    ///
    /// See [`ViewModel::build`].
    pub fn view_model(&self) -> Result<ViewModel> {
        ViewModel::build(self.device.as_ref(), &self.state)
    }

    /// Actions allowed right now.
    pub fn availability(&self) -> ActionAvailability {
        ActionAvailability::for_state(self.device.is_some(), &self.state)
    }

    /// Runs one poll cycle.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` only if the state machine is driven past its
    /// end, which the done check rules out. Display I/O errors are
    /// propagated; export save failures are only logged.
    pub fn tick(&mut self) -> Result<()> {
        let snapshot = self.source.poll();
        let identity = snapshot.as_ref().map(|s| &s.identity);

        if identity != self.device.as_ref() {
            match identity {
                Some(id) => info!("Gamepad connected: {} (session {})", id.id, id.session),
                None => info!("Gamepad disconnected"),
            }
            self.device = identity.cloned();
            self.state.reset();
            self.export_saved = false;
        }

        if let Some(snapshot) = &snapshot {
            if !self.state.is_done() {
                if self.state.wait_to_clear() {
                    if snapshot.is_neutral(self.options.threshold) {
                        debug!("Gamepad is neutral");
                        self.state.gamepad_cleared();
                    }
                } else if let Some(control) = snapshot.active_control(self.options.threshold) {
                    self.state.set_current_step_mapping(control)?;
                }
            }
        }

        self.refresh()
    }

    /// Applies a user action if it is currently allowed.
    ///
    /// # Returns
    ///
    /// `true` if the action changed the state.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` only if availability and state disagree.
    pub fn apply(&mut self, action: UserAction) -> Result<bool> {
        if !self.availability().allows(action) {
            debug!("Ignoring {:?}: not available", action);
            return Ok(false);
        }

        debug!("Applying {:?} at step {}", action, self.state.current_step());
        match action {
            UserAction::Skip => self.state.skip()?,
            UserAction::Reset => {
                self.state.reset();
                self.export_saved = false;
            }
            UserAction::Back => {
                self.state.back();
                self.export_saved = false;
            }
            UserAction::Done => self.state.done(),
            UserAction::Quit => return Ok(false),
        }
        Ok(true)
    }

    /// Redraws if dirty and saves the export on the first frame after finishing.
    ///
    /// A failed save is logged and retried on the next finish; the export
    /// is still on screen.
    fn refresh(&mut self) -> Result<()> {
        if !self.state.take_dirty() {
            return Ok(());
        }

        let view = self.view_model()?;
        self.display.render(&view)?;

        if let (Some(export), Some(dir)) = (&view.export, &self.options.export_dir) {
            if !self.export_saved {
                match export.save(dir) {
                    Ok(_) => self.export_saved = true,
                    Err(e) => warn!("Failed to save mapping to {}: {}", dir.display(), e),
                }
            }
        }

        Ok(())
    }

    /// Polls on a fixed interval and applies actions until `Quit` or the channel closes.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`tick`](Self::tick) and [`apply`](Self::apply).
    pub async fn run(mut self, mut actions: mpsc::Receiver<UserAction>) -> Result<Self> {
        let mut ticker = interval(self.options.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            "Polling every {}ms (threshold {})",
            self.options.poll_interval.as_millis(),
            self.options.threshold
        );

        // First frame shows the disconnected state until a pad is seen
        self.refresh()?;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.tick()?;
                }

                action = actions.recv() => match action {
                    Some(UserAction::Quit) | None => {
                        info!("Stopping at step {} of {}", self.state.current_step(), self.state.len());
                        break;
                    }
                    Some(action) => {
                        if self.apply(action)? {
                            self.refresh()?;
                        }
                    }
                },
            }
        }

        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{DeviceSnapshot, MockInputSource};
    use crate::mapping::control::ActiveControl;
    use crate::mapping::step::MappingStep;
    use std::collections::VecDeque;

    /// Input source replaying a fixed list of readings.
    struct ScriptedSource {
        readings: VecDeque<Option<DeviceSnapshot>>,
    }

    impl ScriptedSource {
        fn new(readings: Vec<Option<DeviceSnapshot>>) -> Self {
            Self {
                readings: readings.into(),
            }
        }
    }

    impl InputSource for ScriptedSource {
        fn poll(&mut self) -> Option<DeviceSnapshot> {
            self.readings.pop_front().flatten()
        }
    }

    /// Display that keeps every frame.
    #[derive(Default)]
    struct RecordingDisplay {
        frames: Vec<ViewModel>,
    }

    impl MappingDisplay for RecordingDisplay {
        fn render(&mut self, view: &ViewModel) -> Result<()> {
            self.frames.push(view.clone());
            Ok(())
        }
    }

    fn identity(session: u64) -> DeviceIdentity {
        DeviceIdentity {
            id: "Test Pad (Vendor: 1234 Product: 5678)".to_string(),
            session,
        }
    }

    fn reading(session: u64, buttons: &[usize], axes: &[f32]) -> Option<DeviceSnapshot> {
        let mut pressed = vec![false; 8];
        for &b in buttons {
            pressed[b] = true;
        }
        Some(DeviceSnapshot {
            identity: identity(session),
            buttons: pressed,
            axes: axes.to_vec(),
        })
    }

    fn neutral(session: u64) -> Option<DeviceSnapshot> {
        reading(session, &[], &[0.0, 0.0])
    }

    fn two_steps() -> MappingState {
        MappingState::new(vec![
            MappingStep::button(0, "A"),
            MappingStep::axis(0, "Stick"),
        ])
    }

    fn view_with(
        readings: Vec<Option<DeviceSnapshot>>,
    ) -> MappingView<ScriptedSource, RecordingDisplay> {
        MappingView::new(
            ScriptedSource::new(readings),
            RecordingDisplay::default(),
            two_steps(),
            ViewOptions::default(),
        )
    }

    fn tick_n<S: InputSource, D: MappingDisplay>(view: &mut MappingView<S, D>, n: usize) {
        for _ in 0..n {
            view.tick().unwrap();
        }
    }

    // ==================== Poll Loop Tests ====================

    #[test]
    fn test_full_flow() {
        let mut view = view_with(vec![
            neutral(1),                   // connect + clear gate
            reading(1, &[2], &[0.0, 0.0]), // assign A -> button 2
            reading(1, &[2], &[0.0, 0.0]), // still held: waiting
            neutral(1),                   // cleared
            reading(1, &[], &[0.0, 0.9]),  // assign Stick -> axis 1+
        ]);

        view.tick().unwrap();
        assert!(view.device().is_some());
        assert!(!view.state().wait_to_clear());

        view.tick().unwrap();
        assert_eq!(view.state().current_step(), 1);
        assert!(view.state().wait_to_clear());

        view.tick().unwrap();
        assert_eq!(view.state().current_step(), 1, "Held button must not map the next step");
        assert!(view.state().wait_to_clear());

        tick_n(&mut view, 2);
        assert!(view.state().is_done());
        assert_eq!(
            view.state().mappings()[1].maps_to,
            Some(ActiveControl::axis_positive(1))
        );

        let last = view.display().frames.last().unwrap();
        assert_eq!(last.instruction, DONE_MESSAGE);
        let export = last.export.as_ref().unwrap();
        assert_eq!(export.device_id, identity(1).id);
        assert_eq!(export.mappings[0].maps_to, Some(ActiveControl::Button(2)));
    }

    #[test]
    fn test_connect_waits_for_neutral() {
        // Button held while plugging in must not be taken as an answer
        let mut view = view_with(vec![reading(1, &[0], &[]), reading(1, &[0], &[])]);

        tick_n(&mut view, 2);
        assert_eq!(view.state().current_step(), 0);
        assert!(view.state().wait_to_clear());
        assert_eq!(
            view.display().frames.last().unwrap().instruction,
            RELEASE_INSTRUCTION
        );
    }

    #[test]
    fn test_identity_change_resets_before_detection() {
        let mut view = view_with(vec![
            neutral(1),
            reading(1, &[1], &[]),
            // Same hardware, new session, button still held
            reading(2, &[1], &[]),
        ]);

        tick_n(&mut view, 2);
        assert_eq!(view.state().current_step(), 1);

        view.tick().unwrap();
        assert_eq!(view.state().current_step(), 0, "Reconnect must reset progress");
        assert!(view.state().wait_to_clear(), "Reset happens before detection");
        assert!(view.state().mappings().iter().all(|m| m.maps_to.is_none()));
        assert_eq!(view.device(), Some(&identity(2)));
    }

    #[test]
    fn test_disconnect_resets_and_shows_no_connection() {
        let mut view = view_with(vec![neutral(1), reading(1, &[3], &[]), None]);

        tick_n(&mut view, 3);
        assert!(view.device().is_none());
        assert_eq!(view.state().current_step(), 0);

        let last = view.display().frames.last().unwrap();
        assert_eq!(last.connection, NO_CONNECTION);
        assert_eq!(last.instruction, "");
        assert!(last.rows.is_empty());
        assert_eq!(last.actions, ActionAvailability::default());
    }

    #[test]
    fn test_no_render_when_not_dirty() {
        let mut display = MockMappingDisplay::new();
        // Connect and clear happen in one tick, then nothing changes
        display.expect_render().times(1).returning(|_| Ok(()));

        let mut source = MockInputSource::new();
        source.expect_poll().returning(|| neutral(1));

        let mut view = MappingView::new(source, display, two_steps(), ViewOptions::default());
        view.state.take_dirty();

        tick_n(&mut view, 5);
    }

    #[test]
    fn test_nothing_detected_without_device() {
        let mut source = MockInputSource::new();
        source.expect_poll().times(3).returning(|| None);

        let mut display = MockMappingDisplay::new();
        display.expect_render().times(1).returning(|_| Ok(()));

        let mut view = MappingView::new(source, display, two_steps(), ViewOptions::default());
        tick_n(&mut view, 3);
        assert_eq!(view.state().current_step(), 0);
    }

    #[test]
    fn test_done_state_ignores_input() {
        let mut view = view_with(vec![neutral(1), reading(1, &[4], &[])]);
        view.tick().unwrap();
        view.apply(UserAction::Done).unwrap();

        // Must not call into the finished state machine
        view.tick().unwrap();
        assert!(view.state().is_done());
        assert!(view.state().mappings().iter().all(|m| m.maps_to.is_none()));
    }

    // ==================== Action Tests ====================

    #[test]
    fn test_actions_disabled_without_device() {
        let mut view = view_with(vec![]);
        for action in [UserAction::Skip, UserAction::Reset, UserAction::Back, UserAction::Done] {
            assert!(!view.apply(action).unwrap());
        }
        assert_eq!(view.state().current_step(), 0);
    }

    #[test]
    fn test_action_availability_rules() {
        let mut view = view_with(vec![neutral(1)]);
        view.tick().unwrap();

        let at_start = view.availability();
        assert!(!at_start.reset);
        assert!(!at_start.back);
        assert!(at_start.skip);
        assert!(at_start.done);

        assert!(view.apply(UserAction::Skip).unwrap());
        let mid = view.availability();
        assert!(mid.reset && mid.back && mid.skip && mid.done);

        assert!(view.apply(UserAction::Done).unwrap());
        let done = view.availability();
        assert!(done.reset && done.back);
        assert!(!done.skip && !done.done);

        // Skip after done is ignored rather than hitting the state machine
        assert!(!view.apply(UserAction::Skip).unwrap());
        assert!(view.state().is_done());
    }

    #[test]
    fn test_back_and_reset_actions() {
        let mut view = view_with(vec![neutral(1)]);
        view.tick().unwrap();

        view.apply(UserAction::Skip).unwrap();
        view.apply(UserAction::Skip).unwrap();
        assert!(view.state().is_done());

        view.apply(UserAction::Back).unwrap();
        assert_eq!(view.state().current_step(), 1);

        view.apply(UserAction::Reset).unwrap();
        assert_eq!(view.state().current_step(), 0);
        assert!(view.state().wait_to_clear());
    }

    #[test]
    fn test_view_model_press_instruction() {
        let mut state = two_steps();
        state.gamepad_cleared();

        let view = ViewModel::build(Some(&identity(1)), &state).unwrap();
        assert_eq!(view.instruction, "Press A");
        assert_eq!(view.connection, identity(1).id);
        assert_eq!(view.rows.len(), 2);
        assert_eq!(view.rows[0].to_string(), "A:");
        assert!(view.export.is_none());
    }

    // ==================== Export Saving Tests ====================

    #[test]
    fn test_export_saved_once_on_finish() {
        let dir = tempfile::tempdir().unwrap();
        let options = ViewOptions {
            export_dir: Some(dir.path().to_path_buf()),
            ..ViewOptions::default()
        };

        let mut view = MappingView::new(
            ScriptedSource::new(vec![neutral(1), neutral(1), neutral(1)]),
            RecordingDisplay::default(),
            two_steps(),
            options,
        );

        view.tick().unwrap();
        view.apply(UserAction::Done).unwrap();
        tick_n(&mut view, 2);

        let files: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(files.len(), 1, "Export should be written exactly once");
    }

    #[test]
    fn test_finishing_again_writes_new_export() {
        let dir = tempfile::tempdir().unwrap();
        let options = ViewOptions {
            export_dir: Some(dir.path().to_path_buf()),
            ..ViewOptions::default()
        };

        let mut view = MappingView::new(
            ScriptedSource::new(vec![neutral(1), neutral(1), neutral(1)]),
            RecordingDisplay::default(),
            two_steps(),
            options,
        );

        view.tick().unwrap();
        assert!(view.apply(UserAction::Done).unwrap());
        view.tick().unwrap();

        // Back and finish again within the same second
        assert!(view.apply(UserAction::Back).unwrap());
        assert!(view.apply(UserAction::Done).unwrap());
        view.tick().unwrap();

        let files: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(files.len(), 2, "Second finish must not overwrite the first export");
    }

    #[test]
    fn test_export_failure_keeps_polling() {
        // A regular file where the export directory should be
        let blocker = tempfile::NamedTempFile::new().unwrap();
        let options = ViewOptions {
            export_dir: Some(blocker.path().to_path_buf()),
            ..ViewOptions::default()
        };

        let mut view = MappingView::new(
            ScriptedSource::new(vec![neutral(1), neutral(1), neutral(1)]),
            RecordingDisplay::default(),
            two_steps(),
            options,
        );

        view.tick().unwrap();
        view.apply(UserAction::Done).unwrap();
        assert!(view.tick().is_ok(), "Save failure must not end the poll loop");
        assert!(!view.export_saved, "Failed save should be retried on the next finish");
        assert!(view.state().is_done());

        let last = view.display().frames.last().unwrap();
        assert!(last.export.is_some(), "Export is still shown");

        view.tick().unwrap();
        assert_eq!(view.device(), Some(&identity(1)));
    }

    // ==================== Run Loop Tests ====================

    #[tokio::test]
    async fn test_run_stops_on_quit() {
        let (tx, rx) = mpsc::channel(4);
        let view = view_with(vec![neutral(1)]);

        tx.send(UserAction::Quit).await.unwrap();
        let view = view.run(rx).await.unwrap();

        // Initial frame is always drawn
        assert!(!view.display().frames.is_empty());
    }

    #[test]
    fn test_run_stops_when_channel_closes() {
        let (tx, rx) = mpsc::channel(4);
        drop(tx);

        let view = view_with(vec![]);
        let view = tokio_test::block_on(view.run(rx)).unwrap();
        assert_eq!(view.display().frames[0].connection, NO_CONNECTION);
    }
}
