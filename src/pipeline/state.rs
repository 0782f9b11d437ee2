//! Five-stage progress model.
//!
//! [`StageStateMachine`] is the only thing that mutates stage status.  Every
//! mutation returns a [`Transitions`] list describing exactly what changed,
//! which the controller forwards to the event sink.
//!
//! The transitions are:
//!
//! ```text
//! audio sent          ──▶ stage 1 Processing, step 1
//! stage N complete    ──▶ stage N Completed, stage N+1 Processing, step N+1
//! stage 4 complete    ──▶ … and stage 5 Processing → Completed (rendering is
//!                          synchronous; there is no stage 5 marker)
//! reset               ──▶ every stage Pending, step 0
//! ```
//!
//! Whenever a stage leaves `Pending`, every earlier stage that is not yet
//! completed is forced to `Completed`, so a missed marker never leaves a gap.

use serde::Serialize;

/// Number of stages in the pipeline.
pub const STAGE_COUNT: u8 = 5;

const STAGE_TITLES: [&str; STAGE_COUNT as usize] = [
    "Transcription",
    "Document retrieval",
    "Insight extraction",
    "Report assembly",
    "Rendering",
];

// ---------------------------------------------------------------------------
// StageStatus
// ---------------------------------------------------------------------------

/// Progress of one stage.  Ordered: a stage only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StageStatus {
    Pending,
    Processing,
    Completed,
}

impl Default for StageStatus {
    fn default() -> Self {
        StageStatus::Pending
    }
}

// ---------------------------------------------------------------------------
// Stage
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Stage {
    /// 1-based position in the pipeline.
    pub id: u8,
    pub title: &'static str,
    pub status: StageStatus,
}

/// One stage status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageTransition {
    pub stage: u8,
    pub status: StageStatus,
}

/// Everything a single mutation changed, in the order it changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transitions {
    pub stages: Vec<StageTransition>,
    /// New current step, if it moved.
    pub current_step: Option<u8>,
}

impl Transitions {
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty() && self.current_step.is_none()
    }
}

// ---------------------------------------------------------------------------
// StageStateMachine
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct StageStateMachine {
    stages: Vec<Stage>,
    current_step: u8,
}

impl StageStateMachine {
    pub fn new() -> Self {
        let stages = STAGE_TITLES
            .iter()
            .copied()
            .zip(1..)
            .map(|(title, id)| Stage {
                id,
                title,
                status: StageStatus::Pending,
            })
            .collect();
        Self {
            stages,
            current_step: 0,
        }
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Status of stage `id`, or `None` when out of range.
    pub fn status(&self, id: u8) -> Option<StageStatus> {
        self.index(id).map(|i| self.stages[i].status)
    }

    /// The stage currently shown as active; `0` before the upload.
    pub fn current_step(&self) -> u8 {
        self.current_step
    }

    /// `true` once the report has been rendered.
    pub fn is_complete(&self) -> bool {
        self.status(STAGE_COUNT) == Some(StageStatus::Completed)
    }

    /// The audio reached the backend: stage 1 starts.
    pub fn begin_transfer(&mut self) -> Transitions {
        let mut out = Transitions::default();
        self.advance(1, StageStatus::Processing, &mut out);
        self.step_to(1, &mut out);
        out
    }

    /// The backend reported stage `id` complete.
    ///
    /// Out-of-range ids change nothing.
    pub fn complete(&mut self, id: u8) -> Transitions {
        let mut out = Transitions::default();
        if self.index(id).is_none() {
            log::warn!("stages: ignoring completion of unknown stage {id}");
            return out;
        }

        self.advance(id, StageStatus::Completed, &mut out);
        if id < STAGE_COUNT {
            self.advance(id + 1, StageStatus::Processing, &mut out);
        }
        if id + 1 == STAGE_COUNT {
            self.advance(STAGE_COUNT, StageStatus::Completed, &mut out);
        }
        self.step_to((id + 1).min(STAGE_COUNT), &mut out);
        out
    }

    /// Back to the initial state: all pending, step 0.
    pub fn reset(&mut self) -> Transitions {
        let mut out = Transitions::default();
        for stage in &mut self.stages {
            if stage.status != StageStatus::Pending {
                stage.status = StageStatus::Pending;
                out.stages.push(StageTransition {
                    stage: stage.id,
                    status: StageStatus::Pending,
                });
            }
        }
        if self.current_step != 0 {
            self.current_step = 0;
            out.current_step = Some(0);
        }
        out
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn index(&self, id: u8) -> Option<usize> {
        (1..=STAGE_COUNT).contains(&id).then(|| usize::from(id - 1))
    }

    /// Move stage `id` forward to `status`, completing every earlier stage
    /// first.  Never moves a stage backwards.
    fn advance(&mut self, id: u8, status: StageStatus, out: &mut Transitions) {
        for earlier in 1..id {
            self.raise(earlier, StageStatus::Completed, out);
        }
        self.raise(id, status, out);
    }

    fn raise(&mut self, id: u8, status: StageStatus, out: &mut Transitions) {
        let Some(i) = self.index(id) else { return };
        let stage = &mut self.stages[i];
        if status > stage.status {
            log::debug!("stages: {} {:?} → {:?}", stage.id, stage.status, status);
            stage.status = status;
            out.stages.push(StageTransition { stage: id, status });
        }
    }

    fn step_to(&mut self, step: u8, out: &mut Transitions) {
        if step > self.current_step {
            self.current_step = step;
            out.current_step = Some(step);
        }
    }
}

impl Default for StageStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn statuses(sm: &StageStateMachine) -> Vec<StageStatus> {
        sm.stages().iter().map(|s| s.status).collect()
    }

    fn t(stage: u8, status: StageStatus) -> StageTransition {
        StageTransition { stage, status }
    }

    use StageStatus::{Completed, Pending, Processing};

    #[test]
    fn starts_all_pending() {
        let sm = StageStateMachine::new();
        assert_eq!(statuses(&sm), vec![Pending; 5]);
        assert_eq!(sm.current_step(), 0);
        assert!(!sm.is_complete());
        assert_eq!(sm.stages()[0].title, "Transcription");
        assert_eq!(sm.stages()[4].id, 5);
    }

    #[test]
    fn begin_transfer_starts_stage_one() {
        let mut sm = StageStateMachine::new();
        let out = sm.begin_transfer();
        assert_eq!(out.stages, vec![t(1, Processing)]);
        assert_eq!(out.current_step, Some(1));
    }

    #[test]
    fn completing_a_stage_starts_the_next() {
        let mut sm = StageStateMachine::new();
        sm.begin_transfer();

        let out = sm.complete(1);
        assert_eq!(out.stages, vec![t(1, Completed), t(2, Processing)]);
        assert_eq!(out.current_step, Some(2));
    }

    #[test]
    fn in_order_run_completes_everything() {
        let mut sm = StageStateMachine::new();
        sm.begin_transfer();
        for id in 1..=4 {
            sm.complete(id);
        }
        assert_eq!(statuses(&sm), vec![Completed; 5]);
        assert_eq!(sm.current_step(), 5);
        assert!(sm.is_complete());
    }

    #[test]
    fn stage_four_synthesises_stage_five() {
        let mut sm = StageStateMachine::new();
        for id in 1..=3 {
            sm.complete(id);
        }
        let out = sm.complete(4);
        assert_eq!(
            out.stages,
            vec![t(4, Completed), t(5, Processing), t(5, Completed)]
        );
        assert_eq!(out.current_step, Some(5));
    }

    #[test]
    fn late_completion_cascades_over_missed_stages() {
        let mut sm = StageStateMachine::new();
        sm.begin_transfer();

        // Markers for stages 1 and 2 never arrived.
        let out = sm.complete(3);
        assert_eq!(
            out.stages,
            vec![t(1, Completed), t(2, Completed), t(3, Completed), t(4, Processing)]
        );
        assert_eq!(statuses(&sm), vec![Completed, Completed, Completed, Processing, Pending]);
        assert_eq!(sm.current_step(), 4);
    }

    #[test]
    fn out_of_order_completion_never_regresses() {
        let mut sm = StageStateMachine::new();
        sm.complete(3);
        let out = sm.complete(2);

        assert!(out.is_empty());
        assert_eq!(statuses(&sm), vec![Completed, Completed, Completed, Processing, Pending]);
        assert_eq!(sm.current_step(), 4);
    }

    #[test]
    fn repeated_completion_is_silent() {
        let mut sm = StageStateMachine::new();
        sm.complete(1);
        assert!(sm.complete(1).is_empty());
    }

    #[test]
    fn unknown_stage_is_ignored() {
        let mut sm = StageStateMachine::new();
        assert!(sm.complete(0).is_empty());
        assert!(sm.complete(9).is_empty());
        assert_eq!(statuses(&sm), vec![Pending; 5]);
    }

    #[test]
    fn reset_reports_only_changed_stages() {
        let mut sm = StageStateMachine::new();
        sm.complete(1);

        let out = sm.reset();
        assert_eq!(out.stages, vec![t(1, Pending), t(2, Pending)]);
        assert_eq!(out.current_step, Some(0));
        assert_eq!(statuses(&sm), vec![Pending; 5]);

        assert!(sm.reset().is_empty());
    }

    #[test]
    fn status_lookup_is_bounds_checked() {
        let sm = StageStateMachine::new();
        assert_eq!(sm.status(1), Some(Pending));
        assert_eq!(sm.status(6), None);
    }
}
