use std::time::Duration;

use cds_core::errors::{ErrorInfo, SurveyError};
use cds_core::{
    BackgroundCategory, BackgroundLabels, FollowUpCode, FollowUpVocabulary, Group,
    ParticipantInfo, Phase, ResponseRecord, SetLabel, TrialItem,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::assign::{Assignment, SplitKind};
use crate::clock::Clock;
use crate::snapshot::{Resumed, SessionSnapshot, SNAPSHOT_VERSION};

/// Study-wide settings every session is checked against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurveyProtocol {
    pub vocabulary: FollowUpVocabulary,
    pub backgrounds: BackgroundLabels,
    pub max_practice_years: u32,
}

impl Default for SurveyProtocol {
    fn default() -> Self {
        Self {
            vocabulary: FollowUpVocabulary::default(),
            backgrounds: BackgroundLabels::default(),
            max_practice_years: 50,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    AwaitingParticipantInfo,
    InProgress,
    Complete,
    /// Terminal error state: the trial sequence was empty.
    Halted,
}

/// Raw participant form as submitted by the frontend.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParticipantForm {
    pub name: String,
    pub background: Option<BackgroundCategory>,
    pub practice_years: u32,
}

/// What the frontend needs to render the current item.
#[derive(Debug, Clone, Copy)]
pub struct QuestionView<'a> {
    /// 1-based position in the sequence.
    pub position: usize,
    pub total: usize,
    pub item: &'a TrialItem,
    pub participant: &'a ParticipantInfo,
}

impl<'a> QuestionView<'a> {
    pub fn phase(&self) -> Phase {
        self.item.phase
    }

    pub fn set_label(&self) -> SetLabel {
        self.item.set_label
    }

    pub fn suggestion(&self) -> Option<&'a str> {
        self.item.visible_suggestion()
    }
}

/// One participant's pass through their trial sequence.
///
/// The session owns its sequence and response log; the caller owns the
/// session. Responses are append-only and the index never moves backwards
/// while answering.
#[derive(Debug)]
pub struct Session<C: Clock> {
    protocol: SurveyProtocol,
    group: Group,
    split: SplitKind,
    items: Vec<TrialItem>,
    participant: Option<ParticipantInfo>,
    state: SessionState,
    index: usize,
    item_started: Duration,
    responses: Vec<ResponseRecord>,
    halt: Option<SurveyError>,
    clock: C,
}

impl<C: Clock> Session<C> {
    pub fn new(assignment: Assignment, protocol: SurveyProtocol, clock: C) -> Self {
        Self {
            protocol,
            group: assignment.group,
            split: assignment.split,
            items: assignment.items,
            participant: None,
            state: SessionState::AwaitingParticipantInfo,
            index: 0,
            item_started: Duration::ZERO,
            responses: Vec::new(),
            halt: None,
            clock,
        }
    }

    /// Current state; an in-progress session whose index has reached the end
    /// of the sequence reads as complete.
    pub fn state(&self) -> SessionState {
        match self.state {
            SessionState::InProgress if self.index >= self.items.len() => SessionState::Complete,
            state => state,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.state() == SessionState::Complete
    }

    pub fn group(&self) -> Group {
        self.group
    }

    pub fn split(&self) -> SplitKind {
        self.split
    }

    pub fn protocol(&self) -> &SurveyProtocol {
        &self.protocol
    }

    pub fn participant(&self) -> Option<&ParticipantInfo> {
        self.participant.as_ref()
    }

    pub fn items(&self) -> &[TrialItem] {
        &self.items
    }

    /// 0-based index of the next item to answer.
    pub fn current_question_index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.items.len().saturating_sub(self.index)
    }

    pub fn responses(&self) -> &[ResponseRecord] {
        &self.responses
    }

    /// The error that halted the session, if any.
    pub fn halt_error(&self) -> Option<&SurveyError> {
        self.halt.as_ref()
    }

    /// Validates the participant form and starts the first item's timer.
    pub fn submit_participant(
        &mut self,
        form: ParticipantForm,
    ) -> Result<&ParticipantInfo, SurveyError> {
        if self.state != SessionState::AwaitingParticipantInfo {
            return Err(self.wrong_state("participant info already submitted"));
        }
        let name = form.name.trim();
        if name.is_empty() {
            return Err(SurveyError::InvalidParticipant(
                ErrorInfo::new("participant-name", "Please enter your name or ID")
                    .with_context("field", "name"),
            ));
        }
        let Some(background) = form.background else {
            return Err(SurveyError::InvalidParticipant(
                ErrorInfo::new("participant-background", "Please select your background")
                    .with_context("field", "background"),
            ));
        };
        if form.practice_years > self.protocol.max_practice_years {
            return Err(SurveyError::InvalidParticipant(
                ErrorInfo::new("participant-years", "practice years out of range")
                    .with_context("practice_years", form.practice_years.to_string())
                    .with_context("max", self.protocol.max_practice_years.to_string()),
            ));
        }
        let participant = ParticipantInfo {
            name: name.to_string(),
            background,
            practice_years: form.practice_years,
            group: self.group,
        };
        info!(
            participant = %participant.name,
            group = %self.group,
            items = self.items.len(),
            "participant registered"
        );
        let participant = self.participant.insert(participant);
        if self.items.is_empty() {
            let err = SurveyError::EmptySequence(
                ErrorInfo::new("session-empty", "question list is empty; cannot continue")
                    .with_hint("check the question bank file"),
            );
            warn!("session halted: empty trial sequence");
            self.state = SessionState::Halted;
            self.halt = Some(err.clone());
            return Err(err);
        }
        self.state = SessionState::InProgress;
        self.item_started = self.clock.now();
        Ok(participant)
    }

    /// The item to render next, or `None` once the session is no longer in
    /// progress. Reaching the end of the sequence completes the session here.
    pub fn current(&mut self) -> Option<QuestionView<'_>> {
        let state = self.state();
        if state != self.state {
            info!(responses = self.responses.len(), "session complete");
            self.state = state;
        }
        if self.state != SessionState::InProgress {
            return None;
        }
        let participant = self.participant.as_ref()?;
        let item = self.items.get(self.index)?;
        Some(QuestionView {
            position: self.index + 1,
            total: self.items.len(),
            item,
            participant,
        })
    }

    /// Records the answer for the current item and moves to the next one.
    ///
    /// A missing or unknown selection is rejected with
    /// [`SurveyError::InvalidSubmission`] and leaves the session untouched.
    pub fn submit_answer(&mut self, selected: Option<&str>) -> Result<&ResponseRecord, SurveyError> {
        match self.state() {
            SessionState::InProgress => {}
            SessionState::Halted => {
                return Err(self
                    .halt
                    .clone()
                    .unwrap_or_else(|| self.wrong_state("session halted")))
            }
            SessionState::AwaitingParticipantInfo => {
                return Err(self.wrong_state("participant info not submitted"))
            }
            SessionState::Complete => return Err(self.wrong_state("session already complete")),
        }
        let selected = match selected.map(str::trim) {
            Some(code) if !code.is_empty() => FollowUpCode::new(code),
            _ => {
                warn!(index = self.index, "answer submitted without a selection");
                return Err(SurveyError::InvalidSubmission(ErrorInfo::new(
                    "answer-missing",
                    "Please select an option!",
                )));
            }
        };
        if !self.protocol.vocabulary.contains(&selected) {
            warn!(index = self.index, code = %selected, "answer outside vocabulary");
            return Err(SurveyError::InvalidSubmission(
                ErrorInfo::new("answer-unknown", "selected option is not a follow-up choice")
                    .with_context("code", selected.as_str()),
            ));
        }
        let Some(item) = self.items.get(self.index) else {
            return Err(SurveyError::IndexOutOfRange(
                ErrorInfo::new("session-index", "question index is out of range")
                    .with_context("index", self.index.to_string())
                    .with_context("len", self.items.len().to_string()),
            ));
        };
        let Some(participant) = self.participant.as_ref() else {
            return Err(self.wrong_state("participant info not submitted"));
        };

        let now = self.clock.now();
        let elapsed = now.saturating_sub(self.item_started);
        let is_correct = selected == item.question.correct_answer;
        let record = ResponseRecord {
            name: participant.name.clone(),
            background: self.protocol.backgrounds.label(participant.background).to_string(),
            practice_years: participant.practice_years,
            group: participant.group,
            phase: item.phase,
            set_label: item.set_label,
            question_id: item.question.id.clone(),
            sequence_index: self.index + 1,
            assistance_shown: item.show_assistance,
            selected_answer: selected,
            correct_answer: item.question.correct_answer.clone(),
            is_correct,
            elapsed_seconds: elapsed.as_secs_f64(),
        };
        debug!(
            question = %record.question_id,
            sequence_index = record.sequence_index,
            is_correct,
            elapsed = record.elapsed_seconds,
            "answer recorded"
        );
        self.responses.push(record);
        self.index += 1;
        self.item_started = now;
        Ok(&self.responses[self.responses.len() - 1])
    }

    /// Captures everything needed to continue this session later.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            version: SNAPSHOT_VERSION,
            protocol: self.protocol.clone(),
            group: self.group,
            split: self.split,
            items: self.items.clone(),
            participant: self.participant.clone(),
            state: self.state(),
            index: self.index,
            responses: self.responses.clone(),
            halt: self.halt.clone(),
        }
    }

    /// Restores a session from a snapshot. The current item's timer restarts
    /// at resume time.
    ///
    /// An index past the end of the sequence, or one that disagrees with the
    /// response log, is reset to the next unanswered item and reported as
    /// [`SurveyError::IndexOutOfRange`] alongside the recovered session.
    pub fn resume(snapshot: SessionSnapshot, clock: C) -> Resumed<C> {
        let SessionSnapshot {
            protocol,
            group,
            split,
            items,
            participant,
            mut state,
            index,
            mut responses,
            halt,
            ..
        } = snapshot;
        let mut recovered = None;
        let mut safe_index = index;
        if responses.len() > items.len() {
            responses.truncate(items.len());
        }
        if index > items.len() || index != responses.len() {
            safe_index = responses.len();
            warn!(
                index,
                len = items.len(),
                responses = responses.len(),
                "snapshot index out of range; resetting"
            );
            recovered = Some(SurveyError::IndexOutOfRange(
                ErrorInfo::new(
                    "session-index",
                    "question index is out of range; resuming at the next unanswered question",
                )
                .with_context("index", index.to_string())
                .with_context("len", items.len().to_string())
                .with_context("reset_to", safe_index.to_string()),
            ));
        }
        if participant.is_none() {
            state = SessionState::AwaitingParticipantInfo;
        } else if state == SessionState::Complete && safe_index < items.len() {
            state = SessionState::InProgress;
        }
        let item_started = clock.now();
        let session = Self {
            protocol,
            group,
            split,
            items,
            participant,
            state,
            index: safe_index,
            item_started,
            responses,
            halt,
            clock,
        };
        debug!(index = session.index, state = ?session.state(), "session resumed");
        Resumed { session, recovered }
    }

    fn wrong_state(&self, message: &str) -> SurveyError {
        SurveyError::InvalidState(
            ErrorInfo::new("session-state", message)
                .with_context("state", format!("{:?}", self.state())),
        )
    }
}
