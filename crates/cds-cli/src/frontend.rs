//! Line-based terminal frontend driving a [`Session`].

use std::error::Error;
use std::io::{BufRead, Write};

use cds_core::errors::SurveyError;
use cds_core::{BackgroundCategory, FollowUpVocabulary};
use cds_trial::{Clock, ParticipantForm, QuestionView, Session, SessionState};
use tracing::warn;

/// How an interactive pass ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    Completed,
    /// Input closed before the last answer.
    Abandoned,
    Halted,
}

pub struct Terminal<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Terminal<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn say(&mut self, line: impl AsRef<str>) -> Result<(), Box<dyn Error>> {
        writeln!(self.output, "{}", line.as_ref())?;
        Ok(())
    }

    /// Prints `prompt` and reads one line; `None` once input is exhausted.
    pub fn ask(&mut self, prompt: &str) -> Result<Option<String>, Box<dyn Error>> {
        write!(self.output, "{prompt} ")?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    pub fn confirm(&mut self, prompt: &str) -> Result<bool, Box<dyn Error>> {
        Ok(matches!(
            self.ask(prompt)?.as_deref().map(str::trim),
            Some("y" | "Y" | "yes" | "Yes")
        ))
    }

    /// Runs the login form and then the question loop until the session
    /// completes or input runs out. `checkpoint` is called after every
    /// recorded answer; a failed checkpoint is reported and the session
    /// carries on.
    pub fn drive<C, F>(
        &mut self,
        session: &mut Session<C>,
        mut checkpoint: F,
    ) -> Result<SessionOutcome, Box<dyn Error>>
    where
        C: Clock,
        F: FnMut(&Session<C>) -> Result<(), SurveyError>,
    {
        if session.state() == SessionState::AwaitingParticipantInfo {
            if let Some(outcome) = self.login(session)? {
                return Ok(outcome);
            }
        }
        let vocabulary = session.protocol().vocabulary.clone();
        loop {
            let screen = match session.current() {
                Some(view) => render_question(&view, &vocabulary),
                None => break,
            };
            self.say(screen)?;
            let Some(line) = self.ask("Your choice:")? else {
                return Ok(SessionOutcome::Abandoned);
            };
            let selection = parse_selection(&line, &vocabulary);
            let submitted = session.submit_answer(selection.as_deref()).map(|_| ());
            match submitted {
                Ok(()) => {
                    if let Err(err) = checkpoint(session) {
                        warn!(code = %err.info().code, error = %err, "session checkpoint failed");
                        self.say(format!("! could not save progress: {}", err.info().message))?;
                    }
                }
                Err(err) if err.is_recoverable() => self.say(format!("! {}", err.info().message))?,
                Err(err) => return Err(Box::new(err)),
            }
        }
        Ok(match session.state() {
            SessionState::Halted => SessionOutcome::Halted,
            _ => SessionOutcome::Completed,
        })
    }

    fn login<C: Clock>(
        &mut self,
        session: &mut Session<C>,
    ) -> Result<Option<SessionOutcome>, Box<dyn Error>> {
        let max_years = session.protocol().max_practice_years;
        let labels = session.protocol().backgrounds.clone();
        loop {
            self.say("Participant information")?;
            let Some(name) = self.ask("Name or ID:")? else {
                return Ok(Some(SessionOutcome::Abandoned));
            };
            self.say("What is your attending physician background?")?;
            for (idx, category) in BackgroundCategory::ALL.iter().enumerate() {
                self.say(format!("  {}. {}", idx + 1, labels.label(*category)))?;
            }
            let Some(choice) = self.ask("Background:")? else {
                return Ok(Some(SessionOutcome::Abandoned));
            };
            let background = choice
                .trim()
                .parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
                .and_then(|idx| BackgroundCategory::ALL.get(idx).copied());
            let practice_years = loop {
                let Some(years) =
                    self.ask(&format!("Years as an attending physician (0-{max_years}):"))?
                else {
                    return Ok(Some(SessionOutcome::Abandoned));
                };
                let years = years.trim();
                if years.is_empty() {
                    break 0;
                }
                match years.parse::<u32>() {
                    Ok(value) => break value,
                    Err(_) => self.say("! Please enter a whole number of years")?,
                }
            };
            let form = ParticipantForm {
                name,
                background,
                practice_years,
            };
            let total = session.len();
            match session.submit_participant(form) {
                Ok(participant) => {
                    let greeting = format!(
                        "Welcome, {}. You have {total} questions to answer.",
                        participant.name
                    );
                    self.say(greeting)?;
                    return Ok(None);
                }
                Err(SurveyError::EmptySequence(info)) => {
                    warn!(code = %info.code, "cannot start session");
                    self.say(format!("! {}", info.message))?;
                    return Ok(Some(SessionOutcome::Halted));
                }
                Err(err) if err.is_recoverable() => self.say(format!("! {}", err.info().message))?,
                Err(err) => return Err(Box::new(err)),
            }
        }
    }
}

/// Maps a typed answer to a code: an option number, or the code itself.
/// Blank input is no selection.
pub fn parse_selection(line: &str, vocabulary: &FollowUpVocabulary) -> Option<String> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    if let Ok(number) = line.parse::<usize>() {
        if let Some(option) = number
            .checked_sub(1)
            .and_then(|idx| vocabulary.options().get(idx))
        {
            return Some(option.code.to_string());
        }
    }
    Some(line.to_string())
}

pub fn render_question(view: &QuestionView<'_>, vocabulary: &FollowUpVocabulary) -> String {
    let question = &view.item.question;
    let mut screen = String::new();
    screen.push_str(&format!(
        "\n=== Question {} of {} | Phase {} | {} ({} years) ===\n",
        view.position,
        view.total,
        view.phase(),
        view.participant.name,
        view.participant.practice_years,
    ));
    screen.push_str(&format!(
        "\n[Endoscopy report]\n{}\n",
        question.endoscopy_report
    ));
    screen.push_str(&format!(
        "\n[Pathology report]\n{}\n",
        question.pathology_report
    ));
    if let Some(suggestion) = view.suggestion() {
        screen.push_str(&format!("\n[LLM suggestion]\n{suggestion}\n"));
    }
    screen.push_str("\nRecommended follow-up interval:\n");
    for (idx, option) in vocabulary.options().iter().enumerate() {
        screen.push_str(&format!("  {}. {}\n", idx + 1, option.label));
    }
    screen
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_accepts_numbers_and_codes() {
        let vocabulary = FollowUpVocabulary::default();
        assert_eq!(parse_selection(" 2 ", &vocabulary).as_deref(), Some("3y"));
        assert_eq!(parse_selection("7-10y", &vocabulary).as_deref(), Some("7-10y"));
        assert_eq!(parse_selection("", &vocabulary), None);
        assert_eq!(parse_selection("42", &vocabulary).as_deref(), Some("42"));
    }
}
