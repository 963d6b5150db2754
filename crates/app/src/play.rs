//! Terminal rendition of a quest over stdin/stdout.

use std::io::{BufRead, Write};

use anyhow::{Context, bail};
use quest_core::{IntakeForm, IntakeStep, StoryRequest};
use services::{QuestError, QuestLoopService, QuestSession};
use ui::vm::{FeedbackVm, intake_vm, render_plain, render_scene};

/// Words that step back to the previous intake prompt.
const BACK_WORDS: [&str; 2] = ["<", "back"];
const QUIT_WORDS: [&str; 2] = ["q", "quit"];

pub struct Terminal<R, W> {
    input: R,
    out: W,
    backend_label: String,
}

impl<R: BufRead, W: Write> Terminal<R, W> {
    pub fn new(input: R, out: W, backend_label: impl Into<String>) -> Self {
        Self {
            input,
            out,
            backend_label: backend_label.into(),
        }
    }

    /// Play one quest from intake to the closing screen.
    ///
    /// # Errors
    ///
    /// Fails when stdin/stdout fail, or when the learner gives up after a
    /// backend error.
    pub async fn run(&mut self, quest_loop: &QuestLoopService, quick_start: bool) -> anyhow::Result<()> {
        let request = if quick_start {
            StoryRequest::quick_start()
        } else {
            match self.collect_intake(quest_loop).await? {
                Some(request) => request,
                None => return Ok(()),
            }
        };

        let Some(mut session) = self.start(quest_loop, request).await? else {
            return Ok(());
        };

        loop {
            let vm = render_scene(session.scene(), None, false);
            writeln!(self.out, "\n{}", render_plain(&vm))?;
            if session.is_finished() {
                return Ok(());
            }

            let labels = session
                .scene()
                .active_question()
                .map(|q| q.choices().to_vec())
                .unwrap_or_default();
            let Some(choice) = self.ask_choice(&labels)? else {
                writeln!(self.out, "Goodbye!")?;
                return Ok(());
            };

            let mut result = quest_loop.submit_choice(&mut session, &choice).await;
            while let Err(err) = &result {
                if !self.offer_retry(err, &session)? {
                    return Ok(());
                }
                result = quest_loop.retry_last(&mut session).await;
            }
            if let Ok(outcome) = result {
                if let Some(text) = outcome.feedback {
                    let feedback = FeedbackVm {
                        text,
                        correct: outcome.correct,
                    };
                    writeln!(self.out, "\n>> {}{}", feedback.marker(), feedback.text)?;
                    self.out.flush()?;
                    tokio::time::sleep(outcome.dwell).await;
                }
            }
        }
    }

    async fn collect_intake(
        &mut self,
        quest_loop: &QuestLoopService,
    ) -> anyhow::Result<Option<StoryRequest>> {
        let schema = quest_loop
            .intake_schema()
            .await
            .context("could not load the intake questions")?;
        let mut form = IntakeForm::new(schema)?;

        writeln!(self.out, "Tell us about your adventure (type `back` to revise).")?;
        loop {
            let vm = intake_vm(&form);
            write!(self.out, "\n{}\n{} ", vm.step_label, vm.prompt)?;
            self.out.flush()?;

            let Some(line) = self.read_line()? else {
                return Ok(None);
            };
            if BACK_WORDS.contains(&line.as_str()) {
                if !form.back() {
                    writeln!(self.out, "This is the first question.")?;
                }
                continue;
            }
            match form.submit(&line) {
                Ok(IntakeStep::Next { .. }) => {}
                Ok(IntakeStep::Complete(answers)) => return Ok(Some(answers.story_request())),
                Err(err) => writeln!(self.out, "{err}")?,
            }
        }
    }

    async fn start(
        &mut self,
        quest_loop: &QuestLoopService,
        request: StoryRequest,
    ) -> anyhow::Result<Option<QuestSession>> {
        writeln!(self.out, "\nPreparing your adventure…")?;
        loop {
            match quest_loop.start_quest(request.clone()).await {
                Ok(session) => return Ok(Some(session)),
                Err(err) => {
                    writeln!(self.out, "Your adventure could not start: {err}")?;
                    writeln!(
                        self.out,
                        "Make sure the story server is running at {}.",
                        self.backend_label
                    )?;
                    if !self.confirm_retry()? {
                        return Ok(None);
                    }
                }
            }
        }
    }

    fn ask_choice(&mut self, labels: &[String]) -> anyhow::Result<Option<String>> {
        if labels.is_empty() {
            bail!("the scene offers no choices");
        }
        loop {
            write!(self.out, "Your answer (1-{}, q to quit): ", labels.len())?;
            self.out.flush()?;
            let Some(line) = self.read_line()? else {
                return Ok(None);
            };
            if QUIT_WORDS.contains(&line.as_str()) {
                return Ok(None);
            }
            if let Some(label) = pick(labels, &line) {
                return Ok(Some(label.to_string()));
            }
            writeln!(self.out, "Please pick one of the numbered answers.")?;
        }
    }

    fn offer_retry(&mut self, err: &QuestError, session: &QuestSession) -> anyhow::Result<bool> {
        writeln!(self.out, "\nThe story could not continue: {err}")?;
        if session.failed_choice().is_none() {
            return Ok(false);
        }
        self.confirm_retry()
    }

    fn confirm_retry(&mut self) -> anyhow::Result<bool> {
        write!(self.out, "Press Enter to retry or q to quit: ")?;
        self.out.flush()?;
        Ok(self
            .read_line()?
            .is_some_and(|line| !QUIT_WORDS.contains(&line.as_str())))
    }

    /// Next trimmed line, `None` at end of input.
    fn read_line(&mut self) -> anyhow::Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    pub fn into_output(self) -> W {
        self.out
    }
}

/// Resolve a 1-based index or an exact label.
fn pick<'a>(labels: &'a [String], input: &str) -> Option<&'a str> {
    if let Ok(n) = input.parse::<usize>() {
        return n.checked_sub(1).and_then(|i| labels.get(i)).map(String::as_str);
    }
    labels
        .iter()
        .find(|label| label.eq_ignore_ascii_case(input))
        .map(String::as_str)
}
