use quest_core::IntakeForm;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IntakeVm {
    pub prompt: String,
    pub step_label: String,
    pub submit_label: &'static str,
    pub can_go_back: bool,
    /// Answer given earlier for this prompt, to prefill the input.
    pub previous_answer: String,
}

#[must_use]
pub fn intake_vm(form: &IntakeForm) -> IntakeVm {
    IntakeVm {
        prompt: form.current_prompt().unwrap_or_default().to_string(),
        step_label: format!("Question {} of {}", form.position() + 1, form.len()),
        submit_label: if form.is_last() { "Start adventure" } else { "Next" },
        can_go_back: form.position() > 0,
        previous_answer: form.answer_at(form.position()).unwrap_or_default().to_string(),
    }
}
