mod intake_vm;
mod markdown_vm;
mod quest_vm;
mod scene_vm;

pub use intake_vm::{IntakeVm, intake_vm};
pub use markdown_vm::{markdown_to_html, markdown_to_plain, sanitize_html};
pub use quest_vm::{load_intake_schema, progress_label, start_quest};
pub use scene_vm::{
    ChoiceVm, FeedbackVm, ImageVm, RecapRowVm, SceneBodyVm, SceneVm, render_plain, render_scene,
};
