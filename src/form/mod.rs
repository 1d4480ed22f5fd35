//! Respondent-side form handling: state, rendering, submission.

pub mod debounce;
pub mod renderer;
pub mod session;
pub mod state;
pub mod submission;

pub use debounce::{survey_autosave, Debouncer, Teardown};
pub use renderer::{
    on_user_input, render, InputError, InputEvent, RenderedControl, RenderedField, RenderedOption,
    TextInputKind, UnsupportedFieldType,
};
pub use session::{FormSession, SessionError};
pub use state::FormStateStore;
pub use submission::{
    descriptive_responses, submit, validate, FieldError, FieldValidationError, SubmissionError,
    SubmissionReceipt, ValidationErrors,
};
