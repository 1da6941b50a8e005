use mhost_derive::mhost_error;
use std::borrow::Cow;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

// A source accompanied by extra identifying fields gets no `From` impl,
// so it must be constructed explicitly.
#[mhost_error]
pub enum StepError {
    #[error("Step '{step}' failed{}: {source}", format_context(.context))]
    Step { step: String, source: BoxError, context: Option<Cow<'static, str>> },
}

fn main() {
    let err = StepError::Step { step: "init".to_owned(), source: "bad".into(), context: None };
    assert!(err.to_string().contains("init"));
}
