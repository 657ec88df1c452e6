//! User confirmation and notification interface

/// Answer choices offered with a question
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionKind {
    YesNo,
    OkCancel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum NoticeKind {
    Info,
    Error,
}

/// A blocking question. `confirm` returns true for yes/ok.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub title: String,
    pub message: String,
    pub kind: QuestionKind,
    /// Present the question with a warning style
    pub warning: bool,
}

impl Question {
    pub fn yes_no(title: &str, message: impl Into<String>) -> Self {
        Self {
            title: title.to_string(),
            message: message.into(),
            kind: QuestionKind::YesNo,
            warning: false,
        }
    }

    pub fn ok_cancel(title: &str, message: impl Into<String>) -> Self {
        Self {
            title: title.to_string(),
            message: message.into(),
            kind: QuestionKind::OkCancel,
            warning: false,
        }
    }

    pub fn as_warning(mut self) -> Self {
        self.warning = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub title: String,
    pub message: String,
    pub kind: NoticeKind,
}

impl Notice {
    pub fn new(kind: NoticeKind, title: &str, message: impl Into<String>) -> Self {
        Self {
            title: title.to_string(),
            message: message.into(),
            kind,
        }
    }

    pub fn info(title: &str, message: impl Into<String>) -> Self {
        Self::new(NoticeKind::Info, title, message)
    }

    pub fn error(title: &str, message: impl Into<String>) -> Self {
        Self::new(NoticeKind::Error, title, message)
    }
}

/// Presents questions and notices to the user, blocking until answered
pub trait Prompter {
    fn confirm(&mut self, question: &Question) -> bool;
    fn notify(&mut self, notice: &Notice);
}

impl<P: Prompter + ?Sized> Prompter for &mut P {
    fn confirm(&mut self, question: &Question) -> bool {
        (**self).confirm(question)
    }

    fn notify(&mut self, notice: &Notice) {
        (**self).notify(notice)
    }
}
