//! Session state and its reducer
//!
//! Everything the interactive session knows lives in one immutable
//! [`SessionState`]. Changes go through [`SessionState::update`], which
//! returns the next state instead of mutating shared globals.

use crate::font::StandardFont;
use crate::intake::{keep_pdfs, InputFile};
use crate::pdf::{WatermarkOptions, DEFAULT_FONT_SIZE, MAX_FONT_SIZE, MIN_FONT_SIZE};

/// Something that happened in the session
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// New files arrived; non-PDFs are dropped
    FilesDropped(Vec<InputFile>),
    TextChanged(String),
    FontChanged(StandardFont),
    /// Clamped to the accepted font size range
    FontSizeChanged(u16),
    /// Clear the text and the file list
    Reset,
    GenerationStarted,
    GenerationFinished,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub files: Vec<InputFile>,
    pub text: String,
    pub font: StandardFont,
    pub font_size: u16,
    /// An archive is being generated; edits are ignored meanwhile
    pub loading: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            files: Vec::new(),
            text: String::new(),
            font: StandardFont::default(),
            font_size: DEFAULT_FONT_SIZE,
            loading: false,
        }
    }
}

impl SessionState {
    /// Apply an action and return the resulting state
    pub fn update(&self, action: Action) -> SessionState {
        let mut next = self.clone();

        match action {
            Action::GenerationStarted => next.loading = true,
            Action::GenerationFinished => next.loading = false,
            _ if self.loading => {}
            Action::FilesDropped(files) => next.files = keep_pdfs(files),
            Action::TextChanged(text) => next.text = text,
            Action::FontChanged(font) => next.font = font,
            Action::FontSizeChanged(size) => {
                next.font_size = size.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE)
            }
            Action::Reset => {
                next.files.clear();
                next.text.clear();
            }
        }

        next
    }

    /// Watermark options matching the current settings
    pub fn watermark_options(&self) -> WatermarkOptions {
        WatermarkOptions {
            text: self.text.clone(),
            font: self.font,
            font_size: self.font_size,
            ..Default::default()
        }
    }

    /// The file and options a preview should show, if there is a file
    pub fn preview_request(&self) -> Option<(InputFile, WatermarkOptions)> {
        self.files
            .first()
            .map(|file| (file.clone(), self.watermark_options()))
    }

    /// Whether moving from `previous` to this state changes the preview
    pub fn preview_changed(&self, previous: &SessionState) -> bool {
        self.files.first() != previous.files.first()
            || self.text != previous.text
            || self.font != previous.font
            || self.font_size != previous.font_size
    }
}
