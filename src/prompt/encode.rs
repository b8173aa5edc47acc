use serde::Deserialize;

use crate::editor::TextBuffer;

/// Stand-in for `+`, which the backend form decoder would read as a space.
pub const PLUS_SENTINEL: &str = "@PLUS@#@SIGN@";
/// Stand-in for `&`, which would split the form body.
pub const AMPERSAND_SENTINEL: &str = "@AMPER@#@SIGN@";

/// Kind of prompt the backend should run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptMode {
    Code,
    Debug,
}

impl PromptMode {
    pub fn as_str(self) -> &'static str {
        match self {
            PromptMode::Code => "code",
            PromptMode::Debug => "debug",
        }
    }
}

/// Replace characters the backend decodes specially with their sentinels.
pub fn escape_code(code: &str) -> String {
    code.replace('+', PLUS_SENTINEL)
        .replace('&', AMPERSAND_SENTINEL)
}

/// Fields sent with one submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptRequest {
    pub code: String,
    pub context: String,
    pub mode: PromptMode,
}

impl PromptRequest {
    /// Capture the code pane's selection, or its whole escaped content when
    /// nothing is selected, plus the context verbatim.
    pub fn capture(code: &TextBuffer, context: &TextBuffer, mode: PromptMode) -> Self {
        let selection = code.selection();
        let code = if selection.is_empty() {
            escape_code(&code.value())
        } else {
            selection
        };
        Self {
            code,
            context: context.value(),
            mode,
        }
    }

    /// Form body fields in submission order.
    pub fn form_fields(&self) -> [(&'static str, &str); 3] {
        [
            ("code", self.code.as_str()),
            ("context", self.context.as_str()),
            ("pyaiType", self.mode.as_str()),
        ]
    }
}
