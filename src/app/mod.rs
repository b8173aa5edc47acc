//! The pad application plugin: three editor panes, their splitters, the
//! side panel and the prompt request cycle, wired to runtime events.

mod chrome;
mod clicks;
mod prompt_line;

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crossterm::event::{
    KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use serde_json::{Value, json};

use crate::editor::{Position, TextBuffer, ViewOptions, gutter_width, render_buffer};
use crate::files::{DEFAULT_TITLE, default_export_name, export_file, import_file};
use crate::logging::{LogLevel, Logger, event_with_fields, json_kv, json_str};
use crate::prompt::{
    GENERATING_PLACEHOLDER, JobEnd, JobEvent, JobUpdate, PromptClient, PromptMode,
    PromptRequest, RequestCycle, SubmitMode,
};
use crate::runtime::{EventFlow, PadPlugin, RuntimeContext, RuntimeEvent};
use crate::session::{PadSession, SessionStore, load_session, save_session};
use crate::transform::{strip_comments, swap_contents};
use crate::width::truncate_to_width;
use crate::workspace::{
    BOTTOM_SPLITTER_ZONE, DragState, LayoutChange, LayoutSettings, LayoutState, PaneId,
    PointerTarget, SIDE_HANDLE_ZONE, SIDE_PANEL_ZONE, STATUS_ZONE, TOP_BAR_ZONE,
    TOP_SPLITTER_ZONE, build_layout,
};
use crate::{LayoutTree, Result, RuntimeMetrics, Size};

pub use clicks::ClickTracker;
pub use prompt_line::{PromptInput, PromptKind, PromptLine};

pub const APP_TARGET: &str = "pad::app";
pub const PROMPT_TARGET: &str = "pad::prompt";
pub const SESSION_TARGET: &str = "pad::session";

const JOB_LOG_LIMIT: usize = 64;
const SCROLL_LINES: usize = 3;

pub struct PadApp<C> {
    layout: LayoutState,
    panes: [TextBuffer; 3],
    cycle: RequestCycle<C>,
    session: Arc<dyn SessionStore>,
    logger: Option<Logger>,
    metrics: Option<Arc<Mutex<RuntimeMetrics>>>,
    title: String,
    status: String,
    prompt: Option<PromptLine>,
    clicks: ClickTracker,
    selecting: Option<PaneId>,
    job_log: VecDeque<String>,
    pending_open: Option<PathBuf>,
    geometry_dirty: bool,
}

impl<C: PromptClient> PadApp<C> {
    pub fn new(
        settings: LayoutSettings,
        viewport: Size,
        cycle: RequestCycle<C>,
        session: Arc<dyn SessionStore>,
    ) -> Self {
        let clicks = ClickTracker::new(Duration::from_millis(settings.double_click_ms));
        Self {
            layout: LayoutState::new(settings, viewport),
            panes: Default::default(),
            cycle,
            session,
            logger: None,
            metrics: None,
            title: DEFAULT_TITLE.to_string(),
            status: "ready".to_string(),
            prompt: None,
            clicks,
            selecting: None,
            job_log: VecDeque::new(),
            pending_open: None,
            geometry_dirty: false,
        }
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn with_metrics(mut self, metrics: Option<Arc<Mutex<RuntimeMetrics>>>) -> Self {
        self.metrics = metrics;
        self
    }

    /// File imported into the code pane once the session is restored.
    pub fn with_initial_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.pending_open = Some(path.into());
        self
    }

    /// Zone tree for the current geometry; hand it to the runtime at start.
    pub fn layout_tree(&self) -> LayoutTree {
        build_layout(&self.layout)
    }

    pub fn layout(&self) -> &LayoutState {
        &self.layout
    }

    pub fn pane(&self, pane: PaneId) -> &TextBuffer {
        &self.panes[pane.index()]
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn prompt_line(&self) -> Option<&PromptLine> {
        self.prompt.as_ref()
    }

    pub fn is_busy(&self) -> bool {
        self.cycle.is_busy()
    }

    fn pane_mut(&mut self, pane: PaneId) -> &mut TextBuffer {
        &mut self.panes[pane.index()]
    }

    fn log(
        &self,
        level: LogLevel,
        target: &str,
        message: &str,
        fields: impl IntoIterator<Item = (String, Value)>,
    ) {
        let Some(logger) = &self.logger else {
            return;
        };
        if logger.enabled(level) {
            let _ = logger.log_event(event_with_fields(level, target, message, fields));
        }
    }

    fn record(&self, update: impl FnOnce(&mut RuntimeMetrics)) {
        if let Some(Ok(mut guard)) = self.metrics.as_ref().map(|metrics| metrics.lock()) {
            update(&mut guard);
        }
    }

    fn push_job_log(&mut self, line: String) {
        if self.job_log.len() == JOB_LOG_LIMIT {
            self.job_log.pop_front();
        }
        self.job_log.push_back(line);
    }

    /// Returns whether the change needs a redraw; geometry changes also
    /// schedule a new layout tree.
    fn track(&mut self, change: LayoutChange) -> bool {
        match change {
            LayoutChange::None => false,
            LayoutChange::Geometry => {
                self.geometry_dirty = true;
                true
            }
            LayoutChange::Focus(_) => true,
        }
    }

    // ----- session ----------------------------------------------------------

    fn restore_session(&mut self) {
        match load_session(self.session.as_ref()) {
            Ok(session) => {
                let restored_heights = session.heights.is_some();
                if let Some(heights) = session.heights {
                    let change = self.layout.restore_heights(heights);
                    self.track(change);
                }
                if let Some(code) = &session.code {
                    self.pane_mut(PaneId::Code).set_value(code);
                }
                if let Some(output) = &session.output {
                    self.pane_mut(PaneId::Output).set_value(output);
                }
                self.log(
                    LogLevel::Debug,
                    SESSION_TARGET,
                    "session_restored",
                    [json_kv("heights", json!(restored_heights))],
                );
            }
            Err(err) => self.log(
                LogLevel::Warn,
                SESSION_TARGET,
                "session_load_failed",
                [json_str("error", err.to_string())],
            ),
        }
    }

    fn persist_session(&self) {
        let session = PadSession {
            heights: Some(self.layout.heights()),
            code: Some(self.pane(PaneId::Code).value()),
            output: Some(self.pane(PaneId::Output).value()),
        };
        match save_session(self.session.as_ref(), &session) {
            Ok(()) => self.log(
                LogLevel::Debug,
                SESSION_TARGET,
                "session_saved",
                std::iter::empty(),
            ),
            Err(err) => self.log(
                LogLevel::Warn,
                SESSION_TARGET,
                "session_save_failed",
                [json_str("error", err.to_string())],
            ),
        }
    }

    // ----- prompt cycle -----------------------------------------------------

    fn submit(&mut self, mode: PromptMode) {
        if let Some(previous) = self.cycle.cancel() {
            self.log(
                LogLevel::Info,
                PROMPT_TARGET,
                "job_superseded",
                [json_str("job", previous.to_string())],
            );
        }

        let request = PromptRequest::capture(
            self.pane(PaneId::Code),
            self.pane(PaneId::Context),
            mode,
        );
        let code_chars = request.code.chars().count();
        let output = self.pane_mut(PaneId::Output);
        output.set_value(GENERATING_PLACEHOLDER);
        output.set_read_only(true);

        let job = self.cycle.start(request);
        let submit_mode = match self.cycle.mode() {
            SubmitMode::Single => "single",
            SubmitMode::Polling => "polling",
        };
        self.status = format!("{job}: generating {} prompt", mode.as_str());
        self.push_job_log(format!("{job} {} started", mode.as_str()));
        self.record(|metrics| metrics.record_prompt_job());
        self.log(
            LogLevel::Info,
            PROMPT_TARGET,
            "job_started",
            [
                json_str("job", job.to_string()),
                json_str("mode", mode.as_str()),
                json_str("submit_mode", submit_mode),
                json_kv("code_chars", json!(code_chars)),
            ],
        );
    }

    fn cancel_job(&mut self) -> bool {
        let Some(job) = self.cycle.cancel() else {
            return false;
        };
        self.pane_mut(PaneId::Output).set_read_only(false);
        self.status = format!("{job}: canceled");
        self.push_job_log(format!("{job} canceled"));
        self.log(
            LogLevel::Info,
            PROMPT_TARGET,
            "job_canceled",
            [json_str("job", job.to_string())],
        );
        true
    }

    fn drain_jobs(&mut self) -> bool {
        let updates = self.cycle.drain();
        let changed = !updates.is_empty();
        for update in updates {
            self.apply_job_update(update);
        }
        changed
    }

    fn apply_job_update(&mut self, JobUpdate { job, event }: JobUpdate) {
        self.record(|metrics| metrics.record_job_update());
        match event {
            JobEvent::Output(body) => {
                let polling = self.cycle.mode() == SubmitMode::Polling;
                let output = self.pane_mut(PaneId::Output);
                output.set_read_only(false);
                output.set_value(&body);
                if polling {
                    output.move_to_end();
                }
                let chars = body.chars().count();
                self.push_job_log(format!("{job} output {chars} chars"));
                self.log(
                    LogLevel::Debug,
                    PROMPT_TARGET,
                    "job_output",
                    [
                        json_str("job", job.to_string()),
                        json_kv("chars", json!(chars)),
                    ],
                );
            }
            JobEvent::Failed(err) => {
                self.status = format!("{job}: {err}");
                self.push_job_log(format!("{job} request failed"));
                self.log(
                    LogLevel::Warn,
                    PROMPT_TARGET,
                    "job_request_failed",
                    [
                        json_str("job", job.to_string()),
                        json_str("error", err.to_string()),
                    ],
                );
            }
            JobEvent::Done(end) => {
                self.pane_mut(PaneId::Output).set_read_only(false);
                let label = end_label(end);
                if end != JobEnd::Failed {
                    self.status = format!("{job}: {label}");
                }
                self.push_job_log(format!("{job} {label}"));
                self.log(
                    LogLevel::Info,
                    PROMPT_TARGET,
                    "job_finished",
                    [
                        json_str("job", job.to_string()),
                        json_str("outcome", label),
                    ],
                );
            }
        }
    }

    // ----- files ------------------------------------------------------------

    fn open_file(&mut self, ctx: &mut RuntimeContext<'_>, path: &Path) {
        match import_file(path) {
            Ok(file) => {
                self.pane_mut(PaneId::Code).set_value(&file.text);
                self.title = file.title;
                ctx.set_title(self.title.clone());
                self.status = format!("opened {}", path.display());
                self.log(
                    LogLevel::Info,
                    APP_TARGET,
                    "file_imported",
                    [json_str("path", path.display().to_string())],
                );
            }
            Err(err) => self.report_file_error("file_import_failed", path, err),
        }
    }

    fn save_file(&mut self, path: &Path) {
        match export_file(path, &self.pane(PaneId::Code).value()) {
            Ok(()) => {
                self.status = format!("saved {}", path.display());
                self.log(
                    LogLevel::Info,
                    APP_TARGET,
                    "file_exported",
                    [json_str("path", path.display().to_string())],
                );
            }
            Err(err) => self.report_file_error("file_export_failed", path, err),
        }
    }

    fn report_file_error(&mut self, message: &str, path: &Path, err: crate::PadError) {
        self.status = format!("{}: {err}", path.display());
        self.log(
            LogLevel::Warn,
            APP_TARGET,
            message,
            [
                json_str("path", path.display().to_string()),
                json_str("error", err.to_string()),
            ],
        );
    }

    fn finish_prompt(&mut self, ctx: &mut RuntimeContext<'_>, kind: PromptKind, value: String) {
        let value = value.trim().to_string();
        match kind {
            PromptKind::OpenFile if !value.is_empty() => self.open_file(ctx, Path::new(&value)),
            PromptKind::SaveAs if !value.is_empty() => self.save_file(Path::new(&value)),
            PromptKind::Title => {
                self.title = if value.is_empty() {
                    DEFAULT_TITLE.to_string()
                } else {
                    value
                };
                ctx.set_title(self.title.clone());
            }
            _ => {}
        }
    }

    // ----- keyboard ---------------------------------------------------------

    fn on_key(&mut self, ctx: &mut RuntimeContext<'_>, key: &KeyEvent) -> bool {
        if key.kind == KeyEventKind::Release {
            return false;
        }

        if let Some(line) = self.prompt.as_mut() {
            match line.handle_key(key) {
                PromptInput::Editing => {}
                PromptInput::Canceled => self.prompt = None,
                PromptInput::Submitted(value) => {
                    let kind = line.kind();
                    self.prompt = None;
                    self.finish_prompt(ctx, kind, value);
                }
            }
            return true;
        }

        if let Some(change) = self.layout.on_key_down(key) {
            self.track(change);
            return true;
        }

        let control = key.modifiers.contains(KeyModifiers::CONTROL)
            && !key.modifiers.contains(KeyModifiers::ALT);
        if let (true, KeyCode::Char(ch)) = (control, key.code) {
            return self.on_command(ctx, ch.to_ascii_lowercase());
        }

        match key.code {
            KeyCode::Tab => {
                let change = self.layout.set_focus(self.layout.focus().next());
                self.track(change)
            }
            KeyCode::BackTab => {
                let change = self.layout.set_focus(self.layout.focus().previous());
                self.track(change)
            }
            KeyCode::Esc => {
                if !self.cancel_job() {
                    let focus = self.layout.focus();
                    self.pane_mut(focus).clear_selection();
                }
                true
            }
            _ => self.edit_focused(key),
        }
    }

    fn on_command(&mut self, ctx: &mut RuntimeContext<'_>, ch: char) -> bool {
        match ch {
            'g' => self.submit(PromptMode::Code),
            'd' => self.submit(PromptMode::Debug),
            'k' => {
                let code = self.pane_mut(PaneId::Code);
                let stripped = strip_comments(&code.value());
                code.set_value(&stripped);
                self.status = "comments stripped".to_string();
            }
            'w' => {
                let [code, _, output] = &mut self.panes;
                swap_contents(code, output);
                self.status = "swapped code and output".to_string();
            }
            'o' => self.prompt = Some(PromptLine::new(PromptKind::OpenFile, "")),
            's' => {
                let suggested = default_export_name(&self.title);
                self.prompt = Some(PromptLine::new(PromptKind::SaveAs, &suggested));
            }
            't' => self.prompt = Some(PromptLine::new(PromptKind::Title, &self.title)),
            'b' => {
                self.layout.side_panel_mut().toggle();
                self.track(LayoutChange::Geometry);
            }
            'a' => {
                let focus = self.layout.focus();
                self.pane_mut(focus).select_all();
            }
            'q' => {
                ctx.request_exit();
                return false;
            }
            _ => return false,
        }
        true
    }

    fn edit_focused(&mut self, key: &KeyEvent) -> bool {
        let focus = self.layout.focus();
        let page = self.layout.heights().get(focus).max(1) as usize;
        let extend = key.modifiers.contains(KeyModifiers::SHIFT);
        let buffer = self.pane_mut(focus);
        match key.code {
            KeyCode::Char(ch)
                if !key
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
            {
                buffer.insert_char(ch)
            }
            KeyCode::Enter => buffer.newline(),
            KeyCode::Backspace => buffer.backspace(),
            KeyCode::Delete => buffer.delete(),
            KeyCode::Left => buffer.move_left(extend),
            KeyCode::Right => buffer.move_right(extend),
            KeyCode::Up => buffer.move_up(1, extend),
            KeyCode::Down => buffer.move_down(1, extend),
            KeyCode::Home => buffer.move_line_start(extend),
            KeyCode::End => buffer.move_line_end(extend),
            KeyCode::PageUp => buffer.move_up(page, extend),
            KeyCode::PageDown => buffer.move_down(page, extend),
            _ => return false,
        }
        true
    }

    fn on_paste(&mut self, text: &str) -> bool {
        match self.prompt.as_mut() {
            Some(line) => line.insert_str(text),
            None => {
                let focus = self.layout.focus();
                self.pane_mut(focus).insert_str(text);
            }
        }
        true
    }

    // ----- pointer ----------------------------------------------------------

    fn on_mouse(&mut self, mouse: &MouseEvent) -> bool {
        let (column, row) = (mouse.column, mouse.row);
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                let target = self.layout.hit_test(column, row);
                let mut redraw = false;
                if let PointerTarget::Pane(pane) = target {
                    if !self.layout.pointer_captured() {
                        let position = self.cell_position(pane, column, row);
                        self.pane_mut(pane).set_cursor(position);
                        self.selecting = Some(pane);
                        redraw = true;
                    }
                }
                let change = self.layout.on_pointer_down(target);
                redraw |= self.track(change);
                if self.clicks.press(target, (column, row), Instant::now()) {
                    let released = self.layout.on_pointer_up();
                    redraw |= self.track(released);
                    let toggled = self.layout.on_double_click(target);
                    redraw |= self.track(toggled);
                    self.selecting = None;
                }
                // Splitter and handle glyphs change while dragging.
                redraw || self.layout.drag() != DragState::Idle
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                if self.layout.pointer_captured() {
                    let change = self.layout.on_pointer_move(column, row);
                    return self.track(change);
                }
                let Some(pane) = self.selecting else {
                    return false;
                };
                let position = self.cell_position(pane, column, row);
                self.pane_mut(pane).extend_to(position);
                true
            }
            MouseEventKind::Up(MouseButton::Left) => {
                let was_dragging = self.layout.pointer_captured();
                self.selecting = None;
                let change = self.layout.on_pointer_up();
                self.track(change) || was_dragging
            }
            MouseEventKind::ScrollUp | MouseEventKind::ScrollDown => {
                let PointerTarget::Pane(pane) = self.layout.hit_test(column, row) else {
                    return false;
                };
                let buffer = self.pane_mut(pane);
                if mouse.kind == MouseEventKind::ScrollUp {
                    buffer.move_up(SCROLL_LINES, false);
                } else {
                    buffer.move_down(SCROLL_LINES, false);
                }
                true
            }
            _ => false,
        }
    }

    /// Buffer position under a screen cell of `pane`, accounting for the
    /// gutter and the current scroll offsets.
    fn cell_position(&self, pane: PaneId, column: u16, row: u16) -> Position {
        let buffer = self.pane(pane);
        let gutter = gutter_width(buffer, view_options(pane, false));
        let (scroll_line, scroll_column) = buffer.scroll();
        let line = scroll_line + row.saturating_sub(self.layout.pane_top(pane)) as usize;
        let column = scroll_column + (column as usize).saturating_sub(gutter);
        Position::new(line, column)
    }

    // ----- drawing ----------------------------------------------------------

    /// Push every zone's content; the registry drops unchanged zones by hash.
    fn refresh(&mut self, ctx: &mut RuntimeContext<'_>) {
        if std::mem::take(&mut self.geometry_dirty) {
            ctx.set_layout(build_layout(&self.layout));
        }

        let width = self.layout.main_width();
        let height = self.layout.viewport().height;
        let focus = self.layout.focus();
        let mut caret = None;

        for pane in PaneId::ALL {
            let rows = self.layout.heights().get(pane);
            let top = self.layout.pane_top(pane);
            let options = view_options(pane, focus == pane && self.prompt.is_none());
            let view = render_buffer(self.pane_mut(pane), width, rows, options);
            if let (true, Some((row, col))) = (rows > 0, view.caret) {
                caret = Some((top + row, col));
            }
            ctx.set_zone_pre_rendered(pane.zone_id(), view.content);
        }

        ctx.set_zone_pre_rendered(
            TOP_BAR_ZONE,
            chrome::top_bar(&self.title, &self.layout, self.cycle.is_busy(), width),
        );
        ctx.set_zone_pre_rendered(
            TOP_SPLITTER_ZONE,
            chrome::splitter(PaneId::Context, &self.layout, width),
        );
        ctx.set_zone_pre_rendered(
            BOTTOM_SPLITTER_ZONE,
            chrome::splitter(PaneId::Output, &self.layout, width),
        );

        let status_row = self.layout.pane_bottom(PaneId::Output);
        match &self.prompt {
            Some(line) => {
                let rendered = line.render();
                ctx.set_zone_pre_rendered(
                    STATUS_ZONE,
                    truncate_to_width(&rendered, width as usize).to_string(),
                );
                let col = (line.caret_column() as u16).min(width.saturating_sub(1));
                caret = Some((status_row, col));
            }
            None => ctx.set_zone_pre_rendered(
                STATUS_ZONE,
                chrome::status_line(&self.status, &self.layout, width),
            ),
        }

        ctx.set_zone_pre_rendered(SIDE_HANDLE_ZONE, chrome::side_handle(&self.layout, height));
        let side_columns = self.layout.side_columns();
        self.layout.side_panel_mut().observe_width(side_columns);
        let content_width = self.layout.side_panel().content_width();
        let jobs: &[String] = self.job_log.make_contiguous();
        ctx.set_zone_pre_rendered(
            SIDE_PANEL_ZONE,
            chrome::side_panel(jobs, content_width, height),
        );

        match caret {
            Some((row, col)) => ctx.set_cursor_hint(row, col),
            None => ctx.hide_cursor(),
        }
    }
}

fn view_options(pane: PaneId, focused: bool) -> ViewOptions {
    ViewOptions {
        line_numbers: pane.has_line_numbers(),
        focused,
    }
}

fn end_label(end: JobEnd) -> &'static str {
    match end {
        JobEnd::Answered => "answered",
        JobEnd::Failed => "failed",
        JobEnd::Poll(outcome) => outcome.as_str(),
    }
}

impl<C: PromptClient> PadPlugin for PadApp<C> {
    fn name(&self) -> &str {
        "pad.app"
    }

    fn init(&mut self, ctx: &mut RuntimeContext<'_>) -> Result<()> {
        if ctx.size() != self.layout.viewport() {
            let change = self.layout.on_resize(ctx.size());
            self.track(change);
        }
        self.restore_session();
        if let Some(path) = self.pending_open.take() {
            self.open_file(ctx, &path);
        }
        ctx.set_title(self.title.clone());
        self.geometry_dirty = true;
        self.refresh(ctx);
        Ok(())
    }

    fn on_event(
        &mut self,
        ctx: &mut RuntimeContext<'_>,
        event: &RuntimeEvent,
    ) -> Result<EventFlow> {
        let (redraw, flow) = match event {
            RuntimeEvent::Key(key) => (self.on_key(ctx, key), EventFlow::Consumed),
            RuntimeEvent::Mouse(mouse) => (self.on_mouse(mouse), EventFlow::Consumed),
            RuntimeEvent::Paste(text) => (self.on_paste(text), EventFlow::Consumed),
            RuntimeEvent::Resize(size) => {
                let change = self.layout.on_resize(*size);
                (self.track(change), EventFlow::Continue)
            }
            RuntimeEvent::Tick { .. } => (self.drain_jobs(), EventFlow::Continue),
            RuntimeEvent::FocusGained | RuntimeEvent::FocusLost => (false, EventFlow::Continue),
        };
        if redraw || self.geometry_dirty {
            self.refresh(ctx);
        }
        Ok(flow)
    }

    fn shutdown(&mut self, _ctx: &mut RuntimeContext<'_>) -> Result<()> {
        self.cancel_job();
        self.persist_session();
        Ok(())
    }
}
