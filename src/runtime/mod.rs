use std::collections::HashMap;
use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event as CrosstermEvent, KeyEvent, MouseEvent};
use crossterm::queue;
use crossterm::terminal::SetTitle;
use serde_json::json;

use crate::logging::{event_with_fields, json_kv};
use crate::{
    AnsiRenderer, LayoutTree, LogLevel, Logger, Rect, Result, RuntimeMetrics, Size, ZoneRegistry,
};

pub mod diagnostics;
pub mod driver;

pub const RUNTIME_TARGET: &str = "pad::runtime";

/// Configuration knobs for the runtime loop.
#[derive(Clone)]
pub struct RuntimeConfig {
    /// Interval between synthetic tick events.
    pub tick_interval: Duration,
    /// Optional structured logger used by the runtime.
    pub logger: Option<Logger>,
    /// Metrics accumulator used for periodic snapshots.
    pub metrics: Option<Arc<Mutex<RuntimeMetrics>>>,
    /// Interval between metrics snapshot emissions. Zero disables snapshots.
    pub metrics_interval: Duration,
    pub metrics_target: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(50),
            logger: None,
            metrics: None,
            metrics_interval: Duration::from_secs(5),
            metrics_target: "pad::runtime.metrics".to_string(),
        }
    }
}

impl RuntimeConfig {
    /// Enable metrics collection if it has not already been configured.
    pub fn enable_metrics(&mut self) {
        if self.metrics.is_none() {
            self.metrics = Some(Arc::new(Mutex::new(RuntimeMetrics::new())));
        }
    }

    pub fn disable_metrics(&mut self) {
        self.metrics = None;
    }

    pub fn metrics_handle(&self) -> Option<Arc<Mutex<RuntimeMetrics>>> {
        self.metrics.as_ref().map(Arc::clone)
    }
}

/// High-level events delivered to plugins.
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    Tick { elapsed: Duration },
    Key(KeyEvent),
    Mouse(MouseEvent),
    Paste(String),
    FocusGained,
    FocusLost,
    Resize(Size),
}

impl RuntimeEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            RuntimeEvent::Tick { .. } => "tick",
            RuntimeEvent::Key(_) => "key",
            RuntimeEvent::Mouse(_) => "mouse",
            RuntimeEvent::Paste(_) => "paste",
            RuntimeEvent::FocusGained => "focus_gained",
            RuntimeEvent::FocusLost => "focus_lost",
            RuntimeEvent::Resize(_) => "resize",
        }
    }
}

/// Control the propagation of an event across plugins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventFlow {
    Continue,
    Consumed,
}

/// Context passed to plugins so they can interact with the runtime safely.
pub struct RuntimeContext<'a> {
    rects: &'a HashMap<String, Rect>,
    size: Size,
    zone_updates: Vec<ZoneUpdate>,
    layout: Option<LayoutTree>,
    redraw_requested: bool,
    exit_requested: bool,
    cursor: Option<Option<(u16, u16)>>,
    title: Option<String>,
}

struct ZoneUpdate {
    zone: String,
    content: String,
    pre_rendered: bool,
}

impl<'a> RuntimeContext<'a> {
    pub(crate) fn new(rects: &'a HashMap<String, Rect>, size: Size) -> Self {
        Self {
            rects,
            size,
            zone_updates: Vec::new(),
            layout: None,
            redraw_requested: false,
            exit_requested: false,
            cursor: None,
            title: None,
        }
    }

    /// Queue plain text for a zone; the renderer wraps it to the zone width.
    pub fn set_zone(&mut self, zone_id: impl Into<String>, content: impl Into<String>) {
        self.push_update(zone_id.into(), content.into(), false);
    }

    /// Queue content already laid out line by line (styling escapes allowed).
    pub fn set_zone_pre_rendered(&mut self, zone_id: impl Into<String>, content: impl Into<String>) {
        self.push_update(zone_id.into(), content.into(), true);
    }

    fn push_update(&mut self, zone: String, content: String, pre_rendered: bool) {
        self.zone_updates.push(ZoneUpdate {
            zone,
            content,
            pre_rendered,
        });
        self.redraw_requested = true;
    }

    /// Replace the layout tree. It is solved against the current size once
    /// the plugin returns, before any queued zone content is applied.
    pub fn set_layout(&mut self, layout: LayoutTree) {
        self.layout = Some(layout);
        self.redraw_requested = true;
    }

    /// Signal to the runtime that execution should terminate at the end of the frame.
    pub fn request_exit(&mut self) {
        self.exit_requested = true;
    }

    /// Where the terminal cursor should be parked after rendering.
    pub fn set_cursor_hint(&mut self, row: u16, col: u16) {
        self.cursor = Some(Some((row, col)));
    }

    pub fn hide_cursor(&mut self) {
        self.cursor = Some(None);
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = Some(title.into());
    }

    pub fn rect(&self, zone_id: &str) -> Option<&Rect> {
        self.rects.get(zone_id)
    }

    /// Smallest solved zone containing the cell, if any.
    pub fn zone_at(&self, column: u16, row: u16) -> Option<&str> {
        self.rects
            .iter()
            .filter(|(_, rect)| rect.contains(column, row))
            .min_by_key(|(_, rect)| rect.width as u32 * rect.height as u32)
            .map(|(id, _)| id.as_str())
    }

    pub fn size(&self) -> Size {
        self.size
    }

    fn into_outcome(self) -> ContextOutcome {
        ContextOutcome {
            zone_updates: self.zone_updates,
            layout: self.layout,
            redraw_requested: self.redraw_requested,
            exit_requested: self.exit_requested,
            cursor: self.cursor,
            title: self.title,
        }
    }
}

struct ContextOutcome {
    zone_updates: Vec<ZoneUpdate>,
    layout: Option<LayoutTree>,
    redraw_requested: bool,
    exit_requested: bool,
    cursor: Option<Option<(u16, u16)>>,
    title: Option<String>,
}

/// Behaviour injection point for the runtime.
pub trait PadPlugin {
    fn name(&self) -> &str {
        "pad_plugin"
    }

    fn init(&mut self, _ctx: &mut RuntimeContext<'_>) -> Result<()> {
        Ok(())
    }

    fn on_event(
        &mut self,
        _ctx: &mut RuntimeContext<'_>,
        _event: &RuntimeEvent,
    ) -> Result<EventFlow> {
        Ok(EventFlow::Continue)
    }

    fn before_render(&mut self, _ctx: &mut RuntimeContext<'_>) -> Result<()> {
        Ok(())
    }

    fn after_render(&mut self, _ctx: &mut RuntimeContext<'_>) -> Result<()> {
        Ok(())
    }

    /// Called once when the loop ends, including after an error.
    fn shutdown(&mut self, _ctx: &mut RuntimeContext<'_>) -> Result<()> {
        Ok(())
    }
}

pub struct PadRuntime {
    layout: LayoutTree,
    size: Size,
    rects: HashMap<String, Rect>,
    registry: ZoneRegistry,
    renderer: AnsiRenderer,
    plugins: Vec<Box<dyn PadPlugin>>,
    config: RuntimeConfig,
    should_exit: bool,
    redraw_requested: bool,
    cursor_dirty: bool,
    pending_title: Option<String>,
    start_instant: Option<Instant>,
    last_metrics_emit: Option<Instant>,
}

impl PadRuntime {
    pub fn new(layout: LayoutTree, renderer: AnsiRenderer, initial_size: Size) -> Result<Self> {
        let mut registry = ZoneRegistry::new();
        let rects = layout.solve(initial_size)?;
        registry.sync_layout(&rects);

        Ok(Self {
            layout,
            size: initial_size,
            rects,
            registry,
            renderer,
            plugins: Vec::new(),
            config: RuntimeConfig::default(),
            should_exit: false,
            redraw_requested: true,
            cursor_dirty: false,
            pending_title: None,
            start_instant: None,
            last_metrics_emit: None,
        })
    }

    pub fn config_mut(&mut self) -> &mut RuntimeConfig {
        &mut self.config
    }

    pub fn register_plugin<P>(&mut self, plugin: P)
    where
        P: PadPlugin + 'static,
    {
        self.plugins.push(Box::new(plugin));
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn rect(&self, zone_id: &str) -> Option<Rect> {
        self.rects.get(zone_id).copied()
    }

    /// Re-solve for a new terminal size without notifying plugins; used
    /// before the loop starts.
    pub fn resize(&mut self, size: Size) -> Result<()> {
        self.handle_resize(size)
    }

    pub fn run(&mut self, stdout: &mut impl Write) -> Result<()> {
        let result = self.bootstrap(stdout).and_then(|()| self.terminal_loop(stdout));
        let finalized = self.finalize();
        result.and(finalized)
    }

    fn terminal_loop(&mut self, stdout: &mut impl Write) -> Result<()> {
        let mut last_tick = Instant::now();

        while !self.should_exit {
            let timeout = self
                .config
                .tick_interval
                .checked_sub(last_tick.elapsed())
                .unwrap_or_else(|| Duration::from_millis(0));

            if event::poll(timeout)? {
                let crossterm_event = event::read()?;
                let runtime_event = self.map_event(crossterm_event)?;
                self.dispatch_event(runtime_event)?;
                self.render_if_needed(stdout)?;
                if self.should_exit {
                    break;
                }
            }

            if last_tick.elapsed() >= self.config.tick_interval {
                let now = Instant::now();
                let elapsed = now.duration_since(last_tick);
                last_tick = now;
                self.dispatch_event(RuntimeEvent::Tick { elapsed })?;
                self.render_if_needed(stdout)?;
            }

            self.maybe_emit_metrics();
        }
        Ok(())
    }

    /// Drive the loop from a fixed event list instead of the terminal.
    pub fn run_scripted<I>(&mut self, stdout: &mut impl Write, events: I) -> Result<()>
    where
        I: IntoIterator<Item = RuntimeEvent>,
    {
        let result = self
            .bootstrap(stdout)
            .and_then(|()| self.scripted_loop(stdout, events));
        let finalized = self.finalize();
        result.and(finalized)
    }

    fn scripted_loop<I>(&mut self, stdout: &mut impl Write, events: I) -> Result<()>
    where
        I: IntoIterator<Item = RuntimeEvent>,
    {
        for event in events.into_iter() {
            if let RuntimeEvent::Resize(size) = event {
                self.handle_resize(size)?;
            }
            self.dispatch_event(event)?;
            self.render_if_needed(stdout)?;
            if self.should_exit {
                break;
            }
        }
        Ok(())
    }

    fn dispatch_event(&mut self, event: RuntimeEvent) -> Result<()> {
        let mut consumed = false;
        for idx in 0..self.plugins.len() {
            let (flow, outcome) = {
                let plugin = &mut self.plugins[idx];
                let mut ctx = RuntimeContext::new(&self.rects, self.size);
                let flow = plugin.on_event(&mut ctx, &event)?;
                (flow, ctx.into_outcome())
            };
            self.apply_outcome(outcome)?;
            if matches!(flow, EventFlow::Consumed) {
                consumed = true;
                break;
            }
        }
        self.record_metric(|metrics| metrics.record_event());
        if !matches!(event, RuntimeEvent::Tick { .. }) {
            self.log_runtime_event(
                LogLevel::Trace,
                "event_dispatched",
                [
                    json_kv("event", json!(event.kind())),
                    json_kv("consumed", json!(consumed)),
                ],
            );
        }
        self.maybe_emit_metrics();
        Ok(())
    }

    fn render_if_needed(&mut self, stdout: &mut impl Write) -> Result<()> {
        if !self.redraw_requested && !self.cursor_dirty && self.pending_title.is_none() {
            return Ok(());
        }
        self.redraw_requested = false;

        for idx in 0..self.plugins.len() {
            let outcome = {
                let plugin = &mut self.plugins[idx];
                let mut ctx = RuntimeContext::new(&self.rects, self.size);
                plugin.before_render(&mut ctx)?;
                ctx.into_outcome()
            };
            self.apply_outcome(outcome)?;
        }

        if let Some(title) = self.pending_title.take() {
            queue!(stdout, SetTitle(title))?;
        }

        let dirty = self.registry.take_dirty();
        if !dirty.is_empty() || self.cursor_dirty {
            self.cursor_dirty = false;
            self.renderer.render(stdout, &dirty)?;
            self.record_metric(|metrics| metrics.record_render(dirty.len()));
            self.log_runtime_event(
                LogLevel::Trace,
                "render_completed",
                [json_kv("dirty_zones", json!(dirty.len()))],
            );
        } else {
            stdout.flush()?;
        }

        for idx in 0..self.plugins.len() {
            let outcome = {
                let plugin = &mut self.plugins[idx];
                let mut ctx = RuntimeContext::new(&self.rects, self.size);
                plugin.after_render(&mut ctx)?;
                ctx.into_outcome()
            };
            self.apply_outcome(outcome)?;
        }

        if self.registry.has_dirty() {
            self.redraw_requested = true;
        }

        Ok(())
    }

    fn apply_outcome(&mut self, outcome: ContextOutcome) -> Result<()> {
        let ContextOutcome {
            zone_updates,
            layout,
            redraw_requested,
            exit_requested,
            cursor,
            title,
        } = outcome;

        if let Some(layout) = layout {
            self.replace_layout(layout)?;
        }

        let update_count = zone_updates.len();
        if update_count > 0 {
            for update in zone_updates {
                self.registry
                    .apply_content(&update.zone, update.content, update.pre_rendered)?;
            }
            self.record_metric(|metrics| metrics.record_zone_updates(update_count));
            self.redraw_requested = true;
        }

        if redraw_requested {
            self.redraw_requested = true;
        }

        if let Some(cursor) = cursor {
            let settings = self.renderer.settings_mut();
            if settings.restore_cursor != cursor {
                settings.restore_cursor = cursor;
                self.cursor_dirty = true;
            }
        }

        if title.is_some() {
            self.pending_title = title;
        }

        if exit_requested {
            self.should_exit = true;
            self.log_runtime_event(LogLevel::Info, "exit_requested", std::iter::empty());
        }

        Ok(())
    }

    fn map_event(&mut self, event: CrosstermEvent) -> Result<RuntimeEvent> {
        match event {
            CrosstermEvent::Key(key) => Ok(RuntimeEvent::Key(key)),
            CrosstermEvent::Mouse(mouse) => Ok(RuntimeEvent::Mouse(mouse)),
            CrosstermEvent::Paste(data) => Ok(RuntimeEvent::Paste(data)),
            CrosstermEvent::FocusGained => Ok(RuntimeEvent::FocusGained),
            CrosstermEvent::FocusLost => Ok(RuntimeEvent::FocusLost),
            CrosstermEvent::Resize(width, height) => {
                let size = Size::new(width, height);
                self.handle_resize(size)?;
                Ok(RuntimeEvent::Resize(size))
            }
        }
    }

    fn replace_layout(&mut self, layout: LayoutTree) -> Result<()> {
        self.rects = layout.solve(self.size)?;
        self.layout = layout;
        self.registry.sync_layout(&self.rects);
        self.redraw_requested = true;
        self.record_metric(|metrics| metrics.record_layout_pass());
        Ok(())
    }

    fn handle_resize(&mut self, size: Size) -> Result<()> {
        self.size = size;
        self.rects = self.layout.solve(size)?;
        self.registry.sync_layout(&self.rects);
        // The terminal may have reflowed or cleared what was on screen.
        self.registry.invalidate_all();
        self.redraw_requested = true;
        self.record_metric(|metrics| metrics.record_layout_pass());
        self.log_runtime_event(
            LogLevel::Info,
            "resized",
            [
                json_kv("width", json!(size.width)),
                json_kv("height", json!(size.height)),
            ],
        );
        Ok(())
    }

    fn bootstrap(&mut self, stdout: &mut impl Write) -> Result<()> {
        self.should_exit = false;
        self.redraw_requested = true;
        self.ensure_metrics_initialized();
        let now = Instant::now();
        self.start_instant = Some(now);
        self.last_metrics_emit = Some(now);
        self.log_runtime_event(
            LogLevel::Info,
            "runtime_started",
            [
                json_kv("plugins", json!(self.plugins.len())),
                json_kv("zones", json!(self.rects.len())),
                json_kv("width", json!(self.size.width)),
                json_kv("height", json!(self.size.height)),
            ],
        );

        for idx in 0..self.plugins.len() {
            let outcome = {
                let plugin = &mut self.plugins[idx];
                let plugin_name = plugin.name().to_string();
                let mut ctx = RuntimeContext::new(&self.rects, self.size);
                plugin.init(&mut ctx)?;
                self.log_runtime_event(
                    LogLevel::Debug,
                    "plugin_initialized",
                    [json_kv("plugin", json!(plugin_name))],
                );
                ctx.into_outcome()
            };
            self.apply_outcome(outcome)?;
        }

        self.render_if_needed(stdout)
    }

    /// Give every plugin its shutdown call even if an earlier one fails;
    /// the first error is returned.
    fn finalize(&mut self) -> Result<()> {
        let mut first_error = None;
        for plugin in self.plugins.iter_mut() {
            let mut ctx = RuntimeContext::new(&self.rects, self.size);
            if let Err(err) = plugin.shutdown(&mut ctx) {
                first_error.get_or_insert(err);
            }
        }

        let uptime_ms = self
            .start_instant
            .map(|start| start.elapsed().as_millis())
            .unwrap_or(0);
        self.log_runtime_event(
            LogLevel::Info,
            "runtime_stopped",
            [json_kv("uptime_ms", json!(uptime_ms))],
        );

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn ensure_metrics_initialized(&mut self) {
        if self.config.metrics.is_none() && self.config.metrics_interval > Duration::from_millis(0)
        {
            self.config.metrics = Some(Arc::new(Mutex::new(RuntimeMetrics::new())));
        }
    }

    fn log_runtime_event<I>(&self, level: LogLevel, message: &str, fields: I)
    where
        I: IntoIterator<Item = (String, serde_json::Value)>,
    {
        if let Some(logger) = self.config.logger.as_ref() {
            if !logger.enabled(level) {
                return;
            }
            let event = event_with_fields(level, RUNTIME_TARGET, message, fields);
            let _ = logger.log_event(event);
        }
    }

    fn record_metric(&self, record: impl FnOnce(&mut RuntimeMetrics)) {
        if let Some(metrics) = self.config.metrics.as_ref() {
            if let Ok(mut guard) = metrics.lock() {
                record(&mut guard);
            }
        }
    }

    fn maybe_emit_metrics(&mut self) {
        if self.config.metrics.is_none() {
            return;
        }

        if self.config.metrics_interval == Duration::from_millis(0) {
            return;
        }

        let now = Instant::now();
        match self.last_metrics_emit {
            Some(last) if now.duration_since(last) < self.config.metrics_interval => {
                return;
            }
            _ => {
                self.last_metrics_emit = Some(now);
            }
        }

        let uptime = self
            .start_instant
            .map(|start| now.duration_since(start))
            .unwrap_or_default();

        if let (Some(logger), Some(metrics)) =
            (self.config.logger.as_ref(), self.config.metrics.as_ref())
        {
            if let Ok(guard) = metrics.lock() {
                let target = self.config.metrics_target.as_str();
                let snapshot_event = guard.snapshot(uptime).to_log_event(target);
                let _ = logger.log_event(snapshot_event);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{Constraint, Direction, LayoutNode};
    use crate::logging::MemorySink;
    use crossterm::event::{KeyCode, KeyModifiers};

    fn two_row_layout(top: u16) -> LayoutTree {
        LayoutTree::new(
            LayoutNode::container("root", Direction::Column)
                .with_child(Constraint::Fixed(top), LayoutNode::leaf("top"))
                .with_child(Constraint::Flex(1), LayoutNode::leaf("bottom")),
        )
    }

    #[derive(Default)]
    struct Recorder {
        seen: Arc<Mutex<Vec<&'static str>>>,
        shutdowns: Arc<Mutex<usize>>,
    }

    impl PadPlugin for Recorder {
        fn init(&mut self, ctx: &mut RuntimeContext<'_>) -> Result<()> {
            ctx.set_zone("top", "hello");
            ctx.set_title("pad");
            Ok(())
        }

        fn on_event(
            &mut self,
            ctx: &mut RuntimeContext<'_>,
            event: &RuntimeEvent,
        ) -> Result<EventFlow> {
            self.seen.lock().unwrap().push(event.kind());
            if let RuntimeEvent::Key(key) = event {
                match key.code {
                    KeyCode::Char('q') => ctx.request_exit(),
                    KeyCode::Char('l') => ctx.set_layout(two_row_layout(3)),
                    KeyCode::Char('c') => ctx.set_cursor_hint(2, 4),
                    _ => {}
                }
                return Ok(EventFlow::Consumed);
            }
            Ok(EventFlow::Continue)
        }

        fn shutdown(&mut self, _ctx: &mut RuntimeContext<'_>) -> Result<()> {
            *self.shutdowns.lock().unwrap() += 1;
            Ok(())
        }
    }

    fn key(ch: char) -> RuntimeEvent {
        RuntimeEvent::Key(KeyEvent::new(KeyCode::Char(ch), KeyModifiers::NONE))
    }

    #[test]
    fn scripted_run_renders_and_stops_on_exit() {
        let recorder = Recorder::default();
        let seen = Arc::clone(&recorder.seen);
        let shutdowns = Arc::clone(&recorder.shutdowns);

        let mut runtime =
            PadRuntime::new(two_row_layout(1), AnsiRenderer::with_default(), Size::new(20, 4))
                .unwrap();
        runtime.register_plugin(recorder);

        let mut out = Vec::new();
        runtime
            .run_scripted(&mut out, [key('x'), key('q'), key('y')])
            .unwrap();

        let screen = String::from_utf8(out).unwrap();
        assert!(screen.contains("hello"));
        assert!(screen.contains("\u{1b}]0;pad\u{7}"));
        assert_eq!(*seen.lock().unwrap(), vec!["key", "key"]);
        assert_eq!(*shutdowns.lock().unwrap(), 1);
    }

    #[test]
    fn plugins_can_replace_the_layout() {
        let mut runtime =
            PadRuntime::new(two_row_layout(1), AnsiRenderer::with_default(), Size::new(20, 6))
                .unwrap();
        runtime.register_plugin(Recorder::default());
        let mut out = Vec::new();
        runtime.run_scripted(&mut out, [key('l')]).unwrap();
        assert_eq!(runtime.rect("bottom").unwrap().y, 3);
    }

    #[test]
    fn resize_resolves_and_cursor_moves_render() {
        let mut runtime =
            PadRuntime::new(two_row_layout(1), AnsiRenderer::with_default(), Size::new(20, 6))
                .unwrap();
        runtime.register_plugin(Recorder::default());
        let mut out = Vec::new();
        runtime
            .run_scripted(&mut out, [RuntimeEvent::Resize(Size::new(30, 10)), key('c')])
            .unwrap();
        assert_eq!(runtime.size(), Size::new(30, 10));
        assert_eq!(runtime.rect("bottom").unwrap().height, 9);
        let screen = String::from_utf8(out).unwrap();
        assert!(screen.ends_with("\u{1b}[3;5H\u{1b}[?25h"));
    }

    #[test]
    fn runtime_logs_lifecycle() {
        let sink = MemorySink::new();
        let mut runtime =
            PadRuntime::new(two_row_layout(1), AnsiRenderer::with_default(), Size::new(20, 4))
                .unwrap();
        runtime.config_mut().logger = Some(Logger::new(sink.clone()));
        runtime.run_scripted(&mut Vec::new(), [key('q')]).unwrap();

        let messages = sink.messages();
        assert_eq!(messages.first().map(String::as_str), Some("runtime_started"));
        assert_eq!(messages.last().map(String::as_str), Some("runtime_stopped"));
    }
}
