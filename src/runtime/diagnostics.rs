use crossterm::event::{KeyEventKind, MouseEventKind};
use serde_json::json;

use crate::Result;
use crate::logging::{LogLevel, Logger, event_with_fields, json_kv};

use super::{EventFlow, PadPlugin, RuntimeContext, RuntimeEvent};

pub const LIFECYCLE_TARGET: &str = "pad::runtime.lifecycle";

/// Logs input and lifecycle events. Never consumes anything, so register
/// it first to see every event.
pub struct LifecycleLoggerPlugin {
    logger: Logger,
    level: LogLevel,
    log_keys: bool,
    log_mouse: bool,
    log_ticks: bool,
}

impl LifecycleLoggerPlugin {
    pub fn new(logger: Logger) -> Self {
        Self {
            logger,
            level: LogLevel::Debug,
            log_keys: false,
            log_mouse: false,
            log_ticks: false,
        }
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    pub fn log_keys(mut self, enabled: bool) -> Self {
        self.log_keys = enabled;
        self
    }

    /// Mouse logging skips plain motion; drags, clicks and scrolls are kept.
    pub fn log_mouse(mut self, enabled: bool) -> Self {
        self.log_mouse = enabled;
        self
    }

    pub fn log_ticks(mut self, enabled: bool) -> Self {
        self.log_ticks = enabled;
        self
    }

    fn emit(&self, message: &str, fields: impl IntoIterator<Item = (String, serde_json::Value)>) {
        if !self.logger.enabled(self.level) {
            return;
        }
        let event = event_with_fields(self.level, LIFECYCLE_TARGET, message, fields);
        let _ = self.logger.log_event(event);
    }
}

impl PadPlugin for LifecycleLoggerPlugin {
    fn name(&self) -> &str {
        "diagnostics.lifecycle_logger"
    }

    fn init(&mut self, ctx: &mut RuntimeContext<'_>) -> Result<()> {
        let size = ctx.size();
        self.emit(
            "plugin_initialized",
            [
                json_kv("width", json!(size.width)),
                json_kv("height", json!(size.height)),
            ],
        );
        Ok(())
    }

    fn on_event(
        &mut self,
        ctx: &mut RuntimeContext<'_>,
        event: &RuntimeEvent,
    ) -> Result<EventFlow> {
        match event {
            RuntimeEvent::Key(key) if self.log_keys && key.kind != KeyEventKind::Release => {
                self.emit(
                    "event.key",
                    [
                        json_kv("code", json!(format!("{:?}", key.code))),
                        json_kv("modifiers", json!(format!("{:?}", key.modifiers))),
                    ],
                );
            }
            RuntimeEvent::Mouse(mouse)
                if self.log_mouse && !matches!(mouse.kind, MouseEventKind::Moved) =>
            {
                let zone = ctx.zone_at(mouse.column, mouse.row).map(str::to_string);
                self.emit(
                    "event.mouse",
                    [
                        json_kv("kind", json!(format!("{:?}", mouse.kind))),
                        json_kv("column", json!(mouse.column)),
                        json_kv("row", json!(mouse.row)),
                        json_kv("zone", json!(zone)),
                    ],
                );
            }
            RuntimeEvent::Paste(data) => {
                self.emit("event.paste", [json_kv("chars", json!(data.chars().count()))]);
            }
            RuntimeEvent::Tick { elapsed } if self.log_ticks => {
                self.emit(
                    "event.tick",
                    [json_kv("elapsed_ms", json!(elapsed.as_millis() as u64))],
                );
            }
            RuntimeEvent::FocusGained => self.emit("event.focus_gained", std::iter::empty()),
            RuntimeEvent::FocusLost => self.emit("event.focus_lost", std::iter::empty()),
            RuntimeEvent::Resize(size) => {
                self.emit(
                    "event.resize",
                    [
                        json_kv("width", json!(size.width)),
                        json_kv("height", json!(size.height)),
                    ],
                );
            }
            _ => {}
        }

        Ok(EventFlow::Continue)
    }

    fn shutdown(&mut self, _ctx: &mut RuntimeContext<'_>) -> Result<()> {
        self.emit("plugin_shutdown", std::iter::empty());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Size;
    use crate::layout::{Constraint, Direction, LayoutNode, LayoutTree};
    use crate::logging::MemorySink;
    use crate::render::AnsiRenderer;
    use crate::runtime::PadRuntime;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent};

    fn runtime() -> PadRuntime {
        let layout = LayoutTree::new(
            LayoutNode::container("root", Direction::Row)
                .with_child(Constraint::Fixed(5), LayoutNode::leaf("left"))
                .with_child(Constraint::Flex(1), LayoutNode::leaf("right")),
        );
        PadRuntime::new(layout, AnsiRenderer::with_default(), Size::new(20, 4)).unwrap()
    }

    fn mouse(kind: MouseEventKind, column: u16) -> RuntimeEvent {
        RuntimeEvent::Mouse(MouseEvent {
            kind,
            column,
            row: 1,
            modifiers: KeyModifiers::NONE,
        })
    }

    #[test]
    fn mouse_events_name_the_zone_and_skip_motion() {
        let sink = MemorySink::new();
        let mut runtime = runtime();
        runtime.register_plugin(LifecycleLoggerPlugin::new(Logger::new(sink.clone())).log_mouse(true));
        runtime
            .run_scripted(
                &mut Vec::new(),
                [
                    mouse(MouseEventKind::Moved, 2),
                    mouse(MouseEventKind::Down(MouseButton::Left), 8),
                ],
            )
            .unwrap();

        let events = sink.events();
        let clicks: Vec<_> = events.iter().filter(|e| e.message == "event.mouse").collect();
        assert_eq!(clicks.len(), 1);
        assert_eq!(clicks[0].fields["zone"], "right");
        assert_eq!(events.last().unwrap().message, "plugin_shutdown");
    }

    #[test]
    fn keys_are_quiet_unless_enabled() {
        let sink = MemorySink::new();
        let mut runtime = runtime();
        runtime.register_plugin(LifecycleLoggerPlugin::new(Logger::new(sink.clone())));
        let key = RuntimeEvent::Key(KeyEvent::new(KeyCode::Char('a'), KeyModifiers::NONE));
        runtime.run_scripted(&mut Vec::new(), [key]).unwrap();
        assert!(!sink.messages().iter().any(|m| m == "event.key"));
    }
}
