use std::{
    env, fs, io,
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Position, Rect},
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
};

use rich_edit::editor::{
    CaretMoveIntent, FontStyle, FontWeight, MouseAction, TextAlign, TextDecoration,
    TextSpanOptions, UpdateParagraphStyle, UpdateSpanStyle,
};
use rich_edit::editor_display::{EditorDisplay, terminal_config};
use rich_edit::host::DirtyFlag;
use rich_edit::services::{EntityScanner, MemoryClipboard};

const STATUS_TIMEOUT: Duration = Duration::from_secs(4);
const MOUSE_SCROLL_LINES: isize = 3;
const LOG_FILE_VAR: &str = "RICH_EDIT_LOG";

fn main() -> Result<()> {
    run()
}

fn editor_wrap_configuration(width: usize) -> (usize, usize) {
    if width == 0 {
        return (1, 0);
    }
    if width < 60 {
        let wrap_width = width.saturating_sub(1).max(1);
        return (wrap_width, 0);
    }
    if width < 100 {
        let padding = 2.min(width / 2);
        let wrap_width = width.saturating_sub(padding.saturating_mul(2)).max(1);
        return (wrap_width, padding);
    }
    let mut left_padding = width.saturating_sub(100) / 2 + 4;
    let max_padding = width.saturating_sub(1) / 2;
    if left_padding > max_padding {
        left_padding = max_padding;
    }
    let wrap_width = width.saturating_sub(left_padding.saturating_mul(2)).max(1);
    (wrap_width, left_padding)
}

/// The terminal belongs to the UI, so log records only go to the file named
/// by `RICH_EDIT_LOG`.
fn init_logging() -> Result<()> {
    let Some(path) = env::var_os(LOG_FILE_VAR) else {
        return Ok(());
    };
    let file = fs::File::create(&path)
        .with_context(|| format!("failed to create log file {}", Path::new(&path).display()))?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

fn run() -> Result<()> {
    let mut args = env::args().skip(1);
    let Some(path_arg) = args.next() else {
        eprintln!("Usage: rich-edit <file.txt>");
        return Ok(());
    };
    init_logging()?;
    let path = PathBuf::from(path_arg);

    let (content, initial_status) = load_document(&path)?;
    let mut app = App::new(content, path, initial_status);

    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
        .context("failed to initialize terminal")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("failed to create terminal backend")?;
    terminal.clear().ok();

    let res = run_app(&mut terminal, &mut app).context("application error");

    disable_raw_mode().ok();
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )
    .ok();
    terminal.show_cursor().ok();

    res
}

fn load_document(path: &Path) -> Result<(String, Option<String>)> {
    if path.exists() {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Ok((content, None))
    } else {
        Ok((String::new(), Some("New document".to_string())))
    }
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    let tick_rate = Duration::from_millis(50);
    let mut last_tick = Instant::now();
    let mut needs_redraw = true;

    while !app.should_quit() {
        if needs_redraw {
            terminal
                .draw(|frame| app.draw(frame))
                .context("failed to draw frame")?;
            needs_redraw = false;
        }

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));

        if event::poll(timeout).context("event poll failed")? {
            let evt = event::read().context("failed to read event")?;
            if let Event::Resize(_, _) = evt {
                needs_redraw = true;
                continue;
            }
            app.handle_event(evt)?;
            needs_redraw = true;
        }

        if last_tick.elapsed() >= tick_rate {
            let had_message_before = app.has_status_message();
            app.on_tick();
            last_tick = Instant::now();
            if had_message_before && !app.has_status_message() {
                needs_redraw = true;
            }
        }

        // Caret blink and auto-scroll only touch the host's dirty flags.
        if app.take_host_dirty() {
            needs_redraw = true;
        }
    }

    Ok(())
}

#[derive(Clone, Copy)]
enum MenuAction {
    ApplySpanStyle(SpanStyleAction),
    Align(TextAlign),
    Cut,
    Copy,
    Paste,
    SelectAll,
    ToggleEntityDetection,
}

#[derive(Clone, Copy)]
enum SpanStyleAction {
    Bold,
    Italic,
    Underline,
    Strikethrough,
    ClearFormatting,
}

impl SpanStyleAction {
    fn update(self) -> UpdateSpanStyle {
        match self {
            SpanStyleAction::Bold => UpdateSpanStyle {
                font_weight: Some(FontWeight::Bold),
                ..UpdateSpanStyle::default()
            },
            SpanStyleAction::Italic => UpdateSpanStyle {
                font_style: Some(FontStyle::Italic),
                ..UpdateSpanStyle::default()
            },
            SpanStyleAction::Underline => UpdateSpanStyle {
                decoration: Some(TextDecoration::Underline),
                ..UpdateSpanStyle::default()
            },
            SpanStyleAction::Strikethrough => UpdateSpanStyle {
                decoration: Some(TextDecoration::LineThrough),
                ..UpdateSpanStyle::default()
            },
            SpanStyleAction::ClearFormatting => UpdateSpanStyle {
                font_weight: Some(FontWeight::Normal),
                font_style: Some(FontStyle::Normal),
                decoration: Some(TextDecoration::None),
                ..UpdateSpanStyle::default()
            },
        }
    }
}

#[derive(Clone, Copy)]
struct MenuShortcut {
    key: char,
    requires_shift: bool,
}

impl MenuShortcut {
    const fn new(key: char) -> Self {
        Self {
            key,
            requires_shift: false,
        }
    }

    const fn with_shift(key: char) -> Self {
        Self {
            key,
            requires_shift: true,
        }
    }

    fn matches(&self, code: KeyCode, modifiers: KeyModifiers) -> bool {
        match code {
            KeyCode::Char(ch) if ch == self.key => {
                if self.requires_shift {
                    modifiers == KeyModifiers::SHIFT
                } else {
                    modifiers.is_empty()
                }
            }
            _ => false,
        }
    }
}

#[derive(Clone, Copy)]
struct MenuItem {
    label: &'static str,
    action: Option<MenuAction>,
    shortcut: Option<MenuShortcut>,
}

impl MenuItem {
    fn enabled_with_shortcut(
        label: &'static str,
        action: MenuAction,
        shortcut: MenuShortcut,
    ) -> Self {
        Self {
            label,
            action: Some(action),
            shortcut: Some(shortcut),
        }
    }

    fn disabled_with_shortcut(label: &'static str, shortcut: MenuShortcut) -> Self {
        Self {
            label,
            action: None,
            shortcut: Some(shortcut),
        }
    }

    fn when(enabled: bool, label: &'static str, action: MenuAction, shortcut: MenuShortcut) -> Self {
        if enabled {
            Self::enabled_with_shortcut(label, action, shortcut)
        } else {
            Self::disabled_with_shortcut(label, shortcut)
        }
    }

    fn is_enabled(&self) -> bool {
        self.action.is_some()
    }
}

enum MenuEntry {
    Section(&'static str),
    Separator,
    Item(MenuItem),
}

struct ContextMenuState {
    entries: Vec<MenuEntry>,
    selected_index: usize,
}

impl ContextMenuState {
    fn new(entries: Vec<MenuEntry>) -> Self {
        let selected_index = entries
            .iter()
            .enumerate()
            .find(|(_, entry)| matches!(entry, MenuEntry::Item(item) if item.is_enabled()))
            .map(|(idx, _)| idx)
            .unwrap_or(0);
        Self {
            entries,
            selected_index,
        }
    }

    fn move_selection(&mut self, delta: i32) {
        if self.entries.is_empty() {
            return;
        }

        let len = self.entries.len() as i32;
        let mut idx = self.selected_index as i32;

        for _ in 0..len {
            idx = (idx + delta).rem_euclid(len);
            if matches!(self.entries[idx as usize], MenuEntry::Item(_)) {
                self.selected_index = idx as usize;
                break;
            }
        }
    }

    fn current_action(&self) -> Option<MenuAction> {
        match self.entries.get(self.selected_index) {
            Some(MenuEntry::Item(item)) => item.action,
            _ => None,
        }
    }

    fn entries(&self) -> &[MenuEntry] {
        &self.entries
    }

    fn selected_index(&self) -> usize {
        self.selected_index
    }

    fn shortcut_action(
        &mut self,
        code: KeyCode,
        modifiers: KeyModifiers,
    ) -> (bool, Option<MenuAction>) {
        for (idx, entry) in self.entries.iter().enumerate() {
            if let MenuEntry::Item(item) = entry
                && let Some(shortcut) = item.shortcut
                && shortcut.matches(code, modifiers)
            {
                self.selected_index = idx;
                return (true, item.action);
            }
        }
        (false, None)
    }
}

fn build_context_menu_entries(has_selection: bool, detection_enabled: bool) -> Vec<MenuEntry> {
    let style = |label, action, shortcut| {
        MenuEntry::Item(MenuItem::when(
            has_selection,
            label,
            MenuAction::ApplySpanStyle(action),
            shortcut,
        ))
    };
    let align = |label, align, key| {
        MenuEntry::Item(MenuItem::enabled_with_shortcut(
            label,
            MenuAction::Align(align),
            MenuShortcut::new(key),
        ))
    };
    vec![
        MenuEntry::Section("Inline style"),
        style("Bold", SpanStyleAction::Bold, MenuShortcut::new('b')),
        style("Italic", SpanStyleAction::Italic, MenuShortcut::new('i')),
        style("Underline", SpanStyleAction::Underline, MenuShortcut::new('u')),
        style(
            "Strikethrough",
            SpanStyleAction::Strikethrough,
            MenuShortcut::with_shift('X'),
        ),
        style(
            "Clear Formatting",
            SpanStyleAction::ClearFormatting,
            MenuShortcut::new('\\'),
        ),
        MenuEntry::Separator,
        MenuEntry::Section("Paragraph"),
        align("Align start", TextAlign::Start, 'l'),
        align("Center", TextAlign::Center, 'e'),
        align("Align end", TextAlign::End, 'r'),
        align("Justify", TextAlign::Justify, 'j'),
        MenuEntry::Separator,
        MenuEntry::Section("Copy & paste"),
        MenuEntry::Item(MenuItem::when(
            has_selection,
            "Cut",
            MenuAction::Cut,
            MenuShortcut::new('x'),
        )),
        MenuEntry::Item(MenuItem::when(
            has_selection,
            "Copy",
            MenuAction::Copy,
            MenuShortcut::new('c'),
        )),
        MenuEntry::Item(MenuItem::enabled_with_shortcut(
            "Paste",
            MenuAction::Paste,
            MenuShortcut::new('v'),
        )),
        MenuEntry::Item(MenuItem::enabled_with_shortcut(
            "Select all",
            MenuAction::SelectAll,
            MenuShortcut::new('a'),
        )),
        MenuEntry::Separator,
        MenuEntry::Item(MenuItem::enabled_with_shortcut(
            if detection_enabled {
                "Hide entities"
            } else {
                "Detect entities"
            },
            MenuAction::ToggleEntityDetection,
            MenuShortcut::new('d'),
        )),
    ]
}

fn is_context_menu_shortcut(code: KeyCode, modifiers: KeyModifiers) -> bool {
    match code {
        KeyCode::Esc => modifiers.is_empty(),
        KeyCode::Char(' ') => modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}

#[derive(Clone, Debug)]
struct ScrollbarGeometry {
    knob_start: usize,
    knob_size: usize,
}

#[derive(Clone, Debug)]
struct ScrollbarDrag {
    anchor_within_knob: usize,
}

#[derive(Clone, Debug)]
enum DragState {
    Scrollbar(ScrollbarDrag),
    Text { moved: bool },
}

struct App {
    display: EditorDisplay,
    file_path: PathBuf,
    should_quit: bool,
    dirty: bool,
    status_message: Option<(String, Instant)>,
    context_menu: Option<ContextMenuState>,
    drag_state: Option<DragState>,
    last_scrollbar_column: u16,
    last_advance: Instant,
}

impl App {
    fn new(content: String, path: PathBuf, initial_status: Option<String>) -> Self {
        let mut display = EditorDisplay::new(terminal_config());
        display.set_clipboard(Box::new(MemoryClipboard::new()));
        display.set_data_detector(Box::new(EntityScanner::new()));
        if !content.is_empty() {
            display.add_text_span(TextSpanOptions::new(content));
        }
        display.request_focus();
        display.set_caret_offset(0);

        Self {
            display,
            file_path: path,
            should_quit: false,
            dirty: false,
            status_message: initial_status.map(|msg| (msg, Instant::now())),
            context_menu: None,
            drag_state: None,
            last_scrollbar_column: 0,
            last_advance: Instant::now(),
        }
    }

    fn should_quit(&self) -> bool {
        self.should_quit
    }

    fn has_status_message(&self) -> bool {
        self.status_message.is_some()
    }

    fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some((message.into(), Instant::now()));
    }

    fn take_host_dirty(&mut self) -> bool {
        let host = self.display.host();
        let dirty =
            host.dirty_count(DirtyFlag::Render) + host.dirty_count(DirtyFlag::Measure) > 0;
        host.clear_dirty();
        dirty
    }

    /// Runs the editor's timers up to the wall clock.
    fn advance_editor(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_advance);
        self.last_advance = now;
        self.display.advance(elapsed);
    }

    fn draw(&mut self, frame: &mut Frame) {
        let area = frame.area();
        if area.height == 0 || area.width == 0 {
            return;
        }

        let vertical = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1), Constraint::Length(1)])
            .split(area);

        let editor_area = vertical[0];
        let status_area = vertical[1];

        let horizontal = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(1), Constraint::Length(1)])
            .split(editor_area);
        let text_area = horizontal[0];
        let scrollbar_area = horizontal[1];

        let width = text_area.width.max(1) as usize;
        let (wrap_width, left_padding) = editor_wrap_configuration(width);
        self.display
            .sync_viewport(text_area, wrap_width, left_padding);
        let render = self.display.render();
        let scroll_top = self.display.scroll_top();
        let viewport_height = text_area.height as usize;
        self.last_scrollbar_column = scrollbar_area.x;

        let paragraph = Paragraph::new(Text::from(render.lines))
            .wrap(Wrap { trim: false })
            .block(Block::default().borders(Borders::NONE))
            .scroll((scroll_top as u16, 0));
        frame.render_widget(paragraph, text_area);

        self.draw_scrollbar(frame, scrollbar_area);

        if let Some(cursor) = self.display.last_cursor_visual()
            && self.display.is_caret_visible()
            && cursor.line >= scroll_top
            && cursor.line < scroll_top + viewport_height
            && text_area.width > 0
        {
            let cursor_y = text_area.y + (cursor.line - scroll_top) as u16;
            let cursor_x = text_area.x + cursor.column.min(text_area.width - 1);
            frame.set_cursor_position(Position::new(cursor_x, cursor_y));
        }

        let status_line = self.status_line(render.content_lines, status_area.width as usize);
        let status_widget = Paragraph::new(status_line)
            .block(Block::default().borders(Borders::NONE))
            .style(self.display.theme().status_bar_style());
        frame.render_widget(status_widget, status_area);

        if self.context_menu.is_some() {
            self.render_context_menu(frame, area);
        }
    }

    fn draw_scrollbar(&self, frame: &mut Frame, area: Rect) {
        let viewport = self.display.last_view_height();
        if area.height == 0 || self.display.last_total_lines() <= viewport {
            return;
        }

        let Some(geometry) = self.scrollbar_geometry() else {
            return;
        };

        let knob_end = geometry.knob_start.saturating_add(geometry.knob_size);
        let theme = self.display.theme();

        for row in 0..viewport.min(area.height as usize) {
            let y = area.y + row as u16;
            let span = if row >= geometry.knob_start && row < knob_end {
                Span::styled(
                    " ",
                    theme.scrollbar_knob_style().add_modifier(Modifier::REVERSED),
                )
            } else {
                Span::styled("│", theme.scrollbar_track_style())
            };
            frame.render_widget(
                Paragraph::new(Line::from(span)),
                Rect::new(area.x, y, 1, 1),
            );
        }
    }

    fn render_context_menu(&self, frame: &mut Frame, area: Rect) {
        let Some(menu) = &self.context_menu else {
            return;
        };

        if area.width < 3 || area.height < 3 {
            return;
        }

        let mut max_label_width = 0usize;
        let mut max_section_width = 0usize;
        for entry in menu.entries() {
            match entry {
                MenuEntry::Item(item) => {
                    max_label_width = max_label_width.max(item.label.chars().count());
                }
                MenuEntry::Section(title) => {
                    max_section_width = max_section_width.max(title.chars().count());
                }
                MenuEntry::Separator => {}
            }
        }

        let shortcut_width = 1;
        let item_width = max_label_width + 2 + shortcut_width;
        let content_width = item_width.max(max_section_width) as u16;
        let min_width = 10.min(area.width);
        let width = (content_width + 4).min(area.width).max(min_width);
        let desired_height = (menu.entries().len() as u16 + 2).min(area.height);
        let height = desired_height.max(3.min(area.height));

        let popup_area = Rect::new(
            area.x + (area.width.saturating_sub(width)) / 2,
            area.y + (area.height.saturating_sub(height)) / 2,
            width,
            height,
        );

        frame.render_widget(Clear, popup_area);

        let theme = self.display.theme();
        let separator_width = popup_area.width.saturating_sub(4).max(4) as usize;
        let popup_style = theme.menu_style();

        let mut items = Vec::new();
        for entry in menu.entries() {
            match entry {
                MenuEntry::Section(title) => {
                    items.push(ListItem::new(Line::from(Span::styled(
                        *title,
                        popup_style.add_modifier(Modifier::BOLD),
                    ))));
                }
                MenuEntry::Separator => {
                    let line = "─".repeat(separator_width);
                    items.push(ListItem::new(Line::from(Span::styled(
                        line,
                        theme.menu_disabled_style(),
                    ))));
                }
                MenuEntry::Item(item) => {
                    let shortcut = item.shortcut.map(|shortcut| shortcut.key).unwrap_or(' ');
                    let content = format!(
                        "{label:<label_width$}  {shortcut:>shortcut_width$}",
                        label = item.label,
                        label_width = max_label_width,
                    );
                    let style = if item.is_enabled() {
                        Style::default()
                    } else {
                        theme.menu_disabled_style()
                    };
                    items.push(ListItem::new(Line::from(Span::styled(content, style))));
                }
            }
        }

        let mut state = ListState::default();
        state.select(Some(menu.selected_index()));

        let list = List::new(items)
            .highlight_style(theme.menu_selected_style())
            .style(popup_style)
            .block(
                Block::default()
                    .title("Context Menu")
                    .borders(Borders::ALL)
                    .style(popup_style)
                    .border_style(theme.scrollbar_track_style()),
            );

        frame.render_stateful_widget(list, popup_area, &mut state);
    }

    fn open_context_menu(&mut self) {
        let entries = build_context_menu_entries(
            self.display.selection().is_some(),
            self.display.text_detect_enable(),
        );
        self.context_menu = Some(ContextMenuState::new(entries));
    }

    fn close_context_menu(&mut self) {
        self.context_menu = None;
    }

    fn handle_context_menu_key(&mut self, code: KeyCode, modifiers: KeyModifiers) -> bool {
        if self.context_menu.is_none() {
            return false;
        }

        match code {
            KeyCode::Esc => {
                self.close_context_menu();
                true
            }
            KeyCode::Up => {
                if let Some(menu) = self.context_menu.as_mut() {
                    menu.move_selection(-1);
                }
                true
            }
            KeyCode::Down => {
                if let Some(menu) = self.context_menu.as_mut() {
                    menu.move_selection(1);
                }
                true
            }
            KeyCode::Enter => {
                if let Some(action) = self
                    .context_menu
                    .as_ref()
                    .and_then(|menu| menu.current_action())
                {
                    self.close_context_menu();
                    self.execute_menu_action(action);
                }
                true
            }
            KeyCode::Char(' ') if modifiers.contains(KeyModifiers::CONTROL) => {
                self.close_context_menu();
                true
            }
            KeyCode::Char(_) => {
                if let Some(menu) = self.context_menu.as_mut() {
                    let (handled, action) = menu.shortcut_action(code, modifiers);
                    if handled {
                        if let Some(action) = action {
                            self.close_context_menu();
                            self.execute_menu_action(action);
                        }
                        return true;
                    }
                }
                false
            }
            _ => false,
        }
    }

    fn execute_menu_action(&mut self, action: MenuAction) {
        match action {
            MenuAction::ApplySpanStyle(style) => {
                if let Some((start, end)) = self.display.selection()
                    && self.display.update_span_style(start, end, &style.update())
                {
                    self.mark_dirty();
                }
            }
            MenuAction::Align(align) => {
                let caret = self.display.caret_position();
                let (start, end) = self.display.selection().unwrap_or((caret, caret));
                let update = UpdateParagraphStyle {
                    text_align: Some(align),
                    leading_margin: None,
                };
                if self.display.update_paragraph_style(start, end, &update) {
                    self.mark_dirty();
                }
            }
            MenuAction::Cut => self.cut(),
            MenuAction::Copy => self.copy(),
            MenuAction::Paste => self.paste(),
            MenuAction::SelectAll => self.display.handle_on_select_all(),
            MenuAction::ToggleEntityDetection => {
                let enabled = !self.display.text_detect_enable();
                self.display.set_text_detect_enable(enabled);
                self.set_status(if enabled {
                    "Entity detection on (shown while unfocused)"
                } else {
                    "Entity detection off"
                });
            }
        }
    }

    fn copy(&mut self) {
        if self.display.selection().is_some() && self.display.handle_on_copy() {
            self.set_status("Copied");
        }
    }

    fn cut(&mut self) {
        if self.display.handle_on_cut() {
            self.mark_dirty();
            self.set_status("Cut");
        }
    }

    fn paste(&mut self) {
        let before = self.display.text_len();
        if self.display.handle_on_paste() {
            // The in-process clipboard answers at once; run the queued reply.
            self.display.advance(Duration::ZERO);
        }
        if self.display.text_len() != before {
            self.mark_dirty();
        }
    }

    fn status_line(&mut self, content_lines: usize, terminal_width: usize) -> Line<'static> {
        self.prune_status_message();

        if let Some((message, _)) = &self.status_message {
            let position = self.cursor_position_text();
            return Line::from(vec![
                Span::raw(format!("{} ", position)),
                Span::raw(message.clone()),
            ]);
        }

        let position = self.cursor_position_text();
        let filename = self.file_path.display().to_string();
        let marker = if self.dirty { "*" } else { "" };
        let breadcrumbs = self.display.caret_breadcrumbs().join(" > ");
        let word_count = self.count_words();

        // Least important first
        let all_shortcuts = ["Esc:Menu", "^Z:Undo", "^S:Save", "^Q:Quit"];

        let mut spans = Vec::new();
        spans.push(Span::raw(position));
        spans.push(Span::raw(" "));
        spans.push(Span::styled(
            format!("{}{}", filename, marker),
            self.display.theme().filename_style(),
        ));
        if !breadcrumbs.is_empty() {
            spans.push(Span::raw(" "));
            spans.push(Span::raw(breadcrumbs));
        }
        spans.push(Span::raw(format!(
            ", {} lines, {} words",
            content_lines, word_count
        )));

        let left_width: usize = spans.iter().map(|span| span.content.chars().count()).sum();

        let min_padding = 1;
        let mut shortcuts_to_show = Vec::new();
        let mut shortcuts_width = 0;
        for shortcut in all_shortcuts.iter().rev() {
            let test_width = if shortcuts_to_show.is_empty() {
                shortcut.chars().count()
            } else {
                shortcuts_width + 1 + shortcut.chars().count()
            };
            if left_width + min_padding + test_width <= terminal_width {
                shortcuts_to_show.insert(0, *shortcut);
                shortcuts_width = test_width;
            } else {
                break;
            }
        }

        if !shortcuts_to_show.is_empty() {
            let padding_needed = terminal_width
                .saturating_sub(left_width)
                .saturating_sub(shortcuts_width)
                .max(min_padding);
            spans.push(Span::raw(" ".repeat(padding_needed)));
            spans.push(Span::raw(shortcuts_to_show.join(" ")));
        }

        Line::from(spans)
    }

    fn prune_status_message(&mut self) {
        if let Some((_, instant)) = &self.status_message
            && instant.elapsed() > STATUS_TIMEOUT
        {
            self.status_message = None;
        }
    }

    fn max_scroll(&self) -> usize {
        self.display
            .last_total_lines()
            .saturating_sub(self.display.last_view_height())
    }

    fn scrollbar_geometry(&self) -> Option<ScrollbarGeometry> {
        let viewport = self.display.last_view_height();
        let total = self.display.last_total_lines();
        if viewport == 0 || total <= viewport {
            return None;
        }

        let knob_size = ((viewport * viewport) / total).max(1).min(viewport);
        let max_scroll = self.max_scroll();
        let knob_travel = viewport.saturating_sub(knob_size);
        let knob_start = if max_scroll == 0 || knob_travel == 0 {
            0
        } else {
            (self.display.scroll_top() * knob_travel) / max_scroll
        };

        Some(ScrollbarGeometry {
            knob_start,
            knob_size,
        })
    }

    fn scroll_offset_from_knob_start(&self, knob_start: usize, knob_size: usize) -> usize {
        let max_scroll = self.max_scroll();
        if max_scroll == 0 {
            return 0;
        }

        let knob_travel = self.display.last_view_height().saturating_sub(knob_size);
        if knob_travel == 0 {
            return self.display.scroll_top().min(max_scroll);
        }

        let clamped_start = knob_start.min(knob_travel);
        (clamped_start * max_scroll + knob_travel / 2) / knob_travel
    }

    fn scroll_to(&mut self, target: usize) {
        let target = target.min(self.max_scroll()) as isize;
        let current = self.display.scroll_top() as isize;
        self.display.scroll_by_lines(target - current);
    }

    fn begin_scrollbar_drag(&mut self, pointer_row: usize) {
        self.drag_state = None;
        let Some(geometry) = self.scrollbar_geometry() else {
            return;
        };

        let knob_start = geometry.knob_start;
        let knob_size = geometry.knob_size;
        let knob_end = knob_start.saturating_add(knob_size);
        let knob_travel = self.display.last_view_height().saturating_sub(knob_size);

        let mut anchor = if knob_size <= 1 || pointer_row < knob_start {
            0
        } else if pointer_row >= knob_end {
            knob_size.saturating_sub(1)
        } else {
            pointer_row - knob_start
        };
        anchor = anchor.min(knob_size.saturating_sub(1));

        if pointer_row < knob_start || pointer_row >= knob_end {
            anchor = (knob_size / 2).min(knob_size.saturating_sub(1));
            let target_start = pointer_row.saturating_sub(anchor).min(knob_travel);
            let target = self.scroll_offset_from_knob_start(target_start, knob_size);
            self.scroll_to(target);
        }

        self.drag_state = Some(DragState::Scrollbar(ScrollbarDrag {
            anchor_within_knob: anchor,
        }));
    }

    fn update_scrollbar_drag(&mut self, pointer_row: usize, anchor: usize) {
        let Some(geometry) = self.scrollbar_geometry() else {
            return;
        };

        let knob_size = geometry.knob_size;
        let knob_travel = self.display.last_view_height().saturating_sub(knob_size);
        let adjusted_anchor = anchor.min(knob_size.saturating_sub(1));
        let target_start = pointer_row.saturating_sub(adjusted_anchor).min(knob_travel);
        let target = self.scroll_offset_from_knob_start(target_start, knob_size);
        self.scroll_to(target);
    }

    fn handle_mouse_event(&mut self, event: MouseEvent) {
        if self.context_menu.is_some() {
            if matches!(event.kind, MouseEventKind::Down(MouseButton::Left)) {
                self.close_context_menu();
            }
            return;
        }

        match event.kind {
            MouseEventKind::ScrollUp => {
                self.display.scroll_by_lines(-MOUSE_SCROLL_LINES);
            }
            MouseEventKind::ScrollDown => {
                self.display.scroll_by_lines(MOUSE_SCROLL_LINES);
            }
            MouseEventKind::Down(MouseButton::Left) => self.handle_mouse_down(event),
            MouseEventKind::Drag(MouseButton::Left) => self.handle_mouse_drag(event),
            MouseEventKind::Up(MouseButton::Left) => self.handle_mouse_up(event),
            _ => {}
        }
    }

    fn handle_mouse_down(&mut self, event: MouseEvent) {
        if event.column == self.last_scrollbar_column
            && (event.row as usize) < self.display.last_view_height()
        {
            self.begin_scrollbar_drag(event.row as usize);
            return;
        }

        let Some(point) = self.display.point_from_mouse(event.column, event.row) else {
            self.drag_state = None;
            return;
        };
        self.display.handle_mouse_left_button(MouseAction::Press, point);
        self.drag_state = Some(DragState::Text { moved: false });
    }

    fn handle_mouse_drag(&mut self, event: MouseEvent) {
        match self.drag_state {
            Some(DragState::Scrollbar(ref drag)) => {
                let anchor = drag.anchor_within_knob;
                if (event.row as usize) < self.display.last_view_height() {
                    self.update_scrollbar_drag(event.row as usize, anchor);
                }
            }
            Some(DragState::Text { .. }) => {
                let point = self.display.point_unclamped(event.column, event.row);
                self.display.handle_mouse_left_button(MouseAction::Move, point);
                self.drag_state = Some(DragState::Text { moved: true });
            }
            None => {}
        }
    }

    /// A release without movement is a click; two of them in quick
    /// succession select the word under the pointer.
    fn handle_mouse_up(&mut self, event: MouseEvent) {
        let Some(DragState::Text { moved }) = self.drag_state.take() else {
            return;
        };
        let point = self.display.point_unclamped(event.column, event.row);
        self.display.handle_mouse_left_button(MouseAction::Release, point);
        if !moved {
            self.display.handle_click(point);
        }
    }

    fn move_caret(&mut self, intent: CaretMoveIntent, extend: bool) {
        if extend {
            self.display.handle_select(intent);
        } else {
            self.display.cursor_move(intent);
        }
    }

    fn move_page(&mut self, direction: CaretMoveIntent, extend: bool) {
        for _ in 0..self.display.page_jump_distance() {
            self.move_caret(direction, extend);
        }
    }

    fn handle_event(&mut self, event: Event) -> Result<()> {
        match event {
            Event::Key(KeyEvent {
                code,
                modifiers,
                kind: KeyEventKind::Press,
                ..
            }) => {
                if self.handle_context_menu_key(code, modifiers) {
                    return Ok(());
                }

                if self.context_menu.is_some() {
                    return Ok(());
                }

                if is_context_menu_shortcut(code, modifiers) {
                    self.open_context_menu();
                    return Ok(());
                }

                if !self.display.is_focused() {
                    self.display.request_focus();
                }

                let shift = modifiers.contains(KeyModifiers::SHIFT);
                let control = modifiers.contains(KeyModifiers::CONTROL);
                match code {
                    KeyCode::Char('q') if control => self.should_quit = true,
                    KeyCode::Char('s') if control => self.save()?,
                    KeyCode::Char('z') if control => {
                        if self.display.undo() {
                            self.mark_dirty();
                        }
                    }
                    KeyCode::Char('y') if control => {
                        if self.display.redo() {
                            self.mark_dirty();
                        }
                    }
                    KeyCode::Char('a') if control => self.display.handle_on_select_all(),
                    KeyCode::Char('c') if control => self.copy(),
                    KeyCode::Char('x') if control => self.cut(),
                    KeyCode::Char('v') if control => self.paste(),
                    KeyCode::Left if control => self.move_caret(CaretMoveIntent::LeftWord, false),
                    KeyCode::Right if control => {
                        self.move_caret(CaretMoveIntent::RightWord, false)
                    }
                    KeyCode::Up if control => {
                        let page = self.display.page_jump_distance();
                        self.display.scroll_by_lines(-page);
                    }
                    KeyCode::Down if control => {
                        let page = self.display.page_jump_distance();
                        self.display.scroll_by_lines(page);
                    }
                    KeyCode::Left => self.move_caret(CaretMoveIntent::Left, shift),
                    KeyCode::Right => self.move_caret(CaretMoveIntent::Right, shift),
                    KeyCode::Up => self.move_caret(CaretMoveIntent::Up, shift),
                    KeyCode::Down => self.move_caret(CaretMoveIntent::Down, shift),
                    KeyCode::Home if control => self.move_caret(CaretMoveIntent::Home, false),
                    KeyCode::End if control => self.move_caret(CaretMoveIntent::End, false),
                    KeyCode::Home => self.move_caret(CaretMoveIntent::ParagraphBegin, false),
                    KeyCode::End => self.move_caret(CaretMoveIntent::ParagraphEnd, false),
                    KeyCode::PageUp => self.move_page(CaretMoveIntent::Up, shift),
                    KeyCode::PageDown => self.move_page(CaretMoveIntent::Down, shift),
                    KeyCode::Backspace => {
                        if self.display.handle_on_delete(true) {
                            self.mark_dirty();
                        }
                    }
                    KeyCode::Delete => {
                        if self.display.handle_on_delete(false) {
                            self.mark_dirty();
                        }
                    }
                    KeyCode::Enter => self.insert("\n"),
                    KeyCode::Char(ch) if !control && !modifiers.contains(KeyModifiers::ALT) => {
                        let mut buffer = [0u8; 4];
                        self.insert(ch.encode_utf8(&mut buffer));
                    }
                    _ => {}
                }
            }
            Event::Mouse(mouse_event) => {
                self.handle_mouse_event(mouse_event);
            }
            _ => {}
        }
        Ok(())
    }

    fn insert(&mut self, value: &str) {
        if self.display.insert_value(value) {
            self.display.move_caret_to_content_rect();
            self.mark_dirty();
        }
    }

    fn on_tick(&mut self) {
        self.advance_editor();
        self.prune_status_message();
    }

    fn save(&mut self) -> Result<()> {
        let contents = self.display.plain_text();
        fs::write(&self.file_path, contents)
            .with_context(|| format!("failed to write {}", self.file_path.display()))?;
        self.dirty = false;
        self.set_status("Saved");
        Ok(())
    }

    fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    fn count_words(&self) -> usize {
        self.display.content_text().split_whitespace().count()
    }

    fn cursor_position_text(&self) -> String {
        if let Some(position) = self.display.last_cursor_visual() {
            let line = position.content_line + 1;
            let column = usize::from(position.content_column) + 1;
            format!("{}:{}", line, column)
        } else {
            "?:?".to_string()
        }
    }
}
