//! Contracts of the platform services the editor talks to, plus in-process
//! implementations of the clipboard and the entity detector.

use std::cell::RefCell;
use std::rc::Rc;

use kurbo::Rect;

/// Answer of an asynchronous service call.
///
/// `Ready` answers are still delivered through the editor's task queue;
/// `Pending` ones arrive later through the matching `deliver_*` entry point.
#[derive(Clone, Debug, PartialEq)]
pub enum Reply<T> {
    Ready(T),
    Pending,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum CopyOptions {
    None,
    InApp,
    #[default]
    Local,
    Distributed,
}

/// Snapshot handed to the input method when the keyboard attaches.
#[derive(Clone, Debug, PartialEq)]
pub struct TextConfig {
    pub cursor: Rect,
    pub caret_position: usize,
    pub selection: (usize, usize),
    pub window_rect: Rect,
}

pub trait InputMethod {
    /// Returns `false` when the service refused the attach request.
    fn attach(&mut self, show_keyboard: bool, config: &TextConfig) -> bool;

    fn close(&mut self);

    fn on_cursor_update(&mut self, cursor: Rect);

    fn on_selection_change(&mut self, text: &str, start: usize, end: usize);
}

#[derive(Clone, Debug, PartialEq)]
pub enum ClipboardRecord {
    Text(String),
    Image { src: String },
}

#[derive(Clone, Debug, PartialEq, Default)]
pub struct PasteData {
    pub records: Vec<ClipboardRecord>,
}

impl PasteData {
    pub fn plain_text(&self) -> String {
        self.records
            .iter()
            .filter_map(|record| match record {
                ClipboardRecord::Text(text) => Some(text.as_str()),
                ClipboardRecord::Image { .. } => None,
            })
            .collect()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClipboardRequestKind {
    GetData,
    HasData,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClipboardRequest {
    pub id: u64,
    pub kind: ClipboardRequestKind,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ClipboardResponse {
    Data(String),
    HasData(bool),
}

pub trait Clipboard {
    fn set_data(&mut self, data: PasteData, options: CopyOptions);

    fn get_data(&mut self, request: ClipboardRequest) -> Reply<ClipboardResponse>;

    fn has_data(&mut self, request: ClipboardRequest) -> Reply<ClipboardResponse>;
}

#[derive(Default)]
struct MemoryClipboardState {
    data: Option<(PasteData, CopyOptions)>,
    deferred: bool,
    pending: Vec<ClipboardRequest>,
}

/// Process-local clipboard. Clones share the same contents.
#[derive(Clone, Default)]
pub struct MemoryClipboard {
    inner: Rc<RefCell<MemoryClipboardState>>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// A clipboard that answers reads later, through [`MemoryClipboard::take_pending`].
    pub fn deferred() -> Self {
        let clipboard = Self::default();
        clipboard.inner.borrow_mut().deferred = true;
        clipboard
    }

    pub fn contents(&self) -> Option<PasteData> {
        self.inner.borrow().data.as_ref().map(|(data, _)| data.clone())
    }

    pub fn copy_options(&self) -> Option<CopyOptions> {
        self.inner.borrow().data.as_ref().map(|(_, options)| *options)
    }

    pub fn set_text(&self, text: impl Into<String>) {
        let data = PasteData {
            records: vec![ClipboardRecord::Text(text.into())],
        };
        self.inner.borrow_mut().data = Some((data, CopyOptions::Local));
    }

    pub fn take_pending(&self) -> Vec<ClipboardRequest> {
        std::mem::take(&mut self.inner.borrow_mut().pending)
    }

    pub fn answer(&self, request: ClipboardRequest) -> ClipboardResponse {
        let state = self.inner.borrow();
        match request.kind {
            ClipboardRequestKind::GetData => ClipboardResponse::Data(
                state
                    .data
                    .as_ref()
                    .map(|(data, _)| data.plain_text())
                    .unwrap_or_default(),
            ),
            ClipboardRequestKind::HasData => ClipboardResponse::HasData(
                state
                    .data
                    .as_ref()
                    .is_some_and(|(data, _)| !data.records.is_empty()),
            ),
        }
    }

    fn reply(&mut self, request: ClipboardRequest) -> Reply<ClipboardResponse> {
        if self.inner.borrow().deferred {
            self.inner.borrow_mut().pending.push(request);
            return Reply::Pending;
        }
        Reply::Ready(self.answer(request))
    }
}

impl Clipboard for MemoryClipboard {
    fn set_data(&mut self, data: PasteData, options: CopyOptions) {
        self.inner.borrow_mut().data = Some((data, options));
    }

    fn get_data(&mut self, request: ClipboardRequest) -> Reply<ClipboardResponse> {
        self.reply(request)
    }

    fn has_data(&mut self, request: ClipboardRequest) -> Reply<ClipboardResponse> {
        self.reply(request)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityType {
    PhoneNumber,
    Url,
    Email,
    Address,
}

impl EntityType {
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim() {
            "phoneNum" => Some(EntityType::PhoneNumber),
            "url" => Some(EntityType::Url),
            "email" => Some(EntityType::Email),
            "location" => Some(EntityType::Address),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            EntityType::PhoneNumber => "phoneNum",
            EntityType::Url => "url",
            EntityType::Email => "email",
            EntityType::Address => "location",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct DetectRequest {
    /// Document offset of the first character of `text`
    pub start_pos: usize,
    pub text: String,
    pub types: Vec<EntityType>,
}

/// One entity as reported by a detector, relative to its request window.
#[derive(Clone, Debug, PartialEq)]
pub struct DetectedEntity {
    pub entity_type: EntityType,
    pub char_offset: isize,
    pub text: String,
}

#[derive(Clone, Debug, PartialEq, Default)]
pub struct DetectResult {
    pub entities: Vec<DetectedEntity>,
    pub menu_options: Vec<(EntityType, Vec<String>)>,
}

/// Text analysis service used for entity spans and click snapping.
///
/// Positions passed to the adjust calls are relative to `context`.
pub trait DataDetector {
    fn detect(&mut self, request: &DetectRequest) -> Reply<DetectResult>;

    fn adjust_cursor_position(&mut self, position: usize, context: &str) -> Option<usize>;

    fn adjust_word_selection(&mut self, position: usize, context: &str) -> Option<(usize, usize)>;
}

/// Rule-based detector for phone numbers, e-mail addresses and URLs.
#[derive(Clone, Debug, Default)]
pub struct EntityScanner;

#[derive(Clone, Debug, PartialEq)]
struct Found {
    entity_type: EntityType,
    start: usize,
    end: usize,
    text: String,
}

impl EntityScanner {
    pub fn new() -> Self {
        Self
    }

    fn scan(&self, text: &str) -> Vec<Found> {
        let chars: Vec<char> = text.chars().collect();
        let mut found = scan_tokens(&chars);
        for phone in scan_phone_numbers(&chars) {
            if !found
                .iter()
                .any(|other| phone.start < other.end && other.start < phone.end)
            {
                found.push(phone);
            }
        }
        found.sort_by_key(|entity| entity.start);
        found
    }
}

impl DataDetector for EntityScanner {
    fn detect(&mut self, request: &DetectRequest) -> Reply<DetectResult> {
        let entities = self
            .scan(&request.text)
            .into_iter()
            .filter(|entity| request.types.is_empty() || request.types.contains(&entity.entity_type))
            .map(|entity| DetectedEntity {
                entity_type: entity.entity_type,
                char_offset: entity.start as isize,
                text: entity.text,
            })
            .collect();
        Reply::Ready(DetectResult {
            entities,
            menu_options: vec![
                (EntityType::PhoneNumber, vec!["Call".into(), "Copy".into()]),
                (EntityType::Url, vec!["Open".into(), "Copy".into()]),
                (EntityType::Email, vec!["Compose".into(), "Copy".into()]),
            ],
        })
    }

    fn adjust_cursor_position(&mut self, position: usize, context: &str) -> Option<usize> {
        let entity = self
            .scan(context)
            .into_iter()
            .find(|entity| entity.start < position && position < entity.end)?;
        if position - entity.start <= entity.end - position {
            Some(entity.start)
        } else {
            Some(entity.end)
        }
    }

    fn adjust_word_selection(&mut self, position: usize, context: &str) -> Option<(usize, usize)> {
        self.scan(context)
            .into_iter()
            .find(|entity| entity.start <= position && position < entity.end)
            .map(|entity| (entity.start, entity.end))
    }
}

const TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?', ')', '"', '\''];

fn scan_tokens(chars: &[char]) -> Vec<Found> {
    let mut found = Vec::new();
    let mut idx = 0;
    while idx < chars.len() {
        if chars[idx].is_whitespace() {
            idx += 1;
            continue;
        }
        let start = idx;
        while idx < chars.len() && !chars[idx].is_whitespace() {
            idx += 1;
        }
        let mut end = idx;
        while end > start && TRAILING_PUNCTUATION.contains(&chars[end - 1]) {
            end -= 1;
        }
        let token: String = chars[start..end].iter().collect();
        let entity_type = if is_url(&token) {
            Some(EntityType::Url)
        } else if is_email(&token) {
            Some(EntityType::Email)
        } else {
            None
        };
        if let Some(entity_type) = entity_type {
            found.push(Found {
                entity_type,
                start,
                end,
                text: token,
            });
        }
    }
    found
}

fn is_url(token: &str) -> bool {
    ["https://", "http://", "www."].iter().any(|prefix| {
        token
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.contains('.') && !rest.starts_with('.'))
    })
}

fn is_email(token: &str) -> bool {
    let Some((local, domain)) = token.split_once('@') else {
        return false;
    };
    let local_ok = !local.is_empty()
        && local
            .chars()
            .all(|ch| ch.is_alphanumeric() || "._%+-".contains(ch));
    let domain_ok = domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && domain.chars().all(|ch| ch.is_alphanumeric() || ch == '.' || ch == '-');
    local_ok && domain_ok
}

fn is_phone_char(ch: char) -> bool {
    ch.is_ascii_digit() || ch == '+' || ch == '-' || ch == ' '
}

fn scan_phone_numbers(chars: &[char]) -> Vec<Found> {
    let mut found = Vec::new();
    let mut idx = 0;
    while idx < chars.len() {
        if !(chars[idx].is_ascii_digit() || chars[idx] == '+') {
            idx += 1;
            continue;
        }
        let start = idx;
        while idx < chars.len() && is_phone_char(chars[idx]) {
            idx += 1;
        }
        let mut end = idx;
        while end > start && !chars[end - 1].is_ascii_digit() {
            end -= 1;
        }
        let digits = chars[start..end].iter().filter(|ch| ch.is_ascii_digit()).count();
        if digits >= 7 {
            found.push(Found {
                entity_type: EntityType::PhoneNumber,
                start,
                end,
                text: chars[start..end].iter().collect(),
            });
        }
    }
    found
}
