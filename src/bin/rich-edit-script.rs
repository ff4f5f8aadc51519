use std::{
    env, fs,
    io::{self, Read},
    rc::Rc,
    time::Duration,
};

use anyhow::{Context, Result, anyhow, bail};
use kurbo::{Point, Rect};
use log::info;

use rich_edit::editor::{
    CaretMoveIntent, Color, EditorListener, FontStyle, FontWeight, ImageAttributes,
    ImageSpanOptions, RangeOptions, RichEditor, SelectionInfo, SymbolSpanOptions, TextAlign,
    TextDecoration, TextSpanOptions, UpdateParagraphStyle, UpdateSpanStyle,
};
use rich_edit::host::{HeadlessHost, HostHandle};
use rich_edit::services::{EntityScanner, InputMethod, MemoryClipboard, TextConfig};

const FRAME: Rect = Rect::new(0.0, 0.0, 400.0, 300.0);

fn main() -> Result<()> {
    run()
}

fn run() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let script = match env::args().nth(1) {
        Some(path) => {
            fs::read_to_string(&path).with_context(|| format!("failed to read script {path}"))?
        }
        None => {
            let mut script = String::new();
            io::stdin()
                .read_to_string(&mut script)
                .context("failed to read script from stdin")?;
            script
        }
    };

    let mut driver = Driver::new();
    for (index, line) in script.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        driver
            .execute(line)
            .with_context(|| format!("line {}: {line}", index + 1))?;
    }

    println!("{:?}", driver.editor.content_text());
    for dump in driver.editor.dump_spans() {
        println!("{dump}");
    }
    Ok(())
}

/// Input method that only reports what the editor asks of it.
struct LoggingInputMethod;

impl InputMethod for LoggingInputMethod {
    fn attach(&mut self, show_keyboard: bool, config: &TextConfig) -> bool {
        info!(
            "ime attach (keyboard {show_keyboard}) caret {} selection {:?}",
            config.caret_position, config.selection
        );
        true
    }

    fn close(&mut self) {
        info!("ime close");
    }

    fn on_cursor_update(&mut self, cursor: Rect) {
        info!("ime cursor {cursor:?}");
    }

    fn on_selection_change(&mut self, _text: &str, start: usize, end: usize) {
        info!("ime selection [{start}, {end})");
    }
}

struct LoggingListener;

impl EditorListener for LoggingListener {
    fn on_select(&mut self, info: &SelectionInfo) {
        info!("selected {:?}", info.selection);
    }

    fn on_delete_complete(&mut self) {
        info!("delete complete");
    }
}

struct Driver {
    editor: RichEditor,
    // The editor only holds a weak handle.
    _host: Rc<HeadlessHost>,
}

impl Driver {
    fn new() -> Self {
        let host = HeadlessHost::new(FRAME);
        let mut editor = RichEditor::new();
        editor.set_host(HostHandle::new(&host));
        editor.set_layout(FRAME, FRAME);
        editor.set_input_method(Box::new(LoggingInputMethod));
        editor.set_listener(Box::new(LoggingListener));
        editor.set_clipboard(Box::new(MemoryClipboard::new()));
        editor.set_data_detector(Box::new(EntityScanner::new()));
        Self {
            editor,
            _host: host,
        }
    }

    fn execute(&mut self, line: &str) -> Result<()> {
        let (command, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();
        let args: Vec<&str> = rest.split_whitespace().collect();
        let editor = &mut self.editor;
        match command {
            "insert" => {
                editor.insert_value(&unescape(rest));
            }
            "backspace" => match args.first() {
                Some(count) => {
                    editor.delete_backward(parse_count(count)?);
                }
                None => {
                    editor.handle_on_delete(true);
                }
            },
            "delete" => match args.first() {
                Some(count) => {
                    editor.delete_forward(parse_count(count)?);
                }
                None => {
                    editor.handle_on_delete(false);
                }
            },
            "caret" => {
                editor.set_caret_offset(parse_offset(arg(&args, 0)?)?);
            }
            "select" => {
                let start = parse_offset(arg(&args, 0)?)?;
                let end = parse_offset(arg(&args, 1)?)?;
                editor.set_selection(start, end);
            }
            "select-all" => editor.handle_on_select_all(),
            "move" => {
                editor.cursor_move(parse_intent(arg(&args, 0)?)?);
            }
            "extend" => {
                editor.handle_select(parse_intent(arg(&args, 0)?)?);
            }
            "style" => {
                let start = parse_count(arg(&args, 0)?)?;
                let end = parse_count(arg(&args, 1)?)?;
                let (span_style, paragraph_style) = parse_style(&args[2..])?;
                if span_style != UpdateSpanStyle::default() {
                    editor.update_span_style(start, end, &span_style);
                }
                if let Some(paragraph_style) = paragraph_style {
                    editor.update_paragraph_style(start, end, &paragraph_style);
                }
            }
            "span" => {
                let (value, offset) = split_trailing_offset(rest);
                let mut options = TextSpanOptions::new(unescape(value));
                options.offset = offset;
                editor.add_text_span(options);
            }
            "image" => {
                let (src, offset) = split_trailing_offset(rest);
                if src.is_empty() {
                    bail!("image needs a source");
                }
                editor.add_image_span(ImageSpanOptions {
                    attributes: ImageAttributes::new(src),
                    offset,
                });
            }
            "symbol" => {
                let (code, offset) = split_trailing_offset(rest);
                editor.add_symbol_span(SymbolSpanOptions {
                    code_point: parse_code_point(code)?,
                    style: None,
                    offset,
                });
            }
            "remove" => {
                let start = parse_offset(arg(&args, 0)?)?;
                let end = parse_offset(arg(&args, 1)?)?;
                editor.delete_spans(RangeOptions {
                    start: Some(start),
                    end: Some(end),
                });
            }
            "undo" => {
                editor.undo();
            }
            "redo" => {
                editor.redo();
            }
            "copy" => {
                editor.handle_on_copy();
            }
            "cut" => {
                editor.handle_on_cut();
            }
            "paste" => {
                if editor.handle_on_paste() {
                    editor.advance(Duration::ZERO);
                }
            }
            "click" => editor.handle_click(parse_point(&args)?),
            "long-press" => {
                editor.handle_long_press(parse_point(&args)?);
            }
            "focus" => {
                editor.request_focus();
            }
            "blur" => editor.lose_focus(),
            "detect" => match arg(&args, 0)? {
                "on" => editor.set_text_detect_enable(true),
                "off" => editor.set_text_detect_enable(false),
                other => bail!("detect expects on or off, got {other:?}"),
            },
            "detect-types" => editor.set_text_detect_types(rest),
            "tick" => {
                let millis: u64 = arg(&args, 0)?
                    .parse()
                    .with_context(|| format!("invalid duration {rest:?}"))?;
                editor.advance(Duration::from_millis(millis));
            }
            "print" => {
                println!("{:?}", editor.content_text());
                match editor.selection() {
                    Some((start, end)) => println!("caret {} selection [{start}, {end})", editor.caret_position()),
                    None => println!("caret {}", editor.caret_position()),
                }
                for span in editor.ai_spans() {
                    println!("entity {:?} [{}, {}) {:?}", span.entity_type, span.start, span.end, span.content);
                }
            }
            "dump" => {
                for dump in editor.dump_spans() {
                    println!("{dump}");
                }
            }
            other => bail!("unknown command {other:?}"),
        }
        Ok(())
    }
}

fn arg<'a>(args: &[&'a str], index: usize) -> Result<&'a str> {
    args.get(index)
        .copied()
        .ok_or_else(|| anyhow!("missing argument {}", index + 1))
}

fn parse_count(value: &str) -> Result<usize> {
    value
        .parse()
        .with_context(|| format!("invalid count {value:?}"))
}

fn parse_offset(value: &str) -> Result<isize> {
    value
        .parse()
        .with_context(|| format!("invalid offset {value:?}"))
}

fn parse_intent(name: &str) -> Result<CaretMoveIntent> {
    CaretMoveIntent::from_name(name).ok_or_else(|| anyhow!("unknown move intent {name:?}"))
}

fn parse_point(args: &[&str]) -> Result<Point> {
    let x: f64 = arg(args, 0)?
        .parse()
        .context("invalid x coordinate")?;
    let y: f64 = arg(args, 1)?
        .parse()
        .context("invalid y coordinate")?;
    Ok(Point::new(x, y))
}

/// Accepts `U+1F600`, `0x41` or a literal character.
fn parse_code_point(value: &str) -> Result<char> {
    let hex = value
        .strip_prefix("U+")
        .or_else(|| value.strip_prefix("u+"))
        .or_else(|| value.strip_prefix("0x"));
    if let Some(hex) = hex {
        let code = u32::from_str_radix(hex, 16)
            .with_context(|| format!("invalid code point {value:?}"))?;
        return char::from_u32(code).ok_or_else(|| anyhow!("invalid code point {value:?}"));
    }
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(ch), None) => Ok(ch),
        _ => bail!("symbol expects one character or a code point, got {value:?}"),
    }
}

/// A trailing integer, if any, is the insertion offset.
fn split_trailing_offset(rest: &str) -> (&str, Option<isize>) {
    if let Some((head, last)) = rest.rsplit_once(char::is_whitespace)
        && let Ok(offset) = last.parse::<isize>()
    {
        return (head.trim_end(), Some(offset));
    }
    (rest, None)
}

fn unescape(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            result.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => result.push('\n'),
            Some('t') => result.push('\t'),
            Some('s') => result.push(' '),
            Some(other) => result.push(other),
            None => result.push('\\'),
        }
    }
    result
}

fn parse_style(props: &[&str]) -> Result<(UpdateSpanStyle, Option<UpdateParagraphStyle>)> {
    let mut span_style = UpdateSpanStyle::default();
    let mut paragraph_style = None;
    for prop in props {
        let (key, value) = prop.split_once('=').unwrap_or((prop, ""));
        match key {
            "bold" => span_style.font_weight = Some(FontWeight::Bold),
            "italic" => span_style.font_style = Some(FontStyle::Italic),
            "normal" => {
                span_style.font_weight = Some(FontWeight::Normal);
                span_style.font_style = Some(FontStyle::Normal);
            }
            "underline" => span_style.decoration = Some(TextDecoration::Underline),
            "overline" => span_style.decoration = Some(TextDecoration::Overline),
            "strike" => span_style.decoration = Some(TextDecoration::LineThrough),
            "size" => {
                span_style.font_size = Some(
                    value
                        .parse()
                        .with_context(|| format!("invalid font size {value:?}"))?,
                )
            }
            "color" => span_style.text_color = Some(parse_color(value)?),
            "align" => {
                let text_align = match value {
                    "start" => TextAlign::Start,
                    "center" => TextAlign::Center,
                    "end" => TextAlign::End,
                    "justify" => TextAlign::Justify,
                    other => bail!("unknown alignment {other:?}"),
                };
                paragraph_style = Some(UpdateParagraphStyle {
                    text_align: Some(text_align),
                    leading_margin: None,
                });
            }
            other => bail!("unknown style property {other:?}"),
        }
    }
    Ok((span_style, paragraph_style))
}

fn parse_color(value: &str) -> Result<Color> {
    let hex = value.strip_prefix('#').unwrap_or(value);
    if hex.len() != 6 {
        bail!("color must be #RRGGBB, got {value:?}");
    }
    let rgb = u32::from_str_radix(hex, 16).with_context(|| format!("invalid color {value:?}"))?;
    Ok(Color::from_rgb((rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8))
}
